use crate::errors::FilterError;
use crate::params::{FilterParams, TextOrList};
use crate::registry::FilterRegistry;
use crate::scopes::{NamedScopes, apply_scopes};
use sea_orm::{DbBackend, EntityName, EntityTrait, QueryFilter, Select};
use std::marker::PhantomData;

/// A Sea-ORM entity that can be searched from request parameters.
///
/// ```rust,ignore
/// impl FilterableEntity for user::Entity {
///     fn apply_scope(
///         query: Select<Self>,
///         scope: &str,
///         value: &TextOrList,
///     ) -> Result<Select<Self>, FilterError> {
///         match scope {
///             "with_role" => Ok(query.filter(user::Column::Role.is_in(value.words()))),
///             _ => Err(Self::undefined_scope(scope)),
///         }
///     }
/// }
/// ```
pub trait FilterableEntity: EntityTrait {
    /// Key of this entity under the filter namespace. Defaults to the table name.
    #[must_use]
    fn collection_name() -> String {
        Self::default().table_name().to_string()
    }

    /// Apply one allowed scope. Entities without scopes can keep the default.
    ///
    /// # Errors
    ///
    /// [`FilterError::UndefinedScope`] for scopes the entity does not implement.
    fn apply_scope(
        query: Select<Self>,
        scope: &str,
        value: &TextOrList,
    ) -> Result<Select<Self>, FilterError> {
        let _ = (query, value);
        Err(Self::undefined_scope(scope))
    }

    #[must_use]
    fn undefined_scope(scope: &str) -> FilterError {
        FilterError::UndefinedScope {
            collection: Self::collection_name(),
            scope: scope.to_string(),
        }
    }
}

/// Adapter exposing an entity's scopes through [`NamedScopes`].
struct EntityScopes<E>(PhantomData<E>);

impl<E: FilterableEntity> NamedScopes<Select<E>> for EntityScopes<E> {
    fn apply_scope(&self, query: Select<E>, name: &str, value: &TextOrList) -> Result<Select<E>, FilterError> {
        E::apply_scope(query, name, value)
    }
}

/// Build the filtered `Select` for an entity from request parameters.
///
/// Without a usable filter (missing keys, no allowed fields, blank terms) this is
/// `E::find()` with no conditions and no scopes. `backend` selects the SQL dialect the
/// conditions are written for, usually `db.get_database_backend()`.
///
/// # Errors
///
/// [`FilterError::UnknownEntity`] when the entity was never registered and
/// [`FilterError::UndefinedScope`] when an allowed scope is not implemented.
pub fn filtered_from<E: FilterableEntity>(
    registry: &FilterRegistry,
    params: &FilterParams,
    backend: DbBackend,
) -> Result<Select<E>, FilterError> {
    let collection = E::collection_name();
    let Some(spec) = registry.parse(&collection, params)? else {
        return Ok(E::find());
    };

    let table = E::default().table_name().to_string();
    let predicate = spec.predicate();
    let query = if predicate.is_match_all() {
        E::find()
    } else {
        E::find().filter(predicate.to_condition(&table, backend))
    };

    apply_scopes(query, &spec.scopes, &EntityScopes::<E>(PhantomData))
}
