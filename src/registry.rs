use crate::config::{FilterConfig, FilterConfigBuilder, FilterSettings};
use crate::errors::FilterError;
use crate::filter_spec::{self, FilterSpec};
use crate::params::FilterParams;
use crate::traits::FilterableEntity;
use sea_orm::{EntityTrait, IdenStatic, Iterable};
use std::collections::HashMap;

/// Filter configuration for every filterable collection.
///
/// Populate it while the application starts, then share it read-only, typically as
/// `Arc<FilterRegistry>` inside the router state.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    settings: FilterSettings,
    configs: HashMap<String, FilterConfig>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: FilterSettings) -> Self {
        Self {
            settings,
            configs: HashMap::new(),
        }
    }

    /// Register the filter configuration of `collection`.
    ///
    /// # Errors
    ///
    /// Any setup error from [`FilterConfig::configure`], or
    /// [`FilterError::DuplicateEntity`] when the collection is already registered.
    pub fn register<I, S, F>(
        &mut self,
        collection: &str,
        columns: I,
        configure: F,
    ) -> Result<&FilterConfig, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&mut FilterConfigBuilder),
    {
        if self.configs.contains_key(collection) {
            return Err(FilterError::DuplicateEntity {
                collection: collection.to_string(),
            });
        }

        let config = FilterConfig::configure(columns, configure)
            .map_err(|err| err.for_collection(collection))?;

        tracing::info!(
            %collection,
            fields = ?config.allowed_fields(),
            scopes = ?config.allowed_scopes(),
            default_method = %config.default_method(),
            "Registered filter configuration"
        );

        Ok(self
            .configs
            .entry(collection.to_string())
            .or_insert(config))
    }

    /// Register a Sea-ORM entity under [`FilterableEntity::collection_name`], with all
    /// of its columns.
    ///
    /// # Errors
    ///
    /// See [`FilterRegistry::register`].
    pub fn register_entity<E, F>(&mut self, configure: F) -> Result<&FilterConfig, FilterError>
    where
        E: FilterableEntity,
        F: FnOnce(&mut FilterConfigBuilder),
    {
        let columns: Vec<String> = <E as EntityTrait>::Column::iter()
            .map(|column| column.as_str().to_string())
            .collect();
        self.register(&E::collection_name(), columns, configure)
    }

    #[must_use]
    pub fn get(&self, collection: &str) -> Option<&FilterConfig> {
        self.configs.get(collection)
    }

    /// # Errors
    ///
    /// [`FilterError::UnknownEntity`] if the collection was never registered.
    pub fn config(&self, collection: &str) -> Result<&FilterConfig, FilterError> {
        self.get(collection).ok_or_else(|| FilterError::UnknownEntity {
            collection: collection.to_string(),
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Names of every registered collection, sorted.
    #[must_use]
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse the filter for a registered collection.
    ///
    /// # Errors
    ///
    /// [`FilterError::UnknownEntity`] if the collection was never registered.
    pub fn parse(&self, collection: &str, params: &FilterParams) -> Result<Option<FilterSpec>, FilterError> {
        let config = self.config(collection)?;
        Ok(filter_spec::parse(params, collection, config, &self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterMethod;
    use serde_json::json;

    mod user {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "users")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub first_name: String,
            pub last_name: String,
            pub login: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}

        impl crate::traits::FilterableEntity for Entity {}
    }

    mod person {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "people")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub name: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}

        impl crate::traits::FilterableEntity for Entity {
            fn collection_name() -> String {
                "members".to_string()
            }
        }
    }

    #[test]
    fn test_register_entity_keys_by_collection_name() {
        let mut registry = FilterRegistry::new();
        registry
            .register_entity::<person::Entity, _>(|cfg| {
                cfg.only(["name"]);
            })
            .unwrap();

        assert_eq!(registry.collections(), ["members"]);
        assert!(registry.get("people").is_none());
    }

    #[test]
    fn test_register_entity_uses_table_and_columns() {
        let mut registry = FilterRegistry::new();
        registry
            .register_entity::<user::Entity, _>(|cfg| {
                cfg.except(["id"]);
            })
            .unwrap();

        let config = registry.get("users").unwrap();
        assert_eq!(config.allowed_fields(), ["first_name", "last_name", "login"]);
        assert_eq!(registry.collections(), ["users"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = FilterRegistry::new();
        registry.register("users", ["name"], |_| {}).unwrap();
        let err = registry.register("users", ["name"], |_| {}).unwrap_err();
        assert!(matches!(err, FilterError::DuplicateEntity { collection } if collection == "users"));
    }

    #[test]
    fn test_setup_errors_name_the_collection() {
        let mut registry = FilterRegistry::new();
        let err = registry
            .register("users", ["name"], |cfg| {
                cfg.only(["email"]);
            })
            .unwrap_err();
        assert!(err.is_setup_error());
        assert_eq!(err.to_string(), "'email' is not a column of 'users'");
        assert!(registry.get("users").is_none());
    }

    #[test]
    fn test_parse_unknown_collection() {
        let registry = FilterRegistry::new();
        let err = registry.parse("users", &FilterParams::default()).unwrap_err();
        assert!(matches!(err, FilterError::UnknownEntity { .. }));
    }

    #[test]
    fn test_parse_uses_configured_namespace() {
        let mut registry = FilterRegistry::with_settings(FilterSettings {
            namespace: "search".to_string(),
            ..FilterSettings::default()
        });
        registry
            .register("users", ["first_name", "last_name"], |cfg| {
                cfg.default_method(FilterMethod::All);
            })
            .unwrap();

        let params = FilterParams::from(json!({"search": {"users": {"fields": "all", "terms": "a b"}}}));
        let spec = registry.parse("users", &params).unwrap().unwrap();
        assert_eq!(spec.method, FilterMethod::All);
        assert_eq!(spec.predicate().leaves().len(), 4);

        let params = FilterParams::from(json!({"filter": {"users": {"fields": "all", "terms": "a b"}}}));
        assert!(registry.parse("users", &params).unwrap().is_none());
    }
}
