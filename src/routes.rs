use crate::errors::FilterError;
use crate::params::FilterParams;
use crate::presentation::FilterFormState;
use crate::registry::FilterRegistry;
use crate::traits::{FilterableEntity, filtered_from};
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

/// Shared state for the filter handlers.
#[derive(Clone)]
pub struct FilterState {
    pub db: DatabaseConnection,
    pub registry: Arc<FilterRegistry>,
}

impl FilterState {
    #[must_use]
    pub fn new(db: DatabaseConnection, registry: FilterRegistry) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
        }
    }
}

/// Extracts the whole query string as a [`FilterParams`] bundle.
///
/// Bracketed keys (`filter[users][terms]=...`) are expanded into nested objects. A
/// missing or malformed query string yields an empty bundle, which means "no filter".
#[derive(Debug, Clone, Default)]
pub struct FilterQuery(pub FilterParams);

impl<S> FromRequestParts<S> for FilterQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        Ok(Self(FilterParams::from_query(query)))
    }
}

/// List the records of `E` matching the request's filter.
///
/// # Errors
///
/// Configuration and database errors are logged and returned as a 500 response.
pub async fn get_filtered<E>(
    State(state): State<FilterState>,
    FilterQuery(params): FilterQuery,
) -> Result<Json<Vec<<E as EntityTrait>::Model>>, FilterError>
where
    E: FilterableEntity,
    <E as EntityTrait>::Model: Serialize,
{
    let backend = state.db.get_database_backend();
    let query = filtered_from::<E>(&state.registry, &params, backend)?;
    let items = query.all(&state.db).await?;
    Ok(Json(items))
}

/// Describe the search form for `E`, including the filter currently requested.
///
/// # Errors
///
/// Returns a 500 response when `E` was never registered.
pub async fn get_filter_form<E>(
    State(state): State<FilterState>,
    FilterQuery(params): FilterQuery,
) -> Result<Json<FilterFormState>, FilterError>
where
    E: FilterableEntity,
{
    let form = FilterFormState::new(&state.registry, &E::collection_name(), &params)?;
    Ok(Json(form))
}
