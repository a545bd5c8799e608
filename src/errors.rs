//! # Error Handling
//!
//! Filtering itself never fails on bad user input: unknown methods, fields and scopes
//! are dropped and an empty search degrades to the unfiltered collection. The errors in
//! this module are programming or infrastructure errors:
//!
//! - **Setup errors** are returned while an entity's filter configuration is registered
//!   at startup and should abort application boot.
//! - **Request errors** (`UnknownEntity`, `UndefinedScope`, `Database`) mean the host
//!   application wired something up incorrectly or the database failed.
//!
//! When returned from an Axum handler the internal details are logged with `tracing`
//! and the client only sees a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum FilterError {
    /// An entity was configured with an empty column list
    NoColumns { collection: String },

    /// `only(..)` named a column the entity does not have
    UnknownColumn { collection: String, column: String },

    /// The configuration left no filterable fields
    NoFilterableFields { collection: String },

    /// The same collection was registered twice
    DuplicateEntity { collection: String },

    /// A filter was requested for a collection that was never registered
    UnknownEntity { collection: String },

    /// An allowed scope has no implementation on the entity
    UndefinedScope { collection: String, scope: String },

    /// Query execution failed
    Database(DbErr),
}

impl FilterError {
    /// True for errors raised while registering configuration.
    #[must_use]
    pub const fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::NoColumns { .. }
                | Self::UnknownColumn { .. }
                | Self::NoFilterableFields { .. }
                | Self::DuplicateEntity { .. }
        )
    }

    /// Attach the collection name to errors raised before it was known.
    pub(crate) fn for_collection(self, name: &str) -> Self {
        match self {
            Self::NoColumns { .. } => Self::NoColumns {
                collection: name.to_string(),
            },
            Self::UnknownColumn { column, .. } => Self::UnknownColumn {
                collection: name.to_string(),
                column,
            },
            Self::NoFilterableFields { .. } => Self::NoFilterableFields {
                collection: name.to_string(),
            },
            other => other,
        }
    }
}

/// Collection name for messages; errors from a standalone configuration have none.
struct Subject<'a>(&'a str);

impl fmt::Display for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("the collection")
        } else {
            write!(f, "'{}'", self.0)
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColumns { collection } => {
                write!(f, "cannot configure filtering for {}: no columns", Subject(collection))
            }
            Self::UnknownColumn { collection, column } => {
                write!(f, "'{column}' is not a column of {}", Subject(collection))
            }
            Self::NoFilterableFields { collection } => {
                write!(
                    f,
                    "filter configuration for {} leaves no filterable fields",
                    Subject(collection)
                )
            }
            Self::DuplicateEntity { collection } => {
                write!(f, "filtering for '{collection}' is already configured")
            }
            Self::UnknownEntity { collection } => {
                write!(f, "no filter configuration registered for '{collection}'")
            }
            Self::UndefinedScope { collection, scope } => {
                write!(f, "scope '{scope}' is allowed on '{collection}' but not implemented")
            }
            Self::Database(err) => write!(f, "database error: {err}"),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbErr> for FilterError {
    fn from(err: DbErr) -> Self {
        Self::Database(err)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        match &self {
            Self::Database(err) => {
                tracing::error!(error = %err, "Database error while filtering");
            }
            Self::UnknownEntity { collection } => {
                tracing::error!(%collection, "Filter requested for unregistered collection");
            }
            Self::UndefinedScope { collection, scope } => {
                tracing::error!(%collection, %scope, "Allowed scope has no implementation");
            }
            other => {
                tracing::error!(error = %other, "Filter configuration error");
            }
        }

        let body = Json(ErrorResponse {
            error: "Internal Server Error".to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_errors_are_flagged() {
        assert!(FilterError::NoColumns { collection: "users".into() }.is_setup_error());
        assert!(
            FilterError::DuplicateEntity {
                collection: "users".into()
            }
            .is_setup_error()
        );
        assert!(
            !FilterError::UnknownEntity {
                collection: "users".into()
            }
            .is_setup_error()
        );
    }

    #[test]
    fn test_collection_is_attached() {
        let err = FilterError::UnknownColumn {
            collection: String::new(),
            column: "nickname".into(),
        }
        .for_collection("users");
        assert_eq!(err.to_string(), "'nickname' is not a column of 'users'");
    }

    #[test]
    fn test_message_without_collection() {
        let err = FilterError::UnknownColumn {
            collection: String::new(),
            column: "email".into(),
        };
        assert_eq!(err.to_string(), "'email' is not a column of the collection");

        let err = FilterError::NoColumns {
            collection: String::new(),
        };
        assert_eq!(err.to_string(), "cannot configure filtering for the collection: no columns");
    }

    #[test]
    fn test_response_hides_internal_details() {
        let response = FilterError::UndefinedScope {
            collection: "users".into(),
            scope: "with_role".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
