//! Per-entity filter configuration and process-wide filter settings.
//!
//! A [`FilterConfig`] is built once, when an entity type is registered, by running a
//! closure against a [`FilterConfigBuilder`]:
//!
//! ```rust
//! use filtercrate::config::{FilterConfig, FilterMethod};
//!
//! let config = FilterConfig::configure(["id", "first_name", "last_name", "login"], |cfg| {
//!     cfg.only(["first_name", "last_name", "login"])
//!         .allow_scopes(["with_role"])
//!         .default_method(FilterMethod::All);
//! })
//! .unwrap();
//!
//! assert_eq!(config.allowed_fields(), ["first_name", "last_name", "login"]);
//! ```

use crate::errors::FilterError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// How search terms are matched against fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterMethod {
    /// Records matching any of the words
    #[default]
    Any,
    /// Records containing all of the words
    All,
    /// Records containing the exact phrase
    Exact,
    /// Records containing all of the words, in order
    AllInOrder,
}

/// How the leaf conditions of a predicate are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    Or,
    And,
}

impl FilterMethod {
    pub const ALL: [Self; 4] = [Self::Any, Self::All, Self::Exact, Self::AllInOrder];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::All => "all",
            Self::Exact => "exact",
            Self::AllInOrder => "all_in_order",
        }
    }

    /// Human readable label used by selection controls
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::All => "All",
            Self::Exact => "Exact Phrase",
            Self::AllInOrder => "All in Order",
        }
    }

    /// Only `all` joins with AND. Single-term methods still OR across fields.
    #[must_use]
    pub const fn join(self) -> Join {
        match self {
            Self::All => Join::And,
            Self::Any | Self::Exact | Self::AllInOrder => Join::Or,
        }
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or(())
    }
}

/// Process-wide settings shared by every entity.
///
/// Deserializable so hosts can read it from their own configuration file; every field
/// falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Top-level parameter key holding all filters, `filter` by default.
    pub namespace: String,
    /// Maximum number of terms used from a single request.
    pub max_terms: usize,
    /// Maximum length of a single term, in characters.
    pub max_term_length: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            namespace: "filter".to_string(),
            max_terms: 32,
            max_term_length: 10_000,
        }
    }
}

/// Filter configuration for one entity type. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    allowed_fields: Vec<String>,
    allowed_scopes: Vec<String>,
    default_method: FilterMethod,
    default_method_options: Map<String, Value>,
}

impl FilterConfig {
    /// Build a configuration for an entity with the given storage columns.
    ///
    /// If the block calls neither `only` nor `except`, every column is filterable.
    ///
    /// # Errors
    ///
    /// Returns a setup error when `columns` is empty, when `only` names an unknown
    /// column, or when the resulting field list is empty.
    pub fn configure<I, S, F>(columns: I, block: F) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&mut FilterConfigBuilder),
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(FilterError::NoColumns {
                collection: String::new(),
            });
        }

        let mut builder = FilterConfigBuilder::new(columns);
        block(&mut builder);
        builder.finish()
    }

    #[must_use]
    pub fn allowed_fields(&self) -> &[String] {
        &self.allowed_fields
    }

    #[must_use]
    pub fn allowed_scopes(&self) -> &[String] {
        &self.allowed_scopes
    }

    #[must_use]
    pub const fn default_method(&self) -> FilterMethod {
        self.default_method
    }

    #[must_use]
    pub const fn default_method_options(&self) -> &Map<String, Value> {
        &self.default_method_options
    }

    #[must_use]
    pub fn allows_field(&self, field: &str) -> bool {
        self.allowed_fields.iter().any(|allowed| allowed == field)
    }

    #[must_use]
    pub fn allows_scope(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|allowed| allowed == scope)
    }

    /// Methods offered to users: the `allowed` list from the default method options
    /// when present, otherwise every method.
    #[must_use]
    pub fn offered_methods(&self) -> Vec<FilterMethod> {
        let Some(Value::Array(allowed)) = self.default_method_options.get("allowed") else {
            return FilterMethod::ALL.to_vec();
        };

        let offered: Vec<FilterMethod> = FilterMethod::ALL
            .into_iter()
            .filter(|method| {
                allowed
                    .iter()
                    .any(|name| name.as_str() == Some(method.as_str()))
            })
            .collect();

        if offered.is_empty() {
            FilterMethod::ALL.to_vec()
        } else {
            offered
        }
    }
}

/// Receiver for the configuration block passed to [`FilterConfig::configure`].
#[derive(Debug)]
pub struct FilterConfigBuilder {
    columns: Vec<String>,
    allowed_fields: Vec<String>,
    allowed_scopes: Vec<String>,
    default_method: FilterMethod,
    default_method_options: Map<String, Value>,
    error: Option<FilterError>,
}

impl FilterConfigBuilder {
    fn new(columns: Vec<String>) -> Self {
        Self {
            allowed_fields: columns.clone(),
            columns,
            allowed_scopes: Vec::new(),
            default_method: FilterMethod::default(),
            default_method_options: Map::new(),
            error: None,
        }
    }

    /// Restrict filtering to exactly these fields.
    pub fn only<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if self.error.is_none()
            && let Some(unknown) = fields.iter().find(|field| !self.columns.contains(field))
        {
            self.error = Some(FilterError::UnknownColumn {
                collection: String::new(),
                column: unknown.clone(),
            });
        }
        self.allowed_fields = fields;
        self
    }

    /// Remove these fields from the filterable set.
    pub fn except<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let excluded: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.allowed_fields.retain(|field| !excluded.contains(field));
        self
    }

    /// Named scopes that may be chained onto a filtered query.
    pub fn allow_scopes<I, S>(&mut self, scopes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_method(&mut self, method: FilterMethod) -> &mut Self {
        self.default_method_with_options(Some(method), Map::new())
    }

    /// Set the default method along with options such as `{"allowed": ["any", "all"]}`.
    /// A missing method falls back to `any`.
    pub fn default_method_with_options(
        &mut self,
        method: Option<FilterMethod>,
        options: Map<String, Value>,
    ) -> &mut Self {
        self.default_method = method.unwrap_or_default();
        self.default_method_options = options;
        self
    }

    fn finish(mut self) -> Result<FilterConfig, FilterError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let mut fields: Vec<String> = Vec::with_capacity(self.allowed_fields.len());
        for field in self.allowed_fields {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        if fields.is_empty() {
            return Err(FilterError::NoFilterableFields {
                collection: String::new(),
            });
        }

        Ok(FilterConfig {
            allowed_fields: fields,
            allowed_scopes: self.allowed_scopes,
            default_method: self.default_method,
            default_method_options: self.default_method_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: [&str; 4] = ["id", "first_name", "last_name", "login"];

    #[test]
    fn test_defaults_allow_every_column() {
        let config = FilterConfig::configure(COLUMNS, |_| {}).unwrap();
        assert_eq!(config.allowed_fields(), COLUMNS);
        assert!(config.allowed_scopes().is_empty());
        assert_eq!(config.default_method(), FilterMethod::Any);
        assert!(config.default_method_options().is_empty());
    }

    #[test]
    fn test_only_replaces_fields() {
        let config = FilterConfig::configure(COLUMNS, |cfg| {
            cfg.only(["last_name", "first_name"]);
        })
        .unwrap();
        assert_eq!(config.allowed_fields(), ["last_name", "first_name"]);
    }

    #[test]
    fn test_only_rejects_unknown_column() {
        let err = FilterConfig::configure(COLUMNS, |cfg| {
            cfg.only(["nickname"]);
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::UnknownColumn { column, .. } if column == "nickname"));
    }

    /// `except` narrows the allowed fields for every later request.
    #[test]
    fn test_except_persists_exclusion() {
        let config = FilterConfig::configure(COLUMNS, |cfg| {
            cfg.except(["id"]);
        })
        .unwrap();
        assert_eq!(config.allowed_fields(), ["first_name", "last_name", "login"]);
        assert!(!config.allows_field("id"));
    }

    #[test]
    fn test_excluding_everything_is_a_setup_error() {
        let err = FilterConfig::configure(COLUMNS, |cfg| {
            cfg.except(COLUMNS);
        })
        .unwrap_err();
        assert!(matches!(err, FilterError::NoFilterableFields { .. }));
    }

    #[test]
    fn test_empty_columns_is_a_setup_error() {
        let err = FilterConfig::configure(Vec::<String>::new(), |_| {}).unwrap_err();
        assert!(matches!(err, FilterError::NoColumns { .. }));
    }

    #[test]
    fn test_default_method_falls_back_to_any() {
        let config = FilterConfig::configure(COLUMNS, |cfg| {
            cfg.default_method(FilterMethod::Exact)
                .default_method_with_options(None, Map::new());
        })
        .unwrap();
        assert_eq!(config.default_method(), FilterMethod::Any);
    }

    #[test]
    fn test_offered_methods_follow_allowed_option() {
        let options = json!({"allowed": ["all_in_order", "any"]});
        let config = FilterConfig::configure(COLUMNS, |cfg| {
            cfg.default_method_with_options(
                Some(FilterMethod::Any),
                options.as_object().cloned().unwrap_or_default(),
            );
        })
        .unwrap();
        assert_eq!(
            config.offered_methods(),
            vec![FilterMethod::Any, FilterMethod::AllInOrder]
        );
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in FilterMethod::ALL {
            assert_eq!(method.as_str().parse::<FilterMethod>(), Ok(method));
        }
        assert!("fuzzy".parse::<FilterMethod>().is_err());
        assert_eq!(FilterMethod::AllInOrder.to_string(), "all_in_order");
    }

    #[test]
    fn test_only_all_joins_with_and() {
        assert_eq!(FilterMethod::All.join(), Join::And);
        assert_eq!(FilterMethod::Any.join(), Join::Or);
        assert_eq!(FilterMethod::Exact.join(), Join::Or);
        assert_eq!(FilterMethod::AllInOrder.join(), Join::Or);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: FilterSettings = serde_json::from_value(json!({"max_terms": 4})).unwrap();
        assert_eq!(settings.namespace, "filter");
        assert_eq!(settings.max_terms, 4);
        assert_eq!(settings.max_term_length, 10_000);
    }
}
