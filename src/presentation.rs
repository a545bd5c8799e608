//! Read-only view of an entity's filter state for building search forms.
//!
//! Nothing here renders markup. [`FilterFormState`] carries what a template or a
//! frontend needs to draw the controls: parameter names, select options, and a summary
//! of the filter currently applied.

use crate::config::FilterConfig;
use crate::errors::FilterError;
use crate::filter_spec::ALL_FIELDS;
use crate::params::{FilterParams, TextOrList};
use crate::registry::FilterRegistry;
use serde::Serialize;
use utoipa::ToSchema;

/// One option of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Human readable summary of the filter in the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CurrentFilters {
    /// Requested fields as a sentence, e.g. "First Name and Last Name"
    pub fields: String,
    pub terms: Option<TextOrList>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterFormState {
    pub collection: String,
    /// Prefix of every control name, e.g. `filter[users]`
    pub param_prefix: String,
    pub fields: Vec<SelectOption>,
    pub methods: Vec<SelectOption>,
    pub scopes: Vec<String>,
    /// Submitted terms for prefilling the search box, present even without `fields`
    pub terms: Option<TextOrList>,
    pub current: Option<CurrentFilters>,
}

impl FilterFormState {
    /// # Errors
    ///
    /// [`FilterError::UnknownEntity`] if the collection was never registered.
    pub fn new(registry: &FilterRegistry, collection: &str, params: &FilterParams) -> Result<Self, FilterError> {
        let config = registry.config(collection)?;
        let namespace = &registry.settings().namespace;

        Ok(Self {
            collection: collection.to_string(),
            param_prefix: format!("{namespace}[{collection}]"),
            fields: field_options(config),
            methods: method_options(config),
            scopes: config.allowed_scopes().to_vec(),
            terms: params
                .entity(namespace, collection)
                .and_then(|entity| entity.terms),
            current: current_filters(params, namespace, collection),
        })
    }

    /// Full parameter name of a control, e.g. `filter[users][terms]`.
    #[must_use]
    pub fn param_name(&self, key: &str) -> String {
        format!("{}[{key}]", self.param_prefix)
    }
}

/// "All Columns" first, then every allowed field.
#[must_use]
pub fn field_options(config: &FilterConfig) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("All Columns", ALL_FIELDS))
        .chain(
            config
                .allowed_fields()
                .iter()
                .map(|field| SelectOption::new(titleize(field), field.as_str())),
        )
        .collect()
}

#[must_use]
pub fn method_options(config: &FilterConfig) -> Vec<SelectOption> {
    config
        .offered_methods()
        .into_iter()
        .map(|method| SelectOption::new(method.label(), method.as_str()))
        .collect()
}

/// Summary of the submitted filter, `None` when no fields were submitted.
#[must_use]
pub fn current_filters(params: &FilterParams, namespace: &str, collection: &str) -> Option<CurrentFilters> {
    let entity = params.entity(namespace, collection)?;
    let fields = entity.fields?;
    let names: Vec<String> = fields.words().iter().map(|field| titleize(field)).collect();

    Some(CurrentFilters {
        fields: to_sentence(&names),
        terms: entity.terms,
    })
}

/// `first_name` becomes `First Name`.
#[must_use]
pub fn titleize(name: &str) -> String {
    name.split(['_', ' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `["A", "B", "C"]` becomes `A, B, and C`.
#[must_use]
pub fn to_sentence(words: &[String]) -> String {
    match words {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}
