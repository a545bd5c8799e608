//! Parsing a request's filter parameters into a [`FilterSpec`].

use crate::config::{FilterConfig, FilterMethod, FilterSettings};
use crate::params::{EntityParams, FilterParams, TextOrList};
use crate::predicate::{self, Predicate};
use crate::scopes::ScopeInvocation;
use crate::terms::{self, Term};

/// Literal `fields` value selecting every allowed field
pub const ALL_FIELDS: &str = "all";

/// A normalized, ready to apply filter for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub method: FilterMethod,
    /// `fields` exactly as requested, for display
    pub raw_fields: TextOrList,
    /// `terms` exactly as requested, for display
    pub raw_terms: TextOrList,
    /// Requested fields that are allowed, in request order
    pub fields: Vec<String>,
    pub terms: Vec<Term>,
    pub scopes: Vec<ScopeInvocation>,
}

impl FilterSpec {
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        predicate::build(&self.fields, &self.terms, self.method)
    }
}

/// Parse the filter for `collection` out of `params`.
///
/// Returns `None` when the collection should not be filtered at all: the namespace or
/// collection key is missing, no requested field is allowed, or there are no terms.
/// Unknown methods, fields and scopes never cause an error.
#[must_use]
pub fn parse(
    params: &FilterParams,
    collection: &str,
    config: &FilterConfig,
    settings: &FilterSettings,
) -> Option<FilterSpec> {
    let Some(entity) = params.entity(&settings.namespace, collection) else {
        tracing::trace!(%collection, "No filter parameters");
        return None;
    };

    let method = resolve_method(entity.method.as_deref(), config);
    let raw_fields = entity.fields.clone().unwrap_or_default();
    let raw_terms = entity.terms.clone().unwrap_or_default();

    let fields = resolve_fields(&raw_fields, config);
    let terms = limit_terms(terms::normalize(&raw_terms, method), settings);

    if fields.is_empty() || terms.is_empty() {
        tracing::debug!(
            %collection,
            fields = fields.len(),
            terms = terms.len(),
            "Nothing to search for, returning unfiltered collection"
        );
        return None;
    }

    let scopes = resolve_scopes(&entity, config);
    tracing::debug!(
        %collection,
        %method,
        ?fields,
        terms = terms.len(),
        scopes = scopes.len(),
        "Parsed filter"
    );

    Some(FilterSpec {
        method,
        raw_fields,
        raw_terms,
        fields,
        terms,
        scopes,
    })
}

/// A recognized method name, otherwise the entity's default.
fn resolve_method(requested: Option<&str>, config: &FilterConfig) -> FilterMethod {
    match requested {
        Some(name) if !name.trim().is_empty() => name.trim().parse().unwrap_or_else(|()| {
            tracing::debug!(method = name, "Unknown filter method, using default");
            config.default_method()
        }),
        _ => config.default_method(),
    }
}

/// `"all"` selects every allowed field; otherwise keep allowed entries in request order.
fn resolve_fields(raw: &TextOrList, config: &FilterConfig) -> Vec<String> {
    if raw.as_text() == Some(ALL_FIELDS) {
        return config.allowed_fields().to_vec();
    }

    let mut fields: Vec<String> = Vec::new();
    for field in raw.words() {
        if !config.allows_field(&field) {
            tracing::debug!(%field, "Dropping field that is not filterable");
            continue;
        }
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    fields
}

fn resolve_scopes(entity: &EntityParams, config: &FilterConfig) -> Vec<ScopeInvocation> {
    entity
        .extra
        .iter()
        .filter_map(|(name, value)| {
            if !config.allows_scope(name) {
                tracing::trace!(scope = %name, "Ignoring parameter that is not an allowed scope");
                return None;
            }
            let value = TextOrList::from_value(value)?;
            Some(ScopeInvocation {
                name: name.clone(),
                value,
            })
        })
        .collect()
}

fn limit_terms(mut terms: Vec<Term>, settings: &FilterSettings) -> Vec<Term> {
    if terms.len() > settings.max_terms {
        tracing::warn!(
            requested = terms.len(),
            max = settings.max_terms,
            "Too many search terms, ignoring the rest"
        );
        terms.truncate(settings.max_terms);
    }

    for term in &mut terms {
        if term.truncate(settings.max_term_length) {
            tracing::warn!(max = settings.max_term_length, "Search term truncated");
        }
    }

    terms.retain(|term| !term.is_empty());
    terms
}
