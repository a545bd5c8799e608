//! Chaining named refinements onto a filtered query.
//!
//! A scope is a named operation taking the query built so far plus a value from the
//! request, e.g. `with_role=admin`. Only scopes named in the entity's allow-list ever
//! reach this module.

use crate::errors::FilterError;
use crate::params::TextOrList;
use std::collections::HashMap;
use std::fmt;

/// One scope call taken from the request, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInvocation {
    pub name: String,
    pub value: TextOrList,
}

impl ScopeInvocation {
    pub fn new(name: impl Into<String>, value: impl Into<TextOrList>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Something that can apply named scopes to queries of type `Q`.
pub trait NamedScopes<Q> {
    /// Apply the scope `name` with `value` to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UndefinedScope`] when no scope by that name exists.
    fn apply_scope(&self, query: Q, name: &str, value: &TextOrList) -> Result<Q, FilterError>;
}

/// Fold the invocations over `base`, left to right.
///
/// # Errors
///
/// Fails on the first invocation the scope set cannot apply.
pub fn apply_scopes<Q, S>(base: Q, invocations: &[ScopeInvocation], scopes: &S) -> Result<Q, FilterError>
where
    S: NamedScopes<Q> + ?Sized,
{
    invocations.iter().try_fold(base, |query, invocation| {
        tracing::debug!(scope = %invocation.name, "Applying filter scope");
        scopes.apply_scope(query, &invocation.name, &invocation.value)
    })
}

type ScopeFn<Q> = Box<dyn Fn(Q, &TextOrList) -> Q + Send + Sync>;

/// A table of scope closures, for query types that are not Sea-ORM entities.
pub struct ScopeSet<Q> {
    collection: String,
    scopes: HashMap<String, ScopeFn<Q>>,
}

impl<Q> ScopeSet<Q> {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            scopes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn scope<F>(mut self, name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(Q, &TextOrList) -> Q + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Box::new(apply));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }
}

impl<Q> NamedScopes<Q> for ScopeSet<Q> {
    fn apply_scope(&self, query: Q, name: &str, value: &TextOrList) -> Result<Q, FilterError> {
        let apply = self.scopes.get(name).ok_or_else(|| FilterError::UndefinedScope {
            collection: self.collection.clone(),
            scope: name.to_string(),
        })?;
        Ok(apply(query, value))
    }
}

impl<Q> fmt::Debug for ScopeSet<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.scopes.keys().collect();
        names.sort();
        f.debug_struct("ScopeSet")
            .field("collection", &self.collection)
            .field("scopes", &names)
            .finish()
    }
}
