use crate::config::{FilterMethod, Join};
use crate::terms::{LIKE_ESCAPE, Term};
use sea_orm::{
    Condition, DbBackend,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};
use serde_json::Value;

/// Logical description of a search: case-insensitive substring leaves joined by OR/AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// No-op filter
    MatchAll,
    /// `lower(field)` contains `lower(term)`
    Contains { field: String, term: Term },
    Any(Vec<Predicate>),
    All(Vec<Predicate>),
}

/// Build the predicate for a search.
///
/// Leaves are emitted term-major: for every term, one leaf per field. The flat list is
/// joined with AND for `all` and with OR for every other method, including `exact`
/// and `all_in_order` searches that target several fields.
#[must_use]
pub fn build(fields: &[String], terms: &[Term], method: FilterMethod) -> Predicate {
    let leaves: Vec<Predicate> = terms
        .iter()
        .flat_map(|term| {
            fields.iter().map(move |field| Predicate::Contains {
                field: field.clone(),
                term: term.clone(),
            })
        })
        .collect();

    if leaves.is_empty() {
        return Predicate::MatchAll;
    }

    match method.join() {
        Join::And => Predicate::All(leaves),
        Join::Or => Predicate::Any(leaves),
    }
}

impl Predicate {
    /// Join used at the top of the tree, if any.
    #[must_use]
    pub const fn join(&self) -> Option<Join> {
        match self {
            Self::Any(_) => Some(Join::Or),
            Self::All(_) => Some(Join::And),
            Self::MatchAll | Self::Contains { .. } => None,
        }
    }

    /// Every `Contains` leaf, depth first.
    #[must_use]
    pub fn leaves(&self) -> Vec<(&str, &Term)> {
        match self {
            Self::MatchAll => Vec::new(),
            Self::Contains { field, term } => vec![(field.as_str(), term)],
            Self::Any(children) | Self::All(children) => {
                children.iter().flat_map(Self::leaves).collect()
            }
        }
    }

    #[must_use]
    pub const fn is_match_all(&self) -> bool {
        matches!(self, Self::MatchAll)
    }

    /// Render as a Sea-ORM condition on columns qualified by `table`.
    ///
    /// Each leaf becomes `LOWER(table.field) LIKE '%term%' ESCAPE '!'`. On Postgres the
    /// column is cast to TEXT first, since `LOWER` rejects numeric and enum columns there.
    #[must_use]
    pub fn to_condition(&self, table: &str, backend: DbBackend) -> Condition {
        match self {
            Self::MatchAll => Condition::all(),
            Self::Contains { field, term } => {
                Condition::all().add(contains_expr(table, field, term, backend))
            }
            Self::Any(children) => children.iter().fold(Condition::any(), |acc, child| {
                acc.add(child.to_condition(table, backend))
            }),
            Self::All(children) => children.iter().fold(Condition::all(), |acc, child| {
                acc.add(child.to_condition(table, backend))
            }),
        }
    }

    /// Evaluate in memory. `lookup` returns the text of a field, `None` never matches.
    pub fn matches<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Self::MatchAll => true,
            Self::Contains { field, term } => lookup(field).is_some_and(|text| term.matches(&text)),
            Self::Any(children) => children.iter().any(|child| child.matches(lookup)),
            Self::All(children) => children.iter().all(|child| child.matches(lookup)),
        }
    }

    /// Evaluate against a JSON object. Non-string scalars are matched by their text form.
    #[must_use]
    pub fn matches_json(&self, record: &Value) -> bool {
        self.matches(&|field: &str| match record.get(field)? {
            Value::String(text) => Some(text.clone()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
            other => Some(other.to_string()),
        })
    }
}

fn contains_expr(table: &str, field: &str, term: &Term, backend: DbBackend) -> SimpleExpr {
    let column = Expr::col((Alias::new(table), Alias::new(field)));
    let text = match backend {
        DbBackend::Postgres => Expr::cast_as(column, Alias::new("TEXT")),
        // SQLite and MySQL coerce non-text values for LOWER themselves
        DbBackend::MySql | DbBackend::Sqlite => column.into(),
    };
    Expr::expr(Func::lower(text)).like(LikeExpr::new(term.like_pattern()).escape(LIKE_ESCAPE))
}
