//! # filtercrate
//!
//! Free-text search over Sea-ORM collections, driven by request parameters.
//!
//! A request such as
//!
//! ```text
//! GET /users?filter[users][fields]=first_name last_name&filter[users][terms]=jer&filter[users][method]=any
//! ```
//!
//! is parsed into a [`FilterSpec`](filter_spec::FilterSpec), turned into a
//! [`Predicate`](predicate::Predicate) of case-insensitive substring matches, and applied
//! to `E::find()` together with any allowed named scopes.
//!
//! ## Methods
//!
//! - `any`: records matching any of the words
//! - `all`: records containing every word
//! - `exact`: records containing the exact phrase
//! - `all_in_order`: records containing every word, in order
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = FilterRegistry::new();
//! registry.register_entity::<user::Entity, _>(|cfg| {
//!     cfg.only(["first_name", "last_name", "login"])
//!         .allow_scopes(["with_role"])
//!         .default_method(FilterMethod::Any);
//! })?;
//!
//! let app = Router::new()
//!     .route("/users", get(get_filtered::<user::Entity>))
//!     .with_state(FilterState::new(db, registry));
//! ```

pub mod config;
pub mod errors;
pub mod filter_spec;
pub mod params;
pub mod predicate;
pub mod presentation;
pub mod registry;
pub mod routes;
pub mod scopes;
pub mod terms;
pub mod traits;

pub use config::{FilterConfig, FilterConfigBuilder, FilterMethod, FilterSettings};
pub use errors::FilterError;
pub use filter_spec::FilterSpec;
pub use params::{FilterParams, TextOrList};
pub use predicate::Predicate;
pub use registry::FilterRegistry;
pub use routes::{FilterQuery, FilterState, get_filter_form, get_filtered};
pub use traits::{FilterableEntity, filtered_from};
