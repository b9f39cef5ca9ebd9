//! # Derived Attributes
//!
//! **Named facts from JSON documents, declared as sentences**
//!
//! Every derived attribute is a subject-verb-object sentence. The subject and
//! object are the input document, another attribute, or a literal; the verb
//! is one of a fixed library of comparisons, aggregations and path queries.
//! Sentences may reference each other in any order, and the engine resolves
//! them in dependency order.
//!
//! ## Quick Start
//!
//! ```rust
//! use derived::{DeriveResult, Engine, SentenceRecord};
//! use serde_json::json;
//!
//! fn main() -> DeriveResult<()> {
//!     let engine = Engine::from_records(vec![
//!         SentenceRecord::new("has_many_items", "_item_count", ">").object(2),
//!         SentenceRecord::new("_item_count", "source", "parse_len").object("$.items[*]"),
//!     ])?;
//!
//!     let derived = engine.derive(&json!({ "items": [1, 2, 3] }))?;
//!     assert_eq!(derived.get("has_many_items"), Some(&json!(true)));
//!     assert!(!derived.contains("_item_count"));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Sentences
//! A sentence names one attribute. Names starting with `_` are private: they
//! can be referenced but are left out of results.
//!
//! ### Rules
//! Public sentences whose value is a boolean. [`Engine::derive_rules`]
//! returns only those.
//!
//! ### Triggers
//! Sentences carrying an action. When a trigger's value is exactly `true`,
//! [`Engine::derive_triggers`] hands the action and its named params to an
//! [`EventHandler`].
//!
//! ### Path queries
//! The `parse*` verbs evaluate a JSONPath expression against their subject;
//! the `*_jsonata` variants evaluate JSONata instead.

pub mod analysis;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod query;
pub mod resource_limits;
pub mod response;
pub mod semantic;
pub mod validator;
pub mod value;
pub mod verbs;

pub use engine::Engine;
pub use error::{BoxError, DeriveError, DeriveResult};
pub use evaluator::context::{EvaluationContext, Status};
pub use evaluator::triggers::EventHandler;
pub use evaluator::Evaluator;
pub use query::{QueryAdapter, QueryBackend, QueryError, QueryLanguage, QueryMode};
pub use resource_limits::ResourceLimits;
pub use response::{ActionRecord, Derived, RuleResult, RuleResults, TriggerOutcome};
pub use semantic::{
    is_private, split_params, Reference, Sentence, SentenceRecord, SentenceSet, PRIVATE_MARKER,
    SOURCE_TOKEN,
};
pub use validator::Validator;
pub use verbs::{Verb, VerbEnv, VerbError};

#[cfg(test)]
mod tests;
