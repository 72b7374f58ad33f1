//! Declarative rule model, load-time validation, and eager compilation.

pub mod compile;
pub mod model;
pub mod validate;

pub use compile::{compile, CompiledRule, CompiledRuleSet};
pub use model::{FingerprintResult, Input, RawRule, RuleCatalogDocument, TECHNIQUE_STATIC};
pub use validate::{validate, RuleWarning, ValidationReport};
