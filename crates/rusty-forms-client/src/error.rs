// File: src/error.rs
// Purpose: Errors raised while building a form's rule catalog

use thiserror::Error;

/// A rule declaration that cannot be turned into a test
///
/// Failing validation is not an error; it is the message a test returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unknown validation rule `{name}`")]
    UnknownRule { name: String },

    #[error("rule `{name}` requires an argument, e.g. `{name}:6`")]
    MissingArgument { name: String },

    #[error("rule `{name}` does not take an argument (got `{argument}`)")]
    UnexpectedArgument { name: String, argument: String },

    #[error("invalid argument `{argument}` for rule `{name}`")]
    InvalidArgument { name: String, argument: String },

    #[error("rule `{rule}` names neither a selector nor a field name")]
    MissingLocator { rule: String },
}
