// File: src/rules/expression.rs
// Purpose: Pipe-delimited rule expressions ("required|min:6") and the named predicate table

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{email, min_length, required, RuleTest};
use crate::error::RuleError;

/// One `name` or `name:argument` segment of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCall<'a> {
    pub name: &'a str,
    pub argument: Option<&'a str>,
}

impl<'a> RuleCall<'a> {
    /// Split an expression into its segments
    ///
    /// Segments are trimmed and empty ones dropped, so `"required| min:6 |"`
    /// yields `required` and `min` bound to `6`. Only the first `:` separates
    /// the argument.
    pub fn parse_all(expression: &'a str) -> Vec<RuleCall<'a>> {
        expression
            .split('|')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once(':') {
                Some((name, argument)) => RuleCall {
                    name: name.trim(),
                    argument: Some(argument.trim()),
                },
                None => RuleCall {
                    name: segment,
                    argument: None,
                },
            })
            .collect()
    }
}

impl fmt::Display for RuleCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument {
            Some(argument) => write!(f, "{}:{}", self.name, argument),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Builds a test from a call's optional argument
pub type PredicateFactory = Rc<dyn Fn(&RuleCall<'_>) -> Result<RuleTest, RuleError>>;

/// Named checks available to rule expressions
#[derive(Clone)]
pub struct PredicateTable {
    factories: HashMap<String, PredicateFactory>,
}

impl PredicateTable {
    /// Table without any checks
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// `required`, `email` and `min:N`
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert("required", |call| {
            no_argument(call)?;
            Ok(required())
        });
        table.insert("email", |call| {
            no_argument(call)?;
            Ok(email())
        });
        table.insert("min", |call| {
            let argument = call.argument.ok_or_else(|| RuleError::MissingArgument {
                name: call.name.to_string(),
            })?;
            let min = argument
                .parse::<usize>()
                .map_err(|_| RuleError::InvalidArgument {
                    name: call.name.to_string(),
                    argument: argument.to_string(),
                })?;
            Ok(min_length(min))
        });
        table
    }

    /// Register (or replace) a named check
    pub fn insert<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&RuleCall<'_>) -> Result<RuleTest, RuleError> + 'static,
    {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve one call against the table
    pub fn build(&self, call: &RuleCall<'_>) -> Result<RuleTest, RuleError> {
        let factory = self
            .factories
            .get(call.name)
            .ok_or_else(|| RuleError::UnknownRule {
                name: call.name.to_string(),
            })?;
        factory(call)
    }

    /// Compile a whole expression; fails on the first segment that does not resolve
    pub fn compile(&self, expression: &str) -> Result<Vec<RuleTest>, RuleError> {
        RuleCall::parse_all(expression)
            .iter()
            .map(|call| self.build(call))
            .collect()
    }
}

impl Default for PredicateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("PredicateTable").field("names", &names).finish()
    }
}

fn no_argument(call: &RuleCall<'_>) -> Result<(), RuleError> {
    match call.argument {
        Some(argument) => Err(RuleError::UnexpectedArgument {
            name: call.name.to_string(),
            argument: argument.to_string(),
        }),
        None => Ok(()),
    }
}
