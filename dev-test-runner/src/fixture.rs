//! One fixture: a record name, an input tree, and what re-encoding it should give.
use serde::Deserialize;
use serde_json::Value;

use crate::models;

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub record: String,
    pub input: Value,
    /// Tree expected after decode then encode. Compared ignoring key order.
    #[serde(default)]
    pub expect: Option<Value>,
    /// Substring of the expected error message.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
}

impl Fixture {
    pub fn check(&self) -> Outcome {
        let Some(round_trip) = models::lookup(&self.record) else {
            return Outcome::Fail(format!("unknown record `{}`", self.record));
        };
        match (round_trip(&self.input), &self.expect, &self.error) {
            (Ok(tree), Some(expect), _) if &tree == expect => Outcome::Pass,
            (Ok(tree), Some(expect), _) => Outcome::Fail(format!("expected {expect}, got {tree}")),
            (Ok(tree), None, Some(error)) => {
                Outcome::Fail(format!("expected an error containing {error:?}, got {tree}"))
            }
            (Ok(_), None, None) => Outcome::Pass,
            (Err(err), _, Some(error)) if err.to_string().contains(error.as_str()) => Outcome::Pass,
            (Err(err), _, _) => Outcome::Fail(err.to_string()),
        }
    }
}
