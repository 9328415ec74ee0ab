//! Pipeline rule table
//!
//! Maps source files to the transform chain the bundling engine applies to
//! them. A table is validated when it is built: two rules that could both
//! claim the same file are rejected up front, so looking a file up never
//! has to pick a winner.

mod defaults;
mod rule;

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use defaults::default_rules;
pub use rule::{AssetClass, MatchPattern, PipelineRule, Scope, TransformStep};

/// Rule table construction errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("a match pattern needs at least one extension")]
    EmptyPattern,

    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("rule '{0}' has an empty transform chain")]
    EmptyChain(String),

    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),

    #[error("rules '{first}' and '{second}' can match the same file; separate them with include/exclude scopes")]
    Conflict { first: String, second: String },
}

/// A validated, ordered set of pipeline rules
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<PipelineRule>,
}

impl RuleTable {
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    pub fn rules(&self) -> &[PipelineRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule that handles `path`, if any
    pub fn rule_for(&self, path: &Path) -> Option<&PipelineRule> {
        self.rules.iter().find(|rule| rule.applies_to(path))
    }

    pub fn get(&self, name: &str) -> Option<&PipelineRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }
}

/// Collects rules and validates them as a whole
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    rules: Vec<PipelineRule>,
}

impl RuleTableBuilder {
    pub fn rule(mut self, rule: PipelineRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Result<RuleTable, PipelineError> {
        let mut names = HashSet::new();

        for rule in &self.rules {
            if rule.chain.is_empty() {
                return Err(PipelineError::EmptyChain(rule.name.clone()));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(PipelineError::DuplicateRule(rule.name.clone()));
            }
        }

        for (i, first) in self.rules.iter().enumerate() {
            for second in &self.rules[i + 1..] {
                if first.conflicts_with(second) {
                    return Err(PipelineError::Conflict {
                        first: first.name.clone(),
                        second: second.name.clone(),
                    });
                }
            }
        }

        debug!("Validated pipeline with {} rules", self.rules.len());

        Ok(RuleTable { rules: self.rules })
    }
}
