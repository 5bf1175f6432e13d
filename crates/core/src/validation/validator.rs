use crate::stack::Stack;
use crate::validation::rules::{
    NonEmptyPolicyDocumentRule, ResolvableRoleReferenceRule, RoleHasPoliciesRule, ValidationRule,
    WellFormedArnRule, WellFormedPrincipalRule, WildcardResourceActionsRule,
};
use anyhow::Result;
use tracing::debug;

/// Result of running one rule, used by the CLI to report every failure
/// rather than stopping at the first.
pub struct RuleOutcome {
    pub rule: &'static str,
    pub result: Result<()>,
}

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// Fails on the first violated rule with a `[RuleName] message` error.
    pub fn validate(&self, stack: &Stack) -> Result<()> {
        for rule in &self.rules {
            if let Err(e) = rule.validate(stack) {
                anyhow::bail!("[{}] {}", rule.name(), e);
            }
            debug!(rule = rule.name(), "rule passed");
        }
        Ok(())
    }

    /// Runs every rule and reports each outcome.
    pub fn report(&self, stack: &Stack) -> Vec<RuleOutcome> {
        self.rules
            .iter()
            .map(|rule| RuleOutcome {
                rule: rule.name(),
                result: rule.validate(stack),
            })
            .collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(RoleHasPoliciesRule),
                Box::new(NonEmptyPolicyDocumentRule),
                Box::new(ResolvableRoleReferenceRule),
                Box::new(WildcardResourceActionsRule),
                Box::new(WellFormedArnRule),
                Box::new(WellFormedPrincipalRule),
            ],
        }
    }
}
