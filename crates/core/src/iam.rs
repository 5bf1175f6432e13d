//! IAM data model: policy statements, policy documents, roles.
//!
//! These types are inert descriptions. Nothing here talks to AWS; the
//! provisioning engine consuming the synthesized template owns all
//! validation and lifecycle beyond the structural checks in
//! [`crate::validation`].

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const POLICY_DOCUMENT_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// A service principal such as `sagemaker.amazonaws.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipal {
    service: String,
}

impl ServicePrincipal {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Trust policy document granting `sts:AssumeRole` to this principal.
    pub fn assume_role_document(&self) -> Value {
        json!({
            "Version": POLICY_DOCUMENT_VERSION,
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": self.service },
            }],
        })
    }
}

/// One allow/deny rule over actions, resource patterns, and optional
/// conditions. Actions and resources keep declaration order; that order
/// is part of the synthesized output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyStatement {
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<String>,
    conditions: BTreeMap<String, BTreeMap<String, String>>,
}

impl PolicyStatement {
    pub fn allow() -> Self {
        Self {
            effect: Effect::Allow,
            ..Default::default()
        }
    }

    pub fn deny() -> Self {
        Self {
            effect: Effect::Deny,
            ..Default::default()
        }
    }

    pub fn add_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn add_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    /// Adds a single condition predicate, e.g.
    /// `("StringEquals", "iam:PassedToService", "sagemaker.amazonaws.com")`.
    pub fn with_condition(mut self, operator: &str, key: &str, value: &str) -> Self {
        self.conditions
            .entry(operator.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn conditions(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.conditions
    }

    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("Action".to_string(), json!(self.actions));
        obj.insert("Effect".to_string(), json!(self.effect.as_str()));
        obj.insert("Resource".to_string(), json!(self.resources));
        if !self.conditions.is_empty() {
            obj.insert("Condition".to_string(), json!(self.conditions));
        }
        Value::Object(obj)
    }
}

/// An ordered list of statements rendered as a 2012-10-17 policy document.
#[derive(Debug, Clone, Default)]
pub struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(mut self, statement: PolicyStatement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn to_value(&self) -> Value {
        json!({
            "Version": POLICY_DOCUMENT_VERSION,
            "Statement": self.statements.iter().map(|s| s.to_value()).collect::<Vec<_>>(),
        })
    }
}

/// Reference to a managed policy attached to a role: either a
/// provider-owned policy identified by a literal ARN, or a
/// customer-managed policy declared in the same stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedPolicyArn {
    Literal(String),
    Declared(crate::stack::ManagedPolicyHandle),
}

impl ManagedPolicyArn {
    pub fn literal(arn: impl Into<String>) -> Self {
        ManagedPolicyArn::Literal(arn.into())
    }
}

/// An assumable identity with a trust principal and attached policies.
#[derive(Debug, Clone)]
pub struct Role {
    pub(crate) construct_id: String,
    pub(crate) role_name: Option<String>,
    pub(crate) assumed_by: ServicePrincipal,
    pub(crate) managed_policies: Vec<ManagedPolicyArn>,
}

impl Role {
    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role_name.as_deref()
    }

    pub fn assumed_by(&self) -> &ServicePrincipal {
        &self.assumed_by
    }

    pub fn managed_policies(&self) -> &[ManagedPolicyArn] {
        &self.managed_policies
    }
}

/// A customer-managed policy declared as its own resource.
#[derive(Debug, Clone)]
pub struct ManagedPolicy {
    pub(crate) construct_id: String,
    pub(crate) managed_policy_name: Option<String>,
    pub(crate) document: PolicyDocument,
}

impl ManagedPolicy {
    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    pub fn managed_policy_name(&self) -> Option<&str> {
        self.managed_policy_name.as_deref()
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }
}

/// An inline policy attached to one or more roles.
#[derive(Debug, Clone)]
pub struct InlinePolicy {
    pub(crate) construct_id: String,
    pub(crate) policy_name: String,
    pub(crate) document: PolicyDocument,
    pub(crate) roles: Vec<crate::stack::RoleHandle>,
}

impl InlinePolicy {
    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    pub fn roles(&self) -> &[crate::stack::RoleHandle] {
        &self.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_defaults_to_allow() {
        let statement = PolicyStatement::default();
        assert_eq!(statement.effect(), Effect::Allow);
        assert!(statement.actions().is_empty());
    }

    #[test]
    fn statement_keeps_action_order() {
        let statement = PolicyStatement::allow()
            .add_actions(["s3:GetObject"])
            .add_actions(["s3:PutObject", "s3:DeleteObject"]);
        assert_eq!(
            statement.actions(),
            ["s3:GetObject", "s3:PutObject", "s3:DeleteObject"]
        );
    }

    #[test]
    fn statement_renders_condition_block() {
        let statement = PolicyStatement::allow()
            .add_actions(["iam:PassRole"])
            .add_resources(["*"])
            .with_condition("StringEquals", "iam:PassedToService", "sagemaker.amazonaws.com");
        let value = statement.to_value();
        assert_eq!(
            value["Condition"]["StringEquals"]["iam:PassedToService"],
            "sagemaker.amazonaws.com"
        );
    }

    #[test]
    fn statement_omits_empty_condition() {
        let statement = PolicyStatement::allow().add_actions(["s3:ListBucket"]);
        let value = statement.to_value();
        assert!(value.get("Condition").is_none());
    }

    #[test]
    fn deny_statement_renders_deny_effect() {
        let statement = PolicyStatement::deny().add_actions(["s3:*"]).add_resources(["*"]);
        assert_eq!(statement.to_value()["Effect"], "Deny");
    }

    #[test]
    fn document_renders_version_and_statements() {
        let document = PolicyDocument::new().with_statement(
            PolicyStatement::allow()
                .add_actions(["s3:GetObject"])
                .add_resources(["arn:aws:s3:::*"]),
        );
        let value = document.to_value();
        assert_eq!(value["Version"], POLICY_DOCUMENT_VERSION);
        assert_eq!(value["Statement"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn assume_role_document_names_principal() {
        let principal = ServicePrincipal::new("sagemaker.amazonaws.com");
        let value = principal.assume_role_document();
        assert_eq!(
            value["Statement"][0]["Principal"]["Service"],
            "sagemaker.amazonaws.com"
        );
        assert_eq!(value["Statement"][0]["Action"], "sts:AssumeRole");
    }
}
