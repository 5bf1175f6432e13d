//! Deterministic synthesis of a [`Stack`] into a CloudFormation template.
//!
//! Determinism is the one correctness property required here: the same
//! declaration must produce byte-identical output on every invocation.
//! All maps are ordered (`serde_json`'s default `BTreeMap` backing) and
//! logical IDs are derived from stable construct paths, never from
//! counters or random state.

use crate::error::StackError;
use crate::iam::{InlinePolicy, ManagedPolicy, ManagedPolicyArn, Role};
use crate::sagemaker::NotebookInstance;
use crate::stack::{Resource, Stack};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// The synthesized resource-graph artifact. The schema consumed by the
/// provisioning engine is CloudFormation's; this type only guarantees the
/// rendering is deterministic.
#[derive(Debug, Clone)]
pub struct Template {
    description: Option<String>,
    resources: BTreeMap<String, Value>,
    logical_ids: BTreeMap<String, String>,
}

impl Template {
    pub fn resources(&self) -> &BTreeMap<String, Value> {
        &self.resources
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Maps a construct id back to its generated logical ID.
    pub fn logical_id(&self, construct_id: &str) -> Option<&str> {
        self.logical_ids.get(construct_id).map(String::as_str)
    }

    /// Logical IDs of all resources of the given CloudFormation type.
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, body)| body["Type"] == resource_type)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "AWSTemplateFormatVersion".to_string(),
            json!(TEMPLATE_FORMAT_VERSION),
        );
        if let Some(description) = &self.description {
            root.insert("Description".to_string(), json!(description));
        }
        root.insert("Resources".to_string(), json!(self.resources));
        Value::Object(root)
    }

    pub fn to_json(&self) -> Result<String, StackError> {
        let mut rendered = serde_json::to_string_pretty(&self.to_value())?;
        rendered.push('\n');
        Ok(rendered)
    }

    pub fn to_yaml(&self) -> Result<String, StackError> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }

    /// Content digest over the canonical (compact JSON) rendering.
    pub fn digest(&self) -> Result<String, StackError> {
        let canonical = serde_json::to_vec(&self.to_value())?;
        Ok(format!("sha256:{}", hex::encode(Sha256::digest(&canonical))))
    }
}

/// Stable logical ID: the alphanumeric part of the construct id plus an
/// 8-hex digest of the construct path within the stack.
fn logical_id(stack_name: &str, construct_id: &str) -> String {
    let sanitized: String = construct_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let path = format!("{}/{}", stack_name, construct_id);
    let digest = Sha256::digest(path.as_bytes());
    format!("{}{}", sanitized, hex::encode(&digest[..4]).to_uppercase())
}

pub fn synthesize(stack: &Stack) -> Result<Template, StackError> {
    let ids: Vec<String> = stack
        .resources()
        .iter()
        .map(|r| logical_id(stack.name(), r.construct_id()))
        .collect();

    let mut resources = BTreeMap::new();
    let mut logical_ids = BTreeMap::new();
    for (index, resource) in stack.resources().iter().enumerate() {
        let body = match resource {
            Resource::Role(role) => render_role(role, &ids)?,
            Resource::ManagedPolicy(policy) => render_managed_policy(policy),
            Resource::InlinePolicy(policy) => render_inline_policy(policy, &ids)?,
            Resource::NotebookInstance(notebook) => render_notebook(notebook, &ids)?,
        };
        debug!(
            logical_id = %ids[index],
            resource_type = resource.resource_type(),
            "rendered resource"
        );
        resources.insert(ids[index].clone(), body);
        logical_ids.insert(resource.construct_id().to_string(), ids[index].clone());
    }

    Ok(Template {
        description: stack.description().map(str::to_string),
        resources,
        logical_ids,
    })
}

fn reference<'a>(
    ids: &'a [String],
    index: usize,
    expected: &'static str,
) -> Result<&'a str, StackError> {
    ids.get(index)
        .map(String::as_str)
        .ok_or(StackError::BadHandle { index, expected })
}

fn render_role(role: &Role, ids: &[String]) -> Result<Value, StackError> {
    let mut properties = Map::new();
    properties.insert(
        "AssumeRolePolicyDocument".to_string(),
        role.assumed_by().assume_role_document(),
    );

    if !role.managed_policies().is_empty() {
        let mut arns = Vec::new();
        for policy in role.managed_policies() {
            arns.push(match policy {
                ManagedPolicyArn::Literal(arn) => json!(arn),
                // Ref on AWS::IAM::ManagedPolicy yields the policy ARN.
                ManagedPolicyArn::Declared(handle) => {
                    json!({ "Ref": reference(ids, handle.0, "managed policy")? })
                }
            });
        }
        properties.insert("ManagedPolicyArns".to_string(), Value::Array(arns));
    }

    if let Some(name) = role.role_name() {
        properties.insert("RoleName".to_string(), json!(name));
    }

    Ok(json!({ "Type": "AWS::IAM::Role", "Properties": properties }))
}

fn render_managed_policy(policy: &ManagedPolicy) -> Value {
    let mut properties = Map::new();
    if let Some(name) = policy.managed_policy_name() {
        properties.insert("ManagedPolicyName".to_string(), json!(name));
    }
    properties.insert("PolicyDocument".to_string(), policy.document().to_value());
    json!({ "Type": "AWS::IAM::ManagedPolicy", "Properties": properties })
}

fn render_inline_policy(policy: &InlinePolicy, ids: &[String]) -> Result<Value, StackError> {
    let mut roles = Vec::new();
    for role in policy.roles() {
        roles.push(json!({ "Ref": reference(ids, role.index(), "role")? }));
    }
    Ok(json!({
        "Type": "AWS::IAM::Policy",
        "Properties": {
            "PolicyDocument": policy.document().to_value(),
            "PolicyName": policy.policy_name(),
            "Roles": roles,
        },
    }))
}

fn render_notebook(notebook: &NotebookInstance, ids: &[String]) -> Result<Value, StackError> {
    let role_id = reference(ids, notebook.role().index(), "role")?;
    Ok(json!({
        "Type": "AWS::SageMaker::NotebookInstance",
        "Properties": {
            "InstanceType": notebook.instance_type().as_str(),
            "RoleArn": { "Fn::GetAtt": [role_id, "Arn"] },
        },
    }))
}
