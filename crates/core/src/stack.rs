//! Resource graph assembly.
//!
//! A [`Stack`] collects resource declarations in order and hands them to
//! [`crate::synth::synthesize`]. Construction is a single linear pass:
//! `add_*` methods append a resource and return a typed handle that later
//! declarations use to reference it. The only error this layer owns is a
//! duplicate construct id; everything else is deferred to the validation
//! rules or the external provisioning engine.

use crate::error::StackError;
use crate::iam::{
    InlinePolicy, ManagedPolicy, ManagedPolicyArn, PolicyDocument, Role, ServicePrincipal,
};
use crate::sagemaker::{InstanceType, NotebookInstance};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedPolicyHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotebookHandle(pub(crate) usize);

impl RoleHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum Resource {
    Role(Role),
    ManagedPolicy(ManagedPolicy),
    InlinePolicy(InlinePolicy),
    NotebookInstance(NotebookInstance),
}

impl Resource {
    pub fn construct_id(&self) -> &str {
        match self {
            Resource::Role(r) => &r.construct_id,
            Resource::ManagedPolicy(p) => &p.construct_id,
            Resource::InlinePolicy(p) => &p.construct_id,
            Resource::NotebookInstance(n) => &n.construct_id,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Role(_) => "AWS::IAM::Role",
            Resource::ManagedPolicy(_) => "AWS::IAM::ManagedPolicy",
            Resource::InlinePolicy(_) => "AWS::IAM::Policy",
            Resource::NotebookInstance(_) => "AWS::SageMaker::NotebookInstance",
        }
    }
}

pub struct RoleProps {
    pub assumed_by: ServicePrincipal,
    pub role_name: Option<String>,
}

pub struct Stack {
    name: String,
    description: Option<String>,
    resources: Vec<Resource>,
    construct_ids: HashSet<String>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            resources: Vec::new(),
            construct_ids: HashSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    fn register(&mut self, resource: Resource) -> Result<usize, StackError> {
        let id = resource.construct_id().to_string();
        if !self.construct_ids.insert(id.clone()) {
            return Err(StackError::DuplicateLogicalId(id));
        }
        debug!(construct_id = %id, resource_type = resource.resource_type(), "registered resource");
        self.resources.push(resource);
        Ok(self.resources.len() - 1)
    }

    pub fn add_role(&mut self, id: &str, props: RoleProps) -> Result<RoleHandle, StackError> {
        let index = self.register(Resource::Role(Role {
            construct_id: id.to_string(),
            role_name: props.role_name,
            assumed_by: props.assumed_by,
            managed_policies: Vec::new(),
        }))?;
        Ok(RoleHandle(index))
    }

    pub fn add_managed_policy(
        &mut self,
        id: &str,
        managed_policy_name: Option<&str>,
        document: PolicyDocument,
    ) -> Result<ManagedPolicyHandle, StackError> {
        let index = self.register(Resource::ManagedPolicy(ManagedPolicy {
            construct_id: id.to_string(),
            managed_policy_name: managed_policy_name.map(str::to_string),
            document,
        }))?;
        Ok(ManagedPolicyHandle(index))
    }

    pub fn add_inline_policy(
        &mut self,
        id: &str,
        policy_name: &str,
        document: PolicyDocument,
    ) -> Result<PolicyHandle, StackError> {
        let index = self.register(Resource::InlinePolicy(InlinePolicy {
            construct_id: id.to_string(),
            policy_name: policy_name.to_string(),
            document,
            roles: Vec::new(),
        }))?;
        Ok(PolicyHandle(index))
    }

    pub fn add_notebook_instance(
        &mut self,
        id: &str,
        instance_type: InstanceType,
        role: RoleHandle,
    ) -> Result<NotebookHandle, StackError> {
        self.expect_role(role)?;
        let index = self.register(Resource::NotebookInstance(NotebookInstance {
            construct_id: id.to_string(),
            instance_type,
            role,
        }))?;
        Ok(NotebookHandle(index))
    }

    /// Attaches a managed policy (imported or declared) to a role.
    pub fn attach_managed_policy(
        &mut self,
        role: RoleHandle,
        policy: ManagedPolicyArn,
    ) -> Result<(), StackError> {
        if let ManagedPolicyArn::Declared(handle) = &policy {
            self.expect_managed_policy(*handle)?;
        }
        match self.resources.get_mut(role.0) {
            Some(Resource::Role(r)) => {
                r.managed_policies.push(policy);
                Ok(())
            }
            _ => Err(StackError::BadHandle {
                index: role.0,
                expected: "role",
            }),
        }
    }

    /// Attaches an inline policy to a role, mirroring
    /// `role.attach_inline_policy(policy)`.
    pub fn attach_inline_policy(
        &mut self,
        role: RoleHandle,
        policy: PolicyHandle,
    ) -> Result<(), StackError> {
        self.expect_role(role)?;
        match self.resources.get_mut(policy.0) {
            Some(Resource::InlinePolicy(p)) => {
                p.roles.push(role);
                Ok(())
            }
            _ => Err(StackError::BadHandle {
                index: policy.0,
                expected: "inline policy",
            }),
        }
    }

    pub fn role(&self, handle: RoleHandle) -> Option<&Role> {
        match self.resources.get(handle.0) {
            Some(Resource::Role(r)) => Some(r),
            _ => None,
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = (RoleHandle, &Role)> {
        self.resources.iter().enumerate().filter_map(|(i, r)| match r {
            Resource::Role(role) => Some((RoleHandle(i), role)),
            _ => None,
        })
    }

    pub fn notebook_instances(&self) -> impl Iterator<Item = &NotebookInstance> {
        self.resources.iter().filter_map(|r| match r {
            Resource::NotebookInstance(n) => Some(n),
            _ => None,
        })
    }

    pub fn inline_policies(&self) -> impl Iterator<Item = &InlinePolicy> {
        self.resources.iter().filter_map(|r| match r {
            Resource::InlinePolicy(p) => Some(p),
            _ => None,
        })
    }

    pub fn managed_policy_resources(&self) -> impl Iterator<Item = &ManagedPolicy> {
        self.resources.iter().filter_map(|r| match r {
            Resource::ManagedPolicy(p) => Some(p),
            _ => None,
        })
    }

    fn expect_role(&self, handle: RoleHandle) -> Result<(), StackError> {
        match self.resources.get(handle.0) {
            Some(Resource::Role(_)) => Ok(()),
            _ => Err(StackError::BadHandle {
                index: handle.0,
                expected: "role",
            }),
        }
    }

    fn expect_managed_policy(&self, handle: ManagedPolicyHandle) -> Result<(), StackError> {
        match self.resources.get(handle.0) {
            Some(Resource::ManagedPolicy(_)) => Ok(()),
            _ => Err(StackError::BadHandle {
                index: handle.0,
                expected: "managed policy",
            }),
        }
    }
}
