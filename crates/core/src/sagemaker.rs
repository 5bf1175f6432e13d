//! SageMaker resource model.

use crate::error::StackError;
use crate::stack::RoleHandle;

/// A notebook instance size class such as `ml.t2.medium`.
///
/// Only the `ml.<family>.<size>` shape is checked here; whether the class
/// actually exists is the provisioning engine's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceType(String);

impl InstanceType {
    pub fn new(class: impl Into<String>) -> Result<Self, StackError> {
        let class = class.into();
        let mut parts = class.split('.');
        let well_formed = parts.next() == Some("ml")
            && parts.next().map(|p| !p.is_empty()).unwrap_or(false)
            && parts.next().map(|p| !p.is_empty()).unwrap_or(false)
            && parts.next().is_none();
        if !well_formed {
            return Err(StackError::InvalidInstanceType(class));
        }
        Ok(Self(class))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A provisioned notebook compute resource running as a [`crate::iam::Role`]
/// declared in the same stack. Lifecycle (create, in-place update, teardown)
/// is entirely owned by the external provisioning engine.
#[derive(Debug, Clone)]
pub struct NotebookInstance {
    pub(crate) construct_id: String,
    pub(crate) instance_type: InstanceType,
    pub(crate) role: RoleHandle,
}

impl NotebookInstance {
    pub fn construct_id(&self) -> &str {
        &self.construct_id
    }

    pub fn instance_type(&self) -> &InstanceType {
        &self.instance_type
    }

    pub fn role(&self) -> RoleHandle {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_class() {
        let ty = InstanceType::new("ml.t2.medium").unwrap();
        assert_eq!(ty.as_str(), "ml.t2.medium");
    }

    #[test]
    fn rejects_missing_family() {
        assert!(InstanceType::new("ml.medium").is_err());
    }

    #[test]
    fn rejects_ec2_style_class() {
        assert!(InstanceType::new("t2.medium").is_err());
    }

    #[test]
    fn rejects_trailing_segment() {
        assert!(InstanceType::new("ml.t2.medium.extra").is_err());
    }
}
