//! Structural rules over the declared resource graph.
//!
//! These are the only checks this repository owns. ARN well-formedness
//! here is a shape check that catches literal typos; full validation
//! stays with the provisioning engine.

use crate::iam::Effect;
use crate::stack::Stack;
use anyhow::Result;
use regex::Regex;

pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, stack: &Stack) -> Result<()>;
}

/// Every declared role must carry at least one attached policy (managed
/// or inline) before a compute resource runs as it.
pub struct RoleHasPoliciesRule;

impl ValidationRule for RoleHasPoliciesRule {
    fn name(&self) -> &'static str {
        "RoleHasPolicies"
    }

    fn validate(&self, stack: &Stack) -> Result<()> {
        for (handle, role) in stack.roles() {
            let has_inline = stack
                .inline_policies()
                .any(|policy| policy.roles().contains(&handle));
            if role.managed_policies().is_empty() && !has_inline {
                anyhow::bail!(
                    "role '{}' has no attached policies granting it usable permissions",
                    role.construct_id()
                );
            }
        }
        Ok(())
    }
}

/// Every notebook instance's role reference must resolve to a role
/// declared in the same stack.
pub struct ResolvableRoleReferenceRule;

impl ValidationRule for ResolvableRoleReferenceRule {
    fn name(&self) -> &'static str {
        "ResolvableRoleReference"
    }

    fn validate(&self, stack: &Stack) -> Result<()> {
        for notebook in stack.notebook_instances() {
            if stack.role(notebook.role()).is_none() {
                anyhow::bail!(
                    "notebook instance '{}' references a role not declared in this stack",
                    notebook.construct_id()
                );
            }
        }
        Ok(())
    }
}

/// Declared policy resources must carry at least one statement; an
/// empty document grants nothing and only clutters the graph.
pub struct NonEmptyPolicyDocumentRule;

impl ValidationRule for NonEmptyPolicyDocumentRule {
    fn name(&self) -> &'static str {
        "NonEmptyPolicyDocument"
    }

    fn validate(&self, stack: &Stack) -> Result<()> {
        for policy in stack.managed_policy_resources() {
            if policy.document().is_empty() {
                anyhow::bail!(
                    "managed policy '{}' has an empty policy document",
                    policy.construct_id()
                );
            }
        }
        for policy in stack.inline_policies() {
            if policy.document().is_empty() {
                anyhow::bail!(
                    "inline policy '{}' has an empty policy document",
                    policy.construct_id()
                );
            }
        }
        Ok(())
    }
}

/// Allow-statements with a wildcard resource pattern must enumerate
/// explicit actions; a `*` action against a wildcard resource is never
/// acceptable without review.
pub struct WildcardResourceActionsRule;

impl ValidationRule for WildcardResourceActionsRule {
    fn name(&self) -> &'static str {
        "WildcardResourceActions"
    }

    fn validate(&self, stack: &Stack) -> Result<()> {
        for (owner, statement) in all_statements(stack) {
            let wildcard_resource = statement.resources().iter().any(|r| r.contains('*'));
            if statement.effect() == Effect::Allow && wildcard_resource {
                if statement.actions().is_empty() {
                    anyhow::bail!(
                        "policy '{}' allows a wildcard resource with no explicit actions",
                        owner
                    );
                }
                if statement.actions().iter().any(|a| a == "*") {
                    anyhow::bail!(
                        "policy '{}' allows action '*' against a wildcard resource",
                        owner
                    );
                }
            }
        }
        Ok(())
    }
}

/// Literal ARNs must match the `arn:partition:service:region:account:resource`
/// shape. Catches typos like `aarn:aws:iam::aws:policy/...`.
pub struct WellFormedArnRule;

impl ValidationRule for WellFormedArnRule {
    fn name(&self) -> &'static str {
        "WellFormedArn"
    }

    fn validate(&self, stack: &Stack) -> Result<()> {
        let arn = Regex::new(r"^arn:[a-z-]+:[a-z0-9-]+:[a-z0-9*-]*:[a-zA-Z0-9*-]*:.+$")
            .expect("static ARN pattern");

        let check = |owner: &str, candidate: &str| -> Result<()> {
            // A bare "*" pattern is legal; anything else must be a real ARN.
            if candidate != "*" && !arn.is_match(candidate) {
                anyhow::bail!("'{}' declares malformed ARN '{}'", owner, candidate);
            }
            Ok(())
        };

        for (_, role) in stack.roles() {
            for policy in role.managed_policies() {
                if let crate::iam::ManagedPolicyArn::Literal(literal) = policy {
                    check(role.construct_id(), literal)?;
                }
            }
        }
        for (owner, statement) in all_statements(stack) {
            for resource in statement.resources() {
                check(&owner, resource)?;
            }
        }
        Ok(())
    }
}

/// Trust principals must be well-formed service domains. Catches typos
/// like `states .amazonaws.com`.
pub struct WellFormedPrincipalRule;

impl ValidationRule for WellFormedPrincipalRule {
    fn name(&self) -> &'static str {
        "WellFormedPrincipal"
    }

    fn validate(&self, stack: &Stack) -> Result<()> {
        let principal = Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)+$").expect("static principal pattern");
        for (_, role) in stack.roles() {
            let service = role.assumed_by().service();
            if !principal.is_match(service) {
                anyhow::bail!(
                    "role '{}' is trusted by malformed service principal '{}'",
                    role.construct_id(),
                    service
                );
            }
        }
        Ok(())
    }
}

fn all_statements(stack: &Stack) -> Vec<(String, &crate::iam::PolicyStatement)> {
    let mut statements = Vec::new();
    for policy in stack.managed_policy_resources() {
        for statement in policy.document().statements() {
            statements.push((policy.construct_id().to_string(), statement));
        }
    }
    for policy in stack.inline_policies() {
        for statement in policy.document().statements() {
            statements.push((policy.construct_id().to_string(), statement));
        }
    }
    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::{ManagedPolicyArn, PolicyDocument, PolicyStatement, ServicePrincipal};
    use crate::sagemaker::InstanceType;
    use crate::stack::RoleProps;

    fn stack_with_role(service: &str, policy_arn: Option<&str>) -> Stack {
        let mut stack = Stack::new("test");
        let role = stack
            .add_role(
                "role",
                RoleProps {
                    assumed_by: ServicePrincipal::new(service),
                    role_name: None,
                },
            )
            .unwrap();
        if let Some(arn) = policy_arn {
            stack
                .attach_managed_policy(role, ManagedPolicyArn::literal(arn))
                .unwrap();
        }
        stack
    }

    #[test]
    fn role_without_policies_fails() {
        let stack = stack_with_role("sagemaker.amazonaws.com", None);
        assert!(RoleHasPoliciesRule.validate(&stack).is_err());
    }

    #[test]
    fn role_with_managed_policy_passes() {
        let stack = stack_with_role(
            "sagemaker.amazonaws.com",
            Some("arn:aws:iam::aws:policy/AmazonSageMakerFullAccess"),
        );
        assert!(RoleHasPoliciesRule.validate(&stack).is_ok());
    }

    #[test]
    fn role_with_only_inline_policy_passes() {
        let mut stack = stack_with_role("states.amazonaws.com", None);
        let role = stack.roles().next().map(|(h, _)| h).unwrap();
        let policy = stack
            .add_inline_policy(
                "policy",
                "execution-policy",
                PolicyDocument::new().with_statement(
                    PolicyStatement::allow()
                        .add_actions(["sagemaker:CreateTrainingJob"])
                        .add_resources(["*"]),
                ),
            )
            .unwrap();
        stack.attach_inline_policy(role, policy).unwrap();
        assert!(RoleHasPoliciesRule.validate(&stack).is_ok());
    }

    #[test]
    fn empty_managed_policy_document_fails() {
        let mut stack = Stack::new("test");
        stack
            .add_managed_policy("policy", None, PolicyDocument::new())
            .unwrap();
        assert!(NonEmptyPolicyDocumentRule.validate(&stack).is_err());
    }

    #[test]
    fn empty_inline_policy_document_fails() {
        let mut stack = Stack::new("test");
        stack
            .add_inline_policy("policy", "execution-policy", PolicyDocument::new())
            .unwrap();
        assert!(NonEmptyPolicyDocumentRule.validate(&stack).is_err());
    }

    #[test]
    fn populated_policy_document_passes() {
        let mut stack = Stack::new("test");
        stack
            .add_managed_policy(
                "policy",
                None,
                PolicyDocument::new().with_statement(
                    PolicyStatement::allow()
                        .add_actions(["s3:GetObject"])
                        .add_resources(["arn:aws:s3:::*"]),
                ),
            )
            .unwrap();
        assert!(NonEmptyPolicyDocumentRule.validate(&stack).is_ok());
    }

    #[test]
    fn wildcard_resource_with_star_action_fails() {
        let mut stack = Stack::new("test");
        stack
            .add_managed_policy(
                "policy",
                None,
                PolicyDocument::new().with_statement(
                    PolicyStatement::allow().add_actions(["*"]).add_resources(["*"]),
                ),
            )
            .unwrap();
        assert!(WildcardResourceActionsRule.validate(&stack).is_err());
    }

    #[test]
    fn wildcard_resource_with_explicit_actions_passes() {
        let mut stack = Stack::new("test");
        stack
            .add_managed_policy(
                "policy",
                None,
                PolicyDocument::new().with_statement(
                    PolicyStatement::allow()
                        .add_actions(["s3:GetObject", "s3:ListBucket"])
                        .add_resources(["arn:aws:s3:::*"]),
                ),
            )
            .unwrap();
        assert!(WildcardResourceActionsRule.validate(&stack).is_ok());
    }

    #[test]
    fn malformed_managed_policy_arn_fails() {
        // The double-a typo from a real-world declaration.
        let stack = stack_with_role(
            "sagemaker.amazonaws.com",
            Some("aarn:aws:iam::aws:policy/AWSStepFunctionsFullAccess"),
        );
        assert!(WellFormedArnRule.validate(&stack).is_err());
    }

    #[test]
    fn provider_owned_policy_arn_passes() {
        let stack = stack_with_role(
            "sagemaker.amazonaws.com",
            Some("arn:aws:iam::aws:policy/AmazonSageMakerFullAccess"),
        );
        assert!(WellFormedArnRule.validate(&stack).is_ok());
    }

    #[test]
    fn event_rule_arn_with_wildcards_passes() {
        let mut stack = Stack::new("test");
        stack
            .add_managed_policy(
                "policy",
                None,
                PolicyDocument::new().with_statement(
                    PolicyStatement::allow()
                        .add_actions(["events:PutRule"])
                        .add_resources([
                            "arn:aws:events:*:*:rule/StepFunctionsGetEventsForECSTaskRule",
                        ]),
                ),
            )
            .unwrap();
        assert!(WellFormedArnRule.validate(&stack).is_ok());
    }

    #[test]
    fn principal_with_whitespace_fails() {
        // The stray-space typo from a real-world declaration.
        let stack = stack_with_role(
            "states .amazonaws.com",
            Some("arn:aws:iam::aws:policy/AWSStepFunctionsFullAccess"),
        );
        assert!(WellFormedPrincipalRule.validate(&stack).is_err());
    }

    #[test]
    fn notebook_role_reference_resolves() {
        let mut stack = stack_with_role(
            "sagemaker.amazonaws.com",
            Some("arn:aws:iam::aws:policy/AmazonSageMakerFullAccess"),
        );
        let role = stack.roles().next().map(|(h, _)| h).unwrap();
        stack
            .add_notebook_instance("notebook", InstanceType::new("ml.t2.medium").unwrap(), role)
            .unwrap();
        assert!(ResolvableRoleReferenceRule.validate(&stack).is_ok());
    }
}
