//! The shipped declaration: one SageMaker notebook environment.
//!
//! Two roles, their policy material, and one notebook instance. All
//! values are literals; given no runtime inputs this builds the same
//! resource graph on every invocation.

use crate::error::StackError;
use crate::iam::{ManagedPolicyArn, PolicyDocument, PolicyStatement, ServicePrincipal};
use crate::sagemaker::InstanceType;
use crate::stack::{RoleProps, Stack};

pub const STACK_NAME: &str = "SageMakerNotebook";

pub const SAGEMAKER_FULL_ACCESS_ARN: &str =
    "arn:aws:iam::aws:policy/AmazonSageMakerFullAccess";
pub const STEP_FUNCTIONS_FULL_ACCESS_ARN: &str =
    "arn:aws:iam::aws:policy/AWSStepFunctionsFullAccess";

/// S3 actions granted to the notebook execution policy. Reviewed as a
/// literal set because they apply to a wildcard bucket pattern.
pub const NOTEBOOK_S3_ACTIONS: [&str; 4] = [
    "s3:GetObject",
    "s3:PutObject",
    "s3:DeleteObject",
    "s3:ListBucket",
];

/// Job-control actions the workflow execution role may invoke against
/// any resource. Reviewed as a literal set for the same reason.
pub const WORKFLOW_ACTIONS: [&str; 33] = [
    "sagemaker:CreateTransformJob",
    "sagemaker:DescribeTransformJob",
    "sagemaker:StopTransformJob",
    "sagemaker:CreateTrainingJob",
    "sagemaker:DescribeTrainingJob",
    "sagemaker:StopTrainingJob",
    "sagemaker:CreateHyperParameterTuningJob",
    "sagemaker:DescribeHyperParameterTuningJob",
    "sagemaker:StopHyperParameterTuningJob",
    "sagemaker:CreateModel",
    "sagemaker:CreateEndpointConfig",
    "sagemaker:CreateEndpoint",
    "sagemaker:DeleteEndpointConfig",
    "sagemaker:DeleteEndpoint",
    "sagemaker:UpdateEndpoint",
    "sagemaker:ListTags",
    "lambda:InvokeFunction",
    "sqs:SendMessage",
    "sns:Publish",
    "ecs:RunTask",
    "ecs:StopTask",
    "ecs:DescribeTasks",
    "dynamodb:GetItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "batch:SubmitJob",
    "batch:DescribeJobs",
    "batch:TerminateJob",
    "glue:StartJobRun",
    "glue:GetJobRun",
    "glue:GetJobRuns",
    "glue:BatchStopJobRun",
];

pub const WORKFLOW_EVENT_RULE_ARNS: [&str; 5] = [
    "arn:aws:events:*:*:rule/StepFunctionsGetEventsForSageMakerTrainingJobsRule",
    "arn:aws:events:*:*:rule/StepFunctionsGetEventsForSageMakerTransformJobsRule",
    "arn:aws:events:*:*:rule/StepFunctionsGetEventsForSageMakerTuningJobsRule",
    "arn:aws:events:*:*:rule/StepFunctionsGetEventsForECSTaskRule",
    "arn:aws:events:*:*:rule/StepFunctionsGetEventsForBatchJobsRule",
];

pub fn sagemaker_notebook_stack() -> Result<Stack, StackError> {
    let mut stack = Stack::new(STACK_NAME)
        .with_description("SageMaker notebook execution environment");

    // Execution role the notebook instance runs as.
    let notebook_role = stack.add_role(
        "sagemaker-notebook-role",
        RoleProps {
            assumed_by: ServicePrincipal::new("sagemaker.amazonaws.com"),
            role_name: Some("sagemaker-notebook-execution-role-cfn".to_string()),
        },
    )?;

    let execution_policy = stack.add_managed_policy(
        "sagemaker-execution-policy",
        Some("AmazonSageMaker-ExecutionPolicy-cfn"),
        PolicyDocument::new().with_statement(
            PolicyStatement::allow()
                .add_actions(NOTEBOOK_S3_ACTIONS)
                .add_resources(["arn:aws:s3:::*"]),
        ),
    )?;

    stack.attach_managed_policy(
        notebook_role,
        ManagedPolicyArn::literal(SAGEMAKER_FULL_ACCESS_ARN),
    )?;
    stack.attach_managed_policy(
        notebook_role,
        ManagedPolicyArn::literal(STEP_FUNCTIONS_FULL_ACCESS_ARN),
    )?;
    stack.attach_managed_policy(notebook_role, ManagedPolicyArn::Declared(execution_policy))?;

    // Execution role for Step Functions workflows driven from the notebook.
    let workflow_role = stack.add_role(
        "StepFunctionsWorkflowExecutionRole",
        RoleProps {
            assumed_by: ServicePrincipal::new("states.amazonaws.com"),
            role_name: Some("StepFunctionsWorkflowExecutionRole-cfn".to_string()),
        },
    )?;

    let workflow_document = PolicyDocument::new()
        .with_statement(
            PolicyStatement::allow()
                .add_actions(WORKFLOW_ACTIONS)
                .add_resources(["*"]),
        )
        .with_statement(
            PolicyStatement::allow()
                .add_actions(["iam:PassRole"])
                .add_resources(["*"])
                .with_condition(
                    "StringEquals",
                    "iam:PassedToService",
                    "sagemaker.amazonaws.com",
                ),
        )
        .with_statement(
            PolicyStatement::allow()
                .add_actions([
                    "events:PutTargets",
                    "events:PutRule",
                    "events:DescribeRule",
                ])
                .add_resources(WORKFLOW_EVENT_RULE_ARNS),
        );

    let workflow_policy = stack.add_inline_policy(
        "stepfunctions-execution-policy",
        "stepfunctions-execution-policy",
        workflow_document,
    )?;
    stack.attach_inline_policy(workflow_role, workflow_policy)?;

    stack.add_notebook_instance(
        "sagemaker-notebook",
        InstanceType::new("ml.t2.medium")?,
        notebook_role,
    )?;

    Ok(stack)
}
