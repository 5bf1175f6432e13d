pub mod app;
pub mod config;
pub mod error;
pub mod iam;
pub mod notebook;
pub mod sagemaker;
pub mod stack;
pub mod synth;
pub mod validation;

pub use app::{App, CloudAssembly, TemplateArtifact};
pub use config::{ConfigError, NbstackConfig, TemplateFormat};
pub use error::StackError;
pub use iam::{
    Effect, InlinePolicy, ManagedPolicy, ManagedPolicyArn, PolicyDocument, PolicyStatement, Role,
    ServicePrincipal,
};
pub use notebook::sagemaker_notebook_stack;
pub use sagemaker::{InstanceType, NotebookInstance};
pub use stack::{Resource, RoleProps, Stack};
pub use synth::{synthesize, Template};
pub use validation::{RuleOutcome, ValidationRule, Validator};
