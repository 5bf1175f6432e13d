use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("duplicate logical id '{0}' in stack")]
    DuplicateLogicalId(String),

    #[error("handle #{index} does not resolve to a {expected} in this stack")]
    BadHandle { index: usize, expected: &'static str },

    #[error("invalid instance type '{0}': expected ml.<family>.<size>")]
    InvalidInstanceType(String),

    #[error("failed to serialize template: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to render YAML template: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
