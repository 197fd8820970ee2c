use thiserror::Error;

#[derive(Debug, Error)]
pub enum IamError {
    #[error("cannot compile route template {template:?}: {reason}")]
    PatternCompile { template: String, reason: String },
    #[error("invalid http method: {0}")]
    InvalidMethod(String),
    #[error("invalid permission key: {0:?}")]
    InvalidKey(String),
    #[error("invalid route table: {0}")]
    InvalidRouteTable(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("role already exists: {0}")]
    RoleExists(String),
    #[error("registry read failed: {0}")]
    RegistryRead(String),
    #[error("registry write failed: {0}")]
    RegistryWrite(String),
}

impl IamError {
    pub(crate) fn pattern(template: &str, reason: impl Into<String>) -> Self {
        IamError::PatternCompile {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

pub type IamResult<T> = Result<T, IamError>;
