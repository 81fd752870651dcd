//! Identity error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("identity provider error: {0}")]
    Provider(String),
}

impl From<IdentityError> for helpdesk_core::error::HelpdeskError {
    fn from(err: IdentityError) -> Self {
        helpdesk_core::error::HelpdeskError::Identity(err.to_string())
    }
}
