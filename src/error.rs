use crate::store::StoreError;
use crate::token::TokenError;

/// Failures surfaced by the account service. The service never recovers
/// these locally; the HTTP layer owns the mapping to status codes.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("user already exists")]
    AlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthenticated(#[source] TokenError),
    #[error("user not found")]
    NotFound,
    #[error("user store unavailable")]
    StoreUnavailable(#[source] mongodb::error::Error),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => AccountError::AlreadyExists,
            StoreError::NotFound => AccountError::NotFound,
            StoreError::Unavailable(err) => AccountError::StoreUnavailable(err),
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        AccountError::Unauthenticated(err)
    }
}
