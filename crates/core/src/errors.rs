use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid reference product: {0}")]
    InvalidReference(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("product `{0}` was not found")]
    NotFound(String),
}

/// What a caller outside the library sees: a stable class, a fixed user
/// message and the underlying detail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "The request could not be processed. Check inputs and try again.",
            Self::NotFound(_) => "The requested menu item does not exist.",
            Self::ServiceUnavailable(_) => {
                "The catalog is temporarily unavailable. Please retry shortly."
            }
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::BadRequest(detail) | Self::NotFound(detail) | Self::ServiceUnavailable(detail) => {
                detail
            }
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest(error.to_string()),
            ApplicationError::Catalog(CatalogError::InvalidQuery(message))
            | ApplicationError::InvalidRequest(message) => Self::BadRequest(message),
            ApplicationError::NotFound(id) => Self::NotFound(format!("product `{id}`")),
            ApplicationError::Catalog(CatalogError::Unavailable(message)) => {
                Self::ServiceUnavailable(message)
            }
        }
    }
}
