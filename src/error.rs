use thiserror::Error;

use crate::model::RecordType;

/// Failures raised by a repository implementation.
///
/// A record that simply does not exist is not an error: the port returns
/// `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unsupported search parameter: {0}")]
    InvalidQuery(String),

    #[error("{record_type}/{id} not found")]
    NotFound { record_type: RecordType, id: String },

    #[error("invalid bundle: {0}")]
    Bundle(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal failures of a validation call. Rule violations are never errors;
/// they come back as an invalid `ValidatorResponse`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("repository failure while resolving {location}: {source}")]
    Repository {
        location: String,
        #[source]
        source: RepositoryError,
    },
}

impl ValidationError {
    pub fn repository(location: impl Into<String>, source: RepositoryError) -> Self {
        Self::Repository {
            location: location.into(),
            source,
        }
    }
}

/// Failures of a fulfillment pass or a listing over the repository.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("filler organization {0} not found")]
    OrganizationNotFound(String),

    #[error("filler organization {0} has no HPI-O identifier")]
    MissingHpio(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
