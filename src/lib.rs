//! Pathology e-requesting record validation
//!
//! Validates fulfillment tasks, the pathology requests they point at, and the
//! subjects, requester roles and owning organizations behind them. Every rule
//! violation found is collected into a single [`ValidatorResponse`].
//!
//! Validation runs in one of two modes, chosen per call:
//!
//! - **shallow**: no repository; reference fields are checked for presence.
//! - **deep**: references are resolved through a [`RecordRepository`] and the
//!   targets validated recursively with their own rules.
//!
//! ```no_run
//! use erequest_validator::{MemoryRepository, ValidatorSet};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = MemoryRepository::load("records.json").await?;
//! let validators = ValidatorSet::new();
//! for record in repository.snapshot().await.records {
//!     let response = validators.validate_record(&record, Some(&repository)).await?;
//!     println!("{} {}: {}", record.record_type(), record.id(), response);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fulfillment;
pub mod listing;
pub mod model;
pub mod repository;
pub mod response;
pub mod validator;

pub use config::{AppConfig, ConfigError};
pub use error::{ProcessingError, RepositoryError, ValidationError};
pub use fulfillment::{FulfillmentProcessor, ProcessingSummary, TaskOutcome};
pub use listing::{list_valid_requests, list_valid_tasks};
pub use model::{Record, RecordType, TypedRecord};
pub use repository::{MemoryRepository, RecordBundle, RecordRepository, ResolutionContext};
pub use response::{aggregate, ValidatorResponse};
pub use validator::{
    OrganizationValidator, RequestValidator, RequesterRoleValidator, SubjectValidator,
    TaskValidator, Validate, ValidatorSet,
};
