//! Record validators
//!
//! Each validator runs a fixed, ordered list of local checks, then a deep
//! check per reference it owns, and folds everything through
//! [`aggregate`](crate::response::aggregate). Deep checks resolve the
//! reference through the repository passed to the call and hand the target to
//! the injected validator for its type; without a repository they reduce to
//! the presence checks already in the local list.
//!
//! ```text
//! TaskValidator ──focus──────▶ RequestValidator ──subject──▶ SubjectValidator
//!               ──requester──▶ RequesterRoleValidator
//!               ──owner──────▶ OrganizationValidator
//! ```

pub mod checks;
mod party;
mod request;
mod subject;
mod task;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ValidationError;
use crate::model::{Record, Reference, TypedRecord};
use crate::repository::{resolve, RecordRepository, ResolutionContext};
use crate::response::ValidatorResponse;

pub use party::{OrganizationValidator, RequesterRoleValidator};
pub use request::RequestValidator;
pub use subject::SubjectValidator;
pub use task::TaskValidator;

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validation contract for one record type.
///
/// `repository` is scoped to the call. `None` selects shallow validation:
/// reference fields are checked for presence only.
#[async_trait]
pub trait Validate<R: Sync>: Send + Sync {
    async fn validate(
        &self,
        record: &R,
        repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse>;
}

/// Resolve `reference` as a `T` and validate the target.
///
/// An unpopulated reference, or a call without a repository, passes here:
/// the local presence check owns that failure. A populated reference the
/// repository cannot resolve fails. Otherwise the target's own response is
/// returned unchanged so the caller folds it into its aggregate.
pub(crate) async fn deep_check<T: TypedRecord>(
    reference: Option<&Reference>,
    context: ResolutionContext<'_>,
    repository: Option<&dyn RecordRepository>,
    validator: &dyn Validate<T>,
) -> Result<ValidatorResponse> {
    let Some(reference) = reference.filter(|r| r.is_populated()) else {
        return Ok(ValidatorResponse::valid());
    };
    let Some(repository) = repository else {
        return Ok(ValidatorResponse::valid());
    };

    debug!(location = context.location, reference = %reference, "Resolving reference");
    let target = resolve::<T>(repository, reference, &context)
        .await
        .map_err(|e| ValidationError::repository(context.location, e))?;

    match target {
        Some(target) => validator.validate(&target, Some(repository)).await,
        None => Ok(ValidatorResponse::invalid(format!(
            "{} unable to resolve the referenced {} record",
            context.location,
            T::RECORD_TYPE
        ))),
    }
}

/// All five validators wired together, dispatching on the record's type.
#[derive(Clone)]
pub struct ValidatorSet {
    subject: Arc<SubjectValidator>,
    requester_role: Arc<RequesterRoleValidator>,
    organization: Arc<OrganizationValidator>,
    request: Arc<RequestValidator>,
    task: Arc<TaskValidator>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        let subject = Arc::new(SubjectValidator);
        let requester_role = Arc::new(RequesterRoleValidator);
        let organization = Arc::new(OrganizationValidator);
        let request = Arc::new(RequestValidator::new(subject.clone()));
        let task = Arc::new(TaskValidator::new(
            request.clone(),
            requester_role.clone(),
            organization.clone(),
        ));
        Self {
            subject,
            requester_role,
            organization,
            request,
            task,
        }
    }

    /// Validate a record of any type with the validator for that type
    pub async fn validate_record(
        &self,
        record: &Record,
        repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse> {
        match record {
            Record::Task(r) => self.task.validate(r, repository).await,
            Record::Request(r) => self.request.validate(r, repository).await,
            Record::Subject(r) => self.subject.validate(r, repository).await,
            Record::RequesterRole(r) => self.requester_role.validate(r, repository).await,
            Record::OwningOrganization(r) => self.organization.validate(r, repository).await,
        }
    }
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Well-formed records and a failing repository shared by validator tests.

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tracing::subscriber::DefaultGuard;

    use crate::error::RepositoryError;
    use crate::model::*;
    use crate::repository::{RecordRepository, ResolutionContext, SearchBundle, SearchParams};

    pub fn subject(id: &str) -> Subject {
        Subject {
            id: id.into(),
            name: Some(vec![HumanName {
                family: Some("Citizen".into()),
                given: vec!["Jane".into()],
                ..Default::default()
            }]),
        }
    }

    pub fn request(id: &str) -> Request {
        Request {
            id: id.into(),
            requisition: Some(Identifier::requisition("8003621111111111", "ORD-1")),
            status: Some(RequestStatus::Active),
            intent: Some(RequestIntent::Order),
            category: vec![CodeableConcept::laboratory_procedure()],
            code: Some(CodeableConcept::snomed_test("26604007", "Full blood count", None)),
            subject: Some(Reference::new(RecordType::Subject, "p1")),
            authored_on: Some("2024-05-01T09:30:00+10:00".into()),
            requester: Some(Reference::new(RecordType::RequesterRole, "pr1")),
            contained: Vec::new(),
        }
    }

    pub fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            group_identifier: Some(Identifier::new("urn:placer", "G-1")),
            status: Some(TaskStatus::Requested),
            status_reason: None,
            intent: Some(TaskIntent::Order),
            code: Some(CodeableConcept::fulfill_task()),
            authored_on: Some("2024-05-01T09:30:00+10:00".into()),
            focus: Some(Reference::new(RecordType::Request, "sr1")),
            for_subject: Some(Reference::new(RecordType::Subject, "p1")),
            requester: Some(Reference::new(RecordType::RequesterRole, "pr1")),
            owner: Some(Reference::new(RecordType::OwningOrganization, "lab")),
            contained: Vec::new(),
        }
    }

    /// Formatted log output collected by [`capture_logs`]
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Route this thread's events at `level` and above into a buffer while the
    /// guard is alive
    pub fn capture_logs(level: tracing::Level) -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    /// Every call fails at the transport level
    pub struct UnreachableRepository;

    #[async_trait]
    impl RecordRepository for UnreachableRepository {
        async fn get_record(
            &self,
            _reference: &Reference,
            _context: &ResolutionContext<'_>,
        ) -> Result<Option<Record>, RepositoryError> {
            Err(RepositoryError::Transport("connection refused".into()))
        }

        async fn get_by_id(
            &self,
            _record_type: RecordType,
            _id: &str,
        ) -> Result<Option<Record>, RepositoryError> {
            Err(RepositoryError::Transport("connection refused".into()))
        }

        async fn search(&self, _query: &SearchParams) -> Result<SearchBundle, RepositoryError> {
            Err(RepositoryError::Transport("connection refused".into()))
        }

        async fn update_task(&self, _task: &Task) -> Result<Task, RepositoryError> {
            Err(RepositoryError::Transport("connection refused".into()))
        }
    }
}
