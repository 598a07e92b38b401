use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{checks, deep_check, Result, Validate};
use crate::model::{codes, CodeableConcept, Identifier, RecordType, Request};
use crate::model::{RequestIntent, RequestStatus, Subject};
use crate::repository::{RecordRepository, ResolutionContext};
use crate::response::{aggregate, ValidatorResponse};

/// Pathology request rules.
///
/// With a repository the subject reference is resolved and validated by the
/// injected subject validator.
pub struct RequestValidator {
    subject: Arc<dyn Validate<Subject>>,
}

impl RequestValidator {
    pub fn new(subject: Arc<dyn Validate<Subject>>) -> Self {
        Self { subject }
    }

    /// Local checks in evaluation order
    fn local_checks(request: &Request) -> Vec<ValidatorResponse> {
        vec![
            check_requisition(request.requisition.as_ref()),
            check_status(request.status),
            check_intent(request.intent),
            check_category(&request.category),
            check_code(request.code.as_ref()),
            checks::reference_populated(request.subject.as_ref(), "Request.subject"),
            checks::authored_on(request.authored_on.as_deref(), "Request.authoredOn"),
            checks::reference_populated(request.requester.as_ref(), "Request.requester"),
        ]
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(Arc::new(super::SubjectValidator))
    }
}

#[async_trait]
impl Validate<Request> for RequestValidator {
    async fn validate(
        &self,
        request: &Request,
        repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse> {
        debug!(request_id = %request.id, deep = repository.is_some(), "Validating request");

        let mut responses = Self::local_checks(request);

        let context = ResolutionContext::new(
            "Request.subject",
            RecordType::Request,
            &request.id,
            &request.contained,
        );
        responses.push(
            deep_check(
                request.subject.as_ref(),
                context,
                repository,
                self.subject.as_ref(),
            )
            .await?,
        );

        Ok(aggregate(responses))
    }
}

fn check_requisition(identifier: Option<&Identifier>) -> ValidatorResponse {
    match identifier {
        Some(_) => ValidatorResponse::valid(),
        None => checks::not_empty("Request.requisition"),
    }
}

fn check_status(status: Option<RequestStatus>) -> ValidatorResponse {
    match status {
        None => checks::not_empty("Request.status"),
        Some(RequestStatus::Active) => ValidatorResponse::valid(),
        Some(_) => ValidatorResponse::invalid(format!(
            "Request.status SHALL be: {}",
            RequestStatus::Active
        )),
    }
}

fn check_intent(intent: Option<RequestIntent>) -> ValidatorResponse {
    match intent {
        None => checks::not_empty("Request.intent"),
        Some(RequestIntent::Order) => ValidatorResponse::valid(),
        Some(_) => ValidatorResponse::invalid(format!(
            "Request.intent SHALL be: {}",
            RequestIntent::Order
        )),
    }
}

fn check_category(category: &[CodeableConcept]) -> ValidatorResponse {
    if category.is_empty() {
        return checks::not_empty("Request.category");
    }

    let is_laboratory_procedure = category
        .iter()
        .any(|c| c.has_coding(codes::SNOMED_CT_SYSTEM, codes::LABORATORY_PROCEDURE_CODE));
    if !is_laboratory_procedure {
        return ValidatorResponse::invalid(format!(
            "Request.category SHALL contain the code: {} and system: {}",
            codes::LABORATORY_PROCEDURE_CODE,
            codes::SNOMED_CT_SYSTEM
        ));
    }

    ValidatorResponse::valid()
}

/// Free text or at least one coding
fn check_code(code: Option<&CodeableConcept>) -> ValidatorResponse {
    let Some(code) = code else {
        return checks::not_empty("Request.code");
    };

    if !code.has_text() && code.codings.is_empty() {
        return ValidatorResponse::invalid(
            "Request.code.text and Request.code.coding SHALL NOT both be empty",
        );
    }

    ValidatorResponse::valid()
}
