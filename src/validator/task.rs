use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{checks, deep_check, Result, Validate};
use crate::model::{codes, CodeableConcept, Identifier, OwningOrganization, RecordType};
use crate::model::{Request, RequesterRole, Task, TaskIntent, TaskStatus};
use crate::model::types::is_blank;
use crate::repository::{RecordRepository, ResolutionContext};
use crate::response::{aggregate, ValidatorResponse};

/// Fulfillment task rules, the root of the validation tree.
///
/// Deep checks run in the order focus, requester, owner.
pub struct TaskValidator {
    request: Arc<dyn Validate<Request>>,
    requester_role: Arc<dyn Validate<RequesterRole>>,
    organization: Arc<dyn Validate<OwningOrganization>>,
}

impl TaskValidator {
    pub fn new(
        request: Arc<dyn Validate<Request>>,
        requester_role: Arc<dyn Validate<RequesterRole>>,
        organization: Arc<dyn Validate<OwningOrganization>>,
    ) -> Self {
        Self {
            request,
            requester_role,
            organization,
        }
    }

    fn local_checks(task: &Task) -> Vec<ValidatorResponse> {
        vec![
            check_group_identifier(task.group_identifier.as_ref()),
            checks::reference_populated(task.focus.as_ref(), "Task.focus"),
            check_status(task.status),
            check_intent(task.intent),
            check_code(task.code.as_ref()),
            checks::authored_on(task.authored_on.as_deref(), "Task.authoredOn"),
            checks::reference_populated(task.requester.as_ref(), "Task.requester"),
            checks::reference_populated(task.owner.as_ref(), "Task.owner"),
        ]
    }
}

impl Default for TaskValidator {
    fn default() -> Self {
        Self::new(
            Arc::new(super::RequestValidator::default()),
            Arc::new(super::RequesterRoleValidator),
            Arc::new(super::OrganizationValidator),
        )
    }
}

#[async_trait]
impl Validate<Task> for TaskValidator {
    async fn validate(
        &self,
        task: &Task,
        repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse> {
        debug!(task_id = %task.id, deep = repository.is_some(), "Validating task");

        let mut responses = Self::local_checks(task);
        let context = |location| {
            ResolutionContext::new(location, RecordType::Task, &task.id, &task.contained)
        };

        responses.push(
            deep_check(
                task.focus.as_ref(),
                context("Task.focus"),
                repository,
                self.request.as_ref(),
            )
            .await?,
        );
        responses.push(
            deep_check(
                task.requester.as_ref(),
                context("Task.requester"),
                repository,
                self.requester_role.as_ref(),
            )
            .await?,
        );
        responses.push(
            deep_check(
                task.owner.as_ref(),
                context("Task.owner"),
                repository,
                self.organization.as_ref(),
            )
            .await?,
        );

        let response = aggregate(responses);
        if let Some(message) = response.message() {
            debug!(task_id = %task.id, failure = message, "Task failed validation");
        }
        Ok(response)
    }
}

/// Present, with both value and system
fn check_group_identifier(identifier: Option<&Identifier>) -> ValidatorResponse {
    let Some(identifier) = identifier else {
        return checks::not_empty("Task.groupIdentifier");
    };
    if is_blank(identifier.value.as_deref()) {
        return checks::not_empty("Task.groupIdentifier.value");
    }
    if is_blank(identifier.system.as_deref()) {
        return checks::not_empty("Task.groupIdentifier.system");
    }
    ValidatorResponse::valid()
}

/// Any status is accepted
fn check_status(status: Option<TaskStatus>) -> ValidatorResponse {
    match status {
        Some(_) => ValidatorResponse::valid(),
        None => checks::not_empty("Task.status"),
    }
}

/// Any intent is accepted
fn check_intent(intent: Option<TaskIntent>) -> ValidatorResponse {
    match intent {
        Some(_) => ValidatorResponse::valid(),
        None => checks::not_empty("Task.intent"),
    }
}

fn check_code(code: Option<&CodeableConcept>) -> ValidatorResponse {
    let Some(code) = code else {
        return checks::not_empty("Task.code");
    };
    if code.has_coding(codes::TASK_CODE_SYSTEM, codes::TASK_FULFILL_CODE) {
        return ValidatorResponse::valid();
    }
    ValidatorResponse::invalid(format!(
        "Task.code SHALL be set to {} with a system of {}",
        codes::TASK_FULFILL_CODE,
        codes::TASK_CODE_SYSTEM
    ))
}
