//! Fulfillment processing
//!
//! One pass over the tasks a filler organization has been asked to fulfil:
//! every `requested` order owned by the filler is accepted when its focus
//! request resolves and validates, and rejected otherwise. The new status is
//! written back through the repository. Scheduling repeated passes is left to
//! the caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ProcessingError;
use crate::model::{codes, OwningOrganization, RecordType, Request, Task, TaskIntent, TaskStatus};
use crate::repository::{fetch, resolve, RecordRepository, ResolutionContext, SearchParams};
use crate::validator::{RequestValidator, Validate};

pub const ACCEPTED_REASON: &str = "Task has been Accepted";
pub const UNRESOLVED_FOCUS_REASON: &str = "Task.focus must be a reference to a Request record";

/// What happened to one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub outcomes: Vec<TaskOutcome>,
}

impl ProcessingSummary {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome.status {
            TaskStatus::Accepted => self.accepted += 1,
            _ => self.rejected += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Accepts or rejects requested tasks on behalf of a filler organization
pub struct FulfillmentProcessor {
    request_validator: Arc<dyn Validate<Request>>,
}

impl FulfillmentProcessor {
    pub fn new(request_validator: Arc<dyn Validate<Request>>) -> Self {
        Self { request_validator }
    }

    /// Run one pass for the filler organization `filler_id`.
    ///
    /// Repository failures abort the pass; tasks already updated stay updated.
    pub async fn process(
        &self,
        repository: &dyn RecordRepository,
        filler_id: &str,
    ) -> Result<ProcessingSummary, ProcessingError> {
        let filler = fetch::<OwningOrganization>(repository, filler_id)
            .await?
            .ok_or_else(|| ProcessingError::OrganizationNotFound(filler_id.to_string()))?;
        let hpio = filler
            .hpio()
            .ok_or_else(|| ProcessingError::MissingHpio(filler_id.to_string()))?;

        let query = SearchParams::new(RecordType::Task)
            .add("status", TaskStatus::Requested.as_str())
            .add("intent", TaskIntent::Order.as_str())
            .add("owner.identifier", format!("{}|{}", codes::HPIO_SYSTEM, hpio));
        let bundle = repository.search(&query).await?;
        let tasks = bundle.cache.list::<Task>();

        info!(filler = filler_id, hpio = %hpio, tasks = tasks.len(), "Processing requested tasks");

        let mut summary = ProcessingSummary::default();
        for task in tasks {
            let (status, reason) = self.assess(repository, &task).await?;

            let mut updated = task;
            updated.status = Some(status);
            updated.status_reason = Some(reason.clone());
            let stored = repository.update_task(&updated).await?;

            match status {
                TaskStatus::Accepted => info!(task_id = %stored.id, "Task accepted"),
                _ => warn!(task_id = %stored.id, reason = %reason, "Task rejected"),
            }
            summary.record(TaskOutcome {
                task_id: stored.id,
                status,
                reason,
            });
        }

        info!(
            filler = filler_id,
            accepted = summary.accepted,
            rejected = summary.rejected,
            "Fulfillment pass complete"
        );
        Ok(summary)
    }

    async fn assess(
        &self,
        repository: &dyn RecordRepository,
        task: &Task,
    ) -> Result<(TaskStatus, String), ProcessingError> {
        let Some(focus) = task.focus.as_ref().filter(|f| f.is_populated()) else {
            return Ok(rejected(UNRESOLVED_FOCUS_REASON));
        };

        let context =
            ResolutionContext::new("Task.focus", RecordType::Task, &task.id, &task.contained);
        let Some(request) = resolve::<Request>(repository, focus, &context).await? else {
            return Ok(rejected(UNRESOLVED_FOCUS_REASON));
        };

        let response = self
            .request_validator
            .validate(&request, Some(repository))
            .await?;
        if let Some(message) = response.message() {
            return Ok(rejected(&format!(
                "Task.focus Request failed validation. {}",
                message
            )));
        }

        Ok((TaskStatus::Accepted, ACCEPTED_REASON.to_string()))
    }
}

impl Default for FulfillmentProcessor {
    fn default() -> Self {
        Self::new(Arc::new(RequestValidator::default()))
    }
}

fn rejected(reason: &str) -> (TaskStatus, String) {
    (TaskStatus::Rejected, reason.to_string())
}
