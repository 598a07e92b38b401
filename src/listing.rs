//! Listing of active orders that pass validation.

use tracing::{debug, warn};

use crate::error::ProcessingError;
use crate::model::{
    Request, RequestIntent, RequestStatus, Task, TaskIntent, TaskStatus, TypedRecord,
};
use crate::repository::{RecordRepository, SearchParams};
use crate::validator::Validate;

/// Active pathology orders that validate against the repository
pub async fn list_valid_requests(
    repository: &dyn RecordRepository,
    validator: &dyn Validate<Request>,
) -> Result<Vec<Request>, ProcessingError> {
    let query = SearchParams::new(Request::RECORD_TYPE)
        .add("status", RequestStatus::Active.as_str())
        .add("intent", RequestIntent::Order.as_str());
    list_valid(repository, query, validator, request_id).await
}

/// Requested fulfillment tasks that validate against the repository
pub async fn list_valid_tasks(
    repository: &dyn RecordRepository,
    validator: &dyn Validate<Task>,
) -> Result<Vec<Task>, ProcessingError> {
    let query = SearchParams::new(Task::RECORD_TYPE)
        .add("status", TaskStatus::Requested.as_str())
        .add("intent", TaskIntent::Order.as_str());
    list_valid(repository, query, validator, task_id).await
}

fn request_id(request: &Request) -> &str {
    &request.id
}

fn task_id(task: &Task) -> &str {
    &task.id
}

async fn list_valid<T: TypedRecord>(
    repository: &dyn RecordRepository,
    query: SearchParams,
    validator: &dyn Validate<T>,
    id_of: fn(&T) -> &str,
) -> Result<Vec<T>, ProcessingError> {
    let bundle = repository.search(&query).await?;
    let candidates = bundle.cache.list::<T>();
    debug!(record_type = %T::RECORD_TYPE, candidates = candidates.len(), "Listing records");

    let mut valid = Vec::with_capacity(candidates.len());
    for record in candidates {
        let response = validator.validate(&record, Some(repository)).await?;
        match response.message() {
            None => valid.push(record),
            Some(message) => warn!(
                record_type = %T::RECORD_TYPE,
                id = id_of(&record),
                failure = message,
                "Skipping record that failed validation"
            ),
        }
    }
    Ok(valid)
}
