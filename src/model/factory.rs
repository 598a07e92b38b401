//! Builders for well-formed pathology requests and fulfillment tasks.

use chrono::{DateTime, FixedOffset, SecondsFormat};

use super::{CodeableConcept, Identifier, Reference, Request, RequestIntent, RequestStatus, Task};
use super::{TaskIntent, TaskStatus};

/// Inputs for a pathology request
#[derive(Debug, Clone)]
pub struct RequestInput {
    pub resource_id: String,
    pub requisition: Identifier,
    pub requested_test: CodeableConcept,
    pub requested_at: DateTime<FixedOffset>,
    pub subject: Reference,
    pub requester: Reference,
}

impl RequestInput {
    /// Active laboratory-procedure order
    pub fn build(self) -> Request {
        Request {
            id: self.resource_id,
            requisition: Some(self.requisition),
            status: Some(RequestStatus::Active),
            intent: Some(RequestIntent::Order),
            category: vec![CodeableConcept::laboratory_procedure()],
            code: Some(self.requested_test),
            subject: Some(self.subject),
            authored_on: Some(self.requested_at.to_rfc3339_opts(SecondsFormat::Secs, false)),
            requester: Some(self.requester),
            contained: Vec::new(),
        }
    }
}

/// Inputs for a fulfillment task
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub resource_id: String,
    pub group_identifier: Identifier,
    pub status: TaskStatus,
    pub intent: TaskIntent,
    pub code: CodeableConcept,
    pub authored_on: DateTime<FixedOffset>,
    pub focus: Reference,
    pub for_subject: Option<Reference>,
    pub owner: Reference,
    pub requester: Reference,
}

impl TaskInput {
    pub fn build(self) -> Task {
        Task {
            id: self.resource_id,
            group_identifier: Some(self.group_identifier),
            status: Some(self.status),
            status_reason: None,
            intent: Some(self.intent),
            code: Some(self.code),
            authored_on: Some(self.authored_on.to_rfc3339_opts(SecondsFormat::Secs, false)),
            focus: Some(self.focus),
            for_subject: self.for_subject,
            requester: Some(self.requester),
            owner: Some(self.owner),
            contained: Vec::new(),
        }
    }
}
