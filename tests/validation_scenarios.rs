//! End-to-end validation scenarios over the public API
//!
//! Covers both operating modes (shallow and deep), propagation of child
//! failures into parent responses, and loading records from a JSON bundle.

use std::sync::Arc;

use chrono::DateTime;
use erequest_validator::model::{
    CodeableConcept, HumanName, Identifier, OwningOrganization, Reference, Request, RequestInput,
    RequestStatus, RequesterRole, Subject, Task, TaskInput, TaskIntent, TaskStatus,
};
use erequest_validator::{
    MemoryRepository, Record, RecordBundle, RecordType, RequestValidator, SubjectValidator,
    TaskValidator, Validate, ValidatorSet,
};

// =============================================================================
// FIXTURES
// =============================================================================

const FILLER_HPIO: &str = "8003629900001234";
const SUBJECT_NAME_EMPTY: &str = "Subject.name SHALL NOT be empty";

fn named_subject(id: &str) -> Subject {
    Subject {
        id: id.into(),
        name: Some(vec![HumanName {
            family: Some("Citizen".into()),
            given: vec!["Jane".into(), "Mary".into()],
            ..Default::default()
        }]),
    }
}

fn nameless_subject(id: &str) -> Subject {
    Subject {
        id: id.into(),
        name: Some(Vec::new()),
    }
}

fn pathology_request(id: &str, subject_id: &str) -> Request {
    RequestInput {
        resource_id: id.into(),
        requisition: Identifier::requisition("8003 6211 1111 1111", "ORD-1001"),
        requested_test: CodeableConcept::snomed_test("26604007", "Full blood count", None),
        requested_at: DateTime::parse_from_rfc3339("2024-05-01T09:30:00+10:00").unwrap(),
        subject: Reference::new(RecordType::Subject, subject_id),
        requester: Reference::new(RecordType::RequesterRole, "pr1"),
    }
    .build()
}

fn fulfillment_task(id: &str, focus_id: &str) -> Task {
    TaskInput {
        resource_id: id.into(),
        group_identifier: Identifier::new("urn:placer:group", "PG-1001"),
        status: TaskStatus::Requested,
        intent: TaskIntent::Order,
        code: CodeableConcept::fulfill_task(),
        authored_on: DateTime::parse_from_rfc3339("2024-05-01T09:31:00+10:00").unwrap(),
        focus: Reference::new(RecordType::Request, focus_id),
        for_subject: Some(Reference::new(RecordType::Subject, "p1")),
        owner: Reference::new(RecordType::OwningOrganization, "lab"),
        requester: Reference::new(RecordType::RequesterRole, "pr1"),
    }
    .build()
}

fn parties() -> Vec<Record> {
    vec![
        RequesterRole {
            id: "pr1".into(),
            identifier: vec![],
        }
        .into(),
        OwningOrganization {
            id: "lab".into(),
            name: Some("Pathology Lab".into()),
            identifier: vec![Identifier::hpio(FILLER_HPIO)],
        }
        .into(),
    ]
}

// =============================================================================
// SCENARIOS
// =============================================================================

/// A subject with no name entries fails on its name list
#[tokio::test]
async fn scenario_a_subject_without_names() {
    let response = SubjectValidator
        .validate(&nameless_subject("p1"), None)
        .await
        .unwrap();
    assert!(!response.is_valid());
    assert_eq!(response.message(), Some(SUBJECT_NAME_EMPTY));
}

/// A well-formed request passes shallow validation
#[tokio::test]
async fn scenario_b_request_valid_without_repository() {
    let response = RequestValidator::default()
        .validate(&pathology_request("sr1", "p1"), None)
        .await
        .unwrap();
    assert!(response.is_valid(), "{}", response);
    assert_eq!(response.message(), None);
}

/// The same request fails deep validation with the subject's message verbatim
#[tokio::test]
async fn scenario_c_subject_failure_propagates_verbatim() {
    let repository = MemoryRepository::from_records([nameless_subject("p1").into()]);
    let response = RequestValidator::default()
        .validate(&pathology_request("sr1", "p1"), Some(&repository))
        .await
        .unwrap();
    assert!(!response.is_valid());
    assert_eq!(response.message(), Some(SUBJECT_NAME_EMPTY));
}

/// An empty owner reference fails once, in either mode
#[tokio::test]
async fn scenario_d_empty_owner_reference() {
    let mut task = fulfillment_task("t1", "sr1");
    task.owner = Some(Reference::new(RecordType::OwningOrganization, ""));

    let mut records = parties();
    records.push(pathology_request("sr1", "p1").into());
    records.push(named_subject("p1").into());
    let repository = MemoryRepository::from_records(records);

    let validator = TaskValidator::default();
    let shallow = validator.validate(&task, None).await.unwrap();
    let deep = validator.validate(&task, Some(&repository)).await.unwrap();
    for response in [shallow, deep] {
        assert!(!response.is_valid());
        assert_eq!(response.message(), Some("Task.owner SHALL NOT be empty"));
    }
}

/// A task whose focus request fails carries that request's message unchanged
#[tokio::test]
async fn scenario_e_request_failure_propagates_through_task() {
    let mut request = pathology_request("sr1", "p1");
    request.status = Some(RequestStatus::OnHold);

    let mut records = parties();
    records.push(request.clone().into());
    records.push(named_subject("p1").into());
    let repository = MemoryRepository::from_records(records);

    let request_response = RequestValidator::default()
        .validate(&request, Some(&repository))
        .await
        .unwrap();
    let task_response = TaskValidator::default()
        .validate(&fulfillment_task("t1", "sr1"), Some(&repository))
        .await
        .unwrap();

    assert!(!task_response.is_valid());
    assert_eq!(task_response.message(), request_response.message());
    assert_eq!(task_response.message(), Some("Request.status SHALL be: active"));
}

// =============================================================================
// MODES AND PROPERTIES
// =============================================================================

/// A fully resolvable order graph is valid in both modes
#[tokio::test]
async fn complete_order_graph_is_valid() {
    let mut records = parties();
    records.push(pathology_request("sr1", "p1").into());
    records.push(named_subject("p1").into());
    records.push(fulfillment_task("t1", "sr1").into());
    let repository = MemoryRepository::from_records(records);
    let validators = ValidatorSet::new();

    for record in repository.snapshot().await.records {
        let shallow = validators.validate_record(&record, None).await.unwrap();
        let deep = validators
            .validate_record(&record, Some(&repository))
            .await
            .unwrap();
        assert!(shallow.is_valid(), "{}/{}: {}", record.record_type(), record.id(), shallow);
        assert!(deep.is_valid(), "{}/{}: {}", record.record_type(), record.id(), deep);
    }
}

/// Validation has no side effects; repeated calls agree
#[tokio::test]
async fn validation_is_idempotent() {
    let mut request = pathology_request("sr1", "p1");
    request.requisition = None;
    let repository = MemoryRepository::from_records([nameless_subject("p1").into()]);
    let before = repository.snapshot().await;

    let validator = RequestValidator::default();
    let first = validator.validate(&request, Some(&repository)).await.unwrap();
    let second = validator.validate(&request, Some(&repository)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.message(),
        Some("Request.requisition SHALL NOT be empty, Subject.name SHALL NOT be empty")
    );
    assert_eq!(repository.snapshot().await, before);
}

/// Shallow mode never fails on a dangling reference
#[tokio::test]
async fn shallow_mode_ignores_unresolvable_targets() {
    let task = fulfillment_task("t1", "does-not-exist");
    let validator = TaskValidator::default();

    let shallow = validator.validate(&task, None).await.unwrap();
    assert!(shallow.is_valid());

    let deep = validator
        .validate(&task, Some(&MemoryRepository::from_records(parties())))
        .await
        .unwrap();
    assert_eq!(
        deep.message(),
        Some("Task.focus unable to resolve the referenced Request record")
    );
}

/// Validators are shareable across concurrent calls with different repositories
#[tokio::test]
async fn concurrent_calls_use_their_own_repository() {
    let validator = Arc::new(RequestValidator::default());
    let good = Arc::new(MemoryRepository::from_records([named_subject("p1").into()]));
    let bad = Arc::new(MemoryRepository::from_records([nameless_subject("p1").into()]));
    let request = pathology_request("sr1", "p1");

    let mut handles = Vec::new();
    for i in 0..8 {
        let validator = validator.clone();
        let repository = if i % 2 == 0 { good.clone() } else { bad.clone() };
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            let response = validator
                .validate(&request, Some(repository.as_ref()))
                .await
                .unwrap();
            (i, response.is_valid())
        }));
    }

    for handle in handles {
        let (i, is_valid) = handle.await.unwrap();
        assert_eq!(is_valid, i % 2 == 0);
    }
}

// =============================================================================
// BUNDLES
// =============================================================================

/// Records and contained records round-trip from the JSON bundle format
#[tokio::test]
async fn bundle_with_contained_subject_validates_deeply() {
    let json = r##"{
        "records": [
            {
                "resourceType": "Request",
                "id": "sr9",
                "requisition": { "system": "urn:placer", "value": "ORD-9" },
                "status": "active",
                "intent": "order",
                "category": [
                    { "coding": [{ "system": "http://snomed.info/sct", "code": "108252007" }] }
                ],
                "code": { "text": "Iron studies" },
                "subject": { "targetType": "Subject", "targetId": "#pat" },
                "authoredOn": "2024-05",
                "requester": { "targetType": "RequesterRole", "targetId": "pr1" },
                "contained": [
                    { "resourceType": "Subject", "id": "pat", "name": [{ "text": "J Citizen" }] }
                ]
            },
            { "resourceType": "Subject", "id": "p2", "name": [{ "given": [""] }] }
        ]
    }"##;
    let bundle: RecordBundle = serde_json::from_str(json).unwrap();
    let repository = MemoryRepository::from_bundle(bundle);
    let validators = ValidatorSet::new();

    let request = repository
        .snapshot()
        .await
        .records
        .into_iter()
        .find(|r| r.record_type() == RecordType::Request)
        .unwrap();
    let response = validators
        .validate_record(&request, Some(&repository))
        .await
        .unwrap();
    assert!(response.is_valid(), "{}", response);

    let subject = Record::Subject(Subject {
        id: "p2".into(),
        name: Some(vec![HumanName {
            given: vec![String::new()],
            ..Default::default()
        }]),
    });
    let response = validators.validate_record(&subject, None).await.unwrap();
    assert_eq!(
        response.message(),
        Some("Subject.name au-core-pat-04: At least text, family name, or given name shall be present")
    );
}
