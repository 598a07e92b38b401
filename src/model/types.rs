//! Value types and record shapes carried by the validators.
//!
//! These capture only the fields the e-requesting rules read. Conversion from
//! an external clinical-data model happens upstream of this crate.

use serde::{Deserialize, Serialize};

use super::{codes, Record, RecordType};

/// Declares a coded status/intent enum with its wire literal, `as_str`,
/// `Display` and `FromStr`.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $literal:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $literal)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $literal,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($literal => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("Unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

coded_enum! {
    /// Lifecycle status of a request record
    RequestStatus {
        Draft => "draft",
        Active => "active",
        OnHold => "on-hold",
        Revoked => "revoked",
        Completed => "completed",
        EnteredInError => "entered-in-error",
        Unknown => "unknown",
    }
}

coded_enum! {
    /// Intent of a request record
    RequestIntent {
        Proposal => "proposal",
        Plan => "plan",
        Directive => "directive",
        Order => "order",
        OriginalOrder => "original-order",
        ReflexOrder => "reflex-order",
        FillerOrder => "filler-order",
        InstanceOrder => "instance-order",
        Option => "option",
    }
}

coded_enum! {
    /// Lifecycle status of a fulfillment task
    TaskStatus {
        Draft => "draft",
        Requested => "requested",
        Received => "received",
        Accepted => "accepted",
        Rejected => "rejected",
        Ready => "ready",
        Cancelled => "cancelled",
        InProgress => "in-progress",
        OnHold => "on-hold",
        Failed => "failed",
        Completed => "completed",
        EnteredInError => "entered-in-error",
    }
}

coded_enum! {
    /// Intent of a fulfillment task
    TaskIntent {
        Unknown => "unknown",
        Proposal => "proposal",
        Plan => "plan",
        Order => "order",
        OriginalOrder => "original-order",
        ReflexOrder => "reflex-order",
        FillerOrder => "filler-order",
        InstanceOrder => "instance-order",
        Option => "option",
    }
}

/// Business identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Identifier type, e.g. `NOI` for an HPI-O or `PGN` for a placer group number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<Coding>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
            type_code: None,
        }
    }

    /// HPI-O (organisation healthcare provider identifier)
    pub fn hpio(value: impl Into<String>) -> Self {
        Self {
            type_code: Some(Coding {
                system: Some(codes::HPIO_TYPE_SYSTEM.to_string()),
                code: Some(codes::HPIO_TYPE_CODE.to_string()),
                display: Some(codes::HPIO_TYPE_TEXT.to_string()),
            }),
            ..Self::new(codes::HPIO_SYSTEM, value)
        }
    }

    /// Placer group number scoped by the placer organisation's HPI-O
    pub fn requisition(scoping_hpio: &str, value: impl Into<String>) -> Self {
        let system = format!(
            "{}/{}",
            codes::ORDER_IDENTIFIER_HPIO_SCOPED_SYSTEM,
            codes::remove_whitespace(scoping_hpio)
        );
        Self {
            type_code: Some(Coding::new(
                codes::V2_TABLE_0203_SYSTEM,
                codes::PLACER_GROUP_NUMBER_TYPE_CODE,
            )),
            ..Self::new(system, value)
        }
    }

    pub fn has_system(&self, system: &str) -> bool {
        self.system
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(system))
    }
}

/// A code drawn from a code system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: None,
        }
    }

    pub fn snomed(code: impl Into<String>, display: Option<&str>) -> Self {
        Self {
            display: display.map(str::to_string),
            ..Self::new(codes::SNOMED_CT_SYSTEM, code)
        }
    }

    /// Case-insensitive match on both system and code
    pub fn matches(&self, system: &str, code: &str) -> bool {
        let system_matches = self
            .system
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(system));
        let code_matches = self
            .code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(code));
        system_matches && code_matches
    }
}

/// A concept expressed as codings and/or free text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, rename = "coding", skip_serializing_if = "Vec::is_empty")]
    pub codings: Vec<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn laboratory_procedure() -> Self {
        Self {
            codings: vec![Coding::snomed(
                codes::LABORATORY_PROCEDURE_CODE,
                Some(codes::LABORATORY_PROCEDURE_DISPLAY),
            )],
            text: Some(codes::LABORATORY_PROCEDURE_DISPLAY.to_string()),
        }
    }

    pub fn fulfill_task() -> Self {
        Self {
            codings: vec![Coding::new(codes::TASK_CODE_SYSTEM, codes::TASK_FULFILL_CODE)],
            text: None,
        }
    }

    /// A requested test coded in SNOMED CT
    pub fn snomed_test(term: &str, preferred_display: &str, text: Option<&str>) -> Self {
        Self {
            codings: vec![Coding::snomed(term, Some(preferred_display))],
            text: text.map(str::to_string),
        }
    }

    /// A requested test given only as free text
    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            codings: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn has_coding(&self, system: &str, code: &str) -> bool {
        self.codings.iter().any(|c| c.matches(system, code))
    }

    pub fn has_text(&self) -> bool {
        !is_blank(self.text.as_deref())
    }
}

/// A person's name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

impl HumanName {
    /// At least one of text, family or a fully populated given-name list
    pub fn is_complete(&self) -> bool {
        let given_complete =
            !self.given.is_empty() && self.given.iter().all(|g| !g.trim().is_empty());
        !is_blank(self.text.as_deref()) || !is_blank(self.family.as_deref()) || given_complete
    }
}

/// Typed pointer from one record to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub target_type: RecordType,
    #[serde(default)]
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn new(target_type: RecordType, target_id: impl Into<String>) -> Self {
        Self {
            target_type,
            target_id: target_id.into(),
            display: None,
        }
    }

    /// `#id` addresses a record contained in the referencing record
    pub fn contained_id(&self) -> Option<&str> {
        self.target_id.strip_prefix('#')
    }

    /// Non-empty target identifier
    pub fn is_populated(&self) -> bool {
        !self.target_id.trim().is_empty()
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.contained_id() {
            Some(_) => write!(f, "{}", self.target_id),
            None => write!(f, "{}/{}", self.target_type, self.target_id),
        }
    }
}

/// `Some` reference with a non-empty target identifier
pub fn is_populated(reference: Option<&Reference>) -> bool {
    reference.is_some_and(Reference::is_populated)
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Order-fulfillment task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<TaskIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    /// Raw authored timestamp as received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<Reference>,
    #[serde(default, rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_subject: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Record>,
}

/// Pathology service request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<RequestIntent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    /// The requested test(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Record>,
}

/// Patient the request is about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    /// `None` when the source carried no name element at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<HumanName>>,
}

/// Practitioner role placing the order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterRole {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
}

/// Organisation that owns (fills) the task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwningOrganization {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
}

impl OwningOrganization {
    /// Whitespace-stripped HPI-O value, if the organisation carries one
    pub fn hpio(&self) -> Option<String> {
        self.identifier
            .iter()
            .find(|i| i.has_system(codes::HPIO_SYSTEM))
            .and_then(|i| i.value.as_deref())
            .map(codes::remove_whitespace)
            .filter(|v| !v.is_empty())
    }
}
