//! Record model
//!
//! The five record types under validation, the references between them, and
//! the tagged `Record` variant used wherever a record of any type is handled
//! (repository results, contained records, bundles, dispatch).

pub mod codes;
pub mod factory;
pub mod types;

use serde::{Deserialize, Serialize};

pub use factory::{RequestInput, TaskInput};
pub use types::{
    CodeableConcept, Coding, HumanName, Identifier, OwningOrganization, Reference, Request,
    RequestIntent, RequestStatus, RequesterRole, Subject, Task, TaskIntent, TaskStatus,
};

/// The record types the validators know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Task,
    Request,
    Subject,
    RequesterRole,
    OwningOrganization,
}

impl RecordType {
    pub const ALL: [RecordType; 5] = [
        Self::Task,
        Self::Request,
        Self::Subject,
        Self::RequesterRole,
        Self::OwningOrganization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Request => "Request",
            Self::Subject => "Subject",
            Self::RequesterRole => "RequesterRole",
            Self::OwningOrganization => "OwningOrganization",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown record type: {}", s))
    }
}

/// A record of any of the five types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Record {
    Task(Task),
    Request(Request),
    Subject(Subject),
    RequesterRole(RequesterRole),
    OwningOrganization(OwningOrganization),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Task(_) => RecordType::Task,
            Self::Request(_) => RecordType::Request,
            Self::Subject(_) => RecordType::Subject,
            Self::RequesterRole(_) => RecordType::RequesterRole,
            Self::OwningOrganization(_) => RecordType::OwningOrganization,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Task(r) => &r.id,
            Self::Request(r) => &r.id,
            Self::Subject(r) => &r.id,
            Self::RequesterRole(r) => &r.id,
            Self::OwningOrganization(r) => &r.id,
        }
    }
}

/// A concrete record type that can be recovered from a `Record`.
pub trait TypedRecord: Sized + Send + Sync {
    const RECORD_TYPE: RecordType;

    /// `None` when the record is of another type
    fn from_record(record: Record) -> Option<Self>;

    fn into_record(self) -> Record;
}

macro_rules! typed_record {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl TypedRecord for $ty {
                const RECORD_TYPE: RecordType = RecordType::$ty;

                fn from_record(record: Record) -> Option<Self> {
                    match record {
                        Record::$ty(r) => Some(r),
                        _ => None,
                    }
                }

                fn into_record(self) -> Record {
                    Record::$ty(self)
                }
            }

            impl From<$ty> for Record {
                fn from(r: $ty) -> Self {
                    Record::$ty(r)
                }
            }
        )+
    };
}

typed_record!(Task, Request, Subject, RequesterRole, OwningOrganization);
