use async_trait::async_trait;

use super::{checks, Result, Validate};
use crate::model::{HumanName, Subject};
use crate::repository::RecordRepository;
use crate::response::{aggregate, ValidatorResponse};

/// Subject rules. Purely structural; never touches a repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectValidator;

impl SubjectValidator {
    pub fn check(&self, subject: &Subject) -> ValidatorResponse {
        aggregate([check_names(subject.name.as_deref())])
    }
}

/// At least one name entry, and at least one entry with text, family or a
/// complete given name.
fn check_names(names: Option<&[HumanName]>) -> ValidatorResponse {
    let Some(names) = names.filter(|n| !n.is_empty()) else {
        return checks::not_empty("Subject.name");
    };

    if names.iter().any(HumanName::is_complete) {
        ValidatorResponse::valid()
    } else {
        ValidatorResponse::invalid(
            "Subject.name au-core-pat-04: At least text, family name, or given name shall be present",
        )
    }
}

#[async_trait]
impl Validate<Subject> for SubjectValidator {
    async fn validate(
        &self,
        subject: &Subject,
        _repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse> {
        Ok(self.check(subject))
    }
}
