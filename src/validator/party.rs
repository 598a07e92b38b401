//! Requester-role and owning-organization validators.
//!
//! Neither record type has an enforced rule yet. Each validator runs an
//! explicit, currently empty rule list, so both are valid by construction
//! and a new rule is a single entry in the list.

use async_trait::async_trait;

use super::{Result, Validate};
use crate::model::{OwningOrganization, RequesterRole};
use crate::repository::RecordRepository;
use crate::response::{aggregate, ValidatorResponse};

type Rule<R> = fn(&R) -> ValidatorResponse;

const REQUESTER_ROLE_RULES: &[Rule<RequesterRole>] = &[];

const ORGANIZATION_RULES: &[Rule<OwningOrganization>] = &[];

fn run_rules<R>(rules: &[Rule<R>], record: &R) -> ValidatorResponse {
    aggregate(rules.iter().map(|rule| rule(record)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequesterRoleValidator;

impl RequesterRoleValidator {
    pub fn check(&self, role: &RequesterRole) -> ValidatorResponse {
        run_rules(REQUESTER_ROLE_RULES, role)
    }
}

#[async_trait]
impl Validate<RequesterRole> for RequesterRoleValidator {
    async fn validate(
        &self,
        role: &RequesterRole,
        _repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse> {
        Ok(self.check(role))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationValidator;

impl OrganizationValidator {
    pub fn check(&self, organization: &OwningOrganization) -> ValidatorResponse {
        run_rules(ORGANIZATION_RULES, organization)
    }
}

#[async_trait]
impl Validate<OwningOrganization> for OrganizationValidator {
    async fn validate(
        &self,
        organization: &OwningOrganization,
        _repository: Option<&dyn RecordRepository>,
    ) -> Result<ValidatorResponse> {
        Ok(self.check(organization))
    }
}
