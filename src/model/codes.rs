//! Code systems, identifier systems and fixed concepts used by the
//! e-requesting rules.

/// SNOMED CT code system URI
pub const SNOMED_CT_SYSTEM: &str = "http://snomed.info/sct";

/// Task code system URI
pub const TASK_CODE_SYSTEM: &str = "http://hl7.org/fhir/CodeSystem/task-code";

/// Task code every fulfillment task must carry
pub const TASK_FULFILL_CODE: &str = "fulfill";

/// SNOMED CT concept for "Laboratory procedure"
pub const LABORATORY_PROCEDURE_CODE: &str = "108252007";
pub const LABORATORY_PROCEDURE_DISPLAY: &str = "Laboratory procedure";

// ── HPI-O identifiers ──

pub const HPIO_SYSTEM: &str = "http://ns.electronichealth.net.au/id/hi/hpio/1.0";
pub const HPIO_TYPE_SYSTEM: &str = "http://terminology.hl7.org.au/CodeSystem/v2-0203";
pub const HPIO_TYPE_CODE: &str = "NOI";
pub const HPIO_TYPE_TEXT: &str = "HPI-O";

// ── Order identifiers ──

pub const ORDER_IDENTIFIER_HPIO_SCOPED_SYSTEM: &str =
    "http://terminology.hl7.org.au/CodeSystem/v2-0203";
pub const V2_TABLE_0203_SYSTEM: &str = "http://terminology.hl7.org.au/CodeSystem/v2-0203";
pub const FILLER_GROUP_NUMBER_TYPE_CODE: &str = "FGN";
pub const FILLER_IDENTIFIER_TYPE_CODE: &str = "FILL";
pub const PLACER_GROUP_NUMBER_TYPE_CODE: &str = "PGN";
pub const PLACER_IDENTIFIER_TYPE_CODE: &str = "PLAC";

/// Remove every whitespace character from an identifier value.
pub fn remove_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}
