//! Validator response and aggregation.

use serde::Serialize;

/// Outcome of one check, or of a whole record's validation.
///
/// `message` is present exactly when the response is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorResponse {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Separator between the messages of an aggregated response
pub const MESSAGE_SEPARATOR: &str = ", ";

impl ValidatorResponse {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Same as [`aggregate`]
    pub fn consolidate<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = ValidatorResponse>,
    {
        aggregate(responses)
    }
}

impl std::fmt::Display for ValidatorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            None => write!(f, "valid"),
            Some(message) => write!(f, "invalid: {}", message),
        }
    }
}

/// Combine per-check responses into one.
///
/// Invalid if any constituent is invalid, with every failing message joined
/// in evaluation order. No short-circuit.
pub fn aggregate<I>(responses: I) -> ValidatorResponse
where
    I: IntoIterator<Item = ValidatorResponse>,
{
    let failures: Vec<String> = responses
        .into_iter()
        .filter(|r| !r.is_valid)
        .map(|r| r.message.unwrap_or_default())
        .collect();

    if failures.is_empty() {
        ValidatorResponse::valid()
    } else {
        ValidatorResponse::invalid(failures.join(MESSAGE_SEPARATOR))
    }
}
