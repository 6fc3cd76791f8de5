//! Lead form data and its validation.
//!
//! DESIGN
//! ======
//! `LeadFormData` holds the raw field strings exactly as the visitor typed or
//! picked them. `LeadFormData::validate` is the only way to obtain a
//! `LeadPayload`, the normalized body posted to the notification endpoint, so
//! nothing unvalidated can reach the network.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

pub const MIN_DAYS_PER_WEEK: u8 = 1;
pub const MAX_DAYS_PER_WEEK: u8 = 7;

// =============================================================================
// FITNESS GOAL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessGoal {
    LoseWeight,
    BuildMuscle,
    GetHealthier,
    ImproveEndurance,
    GeneralFitness,
}

impl FitnessGoal {
    pub const ALL: [Self; 5] =
        [Self::LoseWeight, Self::BuildMuscle, Self::GetHealthier, Self::ImproveEndurance, Self::GeneralFitness];

    /// Wire value, e.g. `"lose-weight"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoseWeight => "lose-weight",
            Self::BuildMuscle => "build-muscle",
            Self::GetHealthier => "get-healthier",
            Self::ImproveEndurance => "improve-endurance",
            Self::GeneralFitness => "general-fitness",
        }
    }

    /// Label shown in the goal picker.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LoseWeight => "Lose Weight",
            Self::BuildMuscle => "Build Muscle",
            Self::GetHealthier => "Get Healthier",
            Self::ImproveEndurance => "Improve Endurance",
            Self::GeneralFitness => "General Fitness",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|goal| goal.as_str() == raw)
    }
}

impl std::fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// A lead precondition failed. Display text is shown to the visitor as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadValidationError {
    #[error("Full name is required")]
    MissingName,
    #[error("Valid email required")]
    InvalidEmail,
    #[error("Fitness goal is required")]
    MissingGoal,
    #[error("Fitness goal is not recognised")]
    UnknownGoal,
    #[error("Days per week is required")]
    MissingDays,
    #[error("Days per week must be between 1 and 7")]
    DaysOutOfRange,
}

impl ErrorCode for LeadValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingName => "E_LEAD_NAME",
            Self::InvalidEmail => "E_LEAD_EMAIL",
            Self::MissingGoal | Self::UnknownGoal => "E_LEAD_GOAL",
            Self::MissingDays | Self::DaysOutOfRange => "E_LEAD_DAYS",
        }
    }
}

// =============================================================================
// FORM DATA
// =============================================================================

/// Raw lead form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFormData {
    pub full_name: String,
    pub email: String,
    pub fitness_goal: String,
    pub days_per_week: String,
}

/// Normalized request body for the notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    pub full_name: String,
    pub email: String,
    pub fitness_goal: FitnessGoal,
    pub days_per_week: u8,
}

impl LeadFormData {
    /// Check every precondition in field order and build the wire payload.
    ///
    /// # Errors
    ///
    /// Returns the first failing field's [`LeadValidationError`].
    pub fn validate(&self) -> Result<LeadPayload, LeadValidationError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(LeadValidationError::MissingName);
        }

        let email = self.email.trim().to_ascii_lowercase();
        if !is_valid_email(&email) {
            return Err(LeadValidationError::InvalidEmail);
        }

        if self.fitness_goal.trim().is_empty() {
            return Err(LeadValidationError::MissingGoal);
        }
        let fitness_goal = FitnessGoal::parse(&self.fitness_goal).ok_or(LeadValidationError::UnknownGoal)?;

        let days = self.days_per_week.trim();
        if days.is_empty() {
            return Err(LeadValidationError::MissingDays);
        }
        let days_per_week = days
            .parse::<u8>()
            .ok()
            .filter(|d| (MIN_DAYS_PER_WEEK..=MAX_DAYS_PER_WEEK).contains(d))
            .ok_or(LeadValidationError::DaysOutOfRange)?;

        Ok(LeadPayload { full_name: full_name.to_owned(), email, fitness_goal, days_per_week })
    }
}

/// `local@domain.tld`: one `@`, no whitespace, non-empty local part, and a
/// dotted domain with no empty labels.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[path = "lead_test.rs"]
mod tests;
