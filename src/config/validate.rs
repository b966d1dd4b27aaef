//! Whole-document validation rules.
//!
//! Only a handful of fields carry rules. Anything not listed here is accepted
//! as long as it fits the schema.

use super::document::ConfigDocument;
use serde::Serialize;

/// Minimum wait timer, in seconds.
pub const MIN_WAIT_TIME: u32 = 10;

/// Minimum daily star goal.
pub const MIN_DAILY_STARS: u32 = 1;

/// Outcome of [`validate_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check every rule against a candidate document.
pub fn validate_config(doc: &ConfigDocument) -> ValidationReport {
    let mut errors = Vec::new();

    if doc.user.name.trim().is_empty() {
        errors.push("user.name must not be empty".to_string());
    }

    if doc.emotional.timeouts.wait_time < MIN_WAIT_TIME {
        errors.push(format!(
            "emotional.timeouts.waitTime must be at least {} seconds (got {})",
            MIN_WAIT_TIME, doc.emotional.timeouts.wait_time
        ));
    }

    if doc.food.daily_goals.stars < MIN_DAILY_STARS {
        errors.push(format!(
            "food.dailyGoals.stars must be at least {} (got {})",
            MIN_DAILY_STARS, doc.food.daily_goals.stars
        ));
    }

    for (index, phrase) in doc.communication.phrases.iter().enumerate() {
        if phrase.text.trim().is_empty() {
            errors.push(format!(
                "communication.phrases[{}] ({}) must have non-empty text",
                index, phrase.id
            ));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let report = validate_config(&ConfigDocument::default());
        assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn test_wait_time_boundary() {
        let mut doc = ConfigDocument::default();
        doc.emotional.timeouts.wait_time = 10;
        assert!(validate_config(&doc).is_valid);

        doc.emotional.timeouts.wait_time = 9;
        let report = validate_config(&doc);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("emotional.timeouts.waitTime"));
    }

    #[test]
    fn test_all_violations_collected() {
        let mut doc = ConfigDocument::default();
        doc.user.name = "   ".to_string();
        doc.food.daily_goals.stars = 0;
        doc.communication.phrases[2].text = " ".to_string();

        let report = validate_config(&doc);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[2].contains("phrases[2]"));
    }
}
