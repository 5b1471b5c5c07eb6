use thiserror::Error;

use crate::types::InspectionDraft;

/// Business-rule violations detected before a registration reaches storage.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("score must be between 1 and 5 stars")]
    ScoreOutOfRange,
    #[error("inspector name is required")]
    MissingInspector,
}

/// Applies the registration rules in order: score range, then inspector
/// presence. Company reference integrity is not checked here; an unknown
/// company surfaces as a storage failure.
pub fn validate_draft(draft: &InspectionDraft) -> Result<(), ValidationError> {
    if !(1..=5).contains(&draft.score) {
        return Err(ValidationError::ScoreOutOfRange);
    }

    match draft.inspector.as_deref() {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingInspector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(score: i64, inspector: Option<&str>) -> InspectionDraft {
        InspectionDraft {
            company_id: 1,
            score,
            notes: None,
            inspector: inspector.map(str::to_string),
        }
    }

    #[test]
    fn accepts_full_score_range() {
        for score in 1..=5 {
            assert_eq!(validate_draft(&draft(score, Some("Ana"))), Ok(()));
        }
    }

    #[test]
    fn rejects_scores_outside_range() {
        for score in [0, 6, -1, 42] {
            assert_eq!(
                validate_draft(&draft(score, Some("Ana"))),
                Err(ValidationError::ScoreOutOfRange)
            );
        }
    }

    #[test]
    fn rejects_missing_or_empty_inspector() {
        assert_eq!(
            validate_draft(&draft(3, None)),
            Err(ValidationError::MissingInspector)
        );
        assert_eq!(
            validate_draft(&draft(3, Some(""))),
            Err(ValidationError::MissingInspector)
        );
    }

    #[test]
    fn score_rule_runs_before_inspector_rule() {
        // Both rules violated: the score message must win.
        assert_eq!(
            validate_draft(&draft(9, None)),
            Err(ValidationError::ScoreOutOfRange)
        );
    }

    #[test]
    fn messages_match_api_contract() {
        assert_eq!(
            ValidationError::ScoreOutOfRange.to_string(),
            "score must be between 1 and 5 stars"
        );
        assert_eq!(
            ValidationError::MissingInspector.to_string(),
            "inspector name is required"
        );
    }
}
