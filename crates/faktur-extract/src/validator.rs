//! Candidate validation and conflict resolution.

use bigdecimal::{BigDecimal, Zero};
use jiff::civil::Date;
use jiff::{Span, Timestamp, tz::TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TRACING_TARGET_VALIDATE;
use crate::candidate::{Candidate, CandidateSet, FieldKind};

/// Default epsilon within which two confidences count as tied.
pub const DEFAULT_TIE_EPSILON: f32 = 0.05;

/// Default sanity ceiling for amounts, just inside NUMERIC(10,2).
pub const DEFAULT_MAX_AMOUNT: i64 = 10_000_000;

/// Default grace window for due dates that precede receipt, in days.
///
/// Wide enough to admit genuinely late invoices while catching a misread
/// year, which lands more than a year in the past.
pub const DEFAULT_DUE_DATE_GRACE_DAYS: i32 = 370;

/// Maximum accepted length for an invoice number, matching the column width.
const MAX_INVOICE_NUMBER_LEN: usize = 64;

/// Configuration for the validator.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Confidence difference treated as a tie.
    pub tie_epsilon: f32,
    /// Amounts above this are implausible and demoted.
    pub max_amount: i64,
    /// Due dates earlier than `received_at - grace` are implausible.
    pub due_date_grace_days: i32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tie_epsilon: DEFAULT_TIE_EPSILON,
            max_amount: DEFAULT_MAX_AMOUNT,
            due_date_grace_days: DEFAULT_DUE_DATE_GRACE_DAYS,
        }
    }
}

/// Overall classification of a validated record.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionConfidence {
    /// Every required field resolved above the confidence floor.
    Confident,
    /// At least one required field is unresolved or low-confidence.
    /// Not an error: the record routes to human review.
    Ambiguous,
}

/// The validated result of one document, possibly with unresolved fields.
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    /// Resolved invoice number, when one candidate won.
    pub invoice_number: Option<String>,
    /// Resolved total, scaled to two decimal places.
    pub total_amount: Option<BigDecimal>,
    /// Resolved due date. May legitimately stay unresolved: not every
    /// invoice carries one.
    pub due_date: Option<Date>,
    /// Overall confidence classification.
    pub confidence: ExtractionConfidence,
}

impl ValidatedRecord {
    /// Returns whether every required field resolved confidently.
    #[inline]
    pub fn is_confident(&self) -> bool {
        matches!(self.confidence, ExtractionConfidence::Confident)
    }
}

/// Resolves candidate conflicts and checks plausibility.
///
/// Per field the highest-confidence candidate wins; confidences tied
/// within the epsilon resolve toward the candidate spatially closer to
/// its label, which keeps the choice deterministic. A winner failing a
/// plausibility check is demoted and the next candidate considered.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    /// Creates a validator with the given configuration.
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Returns the validator configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates a candidate set against the receipt time.
    pub fn validate(&self, candidates: CandidateSet, received_at: Timestamp) -> ValidatedRecord {
        let received_date = received_at.to_zoned(TimeZone::UTC).date();

        let invoice_number = self.resolve(
            candidates.invoice_number,
            FieldKind::InvoiceNumber,
            |value: &String| !value.is_empty() && value.len() <= MAX_INVOICE_NUMBER_LEN,
        );

        let max_amount = BigDecimal::from(self.config.max_amount);
        let total_amount = self.resolve(
            candidates.total_amount,
            FieldKind::TotalAmount,
            |value: &BigDecimal| value > &BigDecimal::zero() && value < &max_amount,
        );

        let earliest_due = received_date
            .checked_sub(Span::new().days(self.config.due_date_grace_days as i64))
            .unwrap_or(Date::MIN);
        let due_date = self.resolve(candidates.due_date, FieldKind::DueDate, |value: &Date| {
            *value >= earliest_due
        });

        let confident = matches!(
            (&invoice_number, &total_amount),
            (Some(number), Some(amount)) if !number.low_confidence && !amount.low_confidence
        );

        ValidatedRecord {
            invoice_number: invoice_number.map(|winner| winner.value),
            total_amount: total_amount.map(|winner| {
                winner
                    .value
                    .with_scale_round(2, bigdecimal::RoundingMode::HalfUp)
            }),
            due_date: due_date.map(|winner| winner.value),
            confidence: if confident {
                ExtractionConfidence::Confident
            } else {
                ExtractionConfidence::Ambiguous
            },
        }
    }

    /// Picks the winning candidate for one field, demoting implausible ones.
    fn resolve<T>(
        &self,
        mut candidates: Vec<Candidate<T>>,
        field: FieldKind,
        plausible: impl Fn(&T) -> bool,
    ) -> Option<Candidate<T>> {
        loop {
            let index = self.pick_best(&candidates)?;
            if plausible(&candidates[index].value) {
                return Some(candidates.swap_remove(index));
            }

            debug!(
                target: TRACING_TARGET_VALIDATE,
                %field,
                confidence = candidates[index].confidence,
                "Demoting implausible candidate"
            );
            candidates.swap_remove(index);
        }
    }

    /// Index of the best candidate: highest confidence, ties within the
    /// epsilon broken by label proximity, further ties keeping the
    /// extractor's preference order.
    fn pick_best<T>(&self, candidates: &[Candidate<T>]) -> Option<usize> {
        let mut best: Option<usize> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let Some(current) = best else {
                best = Some(index);
                continue;
            };

            let leader = &candidates[current];
            let difference = candidate.confidence - leader.confidence;

            if difference > self.config.tie_epsilon {
                best = Some(index);
            } else if difference.abs() <= self.config.tie_epsilon
                && candidate.label_distance_or_max() < leader.label_distance_or_max()
            {
                best = Some(index);
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use faktur_core::types::BoundingBox;
    use jiff::civil::date;

    use super::*;

    fn amount_candidate(
        value: &str,
        confidence: f32,
        label_distance: f32,
    ) -> Candidate<BigDecimal> {
        Candidate {
            value: BigDecimal::from_str(value).unwrap(),
            confidence,
            bounds: BoundingBox::new(0.0, 0.0, 50.0, 12.0),
            page_index: 0,
            label_distance: Some(label_distance),
            low_confidence: false,
        }
    }

    fn number_candidate(value: &str, confidence: f32) -> Candidate<String> {
        Candidate {
            value: value.to_string(),
            confidence,
            bounds: BoundingBox::new(0.0, 0.0, 50.0, 12.0),
            page_index: 0,
            label_distance: Some(0.0),
            low_confidence: confidence < 0.5,
        }
    }

    fn received() -> Timestamp {
        Timestamp::from_second(1_722_470_400).unwrap() // 2024-08-01 UTC
    }

    #[test]
    fn test_confident_when_required_fields_resolve() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-2024-001", 0.95)],
                total_amount: vec![amount_candidate("1250.00", 0.92, 0.0)],
                due_date: Vec::new(),
            },
            received(),
        );

        assert!(record.is_confident());
        assert_eq!(record.invoice_number.as_deref(), Some("INV-2024-001"));
        assert_eq!(record.total_amount.unwrap().to_string(), "1250.00");
        assert_eq!(record.due_date, None);
    }

    #[test]
    fn test_missing_required_field_is_ambiguous() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: Vec::new(),
                total_amount: vec![amount_candidate("99.00", 0.9, 0.0)],
                due_date: Vec::new(),
            },
            received(),
        );

        assert!(!record.is_confident());
        assert_eq!(record.invoice_number, None);
        assert!(record.total_amount.is_some());
    }

    #[test]
    fn test_low_confidence_winner_is_ambiguous() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-3", 0.2)],
                total_amount: vec![amount_candidate("50.00", 0.9, 0.0)],
                due_date: Vec::new(),
            },
            received(),
        );

        // The value still resolves; only the classification weakens.
        assert_eq!(record.invoice_number.as_deref(), Some("INV-3"));
        assert!(!record.is_confident());
    }

    #[test]
    fn test_tied_confidence_resolves_by_label_proximity() {
        let validator = Validator::default();
        // Second candidate is closer to its label; confidences tie.
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![
                    amount_candidate("500.00", 0.90, 80.0),
                    amount_candidate("750.00", 0.91, 12.0),
                ],
                due_date: Vec::new(),
            },
            received(),
        );

        assert_eq!(record.total_amount.unwrap().to_string(), "750.00");
    }

    #[test]
    fn test_clear_confidence_gap_beats_proximity() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![
                    amount_candidate("500.00", 0.95, 80.0),
                    amount_candidate("750.00", 0.60, 1.0),
                ],
                due_date: Vec::new(),
            },
            received(),
        );

        assert_eq!(record.total_amount.unwrap().to_string(), "500.00");
    }

    #[test]
    fn test_implausible_amount_demoted_to_next_candidate() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![
                    amount_candidate("99999999999", 0.99, 0.0),
                    amount_candidate("120.00", 0.80, 0.0),
                ],
                due_date: Vec::new(),
            },
            received(),
        );

        assert_eq!(record.total_amount.unwrap().to_string(), "120.00");
    }

    #[test]
    fn test_negative_amount_unresolved() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![amount_candidate("-5.00", 0.99, 0.0)],
                due_date: Vec::new(),
            },
            received(),
        );

        assert_eq!(record.total_amount, None);
        assert!(!record.is_confident());
    }

    #[test]
    fn test_due_date_far_in_past_demoted() {
        let validator = Validator::default();
        let stale = Candidate {
            value: date(2014, 8, 15),
            confidence: 0.95,
            bounds: BoundingBox::new(0.0, 0.0, 50.0, 12.0),
            page_index: 0,
            label_distance: Some(0.0),
            low_confidence: false,
        };

        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![amount_candidate("10.00", 0.9, 0.0)],
                due_date: vec![stale],
            },
            received(),
        );

        // Misread year caught, field demoted to unresolved.
        assert_eq!(record.due_date, None);
        // Due date is optional; the record stays confident.
        assert!(record.is_confident());
    }

    #[test]
    fn test_recent_past_due_date_accepted() {
        let validator = Validator::default();
        let recent = Candidate {
            value: date(2024, 7, 1),
            confidence: 0.95,
            bounds: BoundingBox::new(0.0, 0.0, 50.0, 12.0),
            page_index: 0,
            label_distance: Some(0.0),
            low_confidence: false,
        };

        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![amount_candidate("10.00", 0.9, 0.0)],
                due_date: vec![recent],
            },
            received(),
        );

        assert_eq!(record.due_date, Some(date(2024, 7, 1)));
    }

    #[test]
    fn test_amount_rescaled_to_cents() {
        let validator = Validator::default();
        let record = validator.validate(
            CandidateSet {
                invoice_number: vec![number_candidate("INV-1", 0.9)],
                total_amount: vec![amount_candidate("950.5", 0.9, 0.0)],
                due_date: Vec::new(),
            },
            received(),
        );

        assert_eq!(record.total_amount.unwrap().to_string(), "950.50");
    }
}
