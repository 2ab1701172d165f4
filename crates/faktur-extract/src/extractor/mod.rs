//! Pattern- and heuristic-based field extraction.
//!
//! Each target field has its own strategy over the shared fragment
//! sequence, so strategies can be tested and tuned in isolation. A strategy
//! never fails: unparseable fragments are excluded and an empty candidate
//! list is a valid result.

mod amount;
mod date;
mod invoice_number;

use faktur_core::types::TextFragment;
use tracing::debug;

use crate::candidate::CandidateSet;
use crate::{TRACING_TARGET_EXTRACT, layout};

/// Default confidence floor below which candidates are flagged.
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.5;

/// Default spatial neighborhood radius around a label, in page pixels.
pub const DEFAULT_NEIGHBOR_RADIUS: f32 = 160.0;

/// Configuration for the field extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Candidates below this confidence are kept but flagged low-confidence.
    pub confidence_floor: f32,
    /// Radius around a label fragment searched for value fragments.
    pub neighbor_radius: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            neighbor_radius: DEFAULT_NEIGHBOR_RADIUS,
        }
    }
}

impl ExtractorConfig {
    /// Sets the confidence floor, clamped to `[0, 1]`.
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = floor.clamp(0.0, 1.0);
        self
    }

    /// Sets the label neighborhood radius.
    pub fn with_neighbor_radius(mut self, radius: f32) -> Self {
        self.neighbor_radius = radius.max(0.0);
        self
    }
}

/// Extracts candidate field values from a fragment sequence.
///
/// The extractor does not decide between conflicting candidates; it
/// collects every plausible reading along with its evidence and leaves
/// conflict resolution to the validator.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    config: ExtractorConfig,
}

impl FieldExtractor {
    /// Creates an extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Returns the extractor configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Runs every field strategy over the fragment sequence.
    pub fn extract(&self, fragments: &[TextFragment]) -> CandidateSet {
        let ordered = layout::reading_order(fragments);

        let set = CandidateSet {
            invoice_number: invoice_number::extract(&ordered, &self.config),
            total_amount: amount::extract(&ordered, &self.config),
            due_date: date::extract(&ordered, &self.config),
        };

        debug!(
            target: TRACING_TARGET_EXTRACT,
            fragments = fragments.len(),
            invoice_number_candidates = set.invoice_number.len(),
            amount_candidates = set.total_amount.len(),
            date_candidates = set.due_date.len(),
            "Extraction complete"
        );

        set
    }
}

#[cfg(test)]
mod tests {
    use faktur_core::types::BoundingBox;

    use super::*;

    fn fragment(text: &str, x: f32, y: f32, confidence: f32) -> TextFragment {
        TextFragment::new(text, BoundingBox::new(x, y, 120.0, 14.0), confidence, 0)
    }

    #[test]
    fn test_extract_round_trip_document() {
        let extractor = FieldExtractor::default();
        let fragments = vec![
            fragment("ACME GmbH", 40.0, 20.0, 0.99),
            fragment("Invoice No: INV-2024-001", 40.0, 60.0, 0.97),
            fragment("Total: $1,250.00", 40.0, 600.0, 0.96),
            fragment("Due: 2024-08-15", 40.0, 630.0, 0.95),
        ];

        let set = extractor.extract(&fragments);

        assert_eq!(set.invoice_number.len(), 1);
        assert_eq!(set.invoice_number[0].value, "INV-2024-001");
        assert_eq!(set.total_amount.len(), 1);
        assert_eq!(set.total_amount[0].value.to_string(), "1250.00");
        assert_eq!(set.due_date.len(), 1);
        assert_eq!(
            set.due_date[0].value,
            jiff::civil::date(2024, 8, 15)
        );
    }

    #[test]
    fn test_extract_empty_fragments_is_valid() {
        let extractor = FieldExtractor::default();
        let set = extractor.extract(&[]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_low_confidence_candidates_are_flagged_not_dropped() {
        let extractor = FieldExtractor::default();
        let fragments = vec![fragment("Invoice No: INV-77", 10.0, 10.0, 0.3)];

        let set = extractor.extract(&fragments);
        assert_eq!(set.invoice_number.len(), 1);
        assert!(set.invoice_number[0].low_confidence);
    }
}
