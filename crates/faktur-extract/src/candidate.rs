//! Candidate field values produced by extraction.

use bigdecimal::BigDecimal;
use faktur_core::types::BoundingBox;
use jiff::civil::Date;
use strum::{Display, EnumIter};

/// The invoice fields the extractor targets.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    /// Invoice number / reference.
    InvoiceNumber,
    /// Total payable amount.
    TotalAmount,
    /// Payment due date.
    DueDate,
}

/// One candidate value for a field, with the evidence that produced it.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    /// The parsed value.
    pub value: T,
    /// Confidence of the source fragment, passed through from the engine.
    pub confidence: f32,
    /// Location of the source fragment.
    pub bounds: BoundingBox,
    /// Page the source fragment came from.
    pub page_index: u32,
    /// Distance between the value and its label, when label-anchored.
    /// `0.0` means the value was inline with the label.
    pub label_distance: Option<f32>,
    /// Set when the source fragment's confidence fell below the configured
    /// floor. Such candidates stay in the set but weaken the overall
    /// classification.
    pub low_confidence: bool,
}

impl<T> Candidate<T> {
    /// Distance to the label, treating unanchored candidates as far away.
    #[inline]
    pub fn label_distance_or_max(&self) -> f32 {
        self.label_distance.unwrap_or(f32::MAX)
    }
}

/// All candidates collected for one document.
///
/// Empty vectors are a valid outcome: the field simply stays unresolved.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    /// Candidates for the invoice number.
    pub invoice_number: Vec<Candidate<String>>,
    /// Candidates for the total amount.
    pub total_amount: Vec<Candidate<BigDecimal>>,
    /// Candidates for the due date.
    pub due_date: Vec<Candidate<Date>>,
}

impl CandidateSet {
    /// Returns whether no field produced any candidate.
    pub fn is_empty(&self) -> bool {
        self.invoice_number.is_empty() && self.total_amount.is_empty() && self.due_date.is_empty()
    }

    /// Total number of candidates across fields.
    pub fn len(&self) -> usize {
        self.invoice_number.len() + self.total_amount.len() + self.due_date.len()
    }
}
