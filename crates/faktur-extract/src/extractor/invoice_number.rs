//! Invoice number extraction strategy.
//!
//! Looks for alphanumeric reference tokens anchored by a label ("Invoice
//! No", "INV #", "Bill No", "Reference No"). Inline captures carry a label
//! distance of zero; otherwise every token-shaped fragment in the spatial
//! neighborhood of a label fragment becomes a candidate.

use std::sync::LazyLock;

use faktur_core::types::TextFragment;
use regex::Regex;

use super::ExtractorConfig;
use crate::candidate::Candidate;
use crate::layout;

/// Label-plus-value in one fragment, e.g. "Invoice No: INV-2024-001".
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:invoice|inv|bill|reference)\s*(?:no\.?|number|num\.?|#)?\s*[:#]?\s*([A-Za-z0-9][A-Za-z0-9/-]{2,})",
    )
    .expect("invoice number inline pattern")
});

/// A fragment that is only a label, with the value somewhere nearby.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:invoice|inv|bill|reference)\s*(?:no\.?|number|num\.?|#)?\s*[:#]?\s*$")
        .expect("invoice number label pattern")
});

/// Token shape accepted from neighborhood fragments.
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9/-]{2,}$").expect("invoice number value pattern")
});

pub(super) fn extract(
    ordered: &[&TextFragment],
    config: &ExtractorConfig,
) -> Vec<Candidate<String>> {
    let mut candidates = Vec::new();

    for fragment in ordered {
        // Inline: label and value in the same fragment. A captured label
        // word means the fragment was label-only and backtracking grabbed
        // the wrong token; fall through to the neighborhood search then.
        if let Some(capture) = INLINE_RE.captures(&fragment.text) {
            let value = capture[1].trim_end_matches(['.', ',']).to_string();
            if !is_label_word(&value) {
                candidates.push(candidate(value, fragment, Some(0.0), config));
                continue;
            }
        }

        // Label-only fragment: consider token-shaped neighbors.
        if LABEL_RE.is_match(&fragment.text) {
            for neighbor in layout::neighbors(fragment, ordered, config.neighbor_radius) {
                let token = neighbor.text.trim();
                if VALUE_RE.is_match(token)
                    && token.chars().any(|c| c.is_ascii_digit())
                    && !is_label_word(token)
                {
                    let distance = neighbor.bounds.center_distance(&fragment.bounds);
                    candidates.push(candidate(
                        token.to_string(),
                        neighbor,
                        Some(distance),
                        config,
                    ));
                }
            }
        }
    }

    candidates
}

/// Guards against capturing a second label word as the value.
fn is_label_word(token: &str) -> bool {
    matches!(
        token.to_ascii_lowercase().as_str(),
        "invoice" | "inv" | "bill" | "reference" | "no" | "number" | "num"
    )
}

fn candidate(
    value: String,
    fragment: &TextFragment,
    label_distance: Option<f32>,
    config: &ExtractorConfig,
) -> Candidate<String> {
    Candidate {
        low_confidence: fragment.confidence < config.confidence_floor,
        confidence: fragment.confidence,
        bounds: fragment.bounds,
        page_index: fragment.page_index,
        label_distance,
        value,
    }
}

#[cfg(test)]
mod tests {
    use faktur_core::types::BoundingBox;

    use super::*;

    fn fragment(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment::new(text, BoundingBox::new(x, y, 100.0, 14.0), 0.9, 0)
    }

    fn extract_from(fragments: &[TextFragment]) -> Vec<Candidate<String>> {
        let ordered: Vec<&TextFragment> = fragments.iter().collect();
        extract(&ordered, &ExtractorConfig::default())
    }

    #[test]
    fn test_inline_label_variants() {
        for text in [
            "Invoice No: INV-2024-001",
            "invoice number INV-2024-001",
            "INV # INV-2024-001",
            "Bill No. INV-2024-001",
            "Reference #: INV-2024-001",
        ] {
            let found = extract_from(&[fragment(text, 0.0, 0.0)]);
            assert_eq!(found.len(), 1, "pattern failed for {text:?}");
            assert_eq!(found[0].value, "INV-2024-001");
            assert_eq!(found[0].label_distance, Some(0.0));
        }
    }

    #[test]
    fn test_label_with_nearby_value() {
        let fragments = vec![
            fragment("Invoice No:", 100.0, 100.0),
            fragment("2024-0133", 230.0, 100.0),
        ];

        let found = extract_from(&fragments);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "2024-0133");
        assert!(found[0].label_distance.unwrap() > 0.0);
    }

    #[test]
    fn test_neighbor_without_digits_is_ignored() {
        let fragments = vec![
            fragment("Invoice No:", 100.0, 100.0),
            fragment("PENDING", 230.0, 100.0),
        ];

        assert!(extract_from(&fragments).is_empty());
    }

    #[test]
    fn test_no_label_no_candidates() {
        let fragments = vec![fragment("Thank you for your business", 0.0, 0.0)];
        assert!(extract_from(&fragments).is_empty());
    }
}
