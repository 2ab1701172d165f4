//! Total amount extraction strategy.
//!
//! Anchors on "total"/"amount due"-style labels and parses nearby numeric
//! tokens. Parsing tolerates currency symbols and both decimal conventions
//! (`1,250.00` and `1.250,00`); anything unparseable excludes the fragment
//! instead of failing the document. Candidates are ordered largest-value
//! first, tie-broken by proximity to the bottom of the document, because
//! totals conventionally appear last.

use std::str::FromStr;
use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use faktur_core::types::TextFragment;
use regex::Regex;

use super::ExtractorConfig;
use crate::candidate::Candidate;
use crate::layout;

/// Label-plus-amount in one fragment, e.g. "Total: $1,250.00".
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:grand\s+total|total(?:\s+amount)?(?:\s+due)?|amount\s+(?:due|total)|balance(?:\s+due)?)\s*:?\s*[$£€₹]?\s*([0-9][0-9.,]*)",
    )
    .expect("amount inline pattern")
});

/// Amount preceding the label, e.g. "$1,250.00 total".
static TRAILING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[$£€₹]\s*([0-9][0-9.,]*)\s*(?:total|due|balance)\b")
        .expect("amount trailing pattern")
});

/// A fragment that is only an amount label.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:grand\s+total|total(?:\s+amount)?(?:\s+due)?|amount\s+(?:due|total)|balance(?:\s+due)?)\s*:?\s*$",
    )
    .expect("amount label pattern")
});

/// Token shape accepted from neighborhood fragments.
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[$£€₹]?\s*([0-9][0-9.,]*)$").expect("amount value pattern")
});

pub(super) fn extract(
    ordered: &[&TextFragment],
    config: &ExtractorConfig,
) -> Vec<Candidate<BigDecimal>> {
    let mut candidates = Vec::new();

    for fragment in ordered {
        if let Some(capture) = INLINE_RE
            .captures(&fragment.text)
            .or_else(|| TRAILING_RE.captures(&fragment.text))
        {
            if let Some(value) = parse_amount(&capture[1]) {
                candidates.push(candidate(value, fragment, Some(0.0), config));
            }
            continue;
        }

        if LABEL_RE.is_match(&fragment.text) {
            for neighbor in layout::neighbors(fragment, ordered, config.neighbor_radius) {
                let Some(token) = VALUE_RE
                    .captures(neighbor.text.trim())
                    .map(|capture| capture[1].to_string())
                else {
                    continue;
                };

                if let Some(value) = parse_amount(&token) {
                    let distance = neighbor.bounds.center_distance(&fragment.bounds);
                    candidates.push(candidate(value, neighbor, Some(distance), config));
                }
            }
        }
    }

    // Largest labeled value first; totals conventionally sit at the bottom
    // of the document, so ties resolve toward later pages and lower rows.
    candidates.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| b.page_index.cmp(&a.page_index))
            .then_with(|| b.bounds.bottom().total_cmp(&a.bounds.bottom()))
    });

    candidates
}

/// Parses a numeric token into an amount, tolerating locale variants.
///
/// Returns `None` for anything that does not read as a number; the caller
/// excludes the fragment rather than erroring.
pub(crate) fn parse_amount(token: &str) -> Option<BigDecimal> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let has_comma = cleaned.contains(',');
    let has_period = cleaned.contains('.');

    let normalized = match (has_comma, has_period) {
        // Both separators present: the last one is the decimal point.
        (true, true) => {
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            let last_period = cleaned.rfind('.').unwrap_or(0);
            if last_comma > last_period {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        // Comma only: decimal when it looks like `NN,NN`, thousands otherwise.
        (true, false) => {
            if is_decimal_tail(&cleaned, ',') {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        // Period only: thousands when grouped in threes, decimal otherwise.
        (false, true) => {
            if is_thousands_grouping(&cleaned, '.') {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (false, false) => cleaned,
    };

    BigDecimal::from_str(&normalized).ok()
}

/// Returns whether the single `separator` reads as a decimal point:
/// one occurrence followed by exactly one or two digits.
fn is_decimal_tail(token: &str, separator: char) -> bool {
    let mut parts = token.split(separator);
    let (Some(_), Some(tail), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    (1..=2).contains(&tail.len())
}

/// Returns whether every separator-delimited group after the first has
/// exactly three digits, i.e. `1.250` or `1.250.000`.
fn is_thousands_grouping(token: &str, separator: char) -> bool {
    let mut parts = token.split(separator);
    let Some(head) = parts.next() else {
        return false;
    };
    if head.is_empty() || head.len() > 3 {
        return false;
    }

    let mut any = false;
    for group in parts {
        if group.len() != 3 {
            return false;
        }
        any = true;
    }
    any
}

fn candidate(
    value: BigDecimal,
    fragment: &TextFragment,
    label_distance: Option<f32>,
    config: &ExtractorConfig,
) -> Candidate<BigDecimal> {
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

    fn extract_from(fragments: &[TextFragment]) -> Vec<Candidate<BigDecimal>> {
        let ordered: Vec<&TextFragment> = fragments.iter().collect();
        extract(&ordered, &ExtractorConfig::default())
    }

    #[test]
    fn test_parse_amount_locales() {
        assert_eq!(parse_amount("1,250.00").unwrap().to_string(), "1250.00");
        assert_eq!(parse_amount("1.250,00").unwrap().to_string(), "1250.00");
        assert_eq!(parse_amount("1.250").unwrap().to_string(), "1250");
        assert_eq!(parse_amount("950,5").unwrap().to_string(), "950.5");
        assert_eq!(parse_amount("12.5").unwrap().to_string(), "12.5");
        assert_eq!(parse_amount("$ 99").unwrap().to_string(), "99");
        assert_eq!(parse_amount("1.250.000").unwrap().to_string(), "1250000");
        assert!(parse_amount("N/A").is_none());
        assert!(parse_amount("").is_none());
    }

    #[test]
    fn test_inline_label_variants() {
        for text in [
            "Total: $1,250.00",
            "Grand Total 1,250.00",
            "Amount due: €1,250.00",
            "Balance Due: 1250.00",
            "TOTAL AMOUNT: ₹1,250.00",
        ] {
            let found = extract_from(&[fragment(text, 0.0, 0.0)]);
            assert_eq!(found.len(), 1, "pattern failed for {text:?}");
            assert_eq!(found[0].value.to_string(), "1250.00");
        }
    }

    #[test]
    fn test_amount_before_label() {
        let found = extract_from(&[fragment("$1,250.00 total", 0.0, 0.0)]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value.to_string(), "1250.00");
    }

    #[test]
    fn test_unparseable_neighbor_is_excluded() {
        let fragments = vec![
            fragment("Total:", 100.0, 100.0),
            fragment("TBD", 180.0, 100.0),
        ];
        assert!(extract_from(&fragments).is_empty());
    }

    #[test]
    fn test_candidates_ordered_largest_then_bottom() {
        let fragments = vec![
            fragment("Subtotal", 10.0, 10.0),
            fragment("Total: 100.00", 10.0, 100.0),
            fragment("Total: 119.00", 10.0, 400.0),
            fragment("Total: 119.00", 10.0, 600.0),
        ];

        let found = extract_from(&fragments);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].value.to_string(), "119.00");
        assert!(found[0].bounds.y > found[1].bounds.y);
        assert_eq!(found[2].value.to_string(), "100.00");
    }

    #[test]
    fn test_unlabeled_number_is_not_a_candidate() {
        let fragments = vec![fragment("1,250.00", 0.0, 0.0)];
        assert!(extract_from(&fragments).is_empty());
    }
}
