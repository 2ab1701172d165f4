//! Due date extraction strategy.
//!
//! Anchors on "due"/"payment due"-style labels and parses date-shaped
//! tokens in several formats. When day/month order cannot be determined,
//! every plausible parse becomes its own candidate: an ambiguous date
//! either loses to a better candidate or routes the record to review, it
//! is never guessed at.

use std::sync::LazyLock;

use faktur_core::types::TextFragment;
use jiff::civil::Date;
use regex::Regex;

use super::ExtractorConfig;
use crate::candidate::Candidate;
use crate::layout;

/// Label-plus-date in one fragment, e.g. "Due: 15/08/2024".
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:due\s*(?:date|by|on)?|payment\s+due|payable\s+by)\s*:?\s*(\d{1,4}[/\-.]\d{1,2}[/\-.]\d{2,4})",
    )
    .expect("due date inline pattern")
});

/// A fragment that is only a due-date label.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:due\s*(?:date|by|on)?|payment\s+due|payable\s+by)\s*:?\s*$")
        .expect("due date label pattern")
});

/// Token shape accepted from neighborhood fragments.
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4}[/\-.]\d{1,2}[/\-.]\d{2,4})$").expect("due date value pattern")
});

/// Splits a date token into its three numeric components.
static COMPONENTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})[/\-.](\d{1,2})[/\-.](\d{2,4})$").expect("date components pattern")
});

pub(super) fn extract(ordered: &[&TextFragment], config: &ExtractorConfig) -> Vec<Candidate<Date>> {
    let mut candidates = Vec::new();

    for fragment in ordered {
        if let Some(capture) = INLINE_RE.captures(&fragment.text) {
            push_parses(&capture[1], fragment, Some(0.0), config, &mut candidates);
            continue;
        }

        if LABEL_RE.is_match(&fragment.text) {
            for neighbor in layout::neighbors(fragment, ordered, config.neighbor_radius) {
                if let Some(capture) = VALUE_RE.captures(neighbor.text.trim()) {
                    let distance = neighbor.bounds.center_distance(&fragment.bounds);
                    push_parses(&capture[1], neighbor, Some(distance), config, &mut candidates);
                }
            }
        }
    }

    candidates
}

fn push_parses(
    token: &str,
    fragment: &TextFragment,
    label_distance: Option<f32>,
    config: &ExtractorConfig,
    candidates: &mut Vec<Candidate<Date>>,
) {
    for date in parse_dates(token) {
        candidates.push(Candidate {
            low_confidence: fragment.confidence < config.confidence_floor,
            confidence: fragment.confidence,
            bounds: fragment.bounds,
            page_index: fragment.page_index,
            label_distance,
            value: date,
        });
    }
}

/// Parses a date token into every plausible calendar date.
///
/// ISO `yyyy-mm-dd` is unambiguous. For `a/b/year` tokens the day/month
/// order is inferred where one component exceeds 12; otherwise both
/// readings are returned.
pub(crate) fn parse_dates(token: &str) -> Vec<Date> {
    let Some(capture) = COMPONENTS_RE.captures(token.trim()) else {
        return Vec::new();
    };

    let (Ok(first), Ok(second), Ok(third)) = (
        capture[1].parse::<i32>(),
        capture[2].parse::<i32>(),
        capture[3].parse::<i32>(),
    ) else {
        return Vec::new();
    };

    // Four leading digits: ISO year-month-day.
    if capture[1].len() == 4 {
        return build_date(first, second, third).into_iter().collect();
    }

    let year = normalize_year(third);
    let mut dates = Vec::new();

    let day_first = build_date(year, second, first);
    let month_first = build_date(year, first, second);

    match (first > 12, second > 12) {
        // First component can only be a day.
        (true, _) => dates.extend(day_first),
        // Second component can only be a day.
        (false, true) => dates.extend(month_first),
        // Ambiguous: keep both readings (they coincide when equal).
        (false, false) => {
            dates.extend(day_first);
            if first != second {
                dates.extend(month_first);
            }
        }
    }

    dates
}

fn build_date(year: i32, month: i32, day: i32) -> Option<Date> {
    let year = i16::try_from(year).ok()?;
    let month = i8::try_from(month).ok()?;
    let day = i8::try_from(day).ok()?;
    Date::new(year, month, day).ok()
}

/// Expands two-digit years into the 2000s.
fn normalize_year(year: i32) -> i32 {
    if year < 100 { 2000 + year } else { year }
}
