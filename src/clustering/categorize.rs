//! Keyword categorisation of free-text failure reports.

use crate::model::FailureCategory;
use crate::text::tokenize;

/// Keyword density (hits per token) at which confidence saturates at 1.0.
const SATURATING_DENSITY: f64 = 0.25;

const CALCULATION: &[&str] = &[
    "calculation",
    "calculated",
    "calculate",
    "miscalculated",
    "compute",
    "computed",
    "arithmetic",
    "math",
    "formula",
    "sum",
    "total",
    "percentage",
    "rounding",
    "rounded",
    "amount",
];

const OUTDATED_REFERENCE: &[&str] = &[
    "outdated",
    "obsolete",
    "superseded",
    "repealed",
    "deprecated",
    "expired",
    "amended",
    "stale",
    "old",
    "previous",
    "no longer",
    "out of date",
    "last year",
];

const MISINTERPRETATION: &[&str] = &[
    "misunderstood",
    "misread",
    "misinterpreted",
    "misinterpretation",
    "misunderstanding",
    "confused",
    "ambiguous",
    "wrong question",
    "different question",
];

const MISSING_CONTEXT: &[&str] = &[
    "context",
    "omitted",
    "omits",
    "ignores",
    "ignored",
    "assumption",
    "assumes",
    "jurisdiction",
    "exception",
    "exemption",
    "depends",
];

const HALLUCINATION: &[&str] = &[
    "fabricated",
    "invented",
    "hallucinated",
    "hallucination",
    "nonexistent",
    "fictitious",
    "fake",
    "made up",
    "does not exist",
    "doesn't exist",
];

const INCOMPLETE: &[&str] = &[
    "incomplete",
    "partial",
    "partially",
    "truncated",
    "unfinished",
    "missing",
    "cut off",
    "more detail",
];

const FORMATTING: &[&str] = &[
    "format",
    "formatting",
    "formatted",
    "layout",
    "table",
    "markdown",
    "bullet",
    "typo",
    "spelling",
    "grammar",
];

fn keywords(category: FailureCategory) -> &'static [&'static str] {
    match category {
        FailureCategory::Calculation => CALCULATION,
        FailureCategory::OutdatedReference => OUTDATED_REFERENCE,
        FailureCategory::Misinterpretation => MISINTERPRETATION,
        FailureCategory::MissingContext => MISSING_CONTEXT,
        FailureCategory::Hallucination => HALLUCINATION,
        FailureCategory::Incomplete => INCOMPLETE,
        FailureCategory::Formatting => FORMATTING,
        FailureCategory::Other => &[],
    }
}

/// A category assignment and how sure it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Categorization {
    pub category: FailureCategory,
    pub confidence: f64,
}

/// Assigns `text` to the category whose keywords it mentions most.
///
/// A category tagged by the rater wins outright with confidence 1.0. Text that
/// matches nothing is `Other` with confidence 0.0. Ties go to the category listed
/// first in [`FailureCategory::ALL`].
pub fn categorize(text: &str, tagged: Option<FailureCategory>) -> Categorization {
    if let Some(category) = tagged {
        return Categorization {
            category,
            confidence: 1.0,
        };
    }

    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Categorization {
            category: FailureCategory::Other,
            confidence: 0.0,
        };
    }
    let joined = format!(" {} ", tokens.join(" "));

    let mut best = (FailureCategory::Other, 0usize);
    for category in FailureCategory::ALL {
        let hits = keywords(category)
            .iter()
            .filter(|kw| joined.contains(&format!(" {} ", kw)))
            .count();
        if hits > best.1 {
            best = (category, hits);
        }
    }

    let (category, hits) = best;
    let density = hits as f64 / tokens.len() as f64;
    Categorization {
        category,
        confidence: (density / SATURATING_DENSITY).min(1.0),
    }
}
