//! Rater trust scoring.
//!
//! A trust score is a weighted sum of five independently capped terms, clamped to
//! `[0.1, 1.0]`:
//!
//! | term | formula | cap |
//! |------|---------|-----|
//! | credentials | sum of per-credential weights | 0.35 |
//! | experience | `years / 20` | 0.25 |
//! | performance | `accuracy * 0.30` | 0.30 |
//! | responsiveness | `max(0, 0.10 - (avg_seconds - 180) / 3600)` | none |
//! | specialization | `0.01 * count` | 0.05 |
//!
//! Scoring is pure and allocation-free apart from credential normalization, so it is
//! safe to call from any number of tasks at once.


use crate::constants::{TRUST_SCORE_CEILING, TRUST_SCORE_FLOOR};

pub const CREDENTIALS_CAP: f64 = 0.35;
pub const EXPERIENCE_CAP: f64 = 0.25;
pub const EXPERIENCE_FULL_YEARS: f64 = 20.0;
pub const PERFORMANCE_WEIGHT: f64 = 0.30;
pub const RESPONSIVENESS_BASE: f64 = 0.10;
pub const RESPONSIVENESS_PIVOT_SECS: f64 = 180.0;
pub const RESPONSIVENESS_DECAY_SECS: f64 = 3600.0;
pub const SPECIALIZATION_STEP: f64 = 0.01;
pub const SPECIALIZATION_CAP: f64 = 0.05;

/// Flat bonus for a credential tag that is not in [`CREDENTIAL_WEIGHTS`].
pub const UNKNOWN_CREDENTIAL_WEIGHT: f64 = 0.02;

/// Known credential tags, most senior first.
pub const CREDENTIAL_WEIGHTS: &[(&str, f64)] = &[
    ("phd", 0.15),
    ("doctorate", 0.15),
    ("certified_expert", 0.12),
    ("board_certified", 0.12),
    ("senior_reviewer", 0.10),
    ("licensed_professional", 0.10),
    ("cpa", 0.10),
    ("attorney", 0.10),
    ("masters", 0.08),
    ("reviewer", 0.05),
    ("bachelors", 0.04),
    ("trainee", 0.02),
];

/// Rater attributes that feed the trust score.
#[derive(Debug, Clone, Copy)]
pub struct TrustInputs<'a> {
    pub credentials: &'a [String],
    pub years_experience: f64,
    pub accuracy_rate: f64,
    pub avg_response_seconds: f64,
    pub num_specializations: usize,
}

/// Per-term contributions, each already capped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustBreakdown {
    pub credentials: f64,
    pub experience: f64,
    pub performance: f64,
    pub responsiveness: f64,
    pub specialization: f64,
}

impl TrustBreakdown {
    /// Sum of the terms before clamping.
    pub fn raw_total(&self) -> f64 {
        self.credentials
            + self.experience
            + self.performance
            + self.responsiveness
            + self.specialization
    }

    /// Final trust score in `[0.1, 1.0]`.
    pub fn score(&self) -> f64 {
        self.raw_total().clamp(TRUST_SCORE_FLOOR, TRUST_SCORE_CEILING)
    }
}

/// Looks up the weight of a single credential tag (case and separator insensitive).
pub fn credential_weight(tag: &str) -> f64 {
    let normalized: String = tag
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    CREDENTIAL_WEIGHTS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, weight)| *weight)
        .unwrap_or(UNKNOWN_CREDENTIAL_WEIGHT)
}

/// Computes every capped term of the trust score.
pub fn trust_breakdown(inputs: &TrustInputs<'_>) -> TrustBreakdown {
    let credentials = inputs
        .credentials
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|c| credential_weight(c))
        .sum::<f64>()
        .min(CREDENTIALS_CAP);

    let years = non_negative(inputs.years_experience);
    let experience = (years / EXPERIENCE_FULL_YEARS).min(EXPERIENCE_CAP);

    let accuracy = non_negative(inputs.accuracy_rate).min(1.0);
    let performance = accuracy * PERFORMANCE_WEIGHT;

    let avg_response = non_negative(inputs.avg_response_seconds);
    let responsiveness = (RESPONSIVENESS_BASE
        - (avg_response - RESPONSIVENESS_PIVOT_SECS) / RESPONSIVENESS_DECAY_SECS)
        .max(0.0);

    let specialization =
        (SPECIALIZATION_STEP * inputs.num_specializations as f64).min(SPECIALIZATION_CAP);

    TrustBreakdown {
        credentials,
        experience,
        performance,
        responsiveness,
        specialization,
    }
}

/// Computes a trust score in `[0.1, 1.0]`.
#[inline]
pub fn trust_score(inputs: &TrustInputs<'_>) -> f64 {
    trust_breakdown(inputs).score()
}

#[inline]
fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
