use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RaterId, Verdict};
use crate::trust::{TrustInputs, trust_score};

/// A domain expert who rates AI answers.
///
/// `trust_score` is derived: it is recomputed from the other attributes every time
/// the counters change. `version` is the optimistic-concurrency token bumped by the
/// store on every successful update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaterProfile {
    pub id: RaterId,
    pub display_name: String,
    /// Credential tags, most senior first.
    pub credentials: Vec<String>,
    pub years_experience: f64,
    pub specializations: Vec<String>,
    pub feedback_count: u64,
    /// Share of consensus outcomes in which this rater sided with the majority.
    pub accuracy_rate: f64,
    pub avg_response_seconds: f64,
    /// Number of consensus outcomes that contributed to `accuracy_rate`.
    pub validated_count: u64,
    pub trust_score: f64,
    pub active: bool,
    pub verified: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl RaterProfile {
    /// Onboards a rater with the given attributes and a freshly computed trust score.
    ///
    /// New raters start active but unverified.
    pub fn onboard(
        display_name: impl Into<String>,
        credentials: Vec<String>,
        years_experience: f64,
        specializations: Vec<String>,
        accuracy_rate: f64,
        avg_response_seconds: f64,
    ) -> Self {
        let mut profile = Self {
            id: RaterId::new(),
            display_name: display_name.into(),
            credentials,
            years_experience,
            specializations,
            feedback_count: 0,
            accuracy_rate: accuracy_rate.clamp(0.0, 1.0),
            avg_response_seconds,
            validated_count: 0,
            trust_score: 0.0,
            active: true,
            verified: false,
            version: 0,
            created_at: Utc::now(),
        };
        profile.recompute_trust();
        profile
    }

    /// Marks the rater as verified.
    pub fn verify(mut self) -> Self {
        self.verified = true;
        self
    }

    /// Deactivates the rater. Profiles are never deleted.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Inputs for the trust scorer.
    pub fn trust_inputs(&self) -> TrustInputs<'_> {
        TrustInputs {
            credentials: &self.credentials,
            years_experience: self.years_experience,
            accuracy_rate: self.accuracy_rate,
            avg_response_seconds: self.avg_response_seconds,
            num_specializations: self.specializations.len(),
        }
    }

    /// Recomputes `trust_score` from the current attributes and returns it.
    pub fn recompute_trust(&mut self) -> f64 {
        self.trust_score = trust_score(&self.trust_inputs());
        self.trust_score
    }

    /// Folds one accepted feedback event into the running counters.
    ///
    /// The onboarding response time counts as one prior observation. A "correct"
    /// verdict slower than the running mean leaves the mean where it is, so an
    /// endorsement never costs trust.
    pub fn record_feedback(&mut self, verdict: Verdict, time_spent_seconds: f64) {
        let observed = match verdict {
            Verdict::Correct => time_spent_seconds.min(self.avg_response_seconds),
            _ => time_spent_seconds,
        };
        let n = self.feedback_count as f64 + 1.0;
        self.avg_response_seconds = (self.avg_response_seconds * n + observed) / (n + 1.0);
        self.feedback_count += 1;
        self.recompute_trust();
    }

    /// Folds one consensus outcome into `accuracy_rate`.
    ///
    /// The onboarding accuracy counts as one prior observation.
    pub fn record_validation(&mut self, agreed: bool) {
        let observation = if agreed { 1.0 } else { 0.0 };
        let n = self.validated_count as f64 + 1.0;
        self.accuracy_rate = ((self.accuracy_rate * n + observation) / (n + 1.0)).clamp(0.0, 1.0);
        self.validated_count += 1;
        self.recompute_trust();
    }
}
