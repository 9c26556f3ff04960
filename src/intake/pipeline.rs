use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::config::IntakeConfig;
use super::error::{IntakeError, IntakeResult, RaterNotQualifiedError, ValidationError};
use super::submission::{FeedbackReceipt, FeedbackSubmission, ValidatedFeedback};
use crate::consensus::{ConsensusTracker, RaterAnswer};
use crate::golden::{GoldenCache, PopulateRequest};
use crate::model::{ActionTaken, FeedbackEvent, FeedbackId, QueryRecord, RaterProfile, Verdict};
use crate::stats::{Counter, Stats};
use crate::store::{FeedbackStore, update_rater_with};

/// Accepts rater feedback: validate, gate on trust, persist, update the rater, then
/// hand off to the golden set and the consensus tracker.
pub struct FeedbackIntake<S: FeedbackStore> {
    config: IntakeConfig,
    store: Arc<S>,
    golden: Arc<GoldenCache<S>>,
    tracker: Arc<ConsensusTracker<S>>,
    stats: Arc<Stats>,
}

impl<S: FeedbackStore> std::fmt::Debug for FeedbackIntake<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackIntake")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: FeedbackStore> FeedbackIntake<S> {
    pub fn new(
        config: IntakeConfig,
        store: Arc<S>,
        golden: Arc<GoldenCache<S>>,
        tracker: Arc<ConsensusTracker<S>>,
        stats: Arc<Stats>,
    ) -> IntakeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            golden,
            tracker,
            stats,
        })
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Processes one feedback submission.
    ///
    /// Golden-set writes and consensus completion are spawned and never delay the
    /// receipt. Exceeding the soft
    /// budget is logged, not failed.
    #[instrument(skip(self, submission))]
    pub async fn submit(&self, submission: FeedbackSubmission) -> IntakeResult<FeedbackReceipt> {
        let started = Instant::now();
        let result = self.process(submission).await;

        match &result {
            Ok(receipt) => {
                self.stats.incr(Counter::FeedbackAccepted);
                info!(
                    feedback_id = %receipt.feedback_id,
                    action = %receipt.action_taken,
                    trust = receipt.rater_trust_score,
                    "Feedback accepted"
                );
            }
            Err(IntakeError::Validation(e)) => {
                self.stats.incr(Counter::FeedbackRejectedValidation);
                debug!(field = e.field(), error = %e, "Feedback failed validation");
            }
            Err(IntakeError::NotQualified(e)) => {
                self.stats.incr(Counter::FeedbackRejectedQualification);
                info!(error = %e, "Feedback refused by trust gate");
            }
            Err(e) => {
                self.stats.incr(Counter::FeedbackDependencyFailure);
                warn!(error = %e, "Feedback intake failed");
            }
        }

        let elapsed = started.elapsed();
        if elapsed > self.config.soft_budget {
            self.stats.incr(Counter::FeedbackOverBudget);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.config.soft_budget.as_millis() as u64,
                "Feedback intake exceeded its soft time budget"
            );
        }

        result.map(|mut receipt| {
            receipt.processing_time_ms = elapsed.as_millis() as u64;
            receipt
        })
    }

    async fn process(&self, submission: FeedbackSubmission) -> IntakeResult<FeedbackReceipt> {
        let feedback = submission.validate(self.config.max_correction_chars)?;

        let rater = self.store.get_rater(feedback.rater_id).await?;
        self.qualify(&feedback, rater.as_ref())?;

        let query = self
            .store
            .get_query(feedback.query_id)
            .await?
            .ok_or_else(|| ValidationError::InvalidField {
                field: "query_id",
                reason: format!("unknown query {}", feedback.query_id),
            })?;

        let event = FeedbackEvent {
            id: FeedbackId::new(),
            query_id: feedback.query_id,
            rater_id: feedback.rater_id,
            verdict: feedback.verdict,
            category: feedback.category,
            correction: feedback.correction.clone(),
            confidence: feedback.confidence,
            time_spent_seconds: feedback.time_spent_seconds,
            created_at: Utc::now(),
            action_taken: None,
        };
        let feedback_id = event.id;
        self.store.create_feedback(event).await?;

        let (verdict, time_spent) = (feedback.verdict, feedback.time_spent_seconds);
        let profile = update_rater_with(self.store.as_ref(), feedback.rater_id, |p| {
            p.record_feedback(verdict, time_spent)
        })
        .await?;

        let action = ActionTaken::for_verdict(feedback.verdict, feedback.correction.is_some());
        self.store.set_feedback_action(feedback_id, action).await?;
        self.stats.record_verdict(feedback.verdict);

        self.dispatch_golden(&feedback, feedback_id, &query, &profile);
        self.record_validation(&feedback, &query, &profile);

        Ok(FeedbackReceipt {
            feedback_id,
            action_taken: action,
            rater_trust_score: profile.trust_score,
            processing_time_ms: 0,
        })
    }

    fn qualify(
        &self,
        feedback: &ValidatedFeedback,
        rater: Option<&RaterProfile>,
    ) -> Result<(), RaterNotQualifiedError> {
        let rater_id = feedback.rater_id;
        let rater = rater.ok_or(RaterNotQualifiedError::UnknownRater { rater_id })?;
        if !rater.active {
            return Err(RaterNotQualifiedError::Inactive { rater_id });
        }
        if !rater.verified {
            return Err(RaterNotQualifiedError::Unverified { rater_id });
        }
        if rater.trust_score < self.config.min_trust_score {
            return Err(RaterNotQualifiedError::TrustBelowMinimum {
                rater_id,
                score: rater.trust_score,
                minimum: self.config.min_trust_score,
            });
        }
        Ok(())
    }

    /// Spawns golden-set population or invalidation for the verdict.
    fn dispatch_golden(
        &self,
        feedback: &ValidatedFeedback,
        feedback_id: FeedbackId,
        query: &QueryRecord,
        profile: &RaterProfile,
    ) {
        match feedback.verdict {
            Verdict::Correct => {
                self.golden.spawn_populate(PopulateRequest {
                    question: query.question.clone(),
                    answer: query.answer.clone(),
                    source_feedback: feedback_id,
                    rater_id: profile.id,
                    rater_trust: profile.trust_score,
                });
            }
            Verdict::Incorrect
                if profile.trust_score >= self.golden.config().invalidation_trust =>
            {
                self.golden
                    .spawn_invalidate(query.question.clone(), profile.trust_score);
            }
            _ => {}
        }
    }

    /// Hands the rater's answer to the consensus tracker in the background.
    fn record_validation(
        &self,
        feedback: &ValidatedFeedback,
        query: &QueryRecord,
        profile: &RaterProfile,
    ) {
        let answer = RaterAnswer {
            rater_id: profile.id,
            trust_score: profile.trust_score,
            confidence: feedback.confidence,
            verdict: feedback.verdict,
            answer: feedback
                .correction
                .clone()
                .unwrap_or_else(|| query.answer.clone()),
            corrected: feedback.correction.is_some(),
            submitted_at: Utc::now(),
        };
        self.tracker.spawn_record(query.id, answer);
    }
}
