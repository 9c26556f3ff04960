//! Validation sessions: collect answers per query until enough arrive or time runs out.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::engine::{ConsensusEngine, RaterAnswer, Reconciliation};
use super::error::ConsensusError;
use crate::golden::{GoldenCache, GoldenError};
use crate::hashing::question_signature;
use crate::model::{ConsensusResult, ConsensusStatus, QueryId, Verdict};
use crate::stats::{Counter, Stats};
use crate::store::{FeedbackStore, update_rater_with};

#[derive(Debug)]
struct Session {
    opened_at: DateTime<Utc>,
    answers: Vec<RaterAnswer>,
}

/// Open validation sessions keyed by query.
///
/// A session resolves as soon as `required_validations` distinct raters have
/// answered. Sessions past the deadline are closed as expired by
/// [`ConsensusTracker::sweep_expired`] or when the next answer for the query arrives.
pub struct ConsensusTracker<S: FeedbackStore> {
    engine: ConsensusEngine,
    store: Arc<S>,
    golden: Option<Arc<GoldenCache<S>>>,
    stats: Arc<Stats>,
    sessions: Mutex<HashMap<QueryId, Session>>,
}

impl<S: FeedbackStore> std::fmt::Debug for ConsensusTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusTracker")
            .field("engine", &self.engine)
            .field("open_sessions", &self.open_sessions())
            .finish()
    }
}

impl<S: FeedbackStore> ConsensusTracker<S> {
    pub fn new(engine: ConsensusEngine, store: Arc<S>, stats: Arc<Stats>) -> Self {
        Self {
            engine,
            store,
            golden: None,
            stats,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Lets consensus outcomes approve or reject golden entries.
    pub fn with_golden(mut self, golden: Arc<GoldenCache<S>>) -> Self {
        self.golden = Some(golden);
        self
    }

    pub fn engine(&self) -> &ConsensusEngine {
        &self.engine
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Answers collected so far for `query`.
    pub fn pending_answers(&self, query: QueryId) -> usize {
        self.sessions
            .lock()
            .get(&query)
            .map_or(0, |s| s.answers.len())
    }

    /// Adds an answer to the query's session.
    ///
    /// A rater answering again replaces its earlier answer. Returns the completed
    /// result when this answer resolves the session.
    #[instrument(skip(self, answer), fields(query = %query_id, rater = %answer.rater_id))]
    pub async fn record(
        &self,
        query_id: QueryId,
        answer: RaterAnswer,
    ) -> Result<Option<ConsensusResult>, ConsensusError> {
        let now = answer.submitted_at;
        let required = self.engine.config().required_validations;
        let deadline = self.engine.config().validation_deadline;

        let (expired, resolved) = {
            let mut sessions = self.sessions.lock();

            let stale = sessions
                .get(&query_id)
                .is_some_and(|s| is_past(s.opened_at, now, deadline));
            let expired = if stale {
                sessions.remove(&query_id)
            } else {
                None
            };

            let session = sessions.entry(query_id).or_insert_with(|| Session {
                opened_at: now,
                answers: Vec::new(),
            });
            match session
                .answers
                .iter_mut()
                .find(|a| a.rater_id == answer.rater_id)
            {
                Some(previous) => *previous = answer,
                None => session.answers.push(answer),
            }

            let resolved = if session.answers.len() >= required {
                sessions.remove(&query_id).map(|s| s.answers)
            } else {
                None
            };
            (expired, resolved)
        };

        if let Some(session) = expired {
            self.expire(query_id, session.answers).await?;
        }

        match resolved {
            Some(answers) => Ok(Some(self.complete(query_id, answers).await?)),
            None => Ok(None),
        }
    }

    /// Runs [`ConsensusTracker::record`] in the background.
    ///
    /// Completing a session reconciles, updates every rater and touches the golden
    /// set, none of which the submitter waits for.
    pub fn spawn_record(
        self: &Arc<Self>,
        query_id: QueryId,
        answer: RaterAnswer,
    ) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            match tracker.record(query_id, answer).await {
                Ok(Some(result)) => {
                    debug!(query = %query_id, reached = result.consensus_reached, "Session resolved");
                }
                Ok(None) => {}
                Err(e) => {
                    error!(
                        query = %query_id,
                        error = %e,
                        "Failed to record validation answer"
                    );
                }
            }
        })
    }

    /// Closes every session opened more than the deadline before `now`.
    pub async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ConsensusResult>, ConsensusError> {
        let deadline = self.engine.config().validation_deadline;
        let expired: Vec<(QueryId, Session)> = {
            let mut sessions = self.sessions.lock();
            let ids: Vec<QueryId> = sessions
                .iter()
                .filter(|(_, s)| is_past(s.opened_at, now, deadline))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
                .collect()
        };

        // A session that fails to close goes back for the next sweep.
        let mut results = Vec::with_capacity(expired.len());
        let mut last_error = None;
        for (query_id, session) in expired {
            match self.expire(query_id, session.answers.clone()).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(query = %query_id, error = %e, "Failed to close expired session");
                    self.sessions.lock().entry(query_id).or_insert(session);
                    last_error = Some(e);
                }
            }
        }
        if !results.is_empty() {
            info!(expired = results.len(), "Validation sessions expired");
        }
        match last_error {
            Some(e) if results.is_empty() => Err(e),
            _ => Ok(results),
        }
    }

    async fn expire(
        &self,
        query_id: QueryId,
        answers: Vec<RaterAnswer>,
    ) -> Result<ConsensusResult, ConsensusError> {
        let Reconciliation { mut result, .. } = self.engine.reconcile(query_id, &answers).await;
        result.status = ConsensusStatus::Expired;
        result.consensus_reached = false;
        result.final_answer = None;

        self.store.create_consensus(result.clone()).await?;
        self.stats.incr(Counter::ConsensusExpired);
        debug!(query = %query_id, answers = answers.len(), "Validation session expired");
        Ok(result)
    }

    async fn complete(
        &self,
        query_id: QueryId,
        answers: Vec<RaterAnswer>,
    ) -> Result<ConsensusResult, ConsensusError> {
        let reconciliation = self.engine.reconcile(query_id, &answers).await;
        let result = reconciliation.result.clone();

        self.store.create_consensus(result.clone()).await?;
        self.stats.incr(Counter::ConsensusCompleted);

        if result.consensus_reached {
            self.stats.incr(Counter::ConsensusReached);
            self.apply_outcome(query_id, &answers, &reconciliation).await;
        }

        info!(
            query = %query_id,
            reached = result.consensus_reached,
            strength = result.consensus_strength,
            "Validation session completed"
        );
        Ok(result)
    }

    /// Feeds a reached consensus back into rater accuracy and the golden set.
    /// Failures are logged; the consensus result itself is already stored.
    async fn apply_outcome(
        &self,
        query_id: QueryId,
        answers: &[RaterAnswer],
        reconciliation: &Reconciliation,
    ) {
        for answer in answers {
            let agreed = reconciliation.in_dominant_group(answer.rater_id);
            if let Err(e) =
                update_rater_with(self.store.as_ref(), answer.rater_id, |p| {
                    p.record_validation(agreed)
                })
                .await
            {
                warn!(rater = %answer.rater_id, error = %e, "Failed to record validation outcome");
            }
        }

        let Some(golden) = &self.golden else {
            return;
        };

        let dominant: Vec<&RaterAnswer> = answers
            .iter()
            .filter(|a| reconciliation.in_dominant_group(a.rater_id))
            .collect();
        let all = |verdict: Verdict| dominant.iter().all(|a| a.verdict == verdict);

        let query = match self.store.get_query(query_id).await {
            Ok(Some(query)) => query,
            Ok(None) => {
                debug!(query = %query_id, "Query record not found; golden set untouched");
                return;
            }
            Err(e) => {
                warn!(query = %query_id, error = %e, "Failed to load query for golden update");
                return;
            }
        };
        let signature = question_signature(&query.question);

        let outcome = if all(Verdict::Correct) {
            let Some(&approver) = reconciliation.dominant.first() else {
                return;
            };
            golden.approve(signature, approver).await.map(|_| ())
        } else if all(Verdict::Incorrect) {
            golden.reject(signature).await.map(|_| ())
        } else {
            return;
        };

        match outcome {
            Ok(()) => debug!(query = %query_id, "Golden entry updated from consensus"),
            Err(GoldenError::NotFound { .. }) => {
                debug!(query = %query_id, "No golden entry for consensus outcome")
            }
            Err(GoldenError::InvalidTransition { .. }) => {
                debug!(query = %query_id, "Golden entry already rejected; consensus ignored")
            }
            Err(e) => {
                warn!(query = %query_id, error = %e, "Failed to apply consensus to golden set");
            }
        }
    }
}

fn is_past(opened_at: DateTime<Utc>, now: DateTime<Utc>, deadline: std::time::Duration) -> bool {
    now.signed_duration_since(opened_at)
        .to_std()
        .is_ok_and(|age| age >= deadline)
}
