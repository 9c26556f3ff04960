use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{FeedbackStore, StoreError, StoreResult};
use crate::hashing::signature_hex;
use crate::model::{
    ActionTaken, ConsensusResult, FailureCategory, FailurePattern, FeedbackEvent, FeedbackId,
    GoldenEntry, PatternId, QueryId, QueryRecord, RaterId, RaterProfile,
};

/// Arena-backed store held entirely in memory.
#[derive(Default)]
pub struct InMemoryStore {
    raters: RwLock<HashMap<RaterId, RaterProfile>>,
    queries: RwLock<HashMap<QueryId, QueryRecord>>,
    feedback: RwLock<HashMap<FeedbackId, FeedbackEvent>>,
    patterns: RwLock<HashMap<PatternId, FailurePattern>>,
    golden: RwLock<HashMap<[u8; 32], GoldenEntry>>,
    consensus: RwLock<Vec<ConsensusResult>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: every call fails with [`StoreError::Unavailable`].
    #[cfg(any(test, feature = "mock"))]
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of stored feedback events.
    pub fn feedback_count(&self) -> usize {
        self.feedback.read().len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "in-memory store switched off".to_string(),
            });
        }
        Ok(())
    }

    fn select_feedback(&self, pred: impl Fn(&FeedbackEvent) -> bool) -> Vec<FeedbackEvent> {
        let mut out: Vec<FeedbackEvent> = self
            .feedback
            .read()
            .values()
            .filter(|e| pred(e))
            .cloned()
            .collect();
        out.sort_by_key(|e| e.created_at);
        out
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("raters", &self.raters.read().len())
            .field("feedback", &self.feedback.read().len())
            .field("patterns", &self.patterns.read().len())
            .field("golden", &self.golden.read().len())
            .finish()
    }
}

impl FeedbackStore for InMemoryStore {
    async fn get_rater(&self, id: RaterId) -> StoreResult<Option<RaterProfile>> {
        self.check()?;
        Ok(self.raters.read().get(&id).cloned())
    }

    async fn create_rater(&self, profile: RaterProfile) -> StoreResult<()> {
        self.check()?;
        let mut raters = self.raters.write();
        if raters.contains_key(&profile.id) {
            return Err(StoreError::AlreadyExists {
                kind: "rater",
                id: profile.id.to_string(),
            });
        }
        raters.insert(profile.id, profile);
        Ok(())
    }

    async fn update_rater(
        &self,
        mut profile: RaterProfile,
        expected_version: u64,
    ) -> StoreResult<RaterProfile> {
        self.check()?;
        let mut raters = self.raters.write();
        let current = raters.get(&profile.id).ok_or_else(|| StoreError::NotFound {
            kind: "rater",
            id: profile.id.to_string(),
        })?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                kind: "rater",
                id: profile.id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }

        profile.version = expected_version + 1;
        raters.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn list_raters(&self) -> StoreResult<Vec<RaterProfile>> {
        self.check()?;
        let mut out: Vec<RaterProfile> = self.raters.read().values().cloned().collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }

    async fn put_query(&self, query: QueryRecord) -> StoreResult<()> {
        self.check()?;
        self.queries.write().insert(query.id, query);
        Ok(())
    }

    async fn get_query(&self, id: QueryId) -> StoreResult<Option<QueryRecord>> {
        self.check()?;
        Ok(self.queries.read().get(&id).cloned())
    }

    async fn create_feedback(&self, event: FeedbackEvent) -> StoreResult<()> {
        self.check()?;
        let mut feedback = self.feedback.write();
        if feedback.contains_key(&event.id) {
            return Err(StoreError::AlreadyExists {
                kind: "feedback",
                id: event.id.to_string(),
            });
        }
        feedback.insert(event.id, event);
        Ok(())
    }

    async fn get_feedback(&self, id: FeedbackId) -> StoreResult<Option<FeedbackEvent>> {
        self.check()?;
        Ok(self.feedback.read().get(&id).cloned())
    }

    async fn set_feedback_action(&self, id: FeedbackId, action: ActionTaken) -> StoreResult<()> {
        self.check()?;
        let mut feedback = self.feedback.write();
        let event = feedback.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            kind: "feedback",
            id: id.to_string(),
        })?;
        event.action_taken = Some(action);
        Ok(())
    }

    async fn feedback_by_rater(&self, rater: RaterId) -> StoreResult<Vec<FeedbackEvent>> {
        self.check()?;
        Ok(self.select_feedback(|e| e.rater_id == rater))
    }

    async fn feedback_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<FeedbackEvent>> {
        self.check()?;
        Ok(self.select_feedback(|e| e.created_at >= from && e.created_at < to))
    }

    async fn feedback_by_category(
        &self,
        category: FailureCategory,
    ) -> StoreResult<Vec<FeedbackEvent>> {
        self.check()?;
        Ok(self.select_feedback(|e| e.category == Some(category)))
    }

    async fn negative_feedback_since(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<FeedbackEvent>> {
        self.check()?;
        Ok(self.select_feedback(|e| e.verdict.is_negative() && e.created_at >= since))
    }

    async fn list_patterns(&self) -> StoreResult<Vec<FailurePattern>> {
        self.check()?;
        let mut out: Vec<FailurePattern> = self.patterns.read().values().cloned().collect();
        out.sort_by_key(|p| p.first_seen);
        Ok(out)
    }

    async fn upsert_pattern(&self, pattern: FailurePattern) -> StoreResult<()> {
        self.check()?;
        self.patterns.write().insert(pattern.id, pattern);
        Ok(())
    }

    async fn get_golden(&self, signature: [u8; 32]) -> StoreResult<Option<GoldenEntry>> {
        self.check()?;
        Ok(self.golden.read().get(&signature).cloned())
    }

    async fn create_golden(&self, entry: GoldenEntry) -> StoreResult<()> {
        self.check()?;
        let mut golden = self.golden.write();
        if golden.contains_key(&entry.signature) {
            return Err(StoreError::AlreadyExists {
                kind: "golden entry",
                id: signature_hex(&entry.signature),
            });
        }
        golden.insert(entry.signature, entry);
        Ok(())
    }

    async fn update_golden(
        &self,
        mut entry: GoldenEntry,
        expected_revision: u64,
    ) -> StoreResult<GoldenEntry> {
        self.check()?;
        let mut golden = self.golden.write();
        let current = golden
            .get(&entry.signature)
            .ok_or_else(|| StoreError::NotFound {
                kind: "golden entry",
                id: signature_hex(&entry.signature),
            })?;

        if current.revision != expected_revision {
            return Err(StoreError::VersionConflict {
                kind: "golden entry",
                id: signature_hex(&entry.signature),
                expected: expected_revision,
                actual: current.revision,
            });
        }

        entry.revision = expected_revision + 1;
        golden.insert(entry.signature, entry.clone());
        Ok(entry)
    }

    async fn list_approved_golden(&self) -> StoreResult<Vec<GoldenEntry>> {
        self.check()?;
        let mut out: Vec<GoldenEntry> = self
            .golden
            .read()
            .values()
            .filter(|e| e.is_servable())
            .cloned()
            .collect();
        out.sort_by_key(|e| e.created_at);
        Ok(out)
    }

    async fn create_consensus(&self, result: ConsensusResult) -> StoreResult<()> {
        self.check()?;
        self.consensus.write().push(result);
        Ok(())
    }

    async fn consensus_for_query(&self, query: QueryId) -> StoreResult<Vec<ConsensusResult>> {
        self.check()?;
        Ok(self
            .consensus
            .read()
            .iter()
            .filter(|r| r.query_id == query)
            .cloned()
            .collect())
    }

    async fn consensus_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<ConsensusResult>> {
        self.check()?;
        let mut out: Vec<ConsensusResult> = self
            .consensus
            .read()
            .iter()
            .filter(|r| r.created_at >= since)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }
}
