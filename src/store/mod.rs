//! Durable store collaborator.
//!
//! Records live in per-kind arenas keyed by id and reference each other by id.
//! [`InMemoryStore`] is the bundled implementation; a database-backed store only has
//! to implement [`FeedbackStore`].

mod error;
mod memory;


pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::constants::MAX_CAS_ATTEMPTS;
use crate::model::{
    ActionTaken, ConsensusResult, FailureCategory, FailurePattern, FeedbackEvent, FeedbackId,
    GoldenEntry, QueryId, QueryRecord, RaterId, RaterProfile,
};

/// Create/read/update access to every record kind.
pub trait FeedbackStore: Send + Sync + 'static {
    /// Fetches a rater profile.
    fn get_rater(
        &self,
        id: RaterId,
    ) -> impl Future<Output = StoreResult<Option<RaterProfile>>> + Send;

    /// Stores a new rater profile.
    fn create_rater(&self, profile: RaterProfile) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replaces a rater profile iff the stored version equals `expected_version`.
    ///
    /// On success the stored copy carries `expected_version + 1` and is returned.
    fn update_rater(
        &self,
        profile: RaterProfile,
        expected_version: u64,
    ) -> impl Future<Output = StoreResult<RaterProfile>> + Send;

    /// Lists every rater, active or not.
    fn list_raters(&self) -> impl Future<Output = StoreResult<Vec<RaterProfile>>> + Send;

    /// Stores or replaces a query record.
    fn put_query(&self, query: QueryRecord) -> impl Future<Output = StoreResult<()>> + Send;

    fn get_query(
        &self,
        id: QueryId,
    ) -> impl Future<Output = StoreResult<Option<QueryRecord>>> + Send;

    /// Stores a new feedback event.
    fn create_feedback(&self, event: FeedbackEvent)
    -> impl Future<Output = StoreResult<()>> + Send;

    fn get_feedback(
        &self,
        id: FeedbackId,
    ) -> impl Future<Output = StoreResult<Option<FeedbackEvent>>> + Send;

    /// Sets the denormalized downstream action of a feedback event.
    fn set_feedback_action(
        &self,
        id: FeedbackId,
        action: ActionTaken,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Events authored by `rater`, oldest first.
    fn feedback_by_rater(
        &self,
        rater: RaterId,
    ) -> impl Future<Output = StoreResult<Vec<FeedbackEvent>>> + Send;

    /// Events created in `[from, to)`, oldest first.
    fn feedback_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Vec<FeedbackEvent>>> + Send;

    /// Events tagged with `category`, oldest first.
    fn feedback_by_category(
        &self,
        category: FailureCategory,
    ) -> impl Future<Output = StoreResult<Vec<FeedbackEvent>>> + Send;

    /// Non-"correct" events created at or after `since`, oldest first.
    fn negative_feedback_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Vec<FeedbackEvent>>> + Send;

    fn list_patterns(&self) -> impl Future<Output = StoreResult<Vec<FailurePattern>>> + Send;

    /// Inserts or replaces a pattern by id.
    fn upsert_pattern(
        &self,
        pattern: FailurePattern,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn get_golden(
        &self,
        signature: [u8; 32],
    ) -> impl Future<Output = StoreResult<Option<GoldenEntry>>> + Send;

    /// Stores a new golden entry; fails if the signature is taken.
    fn create_golden(&self, entry: GoldenEntry) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replaces a golden entry iff the stored revision equals `expected_revision`.
    ///
    /// On success the stored copy carries `expected_revision + 1` and is returned.
    fn update_golden(
        &self,
        entry: GoldenEntry,
        expected_revision: u64,
    ) -> impl Future<Output = StoreResult<GoldenEntry>> + Send;

    fn list_approved_golden(&self) -> impl Future<Output = StoreResult<Vec<GoldenEntry>>> + Send;

    fn create_consensus(
        &self,
        result: ConsensusResult,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Consensus results recorded for `query`, oldest first.
    fn consensus_for_query(
        &self,
        query: QueryId,
    ) -> impl Future<Output = StoreResult<Vec<ConsensusResult>>> + Send;

    /// Consensus results created at or after `since`, oldest first.
    fn consensus_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Vec<ConsensusResult>>> + Send;
}

/// Read-modify-writes a rater with optimistic retries.
///
/// `mutate` is re-applied to a fresh copy on every attempt. Gives up with the last
/// [`StoreError::VersionConflict`] after [`MAX_CAS_ATTEMPTS`] lost races.
pub async fn update_rater_with<S, F>(
    store: &S,
    id: RaterId,
    mut mutate: F,
) -> StoreResult<RaterProfile>
where
    S: FeedbackStore,
    F: FnMut(&mut RaterProfile) + Send,
{
    let mut last_conflict = None;
    for _ in 0..MAX_CAS_ATTEMPTS {
        let mut profile = store.get_rater(id).await?.ok_or_else(|| StoreError::NotFound {
            kind: "rater",
            id: id.to_string(),
        })?;
        let expected = profile.version;
        mutate(&mut profile);
        match store.update_rater(profile, expected).await {
            Ok(stored) => return Ok(stored),
            Err(e) if e.is_conflict() => {
                last_conflict = Some(e);
                tokio::task::yield_now().await;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_conflict.unwrap_or(StoreError::Unavailable {
        reason: "rater update retries exhausted".to_string(),
    }))
}
