use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::config::GoldenConfig;
use super::error::{GoldenError, GoldenResult};
use super::semantic::SemanticIndex;
use super::signature::SignatureIndex;
use super::types::{GoldenLookup, MatchType, PopulateOutcome};
use crate::constants::MAX_CAS_ATTEMPTS;
use crate::embedding::{Embedder, to_f16};
use crate::hashing::{normalize_question, question_signature, signature_hex};
use crate::model::{ApprovalStatus, FeedbackId, GoldenEntry, RaterId};
use crate::stats::{Counter, Stats};
use crate::store::{FeedbackStore, StoreError};

/// A "correct" verdict offered to the golden set.
#[derive(Debug, Clone)]
pub struct PopulateRequest {
    pub question: String,
    pub answer: String,
    pub source_feedback: FeedbackId,
    pub rater_id: RaterId,
    pub rater_trust: f64,
}

/// Golden-set cache: signature index in front of a semantic index, both holding
/// approved entries only, backed by the durable store.
///
/// Every status change is a compare-and-swap on the entry's revision in the store;
/// the indices apply a change only if its revision is at least the newest they
/// have seen for that signature, so they converge on the store's state regardless
/// of the order concurrent writers finish in. No lock is held across an await.
pub struct GoldenCache<S: FeedbackStore> {
    config: GoldenConfig,
    store: Arc<S>,
    embedder: Arc<dyn Embedder>,
    stats: Arc<Stats>,
    signatures: SignatureIndex,
    semantic: SemanticIndex,
    revisions: Mutex<HashMap<[u8; 32], u64>>,
}

impl<S: FeedbackStore> std::fmt::Debug for GoldenCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoldenCache")
            .field("config", &self.config)
            .field("embedder", &self.embedder.name())
            .field("signatures", &self.signatures)
            .field("semantic", &self.semantic)
            .finish()
    }
}

impl<S: FeedbackStore> GoldenCache<S> {
    pub fn new(
        config: GoldenConfig,
        store: Arc<S>,
        embedder: Arc<dyn Embedder>,
        stats: Arc<Stats>,
    ) -> GoldenResult<Self> {
        config.validate()?;
        Ok(Self {
            signatures: SignatureIndex::with_capacity(config.signature_capacity),
            semantic: SemanticIndex::new(),
            revisions: Mutex::new(HashMap::new()),
            config,
            store,
            embedder,
            stats,
        })
    }

    pub fn config(&self) -> &GoldenConfig {
        &self.config
    }

    /// Number of servable entries.
    pub fn len(&self) -> usize {
        self.semantic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty()
    }

    /// Servable entry for `question`, if any, without touching stats.
    pub fn get(&self, question: &str) -> Option<Arc<GoldenEntry>> {
        let signature = question_signature(question);
        self.signatures
            .lookup_by_signature(&signature)
            .or_else(|| self.semantic.get(&signature))
            .filter(|e| e.is_servable())
    }

    /// Looks up a vetted answer for `question`.
    ///
    /// Tries the signature index first, then the semantic index. Pending and
    /// rejected entries are never returned. Embedding failures degrade to a miss.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn lookup(&self, question: &str) -> GoldenLookup {
        self.stats.incr(Counter::GoldenLookup);

        let signature = question_signature(question);
        if let Some(entry) = self
            .signatures
            .lookup_by_signature(&signature)
            .or_else(|| self.semantic.get(&signature))
            .filter(|e| e.is_servable())
        {
            debug!(signature = %signature_hex(&signature), "Golden signature hit");
            self.stats.incr(Counter::GoldenSignatureHit);
            return GoldenLookup::hit(MatchType::Signature, entry.answer.clone(), 1.0);
        }

        if self.semantic.is_empty() || normalize_question(question).is_empty() {
            return GoldenLookup::miss();
        }

        let query = match self.embedder.embed(question).await {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "Embedding unavailable; semantic stage skipped");
                return GoldenLookup::miss();
            }
        };

        match self
            .semantic
            .best_match(&query, self.config.semantic_threshold)
        {
            Some(m) if m.entry.is_servable() => {
                debug!(score = m.score, "Golden semantic hit");
                self.stats.incr(Counter::GoldenSemanticHit);
                GoldenLookup::hit(MatchType::Semantic, m.entry.answer.clone(), m.score)
            }
            _ => GoldenLookup::miss(),
        }
    }

    /// Offers a "correct" verdict to the golden set.
    ///
    /// A rater with trust at or above `auto_approve_trust` approves immediately;
    /// anyone else creates (or leaves) a pending entry. An approved entry is never
    /// replaced; a rejected one re-enters the gate with the new answer, and the
    /// rejected answer is kept in the entry's `rejected_history`.
    #[instrument(
        skip(self, request),
        fields(rater = %request.rater_id, trust = request.rater_trust)
    )]
    pub async fn populate(&self, request: PopulateRequest) -> GoldenResult<PopulateOutcome> {
        if normalize_question(&request.question).is_empty() {
            return Err(GoldenError::EmptyQuestion);
        }

        let signature = question_signature(&request.question);
        let auto_approve = request.rater_trust >= self.config.auto_approve_trust;

        let embedding = match self.embedder.embed(&request.question).await {
            Ok(v) => to_f16(&v),
            Err(e) => {
                warn!(error = %e, "Embedding unavailable; entry will only match by signature");
                Vec::new()
            }
        };

        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.store.get_golden(signature).await?;

            let (candidate, expected, outcome) = match current {
                None => {
                    let mut entry = GoldenEntry::pending(
                        request.question.clone(),
                        request.answer.clone(),
                        embedding.clone(),
                        request.source_feedback,
                    );
                    if auto_approve {
                        entry.approve(request.rater_id);
                    }
                    match self.store.create_golden(entry.clone()).await {
                        Ok(()) => {
                            return Ok(self.finish_populate(&entry, auto_approve));
                        }
                        Err(StoreError::AlreadyExists { .. }) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
                Some(existing) if existing.status == ApprovalStatus::Approved => {
                    debug!(signature = %signature_hex(&signature), "Golden entry already approved");
                    self.apply(&existing);
                    return Ok(PopulateOutcome::AlreadyApproved);
                }
                Some(existing) if existing.status == ApprovalStatus::Pending && !auto_approve => {
                    return Ok(PopulateOutcome::Pending);
                }
                Some(existing) => {
                    let expected = existing.revision;
                    let fresh = GoldenEntry::pending(
                        request.question.clone(),
                        request.answer.clone(),
                        embedding.clone(),
                        request.source_feedback,
                    );
                    // A rejected answer moves into the history; a pending one is replaced.
                    let mut entry = match existing.supersede_rejected(fresh.clone()) {
                        Some(entry) => entry,
                        None => GoldenEntry {
                            created_at: existing.created_at,
                            rejected_history: existing.rejected_history.clone(),
                            ..fresh
                        },
                    };
                    let outcome = if auto_approve {
                        entry.approve(request.rater_id);
                        PopulateOutcome::AutoApproved
                    } else {
                        PopulateOutcome::Pending
                    };
                    (entry, expected, outcome)
                }
            };

            match self.store.update_golden(candidate, expected).await {
                Ok(stored) => {
                    self.finish_populate(&stored, auto_approve);
                    return Ok(outcome);
                }
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(GoldenError::Contended {
            signature: signature_hex(&signature),
            attempts: MAX_CAS_ATTEMPTS,
        })
    }

    fn finish_populate(&self, stored: &GoldenEntry, auto_approve: bool) -> PopulateOutcome {
        self.apply(stored);
        self.stats.incr(Counter::GoldenPopulated);
        if auto_approve {
            self.stats.incr(Counter::GoldenAutoApproved);
            info!(signature = %signature_hex(&stored.signature), "Golden entry auto-approved");
            PopulateOutcome::AutoApproved
        } else {
            debug!(signature = %signature_hex(&stored.signature), "Golden entry pending approval");
            PopulateOutcome::Pending
        }
    }

    /// Approves the pending entry for `signature`. Approving an approved entry is a
    /// no-op; approving a rejected one is an error.
    #[instrument(
        skip(self, signature),
        fields(signature = %signature_hex(&signature), approver = %approver)
    )]
    pub async fn approve(
        &self,
        signature: [u8; 32],
        approver: RaterId,
    ) -> GoldenResult<GoldenEntry> {
        self.transition(signature, ApprovalStatus::Approved, |entry| {
            entry.approve(approver)
        })
        .await
    }

    /// Rejects the entry for `signature`. It stays in the store for audit.
    #[instrument(skip(self, signature), fields(signature = %signature_hex(&signature)))]
    pub async fn reject(&self, signature: [u8; 32]) -> GoldenResult<GoldenEntry> {
        self.transition(signature, ApprovalStatus::Rejected, GoldenEntry::reject)
            .await
    }

    /// Rejects the entry for `question` when a rater trusted at or above
    /// `invalidation_trust` judged it incorrect. Returns `true` if an entry changed.
    pub async fn invalidate_for_question(
        &self,
        question: &str,
        rater_trust: f64,
    ) -> GoldenResult<bool> {
        if rater_trust < self.config.invalidation_trust {
            debug!(
                rater_trust,
                threshold = self.config.invalidation_trust,
                "Rater below invalidation trust; golden entry kept"
            );
            return Ok(false);
        }

        let signature = question_signature(question);
        match self.store.get_golden(signature).await? {
            None => Ok(false),
            Some(existing) if existing.status == ApprovalStatus::Rejected => Ok(false),
            Some(_) => {
                self.reject(signature).await?;
                self.stats.incr(Counter::GoldenInvalidated);
                info!(signature = %signature_hex(&signature), "Golden entry invalidated");
                Ok(true)
            }
        }
    }

    async fn transition(
        &self,
        signature: [u8; 32],
        target: ApprovalStatus,
        mutate: impl Fn(&mut GoldenEntry),
    ) -> GoldenResult<GoldenEntry> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut entry =
                self.store
                    .get_golden(signature)
                    .await?
                    .ok_or_else(|| GoldenError::NotFound {
                        signature: signature_hex(&signature),
                    })?;

            if entry.status == target {
                self.apply(&entry);
                return Ok(entry);
            }
            if entry.status == ApprovalStatus::Rejected {
                return Err(GoldenError::InvalidTransition {
                    signature: signature_hex(&signature),
                    from: entry.status,
                    to: target,
                });
            }

            let expected = entry.revision;
            mutate(&mut entry);
            match self.store.update_golden(entry, expected).await {
                Ok(stored) => {
                    self.apply(&stored);
                    return Ok(stored);
                }
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(GoldenError::Contended {
            signature: signature_hex(&signature),
            attempts: MAX_CAS_ATTEMPTS,
        })
    }

    /// Loads approved entries from the store into the indices.
    pub async fn warm(&self) -> GoldenResult<usize> {
        let entries = self.store.list_approved_golden().await?;
        let count = entries.len();
        for entry in &entries {
            self.apply(entry);
        }
        info!(entries = count, "Golden set warmed from store");
        Ok(count)
    }

    /// Brings the indices in line with a stored entry, ignoring stale revisions.
    fn apply(&self, entry: &GoldenEntry) {
        let mut revisions = self.revisions.lock();
        let known = revisions.get(&entry.signature).copied();
        if known.is_some_and(|r| entry.revision < r) {
            debug!(
                signature = %signature_hex(&entry.signature),
                revision = entry.revision,
                "Ignoring stale golden entry revision"
            );
            return;
        }
        revisions.insert(entry.signature, entry.revision);

        if entry.is_servable() {
            let shared = Arc::new(entry.clone());
            self.semantic.upsert(shared.clone());
            self.signatures.insert(shared);
        } else {
            self.signatures.remove(&entry.signature);
            self.semantic.remove(&entry.signature);
        }
    }
}

impl<S: FeedbackStore> GoldenCache<S> {
    /// Runs [`GoldenCache::populate`] in the background. Failures are logged.
    pub fn spawn_populate(self: &Arc<Self>, request: PopulateRequest) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            match cache.populate(request).await {
                Ok(outcome) => debug!(?outcome, "Golden population finished"),
                Err(e) => error!(error = %e, "Golden population failed"),
            }
        })
    }

    /// Runs [`GoldenCache::invalidate_for_question`] in the background.
    pub fn spawn_invalidate(
        self: &Arc<Self>,
        question: String,
        rater_trust: f64,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = cache.invalidate_for_question(&question, rater_trust).await {
                error!(error = %e, "Golden invalidation failed");
            }
        })
    }
}
