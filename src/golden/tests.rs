use super::*;
use std::sync::Arc;

use crate::embedding::{Embedder, MockEmbedder};
use crate::hashing::question_signature;
use crate::model::{ApprovalStatus, FeedbackId, RaterId};
use crate::stats::Stats;
use crate::store::{FeedbackStore, InMemoryStore};

const QUESTION: &str = "What is the capital of France?";
const ANSWER: &str = "Paris is the capital of France.";

struct Harness {
    cache: Arc<GoldenCache<InMemoryStore>>,
    store: Arc<InMemoryStore>,
    embedder: MockEmbedder,
    stats: Arc<Stats>,
}

fn harness_with(embedder: MockEmbedder) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let stats = Arc::new(Stats::new());
    let cache = GoldenCache::new(
        GoldenConfig::default(),
        store.clone(),
        Arc::new(embedder.clone()) as Arc<dyn Embedder>,
        stats.clone(),
    )
    .expect("default config is valid");
    Harness {
        cache: Arc::new(cache),
        store,
        embedder,
        stats,
    }
}

fn harness() -> Harness {
    harness_with(MockEmbedder::new())
}

fn request(question: &str, answer: &str, trust: f64) -> PopulateRequest {
    PopulateRequest {
        question: question.to_string(),
        answer: answer.to_string(),
        source_feedback: FeedbackId::new(),
        rater_id: RaterId::new(),
        rater_trust: trust,
    }
}

#[tokio::test]
async fn test_trusted_rater_auto_approves_and_serves_verbatim() {
    let h = harness();
    let outcome = h.cache.populate(request(QUESTION, ANSWER, 0.97)).await.unwrap();
    assert_eq!(outcome, PopulateOutcome::AutoApproved);

    let lookup = h.cache.lookup(QUESTION).await;
    assert!(lookup.hit);
    assert!(lookup.is_signature_hit());
    assert_eq!(lookup.answer.as_deref(), Some(ANSWER));
    assert_eq!(lookup.similarity_score, Some(1.0));

    assert_eq!(h.stats.golden_auto_approved(), 1);
    assert_eq!(h.stats.golden_signature_hits(), 1);
}

#[tokio::test]
async fn test_signature_hit_ignores_case_and_whitespace() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();

    let lookup = h.cache.lookup("  what IS the   capital of france?  ").await;
    assert!(lookup.is_signature_hit());
}

#[tokio::test]
async fn test_pending_entry_is_never_served() {
    let h = harness();
    let outcome = h.cache.populate(request(QUESTION, ANSWER, 0.8)).await.unwrap();
    assert_eq!(outcome, PopulateOutcome::Pending);

    assert!(!h.cache.lookup(QUESTION).await.hit);
    assert!(h.cache.is_empty());

    let stored = h
        .store
        .get_golden(question_signature(QUESTION))
        .await
        .unwrap()
        .expect("pending entry persisted");
    assert_eq!(stored.status, ApprovalStatus::Pending);
}

#[tokio::test]
async fn test_approve_pending_then_reject_round_trip() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.8)).await.unwrap();
    let sig = question_signature(QUESTION);
    let approver = RaterId::new();

    let approved = h.cache.approve(sig, approver).await.unwrap();
    assert_eq!(approved.status, ApprovalStatus::Approved);
    assert_eq!(approved.provenance.approved_by, Some(approver));
    assert!(h.cache.lookup(QUESTION).await.hit);

    let rejected = h.cache.reject(sig).await.unwrap();
    assert_eq!(rejected.status, ApprovalStatus::Rejected);
    assert!(rejected.revision > approved.revision);
    assert!(!h.cache.lookup(QUESTION).await.hit);
    assert!(h.cache.get(QUESTION).is_none());
}

#[tokio::test]
async fn test_approving_rejected_entry_is_invalid() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.8)).await.unwrap();
    let sig = question_signature(QUESTION);
    h.cache.reject(sig).await.unwrap();

    let err = h.cache.approve(sig, RaterId::new()).await.unwrap_err();
    assert!(matches!(
        err,
        GoldenError::InvalidTransition {
            from: ApprovalStatus::Rejected,
            to: ApprovalStatus::Approved,
            ..
        }
    ));
}

#[tokio::test]
async fn test_approve_unknown_signature_is_not_found() {
    let h = harness();
    let err = h
        .cache
        .approve(question_signature("never asked"), RaterId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GoldenError::NotFound { .. }));
}

#[tokio::test]
async fn test_repopulating_rejected_entry_reenters_gate() {
    let h = harness();
    h.cache.populate(request(QUESTION, "Lyon.", 0.97)).await.unwrap();
    h.cache.reject(question_signature(QUESTION)).await.unwrap();

    let outcome = h.cache.populate(request(QUESTION, ANSWER, 0.8)).await.unwrap();
    assert_eq!(outcome, PopulateOutcome::Pending);
    assert!(!h.cache.lookup(QUESTION).await.hit);

    let outcome = h.cache.populate(request(QUESTION, ANSWER, 0.96)).await.unwrap();
    assert_eq!(outcome, PopulateOutcome::AutoApproved);
    assert_eq!(h.cache.lookup(QUESTION).await.answer.as_deref(), Some(ANSWER));

    // The rejected answer is still on record.
    let stored = h
        .store
        .get_golden(question_signature(QUESTION))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.answer, ANSWER);
    assert_eq!(stored.rejected_history.len(), 1);
    let rejected = &stored.rejected_history[0];
    assert_eq!(rejected.answer, "Lyon.");
    assert!(rejected.provenance.approved_by.is_some());
    assert!(rejected.provenance.rejected_at.is_some());
}

#[tokio::test]
async fn test_trusted_populate_promotes_pending_entry() {
    let h = harness();
    h.cache.populate(request(QUESTION, "Paris.", 0.8)).await.unwrap();
    let outcome = h.cache.populate(request(QUESTION, ANSWER, 0.95)).await.unwrap();
    assert_eq!(outcome, PopulateOutcome::AutoApproved);
    assert_eq!(h.cache.lookup(QUESTION).await.answer.as_deref(), Some(ANSWER));
}

#[tokio::test]
async fn test_approved_entry_is_not_replaced() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();
    let outcome = h
        .cache
        .populate(request(QUESTION, "Marseille.", 0.99))
        .await
        .unwrap();
    assert_eq!(outcome, PopulateOutcome::AlreadyApproved);
    assert_eq!(h.cache.lookup(QUESTION).await.answer.as_deref(), Some(ANSWER));
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let h = harness();
    let err = h.cache.populate(request("   ", ANSWER, 0.99)).await.unwrap_err();
    assert!(matches!(err, GoldenError::EmptyQuestion));
}

#[tokio::test]
async fn test_semantic_hit_for_paraphrase() {
    let paraphrase = "Which city is the French capital?";
    let embedder = MockEmbedder::new()
        .with_vector(QUESTION, vec![1.0, 0.0, 0.0])
        .with_vector(paraphrase, vec![0.99, 0.1, 0.0])
        .with_vector("How tall is Mont Blanc?", vec![0.0, 1.0, 0.0]);
    let h = harness_with(embedder);
    h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();

    let lookup = h.cache.lookup(paraphrase).await;
    assert!(lookup.is_semantic_hit());
    assert_eq!(lookup.answer.as_deref(), Some(ANSWER));
    let score = lookup.similarity_score.unwrap();
    assert!(score >= 0.95 && score < 1.0, "score {score}");

    assert!(!h.cache.lookup("How tall is Mont Blanc?").await.hit);
    assert_eq!(h.stats.golden_semantic_hits(), 1);
}

#[tokio::test]
async fn test_semantic_stage_skips_pending_entries() {
    let paraphrase = "Which city is the French capital?";
    let embedder = MockEmbedder::new()
        .with_vector(QUESTION, vec![1.0, 0.0])
        .with_vector(paraphrase, vec![1.0, 0.0]);
    let h = harness_with(embedder);
    h.cache.populate(request(QUESTION, ANSWER, 0.5)).await.unwrap();

    assert!(!h.cache.lookup(paraphrase).await.hit);
}

#[tokio::test]
async fn test_embedder_outage_degrades_to_signature_only() {
    let h = harness();
    h.embedder.set_available(false);

    let outcome = h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();
    assert_eq!(outcome, PopulateOutcome::AutoApproved);
    assert!(h.cache.lookup(QUESTION).await.is_signature_hit());
    assert!(!h.cache.lookup("Name the capital city of France").await.hit);

    h.embedder.set_available(true);
    assert!(!h.cache.lookup("Name the capital city of France").await.hit);
}

#[tokio::test]
async fn test_invalidation_requires_trust_threshold() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();

    assert!(!h.cache.invalidate_for_question(QUESTION, 0.85).await.unwrap());
    assert!(h.cache.lookup(QUESTION).await.hit);

    assert!(h.cache.invalidate_for_question(QUESTION, 0.92).await.unwrap());
    assert!(!h.cache.lookup(QUESTION).await.hit);
    assert_eq!(h.stats.golden_invalidated(), 1);

    let stored = h
        .store
        .get_golden(question_signature(QUESTION))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ApprovalStatus::Rejected);

    assert!(!h.cache.invalidate_for_question(QUESTION, 0.99).await.unwrap());
    assert!(!h.cache.invalidate_for_question("unknown", 0.99).await.unwrap());
}

#[tokio::test]
async fn test_warm_loads_only_approved_entries() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();
    h.cache
        .populate(request("Is water wet?", "Yes.", 0.5))
        .await
        .unwrap();

    let fresh = GoldenCache::new(
        GoldenConfig::default(),
        h.store.clone(),
        Arc::new(MockEmbedder::new()) as Arc<dyn Embedder>,
        Arc::new(Stats::new()),
    )
    .unwrap();
    assert!(!fresh.lookup(QUESTION).await.hit);

    assert_eq!(fresh.warm().await.unwrap(), 1);
    assert_eq!(fresh.len(), 1);
    assert!(fresh.lookup(QUESTION).await.hit);
    assert!(!fresh.lookup("Is water wet?").await.hit);
}

#[tokio::test]
async fn test_store_outage_fails_writes_but_keeps_serving() {
    let h = harness();
    h.cache.populate(request(QUESTION, ANSWER, 0.99)).await.unwrap();
    h.store.set_available(false);

    let err = h
        .cache
        .populate(request("Another question?", "Answer.", 0.99))
        .await
        .unwrap_err();
    assert!(matches!(err, GoldenError::Store(ref e) if e.is_unavailable()));
    assert!(h.cache.lookup(QUESTION).await.hit);
}

#[tokio::test]
async fn test_concurrent_population_creates_one_entry() {
    let h = harness();
    let mut tasks = Vec::new();
    for i in 0..16 {
        let cache = h.cache.clone();
        tasks.push(tokio::spawn(async move {
            cache
                .populate(request(QUESTION, &format!("Answer {i}"), 0.8))
                .await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), PopulateOutcome::Pending);
    }

    let stored = h
        .store
        .get_golden(question_signature(QUESTION))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ApprovalStatus::Pending);
    assert_eq!(h.stats.golden_populated(), 1);
}

#[tokio::test]
async fn test_concurrent_approve_and_reject_converge_with_store() {
    for _ in 0..20 {
        let h = harness();
        h.cache.populate(request(QUESTION, ANSWER, 0.8)).await.unwrap();
        let sig = question_signature(QUESTION);

        let approver = {
            let cache = h.cache.clone();
            tokio::spawn(async move { cache.approve(sig, RaterId::new()).await })
        };
        let rejecter = {
            let cache = h.cache.clone();
            tokio::spawn(async move { cache.reject(sig).await })
        };
        let _ = approver.await.unwrap();
        rejecter.await.unwrap().unwrap();

        let stored = h.store.get_golden(sig).await.unwrap().unwrap();
        assert_eq!(stored.status, ApprovalStatus::Rejected);
        assert!(!h.cache.lookup(QUESTION).await.hit);
    }
}

#[tokio::test]
async fn test_spawned_population_completes() {
    let h = harness();
    h.cache
        .spawn_populate(request(QUESTION, ANSWER, 0.99))
        .await
        .unwrap();
    assert!(h.cache.lookup(QUESTION).await.hit);

    h.cache
        .spawn_invalidate(QUESTION.to_string(), 0.95)
        .await
        .unwrap();
    assert!(!h.cache.lookup(QUESTION).await.hit);
}

#[test]
fn test_config_validation() {
    assert!(GoldenConfig::default().validate().is_ok());
    assert!(
        GoldenConfig::default()
            .semantic_threshold(0.0)
            .validate()
            .is_err()
    );
    assert!(
        GoldenConfig::default()
            .auto_approve_trust(1.5)
            .validate()
            .is_err()
    );
    assert!(
        GoldenConfig::default()
            .signature_capacity(0)
            .validate()
            .is_err()
    );
}

#[test]
fn test_semantic_index_best_match_prefers_highest_score() {
    let index = SemanticIndex::new();
    let mut near = crate::model::GoldenEntry::pending(
        "near",
        "a",
        crate::embedding::to_f16(&[1.0, 0.0]),
        FeedbackId::new(),
    );
    near.approve(RaterId::new());
    let mut far = crate::model::GoldenEntry::pending(
        "far",
        "b",
        crate::embedding::to_f16(&[0.8, 0.6]),
        FeedbackId::new(),
    );
    far.approve(RaterId::new());
    index.upsert(Arc::new(far));
    index.upsert(Arc::new(near));

    let best = index.best_match(&[1.0, 0.0], 0.5).unwrap();
    assert_eq!(best.entry.question, "near");
    assert!(index.best_match(&[0.0, 1.0], 0.9).is_none());
}
