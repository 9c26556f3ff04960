use super::*;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use crate::embedding::{Embedder, FallbackEmbedder, MockEmbedder};
use crate::golden::{GoldenCache, GoldenConfig, PopulateRequest};
use crate::model::{
    ApprovalStatus, ConsensusStatus, DisagreementArea, FeedbackId, QueryId, QueryRecord, RaterId,
    RaterProfile, Verdict,
};
use crate::hashing::question_signature;
use crate::stats::Stats;
use crate::store::{FeedbackStore, InMemoryStore};

const VAT_ANSWER: &str = "The reduced VAT rate for printed books is 5 percent";

fn answer(trust: f64, confidence: f64, text: &str) -> RaterAnswer {
    answer_with(RaterId::new(), trust, confidence, Verdict::Correct, text)
}

fn answer_with(
    rater_id: RaterId,
    trust: f64,
    confidence: f64,
    verdict: Verdict,
    text: &str,
) -> RaterAnswer {
    RaterAnswer {
        rater_id,
        trust_score: trust,
        confidence,
        verdict,
        answer: text.to_string(),
        corrected: false,
        submitted_at: Utc::now(),
    }
}

fn engine() -> ConsensusEngine {
    ConsensusEngine::new(ConsensusConfig::default()).unwrap()
}

#[test]
fn test_weight_is_trust_times_confidence() {
    assert!((answer(0.9, 0.5, "x").weight() - 0.45).abs() < 1e-12);
    assert_eq!(answer(f64::NAN, 0.5, "x").weight(), 0.0);
    assert_eq!(answer(0.9, -1.0, "x").weight(), 0.0);
}

#[test]
fn test_no_answers_reports_error() {
    let rec = engine().reconcile_lexical(QueryId::new(), &[]);
    assert!(!rec.result.consensus_reached);
    assert_eq!(rec.result.error.as_deref(), Some("no answers"));
    assert!(rec.dominant.is_empty());
    assert!(!rec.result.is_unresolved());
}

#[test]
fn test_single_answer_needs_policy() {
    let answers = [answer(0.9, 0.9, VAT_ANSWER)];

    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert!(!rec.result.consensus_reached);
    assert_eq!(rec.result.consensus_strength, 1.0);
    assert_eq!(rec.result.agreement_score, 1.0);
    assert!(rec.result.final_answer.is_none());

    let lenient =
        ConsensusEngine::new(ConsensusConfig::default().single_rater_consensus(true)).unwrap();
    let rec = lenient.reconcile_lexical(QueryId::new(), &answers);
    assert!(rec.result.consensus_reached);
    assert_eq!(rec.result.final_answer.as_deref(), Some(VAT_ANSWER));
}

#[test]
fn test_endorsing_and_disputing_the_same_text_is_disagreement() {
    let endorse = answer_with(RaterId::new(), 0.8, 1.0, Verdict::Correct, VAT_ANSWER);
    let dispute = answer_with(RaterId::new(), 0.8, 1.0, Verdict::Incorrect, VAT_ANSWER);

    let rec = engine().reconcile_lexical(QueryId::new(), &[endorse, dispute]);
    assert!(!rec.result.consensus_reached);
    assert!((rec.result.consensus_strength - 0.5).abs() < 1e-12);
    assert_eq!(rec.result.agreement_score, 0.0);
    assert_eq!(rec.result.dominant_group_size, 1);
    assert!(rec.result.final_answer.is_none());
}

#[test]
fn test_agreed_dispute_without_correction_has_no_final_answer() {
    let answers = [
        answer_with(RaterId::new(), 0.8, 1.0, Verdict::Incorrect, VAT_ANSWER),
        answer_with(RaterId::new(), 0.8, 1.0, Verdict::Incomplete, VAT_ANSWER),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert!(rec.result.consensus_reached);
    assert!(rec.result.final_answer.is_none());

    // A written correction can stand as the final answer.
    let correction = "Printed books are zero rated in this jurisdiction";
    let mut corrected = answer_with(RaterId::new(), 0.9, 1.0, Verdict::Incorrect, correction);
    corrected.corrected = true;
    let mut second = answer_with(RaterId::new(), 0.8, 1.0, Verdict::Incorrect, correction);
    second.corrected = true;
    let rec = engine().reconcile_lexical(QueryId::new(), &[corrected, second]);
    assert!(rec.result.consensus_reached);
    assert_eq!(rec.result.final_answer.as_deref(), Some(correction));
}

#[test]
fn test_reconciled_answer_is_heaviest_dominant_member() {
    let lighter = answer(0.8, 0.9, "The reduced VAT rate for printed books is 5 percent today");
    let heavier = answer(0.95, 1.0, VAT_ANSWER);
    let outlier = answer(0.5, 0.3, "Books are zero rated");
    let answers = [lighter.clone(), heavier.clone(), outlier.clone()];

    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    let result = &rec.result;

    assert!(result.consensus_reached, "strength {}", result.consensus_strength);
    assert_eq!(result.dominant_group_size, 2);
    assert_eq!(result.final_answer.as_deref(), Some(VAT_ANSWER));
    assert_eq!(rec.dominant, vec![heavier.rater_id, lighter.rater_id]);
    assert!(!rec.in_dominant_group(outlier.rater_id));
    assert!(result.disagreement_areas.is_empty());

    let expected_strength = (0.72 + 0.95) / (0.72 + 0.95 + 0.15);
    assert!((result.consensus_strength - expected_strength).abs() < 1e-9);
    assert_eq!(result.contributors.len(), 3);
    assert_eq!(result.status, ConsensusStatus::Completed);
}

#[test]
fn test_similarity_threshold_is_strict() {
    // Jaccard is exactly 3/5 = 0.6.
    let answers = [
        answer(0.9, 1.0, "alpha beta gamma delta"),
        answer(0.9, 1.0, "alpha beta gamma epsilon"),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert_eq!(rec.result.dominant_group_size, 1);
    assert!(!rec.result.consensus_reached);
    assert!((rec.result.agreement_score - 0.6).abs() < 1e-12);
}

#[test]
fn test_weak_majority_is_not_consensus() {
    let answers = [
        answer(0.5, 1.0, VAT_ANSWER),
        answer(0.5, 1.0, VAT_ANSWER),
        answer(0.5, 1.0, "Printed books carry no VAT at all"),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert_eq!(rec.result.dominant_group_size, 2);
    assert!((rec.result.consensus_strength - 2.0 / 3.0).abs() < 1e-9);
    assert!(!rec.result.consensus_reached);
}

#[test]
fn test_disagreement_labels() {
    let answers = [
        answer(0.9, 1.0, "Yes, the deduction is allowed up to 2500"),
        answer(0.9, 1.0, "No, the deduction is not allowed above 1000"),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    let result = &rec.result;
    assert!(!result.consensus_reached);
    assert!(result.final_answer.is_none());
    assert!(
        result
            .disagreement_areas
            .contains(&DisagreementArea::ConflictingAssessment)
    );
    assert!(
        result
            .disagreement_areas
            .contains(&DisagreementArea::NumericDivergence)
    );
    assert!(result.is_unresolved());
}

#[test]
fn test_matching_numbers_are_not_divergent() {
    let answers = [
        answer(0.9, 1.0, "The limit is 1,000 per year"),
        answer(0.9, 1.0, "Annual cap: 1000 for each taxpayer filing separately"),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert!(!rec.result.consensus_reached);
    assert!(
        !rec.result
            .disagreement_areas
            .contains(&DisagreementArea::NumericDivergence)
    );
}

#[tokio::test]
async fn test_embeddings_substitute_for_token_overlap() {
    let a = "Five percent applies to printed books";
    let b = "Books in print are taxed at the reduced 5% rate";
    let mock = MockEmbedder::new()
        .with_vector(a, vec![1.0, 0.0, 0.0])
        .with_vector(b, vec![0.98, 0.05, 0.0]);
    let engine = engine().with_embedder(FallbackEmbedder::new(
        Arc::new(mock.clone()) as Arc<dyn Embedder>
    ));
    let answers = [answer(0.9, 1.0, a), answer(0.9, 1.0, b)];

    let rec = engine.reconcile(QueryId::new(), &answers).await;
    assert!(rec.result.consensus_reached);

    mock.set_available(false);
    let rec = engine.reconcile(QueryId::new(), &answers).await;
    assert!(!rec.result.consensus_reached, "falls back to token overlap");
}

#[test]
fn test_config_validation() {
    assert!(ConsensusConfig::default().validate().is_ok());
    assert!(
        ConsensusConfig::default()
            .required_validations(0)
            .validate()
            .is_err()
    );
    assert!(
        ConsensusConfig::default()
            .strength_threshold(1.2)
            .validate()
            .is_err()
    );
    assert!(
        ConsensusConfig::default()
            .validation_deadline(Duration::ZERO)
            .validate()
            .is_err()
    );
}

struct Harness {
    store: Arc<InMemoryStore>,
    stats: Arc<Stats>,
    golden: Arc<GoldenCache<InMemoryStore>>,
    tracker: ConsensusTracker<InMemoryStore>,
}

fn harness(config: ConsensusConfig) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let stats = Arc::new(Stats::new());
    let golden = Arc::new(
        GoldenCache::new(
            GoldenConfig::default(),
            store.clone(),
            Arc::new(MockEmbedder::new()) as Arc<dyn Embedder>,
            stats.clone(),
        )
        .unwrap(),
    );
    let tracker = ConsensusTracker::new(
        ConsensusEngine::new(config).unwrap(),
        store.clone(),
        stats.clone(),
    )
    .with_golden(golden.clone());
    Harness {
        store,
        stats,
        golden,
        tracker,
    }
}

async fn onboard(store: &InMemoryStore) -> RaterProfile {
    let profile = RaterProfile::onboard(
        "Rater",
        vec!["cpa".to_string()],
        10.0,
        vec!["vat".to_string()],
        0.8,
        120.0,
    )
    .verify();
    store.create_rater(profile.clone()).await.unwrap();
    profile
}

#[tokio::test]
async fn test_session_completes_at_required_validations() {
    let h = harness(ConsensusConfig::default());
    let query = QueryId::new();

    let first = h
        .tracker
        .record(query, answer(0.9, 1.0, VAT_ANSWER))
        .await
        .unwrap();
    assert!(first.is_none());
    assert_eq!(h.tracker.pending_answers(query), 1);

    let second = h
        .tracker
        .record(query, answer(0.9, 1.0, VAT_ANSWER))
        .await
        .unwrap()
        .expect("second validation resolves the session");
    assert!(second.consensus_reached);
    assert_eq!(second.status, ConsensusStatus::Completed);
    assert_eq!(h.tracker.open_sessions(), 0);

    let stored = h.store.consensus_for_query(query).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(h.stats.consensus_completed(), 1);
    assert_eq!(h.stats.consensus_reached(), 1);
}

#[tokio::test]
async fn test_repeat_answer_replaces_earlier_one() {
    let h = harness(ConsensusConfig::default());
    let query = QueryId::new();
    let rater = RaterId::new();

    for text in ["first take", "second take"] {
        let out = h
            .tracker
            .record(query, answer_with(rater, 0.9, 1.0, Verdict::Correct, text))
            .await
            .unwrap();
        assert!(out.is_none());
    }
    assert_eq!(h.tracker.pending_answers(query), 1);
}

#[tokio::test]
async fn test_sweep_expires_stale_sessions() {
    let h = harness(ConsensusConfig::default());
    let query = QueryId::new();
    let mut lone = answer(0.9, 1.0, VAT_ANSWER);
    let opened = Utc::now();
    lone.submitted_at = opened;
    h.tracker.record(query, lone).await.unwrap();

    let early = h
        .tracker
        .sweep_expired(opened + TimeDelta::hours(47))
        .await
        .unwrap();
    assert!(early.is_empty());
    assert_eq!(h.tracker.open_sessions(), 1);

    let expired = h
        .tracker
        .sweep_expired(opened + TimeDelta::hours(48))
        .await
        .unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].status, ConsensusStatus::Expired);
    assert!(!expired[0].consensus_reached);
    assert_eq!(h.tracker.open_sessions(), 0);
    assert_eq!(h.stats.consensus_expired(), 1);
    assert_eq!(h.store.consensus_for_query(query).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sweep_keeps_sessions_it_could_not_close() {
    let h = harness(ConsensusConfig::default());
    let query = QueryId::new();
    let mut lone = answer(0.9, 1.0, VAT_ANSWER);
    let opened = Utc::now();
    lone.submitted_at = opened;
    h.tracker.record(query, lone).await.unwrap();

    h.store.set_available(false);
    let later = opened + TimeDelta::hours(49);
    assert!(h.tracker.sweep_expired(later).await.is_err());
    assert_eq!(h.tracker.open_sessions(), 1);

    h.store.set_available(true);
    assert_eq!(h.tracker.sweep_expired(later).await.unwrap().len(), 1);
    assert_eq!(h.tracker.open_sessions(), 0);
}

#[tokio::test]
async fn test_late_answer_opens_a_new_session() {
    let h = harness(ConsensusConfig::default());
    let query = QueryId::new();
    let opened = Utc::now() - TimeDelta::hours(72);

    let mut stale = answer(0.9, 1.0, VAT_ANSWER);
    stale.submitted_at = opened;
    h.tracker.record(query, stale).await.unwrap();

    let out = h
        .tracker
        .record(query, answer(0.9, 1.0, VAT_ANSWER))
        .await
        .unwrap();
    assert!(out.is_none(), "expired answer does not count toward the new session");
    assert_eq!(h.tracker.pending_answers(query), 1);

    let stored = h.store.consensus_for_query(query).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, ConsensusStatus::Expired);
}

#[tokio::test]
async fn test_outcome_updates_rater_accuracy() {
    let h = harness(ConsensusConfig::default().required_validations(3));
    let query = QueryId::new();
    let a = onboard(&h.store).await;
    let b = onboard(&h.store).await;
    let c = onboard(&h.store).await;

    for (rater, text) in [
        (&a, VAT_ANSWER),
        (&b, VAT_ANSWER),
        (&c, "Printed books carry no VAT at all"),
    ] {
        let weight = if rater.id == c.id { 0.2 } else { 1.0 };
        h.tracker
            .record(
                query,
                answer_with(rater.id, rater.trust_score, weight, Verdict::Correct, text),
            )
            .await
            .unwrap();
    }

    let a_after = h.store.get_rater(a.id).await.unwrap().unwrap();
    let c_after = h.store.get_rater(c.id).await.unwrap().unwrap();
    assert_eq!(a_after.validated_count, 1);
    assert_eq!(c_after.validated_count, 1);
    assert!(a_after.accuracy_rate > a.accuracy_rate);
    assert!(c_after.accuracy_rate < c.accuracy_rate);
    assert!(a_after.trust_score > c_after.trust_score);
}

#[tokio::test]
async fn test_correct_consensus_approves_pending_golden_entry() {
    let h = harness(ConsensusConfig::default());
    let record = QueryRecord::new("What VAT applies to printed books?", VAT_ANSWER);
    h.store.put_query(record.clone()).await.unwrap();
    h.golden
        .populate(PopulateRequest {
            question: record.question.clone(),
            answer: record.answer.clone(),
            source_feedback: FeedbackId::new(),
            rater_id: RaterId::new(),
            rater_trust: 0.8,
        })
        .await
        .unwrap();
    assert!(!h.golden.lookup(&record.question).await.hit);

    for _ in 0..2 {
        h.tracker
            .record(record.id, answer(0.85, 1.0, VAT_ANSWER))
            .await
            .unwrap();
    }

    assert!(h.golden.lookup(&record.question).await.hit);
}

#[tokio::test]
async fn test_incorrect_consensus_rejects_golden_entry() {
    let h = harness(ConsensusConfig::default());
    let record = QueryRecord::new("What VAT applies to printed books?", "20 percent");
    h.store.put_query(record.clone()).await.unwrap();
    h.golden
        .populate(PopulateRequest {
            question: record.question.clone(),
            answer: record.answer.clone(),
            source_feedback: FeedbackId::new(),
            rater_id: RaterId::new(),
            rater_trust: 0.99,
        })
        .await
        .unwrap();
    assert!(h.golden.lookup(&record.question).await.hit);

    for _ in 0..2 {
        h.tracker
            .record(
                record.id,
                answer_with(RaterId::new(), 0.85, 1.0, Verdict::Incorrect, VAT_ANSWER),
            )
            .await
            .unwrap();
    }

    assert!(!h.golden.lookup(&record.question).await.hit);
    let stored = h
        .store
        .get_golden(question_signature(&record.question))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ApprovalStatus::Rejected);
}

#[test]
fn test_three_identical_equal_weight_answers_agree_fully() {
    let answers = [
        answer(0.8, 1.0, VAT_ANSWER),
        answer(0.8, 1.0, VAT_ANSWER),
        answer(0.8, 1.0, VAT_ANSWER),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert!(rec.result.consensus_reached);
    assert_eq!(rec.result.consensus_strength, 1.0);
    assert_eq!(rec.result.agreement_score, 1.0);
    assert_eq!(rec.result.dominant_group_size, 3);
}

#[test]
fn test_two_singleton_groups_of_equal_weight_do_not_agree() {
    let answers = [
        answer(0.8, 1.0, VAT_ANSWER),
        answer(0.8, 1.0, "Printed books carry no VAT at all"),
    ];
    let rec = engine().reconcile_lexical(QueryId::new(), &answers);
    assert!(!rec.result.consensus_reached);
    assert!((rec.result.consensus_strength - 0.5).abs() < 1e-12);
}
