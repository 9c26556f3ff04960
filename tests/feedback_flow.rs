//! Feedback flows across intake, consensus, the golden cache and the batch jobs.

mod common;

use std::time::Duration;

use golden::model::{ActionType, ApprovalStatus, ConsensusStatus, PatternType};
use golden::store::FeedbackStore;
use golden::{IntakeError, MatchType, question_signature};

use common::{Stack, submission};

const QUESTION: &str = "What VAT rate applies to printed books?";
const ANSWER: &str = "Printed books use the reduced rate of 5 percent.";
const CORRECTION: &str = "The VAT total is miscalculated, the rounding formula is wrong";

#[tokio::test]
async fn test_expert_approval_serves_signature_hit() {
    let stack = Stack::new();
    let expert = stack.expert("Expert").await;
    let query = stack.query(QUESTION, ANSWER).await;

    let receipt = stack
        .intake
        .submit(submission(&query, &expert, "correct", None, None))
        .await
        .unwrap();
    assert!(receipt.rater_trust_score >= 0.95);

    let lookup = stack.wait_for_hit(QUESTION).await;
    assert!(lookup.hit);
    assert_eq!(lookup.match_type, Some(MatchType::Signature));
    assert_eq!(lookup.answer.as_deref(), Some(ANSWER));

    // Normalization makes casing and spacing irrelevant.
    let lookup = stack
        .golden
        .lookup("  what VAT rate applies to PRINTED books?  ")
        .await;
    assert!(lookup.is_signature_hit());
}

#[tokio::test]
async fn test_pending_entry_needs_approval_and_rejection_hides_it() {
    let stack = Stack::new();
    let reviewer = stack.reviewer("Reviewer").await;
    let expert = stack.expert("Approver").await;
    let query = stack.query(QUESTION, ANSWER).await;
    let signature = question_signature(QUESTION);

    stack
        .intake
        .submit(submission(&query, &reviewer, "correct", None, None))
        .await
        .unwrap();

    let mut pending = None;
    for _ in 0..200 {
        pending = stack.store.get_golden(signature).await.unwrap();
        if pending.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let pending = pending.expect("population stores a pending entry");
    assert_eq!(pending.status, ApprovalStatus::Pending);
    assert!(!stack.golden.lookup(QUESTION).await.hit);

    stack.golden.approve(signature, expert.id).await.unwrap();
    assert!(stack.golden.lookup(QUESTION).await.is_signature_hit());

    stack.golden.reject(signature).await.unwrap();
    assert!(!stack.golden.lookup(QUESTION).await.hit);
}

#[tokio::test]
async fn test_repeated_correct_feedback_never_lowers_trust() {
    let stack = Stack::new();
    let reviewer = stack.reviewer("Reviewer").await;
    let query = stack.query(QUESTION, ANSWER).await;

    let mut previous = reviewer.trust_score;
    for _ in 0..5 {
        let mut slow = submission(&query, &reviewer, "correct", None, None);
        slow.time_spent_seconds = Some(600.0);
        let receipt = stack.intake.submit(slow).await.unwrap();
        assert!(receipt.rater_trust_score >= previous);
        assert!(receipt.rater_trust_score >= 0.7);
        previous = receipt.rater_trust_score;
    }

    let stored = stack.store.get_rater(reviewer.id).await.unwrap().unwrap();
    assert_eq!(stored.feedback_count, 5);
}

#[tokio::test]
async fn test_zero_time_spent_is_a_validation_error() {
    let stack = Stack::new();
    let expert = stack.expert("Expert").await;
    let query = stack.query(QUESTION, ANSWER).await;

    let mut candidate = submission(&query, &expert, "correct", None, None);
    candidate.time_spent_seconds = Some(0.0);
    let err = stack.intake.submit(candidate).await.unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)));
    assert_eq!(stack.stats.feedback_rejected_validation(), 1);
}

#[tokio::test]
async fn test_two_agreeing_experts_complete_consensus() {
    let stack = Stack::new();
    let first = stack.expert("First").await;
    let second = stack.expert("Second").await;
    let query = stack.query(QUESTION, ANSWER).await;

    for rater in [&first, &second] {
        stack
            .intake
            .submit(submission(&query, rater, "correct", None, None))
            .await
            .unwrap();
    }

    let mut results = Vec::new();
    for _ in 0..200 {
        results = stack.store.consensus_for_query(query.id).await.unwrap();
        if !results.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.status, ConsensusStatus::Completed);
    assert!(result.consensus_reached);
    assert!((result.consensus_strength - 1.0).abs() < 1e-9);
    assert_eq!(result.final_answer.as_deref(), Some(ANSWER));
    assert_eq!(stack.tracker.open_sessions(), 0);
}

#[tokio::test]
async fn test_recurring_failures_become_recommendations() {
    let stack = Stack::new();
    let expert = stack.expert("Expert").await;

    for i in 0..6 {
        let query = stack
            .query(&format!("Invoice {i}: what is the VAT total?"), "It is 120.")
            .await;
        stack
            .intake
            .submit(submission(
                &query,
                &expert,
                "incorrect",
                Some("calculation"),
                Some(CORRECTION),
            ))
            .await
            .unwrap();
    }

    let report = stack.scheduler.run_once().await;
    assert_eq!(report.failures, 0);
    let clustering = report.clustering.expect("clustering ran");
    assert_eq!(clustering.events_seen, 6);
    assert_eq!(clustering.clusters, 1);

    let patterns = stack.store.list_patterns().await.unwrap();
    let calculation = patterns
        .iter()
        .find(|p| p.pattern_type == PatternType::Calculation)
        .expect("calculation pattern");
    assert_eq!(calculation.frequency, 6);

    let recommendations = stack.recommender.latest();
    assert_eq!(report.recommendations, recommendations.len());
    let fix = recommendations
        .iter()
        .find(|r| r.action_type == ActionType::FixFormulas)
        .expect("fix formulas recommendation");
    assert!(fix.confidence >= 0.6);
    assert!(fix.expected_impact >= 0.2);
    assert!(
        recommendations
            .windows(2)
            .all(|w| w[0].priority_score >= w[1].priority_score)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_feedback_never_loses_rater_updates() {
    let stack = Stack::new();
    let reviewer = stack.reviewer("Busy").await;

    let mut queries = Vec::new();
    for i in 0..16 {
        queries.push(stack.query(&format!("Question number {i}?"), "An answer.").await);
    }

    let submissions = queries.iter().map(|query| {
        let intake = stack.intake.clone();
        let candidate = submission(query, &reviewer, "correct", None, None);
        tokio::spawn(async move { intake.submit(candidate).await })
    });
    let results = futures::future::join_all(submissions).await;
    assert!(results.into_iter().all(|r| r.unwrap().is_ok()));

    let stored = stack.store.get_rater(reviewer.id).await.unwrap().unwrap();
    assert_eq!(stored.feedback_count, 16);
}
