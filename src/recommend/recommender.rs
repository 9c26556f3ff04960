use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use super::config::RecommenderConfig;
use crate::clustering::BatchResult;
use crate::model::{
    ActionType, ConsensusResult, EffortEstimate, FailurePattern, ImpactTier,
    ImprovementRecommendation, PatternType, RecommendationSource, StatedPriority,
};
use crate::store::FeedbackStore;

/// Canonical action for a pattern type.
pub fn action_for(pattern_type: PatternType) -> ActionType {
    match pattern_type {
        PatternType::OutdatedReference => ActionType::UpdateReferences,
        PatternType::Calculation => ActionType::FixFormulas,
        PatternType::SemanticCluster => ActionType::BroadenCoverage,
        PatternType::Misinterpretation => ActionType::ClarifyPrompts,
        PatternType::Category => ActionType::ReviewCategory,
    }
}

pub fn effort_for(pattern_type: PatternType) -> EffortEstimate {
    match pattern_type {
        PatternType::Calculation | PatternType::OutdatedReference => EffortEstimate::Low,
        PatternType::Misinterpretation | PatternType::Category => EffortEstimate::Medium,
        PatternType::SemanticCluster => EffortEstimate::High,
    }
}

/// Stated priority follows the impact tier.
pub fn stated_priority(expected_impact: f64) -> StatedPriority {
    match ImpactTier::from_score(expected_impact) {
        ImpactTier::Critical => StatedPriority::Critical,
        ImpactTier::High => StatedPriority::High,
        ImpactTier::Medium => StatedPriority::Medium,
        ImpactTier::Low => StatedPriority::Low,
    }
}

/// `impact × confidence × (1 − effort_penalty) + priority_boost`.
pub fn priority_score(
    expected_impact: f64,
    confidence: f64,
    effort: EffortEstimate,
    stated: StatedPriority,
) -> f64 {
    expected_impact * confidence * (1.0 - effort.penalty()) + stated.boost()
}

fn from_pattern(pattern: &FailurePattern) -> ImprovementRecommendation {
    let action_type = action_for(pattern.pattern_type);
    let effort = effort_for(pattern.pattern_type);
    let stated = stated_priority(pattern.impact_score);
    ImprovementRecommendation {
        action_type,
        priority_score: priority_score(pattern.impact_score, pattern.confidence, effort, stated),
        expected_impact: pattern.impact_score,
        confidence: pattern.confidence,
        source: RecommendationSource::Pattern(pattern.id),
        effort,
        stated_priority: stated,
        description: format!(
            "{} for \"{}\" ({} reports)",
            action_type.as_str(),
            pattern.name,
            pattern.frequency
        ),
    }
}

// Impact grows with how far apart the raters were; confidence with how many
// raters weighed in (three or more is full confidence).
fn from_disagreement(result: &ConsensusResult) -> ImprovementRecommendation {
    let expected_impact = (1.0 - result.agreement_score).clamp(0.0, 1.0);
    let confidence = (result.contributors.len() as f64 / 3.0).min(1.0);
    let effort = EffortEstimate::Medium;
    let stated = stated_priority(expected_impact);
    let labels: Vec<&str> = result.disagreement_areas.iter().map(|a| a.as_str()).collect();
    ImprovementRecommendation {
        action_type: ActionType::ResolveDisagreement,
        priority_score: priority_score(expected_impact, confidence, effort, stated),
        expected_impact,
        confidence,
        source: RecommendationSource::Consensus(result.id),
        effort,
        stated_priority: stated,
        description: format!(
            "{} on query {} ({})",
            ActionType::ResolveDisagreement.as_str(),
            result.query_id,
            labels.join(", ")
        ),
    }
}

/// Turns unresolved patterns and disagreements into a ranked action list.
///
/// Candidates under the confidence or impact floor are dropped, each action type
/// keeps only its highest-priority candidate, and the list is sorted by priority
/// and capped.
pub fn build_recommendations(
    config: &RecommenderConfig,
    patterns: &[FailurePattern],
    consensus: &[ConsensusResult],
) -> Vec<ImprovementRecommendation> {
    let candidates = patterns
        .iter()
        .filter(|p| !p.resolved)
        .map(from_pattern)
        .chain(
            consensus
                .iter()
                .filter(|r| r.is_unresolved())
                .map(from_disagreement),
        );

    let mut best: HashMap<ActionType, ImprovementRecommendation> = HashMap::new();
    for rec in candidates {
        if rec.confidence < config.min_confidence || rec.expected_impact < config.min_impact {
            debug!(action = rec.action_type.as_str(), "Dropping weak recommendation");
            continue;
        }
        match best.get(&rec.action_type) {
            Some(kept) if kept.priority_score >= rec.priority_score => {}
            _ => {
                best.insert(rec.action_type, rec);
            }
        }
    }

    let mut out: Vec<ImprovementRecommendation> = best.into_values().collect();
    out.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.action_type.as_str().cmp(b.action_type.as_str()))
    });
    out.truncate(config.max_recommendations);
    out
}

/// Holds the most recent recommendation set. Each refresh replaces it wholesale.
pub struct Recommender<S: FeedbackStore> {
    config: RecommenderConfig,
    store: Arc<S>,
    latest: RwLock<Arc<Vec<ImprovementRecommendation>>>,
}

impl<S: FeedbackStore> std::fmt::Debug for Recommender<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("config", &self.config)
            .field("latest", &self.latest.read().len())
            .finish()
    }
}

impl<S: FeedbackStore> Recommender<S> {
    pub fn new(config: RecommenderConfig, store: Arc<S>) -> BatchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            latest: RwLock::new(Arc::new(Vec::new())),
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// The latest recommendation set (empty before the first refresh).
    pub fn latest(&self) -> Arc<Vec<ImprovementRecommendation>> {
        self.latest.read().clone()
    }

    /// Recomputes recommendations from the stored patterns and recent consensus
    /// results, replacing the previous set.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> BatchResult<Arc<Vec<ImprovementRecommendation>>> {
        let lookback =
            TimeDelta::from_std(self.config.consensus_lookback).unwrap_or(TimeDelta::days(7));
        let patterns = self.store.list_patterns().await?;
        let consensus = self.store.consensus_since(Utc::now() - lookback).await?;

        let recs = Arc::new(build_recommendations(&self.config, &patterns, &consensus));
        *self.latest.write() = recs.clone();
        info!(
            patterns = patterns.len(),
            consensus = consensus.len(),
            recommendations = recs.len(),
            "Recommendations refreshed"
        );
        Ok(recs)
    }
}
