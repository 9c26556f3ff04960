//! Trust-weighted reconciliation of independent answers to one query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::config::ConsensusConfig;
use super::error::ConsensusError;
use crate::embedding::{EmbeddingSpace, FallbackEmbedder, cosine_similarity};
use crate::model::{
    ConsensusId, ConsensusResult, ConsensusStatus, Contributor, DisagreementArea, QueryId,
    RaterId, Verdict,
};
use crate::text::{has_affirmative_marker, has_negative_marker, jaccard, numeric_literals};

/// One rater's answer to a query, annotated for weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaterAnswer {
    pub rater_id: RaterId,
    pub trust_score: f64,
    pub confidence: f64,
    pub verdict: Verdict,
    /// The rater's own answer, or the AI answer under review when no correction was given.
    pub answer: String,
    /// `true` when `answer` is the rater's correction rather than the AI answer.
    #[serde(default)]
    pub corrected: bool,
    pub submitted_at: DateTime<Utc>,
}

impl RaterAnswer {
    /// `trust × confidence`, with non-finite or negative inputs counted as zero.
    pub fn weight(&self) -> f64 {
        let sane = |x: f64| if x.is_finite() { x.max(0.0) } else { 0.0 };
        sane(self.trust_score) * sane(self.confidence).min(1.0)
    }

    /// Whether `answer` can stand as a final answer: an endorsement of the AI
    /// answer, or a correction the rater wrote.
    fn endorses_text(&self) -> bool {
        self.verdict == Verdict::Correct || self.corrected
    }
}

/// A reconciled result plus who sat in the dominant group.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub result: ConsensusResult,
    /// Raters in the dominant group, heaviest first.
    pub dominant: Vec<RaterId>,
}

impl Reconciliation {
    pub fn in_dominant_group(&self, rater: RaterId) -> bool {
        self.dominant.contains(&rater)
    }
}

/// Groups answers by similarity and decides whether they agree.
///
/// Similarity is token-set Jaccard. With an embedder attached, cosine similarity in
/// the neural space substitutes whenever the whole batch embeds neurally.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    config: ConsensusConfig,
    embedder: Option<FallbackEmbedder>,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig) -> Result<Self, ConsensusError> {
        config.validate()?;
        Ok(Self {
            config,
            embedder: None,
        })
    }

    pub fn with_embedder(mut self, embedder: FallbackEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Reconciles `answers`, using embeddings when available.
    #[instrument(skip(self, answers), fields(query = %query_id, answers = answers.len()))]
    pub async fn reconcile(&self, query_id: QueryId, answers: &[RaterAnswer]) -> Reconciliation {
        let Some(embedder) = self.embedder.as_ref().filter(|_| answers.len() >= 2) else {
            return self.reconcile_lexical(query_id, answers);
        };

        let texts: Vec<String> = answers.iter().map(|a| a.answer.clone()).collect();
        let batch = embedder.embed_all(&texts).await;
        if batch.space != EmbeddingSpace::Neural {
            debug!("No neural embeddings; reconciling on token overlap");
            return self.reconcile_lexical(query_id, answers);
        }

        let similarity = pairwise(answers.len(), |i, j| {
            f64::from(cosine_similarity(&batch.vectors[i], &batch.vectors[j])).max(0.0)
        });
        self.reconcile_with(query_id, answers, &similarity)
    }

    /// Reconciles `answers` on token-set overlap only.
    pub fn reconcile_lexical(&self, query_id: QueryId, answers: &[RaterAnswer]) -> Reconciliation {
        let similarity = pairwise(answers.len(), |i, j| {
            jaccard(&answers[i].answer, &answers[j].answer)
        });
        self.reconcile_with(query_id, answers, &similarity)
    }

    fn reconcile_with(
        &self,
        query_id: QueryId,
        answers: &[RaterAnswer],
        similarity: &[Vec<f64>],
    ) -> Reconciliation {
        // Endorsing and disputing the same text is disagreement, whatever the overlap.
        let similarity = &split_by_polarity(answers, similarity);
        let contributors: Vec<Contributor> = answers
            .iter()
            .map(|a| Contributor {
                rater_id: a.rater_id,
                weight: a.weight(),
            })
            .collect();

        if answers.is_empty() {
            return Reconciliation {
                result: ConsensusResult {
                    id: ConsensusId::new(),
                    query_id,
                    contributors,
                    dominant_group_size: 0,
                    consensus_reached: false,
                    consensus_strength: 0.0,
                    agreement_score: 0.0,
                    final_answer: None,
                    disagreement_areas: Vec::new(),
                    status: ConsensusStatus::Completed,
                    error: Some("no answers".to_string()),
                    created_at: Utc::now(),
                },
                dominant: Vec::new(),
            };
        }

        let groups = group_answers(similarity, self.config.similarity_threshold);
        let group_weight =
            |group: &[usize]| -> f64 { group.iter().map(|&i| contributors[i].weight).sum() };

        // Ties go to the earliest group.
        let mut dominant = &groups[0];
        for group in &groups[1..] {
            if group_weight(group) > group_weight(dominant) {
                dominant = group;
            }
        }

        let total_weight: f64 = contributors.iter().map(|c| c.weight).sum();
        let strength = if total_weight > 0.0 {
            group_weight(dominant) / total_weight
        } else {
            0.0
        };

        let reached = if answers.len() == 1 {
            self.config.single_rater_consensus
        } else {
            strength >= self.config.strength_threshold
                && dominant.len() >= self.config.min_group_size
        };

        let mut members = dominant.clone();
        members.sort_by(|&a, &b| {
            contributors[b]
                .weight
                .partial_cmp(&contributors[a].weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let final_answer = if reached {
            members
                .iter()
                .map(|&i| &answers[i])
                .find(|a| a.endorses_text())
                .map(|a| a.answer.clone())
        } else {
            None
        };
        let disagreement_areas = if reached {
            Vec::new()
        } else {
            disagreement_areas(answers)
        };

        let result = ConsensusResult {
            id: ConsensusId::new(),
            query_id,
            contributors,
            dominant_group_size: dominant.len(),
            consensus_reached: reached,
            consensus_strength: if answers.len() == 1 { 1.0 } else { strength },
            agreement_score: agreement_score(similarity),
            final_answer,
            disagreement_areas,
            status: ConsensusStatus::Completed,
            error: None,
            created_at: Utc::now(),
        };

        debug!(
            reached = result.consensus_reached,
            strength = result.consensus_strength,
            agreement = result.agreement_score,
            groups = groups.len(),
            "Answers reconciled"
        );

        Reconciliation {
            result,
            dominant: members.iter().map(|&i| answers[i].rater_id).collect(),
        }
    }
}

fn pairwise(n: usize, sim: impl Fn(usize, usize) -> f64) -> Vec<Vec<f64>> {
    let mut matrix = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let s = sim(i, j);
            matrix[i][j] = s;
            matrix[j][i] = s;
        }
    }
    matrix
}

fn split_by_polarity(answers: &[RaterAnswer], similarity: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut masked = similarity.to_vec();
    for (i, row) in masked.iter_mut().enumerate() {
        for (j, s) in row.iter_mut().enumerate() {
            if answers[i].verdict.is_negative() != answers[j].verdict.is_negative() {
                *s = 0.0;
            }
        }
    }
    masked
}

/// Greedy grouping: each ungrouped answer seeds a group and absorbs every later
/// ungrouped answer whose similarity to the seed exceeds `threshold`.
fn group_answers(similarity: &[Vec<f64>], threshold: f64) -> Vec<Vec<usize>> {
    let n = similarity.len();
    let mut grouped = vec![false; n];
    let mut groups = Vec::new();

    for seed in 0..n {
        if grouped[seed] {
            continue;
        }
        grouped[seed] = true;
        let mut group = vec![seed];
        for other in (seed + 1)..n {
            if !grouped[other] && similarity[seed][other] > threshold {
                grouped[other] = true;
                group.push(other);
            }
        }
        groups.push(group);
    }
    groups
}

fn agreement_score(similarity: &[Vec<f64>]) -> f64 {
    let n = similarity.len();
    if n < 2 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += similarity[i][j];
            pairs += 1;
        }
    }
    sum / pairs as f64
}

fn disagreement_areas(answers: &[RaterAnswer]) -> Vec<DisagreementArea> {
    if answers.len() < 2 {
        return Vec::new();
    }

    let mut areas = Vec::new();
    let affirmative = answers.iter().any(|a| has_affirmative_marker(&a.answer));
    let negative = answers.iter().any(|a| has_negative_marker(&a.answer));
    if affirmative && negative {
        areas.push(DisagreementArea::ConflictingAssessment);
    }

    let mut numeric = answers
        .iter()
        .map(|a| numeric_literals(&a.answer))
        .filter(|set| !set.is_empty());
    if let Some(first) = numeric.next()
        && numeric.any(|set| set != first)
    {
        areas.push(DisagreementArea::NumericDivergence);
    }
    areas
}
