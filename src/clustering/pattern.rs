//! Pattern synthesis, merging and impact scoring.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::constants::{MAX_PATTERN_EXAMPLES, MAX_SNIPPET_CHARS};
use crate::model::{FailureCategory, FailurePattern, PatternId, PatternType, snippet};
use crate::text::{extract_key_phrases, jaccard, jaccard_sets, token_set};

/// Keywords kept per pattern.
const PATTERN_KEYWORDS: usize = 5;

/// A categorised failure report ready for pattern synthesis.
#[derive(Debug, Clone)]
pub struct FailureSample {
    pub text: String,
    pub category: FailureCategory,
    /// How sure the categorisation is, in `[0, 1]`.
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// `min(frequency / 20, 0.5) × confidence × multiplier`.
pub fn impact_score(frequency: u64, confidence: f64, pattern_type: PatternType) -> f64 {
    (frequency as f64 / 20.0).min(0.5) * confidence * pattern_type.impact_multiplier()
}

/// `min(size / 10, 1)`.
pub fn size_confidence(size: u64) -> f64 {
    (size as f64 / 10.0).min(1.0)
}

/// Index of the member sharing the most tokens with the rest of the group.
/// Ties go to the earliest member.
pub fn representative(texts: &[&str]) -> Option<usize> {
    let sets: Vec<HashSet<String>> = texts.iter().map(|t| token_set(t)).collect();
    let mut best: Option<(usize, usize)> = None;
    for (i, own) in sets.iter().enumerate() {
        let shared: usize = sets
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| own.intersection(other).count())
            .sum();
        if best.is_none_or(|(_, s)| shared > s) {
            best = Some((i, shared));
        }
    }
    best.map(|(i, _)| i)
}

/// Category holding more than half of the members' categorisation confidence.
///
/// A member counts with its categorisation confidence, so a few confident reports
/// outweigh many weak keyword matches.
pub fn weighted_majority(members: &[&FailureSample]) -> Option<FailureCategory> {
    let mut weights: HashMap<FailureCategory, f64> = HashMap::new();
    let mut total = 0.0;
    for m in members {
        let w = if m.confidence.is_finite() { m.confidence.clamp(0.0, 1.0) } else { 0.0 };
        *weights.entry(m.category).or_default() += w;
        total += w;
    }
    if total <= 0.0 {
        return None;
    }
    FailureCategory::ALL
        .into_iter()
        .find(|c| weights.get(c).is_some_and(|&w| w * 2.0 > total))
}

/// Builds a pattern from a semantic cluster.
///
/// The pattern type follows the cluster's confidence-weighted majority category;
/// a cluster with no majority is a [`PatternType::SemanticCluster`].
pub fn from_cluster(members: &[&FailureSample]) -> Option<FailurePattern> {
    let texts: Vec<&str> = members.iter().map(|m| m.text.as_str()).collect();
    let rep = representative(&texts)?;

    let majority = weighted_majority(members);
    let pattern_type = PatternType::for_category(majority);

    let docs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let keywords: Vec<String> = extract_key_phrases(&docs, PATTERN_KEYWORDS)
        .into_iter()
        .map(|(term, _)| term)
        .collect();

    let label = majority.map_or("mixed", |c| c.as_str());
    let name = if keywords.is_empty() {
        format!("{}: {}", label, snippet(texts[rep], 40))
    } else {
        format!("{}: {}", label, keywords.join(", "))
    };

    let mut examples = vec![snippet(texts[rep], MAX_SNIPPET_CHARS)];
    for (i, text) in texts.iter().enumerate() {
        if examples.len() >= MAX_PATTERN_EXAMPLES {
            break;
        }
        let s = snippet(text, MAX_SNIPPET_CHARS);
        if i != rep && !examples.contains(&s) {
            examples.push(s);
        }
    }

    let categories: BTreeSet<FailureCategory> = members.iter().map(|m| m.category).collect();
    Some(build(
        name,
        pattern_type,
        categories.into_iter().collect(),
        members,
        examples,
        keywords,
    ))
}

/// Builds a pattern for a recurring category.
///
/// Categories with a dedicated pattern type keep its multiplier and action; the
/// rest are [`PatternType::Category`].
pub fn from_category(
    category: FailureCategory,
    members: &[&FailureSample],
) -> Option<FailurePattern> {
    if members.is_empty() {
        return None;
    }
    let docs: Vec<String> = members.iter().map(|m| m.text.clone()).collect();
    let keywords: Vec<String> = extract_key_phrases(&docs, PATTERN_KEYWORDS)
        .into_iter()
        .map(|(term, _)| term)
        .collect();
    let examples: Vec<String> = members
        .iter()
        .map(|m| snippet(&m.text, MAX_SNIPPET_CHARS))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_PATTERN_EXAMPLES)
        .collect();

    let pattern_type = match PatternType::for_category(Some(category)) {
        PatternType::SemanticCluster => PatternType::Category,
        dedicated => dedicated,
    };

    Some(build(
        format!("category: {}", category.as_str()),
        pattern_type,
        vec![category],
        members,
        examples,
        keywords,
    ))
}

fn build(
    name: String,
    pattern_type: PatternType,
    categories: Vec<FailureCategory>,
    members: &[&FailureSample],
    examples: Vec<String>,
    keywords: Vec<String>,
) -> FailurePattern {
    let frequency = members.len() as u64;
    let confidence = size_confidence(frequency);
    let now = Utc::now();
    FailurePattern {
        id: PatternId::new(),
        name,
        pattern_type,
        categories,
        frequency,
        impact_score: impact_score(frequency, confidence, pattern_type),
        confidence,
        examples,
        keywords,
        first_seen: members.iter().map(|m| m.created_at).min().unwrap_or(now),
        last_seen: members.iter().map(|m| m.created_at).max().unwrap_or(now),
        resolved: false,
    }
}

/// `0.6 × name-token Jaccard + 0.4 × category-set Jaccard`.
pub fn merge_similarity(a: &FailurePattern, b: &FailurePattern) -> f64 {
    let categories = |p: &FailurePattern| p.categories.iter().copied().collect::<HashSet<_>>();
    0.6 * jaccard(&a.name, &b.name) + 0.4 * jaccard_sets(&categories(a), &categories(b))
}

/// Folds `incoming` into `existing`: counts add up, evidence is unioned within
/// bounds, and confidence and impact are recomputed.
pub fn merge_into(existing: &mut FailurePattern, incoming: &FailurePattern) {
    existing.frequency += incoming.frequency;
    existing.first_seen = existing.first_seen.min(incoming.first_seen);
    existing.last_seen = existing.last_seen.max(incoming.last_seen);

    for category in &incoming.categories {
        if !existing.categories.contains(category) {
            existing.categories.push(*category);
        }
    }
    existing.categories.sort();

    for example in &incoming.examples {
        if existing.examples.len() >= MAX_PATTERN_EXAMPLES {
            break;
        }
        if !existing.examples.contains(example) {
            existing.examples.push(example.clone());
        }
    }
    for keyword in &incoming.keywords {
        if existing.keywords.len() >= PATTERN_KEYWORDS {
            break;
        }
        if !existing.keywords.contains(keyword) {
            existing.keywords.push(keyword.clone());
        }
    }

    existing.confidence = size_confidence(existing.frequency);
    existing.impact_score =
        impact_score(existing.frequency, existing.confidence, existing.pattern_type);
    existing.resolved = false;
}
