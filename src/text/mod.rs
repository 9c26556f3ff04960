//! Lexical text utilities: tokenization, token-set similarity, TF-IDF key phrases,
//! numeric literal extraction and assessment markers.


use std::collections::{BTreeSet, HashMap, HashSet};

/// Lower-cased tokens of `text`, with punctuation trimmed from token edges.
///
/// Inner punctuation is kept so `5.5` and `don't` stay single tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distinct tokens of `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Jaccard overlap `|a ∩ b| / |a ∪ b|` of two token sets.
///
/// Two empty sets are identical (1.0); one empty set shares nothing (0.0).
pub fn jaccard_sets<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Token-set Jaccard similarity of two texts.
#[inline]
pub fn jaccard(a: &str, b: &str) -> f64 {
    jaccard_sets(&token_set(a), &token_set(b))
}

/// Tokens worth keeping as keywords: longer than two characters, not numeric, not a
/// stop word.
pub fn content_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > 2)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !is_stop_word(w))
        .collect()
}

/// Scores terms across `documents` by TF-IDF and returns the top `limit`, best first.
///
/// Ties are broken alphabetically so the output is stable.
pub fn extract_key_phrases(documents: &[String], limit: usize) -> Vec<(String, f64)> {
    if documents.is_empty() || limit == 0 {
        return Vec::new();
    }

    let n_docs = documents.len() as f64;
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| content_terms(d)).collect();

    let mut df: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokenized {
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for term in unique {
            *df.entry(term).or_insert(0) += 1;
        }
    }

    let mut tf: HashMap<&str, usize> = HashMap::new();
    let mut total_terms = 0usize;
    for token in tokenized.iter().flatten() {
        *tf.entry(token.as_str()).or_insert(0) += 1;
        total_terms += 1;
    }

    if total_terms == 0 {
        return Vec::new();
    }

    let mut scores: Vec<(String, f64)> = tf
        .iter()
        .filter_map(|(term, &count)| {
            let doc_freq = *df.get(term)? as f64;
            let term_freq = count as f64 / total_terms as f64;
            let idf = (n_docs / doc_freq).ln() + 1.0;
            Some((term.to_string(), term_freq * idf))
        })
        .collect();

    scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scores.truncate(limit);
    scores
}

/// Numeric literals in `text`, normalized (`1,000.50` and `1000.5` are the same).
pub fn numeric_literals(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let cleaned: String = current
            .trim_end_matches(['.', ','])
            .chars()
            .filter(|c| *c != ',')
            .collect();
        if let Ok(value) = cleaned.parse::<f64>() {
            out.insert(format!("{}", value));
        }
        current.clear();
    };

    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let joins_digits = (c == '.' || c == ',')
            && !current.is_empty()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if c.is_ascii_digit() || joins_digits {
            current.push(c);
        } else if !current.is_empty() {
            flush(&mut current);
        }
    }
    if !current.is_empty() {
        flush(&mut current);
    }
    out
}

const AFFIRMATIVE_MARKERS: &[&str] = &[
    "yes",
    "correct",
    "right",
    "true",
    "accurate",
    "valid",
    "agree",
    "confirmed",
    "eligible",
    "allowed",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "no",
    "not",
    "incorrect",
    "wrong",
    "false",
    "inaccurate",
    "invalid",
    "disagree",
    "never",
    "ineligible",
    "cannot",
    "isn't",
    "doesn't",
];

/// `true` when `text` contains an affirmative assessment word.
pub fn has_affirmative_marker(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|t| AFFIRMATIVE_MARKERS.contains(&t.as_str()))
}

/// `true` when `text` contains a negating assessment word.
pub fn has_negative_marker(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|t| NEGATIVE_MARKERS.contains(&t.as_str()))
}

fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "the"
            | "and"
            | "for"
            | "are"
            | "but"
            | "not"
            | "you"
            | "all"
            | "can"
            | "had"
            | "her"
            | "was"
            | "one"
            | "our"
            | "out"
            | "has"
            | "have"
            | "been"
            | "from"
            | "this"
            | "that"
            | "with"
            | "they"
            | "will"
            | "each"
            | "which"
            | "their"
            | "said"
            | "what"
            | "its"
            | "into"
            | "more"
            | "other"
            | "should"
            | "would"
            | "answer"
            | "uses"
            | "used"
    )
}
