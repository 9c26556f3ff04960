//! Question signatures.
//!
//! A signature is the BLAKE3 hash of the normalized question text: lower-cased,
//! trimmed, with every run of whitespace collapsed to a single space. Two questions
//! that differ only in case or spacing share a signature.

/// Normalizes question text for signature computation.
pub fn normalize_question(question: &str) -> String {
    let mut out = String::with_capacity(question.len());
    for word in question.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars() {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Computes the 32-byte signature of a question.
#[inline]
pub fn question_signature(question: &str) -> [u8; 32] {
    *blake3::hash(normalize_question(question).as_bytes()).as_bytes()
}

/// Hex-encodes a signature (used in logs and serialized records).
pub fn signature_hex(signature: &[u8; 32]) -> String {
    blake3::Hash::from_bytes(*signature).to_hex().to_string()
}

/// Parses a hex-encoded signature.
pub fn signature_from_hex(hex: &str) -> Option<[u8; 32]> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}

/// Computes a 64-bit hash of the input using BLAKE3, truncated from 256 bits.
///
/// Used for bucketing terms in the lexical embedding space, where a collision only
/// merges two vocabulary terms into one dimension.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_question("  What IS\tthe   VAT rate?\n"),
            "what is the vat rate?"
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_question("   \n\t "), "");
    }

    #[test]
    fn test_signature_determinism() {
        let q = "What is the standard deduction for 2024?";
        assert_eq!(question_signature(q), question_signature(q));
    }

    #[test]
    fn test_signature_ignores_case_and_spacing() {
        let a = question_signature("What is the standard deduction?");
        let b = question_signature("what  is the STANDARD\ndeduction?");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_distinguishes_wording() {
        let questions = [
            "What is the standard deduction?",
            "What is the standard deduction for seniors?",
            "What was the standard deduction?",
        ];
        let sigs: HashSet<_> = questions.iter().map(|q| question_signature(q)).collect();
        assert_eq!(sigs.len(), questions.len());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let sig = question_signature("overtime rules");
        let hex = signature_hex(&sig);
        assert_eq!(hex.len(), 64);
        assert_eq!(signature_from_hex(&hex), Some(sig));
        assert_eq!(signature_from_hex("not-hex"), None);
    }

    #[test]
    fn test_hash_to_u64_determinism() {
        assert_eq!(hash_to_u64(b"term"), hash_to_u64(b"term"));
        assert_ne!(hash_to_u64(b"term"), hash_to_u64(b"terms"));
    }
}
