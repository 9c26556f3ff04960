use chrono::{DateTime, Utc};
use half::f16;
use serde::{Deserialize, Serialize};

use super::{FeedbackId, RaterId};
use crate::hashing::question_signature;

/// Servability state of a golden entry. Only `Approved` entries are ever served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    #[inline]
    pub fn is_servable(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }
}

/// Where a golden entry came from and who approved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_feedback: FeedbackId,
    pub approved_by: Option<RaterId>,
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
}

/// A rejected answer kept after its signature was offered again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRevision {
    pub answer: String,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
    pub revision: u64,
}

/// A vetted question → answer pair.
///
/// `revision` is the optimistic-concurrency token bumped by the store on every
/// status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenEntry {
    pub question: String,
    pub answer: String,
    #[serde(with = "signature_serde")]
    pub signature: [u8; 32],
    /// Question embedding, stored at half precision.
    pub embedding: Vec<f16>,
    pub status: ApprovalStatus,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub revision: u64,
    /// Earlier rejected answers for this signature, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_history: Vec<RejectedRevision>,
}

impl GoldenEntry {
    /// Creates a pending entry; the signature is derived from `question`.
    pub fn pending(
        question: impl Into<String>,
        answer: impl Into<String>,
        embedding: Vec<f16>,
        source_feedback: FeedbackId,
    ) -> Self {
        let question = question.into();
        Self {
            signature: question_signature(&question),
            question,
            answer: answer.into(),
            embedding,
            status: ApprovalStatus::Pending,
            provenance: Provenance {
                source_feedback,
                approved_by: None,
                approved_at: None,
                rejected_at: None,
            },
            created_at: Utc::now(),
            revision: 0,
            rejected_history: Vec::new(),
        }
    }

    pub fn approve(&mut self, approver: RaterId) {
        self.status = ApprovalStatus::Approved;
        self.provenance.approved_by = Some(approver);
        self.provenance.approved_at = Some(Utc::now());
    }

    pub fn reject(&mut self) {
        self.status = ApprovalStatus::Rejected;
        self.provenance.rejected_at = Some(Utc::now());
    }

    /// Starts a fresh pending entry on top of this rejected one, archiving the
    /// rejected answer. Returns `None` unless this entry is rejected.
    pub fn supersede_rejected(&self, replacement: GoldenEntry) -> Option<GoldenEntry> {
        if self.status != ApprovalStatus::Rejected {
            return None;
        }
        let mut history = self.rejected_history.clone();
        history.push(RejectedRevision {
            answer: self.answer.clone(),
            provenance: self.provenance.clone(),
            created_at: self.created_at,
            revision: self.revision,
        });
        Some(GoldenEntry {
            rejected_history: history,
            ..replacement
        })
    }

    #[inline]
    pub fn is_servable(&self) -> bool {
        self.status.is_servable()
    }
}

mod signature_serde {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::hashing::{signature_from_hex, signature_hex};

    pub fn serialize<S: Serializer>(sig: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&signature_hex(sig))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let hex = String::deserialize(d)?;
        signature_from_hex(&hex).ok_or_else(|| D::Error::custom("invalid signature hex"))
    }
}
