use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lemma::LemmaId;
use super::memory_state::MemoryState;
use super::sentence::{Comprehension, Mode, SentenceId};

pub type SessionId = i64;
pub type ReviewLogId = i64;

/// Per-word rating, 1-4 (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReviewGrade {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl ReviewGrade {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self.value() >= 3
    }

    pub fn is_failure(self) -> bool {
        self.value() <= 2
    }
}

impl TryFrom<u8> for ReviewGrade {
    type Error = super::errors::SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            other => Err(super::errors::SchedulerError::Validation(format!(
                "invalid review grade: {other}"
            ))),
        }
    }
}

/// Whether a word's rating came from the sentence's primary target or was
/// derived collaterally from the same aggregate signal (spec §3). Recorded
/// but never consulted by scheduling logic — metadata only (spec §9 Open
/// Question 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    Primary,
    Collateral,
}

/// Per-word review log entry (spec §3). Carries a pre-review snapshot
/// sufficient to undo the review without reconstructing it algebraically
/// (spec §9 "Snapshots for undo").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub id: ReviewLogId,
    pub client_review_id: String,
    pub lemma_id: LemmaId,
    pub rating: ReviewGrade,
    pub sentence_id: SentenceId,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub response_ms: u32,
    pub credit_type: CreditType,
    pub pre_review_snapshot: MemoryState,
}

/// Per-submission sentence-level log entry (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceReviewLog {
    pub sentence_id: SentenceId,
    pub session_id: SessionId,
    pub mode: Mode,
    pub comprehension: Comprehension,
    pub response_ms: u32,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_success_boundary() {
        assert!(ReviewGrade::Good.is_success());
        assert!(ReviewGrade::Easy.is_success());
        assert!(ReviewGrade::Hard.is_failure());
        assert!(ReviewGrade::Again.is_failure());
    }

    #[test]
    fn grade_from_u8_rejects_out_of_range() {
        assert!(ReviewGrade::try_from(0).is_err());
        assert!(ReviewGrade::try_from(5).is_err());
        assert!(ReviewGrade::try_from(3).is_ok());
    }
}
