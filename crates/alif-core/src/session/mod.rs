//! Session build pipeline (spec §4.4): Classify → Cohort → Auto-Introduce →
//! Candidate Fetch → Score+Cover → Acquisition Repetition → Order →
//! On-Demand Generation → Fill Phase → Response Assembly.
mod auto_intro;
mod builder;
mod candidates;
mod classify;
mod cohort;
mod cover;
mod ordering;
mod repetition;
mod response;
mod root_interference;
mod scoring;

pub use auto_intro::{AcquisitionOccupancy, AutoIntroOutcome, AutoIntroStage};
pub use builder::{BuildSessionRequest, SessionBuilder};
pub use classify::{classify, Classified};
pub use cohort::{build_cohort, due_lemma_ids};
pub use response::{BuildSessionResponse, IntroCandidate, SessionItem, TokenDescriptor};
pub use root_interference::RootInterferenceGuard;
pub use scoring::{Scored, ScoringContext};
