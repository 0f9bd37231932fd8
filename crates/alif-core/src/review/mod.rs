//! Per-word review routing, leech detection and undo (spec §4.5, §4.6).
mod engine;
mod leech;

pub use engine::{ReviewSubmissionEngine, SubmitReviewRequest, SubmitReviewResponse, WordResult};
pub use leech::LeechManager;
