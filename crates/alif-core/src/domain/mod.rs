pub mod errors;
pub mod grammar;
pub mod lemma;
pub mod memory_state;
pub mod review;
pub mod sentence;

pub use errors::{SchedulerError, Result};
pub use grammar::{GrammarExposure, GrammarFeature, GrammarFeatureId};
pub use lemma::{resolve_canonical, Lemma, LemmaId, Root, RootId};
pub use memory_state::{
    AcquisitionFields, Box3, FsrsPhase, KnowledgeState, LongTermCard, MemoryState, VariantStat,
};
pub use review::{
    CreditType, ReviewGrade, ReviewLog, ReviewLogId, SentenceReviewLog, SessionId,
};
pub use sentence::{
    null_comprehension_cooldown, Comprehension, Mode, Sentence, SentenceId, Token,
};
