pub mod acquisition;
pub mod config;
pub mod domain;
pub mod long_term;
pub mod ports;
pub mod review;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use acquisition::{AcquisitionOutcome, AcquisitionScheduler};
pub use config::{AutoIntroBands, Config};
pub use long_term::LongTermScheduler;
pub use review::{LeechManager, ReviewSubmissionEngine, SubmitReviewRequest, SubmitReviewResponse, WordResult};
pub use session::{
    AcquisitionOccupancy, AutoIntroOutcome, AutoIntroStage, BuildSessionRequest, BuildSessionResponse,
    Classified, IntroCandidate, RootInterferenceGuard, Scored, ScoringContext, SessionBuilder, SessionItem,
    TokenDescriptor,
};

pub use domain::{
    AcquisitionFields, Box3, Comprehension, CreditType, FsrsPhase, GrammarExposure, GrammarFeature,
    GrammarFeatureId, KnowledgeState, Lemma, LemmaId, LongTermCard, MemoryState, Mode, ReviewGrade,
    ReviewLog, ReviewLogId, Root, RootId, SchedulerError, Sentence, SentenceId, SentenceReviewLog,
    SessionId, Token, VariantStat,
};
