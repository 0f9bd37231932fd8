pub mod lemma_repository;
pub mod memory_store;
pub mod sentence_generator;
pub mod sentence_pool;

pub use lemma_repository::LemmaRepository;
pub use memory_store::{MemoryStore, ReviewWrite};
pub use sentence_generator::{difficulty_for_maturity, DifficultyHint, GenerationConstraints, SentenceGenerator};
pub use sentence_pool::SentencePool;

#[cfg(any(test, feature = "testing"))]
pub use lemma_repository::MockLemmaRepository;
#[cfg(any(test, feature = "testing"))]
pub use memory_store::MockMemoryStore;
#[cfg(any(test, feature = "testing"))]
pub use sentence_generator::MockSentenceGenerator;
#[cfg(any(test, feature = "testing"))]
pub use sentence_pool::MockSentencePool;
