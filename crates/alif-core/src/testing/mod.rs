//! Test utilities and fixtures.
//!
//! This module provides:
//! - Re-exports of mockall-generated port mocks
//! - Reusable test fixtures (lemmas, sentences, memory states)

pub mod fixtures;

pub use crate::ports::{MockLemmaRepository, MockMemoryStore, MockSentenceGenerator, MockSentencePool};
