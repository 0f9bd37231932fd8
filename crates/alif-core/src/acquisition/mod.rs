mod scheduler;

pub use scheduler::{AcquisitionOutcome, AcquisitionScheduler};
