mod scheduler;

pub use scheduler::LongTermScheduler;
