//! Passive capture of foreign-rendered aura state
//!
//! The foreign subsystem already does the restricted work of deciding which
//! auras to draw. After each of its refresh passes we read back which child
//! widgets it left shown and classify them into the [`AuraStateCache`].
//!
//! [`AuraStateCache`]: crate::state::AuraStateCache

mod hook;

#[cfg(test)]
mod capture_tests;

pub use hook::{CaptureOutcome, ScanReport, capture_all, capture_frame};
