pub mod cache;

pub use cache::{AuraKind, AuraStateCache, AuraStateEntry};
