//! Slot → surface mapping
//!
//! Which surface represents a roster slot changes whenever the group churns or
//! the rendering collaborator recycles widgets. The mapper rebuilds the whole
//! table on a throttle and heals itself when lookups miss.

mod mapper;


pub use mapper::{DisplayMapper, LookupMode, MappedSurface, NEAR_ZERO_ALPHA, prefers};
