//! Indicator rendering
//!
//! Decides which tracker icons and which dispel overlay a surface shows.
//! Drawing is left to the [`IndicatorSink`](crate::host::IndicatorSink).

mod dispel;
mod icon_cache;
mod indicators;

#[cfg(test)]
mod render_tests;

pub use dispel::{CLASS_DISPELS, dispel_overlay, dispellable_by};
pub use icon_cache::IconCache;
pub use indicators::IndicatorRenderer;
