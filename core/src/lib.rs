pub mod access;
pub mod capture;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod host;
pub mod mapping;
pub mod render;
pub mod scheduler;
pub mod sim;
pub mod state;
pub mod suppress;

#[cfg(test)]
mod engine_tests;

// Re-exports for convenience
pub use access::{AuraApi, AuraFilter, AuraPayload, Capabilities, Fault, InstanceId, RawAura, RawValue, SafeAccess};
pub use capture::{CaptureOutcome, ScanReport};
pub use context::{ConfigError, ConfyProfileStore, MemoryProfileStore, ProfileStore};
pub use dispatch::{DispatchOutcome, EventListener, GameEvent, ListenerError, UnitEventKind};
pub use engine::{AuraEngine, EngineStatus};
pub use host::{
    Clock, EntityId, ForeignEvent, ForeignFrameId, ForeignUi, Host, IndicatorSink, RefreshRequest,
    RenderingCollaborator, SurfaceId, SurfaceState, TrackerIcon, WorldApi,
};
pub use state::{AuraKind, AuraStateCache, AuraStateEntry};
