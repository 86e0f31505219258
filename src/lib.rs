//! Named application contexts sharing one process.
//!
//! Each context has its own configuration namespace, route-name prefix and
//! middleware binding. [`ContextRegistry`] decides which of them applies to a
//! given route registration or config lookup; actual routing and settings
//! storage sit behind the [`Router`] and [`SettingsSource`] traits.

pub mod errors;
pub mod context;
pub mod declarations;
pub mod path;
pub mod registry;
pub mod router;
pub mod settings;

pub use context::{Options, DEFAULT_CONTEXT};
pub use declarations::ContextDeclarations;
pub use errors::{Result, SettingsError};
pub use path::ConfigKey;
pub use registry::{ContextGuard, ContextRegistry};
pub use router::{
    FsProbe, GroupAttributes, RecordedGroup, RecordingRouter, RouteCallback, RouteProbe, RouteSource, Router,
};
pub use settings::{MemorySettings, SettingsSource};
