mod config;
mod events;
mod reconnect;
mod replication;
#[cfg(feature = "native")]
pub mod runtime;
mod session_loop;

pub use config::SessionConfig;
pub use events::SessionEvent;
pub use reconnect::{ReconnectPolicy, ReconnectState};
pub use replication::{
    ClientMirror, MirroredStatus, ResyncTracker, SnapshotBroadcaster, StatusSource,
};
#[cfg(feature = "native")]
pub use runtime::{SessionDriver, SessionRuntime};
pub use session_loop::{ClientCommand, ClientSessionLoop, HostCommand, HostSessionLoop};
