//! Workspace facade crate.
//!
//! This crate exists to expose the workspace members behind a single
//! dependency. Host applications can depend on `samplepool-workspace` and
//! reach the playback core and the bridge traits without wiring each crate
//! individually. The `mocks` feature forwards to `bridge-traits/mock` for
//! host-side testing.

pub use bridge_traits as bridge;
pub use core_playback as playback;
