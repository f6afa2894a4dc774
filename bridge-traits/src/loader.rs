//! Sample loading bridge trait.
//!
//! Hosts own the actual decoding and memory for sample data; the core only
//! tracks which resources are resident via the opaque handles returned here.

use crate::error::Result;
use crate::ids::{ResourceId, SampleHandle};

/// Trait for host components that decode a named resource into an in-memory
/// sample the audio engine can play.
///
/// Implementations must be safe to call from concurrent tasks. A `load` that
/// fails must leave no resident sample behind.
#[async_trait::async_trait]
pub trait SampleLoader: Send + Sync {
    /// Decode the resource and return a handle to the resident sample.
    async fn load(&self, id: &ResourceId) -> Result<SampleHandle>;

    /// Free the sample identified by `handle`. Unloading a handle twice is
    /// an error the host may report or ignore.
    async fn unload(&self, handle: SampleHandle) -> Result<()>;
}
