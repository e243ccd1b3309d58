//! Optional lifecycle hooks for container-managed components
//!
//! Components that need orchestrated start-up or tear-down implement
//! [`Lifecycle`]; the container awaits `initialize` in dependency order and
//! `shutdown` in reverse. Both hooks default to no-ops so implementors pick
//! only the phases they care about.

use async_trait::async_trait;
use trellis_core::CoreResult;

/// Asynchronous lifecycle hooks invoked by the container
///
/// `initialize` runs once per instance: during container start-up for
/// components constructed then, or inline at first resolution when the
/// container is already initialized. `shutdown` runs in reverse resolution
/// order; its errors are contained by the container rather than propagated.
///
/// # Examples
///
/// ```rust
/// use trellis_container::Lifecycle;
/// use trellis_core::CoreResult;
///
/// struct ConnectionPool;
///
/// #[async_trait::async_trait]
/// impl Lifecycle for ConnectionPool {
///     async fn initialize(&self) -> CoreResult<()> {
///         // open connections, fail with a ModuleError on trouble
///         Ok(())
///     }
///
///     async fn shutdown(&self) -> CoreResult<()> {
///         // drain and close
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Called once after the instance is constructed
    async fn initialize(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Called during container shutdown
    async fn shutdown(&self) -> CoreResult<()> {
        Ok(())
    }
}
