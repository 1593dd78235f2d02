use async_trait::async_trait;

use crate::UnitOfWorkResult;

/// Trait for components that need to be notified of unit-of-work lifecycle events.
///
/// Components implementing this trait can be registered with a unit of work
/// to receive callbacks once its work has been committed or discarded.
/// Repositories use this to update caches or drop buffered state.
#[async_trait]
pub trait TransactionAware: Send + Sync {
    /// Called after the unit of work saved its changes.
    async fn on_commit(&self) -> UnitOfWorkResult<()>;

    /// Called after the unit of work discarded its changes.
    ///
    /// Implementations should use this to revert any in-memory state changes
    /// that were made during the unit of work.
    async fn on_rollback(&self) -> UnitOfWorkResult<()>;
}
