use async_trait::async_trait;

use crate::{DependencyResolver, UnitOfWorkResult, UnitOfWorkSettings};

/// A database session wrapped by a unit of work.
///
/// Contexts are built with `Default` and stay inert until [`open`](DbContext::open)
/// binds them to the services exposed by the resolver. Everything a context
/// does after that (connections, transactions, isolation) is its own business;
/// the unit of work only forwards the settings it was created with.
#[async_trait]
pub trait DbContext: Default + Send + Sync + 'static {
    /// Opens the context. When `settings` enables transactions, all work done
    /// through the context until [`save_changes`](DbContext::save_changes) or
    /// [`discard`](DbContext::discard) belongs to one transaction.
    async fn open(
        &self,
        resolver: &dyn DependencyResolver,
        settings: &UnitOfWorkSettings,
    ) -> UnitOfWorkResult<()>;

    /// Makes the context's work durable and closes it.
    async fn save_changes(&self) -> UnitOfWorkResult<()>;

    /// Throws the context's work away and closes it.
    async fn discard(&self) -> UnitOfWorkResult<()>;
}
