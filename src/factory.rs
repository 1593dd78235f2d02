use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    ContextUnitOfWork, DbContext, DependencyResolver, IsolationLevel, PgContext,
    TransactionOptions, UnitOfWork, UnitOfWorkError, UnitOfWorkResult,
};

/// Creates units of work.
///
/// Every call returns a new, independent unit of work owned by the caller.
pub trait UnitOfWorkFactory: Send + Sync {
    type UnitOfWork: UnitOfWork;

    /// Creates a unit of work with default parameters (transactions disabled).
    fn create(&self) -> Self::UnitOfWork {
        self.create_with_transactions(false)
    }

    /// Creates a unit of work with transactions enabled or disabled.
    fn create_with_transactions(&self, enable_transactions: bool) -> Self::UnitOfWork;

    /// Creates a transactional unit of work with the given isolation level and
    /// the environment's default timeout.
    fn create_with_isolation(&self, isolation_level: IsolationLevel) -> Self::UnitOfWork;

    /// Creates a transactional unit of work with the given isolation level and timeout.
    fn create_with_isolation_and_timeout(
        &self,
        isolation_level: IsolationLevel,
        timeout: Duration,
    ) -> Self::UnitOfWork;
}

/// [`UnitOfWorkFactory`] producing [`ContextUnitOfWork`]s over context type `C`.
pub struct ContextUnitOfWorkFactory<C: DbContext> {
    resolver: Arc<dyn DependencyResolver>,
    _context: PhantomData<fn() -> C>,
}

/// Factory for units of work over PostgreSQL.
pub type PostgresUnitOfWorkFactory = ContextUnitOfWorkFactory<PgContext>;

impl<C: DbContext> ContextUnitOfWorkFactory<C> {
    /// Creates a new factory handing `resolver` to every unit of work it creates.
    pub fn new(resolver: Arc<dyn DependencyResolver>) -> Self {
        Self {
            resolver,
            _context: PhantomData,
        }
    }

    /// Starts a builder that checks the resolver was supplied.
    pub fn builder() -> ContextUnitOfWorkFactoryBuilder<C> {
        ContextUnitOfWorkFactoryBuilder::default()
    }

    /// The resolver shared with created units of work.
    pub fn resolver(&self) -> &Arc<dyn DependencyResolver> {
        &self.resolver
    }
}

impl<C: DbContext> Clone for ContextUnitOfWorkFactory<C> {
    fn clone(&self) -> Self {
        Self::new(self.resolver.clone())
    }
}

impl<C: DbContext> fmt::Debug for ContextUnitOfWorkFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextUnitOfWorkFactory")
            .field("context", &std::any::type_name::<C>())
            .finish_non_exhaustive()
    }
}

impl<C: DbContext> UnitOfWorkFactory for ContextUnitOfWorkFactory<C> {
    type UnitOfWork = ContextUnitOfWork<C>;

    fn create_with_transactions(&self, enable_transactions: bool) -> Self::UnitOfWork {
        tracing::debug!(enable_transactions, "creating unit of work");
        ContextUnitOfWork::with_transactions(self.resolver.clone(), enable_transactions)
    }

    fn create_with_isolation(&self, isolation_level: IsolationLevel) -> Self::UnitOfWork {
        tracing::debug!(?isolation_level, "creating transactional unit of work");
        let options = TransactionOptions::new(isolation_level);
        ContextUnitOfWork::with_options(self.resolver.clone(), options)
    }

    fn create_with_isolation_and_timeout(
        &self,
        isolation_level: IsolationLevel,
        timeout: Duration,
    ) -> Self::UnitOfWork {
        tracing::debug!(?isolation_level, ?timeout, "creating transactional unit of work");
        let options = TransactionOptions::new(isolation_level).with_timeout(timeout);
        ContextUnitOfWork::with_options(self.resolver.clone(), options)
    }
}

/// Builder for [`ContextUnitOfWorkFactory`] that rejects a missing resolver.
pub struct ContextUnitOfWorkFactoryBuilder<C: DbContext> {
    resolver: Option<Arc<dyn DependencyResolver>>,
    _context: PhantomData<fn() -> C>,
}

impl<C: DbContext> Default for ContextUnitOfWorkFactoryBuilder<C> {
    fn default() -> Self {
        Self {
            resolver: None,
            _context: PhantomData,
        }
    }
}

impl<C: DbContext> ContextUnitOfWorkFactoryBuilder<C> {
    /// Sets the dependency resolver.
    pub fn resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Builds the factory, failing with `InvalidArgument` without a resolver.
    pub fn build(self) -> UnitOfWorkResult<ContextUnitOfWorkFactory<C>> {
        let resolver = self
            .resolver
            .ok_or(UnitOfWorkError::InvalidArgument("dependency resolver"))?;
        Ok(ContextUnitOfWorkFactory::new(resolver))
    }
}
