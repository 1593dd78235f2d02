use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::{
    DbContext, DependencyResolver, TransactionAware, TransactionOptions, UnitOfWorkResult,
    UnitOfWorkSettings,
};

/// Unit of Work pattern for coordinating a set of changes.
///
/// All work done through a unit of work is saved together by
/// [`commit`](UnitOfWork::commit) or thrown away by [`rollback`](UnitOfWork::rollback).
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Settings the unit of work was created with.
    fn settings(&self) -> &UnitOfWorkSettings;

    /// Register a component that needs to be notified of commit or rollback.
    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>);

    /// Save all changes and notify all registered observers.
    async fn commit(self) -> UnitOfWorkResult<()>;

    /// Discard all changes and notify all registered observers.
    async fn rollback(self) -> UnitOfWorkResult<()>;
}

/// Unit of work bound to a database context of type `C`.
///
/// Creating one does no I/O: the context is built with `C::default()` and
/// opened on first access through [`context`](ContextUnitOfWork::context).
/// Dropping an uncommitted unit of work discards its work.
pub struct ContextUnitOfWork<C: DbContext> {
    resolver: Arc<dyn DependencyResolver>,
    settings: UnitOfWorkSettings,
    context: C,
    opened: OnceCell<()>,
    observers: Arc<RwLock<Vec<Arc<dyn TransactionAware>>>>,
}

impl<C: DbContext> ContextUnitOfWork<C> {
    /// Unit of work with transactions disabled.
    pub fn new(resolver: Arc<dyn DependencyResolver>) -> Self {
        Self::with_settings(resolver, UnitOfWorkSettings::default())
    }

    /// Unit of work with transactions enabled or disabled, using the context's
    /// default isolation level.
    pub fn with_transactions(resolver: Arc<dyn DependencyResolver>, enable_transactions: bool) -> Self {
        Self::with_settings(resolver, UnitOfWorkSettings::new(enable_transactions))
    }

    /// Transactional unit of work configured by `options`.
    pub fn with_options(resolver: Arc<dyn DependencyResolver>, options: TransactionOptions) -> Self {
        Self::with_settings(resolver, UnitOfWorkSettings::with_options(options))
    }

    fn with_settings(resolver: Arc<dyn DependencyResolver>, settings: UnitOfWorkSettings) -> Self {
        Self {
            resolver,
            settings,
            context: C::default(),
            opened: OnceCell::new(),
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The context, opened on first call.
    pub async fn context(&self) -> UnitOfWorkResult<&C> {
        self.opened
            .get_or_try_init(|| self.context.open(self.resolver.as_ref(), &self.settings))
            .await?;
        Ok(&self.context)
    }

    /// Whether the context has been opened.
    pub fn is_opened(&self) -> bool {
        self.opened.initialized()
    }

    /// The resolver this unit of work was created with.
    pub fn resolver(&self) -> &Arc<dyn DependencyResolver> {
        &self.resolver
    }

    /// Looks up a collaborating service through the resolver.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.resolver.resolve::<T>()
    }

    /// Like [`resolve`](Self::resolve) but fails when the service is missing.
    pub fn require<T: Any + Send + Sync>(&self) -> UnitOfWorkResult<Arc<T>> {
        self.resolver.require::<T>()
    }
}

impl<C: DbContext> fmt::Debug for ContextUnitOfWork<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextUnitOfWork")
            .field("context", &std::any::type_name::<C>())
            .field("settings", &self.settings)
            .field("opened", &self.is_opened())
            .finish()
    }
}

#[async_trait]
impl<C: DbContext> UnitOfWork for ContextUnitOfWork<C> {
    fn settings(&self) -> &UnitOfWorkSettings {
        &self.settings
    }

    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>) {
        self.observers.write().push(observer);
    }

    async fn commit(self) -> UnitOfWorkResult<()> {
        // Nothing to save if the context was never opened
        if self.is_opened() {
            self.context.save_changes().await?;
        }

        // Notify observers after successful commit
        let observers = self.observers.read().clone();
        for observer in observers.iter() {
            observer.on_commit().await?;
        }
        Ok(())
    }

    async fn rollback(self) -> UnitOfWorkResult<()> {
        if self.is_opened() {
            self.context.discard().await?;
        }

        // Notify observers after successful rollback
        let observers = self.observers.read().clone();
        for observer in observers.iter() {
            observer.on_rollback().await?;
        }
        Ok(())
    }
}
