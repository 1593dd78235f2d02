use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use postgres_unit_of_work_factory::{
    DbContext, DependencyResolver, UnitOfWorkError, UnitOfWorkResult, UnitOfWorkSettings,
};

/// Lifecycle event seen by a recording context
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    Opened(UnitOfWorkSettings),
    Saved,
    Discarded,
}

/// Shared event log, resolved by every recording context when it opens
#[derive(Default)]
pub struct ContextLog {
    events: Mutex<Vec<ContextEvent>>,
}

impl ContextLog {
    pub fn events(&self) -> Vec<ContextEvent> {
        self.events.lock().clone()
    }

    fn push(&self, event: ContextEvent) {
        self.events.lock().push(event);
    }
}

/// In-memory context that records what the unit of work asks of it
#[derive(Default)]
pub struct RecordingContext {
    log: Mutex<Option<Arc<ContextLog>>>,
}

impl RecordingContext {
    fn take_log(&self) -> UnitOfWorkResult<Arc<ContextLog>> {
        self.log.lock().take().ok_or(UnitOfWorkError::ContextClosed)
    }
}

#[async_trait]
impl DbContext for RecordingContext {
    async fn open(
        &self,
        resolver: &dyn DependencyResolver,
        settings: &UnitOfWorkSettings,
    ) -> UnitOfWorkResult<()> {
        let log = resolver.require::<ContextLog>()?;
        log.push(ContextEvent::Opened(*settings));
        *self.log.lock() = Some(log);
        Ok(())
    }

    async fn save_changes(&self) -> UnitOfWorkResult<()> {
        self.take_log()?.push(ContextEvent::Saved);
        Ok(())
    }

    async fn discard(&self) -> UnitOfWorkResult<()> {
        self.take_log()?.push(ContextEvent::Discarded);
        Ok(())
    }
}
