use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use std::time::{Duration, Instant};

use crate::executor::Connection;
use crate::{
    DbContext, DependencyResolver, Executor, IsolationLevel, TransactionDefaults,
    TransactionOptions, UnitOfWorkError, UnitOfWorkResult, UnitOfWorkSettings,
};

/// PostgreSQL context.
///
/// Resolves a [`PgPool`] when opened. Non-transactional contexts hold one
/// pooled connection in autocommit mode; transactional contexts hold a
/// transaction begun with the requested isolation level and timeout.
#[derive(Default)]
pub struct PgContext {
    state: Mutex<Option<OpenContext>>,
}

struct OpenContext {
    executor: Executor,
    deadline: Option<Deadline>,
}

#[derive(Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl PgContext {
    /// Executor for repositories working through this context.
    pub fn executor(&self) -> UnitOfWorkResult<Executor> {
        self.state
            .lock()
            .as_ref()
            .map(|open| open.executor.clone())
            .ok_or(UnitOfWorkError::ContextClosed)
    }

    /// Whether the context currently holds a connection.
    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }
}

/// `SET TRANSACTION` keyword for `level`, `None` to keep the server default.
pub fn isolation_level_sql(level: IsolationLevel) -> UnitOfWorkResult<Option<&'static str>> {
    match level {
        IsolationLevel::Serializable => Ok(Some("SERIALIZABLE")),
        IsolationLevel::RepeatableRead | IsolationLevel::Snapshot => Ok(Some("REPEATABLE READ")),
        IsolationLevel::ReadCommitted => Ok(Some("READ COMMITTED")),
        IsolationLevel::ReadUncommitted => Ok(Some("READ UNCOMMITTED")),
        IsolationLevel::Unspecified => Ok(None),
        IsolationLevel::Chaos => Err(UnitOfWorkError::UnsupportedIsolationLevel(level)),
    }
}

/// `statement_timeout` in milliseconds for `timeout`.
///
/// PostgreSQL reads 0 as "no limit" and rejects values past `i32::MAX`, so the
/// result is kept within `1..=i32::MAX`.
pub fn statement_timeout_ms(timeout: Duration) -> u32 {
    timeout.as_millis().clamp(1, i32::MAX as u128) as u32
}

#[async_trait]
impl DbContext for PgContext {
    async fn open(
        &self,
        resolver: &dyn DependencyResolver,
        settings: &UnitOfWorkSettings,
    ) -> UnitOfWorkResult<()> {
        if self.is_open() {
            return Err(UnitOfWorkError::ContextAlreadyOpen);
        }

        let pool = resolver.require::<PgPool>()?;

        let opened = if settings.transactions_enabled() {
            let defaults = resolver
                .resolve::<TransactionDefaults>()
                .map(|defaults| *defaults)
                .unwrap_or_default();
            let options = settings
                .transaction_options()
                .copied()
                .unwrap_or_else(|| TransactionOptions::new(IsolationLevel::Unspecified));
            let isolation = isolation_level_sql(options.isolation_level)?;
            let timeout = options.effective_timeout(&defaults);

            let started = Instant::now();
            let mut tx = pool.begin().await?;

            if let Some(isolation) = isolation {
                let sql = format!("SET TRANSACTION ISOLATION LEVEL {isolation}");
                sqlx::query(&sql).execute(&mut *tx).await?;
            }
            let timeout_ms = statement_timeout_ms(timeout);
            let sql = format!("SET LOCAL statement_timeout = {timeout_ms}");
            sqlx::query(&sql).execute(&mut *tx).await?;

            tracing::debug!(
                isolation_level = ?options.isolation_level,
                timeout_ms,
                "opened transactional postgres context"
            );

            // An uncapped timeout has no deadline
            let deadline = started
                .checked_add(timeout)
                .map(|at| Deadline { at, timeout });

            OpenContext {
                executor: Executor::new(Connection::Transaction(tx)),
                deadline,
            }
        } else {
            let conn = pool.acquire().await?;
            tracing::debug!("opened autocommit postgres context");

            OpenContext {
                executor: Executor::new(Connection::Autocommit(conn)),
                deadline: None,
            }
        };

        let mut state = self.state.lock();
        if state.is_some() {
            return Err(UnitOfWorkError::ContextAlreadyOpen);
        }
        *state = Some(opened);
        Ok(())
    }

    async fn save_changes(&self) -> UnitOfWorkResult<()> {
        let opened = self.state.lock().take().ok_or(UnitOfWorkError::ContextClosed)?;

        match opened.executor.take_connection().await? {
            Connection::Transaction(tx) => {
                if let Some(deadline) = opened.deadline {
                    if Instant::now() > deadline.at {
                        tracing::warn!(
                            timeout_ms = deadline.timeout.as_millis() as u64,
                            "transaction exceeded its timeout, rolling back"
                        );
                        tx.rollback().await?;
                        return Err(UnitOfWorkError::TransactionTimedOut(deadline.timeout));
                    }
                }
                tx.commit().await?;
                tracing::debug!("committed postgres transaction");
            }
            Connection::Autocommit(conn) => {
                drop(conn);
                tracing::debug!("released autocommit postgres connection");
            }
        }
        Ok(())
    }

    async fn discard(&self) -> UnitOfWorkResult<()> {
        let opened = self.state.lock().take().ok_or(UnitOfWorkError::ContextClosed)?;

        match opened.executor.take_connection().await? {
            Connection::Transaction(tx) => {
                tx.rollback().await?;
                tracing::debug!("rolled back postgres transaction");
            }
            Connection::Autocommit(conn) => drop(conn),
        }
        Ok(())
    }
}
