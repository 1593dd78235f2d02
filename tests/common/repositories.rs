use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

use postgres_unit_of_work_factory::{Executor, TransactionAware, UnitOfWorkError, UnitOfWorkResult};

use super::entities::Account;

/// Outcome reported to a transaction-aware component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    RolledBack,
}

/// Records the outcome it is notified of
#[derive(Default)]
pub struct OutcomeProbe {
    outcome: Mutex<Option<Outcome>>,
}

impl OutcomeProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn outcome(&self) -> Option<Outcome> {
        *self.outcome.lock()
    }
}

#[async_trait]
impl TransactionAware for OutcomeProbe {
    async fn on_commit(&self) -> UnitOfWorkResult<()> {
        *self.outcome.lock() = Some(Outcome::Committed);
        Ok(())
    }

    async fn on_rollback(&self) -> UnitOfWorkResult<()> {
        *self.outcome.lock() = Some(Outcome::RolledBack);
        Ok(())
    }
}

/// Account repository running on a unit of work's executor
pub struct AccountRepository {
    executor: Executor,
}

impl AccountRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn insert(&self, account: &Account) -> UnitOfWorkResult<()> {
        let mut conn_guard = self.executor.conn.lock().await;
        let conn = conn_guard.as_mut().ok_or(UnitOfWorkError::ContextClosed)?;
        sqlx::query("INSERT INTO accounts (id, owner, balance) VALUES ($1, $2, $3)")
            .bind(account.id)
            .bind(&account.owner)
            .bind(account.balance)
            .execute(&mut **conn)
            .await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> UnitOfWorkResult<Option<Account>> {
        let mut conn_guard = self.executor.conn.lock().await;
        let conn = conn_guard.as_mut().ok_or(UnitOfWorkError::ContextClosed)?;
        let row = sqlx::query("SELECT id, owner, balance FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **conn)
            .await?;

        Ok(row.map(|r| Account {
            id: r.get("id"),
            owner: r.get("owner"),
            balance: r.get("balance"),
        }))
    }

    /// Isolation level of the current transaction as reported by the server
    pub async fn isolation_level(&self) -> UnitOfWorkResult<String> {
        let mut conn_guard = self.executor.conn.lock().await;
        let conn = conn_guard.as_mut().ok_or(UnitOfWorkError::ContextClosed)?;
        let row = sqlx::query("SHOW transaction_isolation")
            .fetch_one(&mut **conn)
            .await?;
        Ok(row.get(0))
    }
}
