use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres, Transaction};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{UnitOfWorkError, UnitOfWorkResult};

/// Connection held by an open context.
///
/// Both variants dereference to `PgConnection`, so repositories run their
/// queries the same way whether or not the unit of work is transactional.
#[derive(Debug)]
pub enum Connection {
    Transaction(Transaction<'static, Postgres>),
    Autocommit(PoolConnection<Postgres>),
}

impl Deref for Connection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        match self {
            Connection::Transaction(tx) => &**tx,
            Connection::Autocommit(conn) => &**conn,
        }
    }
}

impl DerefMut for Connection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        match self {
            Connection::Transaction(tx) => &mut **tx,
            Connection::Autocommit(conn) => &mut **conn,
        }
    }
}

/// Executor wraps the connection of an open context for use by repositories.
///
/// This struct provides a shared reference to the connection that can be
/// passed to multiple repositories within a unit of work.
#[derive(Clone, Debug)]
pub struct Executor {
    pub conn: Arc<Mutex<Option<Connection>>>,
}

impl Executor {
    /// Creates a new Executor from an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Takes ownership of the connection, leaving None in its place.
    /// This should only be called when saving or discarding the context.
    pub(crate) async fn take_connection(&self) -> UnitOfWorkResult<Connection> {
        self.conn.lock().await.take().ok_or(UnitOfWorkError::ContextClosed)
    }
}
