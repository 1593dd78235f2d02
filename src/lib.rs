//! Unit of Work Factory
//!
//! This crate creates units of work bound to a database context, with optional
//! transactions configured by isolation level and timeout. A PostgreSQL
//! context built on sqlx is included.

pub mod context;
pub mod error;
pub mod executor;
pub mod factory;
pub mod postgres;
pub mod resolver;
pub mod transaction_aware;
pub mod transaction_options;
pub mod unit_of_work;

pub use context::DbContext;
pub use error::{UnitOfWorkError, UnitOfWorkResult};
pub use executor::{Connection, Executor};
pub use factory::{
    ContextUnitOfWorkFactory, ContextUnitOfWorkFactoryBuilder, PostgresUnitOfWorkFactory,
    UnitOfWorkFactory,
};
pub use postgres::PgContext;
pub use resolver::{DependencyResolver, ServiceRegistry};
pub use transaction_aware::TransactionAware;
pub use transaction_options::{
    IsolationLevel, TransactionDefaults, TransactionOptions, UnitOfWorkSettings,
};
pub use unit_of_work::{ContextUnitOfWork, UnitOfWork};
