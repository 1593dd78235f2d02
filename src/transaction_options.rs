use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::UnitOfWorkResult;

/// Transaction isolation levels understood by the unit of work.
///
/// Contexts map these onto whatever their backend supports and reject the
/// ones they cannot honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    #[default]
    Serializable,
    RepeatableRead,
    ReadCommitted,
    ReadUncommitted,
    Snapshot,
    Chaos,
    Unspecified,
}

/// Isolation level and timeout for a transactional unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionOptions {
    pub isolation_level: IsolationLevel,
    /// `None` leaves the timeout at the environment default.
    pub timeout: Option<Duration>,
}

impl TransactionOptions {
    /// Options with `isolation_level` and the default timeout.
    pub fn new(isolation_level: IsolationLevel) -> Self {
        Self {
            isolation_level,
            timeout: None,
        }
    }

    /// Sets an explicit timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolves the timeout that actually applies to the transaction.
    ///
    /// An unset timeout takes the environment default. The result is capped at
    /// `max_timeout` unless that is zero, which means no cap. A zero request
    /// means no explicit limit and resolves to the cap itself.
    pub fn effective_timeout(&self, defaults: &TransactionDefaults) -> Duration {
        let requested = self.timeout.unwrap_or(defaults.default_timeout);
        match defaults.max_timeout {
            max if max.is_zero() && requested.is_zero() => Duration::MAX,
            max if max.is_zero() => requested,
            max if requested.is_zero() => max,
            max => requested.min(max),
        }
    }
}

/// How a unit of work was configured by its creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitOfWorkSettings {
    transactions_enabled: bool,
    transaction_options: Option<TransactionOptions>,
}

impl UnitOfWorkSettings {
    /// Settings without transaction options; the context picks its defaults.
    pub fn new(transactions_enabled: bool) -> Self {
        Self {
            transactions_enabled,
            transaction_options: None,
        }
    }

    /// Transactional settings configured by `options`.
    pub fn with_options(options: TransactionOptions) -> Self {
        Self {
            transactions_enabled: true,
            transaction_options: Some(options),
        }
    }

    /// Whether the unit of work runs inside a transaction.
    pub fn transactions_enabled(&self) -> bool {
        self.transactions_enabled
    }

    /// Explicit transaction options, if the creator supplied any.
    pub fn transaction_options(&self) -> Option<&TransactionOptions> {
        self.transaction_options.as_ref()
    }

    /// Requested isolation level, `None` when left to the context.
    pub fn isolation_level(&self) -> Option<IsolationLevel> {
        self.transaction_options.map(|options| options.isolation_level)
    }

    /// Requested timeout, `None` when left to the environment default.
    pub fn timeout(&self) -> Option<Duration> {
        self.transaction_options.and_then(|options| options.timeout)
    }
}

/// Environment-wide transaction timeouts.
///
/// Register an instance with the dependency resolver to override the
/// built-in values for every context that resolves it. A zero `max_timeout`
/// leaves timeouts uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TransactionDefaults {
    #[serde(
        rename = "default_timeout_secs",
        default = "default_timeout",
        deserialize_with = "duration_from_secs"
    )]
    pub default_timeout: Duration,
    #[serde(
        rename = "max_timeout_secs",
        default = "max_timeout",
        deserialize_with = "duration_from_secs"
    )]
    pub max_timeout: Duration,
}

fn default_timeout() -> Duration {
    TransactionDefaults::DEFAULT_TIMEOUT
}

fn max_timeout() -> Duration {
    TransactionDefaults::MAX_TIMEOUT
}

fn duration_from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl TransactionDefaults {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(600);

    /// Loads `UOW_DEFAULT_TIMEOUT_SECS` and `UOW_MAX_TIMEOUT_SECS` from the
    /// environment. Missing values keep the built-in defaults; malformed ones
    /// are an error.
    pub fn from_env() -> UnitOfWorkResult<Self> {
        Self::from_figment(Figment::new().merge(Env::prefixed("UOW_")))
    }

    /// Extracts the defaults from any figment, e.g. one merging a config file.
    pub fn from_figment(figment: Figment) -> UnitOfWorkResult<Self> {
        Ok(figment.extract()?)
    }
}

impl Default for TransactionDefaults {
    fn default() -> Self {
        Self {
            default_timeout: Self::DEFAULT_TIMEOUT,
            max_timeout: Self::MAX_TIMEOUT,
        }
    }
}
