#![allow(dead_code)]

pub mod context;
pub mod entities;
pub mod repositories;

pub use context::{ContextEvent, ContextLog, RecordingContext};
pub use entities::Account;
pub use repositories::{AccountRepository, Outcome, OutcomeProbe};
