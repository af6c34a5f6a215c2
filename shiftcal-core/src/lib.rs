//! Core of shiftcal: mirrors canonical service records into an external
//! calendar the engine does not own.
//!
//! This crate is shared by the shiftcal CLI and calendar providers:
//! - `record` and `event` for the data model
//! - `sync`, `duplicate`, `orphan` and `migration` for the engine
//! - `gateway` and `store` for the collaborators the engine talks to
//! - `gateway::protocol` for the CLI-provider communication protocol

pub mod config;
pub mod duplicate;
pub mod error;
pub mod event;
pub mod event_factory;
pub mod gateway;
pub mod link_store;
pub mod memory;
pub mod migration;
pub mod orphan;
pub mod record;
pub mod store;
pub mod sync;

pub use error::{MigrationStage, ShiftcalError, ShiftcalResult};
pub use event::*;
pub use event_factory::EventFactory;
pub use migration::{MigrationCoordinator, MigrationReport};
pub use record::{Link, ServiceRecord, SubPeriod, SubPeriodIndex};
pub use sync::{SyncEngine, SyncReport};
