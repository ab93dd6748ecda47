//! Business logic services.

pub mod admin;
pub mod engine;
pub mod ledger;
pub mod notification;

pub use admin::AdminOverrideService;
pub use engine::{EngineConfig, ProjectSummary, RegistrationEngine, SignupRequest, UniquenessPolicy};
pub use ledger::{CapacityEntry, CapacityLedger, LedgerError};
pub use notification::{
    CancellationNotice, MockNotificationSink, NotificationResult, NotificationSink,
    RegistrationNotice,
};
