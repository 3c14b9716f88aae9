//! Services module
//!
//! Subscription operations and the batch passes built on them.

mod report;
mod subscription;

pub use report::{
    CheckReport, NotificationOutcome, NotificationReport, NotificationStatus, SweepOutcome,
    SweepReport, SweepStatus,
};
pub use subscription::{
    ServiceError, ServiceResult, SubscriptionInput, SubscriptionPatch, SubscriptionService,
};
