//! Error-tracker client used by the forwarding sink
//!
//! Events are posted to the store endpoint derived from a DSN. Redaction
//! happens in one place, [`TrackerClient::prepare`], so no event leaves the
//! process unscrubbed.

pub mod client;
pub mod dsn;
pub mod event;
pub mod scrub;

pub use client::{TrackerClient, TrackerConfig};
pub use dsn::Dsn;
pub use event::{EventContexts, EventLevel, EventUser, Exception, ExceptionValue, TrackerEvent};
pub use scrub::{scrub_event, EMAIL_PLACEHOLDER, SENSITIVE_ENV_VARS};
