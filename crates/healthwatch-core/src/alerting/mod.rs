//! Alerting core for healthwatch
//!
//! The state machine that turns health-check events into notifications, and
//! the retrying dispatcher that delivers them.

mod dispatcher;
mod evaluator;
mod transport;

pub use dispatcher::AlertDispatcher;
pub use evaluator::{Evaluation, EvaluationEngine};
pub use transport::{AlertMessage, AlertTransport, TransportError, WebhookTransport};
