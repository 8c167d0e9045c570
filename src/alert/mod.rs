pub mod dispatcher;
pub mod sink;
pub mod types;

pub use dispatcher::AlertDispatcher;
pub use sink::{AlertSink, HttpAlertSink, ALERT_PATH};
pub use types::{Acknowledgement, AlertMessage, DeliveryStatus, DispatchOutcome, DispatchReport};
