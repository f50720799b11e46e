pub mod actuator;
pub mod decision_log;
pub mod whitelist;

pub use actuator::{CallbackActuator, GateActuator, LoggingActuator};
pub use decision_log::{AccessDecisionLog, read_log};
pub use whitelist::AuthorizedSet;
