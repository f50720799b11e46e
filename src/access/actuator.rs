use log::{info, warn};

/// Side effects fired for each decision (gate, alarm, ...).
///
/// Called synchronously from the pipeline, once per decision.
pub trait GateActuator {
    fn on_allow(&mut self);
    fn on_deny(&mut self);
}

/// Default actuator: reports the action on the diagnostic channel only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingActuator;

impl GateActuator for LoggingActuator {
    fn on_allow(&mut self) {
        info!("GATE OPENING");
    }

    fn on_deny(&mut self) {
        warn!("ACCESS DENIED - ALARM TRIGGERED");
    }
}

/// Actuator built from two closures
pub struct CallbackActuator<A, D> {
    on_allow: A,
    on_deny: D,
}

impl<A: FnMut(), D: FnMut()> CallbackActuator<A, D> {
    pub fn new(on_allow: A, on_deny: D) -> Self {
        Self { on_allow, on_deny }
    }
}

impl<A: FnMut(), D: FnMut()> GateActuator for CallbackActuator<A, D> {
    fn on_allow(&mut self) {
        (self.on_allow)()
    }

    fn on_deny(&mut self) {
        (self.on_deny)()
    }
}
