//! Late-bound simulator facade
//!
//! The subject needs the simulator for value conversion, and the simulator
//! owns the subject. The facade is handed to the subject first and bound to
//! the simulator once it exists, breaking the construction cycle without a
//! reference cycle.

use crate::simulator::ObjectSimulator;
use remote_subject::SimulatorFacade;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use value_graph::Value;

/// A [`SimulatorFacade`] bound to its simulator after construction
#[derive(Default)]
pub struct LateFacade {
    simulator: RefCell<Weak<ObjectSimulator>>,
}

impl LateFacade {
    /// Creates a facade with no simulator bound yet
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Binds the facade to its simulator
    pub fn bind(&self, simulator: &Rc<ObjectSimulator>) {
        *self.simulator.borrow_mut() = Rc::downgrade(simulator);
    }
}

impl SimulatorFacade for LateFacade {
    fn simulate_value(&self, value: &Value) -> Option<Value> {
        let simulator = self.simulator.borrow().upgrade();
        match simulator {
            Some(simulator) => simulator.simulate(value),
            // An unbound facade passes values through untouched.
            None => Some(value.clone()),
        }
    }

    fn materialize_value(&self, value: &Value) -> Value {
        let simulator = self.simulator.borrow().upgrade();
        match simulator {
            Some(simulator) => simulator.materialize(value),
            None => value.clone(),
        }
    }
}
