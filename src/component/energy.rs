//! Energy storage capability

use serde::Serialize;
use std::fmt;

/// Anything a machine can pull energy from or push energy into
pub trait EnergyHandler: fmt::Debug + Send + Sync {
    fn current_energy(&self) -> u64;

    fn set_current_energy(&mut self, energy: u64);

    fn max_energy(&self) -> u64;

    fn remaining_capacity(&self) -> u64 {
        self.max_energy().saturating_sub(self.current_energy())
    }
}

/// Plain energy buffer backing an energy hatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnergyBuffer {
    current: u64,
    max: u64,
}

impl EnergyBuffer {
    pub fn new(max: u64, current: u64) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }
}

impl EnergyHandler for EnergyBuffer {
    fn current_energy(&self) -> u64 {
        self.current
    }

    fn set_current_energy(&mut self, energy: u64) {
        self.current = energy.min(self.max);
    }

    fn max_energy(&self) -> u64 {
        self.max
    }
}
