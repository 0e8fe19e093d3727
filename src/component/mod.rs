//! Machine Components
//!
//! The resource-holding parts of a machine (energy hatches, fluid and gas
//! tanks). Requirements only see them through the capability traits in
//! this module.

pub mod energy;
pub mod tank;

pub use energy::{EnergyBuffer, EnergyHandler};
#[cfg(feature = "gas")]
pub use tank::GasTank;
pub use tank::{Action, FluidTank, HybridTank};

use serde::{Deserialize, Serialize};

// ============================================================================
// Component Classification
// ============================================================================

/// Direction a component moves resources relative to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoType {
    Input,
    Output,
}

impl IoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IoType::Input => "input",
            IoType::Output => "output",
        }
    }
}

/// Kind of resource a component holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Energy,
    Fluid,
    Gas,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Energy => "energy",
            ComponentType::Fluid => "fluid",
            ComponentType::Gas => "gas",
        }
    }
}

/// Identity of one physical component within a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

// ============================================================================
// Machine Component
// ============================================================================

/// Capability a component exposes. Checked once at dispatch.
#[derive(Debug)]
pub enum ComponentHandle {
    Energy(Box<dyn EnergyHandler>),
    Tank(Box<dyn FluidTank>),
}

#[derive(Debug)]
pub struct MachineComponent {
    id: ComponentId,
    component_type: ComponentType,
    io: IoType,
    handle: ComponentHandle,
}

impl MachineComponent {
    pub fn energy(id: ComponentId, io: IoType, handler: impl EnergyHandler + 'static) -> Self {
        Self {
            id,
            component_type: ComponentType::Energy,
            io,
            handle: ComponentHandle::Energy(Box::new(handler)),
        }
    }

    pub fn fluid(id: ComponentId, io: IoType, tank: impl FluidTank + 'static) -> Self {
        Self {
            id,
            component_type: ComponentType::Fluid,
            io,
            handle: ComponentHandle::Tank(Box::new(tank)),
        }
    }

    /// A gas hatch. The tank should advertise the gas capability.
    #[cfg(feature = "gas")]
    pub fn gas(id: ComponentId, io: IoType, tank: impl FluidTank + 'static) -> Self {
        Self {
            id,
            component_type: ComponentType::Gas,
            io,
            handle: ComponentHandle::Tank(Box::new(tank)),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn io(&self) -> IoType {
        self.io
    }

    pub fn handle(&self) -> &ComponentHandle {
        &self.handle
    }

    pub fn energy_handler(&self) -> Option<&(dyn EnergyHandler + 'static)> {
        match &self.handle {
            ComponentHandle::Energy(handler) => Some(handler.as_ref()),
            ComponentHandle::Tank(_) => None,
        }
    }

    pub fn energy_handler_mut(&mut self) -> Option<&mut (dyn EnergyHandler + 'static)> {
        match &mut self.handle {
            ComponentHandle::Energy(handler) => Some(handler.as_mut()),
            ComponentHandle::Tank(_) => None,
        }
    }

    pub fn tank(&self) -> Option<&(dyn FluidTank + 'static)> {
        match &self.handle {
            ComponentHandle::Tank(tank) => Some(tank.as_ref()),
            ComponentHandle::Energy(_) => None,
        }
    }

    pub fn tank_mut(&mut self) -> Option<&mut (dyn FluidTank + 'static)> {
        match &mut self.handle {
            ComponentHandle::Tank(tank) => Some(tank.as_mut()),
            ComponentHandle::Energy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_dispatch() {
        let mut hatch = MachineComponent::energy(ComponentId(1), IoType::Input, EnergyBuffer::new(100, 10));
        assert_eq!(hatch.component_type(), ComponentType::Energy);
        assert!(hatch.energy_handler().is_some());
        assert!(hatch.tank_mut().is_none());

        let mut tank = MachineComponent::fluid(ComponentId(2), IoType::Output, HybridTank::new(1000));
        assert_eq!(tank.component_type(), ComponentType::Fluid);
        assert_eq!(tank.io(), IoType::Output);
        assert!(tank.energy_handler_mut().is_none());
        assert_eq!(tank.tank().map(|t| t.capacity()), Some(1000));
    }
}
