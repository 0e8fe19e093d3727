//! Fluid and Gas Tanks
//!
//! Two-phase container access: every drain or fill can be simulated
//! first and committed afterwards.

use serde::Serialize;
use std::fmt;

#[cfg(feature = "gas")]
use crate::fluid::GasStack;
use crate::fluid::{FluidStack, HybridFluid};

/// Whether a container operation mutates the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Simulate,
    Execute,
}

impl Action {
    pub fn execute(&self) -> bool {
        matches!(self, Action::Execute)
    }
}

/// Fluid container capability
pub trait FluidTank: fmt::Debug + Send + Sync {
    /// Drain up to `resource.amount` of the same fluid. Metadata is not
    /// compared; callers match tags on the returned stack.
    fn drain_internal(&mut self, resource: &FluidStack, action: Action) -> Option<FluidStack>;

    /// Fill with `resource`, returning the amount accepted.
    fn fill_internal(&mut self, resource: &FluidStack, action: Action) -> u32;

    /// Independent snapshot used to evaluate outputs without touching the
    /// real container.
    fn copy_tank(&self) -> Box<dyn FluidTank>;

    fn contents(&self) -> Option<&HybridFluid>;

    fn capacity(&self) -> u32;

    /// Gas access, if this container can hold gas
    #[cfg(feature = "gas")]
    fn as_gas_tank(&mut self) -> Option<&mut dyn GasTank> {
        None
    }
}

/// Gas container capability
#[cfg(feature = "gas")]
pub trait GasTank {
    fn draw_gas(&mut self, amount: u32, action: Action) -> Option<GasStack>;

    fn receive_gas(&mut self, stack: &GasStack, action: Action) -> u32;
}

/// Fill a tank with either kind of resource
pub fn fill_hybrid(tank: &mut dyn FluidTank, stack: &HybridFluid, action: Action) -> u32 {
    match stack {
        HybridFluid::Fluid(fluid) => tank.fill_internal(fluid, action),
        #[cfg(feature = "gas")]
        HybridFluid::Gas(gas) => tank
            .as_gas_tank()
            .map_or(0, |gas_tank| gas_tank.receive_gas(gas, action)),
    }
}

/// Drain either kind of resource from a tank
pub fn drain_hybrid(tank: &mut dyn FluidTank, stack: &HybridFluid, action: Action) -> Option<HybridFluid> {
    match stack {
        HybridFluid::Fluid(fluid) => tank.drain_internal(fluid, action).map(HybridFluid::Fluid),
        #[cfg(feature = "gas")]
        HybridFluid::Gas(gas) => tank
            .as_gas_tank()
            .and_then(|gas_tank| gas_tank.draw_gas(gas.amount, action))
            .map(HybridFluid::Gas),
    }
}

// ============================================================================
// Hybrid Tank
// ============================================================================

/// Single-slot tank holding one fluid (or, when enabled, one gas) at a time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridTank {
    capacity: u32,
    contents: Option<HybridFluid>,
    accepts_gas: bool,
}

impl HybridTank {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            contents: None,
            accepts_gas: false,
        }
    }

    /// Tank that can also hold gas
    #[cfg(feature = "gas")]
    pub fn with_gas(capacity: u32) -> Self {
        Self {
            capacity,
            contents: None,
            accepts_gas: true,
        }
    }

    /// Pre-fill the tank, clamped to its capacity
    pub fn with_contents(mut self, contents: HybridFluid) -> Self {
        let amount = contents.amount().min(self.capacity);
        self.contents = (amount > 0).then(|| contents.with_amount(amount));
        self
    }

    pub fn amount(&self) -> u32 {
        self.contents.as_ref().map_or(0, HybridFluid::amount)
    }

    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.amount())
    }

    pub fn accepts_gas(&self) -> bool {
        self.accepts_gas
    }

    /// Remove `amount` from the contents, emptying the slot at zero
    fn take(&mut self, amount: u32) {
        if let Some(contents) = self.contents.as_mut() {
            let left = contents.amount().saturating_sub(amount);
            if left == 0 {
                self.contents = None;
            } else {
                contents.set_amount(left);
            }
        }
    }

    /// Add `amount` to matching contents or start a new stack
    fn put(&mut self, stack: HybridFluid, amount: u32) {
        match self.contents.as_mut() {
            Some(contents) => {
                let total = contents.amount() + amount;
                contents.set_amount(total);
            }
            None => self.contents = Some(stack.with_amount(amount)),
        }
    }
}

impl FluidTank for HybridTank {
    fn drain_internal(&mut self, resource: &FluidStack, action: Action) -> Option<FluidStack> {
        let stored = match &self.contents {
            Some(HybridFluid::Fluid(stored)) if stored.is_same_fluid(resource) => stored,
            _ => return None,
        };
        let drained = stored.amount.min(resource.amount);
        if drained == 0 {
            return None;
        }
        let result = stored.with_amount(drained);
        if action.execute() {
            self.take(drained);
        }
        Some(result)
    }

    fn fill_internal(&mut self, resource: &FluidStack, action: Action) -> u32 {
        if resource.amount == 0 {
            return 0;
        }
        let accepted = match &self.contents {
            None => resource.amount.min(self.capacity),
            Some(HybridFluid::Fluid(stored)) if stored.is_fluid_equal(resource) => {
                resource.amount.min(self.free_space())
            }
            Some(_) => 0,
        };
        if action.execute() && accepted > 0 {
            self.put(HybridFluid::Fluid(resource.clone()), accepted);
        }
        accepted
    }

    fn copy_tank(&self) -> Box<dyn FluidTank> {
        Box::new(self.clone())
    }

    fn contents(&self) -> Option<&HybridFluid> {
        self.contents.as_ref()
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    #[cfg(feature = "gas")]
    fn as_gas_tank(&mut self) -> Option<&mut dyn GasTank> {
        if self.accepts_gas {
            Some(self as &mut dyn GasTank)
        } else {
            None
        }
    }
}

#[cfg(feature = "gas")]
impl GasTank for HybridTank {
    fn draw_gas(&mut self, amount: u32, action: Action) -> Option<GasStack> {
        let stored = match &self.contents {
            Some(HybridFluid::Gas(stored)) => stored,
            _ => return None,
        };
        let drawn = stored.amount.min(amount);
        if drawn == 0 {
            return None;
        }
        let result = stored.with_amount(drawn);
        if action.execute() {
            self.take(drawn);
        }
        Some(result)
    }

    fn receive_gas(&mut self, stack: &GasStack, action: Action) -> u32 {
        if !self.accepts_gas || stack.amount == 0 {
            return 0;
        }
        let accepted = match &self.contents {
            None => stack.amount.min(self.capacity),
            Some(HybridFluid::Gas(stored)) if stored.gas == stack.gas => {
                stack.amount.min(self.free_space())
            }
            Some(_) => 0,
        };
        if action.execute() && accepted > 0 {
            self.put(HybridFluid::Gas(stack.clone()), accepted);
        }
        accepted
    }
}
