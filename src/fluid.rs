//! Fluid and Gas Stacks
//!
//! Resource stacks moved between tanks and requirements. A `HybridFluid`
//! is the single resource type a fluid requirement works with; gas stacks
//! only exist when the `gas` feature is enabled.

use serde::{Deserialize, Serialize};

use crate::tag::TagCompound;

// ============================================================================
// Fluid Stack
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidStack {
    pub fluid: String,
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagCompound>,
}

impl FluidStack {
    pub fn new(fluid: &str, amount: u32) -> Self {
        Self {
            fluid: fluid.to_string(),
            amount,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Option<TagCompound>) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Same fluid, ignoring metadata
    pub fn is_same_fluid(&self, other: &FluidStack) -> bool {
        self.fluid == other.fluid
    }

    /// Same fluid and identical metadata (stacks that may share a tank)
    pub fn is_fluid_equal(&self, other: &FluidStack) -> bool {
        self.fluid == other.fluid && self.tag == other.tag
    }
}

// ============================================================================
// Gas Stack
// ============================================================================

#[cfg(feature = "gas")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasStack {
    pub gas: String,
    pub amount: u32,
}

#[cfg(feature = "gas")]
impl GasStack {
    pub fn new(gas: &str, amount: u32) -> Self {
        Self {
            gas: gas.to_string(),
            amount,
        }
    }

    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            gas: self.gas.clone(),
            amount,
        }
    }
}

// ============================================================================
// Hybrid Fluid
// ============================================================================

/// Either a fluid or a gas stack
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HybridFluid {
    Fluid(FluidStack),
    #[cfg(feature = "gas")]
    Gas(GasStack),
}

impl HybridFluid {
    pub fn amount(&self) -> u32 {
        match self {
            HybridFluid::Fluid(stack) => stack.amount,
            #[cfg(feature = "gas")]
            HybridFluid::Gas(stack) => stack.amount,
        }
    }

    pub fn set_amount(&mut self, amount: u32) {
        match self {
            HybridFluid::Fluid(stack) => stack.amount = amount,
            #[cfg(feature = "gas")]
            HybridFluid::Gas(stack) => stack.amount = amount,
        }
    }

    pub fn with_amount(&self, amount: u32) -> Self {
        let mut copy = self.clone();
        copy.set_amount(amount);
        copy
    }

    /// Registry name of the fluid or gas
    pub fn name(&self) -> &str {
        match self {
            HybridFluid::Fluid(stack) => &stack.fluid,
            #[cfg(feature = "gas")]
            HybridFluid::Gas(stack) => &stack.gas,
        }
    }

    pub fn as_fluid_stack(&self) -> Option<&FluidStack> {
        match self {
            HybridFluid::Fluid(stack) => Some(stack),
            #[cfg(feature = "gas")]
            HybridFluid::Gas(_) => None,
        }
    }

    #[cfg(feature = "gas")]
    pub fn as_gas_stack(&self) -> Option<&GasStack> {
        match self {
            HybridFluid::Fluid(_) => None,
            HybridFluid::Gas(stack) => Some(stack),
        }
    }
}

impl From<FluidStack> for HybridFluid {
    fn from(stack: FluidStack) -> Self {
        HybridFluid::Fluid(stack)
    }
}

#[cfg(feature = "gas")]
impl From<GasStack> for HybridFluid {
    fn from(stack: GasStack) -> Self {
        HybridFluid::Gas(stack)
    }
}
