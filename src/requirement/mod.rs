//! Recipe Requirements
//!
//! A requirement is one rule a recipe imposes on one resource type and
//! direction. Every requirement runs through the same lifecycle each pass:
//!
//! 1. `start_requirement_check` resets working state and rolls the chance gate
//! 2. `can_start_crafting` simulates against one candidate component
//! 3. `start_crafting` commits inputs
//! 4. `do_io_tick` moves per-tick resources (energy)
//! 5. `finish_crafting` commits outputs
//! 6. `end_requirement_check` restores the template state
//!
//! Copies made with `deep_copy` are bound to one craft instance, so
//! machines never share working state.

pub mod energy;
pub mod fluid;

pub use energy::EnergyRequirement;
pub use fluid::FluidRequirement;

use serde::Serialize;

pub use crate::component::{ComponentType, IoType};
use crate::component::MachineComponent;
use crate::crafting::chance::ResultChance;
use crate::crafting::context::CheckPass;
use crate::crafting::modifier::ModifierSet;
use crate::tag::TagCompound;

/// Outcome of checking or ticking a requirement against one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftCheck {
    Success,
    /// Some of the amount was handled; the remainder carries over
    PartialSuccess,
    FailureMissingInput,
    /// Component does not apply to this requirement; ignored by the verdict
    InvalidSkip,
}

impl CraftCheck {
    pub fn is_success(&self) -> bool {
        matches!(self, CraftCheck::Success)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, CraftCheck::InvalidSkip)
    }
}

/// Lifecycle shared by every requirement variant
pub trait ComponentRequirement {
    fn component_type(&self) -> ComponentType;

    fn io(&self) -> IoType;

    fn start_requirement_check(&mut self, chance: &mut ResultChance, modifiers: &ModifierSet);

    fn end_requirement_check(&mut self);

    /// Simulate against one component. Containers are never mutated; output
    /// reservations go into `pass`.
    fn can_start_crafting(
        &mut self,
        component: &mut MachineComponent,
        modifiers: &ModifierSet,
        pass: &mut CheckPass,
    ) -> CraftCheck;

    /// Commit inputs. Returns true once the requirement is fully satisfied.
    fn start_crafting(&mut self, component: &mut MachineComponent, modifiers: &ModifierSet) -> bool;

    /// Commit outputs at craft completion
    fn finish_crafting(&mut self, component: &mut MachineComponent, modifiers: &ModifierSet) -> bool;

    /// Read-only projection of the template for recipe inspection
    fn snapshot(&self) -> RequirementSnapshot;

    fn error_key(&self) -> String {
        format!("craftcheck.failure.{}.{}", self.component_type().as_str(), self.io().as_str())
    }

    /// Same resource type and direction as the component
    fn applies_to(&self, component: &MachineComponent) -> bool {
        component.component_type() == self.component_type() && component.io() == self.io()
    }
}

/// Requirements that move resources every tick instead of all at once
pub trait PerTickRequirement: ComponentRequirement {
    /// Compute this tick's slice from the modified amount and duration
    fn start_io_tick(&mut self, modifiers: &ModifierSet, duration_multiplier: f64);

    fn reset_io_tick(&mut self);

    /// Move part of the active slice through one component
    fn do_io_tick(&mut self, component: &mut MachineComponent) -> CraftCheck;
}

// ============================================================================
// Requirement
// ============================================================================

#[derive(Debug)]
pub enum Requirement {
    Energy(EnergyRequirement),
    Fluid(FluidRequirement),
}

impl Requirement {
    /// Independent instance for a new craft
    pub fn deep_copy(&self) -> Requirement {
        match self {
            Requirement::Energy(energy) => Requirement::Energy(energy.deep_copy()),
            Requirement::Fluid(fluid) => Requirement::Fluid(fluid.deep_copy()),
        }
    }

    pub fn as_per_tick_mut(&mut self) -> Option<&mut dyn PerTickRequirement> {
        match self {
            Requirement::Energy(energy) => Some(energy as &mut dyn PerTickRequirement),
            Requirement::Fluid(_) => None,
        }
    }

    fn inner(&self) -> &dyn ComponentRequirement {
        match self {
            Requirement::Energy(energy) => energy as &dyn ComponentRequirement,
            Requirement::Fluid(fluid) => fluid as &dyn ComponentRequirement,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ComponentRequirement {
        match self {
            Requirement::Energy(energy) => energy as &mut dyn ComponentRequirement,
            Requirement::Fluid(fluid) => fluid as &mut dyn ComponentRequirement,
        }
    }
}

impl From<EnergyRequirement> for Requirement {
    fn from(requirement: EnergyRequirement) -> Self {
        Requirement::Energy(requirement)
    }
}

impl From<FluidRequirement> for Requirement {
    fn from(requirement: FluidRequirement) -> Self {
        Requirement::Fluid(requirement)
    }
}

impl ComponentRequirement for Requirement {
    fn component_type(&self) -> ComponentType {
        self.inner().component_type()
    }

    fn io(&self) -> IoType {
        self.inner().io()
    }

    fn start_requirement_check(&mut self, chance: &mut ResultChance, modifiers: &ModifierSet) {
        self.inner_mut().start_requirement_check(chance, modifiers)
    }

    fn end_requirement_check(&mut self) {
        self.inner_mut().end_requirement_check()
    }

    fn can_start_crafting(
        &mut self,
        component: &mut MachineComponent,
        modifiers: &ModifierSet,
        pass: &mut CheckPass,
    ) -> CraftCheck {
        self.inner_mut().can_start_crafting(component, modifiers, pass)
    }

    fn start_crafting(&mut self, component: &mut MachineComponent, modifiers: &ModifierSet) -> bool {
        self.inner_mut().start_crafting(component, modifiers)
    }

    fn finish_crafting(&mut self, component: &mut MachineComponent, modifiers: &ModifierSet) -> bool {
        self.inner_mut().finish_crafting(component, modifiers)
    }

    fn snapshot(&self) -> RequirementSnapshot {
        self.inner().snapshot()
    }
}

// ============================================================================
// Display Projection
// ============================================================================

/// Template fields shown by recipe-inspection UIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementSnapshot {
    pub component_type: ComponentType,
    pub io: IoType,
    /// Fluid or gas name; `None` for energy
    pub resource: Option<String>,
    pub amount: u64,
    pub per_tick: bool,
    pub chance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_match: Option<TagCompound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_display: Option<TagCompound>,
}
