//! Energy Requirement
//!
//! Fixed per-tick energy drawn from input hatches or pushed into output
//! hatches. The chance gate never applies to energy.

use tracing::trace;

use super::{ComponentRequirement, CraftCheck, PerTickRequirement, RequirementSnapshot};
use crate::component::{ComponentType, IoType, MachineComponent};
use crate::crafting::chance::ResultChance;
use crate::crafting::context::CheckPass;
use crate::crafting::modifier::ModifierSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyRequirement {
    io: IoType,
    per_tick: u64,
    /// Energy still to move during the current tick
    active_io: u64,
}

impl EnergyRequirement {
    pub fn new(io: IoType, per_tick: u64) -> Self {
        Self {
            io,
            per_tick,
            active_io: per_tick,
        }
    }

    /// Copies keep the in-flight tick amount
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn per_tick(&self) -> u64 {
        self.per_tick
    }

    pub fn active_io(&self) -> u64 {
        self.active_io
    }

    fn modified_per_tick(&self, modifiers: &ModifierSet) -> u64 {
        let amount = modifiers.apply(ComponentType::Energy.into(), self.io, self.per_tick as f64, false);
        amount.round().max(0.0) as u64
    }
}

impl ComponentRequirement for EnergyRequirement {
    fn component_type(&self) -> ComponentType {
        ComponentType::Energy
    }

    fn io(&self) -> IoType {
        self.io
    }

    fn start_requirement_check(&mut self, _chance: &mut ResultChance, _modifiers: &ModifierSet) {}

    fn end_requirement_check(&mut self) {}

    fn can_start_crafting(
        &mut self,
        component: &mut MachineComponent,
        modifiers: &ModifierSet,
        _pass: &mut CheckPass,
    ) -> CraftCheck {
        if !self.applies_to(component) {
            return CraftCheck::InvalidSkip;
        }
        let Some(handler) = component.energy_handler() else {
            return CraftCheck::InvalidSkip;
        };
        match self.io {
            IoType::Input if handler.current_energy() >= self.modified_per_tick(modifiers) => {
                CraftCheck::Success
            }
            IoType::Input => CraftCheck::FailureMissingInput,
            // Capacity is clamped during the actual transfer
            IoType::Output => CraftCheck::Success,
        }
    }

    fn start_crafting(&mut self, component: &mut MachineComponent, modifiers: &ModifierSet) -> bool {
        self.can_start_crafting(component, modifiers, &mut CheckPass::new()) == CraftCheck::Success
    }

    fn finish_crafting(&mut self, _component: &mut MachineComponent, _modifiers: &ModifierSet) -> bool {
        true
    }

    fn snapshot(&self) -> RequirementSnapshot {
        RequirementSnapshot {
            component_type: ComponentType::Energy,
            io: self.io,
            resource: None,
            amount: self.per_tick,
            per_tick: true,
            chance: 1.0,
            tag_match: None,
            tag_display: None,
        }
    }
}

impl PerTickRequirement for EnergyRequirement {
    fn start_io_tick(&mut self, modifiers: &ModifierSet, duration_multiplier: f64) {
        let modified = modifiers.apply(ComponentType::Energy.into(), self.io, self.active_io as f64, false);
        self.active_io = (modified * duration_multiplier).round().max(0.0) as u64;
    }

    fn reset_io_tick(&mut self) {
        self.active_io = self.per_tick;
    }

    fn do_io_tick(&mut self, component: &mut MachineComponent) -> CraftCheck {
        if !self.applies_to(component) {
            return CraftCheck::InvalidSkip;
        }
        let Some(handler) = component.energy_handler_mut() else {
            return CraftCheck::InvalidSkip;
        };
        let current = handler.current_energy();
        match self.io {
            IoType::Input => {
                if current >= self.active_io {
                    handler.set_current_energy(current - self.active_io);
                    self.active_io = 0;
                    CraftCheck::Success
                } else {
                    self.active_io -= current;
                    handler.set_current_energy(0);
                    trace!("Energy input short by {} this tick", self.active_io);
                    CraftCheck::PartialSuccess
                }
            }
            IoType::Output => {
                let remaining = handler.remaining_capacity();
                if remaining < self.active_io {
                    handler.set_current_energy(handler.max_energy());
                    self.active_io -= remaining;
                    trace!("Energy output overflow of {} this tick", self.active_io);
                    return CraftCheck::PartialSuccess;
                }
                handler.set_current_energy((current + self.active_io).min(handler.max_energy()));
                self.active_io = 0;
                CraftCheck::Success
            }
        }
    }
}
