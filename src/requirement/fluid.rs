//! Fluid Requirement
//!
//! Consumes or produces a fixed amount of fluid (or gas) when a craft
//! starts or finishes. Inputs drain in two phases: a simulated drain that
//! confirms quantity and tag, then a real drain unless the chance gate made
//! this pass non-consuming. Outputs are evaluated against a copy of the
//! tank that already holds every reservation made earlier in the pass.
//!
//! Which container API is used is decided once, at construction, by the
//! `TankBackend` the requirement is built with.

use std::fmt;

use tracing::{debug, trace};

use super::{ComponentRequirement, CraftCheck, RequirementSnapshot};
use crate::component::tank::{drain_hybrid, fill_hybrid};
use crate::component::{Action, ComponentType, FluidTank, IoType, MachineComponent};
use crate::crafting::chance::ResultChance;
use crate::crafting::context::{CheckPass, InputReservation, OutputRestriction};
use crate::crafting::modifier::ModifierSet;
#[cfg(feature = "gas")]
use crate::fluid::GasStack;
use crate::fluid::{FluidStack, HybridFluid};
use crate::tag::{self, TagCompound};

// ============================================================================
// Tank Backends
// ============================================================================

/// Container access strategy for one resource kind
pub trait TankBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn drain(&self, tank: &mut dyn FluidTank, request: &HybridFluid, action: Action) -> Option<HybridFluid>;

    fn fill(&self, tank: &mut dyn FluidTank, stack: &HybridFluid, action: Action) -> u32;

    /// Whether a drained stack is what the requirement asked for
    fn accepts(&self, request: &HybridFluid, drained: &HybridFluid, tag_match: Option<&TagCompound>) -> bool;
}

impl fmt::Debug for dyn TankBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Standard fluid container access
pub struct FluidBackend;

pub static FLUID_BACKEND: FluidBackend = FluidBackend;

impl TankBackend for FluidBackend {
    fn name(&self) -> &'static str {
        "fluid"
    }

    fn drain(&self, tank: &mut dyn FluidTank, request: &HybridFluid, action: Action) -> Option<HybridFluid> {
        let fluid = request.as_fluid_stack()?;
        tank.drain_internal(fluid, action).map(HybridFluid::Fluid)
    }

    fn fill(&self, tank: &mut dyn FluidTank, stack: &HybridFluid, action: Action) -> u32 {
        stack
            .as_fluid_stack()
            .map_or(0, |fluid| tank.fill_internal(fluid, action))
    }

    fn accepts(&self, request: &HybridFluid, drained: &HybridFluid, tag_match: Option<&TagCompound>) -> bool {
        match (request.as_fluid_stack(), drained.as_fluid_stack()) {
            (Some(request), Some(drained)) => {
                request.is_same_fluid(drained) && tag::matches(tag_match, drained.tag.as_ref())
            }
            _ => false,
        }
    }
}

/// Gas container access. Tanks without the gas capability fall through
/// to the fluid path.
#[cfg(feature = "gas")]
pub struct GasBackend;

#[cfg(feature = "gas")]
pub static GAS_BACKEND: GasBackend = GasBackend;

#[cfg(feature = "gas")]
impl TankBackend for GasBackend {
    fn name(&self) -> &'static str {
        "gas"
    }

    fn drain(&self, tank: &mut dyn FluidTank, request: &HybridFluid, action: Action) -> Option<HybridFluid> {
        let Some(gas) = request.as_gas_stack() else {
            return FLUID_BACKEND.drain(tank, request, action);
        };
        match tank.as_gas_tank() {
            Some(gas_tank) => gas_tank.draw_gas(gas.amount, action).map(HybridFluid::Gas),
            None => FLUID_BACKEND.drain(tank, request, action),
        }
    }

    fn fill(&self, tank: &mut dyn FluidTank, stack: &HybridFluid, action: Action) -> u32 {
        let Some(gas) = stack.as_gas_stack() else {
            return FLUID_BACKEND.fill(tank, stack, action);
        };
        match tank.as_gas_tank() {
            Some(gas_tank) => gas_tank.receive_gas(gas, action),
            None => FLUID_BACKEND.fill(tank, stack, action),
        }
    }

    fn accepts(&self, request: &HybridFluid, drained: &HybridFluid, tag_match: Option<&TagCompound>) -> bool {
        match (request.as_gas_stack(), drained.as_gas_stack()) {
            (Some(request), Some(drained)) => request.gas == drained.gas,
            _ => FLUID_BACKEND.accepts(request, drained, tag_match),
        }
    }
}

// ============================================================================
// Working State
// ============================================================================

/// Per-pass state of one requirement instance
#[derive(Debug, Clone, PartialEq)]
pub struct CheckState {
    /// Amount still to satisfy this pass; never grows within a pass
    pub remaining: HybridFluid,
    /// Chance gate outcome rolled at the start of the pass
    pub chance_passed: bool,
}

impl CheckState {
    fn fresh(required: &HybridFluid) -> Self {
        Self {
            remaining: required.clone(),
            chance_passed: true,
        }
    }

    fn consume(&mut self, amount: u32) {
        let left = self.remaining.amount().saturating_sub(amount);
        self.remaining.set_amount(left);
    }

    fn is_satisfied(&self) -> bool {
        self.remaining.amount() == 0
    }
}

// ============================================================================
// Fluid Requirement
// ============================================================================

#[derive(Debug)]
pub struct FluidRequirement {
    component_type: ComponentType,
    io: IoType,
    required: HybridFluid,
    chance: f32,
    tag_match: Option<TagCompound>,
    tag_display: Option<TagCompound>,
    backend: &'static dyn TankBackend,
    state: CheckState,
}

impl FluidRequirement {
    pub fn fluid(io: IoType, fluid: FluidStack) -> Self {
        Self::with_backend(ComponentType::Fluid, io, HybridFluid::Fluid(fluid), &FLUID_BACKEND)
    }

    #[cfg(feature = "gas")]
    pub fn gas(io: IoType, gas: GasStack) -> Self {
        Self::with_backend(ComponentType::Gas, io, HybridFluid::Gas(gas), &GAS_BACKEND)
    }

    fn with_backend(
        component_type: ComponentType,
        io: IoType,
        required: HybridFluid,
        backend: &'static dyn TankBackend,
    ) -> Self {
        let state = CheckState::fresh(&required);
        Self {
            component_type,
            io,
            required,
            chance: 1.0,
            tag_match: None,
            tag_display: None,
            backend,
            state,
        }
    }

    pub fn with_chance(mut self, chance: f32) -> Self {
        self.chance = chance;
        self
    }

    pub fn with_tag_match(mut self, tag: Option<TagCompound>) -> Self {
        self.tag_match = tag;
        self
    }

    pub fn with_tag_display(mut self, tag: Option<TagCompound>) -> Self {
        self.tag_display = tag;
        self
    }

    /// Template copy with fresh working state
    pub fn deep_copy(&self) -> Self {
        Self::with_backend(self.component_type, self.io, self.required.clone(), self.backend)
            .with_chance(self.chance)
            .with_tag_match(self.tag_match.clone())
            .with_tag_display(self.tag_display.clone())
    }

    pub fn required(&self) -> &HybridFluid {
        &self.required
    }

    pub fn chance(&self) -> f32 {
        self.chance
    }

    pub fn tag_match(&self) -> Option<&TagCompound> {
        self.tag_match.as_ref()
    }

    pub fn tag_display(&self) -> Option<&TagCompound> {
        self.tag_display.as_ref()
    }

    pub fn state(&self) -> &CheckState {
        &self.state
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Stack produced at finish: plain when the gate passed, otherwise the
    /// display-tagged variant. `None` when the gate failed and there is no
    /// display tag to substitute.
    fn output_stack(&self) -> Option<HybridFluid> {
        if self.state.chance_passed {
            return Some(self.state.remaining.clone());
        }
        let display = self.tag_display.as_ref()?;
        match &self.state.remaining {
            HybridFluid::Fluid(fluid) => Some(HybridFluid::Fluid(fluid.clone().with_tag(Some(display.clone())))),
            // Gas has no metadata to substitute
            #[cfg(feature = "gas")]
            HybridFluid::Gas(gas) => Some(HybridFluid::Gas(gas.clone())),
        }
    }

    /// Simulated drain that also confirms the tag
    fn simulate_drain(&self, tank: &mut dyn FluidTank) -> Option<HybridFluid> {
        let drained = self.backend.drain(tank, &self.state.remaining, Action::Simulate)?;
        self.backend
            .accepts(&self.state.remaining, &drained, self.tag_match.as_ref())
            .then_some(drained)
    }
}

impl ComponentRequirement for FluidRequirement {
    fn component_type(&self) -> ComponentType {
        self.component_type
    }

    fn io(&self) -> IoType {
        self.io
    }

    fn start_requirement_check(&mut self, chance: &mut ResultChance, modifiers: &ModifierSet) {
        let target = self.component_type.into();
        let amount = modifiers.apply(target, self.io, self.required.amount() as f64, false);
        self.state.remaining = self.required.with_amount(amount.round().max(0.0) as u32);
        let gate = modifiers.apply(target, self.io, self.chance as f64, true) as f32;
        self.state.chance_passed = chance.passes(gate);
    }

    fn end_requirement_check(&mut self) {
        self.state = CheckState::fresh(&self.required);
    }

    fn can_start_crafting(
        &mut self,
        component: &mut MachineComponent,
        _modifiers: &ModifierSet,
        pass: &mut CheckPass,
    ) -> CraftCheck {
        if !self.applies_to(component) {
            return CraftCheck::InvalidSkip;
        }
        let id = component.id();
        let Some(tank) = component.tank_mut() else {
            return CraftCheck::InvalidSkip;
        };

        match self.io {
            IoType::Input => {
                let mut copy = tank.copy_tank();
                for reservation in pass.reservations_for(id) {
                    drain_hybrid(copy.as_mut(), &reservation.drained, Action::Execute);
                }
                let Some(drained) = self.simulate_drain(copy.as_mut()) else {
                    return CraftCheck::FailureMissingInput;
                };
                // Inputs kept by the chance gate are only inspected
                if self.state.chance_passed {
                    pass.add_reservation(InputReservation::new(id, drained.clone()));
                }
                self.state.consume(drained.amount());
                if self.state.is_satisfied() {
                    CraftCheck::Success
                } else {
                    CraftCheck::PartialSuccess
                }
            }
            IoType::Output => {
                let Some(output) = self.output_stack() else {
                    return CraftCheck::Success;
                };
                let mut copy = tank.copy_tank();
                for restriction in pass.restrictions_for(id) {
                    fill_hybrid(copy.as_mut(), &restriction.inserted, Action::Execute);
                }
                let filled = self.backend.fill(copy.as_mut(), &output, Action::Simulate);
                if filled >= output.amount() {
                    trace!("Reserved {} {} in component {:?}", filled, output.name(), id);
                    pass.add_restriction(OutputRestriction::new(id, output));
                    CraftCheck::Success
                } else {
                    CraftCheck::FailureMissingInput
                }
            }
        }
    }

    fn start_crafting(&mut self, component: &mut MachineComponent, _modifiers: &ModifierSet) -> bool {
        if !self.applies_to(component) || self.io != IoType::Input {
            return false;
        }
        let Some(tank) = component.tank_mut() else {
            return false;
        };

        let Some(simulated) = self.simulate_drain(tank) else {
            return false;
        };
        if !self.state.chance_passed {
            debug!("Input {} kept by chance roll", self.required.name());
            self.state.consume(simulated.amount());
            return self.state.is_satisfied();
        }

        let Some(drained) = self.backend.drain(tank, &self.state.remaining, Action::Execute) else {
            return false;
        };
        if !self
            .backend
            .accepts(&self.state.remaining, &drained, self.tag_match.as_ref())
        {
            return false;
        }
        self.state.consume(drained.amount());
        self.state.is_satisfied()
    }

    fn finish_crafting(&mut self, component: &mut MachineComponent, _modifiers: &ModifierSet) -> bool {
        if !self.applies_to(component) || self.io != IoType::Output {
            return false;
        }
        let Some(tank) = component.tank_mut() else {
            return false;
        };

        let Some(output) = self.output_stack() else {
            debug!("Output {} skipped by chance roll", self.required.name());
            return true;
        };
        let fillable = self.backend.fill(tank, &output, Action::Simulate);
        if fillable < output.amount() {
            return false;
        }
        self.backend.fill(tank, &output, Action::Execute) >= output.amount()
    }

    fn snapshot(&self) -> RequirementSnapshot {
        RequirementSnapshot {
            component_type: self.component_type,
            io: self.io,
            resource: Some(self.required.name().to_string()),
            amount: self.required.amount() as u64,
            per_tick: false,
            chance: self.chance,
            tag_match: self.tag_match.clone(),
            tag_display: self.tag_display.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentId, EnergyBuffer, HybridTank};
    use crate::crafting::modifier::{ModifierOperation, ModifierTarget, RecipeModifier};
    use serde_json::json;

    fn tag(value: serde_json::Value) -> Option<TagCompound> {
        value.as_object().cloned()
    }

    fn water(amount: u32) -> FluidStack {
        FluidStack::new("water", amount)
    }

    fn tank(id: u32, io: IoType, capacity: u32, contents: Option<FluidStack>) -> MachineComponent {
        let mut tank = HybridTank::new(capacity);
        if let Some(contents) = contents {
            tank = tank.with_contents(contents.into());
        }
        MachineComponent::fluid(ComponentId(id), io, tank)
    }

    fn stored(component: &MachineComponent) -> Option<HybridFluid> {
        component.tank().and_then(|t| t.contents().cloned())
    }

    fn started(requirement: &mut FluidRequirement, seed: u64) {
        let mut chance = ResultChance::new(seed);
        requirement.start_requirement_check(&mut chance, &ModifierSet::default());
    }

    #[test]
    fn test_input_check_is_simulated() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(500));
        let mut component = tank(0, IoType::Input, 1000, Some(water(800)));
        started(&mut requirement, 0);

        let check = requirement.can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new());
        assert_eq!(check, CraftCheck::Success);
        assert_eq!(stored(&component).map(|s| s.amount()), Some(800));
    }

    #[test]
    fn test_input_partial_across_tanks() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(500));
        let mut first = tank(0, IoType::Input, 1000, Some(water(200)));
        let mut second = tank(1, IoType::Input, 1000, Some(water(400)));
        let modifiers = ModifierSet::default();
        let mut pass = CheckPass::new();
        started(&mut requirement, 0);

        assert_eq!(
            requirement.can_start_crafting(&mut first, &modifiers, &mut pass),
            CraftCheck::PartialSuccess
        );
        assert_eq!(requirement.state().remaining.amount(), 300);
        assert_eq!(
            requirement.can_start_crafting(&mut second, &modifiers, &mut pass),
            CraftCheck::Success
        );
    }

    #[test]
    fn test_input_tag_mismatch() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(100))
            .with_tag_match(tag(json!({ "purity": 3 })));
        let contents = water(1000).with_tag(tag(json!({ "purity": 1 })));
        let mut component = tank(0, IoType::Input, 1000, Some(contents.clone()));
        started(&mut requirement, 0);

        let check = requirement.can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new());
        assert_eq!(check, CraftCheck::FailureMissingInput);
        assert!(!requirement.start_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component), Some(HybridFluid::Fluid(contents)));
    }

    #[test]
    fn test_input_tag_match_consumes() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(100))
            .with_tag_match(tag(json!({ "purity": ">=2" })));
        let contents = water(1000).with_tag(tag(json!({ "purity": 3, "source": "well" })));
        let mut component = tank(0, IoType::Input, 1000, Some(contents));
        started(&mut requirement, 1);

        assert!(requirement.start_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component).map(|s| s.amount()), Some(900));
    }

    #[test]
    fn test_zero_chance_input_is_not_consumed() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(300)).with_chance(0.0);
        let mut component = tank(0, IoType::Input, 1000, Some(water(500)));
        started(&mut requirement, 99);

        assert!(!requirement.state().chance_passed);
        assert!(requirement.start_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component).map(|s| s.amount()), Some(500));
    }

    #[test]
    fn test_full_chance_input_is_consumed() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(300)).with_chance(1.0);
        let mut component = tank(0, IoType::Input, 1000, Some(water(500)));
        started(&mut requirement, 99);

        assert!(requirement.start_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component).map(|s| s.amount()), Some(200));
    }

    #[test]
    fn test_outputs_sharing_a_tank_respect_reservations() {
        let mut first = FluidRequirement::fluid(IoType::Output, water(600));
        let mut second = FluidRequirement::fluid(IoType::Output, water(600));
        let mut component = tank(0, IoType::Output, 1000, None);
        let modifiers = ModifierSet::default();
        let mut pass = CheckPass::new();
        started(&mut first, 0);
        started(&mut second, 0);

        assert_eq!(first.can_start_crafting(&mut component, &modifiers, &mut pass), CraftCheck::Success);
        assert_eq!(
            second.can_start_crafting(&mut component, &modifiers, &mut pass),
            CraftCheck::FailureMissingInput
        );
        assert_eq!(pass.restrictions().len(), 1);
        // The real tank is never touched by checks
        assert!(stored(&component).is_none());
    }

    #[test]
    fn test_inputs_sharing_a_tank_respect_reservations() {
        let mut first = FluidRequirement::fluid(IoType::Input, water(100));
        let mut second = FluidRequirement::fluid(IoType::Input, water(100));
        let mut component = tank(0, IoType::Input, 1000, Some(water(150)));
        let modifiers = ModifierSet::default();
        let mut pass = CheckPass::new();
        started(&mut first, 0);
        started(&mut second, 0);

        assert_eq!(first.can_start_crafting(&mut component, &modifiers, &mut pass), CraftCheck::Success);
        assert_eq!(
            second.can_start_crafting(&mut component, &modifiers, &mut pass),
            CraftCheck::PartialSuccess
        );
        assert_eq!(second.state().remaining.amount(), 50);
        assert_eq!(pass.reservations().len(), 2);
        assert_eq!(stored(&component).map(|s| s.amount()), Some(150));
    }

    #[test]
    fn test_kept_inputs_are_not_reserved() {
        let mut kept = FluidRequirement::fluid(IoType::Input, water(100)).with_chance(0.0);
        let mut consumed = FluidRequirement::fluid(IoType::Input, water(100));
        let mut component = tank(0, IoType::Input, 1000, Some(water(100)));
        let modifiers = ModifierSet::default();
        let mut pass = CheckPass::new();
        started(&mut kept, 4);
        started(&mut consumed, 4);

        assert!(kept.can_start_crafting(&mut component, &modifiers, &mut pass).is_success());
        assert!(pass.reservations().is_empty());
        assert!(consumed.can_start_crafting(&mut component, &modifiers, &mut pass).is_success());
    }

    #[test]
    fn test_output_check_uses_display_stack() {
        let display = tag(json!({ "dirty": true }));
        let mut requirement = FluidRequirement::fluid(IoType::Output, water(100))
            .with_chance(0.0)
            .with_tag_display(display.clone());
        let mut pass = CheckPass::new();
        started(&mut requirement, 2);

        let mut plain = tank(0, IoType::Output, 1000, Some(water(100)));
        assert_eq!(
            requirement.can_start_crafting(&mut plain, &ModifierSet::default(), &mut pass),
            CraftCheck::FailureMissingInput
        );

        let mut dirty = tank(1, IoType::Output, 1000, Some(water(100).with_tag(display.clone())));
        assert!(requirement
            .can_start_crafting(&mut dirty, &ModifierSet::default(), &mut pass)
            .is_success());
        assert_eq!(
            pass.restrictions()[0].inserted,
            HybridFluid::Fluid(water(100).with_tag(display))
        );
    }

    #[test]
    fn test_skipped_output_needs_no_space() {
        let mut requirement = FluidRequirement::fluid(IoType::Output, water(100)).with_chance(0.0);
        let mut full = tank(0, IoType::Output, 100, Some(water(100)));
        let mut pass = CheckPass::new();
        started(&mut requirement, 2);

        assert!(requirement
            .can_start_crafting(&mut full, &ModifierSet::default(), &mut pass)
            .is_success());
        assert!(pass.restrictions().is_empty());
    }

    #[test]
    fn test_reservations_are_per_component() {
        let mut first = FluidRequirement::fluid(IoType::Output, water(600));
        let mut second = FluidRequirement::fluid(IoType::Output, water(600));
        let mut tank_a = tank(0, IoType::Output, 1000, None);
        let mut tank_b = tank(1, IoType::Output, 1000, None);
        let modifiers = ModifierSet::default();
        let mut pass = CheckPass::new();
        started(&mut first, 0);
        started(&mut second, 0);

        assert!(first.can_start_crafting(&mut tank_a, &modifiers, &mut pass).is_success());
        assert!(second.can_start_crafting(&mut tank_b, &modifiers, &mut pass).is_success());
    }

    #[test]
    fn test_finish_plain_output() {
        let mut requirement = FluidRequirement::fluid(IoType::Output, water(250))
            .with_chance(1.0)
            .with_tag_display(tag(json!({ "dirty": true })));
        let mut component = tank(0, IoType::Output, 1000, None);
        started(&mut requirement, 5);

        assert!(requirement.finish_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component), Some(HybridFluid::Fluid(water(250))));
    }

    #[test]
    fn test_finish_zero_chance_uses_display_tag() {
        let display = tag(json!({ "dirty": true }));
        let mut requirement = FluidRequirement::fluid(IoType::Output, water(250))
            .with_chance(0.0)
            .with_tag_display(display.clone());
        let mut component = tank(0, IoType::Output, 1000, None);
        started(&mut requirement, 5);

        assert!(requirement.finish_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component), Some(HybridFluid::Fluid(water(250).with_tag(display))));
    }

    #[test]
    fn test_finish_zero_chance_without_display_tag_produces_nothing() {
        let mut requirement = FluidRequirement::fluid(IoType::Output, water(250)).with_chance(0.0);
        let mut component = tank(0, IoType::Output, 1000, None);
        started(&mut requirement, 5);

        assert!(requirement.finish_crafting(&mut component, &ModifierSet::default()));
        assert!(stored(&component).is_none());
    }

    #[test]
    fn test_finish_fails_without_space() {
        let mut requirement = FluidRequirement::fluid(IoType::Output, water(250));
        let mut component = tank(0, IoType::Output, 1000, Some(water(900)));
        started(&mut requirement, 0);

        assert!(!requirement.finish_crafting(&mut component, &ModifierSet::default()));
        assert_eq!(stored(&component).map(|s| s.amount()), Some(900));
    }

    #[test]
    fn test_mismatched_components_are_skipped() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(100));
        let modifiers = ModifierSet::default();
        let mut pass = CheckPass::new();
        started(&mut requirement, 0);

        let mut output_tank = tank(0, IoType::Output, 1000, Some(water(500)));
        let mut hatch = MachineComponent::energy(ComponentId(1), IoType::Input, EnergyBuffer::new(10, 10));
        assert_eq!(
            requirement.can_start_crafting(&mut output_tank, &modifiers, &mut pass),
            CraftCheck::InvalidSkip
        );
        assert_eq!(
            requirement.can_start_crafting(&mut hatch, &modifiers, &mut pass),
            CraftCheck::InvalidSkip
        );
        assert!(!requirement.start_crafting(&mut output_tank, &modifiers));
        assert_eq!(stored(&output_tank).map(|s| s.amount()), Some(500));
        assert_eq!(requirement.state().remaining.amount(), 100);
    }

    #[test]
    fn test_modifiers_scale_required_amount() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(100));
        let modifiers = ModifierSet::new(vec![RecipeModifier {
            target: ModifierTarget::Fluid,
            io: Some(IoType::Input),
            operation: ModifierOperation::Multiply,
            amount: 1.5,
            affects_chance: false,
        }]);
        requirement.start_requirement_check(&mut ResultChance::new(0), &modifiers);
        assert_eq!(requirement.state().remaining.amount(), 150);

        requirement.end_requirement_check();
        assert_eq!(requirement.state().remaining.amount(), 100);
    }

    #[test]
    fn test_end_then_start_matches_fresh_copy() {
        let template = FluidRequirement::fluid(IoType::Input, water(400))
            .with_chance(0.5)
            .with_tag_match(tag(json!({ "purity": 1 })));
        let mut used = template.deep_copy();
        let mut component = tank(0, IoType::Input, 1000, Some(water(100).with_tag(tag(json!({ "purity": 1 })))));
        started(&mut used, 0);
        used.can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new());
        assert_eq!(used.state().remaining.amount(), 300);

        used.end_requirement_check();
        started(&mut used, 0);
        let mut fresh = template.deep_copy();
        started(&mut fresh, 0);
        assert_eq!(used.state(), fresh.state());
    }

    #[test]
    fn test_deep_copy_resets_working_state() {
        let mut requirement = FluidRequirement::fluid(IoType::Input, water(400))
            .with_chance(0.25)
            .with_tag_display(tag(json!({ "a": 1 })));
        let mut component = tank(0, IoType::Input, 1000, Some(water(100)));
        started(&mut requirement, 0);
        requirement.can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new());

        let copy = requirement.deep_copy();
        assert_eq!(copy.state().remaining.amount(), 400);
        assert_eq!(copy.chance(), 0.25);
        assert_eq!(copy.tag_display(), requirement.tag_display());
        assert_eq!(copy.backend_name(), "fluid");
    }

    #[cfg(feature = "gas")]
    mod gas {
        use super::*;

        fn gas_tank(id: u32, io: IoType, contents: Option<GasStack>) -> MachineComponent {
            let mut tank = HybridTank::with_gas(1000);
            if let Some(contents) = contents {
                tank = tank.with_contents(contents.into());
            }
            MachineComponent::gas(ComponentId(id), io, tank)
        }

        #[test]
        fn test_gas_input() {
            let mut requirement = FluidRequirement::gas(IoType::Input, GasStack::new("hydrogen", 300));
            let mut component = gas_tank(0, IoType::Input, Some(GasStack::new("hydrogen", 500)));
            started(&mut requirement, 0);

            assert_eq!(requirement.backend_name(), "gas");
            assert!(requirement
                .can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new())
                .is_success());
            started(&mut requirement, 0);
            assert!(requirement.start_crafting(&mut component, &ModifierSet::default()));
            assert_eq!(stored(&component).map(|s| s.amount()), Some(200));
        }

        #[test]
        fn test_wrong_gas_is_missing() {
            let mut requirement = FluidRequirement::gas(IoType::Input, GasStack::new("hydrogen", 300));
            let mut component = gas_tank(0, IoType::Input, Some(GasStack::new("oxygen", 500)));
            started(&mut requirement, 0);

            assert_eq!(
                requirement.can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new()),
                CraftCheck::FailureMissingInput
            );
        }

        #[test]
        fn test_gas_outputs_share_reservations() {
            let mut first = FluidRequirement::gas(IoType::Output, GasStack::new("oxygen", 700));
            let mut second = FluidRequirement::gas(IoType::Output, GasStack::new("oxygen", 700));
            let mut component = gas_tank(0, IoType::Output, None);
            let modifiers = ModifierSet::default();
            let mut pass = CheckPass::new();
            started(&mut first, 0);
            started(&mut second, 0);

            assert!(first.can_start_crafting(&mut component, &modifiers, &mut pass).is_success());
            assert!(!second.can_start_crafting(&mut component, &modifiers, &mut pass).is_success());
        }

        #[test]
        fn test_gas_requirement_ignores_fluid_tanks() {
            let mut requirement = FluidRequirement::gas(IoType::Input, GasStack::new("hydrogen", 10));
            let mut component = tank(0, IoType::Input, 1000, Some(water(500)));
            started(&mut requirement, 0);

            assert_eq!(
                requirement.can_start_crafting(&mut component, &ModifierSet::default(), &mut CheckPass::new()),
                CraftCheck::InvalidSkip
            );
        }

        #[test]
        fn test_gas_finish() {
            let mut requirement = FluidRequirement::gas(IoType::Output, GasStack::new("oxygen", 400));
            let mut component = gas_tank(0, IoType::Output, None);
            started(&mut requirement, 3);

            assert!(requirement.finish_crafting(&mut component, &ModifierSet::default()));
            assert_eq!(stored(&component), Some(HybridFluid::Gas(GasStack::new("oxygen", 400))));
        }
    }
}
