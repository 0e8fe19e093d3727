//! Recipe Crafting Context
//!
//! Drives every requirement of one craft instance through its lifecycle
//! and folds the per-requirement results into a single verdict.

use serde::Serialize;
use tracing::{debug, trace};

use super::chance::ResultChance;
use super::definition::RecipeDefinition;
use super::modifier::ModifierSet;
use crate::component::{ComponentId, IoType, MachineComponent};
use crate::fluid::HybridFluid;
use crate::requirement::{ComponentRequirement, Requirement};

// ============================================================================
// Check Pass
// ============================================================================

/// Output already reserved against a component during the current pass
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRestriction {
    pub component: ComponentId,
    pub inserted: HybridFluid,
}

impl OutputRestriction {
    pub fn new(component: ComponentId, inserted: HybridFluid) -> Self {
        Self { component, inserted }
    }
}

/// Input already claimed from a component during the current pass
#[derive(Debug, Clone, PartialEq)]
pub struct InputReservation {
    pub component: ComponentId,
    pub drained: HybridFluid,
}

impl InputReservation {
    pub fn new(component: ComponentId, drained: HybridFluid) -> Self {
        Self { component, drained }
    }
}

/// State scoped to a single check pass. Dropped when the pass ends, so
/// reservations never leak into the next one.
#[derive(Debug, Default)]
pub struct CheckPass {
    restrictions: Vec<OutputRestriction>,
    reservations: Vec<InputReservation>,
}

impl CheckPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_restriction(&mut self, restriction: OutputRestriction) {
        self.restrictions.push(restriction);
    }

    pub fn restrictions_for(&self, component: ComponentId) -> impl Iterator<Item = &OutputRestriction> {
        self.restrictions.iter().filter(move |r| r.component == component)
    }

    pub fn restrictions(&self) -> &[OutputRestriction] {
        &self.restrictions
    }

    pub fn add_reservation(&mut self, reservation: InputReservation) {
        self.reservations.push(reservation);
    }

    pub fn reservations_for(&self, component: ComponentId) -> impl Iterator<Item = &InputReservation> {
        self.reservations.iter().filter(move |r| r.component == component)
    }

    pub fn reservations(&self) -> &[InputReservation] {
        &self.reservations
    }
}

// ============================================================================
// Check Result
// ============================================================================

/// Aggregate outcome of one pass over all requirements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CraftingCheckResult {
    /// Fraction of considered requirements that were satisfied
    pub validity: f32,
    pub errors: Vec<String>,
}

impl CraftingCheckResult {
    fn tally(considered: usize, succeeded: usize, errors: Vec<String>) -> Self {
        let validity = if considered == 0 {
            1.0
        } else {
            succeeded as f32 / considered as f32
        };
        Self { validity, errors }
    }

    pub fn is_success(&self) -> bool {
        self.validity >= 1.0
    }
}

// ============================================================================
// Crafting Context
// ============================================================================

#[derive(Debug)]
pub struct RecipeCraftingContext {
    recipe_id: String,
    recipe_ticks: u32,
    requirements: Vec<Requirement>,
    modifiers: ModifierSet,
}

impl RecipeCraftingContext {
    /// Bind independent copies of the recipe's requirements to a new craft
    pub fn new(recipe: &RecipeDefinition, modifiers: ModifierSet) -> Self {
        Self {
            recipe_id: recipe.id.clone(),
            recipe_ticks: recipe.duration,
            requirements: recipe.requirements.iter().map(Requirement::deep_copy).collect(),
            modifiers,
        }
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Recipe length after duration modifiers
    pub fn total_ticks(&self) -> u32 {
        self.modifiers.modified_duration(self.recipe_ticks)
    }

    /// Read-only check of every requirement accepted by `filter`. A
    /// requirement is satisfied once any component reports `Success`.
    ///
    /// The gate is seeded like the commit passes and rolled for every
    /// requirement in the same order, so the check sees the stacks the
    /// commit will move.
    pub fn can_start_crafting<F>(
        &mut self,
        components: &mut [MachineComponent],
        seed: u64,
        filter: F,
    ) -> CraftingCheckResult
    where
        F: Fn(&Requirement) -> bool,
    {
        let mut pass = CheckPass::new();
        let mut chance = ResultChance::new(seed);
        let mut considered = 0;
        let mut succeeded = 0;
        let mut errors = Vec::new();

        for requirement in &mut self.requirements {
            requirement.start_requirement_check(&mut chance, &self.modifiers);

            if filter(requirement) {
                considered += 1;
                let satisfied = components.iter_mut().any(|component| {
                    requirement
                        .can_start_crafting(component, &self.modifiers, &mut pass)
                        .is_success()
                });
                if satisfied {
                    succeeded += 1;
                } else {
                    errors.push(requirement.error_key());
                }
            }

            requirement.end_requirement_check();
        }

        let result = CraftingCheckResult::tally(considered, succeeded, errors);
        trace!("Check of {}: validity {:.2}", self.recipe_id, result.validity);
        result
    }

    /// Commit inputs. Every requirement shares one chance gate seeded with
    /// `seed`.
    pub fn start_crafting(&mut self, components: &mut [MachineComponent], seed: u64) -> CraftingCheckResult {
        let mut chance = ResultChance::new(seed);
        self.commit(components, &mut chance, IoType::Input, |requirement, component, modifiers| {
            requirement.start_crafting(component, modifiers)
        })
    }

    /// Commit outputs. Uses the same seed as `start_crafting` so each
    /// requirement sees the outcome it was started with.
    pub fn finish_crafting(&mut self, components: &mut [MachineComponent], seed: u64) -> CraftingCheckResult {
        let mut chance = ResultChance::new(seed);
        self.commit(components, &mut chance, IoType::Output, |requirement, component, modifiers| {
            requirement.finish_crafting(component, modifiers)
        })
    }

    /// Run one step over every requirement, stopping at the first component
    /// that reports completion. Only requirements of direction `io` count
    /// towards the result.
    fn commit<F>(
        &mut self,
        components: &mut [MachineComponent],
        chance: &mut ResultChance,
        io: IoType,
        mut step: F,
    ) -> CraftingCheckResult
    where
        F: FnMut(&mut Requirement, &mut MachineComponent, &ModifierSet) -> bool,
    {
        let mut considered = 0;
        let mut succeeded = 0;
        let mut errors = Vec::new();

        for requirement in &mut self.requirements {
            requirement.start_requirement_check(chance, &self.modifiers);
            let done = components
                .iter_mut()
                .any(|component| step(requirement, component, &self.modifiers));

            if requirement.io() == io {
                considered += 1;
                if done {
                    succeeded += 1;
                } else {
                    debug!("{} left {} unsatisfied", self.recipe_id, requirement.error_key());
                    errors.push(requirement.error_key());
                }
            }
            requirement.end_requirement_check();
        }

        CraftingCheckResult::tally(considered, succeeded, errors)
    }

    /// Move one tick's worth of per-tick resources
    pub fn io_tick(&mut self, components: &mut [MachineComponent]) -> CraftingCheckResult {
        let multiplier = self.modifiers.duration_multiplier(self.recipe_ticks);
        let mut considered = 0;
        let mut succeeded = 0;
        let mut errors = Vec::new();

        for requirement in &mut self.requirements {
            let error_key = requirement.error_key();
            let Some(per_tick) = requirement.as_per_tick_mut() else {
                continue;
            };
            considered += 1;

            per_tick.reset_io_tick();
            per_tick.start_io_tick(&self.modifiers, multiplier);
            let done = components
                .iter_mut()
                .any(|component| per_tick.do_io_tick(component).is_success());
            per_tick.reset_io_tick();

            if done {
                succeeded += 1;
            } else {
                errors.push(error_key);
            }
        }

        CraftingCheckResult::tally(considered, succeeded, errors)
    }
}
