//! Machine Controller
//!
//! A machine owns its components and advances at most one craft per game
//! tick: pick a recipe when idle, move per-tick resources while crafting,
//! and commit outputs once the duration has elapsed.

use rand::rngs::StdRng;
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::component::{ComponentId, IoType, MachineComponent};
use crate::crafting::{ActiveRecipe, CraftingCheckResult, ModifierSet, RecipeCraftingContext, RecipeRegistry};
use crate::requirement::ComponentRequirement;

/// Outcome of the most recent machine tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MachineStatus {
    /// No recipe could start; errors are from the closest candidate
    Idle { errors: Vec<String> },
    Crafting {
        recipe: String,
        tick: u32,
        total_ticks: u32,
    },
    /// A tick failed; progress is kept and retried next tick
    Stalled { recipe: String, errors: Vec<String> },
    /// A tick failed and the recipe gives up on failure
    Cancelled { recipe: String, errors: Vec<String> },
    /// Duration elapsed but the outputs have nowhere to go
    OutputBlocked { recipe: String, errors: Vec<String> },
    Completed { recipe: String },
}

impl MachineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MachineStatus::Idle { .. } => "idle",
            MachineStatus::Crafting { .. } => "crafting",
            MachineStatus::Stalled { .. } => "stalled",
            MachineStatus::Cancelled { .. } => "cancelled",
            MachineStatus::OutputBlocked { .. } => "output_blocked",
            MachineStatus::Completed { .. } => "completed",
        }
    }
}

#[derive(Debug)]
pub struct Machine {
    id: String,
    display_name: String,
    /// Recipe ids in priority order
    recipes: Vec<String>,
    components: Vec<MachineComponent>,
    modifiers: ModifierSet,
    active: Option<ActiveRecipe>,
    status: MachineStatus,
    /// Source of per-craft chance seeds
    rng: StdRng,
    completed: u64,
}

impl Machine {
    pub fn new(
        id: &str,
        display_name: &str,
        recipes: Vec<String>,
        components: Vec<MachineComponent>,
        modifiers: ModifierSet,
        rng: StdRng,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            recipes,
            components,
            modifiers,
            active: None,
            status: MachineStatus::Idle { errors: Vec::new() },
            rng,
            completed: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn recipes(&self) -> &[String] {
        &self.recipes
    }

    pub fn status(&self) -> &MachineStatus {
        &self.status
    }

    pub fn active(&self) -> Option<&ActiveRecipe> {
        self.active.as_ref()
    }

    pub fn components(&self) -> &[MachineComponent] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [MachineComponent] {
        &mut self.components
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut MachineComponent> {
        self.components.iter_mut().find(|c| c.id() == id)
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    /// Number of crafts finished since the machine was built
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Advance the machine by one game tick
    pub fn tick(&mut self, registry: &RecipeRegistry) -> &MachineStatus {
        let status = match self.active.take() {
            None => self.try_start(registry),
            Some(active) => self.progress(active),
        };

        if status.label() != self.status.label() {
            info!("Machine {} is now {}", self.id, status.label());
        }
        self.status = status;
        &self.status
    }

    /// Start the first recipe in priority order whose requirements are all
    /// met
    fn try_start(&mut self, registry: &RecipeRegistry) -> MachineStatus {
        let mut closest: Option<CraftingCheckResult> = None;

        for recipe_id in &self.recipes {
            let Some(recipe) = registry.get(recipe_id) else {
                warn!("Machine {} lists unknown recipe '{}'", self.id, recipe_id);
                continue;
            };

            let seed = self.rng.next_u64();
            let mut context = RecipeCraftingContext::new(recipe, self.modifiers.clone());
            let check = context.can_start_crafting(&mut self.components, seed, |_| true);
            if check.is_success() {
                let started = context.start_crafting(&mut self.components, seed);
                if !started.is_success() {
                    warn!(
                        "Machine {} could not take inputs of {}: {:?}",
                        self.id, recipe_id, started.errors
                    );
                    return MachineStatus::Idle {
                        errors: started.errors,
                    };
                }
                let active = ActiveRecipe::new(recipe, context, seed);
                info!(
                    "Machine {} started {} ({} ticks)",
                    self.id, recipe.display_name, active.total_ticks
                );
                let status = MachineStatus::Crafting {
                    recipe: active.recipe_id.clone(),
                    tick: 0,
                    total_ticks: active.total_ticks,
                };
                self.active = Some(active);
                return status;
            }

            debug!("Machine {} cannot start {}: {:?}", self.id, recipe_id, check.errors);
            if closest.as_ref().map_or(true, |c| check.validity > c.validity) {
                closest = Some(check);
            }
        }

        MachineStatus::Idle {
            errors: closest.map(|c| c.errors).unwrap_or_default(),
        }
    }

    fn progress(&mut self, mut active: ActiveRecipe) -> MachineStatus {
        if !active.is_complete() {
            let result = active.context.io_tick(&mut self.components);
            if result.is_success() {
                active.advance();
                let status = MachineStatus::Crafting {
                    recipe: active.recipe_id.clone(),
                    tick: active.tick,
                    total_ticks: active.total_ticks,
                };
                self.active = Some(active);
                return status;
            }

            if active.cancel_on_failure {
                warn!("Machine {} cancelled {}: {:?}", self.id, active.recipe_id, result.errors);
                return MachineStatus::Cancelled {
                    recipe: active.recipe_id,
                    errors: result.errors,
                };
            }
            let status = MachineStatus::Stalled {
                recipe: active.recipe_id.clone(),
                errors: result.errors,
            };
            self.active = Some(active);
            return status;
        }

        let check = active
            .context
            .can_start_crafting(&mut self.components, active.seed, |r| r.io() == IoType::Output);
        if !check.is_success() {
            return self.block_outputs(active, check.errors);
        }

        let result = active.context.finish_crafting(&mut self.components, active.seed);
        if !result.is_success() {
            warn!("Machine {} could not place outputs of {}: {:?}", self.id, active.recipe_id, result.errors);
            return self.block_outputs(active, result.errors);
        }
        self.completed += 1;
        info!("Machine {} completed {}", self.id, active.recipe_id);
        MachineStatus::Completed {
            recipe: active.recipe_id,
        }
    }

    /// Keep the finished craft until its outputs fit
    fn block_outputs(&mut self, active: ActiveRecipe, errors: Vec<String>) -> MachineStatus {
        let status = MachineStatus::OutputBlocked {
            recipe: active.recipe_id.clone(),
            errors,
        };
        self.active = Some(active);
        status
    }
}
