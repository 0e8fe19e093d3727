//! Active Recipe
//!
//! Progress of one craft a machine has started.

use super::context::RecipeCraftingContext;
use super::definition::RecipeDefinition;

#[derive(Debug)]
pub struct ActiveRecipe {
    pub recipe_id: String,
    pub context: RecipeCraftingContext,
    /// Completed ticks
    pub tick: u32,
    pub total_ticks: u32,
    /// Chance seed shared by the start and finish passes
    pub seed: u64,
    pub cancel_on_failure: bool,
}

impl ActiveRecipe {
    pub fn new(recipe: &RecipeDefinition, context: RecipeCraftingContext, seed: u64) -> Self {
        Self {
            recipe_id: recipe.id.clone(),
            total_ticks: context.total_ticks(),
            context,
            tick: 0,
            seed,
            cancel_on_failure: recipe.cancel_on_failure,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.tick >= self.total_ticks
    }

    pub fn progress(&self) -> f32 {
        (self.tick as f32 / self.total_ticks.max(1) as f32).min(1.0)
    }

    pub fn advance(&mut self) {
        self.tick = (self.tick + 1).min(self.total_ticks);
    }
}
