//! Crafting System
//!
//! Recipe definitions, the registry that loads them, and the per-craft
//! machinery (chance gate, modifiers, crafting context, active recipe).

pub mod active;
pub mod chance;
pub mod context;
pub mod definition;
pub mod modifier;
pub mod registry;

pub use active::ActiveRecipe;
pub use chance::ResultChance;
pub use context::{CheckPass, CraftingCheckResult, InputReservation, OutputRestriction, RecipeCraftingContext};
pub use definition::{RawRecipeDefinition, RawRequirement, RecipeDefinition};
pub use modifier::{ModifierOperation, ModifierSet, ModifierTarget, RecipeModifier};
pub use registry::RecipeRegistry;
