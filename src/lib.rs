//! Modular Machines
//!
//! Multi-component machine crafting: recipes made of energy, fluid and gas
//! requirements, evaluated against the components a machine is built from
//! and advanced one game tick at a time.

pub mod component;
pub mod config;
pub mod crafting;
pub mod error;
pub mod fluid;
pub mod machine;
pub mod protocol;
pub mod requirement;
pub mod tag;

pub use component::{ComponentId, ComponentType, IoType, MachineComponent};
pub use crafting::{RecipeCraftingContext, RecipeRegistry};
pub use error::{ConfigError, RecipeError};
pub use machine::{Machine, MachineStatus};
pub use requirement::{ComponentRequirement, CraftCheck, Requirement};
