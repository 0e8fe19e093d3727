//! Recipe Modifiers
//!
//! Machine upgrades that scale requirement amounts, chances and recipe
//! duration.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentType, IoType};

/// What a modifier scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierTarget {
    Energy,
    Fluid,
    Gas,
    Duration,
}

impl From<ComponentType> for ModifierTarget {
    fn from(component_type: ComponentType) -> Self {
        match component_type {
            ComponentType::Energy => ModifierTarget::Energy,
            ComponentType::Fluid => ModifierTarget::Fluid,
            ComponentType::Gas => ModifierTarget::Gas,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOperation {
    #[default]
    Add,
    Multiply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeModifier {
    pub target: ModifierTarget,
    /// Only applies to requirements of this direction; `None` applies to both
    #[serde(default)]
    pub io: Option<IoType>,
    #[serde(default)]
    pub operation: ModifierOperation,
    pub amount: f64,
    /// Applies to chance values instead of amounts
    #[serde(default)]
    pub affects_chance: bool,
}

/// The modifier function of one crafting context
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModifierSet {
    modifiers: Vec<RecipeModifier>,
}

impl ModifierSet {
    pub fn new(modifiers: Vec<RecipeModifier>) -> Self {
        Self { modifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipeModifier> {
        self.modifiers.iter()
    }

    /// `(value + sum of additions) * product of multipliers` over every
    /// modifier that targets `target` in direction `io`
    pub fn apply(&self, target: ModifierTarget, io: IoType, value: f64, is_chance: bool) -> f64 {
        let mut add = 0.0;
        let mut mul = 1.0;
        for modifier in self.modifiers.iter().filter(|m| {
            m.target == target && m.io.map_or(true, |m_io| m_io == io) && m.affects_chance == is_chance
        }) {
            match modifier.operation {
                ModifierOperation::Add => add += modifier.amount,
                ModifierOperation::Multiply => mul *= modifier.amount,
            }
        }
        (value + add) * mul
    }

    /// Recipe length in ticks after duration modifiers, at least one tick
    pub fn modified_duration(&self, recipe_ticks: u32) -> u32 {
        let ticks = self.apply(ModifierTarget::Duration, IoType::Input, recipe_ticks as f64, false);
        ticks.round().max(1.0) as u32
    }

    /// How much per-tick work scales when the duration changes
    pub fn duration_multiplier(&self, recipe_ticks: u32) -> f64 {
        if recipe_ticks == 0 {
            return 1.0;
        }
        recipe_ticks as f64 / self.modified_duration(recipe_ticks) as f64
    }
}
