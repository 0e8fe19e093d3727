//! Machine Recipe Definitions
//!
//! Defines the data structures for machine recipes, including TOML
//! deserialization (Raw*) and resolved versions with defaults applied
//! and requirement templates built.

use serde::Deserialize;

use crate::component::IoType;
use crate::fluid::FluidStack;
#[cfg(feature = "gas")]
use crate::fluid::GasStack;
use crate::requirement::{ComponentRequirement, EnergyRequirement, FluidRequirement, Requirement, RequirementSnapshot};
use crate::tag::TagCompound;

// ============================================================================
// Raw TOML Structures
// ============================================================================

fn default_duration() -> u32 {
    20
}

fn default_chance() -> f32 {
    1.0
}

/// Raw requirement entry from TOML, tagged by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawRequirement {
    Energy {
        io: IoType,
        per_tick: u64,
    },
    Fluid {
        io: IoType,
        fluid: String,
        amount: u32,
        #[serde(default = "default_chance")]
        chance: f32,
        #[serde(default)]
        tag_match: Option<TagCompound>,
        #[serde(default)]
        tag_display: Option<TagCompound>,
    },
    Gas {
        io: IoType,
        gas: String,
        amount: u32,
        #[serde(default = "default_chance")]
        chance: f32,
    },
}

/// Raw recipe definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecipeDefinition {
    pub display_name: Option<String>,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub cancel_on_failure: bool,
    #[serde(default)]
    pub requirements: Vec<RawRequirement>,
}

fn check_chance(chance: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&chance) {
        Ok(())
    } else {
        Err(format!("chance {} is outside [0, 1]", chance))
    }
}

fn check_amount(amount: u64) -> Result<(), String> {
    if amount == 0 {
        Err("amount must be greater than zero".to_string())
    } else {
        Ok(())
    }
}

impl RawRequirement {
    /// Validate and build the requirement template
    pub fn resolve(&self) -> Result<Requirement, String> {
        match self {
            RawRequirement::Energy { io, per_tick } => {
                check_amount(*per_tick)?;
                Ok(EnergyRequirement::new(*io, *per_tick).into())
            }
            RawRequirement::Fluid {
                io,
                fluid,
                amount,
                chance,
                tag_match,
                tag_display,
            } => {
                check_amount(*amount as u64)?;
                check_chance(*chance)?;
                if *io == IoType::Input && tag_display.is_some() {
                    return Err("tag_display is only valid on outputs".to_string());
                }
                let requirement = FluidRequirement::fluid(*io, FluidStack::new(fluid, *amount))
                    .with_chance(*chance)
                    .with_tag_match(tag_match.clone())
                    .with_tag_display(tag_display.clone());
                Ok(requirement.into())
            }
            #[cfg(feature = "gas")]
            RawRequirement::Gas { io, gas, amount, chance } => {
                check_amount(*amount as u64)?;
                check_chance(*chance)?;
                let requirement = FluidRequirement::gas(*io, GasStack::new(gas, *amount)).with_chance(*chance);
                Ok(requirement.into())
            }
            #[cfg(not(feature = "gas"))]
            RawRequirement::Gas { gas, .. } => Err(format!(
                "gas requirement '{}' needs the `gas` feature",
                gas
            )),
        }
    }
}

// ============================================================================
// Resolved Structures
// ============================================================================

/// A fully resolved recipe. Requirements are templates; crafts work on
/// deep copies.
#[derive(Debug)]
pub struct RecipeDefinition {
    pub id: String,
    pub display_name: String,
    /// Base length in ticks
    pub duration: u32,
    /// Drop the craft instead of stalling when a tick fails
    pub cancel_on_failure: bool,
    pub requirements: Vec<Requirement>,
}

impl RecipeDefinition {
    /// Create a resolved RecipeDefinition from raw TOML data
    pub fn from_raw(id: &str, raw: &RawRecipeDefinition) -> Result<Self, String> {
        let requirements = raw
            .requirements
            .iter()
            .enumerate()
            .map(|(index, r)| r.resolve().map_err(|e| format!("requirement {}: {}", index, e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.to_string(),
            display_name: raw
                .display_name
                .clone()
                .unwrap_or_else(|| id.replace('_', " ")),
            duration: raw.duration.max(1),
            cancel_on_failure: raw.cancel_on_failure,
            requirements,
        })
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.io() == IoType::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.io() == IoType::Output)
    }

    pub fn snapshots(&self) -> Vec<RequirementSnapshot> {
        self.requirements.iter().map(ComponentRequirement::snapshot).collect()
    }
}
