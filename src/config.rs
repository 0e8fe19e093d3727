//! Server Configuration
//!
//! `config.toml` describes the tick server and the machines it simulates.
//!
//! ```toml
//! bind_addr = "0.0.0.0:8080"
//! tick_rate = 20
//! data_dir = "data"
//!
//! [[machines]]
//! id = "boiler"
//! recipes = ["steam_boiling"]
//!
//! [[machines.components]]
//! id = 0
//! type = "energy"
//! io = "input"
//! capacity = 10000
//! stored = 5000
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::info;

use crate::component::{ComponentId, EnergyBuffer, HybridTank, IoType, MachineComponent};
use crate::crafting::{ModifierSet, RecipeModifier, RecipeRegistry};
use crate::error::ConfigError;
use crate::fluid::FluidStack;
#[cfg(feature = "gas")]
use crate::fluid::GasStack;
use crate::machine::Machine;
use crate::tag::TagCompound;

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_tick_rate() -> u32 {
    20
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Game ticks per second
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub machines: Vec<MachineConfig>,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.tick_rate.max(1) as u64)
    }

    /// Build every configured machine against the loaded recipes
    pub fn build_machines(&self, registry: &RecipeRegistry) -> Result<Vec<Machine>, ConfigError> {
        let mut seen = HashSet::new();
        let mut machines = Vec::with_capacity(self.machines.len());
        for config in &self.machines {
            if !seen.insert(config.id.as_str()) {
                return Err(ConfigError::InvalidMachine {
                    machine: config.id.clone(),
                    reason: "duplicate machine id".to_string(),
                });
            }
            machines.push(config.build(registry)?);
        }
        Ok(machines)
    }
}

// ============================================================================
// Machines
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    pub id: String,
    pub display_name: Option<String>,
    /// Recipe ids in priority order
    #[serde(default)]
    pub recipes: Vec<String>,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
    #[serde(default)]
    pub modifiers: Vec<RecipeModifier>,
    /// Fixed chance seed; random when unset
    pub seed: Option<u64>,
}

impl MachineConfig {
    pub fn build(&self, registry: &RecipeRegistry) -> Result<Machine, ConfigError> {
        if let Some(recipe) = self.recipes.iter().find(|r| !registry.contains(r)) {
            return Err(ConfigError::UnknownRecipe {
                machine: self.id.clone(),
                recipe: recipe.clone(),
            });
        }

        let mut ids = HashSet::new();
        let mut components = Vec::with_capacity(self.components.len());
        for component in &self.components {
            if !ids.insert(component.id()) {
                return Err(ConfigError::DuplicateComponent {
                    machine: self.id.clone(),
                    id: component.id(),
                });
            }
            let built = component.build().map_err(|reason| ConfigError::InvalidMachine {
                machine: self.id.clone(),
                reason,
            })?;
            components.push(built);
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let display_name = self
            .display_name
            .clone()
            .unwrap_or_else(|| self.id.replace('_', " "));

        info!(
            "Built machine: {} ({}) - {} components, {} recipes",
            display_name,
            self.id,
            components.len(),
            self.recipes.len()
        );
        Ok(Machine::new(
            &self.id,
            &display_name,
            self.recipes.clone(),
            components,
            ModifierSet::new(self.modifiers.clone()),
            rng,
        ))
    }
}

// ============================================================================
// Components
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentConfig {
    Energy {
        id: u32,
        io: IoType,
        capacity: u64,
        #[serde(default)]
        stored: u64,
    },
    Fluid {
        id: u32,
        io: IoType,
        capacity: u32,
        /// Initial contents
        #[serde(default)]
        fluid: Option<String>,
        #[serde(default)]
        amount: u32,
        #[serde(default)]
        tag: Option<TagCompound>,
    },
    Gas {
        id: u32,
        io: IoType,
        capacity: u32,
        #[serde(default)]
        gas: Option<String>,
        #[serde(default)]
        amount: u32,
    },
}

impl ComponentConfig {
    pub fn id(&self) -> u32 {
        match self {
            ComponentConfig::Energy { id, .. }
            | ComponentConfig::Fluid { id, .. }
            | ComponentConfig::Gas { id, .. } => *id,
        }
    }

    pub fn build(&self) -> Result<MachineComponent, String> {
        match self {
            ComponentConfig::Energy { id, io, capacity, stored } => Ok(MachineComponent::energy(
                ComponentId(*id),
                *io,
                EnergyBuffer::new(*capacity, *stored),
            )),
            ComponentConfig::Fluid {
                id,
                io,
                capacity,
                fluid,
                amount,
                tag,
            } => {
                let mut tank = HybridTank::new(*capacity);
                if let Some(fluid) = fluid {
                    let stack = FluidStack::new(fluid, *amount).with_tag(tag.clone());
                    tank = tank.with_contents(stack.into());
                }
                Ok(MachineComponent::fluid(ComponentId(*id), *io, tank))
            }
            #[cfg(feature = "gas")]
            ComponentConfig::Gas {
                id,
                io,
                capacity,
                gas,
                amount,
            } => {
                let mut tank = HybridTank::with_gas(*capacity);
                if let Some(gas) = gas {
                    tank = tank.with_contents(GasStack::new(gas, *amount).into());
                }
                Ok(MachineComponent::gas(ComponentId(*id), *io, tank))
            }
            #[cfg(not(feature = "gas"))]
            ComponentConfig::Gas { id, .. } => Err(format!(
                "gas component {} needs the `gas` feature",
                id
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::EnergyHandler;
    use crate::crafting::ModifierTarget;

    const RECIPES: &str = r#"
[steam_boiling]
[[steam_boiling.requirements]]
type = "energy"
io = "input"
per_tick = 10
"#;

    fn registry() -> RecipeRegistry {
        let mut registry = RecipeRegistry::new();
        registry.load_from_str(RECIPES, Path::new("test.toml")).unwrap();
        registry
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            bind_addr = "127.0.0.1:9000"
            tick_rate = 10

            [[machines]]
            id = "steam_boiler"
            recipes = ["steam_boiling"]
            seed = 42

            [[machines.components]]
            id = 0
            type = "energy"
            io = "input"
            capacity = 10000
            stored = 5000

            [[machines.components]]
            id = 1
            type = "fluid"
            io = "input"
            capacity = 8000
            fluid = "water"
            amount = 4000
            tag = { purity = 2 }

            [[machines.modifiers]]
            target = "duration"
            operation = "multiply"
            amount = 0.5
        "#;

        let config = ServerConfig::parse(toml_str, Path::new("config.toml")).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.data_dir, PathBuf::from("data"));

        let machines = config.build_machines(&registry()).unwrap();
        let machine = &machines[0];
        assert_eq!(machine.display_name(), "steam boiler");
        assert_eq!(machine.components().len(), 2);
        assert_eq!(
            machine.components()[0].energy_handler().map(|h| h.current_energy()),
            Some(5000)
        );
        let water = machine.components()[1].tank().and_then(|t| t.contents()).unwrap();
        assert_eq!(water.amount(), 4000);
        assert_eq!(
            machine.modifiers().iter().next().map(|m| m.target),
            Some(ModifierTarget::Duration)
        );
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse("", Path::new("config.toml")).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.tick_rate, 20);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert!(config.machines.is_empty());
    }

    #[test]
    fn test_unknown_recipe() {
        let toml_str = r#"
            [[machines]]
            id = "mixer"
            recipes = ["nope"]
        "#;
        let config = ServerConfig::parse(toml_str, Path::new("config.toml")).unwrap();
        let err = config.build_machines(&registry()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRecipe { recipe, .. } if recipe == "nope"));
    }

    #[test]
    fn test_duplicate_component_ids() {
        let toml_str = r#"
            [[machines]]
            id = "mixer"

            [[machines.components]]
            id = 3
            type = "energy"
            io = "input"
            capacity = 10

            [[machines.components]]
            id = 3
            type = "fluid"
            io = "output"
            capacity = 10
        "#;
        let config = ServerConfig::parse(toml_str, Path::new("config.toml")).unwrap();
        let err = config.build_machines(&registry()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateComponent { id: 3, .. }));
    }

    #[test]
    fn test_duplicate_machine_ids() {
        let toml_str = r#"
            [[machines]]
            id = "mixer"

            [[machines]]
            id = "mixer"
        "#;
        let config = ServerConfig::parse(toml_str, Path::new("config.toml")).unwrap();
        assert!(config.build_machines(&registry()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServerConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[cfg(feature = "gas")]
    #[test]
    fn test_gas_component() {
        use crate::component::ComponentType;

        let component = ComponentConfig::Gas {
            id: 4,
            io: IoType::Output,
            capacity: 500,
            gas: Some("oxygen".to_string()),
            amount: 100,
        }
        .build()
        .unwrap();
        assert_eq!(component.component_type(), ComponentType::Gas);
        assert_eq!(component.tank().and_then(|t| t.contents()).map(|c| c.name()), Some("oxygen"));
    }
}
