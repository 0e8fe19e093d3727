//! Loading Errors
//!
//! Failures while reading recipe files or the server configuration.
//! Crafting outcomes are never errors; see `CraftCheck`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid recipe '{recipe}' in {path:?}: {reason}")]
    Invalid {
        path: PathBuf,
        recipe: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Machine '{machine}' references unknown recipe '{recipe}'")]
    UnknownRecipe { machine: String, recipe: String },

    #[error("Machine '{machine}' has more than one component with id {id}")]
    DuplicateComponent { machine: String, id: u32 },

    #[error("Machine '{machine}': {reason}")]
    InvalidMachine { machine: String, reason: String },

    #[error(transparent)]
    Recipes(#[from] RecipeError),
}
