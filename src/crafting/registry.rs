//! Machine Recipe Registry
//!
//! Loads and caches recipe definitions from TOML files.

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::definition::{RawRecipeDefinition, RecipeDefinition};
use crate::error::RecipeError;
use crate::protocol::RecipeView;

/// Registry for all recipe definitions
pub struct RecipeRegistry {
    recipes: HashMap<String, RecipeDefinition>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self {
            recipes: HashMap::new(),
        }
    }

    /// Load all recipe definitions from `<data_dir>/recipes`
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), RecipeError> {
        let recipes_dir = data_dir.join("recipes");

        if !recipes_dir.exists() {
            warn!("Recipes directory does not exist: {:?}", recipes_dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(&recipes_dir).map_err(|source| RecipeError::Io {
            path: recipes_dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| RecipeError::Io {
                path: recipes_dir.clone(),
                source,
            })?;
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "toml") {
                let content = std::fs::read_to_string(&path).map_err(|source| RecipeError::Io {
                    path: path.clone(),
                    source,
                })?;
                self.load_from_str(&content, &path)?;
            }
        }

        info!("Loaded {} recipe definitions", self.recipes.len());

        Ok(())
    }

    /// Parse one file's worth of recipes. `source` is only used in
    /// messages.
    pub fn load_from_str(&mut self, content: &str, source: &Path) -> Result<(), RecipeError> {
        // Parse as table of recipes
        let table: HashMap<String, RawRecipeDefinition> =
            toml::from_str(content).map_err(|e| RecipeError::Parse {
                path: source.to_path_buf(),
                source: e,
            })?;

        for (id, raw) in table {
            let recipe = RecipeDefinition::from_raw(&id, &raw).map_err(|reason| RecipeError::Invalid {
                path: source.to_path_buf(),
                recipe: id.clone(),
                reason,
            })?;
            if self.recipes.contains_key(&id) {
                warn!("Duplicate recipe ID '{}' in {:?}, overwriting", id, source);
            }
            info!(
                "Loaded recipe: {} ({}) - {} inputs -> {} outputs over {} ticks",
                recipe.display_name,
                id,
                recipe.inputs().count(),
                recipe.outputs().count(),
                recipe.duration
            );
            self.recipes.insert(id, recipe);
        }

        Ok(())
    }

    /// Get a recipe definition by ID
    pub fn get(&self, id: &str) -> Option<&RecipeDefinition> {
        self.recipes.get(id)
    }

    /// Get all recipe IDs
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.recipes.keys()
    }

    /// Get all recipes
    pub fn all(&self) -> impl Iterator<Item = &RecipeDefinition> {
        self.recipes.values()
    }

    /// Check if a recipe exists
    pub fn contains(&self, id: &str) -> bool {
        self.recipes.contains_key(id)
    }

    /// Get the number of loaded recipes
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Recipe views for inspection clients, sorted by id
    pub fn snapshots(&self) -> Vec<RecipeView> {
        let mut views: Vec<RecipeView> = self.recipes.values().map(RecipeView::from_definition).collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        views
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
