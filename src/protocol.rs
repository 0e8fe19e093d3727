use serde::Serialize;

use crate::component::{ComponentHandle, ComponentId, ComponentType, IoType, MachineComponent};
use crate::crafting::RecipeDefinition;
use crate::fluid::HybridFluid;
use crate::machine::{Machine, MachineStatus};
use crate::requirement::RequirementSnapshot;

// ============================================================================
// Recipe Views
// ============================================================================

/// Recipe definition for inspection clients
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub display_name: String,
    pub duration: u32,
    pub cancel_on_failure: bool,
    pub requirements: Vec<RequirementSnapshot>,
}

impl RecipeView {
    pub fn from_definition(recipe: &RecipeDefinition) -> Self {
        Self {
            id: recipe.id.clone(),
            display_name: recipe.display_name.clone(),
            duration: recipe.duration,
            cancel_on_failure: recipe.cancel_on_failure,
            requirements: recipe.snapshots(),
        }
    }
}

// ============================================================================
// Machine Views
// ============================================================================

/// What a component currently holds
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ComponentContents {
    Energy {
        stored: u64,
        capacity: u64,
    },
    Tank {
        capacity: u32,
        contents: Option<HybridFluid>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub io: IoType,
    #[serde(flatten)]
    pub contents: ComponentContents,
}

impl ComponentView {
    pub fn from_component(component: &MachineComponent) -> Self {
        let contents = match component.handle() {
            ComponentHandle::Energy(handler) => ComponentContents::Energy {
                stored: handler.current_energy(),
                capacity: handler.max_energy(),
            },
            ComponentHandle::Tank(tank) => ComponentContents::Tank {
                capacity: tank.capacity(),
                contents: tank.contents().cloned(),
            },
        };
        Self {
            id: component.id(),
            component_type: component.component_type(),
            io: component.io(),
            contents,
        }
    }
}

/// Machine state for inspection clients
#[derive(Debug, Clone, Serialize)]
pub struct MachineView {
    pub id: String,
    pub display_name: String,
    pub status: MachineStatus,
    /// Progress of the active craft in [0, 1]
    pub progress: Option<f32>,
    pub completed: u64,
    pub components: Vec<ComponentView>,
}

impl MachineView {
    pub fn from_machine(machine: &Machine) -> Self {
        Self {
            id: machine.id().to_string(),
            display_name: machine.display_name().to_string(),
            status: machine.status().clone(),
            progress: machine.active().map(|a| a.progress()),
            completed: machine.completed(),
            components: machine.components().iter().map(ComponentView::from_component).collect(),
        }
    }
}
