use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use dashmap::DashMap;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use modular_machines::config::ServerConfig;
use modular_machines::protocol::MachineView;
use modular_machines::{Machine, RecipeRegistry};

// ============================================================================
// App State
// ============================================================================

#[derive(Clone)]
struct AppState {
    // Machine ID -> Machine
    machines: Arc<DashMap<String, Machine>>,
    // Recipe registry (loaded from TOML at startup)
    registry: Arc<RecipeRegistry>,
}

impl AppState {
    fn new(config: &ServerConfig) -> Result<Self, modular_machines::ConfigError> {
        // Load recipe registry from TOML files
        let mut registry = RecipeRegistry::new();
        registry.load_from_directory(&config.data_dir)?;

        let machines = DashMap::new();
        for machine in config.build_machines(&registry)? {
            machines.insert(machine.id().to_string(), machine);
        }
        info!("Loaded {} machines", machines.len());

        Ok(Self {
            machines: Arc::new(machines),
            registry: Arc::new(registry),
        })
    }

    fn tick(&self) {
        for mut machine in self.machines.iter_mut() {
            machine.tick(&self.registry);
        }
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis()
    }))
}

async fn list_recipes(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.snapshots())
}

async fn list_machines(State(state): State<AppState>) -> impl IntoResponse {
    let mut machines: Vec<MachineView> = state
        .machines
        .iter()
        .map(|machine| MachineView::from_machine(machine.value()))
        .collect();
    machines.sort_by(|a, b| a.id.cmp(&b.id));
    Json(machines)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("modular_machines=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match ServerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to build machines: {}", e);
            std::process::exit(1);
        }
    };

    // Spawn machine tick loop
    let tick_state = state.clone();
    let tick_interval = config.tick_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            tick_state.tick();
        }
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/recipes", get(list_recipes))
        .route("/machines", get(list_machines))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    info!("Machine server listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
