//! HTTP server module for sqlspell
//!
//! Serves the level data and grading endpoints used by the game frontend.
//!
//! # Routes
//!
//! - `GET /health` - liveness probe, answers `OK`
//! - `POST /leveldata` - level record by composite key, or only its solution
//! - `POST /playground` - grade a submitted query against a level
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlspell::database::SqliteLevelStore;
//! use sqlspell::lens::grade::GradeLens;
//! use sqlspell::server::{start_server, ServerConfig, ServerState};
//! use std::sync::Arc;
//!
//! let store = SqliteLevelStore::open("levels.sqlite3")?;
//! let state = ServerState::new(Arc::new(store), GradeLens::default());
//! start_server(state, ServerConfig::default()).await?;
//! ```

pub mod handler;
pub mod handlers;
pub mod protocol;

pub use handler::{ApiError, ApiResult, ErrorCode};
pub use protocol::{ApiResponse, ErrorBody, GradeRequest, GradeResponse, LevelDataRequest};

use axum::{
    routing::{get, post},
    Router as AxumRouter,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::SpellConfig;
use crate::database::LevelStore;
use crate::lens::grade::GradeLens;

// =============================================================================
// Server Configuration
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub address: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl From<&SpellConfig> for ServerConfig {
    fn from(config: &SpellConfig) -> Self {
        Self {
            address: config.address.clone(),
            port: config.port,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the full bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

// =============================================================================
// Server State
// =============================================================================

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Level records
    pub store: Arc<dyn LevelStore>,

    /// Grader shared by all requests
    pub grader: Arc<GradeLens>,
}

impl ServerState {
    pub fn new(store: Arc<dyn LevelStore>, grader: GradeLens) -> Self {
        Self {
            store,
            grader: Arc::new(grader),
        }
    }
}

// =============================================================================
// Axum Router Creation
// =============================================================================

/// Create the Axum router serving all routes
pub fn create_axum_router(state: ServerState) -> AxumRouter {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    AxumRouter::new()
        .route("/health", get(health_handler))
        .route("/leveldata", post(handlers::level_data))
        .route("/playground", post(handlers::grade))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler() -> &'static str {
    "OK"
}

// =============================================================================
// Server Startup
// =============================================================================

/// Start the HTTP server and serve until the process exits
pub async fn start_server(state: ServerState, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_axum_router(state);

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
