use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use tower_http::trace::TraceLayer;

mod config;
mod middleware;
mod models;
mod observability;
mod purge;
mod routes;
mod state;
mod stores;

#[cfg(test)]
mod tests;

use config::{ClearoutConfig, DatabaseConfig};
use purge::PurgeController;
use routes::ApiError;
use state::{InMemoryJobStateRepo, JobStateRepo};
use stores::{PlatformClient, WooAccountStore, WooOrderStore};

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClearoutConfig>,
    /// Absent when no `[platform]` section is configured (setup mode).
    pub controller: Option<Arc<PurgeController>>,
}

impl AppState {
    /// The purge controller, or the setup-mode error before any mutation.
    pub fn controller(&self) -> Result<&Arc<PurgeController>, ApiError> {
        self.controller.as_ref().ok_or(ApiError::PlatformRequired)
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Clearout commerce-platform purge service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./clearout.toml if it exists)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the purge service (default)
    Serve,
    /// Write a starter configuration file
    Init {
        /// Path to create the config file (defaults to ./clearout.toml)
        #[arg(short, long)]
        output: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Init { output, force }) => run_init(output, force),
        Some(Command::Serve) | None => run_server(args.config.as_deref()).await,
    }
}

const DEFAULT_CONFIG_PATH: &str = "clearout.toml";

const CONFIG_TEMPLATE: &str = r#"# Clearout configuration.
# Values in ${VAR} form are read from the environment at startup.

[server]
host = "127.0.0.1"
port = 8710
# public_url = "https://purge.internal.example.com"

# Persist job state so an interrupted chain can resume after a restart.
[database]
type = "sqlite"
path = "clearout.db"

# The WooCommerce site to purge.
# [platform]
# base_url = "https://shop.example.com"
# consumer_key = "${WC_CONSUMER_KEY}"
# consumer_secret = "${WC_CONSUMER_SECRET}"

[purge]
batch_size = 200
token_ttl_hours = 12
order_statuses = ["any"]
account_roles = ["customer", "subscriber"]

[[auth.operator_keys]]
name = "ops"
key = "${CLEAROUT_OPERATOR_KEY}"
capabilities = ["purge:run", "purge:read"]
"#;

fn run_init(output: Option<String>, force: bool) {
    let path = output.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let path = std::path::Path::new(&path);

    if path.exists() && !force {
        eprintln!(
            "Config file already exists: {}\nUse --force to overwrite.",
            path.display()
        );
        std::process::exit(1);
    }

    if let Err(e) = std::fs::write(path, CONFIG_TEMPLATE) {
        eprintln!("Failed to write {}: {}", path.display(), e);
        std::process::exit(1);
    }
    println!("Wrote {}", path.display());
}

fn load_config(path: Option<&str>) -> ClearoutConfig {
    let path = match path {
        Some(path) => path.to_string(),
        None => {
            if !std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
                return ClearoutConfig::default();
            }
            DEFAULT_CONFIG_PATH.to_string()
        }
    };

    match ClearoutConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_server(config_path: Option<&str>) {
    let config = load_config(config_path);
    observability::init_tracing(&config.observability);

    let state = match build_state(config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let addr = std::net::SocketAddr::new(state.config.server.host, state.config.server.port);
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "Clearout listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Wire the job-state repository and (when a platform is configured) the
/// store adapters and controller.
async fn build_state(config: ClearoutConfig) -> Result<AppState, String> {
    let job_state: Arc<dyn JobStateRepo> = match &config.database {
        DatabaseConfig::None => {
            tracing::warn!(
                "No database configured; job state is in-memory and a restart abandons the job"
            );
            Arc::new(InMemoryJobStateRepo::new())
        }
        #[cfg(feature = "database-sqlite")]
        DatabaseConfig::Sqlite(sqlite) => {
            let repo = state::SqliteJobStateRepo::connect(&sqlite.path, sqlite.create_if_missing)
                .await
                .map_err(|e| format!("Failed to open job-state database: {e}"))?;
            tracing::info!(path = %sqlite.path, "Job state persisted to SQLite");
            Arc::new(repo)
        }
    };

    let controller = match &config.platform {
        Some(platform) => {
            let client = Arc::new(
                PlatformClient::from_config(platform)
                    .map_err(|e| format!("Failed to build platform client: {e}"))?,
            );
            Some(Arc::new(PurgeController::new(
                job_state,
                Arc::new(WooOrderStore::new(client.clone())),
                Arc::new(WooAccountStore::new(client)),
                config.purge.clone(),
            )))
        }
        None => {
            tracing::warn!("No [platform] configured; running in setup mode");
            None
        }
    };

    Ok(AppState {
        config: Arc::new(config),
        controller,
    })
}

fn build_router(state: AppState) -> Router {
    let operator_routes = Router::new()
        .route(
            "/admin/v1/purge",
            get(routes::purge::status).post(routes::purge::start),
        )
        .route("/admin/v1/purge/steps", post(routes::purge::step))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::operator_auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(operator_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
