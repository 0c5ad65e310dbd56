// Define data modules
mod error; // Error enum shared by handlers and the scheduler
mod logic; // Core task-list semantics (filters, sorts, recurrence)
mod models; // Data structures (Task, CustomView, NotifyConfig, etc.)
mod notify; // Notification dispatch (desktop / SMTP)
mod routes_tasks; // HTTP handlers for task APIs
mod routes_views; // HTTP handlers for view & config APIs
mod scheduler; // Background reminder poll loop
mod store; // Persistent storage (tasks / views / notify config)

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::sync::watch;
use tower_http::services::ServeDir; // Used to serve static files (HTML/CSS/JS)
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::models::NotifyConfig;
use crate::scheduler::Scheduler;
use crate::store::Store;

/// Everything the handlers need, passed explicitly. The notification
/// config is shared with the scheduler and replaced wholesale on
/// reconfiguration.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub notify: Arc<RwLock<NotifyConfig>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("TASKNEST_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let addr: SocketAddr = std::env::var("TASKNEST_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()?;
    let poll_secs: u64 = std::env::var("TASKNEST_POLL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);

    let store = Store::new(data_dir);
    let notify = Arc::new(RwLock::new(store.load_notify_config()?));
    let state = AppState { store: store.clone(), notify: Arc::clone(&notify) };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(store, notify, Duration::from_secs(poll_secs));
    let reminder_loop = scheduler.spawn(shutdown_rx);

    let api = Router::new()
        // tasks
        .route("/tasks", get(routes_tasks::list_tasks).post(routes_tasks::create_task))
        .route("/tasks/:id", put(routes_tasks::update_task).delete(routes_tasks::delete_task))
        .route("/tasks/:id/done", post(routes_tasks::complete_task))
        // views
        .route("/views", get(routes_views::list_views))
        .route("/views/:name", put(routes_views::put_view).delete(routes_views::delete_view))
        // notification config
        .route("/config", get(routes_views::get_config).put(routes_views::put_config));

    let app = Router::new()
        .nest("/api", api)
        .nest_service("/", ServeDir::new("static"))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    info!("API base:     http://{}/api", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        })
        .await?;

    info!("Received shutdown signal... Shutting down...");
    let _ = shutdown_tx.send(true);
    let _ = reminder_loop.await;

    Ok(())
}
