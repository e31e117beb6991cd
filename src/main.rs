// This is the entry point of the moderation pipeline service.
//
// **Architecture Overview:**
// - `core/` = Business logic (transport-agnostic)
// - `infra/` = Implementations of core traits (databases, collaborators)
// - `api/` = HTTP-specific adapters (routes, DTOs, status codes)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Build the axum router
// 4. Serve

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "api/api_layer.rs"]
mod api;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::api::{AppState, Pipeline};
use crate::core::actions::ActionLedger;
use crate::core::audit::AuditLog;
use crate::core::flags::FlagService;
use crate::infra::access::{InMemoryContentStore, StaticAuthorizer};
use crate::infra::actions::SqliteActionStore;
use crate::infra::audit::SqliteAuditStore;
use crate::infra::flags::SqliteFlagStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    std::fs::create_dir_all(&data_dir)?;
    let db_path = format!("{}/moderation.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", db_path))
        .await?;

    let flag_store = SqliteFlagStore::new(pool.clone());
    flag_store.migrate().await?;
    let action_store = SqliteActionStore::new(pool.clone());
    action_store.migrate().await?;
    let audit_store = SqliteAuditStore::new(pool);
    audit_store.migrate().await?;

    // Privileged operator ids come from the environment until a real RBAC
    // collaborator is wired in.
    let moderator_ids = std::env::var("MODERATOR_IDS").unwrap_or_default();
    let authorizer = Arc::new(StaticAuthorizer::from_csv(&moderator_ids));

    // Stand-in for the content service; permissive existence checks unless
    // content is seeded explicitly.
    let content = Arc::new(InMemoryContentStore::permissive());

    let pipeline: Arc<Pipeline> = Arc::new(FlagService::new(
        flag_store,
        ActionLedger::new(action_store),
        AuditLog::new(audit_store),
        authorizer,
        content,
    ));

    // ========================================================================
    // HTTP SERVER SETUP
    // ========================================================================

    let app = api::create_router(AppState { flags: pipeline });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    tracing::info!(%bind_addr, "Moderation pipeline listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
