use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::users;
use crate::db::{repo, Database};
use crate::error::Result;

pub struct AppState {
    pub db: Database,
    schema_ready: OnceCell<()>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            schema_ready: OnceCell::new(),
        }
    }

    /// The database, with the users table created on first successful use.
    /// A failed attempt is retried by the next request.
    pub async fn database(&self) -> std::result::Result<&Database, sqlx::Error> {
        self.schema_ready
            .get_or_try_init(|| repo::create_user_table(&self.db))
            .await?;
        Ok(&self.db)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(users::root))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, db: Database) -> Result<()> {
    let state = Arc::new(AppState::new(db));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Server is running");

    axum::serve(listener, app).await?;

    Ok(())
}
