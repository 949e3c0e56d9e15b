mod api;
mod auth;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use librarian_core::{LibrarianError, Result, ServerSettings};
use librarian_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub settings: Arc<ServerSettings>,
}

pub struct HttpServer {
    db: Arc<Database>,
    settings: Arc<ServerSettings>,
}

impl HttpServer {
    pub fn new(db: Arc<Database>, settings: Arc<ServerSettings>) -> Self {
        Self { db, settings }
    }

    pub async fn run(&self) -> Result<()> {
        let app = self.create_router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.settings.http_port));
        info!("HTTP server listening on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await.map_err(LibrarianError::Io)?;

        Ok(())
    }

    fn create_router(&self) -> Router {
        let state = AppState {
            db: self.db.clone(),
            settings: self.settings.clone(),
        };

        let admin_routes = Router::new()
            .route("/instances/delete_instance", post(api::delete_instance))
            .route("/admin/manifest", post(api::admin_manifest))
            .route("/admin/store_state", post(api::admin_store_state))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin_token,
            ));

        let public_routes = Router::new()
            .route("/clone/complete", post(api::clone_complete))
            .route("/recommended_store", post(api::recommended_store))
            .route("/complete_upload", post(api::complete_upload))
            .route("/errors", get(api::recent_errors))
            .route("/stores/{name}", get(api::get_store));

        Router::new()
            .nest("/api/v2", admin_routes.merge(public_routes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
