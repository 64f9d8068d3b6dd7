mod admin;
mod handlers;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
  Router,
  routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "http"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let router = router(app);

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let result =
      axum::serve(listener, router).await.context("Axum server error");
    match &result {
      Ok(_) => info!("Server stopped gracefully"),
      Err(err) => error!("Server stopped with error: {err}"),
    }
    result
  }
}

pub fn router(app: Arc<AppState>) -> Router {
  let admin = Router::new()
    .route("/keys", get(admin::list_keys).post(admin::create_key))
    .route("/keys/generate", post(admin::generate_key))
    .route("/keys/{key}", get(admin::get_key).delete(admin::revoke_key))
    .route("/keys/{key}/identities/{identity}", delete(admin::unbind))
    .route("/bans", get(admin::list_bans).post(admin::ban))
    .route("/bans/{identity}", delete(admin::unban));

  Router::new()
    .route("/health", get(handlers::health))
    .route("/ping", get(handlers::ping))
    .route("/api/register", post(handlers::register))
    .route("/api/validate", post(handlers::validate))
    .nest("/admin", admin)
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
          .allow_origin(Any)
          .allow_methods(Any)
          .allow_headers(Any),
      ),
    )
    .with_state(app)
}
