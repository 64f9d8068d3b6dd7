//! Password-gated admin console.
//!
//! Every route expects the shared secret as `?pass=`. The secret is checked
//! here and nowhere else; services below never see it.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{prelude::*, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct Auth {
  #[serde(default)]
  pub pass: String,
}

/// Static shared secret, compared by exact string equality.
pub fn authorize(app: &AppState, auth: &Auth) -> Result<()> {
  if auth.pass == app.secret {
    Ok(())
  } else {
    warn!("Rejected admin request with a wrong password");
    Err(Error::Unauthorized)
  }
}

#[derive(Debug, Serialize)]
pub struct KeyView {
  pub key: String,
  pub count: usize,
  pub capacity: u32,
  pub identities: Vec<String>,
}

impl From<LicenseKey> for KeyView {
  fn from(key: LicenseKey) -> Self {
    Self {
      key: key.id,
      count: key.identities.len(),
      capacity: key.capacity,
      identities: key.identities,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub created: bool,
  #[serde(flatten)]
  pub key: KeyView,
}

#[derive(Debug, Serialize)]
pub struct Changed {
  pub changed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateReq {
  pub key: String,
  #[serde(default, alias = "max")]
  pub capacity: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateReq {
  #[serde(default, alias = "max")]
  pub capacity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BanReq {
  #[serde(alias = "nick", alias = "device")]
  pub identity: String,
}

pub async fn list_keys(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
) -> Result<Json<Vec<KeyView>>> {
  authorize(&app, &auth)?;
  let keys = app.sv().keys.all().await?;
  Ok(Json(keys.into_iter().map(KeyView::from).collect()))
}

pub async fn create_key(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Json(req): Json<CreateReq>,
) -> Result<Json<Created>> {
  authorize(&app, &auth)?;
  let (key, created) = app.sv().keys.create(&req.key, req.capacity).await?;
  Ok(Json(Created { created, key: key.into() }))
}

pub async fn generate_key(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Json(req): Json<GenerateReq>,
) -> Result<Json<KeyView>> {
  authorize(&app, &auth)?;
  let key = app.sv().keys.generate(req.capacity).await?;
  Ok(Json(key.into()))
}

pub async fn get_key(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Path(key): Path<String>,
) -> Result<Json<KeyView>> {
  authorize(&app, &auth)?;
  let key = app.sv().keys.by_id(&key).await?.ok_or(Error::KeyNotFound)?;
  Ok(Json(key.into()))
}

pub async fn revoke_key(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Path(key): Path<String>,
) -> Result<Json<Changed>> {
  authorize(&app, &auth)?;
  let changed = app.sv().keys.revoke(&key).await?;
  Ok(Json(Changed { changed }))
}

pub async fn unbind(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Path((key, identity)): Path<(String, String)>,
) -> Result<Json<Changed>> {
  authorize(&app, &auth)?;
  let changed = app.sv().keys.unbind(&key, &identity).await?;
  Ok(Json(Changed { changed }))
}

pub async fn list_bans(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
) -> Result<Json<Vec<String>>> {
  authorize(&app, &auth)?;
  Ok(Json(app.sv().bans.all().await?))
}

pub async fn ban(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Json(req): Json<BanReq>,
) -> Result<Json<Changed>> {
  authorize(&app, &auth)?;
  let changed = app.sv().bans.ban(&req.identity).await?;
  Ok(Json(Changed { changed }))
}

pub async fn unban(
  State(app): State<Arc<AppState>>,
  Query(auth): Query<Auth>,
  Path(identity): Path<String>,
) -> Result<Json<Changed>> {
  authorize(&app, &auth)?;
  let changed = app.sv().bans.unban(&identity).await?;
  Ok(Json(Changed { changed }))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    plugins::server::router,
    state::Config,
    store,
  };

  async fn app(policy: Policy) -> Arc<AppState> {
    let store = store::tests::sql(policy).await;
    let config = Config { policy, ..Config::default() };
    Arc::new(AppState::with_store(store, "hunter2".into(), config))
  }

  async fn call(
    app: &Arc<AppState>,
    method: Method,
    uri: &str,
    body: Option<json::Value>,
  ) -> (StatusCode, json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(body) => builder
        .header("content-type", "application/json")
        .body(Body::from(body.to_string())),
      None => builder.body(Body::empty()),
    }
    .unwrap();

    let res = router(app.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn test_wrong_password_is_rejected() {
    let app = app(Policy::Device).await;

    for uri in ["/admin/keys", "/admin/keys?pass=", "/admin/keys?pass=Hunter2"]
    {
      let (status, body) = call(&app, Method::GET, uri, None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
      assert_eq!(body["success"], false);
    }

    let (status, _) = call(
      &app,
      Method::POST,
      "/admin/keys?pass=nope",
      Some(json::json!({ "key": "K" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.get_key("K").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_key_lifecycle() {
    let app = app(Policy::Device).await;

    let (status, body) = call(
      &app,
      Method::POST,
      "/admin/keys?pass=hunter2",
      Some(json::json!({ "key": "PATRON001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);
    assert_eq!(body["capacity"], 2);

    app.sv().admission.register("PATRON001", "hw-1").await.unwrap();
    app.sv().admission.register("PATRON001", "hw-2").await.unwrap();

    let (_, body) =
      call(&app, Method::GET, "/admin/keys?pass=hunter2", None).await;
    assert_eq!(
      body,
      json::json!([{
        "key": "PATRON001",
        "count": 2,
        "capacity": 2,
        "identities": ["hw-1", "hw-2"]
      }])
    );

    let (_, body) = call(
      &app,
      Method::DELETE,
      "/admin/keys/PATRON001/identities/hw-1?pass=hunter2",
      None,
    )
    .await;
    assert_eq!(body["changed"], true);

    let (_, body) =
      call(&app, Method::GET, "/admin/keys/PATRON001?pass=hunter2", None).await;
    assert_eq!(body["identities"], json::json!(["hw-2"]));
    assert_eq!(body["count"], 1);

    let (_, body) =
      call(&app, Method::DELETE, "/admin/keys/PATRON001?pass=hunter2", None)
        .await;
    assert_eq!(body["changed"], true);

    let (status, body) =
      call(&app, Method::DELETE, "/admin/keys/PATRON001?pass=hunter2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);

    let (status, _) =
      call(&app, Method::GET, "/admin/keys/PATRON001?pass=hunter2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn test_generate_key() {
    let app = app(Policy::Device).await;

    let (status, body) = call(
      &app,
      Method::POST,
      "/admin/keys/generate?pass=hunter2",
      Some(json::json!({ "capacity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capacity"], 4);

    let id = body["key"].as_str().unwrap();
    assert!(app.store.get_key(id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_bans() {
    let app = app(Policy::Nickname).await;

    let (_, body) = call(
      &app,
      Method::POST,
      "/admin/bans?pass=hunter2",
      Some(json::json!({ "identity": "BadUser" })),
    )
    .await;
    assert_eq!(body["changed"], true);

    let (_, body) =
      call(&app, Method::GET, "/admin/bans?pass=hunter2", None).await;
    assert_eq!(body, json::json!(["baduser"]));

    let (_, body) =
      call(&app, Method::DELETE, "/admin/bans/baduser?pass=hunter2", None)
        .await;
    assert_eq!(body["changed"], true);
  }

  #[tokio::test]
  async fn test_bans_disabled_in_device_mode() {
    let app = app(Policy::Device).await;

    let (status, _) =
      call(&app, Method::GET, "/admin/bans?pass=hunter2", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
