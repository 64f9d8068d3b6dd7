use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use serde::Deserialize;

use crate::{prelude::*, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ClientReq {
  #[serde(default)]
  pub key: Option<String>,
  #[serde(default, alias = "device", alias = "nick", alias = "nickname")]
  pub identity: Option<String>,
}

impl ClientReq {
  fn key(&self) -> &str {
    self.key.as_deref().unwrap_or_default()
  }

  fn identity(&self) -> &str {
    self.identity.as_deref().unwrap_or_default()
  }

  /// An unreadable body counts as one with no fields, so it still gets a
  /// verdict.
  fn or_empty(body: Result<Json<Self>, JsonRejection>) -> Self {
    match body {
      Ok(Json(req)) => req,
      Err(rejection) => {
        debug!("Unreadable client request: {rejection}");
        Self::default()
      }
    }
  }
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  body: Result<Json<ClientReq>, JsonRejection>,
) -> (StatusCode, Json<Verdict>) {
  let req = ClientReq::or_empty(body);
  match app.sv().admission.register(req.key(), req.identity()).await {
    Ok(verdict) => (StatusCode::OK, Json(verdict)),
    Err(err) => {
      error!("Register on key `{}` failed: {err}", req.key());
      (StatusCode::INTERNAL_SERVER_ERROR, Json(Verdict::deny()))
    }
  }
}

pub async fn validate(
  State(app): State<Arc<AppState>>,
  body: Result<Json<ClientReq>, JsonRejection>,
) -> (StatusCode, Json<Verdict>) {
  let req = ClientReq::or_empty(body);
  match app.sv().admission.validate(req.key(), req.identity()).await {
    Ok(verdict) => (StatusCode::OK, Json(verdict)),
    Err(err) => {
      error!("Validate on key `{}` failed: {err}", req.key());
      (StatusCode::INTERNAL_SERVER_ERROR, Json(Verdict::deny()))
    }
  }
}

pub async fn health() -> &'static str {
  "OK"
}

pub async fn ping() -> &'static str {
  "ok"
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use axum::{
    body::{Body, to_bytes},
    http::Request,
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    plugins::server::router,
    state::Config,
    store::{self, Append, Store},
  };

  async fn send(
    app: Arc<AppState>,
    req: Request<Body>,
  ) -> (StatusCode, json::Value) {
    let res = router(app).oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, json::from_slice(&bytes).unwrap())
  }

  async fn post(
    app: Arc<AppState>,
    uri: &str,
    body: json::Value,
  ) -> (StatusCode, json::Value) {
    let req = Request::post(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    send(app, req).await
  }

  async fn app(policy: Policy) -> Arc<AppState> {
    let store = store::tests::sql(policy).await;
    store.create_key("PATRON001", 2).await.unwrap();
    let config = Config { policy, ..Config::default() };
    Arc::new(AppState::with_store(store, "secret".into(), config))
  }

  #[tokio::test]
  async fn test_register_and_validate() {
    let app = app(Policy::Device).await;

    let (status, body) = post(
      app.clone(),
      "/api/register",
      json::json!({ "key": "PATRON001", "device": "hw-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json::json!({ "admitted": true }));

    let (_, body) = post(
      app.clone(),
      "/api/validate",
      json::json!({ "key": "PATRON001", "device": "hw-1" }),
    )
    .await;
    assert_eq!(body, json::json!({ "admitted": true }));

    let (_, body) = post(
      app.clone(),
      "/api/register",
      json::json!({ "key": "UNKNOWN", "device": "x" }),
    )
    .await;
    assert_eq!(
      body,
      json::json!({ "admitted": false, "reason": "invalid-key" })
    );
  }

  #[tokio::test]
  async fn test_missing_fields() {
    let app = app(Policy::Nickname).await;

    let (status, body) =
      post(app.clone(), "/api/register", json::json!({ "key": "PATRON001" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json::json!({ "admitted": false, "reason": "missing-data" })
    );

    let (_, body) =
      post(app, "/api/validate", json::json!({ "nick": "alice" })).await;
    assert_eq!(body, json::json!({ "admitted": false }));
  }

  #[tokio::test]
  async fn test_unreadable_body_is_missing_data() {
    let app = app(Policy::Device).await;

    let (status, body) = send(
      app.clone(),
      Request::post("/api/register").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json::json!({ "admitted": false, "reason": "missing-data" })
    );

    let (status, body) =
      send(app, Request::post("/api/validate").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json::json!({ "admitted": false }));
  }

  #[tokio::test]
  async fn test_wrong_field_type_is_missing_data() {
    let app = app(Policy::Device).await;

    let (status, body) = post(
      app.clone(),
      "/api/register",
      json::json!({ "key": 5, "device": "hw-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json::json!({ "admitted": false, "reason": "missing-data" })
    );

    let (_, body) =
      post(app.clone(), "/api/validate", json::json!(["PATRON001"])).await;
    assert_eq!(body, json::json!({ "admitted": false }));

    let key = app.store.get_key("PATRON001").await.unwrap().unwrap();
    assert!(key.identities.is_empty());
  }

  /// Store whose every call fails like an unreachable database.
  struct Down;

  #[async_trait]
  impl Store for Down {
    fn policy(&self) -> Policy {
      Policy::Nickname
    }
    async fn get_key(&self, _: &str) -> Result<Option<LicenseKey>> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn create_key(&self, _: &str, _: u32) -> Result<bool> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn delete_key(&self, _: &str) -> Result<bool> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn append_identity(&self, _: &str, _: &str) -> Result<Append> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn remove_identity(&self, _: &str, _: &str) -> Result<bool> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn is_banned(&self, _: &str) -> Result<bool> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn ban(&self, _: &str) -> Result<bool> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn unban(&self, _: &str) -> Result<bool> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn list_keys(&self) -> Result<Vec<LicenseKey>> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
    async fn list_bans(&self) -> Result<Vec<String>> {
      Err(sea_orm::DbErr::Custom("down".into()).into())
    }
  }

  #[tokio::test]
  async fn test_storage_failure_is_a_negative_verdict() {
    let config = Config { policy: Policy::Nickname, ..Config::default() };
    let app =
      Arc::new(AppState::with_store(Arc::new(Down), "secret".into(), config));

    for uri in ["/api/register", "/api/validate"] {
      let (status, body) = post(
        app.clone(),
        uri,
        json::json!({ "key": "PATRON001", "nick": "alice" }),
      )
      .await;
      assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
      assert_eq!(body, json::json!({ "admitted": false }));
    }
  }

  #[tokio::test]
  async fn test_ping() {
    let app = app(Policy::Device).await;
    let res = router(app)
      .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
  }
}
