#![allow(dead_code)]

use std::net::SocketAddr;

use finance_dashboard::backend::{build_router, AppState};
use finance_dashboard::config::ServerConfig;
use finance_dashboard::database::db::{connection::get_db_pool, migrate::run_migrations};
use serde_json::Value;
use tempfile::TempDir;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub http: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("dashboard.db").display());
        let pool = get_db_pool(&url).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");

        let config = ServerConfig {
            cors_origins: vec!["http://localhost:3000".into()],
            ..ServerConfig::default()
        };
        let state = AppState::new(pool, config).await.expect("state");
        let app = build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            addr,
            state,
            http: reqwest::Client::new(),
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("post");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("json body"))
    }

    pub async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.http.delete(self.url(path)).send().await.expect("delete");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("json body"))
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.http.get(self.url(path)).send().await.expect("get");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("json body"))
    }

    pub async fn dashboard(&self) -> Value {
        let (status, body) = self.get("/api/v1/dashboard").await;
        assert_eq!(status, 200);
        body["data"].clone()
    }
}
