use anyhow::{anyhow, bail, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::state::{CreateGoalReq, CreateOutcomeReq, CreateRecordReq};
use crate::backend::response::Envelope;
use crate::dashboard::DashboardView;
use crate::database::models::{Goal, Outcome, Record};

/// HTTP client for the dashboard API.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    pub fn new(server_url: &str) -> Result<Self> {
        let base = server_url.trim().trim_end_matches('/').to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            bail!("server url must start with http:// or https://, got {server_url:?}");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("finance-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base, path)
    }

    pub fn events_url(&self) -> String {
        self.url("/realtime/events")
    }

    // ============= Dashboard =============

    pub async fn dashboard(&self) -> Result<DashboardView> {
        self.send(Method::GET, "/dashboard", None::<&()>).await
    }

    // ============= Goals =============

    pub async fn create_goal(&self, req: &CreateGoalReq) -> Result<Goal> {
        self.send(Method::POST, "/dashboard/goal", Some(req)).await
    }

    pub async fn delete_goal(&self, id: i64) -> Result<Goal> {
        self.send(Method::DELETE, &format!("/dashboard/goal/{id}"), None::<&()>)
            .await
    }

    // ============= Records =============

    pub async fn create_record(&self, req: &CreateRecordReq) -> Result<Record> {
        self.send(Method::POST, "/dashboard/record", Some(req)).await
    }

    pub async fn delete_record(&self, id: i64) -> Result<Record> {
        self.send(Method::DELETE, &format!("/dashboard/record/{id}"), None::<&()>)
            .await
    }

    // ============= Outcomes =============

    pub async fn create_outcome(&self, req: &CreateOutcomeReq) -> Result<Outcome> {
        self.send(Method::POST, "/dashboard/outcome", Some(req)).await
    }

    pub async fn delete_outcome(&self, id: i64) -> Result<Outcome> {
        self.send(Method::DELETE, &format!("/dashboard/outcome/{id}"), None::<&()>)
            .await
    }

    /// Sends a request and unwraps the `{ success, msg, data }` envelope.
    /// A failed envelope becomes an error carrying the server's message.
    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut req = self.http.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| anyhow!("unexpected response ({status}): {e}"))?;

        if !envelope.success || !status.is_success() {
            bail!(failure_message(status, envelope.msg));
        }
        envelope
            .data
            .ok_or_else(|| anyhow!("response ({status}) carried no data"))
    }
}

fn failure_message(status: StatusCode, msg: Option<String>) -> String {
    match msg {
        Some(msg) if !msg.is_empty() => msg,
        _ => format!("request failed with {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = Client::new(" http://127.0.0.1:5000/ ").unwrap();
        assert_eq!(client.url("/dashboard"), "http://127.0.0.1:5000/api/v1/dashboard");
        assert_eq!(
            client.events_url(),
            "http://127.0.0.1:5000/api/v1/realtime/events"
        );
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert!(Client::new("127.0.0.1:5000").is_err());
    }

    #[test]
    fn failure_prefers_server_message() {
        assert_eq!(
            failure_message(StatusCode::NOT_FOUND, Some("goal not found".into())),
            "goal not found"
        );
        assert_eq!(
            failure_message(StatusCode::BAD_GATEWAY, None),
            "request failed with 502 Bad Gateway"
        );
    }
}
