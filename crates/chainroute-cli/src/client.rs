//! Thin JSON client for the node's HTTP API.

use anyhow::{bail, Context};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Where `chainroute-node` listens by default.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9300";

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

pub struct NodeClient {
    http: Client,
    endpoint: String,
}

impl NodeClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.endpoint, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self.http.get(self.url(path)).send().await;
        self.decode(resp).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let resp = self.http.post(self.url(path)).json(body).send().await;
        self.decode(resp).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let resp = self.http.put(self.url(path)).json(body).send().await;
        self.decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        resp: reqwest::Result<Response>,
    ) -> anyhow::Result<T> {
        let resp = resp.with_context(|| {
            format!(
                "could not reach node at {} (is chainroute-node running?)",
                self.endpoint
            )
        })?;
        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.context("decoding node response");
        }
        match resp.json::<ErrorResponse>().await {
            Ok(err) => bail!("request failed (HTTP {}): {}", status, err.error),
            Err(_) => bail!("request failed (HTTP {})", status),
        }
    }
}
