//! Typed client for the graph HTTP API.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use ensgraph_core::{BatchAddResult, FriendRelationship, GraphView, NodeRecord};
use log::debug;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "http://localhost:3002";

/// Operations the graph API exposes; implemented over HTTP and by test fakes.
#[async_trait]
pub trait FriendsApi: Send + Sync {
    async fn get_graph(&self) -> ClientResult<GraphView>;

    async fn list_relationships(&self) -> ClientResult<Vec<FriendRelationship>>;

    async fn add_relationship(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> ClientResult<FriendRelationship>;

    async fn add_relationships_batch(
        &self,
        pairs: &[(String, String)],
    ) -> ClientResult<BatchAddResult>;

    async fn delete_relationship(&self, user_id: &str, friend_id: &str) -> ClientResult<()>;

    async fn add_node(&self, ens_name: &str) -> ClientResult<NodeRecord>;

    /// Returns the number of distinct names stored.
    async fn add_nodes_batch(&self, ens_names: &[String]) -> ClientResult<usize>;

    async fn delete_node(&self, ens_name: &str) -> ClientResult<()>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    error: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct PairBody<'a> {
    user_id: &'a str,
    friend_id: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchBody<'a> {
    relationships: Vec<PairBody<'a>>,
}

#[derive(Debug, Deserialize)]
struct NodesBatchCreated {
    created: usize,
}

/// Envelope-aware HTTP implementation of [`FriendsApi`].
#[derive(Debug, Clone)]
pub struct HttpFriendsApi {
    http: Client,
    base_url: Url,
}

impl HttpFriendsApi {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/friends/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "friends"])
            .extend(segments);
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&(impl Serialize + Sync)>,
    ) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        debug!("event=api_request module=client method={method} url={url}");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope: Envelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) => return Err(ClientError::Status(status.as_u16())),
        };
        if !status.is_success() || !envelope.success {
            return Err(match envelope.error {
                Some(message) => ClientError::Api {
                    status: status.as_u16(),
                    message,
                    code: envelope.code,
                },
                None => ClientError::Status(status.as_u16()),
            });
        }
        Ok(serde_json::from_value(envelope.data)?)
    }
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl FriendsApi for HttpFriendsApi {
    async fn get_graph(&self) -> ClientResult<GraphView> {
        self.request(Method::GET, &["graph"], NO_BODY).await
    }

    async fn list_relationships(&self) -> ClientResult<Vec<FriendRelationship>> {
        self.request(Method::GET, &["relationships"], NO_BODY).await
    }

    async fn add_relationship(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> ClientResult<FriendRelationship> {
        let body = PairBody { user_id, friend_id };
        self.request(Method::POST, &["add"], Some(&body)).await
    }

    async fn add_relationships_batch(
        &self,
        pairs: &[(String, String)],
    ) -> ClientResult<BatchAddResult> {
        let body = BatchBody {
            relationships: pairs
                .iter()
                .map(|(user_id, friend_id)| PairBody { user_id, friend_id })
                .collect(),
        };
        self.request(Method::POST, &["batch"], Some(&body)).await
    }

    async fn delete_relationship(&self, user_id: &str, friend_id: &str) -> ClientResult<()> {
        let body = PairBody { user_id, friend_id };
        self.request(Method::DELETE, &["delete"], Some(&body)).await
    }

    async fn add_node(&self, ens_name: &str) -> ClientResult<NodeRecord> {
        let body = serde_json::json!({ "ens_name": ens_name });
        self.request(Method::POST, &["nodes"], Some(&body)).await
    }

    async fn add_nodes_batch(&self, ens_names: &[String]) -> ClientResult<usize> {
        let body = serde_json::json!({ "ens_names": ens_names });
        let created: NodesBatchCreated = self
            .request(Method::POST, &["nodes", "batch"], Some(&body))
            .await?;
        Ok(created.created)
    }

    async fn delete_node(&self, ens_name: &str) -> ClientResult<()> {
        self.request(Method::DELETE, &["nodes", ens_name], NO_BODY).await
    }
}
