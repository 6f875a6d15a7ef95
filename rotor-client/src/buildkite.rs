//! Buildkite GraphQL API

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use rotor_core::dto::pipeline::PipelineRecord;
use rotor_core::service::{BuildService, ServiceResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::{handle_response, normalize_base_url};

/// Default Buildkite GraphQL endpoint
pub const DEFAULT_GRAPHQL_URL: &str = "https://graphql.buildkite.com/v1";

const PAGE_SIZE: u32 = 100;

const LIST_PIPELINES: &str = r#"
query ListPipelines($org: ID!, $first: Int!, $after: String) {
  organization(slug: $org) {
    slug
    pipelines(first: $first, after: $after) {
      pageInfo {
        hasNextPage
        endCursor
      }
      edges {
        node {
          id
          slug
          url
          repository {
            url
            provider {
              __typename
              webhookUrl
            }
          }
        }
      }
    }
  }
}
"#;

const ROTATE_WEBHOOK: &str = r#"
mutation RotateWebhook($input: PipelineRotateWebhookURLInput!) {
  pipelineRotateWebhookURL(input: $input) {
    pipeline {
      webhookURL
    }
  }
}
"#;

/// HTTP client for the Buildkite GraphQL API
#[derive(Clone)]
pub struct BuildkiteClient {
    /// GraphQL endpoint (e.g., "https://graphql.buildkite.com/v1")
    endpoint: String,
    /// API access token with GraphQL scope
    token: String,
    /// HTTP client instance
    client: Client,
}

impl fmt::Debug for BuildkiteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildkiteClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl BuildkiteClient {
    /// Create a client for the public Buildkite endpoint
    ///
    /// # Example
    /// ```
    /// use rotor_client::BuildkiteClient;
    ///
    /// let client = BuildkiteClient::new("my-token");
    /// assert_eq!(client.endpoint(), "https://graphql.buildkite.com/v1");
    /// ```
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_GRAPHQL_URL, token)
    }

    /// Create a client for a custom GraphQL endpoint
    pub fn with_endpoint(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(endpoint, token, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            endpoint: normalize_base_url(endpoint),
            token: token.into(),
            client,
        }
    }

    /// Get the GraphQL endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List every pipeline of an organization
    ///
    /// Follows the connection cursor until all pages are read.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the organization does not exist
    /// or the token cannot see it.
    pub async fn list_pipelines(&self, org: &str) -> Result<Vec<PipelineRecord>> {
        let mut records = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let data: ListPipelinesData = self
                .query(
                    LIST_PIPELINES,
                    json!({ "org": org, "first": PAGE_SIZE, "after": after }),
                )
                .await?;

            let organization = data
                .organization
                .ok_or_else(|| ClientError::NotFound(format!("organization {}", org)))?;
            let (page, next) = organization.pipelines.into_records();
            debug!("Fetched {} pipeline(s) for {}", page.len(), org);
            records.extend(page);

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        Ok(records)
    }

    /// Rotate a pipeline's webhook, returning the new delivery URL
    ///
    /// # Arguments
    /// * `pipeline_id` - GraphQL node ID of the pipeline
    pub async fn rotate_webhook(&self, pipeline_id: &str) -> Result<String> {
        let data: RotateWebhookData = self
            .query(ROTATE_WEBHOOK, json!({ "input": { "id": pipeline_id } }))
            .await?;

        Ok(data.pipeline_rotate_webhook_url.pipeline.webhook_url)
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(USER_AGENT, crate::USER_AGENT)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let body: GraphQlResponse = handle_response(response).await?;
        body.into_data()
    }
}

#[async_trait]
impl BuildService for BuildkiteClient {
    async fn list_pipelines(&self, org: &str) -> ServiceResult<Vec<PipelineRecord>> {
        Ok(BuildkiteClient::list_pipelines(self, org).await?)
    }

    async fn rotate_webhook(&self, pipeline_id: &str) -> ServiceResult<String> {
        Ok(BuildkiteClient::rotate_webhook(self, pipeline_id).await?)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

/// Raw GraphQL envelope
///
/// `data` stays untyped until `errors` has been checked: a failed mutation
/// comes back with its payload set to `null`.
#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

impl GraphQlResponse {
    fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        if !self.errors.is_empty() {
            return Err(ClientError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        let data = self
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| ClientError::ParseError("GraphQL response has no data".to_string()))?;

        serde_json::from_value(data)
            .map_err(|e| ClientError::ParseError(format!("Failed to decode GraphQL data: {}", e)))
    }
}

#[derive(Deserialize)]
struct ListPipelinesData {
    organization: Option<Organization>,
}

#[derive(Deserialize)]
struct Organization {
    pipelines: PipelineConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineConnection {
    page_info: PageInfo,
    edges: Vec<PipelineEdge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct PipelineEdge {
    node: PipelineNode,
}

#[derive(Deserialize)]
struct PipelineNode {
    id: String,
    slug: String,
    url: String,
    repository: RepositoryNode,
}

#[derive(Deserialize)]
struct RepositoryNode {
    url: String,
    provider: ProviderNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderNode {
    #[serde(rename = "__typename")]
    type_name: String,
    #[serde(default)]
    webhook_url: Option<String>,
}

impl PipelineConnection {
    /// Flatten one page into records plus the cursor of the next page
    fn into_records(self) -> (Vec<PipelineRecord>, Option<String>) {
        let next = if self.page_info.has_next_page {
            self.page_info.end_cursor
        } else {
            None
        };

        let records = self
            .edges
            .into_iter()
            .map(|edge| PipelineRecord {
                id: edge.node.id,
                slug: edge.node.slug,
                url: edge.node.url,
                provider_type: edge.node.repository.provider.type_name,
                webhook_url: edge.node.repository.provider.webhook_url,
                repository_url: edge.node.repository.url,
            })
            .collect();

        (records, next)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RotateWebhookData {
    #[serde(rename = "pipelineRotateWebhookURL")]
    pipeline_rotate_webhook_url: RotatedPipelinePayload,
}

#[derive(Deserialize)]
struct RotatedPipelinePayload {
    pipeline: RotatedPipeline,
}

#[derive(Deserialize)]
struct RotatedPipeline {
    #[serde(rename = "webhookURL")]
    webhook_url: String,
}
