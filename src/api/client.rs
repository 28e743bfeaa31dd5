//! Celium REST API client with connection pooling.

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{RentPodPayload, TemplateSpec};

const API_KEY_HEADER: &str = "X-API-KEY";

/// Celium client with persistent connections.
///
/// Payloads are returned as raw JSON; [`crate::translate`] turns them into
/// public models.
pub struct CeliumClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl CeliumClient {
    /// Create a new Celium client from validated configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(config.timeout())
            .build()?;

        let base_url = Url::parse(config.base_url())
            .map_err(|e| ApiError::Config(format!("invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("base URL {base_url} cannot carry a path")));
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key().to_string(),
        })
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    ///
    /// Ids never add path levels: `/`, `\` and `%` inside a segment are
    /// escaped rather than interpreted.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(method = %method, url = %url, "Celium request");
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.as_str())
    }

    async fn get(&self, segments: &[&str]) -> Result<Value> {
        let response = self.request(Method::GET, segments).send().await?;
        let text = Self::success_body(response).await?;
        Self::parse_json(&text)
    }

    async fn post<B: Serialize>(&self, segments: &[&str], body: &B) -> Result<String> {
        let response = self
            .request(Method::POST, segments)
            .json(body)
            .send()
            .await?;
        Self::success_body(response).await
    }

    /// Read the body, failing on a non-2xx status.
    async fn success_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Celium request failed");
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    fn parse_json(text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| {
            ApiError::Mapping(format!(
                "JSON parse error: {} | Raw: {}",
                e,
                truncate(text, 300)
            ))
        })
    }

    /// List all executors.
    pub async fn list_executors(&self) -> Result<Vec<Value>> {
        match self.get(&["executors"]).await? {
            Value::Array(executors) => Ok(executors),
            other => Err(ApiError::Mapping(format!(
                "expected executor list, got: {}",
                truncate(&other.to_string(), 300)
            ))),
        }
    }

    /// Create a template.
    pub async fn create_template(&self, spec: &TemplateSpec) -> Result<Value> {
        let text = self.post(&["templates"], spec).await?;
        Self::parse_json(&text)
    }

    /// Get a single template.
    pub async fn get_template(&self, template_id: &str) -> Result<Value> {
        self.get(&["templates", template_id]).await
    }

    /// Get a single pod. Pods share their executor's id.
    pub async fn get_pod(&self, pod_id: &str) -> Result<Value> {
        self.get(&["pods", pod_id]).await
    }

    /// Rent a pod on an executor.
    ///
    /// Celium's rent response carries nothing the caller needs, so an empty or
    /// non-JSON success body comes back as `Value::Null`.
    pub async fn rent_pod(&self, executor_id: &str, payload: &RentPodPayload) -> Result<Value> {
        let text = self
            .post(&["executors", executor_id, "rent"], payload)
            .await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ééé", 2), "éé");
    }

    fn client_for(base_url: &str) -> CeliumClient {
        let config = Config::new(
            Some("key".into()),
            base_url,
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        CeliumClient::new(&config).unwrap()
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let client = client_for("https://celiumcompute.ai/api");
        assert_eq!(
            client.endpoint(&["executors", "e1", "rent"]).as_str(),
            "https://celiumcompute.ai/api/executors/e1/rent"
        );

        let client = client_for("http://127.0.0.1:8080");
        assert_eq!(
            client.endpoint(&["templates", "t1"]).as_str(),
            "http://127.0.0.1:8080/templates/t1"
        );
    }

    #[test]
    fn endpoint_escapes_ids() {
        let client = client_for("https://celiumcompute.ai/api");
        assert_eq!(
            client.endpoint(&["templates", "a\\..\\pods"]).path(),
            "/api/templates/a%5C..%5Cpods"
        );
        assert_eq!(
            client.endpoint(&["pods", "%2e%2e"]).path(),
            "/api/pods/%252e%252e"
        );
        assert_eq!(client.endpoint(&["pods", "a/b"]).path(), "/api/pods/a%2Fb");
    }

    #[test]
    fn parse_json_reports_mapping_error() {
        let err = CeliumClient::parse_json("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ApiError::Mapping(_)));
    }
}
