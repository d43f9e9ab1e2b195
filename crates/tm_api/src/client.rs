use crate::auth::basic_authorization;
use crate::config::{ApiNamespace, TmConfig};
use crate::error::{Result, TmError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::Form;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const ATLASSIAN_TOKEN_HEADER: &str = "x-atlassian-token";

/// Result of the `myself` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connectivity {
    Reachable(StatusCode),
    Unreachable(String),
}

impl Connectivity {
    /// Raw status code, or `0` when the host could not be reached.
    pub fn status_code(&self) -> u16 {
        match self {
            Connectivity::Reachable(status) => status.as_u16(),
            Connectivity::Unreachable(_) => 0,
        }
    }

    /// Reachable and the credentials were accepted.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Connectivity::Reachable(status) if status.is_success())
    }
}

/// HTTP wrapper holding the single pooled client and the connection settings.
#[derive(Clone)]
pub struct TmClient {
    http: HttpClient,
    config: TmConfig,
}

impl TmClient {
    pub fn new(config: TmConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TmConfig {
        &self.config
    }

    pub fn url_for(&self, namespace: ApiNamespace, path: &str) -> String {
        let mut base = self.config.api_root(namespace);
        base.push_str(path.trim_start_matches('/'));
        base
    }

    pub async fn send(&self, method: Method, namespace: ApiNamespace, path: &str) -> Result<Response> {
        self.send_with_body(method, namespace, path, Option::<&Value>::None)
            .await
    }

    pub async fn send_with_body<B>(
        &self,
        method: Method,
        namespace: ApiNamespace,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(namespace, path);
        tracing::debug!(%method, %url, "sending request");
        let mut request = self.http.request(method, url);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        Ok(request.send().await?)
    }

    /// Posts a multipart form with the XSRF bypass header the attachment endpoint requires.
    pub async fn send_multipart(
        &self,
        namespace: ApiNamespace,
        path: &str,
        form: Form,
    ) -> Result<Response> {
        let url = self.url_for(namespace, path);
        tracing::debug!(%url, "uploading multipart form");
        let response = self
            .http
            .post(url)
            .header(ATLASSIAN_TOKEN_HEADER, "no-check")
            .multipart(form)
            .send()
            .await?;
        Ok(response)
    }

    /// Issues `GET myself`; any transport failure maps to `Unreachable`.
    pub async fn probe(&self) -> Connectivity {
        match self.send(Method::GET, ApiNamespace::Platform, "myself").await {
            Ok(response) => Connectivity::Reachable(response.status()),
            Err(err) => {
                tracing::warn!(error = %err, "connectivity probe failed");
                Connectivity::Unreachable(err.to_string())
            }
        }
    }

    /// Consumes a response body as JSON.
    pub async fn read_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(TmError::from)
    }

    /// Consumes an unexpected response into a rejection.
    pub async fn rejection(operation: &'static str, response: Response) -> TmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        build_rejection(operation, status, &body)
    }
}

fn build_http_client(config: &TmConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    let mut auth_value = header_value(basic_authorization(&config.username, &config.password))?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| TmError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| TmError::Other(err.to_string()))
}

pub(crate) fn build_rejection(operation: &'static str, status: StatusCode, body: &str) -> TmError {
    let reason = extract_error_message(body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());
    TmError::rejected(operation, status, reason)
}

/// Reads Jira's `{"errorMessages": [...], "errors": {...}}` error shape.
fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let mut messages: Vec<String> = value
        .get("errorMessages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    if let Some(errors) = value.get("errors").and_then(Value::as_object) {
        for (field, message) in errors {
            if let Some(message) = message.as_str() {
                messages.push(format!("{}: {}", field, message));
            }
        }
    }
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::{build_rejection, Connectivity, TmClient};
    use crate::config::{ApiNamespace, TmConfig};
    use crate::error::TmError;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[tokio::test]
    async fn urls_resolve_in_both_namespaces() {
        let client = TmClient::new(TmConfig::new("http://host", "u", "p")).expect("client");
        assert_eq!(
            client.url_for(ApiNamespace::TestManagement, "testcase/QA-1"),
            "http://host/rest/tm/1.0/testcase/QA-1"
        );
        assert_eq!(
            client.url_for(ApiNamespace::Platform, "/issue/QA-1/comment"),
            "http://host/rest/api/2/issue/QA-1/comment"
        );
    }

    #[test]
    fn rejection_prefers_jira_error_messages() {
        let err = build_rejection(
            "post comment",
            StatusCode::BAD_REQUEST,
            r#"{"errorMessages":["Comment body can not be empty!"],"errors":{}}"#,
        );
        match err {
            TmError::Rejected { reason, status, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(reason, "Comment body can not be empty!");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejection_falls_back_to_canonical_reason() {
        let err = build_rejection("manage label", StatusCode::FORBIDDEN, "<html>nope</html>");
        match err {
            TmError::Rejected { reason, .. } => assert_eq!(reason, "Forbidden"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_returns_remote_status_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/myself")
            .match_header("authorization", "Basic dTpw")
            .with_status(401)
            .create_async()
            .await;

        let client = TmClient::new(TmConfig::new(server.url(), "u", "p")).expect("client");
        let outcome = client.probe().await;

        mock.assert_async().await;
        assert_eq!(outcome, Connectivity::Reachable(StatusCode::UNAUTHORIZED));
        assert_eq!(outcome.status_code(), 401);
        assert!(!outcome.is_authorized());
    }

    #[tokio::test]
    async fn probe_returns_zero_when_host_is_unreachable() {
        let config = TmConfig::new("http://127.0.0.1:1", "u", "p")
            .with_connect_timeout(Duration::from_secs(2))
            .with_timeout(Duration::from_secs(2));
        let client = TmClient::new(config).expect("client");

        let outcome = client.probe().await;

        assert!(matches!(outcome, Connectivity::Unreachable(_)));
        assert_eq!(outcome.status_code(), 0);
    }
}
