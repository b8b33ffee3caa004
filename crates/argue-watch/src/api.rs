//! Request/response client for the upstream argument API.
//!
//! [`ArgumentApi`] is the seam the session view talks through; tests swap
//! in an in-memory double. [`HttpArgumentApi`] is the production client.

use async_trait::async_trait;
use reconciler::model::{
    Ack, ArgumentView, CreateArgumentRequest, CreateInviteRequest, InviteRole, InviteView,
    JoinRequest, JoinResponse, MyArgumentsResponse, PersonaSnapshot, ReactionRequest,
    ReportView, StartArgumentRequest, StartResponse, TurnBundle,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::{Identity, WatchConfig};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream rejected the call. Displays the upstream `detail` verbatim.
    #[error("{detail}")]
    Upstream { status: u16, detail: String },

    /// The report endpoint has nothing yet.
    #[error("Report not ready")]
    NotReady,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build from a non-success response body. A string `detail` is used
    /// as-is; anything else falls back to a generic message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("detail").cloned())
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("Request failed ({status})"));
        Self::Upstream { status, detail }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::NotReady => Some(StatusCode::NOT_FOUND.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Upstream operations used by the CLI and the session view.
#[async_trait]
pub trait ArgumentApi: Send + Sync {
    async fn my_arguments(&self) -> ApiResult<MyArgumentsResponse>;

    async fn create_argument(&self, request: &CreateArgumentRequest) -> ApiResult<ArgumentView>;

    async fn get_argument(&self, argument_id: &str) -> ApiResult<ArgumentView>;

    async fn create_invite(&self, argument_id: &str, role: InviteRole) -> ApiResult<InviteView>;

    async fn join(&self, argument_id: &str, token: &str) -> ApiResult<JoinResponse>;

    async fn set_persona(&self, argument_id: &str, persona: &PersonaSnapshot) -> ApiResult<Ack>;

    async fn ready(&self, argument_id: &str) -> ApiResult<Ack>;

    /// Sends a fresh idempotency key on every call.
    async fn start(&self, argument_id: &str) -> ApiResult<StartResponse>;

    async fn turns(&self, argument_id: &str) -> ApiResult<TurnBundle>;

    /// [`ApiError::NotReady`] until the report has been generated.
    async fn report(&self, argument_id: &str) -> ApiResult<ReportView>;

    async fn react(
        &self,
        argument_id: &str,
        emoji: &str,
        turn_index: Option<u64>,
    ) -> ApiResult<Ack>;
}

/// `reqwest`-backed client. Identity travels as `x-user-id` and
/// `x-user-handle` headers; the audience token as a query parameter.
pub struct HttpArgumentApi {
    client: reqwest::Client,
    base: String,
    identity: Identity,
    audience_token: Option<String>,
}

impl HttpArgumentApi {
    pub fn new(config: &WatchConfig, identity: Identity) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base: config.api_base().to_string(),
            identity,
            audience_token: config.audience_token.clone(),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base, path))
            .header("x-user-id", &self.identity.user_id)
            .header("x-user-handle", &self.identity.handle)
    }

    /// Like [`Self::request`], with the audience token attached when set.
    fn audience_request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.request(method, path);
        match &self.audience_token {
            Some(token) => builder.query(&[("audience_token", token)]),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "upstream response");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn argument_path(argument_id: &str, tail: &str) -> String {
    format!("/v1/arguments/{argument_id}{tail}")
}

#[async_trait]
impl ArgumentApi for HttpArgumentApi {
    async fn my_arguments(&self) -> ApiResult<MyArgumentsResponse> {
        self.send(self.request(Method::GET, "/v1/me/arguments"))
            .await
    }

    async fn create_argument(&self, request: &CreateArgumentRequest) -> ApiResult<ArgumentView> {
        self.send(self.request(Method::POST, "/v1/arguments").json(request))
            .await
    }

    async fn get_argument(&self, argument_id: &str) -> ApiResult<ArgumentView> {
        self.send(self.audience_request(Method::GET, &argument_path(argument_id, "")))
            .await
    }

    async fn create_invite(&self, argument_id: &str, role: InviteRole) -> ApiResult<InviteView> {
        let body = CreateInviteRequest::for_role(role);
        self.send(
            self.request(Method::POST, &argument_path(argument_id, "/invites"))
                .json(&body),
        )
        .await
    }

    async fn join(&self, argument_id: &str, token: &str) -> ApiResult<JoinResponse> {
        let body = JoinRequest {
            token: token.to_string(),
        };
        self.send(
            self.request(Method::POST, &argument_path(argument_id, "/join"))
                .json(&body),
        )
        .await
    }

    async fn set_persona(&self, argument_id: &str, persona: &PersonaSnapshot) -> ApiResult<Ack> {
        self.send(
            self.request(
                Method::PUT,
                &argument_path(argument_id, "/participants/me/persona"),
            )
            .json(persona),
        )
        .await
    }

    async fn ready(&self, argument_id: &str) -> ApiResult<Ack> {
        self.send(self.request(Method::POST, &argument_path(argument_id, "/ready")))
            .await
    }

    async fn start(&self, argument_id: &str) -> ApiResult<StartResponse> {
        let body = StartArgumentRequest {
            idempotency_key: uuid::Uuid::new_v4().to_string(),
        };
        self.send(
            self.request(Method::POST, &argument_path(argument_id, "/start"))
                .json(&body),
        )
        .await
    }

    async fn turns(&self, argument_id: &str) -> ApiResult<TurnBundle> {
        self.send(self.audience_request(Method::GET, &argument_path(argument_id, "/turns")))
            .await
    }

    async fn report(&self, argument_id: &str) -> ApiResult<ReportView> {
        let result = self
            .send(self.audience_request(Method::GET, &argument_path(argument_id, "/report")))
            .await;
        match result {
            Err(ApiError::Upstream { status: 404, .. }) => Err(ApiError::NotReady),
            other => other,
        }
    }

    async fn react(
        &self,
        argument_id: &str,
        emoji: &str,
        turn_index: Option<u64>,
    ) -> ApiResult<Ack> {
        let body = ReactionRequest {
            emoji: emoji.to_string(),
            turn_index,
        };
        self.send(
            self.audience_request(Method::POST, &argument_path(argument_id, "/reactions"))
                .json(&body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_detail_is_verbatim() {
        let err = ApiError::from_response(400, r#"{"detail":"Set persona before ready"}"#);
        assert_eq!(err.to_string(), "Set persona before ready");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_missing_detail_falls_back() {
        let err = ApiError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.to_string(), "Request failed (502)");
    }

    #[test]
    fn test_structured_detail_is_stringified() {
        let err = ApiError::from_response(422, r#"{"detail":[{"msg":"too short"}]}"#);
        assert_eq!(err.to_string(), r#"[{"msg":"too short"}]"#);
    }

    #[test]
    fn test_argument_paths() {
        assert_eq!(argument_path("a1", ""), "/v1/arguments/a1");
        assert_eq!(
            argument_path("a1", "/participants/me/persona"),
            "/v1/arguments/a1/participants/me/persona"
        );
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = WatchConfig {
            api_url: "http://localhost:8000/".into(),
            audience_token: Some("tok".into()),
            ..Default::default()
        };
        let identity = Identity {
            user_id: "u1".into(),
            handle: "ada".into(),
            guest: false,
        };
        let api = HttpArgumentApi::new(&config, identity).unwrap();
        assert_eq!(api.base, "http://localhost:8000");
        assert_eq!(api.identity().handle, "ada");
    }
}
