//! HTTP implementation of [`ReflectionGateway`] over the reflection backend's
//! JSON API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use timemachine_core::gateway::{
    ChatReplyRequest, ChatReplyResponse, GatewayError, GatewayResult, LoginIdAvailability,
    LoginRequest, LoginResponse, Profile, ReflectionGateway, ReportRecord, ReportRequest,
    SignUpRequest, decode_history,
};
use timemachine_core::reflection::Report;
use timemachine_core::user::Credentials;

const LOGIN_PATH: &str = "/api/login";
const SIGNUP_PATH: &str = "/api/users";
const LOGIN_ID_CHECK_PATH: &str = "/api/login-id/check";
const ME_PATH: &str = "/api/me";
const CHAT_PATH: &str = "/api/reflections/chat";
const REPORTS_PATH: &str = "/api/reflections/reports";
const REFLECTIONS_PATH: &str = "/api/reflections";

/// Gateway talking to the backend at an explicit base URL.
#[derive(Debug, Clone)]
pub struct HttpReflectionGateway {
    client: Client,
    base_url: String,
}

impl HttpReflectionGateway {
    /// Trailing slashes on `base_url` are stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, credentials: &Credentials) -> GatewayResult<RequestBuilder> {
        if credentials.access_token.trim().is_empty() {
            return Err(GatewayError::Validation(
                "로그인이 필요합니다. 다시 로그인해주세요.".to_string(),
            ));
        }
        Ok(request.header("Authorization", credentials.authorization_header()))
    }

    async fn send(&self, request: RequestBuilder) -> GatewayResult<Response> {
        let response = request.send().await.map_err(|err| {
            tracing::warn!("Backend request failed: {}", err);
            GatewayError::Network(err.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_http_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::Decode(format!("Failed to parse backend response: {err}")))
    }
}

#[derive(Deserialize)]
struct ValidationItem {
    msg: String,
}

/// Pulls a readable detail out of an error body: `detail` (string or list of
/// `{msg}`), then `message`, then nothing.
fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return String::new();
    };
    match value.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => return detail.clone(),
        Some(items @ Value::Array(_)) => {
            if let Ok(items) = serde_json::from_value::<Vec<ValidationItem>>(items.clone()) {
                let joined = items
                    .into_iter()
                    .map(|item| item.msg)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    return joined;
                }
            }
        }
        _ => {}
    }
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn map_http_error(status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::UNAUTHORIZED {
        return GatewayError::Unauthorized;
    }
    let detail = extract_detail(body);
    tracing::warn!("Backend returned {}: {}", status, detail);
    GatewayError::http(status.as_u16(), detail)
}

#[async_trait]
impl ReflectionGateway for HttpReflectionGateway {
    async fn login(&self, request: &LoginRequest) -> GatewayResult<LoginResponse> {
        tracing::info!("Logging in as '{}'", request.login_id);
        self.send_json(self.client.post(self.url(LOGIN_PATH)).json(request))
            .await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> GatewayResult<()> {
        tracing::info!("Signing up '{}'", request.login_id);
        self.send(self.client.post(self.url(SIGNUP_PATH)).json(request))
            .await?;
        Ok(())
    }

    async fn check_login_id(&self, login_id: &str) -> GatewayResult<LoginIdAvailability> {
        let request = self
            .client
            .get(self.url(LOGIN_ID_CHECK_PATH))
            .query(&[("login_id", login_id)]);
        self.send_json(request).await
    }

    async fn fetch_profile(&self, credentials: &Credentials) -> GatewayResult<Profile> {
        let request = self.authorized(self.client.get(self.url(ME_PATH)), credentials)?;
        self.send_json(request).await
    }

    async fn chat_reply(
        &self,
        credentials: &Credentials,
        request: &ChatReplyRequest,
    ) -> GatewayResult<String> {
        let builder = self.authorized(self.client.post(self.url(CHAT_PATH)).json(request), credentials)?;
        let response: ChatReplyResponse = self.send_json(builder).await?;
        Ok(response.reply)
    }

    async fn generate_report(
        &self,
        credentials: &Credentials,
        request: &ReportRequest,
    ) -> GatewayResult<Report> {
        tracing::info!("Requesting report for session {}", request.session_id);
        let builder =
            self.authorized(self.client.post(self.url(REPORTS_PATH)).json(request), credentials)?;
        let record: ReportRecord = self.send_json(builder).await?;
        record.into_report()
    }

    async fn report_history(&self, credentials: &Credentials) -> GatewayResult<Vec<ReportRecord>> {
        let builder = self.authorized(self.client.get(self.url(REPORTS_PATH)), credentials)?;
        let records: Vec<Value> = self.send_json(builder).await?;
        Ok(decode_history(records))
    }

    async fn delete_reflection(
        &self,
        credentials: &Credentials,
        session_id: &str,
    ) -> GatewayResult<()> {
        tracing::info!("Deleting reflection {}", session_id);
        let mut url = reqwest::Url::parse(&self.url(REFLECTIONS_PATH))
            .map_err(|err| GatewayError::Validation(format!("Invalid backend URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Validation("Backend URL cannot be a base".to_string()))?
            .push(session_id);
        let builder = self.authorized(self.client.delete(url), credentials)?;
        self.send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let gateway = HttpReflectionGateway::new("http://localhost:8000//");
        assert_eq!(gateway.base_url(), "http://localhost:8000");
        assert_eq!(gateway.url(LOGIN_PATH), "http://localhost:8000/api/login");
    }

    #[test]
    fn test_unauthorized_status_is_tagged() {
        let err = map_http_error(StatusCode::UNAUTHORIZED, r#"{"detail":"expired"}"#);
        assert_eq!(err, GatewayError::Unauthorized);
    }

    #[test]
    fn test_detail_then_message() {
        let err = map_http_error(StatusCode::CONFLICT, r#"{"detail":"이미 존재하는 아이디입니다."}"#);
        assert_eq!(err, GatewayError::http(409, "이미 존재하는 아이디입니다."));

        let err = map_http_error(StatusCode::BAD_REQUEST, r#"{"message":"bad input"}"#);
        assert_eq!(err.detail(), "bad input");
    }

    #[test]
    fn test_validation_list_detail_is_joined() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"invalid email"},{"msg":"too short"}]}"#;
        assert_eq!(extract_detail(body), "invalid email, too short");
    }

    #[test]
    fn test_unreadable_body_falls_back_to_generic_message() {
        let err = map_http_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.user_message(),
            timemachine_core::gateway::GENERIC_ERROR_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_before_sending() {
        let gateway = HttpReflectionGateway::new("http://127.0.0.1:9");
        let credentials = Credentials {
            access_token: String::new(),
            token_type: "Bearer".to_string(),
        };
        let err = gateway.fetch_profile(&credentials).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }
}
