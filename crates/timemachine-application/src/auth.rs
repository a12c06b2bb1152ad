//! Login and signup use case.
//!
//! Builds an [`Identity`] from the login token, the claims carried in that
//! token and the profile endpoint, and maps gateway failures to the messages
//! shown on the Auth screen.

use std::sync::Arc;

use thiserror::Error;
use timemachine_core::gateway::{GatewayError, LoginRequest, ReflectionGateway, SignUpRequest};
use timemachine_core::user::Identity;
use timemachine_interaction::decode_claims;

/// Why an auth attempt failed, phrased for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("모든 필드를 채워주세요.")]
    MissingFields,

    #[error("이 아이디로 가입된 계정이 이미 존재합니다. 로그인해주세요.")]
    AccountExists,

    #[error("이 아이디로 가입된 계정을 찾을 수 없습니다. 회원가입을 진행해주세요.")]
    AccountNotFound,

    #[error("비밀번호가 올바르지 않습니다.")]
    BadPassword,

    #[error("서버에 연결할 수 없습니다. 잠시 후 다시 시도해주세요.")]
    NetworkUnreachable,

    #[error("{0}")]
    Other(String),
}

impl AuthFailure {
    /// Classifies a gateway error from an auth endpoint.
    ///
    /// Status codes win; the detail text is the fallback for backends that
    /// answer 400 for everything.
    pub fn classify(err: &GatewayError) -> Self {
        if err.is_network() {
            return Self::NetworkUnreachable;
        }
        let detail = err.detail().to_lowercase();
        match err.status() {
            Some(409) => return Self::AccountExists,
            Some(404) => return Self::AccountNotFound,
            Some(401) | Some(403) => return Self::BadPassword,
            _ => {}
        }
        if detail.contains("exist") || detail.contains("이미") || detail.contains("taken") {
            Self::AccountExists
        } else if detail.contains("not found") || detail.contains("찾을 수 없") {
            Self::AccountNotFound
        } else if detail.contains("password") || detail.contains("비밀번호") {
            Self::BadPassword
        } else {
            Self::Other(err.user_message())
        }
    }
}

impl From<GatewayError> for AuthFailure {
    fn from(err: GatewayError) -> Self {
        Self::classify(&err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    SignUp,
}

/// Auth screen form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: String,
    pub email: String,
    pub login_id: String,
    pub password: String,
}

impl AuthForm {
    pub fn login(login_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::Login,
            login_id: login_id.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn sign_up(
        username: impl Into<String>,
        email: impl Into<String>,
        login_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            mode: AuthMode::SignUp,
            username: username.into(),
            email: email.into(),
            login_id: login_id.into(),
            password: password.into(),
        }
    }

    /// Every field the mode needs must be non-blank.
    pub fn validate(&self) -> Result<(), AuthFailure> {
        let required = match self.mode {
            AuthMode::Login => vec![self.login_id.as_str(), self.password.as_str()],
            AuthMode::SignUp => vec![
                self.username.as_str(),
                self.email.as_str(),
                self.login_id.as_str(),
                self.password.as_str(),
            ],
        };
        if required.iter().any(|field| field.trim().is_empty()) {
            Err(AuthFailure::MissingFields)
        } else {
            Ok(())
        }
    }
}

pub struct AuthUseCase {
    gateway: Arc<dyn ReflectionGateway>,
}

impl AuthUseCase {
    pub fn new(gateway: Arc<dyn ReflectionGateway>) -> Self {
        Self { gateway }
    }

    /// Runs the form's flow: login, or signup followed by login.
    pub async fn submit(&self, form: &AuthForm) -> Result<Identity, AuthFailure> {
        form.validate()?;
        match form.mode {
            AuthMode::Login => self.login(form.login_id.trim(), &form.password).await,
            AuthMode::SignUp => self.sign_up(form).await,
        }
    }

    pub async fn login(&self, login_id: &str, password: &str) -> Result<Identity, AuthFailure> {
        let response = self
            .gateway
            .login(&LoginRequest {
                login_id: login_id.to_string(),
                password: password.to_string(),
            })
            .await?;

        let mut identity = Identity::new(login_id, response.access_token, response.token_type);
        let claims = decode_claims(&identity.access_token);
        identity.name = claims.name;
        identity.username = claims.username;
        identity.email = claims.email;

        match self.gateway.fetch_profile(&identity.credentials()).await {
            Ok(profile) => {
                identity.id = profile.id.or(identity.id);
                identity.username = profile.username.or(identity.username);
                identity.email = profile.email.or(identity.email);
                if let Some(login_id) = profile.login_id.filter(|id| !id.trim().is_empty()) {
                    identity.login_id = login_id;
                }
            }
            Err(e) => tracing::warn!("Profile fetch failed, using token claims only: {}", e),
        }

        tracing::info!("Logged in as '{}'", identity.login_id);
        Ok(identity)
    }

    /// Returns whether `login_id` is still free.
    pub async fn check_login_id(&self, login_id: &str) -> Result<bool, AuthFailure> {
        let availability = self.gateway.check_login_id(login_id.trim()).await?;
        Ok(availability.available)
    }

    async fn sign_up(&self, form: &AuthForm) -> Result<Identity, AuthFailure> {
        let login_id = form.login_id.trim();
        match self.check_login_id(login_id).await {
            Ok(true) => {}
            Ok(false) => return Err(AuthFailure::AccountExists),
            Err(AuthFailure::NetworkUnreachable) => return Err(AuthFailure::NetworkUnreachable),
            // signup itself will report a conflict
            Err(other) => tracing::warn!("Login-id check failed: {}", other),
        }

        self.gateway
            .sign_up(&SignUpRequest {
                username: form.username.trim().to_string(),
                email: form.email.trim().to_string(),
                login_id: login_id.to_string(),
                password: form.password.clone(),
            })
            .await?;
        tracing::info!("Signed up '{}'", login_id);

        self.login(login_id, &form.password).await
    }
}
