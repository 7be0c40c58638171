//! Login and registration: client-side validation, then the token exchange.

use crate::backend::BackendClient;
use crate::error::{Result, ValidationErrors};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if !EMAIL_RE.is_match(email) {
        errors.add("email", "Invalid email format");
    }
}

fn check_password(password: &str, errors: &mut ValidationErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters");
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

impl BackendClient {
    /// `POST /api/login`. Callers validate the form first.
    pub async fn login(&self, form: &LoginForm) -> Result<AuthResponse> {
        tracing::info!("logging in");
        Self::send_json(self.post("/api/login").json(form)).await
    }

    /// `POST /api/register`.
    pub async fn register(&self, form: &RegisterForm) -> Result<AuthResponse> {
        tracing::info!("registering account");
        Self::send_json(self.post("/api/register").json(form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn register_form() -> RegisterForm {
        RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        }
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginForm {
            email: "me@host.io".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginForm {
            email: "me@host".into(),
            password: "12345".into(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Invalid email format"));
        assert_eq!(errors.get("password"), Some("Password must be at least 6 characters"));
    }

    #[test]
    fn test_register_validation() {
        assert!(register_form().validate().is_ok());

        let mut form = register_form();
        form.name = "  ".into();
        form.confirm_password = "different".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
        assert_eq!(errors.get("email"), None);
    }

    #[test]
    fn test_email_with_spaces_rejected() {
        let form = LoginForm {
            email: "a b@c.de".into(),
            password: "secret".into(),
        };
        assert!(form.validate().is_err());
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(serde_json::json!({"email": "a@b.co", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "jwt-123",
                "user": {"id": 1, "name": "Ada"}
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), None);
        let resp = client
            .login(&LoginForm {
                email: "a@b.co".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.token, "jwt-123");
        assert!(resp.user.is_some());
    }

    #[tokio::test]
    async fn test_register_sends_confirm_password_and_surfaces_msg() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .and(body_json(serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": "hunter22",
                "confirmPassword": "hunter22"
            })))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(serde_json::json!({"msg": "User already exists"})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), None);
        let err = client.register(&register_form()).await.unwrap_err();
        assert!(matches!(err, ApiError::Server { .. }));
        assert_eq!(err.user_message(REGISTRATION_FAILED), "User already exists");
    }

    #[tokio::test]
    async fn test_login_error_without_msg_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), None);
        let err = client.login(&LoginForm::default()).await.unwrap_err();
        assert_eq!(err.user_message(LOGIN_FAILED), "Login failed");
    }
}
