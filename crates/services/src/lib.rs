//! Client side of the Llinux backend: accounts, provider keys and the
//! paired device, plus the telemetry poller built on top of it.

pub mod api_keys;
pub mod auth;
pub mod backend;
pub mod device;
pub mod error;
pub mod telemetry;

pub use auth::{AuthResponse, LoginForm, RegisterForm};
pub use backend::BackendClient;
pub use error::{ApiError, ValidationErrors};
pub use telemetry::{TelemetryPoller, TelemetrySource};
