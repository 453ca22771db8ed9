//! Auth configuration and shared request state.

use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::verifier::SessionVerifier;

/// Deployment environment; anything but production may show error details.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Development,
    Test,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }

    #[must_use]
    pub const fn exposes_error_details(self) -> bool {
        !matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            other => Err(format!("invalid environment: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: Option<SecretString>,
    bypass: bool,
    environment: Environment,
}

impl AuthConfig {
    /// Production defaults: no secret, bypass off.
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_secret: None,
            bypass: false,
            environment: Environment::Production,
        }
    }

    #[must_use]
    pub fn with_jwt_secret(mut self, secret: SecretString) -> Self {
        self.jwt_secret = Some(secret);
        self
    }

    #[must_use]
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn bypass(&self) -> bool {
        self.bypass
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn has_jwt_secret(&self) -> bool {
        self.jwt_secret.is_some()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("bypass", &self.bypass)
            .field("environment", &self.environment)
            .finish()
    }
}

/// Per-process auth state shared by every handler.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    verifier: SessionVerifier,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        if config.bypass() {
            warn!(
                environment = %config.environment(),
                "AUTH BYPASS ENABLED: authentication and authorization are disabled"
            );
        }
        let verifier = SessionVerifier::new(config.jwt_secret.clone());
        Self { config, verifier }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn verifier(&self) -> &SessionVerifier {
        &self.verifier
    }
}
