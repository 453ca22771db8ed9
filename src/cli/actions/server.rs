use crate::api::{self, AuthConfig, Environment};
use anyhow::{Result, bail};
use secrecy::SecretString;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_origin: Option<String>,
    pub jwt_secret: Option<SecretString>,
    pub bypass: bool,
    pub environment: Environment,
}

/// Refuse configurations that could never authenticate a request.
///
/// # Errors
/// Returns an error when no secret is configured and bypass is off.
pub fn auth_config(args: &Args) -> Result<AuthConfig> {
    let mut config = AuthConfig::new()
        .with_bypass(args.bypass)
        .with_environment(args.environment);

    match &args.jwt_secret {
        Some(secret) => config = config.with_jwt_secret(secret.clone()),
        None if args.bypass => {
            warn!("No JWT secret configured; only the auth bypass can serve requests");
        }
        None => bail!("missing required argument: --jwt-secret (DIARIO_JWT_SECRET)"),
    }

    if args.bypass && args.environment == Environment::Production {
        warn!("AUTH BYPASS ENABLED IN PRODUCTION: every request is served as an administrator");
    }

    Ok(config)
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is unusable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = auth_config(&args)?;
    log_startup_args(&args);

    let result = api::new(args.port, args.dsn, config, args.frontend_origin).await;
    crate::cli::telemetry::shutdown_tracer();
    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("environment", args.environment.to_string()),
        ("jwt_secret_set", args.jwt_secret.is_some().to_string()),
        ("auth_bypass", args.bypass.to_string()),
        (
            "frontend_origin",
            args.frontend_origin
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
    ];
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
