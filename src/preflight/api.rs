//! Backend API preflight check.

use super::CheckResult;
use crate::models::config::ApiConfig;
use crate::services::api::ApiClient;

/// Check that the backend answers its health endpoint.
pub async fn check(config: &ApiConfig) -> CheckResult {
    let client = match ApiClient::with_config(config.clone()) {
        Ok(client) => client,
        Err(e) => {
            return CheckResult::fail(
                "Backend API",
                &format!("client setup failed: {}", e),
                "Check the [api] section of config.toml",
            )
        }
    };

    match client.health_check().await {
        Ok(true) => {
            if config.token.is_some() {
                CheckResult::ok("Backend API", &format!("reachable at {}", client.base_url()))
            } else {
                CheckResult::ok(
                    "Backend API",
                    &format!("reachable at {} (no token configured)", client.base_url()),
                )
            }
        }
        Ok(false) | Err(_) => CheckResult::fail(
            "Backend API",
            &format!("not reachable at {}", client.base_url()),
            "Start the backend or set PARTNER_API_URL",
        ),
    }
}
