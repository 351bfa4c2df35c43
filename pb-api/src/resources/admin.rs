//! Administration endpoints: IP block list and background tasks.
//!
//! Every operation here is server-owner only; the server enforces it and
//! reports missing privileges as 403.

use serde::Deserialize;

use pb_core::error::{PbError, PbResult};
use pb_models::{BackgroundTaskRun, BlockedIp};

use crate::client::ApiClient;

/// Response wrapper for the blocked-IP list endpoint.
#[derive(Debug, Deserialize)]
struct BlockedIpsBody {
    #[serde(default)]
    blocked_ips: Vec<BlockedIp>,
}

/// Response wrapper for the background-tasks status endpoint.
#[derive(Debug, Deserialize)]
struct TasksBody {
    #[serde(default)]
    tasks: serde_json::Value,
}

/// Client for the `/blocked-ips` and `/background-tasks` endpoint groups.
#[derive(Clone)]
pub struct AdminClient {
    http: ApiClient,
}

impl AdminClient {
    /// Create an admin client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    fn token(&self) -> &str {
        self.http.auth_token()
    }

    /// List all blocked IPs with details.
    pub async fn list_blocked_ips(&self) -> PbResult<Vec<BlockedIp>> {
        let resp = self
            .http
            .get("/blocked-ips/list", &[("auth_token", self.token())])
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: BlockedIpsBody = ApiClient::json(resp).await?;
                Ok(body.blocked_ips)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Add an IP address to the blocked list.
    pub async fn block_ip(&self, ip: &str, reason: &str) -> PbResult<()> {
        let resp = self
            .http
            .post_query(
                "/blocked-ips/block",
                &[("auth_token", self.token()), ("ip", ip), ("reason", reason)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            400 => Err(block_ip_error(ApiClient::detail(resp).await, ip)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Remove an IP address from the blocked list.
    pub async fn unblock_ip(&self, ip: &str) -> PbResult<()> {
        let resp = self
            .http
            .post_query(
                "/blocked-ips/unblock",
                &[("auth_token", self.token()), ("ip", ip)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            400 => Err(unblock_ip_error(ApiClient::detail(resp).await, ip)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Get the status of all registered background tasks.
    pub async fn background_tasks_status(&self) -> PbResult<serde_json::Value> {
        let resp = self
            .http
            .get("/background-tasks/status", &[("auth_token", self.token())])
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: TasksBody = ApiClient::json(resp).await?;
                Ok(body.tasks)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Execute a background task on demand.
    pub async fn run_background_task(&self, task_id: &str) -> PbResult<BackgroundTaskRun> {
        let resp = self
            .http
            .post_query(
                "/background-tasks/run",
                &[("auth_token", self.token()), ("task_id", task_id)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(BackgroundTaskRun {
                task_id: task_id.to_string(),
                status: "executed".to_string(),
                message: None,
            }),
            400 => Err(run_task_error(ApiClient::detail(resp).await, task_id)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }
}

/// Disambiguate a 400 from block-ip: already-blocked, bad address format,
/// and bad token all share the status code.
fn block_ip_error(detail: String, ip: &str) -> PbError {
    let lowered = detail.to_lowercase();
    if lowered.contains("already blocked") {
        PbError::IpSecurity(format!("ip {ip} is already blocked"))
    } else if lowered.contains("format") {
        PbError::InvalidValue(format!("invalid ip address format: {ip}"))
    } else {
        PbError::BadAuthToken(detail)
    }
}

/// Disambiguate a 400 from unblock-ip.
fn unblock_ip_error(detail: String, ip: &str) -> PbError {
    if detail.to_lowercase().contains("not blocked") {
        PbError::IpSecurity(format!("ip {ip} is not currently blocked"))
    } else {
        PbError::BadAuthToken(detail)
    }
}

/// Disambiguate a 400 from run-background-task.
fn run_task_error(detail: String, task_id: &str) -> PbError {
    let lowered = detail.to_lowercase();
    if lowered.contains("not found") || lowered.contains(&task_id.to_lowercase()) {
        PbError::InvalidValue(format!("background task '{task_id}' not found"))
    } else if lowered.contains("not initialized") {
        PbError::IpSecurity("background tasks manager not initialized".to_string())
    } else {
        PbError::BadAuthToken(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_ip_error_disambiguation() {
        assert!(matches!(
            block_ip_error("IP is already blocked".into(), "203.0.113.9"),
            PbError::IpSecurity(_)
        ));
        assert!(matches!(
            block_ip_error("Invalid IP address format".into(), "nope"),
            PbError::InvalidValue(_)
        ));
        assert!(matches!(
            block_ip_error("Invalid auth token".into(), "203.0.113.9"),
            PbError::BadAuthToken(_)
        ));
    }

    #[test]
    fn test_unblock_ip_error_disambiguation() {
        assert!(matches!(
            unblock_ip_error("This IP is not blocked".into(), "203.0.113.9"),
            PbError::IpSecurity(_)
        ));
        assert!(matches!(
            unblock_ip_error("Invalid auth token".into(), "203.0.113.9"),
            PbError::BadAuthToken(_)
        ));
    }

    #[test]
    fn test_run_task_error_disambiguation() {
        assert!(matches!(
            run_task_error("Task not found".into(), "cleanup_old_logs"),
            PbError::InvalidValue(_)
        ));
        assert!(matches!(
            run_task_error("Manager not initialized".into(), "cleanup_old_logs"),
            PbError::IpSecurity(_)
        ));
        assert!(matches!(
            run_task_error("Invalid auth token".into(), "cleanup_old_logs"),
            PbError::BadAuthToken(_)
        ));
    }
}
