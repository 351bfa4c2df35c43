//! System endpoints: server info, statistics, monitoring, logs, and branding.

use std::path::Path;

use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;

use pb_core::constants;
use pb_core::error::{PbError, PbResult};

use crate::client::ApiClient;

/// Generic single-field response wrappers used across the system surface.
#[derive(Debug, Deserialize)]
struct ServerInfoBody {
    #[serde(default)]
    server_info: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StatisticsBody {
    #[serde(default)]
    statistics: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    #[serde(default)]
    server_usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OverviewBody {
    #[serde(default)]
    server_overview: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MetricsBody {
    #[serde(default)]
    activity_metrics: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ActivitiesBody {
    #[serde(default)]
    activities: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    chart_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ReleaseBody {
    #[serde(default)]
    release: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AvatarBody {
    #[serde(default)]
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct BannerBody {
    #[serde(default)]
    banner_url: String,
}

/// Client for the `/system` endpoint group.
///
/// Most reads need a valid token; settings updates, logs, and branding
/// uploads are server-owner only.
#[derive(Clone)]
pub struct SystemClient {
    http: ApiClient,
}

impl SystemClient {
    /// Create a system client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    fn token(&self) -> &str {
        self.http.auth_token()
    }

    fn token_body(&self) -> serde_json::Value {
        serde_json::json!({ "auth_token": self.token() })
    }

    /// Latest release information. Absent info is a fallback record, not an
    /// error.
    pub async fn get_latest_release(&self) -> PbResult<serde_json::Value> {
        let resp = self.http.get("/system/latest-release", &[]).await?;

        if resp.status().is_success() {
            let body: ReleaseBody = ApiClient::json(resp).await?;
            Ok(body.release)
        } else {
            Ok(serde_json::json!({
                "message": "Release information not yet available"
            }))
        }
    }

    /// Server configuration information.
    pub async fn get_server_info(&self) -> PbResult<serde_json::Value> {
        let resp = self
            .http
            .get("/system/info", &[("auth_token", self.token())])
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: ServerInfoBody = ApiClient::json(resp).await?;
                Ok(body.server_info)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Update server settings. Server-owner only.
    ///
    /// Fields outside the accepted set are dropped before the request; an
    /// update with no remaining fields fails client-side.
    pub async fn update_server_info(
        &self,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> PbResult<()> {
        let mut body = serde_json::Map::new();
        for (key, value) in fields {
            if constants::SERVER_INFO_FIELDS.contains(&key.as_str()) {
                body.insert(key.clone(), value.clone());
            }
        }
        if body.is_empty() {
            return Err(PbError::InvalidValue(format!(
                "no valid fields provided, allowed: {}",
                constants::SERVER_INFO_FIELDS.join(", ")
            )));
        }
        body.insert(
            "auth_token".to_string(),
            serde_json::Value::String(self.token().to_string()),
        );

        let resp = self
            .http
            .put_json("/system/info", &serde_json::Value::Object(body))
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Aggregate server statistics (users, channels, messages).
    pub async fn get_server_stats(&self) -> PbResult<serde_json::Value> {
        let resp = self
            .http
            .get("/system/stats", &[("auth_token", self.token())])
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: StatisticsBody = ApiClient::json(resp).await?;
                Ok(body.statistics)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Real-time server usage (CPU, RAM, storage). No auth required.
    pub async fn get_server_usage(&self) -> PbResult<serde_json::Value> {
        let resp = self
            .http
            .post_json("/system/usage", &serde_json::json!({}))
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: UsageBody = ApiClient::json(resp).await?;
                Ok(body.server_usage)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Control-panel overview data. Admin only.
    pub async fn get_server_overview(&self) -> PbResult<serde_json::Value> {
        let resp = self
            .http
            .post_json("/system/overview", &self.token_body())
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: OverviewBody = ApiClient::json(resp).await?;
                Ok(body.server_overview)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Current activity metrics for the dashboard. Admin only.
    pub async fn get_activity_metrics(&self) -> PbResult<serde_json::Value> {
        let resp = self
            .http
            .post_json("/system/activity-metrics", &self.token_body())
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: MetricsBody = ApiClient::json(resp).await?;
                Ok(body.activity_metrics)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Recent activity events, newest first.
    pub async fn get_recent_activity(&self, limit: u32) -> PbResult<Vec<serde_json::Value>> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "limit": limit,
        });
        let resp = self.http.post_json("/system/recent-activity", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: ActivitiesBody = ApiClient::json(resp).await?;
                Ok(body.activities)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Server log lines with optional search/level filters. Server-owner
    /// only. The line count is clamped to the server's limit.
    pub async fn get_server_logs(
        &self,
        lines: u32,
        search: Option<&str>,
        level: Option<&str>,
    ) -> PbResult<serde_json::Value> {
        let mut body = serde_json::json!({
            "auth_token": self.token(),
            "lines": lines.min(constants::MAX_LOG_LINES),
        });
        if let Some(search) = search {
            body["search"] = serde_json::Value::String(search.to_string());
        }
        if let Some(level) = level {
            body["level"] = serde_json::Value::String(level.to_string());
        }

        let resp = self.http.post_json("/system/logs", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Upload the server's avatar image. Server-owner only.
    pub async fn upload_server_avatar(&self, avatar_path: &Path) -> PbResult<String> {
        let resp = self.upload_branding("avatar", avatar_path).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: AvatarBody = ApiClient::json(resp).await?;
                Ok(body.avatar_url)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Upload the server's banner image. Server-owner only.
    pub async fn upload_server_banner(&self, banner_path: &Path) -> PbResult<String> {
        let resp = self.upload_branding("banner", banner_path).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: BannerBody = ApiClient::json(resp).await?;
                Ok(body.banner_url)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    async fn upload_branding(
        &self,
        kind: &'static str,
        path: &Path,
    ) -> PbResult<reqwest::Response> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{kind}.jpg"));
        let bytes = std::fs::read(path)?;
        debug!("uploading server {} ({} bytes)", kind, bytes.len());

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new()
            .part(kind, part)
            .text("auth_token", self.token().to_string());

        self.http
            .post_multipart(&format!("/system/{kind}"), form)
            .await
    }

    // --- Chart endpoints ---

    async fn chart(
        &self,
        name: &str,
        period: Option<&str>,
    ) -> PbResult<serde_json::Value> {
        let mut body = self.token_body();
        if let Some(period) = period {
            body["period"] = serde_json::Value::String(period.to_string());
        }

        let resp = self
            .http
            .post_json(&format!("/system/charts/{name}"), &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: ChartBody = ApiClient::json(resp).await?;
                Ok(body.chart_data)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// User registration chart data.
    pub async fn get_user_registration_chart(
        &self,
        period: Option<&str>,
    ) -> PbResult<serde_json::Value> {
        self.chart("user-registrations", period).await
    }

    /// Message activity chart data.
    pub async fn get_message_activity_chart(
        &self,
        period: Option<&str>,
    ) -> PbResult<serde_json::Value> {
        self.chart("message-activity", period).await
    }

    /// Online users chart data.
    pub async fn get_online_users_chart(
        &self,
        period: Option<&str>,
    ) -> PbResult<serde_json::Value> {
        self.chart("online-users", period).await
    }

    /// Channel creation chart data.
    pub async fn get_channel_creation_chart(
        &self,
        period: Option<&str>,
    ) -> PbResult<serde_json::Value> {
        self.chart("channel-creation", period).await
    }

    /// User status distribution chart data.
    pub async fn get_user_status_chart(&self) -> PbResult<serde_json::Value> {
        self.chart("user-status", None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_server_info_filters_fields() {
        let options = pb_core::config::ClientOptions::default();
        let client = SystemClient::new(ApiClient::new(&options, Some("t")).unwrap());

        let mut fields = serde_json::Map::new();
        fields.insert("bogus_field".to_string(), serde_json::json!(1));

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let err = rt.block_on(client.update_server_info(&fields)).unwrap_err();
        assert!(matches!(err, PbError::InvalidValue(_)));
    }

    #[test]
    fn test_chart_body_decode() {
        let body: ChartBody =
            serde_json::from_str(r#"{"chart_data":{"labels":["mon"],"values":[3]}}"#).unwrap();
        assert_eq!(body.chart_data["values"][0], 3);
    }

    #[test]
    fn test_missing_branding_file_is_io_error() {
        let options = pb_core::config::ClientOptions::default();
        let client = SystemClient::new(ApiClient::new(&options, Some("t")).unwrap());

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let err = rt
            .block_on(client.upload_server_avatar(Path::new("/nonexistent/avatar.jpg")))
            .unwrap_err();
        assert!(matches!(err, PbError::Io(_)));
    }
}
