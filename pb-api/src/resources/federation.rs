//! Federation endpoints: remote follows and cross-instance direct messages.

use serde::Deserialize;

use pb_core::constants;
use pb_core::error::{PbError, PbResult};
use pb_models::DirectMessage;

use crate::client::ApiClient;

/// Response wrapper for the load-direct-messages endpoint.
#[derive(Debug, Deserialize)]
struct DirectMessagesBody {
    #[serde(default)]
    messages: Vec<DirectMessage>,
}

/// Client for the `/federation` and `/dms` endpoint groups.
#[derive(Clone)]
pub struct FederationClient {
    http: ApiClient,
}

impl FederationClient {
    /// Create a federation client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    fn token(&self) -> &str {
        self.http.auth_token()
    }

    /// Follow a remote ActivityPub account (`user@domain`).
    pub async fn follow_remote_account(&self, remote_handle: &str) -> PbResult<serde_json::Value> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "remote_handle": remote_handle,
        });
        let resp = self.http.post_json("/federation/follow", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Send a direct message to a local user or remote handle/actor.
    pub async fn send_direct_message(
        &self,
        peer: &str,
        message: &str,
        sent_at: Option<&str>,
        attachments: &[String],
    ) -> PbResult<serde_json::Value> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "peer": peer,
            "message": message,
            "sent_at": sent_at,
            "attachments": attachments,
        });
        let resp = self.http.post_json("/dms/send", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            404 => Err(PbError::UserNotFound(peer.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Load a page of the direct-message conversation with a peer.
    pub async fn load_direct_messages(
        &self,
        peer: &str,
        page: u32,
        messages_per_page: u32,
    ) -> PbResult<Vec<DirectMessage>> {
        if messages_per_page > constants::MAX_MESSAGES_PER_PAGE {
            return Err(PbError::ExceededPageSize {
                requested: messages_per_page,
                max: constants::MAX_MESSAGES_PER_PAGE,
            });
        }

        let page = page.to_string();
        let per_page = messages_per_page.to_string();
        let resp = self
            .http
            .get(
                "/dms/messages",
                &[
                    ("auth_token", self.token()),
                    ("peer", peer),
                    ("page", &page),
                    ("messages_per_page", &per_page),
                ],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: DirectMessagesBody = ApiClient::json(resp).await?;
                Ok(body.messages)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }
}
