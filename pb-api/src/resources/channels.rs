//! Channel endpoints: listing, lifecycle, membership, and messages.

use serde::Deserialize;

use pb_core::constants;
use pb_core::error::{PbError, PbResult};
use pb_models::{Channel, Message};

use crate::client::ApiClient;

/// Response wrapper for the list-channels endpoint.
#[derive(Debug, Deserialize)]
struct ChannelsListBody {
    #[serde(default)]
    channels: Vec<Channel>,
}

/// Response wrapper for the load-messages endpoint.
#[derive(Debug, Deserialize)]
struct MessagesBody {
    #[serde(default)]
    messages: Vec<Message>,
}

/// Client for the `/channels` endpoint group.
///
/// Creation, deletion, and membership mutation require admin-or-owner
/// privileges server-side; those surface as 403.
#[derive(Clone)]
pub struct ChannelsClient {
    http: ApiClient,
}

impl ChannelsClient {
    /// Create a channels client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    fn token(&self) -> &str {
        self.http.auth_token()
    }

    /// List every channel visible to the account.
    pub async fn list_channels(&self) -> PbResult<Vec<Channel>> {
        let resp = self
            .http
            .get("/channels/list", &[("auth_token", self.token())])
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: ChannelsListBody = ApiClient::json(resp).await?;
                Ok(body.channels)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Fetch one channel's record by id.
    pub async fn get_channel_info(&self, channel_id: &str) -> PbResult<Channel> {
        let resp = self
            .http
            .get(
                &format!("/channels/{channel_id}"),
                &[("auth_token", self.token())],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            404 => Err(PbError::ChannelNotFound(channel_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Create a channel. Admin-or-owner only.
    pub async fn create_channel(&self, channel_name: &str, is_private: bool) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "channel_name": channel_name,
            "is_private": is_private,
        });
        let resp = self.http.post_json("/channels/create", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            409 => Err(PbError::ChannelAlreadyExists(channel_name.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Delete a channel. Admin-or-owner only.
    pub async fn delete_channel(&self, channel_id: &str) -> PbResult<()> {
        let resp = self
            .http
            .delete(
                &format!("/channels/{channel_id}/delete"),
                &[("auth_token", self.token())],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(PbError::ChannelNotFound(channel_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Add a user to a private channel. Admin-or-owner only.
    pub async fn add_user(&self, channel_id: &str, user_id: &str) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "user_id": user_id,
        });
        let resp = self
            .http
            .post_json(&format!("/channels/{channel_id}/add_user"), &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(not_found_error(
                ApiClient::detail(resp).await,
                channel_id,
                user_id,
            )),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Remove a user from a private channel. Admin-or-owner only; removing
    /// an admin is denied by the server.
    pub async fn remove_user(&self, channel_id: &str, user_id: &str) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "user_id": user_id,
        });
        let resp = self
            .http
            .delete_json(&format!("/channels/{channel_id}/remove_user"), &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(not_found_error(
                ApiClient::detail(resp).await,
                channel_id,
                user_id,
            )),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Load a page of channel messages, newest first.
    ///
    /// The page size is validated against the server's limit before any
    /// request is made.
    pub async fn load_messages(
        &self,
        channel_id: &str,
        page: u32,
        messages_per_page: u32,
    ) -> PbResult<Vec<Message>> {
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
                &format!("/channels/{channel_id}/load_messages"),
                &[
                    ("auth_token", self.token()),
                    ("page", &page),
                    ("messages_per_page", &per_page),
                ],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: MessagesBody = ApiClient::json(resp).await?;
                Ok(body.messages)
            }
            404 => Err(PbError::ChannelNotFound(channel_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Send a message to a channel, with optional attachment urls.
    pub async fn send_message(
        &self,
        channel_id: &str,
        message: &str,
        attachments: &[String],
    ) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "message": message,
            "attachments": attachments,
        });
        let resp = self
            .http
            .post_json(&format!("/channels/{channel_id}/send_message"), &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            400 => Err(send_message_error(ApiClient::detail(resp).await)),
            404 => Err(PbError::ChannelNotFound(channel_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Mark a channel message as read for this account.
    pub async fn mark_message_as_read(&self, channel_id: &str, message_id: &str) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "message_id": message_id,
        });
        let resp = self
            .http
            .put_json(&format!("/channels/{channel_id}/mark_message_as_read"), &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(PbError::MessageNotFound(message_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Delete a channel message.
    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "message_id": message_id,
        });
        let resp = self
            .http
            .delete_json(&format!("/channels/{channel_id}/delete_message"), &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(PbError::MessageNotFound(message_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }
}

/// Disambiguate a 404 from the membership endpoints: both an unknown channel
/// and an unknown user surface as 404, so the detail text decides.
fn not_found_error(detail: String, channel_id: &str, user_id: &str) -> PbError {
    if detail.to_lowercase().contains("user") {
        PbError::UserNotFound(user_id.to_string())
    } else {
        PbError::ChannelNotFound(channel_id.to_string())
    }
}

/// Disambiguate a 400 from send-message: an oversized body and a bad token
/// share the status code.
fn send_message_error(detail: String) -> PbError {
    let lowered = detail.to_lowercase();
    if lowered.contains("too long") || lowered.contains("length") {
        PbError::MessageTooLong(detail)
    } else {
        PbError::BadAuthToken(detail)
    }
}
