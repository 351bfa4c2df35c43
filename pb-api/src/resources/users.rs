//! Users endpoints: sign-in, sign-up, profile management, token reset.

use serde::Deserialize;
use tracing::debug;

use pb_core::constants::user_status;
use pb_core::error::{PbError, PbResult};
use pb_models::{AuthSession, UserProfile};

use crate::client::ApiClient;

/// Response wrapper for the list-users endpoint.
#[derive(Debug, Deserialize)]
struct UsersListBody {
    #[serde(default)]
    users: Vec<UserProfile>,
}

/// Client for the `/users` endpoint group.
#[derive(Clone)]
pub struct UsersClient {
    http: ApiClient,
}

impl UsersClient {
    /// Create a users client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    /// Sign in with a username and password, returning a fresh auth session.
    ///
    /// A 404 means the username is unknown; a 401 means the password is
    /// wrong. The two are never conflated.
    pub async fn sign_in(&self, username: &str, password: &str) -> PbResult<AuthSession> {
        let resp = self
            .http
            .get(
                "/users/signin",
                &[("username", username), ("password", password)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            404 => Err(PbError::UsernameNotFound(username.to_string())),
            401 => Err(PbError::InvalidPassword),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Create a new account, returning its first auth session.
    pub async fn sign_up(&self, username: &str, password: &str) -> PbResult<AuthSession> {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });
        let resp = self.http.post_json("/users/signup", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            409 => Err(PbError::UsernameAlreadyExists(username.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Fetch a user's profile by id.
    pub async fn profile(&self, user_id: &str) -> PbResult<UserProfile> {
        let body = serde_json::json!({
            "auth_token": self.http.auth_token(),
            "user_id": user_id,
        });
        let resp = self.http.post_json("/users/profile", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            404 => Err(PbError::UserNotFound(user_id.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Change the account's username.
    pub async fn update_username(&self, new_username: &str) -> PbResult<UserProfile> {
        let body = serde_json::json!({
            "auth_token": self.http.auth_token(),
            "new_username": new_username,
        });
        let resp = self.http.put_json("/users/profile", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            409 => Err(PbError::UsernameAlreadyExists(new_username.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Change the account's status.
    ///
    /// The value is validated against the recognized set before any request
    /// is made.
    pub async fn update_status(&self, status: &str) -> PbResult<UserProfile> {
        if !user_status::ALL.contains(&status) {
            return Err(PbError::InvalidStatusValue(status.to_string()));
        }

        let body = serde_json::json!({
            "auth_token": self.http.auth_token(),
            "status": status,
        });
        let resp = self.http.put_json("/users/profile", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            400 => {
                let detail = ApiClient::detail(resp).await;
                Err(status_update_error(detail, status))
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Change the account's password.
    pub async fn update_password(&self, old_password: &str, new_password: &str) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.http.auth_token(),
            "old_password": old_password,
            "new_password": new_password,
        });
        let resp = self.http.put_json("/users/profile", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            401 | 404 => Err(PbError::InvalidPassword),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Update the account's about text.
    pub async fn update_about(&self, about: &str) -> PbResult<UserProfile> {
        let body = serde_json::json!({
            "auth_token": self.http.auth_token(),
            "about": about,
        });
        let resp = self.http.put_json("/users/profile", &body).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Rotate the account's auth token.
    ///
    /// The server reports a wrong password as 404 and a malformed token as
    /// 400 on this endpoint; the mapping preserves that distinction so a
    /// bad token is never reported as a bad password.
    pub async fn reset_auth_token(&self, password: &str) -> PbResult<AuthSession> {
        let body = serde_json::json!({
            "password": password,
            "auth_token": self.http.auth_token(),
        });
        let resp = self
            .http
            .post_json("/users/profile/reset-auth-token", &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let session: AuthSession = ApiClient::json(resp).await?;
                debug!("auth token rotated, expires {:?}", session.auth_token_expire_time);
                Ok(session)
            }
            404 => Err(PbError::InvalidPassword),
            400 => Err(PbError::BadAuthToken(ApiClient::detail(resp).await)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// List every user visible to the account.
    pub async fn list_users(&self) -> PbResult<Vec<UserProfile>> {
        let resp = self
            .http
            .get("/users/list", &[("auth_token", self.http.auth_token())])
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: UsersListBody = ApiClient::json(resp).await?;
                Ok(body.users)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }
}

/// Disambiguate a 400 from the status-update endpoint: the server reuses the
/// code for both rejected status values and bad tokens, so the detail text
/// decides.
fn status_update_error(detail: String, status: &str) -> PbError {
    if detail.to_lowercase().contains("status") {
        PbError::InvalidStatusValue(status.to_string())
    } else {
        PbError::BadAuthToken(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_error_disambiguation() {
        assert!(matches!(
            status_update_error("Unsupported status value".into(), "busy"),
            PbError::InvalidStatusValue(_)
        ));
        assert!(matches!(
            status_update_error("Invalid auth token".into(), "online"),
            PbError::BadAuthToken(_)
        ));
    }

    #[test]
    fn test_users_list_body_decode() {
        let body: UsersListBody = serde_json::from_str(
            r#"{"users":[{"user_id":"u-1","username":"user1"}]}"#,
        )
        .unwrap();
        assert_eq!(body.users.len(), 1);
        assert_eq!(body.users[0].username, "user1");
    }
}
