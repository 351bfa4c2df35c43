//! Decentralized-auth endpoints: node-identity challenge/response sessions.

use pb_core::error::{PbError, PbResult};
use pb_models::{NodeChallenge, NodeSession};

use crate::client::ApiClient;

/// Client for the `/auth/decentralized` endpoint group.
#[derive(Clone)]
pub struct DecentralizedAuthClient {
    http: ApiClient,
}

impl DecentralizedAuthClient {
    /// Create a decentralized-auth client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    fn token(&self) -> &str {
        self.http.auth_token()
    }

    /// Issue a challenge for the given node identity.
    pub async fn issue_challenge(&self, node_id: &str) -> PbResult<NodeChallenge> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "node_id": node_id,
        });
        let resp = self
            .http
            .post_json("/auth/decentralized/challenge", &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            400 | 404 => Err(PbError::BadAuthToken(ApiClient::detail(resp).await)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Verify a signed challenge, exchanging it for a node session.
    pub async fn verify_challenge(
        &self,
        challenge_id: &str,
        node_public_key: &str,
        challenge_signature: &str,
        shared_secret: &str,
    ) -> PbResult<NodeSession> {
        let body = serde_json::json!({
            "challenge_id": challenge_id,
            "node_public_key": node_public_key,
            "challenge_signature": challenge_signature,
            "shared_secret": shared_secret,
        });
        let resp = self
            .http
            .post_json("/auth/decentralized/verify", &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Introspect a node session token.
    pub async fn introspect_session(&self, session_token: &str) -> PbResult<NodeSession> {
        let body = serde_json::json!({ "session_token": session_token });
        let resp = self
            .http
            .post_json("/auth/decentralized/introspect", &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::json(resp).await,
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Revoke a node session by id.
    pub async fn revoke_session(&self, session_id: &str) -> PbResult<()> {
        let body = serde_json::json!({
            "auth_token": self.token(),
            "session_id": session_id,
        });
        let resp = self
            .http
            .post_json("/auth/decentralized/revoke", &body)
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            400 | 404 => Err(PbError::BadAuthToken(ApiClient::detail(resp).await)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_record_decode() {
        let challenge: NodeChallenge = serde_json::from_str(
            r#"{"challenge_id":"ch-1","challenge":"sign-me","expires_at":null}"#,
        )
        .unwrap();
        assert_eq!(challenge.challenge_id, "ch-1");
    }
}
