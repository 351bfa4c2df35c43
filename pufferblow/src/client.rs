//! The top-level client facade.
//!
//! Owns the session context and lazily constructs sub-clients. Each
//! sub-client takes a read-only snapshot of the auth token at construction
//! time: rotating the token later does not update clients or workers that
//! already exist, they keep the stale snapshot until reconstructed.

use tracing::info;

use pb_api::{
    AdminClient, ApiClient, ChannelsClient, DecentralizedAuthClient, FederationClient,
    StorageClient, SystemClient, UsersClient,
};
use pb_core::config::ClientOptions;
use pb_core::error::{PbError, PbResult};
use pb_models::AuthSession;
use pb_socket::{Scope, WsCallbacks, WsConfig, WsWorker};

/// The PufferBlow client.
pub struct Client {
    options: ClientOptions,
    auth_token: Option<String>,
    signed_in: bool,
}

impl Client {
    /// Create a client for the given options. No network calls are made
    /// until sign-in/sign-up.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            auth_token: None,
            signed_in: false,
        }
    }

    /// The options this client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The current auth token, when signed in.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Whether the session has a valid auth token.
    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    /// Sign in with the configured credentials and store the session token.
    pub async fn sign_in(&mut self) -> PbResult<()> {
        let users = UsersClient::new(self.api_client()?);
        let session = users
            .sign_in(&self.options.username, &self.options.password)
            .await?;
        self.install_session(session.auth_token);
        Ok(())
    }

    /// Create an account with the configured credentials and store the
    /// session token.
    pub async fn sign_up(&mut self) -> PbResult<()> {
        let users = UsersClient::new(self.api_client()?);
        let session = users
            .sign_up(&self.options.username, &self.options.password)
            .await?;
        self.install_session(session.auth_token);
        Ok(())
    }

    /// Rotate the session's auth token.
    ///
    /// Sub-clients and workers constructed before the rotation keep the old
    /// token until reconstructed.
    pub async fn reset_auth_token(&mut self) -> PbResult<AuthSession> {
        self.require_signed_in("reset-auth-token")?;
        let users = UsersClient::new(self.api_client()?);
        let session = users.reset_auth_token(&self.options.password).await?;
        self.auth_token = Some(session.auth_token.clone());
        info!("auth token rotated; existing sub-clients keep their snapshot");
        Ok(session)
    }

    fn install_session(&mut self, auth_token: String) {
        self.auth_token = Some(auth_token);
        self.signed_in = true;
        info!("signed in as {}", self.options.username);
    }

    fn require_signed_in(&self, what: &str) -> PbResult<()> {
        if self.signed_in {
            Ok(())
        } else {
            Err(PbError::NotSignedIn(format!(
                "{what} requires a signed-in session"
            )))
        }
    }

    /// Build an HTTP transport with the current token snapshot.
    fn api_client(&self) -> PbResult<ApiClient> {
        ApiClient::new(&self.options, self.auth_token.as_deref())
    }

    // --- Sub-clients ---

    /// Users sub-client. Available before sign-in (it hosts sign-in itself).
    pub fn users(&self) -> PbResult<UsersClient> {
        Ok(UsersClient::new(self.api_client()?))
    }

    /// Channels sub-client.
    pub fn channels(&self) -> PbResult<ChannelsClient> {
        Ok(ChannelsClient::new(self.api_client()?))
    }

    /// System sub-client. Its public endpoints work before sign-in.
    pub fn system(&self) -> PbResult<SystemClient> {
        Ok(SystemClient::new(self.api_client()?))
    }

    /// Admin sub-client. Requires a signed-in session.
    pub fn admin(&self) -> PbResult<AdminClient> {
        self.require_signed_in("admin client")?;
        Ok(AdminClient::new(self.api_client()?))
    }

    /// Storage (CDN) sub-client. Requires a signed-in session.
    pub fn storage(&self) -> PbResult<StorageClient> {
        self.require_signed_in("storage client")?;
        Ok(StorageClient::new(self.api_client()?))
    }

    /// Federation sub-client. Requires a signed-in session.
    pub fn federation(&self) -> PbResult<FederationClient> {
        self.require_signed_in("federation client")?;
        Ok(FederationClient::new(self.api_client()?))
    }

    /// Decentralized-auth sub-client. Requires a signed-in session.
    pub fn decentralized_auth(&self) -> PbResult<DecentralizedAuthClient> {
        self.require_signed_in("decentralized-auth client")?;
        Ok(DecentralizedAuthClient::new(self.api_client()?))
    }

    // --- Real-time workers ---

    /// Build a worker for the server-wide feed. Requires a signed-in
    /// session. The worker is returned idle; call connect() to start it.
    pub fn global_ws(
        &self,
        callbacks: WsCallbacks,
        config: Option<WsConfig>,
    ) -> PbResult<WsWorker> {
        self.ws_worker(Scope::Global, callbacks, config)
    }

    /// Build a worker for one channel's feed. Requires a signed-in session.
    pub fn channel_ws(
        &self,
        channel_id: impl Into<String>,
        callbacks: WsCallbacks,
        config: Option<WsConfig>,
    ) -> PbResult<WsWorker> {
        self.ws_worker(Scope::Channel(channel_id.into()), callbacks, config)
    }

    fn ws_worker(
        &self,
        scope: Scope,
        callbacks: WsCallbacks,
        config: Option<WsConfig>,
    ) -> PbResult<WsWorker> {
        self.require_signed_in("real-time worker")?;
        let token = self.auth_token.as_deref().unwrap_or_default();
        Ok(WsWorker::new(
            &self.options.ws_origin(),
            token,
            scope,
            config.unwrap_or_default(),
            callbacks,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> Client {
        Client::new(ClientOptions::new("user1", "12345678"))
    }

    #[test]
    fn test_privileged_clients_require_sign_in() {
        let client = test_client();
        assert!(!client.is_signed_in());

        assert!(matches!(client.admin(), Err(PbError::NotSignedIn(_))));
        assert!(matches!(client.storage(), Err(PbError::NotSignedIn(_))));
        assert!(matches!(client.federation(), Err(PbError::NotSignedIn(_))));
        assert!(matches!(
            client.decentralized_auth(),
            Err(PbError::NotSignedIn(_))
        ));
        assert!(matches!(
            client.global_ws(WsCallbacks::new(), None),
            Err(PbError::NotSignedIn(_))
        ));
        assert!(matches!(
            client.channel_ws("c-1", WsCallbacks::new(), None),
            Err(PbError::NotSignedIn(_))
        ));
    }

    #[test]
    fn test_unprivileged_clients_available_before_sign_in() {
        let client = test_client();
        assert!(client.users().is_ok());
        assert!(client.channels().is_ok());
        assert!(client.system().is_ok());
    }

    #[test]
    fn test_privileged_clients_available_after_sign_in() {
        let mut client = test_client();
        client.install_session("u-1.token".to_string());

        assert!(client.admin().is_ok());
        assert!(client.storage().is_ok());
        assert!(client.federation().is_ok());
        assert!(client.decentralized_auth().is_ok());
        assert!(client.global_ws(WsCallbacks::new(), None).is_ok());
        assert_eq!(client.auth_token(), Some("u-1.token"));
    }

    #[test]
    fn test_sub_clients_snapshot_the_token() {
        let mut client = test_client();
        client.install_session("token-before".to_string());

        let http_before = client.api_client().unwrap();
        assert_eq!(http_before.auth_token(), "token-before");

        // Simulate a rotation: the old snapshot must not move.
        client.auth_token = Some("token-after".to_string());
        assert_eq!(http_before.auth_token(), "token-before");
        assert_eq!(client.api_client().unwrap().auth_token(), "token-after");
    }
}
