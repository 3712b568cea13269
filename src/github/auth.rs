//! OAuth authorization-code flow for GitHub
//!
//! The flow is a linear state machine:
//!
//! 1. make sure an OAuth app (client id + secret) is configured, asking for
//!    it and saving it if not
//! 2. build the authorize URL and open it in the browser
//! 3. wait for the user to paste the code from the redirect page
//! 4. exchange the code for a token
//! 5. fetch the identity behind the token
//! 6. store token and identity
//!
//! `AuthorizationMachine::step` is a pure transition function from
//! (state, event) to (next state, effect). `OAuthFlow` drives it by running
//! each effect against a `FlowEnvironment` and feeding the result back as the
//! next event.
//!
//! The `state` parameter sent to GitHub is never compared with the one on the
//! redirect: the redirect is not received programmatically, the user copies
//! the code by hand.
//!
//! See: https://docs.github.com/en/apps/oauth-apps/building-oauth-apps/authorizing-oauth-apps#web-application-flow

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ExtsyncError, Result};
use crate::github::client::GitHubUser;

/// GitHub authorization endpoint
pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub OAuth token endpoint
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Redirect target registered for the OAuth app
pub const REDIRECT_URI: &str = "http://127.0.0.1:54321/callback";

/// OAuth scopes required for extsync
pub const OAUTH_SCOPES: &str = "repo read:user";

/// A registered OAuth app
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthApp")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Why a flow stopped without a credential
#[derive(Debug)]
pub enum FlowAbort {
    /// The user dismissed a prompt
    Cancelled { step: &'static str },
    /// A step failed
    Failed(ExtsyncError),
}

/// Flow states
#[derive(Debug)]
pub enum FlowState {
    /// Nothing has happened yet
    Start,
    /// Waiting for the OAuth app client ID
    AwaitingClientId,
    /// Waiting for the OAuth app client secret
    AwaitingClientSecret { client_id: String },
    /// Writing the entered app to configuration
    SavingApp { app: OAuthApp },
    /// Authorize URL handed to the browser
    BrowserOpened { app: OAuthApp },
    /// Waiting for the pasted authorization code
    AwaitingCode { app: OAuthApp },
    /// Code sent to the token endpoint
    ExchangingCode,
    /// Token obtained, looking up its owner
    FetchingIdentity { token: SecretString },
    /// Storing the credential
    Persisting { user: GitHubUser },
    /// Credential stored
    Succeeded { user: GitHubUser },
    /// Stopped; nothing was stored
    Aborted(FlowAbort),
}

impl FlowState {
    /// Whether no further events are accepted
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Succeeded { .. } | FlowState::Aborted(_))
    }

    fn name(&self) -> &'static str {
        match self {
            FlowState::Start => "start",
            FlowState::AwaitingClientId => "awaiting client id",
            FlowState::AwaitingClientSecret { .. } => "awaiting client secret",
            FlowState::SavingApp { .. } => "saving app",
            FlowState::BrowserOpened { .. } => "browser opened",
            FlowState::AwaitingCode { .. } => "awaiting code",
            FlowState::ExchangingCode => "exchanging code",
            FlowState::FetchingIdentity { .. } => "fetching identity",
            FlowState::Persisting { .. } => "persisting",
            FlowState::Succeeded { .. } => "succeeded",
            FlowState::Aborted(_) => "aborted",
        }
    }
}

/// Inputs to the state machine
#[derive(Debug)]
pub enum FlowEvent {
    /// Flow started with the app from configuration, if any
    Begin { app: Option<OAuthApp> },
    ClientIdEntered(Option<String>),
    ClientSecretEntered(Option<String>),
    AppSaved(Result<()>),
    BrowserLaunched,
    CodeEntered(Option<String>),
    TokenIssued(Result<SecretString>),
    IdentityFetched(Result<GitHubUser>),
    Persisted(Result<()>),
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            FlowEvent::Begin { .. } => "start",
            FlowEvent::ClientIdEntered(_) => "client id",
            FlowEvent::ClientSecretEntered(_) => "client secret",
            FlowEvent::AppSaved(_) => "app saved",
            FlowEvent::BrowserLaunched => "browser launch",
            FlowEvent::CodeEntered(_) => "authorization code",
            FlowEvent::TokenIssued(_) => "token",
            FlowEvent::IdentityFetched(_) => "identity",
            FlowEvent::Persisted(_) => "persist result",
        }
    }
}

/// Side effects requested by a transition
#[derive(Debug)]
pub enum FlowEffect {
    PromptClientId,
    PromptClientSecret,
    SaveApp(OAuthApp),
    OpenBrowser { url: String },
    PromptCode,
    ExchangeCode {
        app: OAuthApp,
        code: String,
        redirect_uri: String,
    },
    FetchIdentity { token: SecretString },
    Persist { token: SecretString, user: GitHubUser },
}

/// Result of a single step
#[derive(Debug)]
pub struct Transition {
    pub state: FlowState,
    pub effect: Option<FlowEffect>,
}

impl Transition {
    fn to(state: FlowState, effect: FlowEffect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }

    fn end(state: FlowState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn cancelled(step: &'static str) -> Self {
        Self::end(FlowState::Aborted(FlowAbort::Cancelled { step }))
    }

    fn failed(err: ExtsyncError) -> Self {
        Self::end(FlowState::Aborted(FlowAbort::Failed(err)))
    }
}

/// Fixed parameters of one authorization attempt
#[derive(Debug, Clone)]
pub struct AuthorizationMachine {
    redirect_uri: String,
    state_nonce: String,
}

impl Default for AuthorizationMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationMachine {
    /// Machine with a fresh random state nonce
    pub fn new() -> Self {
        Self::with_nonce(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Machine with a known state nonce
    pub fn with_nonce(state_nonce: String) -> Self {
        Self {
            redirect_uri: REDIRECT_URI.to_string(),
            state_nonce,
        }
    }

    /// The anti-CSRF nonce sent with the authorize request
    pub fn state_nonce(&self) -> &str {
        &self.state_nonce
    }

    /// Build the authorize URL for `app`
    pub fn authorize_url(&self, app: &OAuthApp) -> Result<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", app.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", OAUTH_SCOPES),
                ("state", self.state_nonce.as_str()),
            ],
        )
        .map_err(|e| ExtsyncError::Config(format!("Invalid authorize URL: {}", e)))?;

        Ok(url.to_string())
    }

    fn open_browser(&self, app: OAuthApp) -> Transition {
        match self.authorize_url(&app) {
            Ok(url) => Transition::to(
                FlowState::BrowserOpened { app },
                FlowEffect::OpenBrowser { url },
            ),
            Err(e) => Transition::failed(e),
        }
    }

    /// Advance the flow by one event
    pub fn step(&self, state: FlowState, event: FlowEvent) -> Transition {
        match (state, event) {
            (FlowState::Start, FlowEvent::Begin { app: Some(app) }) => self.open_browser(app),
            (FlowState::Start, FlowEvent::Begin { app: None }) => {
                Transition::to(FlowState::AwaitingClientId, FlowEffect::PromptClientId)
            }

            (FlowState::AwaitingClientId, FlowEvent::ClientIdEntered(input)) => {
                match non_blank(input) {
                    Some(client_id) => Transition::to(
                        FlowState::AwaitingClientSecret { client_id },
                        FlowEffect::PromptClientSecret,
                    ),
                    None => Transition::cancelled("client id"),
                }
            }

            (FlowState::AwaitingClientSecret { client_id }, FlowEvent::ClientSecretEntered(input)) => {
                match non_blank(input) {
                    Some(client_secret) => {
                        let app = OAuthApp {
                            client_id,
                            client_secret,
                        };
                        Transition::to(
                            FlowState::SavingApp { app: app.clone() },
                            FlowEffect::SaveApp(app),
                        )
                    }
                    None => Transition::cancelled("client secret"),
                }
            }

            (FlowState::SavingApp { app }, FlowEvent::AppSaved(result)) => match result {
                Ok(()) => self.open_browser(app),
                Err(e) => Transition::failed(e),
            },

            (FlowState::BrowserOpened { app }, FlowEvent::BrowserLaunched) => {
                Transition::to(FlowState::AwaitingCode { app }, FlowEffect::PromptCode)
            }

            (FlowState::AwaitingCode { app }, FlowEvent::CodeEntered(input)) => {
                match non_blank(input) {
                    Some(code) => Transition::to(
                        FlowState::ExchangingCode,
                        FlowEffect::ExchangeCode {
                            app,
                            code,
                            redirect_uri: self.redirect_uri.clone(),
                        },
                    ),
                    None => Transition::cancelled("authorization code"),
                }
            }

            (FlowState::ExchangingCode, FlowEvent::TokenIssued(result)) => match result {
                Ok(token) => Transition::to(
                    FlowState::FetchingIdentity {
                        token: token.clone(),
                    },
                    FlowEffect::FetchIdentity { token },
                ),
                Err(e) => Transition::failed(e),
            },

            (FlowState::FetchingIdentity { token }, FlowEvent::IdentityFetched(result)) => {
                match result {
                    Ok(user) => Transition::to(
                        FlowState::Persisting { user: user.clone() },
                        FlowEffect::Persist { token, user },
                    ),
                    Err(e) => Transition::failed(ExtsyncError::AuthenticationFailed(format!(
                        "The new token could not be used: {}",
                        e
                    ))),
                }
            }

            (FlowState::Persisting { user }, FlowEvent::Persisted(result)) => match result {
                Ok(()) => Transition::end(FlowState::Succeeded { user }),
                Err(e) => Transition::failed(e),
            },

            (state, event) => Transition::failed(ExtsyncError::AuthenticationFailed(format!(
                "unexpected {} while {}",
                event.name(),
                state.name()
            ))),
        }
    }
}

fn non_blank(input: Option<String>) -> Option<String> {
    input
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Side effects the flow needs from its host
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FlowEnvironment: Send {
    /// Ask for the OAuth app client ID
    fn ask_client_id(&mut self) -> Result<Option<String>>;
    /// Ask for the OAuth app client secret
    fn ask_client_secret(&mut self) -> Result<Option<String>>;
    /// Persist the OAuth app to configuration
    fn save_app(&mut self, app: &OAuthApp) -> Result<()>;
    /// Open `url` in the user's browser; failures are ignored
    fn open_browser(&mut self, url: &str);
    /// Ask for the authorization code shown after the redirect
    fn ask_code(&mut self) -> Result<Option<String>>;
    /// Exchange the code for an access token
    async fn exchange_code(
        &mut self,
        app: &OAuthApp,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SecretString>;
    /// Look up the identity behind `token`
    async fn fetch_identity(&mut self, token: &SecretString) -> Result<GitHubUser>;
    /// Store the credential
    fn persist(&mut self, token: &SecretString, user: &GitHubUser) -> Result<()>;
}

/// Drives an `AuthorizationMachine` against a `FlowEnvironment`
pub struct OAuthFlow<'a> {
    machine: AuthorizationMachine,
    env: &'a mut dyn FlowEnvironment,
}

impl<'a> OAuthFlow<'a> {
    /// Create a flow with a fresh machine
    pub fn new(env: &'a mut dyn FlowEnvironment) -> Self {
        Self::with_machine(AuthorizationMachine::new(), env)
    }

    /// Create a flow with a specific machine
    pub fn with_machine(machine: AuthorizationMachine, env: &'a mut dyn FlowEnvironment) -> Self {
        Self { machine, env }
    }

    /// Run to completion, returning the authenticated user
    ///
    /// `app` is the OAuth app from configuration, if one is set.
    pub async fn run(mut self, app: Option<OAuthApp>) -> Result<GitHubUser> {
        let mut transition = self.machine.step(FlowState::Start, FlowEvent::Begin { app });

        loop {
            tracing::debug!("OAuth flow: {}", transition.state.name());

            let effect = match transition.effect {
                Some(effect) => effect,
                None => break,
            };
            let event = self.perform(effect).await?;
            transition = self.machine.step(transition.state, event);
        }

        match transition.state {
            FlowState::Succeeded { user } => Ok(user),
            FlowState::Aborted(FlowAbort::Cancelled { step }) => {
                tracing::debug!("OAuth flow cancelled at {}", step);
                Err(ExtsyncError::Cancelled)
            }
            FlowState::Aborted(FlowAbort::Failed(e)) => Err(e),
            other => Err(ExtsyncError::AuthenticationFailed(format!(
                "flow stopped while {}",
                other.name()
            ))),
        }
    }

    async fn perform(&mut self, effect: FlowEffect) -> Result<FlowEvent> {
        let event = match effect {
            FlowEffect::PromptClientId => FlowEvent::ClientIdEntered(self.env.ask_client_id()?),
            FlowEffect::PromptClientSecret => {
                FlowEvent::ClientSecretEntered(self.env.ask_client_secret()?)
            }
            FlowEffect::SaveApp(app) => FlowEvent::AppSaved(self.env.save_app(&app)),
            FlowEffect::OpenBrowser { url } => {
                self.env.open_browser(&url);
                FlowEvent::BrowserLaunched
            }
            FlowEffect::PromptCode => FlowEvent::CodeEntered(self.env.ask_code()?),
            FlowEffect::ExchangeCode {
                app,
                code,
                redirect_uri,
            } => FlowEvent::TokenIssued(self.env.exchange_code(&app, &code, &redirect_uri).await),
            FlowEffect::FetchIdentity { token } => {
                FlowEvent::IdentityFetched(self.env.fetch_identity(&token).await)
            }
            FlowEffect::Persist { token, user } => {
                FlowEvent::Persisted(self.env.persist(&token, &user))
            }
        };
        Ok(event)
    }
}

/// Token response from GitHub
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// The access token
    pub access_token: String,
    /// Token type (usually "bearer")
    pub token_type: String,
    /// Granted scopes
    #[serde(default)]
    pub scope: String,
}

/// Error response from GitHub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Token request body
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Authorization-code exchange against the GitHub token endpoint
pub struct CodeExchange {
    client: Client,
    token_url: String,
}

impl Default for CodeExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeExchange {
    /// Create an exchanger for github.com
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange(
        &self,
        app: &OAuthApp,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SecretString> {
        let request = TokenRequest {
            client_id: &app.client_id,
            client_secret: &app.client_secret,
            code,
            redirect_uri,
        };

        let response = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ExtsyncError::AuthenticationFailed(format!(
                "token endpoint returned {}: {}",
                status, text
            )));
        }

        parse_token_response(&text).map(|token| SecretString::from(token.access_token))
    }
}

/// Interpret a token endpoint body
///
/// GitHub answers errors such as `bad_verification_code` with status 200,
/// so the body decides.
pub fn parse_token_response(text: &str) -> Result<TokenResponse> {
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(text) {
        let message = match error_response.error_description {
            Some(description) => format!("{} ({})", error_response.error, description),
            None => error_response.error,
        };
        return Err(ExtsyncError::AuthenticationFailed(message));
    }

    let token: TokenResponse = serde_json::from_str(text).map_err(|_| {
        ExtsyncError::AuthenticationFailed("Invalid response from GitHub".to_string())
    })?;

    if token.access_token.is_empty() {
        return Err(ExtsyncError::AuthenticationFailed(
            "GitHub returned an empty access token".to_string(),
        ));
    }

    tracing::debug!("Token issued ({} scopes: {})", token.token_type, token.scope);
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_user;
    use mockall::Sequence;
    use secrecy::ExposeSecret;

    fn app() -> OAuthApp {
        OAuthApp {
            client_id: "Iv1.client".to_string(),
            client_secret: "shh".to_string(),
        }
    }

    fn machine() -> AuthorizationMachine {
        AuthorizationMachine::with_nonce("nonce123".to_string())
    }

    /// Feed `events` from `Start`, returning the final state and every effect
    fn script(events: Vec<FlowEvent>) -> (FlowState, Vec<FlowEffect>) {
        let machine = machine();
        let mut state = FlowState::Start;
        let mut effects = Vec::new();
        for event in events {
            let transition = machine.step(state, event);
            state = transition.state;
            effects.extend(transition.effect);
        }
        (state, effects)
    }

    #[test]
    fn test_authorize_url_parameters() {
        let url = Url::parse(&machine().authorize_url(&app()).unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(url.path(), "/login/oauth/authorize");

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "Iv1.client");
        assert_eq!(params["redirect_uri"], REDIRECT_URI);
        assert_eq!(params["scope"], "repo read:user");
        assert_eq!(params["state"], "nonce123");
    }

    #[test]
    fn test_fresh_nonces_differ() {
        let a = AuthorizationMachine::new();
        let b = AuthorizationMachine::new();
        assert_ne!(a.state_nonce(), b.state_nonce());
        assert_eq!(a.state_nonce().len(), 32);
    }

    #[test]
    fn test_happy_path_with_configured_app() {
        let (state, effects) = script(vec![
            FlowEvent::Begin { app: Some(app()) },
            FlowEvent::BrowserLaunched,
            FlowEvent::CodeEntered(Some("  code-1 \n".to_string())),
            FlowEvent::TokenIssued(Ok(SecretString::from("gho_abc"))),
            FlowEvent::IdentityFetched(Ok(sample_user())),
            FlowEvent::Persisted(Ok(())),
        ]);

        assert!(state.is_terminal());
        assert!(matches!(state, FlowState::Succeeded { ref user } if user.login == "alice"));
        assert!(matches!(effects[0], FlowEffect::OpenBrowser { .. }));
        assert!(matches!(effects[1], FlowEffect::PromptCode));
        match &effects[2] {
            FlowEffect::ExchangeCode {
                code, redirect_uri, ..
            } => {
                assert_eq!(code, "code-1");
                assert_eq!(redirect_uri, REDIRECT_URI);
            }
            other => panic!("unexpected effect: {:?}", other),
        }
        assert!(
            matches!(&effects[3], FlowEffect::FetchIdentity { token } if token.expose_secret() == "gho_abc")
        );
        assert!(matches!(effects[4], FlowEffect::Persist { .. }));
        assert_eq!(effects.len(), 5);
    }

    #[test]
    fn test_missing_app_is_prompted_and_saved_first() {
        let (state, effects) = script(vec![
            FlowEvent::Begin { app: None },
            FlowEvent::ClientIdEntered(Some("id".to_string())),
            FlowEvent::ClientSecretEntered(Some("secret".to_string())),
            FlowEvent::AppSaved(Ok(())),
        ]);

        assert!(matches!(state, FlowState::BrowserOpened { .. }));
        assert!(matches!(effects[0], FlowEffect::PromptClientId));
        assert!(matches!(effects[1], FlowEffect::PromptClientSecret));
        assert!(matches!(
            &effects[2],
            FlowEffect::SaveApp(saved) if saved.client_id == "id" && saved.client_secret == "secret"
        ));
        assert!(matches!(effects[3], FlowEffect::OpenBrowser { .. }));
    }

    #[test]
    fn test_cancelled_prompts_abort() {
        let (state, _) = script(vec![
            FlowEvent::Begin { app: None },
            FlowEvent::ClientIdEntered(None),
        ]);
        assert!(matches!(
            state,
            FlowState::Aborted(FlowAbort::Cancelled { step: "client id" })
        ));

        let (state, _) = script(vec![
            FlowEvent::Begin { app: None },
            FlowEvent::ClientIdEntered(Some("id".to_string())),
            FlowEvent::ClientSecretEntered(Some("   ".to_string())),
        ]);
        assert!(matches!(
            state,
            FlowState::Aborted(FlowAbort::Cancelled { step: "client secret" })
        ));

        let (state, _) = script(vec![
            FlowEvent::Begin { app: Some(app()) },
            FlowEvent::BrowserLaunched,
            FlowEvent::CodeEntered(None),
        ]);
        assert!(matches!(
            state,
            FlowState::Aborted(FlowAbort::Cancelled {
                step: "authorization code"
            })
        ));
    }

    #[test]
    fn test_exchange_failure_aborts_with_underlying_error() {
        let (state, effects) = script(vec![
            FlowEvent::Begin { app: Some(app()) },
            FlowEvent::BrowserLaunched,
            FlowEvent::CodeEntered(Some("code".to_string())),
            FlowEvent::TokenIssued(Err(ExtsyncError::AuthenticationFailed(
                "bad_verification_code".to_string(),
            ))),
        ]);

        match state {
            FlowState::Aborted(FlowAbort::Failed(e)) => {
                assert!(e.to_string().contains("bad_verification_code"))
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(!effects
            .iter()
            .any(|e| matches!(e, FlowEffect::Persist { .. })));
    }

    #[test]
    fn test_identity_failure_aborts_before_persist() {
        let (state, effects) = script(vec![
            FlowEvent::Begin { app: Some(app()) },
            FlowEvent::BrowserLaunched,
            FlowEvent::CodeEntered(Some("code".to_string())),
            FlowEvent::TokenIssued(Ok(SecretString::from("gho_abc"))),
            FlowEvent::IdentityFetched(Err(ExtsyncError::GitHubApi {
                status: Some(500),
                message: "boom".to_string(),
            })),
        ]);

        assert!(matches!(
            state,
            FlowState::Aborted(FlowAbort::Failed(ExtsyncError::AuthenticationFailed(_)))
        ));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, FlowEffect::Persist { .. })));
    }

    #[test]
    fn test_out_of_order_event_aborts() {
        let (state, effects) = script(vec![FlowEvent::CodeEntered(Some("code".to_string()))]);
        assert!(matches!(state, FlowState::Aborted(FlowAbort::Failed(_))));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_parse_token_response() {
        let token =
            parse_token_response(r#"{"access_token":"gho_1","token_type":"bearer","scope":"repo,read:user"}"#)
                .unwrap();
        assert_eq!(token.access_token, "gho_1");
        assert_eq!(token.scope, "repo,read:user");

        let err = parse_token_response(
            r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad_verification_code"));

        assert!(parse_token_response("<html>").is_err());
        assert!(parse_token_response(r#"{"access_token":"","token_type":"bearer"}"#).is_err());
    }

    #[tokio::test]
    async fn test_driver_runs_full_flow() {
        let mut env = MockFlowEnvironment::new();
        let mut seq = Sequence::new();

        env.expect_ask_client_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("id".to_string())));
        env.expect_ask_client_secret()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("secret".to_string())));
        env.expect_save_app()
            .withf(|app| app.client_id == "id" && app.client_secret == "secret")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        env.expect_open_browser()
            .withf(|url| url.contains("state=nonce123") && url.contains("client_id=id"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        env.expect_ask_code()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some("the-code".to_string())));
        env.expect_exchange_code()
            .withf(|_, code, redirect| code == "the-code" && redirect == REDIRECT_URI)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(SecretString::from("gho_new")));
        env.expect_fetch_identity()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(sample_user()));
        env.expect_persist()
            .withf(|token, user| token.expose_secret() == "gho_new" && user.id == 42)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let user = OAuthFlow::with_machine(machine(), &mut env)
            .run(None)
            .await
            .unwrap();
        assert_eq!(user.login, "alice");
    }

    #[tokio::test]
    async fn test_driver_cancel_persists_nothing() {
        let mut env = MockFlowEnvironment::new();
        env.expect_open_browser().times(1).return_const(());
        env.expect_ask_code().times(1).returning(|| Ok(None));
        env.expect_exchange_code().never();
        env.expect_persist().never();

        let result = OAuthFlow::with_machine(machine(), &mut env)
            .run(Some(app()))
            .await;
        assert!(matches!(result, Err(ExtsyncError::Cancelled)));
    }

    #[tokio::test]
    async fn test_driver_surfaces_exchange_error() {
        let mut env = MockFlowEnvironment::new();
        env.expect_open_browser().return_const(());
        env.expect_ask_code()
            .returning(|| Ok(Some("code".to_string())));
        env.expect_exchange_code().returning(|_, _, _| {
            Err(ExtsyncError::AuthenticationFailed(
                "incorrect_client_credentials".to_string(),
            ))
        });
        env.expect_fetch_identity().never();
        env.expect_persist().never();

        let err = OAuthFlow::with_machine(machine(), &mut env)
            .run(Some(app()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("incorrect_client_credentials"));
    }
}
