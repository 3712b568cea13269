//! Authentication CLI command handlers

use std::process::Command;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::cli::commands::AuthCommand;
use crate::core::config::{Config, ConfigSink, FileConfigSink};
use crate::core::credentials::{mask_token, CredentialStore};
use crate::core::prompt::{Prompter, TerminalPrompter};
use crate::error::Result;
use crate::github::auth::{CodeExchange, FlowEnvironment, OAuthApp, OAuthFlow, REDIRECT_URI};
use crate::github::client::{GitHubIdentity, GitHubUser, IdentityApi};

/// Handle authentication commands
pub async fn handle_auth(command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::Login => handle_login().await,
        AuthCommand::Logout => handle_logout(),
        AuthCommand::Status => handle_status().await,
    }
}

/// Terminal-backed effects for the OAuth flow
struct TerminalFlowEnvironment {
    prompter: TerminalPrompter,
    config: Config,
    sink: FileConfigSink,
    exchange: CodeExchange,
    identity: GitHubIdentity,
    store: CredentialStore,
}

#[async_trait]
impl FlowEnvironment for TerminalFlowEnvironment {
    fn ask_client_id(&mut self) -> Result<Option<String>> {
        println!("extsync signs in through your own GitHub OAuth app.");
        println!();
        println!("To create one:");
        println!("  1. Go to: https://github.com/settings/applications/new");
        println!("  2. Set the callback URL to: {}", REDIRECT_URI);
        println!("  3. Register it and generate a client secret");
        println!();
        self.prompter.input("Client ID:")
    }

    fn ask_client_secret(&mut self) -> Result<Option<String>> {
        self.prompter.secret("Client secret:")
    }

    fn save_app(&mut self, app: &OAuthApp) -> Result<()> {
        self.config.client_id = Some(app.client_id.clone());
        self.config.client_secret = Some(app.client_secret.clone());
        self.sink.persist(&self.config)
    }

    fn open_browser(&mut self, url: &str) {
        println!();
        println!("Open this URL in your browser:");
        println!("  {}", url);
        println!();

        // Try to open browser automatically
        if open_browser(url) {
            println!("✓ Browser opened automatically.");
        }
    }

    fn ask_code(&mut self) -> Result<Option<String>> {
        println!();
        println!("After authorizing, the browser is sent to {}?code=...", REDIRECT_URI);
        println!("The page will not load. Copy the value of 'code' from the address bar.");
        println!();
        self.prompter.input("Authorization code:")
    }

    async fn exchange_code(
        &mut self,
        app: &OAuthApp,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SecretString> {
        println!("Exchanging code for a token...");
        self.exchange.exchange(app, code, redirect_uri).await
    }

    async fn fetch_identity(&mut self, token: &SecretString) -> Result<GitHubUser> {
        self.identity.current_user(token).await
    }

    fn persist(&mut self, token: &SecretString, user: &GitHubUser) -> Result<()> {
        self.store.save(token, user)
    }
}

/// Handle the login command using the authorization-code flow
async fn handle_login() -> Result<()> {
    let store = CredentialStore::keyring();

    // Check if already authenticated
    if let Some(credential) = store.get()? {
        println!("✓ Already authenticated as @{}.", credential.login());
        println!();
        println!("  To re-authenticate, first run: extsync auth logout");
        return Ok(());
    }

    let config = Config::load()?;
    let app = config
        .oauth_app()
        .map(|(client_id, client_secret)| OAuthApp {
            client_id,
            client_secret,
        });

    println!("Starting GitHub authentication...\n");

    let mut env = TerminalFlowEnvironment {
        prompter: TerminalPrompter,
        config,
        sink: FileConfigSink::new()?,
        exchange: CodeExchange::new(),
        identity: GitHubIdentity,
        store,
    };
    let user = OAuthFlow::new(&mut env).run(app).await?;

    println!("\n✓ Logged in to GitHub as @{}", user.login);
    Ok(())
}

/// Try to open a URL in the default browser
fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(url).spawn().is_ok()
    }
    #[cfg(target_os = "linux")]
    {
        Command::new("xdg-open").arg(url).spawn().is_ok()
    }
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .is_ok()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = url;
        false
    }
}

/// Handle the logout command
fn handle_logout() -> Result<()> {
    CredentialStore::keyring().clear()?;
    println!("Successfully logged out.");
    Ok(())
}

/// Handle the status command
async fn handle_status() -> Result<()> {
    let store = CredentialStore::keyring();

    println!("Authentication Status:");
    match store.get()? {
        Some(credential) => {
            println!("  GitHub: Authenticated as @{}", credential.login());
            println!("  Token: {}", mask_token(&credential.access_token));

            let valid = store.is_valid(&GitHubIdentity).await;
            println!(
                "  Remote check: {}",
                if valid {
                    "Token accepted"
                } else {
                    "Token rejected or GitHub unreachable (run 'extsync auth login' again)"
                }
            );
        }
        None => println!("  GitHub: Not authenticated"),
    }

    let config = Config::load()?;
    println!(
        "  Repository: {}",
        config.repository.as_deref().unwrap_or("Not configured")
    );
    println!(
        "  OAuth app: {}",
        if config.oauth_app().is_some() {
            "Configured"
        } else {
            "Not configured"
        }
    );

    Ok(())
}
