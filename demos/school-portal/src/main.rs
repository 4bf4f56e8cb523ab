use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use rollcall::prelude::*;
use rollcall_storage::StorageError;
use tracing::info;

// ---------------------------------------------------------------------------
// Credential exchange
// ---------------------------------------------------------------------------

/// One account per role, all with the same password. Development only.
struct DemoDirectory;

const DEMO_PASSWORD: &str = "rollcall";

const ACCOUNTS: [(&str, Role, &str); 5] = [
    ("admin@school.test", Role::Admin, "Principal Okafor"),
    ("teacher@school.test", Role::Teacher, "Ms. Lindqvist"),
    ("student@school.test", Role::Student, "Ravi"),
    ("parent@school.test", Role::Parent, "Mr. Duarte"),
    ("accountant@school.test", Role::Accountant, "Ms. Haddad"),
];

impl CredentialExchange for DemoDirectory {
    async fn exchange(&self, credentials: &Credentials) -> Result<LoginResponse, SessionError> {
        let Some((index, (email, role, name))) = ACCOUNTS
            .iter()
            .enumerate()
            .find(|(_, (email, _, _))| email.eq_ignore_ascii_case(&credentials.email))
        else {
            return Err(SessionError::AuthFailed("Invalid email or password".into()));
        };
        if credentials.password != DEMO_PASSWORD {
            return Err(SessionError::AuthFailed("Invalid email or password".into()));
        }

        Ok(LoginResponse {
            token: mint_token(&mut rand::rng()),
            user: User {
                id: UserId::from(format!("{role}-{}", index + 1).as_str()),
                role: *role,
                name: (*name).to_string(),
                email: Some((*email).to_string()),
            },
        })
    }
}

/// 128 random bits, hex encoded.
fn mint_token(rng: &mut impl Rng) -> String {
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

fn data_dir() -> PathBuf {
    std::env::var_os("ROLLCALL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("rollcall-school-portal"))
}

#[tokio::main]
async fn main() -> Result<(), RollcallError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let dir = data_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(StorageError::WriteFailed)?;
    info!(dir = %dir.display(), "using data directory");

    let mut ctx = SessionContextBuilder::new()
        .heartbeat(HeartbeatConfig::with_interval(Duration::from_secs(2)))
        .location("/teacher/classes")
        .build(
            FileStore::open(dir.join("local-storage.json")),
            FileCookieJar::open(dir.join("cookies.json")),
            SystemClock,
            DemoDirectory,
        )
        .await?;
    info!(outcome = ?ctx.outcome(), "page loaded");

    if !ctx.auth().is_authenticated() {
        ctx.navigate("/login").await;
        ctx.guard().changed().await;

        if let Err(error) = ctx.auth().login("teacher@school.test", "guess").await {
            info!(%error, "login refused");
        }
        ctx.auth().login("teacher@school.test", DEMO_PASSWORD).await?;
        let outcome = ctx
            .guard()
            .wait_for(GuardOutcome::is_redirect)
            .await
            .unwrap_or(GuardOutcome::Render);
        info!(?outcome, "signed in");
        if let Some(home) = outcome.redirect_target() {
            ctx.navigate(home).await;
        }
    }

    let authorizer = ctx.authorizer();
    let sent_token = ctx.store().token().await.unwrap_or_default();
    let header = authorizer.authorization_header().await;
    info!(header = header.as_deref().unwrap_or("-"), "outgoing request");

    tokio::time::sleep(Duration::from_secs(5)).await;
    info!(beats = ctx.heartbeat().beats(), "liveness marker kept fresh");

    if std::env::args().any(|arg| arg == "--reject") {
        authorizer.observe("/api/classes", 401, &sent_token);
        let outcome = ctx
            .guard()
            .wait_for(|outcome| matches!(outcome, GuardOutcome::RedirectToSignIn(_)))
            .await;
        info!(?outcome, "server rejected the token");
    } else if std::env::args().any(|arg| arg == "--logout") {
        ctx.auth().logout().await;
        info!("signed out");
    } else {
        info!("session kept; run again to restore it, or pass --logout");
    }

    ctx.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exchange_known_account_returns_role() {
        let response = DemoDirectory
            .exchange(&Credentials::new("parent@school.test", DEMO_PASSWORD))
            .await
            .unwrap();

        assert_eq!(response.user.role, Role::Parent);
        assert!(response.validate().is_ok());
    }

    #[tokio::test]
    async fn test_exchange_wrong_password_fails() {
        let result = DemoDirectory
            .exchange(&Credentials::new("admin@school.test", "admin"))
            .await;

        assert!(matches!(result, Err(SessionError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn test_exchange_unknown_account_fails() {
        let result = DemoDirectory
            .exchange(&Credentials::new("janitor@school.test", DEMO_PASSWORD))
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_mint_token_is_32_hex_chars() {
        let token = mint_token(&mut rand::rng());

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
