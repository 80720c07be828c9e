use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;
const HASH_SCHEME: &str = "v1";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    exp: i64,
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Signed-in user plus the bearer token that proves it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("auth storage failure: {0}")]
    Storage(String),
}

fn storage_error(context: &str, err: impl Display) -> AuthError {
    AuthError::Storage(format!("{}: {}", context, err))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl Account {
    fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct AccountsFile {
    users: Vec<Account>,
}

/// HS256 token signing with keys derived once from the secret
struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    fn issue(&self, account: &Account) -> Result<AuthSession, AuthError> {
        let expires_at = Utc::now() + self.ttl;
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            exp: expires_at.timestamp(),
        };
        let header = Header::new(Algorithm::HS256);
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding)
            .map_err(|err| storage_error("Failed to sign token", err))?;

        Ok(AuthSession {
            token,
            expires_at,
            user: account.summary(),
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| AuthError::Unauthorized(format!("Invalid token: {}", err)))
    }
}

/// Email/password accounts persisted as `users.json`
#[derive(Clone)]
pub struct AuthStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    path: PathBuf,
    tokens: Arc<TokenIssuer>,
}

impl AuthStore {
    pub async fn new(
        dir: PathBuf,
        jwt_secret: impl Into<String>,
        token_ttl_seconds: i64,
    ) -> Result<Self, AuthError> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| storage_error("Failed to create auth directory", err))?;
        let path = dir.join("users.json");
        let accounts = read_accounts(&path).await?;
        tracing::debug!("Loaded {} accounts from {:?}", accounts.len(), path);

        Ok(Self {
            accounts: Arc::new(RwLock::new(accounts)),
            path,
            tokens: Arc::new(TokenIssuer::new(&jwt_secret.into(), token_ttl_seconds)),
        })
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = canonical_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|account| account.email == email) {
            return Err(AuthError::Conflict(format!(
                "An account for {} already exists",
                email
            )));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email,
            password_hash: hash_password(password),
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        write_accounts(&self.path, &accounts).await?;
        tracing::info!("Registered account {}", account.id);

        self.tokens.issue(&account)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = canonical_email(email)?;
        let accounts = self.accounts.read().await;
        let account = accounts
            .values()
            .find(|account| account.email == email)
            .filter(|account| verify_password(&account.password_hash, password))
            .ok_or_else(|| AuthError::Unauthorized("Invalid email or password".to_string()))?;

        self.tokens.issue(account)
    }

    /// Resolve a bearer token to the account it was issued for
    pub async fn authorize_bearer(&self, token: &str) -> Result<UserSummary, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.accounts
            .read()
            .await
            .get(&claims.sub)
            .map(Account::summary)
            .ok_or_else(|| AuthError::Unauthorized("Account no longer exists".to_string()))
    }
}

async fn read_accounts(path: &Path) -> Result<HashMap<Uuid, Account>, AuthError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| storage_error("Failed to read accounts", err))?;
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let file: AccountsFile = serde_json::from_str(&raw)
        .map_err(|err| storage_error("Corrupt accounts file", err))?;
    Ok(file
        .users
        .into_iter()
        .map(|account| (account.id, account))
        .collect())
}

async fn write_accounts(
    path: &Path,
    accounts: &HashMap<Uuid, Account>,
) -> Result<(), AuthError> {
    let mut users: Vec<Account> = accounts.values().cloned().collect();
    users.sort_by_key(|account| account.created_at);
    let raw = serde_json::to_string_pretty(&AccountsFile { users })
        .map_err(|err| storage_error("Failed to encode accounts", err))?;
    tokio::fs::write(path, raw)
        .await
        .map_err(|err| storage_error("Failed to write accounts", err))
}

fn canonical_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = matches!(
        email.split_once('@'),
        Some((local, domain)) if !local.is_empty() && !domain.is_empty()
    );
    if !valid {
        return Err(AuthError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(email)
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .to_vec()
}

/// `v1$<salt>$<digest>`, both parts unpadded URL-safe base64
fn hash_password(password: &str) -> String {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    [
        HASH_SCHEME.to_string(),
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest),
    ]
    .join("$")
}

fn verify_password(stored: &str, password: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, salt, digest] = parts.as_slice() else {
        return false;
    };
    if *scheme != HASH_SCHEME {
        return false;
    }
    match (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(digest)) {
        (Ok(salt), Ok(digest)) => salted_digest(&salt, password) == digest,
        _ => false,
    }
}
