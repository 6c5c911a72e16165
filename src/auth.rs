use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::entities::UserId;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    iat: i64,
    exp: i64,
}

/// Issues and checks HS256 bearer tokens carrying the user id.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expire_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::days(expire_days),
        }
    }

    pub fn issue(&self, user: UserId) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .context("failed to sign token")
    }

    /// `None` for tokens that are malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Option<UserId> {
        let data = match jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
        {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!("rejected token: {}", e);
                return None;
            },
        };

        data.claims.user_id.parse().ok()
    }
}

/// bcrypt with a configurable cost, run off the async workers.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self { Self { cost } }

    pub async fn hash(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("hashing task panicked")?
            .context("failed to hash password")
    }

    pub async fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("verifying task panicked")?
            .context("failed to verify password")
    }
}
