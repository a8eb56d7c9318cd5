//! JWT token handling

use crate::config::JwtConfig;
use crate::domain::UserId;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const AUDIENCE: &str = "teamjoin";
const ACCESS_TOKEN_TYPE: &str = "access";

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// Token type discriminator
    #[serde(default)]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<UserId> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))
    }
}

/// JWT token manager (HS256)
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_audience(&[AUDIENCE]);
        v.set_issuer(&[self.config.issuer.as_str()]);
        v
    }

    pub fn create_access_token(&self, user_id: UserId) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_ttl_secs);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            iss: self.config.issuer.clone(),
            aud: AUDIENCE.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation())?;
        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Unauthorized("Unexpected token type".to_string()));
        }
        Ok(data.claims)
    }

    pub fn access_token_ttl(&self) -> i64 {
        self.config.access_token_ttl_secs
    }
}
