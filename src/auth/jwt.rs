use crate::core::errors::LedgerError;
use crate::core::models::UserId;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const TOKEN_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, LedgerError> {
        self.sub
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .map(UserId)
            .ok_or_else(|| LedgerError::Unauthorized(format!("Invalid subject: {}", self.sub)))
    }
}

pub struct JwtService {
    secret: String,
}

impl JwtService {
    pub fn new(secret: String) -> Self {
        JwtService { secret }
    }

    pub fn generate_token(&self, user_id: UserId) -> Result<String, LedgerError> {
        let expiration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_secs() + TOKEN_LIFETIME_SECS) as usize)
            .map_err(|e| LedgerError::InternalServerError(format!("Time error: {}", e)))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| LedgerError::InternalServerError(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, LedgerError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| LedgerError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}
