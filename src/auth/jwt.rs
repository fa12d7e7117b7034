use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id of the acting user.
    pub sub: String,
    pub role: u8,
    pub exp: usize,
    pub jti: String,
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// Issues a bearer token for an employee session.
pub fn generate_access_token(
    employee_id: &str,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: employee_id.to_string(),
        role: role.id(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let token = generate_access_token("emp-1", Role::Supervisor, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "emp-1");
        assert_eq!(Role::from_id(claims.role), Some(Role::Supervisor));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token("emp-1", Role::Worker, "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
