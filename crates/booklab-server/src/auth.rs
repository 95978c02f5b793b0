use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::SecurityConfig,
    error::{CatalogError, CatalogResult},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(email: &str, password: &str) -> CatalogResult<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        })
    }
}

pub fn hash_password(password: &str) -> CatalogResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CatalogError::Internal(err.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> CatalogResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|err| CatalogError::Internal(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct JwtSigner {
    issuer: String,
    audience: String,
    expiry_minutes: i64,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSigner {
    pub fn new(config: &SecurityConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            expiry_minutes: config.jwt_expiry_minutes,
            encoding,
            decoding,
        }
    }

    pub fn expiry_minutes(&self) -> i64 {
        self.expiry_minutes
    }

    pub fn issue(&self, subject: &str, email: &str) -> CatalogResult<String> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.expiry_minutes)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| CatalogError::Internal(err.to_string()))
    }

    pub fn verify(&self, token: &str) -> CatalogResult<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| CatalogError::Authentication)?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> JwtSigner {
        JwtSigner::new(&SecurityConfig::default())
    }

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(verify_password(&hash, "correct horse battery").expect("verify"));
        assert!(!verify_password(&hash, "wrong password").expect("verify"));
    }

    #[test]
    fn issued_token_verifies_with_same_signer() {
        let signer = signer();
        let token = signer.issue("user-1", "reader@booklab.dev").expect("issue");
        let claims = signer.verify(&token).expect("verify");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "reader@booklab.dev");
        assert_eq!(claims.iss, "booklab.api");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = signer().issue("user-1", "reader@booklab.dev").expect("issue");
        let other = JwtSigner::new(&SecurityConfig {
            jwt_secret: "a-different-secret".to_string(),
            ..SecurityConfig::default()
        });
        assert!(matches!(
            other.verify(&token),
            Err(CatalogError::Authentication)
        ));
    }
}
