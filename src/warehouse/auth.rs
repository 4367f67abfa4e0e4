//! Key-pair authentication.
//!
//! Snowflake authenticates service users with an RS256 JWT signed by the
//! user's RSA private key. The issuer names the public key by its SHA-256
//! fingerprint, so both are derived from the key once at load time.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::{JWT_LIFETIME_SECS, JWT_RENEW_MARGIN_SECS};
use crate::error_handling::ConfigError;

const ENCRYPTED_PEM_LABEL: &str = "BEGIN ENCRYPTED PRIVATE KEY";
const PKCS1_PEM_LABEL: &str = "BEGIN RSA PRIVATE KEY";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    iat: i64,
    exp: i64,
}

/// A loaded private key ready to sign JWTs.
#[derive(Clone)]
pub struct KeyPair {
    encoding_key: EncodingKey,
    fingerprint: String,
}

impl KeyPair {
    /// Loads an RSA private key from a PEM file.
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`), encrypted PKCS#8 (`ENCRYPTED PRIVATE
    /// KEY`, requires `passphrase`) and PKCS#1 (`RSA PRIVATE KEY`).
    ///
    /// # Errors
    ///
    /// - `ConfigError::KeyRead` if the file cannot be read
    /// - `ConfigError::PassphraseRequired` for an encrypted key without passphrase
    /// - `ConfigError::InvalidKey` if decoding fails (including a wrong passphrase)
    pub fn from_pem_file(path: &Path, passphrase: Option<&str>) -> Result<Self, ConfigError> {
        let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        })?;

        let key = if pem.contains(ENCRYPTED_PEM_LABEL) {
            let passphrase = passphrase.ok_or_else(|| ConfigError::PassphraseRequired {
                path: path.to_path_buf(),
            })?;
            RsaPrivateKey::from_pkcs8_encrypted_pem(&pem, passphrase.as_bytes())
                .map_err(|e| ConfigError::InvalidKey(format!("cannot decrypt key: {}", e)))?
        } else {
            if passphrase.is_some() {
                log::warn!(
                    "SNOWFLAKE_PRIVATE_KEY_PASSPHRASE is set but {} is not encrypted; ignoring it",
                    path.display()
                );
            }
            if pem.contains(PKCS1_PEM_LABEL) {
                RsaPrivateKey::from_pkcs1_pem(&pem)
                    .map_err(|e| ConfigError::InvalidKey(e.to_string()))?
            } else {
                RsaPrivateKey::from_pkcs8_pem(&pem)
                    .map_err(|e| ConfigError::InvalidKey(e.to_string()))?
            }
        };

        Self::from_private_key(&key)
    }

    /// Builds a key pair from a decoded RSA key.
    pub fn from_private_key(key: &RsaPrivateKey) -> Result<Self, ConfigError> {
        let public_der = RsaPublicKey::from(key)
            .to_public_key_der()
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
        let fingerprint = format!(
            "SHA256:{}",
            BASE64.encode(Sha256::digest(public_der.as_bytes()))
        );

        let private_der = key
            .to_pkcs1_der()
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_rsa_der(private_der.as_bytes()),
            fingerprint,
        })
    }

    /// Public key fingerprint (`SHA256:<base64>`), as registered on the user.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Signs a JWT for `qualified_user` (`ACCOUNT.USER`) issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKey` if the key cannot sign (e.g. too short).
    pub fn token(&self, qualified_user: &str, now: DateTime<Utc>) -> Result<String, ConfigError> {
        let issuer = format!("{}.{}", qualified_user, self.fingerprint);
        let iat = now.timestamp();
        let claims = Claims {
            iss: &issuer,
            sub: qualified_user,
            iat,
            exp: iat + JWT_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| ConfigError::InvalidKey(format!("cannot sign JWT: {}", e)))
    }
}

/// The bearer token of one session, re-signed as it nears expiry.
#[derive(Clone)]
pub struct SessionToken {
    key: KeyPair,
    qualified_user: String,
    token: String,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Signs the first token for `qualified_user` at `now`.
    ///
    /// # Errors
    ///
    /// See [`KeyPair::token`].
    pub fn new(
        key: KeyPair,
        qualified_user: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let qualified_user = qualified_user.into();
        let token = key.token(&qualified_user, now)?;
        Ok(Self {
            key,
            qualified_user,
            token,
            expires_at: now + Duration::seconds(JWT_LIFETIME_SECS),
        })
    }

    /// Returns a token valid at `now` for at least the renewal margin.
    ///
    /// # Errors
    ///
    /// See [`KeyPair::token`].
    pub fn current(&mut self, now: DateTime<Utc>) -> Result<&str, ConfigError> {
        if now + Duration::seconds(JWT_RENEW_MARGIN_SECS) >= self.expires_at {
            log::debug!("Re-signing JWT for {}", self.qualified_user);
            self.token = self.key.token(&self.qualified_user, now)?;
            self.expires_at = now + Duration::seconds(JWT_LIFETIME_SECS);
        }
        Ok(&self.token)
    }

    /// When the current token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("qualified_user", &self.qualified_user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}
