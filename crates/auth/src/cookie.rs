//! Encrypted cookie payloads with key rotation
//!
//! Values are serialized to JSON and sealed with AES-256-GCM under a fresh
//! random nonce. The first configured key encrypts; every key is tried on
//! decryption, so a key can be retired by moving it down the list first.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthResult};

const KEY_LEN: usize = 32;
const IV_LEN: usize = 12;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// One entry of the `cookie_encryption_keys` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieEncryptionKey {
    /// 32-byte AES-256 key
    pub key: String,

    /// 12-byte value bound to every ciphertext as associated data
    pub iv: String,
}

impl CookieEncryptionKey {
    /// Create a key entry
    pub fn new(key: impl Into<String>, iv: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            iv: iv.into(),
        }
    }

    /// Check key and iv lengths
    pub fn validate(&self) -> AuthResult<()> {
        if self.key.len() != KEY_LEN {
            return Err(AuthError::Configuration(format!(
                "cookie encryption key must be {} bytes, got {}",
                KEY_LEN,
                self.key.len()
            )));
        }
        if self.iv.len() != IV_LEN {
            return Err(AuthError::Configuration(format!(
                "cookie encryption iv must be {} bytes, got {}",
                IV_LEN,
                self.iv.len()
            )));
        }
        Ok(())
    }
}

struct SealingKey {
    cipher: Aes256Gcm,
    aad: Vec<u8>,
}

/// Seals and opens cookie values
pub struct CookieCipher {
    keys: Vec<SealingKey>,
}

impl std::fmt::Debug for CookieCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCipher")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl CookieCipher {
    /// Build a cipher from an ordered key list
    pub fn new(keys: &[CookieEncryptionKey]) -> AuthResult<Self> {
        if keys.is_empty() {
            return Err(AuthError::Configuration(
                "at least one cookie encryption key is required".to_string(),
            ));
        }

        let keys = keys
            .iter()
            .map(|entry| {
                entry.validate()?;
                let cipher = Aes256Gcm::new_from_slice(entry.key.as_bytes())
                    .map_err(|_| AuthError::Configuration("invalid cookie encryption key".to_string()))?;
                Ok(SealingKey {
                    cipher,
                    aad: entry.iv.as_bytes().to_vec(),
                })
            })
            .collect::<AuthResult<Vec<_>>>()?;

        Ok(Self { keys })
    }

    /// Encrypt a value with the primary key
    pub fn encrypt_json<T: Serialize>(&self, value: &T) -> AuthResult<String> {
        let primary = &self.keys[0];
        let payload = serde_json::to_vec(value)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = primary
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &payload,
                    aad: &primary.aad,
                },
            )
            .map_err(|_| AuthError::Crypto)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Decrypt a value, trying each key in order
    pub fn decrypt_json<T: DeserializeOwned>(&self, value: &str) -> AuthResult<T> {
        let raw = URL_SAFE_NO_PAD.decode(value).map_err(|_| AuthError::Crypto)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(AuthError::Crypto);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .keys
            .iter()
            .find_map(|key| {
                key.cipher
                    .decrypt(
                        Nonce::from_slice(nonce),
                        Payload {
                            msg: ciphertext,
                            aad: &key.aad,
                        },
                    )
                    .ok()
            })
            .ok_or(AuthError::Crypto)?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}
