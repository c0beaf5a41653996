//! Card number sealing.
//!
//! Key material is derived once from an injected passphrase and salt with
//! Argon2id. Each number is sealed with AES-256-GCM under a fresh random
//! 96-bit nonce; the stored token is `base64(nonce || ciphertext)`. Lookups by
//! number go through a keyed SHA-256 digest instead of ciphertext equality.

use crate::domain::ports::CardNumberCodec;
use crate::error::{BankError, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const MIN_SALT_LEN: usize = 8;
const DIGEST_DOMAIN: &[u8] = b"bankcards/card-number-index/v1";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    pub time_cost: u32,
    /// KiB
    pub memory_cost: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            time_cost: 3,
            memory_cost: 65536,
            parallelism: 4,
        }
    }
}

/// AES-256-GCM card number codec with a keyed lookup digest.
pub struct CardCipher {
    cipher: Aes256Gcm,
    index_key: Zeroizing<[u8; KEY_LEN]>,
}

impl CardCipher {
    /// Derives both keys from `passphrase` and `salt`. This is the slow step
    /// and is meant to run once at startup.
    pub fn derive(passphrase: &str, salt: &str, params: KdfParams) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(BankError::Encryption("Passphrase must not be empty".to_string()));
        }
        if salt.len() < MIN_SALT_LEN {
            return Err(BankError::Encryption(format!(
                "Salt must be at least {} bytes",
                MIN_SALT_LEN
            )));
        }

        let argon2_params = argon2::Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(KEY_LEN * 2),
        )
        .map_err(|e| BankError::Encryption(format!("Failed to initialize encryption: {}", e)))?;
        let argon2 = argon2::Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2_params,
        );

        let mut okm = Zeroizing::new([0u8; KEY_LEN * 2]);
        argon2
            .hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut okm[..])
            .map_err(|e| BankError::Encryption(format!("Failed to initialize encryption: {}", e)))?;

        let cipher = Aes256Gcm::new_from_slice(&okm[..KEY_LEN])
            .map_err(|_| BankError::Encryption("Failed to initialize encryption".to_string()))?;
        let mut index_key = Zeroizing::new([0u8; KEY_LEN]);
        index_key.copy_from_slice(&okm[KEY_LEN..]);

        tracing::debug!("Card number keys derived");
        Ok(Self { cipher, index_key })
    }
}

impl CardNumberCodec for CardCipher {
    fn encode(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Err(BankError::Encryption("Encryption failed".to_string()));
        }
        let nonce_bytes: [u8; NONCE_LEN] = rand::thread_rng().r#gen();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| BankError::Encryption("Encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    fn decode(&self, token: &str) -> Result<String> {
        let sealed = STANDARD
            .decode(token)
            .map_err(|_| BankError::Encryption("Decryption failed".to_string()))?;
        if sealed.len() <= NONCE_LEN {
            return Err(BankError::Encryption("Decryption failed".to_string()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| BankError::Encryption("Decryption failed".to_string()))?;
        String::from_utf8(plaintext).map_err(|_| BankError::Encryption("Decryption failed".to_string()))
    }

    fn digest(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(DIGEST_DOMAIN);
        hasher.update(&self.index_key[..]);
        hasher.update(plaintext.as_bytes());
        STANDARD.encode(hasher.finalize())
    }
}
