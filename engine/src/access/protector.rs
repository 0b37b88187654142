//! Data protector - encrypts strategy payloads and tracks access grants
//!
//! A protected payload is AES-256-GCM ciphertext under a key derived from
//! the signer credential (PBKDF2-HMAC-SHA256, per-payload salt). The
//! protected-data reference handed back to callers is the hex SHA-256
//! digest of the ciphertext, prefixed `0x` - an opaque, stable handle.

use std::collections::HashMap;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::anyhow;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac_array;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use shared::error::{MarketError, MarketResult};
use shared::models::normalize_address;

const KEY_DERIVATION_ROUNDS: u32 = 100_000;

struct ProtectedEntry {
    salt: [u8; 16],
    nonce: [u8; 12],
    ciphertext: Vec<u8>,
    /// Normalized addresses allowed to reveal the payload
    authorized: Vec<String>,
}

/// Transport form of a protected payload, safe to hand to an authorized
/// identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedBlob {
    pub reference: String,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

pub struct DataProtector {
    secret: String,
    vault: RwLock<HashMap<String, ProtectedEntry>>,
}

impl DataProtector {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            vault: RwLock::new(HashMap::new()),
        }
    }

    /// Encrypt a payload and grant the given addresses access to it.
    /// Returns the protected-data reference. Nothing is recorded when any
    /// step fails.
    pub async fn protect(&self, payload: &str, grantees: &[String]) -> MarketResult<String> {
        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);

        let key =
            pbkdf2_hmac_array::<Sha256, 32>(self.secret.as_bytes(), &salt, KEY_DERIVATION_ROUNDS);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let mut nonce = [0u8; 12];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), payload.as_bytes())
            .map_err(|_| MarketError::Unknown(anyhow!("payload encryption failed")))?;

        let reference = format!("0x{}", hex::encode(Sha256::digest(&ciphertext)));
        let entry = ProtectedEntry {
            salt,
            nonce,
            ciphertext,
            authorized: grantees.iter().map(|a| normalize_address(a)).collect(),
        };

        let mut vault = self.vault.write().await;
        vault.insert(reference.clone(), entry);

        tracing::debug!("protected payload {} for {} grantees", reference, grantees.len());
        Ok(reference)
    }

    /// Add an address to a payload's grant list
    pub async fn grant_access(&self, reference: &str, address: &str) -> MarketResult<()> {
        let mut vault = self.vault.write().await;
        let entry = vault
            .get_mut(reference)
            .ok_or_else(|| MarketError::NotFound(format!("protected data {}", reference)))?;

        let normalized = normalize_address(address);
        if !entry.authorized.contains(&normalized) {
            entry.authorized.push(normalized);
        }
        Ok(())
    }

    /// Whether an address is on a payload's grant list
    pub async fn is_authorized(&self, reference: &str, address: &str) -> bool {
        let vault = self.vault.read().await;
        vault
            .get(reference)
            .map(|entry| entry.authorized.contains(&normalize_address(address)))
            .unwrap_or(false)
    }

    /// Decrypt a payload for an authorized address
    pub async fn reveal(&self, reference: &str, address: &str) -> MarketResult<String> {
        let vault = self.vault.read().await;
        let entry = vault
            .get(reference)
            .ok_or_else(|| MarketError::NotFound(format!("protected data {}", reference)))?;

        if !entry.authorized.contains(&normalize_address(address)) {
            return Err(MarketError::AccessDenied(format!(
                "{} is not authorized for {}",
                address, reference
            )));
        }

        let key = pbkdf2_hmac_array::<Sha256, 32>(
            self.secret.as_bytes(),
            &entry.salt,
            KEY_DERIVATION_ROUNDS,
        );
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&entry.nonce), entry.ciphertext.as_slice())
            .map_err(|_| MarketError::Unknown(anyhow!("payload decryption failed")))?;

        String::from_utf8(plaintext).map_err(|e| MarketError::Unknown(e.into()))
    }

    /// Transport form of a protected payload, for an authorized address
    pub async fn export(&self, reference: &str, address: &str) -> MarketResult<ProtectedBlob> {
        let vault = self.vault.read().await;
        let entry = vault
            .get(reference)
            .ok_or_else(|| MarketError::NotFound(format!("protected data {}", reference)))?;

        if !entry.authorized.contains(&normalize_address(address)) {
            return Err(MarketError::AccessDenied(format!(
                "{} is not authorized for {}",
                address, reference
            )));
        }

        Ok(ProtectedBlob {
            reference: reference.to_string(),
            salt: hex::encode(entry.salt),
            nonce: hex::encode(entry.nonce),
            ciphertext: BASE64.encode(&entry.ciphertext),
        })
    }

    /// Drop a protected entry. Used to roll back when a purchase fails
    /// after encryption.
    pub async fn discard(&self, reference: &str) {
        let mut vault = self.vault.write().await;
        vault.remove(reference);
    }
}
