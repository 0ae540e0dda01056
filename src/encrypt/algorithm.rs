//! Encryption algorithm trait and registry
//!
//! Algorithms are keyed by name; rules reference them by that name. The
//! built-in AES-GCM algorithm is deterministic (the nonce is derived
//! from the plaintext), which is what keeps equality predicates on the
//! cipher column usable.

use crate::error::{Error, Result};
use crate::types::Value;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

const TAG_STR: u8 = 0x01;
const TAG_BYTEA: u8 = 0x02;

/// A column encryption algorithm.
///
/// `encrypt`/`decrypt` transform whole values; NULL passes through both
/// untouched. `assisted_query_value` produces the deterministic
/// searchable digest stored in an assisted-query column.
pub trait EncryptAlgorithm: Send + Sync {
    /// The registry name this algorithm is looked up under.
    fn name(&self) -> &str;

    fn encrypt(&self, plaintext: &Value) -> Result<Value>;

    fn decrypt(&self, ciphertext: &Value) -> Result<Value>;

    fn supports_assisted_query(&self) -> bool {
        false
    }

    fn assisted_query_value(&self, plaintext: &Value) -> Result<Value> {
        let _ = plaintext;
        Err(Error::ConfigError(format!(
            "algorithm {} does not support assisted queries",
            self.name()
        )))
    }
}

/// Maps algorithm names to implementations. A rule referencing an
/// unregistered name fails with a configuration error at decoration
/// time, before any backend call.
#[derive(Default)]
pub struct AlgorithmRegistry {
    algorithms: RwLock<HashMap<String, Arc<dyn EncryptAlgorithm>>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, algorithm: Arc<dyn EncryptAlgorithm>) {
        self.algorithms
            .write()
            .insert(algorithm.name().to_string(), algorithm);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn EncryptAlgorithm>> {
        self.algorithms
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::AlgorithmNotFound(name.to_string()))
    }
}

/// Deterministic AES-256-GCM.
///
/// The nonce is the truncated HMAC-SHA256 of the plaintext, so equal
/// plaintexts always produce equal ciphertexts. Encryption and MAC keys
/// are derived separately from the configured secret. Supported
/// plaintexts are `Str` and `Bytea`; the original variant is restored
/// on decryption via a one-byte tag inside the sealed plaintext.
pub struct AesGcmAlgorithm {
    name: String,
    cipher: Aes256Gcm,
    mac_key: [u8; 32],
}

impl AesGcmAlgorithm {
    pub fn new(name: impl Into<String>, secret: &[u8]) -> Self {
        let enc_key = derive_key(b"enc", secret);
        let mac_key = derive_key(b"mac", secret);
        AesGcmAlgorithm {
            name: name.into(),
            cipher: Aes256Gcm::new(&enc_key.into()),
            mac_key,
        }
    }

    fn mac(&self, label: &[u8], data: &[u8]) -> Result<[u8; 32]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.mac_key)
            .map_err(|_| Error::Internal("invalid HMAC key length".into()))?;
        mac.update(label);
        mac.update(data);
        Ok(mac.finalize().into_bytes().into())
    }
}

impl EncryptAlgorithm for AesGcmAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn encrypt(&self, plaintext: &Value) -> Result<Value> {
        if plaintext.is_null() {
            return Ok(Value::Null);
        }
        let plaintext = tagged_plaintext(plaintext)?;
        let mac = self.mac(b"nonce", &plaintext)?;
        let nonce_bytes = &mac[..12];
        let nonce = Nonce::from_slice(nonce_bytes);
        let sealed = self
            .cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|_| Error::Internal("AES-GCM encryption failed".into()))?;
        let mut out = nonce_bytes.to_vec();
        out.extend(sealed);
        Ok(Value::Bytea(out))
    }

    fn decrypt(&self, ciphertext: &Value) -> Result<Value> {
        if ciphertext.is_null() {
            return Ok(Value::Null);
        }
        let Value::Bytea(data) = ciphertext else {
            return Err(Error::DecryptionFailed(format!(
                "cipher value must be BYTEA, got {ciphertext:?}"
            )));
        };
        if data.len() < 12 {
            return Err(Error::DecryptionFailed("ciphertext too short".into()));
        }
        let (nonce_bytes, sealed) = data.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| Error::DecryptionFailed("authentication failed".into()))?;
        match plaintext.split_first() {
            Some((&TAG_STR, rest)) => String::from_utf8(rest.to_vec())
                .map(Value::Str)
                .map_err(|_| Error::DecryptionFailed("invalid UTF-8 in plaintext".into())),
            Some((&TAG_BYTEA, rest)) => Ok(Value::Bytea(rest.to_vec())),
            _ => Err(Error::DecryptionFailed("unknown plaintext tag".into())),
        }
    }

    fn supports_assisted_query(&self) -> bool {
        true
    }

    fn assisted_query_value(&self, plaintext: &Value) -> Result<Value> {
        if plaintext.is_null() {
            return Ok(Value::Null);
        }
        let plaintext = tagged_plaintext(plaintext)?;
        Ok(Value::Bytea(self.mac(b"assist", &plaintext)?.to_vec()))
    }
}

fn tagged_plaintext(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Str(s) => {
            let mut bytes = Vec::with_capacity(s.len() + 1);
            bytes.push(TAG_STR);
            bytes.extend_from_slice(s.as_bytes());
            Ok(bytes)
        }
        Value::Bytea(data) => {
            let mut bytes = Vec::with_capacity(data.len() + 1);
            bytes.push(TAG_BYTEA);
            bytes.extend_from_slice(data);
            Ok(bytes)
        }
        other => Err(Error::ValueNotEncryptable(format!(
            "{other:?} is not encryptable, only TEXT and BYTEA are"
        ))),
    }
}

fn derive_key(label: &[u8], secret: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(label);
    hasher.update(secret);
    hasher.finalize().into()
}
