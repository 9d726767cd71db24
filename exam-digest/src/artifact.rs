//! Encryption and persistence of the run's accepted records.
//!
//! The artifact is AES-256-CBC with PKCS#7 padding under a pre-shared key,
//! with a fresh random IV per encryption. It gives confidentiality only:
//! nothing in the format detects a modified payload.

use crate::types::{EncryptedArtifact, EngineError, NewsRecord, Result, ARTIFACT_ENCRYPTION};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub const IV_LEN: usize = 16;

/// A 256-bit pre-shared key.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtifactKey([u8; 32]);

impl ArtifactKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArtifactKey(<redacted>)")
    }
}

pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Canonical plaintext: a compact JSON array, fields in declaration order.
pub fn serialize_records(records: &[NewsRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(records)?)
}

/// Encrypts `records` under `key` with a caller-chosen IV.
pub fn encrypt_with_iv(records: &[NewsRecord], key: &ArtifactKey, iv: &[u8; IV_LEN]) -> Result<EncryptedArtifact> {
    let plaintext = serialize_records(records)?;

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| EngineError::Crypto(format!("cipher init failed: {}", e)))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

    debug!(
        "Encrypted {} plaintext bytes into {} ciphertext bytes",
        plaintext.len(),
        ciphertext.len()
    );

    Ok(EncryptedArtifact {
        encryption: ARTIFACT_ENCRYPTION.to_string(),
        iv: STANDARD.encode(iv),
        payload: STANDARD.encode(ciphertext),
    })
}

/// Encrypts the report with a fresh IV. An empty report produces no artifact.
pub fn encode_report(records: &[NewsRecord], key: &ArtifactKey) -> Result<Option<EncryptedArtifact>> {
    if records.is_empty() {
        return Ok(None);
    }
    let iv = generate_iv();
    encrypt_with_iv(records, key, &iv).map(Some)
}

/// Reverses base64 and CBC, returning the plaintext JSON bytes.
pub fn decrypt_artifact(artifact: &EncryptedArtifact, key: &ArtifactKey) -> Result<Vec<u8>> {
    if artifact.encryption != ARTIFACT_ENCRYPTION {
        return Err(EngineError::Crypto(format!(
            "unsupported encryption scheme: {}",
            artifact.encryption
        )));
    }

    let iv = STANDARD
        .decode(artifact.iv.trim())
        .map_err(|e| EngineError::Crypto(format!("iv is not base64: {}", e)))?;
    if iv.len() != IV_LEN {
        return Err(EngineError::Crypto(format!(
            "iv must be {} bytes, got {}",
            IV_LEN,
            iv.len()
        )));
    }
    let ciphertext = STANDARD
        .decode(artifact.payload.trim())
        .map_err(|e| EngineError::Crypto(format!("payload is not base64: {}", e)))?;

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| EngineError::Crypto(format!("cipher init failed: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| EngineError::Crypto("decryption failed: bad padding (wrong key or corrupted payload)".to_string()))
}

pub fn decode_records(artifact: &EncryptedArtifact, key: &ArtifactKey) -> Result<Vec<NewsRecord>> {
    let plaintext = decrypt_artifact(artifact, key)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Writes the artifact as indented JSON, creating parent directories.
pub fn write_artifact(path: &Path, artifact: &EncryptedArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    artifact.serialize(&mut serializer)?;
    buf.push(b'\n');

    std::fs::write(path, buf)?;
    info!("Saved artifact to {}", path.display());
    Ok(())
}

pub fn read_artifact(path: &Path) -> Result<EncryptedArtifact> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
