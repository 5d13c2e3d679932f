//! Encrypted free-text notes — one AES-256-GCM blob on disk, key
//! derived from the configured passphrase.

use std::path::PathBuf;
use std::sync::Mutex;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use jetstream_core::config::NotesConfig;
use jetstream_core::error::{JetStreamError, Result};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// On-disk envelope: base64 nonce + base64 ciphertext (tag appended).
#[derive(Serialize, Deserialize)]
struct NotesEnvelope {
    nonce: String,
    data: String,
}

/// Encrypted notes store. Reads degrade to an empty note on any
/// failure (missing file, wrong key, torn write); only writes report
/// errors.
pub struct NotesStore {
    path: PathBuf,
    key: LessSafeKey,
    rng: SystemRandom,
    cache: Mutex<Option<String>>,
}

impl NotesStore {
    pub fn new(config: &NotesConfig) -> Self {
        Self {
            path: config.resolved_path(),
            key: derive_key(&config.encryption_key),
            rng: SystemRandom::new(),
            cache: Mutex::new(None),
        }
    }

    /// Current note text; empty when nothing readable is stored.
    pub fn load(&self) -> String {
        let mut cache = self.cache.lock().unwrap();
        if let Some(text) = cache.as_ref() {
            return text.clone();
        }

        let text = match self.read_and_decrypt() {
            Ok(text) => text,
            Err(e) => {
                if self.path.exists() {
                    tracing::warn!("Failed to read notes: {e}");
                }
                String::new()
            }
        };
        *cache = Some(text.clone());
        text
    }

    /// Encrypt and persist the note, then refresh the cache.
    pub fn save(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| JetStreamError::Security("Nonce generation failed".into()))?;

        let mut in_out = text.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| JetStreamError::Security("Notes encryption failed".into()))?;

        let envelope = NotesEnvelope {
            nonce: BASE64.encode(nonce_bytes),
            data: BASE64.encode(&in_out),
        };
        write_restricted(&self.path, &serde_json::to_string(&envelope)?)?;

        *self.cache.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    fn read_and_decrypt(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.path)?;
        let envelope: NotesEnvelope = serde_json::from_str(&content)?;

        let nonce_bytes: [u8; NONCE_LEN] = BASE64
            .decode(&envelope.nonce)
            .map_err(|e| JetStreamError::Security(format!("Bad nonce encoding: {e}")))?
            .try_into()
            .map_err(|_| JetStreamError::Security("Bad nonce length".into()))?;

        let mut data = BASE64
            .decode(&envelope.data)
            .map_err(|e| JetStreamError::Security(format!("Bad data encoding: {e}")))?;

        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut data,
            )
            .map_err(|_| JetStreamError::Security("Notes decryption failed".into()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|e| JetStreamError::Security(format!("Notes are not UTF-8: {e}")))
    }
}

/// AES-256 key from the passphrase via SHA-256.
fn derive_key(passphrase: &str) -> LessSafeKey {
    let digest = Sha256::digest(passphrase.as_bytes());
    // 32-byte digest always fits AES_256_GCM's key length.
    let unbound = UnboundKey::new(&AES_256_GCM, &digest).unwrap();
    LessSafeKey::new(unbound)
}

/// Write with 0600 permissions on Unix.
fn write_restricted(path: &std::path::Path, content: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(dir: &std::path::Path, key: &str) -> NotesStore {
        NotesStore::new(&NotesConfig {
            encryption_key: key.into(),
            path: Some(dir.join("notes.enc")),
        })
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), "passphrase");
        store.save("remember the dev key rotation").unwrap();

        // Fresh store, same key: no cache, real decrypt.
        let reopened = store_at(dir.path(), "passphrase");
        assert_eq!(reopened.load(), "remember the dev key rotation");
    }

    #[test]
    fn blob_on_disk_is_not_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), "passphrase");
        store.save("super secret note").unwrap();

        let raw = std::fs::read_to_string(dir.path().join("notes.enc")).unwrap();
        assert!(!raw.contains("super secret note"));
        let envelope: NotesEnvelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(BASE64.decode(envelope.nonce).unwrap().len(), NONCE_LEN);
    }

    #[test]
    fn wrong_key_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        store_at(dir.path(), "right-key").save("hidden").unwrap();
        assert_eq!(store_at(dir.path(), "wrong-key").load(), "");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_at(dir.path(), "key").load(), "");
    }

    #[test]
    fn save_refreshes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_at(dir.path(), "key");
        assert_eq!(store.load(), "");
        store.save("v1").unwrap();
        assert_eq!(store.load(), "v1");
        store.save("v2").unwrap();
        assert_eq!(store.load(), "v2");
    }
}
