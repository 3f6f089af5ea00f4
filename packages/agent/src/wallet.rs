//! Wallet storage for backend modules.
//!
//! The [`WalletStore`] trait is the persistence contract shared by both
//! backend bundles: a category/name/value record store. The legacy bundle
//! keeps its store internal; the modern bundle exposes it as the
//! secure-storage capability, wrapped in [`EncryptedWallet`].
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryWallet`] | Tests, conformance suite, ephemeral agents |
//! | [`SqliteWallet`] | Durable single-file wallet |
//! | [`EncryptedWallet`] | Wraps either of the above; encrypts record values |

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rusqlite::{params, Connection};

/// Record category for stored link secrets.
pub const LINK_SECRET_CATEGORY: &str = "link_secret";

/// Record category for agent-level configuration values (identity seed,
/// storage profile marker).
pub const CONFIG_CATEGORY: &str = "config";

/// Record category for anchored DID documents.
pub const DID_DOCUMENT_CATEGORY: &str = "did_document";

// ---------------------------------------------------------------------------
// WalletError
// ---------------------------------------------------------------------------

/// Errors that wallet operations can return.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// A value could not be encrypted or decrypted (wrong key, corrupt record).
    #[error("wallet crypto failure: {0}")]
    Crypto(String),

    /// An unexpected error in the underlying store.
    #[error("internal wallet error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// WalletStore trait
// ---------------------------------------------------------------------------

/// The record-store contract both backends persist through.
///
/// `put` is an upsert; `list_names` returns names in lexicographic order so
/// UUIDv7-named records come back in creation order. Implementations must
/// be `Send + Sync + 'static` so they can be held in an `Arc<dyn WalletStore>`
/// and shared between the registry and secure-storage capabilities.
#[async_trait]
pub trait WalletStore: Send + Sync + 'static {
    /// Store (or replace) a record.
    async fn put(&self, category: &str, name: &str, value: &str) -> Result<(), WalletError>;

    /// Retrieve a record value. Returns `None` if absent.
    async fn get(&self, category: &str, name: &str) -> Result<Option<String>, WalletError>;

    /// Return the names of all records in `category`, lexicographically.
    async fn list_names(&self, category: &str) -> Result<Vec<String>, WalletError>;

    /// Remove a record. No-op if it does not exist.
    async fn delete(&self, category: &str, name: &str) -> Result<(), WalletError>;
}

// ---------------------------------------------------------------------------
// MemoryWallet
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`WalletStore`].
///
/// Records live in a [`BTreeMap`] keyed by `(category, name)`, which makes
/// ordered listing a range scan. All data is lost when the process exits.
pub struct MemoryWallet {
    records: RwLock<BTreeMap<(String, String), String>>,
}

impl MemoryWallet {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletStore for MemoryWallet {
    async fn put(&self, category: &str, name: &str, value: &str) -> Result<(), WalletError> {
        let mut records = self.records.write().unwrap();
        records.insert((category.to_string(), name.to_string()), value.to_string());
        Ok(())
    }

    async fn get(&self, category: &str, name: &str) -> Result<Option<String>, WalletError> {
        let records = self.records.read().unwrap();
        Ok(records
            .get(&(category.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_names(&self, category: &str) -> Result<Vec<String>, WalletError> {
        let records = self.records.read().unwrap();
        Ok(records
            .keys()
            .filter(|(c, _)| c == category)
            .map(|(_, n)| n.clone())
            .collect())
    }

    async fn delete(&self, category: &str, name: &str) -> Result<(), WalletError> {
        let mut records = self.records.write().unwrap();
        records.remove(&(category.to_string(), name.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SqliteWallet
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    category TEXT NOT NULL,
    name     TEXT NOT NULL,
    value    TEXT NOT NULL,
    PRIMARY KEY (category, name)
);
";

/// SQLite-backed implementation of [`WalletStore`].
///
/// Holds a single connection protected by a `Mutex`; every operation runs
/// inside `tokio::task::spawn_blocking` so the async runtime is never
/// blocked on file I/O.
pub struct SqliteWallet {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWallet {
    /// Open (or create) the wallet database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory wallet database (lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn map_sql_err(e: rusqlite::Error) -> WalletError {
    WalletError::Internal(e.to_string())
}

fn map_join_err(e: tokio::task::JoinError) -> WalletError {
    WalletError::Internal(format!("blocking task failed: {e}"))
}

#[async_trait]
impl WalletStore for SqliteWallet {
    async fn put(&self, category: &str, name: &str, value: &str) -> Result<(), WalletError> {
        let conn = Arc::clone(&self.conn);
        let (category, name, value) = (category.to_string(), name.to_string(), value.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.execute(
                "INSERT INTO records (category, name, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (category, name) DO UPDATE SET value = excluded.value",
                params![category, name, value],
            )
            .map(|_| ())
            .map_err(map_sql_err)
        })
        .await
        .map_err(map_join_err)?
    }

    async fn get(&self, category: &str, name: &str) -> Result<Option<String>, WalletError> {
        let conn = Arc::clone(&self.conn);
        let (category, name) = (category.to_string(), name.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            match conn.query_row(
                "SELECT value FROM records WHERE category = ?1 AND name = ?2",
                params![category, name],
                |row| row.get::<_, String>(0),
            ) {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(map_sql_err(e)),
            }
        })
        .await
        .map_err(map_join_err)?
    }

    async fn list_names(&self, category: &str) -> Result<Vec<String>, WalletError> {
        let conn = Arc::clone(&self.conn);
        let category = category.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let mut stmt = conn
                .prepare("SELECT name FROM records WHERE category = ?1 ORDER BY name")
                .map_err(map_sql_err)?;
            let names = stmt
                .query_map(params![category], |row| row.get::<_, String>(0))
                .map_err(map_sql_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sql_err)?;
            Ok(names)
        })
        .await
        .map_err(map_join_err)?
    }

    async fn delete(&self, category: &str, name: &str) -> Result<(), WalletError> {
        let conn = Arc::clone(&self.conn);
        let (category, name) = (category.to_string(), name.to_string());
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.execute(
                "DELETE FROM records WHERE category = ?1 AND name = ?2",
                params![category, name],
            )
            .map(|_| ())
            .map_err(map_sql_err)
        })
        .await
        .map_err(map_join_err)?
    }
}

// ---------------------------------------------------------------------------
// EncryptedWallet
// ---------------------------------------------------------------------------

/// Encrypting wrapper around any [`WalletStore`].
///
/// Record values are sealed with ChaCha20-Poly1305 under a key derived from
/// the agent's wallet key material; categories and names stay in the clear
/// so listing works without decryption. The stored format is
/// `hex(nonce || ciphertext)`.
pub struct EncryptedWallet {
    inner: Arc<dyn WalletStore>,
    cipher: ChaCha20Poly1305,
}

impl EncryptedWallet {
    /// Wrap `inner`, deriving the cipher key from `key_material`.
    ///
    /// Raw-key profile: the UTF-8 bytes of `key_material` are truncated or
    /// zero-padded to the 32 bytes ChaCha20-Poly1305 requires.
    pub fn new(inner: Arc<dyn WalletStore>, key_material: &str) -> Self {
        let mut key_bytes = [0u8; 32];
        let material = key_material.as_bytes();
        let len = material.len().min(32);
        key_bytes[..len].copy_from_slice(&material[..len]);
        Self {
            inner,
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key_bytes)),
        }
    }

    fn seal(&self, plaintext: &str) -> Result<String, WalletError> {
        use rand::RngCore;
        let mut nonce_bytes = [0u8; 12];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| WalletError::Crypto(e.to_string()))?;
        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    fn unseal(&self, sealed: &str) -> Result<String, WalletError> {
        let bytes = hex::decode(sealed).map_err(|e| WalletError::Crypto(e.to_string()))?;
        if bytes.len() < 12 {
            return Err(WalletError::Crypto("sealed record too short".into()));
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| WalletError::Crypto(e.to_string()))?;
        String::from_utf8(plaintext).map_err(|e| WalletError::Crypto(e.to_string()))
    }
}

#[async_trait]
impl WalletStore for EncryptedWallet {
    async fn put(&self, category: &str, name: &str, value: &str) -> Result<(), WalletError> {
        let sealed = self.seal(value)?;
        self.inner.put(category, name, &sealed).await
    }

    async fn get(&self, category: &str, name: &str) -> Result<Option<String>, WalletError> {
        match self.inner.get(category, name).await? {
            Some(sealed) => Ok(Some(self.unseal(&sealed)?)),
            None => Ok(None),
        }
    }

    async fn list_names(&self, category: &str) -> Result<Vec<String>, WalletError> {
        self.inner.list_names(category).await
    }

    async fn delete(&self, category: &str, name: &str) -> Result<(), WalletError> {
        self.inner.delete(category, name).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
