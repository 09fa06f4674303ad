//! Persisted admin session
//!
//! The session is two string entries, `adminToken` and `currentAdmin`,
//! written at login, read before any authenticated command and cleared at
//! logout. [`FileStorage`] keeps them in a small JSON document on disk;
//! [`MemoryStorage`] is the in-process equivalent.

use crate::api_client::ApiClient;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use studio_core::{AdminProfile, Error, Result, types::LoginResponse};
use tracing::{debug, warn};

/// Storage key of the bearer credential
pub const TOKEN_KEY: &str = "adminToken";

/// Storage key of the cached profile JSON
pub const ADMIN_KEY: &str = "currentAdmin";

/// Name of the session document inside the session directory
pub const SESSION_FILE: &str = "session.json";

/// String key/value storage backing a [`Session`]
pub trait SessionStorage: Send + Sync + fmt::Debug {
    /// Read an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// Storage in a JSON file
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage in `directory/session.json`
    #[must_use]
    pub fn in_directory(directory: &Path) -> Self {
        Self {
            path: directory.join(SESSION_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Path of the session document
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
                Ok(BTreeMap::new())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the document in one rename; the file is only readable by
    /// its owner since it holds the bearer token
    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory)?;

        let mut file = tempfile::NamedTempFile::new_in(directory)?;
        file.write_all(&serde_json::to_vec_pretty(items)?)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// Login state on top of a [`SessionStorage`]
#[derive(Debug)]
pub struct Session<S = FileStorage> {
    storage: S,
}

impl Session<FileStorage> {
    /// Session persisted under `directory`
    #[must_use]
    pub fn in_directory(directory: &Path) -> Self {
        Self::new(FileStorage::in_directory(directory))
    }
}

impl<S: SessionStorage> Session<S> {
    /// Wrap a storage backend
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The stored bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get_item(TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// The cached profile, if any
    ///
    /// A cached value that no longer parses is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn current_admin(&self) -> Result<Option<AdminProfile>> {
        let Some(raw) = self.storage.get_item(ADMIN_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(admin) => Ok(Some(admin)),
            Err(e) => {
                warn!(error = %e, "dropping unreadable cached profile");
                self.storage.remove_item(ADMIN_KEY)?;
                Ok(None)
            }
        }
    }

    /// Persist a successful login
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn store_login(&self, login: &LoginResponse) -> Result<()> {
        self.storage.set_item(TOKEN_KEY, &login.token)?;
        self.store_admin(&login.admin)
    }

    /// Refresh the cached profile
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn store_admin(&self, admin: &AdminProfile) -> Result<()> {
        self.storage
            .set_item(ADMIN_KEY, &serde_json::to_string(admin)?)
    }

    /// Forget the login
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(ADMIN_KEY)?;
        debug!("session cleared");
        Ok(())
    }

    /// The token, or an authentication error when nobody is logged in
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] when no token is stored.
    pub fn require_token(&self) -> Result<String> {
        self.token()?.ok_or(Error::NotLoggedIn)
    }

    /// Attach the stored token to `client`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] when no token is stored.
    pub fn authorize(&self, client: &ApiClient) -> Result<()> {
        client.set_token(Some(self.require_token()?));
        Ok(())
    }
}
