//! JSON-file portfolio store.
//!
//! All users live in one JSON document. Every `set` rewrites the document
//! through a temporary file and a rename, so readers never see a partial
//! write.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use portfolio_pulse::{DEFAULT_PORTFOLIO_VALUE, Error, PortfolioStore, Result, UserId, WeightMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPortfolio {
    weights: WeightMap,
    total_value: f64,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    users: BTreeMap<String, StoredPortfolio>,
}

/// Store persisted as a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, reason: impl std::fmt::Display) -> Error {
        Error::Storage(format!("{}: {reason}", self.path.display()))
    }

    fn read(&self) -> Result<Document> {
        if !self.path.exists() {
            return Ok(Document::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.storage_error(e))?;
        if contents.trim().is_empty() {
            return Ok(Document::default());
        }
        serde_json::from_str(&contents).map_err(|e| self.storage_error(e))
    }

    fn write(&self, doc: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
            }
        }
        let json = serde_json::to_string_pretty(doc).map_err(|e| self.storage_error(e))?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(|e| self.storage_error(e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| self.storage_error(e))?;
            file.sync_all().map_err(|e| self.storage_error(e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| self.storage_error(e))
    }

    /// Users with a stored portfolio, in order.
    pub fn users(&self) -> Result<Vec<UserId>> {
        Ok(self.read()?.users.into_keys().map(UserId::new).collect())
    }
}

impl PortfolioStore for JsonFileStore {
    fn set(&self, user: &UserId, weights: WeightMap, total_value: f64) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| self.storage_error("write lock poisoned"))?;
        let mut doc = self.read()?;
        doc.users.insert(
            user.as_str().to_string(),
            StoredPortfolio {
                weights,
                total_value,
                updated_at: chrono::Utc::now(),
            },
        );
        self.write(&doc)
    }

    fn get(&self, user: &UserId) -> Result<WeightMap> {
        self.read()?
            .users
            .remove(user.as_str())
            .map(|p| p.weights)
            .ok_or_else(|| Error::NotFound(format!("portfolio for {user}")))
    }

    fn get_total_value(&self, user: &UserId) -> f64 {
        self.read()
            .ok()
            .and_then(|doc| doc.users.get(user.as_str()).map(|p| p.total_value))
            .unwrap_or(DEFAULT_PORTFOLIO_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("portfolios.json");
        let user = UserId::new("alice");
        let w: WeightMap = [("VTI", 0.6), ("TLT", 0.4)].into_iter().collect();

        JsonFileStore::open(&path).set(&user, w.clone(), 1500.0).unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get(&user).unwrap(), w);
        assert_eq!(reopened.get_total_value(&user), 1500.0);
        assert_eq!(reopened.users().unwrap(), vec![user]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(&dir.path().join("none.json"));
        let user = UserId::new("bob");
        assert!(matches!(store.get(&user), Err(Error::NotFound(_))));
        assert_eq!(store.get_total_value(&user), 100.0);
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::open(&path);
        assert!(matches!(
            store.get(&UserId::new("x")),
            Err(Error::Storage(_))
        ));
    }

    #[test]
    fn users_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(&dir.path().join("p.json"));
        let a = UserId::new("a");
        let b = UserId::new("b");
        store.set(&a, [("VTI", 1.0)].into_iter().collect(), 100.0).unwrap();
        store.set(&b, [("BND", 1.0)].into_iter().collect(), 200.0).unwrap();
        assert_eq!(store.get(&a).unwrap().get("VTI"), 1.0);
        assert_eq!(store.get_total_value(&b), 200.0);
    }
}
