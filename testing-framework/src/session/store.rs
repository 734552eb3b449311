// Durable named artifacts of a session, on sled.
//
// One database per (base dir, profile) with one tree per namespace.
// Writes are flushed before returning, so that a test phase started later
// in another process sees them.

use log::{debug, trace};
use serde::{de::DeserializeOwned, Serialize};
use shardnet_common::{crypto::Address, transaction::TokenDescriptor};
use sled::{Db, Tree};
use std::path::{Path, PathBuf};

use crate::error::{EntryKind, HarnessError, Result};

const ADDRESSES: &str = "addresses";
const TOKENS: &str = "tokens";
const USERS: &str = "users";
const GROUPS: &str = "groups";
pub(crate) const AUDIT: &str = "audit";

struct StoreTrees {
    db: Db,
    addresses: Tree,
    tokens: Tree,
    users: Tree,
    groups: Tree,
}

pub struct SessionStore {
    path: PathBuf,
    // None once destroyed
    inner: Option<StoreTrees>,
}

pub fn store_path(base_dir: &Path, profile: &str) -> PathBuf {
    base_dir.join(format!("{}.session", profile))
}

impl SessionStore {
    /// Open or resume the store of a profile
    pub fn open(base_dir: &Path, profile: &str) -> Result<Self> {
        let path = store_path(base_dir, profile);
        let load_error = |e: sled::Error| HarnessError::SessionLoad {
            path: path.clone(),
            reason: e.to_string(),
        };

        let db = sled::open(&path).map_err(load_error)?;
        let inner = StoreTrees {
            addresses: db.open_tree(ADDRESSES).map_err(load_error)?,
            tokens: db.open_tree(TOKENS).map_err(load_error)?,
            users: db.open_tree(USERS).map_err(load_error)?,
            groups: db.open_tree(GROUPS).map_err(load_error)?,
            db,
        };
        debug!(
            "Session store {} opened ({} addresses, {} tokens)",
            path.display(),
            inner.addresses.len(),
            inner.tokens.len()
        );

        Ok(Self {
            path,
            inner: Some(inner),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn trees(&self) -> Result<&StoreTrees> {
        self.inner.as_ref().ok_or(HarnessError::SessionClosed)
    }

    pub(crate) fn open_tree(&self, name: &str) -> Result<Tree> {
        Ok(self.trees()?.db.open_tree(name)?)
    }

    async fn save_to_disk<V: Serialize>(&self, tree: &Tree, key: &str, value: &V) -> Result<()> {
        trace!("save {} to disk", key);
        tree.insert(key.as_bytes(), serde_json::to_vec(value)?)?;
        tree.flush_async().await?;
        Ok(())
    }

    fn load_from_disk<V: DeserializeOwned>(
        &self,
        tree: &Tree,
        kind: EntryKind,
        key: &str,
    ) -> Result<V> {
        trace!("load {} {} from disk", kind, key);
        match tree.get(key.as_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(HarnessError::not_found(kind, key)),
        }
    }

    /// Last write wins
    pub async fn save_address(&self, name: &str, address: &Address) -> Result<()> {
        let trees = self.trees()?;
        self.save_to_disk(&trees.addresses, name, address).await
    }

    pub fn load_address(&self, name: &str) -> Result<Address> {
        let trees = self.trees()?;
        self.load_from_disk(&trees.addresses, EntryKind::Address, name)
    }

    pub async fn save_token(&self, name: &str, token: &TokenDescriptor) -> Result<()> {
        let trees = self.trees()?;
        self.save_to_disk(&trees.tokens, name, token).await
    }

    pub fn load_token(&self, name: &str) -> Result<TokenDescriptor> {
        let trees = self.trees()?;
        self.load_from_disk(&trees.tokens, EntryKind::Token, name)
    }

    /// Record the identity behind a user name
    pub async fn save_user(&self, name: &str, address: &Address) -> Result<()> {
        let trees = self.trees()?;
        self.save_to_disk(&trees.users, name, address).await
    }

    pub fn load_user(&self, name: &str) -> Result<Address> {
        let trees = self.trees()?;
        self.load_from_disk(&trees.users, EntryKind::User, name)
    }

    pub async fn save_group(&self, name: &str, members: &[Address]) -> Result<()> {
        let trees = self.trees()?;
        self.save_to_disk(&trees.groups, name, &members).await
    }

    pub fn load_group(&self, name: &str) -> Result<Vec<Address>> {
        let trees = self.trees()?;
        self.load_from_disk(&trees.groups, EntryKind::Group, name)
    }

    /// Names in the address namespace, sorted
    pub fn address_names(&self) -> Result<Vec<String>> {
        let trees = self.trees()?;
        trees
            .addresses
            .iter()
            .keys()
            .map(|key| -> Result<String> { Ok(String::from_utf8_lossy(&key?).into_owned()) })
            .collect()
    }

    /// Flush and close the database. A second call fails with `SessionClosed`.
    pub async fn destroy(&mut self) -> Result<()> {
        let trees = self.inner.take().ok_or(HarnessError::SessionClosed)?;
        trees.db.flush_async().await?;
        debug!("Session store {} closed", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path(), "local").unwrap();
        let address = Address::new([7; 32]);

        store.save_address("adder", &address).await.unwrap();
        assert_eq!(store.load_address("adder").unwrap(), address);
        assert!(matches!(
            store.load_token("adder"),
            Err(HarnessError::NotFound { kind: EntryKind::Token, .. })
        ));

        let token = TokenDescriptor::new("ROSE-0a1b2c", 6);
        store.save_token("rose", &token).await.unwrap();
        assert_eq!(store.load_token("rose").unwrap(), token);
        assert_eq!(store.address_names().unwrap(), vec!["adder".to_string()]);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path(), "local").unwrap();
        store.save_address("x", &Address::new([1; 32])).await.unwrap();
        store.save_address("x", &Address::new([2; 32])).await.unwrap();
        assert_eq!(store.load_address("x").unwrap(), Address::new([2; 32]));
    }

    #[tokio::test]
    async fn test_resume_after_destroy() {
        let dir = TempDir::new().unwrap();
        let members = vec![Address::new([3; 32]), Address::new([4; 32])];
        {
            let mut store = SessionStore::open(dir.path(), "local").unwrap();
            store.save_address("x", &Address::new([9; 32])).await.unwrap();
            store.save_group("players", &members).await.unwrap();
            store.destroy().await.unwrap();

            assert!(store.is_closed());
            assert!(matches!(store.load_address("x"), Err(HarnessError::SessionClosed)));
            assert!(matches!(store.destroy().await, Err(HarnessError::SessionClosed)));
        }

        let store = SessionStore::open(dir.path(), "local").unwrap();
        assert_eq!(store.load_address("x").unwrap(), Address::new([9; 32]));
        assert_eq!(store.load_group("players").unwrap(), members);
    }
}
