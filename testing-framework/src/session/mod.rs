// File: testing-framework/src/session/mod.rs
//
// Session state: the profile, its users and the durable artifact store.
//
// A session is identified by (profile name, base directory). Several test
// phases, possibly separate processes, load the same session one after the
// other and share artifacts through the store.

mod profile;
mod store;

pub use profile::{profile_path, GroupEntry, IndividualEntry, SessionProfile, UsersConfig};
pub use store::{store_path, SessionStore};
pub(crate) use store::AUDIT as AUDIT_TREE;

use log::info;
use shardnet_common::{
    crypto::Address,
    transaction::TokenDescriptor,
};
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};
use crate::users::{TestUser, UserDirectory};

pub struct Session {
    name: String,
    base_dir: PathBuf,
    profile: SessionProfile,
    users: UserDirectory,
    store: SessionStore,
}

impl Session {
    /// Initialize or resume the session of `profile` under `base_dir`
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::SessionLoad` if the profile file is missing or
    /// corrupt, or if the store cannot be opened.
    pub async fn load(profile: &str, base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let session_profile = SessionProfile::load(&base_dir, profile).await?;
        let users = session_profile.user_directory(&profile_path(&base_dir, profile))?;
        let store = SessionStore::open(&base_dir, profile)?;

        for user in users.users() {
            store.save_user(user.name(), &user.address()).await?;
        }
        for group in users.group_names() {
            let members: Vec<Address> = users
                .get_group(group)?
                .iter()
                .map(TestUser::address)
                .collect();
            store.save_group(group, &members).await?;
        }

        info!(
            "Session '{}' loaded from {} with {} users",
            profile,
            base_dir.display(),
            users.len()
        );

        Ok(Self {
            name: profile.to_string(),
            base_dir,
            profile: session_profile,
            users,
            store,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn ensure_open(&self) -> Result<()> {
        if self.store.is_closed() {
            return Err(HarnessError::SessionClosed);
        }
        Ok(())
    }

    pub async fn save_address(&self, name: &str, address: &Address) -> Result<()> {
        self.store.save_address(name, address).await
    }

    pub fn load_address(&self, name: &str) -> Result<Address> {
        self.store.load_address(name)
    }

    pub async fn save_token(&self, name: &str, token: &TokenDescriptor) -> Result<()> {
        self.store.save_token(name, token).await
    }

    pub fn load_token(&self, name: &str) -> Result<TokenDescriptor> {
        self.store.load_token(name)
    }

    pub fn get_user(&self, name: &str) -> Result<&TestUser> {
        self.ensure_open()?;
        self.users.get_user(name)
    }

    pub fn get_group(&self, name: &str) -> Result<Vec<TestUser>> {
        self.ensure_open()?;
        self.users.get_group(name)
    }

    pub fn users(&self) -> Result<&UserDirectory> {
        self.ensure_open()?;
        Ok(&self.users)
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }

    /// Close the store. Every later operation fails with `SessionClosed`.
    pub async fn destroy(&mut self) -> Result<()> {
        self.store.destroy().await?;
        info!("Session '{}' destroyed", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use crate::error::EntryKind;
    use shardnet_common::crypto::KeyPair;
    use tempfile::TempDir;

    fn sample_profile() -> SessionProfile {
        SessionProfile {
            proxy_url: "http://localhost:7950".to_string(),
            chain_id: None,
            users: UsersConfig {
                individuals: vec![IndividualEntry {
                    name: "alice".to_string(),
                    secret_key: hex::encode([1u8; 32]),
                }],
                groups: vec![GroupEntry {
                    name: "players".to_string(),
                    secret_keys: vec![hex::encode([2u8; 32]), hex::encode([3u8; 32])],
                }],
            },
        }
    }

    #[tokio::test]
    async fn test_load_missing_profile() {
        let dir = TempDir::new().unwrap();
        let err = Session::load("nope", dir.path()).await.err().unwrap();
        assert!(matches!(err, HarnessError::SessionLoad { .. }));
    }

    #[tokio::test]
    async fn test_load_corrupt_profile() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(profile_path(dir.path(), "broken"), "{ not json")
            .await
            .unwrap();
        let err = Session::load("broken", dir.path()).await.err().unwrap();
        match err {
            HarnessError::SessionLoad { reason, .. } => assert!(reason.contains("corrupt profile")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_load_profile_with_malformed_secret_key() {
        let dir = TempDir::new().unwrap();
        let mut profile = sample_profile();
        profile.users.groups[0].secret_keys[1] = "zz-not-hex".to_string();
        profile.save(dir.path(), "badkey").await.unwrap();

        let err = Session::load("badkey", dir.path()).await.err().unwrap();
        match err {
            HarnessError::SessionLoad { path, reason } => {
                assert_eq!(path, profile_path(dir.path(), "badkey"));
                assert!(reason.contains("member #1 of group 'players'"));
            }
            other => panic!("unexpected error: {}", other),
        }
        // Rejected before the store is created
        assert!(!store_path(dir.path(), "badkey").exists());
    }

    #[tokio::test]
    async fn test_users_groups_and_destroy() {
        let dir = TempDir::new().unwrap();
        sample_profile().save(dir.path(), "local").await.unwrap();

        let mut session = Session::load("local", dir.path()).await.unwrap();
        assert_eq!(
            session.get_user("alice").unwrap().address(),
            KeyPair::from_seed([1; 32]).address()
        );
        let players = session.get_group("players").unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(
            session.store().load_group("players").unwrap(),
            players.iter().map(TestUser::address).collect::<Vec<_>>()
        );
        assert!(matches!(
            session.load_address("adder"),
            Err(HarnessError::NotFound { kind: EntryKind::Address, .. })
        ));

        session.destroy().await.unwrap();
        assert!(matches!(session.get_user("alice"), Err(HarnessError::SessionClosed)));
        assert!(matches!(
            session.save_address("x", &Address::zero()).await,
            Err(HarnessError::SessionClosed)
        ));
        assert!(matches!(session.destroy().await, Err(HarnessError::SessionClosed)));
    }
}
