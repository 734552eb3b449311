// File: testing-framework/src/users.rs
//
// Users and groups known to a session.
//
// A user is an address plus a signing capability. The directory is built
// once at session load and never changes afterwards.

use indexmap::IndexMap;
use shardnet_common::crypto::{Address, Signer};
use std::fmt;
use std::sync::Arc;

use crate::error::{EntryKind, HarnessError, Result};

#[derive(Clone)]
pub struct TestUser {
    name: String,
    address: Address,
    signer: Arc<dyn Signer>,
}

impl TestUser {
    pub fn new(name: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        Self {
            name: name.into(),
            address: signer.address(),
            signer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    pub fn shard(&self, num_shards: u32) -> u32 {
        self.address.shard(num_shards)
    }
}

impl fmt::Debug for TestUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUser")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

/// Named users and ordered groups of users
#[derive(Default, Clone, Debug)]
pub struct UserDirectory {
    users: IndexMap<String, TestUser>,
    // group name -> member user names, in declaration order
    groups: IndexMap<String, Vec<String>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, user: TestUser) {
        self.users.insert(user.name.clone(), user);
    }

    /// Register a group; members are added as users named `<group>#<index>`
    pub fn add_group(&mut self, name: impl Into<String>, members: Vec<TestUser>) {
        let name = name.into();
        let mut names = Vec::with_capacity(members.len());
        for (index, member) in members.into_iter().enumerate() {
            let member_name = format!("{}#{}", name, index);
            names.push(member_name.clone());
            self.users.insert(
                member_name.clone(),
                TestUser {
                    name: member_name,
                    ..member
                },
            );
        }
        self.groups.insert(name, names);
    }

    pub fn get_user(&self, name: &str) -> Result<&TestUser> {
        self.users
            .get(name)
            .ok_or_else(|| HarnessError::not_found(EntryKind::User, name))
    }

    pub fn get_group(&self, name: &str) -> Result<Vec<TestUser>> {
        let members = self
            .groups
            .get(name)
            .ok_or_else(|| HarnessError::not_found(EntryKind::Group, name))?;
        members
            .iter()
            .map(|member| self.get_user(member).cloned())
            .collect()
    }

    pub fn users(&self) -> impl Iterator<Item = &TestUser> {
        self.users.values()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn users_in_shard(&self, shard: u32, num_shards: u32) -> Vec<&TestUser> {
        self.users
            .values()
            .filter(|user| user.shard(num_shards) == shard)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardnet_common::crypto::KeyPair;

    fn user(name: &str, seed: u8) -> TestUser {
        TestUser::new(name, Arc::new(KeyPair::from_seed([seed; 32])))
    }

    #[test]
    fn test_lookup_and_groups() {
        let mut directory = UserDirectory::new();
        directory.add_user(user("alice", 1));
        directory.add_group("players", vec![user("", 2), user("", 3)]);

        assert_eq!(directory.len(), 3);
        assert_eq!(
            directory.get_user("alice").unwrap().address(),
            KeyPair::from_seed([1; 32]).address()
        );

        let players = directory.get_group("players").unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name(), "players#0");
        assert_eq!(players[1].address(), KeyPair::from_seed([3; 32]).address());

        assert!(matches!(
            directory.get_user("bob"),
            Err(HarnessError::NotFound { kind: EntryKind::User, .. })
        ));
        assert!(matches!(
            directory.get_group("admins"),
            Err(HarnessError::NotFound { kind: EntryKind::Group, .. })
        ));
    }

    #[test]
    fn test_users_in_shard() {
        let mut directory = UserDirectory::new();
        for seed in 1..=20u8 {
            directory.add_user(user(&format!("user{}", seed), seed));
        }
        let total: usize = (0..3)
            .map(|shard| directory.users_in_shard(shard, 3).len())
            .sum();
        assert_eq!(total, 20);
        assert!(directory
            .users_in_shard(1, 3)
            .iter()
            .all(|u| u.shard(3) == 1));
    }
}
