// Session profile: proxy endpoint, optional chain id and the users to act as.
//
// Stored as `<base_dir>/<profile>.session.json`:
//
// {
//   "proxyUrl": "http://localhost:7950",
//   "chainId": "localnet",
//   "users": {
//     "individuals": [{ "name": "alice", "secretKey": "<hex>" }],
//     "groups": [{ "name": "players", "secretKeys": ["<hex>", "<hex>"] }]
//   }
// }

use serde::{Deserialize, Serialize};
use shardnet_common::crypto::{CryptoError, KeyPair, SecretKey};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{HarnessError, Result};
use crate::users::{TestUser, UserDirectory};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndividualEntry {
    pub name: String,
    pub secret_key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub name: String,
    pub secret_keys: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsersConfig {
    #[serde(default)]
    pub individuals: Vec<IndividualEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub proxy_url: String,
    // Overrides the chain id reported by the network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub users: UsersConfig,
}

pub fn profile_path(base_dir: &Path, profile: &str) -> PathBuf {
    base_dir.join(format!("{}.session.json", profile))
}

impl SessionProfile {
    pub async fn load(base_dir: &Path, profile: &str) -> Result<Self> {
        let path = profile_path(base_dir, profile);
        let load_error = |reason: String| HarnessError::SessionLoad {
            path: path.clone(),
            reason,
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| load_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| load_error(format!("corrupt profile: {}", e)))
    }

    pub async fn save(&self, base_dir: &Path, profile: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(base_dir).await?;
        let path = profile_path(base_dir, profile);
        tokio::fs::write(&path, serde_json::to_string_pretty(self)?).await?;
        Ok(path)
    }

    /// Key pairs of the profile as a user directory.
    ///
    /// `path` is the profile file, reported when a secret key is malformed.
    pub fn user_directory(&self, path: &Path) -> Result<UserDirectory> {
        let signer = |owner: &str, secret_key: &str| {
            signer_from_hex(secret_key).map_err(|reason| HarnessError::SessionLoad {
                path: path.to_path_buf(),
                reason: format!("invalid secret key of {}: {}", owner, reason),
            })
        };

        let mut directory = UserDirectory::new();
        for entry in &self.users.individuals {
            let user = signer(&format!("user '{}'", entry.name), &entry.secret_key)?;
            directory.add_user(TestUser::new(&entry.name, user));
        }
        for group in &self.users.groups {
            let members = group
                .secret_keys
                .iter()
                .enumerate()
                .map(|(i, key)| -> Result<TestUser> {
                    let owner = format!("member #{} of group '{}'", i, group.name);
                    Ok(TestUser::new(String::new(), signer(&owner, key)?))
                })
                .collect::<Result<Vec<_>>>()?;
            directory.add_group(&group.name, members);
        }
        Ok(directory)
    }
}

fn signer_from_hex(secret_key: &str) -> std::result::Result<Arc<KeyPair>, CryptoError> {
    let secret = SecretKey::from_hex(secret_key)?;
    Ok(Arc::new(KeyPair::from_secret(&secret)))
}
