// Payloads of token management and contract ownership calls.
//
// Issue and role calls go to the token issuer system contract; NFT/SFT
// creation is sent to self; ownership built-ins go to the contract.

use crate::config::{
    BUILTIN_CHANGE_OWNER, BUILTIN_CLAIM_DEVELOPER_REWARDS, BUILTIN_NFT_CREATE, ISSUE_FUNGIBLE,
    ISSUE_NON_FUNGIBLE, ISSUE_SEMI_FUNGIBLE, SET_SPECIAL_ROLE,
};
use crate::crypto::Address;

use super::args::{CallData, ContractArg};

/// Boolean properties set at issuance, sent as `name@true|false` pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenProperties {
    pub can_freeze: bool,
    pub can_wipe: bool,
    pub can_pause: bool,
    pub can_change_owner: bool,
    pub can_upgrade: bool,
    pub can_add_special_roles: bool,
    // Non-fungible and semi-fungible tokens only
    pub can_transfer_nft_create_role: bool,
}

impl TokenProperties {
    /// Every property enabled
    pub fn all() -> Self {
        Self {
            can_freeze: true,
            can_wipe: true,
            can_pause: true,
            can_change_owner: true,
            can_upgrade: true,
            can_add_special_roles: true,
            can_transfer_nft_create_role: true,
        }
    }

    fn append_to(&self, mut data: CallData, with_nft_create_role: bool) -> CallData {
        let mut pairs = vec![
            ("canFreeze", self.can_freeze),
            ("canWipe", self.can_wipe),
            ("canPause", self.can_pause),
        ];
        if with_nft_create_role {
            pairs.push(("canTransferNFTCreateRole", self.can_transfer_nft_create_role));
        }
        pairs.extend([
            ("canChangeOwner", self.can_change_owner),
            ("canUpgrade", self.can_upgrade),
            ("canAddSpecialRoles", self.can_add_special_roles),
        ]);

        for (name, enabled) in pairs {
            data = data.arg(name).arg(if enabled { "true" } else { "false" });
        }
        data
    }
}

/// `issue@<name>@<ticker>@<initial supply>@<decimals>@<properties...>`
pub fn issue_fungible_data(
    name: &str,
    ticker: &str,
    initial_supply: u128,
    decimals: u32,
    properties: &TokenProperties,
) -> CallData {
    let data = CallData::new(ISSUE_FUNGIBLE)
        .arg(name)
        .arg(ticker)
        .arg(ContractArg::BigUint(initial_supply))
        .arg(decimals as u64);
    properties.append_to(data, false)
}

/// `issueNonFungible@<name>@<ticker>@<properties...>`
pub fn issue_non_fungible_data(name: &str, ticker: &str, properties: &TokenProperties) -> CallData {
    properties.append_to(CallData::new(ISSUE_NON_FUNGIBLE).arg(name).arg(ticker), true)
}

/// `issueSemiFungible@<name>@<ticker>@<properties...>`
pub fn issue_semi_fungible_data(
    name: &str,
    ticker: &str,
    properties: &TokenProperties,
) -> CallData {
    properties.append_to(CallData::new(ISSUE_SEMI_FUNGIBLE).arg(name).arg(ticker), true)
}

/// `setSpecialRole@<identifier>@<user>@<role>...`
pub fn set_special_role_data(identifier: &str, user: &Address, roles: &[&str]) -> CallData {
    roles
        .iter()
        .fold(CallData::new(SET_SPECIAL_ROLE).arg(identifier).arg(*user), |data, role| {
            data.arg(*role)
        })
}

/// A new NFT or SFT nonce of an issued collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftCreate {
    pub identifier: String,
    pub quantity: u128,
    pub name: String,
    // Basis points, 10_000 is 100%
    pub royalties: u32,
    pub hash: Vec<u8>,
    pub attributes: Vec<u8>,
    pub uris: Vec<String>,
}

impl NftCreate {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>, quantity: u128) -> Self {
        Self {
            identifier: identifier.into(),
            quantity,
            name: name.into(),
            royalties: 0,
            hash: Vec::new(),
            attributes: Vec::new(),
            uris: Vec::new(),
        }
    }

    pub fn with_royalties(mut self, royalties: u32) -> Self {
        self.royalties = royalties;
        self
    }

    pub fn with_hash(mut self, hash: impl Into<Vec<u8>>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn with_attributes(mut self, attributes: impl Into<Vec<u8>>) -> Self {
        self.attributes = attributes.into();
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uris.push(uri.into());
        self
    }

    /// `ESDTNFTCreate@<identifier>@<quantity>@<name>@<royalties>@<hash>@<attributes>@<uri>...`,
    /// sent to self
    pub fn to_call_data(&self) -> CallData {
        let data = CallData::new(BUILTIN_NFT_CREATE)
            .arg(self.identifier.as_str())
            .arg(ContractArg::BigUint(self.quantity))
            .arg(self.name.as_str())
            .arg(self.royalties as u64)
            .raw_arg(self.hash.clone())
            .raw_arg(self.attributes.clone());
        self.uris.iter().fold(data, |data, uri| data.arg(uri.as_str()))
    }
}

/// `ChangeOwnerAddress@<new owner>`, sent to the contract by its owner
pub fn change_owner_data(new_owner: &Address) -> CallData {
    CallData::new(BUILTIN_CHANGE_OWNER).arg(*new_owner)
}

/// `ClaimDeveloperRewards`, sent to the contract by its owner
pub fn claim_developer_rewards_data() -> CallData {
    CallData::new(BUILTIN_CLAIM_DEVELOPER_REWARDS)
}
