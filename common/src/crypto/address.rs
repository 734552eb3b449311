use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use super::CryptoError;
use crate::config::VM_TYPE_WASM;

pub const ADDRESS_SIZE: usize = 32;

// Smart contract addresses start with this many zero bytes
const CONTRACT_ADDRESS_ZERO_PREFIX: usize = 8;
// Number of trailing deployer bytes kept in a contract address (keeps the shard)
const SHARD_IDENTIFIER_LEN: usize = 2;

/// Account address: the 32 bytes of the account's ed25519 public key,
/// or a derived address for smart contracts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// The zero address, receiver of contract deployments
    pub const fn zero() -> Self {
        Self([0; ADDRESS_SIZE])
    }

    /// System contract that issues tokens and manages their roles.
    /// It lives on the metachain.
    pub const fn token_issuer() -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[CONTRACT_ADDRESS_ZERO_PREFIX + 1] = 0x01;
        bytes[ADDRESS_SIZE - 2] = 0xff;
        bytes[ADDRESS_SIZE - 1] = 0xff;
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        if slice.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidLength {
                len: slice.len(),
                expected: ADDRESS_SIZE,
            });
        }
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_SIZE]
    }

    pub fn is_smart_contract(&self) -> bool {
        !self.is_zero()
            && self.0[..CONTRACT_ADDRESS_ZERO_PREFIX] == [0; CONTRACT_ADDRESS_ZERO_PREFIX]
    }

    /// Compute the shard of this address for a network of `num_shards` shards.
    ///
    /// The shard is taken from the low bits of the last byte. When the masked
    /// value is out of range (shard count not a power of two), one bit less is used.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardnet_common::crypto::Address;
    ///
    /// let mut bytes = [0u8; 32];
    /// bytes[31] = 0x07;
    /// // 0x07 & 0b11 = 3 is out of range for 3 shards, so 0x07 & 0b01 = 1
    /// assert_eq!(Address::new(bytes).shard(3), 1);
    /// ```
    pub fn shard(&self, num_shards: u32) -> u32 {
        if num_shards <= 1 {
            return 0;
        }

        let bits = 32 - (num_shards - 1).leading_zeros();
        let mask_high = (1u32 << bits) - 1;
        let mask_low = (1u32 << (bits - 1)) - 1;

        let last = self.0[ADDRESS_SIZE - 1] as u32;
        let shard = last & mask_high;
        if shard > num_shards - 1 {
            last & mask_low
        } else {
            shard
        }
    }

    /// Address of the contract deployed by `deployer` with the given account nonce.
    ///
    /// Computable before broadcast, so callers can persist it right away.
    /// The contract lives in the same shard as its deployer.
    pub fn compute_contract_address(deployer: &Address, nonce: u64) -> Address {
        let mut hasher = Keccak256::new();
        hasher.update(deployer.0);
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; ADDRESS_SIZE];
        let vm_start = CONTRACT_ADDRESS_ZERO_PREFIX;
        let vm_end = vm_start + VM_TYPE_WASM.len();
        let tail_start = ADDRESS_SIZE - SHARD_IDENTIFIER_LEN;

        bytes[vm_start..vm_end].copy_from_slice(&VM_TYPE_WASM);
        bytes[vm_end..tail_start].copy_from_slice(&digest[vm_end..tail_start]);
        bytes[tail_start..].copy_from_slice(&deployer.0[tail_start..]);

        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(SerdeError::custom)
    }
}
