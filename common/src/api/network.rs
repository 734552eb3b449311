use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_CHAIN_ID, GAS_PER_DATA_BYTE, GAS_PRICE_MODIFIER_DIVISOR, MAX_GAS_PER_TRANSACTION,
        MIN_GAS_LIMIT, MIN_GAS_PRICE, NUM_SHARDS, ROUNDS_PER_EPOCH, TRANSACTION_VERSION,
    },
    crypto::Address,
    utils::amount_string,
};

/// Network parameters needed to build and price transactions
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub num_shards: u32,
    pub min_gas_limit: u64,
    pub gas_per_data_byte: u64,
    pub min_gas_price: u64,
    pub gas_price_modifier_divisor: u64,
    pub max_gas_per_transaction: u64,
    pub min_transaction_version: u32,
    // Milliseconds
    pub round_duration: u64,
    pub rounds_per_epoch: u64,
}

impl NetworkConfig {
    /// Gas needed to move balance with `data_len` bytes of data
    pub fn move_balance_gas(&self, data_len: usize) -> u64 {
        self.min_gas_limit + self.gas_per_data_byte * data_len as u64
    }

    /// Fee of a plain value transfer, also the whole fee of a failed contract call
    pub fn move_balance_fee(&self, data_len: usize, gas_price: u64) -> u128 {
        self.move_balance_gas(data_len) as u128 * gas_price as u128
    }

    /// Fee of gas consumed by execution, charged at a discounted price
    pub fn processing_fee(&self, gas_used: u64, gas_price: u64) -> u128 {
        gas_used as u128 * gas_price as u128 / self.gas_price_modifier_divisor.max(1) as u128
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            num_shards: NUM_SHARDS,
            min_gas_limit: MIN_GAS_LIMIT,
            gas_per_data_byte: GAS_PER_DATA_BYTE,
            min_gas_price: MIN_GAS_PRICE,
            gas_price_modifier_divisor: GAS_PRICE_MODIFIER_DIVISOR,
            max_gas_per_transaction: MAX_GAS_PER_TRANSACTION,
            min_transaction_version: TRANSACTION_VERSION,
            round_duration: 6000,
            rounds_per_epoch: ROUNDS_PER_EPOCH,
        }
    }
}

/// Progress of one shard
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub current_round: u64,
    pub epoch_number: u64,
    pub highest_final_nonce: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountOnNetwork {
    pub address: Address,
    pub nonce: u64,
    #[serde(with = "amount_string")]
    pub balance: u128,
    pub shard: u32,
    // Set for smart contracts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
    // Unclaimed share of call fees, smart contracts only
    #[serde(default, with = "amount_string")]
    pub developer_reward: u128,
}

/// Balance of one token (fungible: nonce 0) held by an account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub token_identifier: String,
    pub nonce: u64,
    #[serde(with = "amount_string")]
    pub balance: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fees() {
        let config = NetworkConfig::default();
        assert_eq!(config.move_balance_gas(0), 50_000);
        assert_eq!(config.move_balance_fee(10, 1_000_000_000), 65_000 * 1_000_000_000);
        assert_eq!(config.processing_fee(1_000_000, 1_000_000_000), 10_000_000_000_000);
    }

    #[test]
    fn test_config_wire_names() {
        let json = serde_json::to_value(NetworkConfig::default()).unwrap();
        assert_eq!(json["chainID"], DEFAULT_CHAIN_ID);
        assert_eq!(json["minGasLimit"], 50_000);
        assert_eq!(json["numShards"], NUM_SHARDS);
    }
}
