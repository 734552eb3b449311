// Protocol constants shared by the harness, the in-process network and the tools.

// Native coin
pub const NATIVE_TOKEN_IDENTIFIER: &str = "NATIVE";
pub const NATIVE_DECIMALS: u32 = 18;
// 1 coin in atomic units
pub const COIN_VALUE: u128 = 1_000_000_000_000_000_000;

// Default number of shards of a local network
pub const NUM_SHARDS: u32 = 3;
// Shard id of the coordinating chain
pub const METACHAIN_ID: u32 = u32::MAX;

pub const DEFAULT_CHAIN_ID: &str = "localnet";
pub const TRANSACTION_VERSION: u32 = 1;

// Gas schedule
// Every transaction pays the move-balance cost:
// (MIN_GAS_LIMIT + GAS_PER_DATA_BYTE * data length) * gas price
pub const MIN_GAS_LIMIT: u64 = 50_000;
pub const GAS_PER_DATA_BYTE: u64 = 1_500;
pub const MIN_GAS_PRICE: u64 = 1_000_000_000;
// Gas spent in execution is charged at gas price / GAS_PRICE_MODIFIER_DIVISOR
pub const GAS_PRICE_MODIFIER_DIVISOR: u64 = 100;
pub const MAX_GAS_PER_TRANSACTION: u64 = 600_000_000;

// Extra gas granted to built-in token transfers on top of the move-balance cost
pub const GAS_LIMIT_TOKEN_TRANSFER: u64 = 200_000;
pub const ADDITIONAL_GAS_FOR_TOKEN_TRANSFER: u64 = 100_000;
pub const ADDITIONAL_GAS_FOR_NFT_TRANSFER: u64 = 800_000;

// Built-in function names carried in the data field
pub const BUILTIN_TOKEN_TRANSFER: &str = "ESDTTransfer";
pub const BUILTIN_NFT_TRANSFER: &str = "ESDTNFTTransfer";
pub const BUILTIN_MULTI_TRANSFER: &str = "MultiESDTNFTTransfer";

// VM type and code metadata of a deployment
pub const VM_TYPE_WASM: [u8; 2] = [0x05, 0x00];
pub const CODE_METADATA_UPGRADEABLE: u8 = 0x01;
pub const CODE_METADATA_READABLE: u8 = 0x04;
pub const CODE_METADATA_PAYABLE: u8 = 0x02;
pub const CODE_METADATA_PAYABLE_BY_CONTRACT: u8 = 0x04;

// Rounds per epoch on a local network
pub const ROUNDS_PER_EPOCH: u64 = 20;

// Relayed transactions
pub const BUILTIN_RELAYED_V1: &str = "relayedTx";
pub const BUILTIN_RELAYED_V2: &str = "relayedTxV2";
// Gas a relayed v3 transaction adds for the relayer's signature check
pub const ADDITIONAL_GAS_FOR_RELAYED_V3: u64 = 50_000;

// Token management, handled by the token issuer system contract on the metachain
pub const ISSUE_FUNGIBLE: &str = "issue";
pub const ISSUE_NON_FUNGIBLE: &str = "issueNonFungible";
pub const ISSUE_SEMI_FUNGIBLE: &str = "issueSemiFungible";
pub const SET_SPECIAL_ROLE: &str = "setSpecialRole";
pub const BUILTIN_NFT_CREATE: &str = "ESDTNFTCreate";
// Paid as value with every issue call
pub const TOKEN_ISSUE_COST: u128 = 50_000_000_000_000_000;
pub const GAS_LIMIT_TOKEN_ISSUE: u64 = 60_000_000;
pub const GAS_LIMIT_SET_SPECIAL_ROLE: u64 = 60_000_000;
pub const GAS_LIMIT_NFT_CREATE: u64 = 3_000_000;

pub const ROLE_LOCAL_MINT: &str = "ESDTRoleLocalMint";
pub const ROLE_LOCAL_BURN: &str = "ESDTRoleLocalBurn";
pub const ROLE_TRANSFER: &str = "ESDTTransferRole";
pub const ROLE_NFT_CREATE: &str = "ESDTRoleNFTCreate";
pub const ROLE_NFT_BURN: &str = "ESDTRoleNFTBurn";
pub const ROLE_NFT_ADD_QUANTITY: &str = "ESDTRoleNFTAddQuantity";

// Contract ownership built-ins
pub const BUILTIN_CHANGE_OWNER: &str = "ChangeOwnerAddress";
pub const BUILTIN_CLAIM_DEVELOPER_REWARDS: &str = "ClaimDeveloperRewards";
pub const GAS_LIMIT_CHANGE_OWNER: u64 = 6_000_000;
pub const GAS_LIMIT_CLAIM_DEVELOPER_REWARDS: u64 = 8_000_000;
// Percentage of a contract call's processing fee accrued to the contract owner
pub const DEVELOPER_FEES_PERCENTAGE: u128 = 30;
