// Token issuer system contract and the NFT/SFT create built-in.
//
// Issue calls register a collection under `TICKER-<6 hex>`, derived from
// the issuing transaction's hash. Fungible supply is credited to the
// issuer right away; NFT and SFT nonces are minted later by accounts
// holding the create role.

use log::debug;
use shardnet_common::{
    api::LogEvent,
    config::{
        BUILTIN_NFT_CREATE, ISSUE_FUNGIBLE, ISSUE_NON_FUNGIBLE, ISSUE_SEMI_FUNGIBLE,
        NATIVE_DECIMALS, ROLE_LOCAL_BURN, ROLE_LOCAL_MINT, ROLE_NFT_ADD_QUANTITY, ROLE_NFT_BURN,
        ROLE_NFT_CREATE, ROLE_TRANSFER, SET_SPECIAL_ROLE, TOKEN_ISSUE_COST,
    },
    crypto::{Address, Hash},
    transaction::{
        args::{top_decode_biguint, top_decode_u64, top_encode_biguint},
        CallData, Transaction,
    },
};
use std::collections::{BTreeSet, HashMap};

use super::execution::Executed;
use super::programs::ContractError;
use super::NetworkState;

pub(crate) const ISSUE_EVENT: &str = "issue";
pub(crate) const SET_ROLE_EVENT: &str = "ESDTSetRole";

const MAX_ROYALTIES: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Fungible,
    NonFungible,
    SemiFungible,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Fungible => "FungibleESDT",
            TokenKind::NonFungible => "NonFungibleESDT",
            TokenKind::SemiFungible => "SemiFungibleESDT",
        }
    }

    fn allows_role(self, role: &str) -> bool {
        match self {
            TokenKind::Fungible => {
                [ROLE_LOCAL_MINT, ROLE_LOCAL_BURN, ROLE_TRANSFER].contains(&role)
            }
            TokenKind::NonFungible => {
                [ROLE_NFT_CREATE, ROLE_NFT_BURN, ROLE_TRANSFER].contains(&role)
            }
            TokenKind::SemiFungible => [
                ROLE_NFT_CREATE,
                ROLE_NFT_BURN,
                ROLE_NFT_ADD_QUANTITY,
                ROLE_TRANSFER,
            ]
            .contains(&role),
        }
    }
}

pub(crate) struct IssuedToken {
    pub(crate) owner: Address,
    pub(crate) kind: TokenKind,
    can_add_special_roles: bool,
    roles: HashMap<Address, BTreeSet<String>>,
    // Last NFT/SFT nonce created
    last_nonce: u64,
}

impl IssuedToken {
    pub(crate) fn has_role(&self, address: &Address, role: &str) -> bool {
        self.roles.get(address).is_some_and(|roles| roles.contains(role))
    }
}

fn text_arg(bytes: &[u8], what: &str) -> Result<String, ContractError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ContractError::user(format!("invalid {}", what)))
}

fn check_name(name: &str) -> Result<(), ContractError> {
    if (3..=20).contains(&name.len()) && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ContractError::user("invalid token name"))
    }
}

fn check_ticker(ticker: &str) -> Result<(), ContractError> {
    let valid = (3..=10).contains(&ticker.len())
        && ticker.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ContractError::user("invalid ticker name"))
    }
}

// `name@true|false` pairs; returns whether special roles may be added
fn parse_properties(args: &[Vec<u8>]) -> Result<bool, ContractError> {
    if args.len() % 2 != 0 {
        return Err(ContractError::user("invalid number of arguments"));
    }
    let mut can_add_special_roles = false;
    for pair in args.chunks(2) {
        let name = text_arg(&pair[0], "property")?;
        let enabled = match pair[1].as_slice() {
            b"true" => true,
            b"false" => false,
            _ => return Err(ContractError::user(format!("invalid value for {}", name))),
        };
        match name.as_str() {
            "canAddSpecialRoles" => can_add_special_roles = enabled,
            "canFreeze" | "canWipe" | "canPause" | "canChangeOwner" | "canUpgrade"
            | "canTransferNFTCreateRole" => {}
            _ => return Err(ContractError::user(format!("unknown property {}", name))),
        }
    }
    Ok(can_add_special_roles)
}

impl NetworkState {
    /// Calls to the token issuer, executed on the metachain
    pub(super) fn call_token_issuer(
        &mut self,
        tx: &Transaction,
        tx_hash: &Hash,
        gas_used: u64,
        logs: &mut Vec<LogEvent>,
    ) -> Result<Executed, ContractError> {
        let data = CallData::parse(&tx.data)
            .map_err(|e| ContractError::wrong_signature(format!("argument decode error: {}", e)))?;
        let kind = match data.function() {
            ISSUE_FUNGIBLE => TokenKind::Fungible,
            ISSUE_NON_FUNGIBLE => TokenKind::NonFungible,
            ISSUE_SEMI_FUNGIBLE => TokenKind::SemiFungible,
            SET_SPECIAL_ROLE => {
                let values = self.set_special_roles(tx, data.args(), logs)?;
                return Ok(Executed { values, gas_used });
            }
            _ => return Err(ContractError::function_not_found()),
        };
        let values = self.issue(tx, tx_hash, kind, data.args(), logs)?;
        Ok(Executed { values, gas_used })
    }

    fn issue(
        &mut self,
        tx: &Transaction,
        tx_hash: &Hash,
        kind: TokenKind,
        args: &[Vec<u8>],
        logs: &mut Vec<LogEvent>,
    ) -> Result<Vec<Vec<u8>>, ContractError> {
        if tx.value != TOKEN_ISSUE_COST {
            return Err(ContractError::user(format!(
                "issue cost must be exactly {}",
                TOKEN_ISSUE_COST
            )));
        }

        let fixed = if kind == TokenKind::Fungible { 4 } else { 2 };
        if args.len() < fixed {
            return Err(ContractError::user("not enough arguments"));
        }
        let name = text_arg(&args[0], "token name")?;
        let ticker = text_arg(&args[1], "ticker name")?;
        check_name(&name)?;
        check_ticker(&ticker)?;

        let supply = if kind == TokenKind::Fungible {
            let supply = top_decode_biguint(&args[2])
                .map_err(|_| ContractError::user("invalid initial supply"))?;
            let decimals = top_decode_u64(&args[3])
                .map_err(|_| ContractError::user("invalid number of decimals"))?;
            if decimals > NATIVE_DECIMALS as u64 {
                return Err(ContractError::user("invalid number of decimals"));
            }
            supply
        } else {
            0
        };
        let can_add_special_roles = parse_properties(&args[fixed..])?;

        let identifier = format!("{}-{}", ticker, &hex::encode(tx_hash.as_bytes())[..6]);
        if self.tokens.contains_key(&identifier) {
            return Err(ContractError::user("token identifier already exists"));
        }

        debug!("Issued {} ({}) for {}", identifier, kind.as_str(), tx.sender);
        self.tokens.insert(
            identifier.clone(),
            IssuedToken {
                owner: tx.sender,
                kind,
                can_add_special_roles,
                roles: HashMap::new(),
                last_nonce: 0,
            },
        );
        if supply > 0 {
            *self
                .accounts
                .entry(tx.sender)
                .or_default()
                .tokens
                .entry((identifier.clone(), 0))
                .or_insert(0) += supply;
        }

        logs.push(LogEvent {
            address: tx.receiver,
            identifier: ISSUE_EVENT.to_string(),
            topics: vec![
                hex::encode(&identifier),
                hex::encode(&name),
                hex::encode(&ticker),
                hex::encode(kind.as_str()),
            ],
            data: None,
        });
        Ok(vec![identifier.into_bytes()])
    }

    fn set_special_roles(
        &mut self,
        tx: &Transaction,
        args: &[Vec<u8>],
        logs: &mut Vec<LogEvent>,
    ) -> Result<Vec<Vec<u8>>, ContractError> {
        let [identifier, user, roles @ ..] = args else {
            return Err(ContractError::user("not enough arguments"));
        };
        if roles.is_empty() {
            return Err(ContractError::user("not enough arguments"));
        }
        let identifier = text_arg(identifier, "token identifier")?;
        let user = Address::from_slice(user).map_err(|_| ContractError::user("invalid address"))?;
        let roles = roles
            .iter()
            .map(|role| text_arg(role, "role"))
            .collect::<Result<Vec<_>, _>>()?;

        let token = self
            .tokens
            .get_mut(&identifier)
            .ok_or_else(|| ContractError::user("token not found"))?;
        if token.owner != tx.sender {
            return Err(ContractError::user("sender is not the token owner"));
        }
        if !token.can_add_special_roles {
            return Err(ContractError::user("cannot add special roles"));
        }
        if let Some(role) = roles.iter().find(|role| !token.kind.allows_role(role)) {
            return Err(ContractError::user(format!(
                "invalid role {} for {}",
                role,
                token.kind.as_str()
            )));
        }

        token.roles.entry(user).or_default().extend(roles.iter().cloned());

        let mut topics = vec![hex::encode(&identifier), String::new(), String::new()];
        topics.extend(roles.iter().map(hex::encode));
        logs.push(LogEvent {
            address: user,
            identifier: SET_ROLE_EVENT.to_string(),
            topics,
            data: None,
        });
        Ok(Vec::new())
    }

    /// `ESDTNFTCreate`, sent to self by a holder of the create role
    pub(super) fn create_nft(
        &mut self,
        tx: &Transaction,
        gas_used: u64,
        logs: &mut Vec<LogEvent>,
    ) -> Result<Executed, ContractError> {
        if tx.value > 0 {
            return Err(ContractError::user("built-in function called with value"));
        }
        let data = CallData::parse(&tx.data)
            .map_err(|e| ContractError::wrong_signature(format!("argument decode error: {}", e)))?;
        let [identifier, quantity, name, royalties, _hash, _attributes, ..] = data.args() else {
            return Err(ContractError::user("not enough arguments"));
        };
        let identifier = text_arg(identifier, "token identifier")?;
        let quantity =
            top_decode_biguint(quantity).map_err(|_| ContractError::user("invalid quantity"))?;
        let royalties =
            top_decode_u64(royalties).map_err(|_| ContractError::user("invalid royalties"))?;

        let token = self
            .tokens
            .get_mut(&identifier)
            .ok_or_else(|| ContractError::user("token not found"))?;
        if token.kind == TokenKind::Fungible {
            return Err(ContractError::user("not a non-fungible or semi-fungible token"));
        }
        if !token.has_role(&tx.sender, ROLE_NFT_CREATE) {
            return Err(ContractError::user("action is not allowed"));
        }
        if quantity == 0 || (token.kind == TokenKind::NonFungible && quantity != 1) {
            return Err(ContractError::user("invalid quantity"));
        }
        if royalties > MAX_ROYALTIES {
            return Err(ContractError::user("invalid royalties"));
        }

        token.last_nonce += 1;
        let nonce = token.last_nonce;
        *self
            .accounts
            .entry(tx.sender)
            .or_default()
            .tokens
            .entry((identifier.clone(), nonce))
            .or_insert(0) += quantity;

        logs.push(LogEvent {
            address: tx.sender,
            identifier: BUILTIN_NFT_CREATE.to_string(),
            topics: vec![
                hex::encode(&identifier),
                format!("{:x}", nonce),
                format!("{:x}", quantity),
                hex::encode(name),
            ],
            data: None,
        });
        Ok(Executed {
            values: vec![top_encode_biguint(nonce as u128)],
            gas_used,
        })
    }
}
