use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    config::{GAS_PER_DATA_BYTE, MIN_GAS_LIMIT},
    crypto::{hash, Address, CryptoError, Hash, Signature, ADDRESS_SIZE},
    utils::amount_string,
};

pub mod args;
pub mod management;
pub mod payment;

pub use args::{ArgsError, CallData, CodeMetadata, ContractArg};
pub use management::{NftCreate, TokenProperties};
pub use payment::{PaymentError, TokenDescriptor, TokenPayment};

/// A native-coin transaction as signed by the sender and broadcast to the network.
///
/// Token transfers, contract calls and deployments are all expressed through
/// the `data` field, which is sent hex-encoded on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: u64,
    #[serde(with = "amount_string")]
    pub value: u128,
    pub receiver: Address,
    pub sender: Address,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(default, with = "hex::serde", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Pays the fee of a relayed (v3) transaction in place of the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer_signature: Option<Signature>,
}

impl Transaction {
    /// Canonical bytes covered by the sender's signature.
    ///
    /// Fixed-width little-endian integers, length-prefixed variable fields.
    /// Signatures are never part of it. The relayer address is appended only
    /// when set, so sender and relayer sign the same bytes.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let variable = self.data.len() + self.chain_id.len() + ADDRESS_SIZE;
        let mut bytes = Vec::with_capacity(8 + 16 + 32 + 32 + 8 + 8 + 4 + 4 + 4 + variable);
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes.extend_from_slice(&self.value.to_le_bytes());
        bytes.extend_from_slice(self.receiver.as_bytes());
        bytes.extend_from_slice(self.sender.as_bytes());
        bytes.extend_from_slice(&self.gas_price.to_le_bytes());
        bytes.extend_from_slice(&self.gas_limit.to_le_bytes());
        bytes.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(&(self.chain_id.len() as u32).to_le_bytes());
        bytes.extend_from_slice(self.chain_id.as_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        if let Some(relayer) = &self.relayer {
            bytes.extend_from_slice(relayer.as_bytes());
        }
        bytes
    }

    /// Content hash: blake3 over the signing bytes followed by the signature.
    pub fn hash(&self) -> Hash {
        let mut bytes = self.signing_bytes();
        if let Some(signature) = &self.signature {
            bytes.extend_from_slice(signature.as_bytes());
        }
        if let Some(signature) = &self.relayer_signature {
            bytes.extend_from_slice(signature.as_bytes());
        }
        let h = hash(&bytes);
        trace!("hash of tx nonce {} from {}: {}", self.nonce, self.sender, h);
        h
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn apply_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
    }

    /// Check the signature against the sender's public key
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        let signature = self.signature.as_ref().ok_or(CryptoError::InvalidSignature)?;
        signature.verify(&self.sender, &self.signing_bytes())
    }

    pub fn is_relayed(&self) -> bool {
        self.relayer.is_some()
    }

    pub fn apply_relayer_signature(&mut self, signature: Signature) {
        self.relayer_signature = Some(signature);
    }

    /// Check the relayer's signature over the same bytes the sender signed
    pub fn verify_relayer_signature(&self) -> Result<(), CryptoError> {
        let relayer = self.relayer.as_ref().ok_or(CryptoError::InvalidSignature)?;
        let signature = self
            .relayer_signature
            .as_ref()
            .ok_or(CryptoError::InvalidSignature)?;
        signature.verify(relayer, &self.signing_bytes())
    }

    /// Data field as text, if it is valid UTF-8
    pub fn data_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Gas needed to move balance with this data field
    pub fn move_balance_gas(&self) -> u64 {
        move_balance_gas(self.data.len())
    }
}

/// Gas needed for a plain value transfer carrying `data_len` bytes of data
pub fn move_balance_gas(data_len: usize) -> u64 {
    MIN_GAS_LIMIT + GAS_PER_DATA_BYTE * data_len as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CHAIN_ID, MIN_GAS_PRICE, TRANSACTION_VERSION};
    use crate::crypto::KeyPair;

    fn unsigned(sender: &KeyPair) -> Transaction {
        Transaction {
            nonce: 5,
            value: 1_000,
            receiver: Address::new([2; 32]),
            sender: sender.address(),
            gas_price: MIN_GAS_PRICE,
            gas_limit: 70_000,
            data: b"hello".to_vec(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            version: TRANSACTION_VERSION,
            signature: None,
            relayer: None,
            relayer_signature: None,
        }
    }

    #[test]
    fn test_signature_roundtrip() {
        let keypair = KeyPair::from_seed([4; 32]);
        let mut tx = unsigned(&keypair);
        assert!(tx.verify_signature().is_err());

        tx.apply_signature(keypair.sign_bytes(&tx.signing_bytes()));
        assert!(tx.is_signed());
        assert!(tx.verify_signature().is_ok());

        tx.value += 1;
        assert_eq!(tx.verify_signature(), Err(CryptoError::InvalidSignature));
    }

    #[test]
    fn test_hash_covers_signature() {
        let keypair = KeyPair::from_seed([4; 32]);
        let mut tx = unsigned(&keypair);
        let before = tx.hash();
        tx.apply_signature(keypair.sign_bytes(&tx.signing_bytes()));
        assert_ne!(before, tx.hash());
        assert_eq!(tx.hash(), tx.clone().hash());
    }

    #[test]
    fn test_json_wire_format() {
        let keypair = KeyPair::from_seed([4; 32]);
        let tx = unsigned(&keypair);
        let json = serde_json::to_value(&tx).unwrap();

        assert_eq!(json["value"], "1000");
        assert_eq!(json["data"], hex::encode("hello"));
        assert_eq!(json["chainID"], DEFAULT_CHAIN_ID);
        assert_eq!(json["gasLimit"], 70_000);
        assert!(json.get("signature").is_none());
        assert!(json.get("relayer").is_none());

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_relayer_signs_the_sender_bytes() {
        let sender = KeyPair::from_seed([4; 32]);
        let relayer = KeyPair::from_seed([6; 32]);
        let mut tx = unsigned(&sender);
        let direct_bytes = tx.signing_bytes();

        tx.relayer = Some(relayer.address());
        assert_ne!(tx.signing_bytes(), direct_bytes);
        assert!(tx.is_relayed());

        tx.apply_signature(sender.sign_bytes(&tx.signing_bytes()));
        assert_eq!(tx.verify_relayer_signature(), Err(CryptoError::InvalidSignature));
        let unrelayed_hash = tx.hash();

        tx.apply_relayer_signature(relayer.sign_bytes(&tx.signing_bytes()));
        assert!(tx.verify_signature().is_ok());
        assert!(tx.verify_relayer_signature().is_ok());
        assert_ne!(tx.hash(), unrelayed_hash);

        // Swapping the relayer invalidates both signatures
        tx.relayer = Some(Address::new([7; 32]));
        assert!(tx.verify_signature().is_err());
        assert!(tx.verify_relayer_signature().is_err());

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["relayer"], Address::new([7; 32]).to_hex());
        assert_eq!(serde_json::from_value::<Transaction>(json).unwrap(), tx);
    }

    #[test]
    fn test_move_balance_gas() {
        let keypair = KeyPair::from_seed([4; 32]);
        let tx = unsigned(&keypair);
        assert_eq!(tx.move_balance_gas(), 50_000 + 5 * 1_500);
        assert_eq!(move_balance_gas(0), 50_000);
    }
}
