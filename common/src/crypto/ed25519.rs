//! Ed25519 keys and the signing capability of test users.
//!
//! An account address is the raw ed25519 public key. Transactions are signed
//! over their canonical signing bytes (see `Transaction::signing_bytes`).

use async_trait::async_trait;
use ed25519_dalek::{
    Signature as DalekSignature, Signer as DalekSigner, SigningKey, Verifier, VerifyingKey,
    SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{Address, CryptoError};

pub const SECRET_KEY_SIZE: usize = SECRET_KEY_LENGTH;
pub const SIGNATURE_SIZE: usize = SIGNATURE_LENGTH;

/// Secret key (32 bytes), zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_SIZE]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        if slice.len() != SECRET_KEY_SIZE {
            return Err(CryptoError::InvalidLength {
                len: slice.len(),
                expected: SECRET_KEY_SIZE,
            });
        }
        let mut bytes = [0u8; SECRET_KEY_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for SecretKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Ed25519 signature (64 bytes), hex on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        if slice.len() != SIGNATURE_SIZE {
            return Err(CryptoError::InvalidLength {
                len: slice.len(),
                expected: SIGNATURE_SIZE,
            });
        }
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify this signature against the public key behind `address`.
    pub fn verify(&self, address: &Address, message: &[u8]) -> Result<(), CryptoError> {
        let key =
            VerifyingKey::from_bytes(address.as_bytes())
                .map_err(|_| CryptoError::InvalidPublicKey)?;
        key.verify(message, &DalekSignature::from_bytes(&self.0))
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Signing capability bound to one account.
///
/// The harness never reads key material: transaction builders hand the
/// signing bytes to the user's signer and attach what comes back.
/// Implementations may be remote (hardware wallet, signing service),
/// hence the async signature.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Address of the account this signer signs for
    fn address(&self) -> Address;

    /// Sign the given message
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::SigningFailed` if the signer is unavailable.
    async fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError>;
}

/// In-memory ed25519 key pair.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_secret(secret: &SecretKey) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret.as_bytes()),
        }
    }

    // Deterministic key pair for tests and local fixtures
    pub fn from_seed(seed: [u8; SECRET_KEY_SIZE]) -> Self {
        Self::from_secret(&SecretKey::from_bytes(seed))
    }

    pub fn secret_key(&self) -> SecretKey {
        SecretKey::from_bytes(self.signing_key.to_bytes())
    }

    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign_bytes(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Signer for KeyPair {
    fn address(&self) -> Address {
        KeyPair::address(self)
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        Ok(self.sign_bytes(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_from_secret() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret(&keypair.secret_key());
        assert_eq!(keypair.address(), restored.address());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::from_seed([7; 32]);
        let signature = keypair.sign_bytes(b"move balance");

        assert!(signature.verify(&keypair.address(), b"move balance").is_ok());
        assert_eq!(
            signature.verify(&keypair.address(), b"other"),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_secret_key_hex() {
        let keypair = KeyPair::from_seed([1; 32]);
        let hex = keypair.secret_key().to_hex();
        let parsed: SecretKey = hex.parse().unwrap();
        assert_eq!(KeyPair::from_secret(&parsed).address(), keypair.address());
        assert!(SecretKey::from_hex("abcd").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let keypair = KeyPair::from_seed([3; 32]);
        let debug = format!("{:?}", keypair.secret_key());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&keypair.secret_key().to_hex()));
    }

    #[tokio::test]
    async fn test_signer_trait_object() {
        let keypair = KeyPair::from_seed([9; 32]);
        let signer: Box<dyn Signer> = Box::new(keypair.clone());
        let signature = signer.sign(b"payload").await.unwrap();
        assert_eq!(signature, keypair.sign_bytes(b"payload"));
        assert_eq!(signer.address(), keypair.address());
    }
}
