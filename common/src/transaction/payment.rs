use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::args::{CallData, ContractArg};
use crate::{
    config::{
        BUILTIN_MULTI_TRANSFER, BUILTIN_NFT_TRANSFER, BUILTIN_TOKEN_TRANSFER, NATIVE_DECIMALS,
        NATIVE_TOKEN_IDENTIFIER,
    },
    crypto::Address,
    utils::{amount_string, format_amount},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("Amount '{amount}' has more than {decimals} decimals")]
    TooManyDecimals { amount: String, decimals: u32 },
    #[error("Amount '{0}' overflows")]
    Overflow(String),
}

/// Token descriptor persisted in the session: identifier and decimal precision.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub identifier: String,
    pub decimals: u32,
}

impl TokenDescriptor {
    pub fn new(identifier: impl Into<String>, decimals: u32) -> Self {
        Self {
            identifier: identifier.into(),
            decimals,
        }
    }
}

/// Amount of a token (native, fungible, semi-fungible or non-fungible) to transfer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayment {
    pub token_identifier: String,
    // Zero for native and fungible tokens
    pub token_nonce: u64,
    #[serde(with = "amount_string")]
    pub amount: u128,
    pub num_decimals: u32,
}

impl TokenPayment {
    pub fn native(amount: u128) -> Self {
        Self {
            token_identifier: NATIVE_TOKEN_IDENTIFIER.to_string(),
            token_nonce: 0,
            amount,
            num_decimals: NATIVE_DECIMALS,
        }
    }

    /// Native payment from a decimal amount such as "1.5"
    pub fn native_from_amount(amount: &str) -> Result<Self, PaymentError> {
        Ok(Self::native(parse_amount(amount, NATIVE_DECIMALS)?))
    }

    pub fn fungible_from_amount(
        identifier: impl Into<String>,
        amount: &str,
        decimals: u32,
    ) -> Result<Self, PaymentError> {
        Ok(Self::fungible_from_atomic(
            identifier,
            parse_amount(amount, decimals)?,
            decimals,
        ))
    }

    pub fn fungible_from_atomic(
        identifier: impl Into<String>,
        amount: u128,
        decimals: u32,
    ) -> Self {
        Self {
            token_identifier: identifier.into(),
            token_nonce: 0,
            amount,
            num_decimals: decimals,
        }
    }

    pub fn non_fungible(identifier: impl Into<String>, nonce: u64) -> Self {
        Self::semi_fungible(identifier, nonce, 1)
    }

    pub fn semi_fungible(identifier: impl Into<String>, nonce: u64, quantity: u128) -> Self {
        Self {
            token_identifier: identifier.into(),
            token_nonce: nonce,
            amount: quantity,
            num_decimals: 0,
        }
    }

    pub fn is_native(&self) -> bool {
        self.token_identifier == NATIVE_TOKEN_IDENTIFIER
    }

    /// Fungible token other than the native coin
    pub fn is_fungible(&self) -> bool {
        !self.is_native() && self.token_nonce == 0
    }

    pub fn to_pretty_string(&self) -> String {
        format!(
            "{} {}",
            format_amount(self.amount, self.num_decimals),
            self.token_identifier
        )
    }
}

impl fmt::Display for TokenPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)
    }
}

/// Parse a decimal amount into atomic units
pub fn parse_amount(amount: &str, decimals: u32) -> Result<u128, PaymentError> {
    let amount = amount.trim();
    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let empty = integer.is_empty() && fraction.is_empty();
    if empty || !all_digits(integer) || !all_digits(fraction) {
        return Err(PaymentError::InvalidAmount(amount.to_string()));
    }

    if fraction.len() > decimals as usize {
        return Err(PaymentError::TooManyDecimals {
            amount: amount.to_string(),
            decimals,
        });
    }

    let overflow = || PaymentError::Overflow(amount.to_string());
    let unit = 10u128.checked_pow(decimals).ok_or_else(overflow)?;
    let integer: u128 = if integer.is_empty() {
        0
    } else {
        integer.parse().map_err(|_| overflow())?
    };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    integer
        .checked_mul(unit)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(overflow)
}

/// `ESDTTransfer@<identifier>@<amount>`, sent to the receiver directly
pub fn token_transfer_data(payment: &TokenPayment) -> CallData {
    CallData::new(BUILTIN_TOKEN_TRANSFER)
        .arg(payment.token_identifier.as_str())
        .arg(ContractArg::BigUint(payment.amount))
}

/// `ESDTNFTTransfer@<identifier>@<nonce>@<quantity>@<receiver>`, sent to the sender itself
pub fn nft_transfer_data(payment: &TokenPayment, receiver: &Address) -> CallData {
    CallData::new(BUILTIN_NFT_TRANSFER)
        .arg(payment.token_identifier.as_str())
        .arg(payment.token_nonce)
        .arg(ContractArg::BigUint(payment.amount))
        .arg(*receiver)
}

/// `MultiESDTNFTTransfer@<receiver>@<count>(@<identifier>@<nonce>@<amount>)*`,
/// sent to the sender itself
pub fn multi_transfer_data(receiver: &Address, payments: &[TokenPayment]) -> CallData {
    let mut data = CallData::new(BUILTIN_MULTI_TRANSFER)
        .arg(*receiver)
        .arg(payments.len() as u64);
    for payment in payments {
        data = data
            .arg(payment.token_identifier.as_str())
            .arg(payment.token_nonce)
            .arg(ContractArg::BigUint(payment.amount));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1", 18).unwrap(), 10u128.pow(18));
        assert_eq!(parse_amount("1.5", 2).unwrap(), 150);
        assert_eq!(parse_amount(".25", 2).unwrap(), 25);
        assert_eq!(parse_amount("100", 0).unwrap(), 100);
        assert_eq!(
            parse_amount("1.234", 2),
            Err(PaymentError::TooManyDecimals {
                amount: "1.234".to_string(),
                decimals: 2
            })
        );
        assert!(matches!(parse_amount("1a", 2), Err(PaymentError::InvalidAmount(_))));
        assert!(matches!(parse_amount(".", 2), Err(PaymentError::InvalidAmount(_))));
        assert!(matches!(
            parse_amount("999999999999999999999999", 18),
            Err(PaymentError::Overflow(_))
        ));
    }

    #[test]
    fn test_payment_kinds() {
        let native = TokenPayment::native_from_amount("0.1").unwrap();
        assert!(native.is_native());
        assert!(!native.is_fungible());
        assert_eq!(native.amount, 10u128.pow(17));

        let fungible = TokenPayment::fungible_from_amount("ROSE-abcdef", "100", 6).unwrap();
        assert!(fungible.is_fungible());
        assert_eq!(fungible.amount, 100_000_000);
        assert_eq!(fungible.to_pretty_string(), "100 ROSE-abcdef");

        let nft = TokenPayment::non_fungible("FROG-123456", 3);
        assert!(!nft.is_fungible());
        assert_eq!(nft.amount, 1);
    }

    #[test]
    fn test_transfer_payloads() {
        let payment = TokenPayment::fungible_from_atomic("AB-01", 100, 0);
        assert_eq!(
            token_transfer_data(&payment).to_string(),
            format!("ESDTTransfer@{}@64", hex::encode("AB-01"))
        );

        let receiver = Address::new([1; 32]);
        let nft = TokenPayment::non_fungible("NFT-02", 2);
        assert_eq!(
            nft_transfer_data(&nft, &receiver).to_string(),
            format!(
                "ESDTNFTTransfer@{}@02@01@{}",
                hex::encode("NFT-02"),
                receiver.to_hex()
            )
        );

        let multi = multi_transfer_data(&receiver, &[payment, nft]);
        assert!(multi
            .to_string()
            .starts_with(&format!("MultiESDTNFTTransfer@{}@02@", receiver.to_hex())));
        assert_eq!(multi.args().len(), 2 + 2 * 3);
    }
}
