//! Assertion helpers over any network provider
//!
//! These helpers make tests more readable and provide better error messages
//! than comparing raw provider results.

use anyhow::{Context, Result};
use shardnet_common::crypto::Address;

use super::NetworkProvider;

/// Assert that an account holds exactly `expected` native units
///
/// # Errors
///
/// Returns an error if:
/// - The provider call fails
/// - Actual balance doesn't match expected
///
/// # Example
///
/// ```rust,ignore
/// assert_native_balance(&network, &alice.address(), 1_000_000).await?;
/// ```
pub async fn assert_native_balance<P: NetworkProvider + ?Sized>(
    provider: &P,
    address: &Address,
    expected: u128,
) -> Result<()> {
    let account = provider
        .get_account(address)
        .await
        .with_context(|| format!("Failed to get account {}", address))?;

    if account.balance != expected {
        anyhow::bail!(
            "Balance mismatch for address {}: expected {}, got {}",
            address,
            expected,
            account.balance
        );
    }

    Ok(())
}

/// Assert that an account holds exactly `expected` units of a token
///
/// # Arguments
///
/// * `identifier` - Token identifier
/// * `nonce` - 0 for fungible tokens, the NFT/SFT nonce otherwise
pub async fn assert_token_balance<P: NetworkProvider + ?Sized>(
    provider: &P,
    address: &Address,
    identifier: &str,
    nonce: u64,
    expected: u128,
) -> Result<()> {
    let actual = provider
        .get_token_balance(address, identifier, nonce)
        .await
        .with_context(|| format!("Failed to get {} balance of {}", identifier, address))?;

    if actual != expected {
        anyhow::bail!(
            "{} balance mismatch for address {}: expected {}, got {}",
            identifier,
            address,
            expected,
            actual
        );
    }

    Ok(())
}

/// Assert the on-chain nonce of an account
pub async fn assert_nonce<P: NetworkProvider + ?Sized>(
    provider: &P,
    address: &Address,
    expected: u64,
) -> Result<()> {
    let account = provider
        .get_account(address)
        .await
        .with_context(|| format!("Failed to get account {}", address))?;

    if account.nonce != expected {
        anyhow::bail!(
            "Nonce mismatch for address {}: expected {}, got {}",
            address,
            expected,
            account.nonce
        );
    }

    Ok(())
}
