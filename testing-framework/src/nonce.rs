// File: testing-framework/src/nonce.rs
//
// Per-user nonce cursors, synchronized from the network on demand.
//
// Building N transactions for one user before broadcasting any of them
// yields base, base+1, ..., base+N-1. The tracker never guesses: a user
// that was not synchronized has no cursor.

use log::{debug, trace};
use shardnet_common::crypto::Address;
use std::collections::HashMap;

use crate::error::{HarnessError, Result};
use crate::network::NetworkProvider;
use crate::users::TestUser;

#[derive(Default, Debug)]
pub struct NonceTracker {
    cursors: HashMap<Address, u64>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cursor of each user with its on-chain nonce
    pub async fn sync_users<P: NetworkProvider + ?Sized>(
        &mut self,
        provider: &P,
        users: &[TestUser],
    ) -> Result<()> {
        let addresses: Vec<Address> = users.iter().map(TestUser::address).collect();
        self.sync_addresses(provider, &addresses).await
    }

    pub async fn sync_addresses<P: NetworkProvider + ?Sized>(
        &mut self,
        provider: &P,
        addresses: &[Address],
    ) -> Result<()> {
        for address in addresses {
            let account = provider.get_account(address).await?;
            debug!("Synced nonce of {}: {}", address, account.nonce);
            self.cursors.insert(*address, account.nonce);
        }
        Ok(())
    }

    /// Resynchronize a single user, e.g. after a transaction sent from another process
    pub async fn recall_nonce<P: NetworkProvider + ?Sized>(
        &mut self,
        provider: &P,
        user: &TestUser,
    ) -> Result<u64> {
        let account = provider.get_account(&user.address()).await?;
        self.cursors.insert(user.address(), account.nonce);
        Ok(account.nonce)
    }

    /// Current cursor of a user, then advance it by one
    pub fn get_nonce_then_increment(&mut self, user: &TestUser) -> Result<u64> {
        self.next_for(&user.address())
    }

    pub(crate) fn next_for(&mut self, address: &Address) -> Result<u64> {
        let cursor = self
            .cursors
            .get_mut(address)
            .ok_or(HarnessError::NotSynced(*address))?;
        let nonce = *cursor;
        *cursor += 1;
        trace!("Nonce {} handed out for {}", nonce, address);
        Ok(nonce)
    }

    /// Peek at the cursor without advancing it
    pub fn get_nonce(&self, user: &TestUser) -> Result<u64> {
        self.cursors
            .get(&user.address())
            .copied()
            .ok_or(HarnessError::NotSynced(user.address()))
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.cursors.insert(address, nonce);
    }

    pub fn is_synced(&self, address: &Address) -> bool {
        self.cursors.contains_key(address)
    }

    /// Addresses with a cursor
    pub fn tracked(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.cursors.keys().copied().collect();
        addresses.sort();
        addresses
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use crate::testnet::TestNetworkBuilder;
    use proptest::prelude::*;
    use shardnet_common::config::COIN_VALUE;
    use shardnet_common::crypto::KeyPair;
    use std::sync::Arc;

    fn user(seed: u8) -> TestUser {
        TestUser::new(format!("user{}", seed), Arc::new(KeyPair::from_seed([seed; 32])))
    }

    #[test]
    fn test_unsynced_user_has_no_cursor() {
        let mut tracker = NonceTracker::new();
        let alice = user(1);
        assert!(matches!(
            tracker.get_nonce_then_increment(&alice),
            Err(HarnessError::NotSynced(address)) if address == alice.address()
        ));
        assert!(tracker.get_nonce(&alice).is_err());
    }

    #[tokio::test]
    async fn test_sync_overwrites_cursor() {
        let alice = user(1);
        let network = TestNetworkBuilder::new()
            .with_auto_processing(false)
            .with_account(alice.address(), COIN_VALUE)
            .build();

        let mut tracker = NonceTracker::new();
        tracker.set_nonce(alice.address(), 17);
        tracker
            .sync_users(&network, std::slice::from_ref(&alice))
            .await
            .unwrap();
        assert_eq!(tracker.get_nonce(&alice).unwrap(), 0);

        tracker.get_nonce_then_increment(&alice).unwrap();
        assert_eq!(tracker.get_nonce(&alice).unwrap(), 1);
        assert_eq!(tracker.recall_nonce(&network, &alice).await.unwrap(), 0);
        assert_eq!(tracker.tracked(), vec![alice.address()]);
    }

    proptest! {
        #[test]
        fn prop_sequence_is_gap_free(base in 0u64..1_000_000, count in 1usize..200) {
            let alice = user(1);
            let mut tracker = NonceTracker::new();
            tracker.set_nonce(alice.address(), base);

            let nonces: Vec<u64> = (0..count)
                .map(|_| tracker.get_nonce_then_increment(&alice).unwrap())
                .collect();
            let expected: Vec<u64> = (base..base + count as u64).collect();
            prop_assert_eq!(nonces, expected);
        }

        #[test]
        fn prop_users_do_not_interfere(calls in proptest::collection::vec(0u8..3, 1..100)) {
            let users: Vec<TestUser> = (1..=3).map(user).collect();
            let mut tracker = NonceTracker::new();
            for u in &users {
                tracker.set_nonce(u.address(), 0);
            }
            let mut expected = [0u64; 3];
            for index in calls {
                let nonce = tracker.get_nonce_then_increment(&users[index as usize]).unwrap();
                prop_assert_eq!(nonce, expected[index as usize]);
                expected[index as usize] += 1;
            }
        }
    }
}
