use bitcoin::Amount;
use borsh::{BorshDeserialize, BorshSerialize};
use keystone_params::ChainParams;
use keystone_primitives::{KeyCategory, KeyId};
use tracing::debug;

use crate::{
    delta::StateDelta,
    errors::StateError,
    info::{AdminInfo, AspKeyInfo, ThreadTipInfo},
    keyset::{AspKeySet, KeySet},
    registry::ThreadRegistry,
    store::KeyStore,
};

/// Confirmed admin state at a given height.
///
/// Holds everything the engine needs to validate a transaction besides the
/// UTXO set and the chain parameters. Root keys are not part of it since they
/// never change after genesis.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AdminState {
    height: u64,
    registry: ThreadRegistry,
    keys: KeyStore,
    total_supply: u64,
}

impl AdminState {
    /// Builds the state at height 0 from the genesis lists in `params`.
    pub fn genesis(params: &ChainParams) -> Result<Self, StateError> {
        let asp = AspKeySet::with_keys(
            params.asp_base_key_id,
            params.genesis_asp_keys.iter().copied(),
        )?;
        let keys = KeyStore::new(
            KeySet::new(params.genesis_provision_keys.iter().copied()),
            KeySet::new(params.genesis_issue_keys.iter().copied()),
            KeySet::new(params.genesis_validate_keys.iter().copied()),
            asp,
        );

        Ok(Self {
            height: 0,
            registry: ThreadRegistry::new(&params.genesis_thread_tips),
            keys,
            total_supply: 0,
        })
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn total_supply(&self) -> Amount {
        Amount::from_sat(self.total_supply)
    }

    /// Marks one more block as confirmed.
    pub fn advance_height(&mut self) {
        self.height += 1;
    }

    /// Applies `delta` atomically: on error the state is unchanged.
    pub fn apply_delta(&mut self, delta: &StateDelta) -> Result<(), StateError> {
        let mut next = self.clone();

        if let Some(adv) = &delta.tip_advance {
            next.registry.advance(adv.thread, adv.spent, adv.new)?;
        }
        for op in &delta.key_diffs {
            next.keys.apply(op)?;
        }
        next.total_supply = next
            .total_supply
            .checked_add_signed(delta.supply_delta)
            .ok_or(StateError::SupplyOutOfRange)?;

        debug!(
            height = next.height,
            key_diffs = delta.key_diffs.len(),
            supply_delta = delta.supply_delta,
            total_supply = next.total_supply,
            "applied state delta"
        );

        *self = next;
        Ok(())
    }

    pub fn admin_info(&self) -> AdminInfo {
        AdminInfo {
            height: self.height,
            threadtips: self
                .registry
                .iter()
                .map(|(thread, outpoint)| ThreadTipInfo { thread, outpoint })
                .collect(),
            provisionkeys: self.keys.keys(KeyCategory::Provision),
            issuekeys: self.keys.keys(KeyCategory::Issue),
            validatekeys: self.keys.keys(KeyCategory::Validate),
            aspkeys: self
                .keys
                .asp()
                .iter()
                .map(|(keyid, pubkey)| AspKeyInfo {
                    keyid,
                    pubkey: *pubkey,
                })
                .collect(),
            lastkeyid: self.keys.asp().last_key_id().unwrap_or(KeyId::new(0)),
            totalsupply: self.total_supply,
        }
    }
}
