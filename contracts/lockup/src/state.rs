use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    Addr, Coin, OverflowError, OverflowOperation, StdError, StdResult, Storage, Timestamp, Uint128,
};
use cw_storage_plus::{Item, Map};

use crate::error::ContractError;

#[cw_serde]
pub struct Config {
    pub owner: Addr,
    /// Max lock duration in seconds
    pub max_lock_duration: u64,
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum LockStatus {
    Locked,
    Unlocking,
    /// Only reported on released locks, never stored.
    Unlocked,
}

#[cw_serde]
pub struct PeriodLock {
    pub id: u64,
    pub owner: Addr,
    pub create_time: Timestamp,
    /// Lock duration in seconds
    pub duration: u64,
    pub status: LockStatus,
    /// Set once unlocking starts
    pub end_time: Option<Timestamp>,
    /// Escrowed coins, sorted by denom
    pub coins: Vec<Coin>,
}

impl PeriodLock {
    pub fn is_locked(&self) -> bool {
        self.status == LockStatus::Locked
    }

    pub fn is_unlocking(&self) -> bool {
        self.status == LockStatus::Unlocking
    }

    /// Whether the lock has matured at `now`.
    pub fn is_unlockable(&self, now: Timestamp) -> bool {
        match (self.status, self.end_time) {
            (LockStatus::Unlocking, Some(end)) => end <= now,
            _ => false,
        }
    }
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const NEXT_LOCK_ID: Item<u64> = Item::new("next_lock_id");
pub const LOCKS: Map<u64, PeriodLock> = Map::new("locks");
/// Total escrowed amount per denom
pub const LOCKED_TOTALS: Map<&str, Uint128> = Map::new("locked_totals");

/// Returns the next lock id and advances the sequence.
pub fn next_lock_id(store: &mut dyn Storage) -> StdResult<u64> {
    let id = NEXT_LOCK_ID.may_load(store)?.unwrap_or(1);
    let next = id.checked_add(1).ok_or_else(|| {
        StdError::overflow(OverflowError::new(OverflowOperation::Add, id, 1))
    })?;
    NEXT_LOCK_ID.save(store, &next)?;
    Ok(id)
}

pub fn peek_lock_id(store: &dyn Storage) -> StdResult<u64> {
    Ok(NEXT_LOCK_ID.may_load(store)?.unwrap_or(1))
}

pub fn load_lock(store: &dyn Storage, id: u64) -> Result<PeriodLock, ContractError> {
    LOCKS
        .may_load(store, id)?
        .ok_or(ContractError::NotFound { id })
}

pub fn save_lock(store: &mut dyn Storage, lock: &PeriodLock) -> StdResult<()> {
    LOCKS.save(store, lock.id, lock)
}

pub fn remove_lock(store: &mut dyn Storage, id: u64) {
    LOCKS.remove(store, id)
}

pub fn add_locked_totals(store: &mut dyn Storage, coins: &[Coin]) -> Result<(), ContractError> {
    for coin in coins {
        LOCKED_TOTALS.update(
            store,
            &coin.denom,
            |total| -> Result<_, ContractError> {
                Ok(total
                    .unwrap_or_default()
                    .checked_add(coin.amount)
                    .map_err(StdError::from)?)
            },
        )?;
    }
    Ok(())
}

pub fn sub_locked_totals(store: &mut dyn Storage, coins: &[Coin]) -> Result<(), ContractError> {
    for coin in coins {
        let total = LOCKED_TOTALS
            .may_load(store, &coin.denom)?
            .unwrap_or_default();
        let left = total.checked_sub(coin.amount).map_err(|_| {
            ContractError::invariant(format!("locked total of {} below release", coin.denom))
        })?;
        if left.is_zero() {
            LOCKED_TOTALS.remove(store, &coin.denom);
        } else {
            LOCKED_TOTALS.save(store, &coin.denom, &left)?;
        }
    }
    Ok(())
}
