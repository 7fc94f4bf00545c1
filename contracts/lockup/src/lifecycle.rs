//! Lock lifecycle: `Locked -> Unlocking -> released`, or `Locked|Unlocking ->
//! released` when forced.
//!
//! This is the only module that writes both lock records and their index
//! entries. Every operation runs all of its checks before its first write.

use cosmwasm_std::{Addr, BankMsg, Coin, Storage, Timestamp};

use crate::coins::validate_coins;
use crate::error::ContractError;
use crate::escrow::Escrow;
use crate::refs::{
    add_lock_ref, cancel, delete_lock_ref, get_lock_refs, lock_ref_keys, peek_due, pop_due,
    schedule_at, RefKey,
};
use crate::state::{
    add_locked_totals, load_lock, next_lock_id, remove_lock, save_lock, sub_locked_totals,
    LockStatus, PeriodLock, CONFIG, LOCKS,
};

/// A released lock and the transfer returning its coins.
#[derive(Clone, Debug, PartialEq)]
pub struct Release {
    pub lock: PeriodLock,
    pub transfer: BankMsg,
}

fn end_time(now: Timestamp, duration: u64) -> Option<Timestamp> {
    duration
        .checked_mul(1_000_000_000)
        .and_then(|nanos| now.nanos().checked_add(nanos))
        .map(Timestamp::from_nanos)
}

pub fn create_lock(
    store: &mut dyn Storage,
    escrow: &mut Escrow,
    owner: Addr,
    coins: Vec<Coin>,
    duration: u64,
    now: Timestamp,
) -> Result<PeriodLock, ContractError> {
    let coins = validate_coins(coins)?;

    let config = CONFIG.load(store)?;
    if duration > config.max_lock_duration {
        return Err(ContractError::invalid_input(format!(
            "duration {}s exceeds max {}s",
            duration, config.max_lock_duration
        )));
    }
    if end_time(now, duration).is_none() {
        return Err(ContractError::invalid_input("duration overflows block time"));
    }

    let keys = lock_ref_keys(&owner, &coins)?;
    escrow.deposit(store, &coins)?;

    let lock = PeriodLock {
        id: next_lock_id(store)?,
        owner,
        create_time: now,
        duration,
        status: LockStatus::Locked,
        end_time: None,
        coins,
    };
    save_lock(store, &lock)?;
    for key in keys {
        add_lock_ref(store, &key, lock.id)?;
    }
    add_locked_totals(store, &lock.coins)?;

    Ok(lock)
}

pub fn begin_unlock(
    store: &mut dyn Storage,
    id: u64,
    sender: &Addr,
    now: Timestamp,
) -> Result<PeriodLock, ContractError> {
    let lock = load_lock(store, id)?;
    if lock.owner != *sender {
        return Err(ContractError::Unauthorized {});
    }
    start_unlocking(store, lock, now)
}

fn start_unlocking(
    store: &mut dyn Storage,
    mut lock: PeriodLock,
    now: Timestamp,
) -> Result<PeriodLock, ContractError> {
    if !lock.is_locked() {
        return Err(ContractError::AlreadyUnlocking { id: lock.id });
    }
    let end = end_time(now, lock.duration)
        .ok_or_else(|| ContractError::invalid_input("duration overflows block time"))?;

    lock.status = LockStatus::Unlocking;
    lock.end_time = Some(end);
    save_lock(store, &lock)?;
    schedule_at(store, end, lock.id)?;

    Ok(lock)
}

/// Starts unlocking every `Locked` lock of `owner`, in owner index order.
pub fn begin_unlock_all(
    store: &mut dyn Storage,
    owner: &Addr,
    now: Timestamp,
) -> Result<Vec<PeriodLock>, ContractError> {
    let mut pending = Vec::new();
    for id in get_lock_refs(store, &RefKey::Owner(owner).to_bytes()?)? {
        let lock = load_indexed(store, id)?;
        if lock.is_locked() {
            if end_time(now, lock.duration).is_none() {
                return Err(ContractError::invalid_input("duration overflows block time"));
            }
            pending.push(lock);
        }
    }

    pending
        .into_iter()
        .map(|lock| start_unlocking(store, lock, now))
        .collect()
}

/// Releases a lock before maturity. `sender` is checked against the owner
/// unless the release comes from a privileged caller.
pub fn force_unlock(
    store: &mut dyn Storage,
    escrow: &mut Escrow,
    id: u64,
    sender: Option<&Addr>,
) -> Result<Release, ContractError> {
    let lock = load_lock(store, id)?;
    if let Some(sender) = sender {
        if lock.owner != *sender {
            return Err(ContractError::Unauthorized {});
        }
    }

    let transfer = escrow.release(&lock.owner, &lock.coins)?;
    purge_lock(store, &lock)?;

    Ok(released(lock, transfer))
}

/// Releases every lock matured at `now`, ascending by end time then by the
/// order they started unlocking.
pub fn process_matured_locks(
    store: &mut dyn Storage,
    escrow: &mut Escrow,
    now: Timestamp,
) -> Result<Vec<Release>, ContractError> {
    let mut releases = Vec::new();
    for id in peek_due(store, now)? {
        let lock = load_indexed(store, id)?;
        if !lock.is_unlockable(now) {
            return Err(ContractError::invariant(format!(
                "lock {} queued before maturity",
                id
            )));
        }
        let transfer = escrow.release(&lock.owner, &lock.coins)?;
        releases.push(released(lock, transfer));
    }

    pop_due(store, now)?;
    for release in &releases {
        purge_lock(store, &release.lock)?;
    }
    Ok(releases)
}

/// Removes a lock record together with every index entry pointing at it.
fn purge_lock(store: &mut dyn Storage, lock: &PeriodLock) -> Result<(), ContractError> {
    let keys = lock_ref_keys(&lock.owner, &lock.coins)?;
    sub_locked_totals(store, &lock.coins)?;
    for key in keys {
        delete_lock_ref(store, &key, lock.id)?;
    }
    if let Some(end) = lock.end_time {
        cancel(store, end, lock.id)?;
    }
    remove_lock(store, lock.id);
    Ok(())
}

fn released(mut lock: PeriodLock, transfer: BankMsg) -> Release {
    lock.status = LockStatus::Unlocked;
    Release { lock, transfer }
}

/// Loads a lock reached through an index; a dangling entry means corrupted state.
pub fn load_indexed(store: &dyn Storage, id: u64) -> Result<PeriodLock, ContractError> {
    LOCKS
        .may_load(store, id)?
        .ok_or_else(|| ContractError::invariant(format!("index references missing lock {}", id)))
}
