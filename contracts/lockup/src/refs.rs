//! Secondary indexes over the lock store.
//!
//! Every bucket holds lock ids in insertion order. Buckets are removed as soon
//! as they become empty, so the amount of stored index data always tracks the
//! number of live locks.

use std::convert::TryFrom;

use cosmwasm_std::{Addr, Coin, Order, StdError, StdResult, Storage, Timestamp};
use cw_storage_plus::{Bound, Map, PrimaryKey};

const OWNER_TAG: u8 = 0x01;
const DENOM_TAG: u8 = 0x02;
const OWNER_DENOM_TAG: u8 = 0x03;

/// Lock ids by tagged reference key.
const LOCK_REFS: Map<&[u8], Vec<u64>> = Map::new("lock_refs");
/// Lock ids by maturity time in nanoseconds.
const MATURITY_QUEUE: Map<u64, Vec<u64>> = Map::new("maturity_queue");

/// Selector of a reference bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefKey<'a> {
    Owner(&'a Addr),
    Denom(&'a str),
    OwnerDenom(&'a Addr, &'a str),
}

impl<'a> RefKey<'a> {
    /// Encodes the key as `tag | len(part) | part | ...` with 2-byte big endian
    /// lengths, so keys of different dimensions never share a prefix.
    pub fn to_bytes(&self) -> StdResult<Vec<u8>> {
        match self {
            RefKey::Owner(owner) => encode(OWNER_TAG, &[owner.as_bytes()]),
            RefKey::Denom(denom) => encode(DENOM_TAG, &[denom.as_bytes()]),
            RefKey::OwnerDenom(owner, denom) => {
                encode(OWNER_DENOM_TAG, &[owner.as_bytes(), denom.as_bytes()])
            }
        }
    }
}

fn encode(tag: u8, parts: &[&[u8]]) -> StdResult<Vec<u8>> {
    let size = parts.iter().map(|p| p.len() + 2).sum::<usize>() + 1;
    let mut key = Vec::with_capacity(size);
    key.push(tag);
    for part in parts {
        let len = u16::try_from(part.len())
            .map_err(|_| StdError::generic_err("reference key part too long"))?;
        key.extend_from_slice(&len.to_be_bytes());
        key.extend_from_slice(part);
    }
    Ok(key)
}

/// All reference keys a lock of `owner` holding `coins` is indexed under,
/// excluding the maturity queue.
pub fn lock_ref_keys(owner: &Addr, coins: &[Coin]) -> StdResult<Vec<Vec<u8>>> {
    let mut keys = Vec::with_capacity(1 + coins.len() * 2);
    keys.push(RefKey::Owner(owner).to_bytes()?);
    for coin in coins {
        keys.push(RefKey::Denom(&coin.denom).to_bytes()?);
        keys.push(RefKey::OwnerDenom(owner, &coin.denom).to_bytes()?);
    }
    Ok(keys)
}

fn push_ref<'a, K>(
    map: &Map<'a, K, Vec<u64>>,
    store: &mut dyn Storage,
    key: K,
    lock_id: u64,
) -> StdResult<()>
where
    K: PrimaryKey<'a>,
{
    map.update(store, key, |ids| -> StdResult<_> {
        let mut ids = ids.unwrap_or_default();
        ids.push(lock_id);
        Ok(ids)
    })?;
    Ok(())
}

fn pull_ref<'a, K>(
    map: &Map<'a, K, Vec<u64>>,
    store: &mut dyn Storage,
    key: K,
    lock_id: u64,
) -> StdResult<()>
where
    K: PrimaryKey<'a> + Clone,
{
    let mut ids = match map.may_load(store, key.clone())? {
        Some(ids) => ids,
        None => return Ok(()),
    };
    let pos = match ids.iter().position(|id| *id == lock_id) {
        Some(pos) => pos,
        None => return Ok(()),
    };
    ids.remove(pos);
    if ids.is_empty() {
        map.remove(store, key);
        Ok(())
    } else {
        map.save(store, key, &ids)
    }
}

/// Appends `lock_id` to the bucket at `key`. Callers never add the same pair twice.
pub fn add_lock_ref(store: &mut dyn Storage, key: &[u8], lock_id: u64) -> StdResult<()> {
    push_ref(&LOCK_REFS, store, key, lock_id)
}

/// Removes `lock_id` from the bucket at `key`. Missing pairs are ignored.
pub fn delete_lock_ref(store: &mut dyn Storage, key: &[u8], lock_id: u64) -> StdResult<()> {
    pull_ref(&LOCK_REFS, store, key, lock_id)
}

/// Snapshot of the bucket at `key`.
pub fn get_lock_refs(store: &dyn Storage, key: &[u8]) -> StdResult<Vec<u64>> {
    Ok(LOCK_REFS.may_load(store, key)?.unwrap_or_default())
}

pub fn schedule_at(store: &mut dyn Storage, time: Timestamp, lock_id: u64) -> StdResult<()> {
    push_ref(&MATURITY_QUEUE, store, time.nanos(), lock_id)
}

pub fn cancel(store: &mut dyn Storage, time: Timestamp, lock_id: u64) -> StdResult<()> {
    pull_ref(&MATURITY_QUEUE, store, time.nanos(), lock_id)
}

/// Buckets with time <= `now`, ascending by time.
fn due_buckets(store: &dyn Storage, now: Timestamp) -> StdResult<Vec<(u64, Vec<u64>)>> {
    MATURITY_QUEUE
        .range(
            store,
            None,
            Some(Bound::inclusive(now.nanos())),
            Order::Ascending,
        )
        .collect()
}

/// Lock ids due at `now`, ascending by time then insertion order.
pub fn peek_due(store: &dyn Storage, now: Timestamp) -> StdResult<Vec<u64>> {
    Ok(due_buckets(store, now)?
        .into_iter()
        .flat_map(|(_, ids)| ids)
        .collect())
}

/// Removes and returns every lock id due at `now`, in the order of `peek_due`.
pub fn pop_due(store: &mut dyn Storage, now: Timestamp) -> StdResult<Vec<u64>> {
    let buckets = due_buckets(store, now)?;
    let mut due = Vec::new();
    for (time, ids) in buckets {
        MATURITY_QUEUE.remove(store, time);
        due.extend(ids);
    }
    Ok(due)
}

/// (time, lock id) entries scheduled up to `until`.
pub fn scheduled_until(store: &dyn Storage, until: Timestamp) -> StdResult<Vec<(Timestamp, u64)>> {
    Ok(due_buckets(store, until)?
        .into_iter()
        .flat_map(|(time, ids)| {
            ids.into_iter()
                .map(move |id| (Timestamp::from_nanos(time), id))
        })
        .collect())
}
