use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Coin, Timestamp};

use crate::state::{Config, PeriodLock};

#[cw_serde]
pub struct InstantiateMsg {
    /// Max lock duration in seconds
    pub max_lock_duration: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Lock the sent funds. They can be withdrawn `duration` seconds after unlocking starts
    LockTokens { duration: u64 },
    /// Start the unlock period of a lock
    BeginUnlocking { id: u64 },
    /// Start the unlock period of every sender lock not already unlocking
    BeginUnlockingAll {},
    /// Release a lock right away, skipping the unlock period
    ForceUnlock { id: u64 },
    /// Release every matured lock. Anyone can call it
    ProcessMaturedLocks {},
    /// Only contract owner
    UpdateConfig { max_lock_duration: u64 },
}

#[cw_serde]
pub enum SudoMsg {
    /// Called by the chain every block
    ProcessMaturedLocks {},
    /// Governance release without owner check
    ForceUnlock { id: u64 },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    /// Returns the lock info
    #[returns(LockResponse)]
    Lock { id: u64 },
    /// Returns the lock ids by owner, in lock order
    #[returns(LockIdsResponse)]
    LocksByOwner { owner: String },
    #[returns(LockIdsResponse)]
    LocksByDenom { denom: String },
    #[returns(LockIdsResponse)]
    LocksByOwnerAndDenom { owner: String, denom: String },
    /// Coins of owner locks not unlocking yet
    #[returns(CoinsResponse)]
    AccountLockedCoins { owner: String },
    /// Coins of owner locks in the unlock period
    #[returns(CoinsResponse)]
    AccountUnlockingCoins { owner: String },
    /// Coins of owner locks matured at the current block time
    #[returns(CoinsResponse)]
    AccountUnlockableCoins { owner: String },
    /// Owner locks not unlocking with a duration of at least `duration` seconds
    #[returns(LockIdsResponse)]
    AccountLockedLongerDuration { owner: String, duration: u64 },
    /// Scheduled releases up to `until` (default: current block time)
    #[returns(MaturingLocksResponse)]
    MaturingLocks { until: Option<Timestamp> },
    /// Total coins held in locks
    #[returns(CoinsResponse)]
    ModuleLockedAmount {},
}

#[cw_serde]
pub struct LockResponse {
    pub lock: PeriodLock,
}

#[cw_serde]
pub struct LockIdsResponse {
    pub ids: Vec<u64>,
}

#[cw_serde]
pub struct CoinsResponse {
    pub coins: Vec<Coin>,
}

#[cw_serde]
pub struct MaturingLock {
    pub id: u64,
    pub end_time: Timestamp,
}

#[cw_serde]
pub struct MaturingLocksResponse {
    pub locks: Vec<MaturingLock>,
}
