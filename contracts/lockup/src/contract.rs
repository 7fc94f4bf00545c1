#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    to_binary, Addr, Binary, Coin, Deps, DepsMut, Env, Event, MessageInfo, Order, Response,
    StdResult, Timestamp,
};

use crate::coins::{coins_to_string, CoinTotals};
use crate::error::ContractError;
use crate::escrow::Escrow;
use crate::lifecycle::{
    begin_unlock, begin_unlock_all, create_lock, force_unlock, process_matured_locks, Release,
};
use crate::msg::{
    CoinsResponse, ExecuteMsg, InstantiateMsg, LockIdsResponse, LockResponse, MaturingLock,
    MaturingLocksResponse, QueryMsg, SudoMsg,
};
use crate::refs::{get_lock_refs, scheduled_until, RefKey};
use crate::state::{Config, LockStatus, PeriodLock, CONFIG, LOCKED_TOTALS, LOCKS, NEXT_LOCK_ID};

use cw2::set_contract_version;

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:cw-lockup";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        owner: info.sender,
        max_lock_duration: msg.max_lock_duration,
    };
    CONFIG.save(deps.storage, &config)?;
    NEXT_LOCK_ID.save(deps.storage, &1)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("owner", config.owner)
        .add_attribute("max_lock_duration", config.max_lock_duration.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::LockTokens { duration } => try_lock_tokens(deps, env, info, duration),
        ExecuteMsg::BeginUnlocking { id } => try_begin_unlocking(deps, env, info, id),
        ExecuteMsg::BeginUnlockingAll {} => try_begin_unlocking_all(deps, env, info),
        ExecuteMsg::ForceUnlock { id } => try_force_unlock(deps, env, Some(&info.sender), id),
        ExecuteMsg::ProcessMaturedLocks {} => try_process_matured(deps, env),
        ExecuteMsg::UpdateConfig { max_lock_duration } => {
            try_update_config(deps, info, max_lock_duration)
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response, ContractError> {
    match msg {
        SudoMsg::ProcessMaturedLocks {} => try_process_matured(deps, env),
        SudoMsg::ForceUnlock { id } => try_force_unlock(deps, env, None, id),
    }
}

pub fn try_lock_tokens(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    duration: u64,
) -> Result<Response, ContractError> {
    let mut escrow = Escrow::new(deps.querier, env.contract.address);
    let lock = create_lock(
        deps.storage,
        &mut escrow,
        info.sender,
        info.funds,
        duration,
        env.block.time,
    )?;

    let res = Response::new()
        .add_attribute("action", "lock_tokens")
        .add_attribute("owner", &lock.owner)
        .add_attribute("lock_id", lock.id.to_string())
        .add_attribute("coins", coins_to_string(&lock.coins))
        .add_attribute("duration", lock.duration.to_string())
        .set_data(to_binary(&lock.id)?);
    Ok(res)
}

pub fn try_begin_unlocking(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    id: u64,
) -> Result<Response, ContractError> {
    let lock = begin_unlock(deps.storage, id, &info.sender, env.block.time)?;

    Ok(Response::new()
        .add_attribute("action", "begin_unlocking")
        .add_attribute("owner", info.sender)
        .add_event(unlocking_event(&lock)))
}

pub fn try_begin_unlocking_all(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let locks = begin_unlock_all(deps.storage, &info.sender, env.block.time)?;

    let res = Response::new()
        .add_attribute("action", "begin_unlocking_all")
        .add_attribute("owner", info.sender)
        .add_attribute("count", locks.len().to_string())
        .add_events(locks.iter().map(unlocking_event));
    Ok(res)
}

pub fn try_force_unlock(
    deps: DepsMut,
    env: Env,
    sender: Option<&Addr>,
    id: u64,
) -> Result<Response, ContractError> {
    let mut escrow = Escrow::new(deps.querier, env.contract.address);
    let release = force_unlock(deps.storage, &mut escrow, id, sender)?;

    let res = Response::new()
        .add_attribute("action", "force_unlock")
        .add_attribute("lock_id", id.to_string());
    Ok(add_releases(res, vec![release]))
}

pub fn try_process_matured(deps: DepsMut, env: Env) -> Result<Response, ContractError> {
    let mut escrow = Escrow::new(deps.querier, env.contract.address);
    let releases = process_matured_locks(deps.storage, &mut escrow, env.block.time)?;

    let res = Response::new()
        .add_attribute("action", "process_matured_locks")
        .add_attribute("released", releases.len().to_string());
    Ok(add_releases(res, releases))
}

pub fn try_update_config(
    deps: DepsMut,
    info: MessageInfo,
    max_lock_duration: u64,
) -> Result<Response, ContractError> {
    CONFIG.update(deps.storage, |mut config| -> Result<_, ContractError> {
        if info.sender != config.owner {
            return Err(ContractError::Unauthorized {});
        }
        config.max_lock_duration = max_lock_duration;
        Ok(config)
    })?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("max_lock_duration", max_lock_duration.to_string()))
}

fn unlocking_event(lock: &PeriodLock) -> Event {
    let end_time = lock.end_time.map(|t| t.to_string()).unwrap_or_default();
    Event::new("begin_unlock")
        .add_attribute("lock_id", lock.id.to_string())
        .add_attribute("owner", &lock.owner)
        .add_attribute("end_time", end_time)
}

/// Appends transfers and unlock events in release order.
fn add_releases(mut res: Response, releases: Vec<Release>) -> Response {
    for release in releases {
        let event = Event::new("unlock")
            .add_attribute("lock_id", release.lock.id.to_string())
            .add_attribute("owner", &release.lock.owner)
            .add_attribute("coins", coins_to_string(&release.lock.coins));
        res = res.add_message(release.transfer).add_event(event);
    }
    res
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::Lock { id } => to_binary(&query_lock(deps, id)?),
        QueryMsg::LocksByOwner { owner } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_binary(&query_refs(deps, RefKey::Owner(&owner))?)
        }
        QueryMsg::LocksByDenom { denom } => to_binary(&query_refs(deps, RefKey::Denom(&denom))?),
        QueryMsg::LocksByOwnerAndDenom { owner, denom } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_binary(&query_refs(deps, RefKey::OwnerDenom(&owner, &denom))?)
        }
        QueryMsg::AccountLockedCoins { owner } => {
            to_binary(&query_account_coins(deps, owner, |l| l.is_locked())?)
        }
        QueryMsg::AccountUnlockingCoins { owner } => {
            to_binary(&query_account_coins(deps, owner, |l| l.is_unlocking())?)
        }
        QueryMsg::AccountUnlockableCoins { owner } => {
            let now = env.block.time;
            to_binary(&query_account_coins(deps, owner, |l| l.is_unlockable(now))?)
        }
        QueryMsg::AccountLockedLongerDuration { owner, duration } => {
            to_binary(&query_locked_longer(deps, owner, duration)?)
        }
        QueryMsg::MaturingLocks { until } => {
            to_binary(&query_maturing(deps, until.unwrap_or(env.block.time))?)
        }
        QueryMsg::ModuleLockedAmount {} => to_binary(&query_module_locked(deps)?),
    }
}

fn query_lock(deps: Deps, id: u64) -> StdResult<LockResponse> {
    let lock = LOCKS.load(deps.storage, id)?;
    Ok(LockResponse { lock })
}

fn query_refs(deps: Deps, key: RefKey) -> StdResult<LockIdsResponse> {
    let ids = get_lock_refs(deps.storage, &key.to_bytes()?)?;
    Ok(LockIdsResponse { ids })
}

fn owner_locks(deps: Deps, owner: String) -> StdResult<Vec<PeriodLock>> {
    let owner = deps.api.addr_validate(&owner)?;
    get_lock_refs(deps.storage, &RefKey::Owner(&owner).to_bytes()?)?
        .into_iter()
        .map(|id| LOCKS.load(deps.storage, id))
        .collect()
}

fn query_account_coins<F>(deps: Deps, owner: String, filter: F) -> StdResult<CoinsResponse>
where
    F: Fn(&PeriodLock) -> bool,
{
    let mut totals = CoinTotals::default();
    for lock in owner_locks(deps, owner)?.iter().filter(|l| filter(l)) {
        totals.add_coins(&lock.coins)?;
    }
    Ok(CoinsResponse {
        coins: totals.into_sorted(),
    })
}

fn query_locked_longer(deps: Deps, owner: String, duration: u64) -> StdResult<LockIdsResponse> {
    let ids = owner_locks(deps, owner)?
        .into_iter()
        .filter(|l| l.status == LockStatus::Locked && l.duration >= duration)
        .map(|l| l.id)
        .collect();
    Ok(LockIdsResponse { ids })
}

fn query_maturing(deps: Deps, until: Timestamp) -> StdResult<MaturingLocksResponse> {
    let locks = scheduled_until(deps.storage, until)?
        .into_iter()
        .map(|(end_time, id)| MaturingLock { id, end_time })
        .collect();
    Ok(MaturingLocksResponse { locks })
}

fn query_module_locked(deps: Deps) -> StdResult<CoinsResponse> {
    let coins: StdResult<Vec<_>> = LOCKED_TOTALS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            let (denom, amount) = item?;
            Ok(Coin { denom, amount })
        })
        .collect();
    Ok(CoinsResponse { coins: coins? })
}
