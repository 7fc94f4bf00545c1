use std::collections::BTreeMap;

use cosmwasm_std::{Addr, BankMsg, Coin, QuerierWrapper, Storage, Uint128};

use crate::error::ContractError;
use crate::state::LOCKED_TOTALS;

/// Bank custody of locked coins held by the contract.
///
/// Balances are queried once per denom and then tracked locally, so several
/// releases within one transition are checked against what is left after the
/// earlier ones.
pub struct Escrow<'a> {
    querier: QuerierWrapper<'a>,
    contract: Addr,
    available: BTreeMap<String, Uint128>,
}

impl<'a> Escrow<'a> {
    pub fn new(querier: QuerierWrapper<'a>, contract: Addr) -> Self {
        Escrow {
            querier,
            contract,
            available: BTreeMap::new(),
        }
    }

    fn available(&mut self, denom: &str) -> Result<Uint128, ContractError> {
        if let Some(amount) = self.available.get(denom) {
            return Ok(*amount);
        }
        let balance = self
            .querier
            .query_balance(self.contract.to_string(), denom.to_owned())
            .map_err(|err| ContractError::custody(format!("balance of {}: {}", denom, err)))?;
        self.available.insert(denom.to_owned(), balance.amount);
        Ok(balance.amount)
    }

    /// Confirms the deposit sent along with a lock message reached the contract,
    /// on top of the coins already held for open locks.
    pub fn deposit(&mut self, store: &dyn Storage, coins: &[Coin]) -> Result<(), ContractError> {
        for coin in coins {
            let locked = LOCKED_TOTALS
                .may_load(store, &coin.denom)?
                .unwrap_or_default();
            let required = locked
                .checked_add(coin.amount)
                .map_err(|_| ContractError::custody(format!("escrow overflow on {}", coin)))?;
            if self.available(&coin.denom)? < required {
                return Err(ContractError::custody(format!(
                    "escrow did not receive {}",
                    coin
                )));
            }
        }
        Ok(())
    }

    /// Reserves `coins` for `to` and returns the transfer to emit.
    pub fn release(&mut self, to: &Addr, coins: &[Coin]) -> Result<BankMsg, ContractError> {
        for coin in coins {
            let available = self.available(&coin.denom)?;
            let left = available.checked_sub(coin.amount).map_err(|_| {
                ContractError::custody(format!("escrow holds {}{}, need {}", available, coin.denom, coin))
            })?;
            self.available.insert(coin.denom.clone(), left);
        }
        Ok(BankMsg::Send {
            to_address: to.to_string(),
            amount: coins.to_vec(),
        })
    }
}
