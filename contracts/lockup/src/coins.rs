use cosmwasm_std::{Coin, StdError, StdResult};

use crate::error::ContractError;

/// Checks a coin set for locking and returns it sorted by denom.
pub fn validate_coins(coins: Vec<Coin>) -> Result<Vec<Coin>, ContractError> {
    if coins.is_empty() {
        return Err(ContractError::invalid_input("send some coins to lock"));
    }

    let mut coins = coins;
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    for (i, coin) in coins.iter().enumerate() {
        if coin.denom.is_empty() {
            return Err(ContractError::invalid_input("empty denom"));
        }
        if coin.amount.is_zero() {
            return Err(ContractError::invalid_input(format!(
                "zero amount of {}",
                coin.denom
            )));
        }
        if i > 0 && coins[i - 1].denom == coin.denom {
            return Err(ContractError::invalid_input(format!(
                "duplicate denom {}",
                coin.denom
            )));
        }
    }
    Ok(coins)
}

/// Running per-denom sum of coins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoinTotals {
    pub coins: Vec<Coin>,
}

impl CoinTotals {
    pub fn add_coins(&mut self, add: &[Coin]) -> StdResult<()> {
        for token in add {
            let index = self.coins.iter().position(|exist| exist.denom == token.denom);
            match index {
                Some(idx) => {
                    let exist = &mut self.coins[idx];
                    exist.amount = exist
                        .amount
                        .checked_add(token.amount)
                        .map_err(StdError::from)?;
                }
                None => self.coins.push(token.clone()),
            }
        }
        Ok(())
    }

    pub fn into_sorted(mut self) -> Vec<Coin> {
        self.coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        self.coins
    }
}

pub fn coins_to_string(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::{coin, coins};

    #[test]
    fn validate() {
        match validate_coins(vec![]) {
            Err(ContractError::InvalidInput { .. }) => {}
            _ => panic!("Must return InvalidInput error"),
        }
        match validate_coins(vec![coin(1, "uosmo"), coin(0, "uatom")]) {
            Err(ContractError::InvalidInput { .. }) => {}
            _ => panic!("Must return InvalidInput error"),
        }
        match validate_coins(vec![coin(1, "uosmo"), coin(2, "uosmo")]) {
            Err(ContractError::InvalidInput { .. }) => {}
            _ => panic!("Must return InvalidInput error"),
        }
        match validate_coins(coins(1, "")) {
            Err(ContractError::InvalidInput { .. }) => {}
            _ => panic!("Must return InvalidInput error"),
        }

        let res = validate_coins(vec![coin(1, "uosmo"), coin(2, "uatom")]).unwrap();
        assert_eq!(vec![coin(2, "uatom"), coin(1, "uosmo")], res);
    }

    #[test]
    fn totals() {
        let mut totals = CoinTotals::default();
        totals.add_coins(&[coin(5, "uosmo")]).unwrap();
        totals.add_coins(&[coin(1, "uatom"), coin(7, "uosmo")]).unwrap();
        assert_eq!(
            vec![coin(1, "uatom"), coin(12, "uosmo")],
            totals.into_sorted()
        );
        assert_eq!(
            "1uatom,12uosmo",
            coins_to_string(&[coin(1, "uatom"), coin(12, "uosmo")])
        );
    }

    #[test]
    fn totals_overflow() {
        let mut totals = CoinTotals::default();
        totals
            .add_coins(&[Coin::new(u128::MAX, "uosmo")])
            .unwrap();
        match totals.add_coins(&[coin(1, "uatom"), coin(1, "uosmo")]) {
            Err(StdError::Overflow { .. }) => {}
            _ => panic!("Must return Overflow error"),
        }
    }
}
