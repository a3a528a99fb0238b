use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;

use alloy::primitives::utils::{format_units, ParseUnits};
use alloy::primitives::{Address, I256, U256};

use super::market::Market;

/// Markets grouped by the token they trade against the base asset.
///
/// A `BTreeMap` keeps the evaluation order, and with it tie order, stable.
pub type MarketsByToken = BTreeMap<Address, Vec<Arc<dyn Market>>>;

/// A candidate crossing: `(sell_to, buy_from)`
pub type CrossedPair = (Arc<dyn Market>, Arc<dyn Market>);

/// A profitable buy-here/sell-there crossing for one token.
///
/// `profit` is what selling `buy_from`'s output on `sell_to` returns on top of
/// `volume`, both in base-asset wei.
#[derive(Debug, Clone)]
pub struct Opportunity {
    /// Net base-asset gain at `volume`, can be negative while searching
    pub profit: I256,
    /// Base asset spent on `buy_from`
    pub volume: U256,
    /// The token bought and sold
    pub token: Address,
    /// Market the token is bought from
    pub buy_from: Arc<dyn Market>,
    /// Market the token is sold to
    pub sell_to: Arc<dyn Market>,
}

impl Opportunity {
    /// Profit as an unsigned amount, zero when not positive
    #[must_use]
    pub fn profit_wei(&self) -> U256 {
        if self.profit.is_positive() {
            self.profit.into_raw()
        } else {
            U256::ZERO
        }
    }
}

impl Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [buy0, buy1] = self.buy_from.tokens();
        let [sell0, sell1] = self.sell_to.tokens();
        writeln!(
            f,
            "Profit: {} Volume: {}",
            to_decimal(self.profit),
            to_decimal(self.volume)
        )?;
        writeln!(
            f,
            "{} ({})",
            self.buy_from.protocol(),
            self.buy_from.address()
        )?;
        writeln!(f, "  {buy0} => {buy1}")?;
        writeln!(
            f,
            "{} ({})",
            self.sell_to.protocol(),
            self.sell_to.address()
        )?;
        write!(f, "  {sell0} => {sell1}")
    }
}

/// Formats an 18-decimals amount as a decimal string
#[must_use]
pub fn to_decimal<T: Into<ParseUnits> + Copy + Display>(value: T) -> String {
    format_units(value, "ether").unwrap_or_else(|_| value.to_string())
}
