use crate::error::StrategyError;
use rust_decimal::Decimal;

/// Everything needed to price one hedged pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitInputs {
    pub margin: Decimal,
    /// Leverage of the high-funding venue.
    pub leverage: Decimal,
    pub fr_high: Decimal,
    pub fr_low: Decimal,
    /// Fee rate of the high-funding venue, charged on both legs.
    pub fee_pct: Decimal,
    pub slippage_pct: Decimal,
    pub price_high: Decimal,
    pub price_low: Decimal,
}

/// The individual terms of the profit model, all in quote currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitBreakdown {
    pub nominal: Decimal,
    pub funding_income: Decimal,
    pub funding_cost: Decimal,
    pub fees: Decimal,
    pub slippage: Decimal,
    pub price_diff_loss: Decimal,
}

impl ProfitBreakdown {
    pub fn net_profit(&self) -> Decimal {
        self.funding_income - self.funding_cost - self.fees - self.slippage - self.price_diff_loss
    }
}

impl ProfitInputs {
    /// Splits the expected outcome into its terms.
    ///
    /// Funding is taken in absolute value on both sides, so the model credits the
    /// magnitude of the high rate and charges the magnitude of the low rate whatever
    /// their signs.
    pub fn breakdown(&self) -> Result<ProfitBreakdown, StrategyError> {
        if self.price_low <= Decimal::ZERO {
            return Err(StrategyError::InvalidPrice(self.price_low));
        }

        let two = Decimal::TWO;
        let nominal = self.margin * self.leverage;

        Ok(ProfitBreakdown {
            nominal,
            funding_income: nominal * self.fr_high.abs(),
            funding_cost: nominal * self.fr_low.abs(),
            fees: nominal * self.fee_pct * two,
            slippage: nominal * self.slippage_pct * two,
            price_diff_loss: nominal * (self.price_high - self.price_low).abs() / self.price_low,
        })
    }
}

/// Expected profit of opening and closing the pair once.
pub fn expected_net_profit(inputs: &ProfitInputs) -> Result<Decimal, StrategyError> {
    Ok(inputs.breakdown()?.net_profit())
}

/// True when `price_now` moved at most `threshold_pct` away from `price_start`.
/// A non-positive start price is never stable.
pub fn price_stable(price_start: Decimal, price_now: Decimal, threshold_pct: Decimal) -> bool {
    if price_start <= Decimal::ZERO {
        return false;
    }
    (price_now - price_start).abs() / price_start <= threshold_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ProfitInputs {
        ProfitInputs {
            margin: dec!(250),
            leverage: dec!(5),
            fr_high: dec!(0.01),
            fr_low: dec!(-0.005),
            fee_pct: dec!(0.0006),
            slippage_pct: dec!(0.001),
            price_high: dec!(101),
            price_low: dec!(100),
        }
    }

    #[test]
    fn profit_terms_match_the_worked_example() {
        let b = sample().breakdown().unwrap();

        assert_eq!(b.nominal, dec!(1250));
        assert_eq!(b.funding_income, dec!(12.5));
        assert_eq!(b.funding_cost, dec!(6.25));
        assert_eq!(b.fees, dec!(1.5));
        assert_eq!(b.slippage, dec!(2.5));
        assert_eq!(b.price_diff_loss, dec!(12.5));
        assert_eq!(expected_net_profit(&sample()).unwrap(), dec!(-10.25));
    }

    #[test]
    fn price_gap_is_symmetric() {
        let mut inputs = sample();
        inputs.price_high = dec!(99);

        assert_eq!(inputs.breakdown().unwrap().price_diff_loss, dec!(12.5));
    }

    #[test]
    fn equal_prices_and_wide_spread_are_profitable() {
        let inputs = ProfitInputs {
            fr_high: dec!(0.02),
            fr_low: dec!(0.001),
            price_high: dec!(100),
            ..sample()
        };
        // 25 - 1.25 - 1.5 - 2.5 - 0
        assert_eq!(expected_net_profit(&inputs).unwrap(), dec!(19.75));
    }

    #[test]
    fn non_positive_low_price_is_rejected() {
        let inputs = ProfitInputs {
            price_low: Decimal::ZERO,
            ..sample()
        };
        assert_eq!(
            expected_net_profit(&inputs),
            Err(StrategyError::InvalidPrice(Decimal::ZERO))
        );
    }

    #[test]
    fn stability_boundary_is_inclusive() {
        assert!(price_stable(dec!(100), dec!(100.3), dec!(0.003)));
        assert!(price_stable(dec!(100), dec!(99.7), dec!(0.003)));
        assert!(!price_stable(dec!(100), dec!(100.31), dec!(0.003)));
        assert!(price_stable(dec!(100), dec!(100), Decimal::ZERO));
    }

    #[test]
    fn zero_start_price_is_never_stable() {
        assert!(!price_stable(Decimal::ZERO, dec!(1), dec!(0.5)));
    }
}
