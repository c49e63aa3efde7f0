use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use arb_types::{Cycle, EvaluationError, Pool, Token};

/// Pricing parameters fixed at startup (§4.4.3 constants, made
/// configurable per §6 rather than hardcoded).
#[derive(Debug, Clone, Copy)]
pub struct PricingParams {
    /// `START_AMOUNT · 10^BASE_DECIMALS`, already scaled to base-currency
    /// wei units.
    pub start_amount_scaled: U256,
    /// Percent, e.g. `0.5` for a 0.5% fee.
    pub fee_percent: f64
}

/// The result of pricing one cycle: the signed profit in base-currency wei
/// (positive = arbitrage opportunity) and the human-readable path.
pub struct Priced {
    pub rate: f64,
    pub path_description: String
}

/// Prices `cycle` against the reserves in `pools`, per §4.4.3. Returns
/// `Err(EvaluationError::UnknownPool)` only when a step's pool is missing
/// from the Store entirely — in a correctly loaded catalog this cannot
/// happen, but the Evaluator silently skips the cycle (no event) rather
/// than panic, per §4.4.4. Zero reserves and zero swap denominators are not
/// errors: they degrade `x` to zero and the cycle still prices (and still
/// emits), per the unconditional-emission contract.
pub fn price_cycle(
    pools: &HashMap<Address, Pool>,
    tokens: impl Fn(Address) -> Token,
    cycle: &Cycle,
    base_symbol: &str,
    params: PricingParams
) -> Result<Priced, EvaluationError> {
    let mut x = params.start_amount_scaled;

    for step in &cycle.steps {
        let pool = pools.get(&step.lp).ok_or(EvaluationError::UnknownPool(step.lp))?;

        let (reserve_in, reserve_out, token_in, token_out) = if step.target == pool.token1 {
            (pool.reserve2, pool.reserve1, pool.token2, pool.token1)
        } else {
            (pool.reserve1, pool.reserve2, pool.token1, pool.token2)
        };

        if reserve_in.is_zero() || reserve_out.is_zero() {
            x = U256::ZERO;
            continue;
        }

        let decimals_in = tokens(token_in).decimals as u32;
        let decimals_out = tokens(token_out).decimals as u32;

        let x_scaled = rescale(x, decimals_in, decimals_out);
        let reserve_in_scaled = rescale(reserve_in, decimals_in, decimals_out);

        let x_fee = apply_fee(x_scaled, params.fee_percent);

        let denominator = reserve_in_scaled + x_fee;
        x = if denominator.is_zero() { U256::ZERO } else { (x_fee * reserve_out) / denominator };
    }

    let rate = signed_rate(x, params.start_amount_scaled);
    let path_description = describe_path(base_symbol, cycle, &tokens);

    Ok(Priced { rate, path_description })
}

fn rescale(value: U256, decimals_from: u32, decimals_to: u32) -> U256 {
    if decimals_to >= decimals_from {
        value * pow10(decimals_to - decimals_from)
    } else {
        value / pow10(decimals_from - decimals_to)
    }
}

fn pow10(exponent: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exponent))
}

/// Applies the per-hop fee through floating point, per §9's design note:
/// preserved for behavioral compatibility with the reference
/// implementation's known small non-monotonicity, rather than replaced
/// with pure-integer `(x * (10000 - fee_bps)) / 10000`.
fn apply_fee(x: U256, fee_percent: f64) -> U256 {
    let x_float: f64 = x.to_string().parse().unwrap_or(0.0);
    let multiplier = 1.0 - (fee_percent / 100.0);
    let fee_applied = (x_float * multiplier).floor();

    if !fee_applied.is_finite() || fee_applied <= 0.0 {
        return U256::ZERO;
    }
    format!("{fee_applied:.0}").parse().unwrap_or(U256::ZERO)
}

fn signed_rate(final_amount: U256, start_amount_scaled: U256) -> f64 {
    const BASE_SCALE: f64 = 1e18;
    if final_amount >= start_amount_scaled {
        let profit: f64 = (final_amount - start_amount_scaled).to_string().parse().unwrap_or(0.0);
        profit / BASE_SCALE
    } else {
        let loss: f64 = (start_amount_scaled - final_amount).to_string().parse().unwrap_or(0.0);
        -(loss / BASE_SCALE)
    }
}

fn describe_path(base_symbol: &str, cycle: &Cycle, tokens: &impl Fn(Address) -> Token) -> String {
    let mut parts = vec![base_symbol.to_string()];
    parts.extend(cycle.steps.iter().map(|step| tokens(step.target).symbol));
    parts.join(" -> ")
}

#[cfg(test)]
mod tests {
    use arb_types::{RouteStep, UNKNOWN_SYMBOL};

    use super::*;

    fn addr(byte: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = byte;
        Address::from(bytes)
    }

    fn token(address: Address, symbol: &str, decimals: u8) -> Token {
        Token { address, symbol: symbol.to_string(), name: symbol.to_string(), decimals }
    }

    fn params(fee_percent: f64) -> PricingParams {
        PricingParams { start_amount_scaled: U256::from(10u64).pow(U256::from(18u64)), fee_percent }
    }

    #[test]
    fn zero_reserve_degrades_to_zero_and_still_prices() {
        let weth = addr(1);
        let dai = addr(2);
        let lp = addr(3);
        let mut pools = HashMap::new();
        pools.insert(lp, Pool::new(lp, weth, dai)); // reserves default to 0

        let cycle =
            Cycle { id: 1, steps: vec![RouteStep { target: dai, lp }, RouteStep { target: weth, lp }] };

        let tokens = move |a: Address| {
            if a == weth { token(weth, "WETH", 18) } else { token(dai, "DAI", 18) }
        };

        let priced = price_cycle(&pools, tokens, &cycle, "WETH", params(0.5)).unwrap();
        assert_eq!(priced.rate, -1.0);
        assert_eq!(priced.path_description, "WETH -> DAI -> WETH");
    }

    #[test]
    fn symmetric_round_trip_through_one_pool_nets_to_about_zero() {
        // WETH -> DAI -> WETH through the same pool both ways, reserves
        // symmetric and large relative to the 1 WETH input so integer
        // truncation stays negligible.
        let weth = addr(1);
        let dai = addr(2);
        let lp = addr(3);
        let reserve = U256::from(1_000_000u64) * pow10(18);
        let mut pool = Pool::new(lp, weth, dai);
        pool.set_reserves(reserve, reserve);
        let mut pools = HashMap::new();
        pools.insert(lp, pool);

        let cycle =
            Cycle { id: 1, steps: vec![RouteStep { target: dai, lp }, RouteStep { target: weth, lp }] };
        let tokens = move |a: Address| {
            if a == weth { token(weth, "WETH", 18) } else { token(dai, "DAI", 18) }
        };

        let no_fee = price_cycle(&pools, tokens, &cycle, "WETH", params(0.0)).unwrap();
        assert!(no_fee.rate.abs() < 1e-6, "round trip at zero fee should be ~0, got {}", no_fee.rate);

        let with_fee = price_cycle(&pools, tokens, &cycle, "WETH", params(0.5)).unwrap();
        assert!(with_fee.rate < 0.0, "round trip with a fee must lose value, got {}", with_fee.rate);
    }

    #[test]
    fn unknown_pool_is_skipped_with_no_event() {
        let weth = addr(1);
        let dai = addr(2);
        let lp = addr(3);
        let pools: HashMap<Address, Pool> = HashMap::new(); // lp missing entirely

        let cycle = Cycle { id: 1, steps: vec![RouteStep { target: dai, lp }] };
        let tokens = move |a: Address| Token::unknown(a);

        let err = price_cycle(&pools, tokens, &cycle, "WETH", params(0.5)).unwrap_err();
        assert_eq!(err, EvaluationError::UnknownPool(lp));
    }

    #[test]
    fn equal_decimals_apply_no_scaling_factor() {
        let weth = addr(1);
        let dai = addr(2);
        let lp = addr(3);
        let mut pool = Pool::new(lp, weth, dai);
        pool.set_reserves(U256::from(1_000_000u64), U256::from(1_000_000u64));
        let mut pools = HashMap::new();
        pools.insert(lp, pool);

        let cycle = Cycle { id: 1, steps: vec![RouteStep { target: dai, lp }] };
        let tokens = move |a: Address| {
            if a == weth { token(weth, "WETH", 18) } else { token(dai, "DAI", 18) }
        };

        // Fee-free swap of an amount tiny relative to reserves approximates
        // the no-fee constant-product ratio (reserve_out/reserve_in ~= 1).
        let priced = price_cycle(&pools, tokens, &cycle, "WETH", params(0.0)).unwrap();
        assert!(priced.rate.is_finite());
    }

    #[test]
    fn decimals_asymmetry_matches_worked_example() {
        // Pool (WETH[18], USDC[6]), reserve1 = 10 WETH, reserve2 = 20000 USDC,
        // input 1 WETH, no fee: floor(20000e6 / 11) = 1_818_181_818.
        let weth = addr(1);
        let usdc = addr(2);
        let lp = addr(3);
        let mut pool = Pool::new(lp, weth, usdc);
        pool.set_reserves(U256::from(10u64) * pow10(18), U256::from(20_000u64) * pow10(6));
        let mut pools = HashMap::new();
        pools.insert(lp, pool);

        let cycle = Cycle { id: 1, steps: vec![RouteStep { target: usdc, lp }] };
        let tokens = move |a: Address| {
            if a == weth { token(weth, "WETH", 18) } else { token(usdc, "USDC", 6) }
        };

        let params = PricingParams { start_amount_scaled: pow10(18), fee_percent: 0.0 };
        let priced = price_cycle(&pools, tokens, &cycle, "WETH", params).unwrap();

        // final_amount is in USDC's 6-decimal scale; the published rate is
        // (final - start)/1e18, so recover the raw hop output for the
        // assertion instead of comparing the rate directly.
        let expected_output = U256::from(1_818_181_818u64);
        let expected_rate = signed_rate(expected_output, pow10(18));
        assert_eq!(priced.rate, expected_rate);
    }

    #[test]
    fn unknown_token_renders_with_placeholder_symbol() {
        let weth = addr(1);
        let unknown = addr(9);
        let lp = addr(3);
        let mut pool = Pool::new(lp, weth, unknown);
        pool.set_reserves(U256::from(1u64), U256::from(1u64));
        let mut pools = HashMap::new();
        pools.insert(lp, pool);

        let cycle = Cycle { id: 1, steps: vec![RouteStep { target: unknown, lp }] };
        let tokens = move |a: Address| if a == weth { token(weth, "WETH", 18) } else { Token::unknown(a) };

        let priced = price_cycle(&pools, tokens, &cycle, "WETH", params(0.5)).unwrap();
        assert_eq!(priced.path_description, format!("WETH -> {UNKNOWN_SYMBOL}"));
    }
}
