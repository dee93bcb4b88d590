//! Decorators wrapping a [Transport](crate::Transport)
//!
//! Each decorator owns the transport it wraps and implements [Transport](crate::Transport)
//! itself. The pipeline stacks them, outermost first:
//! chain id validation, gas price, gas limit, sender, gas multiplier, signing.

mod chain_id;
mod gas;
mod gas_multiplier;
mod gas_price;
mod sender;
mod signing;

pub use chain_id::ChainIdValidation;
pub use gas::{GasLimitDefaulting, GasLimitStrategy};
pub use gas_multiplier::GasMultiplier;
pub use gas_price::{GasPriceDefaulting, GasPriceStrategy};
pub use sender::{SenderDefaulting, SenderStrategy};
pub use signing::{Signing, UnknownSenderPolicy};

use crate::error::{ProviderError, ProviderResult};
use ethers::types::U256;
use rigging_primitives::constants::gas::MULTIPLIER_PRECISION;

/// Gas multipliers must be finite and positive at [MULTIPLIER_PRECISION]
pub(crate) fn validate_multiplier(multiplier: f64) -> ProviderResult<f64> {
    if multiplier.is_finite() && (multiplier * MULTIPLIER_PRECISION as f64).round() > 0.0 {
        Ok(multiplier)
    } else {
        Err(ProviderError::InvalidGasMultiplier { multiplier })
    }
}

/// Computes `ceil(value * multiplier)` in fixed-point arithmetic
///
/// The multiplier is rounded to [MULTIPLIER_PRECISION] and the product is checked, so a huge
/// estimate fails with [GasEstimationOverflow](ProviderError::GasEstimationOverflow) instead of
/// wrapping.
pub(crate) fn multiply_gas(value: U256, multiplier: f64) -> ProviderResult<U256> {
    let overflow = || ProviderError::GasEstimationOverflow { estimate: value, multiplier };

    let scaled = (validate_multiplier(multiplier)? * MULTIPLIER_PRECISION as f64).round();
    if scaled >= u128::MAX as f64 {
        return Err(overflow());
    }

    let product = value.checked_mul(U256::from(scaled as u128)).ok_or_else(overflow)?;
    let (quotient, remainder) = product.div_mod(U256::from(MULTIPLIER_PRECISION));
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::one()).ok_or_else(overflow)
    }
}
