mod amount;
mod helpers;

pub mod op;

pub use amount::{Amount, AmountConversionError, CURRENCY_SYMBOL};
pub use helpers::{env_duration_millis, env_duration_secs, env_number};
