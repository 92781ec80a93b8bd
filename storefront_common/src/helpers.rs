use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;

/// Reads a numeric environment variable. A missing variable is logged at `info` level, an unparseable one at `warn`
/// level, and in both cases `default` is returned.
pub fn env_number<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    <T as FromStr>::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name} ({s}). {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

/// Reads a duration, given in whole seconds, from the environment.
pub fn env_duration_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_number(name, default.as_secs()))
}

/// Reads a duration, given in milliseconds, from the environment.
pub fn env_duration_millis(name: &str, default: Duration) -> Duration {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(env_number(name, default_ms))
}
