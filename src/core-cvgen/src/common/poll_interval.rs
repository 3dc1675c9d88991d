use std::{num::ParseIntError, time::Duration};

/// Same as poll_interval but panics on error.
pub fn get_poll_interval(units: TimeUnit, env_var_name: &str, default: u64) -> Duration {
    poll_interval(units, env_var_name, default).unwrap_or_else(|e| panic!("{} must be a valid number: {}", env_var_name, e))
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn duration(&self, amount: u64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
        }
    }
}

/// Retrieves the value of the environment variable as a duration.
pub fn poll_interval(units: TimeUnit, env_var_name: &str, default: u64) -> Result<Duration, ParseIntError> {
    let amount = match std::env::var(env_var_name) {
        Ok(v) => v.trim().parse::<u64>()?,
        Err(_) => default,
    };
    Ok(units.duration(amount))
}
