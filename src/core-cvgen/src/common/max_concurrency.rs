use std::env::VarError;
use std::num::ParseIntError;

/// The default maximum concurrency value.
pub const DEFAULT: usize = 1000;

const ENV_VAR: &str = "WORKER_MAX_CONCURRENCY";

/// Same as max_concurrency but panics on an invalid value. A missing value falls back to the
/// override, then to `DEFAULT`.
pub fn get_max_concurrency(override_default: Option<usize>) -> usize {
    match max_concurrency() {
        Ok(v) => v,
        Err(MaxConcurrencyError::MissingEnvVar(_)) => override_default.unwrap_or(DEFAULT),
        Err(e) => panic!("{}", e),
    }
}

/// Retrieves the value of the environment variable as a usize for max concurrency.
/// Uses `usize` because the intended use of this value is in a semaphore, which requires a usize.
pub fn max_concurrency() -> Result<usize, MaxConcurrencyError> {
    parse_max_concurrency(&std::env::var(ENV_VAR)?)
}

fn parse_max_concurrency(value: &str) -> Result<usize, MaxConcurrencyError> {
    match value.trim().parse::<usize>()? {
        0 => Err(MaxConcurrencyError::NonPositive),
        n => Ok(n),
    }
}

#[derive(Debug)]
pub enum MaxConcurrencyError {
    ParseIntError(ParseIntError),
    NonPositive,
    MissingEnvVar(VarError),
}

impl std::error::Error for MaxConcurrencyError {}

impl From<ParseIntError> for MaxConcurrencyError {
    fn from(error: ParseIntError) -> Self {
        Self::ParseIntError(error)
    }
}

impl From<VarError> for MaxConcurrencyError {
    fn from(error: VarError) -> Self {
        Self::MissingEnvVar(error)
    }
}

impl std::fmt::Display for MaxConcurrencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::ParseIntError(e) => write!(f, "{} must be a valid positive number: {}", ENV_VAR, e),
            Self::NonPositive => write!(f, "{} must be a positive number", ENV_VAR),
            Self::MissingEnvVar(e) => write!(f, "Environment variable {} is missing: {}", ENV_VAR, e),
        }
    }
}
