pub mod db_env;
pub mod env_check;
pub mod health;
pub mod hostname;
pub mod logging;
pub mod max_concurrency;
pub mod poll_interval;

pub use db_env::{get_database_url, get_db_pool};
pub use env_check::check_non_empty_env_vars;
pub use health::{health_check, health_router};
pub use hostname::{HostPortError, get_api_base_url};
pub use logging::{setup_cli_logging, setup_logging};
pub use max_concurrency::get_max_concurrency;
pub use poll_interval::{TimeUnit, get_poll_interval, poll_interval};
