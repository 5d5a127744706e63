pub mod config;
pub mod event;
pub mod reminder;
pub mod status;
pub mod watch;

use finite_core::{Config, CountdownTarget};

/// The configured life countdown, or an error telling the user how to set one up.
pub(crate) fn life_target(config: &Config) -> Result<CountdownTarget, Box<dyn std::error::Error>> {
    config
        .life_target()?
        .ok_or_else(|| "no birth date configured (try: finite-cli config set life.birth_date 1990-01-31)".into())
}
