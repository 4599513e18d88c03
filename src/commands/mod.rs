pub mod bundle;
pub mod fetch;
pub mod run;
pub mod status;
pub mod trigger;

use farmhand::config::FarmConfig;
use farmhand::farm::FarmClient;
use farmhand::{Error, Result};

pub type CmdResult<T> = Result<(T, i32)>;

const URL_ENV: &str = "FARMHAND_URL";
const TOKEN_ENV: &str = "FARMHAND_TOKEN";

/// Resolve the farm endpoint and credential from the environment. Values
/// are plumbed in from outside; nothing here prompts or refreshes tokens.
pub fn farm_config() -> Result<FarmConfig> {
    let base_url = std::env::var(URL_ENV)
        .map_err(|_| Error::validation_missing_argument(vec![URL_ENV.to_string()]))?;
    let token = std::env::var(TOKEN_ENV)
        .map_err(|_| Error::validation_missing_argument(vec![TOKEN_ENV.to_string()]))?;

    Ok(FarmConfig { base_url, token })
}

pub fn farm_client() -> Result<FarmClient> {
    FarmClient::new(farm_config()?)
}
