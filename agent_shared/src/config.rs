use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::SharedError;

/// Number of records a credential search fetches when the caller does not ask for a specific amount.
pub const DEFAULT_SEARCH_PAGE_SIZE: usize = 20;

/// Prefix of the environment variables the configuration is read from, e.g. `KMS_BASE_URL`.
pub const ENVIRONMENT_PREFIX: &str = "KMS";

#[derive(Debug, Deserialize, Clone)]
pub struct KmsConfiguration {
    pub base_url: Url,
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

fn default_search_page_size() -> usize {
    DEFAULT_SEARCH_PAGE_SIZE
}

impl KmsConfiguration {
    /// Loads the configuration from an optional `kms-config` file and the `KMS_*` environment variables. A `.env`
    /// file in the working directory is read first.
    pub fn new() -> Result<Self, SharedError> {
        dotenvy::dotenv().ok();

        Self::from_environment(Environment::with_prefix(ENVIRONMENT_PREFIX))
    }

    pub fn from_environment(environment: Environment) -> Result<Self, SharedError> {
        info!("Loading KMS configuration ...");

        let config = Config::builder()
            .add_source(File::with_name("kms-config").required(false))
            .add_source(environment.try_parsing(true))
            .build()?;

        match config.get_string("base_url") {
            Ok(base_url) if !base_url.trim().is_empty() => {}
            _ => return Err(SharedError::MissingBaseUrl),
        }

        config
            .try_deserialize::<KmsConfiguration>()?
            .validate()
            .inspect(|config| {
                info!("KMS configuration loaded successfully");
                debug!("{:#?}", config);
            })
    }

    /// Rejects settings a search cursor could never make progress with.
    pub fn validate(self) -> Result<Self, SharedError> {
        if self.search_page_size == 0 {
            return Err(SharedError::InvalidSearchPageSize);
        }

        Ok(self)
    }
}
