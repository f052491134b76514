//! Wires the KMS-backed credential holder, signature suites and admin routes into a host agent.

use std::sync::Arc;

use agent_api_rest::ExtState;
use agent_kms::KmsClient;
use agent_shared::{
    config::{KmsConfiguration, LogFormat},
    error::SharedError,
    profile::Profile,
    wallet::Wallet,
};
use agent_signing::KmsSuiteProvider;
use agent_vc_holder::KmsVcHolder;
use axum::Router;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub struct KmsPlugin {
    configuration: KmsConfiguration,
    kms: KmsClient,
}

impl KmsPlugin {
    /// Builds the plugin around one unscoped client for the configured KMS.
    pub fn setup(configuration: KmsConfiguration) -> anyhow::Result<Self> {
        let configuration = configuration.validate()?;

        if configuration.base_url.cannot_be_a_base() {
            return Err(SharedError::CannotBeABase(configuration.base_url).into());
        }

        info!("Setting up KMS plugin for {}", configuration.base_url);

        Ok(Self {
            kms: KmsClient::new(configuration.base_url.clone()),
            configuration,
        })
    }

    /// Loads the configuration from the environment and sets up the plugin.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::setup(KmsConfiguration::new()?)
    }

    pub fn configuration(&self) -> &KmsConfiguration {
        &self.configuration
    }

    pub fn kms(&self) -> &KmsClient {
        &self.kms
    }

    pub fn vc_holder(&self, profile: &Profile) -> KmsVcHolder {
        KmsVcHolder::with_page_size(profile, &self.kms, self.configuration.search_page_size)
    }

    pub fn suite_provider(&self) -> KmsSuiteProvider {
        KmsSuiteProvider::new(self.kms.clone())
    }

    /// The admin routes for `profile`, storing created DIDs in `wallet`.
    pub fn router(&self, profile: Profile, wallet: Arc<dyn Wallet>) -> Router {
        agent_api_rest::router(ExtState {
            kms: self.kms.clone(),
            profile,
            wallet,
        })
    }
}

/// Installs a global `tracing` subscriber filtered by `RUST_LOG` (default `info`). Does nothing when one is already
/// installed.
pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if let Err(err) = result {
        debug!("Tracing subscriber not installed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_kms::ProfileScope;
    use agent_shared::config::DEFAULT_SEARCH_PAGE_SIZE;

    fn configuration(base_url: &str) -> KmsConfiguration {
        KmsConfiguration {
            base_url: base_url.parse().unwrap(),
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn setup_builds_an_unscoped_client() {
        let plugin = KmsPlugin::setup(configuration("http://localhost:8000/kms")).unwrap();

        assert_eq!(plugin.kms().base_url().as_str(), "http://localhost:8000/kms");
        assert_eq!(plugin.kms().profile(), None);
    }

    #[test]
    fn setup_rejects_base_urls_without_a_path() {
        let result = KmsPlugin::setup(configuration("mailto:kms@example.org"));

        assert!(matches!(
            result.unwrap_err().downcast_ref::<SharedError>(),
            Some(SharedError::CannotBeABase(_))
        ));
    }

    #[test]
    fn setup_rejects_an_empty_search_page() {
        let result = KmsPlugin::setup(KmsConfiguration {
            search_page_size: 0,
            ..configuration("http://localhost:8000")
        });

        assert!(matches!(
            result.unwrap_err().downcast_ref::<SharedError>(),
            Some(SharedError::InvalidSearchPageSize)
        ));
    }

    #[test]
    fn vc_holder_is_scoped_to_the_wallet() {
        let plugin = KmsPlugin::setup(configuration("http://localhost:8000")).unwrap();

        let holder = plugin.vc_holder(&Profile::with_wallet_id("wallet-0001"));
        assert_eq!(holder.kms().profile(), Some("wallet-0001"));

        let holder = plugin.vc_holder(&Profile::default());
        assert_eq!(holder.kms().profile(), None);

        // The shared client stays unscoped.
        assert_eq!(plugin.kms().with_profile(ProfileScope::Inherit).profile(), None);
    }

    #[test]
    fn init_tracing_twice_is_harmless() {
        init_tracing(LogFormat::Text);
        init_tracing(LogFormat::Json);
    }
}
