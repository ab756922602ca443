use eyre::{Result, WrapErr};
use std::path::Path;
use tally_common::{ChainDescriptor, ProviderBuilder, RpcProvider};
use tally_config::Config;

/// Initializes a tracing Subscriber for logging
pub fn subscriber() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads a dotenv file, from the cwd and the project root, ignoring potential failure.
///
/// Variables already set in the environment take precedence.
pub fn load_dotenv() {
    let load = |p: &Path| {
        dotenvy::from_path(p.join(".env")).ok();
    };

    if let Ok(cwd) = std::env::current_dir() {
        load(&cwd);
    }
}

/// Disables terminal colours if either the terminal or the environment doesn't support them.
pub fn enable_paint() {
    let enable = yansi::Condition::os_support() && yansi::Condition::tty_and_color_live();
    yansi::whenever(yansi::Condition::cached(enable));
}

/// Returns a [`RpcProvider`] for the configured chain's primary endpoint.
pub fn get_provider(config: &Config) -> Result<RpcProvider> {
    get_provider_builder(config)?.build()
}

/// Returns a [`ProviderBuilder`] instantiated using [`Config`] values.
pub fn get_provider_builder(config: &Config) -> Result<ProviderBuilder> {
    let chain = ChainDescriptor::from_config(config)?;
    trace!(chain = chain.id(), url = %chain.primary_endpoint(), "using rpc endpoint");
    Ok(ProviderBuilder::from_chain(&chain)
        .timeout(config.request_timeout())
        .poll_interval(config.poll_interval()))
}

/// Loads the configuration, wrapping extraction errors with a hint.
pub fn load_config_with(provider: impl tally_config::figment::Provider) -> Result<Config> {
    Config::from_provider(Config::figment().merge(provider))
        .wrap_err("failed to load the tally configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_provider::Provider;
    use std::time::Duration;

    #[test]
    fn provider_follows_config() {
        let config = Config {
            rpc_url: "https://rpc.example.org".to_string(),
            poll_interval_ms: Some(1500),
            ..Default::default()
        };
        let provider = get_provider(&config).unwrap();
        assert_eq!(provider.client().poll_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn empty_rpc_url_is_an_error() {
        let config = Config { rpc_url: " ".to_string(), ..Default::default() };
        let err = get_provider(&config).unwrap_err();
        assert!(err.to_string().contains("invalid rpc endpoint"), "{err}");
    }
}
