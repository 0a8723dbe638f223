use {
    serde::Deserialize,
    serde_with::serde_as,
    std::{num::NonZeroUsize, path::Path, time::Duration},
};

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// The URL of the JSON-RPC node to synchronize against.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub node_url: reqwest::Url,

    /// Upper bound on concurrently issued RPC calls while cascading fetches.
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: NonZeroUsize,

    /// Display symbol of the base currency, listed as a pseudo-token.
    #[serde(default)]
    pub native_symbol: Option<String>,

    /// How often the binary re-polls tracked transactions.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_concurrent_requests() -> NonZeroUsize {
    NonZeroUsize::new(8).unwrap()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(15)
}

/// Load the wallet configuration from a TOML file.
///
/// # Panics
///
/// This method panics if the config is invalid or on I/O errors.
pub async fn load(path: &Path) -> Config {
    let data = tokio::fs::read_to_string(path)
        .await
        .unwrap_or_else(|err| panic!("I/O error while reading {path:?}: {err:?}"));
    toml::de::from_str(&data)
        .unwrap_or_else(|err| panic!("TOML syntax error while reading {path:?}: {err:?}"))
}
