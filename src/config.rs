//! Command-line and environment configuration for the relay binary.
//!
//! Every flag falls back to an environment variable, and a `.env` file in the working
//! directory is loaded first when present.

// std
use std::{net::SocketAddr, path::PathBuf};
// crates.io
use clap::Parser;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	broker::{BrokerConfig, DEFAULT_SCOPES},
	error::ConfigError,
	provider::ProviderDescriptor,
	store::{CredentialStore, FileStore, MemoryStore},
};

/// OAuth token broker and mail relay.
#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// OAuth client identifier.
	#[arg(long, env = "CLIENT_ID")]
	pub client_id: String,
	/// OAuth client secret.
	#[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
	pub client_secret: String,
	/// Redirect URI registered with the provider; must route to `/oauth2callback`.
	#[arg(long, env = "REDIRECT_URI")]
	pub redirect_uri: Url,
	/// Address the HTTP server listens on.
	#[arg(long, env = "RELAY_LISTEN", default_value = "0.0.0.0:8787")]
	pub listen: SocketAddr,
	/// JSON file used to persist credentials; kept in memory when unset.
	#[arg(long, env = "RELAY_STORE_PATH")]
	pub store_path: Option<PathBuf>,
	/// Lifetime of cached access tokens, in seconds.
	#[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = 3500)]
	pub access_token_ttl_secs: u32,
	/// Space-separated scopes requested on the consent screen.
	#[arg(long, env = "RELAY_SCOPES", value_delimiter = ' ')]
	pub scopes: Vec<String>,
	/// Mail source label used when a request omits one.
	#[arg(long, env = "DEFAULT_SOURCE", default_value = BrokerConfig::DEFAULT_SOURCE)]
	pub default_source: String,
	/// Send a PKCE challenge and keep the verifier until the callback.
	#[arg(long, env = "RELAY_PKCE")]
	pub pkce: bool,
	/// Default log filter, overridden by `RUST_LOG`.
	#[arg(long, env = "LOG_LEVEL", default_value = "info")]
	pub log_level: String,
}
impl Config {
	/// Loads `.env` (if any) and parses arguments plus environment.
	pub fn load() -> Self {
		dotenvy::dotenv().ok();

		Self::parse()
	}

	/// Broker configuration derived from the flags.
	pub fn broker_config(&self) -> Result<BrokerConfig> {
		let scope = if self.scopes.iter().all(|scope| scope.is_empty()) {
			ScopeSet::new(DEFAULT_SCOPES)
		} else {
			ScopeSet::new(self.scopes.iter().filter(|scope| !scope.is_empty()).cloned())
		}
		.map_err(ConfigError::from)?;

		Ok(BrokerConfig::new(&self.client_id, self.redirect_uri.clone(), scope)
			.with_client_secret(&self.client_secret)
			.with_access_ttl(Duration::seconds(self.access_token_ttl_secs.max(1).into()))
			.with_default_source(&self.default_source))
	}

	/// Google descriptor with the PKCE quirk applied.
	pub fn descriptor(&self) -> Result<ProviderDescriptor> {
		let mut descriptor = ProviderDescriptor::google().map_err(ConfigError::from)?;

		descriptor.quirks = descriptor.quirks.with_pkce(self.pkce);

		Ok(descriptor)
	}

	/// Opens the configured credential store.
	pub fn store(&self) -> Result<Arc<dyn CredentialStore>> {
		match &self.store_path {
			Some(path) => Ok(Arc::new(FileStore::open(path)?)),
			None => {
				tracing::warn!("No store path configured; credentials are lost on restart.");

				Ok(Arc::new(MemoryStore::default()))
			},
		}
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("listen", &self.listen)
			.field("store_path", &self.store_path)
			.field("access_token_ttl_secs", &self.access_token_ttl_secs)
			.field("scopes", &self.scopes)
			.field("default_source", &self.default_source)
			.field("pkce", &self.pkce)
			.field("log_level", &self.log_level)
			.finish()
	}
}
