//! Relay binary: load configuration, build the broker, serve HTTP.

// crates.io
use oauth2_mail_relay::{
	broker::TokenBroker,
	config::Config,
	error::Result,
	obs,
	server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
	let config = Config::load();

	obs::init_subscriber(&config.log_level);

	tracing::info!(?config, "Starting relay.");

	let broker = TokenBroker::new(config.store()?, config.descriptor()?, config.broker_config()?)?;

	server::serve(config.listen, AppState::new(broker)).await
}
