//! Cache-or-refresh lookup of a session's access token.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSecret},
	broker::TokenBroker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialStore, StoreKey},
};

impl TokenBroker {
	/// Returns a usable access token for `session`, refreshing it when the cached one is gone.
	///
	/// - A cached access token is returned without contacting the provider.
	/// - Otherwise, if a refresh token is stored, exactly one refresh call is made and the new
	///   access token is cached with the configured TTL.
	/// - Without a refresh token, or when the provider rejects the refresh, `None` is returned.
	///
	/// Transport and storage failures propagate. Concurrent callers may both refresh; the last
	/// write wins.
	pub async fn get_valid_access_token(&self, session: &str) -> Result<Option<TokenSecret>> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "get_valid_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let session = SessionId::new(session)?;

				self.refresh_metrics.record_attempt();

				if let Some(access) = self.store.get(&StoreKey::access(&session)).await? {
					self.refresh_metrics.record_cache_hit();

					return Ok(Some(access));
				}

				let Some(refresh_token) = self.store.get(&StoreKey::refresh(&session)).await?
				else {
					tracing::debug!(%session, "No refresh token stored for session.");

					return Ok(None);
				};
				let grant = match self.token_endpoint.refresh(&refresh_token).await {
					Ok(grant) => grant,
					Err(Error::Provider { detail, .. }) => {
						self.refresh_metrics.record_failure();
						tracing::warn!(%session, detail = %detail, "Provider rejected the refresh token.");

						return Ok(None);
					},
					Err(err) => {
						self.refresh_metrics.record_failure();

						return Err(err);
					},
				};
				let Some(access) = grant.access_token else {
					self.refresh_metrics.record_failure();
					tracing::warn!(%session, "Refresh response did not include an access token.");

					return Ok(None);
				};

				self.store
					.put(&StoreKey::access(&session), access.clone(), Some(self.config.access_ttl))
					.await
					.inspect_err(|_| self.refresh_metrics.record_failure())?;
				self.refresh_metrics.record_refresh();

				Ok(Some(access))
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
