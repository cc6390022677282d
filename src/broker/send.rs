//! Sending one HTML message as the signed-in user.

// self
use crate::{
	_prelude::*,
	broker::TokenBroker,
	mail::{self, MailMessage, SendRequest},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl TokenBroker {
	/// Sends `request` to the address of the user behind its session.
	///
	/// Input is validated before any network call. A session without a usable access token
	/// yields [`Error::Unauthenticated`]; error payloads from the user-info or send endpoints
	/// surface as [`Error::Provider`].
	pub async fn send_mail(&self, request: SendRequest) -> Result<()> {
		const KIND: FlowKind = FlowKind::Send;

		let span = FlowSpan::new(KIND, "send_mail");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let session = non_empty(request.session_id.as_deref())
					.ok_or_else(|| Error::invalid_request("session_id is missing"))?;
				let (Some(subject), Some(html)) =
					(non_empty(request.subject.as_deref()), non_empty(request.html.as_deref()))
				else {
					return Err(Error::invalid_request("subject or html is missing"));
				};
				let token =
					self.get_valid_access_token(session).await?.ok_or(Error::Unauthenticated)?;
				let address = mail::fetch_user_email(
					self.http_client(),
					&self.descriptor.endpoints.userinfo,
					&token,
				)
				.await?;
				let source = non_empty(request.source.as_deref())
					.unwrap_or(self.config.default_source.as_str());
				let raw = MailMessage { source, address: &address, subject, html }.encode();

				mail::send_raw(self.http_client(), &self.descriptor.endpoints.mail_send, &token, &raw)
					.await?;

				tracing::info!(session, source, "Sent message on behalf of session.");

				Ok(())
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|value| !value.is_empty())
}
