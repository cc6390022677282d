// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

/// HTML message addressed from and to the signed-in user.
#[derive(Clone, Copy, Debug)]
pub struct MailMessage<'a> {
	/// Display name and subject prefix.
	pub source: &'a str,
	/// Address used for both `From` and `To`.
	pub address: &'a str,
	/// Subject line without the prefix.
	pub subject: &'a str,
	/// HTML body.
	pub html: &'a str,
}
impl MailMessage<'_> {
	/// Renders the message as `\n`-separated headers, a blank line, and the body.
	///
	/// Line breaks inside header values are folded into spaces so the body cannot add headers.
	pub fn render(&self) -> String {
		let source = single_line(self.source);
		let address = single_line(self.address);
		let subject = single_line(self.subject);

		[
			format!("From: \"{source}\" <{address}>"),
			format!("To: <{address}>"),
			format!("Subject: [{source}] {subject}"),
			"Content-Type: text/html; charset=utf-8".to_owned(),
			String::new(),
			self.html.to_owned(),
		]
		.join("\n")
	}

	/// Base64url (no padding) of the UTF-8 rendering, as the send endpoint expects in `raw`.
	pub fn encode(&self) -> String {
		URL_SAFE_NO_PAD.encode(self.render())
	}
}

fn single_line(value: &str) -> String {
	value.replace(['\r', '\n'], " ")
}
