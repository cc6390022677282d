// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how the consent URL is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Whether the broker sends a PKCE challenge and keeps the verifier until the callback.
	pub pkce_required: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Extra query parameters appended to the consent URL.
	pub authorize_params: BTreeMap<String, String>,
}
impl ProviderQuirks {
	/// Adds or replaces an extra consent URL parameter.
	pub fn with_authorize_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.authorize_params.insert(key.into(), value.into());

		self
	}

	/// Toggles the PKCE requirement.
	pub fn with_pkce(mut self, required: bool) -> Self {
		self.pkce_required = required;

		self
	}
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { pkce_required: false, scope_delimiter: ' ', authorize_params: BTreeMap::new() }
	}
}
