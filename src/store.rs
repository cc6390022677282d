//! Key-value storage contract and built-in backends for per-session credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, SessionId, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend holding credentials with optional expiry.
///
/// Backends make no transactional promises: concurrent writers to the same key simply race
/// and the last write wins.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, treating expired entries as absent.
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<TokenSecret>>;

	/// Stores `value` under `key`, replacing any previous value.
	///
	/// A `ttl` makes the entry disappear once it elapses; `None` keeps it indefinitely.
	fn put<'a>(
		&'a self,
		key: &'a StoreKey,
		value: TokenSecret,
		ttl: Option<Duration>,
	) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The backend refused a non-positive TTL.
	#[error("TTL must be positive.")]
	NonPositiveTtl,
}

/// Unique key identifying one stored value: a session plus the slot kind.
///
/// Renders as `{session}_{kind}`, e.g. `abc123_refresh`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Session the value belongs to.
	pub session: SessionId,
	/// Slot within the session.
	pub kind: CredentialKind,
}
impl StoreKey {
	/// Builds a key for the provided session and slot.
	pub fn new(session: &SessionId, kind: CredentialKind) -> Self {
		Self { session: session.clone(), kind }
	}

	/// Key of the session's refresh token.
	pub fn refresh(session: &SessionId) -> Self {
		Self::new(session, CredentialKind::Refresh)
	}

	/// Key of the session's access token.
	pub fn access(session: &SessionId) -> Self {
		Self::new(session, CredentialKind::Access)
	}

	/// Key of the session's pending PKCE verifier.
	pub fn verifier(session: &SessionId) -> Self {
		Self::new(session, CredentialKind::Verifier)
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}_{}", self.session, self.kind)
	}
}

/// Stored value with its absolute expiry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct StoreEntry {
	pub(crate) value: TokenSecret,
	pub(crate) expires_at: Option<OffsetDateTime>,
}
impl StoreEntry {
	pub(crate) fn new(
		value: TokenSecret,
		ttl: Option<Duration>,
		now: OffsetDateTime,
	) -> Result<Self, StoreError> {
		let expires_at = match ttl {
			Some(ttl) if !ttl.is_positive() => return Err(StoreError::NonPositiveTtl),
			Some(ttl) => Some(now + ttl),
			None => None,
		};

		Ok(Self { value, expires_at })
	}

	pub(crate) fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|expires_at| instant < expires_at)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn session() -> SessionId {
		SessionId::new("abc123").expect("Session fixture should be valid.")
	}

	#[test]
	fn store_key_renders_session_and_kind() {
		assert_eq!(StoreKey::refresh(&session()).to_string(), "abc123_refresh");
		assert_eq!(StoreKey::access(&session()).to_string(), "abc123_access");
		assert_eq!(StoreKey::verifier(&session()).to_string(), "abc123_verifier");
		assert_ne!(StoreKey::refresh(&session()), StoreKey::access(&session()));
	}

	#[test]
	fn entry_expiry_boundaries() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let entry = StoreEntry::new(TokenSecret::new("a"), Some(Duration::seconds(3500)), now)
			.expect("Positive TTLs should be accepted.");

		assert!(entry.is_live_at(now));
		assert!(entry.is_live_at(macros::datetime!(2025-01-01 00:58:19 UTC)));
		assert!(!entry.is_live_at(macros::datetime!(2025-01-01 00:58:20 UTC)));

		let forever = StoreEntry::new(TokenSecret::new("r"), None, now)
			.expect("Entries without TTL should be accepted.");

		assert!(forever.is_live_at(macros::datetime!(2100-01-01 00:00 UTC)));
		assert_eq!(
			StoreEntry::new(TokenSecret::new("x"), Some(Duration::ZERO), now)
				.expect_err("Zero TTLs must be rejected."),
			StoreError::NonPositiveTtl
		);
	}
}
