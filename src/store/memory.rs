//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{CredentialStore, StoreEntry, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, StoreEntry>>>;

/// Storage backend that keeps entries in-process.
///
/// Expired entries are dropped when read and swept on every write.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of entries currently held, expired ones included until the next read or write.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when the store holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Absolute expiry recorded for `key`, if the entry exists and carries one.
	pub fn expires_at(&self, key: &StoreKey) -> Option<OffsetDateTime> {
		self.0.read().get(key).and_then(|entry| entry.expires_at)
	}

	fn get_now(map: StoreMap, key: &StoreKey, now: OffsetDateTime) -> Option<TokenSecret> {
		{
			let guard = map.read();

			match guard.get(key) {
				Some(entry) if entry.is_live_at(now) => return Some(entry.value.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		// Another writer may have replaced the entry between the two locks.
		if guard.get(key).is_some_and(|entry| !entry.is_live_at(now)) {
			guard.remove(key);
		}

		guard.get(key).map(|entry| entry.value.clone())
	}

	fn put_now(
		map: StoreMap,
		key: &StoreKey,
		value: TokenSecret,
		ttl: Option<Duration>,
		now: OffsetDateTime,
	) -> Result<(), StoreError> {
		let entry = StoreEntry::new(value, ttl, now)?;
		let mut guard = map.write();

		guard.retain(|_, existing| existing.is_live_at(now));
		guard.insert(key.clone(), entry);

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key, OffsetDateTime::now_utc())) })
	}

	fn put<'a>(
		&'a self,
		key: &'a StoreKey,
		value: TokenSecret,
		ttl: Option<Duration>,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::put_now(map, key, value, ttl, OffsetDateTime::now_utc()) })
	}
}
