//! Simple file-backed [`CredentialStore`] for single-instance deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{CredentialStore, StoreEntry, StoreError, StoreFuture, StoreKey},
};

/// Persists entries to a JSON file after each write.
///
/// Expired entries are skipped when the snapshot is loaded and pruned whenever the file is
/// rewritten.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<StoreKey, StoreEntry>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path, OffsetDateTime::now_utc())?;

		tracing::debug!(path = %path.display(), entries = snapshot.len(), "Opened file store.");

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing JSON file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(
		path: &Path,
		now: OffsetDateTime,
	) -> Result<HashMap<StoreKey, StoreEntry>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let entries: Vec<(StoreKey, StoreEntry)> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().filter(|(_, entry)| entry.is_live_at(now)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<StoreKey, StoreEntry>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = contents.iter().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn put_at(
		&self,
		key: &StoreKey,
		value: TokenSecret,
		ttl: Option<Duration>,
		now: OffsetDateTime,
	) -> Result<(), StoreError> {
		let entry = StoreEntry::new(value, ttl, now)?;
		let mut guard = self.inner.write();

		guard.retain(|_, existing| existing.is_live_at(now));
		guard.insert(key.clone(), entry);

		self.persist_locked(&guard)
	}
}
impl CredentialStore for FileStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			Ok(self
				.inner
				.read()
				.get(key)
				.filter(|entry| entry.is_live_at(now))
				.map(|entry| entry.value.clone()))
		})
	}

	fn put<'a>(
		&'a self,
		key: &'a StoreKey,
		value: TokenSecret,
		ttl: Option<Duration>,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.put_at(key, value, ttl, OffsetDateTime::now_utc()) })
	}
}
