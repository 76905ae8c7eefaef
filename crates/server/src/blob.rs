//! Media storage (§6): bytes live either on local disk under
//! `uploads/<subpath>` or behind a pluggable blob client. Only the
//! local-filesystem implementation is wired in; the trait is the whole
//! interface contract, matching Non-goals (no specific cloud SDK).
use variant_core::err::Result;

pub trait BlobStore: Send + Sync {
	fn put(&self, subpath: &str, bytes: &[u8]) -> Result<String>;
	fn delete(&self, subpath: &str) -> Result<()>;
}

pub struct LocalFsBlobStore {
	root: std::path::PathBuf,
}

impl LocalFsBlobStore {
	pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
		Self { root: root.into() }
	}
}

impl BlobStore for LocalFsBlobStore {
	fn put(&self, subpath: &str, bytes: &[u8]) -> Result<String> {
		let path = self.root.join(subpath);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&path, bytes)?;
		Ok(format!("uploads/{subpath}"))
	}

	fn delete(&self, subpath: &str) -> Result<()> {
		let path = self.root.join(subpath);
		match std::fs::remove_file(&path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}
