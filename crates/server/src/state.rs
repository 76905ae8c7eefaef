use std::sync::Arc;

use variant_core::store::Store;

use crate::blob::BlobStore;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
	pub store: Store,
	pub config: Arc<Config>,
	pub blobs: Arc<dyn BlobStore>,
}
