use log::debug;

use std::{
	collections::HashMap,
	fs,
	path::{
		Path,
		PathBuf
	}
};

use thiserror::Error;

use rgk_core::io_ext::SliceBinExt;

use crate::uri::{
	decode_data_uri,
	percent_decode,
	DataUriError
};

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Unable to read buffer file {path:?}: {reason}")]
	FileRead {
		reason: String,
		path: PathBuf,
	},
	#[error("Buffer URI {0:?} decodes to a path this platform can't represent")]
	InvalidPath(String),
	#[error("Unsupported buffer URI scheme: {0}")]
	UnsupportedScheme(String),
}

/// Where a buffer's bytes came from
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferSource {
	/// The BIN chunk of a GLB file
	Glb,
	/// A file next to the document
	External,
	/// A base64 data URI inside the document
	DataUri,
}

impl BufferSource {
	/// Lookup order. An embedded GLB chunk always wins over a declared URI.
	pub const PRIORITY: [BufferSource; 3] = [BufferSource::Glb, BufferSource::External, BufferSource::DataUri];
}

#[derive(Clone, Debug)]
struct BackingStore {
	source: BufferSource,
	buffers: HashMap<usize, Vec<u8>>,
}

/// Owns the raw bytes of every buffer a document refers to, keyed by buffer index.
///
/// Each source has its own backing store and reads consult them in [`BufferSource::PRIORITY`]
/// order. Readers only ever get borrowed slices.
#[derive(Clone, Debug)]
pub struct DataStore {
	stores: [BackingStore; 3],
}

impl Default for DataStore {
	fn default() -> Self {
		Self {
			stores: BufferSource::PRIORITY.map(|source| BackingStore {
				source: source,
				buffers: HashMap::new(),
			}),
		}
	}
}

impl DataStore {
	pub fn new() -> DataStore {
		DataStore::default()
	}

	fn backing_mut(&mut self, source: BufferSource) -> &mut BackingStore {
		let i = BufferSource::PRIORITY.iter().position(|s| *s == source).unwrap_or(0);
		&mut self.stores[i]
	}

	/// Stores `data` as buffer `index` of the given source, replacing what was there
	pub fn store(&mut self, source: BufferSource, index: usize, data: Vec<u8>) {
		debug!("Storing {} bytes as {:?} buffer {}", data.len(), source, index);
		self.backing_mut(source).buffers.insert(index, data);
	}

	pub fn store_glb_buffer(&mut self, index: usize, data: Vec<u8>) {
		self.store(BufferSource::Glb, index, data);
	}

	pub fn store_external_buffer(&mut self, index: usize, data: Vec<u8>) {
		self.store(BufferSource::External, index, data);
	}

	pub fn store_data_uri_buffer(&mut self, index: usize, data: Vec<u8>) {
		self.store(BufferSource::DataUri, index, data);
	}

	/// Reads the file `uri` points to, relative to `base_dir`, and stores it as an external buffer
	pub fn load_external_buffer(&mut self, index: usize, uri: &str, base_dir: &Path) -> Result<(), StoreError> {
		let path = resolve_uri(uri, base_dir)?;
		let data = fs::read(&path).map_err(|e| StoreError::FileRead {
			reason: e.to_string(),
			path: path.clone(),
		})?;

		self.store_external_buffer(index, data);
		Ok(())
	}

	/// Decodes a base64 data URI and stores it as a data URI buffer
	pub fn load_data_uri_buffer(&mut self, index: usize, uri: &str) -> Result<(), DataUriError> {
		let data = decode_data_uri(uri)?;
		self.store_data_uri_buffer(index, data);
		Ok(())
	}

	/// Bytes of buffer `index` from the highest priority source holding it
	pub fn get_buffer_data(&self, index: usize) -> Option<&[u8]> {
		self.stores.iter()
			.find_map(|s| s.buffers.get(&index))
			.map(Vec::as_slice)
	}

	/// Which source answers for buffer `index`
	pub fn source_of(&self, index: usize) -> Option<BufferSource> {
		self.stores.iter()
			.find(|s| s.buffers.contains_key(&index))
			.map(|s| s.source)
	}

	/// `length` bytes of buffer `index` starting at `offset`. Returns `None` if the buffer is
	/// missing or the range doesn't fit inside it.
	pub fn get_buffer_slice(&self, index: usize, offset: usize, length: usize) -> Option<&[u8]> {
		self.get_buffer_data(index)?.range(offset, length)
	}

	pub fn has_buffer(&self, index: usize) -> bool {
		self.stores.iter().any(|s| s.buffers.contains_key(&index))
	}

	/// Number of distinct buffer indices across all sources
	pub fn buffer_count(&self) -> usize {
		let mut indices: Vec<usize> = self.stores.iter()
			.flat_map(|s| s.buffers.keys().copied())
			.collect();
		indices.sort_unstable();
		indices.dedup();
		indices.len()
	}
}

/// Turns a buffer URI reference into a filesystem path
pub fn resolve_uri(uri: &str, base_dir: &Path) -> Result<PathBuf, StoreError> {
	if let Some((scheme, _)) = uri.split_once("://") {
		// Only relative references and plain paths are loaded from disk
		if scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
			return Err(StoreError::UnsupportedScheme(scheme.to_string()));
		}
	}

	let path = path_from_bytes(percent_decode(uri), uri)?;
	if path.is_absolute() {
		Ok(path)
	} else {
		Ok(base_dir.join(path))
	}
}

/// Unix paths are arbitrary bytes
#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>, _uri: &str) -> Result<PathBuf, StoreError> {
	use std::{
		ffi::OsString,
		os::unix::ffi::OsStringExt
	};

	Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>, uri: &str) -> Result<PathBuf, StoreError> {
	String::from_utf8(bytes)
		.map(PathBuf::from)
		.map_err(|_| StoreError::InvalidPath(uri.to_string()))
}
