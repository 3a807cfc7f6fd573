use log::{
	debug,
	info,
	warn
};

use rayon::prelude::*;

use std::{
	fs,
	io,
	path::{
		Path,
		PathBuf
	},
	str::{
		from_utf8,
		Utf8Error
	},
	time::Instant
};

use thiserror::Error;

use crate::{
	accessor::{
		Accessor,
		AccessorError
	},
	glb::{
		ChunkType,
		Container,
		GlbError
	},
	gltf::AccessorValue,
	gltf2::{
		Document,
		DocumentError,
		ValidationError
	},
	store::{
		BufferSource,
		DataStore,
		StoreError
	},
	uri::{
		is_data_uri,
		DataUriError
	},
	ImportCfg,
	ImportFlag
};

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("Buffer {index} data URI: {source}")]
	DataUri {
		index: usize,
		source: DataUriError,
	},
	#[error(transparent)]
	Document(#[from] DocumentError),
	#[error("Unable to fetch {url}: {reason}")]
	Fetch {
		url: String,
		reason: String,
	},
	#[error("Response from {url} exceeds {limit} bytes")]
	FetchTooLarge {
		url: String,
		limit: u64,
	},
	#[error("GLB error: {0}")]
	Glb(#[from] GlbError),
	#[error("IO error: {source}")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Invalid UTF-8 in glTF JSON")]
	InvalidUtf8 {
		#[from]
		source: Utf8Error,
	},
	#[error("Buffer {0} has neither a URI nor a GLB binary chunk")]
	MissingBufferData(usize),
	#[error("Loading {0} needs the `remote` feature")]
	RemoteUnsupported(String),
	#[error("Buffer {index}: {source}")]
	Store {
		index: usize,
		source: StoreError,
	},
	#[error("Invalid document: {0}")]
	Validation(#[from] ValidationError),
}

/// Where a document comes from
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
	/// An in-memory GLB or glTF JSON. Relative buffer URIs resolve against `base_dir`,
	/// or the working directory when it is `None`.
	Bytes {
		data: Vec<u8>,
		base_dir: Option<PathBuf>,
	},
	Path(PathBuf),
	/// Fetched over HTTP(S). Needs the `remote` feature.
	Url(String),
}

impl Source {
	/// Interprets a command line argument as a URL or a file path
	pub fn from_arg(arg: &str) -> Source {
		if arg.starts_with("http://") || arg.starts_with("https://") {
			Source::Url(arg.to_string())
		} else {
			Source::Path(PathBuf::from(arg))
		}
	}
}

/// What relative buffer URIs resolve against
#[derive(Clone, Copy, Debug)]
enum Base<'a> {
	Dir(&'a Path),
	Url(&'a str),
}

/// A loaded glTF asset: its document plus every buffer it could resolve
#[derive(Debug)]
pub struct Gltf {
	/// The GLB container, for binary input. The BIN payload moves into the data store,
	/// so its chunk keeps only the declared length.
	pub container: Option<Container>,
	pub document: Document,
	/// Buffers skipped in lenient mode
	pub missing_buffers: Vec<usize>,
	pub flags: ImportFlag,
	/// Decode limit per accessor, from [`ImportCfg::max_decode_size`]
	pub max_decode_size: usize,
	store: DataStore,
}

impl Gltf {
	pub fn store(&self) -> &DataStore {
		&self.store
	}

	pub fn accessor(&self, index: usize) -> Result<&Accessor, AccessorError> {
		self.document.accessors.get(index).ok_or(AccessorError::NoSuchAccessor(index))
	}

	/// Tightly packed bytes of accessor `index`, sparse substitution applied
	pub fn accessor_data(&self, index: usize) -> Result<Vec<u8>, AccessorError> {
		self.read_accessor(self.accessor(index)?)
	}

	pub fn accessor_values(&self, index: usize) -> Result<Vec<AccessorValue>, AccessorError> {
		let accessor = self.accessor(index)?;
		accessor.values_of(&self.read_accessor(accessor)?)
	}

	pub fn accessor_indices(&self, index: usize) -> Result<Vec<u32>, AccessorError> {
		let accessor = self.accessor(index)?;
		accessor.indices_of(&self.read_accessor(accessor)?)
	}

	fn read_accessor(&self, accessor: &Accessor) -> Result<Vec<u8>, AccessorError> {
		accessor.read_limited(&self.document.buffer_views, &self.store, self.max_decode_size)
	}

	/// Reads every accessor, in document order. Each accessor only borrows the store, so
	/// with [`ImportFlag::PARALLEL_DECODE`] they are split across the rayon pool.
	pub fn decode_all(&self) -> Vec<Result<Vec<u8>, AccessorError>> {
		let start = Instant::now();

		let decoded: Vec<_> = if self.flags.contains(ImportFlag::PARALLEL_DECODE) {
			self.document.accessors.par_iter()
				.map(|a| self.read_accessor(a))
				.collect()
		} else {
			self.document.accessors.iter()
				.map(|a| self.read_accessor(a))
				.collect()
		};

		debug!("Decoded {} accessors in {:?}", decoded.len(), start.elapsed());
		decoded
	}
}

/// Loads a GLB or glTF JSON document and resolves its buffers
pub fn load(source: Source, cfg: &ImportCfg) -> Result<Gltf, LoadError> {
	match source {
		Source::Bytes { data, base_dir } => {
			let base = base_dir.unwrap_or_else(|| PathBuf::from("."));
			read(&data, Base::Dir(&base), cfg)
		},
		Source::Path(path) => {
			info!("Loading {}", path.display());
			let data = fs::read(&path)?;
			let base = path.parent()
				.filter(|p| !p.as_os_str().is_empty())
				.unwrap_or_else(|| Path::new("."));
			read(&data, Base::Dir(base), cfg)
		},
		Source::Url(url) => {
			info!("Fetching {}", url);
			let data = fetch(&url, cfg)?;
			read(&data, Base::Url(&url), cfg)
		},
	}
}

/// Loads an in-memory document, resolving relative buffer URIs against `base_dir`
pub fn from_slice(data: &[u8], base_dir: &Path, cfg: &ImportCfg) -> Result<Gltf, LoadError> {
	read(data, Base::Dir(base_dir), cfg)
}

fn read(data: &[u8], base: Base, cfg: &ImportCfg) -> Result<Gltf, LoadError> {
	let mut container = if is_json(data) {
		debug!("Reading glTF JSON, {} bytes", data.len());
		None
	} else {
		let container = Container::parse(data)?;
		container.validate(cfg.strict())?;
		debug!("Read GLB with {} chunks", container.chunks.len());
		Some(container)
	};

	let text = match container {
		Some(ref c) => c.json_text()?,
		None => from_utf8(data)?,
	};
	let document = Document::from_json(text)?;
	info!("Document has {} buffers, {} buffer views, {} accessors", document.buffers.len(),
		document.buffer_views.len(), document.accessors.len());

	let mut store = DataStore::new();
	if let Some(ref mut container) = container {
		if cfg.strict() {
			if let Some(buffer) = document.buffers.first() {
				container.validate_binary_padding(buffer.byte_length)?;
			}
		}

		if !document.buffers.is_empty() {
			if let Some(bin) = container.chunks.get_mut(1).filter(|c| c.kind == ChunkType::Binary) {
				store.store_glb_buffer(0, std::mem::take(&mut bin.data));
			}
		}
	}

	let missing_buffers = register_buffers(&document, &mut store, base, cfg)?;

	document.validate()?;
	check_buffer_lengths(&document, &store)?;

	Ok(Gltf {
		container: container,
		document: document,
		missing_buffers: missing_buffers,
		flags: cfg.flags,
		max_decode_size: cfg.max_decode_size,
		store: store,
	})
}

/// A text document starts with `{`, a GLB with its magic
fn is_json(data: &[u8]) -> bool {
	data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
}

/// Loads every declared buffer not already backed by the GLB binary chunk. Returns the
/// buffers skipped in lenient mode.
fn register_buffers(document: &Document, store: &mut DataStore, base: Base, cfg: &ImportCfg)
	-> Result<Vec<usize>, LoadError>
{
	let mut missing = vec![];

	for (i, buffer) in document.buffers.iter().enumerate() {
		if store.source_of(i) == Some(BufferSource::Glb) {
			continue;
		}

		let uri = match buffer.uri {
			Some(ref uri) => uri,
			None => return Err(LoadError::MissingBufferData(i)),
		};

		if is_data_uri(uri) {
			store.load_data_uri_buffer(i, uri).map_err(|e| LoadError::DataUri {
				index: i,
				source: e,
			})?;
			continue;
		}

		let result = match base {
			Base::Dir(dir) => store.load_external_buffer(i, uri, dir).map_err(|e| LoadError::Store {
				index: i,
				source: e,
			}),
			Base::Url(url) => fetch(&join_url(url, uri), cfg).map(|data| store.store_external_buffer(i, data)),
		};

		match result {
			Err(e) if cfg.lenient() => {
				warn!("Skipping buffer {}: {}", i, e);
				missing.push(i);
			},
			r => r?,
		}
	}

	Ok(missing)
}

fn check_buffer_lengths(document: &Document, store: &DataStore) -> Result<(), ValidationError> {
	for (i, buffer) in document.buffers.iter().enumerate() {
		if let Some(data) = store.get_buffer_data(i) {
			if data.len() < buffer.byte_length {
				return Err(ValidationError::BufferTooShort {
					buffer: i,
					declared: buffer.byte_length,
					actual: data.len(),
				});
			}
		}
	}

	Ok(())
}

/// Resolves a relative reference against the directory of `url`
fn join_url(url: &str, uri: &str) -> String {
	if uri.contains("://") {
		return uri.to_string();
	}

	// Query and fragment never hold path segments
	let url = url.find(|c| c == '?' || c == '#').map_or(url, |i| &url[..i]);
	let path_start = url.find("://").map_or(0, |i| i + 3);

	match url[path_start..].rfind('/') {
		Some(i) => format!("{}{}", &url[..path_start + i + 1], uri),
		None => format!("{}/{}", url, uri),
	}
}

#[cfg(feature = "remote")]
fn fetch(url: &str, cfg: &ImportCfg) -> Result<Vec<u8>, LoadError> {
	use std::io::Read;

	debug!("GET {}", url);
	let agent = ureq::AgentBuilder::new()
		.timeout(cfg.fetch_timeout)
		.build();
	let response = agent.get(url).call().map_err(|e| LoadError::Fetch {
		url: url.to_string(),
		reason: e.to_string(),
	})?;

	let mut data = vec![];
	response.into_reader()
		.take(cfg.max_fetch_size + 1)
		.read_to_end(&mut data)?;
	if data.len() as u64 > cfg.max_fetch_size {
		return Err(LoadError::FetchTooLarge {
			url: url.to_string(),
			limit: cfg.max_fetch_size,
		});
	}

	info!("Fetched {} bytes from {}", data.len(), url);
	Ok(data)
}

#[cfg(not(feature = "remote"))]
fn fetch(url: &str, _cfg: &ImportCfg) -> Result<Vec<u8>, LoadError> {
	Err(LoadError::RemoteUnsupported(url.to_string()))
}
