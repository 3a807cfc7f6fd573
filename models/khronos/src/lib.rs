pub mod accessor;
pub mod glb;
pub mod gltf;
pub mod gltf2;
#[cfg(feature = "import")]
pub mod import;
pub mod store;
pub mod uri;

use bitflags::bitflags;

use std::time::Duration;

bitflags! {
	pub struct ImportFlag: u32 {
		/// Enforce 4-byte alignment and exact chunk padding
		const STRICT = 1;
		/// Record unreadable buffers instead of failing the load
		const SKIP_MISSING_BUFFERS = 2;
		/// Decode accessors on the rayon thread pool
		const PARALLEL_DECODE = 4;
	}
}

impl Default for ImportFlag {
	fn default() -> Self {
		ImportFlag::PARALLEL_DECODE
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportCfg {
	pub flags: ImportFlag,
	/// Per-request timeout for remote documents and buffers
	pub fetch_timeout: Duration,
	/// Largest remote response accepted, in bytes
	pub max_fetch_size: u64,
	/// Largest decoded accessor, in bytes
	pub max_decode_size: usize,
}

impl Default for ImportCfg {
	fn default() -> Self {
		Self {
			flags: ImportFlag::default(),
			fetch_timeout: Duration::from_secs(30),
			max_fetch_size: 256 * 1024 * 1024,
			max_decode_size: accessor::MAX_DECODE_SIZE,
		}
	}
}

impl ImportCfg {
	pub fn strict(&self) -> bool {
		self.flags.contains(ImportFlag::STRICT)
	}

	pub fn lenient(&self) -> bool {
		self.flags.contains(ImportFlag::SKIP_MISSING_BUFFERS)
	}
}

pub use accessor::{
	Accessor,
	AccessorError
};
pub use glb::{
	Container,
	GlbError
};
pub use gltf::{
	AccessorType,
	AccessorValue,
	ComponentType
};
pub use gltf2::{
	Document,
	ValidationError
};
#[cfg(feature = "import")]
pub use import::{
	load,
	Gltf,
	LoadError,
	Source
};
pub use store::{
	BufferSource,
	DataStore
};
