use byteorder::{
	LE,
	ReadBytesExt
};

use std::{
	fmt::{
		Display,
		Formatter,
		self
	},
	io,
	str::{
		from_utf8,
		Utf8Error
	}
};

use thiserror::Error;

use rgk_core::{
	io_ext::ReadBinExt,
	is_aligned4,
	rtag4,
	tag4
};

pub const MAGIC: u32 = tag4!(b"glTF");
pub const VERSION: u32 = 2;

/// Magic, version and total length, 4 bytes each
pub const HEADER_SIZE: usize = 12;
/// Chunk length and chunk type, 4 bytes each
pub const CHUNK_HEADER_SIZE: usize = 8;

/// JSON chunks are padded with spaces, binary chunks with zeros
pub const JSON_PADDING: u8 = b' ';
pub const BINARY_PADDING: u8 = 0;

#[derive(Debug, Error)]
pub enum GlbError {
	#[error("Chunk {index} declares {declared} bytes but holds {actual}")]
	ChunkLengthMismatch {
		index: usize,
		declared: u32,
		actual: usize,
	},
	#[error("More than one {0} chunk")]
	DuplicateChunk(ChunkType),
	#[error("First chunk must be JSON, found {0}")]
	FirstChunkNotJson(ChunkType),
	#[error("Input is too small to hold a GLB header: {0} bytes")]
	HeaderTooSmall(usize),
	#[error("Padding of the {0} chunk is invalid")]
	InvalidPadding(ChunkType),
	#[error("Not a GLB file: expected magic {expected:?}, found {actual:?}")]
	InvalidMagic {
		expected: &'static str,
		actual: String,
	},
	#[error("JSON chunk is not valid UTF-8")]
	InvalidUtf8 {
		#[from]
		source: Utf8Error,
	},
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("{what} is not aligned to 4 bytes: {length}")]
	Misaligned {
		what: &'static str,
		length: usize,
	},
	#[error("GLB holds no chunks")]
	MissingJsonChunk,
	#[error("Second chunk must be BIN, found {0}")]
	SecondChunkNotBinary(ChunkType),
	#[error("Header declares {declared} bytes but the input holds {actual}")]
	SizeMismatch {
		declared: u32,
		actual: usize,
	},
	#[error("{0} bytes do not fit the 32-bit GLB length fields")]
	TooLarge(usize),
	#[error("Chunk at offset {offset} needs {declared} bytes, only {available} left")]
	TruncatedChunk {
		offset: usize,
		declared: usize,
		available: usize,
	},
	#[error("Unsupported GLB version: {0}")]
	UnsupportedVersion(u32),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
	pub magic: u32,
	pub version: u32,
	/// Total size of the file, header included
	pub length: u32,
}

impl Header {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<Header, GlbError>
	where
		R: ReadBytesExt,
	{
		let tag = buf.read_tag4()?;
		let magic = u32::from_be_bytes(tag);
		if magic != MAGIC {
			return Err(GlbError::InvalidMagic {
				expected: "glTF",
				actual: String::from_utf8_lossy(&tag).into_owned(),
			});
		}

		let version = buf.read_u32::<LE>()?;
		if version != VERSION {
			return Err(GlbError::UnsupportedVersion(version));
		}

		Ok(Header {
			magic: magic,
			version: version,
			length: buf.read_u32::<LE>()?,
		})
	}

	fn check(&self, actual: usize) -> Result<(), GlbError> {
		if self.magic != MAGIC {
			return Err(GlbError::InvalidMagic {
				expected: "glTF",
				actual: String::from_utf8_lossy(&self.magic.to_be_bytes()).into_owned(),
			});
		}
		if self.version != VERSION {
			return Err(GlbError::UnsupportedVersion(self.version));
		}
		if self.length as usize != actual {
			return Err(GlbError::SizeMismatch {
				declared: self.length,
				actual: actual,
			});
		}

		Ok(())
	}
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChunkType {
	Binary,
	Json,
	Unknown(u32),
}

impl ChunkType {
	pub const BINARY: u32 = rtag4!(b"BIN\x00");
	pub const JSON: u32 = rtag4!(b"JSON");
}

impl From<u32> for ChunkType {
	fn from(code: u32) -> ChunkType {
		match code {
			ChunkType::BINARY => ChunkType::Binary,
			ChunkType::JSON => ChunkType::Json,
			_ => ChunkType::Unknown(code),
		}
	}
}

impl From<ChunkType> for u32 {
	fn from(kind: ChunkType) -> u32 {
		match kind {
			ChunkType::Binary => ChunkType::BINARY,
			ChunkType::Json => ChunkType::JSON,
			ChunkType::Unknown(code) => code,
		}
	}
}

impl Display for ChunkType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ChunkType::Binary => f.write_str("BIN"),
			ChunkType::Json => f.write_str("JSON"),
			ChunkType::Unknown(code) => write!(f, "unknown ({:#010X})", code),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
	pub length: u32,
	pub kind: ChunkType,
	/// Payload as stored in the file, alignment padding included
	pub data: Vec<u8>,
}

impl Chunk {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R, length: u32, kind: ChunkType) -> Result<Chunk, GlbError>
	where
		R: ReadBinExt,
	{
		Ok(Chunk {
			length: length,
			kind: kind,
			data: buf.read_vec(length as usize)?,
		})
	}

	/// Payload with the JSON space padding stripped. Binary payloads are returned whole,
	/// since trailing zeros may be real data.
	pub fn contents(&self) -> &[u8] {
		match self.kind {
			ChunkType::Json => {
				let end = self.data.iter().rposition(|b| *b != JSON_PADDING).map_or(0, |i| i + 1);
				&self.data[..end]
			},
			_ => &self.data,
		}
	}

	/// Size of the chunk on disk, header included
	pub fn encoded_len(&self) -> usize {
		CHUNK_HEADER_SIZE + self.data.len()
	}
}

/// A parsed GLB file: the header followed by its chunks in file order
#[derive(Clone, Debug, PartialEq)]
pub struct Container {
	pub header: Header,
	pub chunks: Vec<Chunk>,
}

impl Container {
	/// Splits a GLB byte stream into its header and chunks.
	///
	/// This only checks what is needed to walk the file. Call [`Container::validate`] for the
	/// remaining structural rules.
	#[cfg(feature = "import")]
	pub fn parse(bytes: &[u8]) -> Result<Container, GlbError> {
		if bytes.len() < HEADER_SIZE {
			return Err(GlbError::HeaderTooSmall(bytes.len()));
		}

		let mut buf = bytes;
		let header = Header::read(&mut buf)?;
		if header.length as usize != bytes.len() {
			return Err(GlbError::SizeMismatch {
				declared: header.length,
				actual: bytes.len(),
			});
		}

		let mut chunks = vec![];
		while !buf.is_empty() {
			let offset = bytes.len() - buf.len();
			if buf.len() < CHUNK_HEADER_SIZE {
				return Err(GlbError::TruncatedChunk {
					offset: offset,
					declared: CHUNK_HEADER_SIZE,
					available: buf.len(),
				});
			}

			let length = buf.read_u32::<LE>()?;
			let kind = ChunkType::from(buf.read_u32::<LE>()?);
			if (length as usize) > buf.len() {
				return Err(GlbError::TruncatedChunk {
					offset: offset,
					declared: length as usize,
					available: buf.len(),
				});
			}

			chunks.push(Chunk::read(&mut buf, length, kind)?);
		}

		match chunks.first() {
			None => return Err(GlbError::MissingJsonChunk),
			Some(c) if c.kind != ChunkType::Json => return Err(GlbError::FirstChunkNotJson(c.kind)),
			_ => (),
		}

		Ok(Container {
			header: header,
			chunks: chunks,
		})
	}

	/// Re-checks every structural invariant, returning the first one violated.
	/// `strict` adds the 4-byte alignment and JSON padding rules.
	pub fn validate(&self, strict: bool) -> Result<(), GlbError> {
		self.header.check(self.encoded_len())?;

		for (i, chunk) in self.chunks.iter().enumerate() {
			if chunk.length as usize != chunk.data.len() {
				return Err(GlbError::ChunkLengthMismatch {
					index: i,
					declared: chunk.length,
					actual: chunk.data.len(),
				});
			}
		}

		match self.chunks.first() {
			None => return Err(GlbError::MissingJsonChunk),
			Some(c) if c.kind != ChunkType::Json => return Err(GlbError::FirstChunkNotJson(c.kind)),
			_ => (),
		}

		if let Some(c) = self.chunks.get(1) {
			if c.kind != ChunkType::Binary {
				return Err(GlbError::SecondChunkNotBinary(c.kind));
			}
		}

		for kind in [ChunkType::Json, ChunkType::Binary] {
			if self.chunks.iter().filter(|c| c.kind == kind).count() > 1 {
				return Err(GlbError::DuplicateChunk(kind));
			}
		}

		if strict {
			if !is_aligned4(self.header.length as usize) {
				return Err(GlbError::Misaligned {
					what: "File length",
					length: self.header.length as usize,
				});
			}

			for chunk in self.chunks.iter() {
				if !is_aligned4(chunk.data.len()) {
					return Err(GlbError::Misaligned {
						what: "Chunk length",
						length: chunk.data.len(),
					});
				}
			}

			// Trailing filler of the JSON chunk must be spaces, never NULs
			let json = &self.chunks[0].data;
			if json.iter().rev()
				.take_while(|b| matches!(**b, 0 | b' ' | b'\t' | b'\n' | b'\r'))
				.any(|b| *b == 0) {
				return Err(GlbError::InvalidPadding(ChunkType::Json));
			}
		}

		Ok(())
	}

	/// Checks the padding that follows the `used` bytes of the binary chunk.
	/// At most 3 zero bytes may follow.
	pub fn validate_binary_padding(&self, used: usize) -> Result<(), GlbError> {
		if let Some(bin) = self.binary() {
			let data = &bin.data;
			if used > data.len() || data.len() - used > 3 {
				return Err(GlbError::InvalidPadding(ChunkType::Binary));
			}
			if data[used..].iter().any(|b| *b != BINARY_PADDING) {
				return Err(GlbError::InvalidPadding(ChunkType::Binary));
			}
		}

		Ok(())
	}

	/// The JSON chunk. Always the first chunk of a parsed container.
	pub fn json(&self) -> Option<&Chunk> {
		self.chunks.first().filter(|c| c.kind == ChunkType::Json)
	}

	/// The BIN chunk, if the file carries one
	pub fn binary(&self) -> Option<&Chunk> {
		self.chunks.get(1).filter(|c| c.kind == ChunkType::Binary)
	}

	pub fn json_text(&self) -> Result<&str, GlbError> {
		let chunk = self.json().ok_or(GlbError::MissingJsonChunk)?;
		Ok(from_utf8(chunk.contents())?)
	}

	/// Byte count of the container once written out
	pub fn encoded_len(&self) -> usize {
		HEADER_SIZE + self.chunks.iter().map(Chunk::encoded_len).sum::<usize>()
	}
}

#[cfg(feature = "export")]
pub mod export {
	use byteorder::{
		LE,
		WriteBytesExt
	};

	use std::io::{
		self,
		Write
	};

	use rgk_core::padding4;

	use super::*;

	impl Container {
		/// Builds a container around a JSON document and an optional binary payload,
		/// padding both to 4 bytes.
		/// Fails with [`GlbError::TooLarge`] if the result can't be described by the 32-bit
		/// length fields.
		pub fn from_parts(json: &[u8], bin: Option<&[u8]>) -> Result<Container, GlbError> {
			let mut chunks = vec![padded(ChunkType::Json, json, JSON_PADDING)?];
			if let Some(bin) = bin {
				chunks.push(padded(ChunkType::Binary, bin, BINARY_PADDING)?);
			}

			let mut container = Container {
				header: Header {
					magic: MAGIC,
					version: VERSION,
					length: 0,
				},
				chunks: chunks,
			};
			container.header.length = length_u32(container.encoded_len())?;

			Ok(container)
		}

		pub fn write<W>(&self, out: &mut W) -> io::Result<()>
		where
			W: Write,
		{
			out.write_u32::<byteorder::BE>(self.header.magic)?;
			out.write_u32::<LE>(self.header.version)?;
			out.write_u32::<LE>(self.header.length)?;

			for chunk in self.chunks.iter() {
				out.write_u32::<LE>(chunk.length)?;
				out.write_u32::<LE>(chunk.kind.into())?;
				out.write_all(&chunk.data)?;
			}

			Ok(())
		}

		pub fn to_bytes(&self) -> Vec<u8> {
			let mut out = Vec::with_capacity(self.encoded_len());
			// Writing into a Vec cannot fail
			let _ = self.write(&mut out);
			out
		}
	}

	fn padded(kind: ChunkType, data: &[u8], fill: u8) -> Result<Chunk, GlbError> {
		let mut data = data.to_vec();
		data.resize(data.len() + padding4(data.len()), fill);

		Ok(Chunk {
			length: length_u32(data.len())?,
			kind: kind,
			data: data,
		})
	}

	fn length_u32(len: usize) -> Result<u32, GlbError> {
		u32::try_from(len).map_err(|_| GlbError::TooLarge(len))
	}

	#[cfg(all(test, feature = "import"))]
	mod tests {
		use super::*;

		#[test]
		fn test_write_matches_parse() {
			let container = Container::from_parts(br#"{"asset":{"version":"2.0"}}"#, Some(&[1, 2, 3][..])).unwrap();
			let bytes = container.to_bytes();

			assert_eq!(container.encoded_len(), bytes.len());
			assert_eq!(0, bytes.len() % 4);
			assert_eq!(&[1, 2, 3, 0][..], container.binary().unwrap().data.as_slice());
			assert_eq!(container, Container::parse(&bytes).unwrap());
			container.validate(true).unwrap();
		}

		#[cfg(target_pointer_width = "64")]
		#[test]
		fn test_length_limit() {
			assert_eq!(u32::MAX, length_u32(u32::MAX as usize).unwrap());
			assert!(matches!(length_u32(u32::MAX as usize + 1), Err(GlbError::TooLarge(_))));
		}
	}
}

/// Assembles a GLB the way an exporter would. Used to feed the parsers in tests.
#[cfg(test)]
pub(crate) fn assemble(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
	let json_padding = rgk_core::padding4(json.len());
	let mut length = HEADER_SIZE + CHUNK_HEADER_SIZE + json.len() + json_padding;
	if let Some(bin) = bin {
		length += CHUNK_HEADER_SIZE + rgk_core::align4(bin.len());
	}

	let mut glb = Vec::with_capacity(length);
	glb.extend_from_slice(b"glTF");
	glb.extend_from_slice(&VERSION.to_le_bytes());
	glb.extend_from_slice(&(length as u32).to_le_bytes());

	glb.extend_from_slice(&((json.len() + json_padding) as u32).to_le_bytes());
	glb.extend_from_slice(&ChunkType::JSON.to_le_bytes());
	glb.extend_from_slice(json.as_bytes());
	glb.resize(glb.len() + json_padding, JSON_PADDING);

	if let Some(bin) = bin {
		let bin_padding = rgk_core::padding4(bin.len());
		glb.extend_from_slice(&((bin.len() + bin_padding) as u32).to_le_bytes());
		glb.extend_from_slice(&ChunkType::BINARY.to_le_bytes());
		glb.extend_from_slice(bin);
		glb.resize(glb.len() + bin_padding, BINARY_PADDING);
	}

	glb
}
