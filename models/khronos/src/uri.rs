use mime::Mime;
use thiserror::Error;

pub const DATA_SCHEME: &str = "data:";

/// Media types glTF allows for buffers embedded as data URIs
pub const BUFFER_MEDIA_TYPES: [&str; 2] = ["application/octet-stream", "application/gltf-buffer"];

#[derive(Debug, Error, PartialEq)]
pub enum DataUriError {
	#[error("Invalid base64 payload")]
	InvalidBase64 {
		#[from]
		source: base64::DecodeError,
	},
	#[error("Malformed data URI: {0}")]
	InvalidDataUriFormat(&'static str),
	#[error("Not a data URI")]
	NotDataUri,
	#[error("Unsupported buffer media type: {0:?}")]
	UnsupportedMediaType(String),
}

/// The parts of a `data:<mediatype>;base64,<payload>` URI
#[derive(Clone, Debug, PartialEq)]
pub struct DataUri<'a> {
	pub media_type: Mime,
	pub payload: &'a str,
}

impl<'a> DataUri<'a> {
	pub fn parse(uri: &'a str) -> Result<DataUri<'a>, DataUriError> {
		let rest = uri.strip_prefix(DATA_SCHEME).ok_or(DataUriError::NotDataUri)?;
		let (header, payload) = rest.split_once(',')
			.ok_or(DataUriError::InvalidDataUriFormat("missing ',' separator"))?;
		let media_type = header.strip_suffix(";base64")
			.ok_or(DataUriError::InvalidDataUriFormat("payload is not base64 encoded"))?;

		let media_type: Mime = media_type.parse()
			.map_err(|_| DataUriError::UnsupportedMediaType(media_type.to_string()))?;
		if !BUFFER_MEDIA_TYPES.contains(&media_type.essence_str()) {
			return Err(DataUriError::UnsupportedMediaType(media_type.to_string()));
		}

		Ok(DataUri {
			media_type: media_type,
			payload: payload,
		})
	}

	pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
		Ok(base64::decode(self.payload)?)
	}
}

pub fn is_data_uri(uri: &str) -> bool {
	uri.starts_with(DATA_SCHEME)
}

/// Parses a buffer data URI and decodes its payload
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, DataUriError> {
	DataUri::parse(uri)?.decode()
}

/// Decodes `%XX` escapes in a URI reference. Malformed escapes are kept as-is. The result
/// may not be UTF-8, since escapes can encode any byte.
pub fn percent_decode(input: &str) -> Vec<u8> {
	let bytes = input.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());

	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' && i + 2 < bytes.len() {
			if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
				out.push(hi << 4 | lo);
				i += 3;
				continue;
			}
		}
		out.push(bytes[i]);
		i += 1;
	}

	out
}

fn hex_digit(b: u8) -> Option<u8> {
	match b {
		b'0'..=b'9' => Some(b - b'0'),
		b'a'..=b'f' => Some(b - b'a' + 10),
		b'A'..=b'F' => Some(b - b'A' + 10),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_data_uri() {
		assert_eq!(Ok(b"Hello".to_vec()), decode_data_uri("data:application/octet-stream;base64,SGVsbG8="));
		assert_eq!(Ok(vec![0, 0, 128, 63]), decode_data_uri("data:application/gltf-buffer;base64,AACAPw=="));
		assert_eq!(Ok(vec![]), decode_data_uri("data:application/octet-stream;base64,"));
	}

	#[test]
	fn test_data_uri_parts() {
		let uri = DataUri::parse("data:application/gltf-buffer;base64,AAAA").unwrap();
		assert_eq!("application/gltf-buffer", uri.media_type.essence_str());
		assert_eq!("AAAA", uri.payload);
	}

	#[test]
	fn test_not_data_uri() {
		assert_eq!(Err(DataUriError::NotDataUri), decode_data_uri("buffer.bin"));
		assert_eq!(Err(DataUriError::NotDataUri), decode_data_uri("application/octet-stream;base64,AAAA"));
		assert!(!is_data_uri("buffer.bin"));
		assert!(is_data_uri("data:application/octet-stream;base64,AAAA"));
	}

	#[test]
	fn test_malformed() {
		assert!(matches!(decode_data_uri("data:application/octet-stream;base64"),
			Err(DataUriError::InvalidDataUriFormat(_))));
		assert!(matches!(decode_data_uri("data:application/octet-stream,AAAA"),
			Err(DataUriError::InvalidDataUriFormat(_))));
	}

	#[test]
	fn test_media_type() {
		assert_eq!(Err(DataUriError::UnsupportedMediaType("image/png".to_string())),
			decode_data_uri("data:image/png;base64,AAAA"));
		assert!(matches!(decode_data_uri("data:;base64,AAAA"),
			Err(DataUriError::UnsupportedMediaType(_))));
	}

	#[test]
	fn test_bad_base64() {
		assert!(matches!(decode_data_uri("data:application/octet-stream;base64,A!!A"),
			Err(DataUriError::InvalidBase64 { .. })));
	}

	#[test]
	fn test_percent_decode() {
		assert_eq!(b"my buffer.bin".to_vec(), percent_decode("my%20buffer.bin"));
		assert_eq!(b"a/b".to_vec(), percent_decode("a%2Fb"));
		assert_eq!(b"plain.bin".to_vec(), percent_decode("plain.bin"));
		assert_eq!(b"100%".to_vec(), percent_decode("100%"));
		assert_eq!(b"%zz".to_vec(), percent_decode("%zz"));
		assert_eq!(b"%2".to_vec(), percent_decode("%2"));
		assert_eq!("caf\u{e9}.bin".as_bytes().to_vec(), percent_decode("caf%C3%A9.bin"));
		assert_eq!(vec![b'x', 0xFF, b'y'], percent_decode("x%FFy"));
	}
}
