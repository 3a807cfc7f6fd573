#[cfg(feature = "io_ext")]
pub mod io_ext;

/// Converts a 4-byte string into a 32-bit little endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! rtag4 {
	($b4: literal) => {
		u32::from_le_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Converts a 4-byte string into a 32-bit big endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! tag4 {
	($b4: literal) => {
		u32::from_be_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Number of bytes needed to bring `len` up to the next multiple of 4
pub const fn padding4(len: usize) -> usize {
	(4 - (len % 4)) % 4
}

/// Rounds `len` up to the next multiple of 4
pub const fn align4(len: usize) -> usize {
	len + padding4(len)
}

/// Returns true if `len` sits on a 4-byte boundary
pub const fn is_aligned4(len: usize) -> bool {
	len % 4 == 0
}
