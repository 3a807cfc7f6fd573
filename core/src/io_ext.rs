use std::io::{
	Read,
	Result
};

pub trait ReadBinExt: Read {
	/// Reads exactly `length` bytes into a newly allocated buffer
	#[inline]
	fn read_vec(&mut self, length: usize) -> Result<Vec<u8>> {
		let mut data = vec![0; length];
		self.read_exact(&mut data)?;

		Ok(data)
	}

	/// Reads a raw 4-byte tag, as found in magic numbers and chunk identifiers
	#[inline]
	fn read_tag4(&mut self) -> Result<[u8; 4]> {
		let mut tag = [0; 4];
		self.read_exact(&mut tag)?;

		Ok(tag)
	}
}

impl<R> ReadBinExt for R
where
	R: Read + ?Sized,
{
}

/// Bounds-checked views into byte slices
pub trait SliceBinExt {
	/// Returns `length` bytes starting at `offset`, or `None` if the range leaves the slice
	fn range(&self, offset: usize, length: usize) -> Option<&[u8]>;
}

impl SliceBinExt for [u8] {
	#[inline]
	fn range(&self, offset: usize, length: usize) -> Option<&[u8]> {
		let end = offset.checked_add(length)?;
		self.get(offset..end)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_read_vec() {
		let mut data = &b"glTF\x02\x00\x00\x00"[..];
		assert_eq!(b"glTF", &data.read_tag4().unwrap());
		assert_eq!(vec![2, 0, 0, 0], data.read_vec(4).unwrap());
		assert!(data.read_vec(1).is_err());
	}

	#[test]
	fn test_range() {
		let data: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
		assert_eq!(Some(&[2, 3, 4, 5][..]), data.range(2, 4));
		assert_eq!(Some(&[][..]), data.range(10, 0));
		assert_eq!(None, data.range(8, 3));
		assert_eq!(None, data.range(usize::MAX, 2));
	}
}
