use byteorder::{
	ByteOrder,
	LE
};

use json::JsonValue;
use thiserror::Error;

use crate::{
	gltf::{
		as_index,
		element_size,
		opt_index,
		opt_string,
		AccessorType,
		AccessorValue,
		ComponentType
	},
	gltf2::BufferView,
	store::DataStore
};

#[derive(Debug, Error, PartialEq)]
pub enum AccessorError {
	#[error("Buffer {0} is not loaded")]
	BufferUnavailable(usize),
	#[error("Invalid accessor bounds: {0}")]
	InvalidBounds(&'static str),
	#[error("Buffer view index out of range: {0}")]
	InvalidBufferView(usize),
	#[error("Accessor count must be a positive integer")]
	InvalidCount,
	#[error("Invalid accessor field: {0}")]
	InvalidField(&'static str),
	#[error("Accessor componentType/type is missing or not recognized")]
	InvalidFields,
	#[error("Invalid sparse accessor field: {0}")]
	InvalidSparse(&'static str),
	#[error("Sparse indices must be unsigned integers")]
	InvalidSparseIndexType,
	#[error("byteStride {stride} is smaller than the element size {element}")]
	InvalidStride {
		stride: usize,
		element: usize,
	},
	#[error("Accessor index out of range: {0}")]
	NoSuchAccessor(usize),
	#[error("Not an index accessor: {component:?} {kind}")]
	NotIndexAccessor {
		component: ComponentType,
		kind: AccessorType,
	},
	#[error("Reading {length} bytes at offset {offset} leaves buffer view {view}")]
	OutOfBounds {
		view: usize,
		offset: usize,
		length: usize,
	},
	#[error("Decoded size {size} exceeds the limit of {limit} bytes")]
	SizeLimit {
		size: usize,
		limit: usize,
	},
	#[error("Sparse index {index} exceeds accessor count {count}")]
	SparseIndexOutOfRange {
		index: usize,
		count: usize,
	},
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparseIndices {
	pub buffer_view: usize,
	pub byte_offset: usize,
	pub component_type: ComponentType,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparseValues {
	pub buffer_view: usize,
	pub byte_offset: usize,
}

/// `count` (index, value) pairs patched over the accessor's base array
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparseAccessor {
	pub count: usize,
	pub indices: SparseIndices,
	pub values: SparseValues,
}

impl SparseAccessor {
	fn load(obj: &JsonValue) -> Result<SparseAccessor, AccessorError> {
		let count = as_index(&obj["count"])
			.filter(|c| *c > 0)
			.ok_or(AccessorError::InvalidSparse("count"))?;

		let indices = &obj["indices"];
		let values = &obj["values"];

		let component_type = indices["componentType"].as_u32()
			.and_then(ComponentType::from_code)
			.ok_or(AccessorError::InvalidSparse("indices.componentType"))?;
		if !component_type.is_unsigned_int() {
			return Err(AccessorError::InvalidSparseIndexType);
		}

		Ok(SparseAccessor {
			count: count,
			indices: SparseIndices {
				buffer_view: as_index(&indices["bufferView"])
					.ok_or(AccessorError::InvalidSparse("indices.bufferView"))?,
				byte_offset: opt_index(&indices["byteOffset"], "indices.byteOffset")
					.map_err(AccessorError::InvalidSparse)?
					.unwrap_or(0),
				component_type: component_type,
			},
			values: SparseValues {
				buffer_view: as_index(&values["bufferView"])
					.ok_or(AccessorError::InvalidSparse("values.bufferView"))?,
				byte_offset: opt_index(&values["byteOffset"], "values.byteOffset")
					.map_err(AccessorError::InvalidSparse)?
					.unwrap_or(0),
			},
		})
	}

	/// Overwrites the patched elements of `base`
	fn apply(&self, accessor: &Accessor, base: &mut [u8], views: &[BufferView], store: &DataStore)
		-> Result<(), AccessorError>
	{
		let element = accessor.element_byte_size();
		let index_size = self.indices.component_type.size();

		let indices = view_range(views, store, self.indices.buffer_view, self.indices.byte_offset,
			self.count.saturating_mul(index_size))?;
		let values = view_range(views, store, self.values.buffer_view, self.values.byte_offset,
			self.count.saturating_mul(element))?;

		for (i, raw) in indices.chunks_exact(index_size).enumerate() {
			let index = match self.indices.component_type {
				ComponentType::UInt8 => raw[0] as usize,
				ComponentType::UInt16 => LE::read_u16(raw) as usize,
				ComponentType::UInt32 => LE::read_u32(raw) as usize,
				_ => return Err(AccessorError::InvalidSparseIndexType),
			};
			if index >= accessor.count {
				return Err(AccessorError::SparseIndexOutOfRange {
					index: index,
					count: accessor.count,
				});
			}

			base[index * element..(index + 1) * element]
				.copy_from_slice(&values[i * element..(i + 1) * element]);
		}

		Ok(())
	}
}

/// Largest decoded accessor [`Accessor::read`] allocates, in bytes
pub const MAX_DECODE_SIZE: usize = 1 << 30;

/// Describes how to read a typed array out of a buffer view
#[derive(Clone, Debug, PartialEq)]
pub struct Accessor {
	pub name: Option<String>,
	pub component_type: ComponentType,
	pub kind: AccessorType,
	pub count: usize,
	pub byte_offset: usize,
	/// Without a buffer view the base array is all zeros
	pub buffer_view: Option<usize>,
	pub normalized: bool,
	pub min: Option<AccessorValue>,
	pub max: Option<AccessorValue>,
	pub sparse: Option<SparseAccessor>,
}

impl Accessor {
	pub fn load(obj: &JsonValue) -> Result<Accessor, AccessorError> {
		let component_type = obj["componentType"].as_u32().and_then(ComponentType::from_code);
		let kind = obj["type"].as_str().and_then(AccessorType::from_name);
		let (component_type, kind) = match (component_type, kind) {
			(Some(c), Some(k)) => (c, k),
			_ => return Err(AccessorError::InvalidFields),
		};

		let count = as_index(&obj["count"])
			.filter(|c| *c > 0)
			.ok_or(AccessorError::InvalidCount)?;

		let normalized = match &obj["normalized"] {
			JsonValue::Null => false,
			v => v.as_bool().ok_or(AccessorError::InvalidField("normalized"))?,
		};
		if normalized && matches!(component_type, ComponentType::Float | ComponentType::UInt32) {
			return Err(AccessorError::InvalidField("normalized"));
		}

		let sparse = match &obj["sparse"] {
			JsonValue::Null => None,
			s => Some(SparseAccessor::load(s)?),
		};

		Ok(Accessor {
			name: opt_string(&obj["name"]),
			component_type: component_type,
			kind: kind,
			count: count,
			byte_offset: opt_index(&obj["byteOffset"], "byteOffset")
				.map_err(AccessorError::InvalidField)?
				.unwrap_or(0),
			buffer_view: opt_index(&obj["bufferView"], "bufferView")
				.map_err(AccessorError::InvalidField)?,
			normalized: normalized,
			min: bounds(&obj["min"], kind, "min")?,
			max: bounds(&obj["max"], kind, "max")?,
			sparse: sparse,
		})
	}

	pub fn element_byte_size(&self) -> usize {
		element_size(self.component_type, self.kind)
	}

	/// Saturates at `usize::MAX` for counts no allocation could hold
	pub fn total_byte_size(&self) -> usize {
		self.element_byte_size().saturating_mul(self.count)
	}

	pub fn is_float(&self) -> bool {
		self.component_type.is_float()
	}

	pub fn is_matrix(&self) -> bool {
		self.kind.is_matrix()
	}

	pub fn is_vector(&self) -> bool {
		self.kind.is_vector()
	}

	pub fn is_scalar(&self) -> bool {
		self.kind == AccessorType::Scalar
	}

	/// Resolves the accessor into `count` tightly packed elements, applying sparse overrides
	pub fn read(&self, views: &[BufferView], store: &DataStore) -> Result<Vec<u8>, AccessorError> {
		self.read_limited(views, store, MAX_DECODE_SIZE)
	}

	/// Same as [`Accessor::read`], refusing to decode more than `limit` bytes
	pub fn read_limited(&self, views: &[BufferView], store: &DataStore, limit: usize)
		-> Result<Vec<u8>, AccessorError>
	{
		let size = self.total_byte_size();
		if size > limit {
			return Err(AccessorError::SizeLimit {
				size: size,
				limit: limit,
			});
		}

		let mut data = match self.buffer_view {
			Some(view) => self.read_dense(view, views, store)?,
			None => {
				let mut zeros = Vec::new();
				zeros.try_reserve_exact(size).map_err(|_| AccessorError::SizeLimit {
					size: size,
					limit: limit,
				})?;
				zeros.resize(size, 0);
				zeros
			},
		};

		if let Some(sparse) = &self.sparse {
			sparse.apply(self, &mut data, views, store)?;
		}

		Ok(data)
	}

	fn read_dense(&self, view_index: usize, views: &[BufferView], store: &DataStore)
		-> Result<Vec<u8>, AccessorError>
	{
		let view = views.get(view_index).ok_or(AccessorError::InvalidBufferView(view_index))?;
		let element = self.element_byte_size();
		let stride = view.byte_stride.unwrap_or(element);
		if stride < element {
			return Err(AccessorError::InvalidStride {
				stride: stride,
				element: element,
			});
		}

		if self.count == 0 {
			return Ok(vec![]);
		}

		// The last element only needs its own bytes, not a full stride
		let extent = (self.count - 1).checked_mul(stride)
			.and_then(|n| n.checked_add(element))
			.ok_or(AccessorError::OutOfBounds {
				view: view_index,
				offset: self.byte_offset,
				length: usize::MAX,
			})?;
		let region = view_range(views, store, view_index, self.byte_offset, extent)?;

		if stride == element {
			return Ok(region.to_vec());
		}

		let mut data = Vec::with_capacity(self.total_byte_size());
		for i in 0..self.count {
			data.extend_from_slice(&region[i * stride..i * stride + element]);
		}

		Ok(data)
	}

	/// Reads every element as floating point, mapping normalized integers into [0, 1] or [-1, 1]
	pub fn read_values(&self, views: &[BufferView], store: &DataStore)
		-> Result<Vec<AccessorValue>, AccessorError>
	{
		self.values_of(&self.read(views, store)?)
	}

	/// Converts bytes produced by [`Accessor::read`] into values
	pub fn values_of(&self, data: &[u8]) -> Result<Vec<AccessorValue>, AccessorError> {
		let size = self.component_type.size();

		let mut values = Vec::with_capacity(data.len() / self.element_byte_size());
		let mut components = Vec::with_capacity(self.kind.component_count());
		for element in data.chunks_exact(self.element_byte_size()) {
			components.clear();
			components.extend(element.chunks_exact(size)
				.map(|c| component_to_f32(self.component_type, c, self.normalized)));

			values.push(AccessorValue::from_components(self.kind, &components)
				.ok_or(AccessorError::InvalidFields)?);
		}

		Ok(values)
	}

	/// Reads a scalar unsigned accessor, as used for primitive indices
	pub fn read_indices(&self, views: &[BufferView], store: &DataStore) -> Result<Vec<u32>, AccessorError> {
		self.check_index_type()?;
		self.indices_of(&self.read(views, store)?)
	}

	/// Converts bytes produced by [`Accessor::read`] into indices
	pub fn indices_of(&self, data: &[u8]) -> Result<Vec<u32>, AccessorError> {
		self.check_index_type()?;
		Ok(match self.component_type {
			ComponentType::UInt8 => data.iter().map(|b| *b as u32).collect(),
			ComponentType::UInt16 => data.chunks_exact(2).map(|c| LE::read_u16(c) as u32).collect(),
			_ => data.chunks_exact(4).map(LE::read_u32).collect(),
		})
	}

	fn check_index_type(&self) -> Result<(), AccessorError> {
		if !self.is_scalar() || !self.component_type.is_unsigned_int() {
			return Err(AccessorError::NotIndexAccessor {
				component: self.component_type,
				kind: self.kind,
			});
		}

		Ok(())
	}
}

fn bounds(value: &JsonValue, kind: AccessorType, field: &'static str)
	-> Result<Option<AccessorValue>, AccessorError>
{
	if value.is_null() {
		return Ok(None);
	}

	let components = value.members()
		.map(|v| v.as_f64().map(|f| f as f32))
		.collect::<Option<Vec<f32>>>()
		.ok_or(AccessorError::InvalidBounds(field))?;

	AccessorValue::from_components(kind, &components)
		.map(Some)
		.ok_or(AccessorError::InvalidBounds(field))
}

/// `length` bytes at `offset` inside a buffer view, checked against the view and the buffer
fn view_range<'a>(views: &[BufferView], store: &'a DataStore, view_index: usize, offset: usize, length: usize)
	-> Result<&'a [u8], AccessorError>
{
	let view = views.get(view_index).ok_or(AccessorError::InvalidBufferView(view_index))?;
	let out_of_bounds = AccessorError::OutOfBounds {
		view: view_index,
		offset: offset,
		length: length,
	};

	match offset.checked_add(length) {
		Some(end) if end <= view.byte_length => (),
		_ => return Err(out_of_bounds),
	}

	let start = view.byte_offset.checked_add(offset).ok_or(out_of_bounds)?;
	match store.get_buffer_slice(view.buffer, start, length) {
		Some(data) => Ok(data),
		None if !store.has_buffer(view.buffer) => Err(AccessorError::BufferUnavailable(view.buffer)),
		None => Err(AccessorError::OutOfBounds {
			view: view_index,
			offset: offset,
			length: length,
		}),
	}
}

fn component_to_f32(component: ComponentType, raw: &[u8], normalized: bool) -> f32 {
	match (component, normalized) {
		(ComponentType::Int8, false) => raw[0] as i8 as f32,
		(ComponentType::Int8, true) => (raw[0] as i8 as f32 / 127.0).max(-1.0),
		(ComponentType::UInt8, false) => raw[0] as f32,
		(ComponentType::UInt8, true) => raw[0] as f32 / 255.0,
		(ComponentType::Int16, false) => LE::read_i16(raw) as f32,
		(ComponentType::Int16, true) => (LE::read_i16(raw) as f32 / 32767.0).max(-1.0),
		(ComponentType::UInt16, false) => LE::read_u16(raw) as f32,
		(ComponentType::UInt16, true) => LE::read_u16(raw) as f32 / 65535.0,
		(ComponentType::UInt32, _) => LE::read_u32(raw) as f32,
		(ComponentType::Float, _) => LE::read_f32(raw),
	}
}

#[cfg(test)]
mod tests {
	use ultraviolet::vec::{
		Vec2,
		Vec3
	};

	use super::*;

	fn view(buffer: usize, byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> BufferView {
		BufferView {
			name: None,
			buffer: buffer,
			byte_offset: byte_offset,
			byte_length: byte_length,
			byte_stride: byte_stride,
			target: None,
		}
	}

	fn obj(text: &str) -> JsonValue {
		json::parse(text).unwrap()
	}

	fn floats(values: &[f32]) -> Vec<u8> {
		values.iter().flat_map(|f| f.to_le_bytes()).collect()
	}

	#[test]
	fn test_load() {
		let accessor = Accessor::load(&obj(r#"{
			"bufferView": 1,
			"byteOffset": 12,
			"componentType": 5126,
			"count": 3,
			"type": "VEC3",
			"min": [-1.0, -1.0, 0.0],
			"max": [1.0, 1.0, 0.5],
			"name": "positions"
		}"#)).unwrap();

		assert_eq!(ComponentType::Float, accessor.component_type);
		assert_eq!(AccessorType::Vec3, accessor.kind);
		assert_eq!(3, accessor.count);
		assert_eq!(12, accessor.byte_offset);
		assert_eq!(Some(1), accessor.buffer_view);
		assert!(!accessor.normalized);
		assert_eq!(Some(AccessorValue::Vector3(Vec3::new(-1.0, -1.0, 0.0))), accessor.min);
		assert_eq!(Some(AccessorValue::Vector3(Vec3::new(1.0, 1.0, 0.5))), accessor.max);
		assert_eq!(Some("positions".to_string()), accessor.name);
		assert_eq!(12, accessor.element_byte_size());
		assert_eq!(36, accessor.total_byte_size());
		assert!(accessor.is_float());
		assert!(accessor.is_vector());
		assert!(!accessor.is_matrix());
		assert!(!accessor.is_scalar());
	}

	#[test]
	fn test_load_defaults() {
		let accessor = Accessor::load(&obj(r#"{
			"componentType": 5123,
			"count": 6,
			"type": "SCALAR"
		}"#)).unwrap();

		assert_eq!(None, accessor.buffer_view);
		assert_eq!(0, accessor.byte_offset);
		assert!(!accessor.normalized);
		assert_eq!(None, accessor.min);
		assert_eq!(None, accessor.max);
		assert_eq!(None, accessor.sparse);
		assert!(accessor.is_scalar());
	}

	#[test]
	fn test_load_invalid_fields() {
		let bad = [
			obj(r#"{ "count": 1, "type": "VEC3" }"#),
			obj(r#"{ "componentType": 5126, "count": 1 }"#),
			obj(r#"{ "count": 1 }"#),
			obj(r#"{ "componentType": 5124, "count": 1, "type": "VEC3" }"#),
			obj(r#"{ "componentType": 5126, "count": 1, "type": "VEC5" }"#),
			obj(r#"{ "componentType": "5126", "count": 1, "type": 3 }"#),
		];

		for obj in bad.iter() {
			assert_eq!(Err(AccessorError::InvalidFields), Accessor::load(obj));
		}
	}

	#[test]
	fn test_load_invalid_count() {
		let counts = [json::from(0), json::from(-3), json::from(2.5), json::from("4"), JsonValue::Null];

		for count in counts {
			let mut obj = obj(r#"{ "componentType": 5126, "type": "SCALAR" }"#);
			obj["count"] = count;
			assert_eq!(Err(AccessorError::InvalidCount), Accessor::load(&obj));
		}
	}

	#[test]
	fn test_load_invalid_bounds() {
		assert_eq!(Err(AccessorError::InvalidBounds("min")), Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 1, "type": "VEC3", "min": [0.0, 0.0]
		}"#)));
		assert_eq!(Err(AccessorError::InvalidBounds("max")), Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 1, "type": "SCALAR", "max": ["big"]
		}"#)));
	}

	#[test]
	fn test_load_normalized() {
		let accessor = Accessor::load(&obj(r#"{
			"componentType": 5121, "count": 1, "type": "VEC4", "normalized": true
		}"#)).unwrap();
		assert!(accessor.normalized);

		assert_eq!(Err(AccessorError::InvalidField("normalized")), Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 1, "type": "VEC4", "normalized": true
		}"#)));
	}

	#[test]
	fn test_load_sparse() {
		let accessor = Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 4, "type": "SCALAR",
			"sparse": {
				"count": 2,
				"indices": { "bufferView": 0, "componentType": 5123 },
				"values": { "bufferView": 1, "byteOffset": 4 }
			}
		}"#)).unwrap();

		assert_eq!(Some(SparseAccessor {
			count: 2,
			indices: SparseIndices {
				buffer_view: 0,
				byte_offset: 0,
				component_type: ComponentType::UInt16,
			},
			values: SparseValues {
				buffer_view: 1,
				byte_offset: 4,
			},
		}), accessor.sparse);

		assert_eq!(Err(AccessorError::InvalidSparseIndexType), Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 4, "type": "SCALAR",
			"sparse": {
				"count": 1,
				"indices": { "bufferView": 0, "componentType": 5122 },
				"values": { "bufferView": 1 }
			}
		}"#)));
		assert_eq!(Err(AccessorError::InvalidSparse("values.bufferView")), Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 4, "type": "SCALAR",
			"sparse": {
				"count": 1,
				"indices": { "bufferView": 0, "componentType": 5121 },
				"values": {}
			}
		}"#)));
	}

	#[test]
	fn test_size_limit() {
		let accessor = Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 4294967295, "type": "MAT4"
		}"#)).unwrap();

		assert!(matches!(accessor.read(&[], &DataStore::new()),
			Err(AccessorError::SizeLimit { limit: MAX_DECODE_SIZE, .. })));
		assert!(matches!(accessor.read_values(&[], &DataStore::new()), Err(AccessorError::SizeLimit { .. })));

		let small = Accessor::load(&obj(r#"{ "componentType": 5126, "count": 4, "type": "VEC4" }"#)).unwrap();
		assert_eq!(Err(AccessorError::SizeLimit { size: 64, limit: 63 }),
			small.read_limited(&[], &DataStore::new(), 63));
		assert_eq!(Ok(vec![0; 64]), small.read_limited(&[], &DataStore::new(), 64));
	}

	#[test]
	fn test_read_dense() {
		let mut store = DataStore::new();
		store.store_glb_buffer(0, floats(&[9.0, 1.0, 2.0, 3.0, 4.0]));
		let views = [view(0, 4, 16, None)];

		let accessor = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC2"
		}"#)).unwrap();

		assert_eq!(floats(&[1.0, 2.0, 3.0, 4.0]), accessor.read(&views, &store).unwrap());
		assert_eq!(vec![
			AccessorValue::Vector2(Vec2::new(1.0, 2.0)),
			AccessorValue::Vector2(Vec2::new(3.0, 4.0)),
		], accessor.read_values(&views, &store).unwrap());
	}

	#[test]
	fn test_read_strided() {
		let mut store = DataStore::new();
		// position x, y followed by an unrelated float, per vertex
		store.store_glb_buffer(0, floats(&[1.0, 2.0, -1.0, 3.0, 4.0, -1.0, 5.0, 6.0]));
		let views = [view(0, 0, 32, Some(12))];

		let accessor = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC2"
		}"#)).unwrap();

		assert_eq!(floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), accessor.read(&views, &store).unwrap());

		let narrow = [view(0, 0, 32, Some(4))];
		assert_eq!(Err(AccessorError::InvalidStride { stride: 4, element: 8 }), accessor.read(&narrow, &store));
	}

	#[test]
	fn test_read_out_of_bounds() {
		let mut store = DataStore::new();
		store.store_glb_buffer(0, vec![0; 16]);

		let accessor = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC2"
		}"#)).unwrap();

		// Past the end of the view
		let views = [view(0, 0, 16, None)];
		assert!(matches!(accessor.read(&views, &store), Err(AccessorError::OutOfBounds { view: 0, .. })));

		// View claims more than the buffer holds
		let views = [view(0, 0, 32, None)];
		assert!(matches!(accessor.read(&views, &store), Err(AccessorError::OutOfBounds { .. })));

		let views = [view(1, 0, 32, None)];
		assert_eq!(Err(AccessorError::BufferUnavailable(1)), accessor.read(&views, &store));

		assert_eq!(Err(AccessorError::InvalidBufferView(0)), accessor.read(&[], &store));
	}

	#[test]
	fn test_read_indices() {
		let mut store = DataStore::new();
		store.store_glb_buffer(0, vec![0, 0, 1, 0, 2, 0, 0, 1]);
		let views = [view(0, 0, 8, None)];

		let u16s = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5123, "count": 4, "type": "SCALAR"
		}"#)).unwrap();
		assert_eq!(vec![0, 1, 2, 256], u16s.read_indices(&views, &store).unwrap());

		let u8s = Accessor::load(&obj(r#"{
			"bufferView": 0, "byteOffset": 2, "componentType": 5121, "count": 3, "type": "SCALAR"
		}"#)).unwrap();
		assert_eq!(vec![1, 0, 2], u8s.read_indices(&views, &store).unwrap());

		let u32s = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5125, "count": 2, "type": "SCALAR"
		}"#)).unwrap();
		assert_eq!(vec![65536, 16777218], u32s.read_indices(&views, &store).unwrap());

		let floats = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR"
		}"#)).unwrap();
		assert!(matches!(floats.read_indices(&views, &store), Err(AccessorError::NotIndexAccessor { .. })));
	}

	#[test]
	fn test_read_normalized() {
		let mut store = DataStore::new();
		store.store_glb_buffer(0, vec![255, 0, 0x81, 0x7F]);
		let views = [view(0, 0, 4, None)];

		let unsigned = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5121, "count": 1, "type": "VEC2", "normalized": true
		}"#)).unwrap();
		assert_eq!(vec![AccessorValue::Vector2(Vec2::new(1.0, 0.0))], unsigned.read_values(&views, &store).unwrap());

		let signed = Accessor::load(&obj(r#"{
			"bufferView": 0, "byteOffset": 2, "componentType": 5120, "count": 1, "type": "VEC2",
			"normalized": true
		}"#)).unwrap();
		assert_eq!(vec![AccessorValue::Vector2(Vec2::new(-1.0, 1.0))], signed.read_values(&views, &store).unwrap());

		let raw = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5121, "count": 2, "type": "VEC2"
		}"#)).unwrap();
		assert_eq!(vec![
			AccessorValue::Vector2(Vec2::new(255.0, 0.0)),
			AccessorValue::Vector2(Vec2::new(129.0, 127.0)),
		], raw.read_values(&views, &store).unwrap());
	}

	#[test]
	fn test_sparse_over_zeros() {
		let mut store = DataStore::new();
		let mut data = vec![1, 0, 3, 0];
		data.extend(floats(&[5.0, 7.0]));
		store.store_data_uri_buffer(0, data);
		let views = [view(0, 0, 4, None), view(0, 4, 8, None)];

		let accessor = Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 4, "type": "SCALAR",
			"sparse": {
				"count": 2,
				"indices": { "bufferView": 0, "componentType": 5123 },
				"values": { "bufferView": 1 }
			}
		}"#)).unwrap();

		assert_eq!(floats(&[0.0, 5.0, 0.0, 7.0]), accessor.read(&views, &store).unwrap());
	}

	#[test]
	fn test_sparse_over_dense() {
		let mut store = DataStore::new();
		let mut data = floats(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
		data.extend_from_slice(&[2, 0, 0, 0]);
		data.extend(floats(&[9.0, 8.0]));
		store.store_glb_buffer(0, data);
		let views = [view(0, 0, 24, None), view(0, 24, 4, None), view(0, 28, 8, None)];

		let accessor = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC2",
			"sparse": {
				"count": 1,
				"indices": { "bufferView": 1, "componentType": 5125 },
				"values": { "bufferView": 2 }
			}
		}"#)).unwrap();

		assert_eq!(floats(&[1.0, 1.0, 2.0, 2.0, 9.0, 8.0]), accessor.read(&views, &store).unwrap());
	}

	#[test]
	fn test_sparse_index_out_of_range() {
		let mut store = DataStore::new();
		let mut data = vec![4, 0, 0, 0];
		data.extend(floats(&[1.0]));
		store.store_glb_buffer(0, data);
		let views = [view(0, 0, 4, None), view(0, 4, 4, None)];

		let accessor = Accessor::load(&obj(r#"{
			"componentType": 5126, "count": 4, "type": "SCALAR",
			"sparse": {
				"count": 1,
				"indices": { "bufferView": 0, "componentType": 5121 },
				"values": { "bufferView": 1 }
			}
		}"#)).unwrap();

		assert_eq!(Err(AccessorError::SparseIndexOutOfRange { index: 4, count: 4 }), accessor.read(&views, &store));
	}

	#[test]
	fn test_matrix() {
		let mut store = DataStore::new();
		let identity: Vec<f32> = (0..16).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect();
		store.store_glb_buffer(0, floats(&identity));
		let views = [view(0, 0, 64, None)];

		let accessor = Accessor::load(&obj(r#"{
			"bufferView": 0, "componentType": 5126, "count": 1, "type": "MAT4"
		}"#)).unwrap();

		assert!(accessor.is_matrix());
		assert_eq!(64, accessor.total_byte_size());
		assert_eq!(vec![AccessorValue::Matrix4x4(ultraviolet::mat::Mat4::identity())],
			accessor.read_values(&views, &store).unwrap());
	}
}
