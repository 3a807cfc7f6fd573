use json::JsonValue;

use std::fmt::{
	Display,
	Formatter,
	self
};

use ultraviolet::{
	mat::{
		Mat2,
		Mat3,
		Mat4
	},
	vec::{
		Vec2,
		Vec3,
		Vec4
	}
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AccessorValue {
	Matrix2x2(Mat2),
	Matrix3x3(Mat3),
	Matrix4x4(Mat4),
	Scalar(f32),
	Vector2(Vec2),
	Vector3(Vec3),
	Vector4(Vec4),
}

impl AccessorValue {
	/// Builds a value of the given shape from its components. Matrices are column-major.
	/// Returns `None` if the number of components doesn't match the shape.
	pub fn from_components(kind: AccessorType, c: &[f32]) -> Option<AccessorValue> {
		if c.len() != kind.component_count() {
			return None;
		}

		Some(match kind {
			AccessorType::Scalar => AccessorValue::Scalar(c[0]),
			AccessorType::Vec2 => AccessorValue::Vector2(Vec2::new(c[0], c[1])),
			AccessorType::Vec3 => AccessorValue::Vector3(Vec3::new(c[0], c[1], c[2])),
			AccessorType::Vec4 => AccessorValue::Vector4(Vec4::new(c[0], c[1], c[2], c[3])),
			AccessorType::Mat2 => AccessorValue::Matrix2x2(Mat2::new(
				Vec2::new(c[0], c[1]),
				Vec2::new(c[2], c[3]))),
			AccessorType::Mat3 => AccessorValue::Matrix3x3(Mat3::new(
				Vec3::new(c[0], c[1], c[2]),
				Vec3::new(c[3], c[4], c[5]),
				Vec3::new(c[6], c[7], c[8]))),
			AccessorType::Mat4 => AccessorValue::Matrix4x4(Mat4::new(
				Vec4::new(c[0], c[1], c[2], c[3]),
				Vec4::new(c[4], c[5], c[6], c[7]),
				Vec4::new(c[8], c[9], c[10], c[11]),
				Vec4::new(c[12], c[13], c[14], c[15]))),
		})
	}
}

/// Numeric kind of every component in an accessor, keyed by its GL enum
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum ComponentType {
	Int8 = 5120,
	UInt8,
	Int16,
	UInt16,
	UInt32 = 5125,
	Float,
}

impl ComponentType {
	pub const ALL: [ComponentType; 6] = [
		ComponentType::Int8,
		ComponentType::UInt8,
		ComponentType::Int16,
		ComponentType::UInt16,
		ComponentType::UInt32,
		ComponentType::Float,
	];

	pub fn from_code(code: u32) -> Option<ComponentType> {
		match code {
			5120 => Some(ComponentType::Int8),
			5121 => Some(ComponentType::UInt8),
			5122 => Some(ComponentType::Int16),
			5123 => Some(ComponentType::UInt16),
			5125 => Some(ComponentType::UInt32),
			5126 => Some(ComponentType::Float),
			_ => None,
		}
	}

	/// Size of a single component in bytes
	pub const fn size(self) -> usize {
		match self {
			ComponentType::Int8 | ComponentType::UInt8 => 1,
			ComponentType::Int16 | ComponentType::UInt16 => 2,
			ComponentType::UInt32 | ComponentType::Float => 4,
		}
	}

	pub const fn is_float(self) -> bool {
		matches!(self, ComponentType::Float)
	}

	/// Unsigned integer kinds are the only ones allowed for indices
	pub const fn is_unsigned_int(self) -> bool {
		matches!(self, ComponentType::UInt8 | ComponentType::UInt16 | ComponentType::UInt32)
	}
}

/// Element shape of an accessor
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum AccessorType {
	Scalar,
	Vec2,
	Vec3,
	Vec4,
	Mat2,
	Mat3,
	Mat4,
}

impl AccessorType {
	pub const ALL: [AccessorType; 7] = [
		AccessorType::Scalar,
		AccessorType::Vec2,
		AccessorType::Vec3,
		AccessorType::Vec4,
		AccessorType::Mat2,
		AccessorType::Mat3,
		AccessorType::Mat4,
	];

	pub fn from_name(name: &str) -> Option<AccessorType> {
		match name {
			"SCALAR" => Some(AccessorType::Scalar),
			"VEC2" => Some(AccessorType::Vec2),
			"VEC3" => Some(AccessorType::Vec3),
			"VEC4" => Some(AccessorType::Vec4),
			"MAT2" => Some(AccessorType::Mat2),
			"MAT3" => Some(AccessorType::Mat3),
			"MAT4" => Some(AccessorType::Mat4),
			_ => None,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			AccessorType::Scalar => "SCALAR",
			AccessorType::Vec2 => "VEC2",
			AccessorType::Vec3 => "VEC3",
			AccessorType::Vec4 => "VEC4",
			AccessorType::Mat2 => "MAT2",
			AccessorType::Mat3 => "MAT3",
			AccessorType::Mat4 => "MAT4",
		}
	}

	/// Number of components making up one element
	pub const fn component_count(self) -> usize {
		match self {
			AccessorType::Scalar => 1,
			AccessorType::Vec2 => 2,
			AccessorType::Vec3 => 3,
			AccessorType::Vec4 | AccessorType::Mat2 => 4,
			AccessorType::Mat3 => 9,
			AccessorType::Mat4 => 16,
		}
	}

	pub const fn is_matrix(self) -> bool {
		matches!(self, AccessorType::Mat2 | AccessorType::Mat3 | AccessorType::Mat4)
	}

	pub const fn is_vector(self) -> bool {
		matches!(self, AccessorType::Vec2 | AccessorType::Vec3 | AccessorType::Vec4)
	}
}

impl Display for AccessorType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Byte size of one element of the given kind
pub const fn element_size(component: ComponentType, kind: AccessorType) -> usize {
	component.size() * kind.component_count()
}

/// Reads a non-negative integer, as used for indices, offsets and counts
pub fn as_index(value: &JsonValue) -> Option<usize> {
	let n = value.as_f64()?;
	if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
		Some(n as usize)
	} else {
		None
	}
}

/// Reads an optional index. A present but malformed value is reported with the field's name.
pub fn opt_index(value: &JsonValue, field: &'static str) -> Result<Option<usize>, &'static str> {
	if value.is_null() {
		return Ok(None);
	}

	as_index(value).map(Some).ok_or(field)
}

/// Reads an optional string
pub fn opt_string(value: &JsonValue) -> Option<String> {
	value.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_component_codes() {
		for c in ComponentType::ALL {
			assert_eq!(Some(c), ComponentType::from_code(c as u32));
		}
		assert_eq!(5125, ComponentType::UInt32 as u32);
		assert_eq!(5126, ComponentType::Float as u32);
		assert_eq!(None, ComponentType::from_code(5124));
		assert_eq!(None, ComponentType::from_code(0));
	}

	#[test]
	fn test_type_names() {
		for t in AccessorType::ALL {
			assert_eq!(Some(t), AccessorType::from_name(t.name()));
		}
		assert_eq!(None, AccessorType::from_name("vec3"));
		assert_eq!(None, AccessorType::from_name("VEC5"));
	}

	#[test]
	fn test_element_sizes() {
		let sizes: [usize; 6] = [1, 1, 2, 2, 4, 4];
		let counts: [usize; 7] = [1, 2, 3, 4, 4, 9, 16];

		for (c, size) in ComponentType::ALL.iter().zip(sizes) {
			assert_eq!(size, c.size());
			for (t, count) in AccessorType::ALL.iter().zip(counts) {
				assert_eq!(count, t.component_count());
				assert_eq!(size * count, element_size(*c, *t));
			}
		}

		assert_eq!(64, element_size(ComponentType::Float, AccessorType::Mat4));
		assert_eq!(8, element_size(ComponentType::UInt16, AccessorType::Vec4));
	}

	#[test]
	fn test_indices() {
		assert_eq!(Some(3), as_index(&json::from(3)));
		assert_eq!(Some(0), as_index(&json::from(0.0)));
		assert_eq!(None, as_index(&json::from(-1)));
		assert_eq!(None, as_index(&json::from(1.5)));
		assert_eq!(None, as_index(&json::from("3")));
		assert_eq!(None, as_index(&JsonValue::Null));

		assert_eq!(Ok(None), opt_index(&JsonValue::Null, "mesh"));
		assert_eq!(Ok(Some(2)), opt_index(&json::from(2), "mesh"));
		assert_eq!(Err("mesh"), opt_index(&json::from(true), "mesh"));
	}

	#[test]
	fn test_value_from_components() {
		assert_eq!(Some(AccessorValue::Vector3(Vec3::new(1.0, 2.0, 3.0))),
			AccessorValue::from_components(AccessorType::Vec3, &[1.0, 2.0, 3.0]));
		assert_eq!(None, AccessorValue::from_components(AccessorType::Vec3, &[1.0, 2.0]));

		let identity: Vec<f32> = (0..16).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect();
		assert_eq!(Some(AccessorValue::Matrix4x4(Mat4::identity())),
			AccessorValue::from_components(AccessorType::Mat4, &identity));
	}
}
