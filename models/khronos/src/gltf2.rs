use json::JsonValue;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
	accessor::{
		Accessor,
		AccessorError
	},
	gltf::{
		as_index,
		opt_index,
		opt_string
	}
};

/// Triangles, the default primitive topology
pub const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Error)]
pub enum DocumentError {
	#[error("Accessor {index}: {source}")]
	Accessor {
		index: usize,
		source: AccessorError,
	},
	#[error("Invalid field: {0}")]
	InvalidField(String),
	#[error("JSON parsing error")]
	Json(#[from] json::Error),
	#[error("Missing required field: {0}")]
	MissingField(&'static str),
}

/// A broken reference between two sections of a document
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
	#[error("Mesh {mesh} primitive {primitive} refers to missing accessor {accessor}")]
	AccessorIndex {
		mesh: usize,
		primitive: usize,
		accessor: usize,
	},
	#[error("Buffer view {view} refers to missing buffer {buffer}")]
	BufferIndex {
		view: usize,
		buffer: usize,
	},
	#[error("Buffer {buffer} holds {actual} bytes but declares {declared}")]
	BufferTooShort {
		buffer: usize,
		declared: usize,
		actual: usize,
	},
	#[error("Accessor {accessor} refers to missing buffer view {view}")]
	BufferViewIndex {
		accessor: usize,
		view: usize,
	},
	#[error("Buffer view {view} ends at byte {end}, past the {length} bytes of buffer {buffer}")]
	BufferViewRange {
		view: usize,
		buffer: usize,
		end: usize,
		length: usize,
	},
	#[error("Node {node} refers to missing mesh {mesh}")]
	MeshIndex {
		node: usize,
		mesh: usize,
	},
	#[error("{owner} refers to missing node {node}")]
	NodeIndex {
		owner: String,
		node: usize,
	},
	#[error("Default scene {0} does not exist")]
	SceneIndex(usize),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Asset {
	pub version: String,
	pub generator: Option<String>,
	pub copyright: Option<String>,
	pub min_version: Option<String>,
}

impl Asset {
	fn read(obj: &JsonValue) -> Result<Asset, DocumentError> {
		if obj.is_null() {
			return Err(DocumentError::MissingField("asset"));
		}

		Ok(Asset {
			version: opt_string(&obj["version"]).ok_or(DocumentError::MissingField("asset.version"))?,
			generator: opt_string(&obj["generator"]),
			copyright: opt_string(&obj["copyright"]),
			min_version: opt_string(&obj["minVersion"]),
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
	pub name: Option<String>,
	pub byte_length: usize,
	/// Absent for the buffer backed by a GLB binary chunk
	pub uri: Option<String>,
}

impl Buffer {
	fn read(obj: &JsonValue) -> Result<Buffer, DocumentError> {
		Ok(Buffer {
			name: opt_string(&obj["name"]),
			byte_length: as_index(&obj["byteLength"]).ok_or(DocumentError::MissingField("buffer.byteLength"))?,
			uri: opt_string(&obj["uri"]),
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct BufferView {
	pub name: Option<String>,
	pub buffer: usize,
	pub byte_offset: usize,
	pub byte_length: usize,
	/// Distance between the starts of two elements. Absent means tightly packed.
	pub byte_stride: Option<usize>,
	pub target: Option<u32>,
}

impl BufferView {
	fn read(obj: &JsonValue) -> Result<BufferView, DocumentError> {
		Ok(BufferView {
			name: opt_string(&obj["name"]),
			buffer: as_index(&obj["buffer"]).ok_or(DocumentError::MissingField("bufferView.buffer"))?,
			byte_offset: field(opt_index(&obj["byteOffset"], "bufferView.byteOffset"))?.unwrap_or(0),
			byte_length: as_index(&obj["byteLength"])
				.ok_or(DocumentError::MissingField("bufferView.byteLength"))?,
			byte_stride: field(opt_index(&obj["byteStride"], "bufferView.byteStride"))?,
			target: obj["target"].as_u32(),
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshPrimitive {
	/// Attribute semantic (`POSITION`, `NORMAL`, ...) to accessor index
	pub attributes: BTreeMap<String, usize>,
	pub indices: Option<usize>,
	pub material: Option<usize>,
	pub mode: u32,
}

impl MeshPrimitive {
	fn read(obj: &JsonValue) -> Result<MeshPrimitive, DocumentError> {
		let mut attributes = BTreeMap::new();
		for (semantic, accessor) in obj["attributes"].entries() {
			let index = as_index(accessor)
				.ok_or_else(|| DocumentError::InvalidField(format!("attributes.{}", semantic)))?;
			attributes.insert(semantic.to_string(), index);
		}

		Ok(MeshPrimitive {
			attributes: attributes,
			indices: field(opt_index(&obj["indices"], "primitive.indices"))?,
			material: field(opt_index(&obj["material"], "primitive.material"))?,
			mode: obj["mode"].as_u32().unwrap_or(MODE_TRIANGLES),
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
	pub name: Option<String>,
	pub primitives: Vec<MeshPrimitive>,
}

impl Mesh {
	fn read(obj: &JsonValue) -> Result<Mesh, DocumentError> {
		Ok(Mesh {
			name: opt_string(&obj["name"]),
			primitives: obj["primitives"].members().map(MeshPrimitive::read).collect::<Result<_, _>>()?,
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub name: Option<String>,
	pub children: Vec<usize>,
	pub mesh: Option<usize>,
}

impl Node {
	fn read(obj: &JsonValue) -> Result<Node, DocumentError> {
		Ok(Node {
			name: opt_string(&obj["name"]),
			children: indices(&obj["children"], "node.children")?,
			mesh: field(opt_index(&obj["mesh"], "node.mesh"))?,
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	pub name: Option<String>,
	/// Root nodes
	pub nodes: Vec<usize>,
}

impl Scene {
	fn read(obj: &JsonValue) -> Result<Scene, DocumentError> {
		Ok(Scene {
			name: opt_string(&obj["name"]),
			nodes: indices(&obj["nodes"], "scene.nodes")?,
		})
	}
}

/// The JSON part of a glTF asset. glTF 2 refers to other objects by their index in the
/// top-level arrays; [`Document::validate`] checks that these indices resolve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
	pub asset: Asset,
	pub scene: Option<usize>,
	pub scenes: Vec<Scene>,
	pub nodes: Vec<Node>,
	pub meshes: Vec<Mesh>,
	pub accessors: Vec<Accessor>,
	pub buffer_views: Vec<BufferView>,
	pub buffers: Vec<Buffer>,
}

impl Document {
	pub fn from_json(text: &str) -> Result<Document, DocumentError> {
		Document::read(&json::parse(text)?)
	}

	pub fn read(root: &JsonValue) -> Result<Document, DocumentError> {
		let accessors = root["accessors"].members().enumerate()
			.map(|(i, a)| Accessor::load(a).map_err(|e| DocumentError::Accessor {
				index: i,
				source: e,
			}))
			.collect::<Result<_, _>>()?;

		Ok(Document {
			asset: Asset::read(&root["asset"])?,
			scene: field(opt_index(&root["scene"], "scene"))?,
			scenes: root["scenes"].members().map(Scene::read).collect::<Result<_, _>>()?,
			nodes: root["nodes"].members().map(Node::read).collect::<Result<_, _>>()?,
			meshes: root["meshes"].members().map(Mesh::read).collect::<Result<_, _>>()?,
			accessors: accessors,
			buffer_views: root["bufferViews"].members().map(BufferView::read).collect::<Result<_, _>>()?,
			buffers: root["buffers"].members().map(Buffer::read).collect::<Result<_, _>>()?,
		})
	}

	/// Every broken cross reference in the document, in section order
	pub fn violations(&self) -> Vec<ValidationError> {
		let mut errors = vec![];

		for (i, view) in self.buffer_views.iter().enumerate() {
			match self.buffers.get(view.buffer) {
				None => errors.push(ValidationError::BufferIndex {
					view: i,
					buffer: view.buffer,
				}),
				Some(buffer) => {
					let end = view.byte_offset.saturating_add(view.byte_length);
					if end > buffer.byte_length {
						errors.push(ValidationError::BufferViewRange {
							view: i,
							buffer: view.buffer,
							end: end,
							length: buffer.byte_length,
						});
					}
				},
			}
		}

		for (i, accessor) in self.accessors.iter().enumerate() {
			let sparse_views = accessor.sparse.iter()
				.flat_map(|s| [s.indices.buffer_view, s.values.buffer_view]);
			for view in accessor.buffer_view.into_iter().chain(sparse_views) {
				if view >= self.buffer_views.len() {
					errors.push(ValidationError::BufferViewIndex {
						accessor: i,
						view: view,
					});
				}
			}
		}

		for (m, mesh) in self.meshes.iter().enumerate() {
			for (p, primitive) in mesh.primitives.iter().enumerate() {
				let referenced = primitive.indices.into_iter().chain(primitive.attributes.values().copied());
				for accessor in referenced {
					if accessor >= self.accessors.len() {
						errors.push(ValidationError::AccessorIndex {
							mesh: m,
							primitive: p,
							accessor: accessor,
						});
					}
				}
			}
		}

		for (n, node) in self.nodes.iter().enumerate() {
			if let Some(mesh) = node.mesh.filter(|m| *m >= self.meshes.len()) {
				errors.push(ValidationError::MeshIndex {
					node: n,
					mesh: mesh,
				});
			}
			for child in node.children.iter().filter(|c| **c >= self.nodes.len()) {
				errors.push(ValidationError::NodeIndex {
					owner: format!("Node {}", n),
					node: *child,
				});
			}
		}

		for (s, scene) in self.scenes.iter().enumerate() {
			for node in scene.nodes.iter().filter(|n| **n >= self.nodes.len()) {
				errors.push(ValidationError::NodeIndex {
					owner: format!("Scene {}", s),
					node: *node,
				});
			}
		}

		if let Some(scene) = self.scene.filter(|s| *s >= self.scenes.len()) {
			errors.push(ValidationError::SceneIndex(scene));
		}

		errors
	}

	/// Returns the first broken cross reference, if any
	pub fn validate(&self) -> Result<(), ValidationError> {
		match self.violations().into_iter().next() {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}
}

fn field<T>(result: Result<T, &'static str>) -> Result<T, DocumentError> {
	result.map_err(|f| DocumentError::InvalidField(f.to_string()))
}

fn indices(value: &JsonValue, name: &'static str) -> Result<Vec<usize>, DocumentError> {
	value.members()
		.map(|v| as_index(v).ok_or_else(|| DocumentError::InvalidField(name.to_string())))
		.collect()
}
