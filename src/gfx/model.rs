//! glTF 2.0 model loading
//!
//! Turns a `.gltf` or `.glb` file into meshes and PBR materials stored in the
//! asset pool. Loading is synchronous CPU work intended for scene-setup time;
//! GPU upload happens later through [`Assets::upload`].
//!
//! Malformed input is handled at two granularities: problems that invalidate
//! the whole asset (missing file, unsupported extension, parse failure) fail
//! the load, while problems confined to a single primitive or texture are
//! logged and that unit is skipped or defaulted. Attribute data is read
//! through bounds-checked slices, so a corrupt accessor can never read
//! outside its backing buffer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gltf::accessor::{DataType, Dimensions};
use gltf::mesh::Mode;
use gltf::Semantic;
use log::{error, info, warn};
use thiserror::Error;

use super::assets::{Assets, MeshHandle, TextureHandle};
use super::material::{AlphaMode, PbrMaterial};
use super::mesh::Mesh;
use super::scene::vertex::Vertex;
use super::texture::Texture;

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const DEFAULT_TEX_COORDS: [f32; 2] = [0.0, 0.0];

/// Errors that fail an entire model load
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("glTF parse error: {0}")]
    Gltf(#[from] gltf::Error),
}

/// Result of loading a glTF asset.
///
/// Holds one mesh handle per loaded primitive, the material table, and a
/// parallel list mapping each mesh to its material index.
pub struct Model {
    name: String,
    meshes: Vec<MeshHandle>,
    materials: Vec<PbrMaterial>,
    mesh_material_indices: Vec<usize>,
}

fn default_material() -> &'static PbrMaterial {
    static DEFAULT: OnceLock<PbrMaterial> = OnceLock::new();
    DEFAULT.get_or_init(PbrMaterial::default)
}

impl Model {
    /// Loads a `.gltf`/`.glb` file, inserting meshes and textures into `assets`.
    pub fn load(path: impl AsRef<Path>, assets: &mut Assets) -> Result<Model, ModelError> {
        let path = path.as_ref();
        info!("loading model: {}", path.display());

        if !path.exists() {
            error!("model file not found: {}", path.display());
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let supported = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("gltf") || e.eq_ignore_ascii_case("glb"))
            .unwrap_or(false);
        if !supported {
            error!("unsupported model format: {}", path.display());
            return Err(ModelError::UnsupportedFormat(path.to_path_buf()));
        }

        let gltf = gltf::Gltf::open(path)?;
        let document = gltf.document;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let buffers = gltf::import_buffers(&document, Some(&directory), gltf.blob)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut loader = Loader {
            assets,
            directory,
            texture_cache: HashMap::new(),
        };

        let materials = loader.load_materials(&document, &buffers);
        let mut model = Model {
            name,
            meshes: Vec::new(),
            materials,
            mesh_material_indices: Vec::new(),
        };
        loader.load_meshes(&document, &buffers, &mut model);

        info!(
            "loaded model '{}': {} meshes, {} materials",
            model.name,
            model.meshes.len(),
            model.materials.len()
        );
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh_handles(&self) -> &[MeshHandle] {
        &self.meshes
    }

    pub fn materials(&self) -> &[PbrMaterial] {
        &self.materials
    }

    pub fn mesh_material_indices(&self) -> &[usize] {
        &self.mesh_material_indices
    }

    /// Material index for a mesh, `0` if the mesh index is out of range
    pub fn material_index_for_mesh(&self, mesh_index: usize) -> usize {
        self.mesh_material_indices
            .get(mesh_index)
            .copied()
            .unwrap_or(0)
    }

    /// Material for a mesh, falling back to the default material instead of
    /// panicking on any out-of-range index
    pub fn material_for_mesh(&self, mesh_index: usize) -> &PbrMaterial {
        let material_index = self.material_index_for_mesh(mesh_index);
        self.materials
            .get(material_index)
            .unwrap_or_else(|| default_material())
    }
}

/// Returns true when `count` elements of `elem_size` bytes starting at
/// `offset` fit inside `available` bytes. Overflow-safe.
fn span_fits(offset: usize, count: usize, elem_size: usize, available: usize) -> bool {
    count
        .checked_mul(elem_size)
        .and_then(|bytes| bytes.checked_add(offset))
        .map_or(false, |end| end <= available)
}

struct Loader<'a> {
    assets: &'a mut Assets,
    directory: PathBuf,
    /// Dedup cache: glTF texture index -> pool handle, per load call
    texture_cache: HashMap<usize, TextureHandle>,
}

impl<'a> Loader<'a> {
    fn load_materials(
        &mut self,
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Vec<PbrMaterial> {
        let mut materials = Vec::new();

        for gltf_material in document.materials() {
            let pbr = gltf_material.pbr_metallic_roughness();

            let mut material = PbrMaterial::new(
                gltf_material.name().unwrap_or("Material"),
                pbr.base_color_factor(),
                pbr.metallic_factor(),
                pbr.roughness_factor(),
            );

            if let Some(info) = pbr.base_color_texture() {
                material.base_color_texture = self.load_texture(info.texture(), buffers);
            }
            if let Some(info) = pbr.metallic_roughness_texture() {
                material.metallic_roughness_texture = self.load_texture(info.texture(), buffers);
            }
            if let Some(normal) = gltf_material.normal_texture() {
                material.normal_texture = self.load_texture(normal.texture(), buffers);
            }
            if let Some(occlusion) = gltf_material.occlusion_texture() {
                material.occlusion_texture = self.load_texture(occlusion.texture(), buffers);
            }
            if let Some(info) = gltf_material.emissive_texture() {
                material.emissive_texture = self.load_texture(info.texture(), buffers);
            }

            material.emissive_factor = gltf_material.emissive_factor();

            material.alpha_mode = match gltf_material.alpha_mode() {
                gltf::material::AlphaMode::Mask => {
                    material.alpha_cutoff = gltf_material.alpha_cutoff().unwrap_or(0.5);
                    AlphaMode::Mask
                }
                gltf::material::AlphaMode::Blend => AlphaMode::Blend,
                gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            };

            material.double_sided = gltf_material.double_sided();

            materials.push(material);
        }

        // Every mesh must resolve to some material index
        if materials.is_empty() {
            materials.push(default_material().clone());
        }

        materials
    }

    fn load_meshes(
        &mut self,
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        model: &mut Model,
    ) {
        for gltf_mesh in document.meshes() {
            let mesh_name = gltf_mesh.name().unwrap_or("");

            for primitive in gltf_mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    warn!("skipping non-triangle primitive in mesh '{}'", mesh_name);
                    continue;
                }

                let Some(pos_accessor) = primitive.get(&Semantic::Positions) else {
                    warn!("mesh primitive missing POSITION attribute, skipping");
                    continue;
                };

                let Some(positions) =
                    self.attribute_f32(&pos_accessor, Dimensions::Vec3, buffers, "POSITION")
                else {
                    continue;
                };
                let vertex_count = pos_accessor.count();

                let normals = primitive
                    .get(&Semantic::Normals)
                    .and_then(|a| self.attribute_f32(&a, Dimensions::Vec3, buffers, "NORMAL"))
                    .filter(|data| data.len() >= vertex_count * 3);

                let tex_coords = primitive
                    .get(&Semantic::TexCoords(0))
                    .and_then(|a| self.attribute_f32(&a, Dimensions::Vec2, buffers, "TEXCOORD_0"))
                    .filter(|data| data.len() >= vertex_count * 2);

                let (colors, color_components) = self.load_colors(&primitive, buffers, vertex_count);

                let mut vertices = Vec::with_capacity(vertex_count);
                for i in 0..vertex_count {
                    let position = [
                        positions[i * 3],
                        positions[i * 3 + 1],
                        positions[i * 3 + 2],
                    ];

                    let normal = normals
                        .as_ref()
                        .map(|n| [n[i * 3], n[i * 3 + 1], n[i * 3 + 2]])
                        .unwrap_or(DEFAULT_NORMAL);

                    let uv = tex_coords
                        .as_ref()
                        .map(|t| [t[i * 2], t[i * 2 + 1]])
                        .unwrap_or(DEFAULT_TEX_COORDS);

                    let color = colors
                        .as_ref()
                        .map(|c| {
                            [
                                c[i * color_components],
                                c[i * color_components + 1],
                                c[i * color_components + 2],
                                if color_components == 4 {
                                    c[i * color_components + 3]
                                } else {
                                    1.0
                                },
                            ]
                        })
                        .unwrap_or(DEFAULT_COLOR);

                    vertices.push(Vertex::new(position, normal, color, uv));
                }

                let indices = match primitive.indices() {
                    Some(accessor) => match self.decode_indices(&accessor, buffers) {
                        Some(indices) => indices,
                        None => continue, // unsupported or corrupt index data
                    },
                    None => (0..vertex_count as u32).collect(),
                };

                let handle = self.assets.add_mesh(Mesh::new(vertices, indices));
                model.meshes.push(handle);

                let material_index = match primitive.material().index() {
                    Some(index) if index < model.materials.len() => index,
                    Some(index) => {
                        warn!("material index {} out of bounds, using default", index);
                        0
                    }
                    None => 0,
                };
                model.mesh_material_indices.push(material_index);
            }
        }
    }

    /// Reads a float attribute as a tightly-packed slice of f32 values.
    ///
    /// Returns `None` (with a log line) for sparse accessors, interleaved
    /// buffer views, non-float components, dimension mismatches, or data
    /// that would run past the end of its buffer.
    fn attribute_f32(
        &self,
        accessor: &gltf::Accessor,
        dimensions: Dimensions,
        buffers: &[gltf::buffer::Data],
        what: &str,
    ) -> Option<Vec<f32>> {
        if accessor.data_type() != DataType::F32 || accessor.dimensions() != dimensions {
            warn!("{} attribute has unsupported layout, skipping", what);
            return None;
        }

        let components = match dimensions {
            Dimensions::Vec2 => 2,
            Dimensions::Vec3 => 3,
            Dimensions::Vec4 => 4,
            _ => return None,
        };
        let elem_size = components * std::mem::size_of::<f32>();

        let bytes = self.accessor_bytes(accessor, elem_size, buffers, what)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }

    /// Resolves the raw bytes behind an accessor, enforcing tight packing and
    /// buffer bounds
    fn accessor_bytes<'b>(
        &self,
        accessor: &gltf::Accessor,
        elem_size: usize,
        buffers: &'b [gltf::buffer::Data],
        what: &str,
    ) -> Option<&'b [u8]> {
        let Some(view) = accessor.view() else {
            warn!("{} uses a sparse accessor, skipping", what);
            return None;
        };

        if let Some(stride) = view.stride() {
            if stride != elem_size {
                error!(
                    "{} buffer has unsupported byte stride ({}), cannot load interleaved data",
                    what, stride
                );
                return None;
            }
        }

        let buffer = buffers.get(view.buffer().index())?;
        let start = view.offset() + accessor.offset();
        if !span_fits(start, accessor.count(), elem_size, buffer.len()) {
            error!("{} buffer too small for accessor count, skipping", what);
            return None;
        }

        Some(&buffer[start..start + accessor.count() * elem_size])
    }

    /// COLOR_0 handling: float components are honored; normalized-integer
    /// encodings are detected and left undecoded (default color is used).
    fn load_colors(
        &self,
        primitive: &gltf::Primitive,
        buffers: &[gltf::buffer::Data],
        vertex_count: usize,
    ) -> (Option<Vec<f32>>, usize) {
        let Some(accessor) = primitive.get(&Semantic::Colors(0)) else {
            return (None, 0);
        };

        let components = match accessor.dimensions() {
            Dimensions::Vec4 => 4,
            _ => 3,
        };

        match accessor.data_type() {
            DataType::F32 => {
                let dims = accessor.dimensions();
                let colors = self
                    .attribute_f32(&accessor, dims, buffers, "COLOR_0")
                    .filter(|data| data.len() >= vertex_count * components);
                (colors, components)
            }
            DataType::U8 | DataType::U16 => {
                warn!("normalized integer COLOR_0 not supported, using default color");
                (None, 0)
            }
            other => {
                warn!("COLOR_0 component type {:?} not supported, using default color", other);
                (None, 0)
            }
        }
    }

    /// Decodes an index accessor, widening u8/u16 to u32. Any other component
    /// type fails the primitive.
    fn decode_indices(
        &self,
        accessor: &gltf::Accessor,
        buffers: &[gltf::buffer::Data],
    ) -> Option<Vec<u32>> {
        let elem_size = match accessor.data_type() {
            DataType::U8 => 1,
            DataType::U16 => 2,
            DataType::U32 => 4,
            other => {
                error!("unsupported index component type: {:?}", other);
                return None;
            }
        };

        let bytes = self.accessor_bytes(accessor, elem_size, buffers, "indices")?;

        Some(match accessor.data_type() {
            DataType::U8 => bytes.iter().map(|&b| b as u32).collect(),
            DataType::U16 => bytes
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]) as u32)
                .collect(),
            _ => bytes
                .chunks_exact(4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        })
    }

    /// Loads a texture by glTF texture index, deduplicating within this load
    /// call. Returns `None` (absent slot, not an error) when the image has no
    /// usable pixel source.
    fn load_texture(
        &mut self,
        texture: gltf::Texture,
        buffers: &[gltf::buffer::Data],
    ) -> Option<TextureHandle> {
        let index = texture.index();
        if let Some(&handle) = self.texture_cache.get(&index) {
            return Some(handle);
        }

        let image = texture.source();
        let name = image.name().unwrap_or("texture");

        let decoded = match image.source() {
            gltf::image::Source::View { view, .. } => {
                let buffer = buffers.get(view.buffer().index())?;
                let start = view.offset();
                let end = start.checked_add(view.length())?;
                if view.length() == 0 || end > buffer.len() {
                    warn!("embedded image '{}' is empty or out of bounds, skipping", name);
                    return None;
                }
                match Texture::from_bytes(name, &buffer[start..end]) {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!("failed to decode embedded image '{}': {}", name, e);
                        return None;
                    }
                }
            }
            gltf::image::Source::Uri { uri, .. } => {
                if uri.starts_with("data:") {
                    warn!("data-URI images are not supported, skipping '{}'", name);
                    return None;
                }
                let full_path = self.directory.join(uri);
                match Texture::from_file(&full_path) {
                    Ok(texture) => texture,
                    Err(e) => {
                        warn!("failed to load image '{}': {}", full_path.display(), e);
                        return None;
                    }
                }
            }
        };

        let handle = self.assets.add_texture(decoded);
        self.texture_cache.insert(index, handle);
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Writes a glTF fixture (plus optional sidecar files) into a fresh temp
    /// directory and returns the path of the .gltf file.
    fn write_fixture(test: &str, json: &str, sidecars: &[(&str, Vec<u8>)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brume-model-{}-{}", std::process::id(), test));
        fs::create_dir_all(&dir).unwrap();
        for (name, bytes) in sidecars {
            fs::write(dir.join(name), bytes).unwrap();
        }
        let path = dir.join("model.gltf");
        fs::write(&path, json).unwrap();
        path
    }

    fn le_bytes(floats: &[f32]) -> Vec<u8> {
        floats.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// 3 vec3 positions followed by 3 u16 indices
    fn triangle_bin() -> Vec<u8> {
        let mut bytes = le_bytes(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0,
        ]);
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes
    }

    const INDEXED_TRIANGLE: &str = r#"{
        "asset": {"version": "2.0"},
        "buffers": [{"uri": "tri.bin", "byteLength": 42}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}]
    }"#;

    #[test]
    fn missing_file_fails_without_touching_the_pool() {
        let mut assets = Assets::new();
        let result = Model::load("/nonexistent/brume-no-such-model.gltf", &mut assets);
        assert!(matches!(result, Err(ModelError::NotFound(_))));
        assert_eq!(assets.mesh_count(), 0);
        assert_eq!(assets.texture_count(), 0);
    }

    #[test]
    fn unsupported_extension_fails() {
        let dir = std::env::temp_dir().join(format!("brume-model-{}-ext", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.obj");
        fs::write(&path, "not a gltf").unwrap();

        let mut assets = Assets::new();
        let result = Model::load(&path, &mut assets);
        assert!(matches!(result, Err(ModelError::UnsupportedFormat(_))));
    }

    #[test]
    fn indexed_triangle_loads_with_defaults() {
        let path = write_fixture("indexed", INDEXED_TRIANGLE, &[("tri.bin", triangle_bin())]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        assert_eq!(model.mesh_count(), 1);
        assert_eq!(model.mesh_material_indices().len(), 1);
        // No materials in the asset -> one default injected
        assert_eq!(model.materials().len(), 1);
        assert_eq!(model.material_index_for_mesh(0), 0);

        let mesh = assets.mesh(model.mesh_handles()[0]).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);

        // Missing attributes resolve to documented defaults
        let v = &mesh.vertices()[1];
        assert_eq!(v.position, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        assert_eq!(v.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(v.tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn missing_indices_are_synthesized() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "tri.bin", "byteLength": 42}],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 36}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}
            ],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
        }"#;
        let path = write_fixture("noindex", json, &[("tri.bin", triangle_bin())]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        let mesh = assets.mesh(model.mesh_handles()[0]).unwrap();
        assert_eq!(mesh.indices(), &[0, 1, 2]);
    }

    #[test]
    fn non_triangle_primitives_are_skipped() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "tri.bin", "byteLength": 42}],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 36}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}
            ],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "mode": 1}]}]
        }"#;
        let path = write_fixture("lines", json, &[("tri.bin", triangle_bin())]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();
        assert_eq!(model.mesh_count(), 0);
        assert_eq!(model.mesh_material_indices().len(), 0);
    }

    #[test]
    fn interleaved_positions_are_skipped() {
        // byteStride 24 on a vec3 float accessor marks interleaved data
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "wide.bin", "byteLength": 72}],
            "bufferViews": [{"buffer": 0, "byteOffset": 0, "byteLength": 72, "byteStride": 24}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}
            ],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
        }"#;
        let path = write_fixture("stride", json, &[("wide.bin", vec![0u8; 72])]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();
        assert_eq!(model.mesh_count(), 0);
    }

    #[test]
    fn material_factors_and_alpha_mode_are_mapped() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "tri.bin", "byteLength": 42}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "materials": [{
                "name": "painted",
                "pbrMetallicRoughness": {
                    "baseColorFactor": [0.9, 0.5, 0.3, 1.0],
                    "metallicFactor": 0.25,
                    "roughnessFactor": 0.75
                },
                "emissiveFactor": [0.1, 0.2, 0.3],
                "alphaMode": "MASK",
                "alphaCutoff": 0.35,
                "doubleSided": true
            }],
            "meshes": [{"primitives": [
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 0}
            ]}]
        }"#;
        let path = write_fixture("material", json, &[("tri.bin", triangle_bin())]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        let material = model.material_for_mesh(0);
        assert_eq!(material.name, "painted");
        assert_eq!(material.base_color, [0.9, 0.5, 0.3, 1.0]);
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.roughness, 0.75);
        assert_eq!(material.emissive_factor, [0.1, 0.2, 0.3]);
        assert_eq!(material.alpha_mode, AlphaMode::Mask);
        assert_eq!(material.alpha_cutoff, 0.35);
        assert!(material.double_sided);
    }

    #[test]
    fn out_of_range_mesh_index_resolves_to_default_material() {
        let path = write_fixture("fallback", INDEXED_TRIANGLE, &[("tri.bin", triangle_bin())]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        assert_eq!(model.material_index_for_mesh(99), 0);
        let material = model.material_for_mesh(99);
        assert_eq!(material.base_color, [0.8, 0.8, 0.8, 1.0]);
    }

    #[test]
    fn float_vertex_colors_are_honored() {
        // positions (36) + vec3 colors (36) + u16 indices (6)
        let mut bytes = le_bytes(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0,
        ]);
        bytes.extend(le_bytes(&[
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ]));
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }

        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "col.bin", "byteLength": 78}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 36},
                {"buffer": 0, "byteOffset": 72, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"},
                {"bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "meshes": [{"primitives": [
                {"attributes": {"POSITION": 0, "COLOR_0": 1}, "indices": 2}
            ]}]
        }"#;
        let path = write_fixture("colors", json, &[("col.bin", bytes)]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        let mesh = assets.mesh(model.mesh_handles()[0]).unwrap();
        assert_eq!(mesh.vertices()[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices()[2].color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn normalized_integer_colors_fall_back_to_white() {
        // positions (36) + u8 vec4 colors (12) + u16 indices (6)
        let mut bytes = le_bytes(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0,
        ]);
        bytes.extend_from_slice(&[255u8; 12]);
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }

        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "ncol.bin", "byteLength": 54}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 12},
                {"buffer": 0, "byteOffset": 48, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5121, "normalized": true, "count": 3, "type": "VEC4"},
                {"bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "meshes": [{"primitives": [
                {"attributes": {"POSITION": 0, "COLOR_0": 1}, "indices": 2}
            ]}]
        }"#;
        let path = write_fixture("normcolors", json, &[("ncol.bin", bytes)]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        // Primitive still loads; color is the default, not decoded
        assert_eq!(model.mesh_count(), 1);
        let mesh = assets.mesh(model.mesh_handles()[0]).unwrap();
        assert_eq!(mesh.vertices()[0].color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn textures_are_deduplicated_by_source_index() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 100, 50, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        // Base color and emissive both reference texture 0
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "tri.bin", "byteLength": 42}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "images": [{"uri": "tex.png"}],
            "textures": [{"source": 0}],
            "materials": [{
                "pbrMetallicRoughness": {"baseColorTexture": {"index": 0}},
                "emissiveTexture": {"index": 0}
            }],
            "meshes": [{"primitives": [
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 0}
            ]}]
        }"#;
        let path = write_fixture(
            "dedup",
            json,
            &[("tri.bin", triangle_bin()), ("tex.png", png)],
        );
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        let material = model.material_for_mesh(0);
        assert_eq!(assets.texture_count(), 1);
        assert_eq!(material.base_color_texture, material.emissive_texture);
        assert!(material.base_color_texture.is_some());
    }

    #[test]
    fn missing_image_file_leaves_slot_absent_but_loads_model() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "tri.bin", "byteLength": 42}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "images": [{"uri": "missing.png"}],
            "textures": [{"source": 0}],
            "materials": [{
                "pbrMetallicRoughness": {"baseColorTexture": {"index": 0}}
            }],
            "meshes": [{"primitives": [
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 0}
            ]}]
        }"#;
        let path = write_fixture("noimage", json, &[("tri.bin", triangle_bin())]);
        let mut assets = Assets::new();
        let model = Model::load(&path, &mut assets).unwrap();

        assert_eq!(model.mesh_count(), 1);
        assert!(model.material_for_mesh(0).base_color_texture.is_none());
        assert_eq!(assets.texture_count(), 0);
    }

    #[test]
    fn span_fits_is_overflow_safe() {
        assert!(span_fits(0, 3, 12, 36));
        assert!(span_fits(4, 2, 2, 8));
        assert!(!span_fits(1, 3, 12, 36));
        assert!(!span_fits(0, usize::MAX, 12, usize::MAX));
        assert!(!span_fits(usize::MAX, 1, 1, usize::MAX));
    }
}
