//! Per-sphere instance records and the interleaved vertex buffer that
//! carries them behind the shared mesh.
//!
//! The vertex buffer is one flat byte array: the mesh positions followed by
//! every [`InstanceRecord`]. Mesh attributes advance once per vertex with a
//! 12-byte stride; instance attributes advance once per instance with a
//! 36-byte stride, at offsets measured from the start of the same buffer.

use std::mem::{offset_of, size_of};

use super::mesh::{SphereMesh, MESH_VERTEX_STRIDE};
use crate::codec::MAX_EXACT_IDENTIFIER;

/// One sphere: where it is, how big, what color, and its identity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRecord {
    /// Sphere center in world space.
    pub location: [f32; 3],
    /// Sphere radius (non-negative).
    pub radius: f32,
    /// Linear RGB in `[0, 1]`.
    pub color: [f32; 3],
    /// Per-atom index, written to the index channel.
    pub index: u32,
    /// Group (e.g. chain or subunit) id, written to the group channel.
    pub group: u32,
}

/// Byte stride of one instance record.
pub const INSTANCE_STRIDE: u64 = size_of::<InstanceRecord>() as u64;

impl InstanceRecord {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(
        location: [f32; 3],
        radius: f32,
        color: [f32; 3],
        index: u32,
        group: u32,
    ) -> Self {
        Self {
            location,
            radius,
            color,
            index,
            group,
        }
    }
}

/// How often an attribute's fetch position advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRate {
    /// Once per mesh vertex.
    Vertex,
    /// Once per instance.
    Instance,
}

impl From<StepRate> for wgpu::VertexStepMode {
    fn from(rate: StepRate) -> Self {
        match rate {
            StepRate::Vertex => Self::Vertex,
            StepRate::Instance => Self::Instance,
        }
    }
}

/// Vertex shader inputs read from the interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Unit-sphere vertex position.
    Position,
    /// Instance center.
    Location,
    /// Instance radius.
    Radius,
    /// Instance color.
    Color,
    /// Instance index.
    Index,
    /// Instance group.
    Group,
}

/// Where one attribute lives inside the interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Which input this is.
    pub attribute: Attribute,
    /// `@location` in the vertex shader.
    pub shader_location: u32,
    /// Component format.
    pub format: wgpu::VertexFormat,
    /// Absolute byte offset of element 0 from the start of the buffer.
    pub offset: u64,
    /// Distance between consecutive elements.
    pub stride: u64,
    /// Advance rate.
    pub step: StepRate,
}

impl AttributeSpec {
    /// Read element `element` of this attribute from `bytes`.
    ///
    /// Returns `None` if `T` does not match the attribute's format size or
    /// the element lies outside the buffer.
    #[must_use]
    pub fn fetch<T: bytemuck::AnyBitPattern>(
        &self,
        bytes: &[u8],
        element: u64,
    ) -> Option<T> {
        let size = size_of::<T>() as u64;
        if size != self.format.size() {
            return None;
        }
        let start = usize::try_from(self.offset + self.stride * element).ok()?;
        let end = start.checked_add(size as usize)?;
        bytemuck::try_pod_read_unaligned(bytes.get(start..end)?).ok()
    }
}

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    1 => Float32x3,
    2 => Float32,
    3 => Float32x3,
    4 => Uint32,
    5 => Uint32
];

/// Attribute table for a buffer whose mesh part is `mesh_byte_len` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeLayout {
    mesh_byte_len: u64,
    attributes: Vec<AttributeSpec>,
}

impl AttributeLayout {
    /// Describe a buffer holding `mesh_byte_len` bytes of positions followed
    /// by instance records.
    #[must_use]
    pub fn new(mesh_byte_len: u64) -> Self {
        let instance = |attribute, shader_location, format, field: usize| {
            AttributeSpec {
                attribute,
                shader_location,
                format,
                offset: mesh_byte_len + field as u64,
                stride: INSTANCE_STRIDE,
                step: StepRate::Instance,
            }
        };
        let attributes = vec![
            AttributeSpec {
                attribute: Attribute::Position,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                stride: MESH_VERTEX_STRIDE,
                step: StepRate::Vertex,
            },
            instance(
                Attribute::Location,
                1,
                wgpu::VertexFormat::Float32x3,
                offset_of!(InstanceRecord, location),
            ),
            instance(
                Attribute::Radius,
                2,
                wgpu::VertexFormat::Float32,
                offset_of!(InstanceRecord, radius),
            ),
            instance(
                Attribute::Color,
                3,
                wgpu::VertexFormat::Float32x3,
                offset_of!(InstanceRecord, color),
            ),
            instance(
                Attribute::Index,
                4,
                wgpu::VertexFormat::Uint32,
                offset_of!(InstanceRecord, index),
            ),
            instance(
                Attribute::Group,
                5,
                wgpu::VertexFormat::Uint32,
                offset_of!(InstanceRecord, group),
            ),
        ];
        Self {
            mesh_byte_len,
            attributes,
        }
    }

    /// Byte offset where instance records begin. Vertex slot 1 is bound
    /// here.
    #[must_use]
    pub const fn instance_base(&self) -> u64 {
        self.mesh_byte_len
    }

    /// All attributes in shader-location order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Look up one attribute.
    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.attribute == attribute)
    }

    /// Two wgpu buffer layouts over the same buffer: slot 0 bound at offset
    /// 0 and slot 1 bound at [`Self::instance_base`]. Offsets are relative
    /// to those bind points.
    #[must_use]
    pub fn vertex_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
        [
            wgpu::VertexBufferLayout {
                array_stride: MESH_VERTEX_STRIDE,
                step_mode: StepRate::Vertex.into(),
                attributes: &MESH_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: INSTANCE_STRIDE,
                step_mode: StepRate::Instance.into(),
                attributes: &INSTANCE_ATTRIBUTES,
            },
        ]
    }
}

/// CPU-side result of [`InstanceGeometry::build`], ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGeometry {
    /// Mesh positions followed by instance records.
    pub vertex_bytes: Vec<u8>,
    /// Mesh triangle list.
    pub indices: Vec<u16>,
    /// Indices per instance.
    pub draw_count: u32,
    /// Number of instances (zero draws nothing).
    pub instance_count: u32,
    /// Attribute placement inside `vertex_bytes`.
    pub layout: AttributeLayout,
}

impl InstanceGeometry {
    /// Concatenate `mesh` and `instances` into one vertex buffer.
    #[must_use]
    pub fn build(mesh: &SphereMesh, instances: &[InstanceRecord]) -> Self {
        let overflow = instances
            .iter()
            .filter(|r| {
                r.index > MAX_EXACT_IDENTIFIER || r.group > MAX_EXACT_IDENTIFIER
            })
            .count();
        if overflow > 0 {
            log::warn!(
                "{overflow} instance(s) carry identifiers above {MAX_EXACT_IDENTIFIER}; \
                 they will not decode exactly"
            );
        }

        let mesh_bytes = mesh.vertex_bytes();
        let instance_bytes: &[u8] = bytemuck::cast_slice(instances);
        let mut vertex_bytes =
            Vec::with_capacity(mesh_bytes.len() + instance_bytes.len());
        vertex_bytes.extend_from_slice(mesh_bytes);
        vertex_bytes.extend_from_slice(instance_bytes);

        log::debug!(
            "built instance geometry: {} instances, {} bytes",
            instances.len(),
            vertex_bytes.len()
        );

        Self {
            vertex_bytes,
            indices: mesh.indices.clone(),
            draw_count: mesh.index_count(),
            instance_count: instances.len() as u32,
            layout: AttributeLayout::new(mesh.byte_len()),
        }
    }

    /// Read back instance `i` through the attribute table.
    #[must_use]
    pub fn instance(&self, i: u32) -> Option<InstanceRecord> {
        if i >= self.instance_count {
            return None;
        }
        let i = u64::from(i);
        let bytes = &self.vertex_bytes;
        let field = |a: Attribute| self.layout.get(a);
        Some(InstanceRecord {
            location: field(Attribute::Location)?.fetch(bytes, i)?,
            radius: field(Attribute::Radius)?.fetch(bytes, i)?,
            color: field(Attribute::Color)?.fetch(bytes, i)?,
            index: field(Attribute::Index)?.fetch(bytes, i)?,
            group: field(Attribute::Group)?.fetch(bytes, i)?,
        })
    }

    /// Read back mesh vertex `v` through the attribute table.
    #[must_use]
    pub fn mesh_position(&self, v: u32) -> Option<[f32; 3]> {
        self.layout
            .get(Attribute::Position)?
            .fetch(&self.vertex_bytes, u64::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: u32) -> Vec<InstanceRecord> {
        (0..n)
            .map(|i| {
                InstanceRecord::new(
                    [i as f32, 0.5, -1.0],
                    0.25 + i as f32,
                    [0.1, 0.2, 0.3],
                    i,
                    i / 2,
                )
            })
            .collect()
    }

    #[test]
    fn record_is_nine_words() {
        assert_eq!(INSTANCE_STRIDE, 36);
    }

    #[test]
    fn buffer_length_invariant() {
        let mesh = SphereMesh::default();
        for n in [0, 1, 3, 257] {
            let geometry = InstanceGeometry::build(&mesh, &sample(n));
            assert_eq!(
                geometry.vertex_bytes.len() as u64,
                mesh.byte_len() + u64::from(n) * INSTANCE_STRIDE
            );
            assert_eq!(geometry.instance_count, n);
            assert_eq!(geometry.draw_count, mesh.index_count());
        }
    }

    #[test]
    fn empty_instance_set_is_valid() {
        let geometry = InstanceGeometry::build(&SphereMesh::default(), &[]);
        assert_eq!(geometry.instance_count, 0);
        assert_eq!(geometry.instance(0), None);
    }

    #[test]
    fn instance_offsets_start_after_mesh() {
        let mesh = SphereMesh::default();
        let layout = AttributeLayout::new(mesh.byte_len());
        let location = layout.get(Attribute::Location).unwrap();
        let group = layout.get(Attribute::Group).unwrap();
        assert_eq!(location.offset, mesh.byte_len());
        assert_eq!(group.offset, mesh.byte_len() + 32);
        assert_eq!(group.stride, INSTANCE_STRIDE);
        assert_eq!(group.step, StepRate::Instance);

        let position = layout.get(Attribute::Position).unwrap();
        assert_eq!(position.stride, 12);
        assert_eq!(position.step, StepRate::Vertex);
    }

    #[test]
    fn records_read_back_through_layout() {
        let mesh = SphereMesh::default();
        let records = sample(5);
        let geometry = InstanceGeometry::build(&mesh, &records);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(geometry.instance(i as u32).as_ref(), Some(record));
        }
        assert_eq!(geometry.mesh_position(7), Some(mesh.positions[7]));
    }

    #[test]
    fn wgpu_layouts_match_attribute_table() {
        let layout = AttributeLayout::new(SphereMesh::default().byte_len());
        let [mesh_slot, instance_slot] = AttributeLayout::vertex_buffer_layouts();
        assert_eq!(mesh_slot.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(instance_slot.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(instance_slot.array_stride, INSTANCE_STRIDE);

        for spec in layout.attributes() {
            let (slot, base) = match spec.step {
                StepRate::Vertex => (&mesh_slot, 0),
                StepRate::Instance => (&instance_slot, layout.instance_base()),
            };
            let attr = slot
                .attributes
                .iter()
                .find(|a| a.shader_location == spec.shader_location)
                .unwrap();
            assert_eq!(attr.offset + base, spec.offset);
            assert_eq!(attr.format, spec.format);
        }
    }

    #[test]
    fn fetch_rejects_mismatched_type() {
        let geometry = InstanceGeometry::build(&SphereMesh::default(), &sample(1));
        let radius = geometry.layout.get(Attribute::Radius).unwrap();
        assert_eq!(radius.fetch::<[f32; 3]>(&geometry.vertex_bytes, 0), None);
        assert_eq!(radius.fetch::<f32>(&geometry.vertex_bytes, 1), None);
    }
}
