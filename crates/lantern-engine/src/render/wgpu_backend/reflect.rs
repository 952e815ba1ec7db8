//! WGSL front-end checks and uniform-block reflection.
//!
//! Programs keep their uniforms in a single struct bound at `@group(0) @binding(0)`.
//! Its members become the named uniform locations exposed through `GpuBackend`.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::render::backend::UniformValue;
use crate::render::error::GpuError;

pub(crate) const VERTEX_ENTRY: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";

/// Smallest uniform binding we hand to wgpu.
const MIN_BLOCK_SIZE: u32 = 16;

/// One member of a program's uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformField {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    /// Element stride for array members.
    pub stride: Option<u32>,
}

/// Reflected `@group(0) @binding(0)` uniform struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformBlock {
    pub fields: Vec<UniformField>,
    pub size: u32,
}

impl UniformBlock {
    fn empty() -> Self {
        Self { fields: Vec::new(), size: MIN_BLOCK_SIZE }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Serializes `value` into `shadow` at the field's offset. Writes never cross the
    /// field's extent.
    pub fn write(&self, shadow: &mut [u8], index: usize, value: &UniformValue) {
        let Some(field) = self.fields.get(index) else { return };
        let start = field.offset as usize;
        let end = (field.offset + field.size) as usize;
        let Some(dst) = shadow.get_mut(start..end) else { return };

        match value {
            UniformValue::Int(v) => copy_clamped(dst, bytemuck::bytes_of(v)),
            UniformValue::Float(v) => copy_clamped(dst, bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => copy_clamped(dst, bytemuck::cast_slice(v)),
            UniformValue::Vec3(v) => copy_clamped(dst, bytemuck::cast_slice(v)),
            UniformValue::Vec4(v) => copy_clamped(dst, bytemuck::cast_slice(v)),
            UniformValue::Mat4(m) => copy_clamped(dst, bytemuck::cast_slice(m)),
            UniformValue::Vec3Array(items) => write_array(dst, field.stride, items),
            UniformValue::Vec4Array(items) => write_array(dst, field.stride, items),
        }
    }
}

fn copy_clamped(dst: &mut [u8], src: &[u8]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

fn write_array<T: bytemuck::Pod>(dst: &mut [u8], stride: Option<u32>, items: &[T]) {
    let stride = stride.map(|s| s as usize).unwrap_or(std::mem::size_of::<T>());
    for (i, item) in items.iter().enumerate() {
        let start = i * stride;
        if start >= dst.len() {
            break;
        }
        copy_clamped(&mut dst[start..], bytemuck::bytes_of(item));
    }
}

/// Parses and validates a WGSL module, then reflects its uniform block.
pub(crate) fn parse_module(label: &str, source: &str) -> Result<(naga::Module, UniformBlock), GpuError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| GpuError::ShaderCompile {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| GpuError::ShaderCompile {
            label: label.to_string(),
            message: e.emit_to_string(source),
        })?;

    let block = uniform_block(&module);
    Ok((module, block))
}

pub(crate) fn require_entry(
    label: &str,
    module: &naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Result<(), GpuError> {
    if module.entry_points.iter().any(|ep| ep.name == name && ep.stage == stage) {
        return Ok(());
    }
    Err(GpuError::ShaderCompile {
        label: label.to_string(),
        message: format!("missing {stage:?} entry point `{name}`"),
    })
}

fn uniform_block(module: &naga::Module) -> UniformBlock {
    let block_var = module.global_variables.iter().find_map(|(_, var)| {
        let binding = var.binding.as_ref()?;
        let is_block = var.space == naga::AddressSpace::Uniform && binding.group == 0 && binding.binding == 0;
        is_block.then_some(var.ty)
    });
    let Some(ty) = block_var else { return UniformBlock::empty() };

    let naga::TypeInner::Struct { members, span } = &module.types[ty].inner else {
        return UniformBlock::empty();
    };

    let gctx = module.to_ctx();
    let fields = members
        .iter()
        .filter_map(|m| {
            let name = m.name.clone()?;
            let inner = &module.types[m.ty].inner;
            let stride = match inner {
                naga::TypeInner::Array { stride, .. } => Some(*stride),
                _ => None,
            };
            Some(UniformField { name, offset: m.offset, size: inner.size(gctx), stride })
        })
        .collect();

    UniformBlock { fields, size: (*span).max(MIN_BLOCK_SIZE) }
}

/// Combines the blocks seen by the vertex and fragment stages.
///
/// A stage without a block defers to the other; two declared blocks must agree.
pub(crate) fn merge_blocks(label: &str, vertex: UniformBlock, fragment: UniformBlock) -> Result<UniformBlock, GpuError> {
    match (vertex.fields.is_empty(), fragment.fields.is_empty()) {
        (_, true) => Ok(vertex),
        (true, false) => Ok(fragment),
        (false, false) if vertex == fragment => Ok(vertex),
        (false, false) => Err(GpuError::UniformLayout {
            label: label.to_string(),
            message: "vertex and fragment stages declare different uniform blocks".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::renderer::{OBJECT_SHADER, POST_SHADER, UI_SHADER};

    fn block(src: &str) -> UniformBlock {
        parse_module("test", src).unwrap().1
    }

    #[test]
    fn object_block_matches_std140_offsets() {
        let b = block(OBJECT_SHADER);
        let offset = |name: &str| b.fields[b.field_index(name).unwrap()].offset;

        assert_eq!(offset("u_model"), 0);
        assert_eq!(offset("u_view"), 64);
        assert_eq!(offset("u_projection"), 128);
        assert_eq!(offset("ambient_light"), 192);
        assert_eq!(offset("u_colour"), 208);
        assert_eq!(offset("light_pos"), 224);
        assert_eq!(offset("falloff"), 464);
        assert_eq!(offset("light_colour"), 704);
        assert_eq!(offset("u_resolution"), 944);
        assert_eq!(offset("use_normals"), 952);
        assert_eq!(b.size, 960);

        let lights = &b.fields[b.field_index("light_pos").unwrap()];
        assert_eq!(lights.stride, Some(16));
        assert_eq!(lights.size, 240);
    }

    #[test]
    fn builtin_programs_have_entry_points() {
        for src in [OBJECT_SHADER, UI_SHADER, POST_SHADER] {
            let (module, _) = parse_module("builtin", src).unwrap();
            require_entry("builtin", &module, VERTEX_ENTRY, naga::ShaderStage::Vertex).unwrap();
            require_entry("builtin", &module, FRAGMENT_ENTRY, naga::ShaderStage::Fragment).unwrap();
        }
    }

    #[test]
    fn syntax_error_is_compile_error() {
        let err = parse_module("bad", "fn broken( {").unwrap_err();
        assert!(matches!(err, GpuError::ShaderCompile { ref label, .. } if label == "bad"));
    }

    #[test]
    fn module_without_block_gets_minimum_size() {
        let b = block("@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }");
        assert!(b.fields.is_empty());
        assert_eq!(b.size, 16);
    }

    #[test]
    fn mismatched_blocks_are_rejected() {
        let a = block(POST_SHADER);
        let b = block(UI_SHADER);
        assert!(matches!(merge_blocks("mix", a, b), Err(GpuError::UniformLayout { .. })));
    }

    #[test]
    fn arrays_are_written_at_stride() {
        let b = block(OBJECT_SHADER);
        let mut shadow = vec![0u8; b.size as usize];
        let index = b.field_index("light_pos").unwrap();
        b.write(&mut shadow, index, &UniformValue::Vec3Array(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));

        let floats: [f32; 8] = bytemuck::pod_read_unaligned(&shadow[224..224 + 32]);
        assert_eq!(&floats[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(floats[3], 0.0);
        assert_eq!(&floats[4..7], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn int_lands_at_field_offset() {
        let b = block(OBJECT_SHADER);
        let mut shadow = vec![0u8; b.size as usize];
        b.write(&mut shadow, b.field_index("use_normals").unwrap(), &UniformValue::Int(1));
        assert_eq!(bytemuck::pod_read_unaligned::<i32>(&shadow[952..956]), 1);
    }
}
