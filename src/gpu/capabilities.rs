//! Adapter limits and format support required by the sphere pipeline.

use super::render_context::RenderContextError;
use crate::geometry::{AttributeLayout, INSTANCE_STRIDE};
use crate::renderer::gbuffer::DEPTH_FORMAT;
use crate::renderer::schedule::GBufferLayout;

/// Snapshot of the adapter properties the pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityReport {
    /// `max_vertex_attributes` limit.
    pub max_vertex_attributes: u32,
    /// `max_vertex_buffers` limit.
    pub max_vertex_buffers: u32,
    /// `max_vertex_buffer_array_stride` limit.
    pub max_vertex_buffer_array_stride: u32,
    /// `max_color_attachments` limit.
    pub max_color_attachments: u32,
    /// Formats the adapter can render into.
    pub renderable_formats: Vec<wgpu::TextureFormat>,
}

/// Every format any layout may need as a render attachment.
const CANDIDATE_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba32Float,
    DEPTH_FORMAT,
];

impl CapabilityReport {
    /// Query `adapter`.
    #[must_use]
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let limits = adapter.limits();
        let renderable_formats = CANDIDATE_FORMATS
            .into_iter()
            .filter(|&format| {
                adapter
                    .get_texture_format_features(format)
                    .allowed_usages
                    .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
            })
            .collect();
        Self {
            max_vertex_attributes: limits.max_vertex_attributes,
            max_vertex_buffers: limits.max_vertex_buffers,
            max_vertex_buffer_array_stride: limits
                .max_vertex_buffer_array_stride,
            max_color_attachments: limits.max_color_attachments,
            renderable_formats,
        }
    }
}

/// Check that `report` can run `layout`.
///
/// # Errors
///
/// Returns [`RenderContextError::MissingCapability`] naming the first
/// unmet requirement.
pub fn check(
    report: &CapabilityReport,
    layout: GBufferLayout,
) -> Result<(), RenderContextError> {
    let missing = |what: String| Err(RenderContextError::MissingCapability(what));

    let attributes = AttributeLayout::new(0).attributes().len() as u32;
    if report.max_vertex_attributes < attributes {
        return missing(format!(
            "{attributes} vertex attributes (adapter allows {})",
            report.max_vertex_attributes
        ));
    }
    let buffers = AttributeLayout::vertex_buffer_layouts().len() as u32;
    if report.max_vertex_buffers < buffers {
        return missing(format!(
            "{buffers} vertex buffer slots (adapter allows {})",
            report.max_vertex_buffers
        ));
    }
    if u64::from(report.max_vertex_buffer_array_stride) < INSTANCE_STRIDE {
        return missing(format!(
            "vertex stride of {INSTANCE_STRIDE} bytes (adapter allows {})",
            report.max_vertex_buffer_array_stride
        ));
    }
    if report.max_color_attachments < 1 {
        return missing("a color attachment".to_owned());
    }

    let formats = layout
        .passes()
        .iter()
        .map(|pass| pass.target_format())
        .chain(std::iter::once(DEPTH_FORMAT));
    for format in formats {
        if !report.renderable_formats.contains(&format) {
            return missing(format!("{format:?} render attachments"));
        }
    }
    log::debug!("adapter satisfies the {layout:?} layout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capable() -> CapabilityReport {
        CapabilityReport {
            max_vertex_attributes: 16,
            max_vertex_buffers: 8,
            max_vertex_buffer_array_stride: 2048,
            max_color_attachments: 8,
            renderable_formats: CANDIDATE_FORMATS.to_vec(),
        }
    }

    #[test]
    fn default_limits_run_both_layouts() {
        assert!(check(&capable(), GBufferLayout::Packed).is_ok());
        assert!(check(&capable(), GBufferLayout::Layered).is_ok());
    }

    #[test]
    fn too_few_attributes_is_reported() {
        let report = CapabilityReport {
            max_vertex_attributes: 4,
            ..capable()
        };
        let err = check(&report, GBufferLayout::Packed).unwrap_err();
        assert!(matches!(err, RenderContextError::MissingCapability(_)));
        assert!(err.to_string().contains("6 vertex attributes"));
    }

    #[test]
    fn short_stride_is_reported() {
        let report = CapabilityReport {
            max_vertex_buffer_array_stride: 32,
            ..capable()
        };
        assert!(check(&report, GBufferLayout::Packed).is_err());
    }

    #[test]
    fn float_targets_only_matter_for_layered() {
        let report = CapabilityReport {
            renderable_formats: vec![
                wgpu::TextureFormat::Rgba8Unorm,
                DEPTH_FORMAT,
            ],
            ..capable()
        };
        assert!(check(&report, GBufferLayout::Packed).is_ok());
        let err = check(&report, GBufferLayout::Layered).unwrap_err();
        assert!(err.to_string().contains("Rgba32Float"));
    }
}
