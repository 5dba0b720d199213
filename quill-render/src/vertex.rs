//! GPU layouts for the quads emitted by `quill_text::TextBatch`.
//!
//! `TextVertex` is `Pod`, so batches upload with `bytemuck::cast_slice`
//! and no intermediate copy.

use bytemuck::{Pod, Zeroable};
use quill_text::TextVertex;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// Index pattern for one quad in top-left, top-right, bottom-left,
/// bottom-right vertex order.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// Vertex buffer layout matching `TextVertex`.
///
/// - location(0): position, logical pixels
/// - location(1): atlas UV
/// - location(2): RGBA color
pub fn text_vertex_layout() -> VertexBufferLayout<'static> {
    static ATTRS: &[VertexAttribute] = &[
        VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: VertexFormat::Float32x2,
        },
        VertexAttribute {
            offset: 8,
            shader_location: 1,
            format: VertexFormat::Float32x2,
        },
        VertexAttribute {
            offset: 16,
            shader_location: 2,
            format: VertexFormat::Float32x4,
        },
    ];
    VertexBufferLayout {
        array_stride: std::mem::size_of::<TextVertex>() as BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: ATTRS,
    }
}

/// Index data for `quads` consecutive quads.
pub fn quad_indices(quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quads * QUAD_INDICES.len());
    for quad in 0..quads as u32 {
        let base = quad * 4;
        indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
    indices
}

/// Viewport uniform: pixel space with (0,0) top-left, y down.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ViewportUniform {
    /// 4×4 orthographic projection, column-major.
    pub view_proj: [[f32; 4]; 4],
}

impl ViewportUniform {
    /// Projection for a `width × height` viewport scrolled by `scroll` and
    /// magnified by `zoom`.
    pub fn new(width: f32, height: f32, scroll: [f32; 2], zoom: f32) -> Self {
        let sx = 2.0 * zoom / width;
        let sy = -2.0 * zoom / height;
        Self {
            view_proj: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [-scroll[0] * sx - 1.0, -scroll[1] * sy + 1.0, 0.0, 1.0],
            ],
        }
    }

    /// One logical pixel per unit, no scroll.
    pub fn pixels(width: f32, height: f32) -> Self {
        Self::new(width, height, [0.0, 0.0], 1.0)
    }

    /// Map a pixel-space point to normalized device coordinates.
    pub fn project(&self, point: [f32; 2]) -> [f32; 2] {
        let m = &self.view_proj;
        [
            point[0] * m[0][0] + point[1] * m[1][0] + m[3][0],
            point[0] * m[0][1] + point[1] * m[1][1] + m[3][1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5
    }

    #[test]
    fn test_layout_matches_vertex() {
        let layout = text_vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 16);
        assert_eq!(layout.step_mode, VertexStepMode::Vertex);
    }

    #[test]
    fn test_quad_indices_offsets_each_quad() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
        assert!(quad_indices(0).is_empty());
    }

    #[test]
    fn test_viewport_uniform_size() {
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 64);
    }

    #[test]
    fn test_viewport_corners() {
        let vp = ViewportUniform::pixels(800.0, 600.0);
        assert!(close(vp.project([0.0, 0.0]), [-1.0, 1.0]));
        assert!(close(vp.project([800.0, 600.0]), [1.0, -1.0]));
        assert!(close(vp.project([400.0, 300.0]), [0.0, 0.0]));
    }

    #[test]
    fn test_viewport_scroll_and_zoom() {
        let vp = ViewportUniform::new(800.0, 600.0, [100.0, 50.0], 1.0);
        assert!(close(vp.project([100.0, 50.0]), [-1.0, 1.0]));

        let zoomed = ViewportUniform::new(800.0, 600.0, [0.0, 0.0], 2.0);
        assert!(close(zoomed.project([400.0, 300.0]), [1.0, -1.0]));
    }

    #[test]
    fn test_batch_vertices_cast_to_bytes() {
        let mut batch = quill_text::TextBatch::new();
        let v = TextVertex {
            position: [1.0, 2.0],
            uv: [0.5, 0.5],
            color: [1.0; 4],
        };
        batch.push_quad(0, [v; 4]);
        let bytes: &[u8] = bytemuck::cast_slice(batch.vertices());
        assert_eq!(bytes.len(), 4 * 32);
    }
}
