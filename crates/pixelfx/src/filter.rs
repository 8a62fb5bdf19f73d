use bytemuck::{Pod, Zeroable};

/// Fragment stage of the pixelation filter.
///
/// Blocks are measured outwards from the texture centre so the pattern stays
/// symmetric while the block size changes; the sample coordinate is clamped
/// so edge blocks never read outside the texture.
pub const PIXELATE_FRAGMENT: &str = r#"
precision mediump float;

varying vec2 vTextureCoord;
uniform sampler2D uSampler;
uniform float blockSize;
uniform vec2 textureSize;

void main() {
    vec2 texel = vTextureCoord * textureSize;
    vec2 center = textureSize * 0.5;
    vec2 offset = floor((texel - center) / blockSize) * blockSize + blockSize * 0.5;
    vec2 uv = clamp((center + offset) / textureSize, 0.0, 1.0);
    gl_FragColor = texture2D(uSampler, uv);
}
"#;

/// Uniform block of the pixelation filter. `texture_size` is fixed at
/// creation; `block_size` is rewritten every frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PixelUniforms {
    pub block_size: f32,
    pub texture_size: [f32; 2],
}

impl PixelUniforms {
    /// Dimensions are floored to one pixel so the shader never divides by zero.
    pub fn new(block_size: f32, (width, height): (u32, u32)) -> Self {
        Self {
            block_size,
            texture_size: [width.max(1) as f32, height.max(1) as f32],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Everything a host needs to build one filter instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDescriptor {
    pub label: &'static str,
    pub fragment_source: &'static str,
    pub uniforms: PixelUniforms,
}

impl FilterDescriptor {
    pub fn pixelate(uniforms: PixelUniforms) -> Self {
        Self {
            label: "pixelate",
            fragment_source: PIXELATE_FRAGMENT,
            uniforms,
        }
    }
}
