use std::future::Future;
use std::time::Instant;

use crate::filter::FilterDescriptor;
use crate::layout::Placement;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("failed to load texture '{path}': {reason}")]
    TextureLoad { path: String, reason: String },
    #[error("{0} has already been destroyed")]
    Destroyed(&'static str),
    #[error("render tree rejected {operation}: {reason}")]
    RenderTree {
        operation: &'static str,
        reason: String,
    },
    #[error("{0}")]
    Other(String),
}

/// Background image of the active scene along with its pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBackground {
    pub image: String,
    pub width: f32,
    pub height: f32,
}

/// A shader filter instance shared by every drawable of one effect.
pub trait ShaderFilter {
    /// Whether the host has already destroyed the filter.
    fn is_destroyed(&self) -> bool;
    fn set_block_size(&self, value: f32) -> Result<(), HostError>;
    fn disable(&self) -> Result<(), HostError>;
    fn destroy(&self) -> Result<(), HostError>;
}

/// A positioned, textured primitive living in the host render tree.
///
/// Handles are shared with the host, which may destroy the underlying object
/// at any time; [`Drawable::is_usable`] is the single place renderer-specific
/// liveness quirks are interpreted.
pub trait Drawable {
    type Filter: ShaderFilter;

    fn is_usable(&self) -> bool;
    fn attach_filter(&self, filter: &Self::Filter) -> Result<(), HostError>;
    fn clear_filters(&self) -> Result<(), HostError>;
    /// Removes the drawable from whatever parent currently holds it.
    fn detach(&self) -> Result<(), HostError>;
    fn release_texture(&self) -> Result<(), HostError>;
    fn destroy(&self) -> Result<(), HostError>;
    /// Last resort when `destroy` fails: keep it out of the frame.
    fn hide(&self) -> Result<(), HostError>;
}

/// Capabilities the effect consumes from the embedding client.
pub trait Host {
    type Texture;
    type Filter: ShaderFilter;
    type Drawable: Drawable<Filter = Self::Filter>;

    /// Monotonic clock shared with the frame loop.
    fn now(&self) -> Instant;

    /// Background of the active scene, `None` when there is no scene.
    fn scene_background(&self) -> Option<SceneBackground>;

    /// Whether a render root exists to insert drawables into.
    fn has_render_root(&self) -> bool;

    /// Loads a texture. This is the only suspension point of a start.
    fn load_texture(&self, path: &str) -> impl Future<Output = Result<Self::Texture, HostError>>;

    fn texture_dimensions(&self, texture: &Self::Texture) -> (u32, u32);

    fn create_filter(&self, descriptor: &FilterDescriptor) -> Result<Self::Filter, HostError>;

    fn create_drawable(
        &self,
        texture: &Self::Texture,
        placement: &Placement,
    ) -> Result<Self::Drawable, HostError>;

    /// Inserts a drawable into the render root at `index` (0 draws first).
    fn insert_child_at(&self, drawable: &Self::Drawable, index: usize) -> Result<(), HostError>;
}
