//! In-memory render host.
//!
//! `SimHost` implements every capability the pixelation controller consumes:
//! a scene accessor, an asynchronous texture loader, a render root, drawables
//! and filters. Time is simulated and only moves through [`SimHost::advance`]
//! or [`SimHost::drive`]. Failures and external destruction can be injected
//! to exercise the controller's recovery paths.

mod handles;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::time::{Duration, Instant};

use futures::channel::oneshot;
use pixelfx::{FilterDescriptor, Host, HostError, Placement, SceneBackground};
use scheduler::FrameLoop;

pub use handles::{DrawableView, FilterView, SimDrawable, SimFilter, SimTexture};

use handles::{DrawableCell, FilterCell};

/// Host operations that should fail until the flag is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    pub texture_load: bool,
    pub filter_create: bool,
    /// Number of upcoming drawable creations to reject.
    pub drawable_create: usize,
    pub insert: bool,
    pub attach: bool,
    pub detach: bool,
    pub destroy: bool,
    pub uniform_write: bool,
}

pub(crate) struct World {
    clock: Cell<Instant>,
    scene: RefCell<Option<SceneBackground>>,
    render_root: Cell<bool>,
    textures: RefCell<HashMap<String, (u32, u32)>>,
    gate: RefCell<Option<Vec<oneshot::Sender<()>>>>,
    pub(crate) faults: Cell<Faults>,
    pub(crate) root: RefCell<Vec<u64>>,
    drawables: RefCell<Vec<Rc<DrawableCell>>>,
    filters: RefCell<Vec<Rc<FilterCell>>>,
    next_id: Cell<u64>,
}

impl World {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub(crate) fn detach(&self, id: u64) {
        self.root.borrow_mut().retain(|child| *child != id);
    }

    fn resolve_texture(&self, path: &str) -> Result<SimTexture, HostError> {
        if self.faults.get().texture_load {
            return Err(HostError::TextureLoad {
                path: path.to_string(),
                reason: "injected failure".into(),
            });
        }
        let (width, height) = self.textures.borrow().get(path).copied().ok_or_else(|| {
            HostError::TextureLoad {
                path: path.to_string(),
                reason: "no such texture".into(),
            }
        })?;
        Ok(SimTexture {
            path: path.to_string(),
            width,
            height,
        })
    }
}

#[derive(Clone)]
pub struct SimHost {
    world: Rc<World>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// A host with a render root but no active scene.
    pub fn new() -> Self {
        Self {
            world: Rc::new(World {
                clock: Cell::new(Instant::now()),
                scene: RefCell::new(None),
                render_root: Cell::new(true),
                textures: RefCell::new(HashMap::new()),
                gate: RefCell::new(None),
                faults: Cell::new(Faults::default()),
                root: RefCell::new(Vec::new()),
                drawables: RefCell::new(Vec::new()),
                filters: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// A host whose active scene uses `image` as background, with a texture of
    /// the same dimensions available.
    pub fn with_scene(image: &str, width: u32, height: u32) -> Self {
        let host = Self::new();
        host.add_texture(image, width, height);
        host.set_scene(Some(SceneBackground {
            image: image.to_string(),
            width: width as f32,
            height: height as f32,
        }));
        host
    }

    pub fn set_scene(&self, scene: Option<SceneBackground>) {
        *self.world.scene.borrow_mut() = scene;
    }

    pub fn add_texture(&self, path: &str, width: u32, height: u32) {
        self.world
            .textures
            .borrow_mut()
            .insert(path.to_string(), (width, height));
    }

    pub fn set_render_root(&self, present: bool) {
        self.world.render_root.set(present);
    }

    pub fn faults(&self) -> Faults {
        self.world.faults.get()
    }

    pub fn set_faults(&self, faults: Faults) {
        self.world.faults.set(faults);
    }

    pub fn advance(&self, by: Duration) {
        self.world.clock.set(self.world.clock.get() + by);
    }

    /// Advances the clock by `step` and dispatches a frame until `total` has
    /// elapsed. Returns the number of frames run.
    pub fn drive(&self, frames: &FrameLoop, total: Duration, step: Duration) -> usize {
        if step.is_zero() {
            return 0;
        }
        let mut elapsed = Duration::ZERO;
        let mut count = 0;
        while elapsed + step <= total {
            self.advance(step);
            elapsed += step;
            frames.run_frame(self.world.clock.get());
            count += 1;
        }
        count
    }

    /// Texture loads started from now on stay pending until
    /// [`SimHost::release_texture_loads`].
    pub fn hold_texture_loads(&self) {
        let mut gate = self.world.gate.borrow_mut();
        if gate.is_none() {
            *gate = Some(Vec::new());
        }
    }

    /// Lets every held load resolve and stops holding new ones. Returns how
    /// many loads were waiting.
    pub fn release_texture_loads(&self) -> usize {
        let waiting = self.world.gate.borrow_mut().take().unwrap_or_default();
        let count = waiting.len();
        for sender in waiting {
            let _ = sender.send(());
        }
        count
    }

    pub fn pending_texture_loads(&self) -> usize {
        self.world.gate.borrow().as_ref().map_or(0, Vec::len)
    }

    /// Drawables that have not been destroyed, in creation order.
    pub fn live_drawables(&self) -> Vec<DrawableView> {
        let root = self.world.root.borrow();
        self.world
            .drawables
            .borrow()
            .iter()
            .filter(|cell| !cell.destroyed.get())
            .map(|cell| cell.view(root.contains(&cell.id)))
            .collect()
    }

    pub fn created_drawables(&self) -> usize {
        self.world.drawables.borrow().len()
    }

    /// Ids of the render root's children in draw order.
    pub fn root_children(&self) -> Vec<u64> {
        self.world.root.borrow().clone()
    }

    pub fn live_filters(&self) -> Vec<FilterView> {
        self.world
            .filters
            .borrow()
            .iter()
            .filter(|cell| !cell.destroyed.get())
            .map(|cell| cell.view())
            .collect()
    }

    pub fn created_filters(&self) -> usize {
        self.world.filters.borrow().len()
    }

    /// Destroys every live drawable behind the controller's back, the way a
    /// scene change tears down the render tree.
    pub fn destroy_drawables_externally(&self) -> usize {
        let mut count = 0;
        for cell in self.world.drawables.borrow().iter() {
            if !cell.destroyed.replace(true) {
                self.world.detach(cell.id);
                count += 1;
            }
        }
        tracing::debug!(count, "destroyed drawables externally");
        count
    }

    /// Destroys a single drawable by id. Returns false if it was not alive.
    pub fn destroy_drawable_externally(&self, id: u64) -> bool {
        let drawables = self.world.drawables.borrow();
        let Some(cell) = drawables.iter().find(|cell| cell.id == id) else {
            return false;
        };
        if cell.destroyed.replace(true) {
            return false;
        }
        self.world.detach(id);
        true
    }

    pub fn destroy_filters_externally(&self) -> usize {
        let mut count = 0;
        for cell in self.world.filters.borrow().iter() {
            if !cell.destroyed.replace(true) {
                count += 1;
            }
        }
        count
    }
}

impl Host for SimHost {
    type Texture = SimTexture;
    type Filter = SimFilter;
    type Drawable = SimDrawable;

    fn now(&self) -> Instant {
        self.world.clock.get()
    }

    fn scene_background(&self) -> Option<SceneBackground> {
        self.world.scene.borrow().clone()
    }

    fn has_render_root(&self) -> bool {
        self.world.render_root.get()
    }

    fn load_texture(&self, path: &str) -> impl Future<Output = Result<SimTexture, HostError>> {
        let world = Rc::clone(&self.world);
        let path = path.to_string();
        let held = self.world.gate.borrow_mut().as_mut().map(|waiting| {
            let (sender, receiver) = oneshot::channel();
            waiting.push(sender);
            receiver
        });
        async move {
            if let Some(receiver) = held {
                // a dropped sender resolves the load as well
                let _ = receiver.await;
            }
            world.resolve_texture(&path)
        }
    }

    fn texture_dimensions(&self, texture: &SimTexture) -> (u32, u32) {
        (texture.width, texture.height)
    }

    fn create_filter(&self, descriptor: &FilterDescriptor) -> Result<SimFilter, HostError> {
        if self.world.faults.get().filter_create {
            return Err(HostError::Other("filter compilation failed".into()));
        }
        let cell = Rc::new(FilterCell::new(self.world.next_id(), descriptor));
        self.world.filters.borrow_mut().push(Rc::clone(&cell));
        Ok(SimFilter::new(cell, &self.world))
    }

    fn create_drawable(
        &self,
        texture: &SimTexture,
        placement: &Placement,
    ) -> Result<SimDrawable, HostError> {
        let mut faults = self.world.faults.get();
        if faults.drawable_create > 0 {
            faults.drawable_create -= 1;
            self.world.faults.set(faults);
            return Err(HostError::Other("sprite allocation failed".into()));
        }
        let cell = Rc::new(DrawableCell::new(self.world.next_id(), texture, *placement));
        self.world.drawables.borrow_mut().push(Rc::clone(&cell));
        Ok(SimDrawable::new(cell, &self.world))
    }

    fn insert_child_at(&self, drawable: &SimDrawable, index: usize) -> Result<(), HostError> {
        if self.world.faults.get().insert {
            return Err(HostError::RenderTree {
                operation: "insert",
                reason: "injected failure".into(),
            });
        }
        let id = drawable.id();
        let mut root = self.world.root.borrow_mut();
        root.retain(|child| *child != id);
        let index = index.min(root.len());
        root.insert(index, id);
        Ok(())
    }
}
