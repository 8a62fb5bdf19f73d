use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use pixelfx::{Drawable, FilterDescriptor, HostError, Placement, ShaderFilter};

use crate::{Faults, World};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTexture {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Read-only view of a simulated drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableView {
    pub id: u64,
    pub center: [f32; 2],
    pub size: [f32; 2],
    pub rotation: f32,
    pub in_root: bool,
    pub filter: Option<u64>,
    pub has_texture: bool,
    pub visible: bool,
}

/// Read-only view of a simulated filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterView {
    pub id: u64,
    pub label: &'static str,
    pub block_size: f32,
    pub texture_size: [f32; 2],
    pub enabled: bool,
    pub writes: u64,
    pub uniform_bytes: usize,
}

pub(crate) struct DrawableCell {
    pub(crate) id: u64,
    placement: Placement,
    texture: RefCell<Option<SimTexture>>,
    filter: Cell<Option<u64>>,
    pub(crate) destroyed: Cell<bool>,
    visible: Cell<bool>,
}

impl DrawableCell {
    pub(crate) fn new(id: u64, texture: &SimTexture, placement: Placement) -> Self {
        Self {
            id,
            placement,
            texture: RefCell::new(Some(texture.clone())),
            filter: Cell::new(None),
            destroyed: Cell::new(false),
            visible: Cell::new(true),
        }
    }

    pub(crate) fn view(&self, in_root: bool) -> DrawableView {
        DrawableView {
            id: self.id,
            center: self.placement.center,
            size: self.placement.size,
            rotation: self.placement.rotation,
            in_root,
            filter: self.filter.get(),
            has_texture: self.texture.borrow().is_some(),
            visible: self.visible.get(),
        }
    }
}

pub(crate) struct FilterCell {
    id: u64,
    label: &'static str,
    block_size: Cell<f32>,
    texture_size: [f32; 2],
    enabled: Cell<bool>,
    pub(crate) destroyed: Cell<bool>,
    writes: Cell<u64>,
    uniform_bytes: usize,
}

impl FilterCell {
    pub(crate) fn new(id: u64, descriptor: &FilterDescriptor) -> Self {
        Self {
            id,
            label: descriptor.label,
            block_size: Cell::new(descriptor.uniforms.block_size),
            texture_size: descriptor.uniforms.texture_size,
            enabled: Cell::new(true),
            destroyed: Cell::new(false),
            writes: Cell::new(0),
            uniform_bytes: descriptor.uniforms.as_bytes().len(),
        }
    }

    pub(crate) fn view(&self) -> FilterView {
        FilterView {
            id: self.id,
            label: self.label,
            block_size: self.block_size.get(),
            texture_size: self.texture_size,
            enabled: self.enabled.get(),
            writes: self.writes.get(),
            uniform_bytes: self.uniform_bytes,
        }
    }
}

fn faults(world: &Weak<World>) -> Faults {
    world
        .upgrade()
        .map(|world| world.faults.get())
        .unwrap_or_default()
}

/// Handle to a simulated drawable, shared with the simulated render tree.
pub struct SimDrawable {
    cell: Rc<DrawableCell>,
    world: Weak<World>,
}

impl SimDrawable {
    pub(crate) fn new(cell: Rc<DrawableCell>, world: &Rc<World>) -> Self {
        Self {
            cell,
            world: Rc::downgrade(world),
        }
    }

    pub fn id(&self) -> u64 {
        self.cell.id
    }

    fn ensure_alive(&self) -> Result<(), HostError> {
        if self.cell.destroyed.get() {
            Err(HostError::Destroyed("drawable"))
        } else {
            Ok(())
        }
    }
}

impl Drawable for SimDrawable {
    type Filter = SimFilter;

    fn is_usable(&self) -> bool {
        !self.cell.destroyed.get()
    }

    fn attach_filter(&self, filter: &SimFilter) -> Result<(), HostError> {
        self.ensure_alive()?;
        if faults(&self.world).attach {
            return Err(HostError::Other("filter attachment rejected".into()));
        }
        self.cell.filter.set(Some(filter.id()));
        Ok(())
    }

    fn clear_filters(&self) -> Result<(), HostError> {
        self.ensure_alive()?;
        self.cell.filter.set(None);
        Ok(())
    }

    fn detach(&self) -> Result<(), HostError> {
        if faults(&self.world).detach {
            return Err(HostError::RenderTree {
                operation: "remove",
                reason: "injected failure".into(),
            });
        }
        if let Some(world) = self.world.upgrade() {
            world.detach(self.cell.id);
        }
        Ok(())
    }

    fn release_texture(&self) -> Result<(), HostError> {
        self.cell.texture.borrow_mut().take();
        Ok(())
    }

    fn destroy(&self) -> Result<(), HostError> {
        self.ensure_alive()?;
        if faults(&self.world).destroy {
            return Err(HostError::Other("sprite destroy failed".into()));
        }
        self.cell.destroyed.set(true);
        if let Some(world) = self.world.upgrade() {
            world.detach(self.cell.id);
        }
        Ok(())
    }

    fn hide(&self) -> Result<(), HostError> {
        self.cell.visible.set(false);
        Ok(())
    }
}

/// Handle to a simulated shader filter.
pub struct SimFilter {
    cell: Rc<FilterCell>,
    world: Weak<World>,
}

impl SimFilter {
    pub(crate) fn new(cell: Rc<FilterCell>, world: &Rc<World>) -> Self {
        Self {
            cell,
            world: Rc::downgrade(world),
        }
    }

    pub fn id(&self) -> u64 {
        self.cell.id
    }

    pub fn block_size(&self) -> f32 {
        self.cell.block_size.get()
    }
}

impl ShaderFilter for SimFilter {
    fn is_destroyed(&self) -> bool {
        self.cell.destroyed.get()
    }

    fn set_block_size(&self, value: f32) -> Result<(), HostError> {
        if self.cell.destroyed.get() {
            return Err(HostError::Destroyed("filter"));
        }
        if faults(&self.world).uniform_write {
            return Err(HostError::Other("uniform buffer lost".into()));
        }
        self.cell.block_size.set(value);
        self.cell.writes.set(self.cell.writes.get() + 1);
        Ok(())
    }

    fn disable(&self) -> Result<(), HostError> {
        self.cell.enabled.set(false);
        Ok(())
    }

    fn destroy(&self) -> Result<(), HostError> {
        if self.cell.destroyed.replace(true) {
            return Err(HostError::Destroyed("filter"));
        }
        Ok(())
    }
}
