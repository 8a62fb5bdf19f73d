//! Per-frame callback registry.
//!
//! A host render loop calls [`FrameLoop::run_frame`] once per frame; every
//! registered callback whose period has elapsed is invoked with the frame
//! timestamp. Registration hands back a [`TickToken`] which is the only way to
//! cancel the callback again.
//!
//! Everything here is single-threaded and cooperative. Callbacks may start or
//! cancel registrations (including their own) while a frame is being
//! dispatched; a callback cancelled mid-frame is not invoked again, even later
//! in the same frame.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("frame callback {0} is not registered")]
    UnknownToken(TickToken),
    #[error("frame loop has been closed")]
    Closed,
}

/// Opaque handle identifying one registered frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

impl fmt::Display for TickToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type FrameCallback = Box<dyn FnMut(Instant)>;

/// Something that can run callbacks once per rendered frame.
pub trait FrameScheduler {
    /// Registers `callback`. With `period = None` it runs every frame,
    /// otherwise at most once per `period`.
    fn start(
        &self,
        callback: FrameCallback,
        period: Option<Duration>,
    ) -> Result<TickToken, SchedulerError>;

    /// Removes a registration. Cancelling an unknown token is an error so
    /// callers can tell a double cancel apart from a successful one.
    fn cancel(&self, token: TickToken) -> Result<(), SchedulerError>;
}

struct Entry {
    token: TickToken,
    period: Option<Duration>,
    last_fired: Option<Instant>,
    callback: Rc<RefCell<FrameCallback>>,
}

impl Entry {
    fn due(&self, now: Instant) -> bool {
        match (self.period, self.last_fired) {
            (None, _) | (_, None) => true,
            (Some(period), Some(last)) => now.saturating_duration_since(last) >= period,
        }
    }
}

#[derive(Default)]
pub struct FrameLoop {
    next_id: Cell<u64>,
    closed: Cell<bool>,
    entries: RefCell<Vec<Entry>>,
    frames: Cell<u64>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn is_registered(&self, token: TickToken) -> bool {
        self.entries.borrow().iter().any(|entry| entry.token == token)
    }

    /// Number of frames dispatched so far.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }

    /// Drops every registration and refuses new ones.
    pub fn close(&self) {
        self.closed.set(true);
        let dropped = std::mem::take(&mut *self.entries.borrow_mut());
        if !dropped.is_empty() {
            tracing::debug!(callbacks = dropped.len(), "frame loop closed with live callbacks");
        }
    }

    /// Dispatches one frame and returns how many callbacks ran.
    pub fn run_frame(&self, now: Instant) -> usize {
        self.frames.set(self.frames.get().saturating_add(1));
        let due: Vec<(TickToken, Rc<RefCell<FrameCallback>>)> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.due(now))
            .map(|entry| (entry.token, Rc::clone(&entry.callback)))
            .collect();

        let mut ran = 0;
        for (token, callback) in due {
            let still_registered = {
                let mut entries = self.entries.borrow_mut();
                match entries.iter_mut().find(|entry| entry.token == token) {
                    Some(entry) => {
                        entry.last_fired = Some(now);
                        true
                    }
                    None => false,
                }
            };
            if !still_registered {
                continue;
            }
            // A callback that re-enters run_frame must not run recursively.
            let Ok(mut callback) = callback.try_borrow_mut() else {
                tracing::warn!(%token, "frame callback re-entered; skipping");
                continue;
            };
            (callback)(now);
            ran += 1;
        }
        ran
    }
}

impl FrameScheduler for FrameLoop {
    fn start(
        &self,
        callback: FrameCallback,
        period: Option<Duration>,
    ) -> Result<TickToken, SchedulerError> {
        if self.closed.get() {
            return Err(SchedulerError::Closed);
        }
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        let token = TickToken(id);
        self.entries.borrow_mut().push(Entry {
            token,
            period: period.filter(|period| !period.is_zero()),
            last_fired: None,
            callback: Rc::new(RefCell::new(callback)),
        });
        tracing::trace!(%token, ?period, "registered frame callback");
        Ok(token)
    }

    fn cancel(&self, token: TickToken) -> Result<(), SchedulerError> {
        let mut entries = self.entries.borrow_mut();
        let index = entries
            .iter()
            .position(|entry| entry.token == token)
            .ok_or(SchedulerError::UnknownToken(token))?;
        entries.remove(index);
        tracing::trace!(%token, "cancelled frame callback");
        Ok(())
    }
}
