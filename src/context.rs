use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::error::RenderResult;

/// A rendering context that may outlive a single call.
///
/// It recycles one surface allocation between renders and hands out at most one
/// canvas at a time. Callers reach it through a [`Mutex`] and keep the guard for
/// the whole render.
#[derive(Debug, Default)]
pub(crate) struct RenderContext {
    recycled: Vec<u8>,
    checked_out: bool,
    renders: u64,
}

pub(crate) type SharedContext = Arc<Mutex<RenderContext>>;

static SHARED_CONTEXT: Lazy<SharedContext> = Lazy::new(|| Arc::new(Mutex::new(RenderContext::default())));

/// The process-wide context used by default synthesizers.
pub(crate) fn shared() -> SharedContext {
    Arc::clone(&SHARED_CONTEXT)
}

/// A context nobody else can see.
pub(crate) fn private() -> SharedContext {
    Arc::new(Mutex::new(RenderContext::default()))
}

/// Locks a context, recovering from poisoning.
///
/// A panic mid-render still drops its [`ScopedCanvas`], which returns the
/// surface, so the context is consistent even when the lock is poisoned.
pub(crate) fn lock(context: &Mutex<RenderContext>) -> MutexGuard<'_, RenderContext> {
    context.lock().unwrap_or_else(|poisoned| {
        log::warn!("recovering rendering context after a panicked render");
        poisoned.into_inner()
    })
}

impl RenderContext {
    /// Checks out a canvas; it is returned when the scope guard drops.
    pub(crate) fn begin(
        &mut self,
        width: u32,
        height: u32,
        scale_factor: f32,
        config: &RenderConfig,
    ) -> RenderResult<ScopedCanvas<'_>> {
        debug_assert!(!self.checked_out, "rendering context already has a canvas out");
        let buffer = std::mem::take(&mut self.recycled);
        let canvas = Canvas::acquire_with_buffer(buffer, width, height, scale_factor, config)?;
        self.checked_out = true;
        self.renders += 1;
        Ok(ScopedCanvas { context: self, canvas })
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        !self.checked_out
    }

    pub(crate) fn renders(&self) -> u64 {
        self.renders
    }
}

/// A canvas borrowed from a [`RenderContext`].
pub(crate) struct ScopedCanvas<'a> {
    context: &'a mut RenderContext,
    canvas: Canvas,
}

impl Deref for ScopedCanvas<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        &self.canvas
    }
}

impl DerefMut for ScopedCanvas<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }
}

impl Drop for ScopedCanvas<'_> {
    fn drop(&mut self) {
        self.context.recycled = self.canvas.take_buffer();
        self.context.checked_out = false;
    }
}
