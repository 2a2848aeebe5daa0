//! Offscreen label surface
//!
//! A single render slot, detached from the preview, reused for every item
//! of a batch. Mounting borrows the surface mutably, so a new label cannot
//! be mounted while the previous one is still alive, and the mounted label
//! is only readable once its render worker has signalled completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{ExportError, Result};
use crate::label::{LabelRenderer, LabelSurface};

type RenderSignal = oneshot::Receiver<Result<Arc<LabelSurface>>>;

/// Reusable offscreen render slot
pub struct OffscreenSurface {
    renderer: Arc<LabelRenderer>,
    /// Expected time between mounting and the rendered signal. A label still
    /// rendering after it is reported, not abandoned.
    settle_timeout: Duration,
    mounts: usize,
}

impl OffscreenSurface {
    pub fn new(renderer: Arc<LabelRenderer>, settle_timeout: Duration) -> Self {
        debug!("Offscreen surface attached (settle timeout {:?})", settle_timeout);
        Self {
            renderer,
            settle_timeout,
            mounts: 0,
        }
    }

    /// Start rendering a label into the surface, replacing the previous one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self, username: &str, password: &str) -> MountedLabel<'_> {
        let renderer = self.renderer.clone();
        let username = username.to_string();
        let password = password.to_string();
        self.mount_with(move || renderer.render(&username, &password))
    }

    fn mount_with<F>(&mut self, render: F) -> MountedLabel<'_>
    where
        F: FnOnce() -> Result<LabelSurface> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            // Receiver gone means the export already gave up on this item
            let _ = tx.send(render().map(Arc::new));
        });
        self.mounts += 1;
        MountedLabel {
            surface: self,
            ready: Some(rx),
            content: None,
        }
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        debug!("Offscreen surface removed after {} mount(s)", self.mounts);
    }
}

/// The label currently living in an [`OffscreenSurface`]
pub struct MountedLabel<'a> {
    surface: &'a mut OffscreenSurface,
    ready: Option<RenderSignal>,
    content: Option<Arc<LabelSurface>>,
}

impl MountedLabel<'_> {
    /// Wait until the label has finished rendering.
    ///
    /// Fails only with the render's own error, or [`ExportError::RenderAborted`]
    /// if the worker went away without signalling.
    pub async fn rendered(&mut self) -> Result<Arc<LabelSurface>> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }

        let mut ready = self.ready.take().ok_or(ExportError::RenderAborted)?;
        let timeout = self.surface.settle_timeout;
        let signal = match tokio::time::timeout(timeout, &mut ready).await {
            Ok(signal) => signal,
            Err(_) => {
                warn!("Label still rendering after {:?}, waiting for it", timeout);
                ready.await
            }
        };
        let content = signal.map_err(|_| ExportError::RenderAborted)??;

        self.content = Some(content.clone());
        Ok(content)
    }

    /// Dispose of the label, freeing the surface for the next one
    pub fn unmount(self) {}
}

impl Drop for MountedLabel<'_> {
    fn drop(&mut self) {
        debug!("Unmounted label {}", self.surface.mounts);
    }
}
