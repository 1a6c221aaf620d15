//! Shared render view
//!
//! The simulation builds a fresh owned [`RenderView`] and swaps it in under the write lock;
//! readers clone under the read lock. Neither side ever sees a half-updated frame.

use std::sync::Arc;

use parking_lot::RwLock;

use blockrise_core::{GameState, RenderView};

#[derive(Debug, Clone, Default)]
pub struct SharedView {
    inner: Arc<RwLock<RenderView>>,
}

impl SharedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the current state. The view is built before the lock is taken.
    pub fn publish(&self, state: &GameState) {
        let view = state.render_view();
        *self.inner.write() = view;
    }

    /// Copy of the latest published view
    pub fn read(&self) -> RenderView {
        self.inner.read().clone()
    }

    /// Borrow the latest view without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&RenderView) -> R) -> R {
        f(&self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_then_read() {
        let shared = SharedView::new();
        assert_eq!(shared.read().cols, 0);

        let state = GameState::new(3);
        shared.publish(&state);
        let view = shared.read();
        assert_eq!(view.cols, 24);
        assert_eq!(view.visible_rows, 80);
        assert_eq!(view.cells.len(), 24 * 80);
        assert_eq!(shared.with(|v| v.preview.len()), 3);
    }

    #[test]
    fn test_reader_on_other_thread() {
        let shared = SharedView::new();
        let reader = shared.clone();
        shared.publish(&GameState::new(1));
        let cols = std::thread::spawn(move || reader.read().cols)
            .join()
            .unwrap();
        assert_eq!(cols, 24);
    }
}
