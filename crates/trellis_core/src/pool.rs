//! Per-kind free lists of reset widgets.
//!
//! Released widgets go back to the pool instead of being dropped, and the
//! next allocation of the same kind re-arms one of them. Once the pool is
//! finished (engine shutdown) released widgets are dropped outright.
//!
//! The lock only guards the free lists; re-arming a recycled instance
//! happens after the lock is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::context::ContextId;
use crate::props::Props;
use crate::widget::{Widget, WidgetKind};

/// Free lists of available widget instances, keyed by kind
#[derive(Debug, Default)]
pub struct WidgetPool {
    free: Mutex<FxHashMap<WidgetKind, Vec<Widget>>>,
    finished: AtomicBool,
}

impl WidgetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool that drops everything it is given
    pub fn finished() -> Self {
        let pool = Self::new();
        pool.finish();
        pool
    }

    /// Take a recycled instance of `kind`, or construct a new one.
    pub fn allocate(&self, kind: WidgetKind, props: Props, context: ContextId) -> Widget {
        let recycled = self.lock().get_mut(&kind).and_then(Vec::pop);
        match recycled {
            Some(mut widget) => {
                trace!(?kind, "reusing pooled widget");
                widget.reuse(props, context);
                widget
            }
            None => {
                trace!(?kind, "allocating widget");
                Widget::new(kind, props, context)
            }
        }
    }

    /// Return a released widget to its free list.
    pub fn recycle(&self, widget: Widget) {
        debug_assert!(widget.is_available(), "only released widgets can be pooled");
        if self.is_finished() {
            return;
        }
        let kind = widget.kind();
        self.lock().entry(kind).or_default().push(widget);
        trace!(?kind, "widget returned to pool");
    }

    /// Stop recycling and drop every pooled instance.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
        self.lock().clear();
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Number of pooled instances of `kind`
    pub fn available(&self, kind: WidgetKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> PoolStats {
        let free = self.lock();
        let count = |kind: WidgetKind| free.get(&kind).map_or(0, Vec::len);
        PoolStats {
            containers: count(WidgetKind::Container),
            texts: count(WidgetKind::Text),
            images: count(WidgetKind::Image),
            buttons: count(WidgetKind::Button),
            holders: count(WidgetKind::Holder),
            finished: self.is_finished(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<WidgetKind, Vec<Widget>>> {
        // A panic while holding the lock leaves the lists consistent
        self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Pooled instance counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub containers: usize,
    pub texts: usize,
    pub images: usize,
    pub buttons: usize,
    pub holders: usize,
    pub finished: bool,
}

impl PoolStats {
    pub fn total(&self) -> usize {
        self.containers + self.texts + self.images + self.buttons + self.holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::empty_props;
    use slotmap::SlotMap;
    use std::sync::Arc;

    fn context_id() -> ContextId {
        let mut contexts: SlotMap<ContextId, ()> = SlotMap::with_key();
        contexts.insert(())
    }

    fn released(pool: &WidgetPool, kind: WidgetKind) -> Widget {
        let mut widget = pool.allocate(kind, empty_props(), context_id());
        widget.release();
        widget
    }

    #[test]
    fn test_recycle_then_reuse() {
        let pool = WidgetPool::new();
        let widget = released(&pool, WidgetKind::Text);
        pool.recycle(widget);
        assert_eq!(pool.available(WidgetKind::Text), 1);
        assert_eq!(pool.available(WidgetKind::Container), 0);

        let reused = pool.allocate(WidgetKind::Text, empty_props(), context_id());
        assert!(!reused.is_available());
        assert_eq!(reused.kind(), WidgetKind::Text);
        assert_eq!(pool.available(WidgetKind::Text), 0);
    }

    #[test]
    fn test_free_lists_are_per_kind() {
        let pool = WidgetPool::new();
        pool.recycle(released(&pool, WidgetKind::Image));
        let container = pool.allocate(WidgetKind::Container, empty_props(), context_id());
        assert_eq!(container.kind(), WidgetKind::Container);
        assert_eq!(pool.available(WidgetKind::Image), 1);
    }

    #[test]
    fn test_finished_pool_drops_widgets() {
        let pool = WidgetPool::new();
        pool.recycle(released(&pool, WidgetKind::Button));
        pool.finish();
        assert_eq!(pool.stats().total(), 0);
        pool.recycle(released(&pool, WidgetKind::Button));
        assert_eq!(pool.available(WidgetKind::Button), 0);
        assert!(pool.stats().finished);
        assert!(WidgetPool::finished().is_finished());
    }

    #[test]
    fn test_concurrent_allocation() {
        let pool = Arc::new(WidgetPool::new());
        for _ in 0..8 {
            pool.recycle(released(&pool, WidgetKind::Text));
        }
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let ctx = context_id();
                    for _ in 0..2 {
                        let widget = pool.allocate(WidgetKind::Text, empty_props(), ctx);
                        assert!(!widget.is_available());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.available(WidgetKind::Text), 0);
    }
}
