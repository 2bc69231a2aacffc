//! The widget arena.
//!
//! [`WidgetTree`] owns every live widget and component context, the context
//! stack used while components render, the pool that recycles released
//! widgets and the scheduler queue. Widgets and contexts are addressed by
//! versioned handles, so a handle to something that has been torn down is
//! detected instead of aliasing a recycled instance.

use std::fmt::Write;
use std::sync::Arc;

use slotmap::SlotMap;
use tracing::trace;

use crate::context::{
    ComponentContext, ContextId, CreationCounter, SetStateAction, StateRef,
};
use crate::error::{ReconcileError, Result};
use crate::key::Key;
use crate::pool::WidgetPool;
use crate::props::Props;
use crate::scheduler::UpdateScheduler;
use crate::value::{HostFunction, StateValue};
use crate::widget::{ContainerData, Widget, WidgetId, WidgetKind, WidgetPayload};

/// Arena of widgets and component contexts
#[derive(Debug)]
pub struct WidgetTree {
    widgets: SlotMap<WidgetId, Widget>,
    contexts: SlotMap<ContextId, ComponentContext>,
    pool: Arc<WidgetPool>,
    counter: CreationCounter,
    /// Contexts currently rendering or plugged; the last one is current
    stack: Vec<ContextId>,
    /// Existing contexts the next `begin_component` must reuse
    pending_reuse: Vec<ContextId>,
    scheduler: UpdateScheduler,
    /// Cleanups of released contexts, run at the end of the next settle
    orphaned_cleanups: Vec<HostFunction>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(WidgetPool::new()),
            CreationCounter::new(),
            UpdateScheduler::new(),
        )
    }

    pub fn with_parts(
        pool: Arc<WidgetPool>,
        counter: CreationCounter,
        scheduler: UpdateScheduler,
    ) -> Self {
        Self {
            widgets: SlotMap::with_key(),
            contexts: SlotMap::with_key(),
            pool,
            counter,
            stack: Vec::new(),
            pending_reuse: Vec::new(),
            scheduler,
            orphaned_cleanups: Vec::new(),
        }
    }

    pub fn pool(&self) -> &Arc<WidgetPool> {
        &self.pool
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut UpdateScheduler {
        &mut self.scheduler
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(id)
    }

    /// Like [`widget`](Self::widget), but a stale handle is an error
    pub fn get(&self, id: WidgetId) -> Result<&Widget> {
        self.widgets.get(id).ok_or(ReconcileError::StaleWidget(id))
    }

    fn get_mut(&mut self, id: WidgetId) -> Result<&mut Widget> {
        self.widgets.get_mut(id).ok_or(ReconcileError::StaleWidget(id))
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn context(&self, id: ContextId) -> Option<&ComponentContext> {
        self.contexts.get(id)
    }

    pub fn context_mut(&mut self, id: ContextId) -> Result<&mut ComponentContext> {
        self.contexts.get_mut(id).ok_or(ReconcileError::StaleContext(id))
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Owning context of a live widget
    pub fn owner(&self, id: WidgetId) -> Result<ContextId> {
        self.get(id)?.context().ok_or(ReconcileError::StaleWidget(id))
    }

    pub fn container(&self, id: WidgetId) -> Result<&ContainerData> {
        let widget = self.get(id)?;
        widget.as_container().ok_or(ReconcileError::InvalidOperation {
            operation: "read children",
            kind: widget.kind(),
        })
    }

    pub(crate) fn container_mut(
        &mut self,
        id: WidgetId,
        operation: &'static str,
    ) -> Result<&mut ContainerData> {
        let widget = self.get_mut(id)?;
        let kind = widget.kind();
        widget
            .as_container_mut()
            .ok_or(ReconcileError::InvalidOperation { operation, kind })
    }

    pub fn children(&self, id: WidgetId) -> Result<&[WidgetId]> {
        self.container(id).map(ContainerData::children)
    }

    // =========================================================================
    // CONTEXT STACK
    // =========================================================================

    /// Context of the component currently rendering
    pub fn current_context(&self) -> Result<ContextId> {
        self.stack
            .last()
            .copied()
            .ok_or(ReconcileError::NoActiveComponent)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Create a fresh context with the next creation index.
    pub fn create_context(&mut self, component: Option<HostFunction>) -> ContextId {
        let index = self.counter.next_index();
        self.contexts
            .insert_with_key(|id| ComponentContext::new(id, index, component))
    }

    /// Enter a component render: reuse the context queued by
    /// [`push_existing_component`](Self::push_existing_component) if there
    /// is one, otherwise create a new context.
    pub fn begin_component(&mut self, component: &HostFunction) -> ContextId {
        let reused = self
            .pending_reuse
            .pop()
            .filter(|id| self.contexts.contains_key(*id));
        let id = match reused {
            Some(id) => id,
            None => self.create_context(Some(component.clone())),
        };
        self.stack.push(id);
        id
    }

    pub fn end_component(&mut self) -> Result<ContextId> {
        let id = self.stack.pop().ok_or(ReconcileError::NoActiveComponent)?;
        self.release_context_if_orphaned(id);
        Ok(id)
    }

    /// Make an existing context current without rendering its component.
    pub fn plug_component(&mut self, id: ContextId) {
        self.stack.push(id);
    }

    /// Queue an existing context for the next `begin_component`.
    pub fn push_existing_component(&mut self, id: ContextId) {
        self.pending_reuse.push(id);
    }

    pub fn unplug_component(&mut self) -> Result<ContextId> {
        self.end_component()
    }

    pub(crate) fn discard_pending_reuse(&mut self, id: ContextId) {
        self.pending_reuse.retain(|queued| *queued != id);
    }

    pub(crate) fn set_context_root(&mut self, context: ContextId, root: WidgetId) {
        if let Some(ctx) = self.contexts.get_mut(context) {
            ctx.set_root(root);
        }
    }

    // =========================================================================
    // HOOK STATE
    // =========================================================================

    /// Claim a state slot in the current context
    pub fn use_state(&mut self, initial: StateValue) -> Result<(StateValue, StateRef)> {
        let id = self.current_context()?;
        self.context_mut(id)?.use_state(initial)
    }

    /// Setter entry point: stages the update and queues the context for settling.
    pub fn set_state(&mut self, state: StateRef, action: SetStateAction) -> Result<bool> {
        let Self {
            contexts,
            scheduler,
            ..
        } = self;
        let context = contexts
            .get_mut(state.context)
            .ok_or(ReconcileError::StaleContext(state.context))?;
        context.set_state(state.slot, action, || scheduler.notify(state.context))
    }

    /// Committed value of a state slot
    pub fn state_value(&self, state: StateRef) -> Result<&StateValue> {
        let context = self
            .contexts
            .get(state.context)
            .ok_or(ReconcileError::StaleContext(state.context))?;
        context
            .state(state.slot)
            .ok_or(ReconcileError::StateTypeMismatch { slot: state.slot })
    }

    pub(crate) fn take_orphaned_cleanups(&mut self) -> Vec<HostFunction> {
        std::mem::take(&mut self.orphaned_cleanups)
    }

    // =========================================================================
    // ALLOCATION
    // =========================================================================

    /// Allocate a widget owned by the current context.
    pub fn allocate(&mut self, kind: WidgetKind, props: Props) -> Result<WidgetId> {
        let context = self.current_context()?;
        let widget = self.pool.allocate(kind, props, context);
        let id = self.widgets.insert(widget);
        self.context_mut(context)?.track_widget(id);
        Ok(id)
    }

    pub fn set_key(&mut self, id: WidgetId, key: Key) -> Result<()> {
        self.get_mut(id)?.set_key(key);
        Ok(())
    }

    // =========================================================================
    // STRUCTURE
    // =========================================================================

    /// Append `child` to a container. Returns its position.
    pub fn add_child(&mut self, parent: WidgetId, child: WidgetId) -> Result<usize> {
        self.get(child)?;
        let data = self.container_mut(parent, "add a child")?;
        data.children.push(child);
        let position = data.children.len() - 1;
        self.get_mut(child)?.set_parent(Some(parent));
        Ok(position)
    }

    /// Insert `child` at `position`, or append when past the end.
    pub fn insert_child_at(
        &mut self,
        parent: WidgetId,
        position: usize,
        child: WidgetId,
    ) -> Result<()> {
        self.get(child)?;
        let data = self.container_mut(parent, "insert a child")?;
        let position = position.min(data.children.len());
        data.children.insert(position, child);
        self.get_mut(child)?.set_parent(Some(parent));
        Ok(())
    }

    /// Put `child` at `index`, tearing down the widget it replaces.
    pub fn replace_child(&mut self, parent: WidgetId, index: usize, child: WidgetId) -> Result<()> {
        self.get(child)?;
        let data = self.container_mut(parent, "replace a child")?;
        let len = data.children.len();
        let slot = data
            .children
            .get_mut(index)
            .ok_or(ReconcileError::ChildOutOfBounds { index, len })?;
        let previous = std::mem::replace(slot, child);
        self.get_mut(child)?.set_parent(Some(parent));
        if previous != child {
            self.reset_pointer(previous);
        }
        Ok(())
    }

    /// Remove and tear down the child at `index`.
    pub fn remove_child(&mut self, parent: WidgetId, index: usize) -> Result<()> {
        let data = self.container_mut(parent, "remove a child")?;
        let len = data.children.len();
        if index >= len {
            return Err(ReconcileError::ChildOutOfBounds { index, len });
        }
        let removed = data.children.remove(index);
        self.reset_pointer(removed);
        Ok(())
    }

    /// Swap in a whole new child list; old children not kept are torn down.
    pub fn replace_children(&mut self, parent: WidgetId, children: Vec<WidgetId>) -> Result<()> {
        let previous = self.set_children(parent, children)?;
        let kept = self.children(parent)?.to_vec();
        for child in previous {
            if !kept.contains(&child) {
                self.reset_pointer(child);
            }
        }
        Ok(())
    }

    /// Install an already reconciled child order without tearing anything down.
    pub(crate) fn set_children(
        &mut self,
        parent: WidgetId,
        children: Vec<WidgetId>,
    ) -> Result<Vec<WidgetId>> {
        for child in &children {
            self.get(*child)?;
        }
        let data = self.container_mut(parent, "set children")?;
        let previous = std::mem::replace(&mut data.children, children.clone());
        for child in children {
            self.get_mut(child)?.set_parent(Some(parent));
        }
        Ok(previous)
    }

    pub(crate) fn record_inserted(&mut self, parent: WidgetId, id: &str, position: usize) -> Result<()> {
        self.container_mut(parent, "insert a child")?
            .inserted
            .insert(id.to_string(), position);
        Ok(())
    }

    pub(crate) fn record_static(
        &mut self,
        parent: WidgetId,
        id: Option<&str>,
        position: usize,
        child_context: Option<ContextId>,
    ) -> Result<()> {
        let data = self.container_mut(parent, "add a static child")?;
        if let Some(id) = id {
            data.statics.insert(id.to_string(), position);
        }
        if let Some(context) = child_context {
            if !data.child_contexts.contains(&context) {
                data.child_contexts.push(context);
            }
        }
        Ok(())
    }

    pub fn add_text(&mut self, id: WidgetId, text: &str) -> Result<()> {
        match self.get_mut(id)?.payload_mut() {
            WidgetPayload::Text(data) => {
                data.push(text);
                Ok(())
            }
            other => Err(ReconcileError::InvalidOperation {
                operation: "add text",
                kind: other.kind(),
            }),
        }
    }

    /// Append a fragment under `text_id`, or replace the fragment already recorded for it.
    pub fn insert_text(&mut self, id: WidgetId, text_id: &str, text: &str) -> Result<()> {
        match self.get_mut(id)?.payload_mut() {
            WidgetPayload::Text(data) => {
                data.insert(text_id, text);
                Ok(())
            }
            other => Err(ReconcileError::InvalidOperation {
                operation: "insert text",
                kind: other.kind(),
            }),
        }
    }

    /// Fill a holder's single slot, tearing down the previous occupant.
    pub fn set_holder_child(&mut self, holder: WidgetId, child: WidgetId) -> Result<()> {
        self.get(child)?;
        let previous = match self.get_mut(holder)?.payload_mut() {
            WidgetPayload::Holder(data) => data.child.replace(child),
            other => {
                return Err(ReconcileError::InvalidOperation {
                    operation: "hold a child",
                    kind: other.kind(),
                })
            }
        };
        self.get_mut(child)?.set_parent(Some(holder));
        if let Some(previous) = previous.filter(|previous| *previous != child) {
            self.reset_pointer(previous);
        }
        Ok(())
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Tear down a widget and everything it still owns.
    ///
    /// Children are only torn down while they still name this widget as
    /// their parent; children relocated into another container survive.
    /// The released instance goes back to the pool. A context left without
    /// widgets is released. Returns false for a stale handle.
    pub fn reset_pointer(&mut self, id: WidgetId) -> bool {
        let Some(mut widget) = self.widgets.remove(id) else {
            return false;
        };
        let context = widget.context();
        if let Some(ctx) = context.and_then(|ctx| self.contexts.get_mut(ctx)) {
            ctx.untrack_widget(id);
        }

        for child in widget.payload().owned_children() {
            let owned = self
                .widgets
                .get(child)
                .is_some_and(|c| c.parent() == Some(id));
            if owned {
                self.reset_pointer(child);
            }
        }

        let child_contexts: Vec<ContextId> = widget
            .as_container()
            .map(|data| data.child_contexts().to_vec())
            .unwrap_or_default();
        widget.release();
        self.pool.recycle(widget);

        if let Some(ctx) = context {
            self.release_context_if_orphaned(ctx);
        }
        for ctx in child_contexts {
            self.release_context_if_orphaned(ctx);
        }
        true
    }

    /// Drop a context that owns no widget and is neither current nor queued for reuse.
    pub fn release_context_if_orphaned(&mut self, id: ContextId) {
        let orphaned = self.contexts.get(id).is_some_and(|ctx| ctx.widgets().is_empty())
            && !self.stack.contains(&id)
            && !self.pending_reuse.contains(&id);
        if !orphaned {
            return;
        }
        if let Some(mut context) = self.contexts.remove(id) {
            trace!(index = context.index(), "releasing component context");
            self.orphaned_cleanups.extend(context.take_cleanups());
        }
    }

    /// Move the content of `fresh` into the handle `old`.
    ///
    /// The previous content of `old` moves to a retired handle and is torn
    /// down; children that were relocated or reconciled into the fresh
    /// content are kept. Afterwards `fresh` is stale and `old` holds the new
    /// widget with its original parent.
    pub(crate) fn adopt(&mut self, old: WidgetId, fresh: WidgetId) -> Result<()> {
        if old == fresh {
            return Ok(());
        }
        self.get(old)?;
        let fresh_widget = self
            .widgets
            .remove(fresh)
            .ok_or(ReconcileError::StaleWidget(fresh))?;
        let slot = self.get_mut(old)?;
        let parent = slot.parent();
        let mut previous = std::mem::replace(slot, fresh_widget);
        previous.set_parent(None);
        let retired = self.widgets.insert(previous);

        self.reparent_children(retired, old, retired);
        self.reparent_children(old, fresh, old);
        self.get_mut(old)?.set_parent(parent);

        let retired_context = self.get(retired)?.context();
        let adopted_context = self.get(old)?.context();
        if let Some(ctx) = retired_context.and_then(|ctx| self.contexts.get_mut(ctx)) {
            ctx.replace_widget(old, retired);
        }
        if let Some(ctx) = adopted_context.and_then(|ctx| self.contexts.get_mut(ctx)) {
            ctx.replace_widget(fresh, old);
        }

        self.reset_pointer(retired);
        Ok(())
    }

    /// Children of `holder` whose parent is `from` now name `to`.
    fn reparent_children(&mut self, holder: WidgetId, from: WidgetId, to: WidgetId) {
        let Some(children) = self
            .widgets
            .get(holder)
            .map(|widget| widget.payload().owned_children())
        else {
            return;
        };
        for child in children {
            if let Some(widget) = self.widgets.get_mut(child) {
                if widget.parent() == Some(from) {
                    widget.set_parent(Some(to));
                }
            }
        }
    }

    /// Tear down `root` and stop recycling.
    pub fn shutdown(&mut self, root: Option<WidgetId>) {
        if let Some(root) = root {
            self.reset_pointer(root);
        }
        self.pool.finish();
    }

    // =========================================================================
    // DEBUG OUTPUT
    // =========================================================================

    /// Indented dump of the subtree under `root`.
    pub fn describe(&self, root: WidgetId) -> String {
        let mut out = String::new();
        self.describe_into(root, 0, &mut out);
        out
    }

    fn describe_into(&self, id: WidgetId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let Some(widget) = self.widgets.get(id) else {
            let _ = writeln!(out, "{indent}<stale>");
            return;
        };
        match widget.key().as_str() {
            Some(key) => {
                let _ = writeln!(out, "{indent}{} [{key}]", widget.describe());
            }
            None => {
                let _ = writeln!(out, "{indent}{}", widget.describe());
            }
        }
        for child in widget.payload().owned_children() {
            self.describe_into(child, depth + 1, out);
        }
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::empty_props;

    fn tree_with_context() -> (WidgetTree, ContextId) {
        let mut tree = WidgetTree::new();
        let ctx = tree.create_context(None);
        tree.plug_component(ctx);
        (tree, ctx)
    }

    fn text(tree: &mut WidgetTree, content: &str) -> WidgetId {
        let id = tree.allocate(WidgetKind::Text, empty_props()).unwrap();
        tree.add_text(id, content).unwrap();
        id
    }

    #[test]
    fn test_allocate_requires_current_context() {
        let mut tree = WidgetTree::new();
        assert_eq!(
            tree.allocate(WidgetKind::Text, empty_props()),
            Err(ReconcileError::NoActiveComponent)
        );
    }

    #[test]
    fn test_allocate_tracks_owner() {
        let (mut tree, ctx) = tree_with_context();
        let id = text(&mut tree, "a");
        assert_eq!(tree.owner(id), Ok(ctx));
        assert_eq!(tree.context(ctx).unwrap().widgets(), &[id]);
    }

    #[test]
    fn test_add_child_to_text_fails() {
        let (mut tree, _) = tree_with_context();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        assert_eq!(
            tree.add_child(a, b),
            Err(ReconcileError::InvalidOperation {
                operation: "add a child",
                kind: WidgetKind::Text,
            })
        );
    }

    #[test]
    fn test_reset_is_recursive_and_recycles() {
        let (mut tree, _) = tree_with_context();
        let root = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        assert!(tree.reset_pointer(root));
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.pool().available(WidgetKind::Text), 2);
        assert_eq!(tree.pool().available(WidgetKind::Container), 1);

        // Second reset of a stale handle is a no-op
        assert!(!tree.reset_pointer(root));
        assert_eq!(tree.pool().available(WidgetKind::Container), 1);
    }

    #[test]
    fn test_reset_skips_relocated_children() {
        let (mut tree, _) = tree_with_context();
        let old = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let new = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let a = text(&mut tree, "a");
        tree.add_child(old, a).unwrap();
        tree.add_child(new, a).unwrap();

        tree.reset_pointer(old);
        assert!(tree.contains(a));
        assert_eq!(tree.children(new), Ok(&[a][..]));
    }

    #[test]
    fn test_replace_and_remove_child() {
        let (mut tree, _) = tree_with_context();
        let root = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.add_child(root, a).unwrap();

        tree.replace_child(root, 0, b).unwrap();
        assert!(!tree.contains(a));
        assert_eq!(tree.children(root), Ok(&[b][..]));

        assert_eq!(
            tree.remove_child(root, 3),
            Err(ReconcileError::ChildOutOfBounds { index: 3, len: 1 })
        );
        tree.remove_child(root, 0).unwrap();
        assert!(tree.children(root).unwrap().is_empty());
        assert!(!tree.contains(b));
    }

    #[test]
    fn test_insert_child_at_clamps() {
        let (mut tree, _) = tree_with_context();
        let root = tree.allocate(WidgetKind::Button, empty_props()).unwrap();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.insert_child_at(root, 10, a).unwrap();
        tree.insert_child_at(root, 0, b).unwrap();
        assert_eq!(tree.children(root), Ok(&[b, a][..]));
    }

    #[test]
    fn test_holder_replaces_previous_child() {
        let (mut tree, _) = tree_with_context();
        let holder = tree.allocate(WidgetKind::Holder, empty_props()).unwrap();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.set_holder_child(holder, a).unwrap();
        tree.set_holder_child(holder, b).unwrap();
        assert!(!tree.contains(a));
        assert_eq!(tree.get(holder).unwrap().as_holder().unwrap().child(), Some(b));
        assert_eq!(tree.get(b).unwrap().parent(), Some(holder));
    }

    #[test]
    fn test_context_released_with_last_widget() {
        let mut tree = WidgetTree::new();
        let ctx = tree.create_context(None);
        tree.plug_component(ctx);
        let a = text(&mut tree, "a");
        tree.unplug_component().unwrap();
        assert!(tree.context(ctx).is_some());

        tree.reset_pointer(a);
        assert!(tree.context(ctx).is_none());
    }

    #[test]
    fn test_adopt_keeps_handle() {
        let (mut tree, ctx) = tree_with_context();
        let parent = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let old = text(&mut tree, "old");
        tree.add_child(parent, old).unwrap();
        tree.set_key(old, Key::new("k")).unwrap();
        let fresh = text(&mut tree, "fresh");

        tree.adopt(old, fresh).unwrap();
        assert!(!tree.contains(fresh));
        let widget = tree.get(old).unwrap();
        assert_eq!(widget.as_text().unwrap().content(), "fresh");
        assert_eq!(widget.parent(), Some(parent));
        assert_eq!(tree.children(parent), Ok(&[old][..]));
        assert_eq!(tree.context(ctx).unwrap().widgets(), &[parent, old]);
        assert_eq!(tree.pool().available(WidgetKind::Text), 1);
    }

    #[test]
    fn test_adopt_container_keeps_moved_children() {
        let (mut tree, _) = tree_with_context();
        let old = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let kept = text(&mut tree, "kept");
        let dropped = text(&mut tree, "dropped");
        tree.add_child(old, kept).unwrap();
        tree.add_child(old, dropped).unwrap();

        let fresh = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        tree.add_child(fresh, kept).unwrap();

        tree.adopt(old, fresh).unwrap();
        assert_eq!(tree.children(old), Ok(&[kept][..]));
        assert_eq!(tree.get(kept).unwrap().parent(), Some(old));
        assert!(!tree.contains(dropped));
    }

    #[test]
    fn test_set_state_queues_context() {
        let (mut tree, ctx) = tree_with_context();
        let (_, state) = tree.use_state(StateValue::new(0)).unwrap();
        assert!(tree.set_state(state, StateValue::new(1).into()).unwrap());
        assert!(tree.scheduler().is_queued(ctx));
        assert_eq!(tree.state_value(state), Ok(&StateValue::new(0)));
    }

    #[test]
    fn test_describe() {
        let (mut tree, _) = tree_with_context();
        let root = tree.allocate(WidgetKind::Container, empty_props()).unwrap();
        let a = text(&mut tree, "hello");
        tree.set_key(a, Key::new("greeting")).unwrap();
        tree.add_child(root, a).unwrap();
        assert_eq!(
            tree.describe(root),
            "Container with 1 children\n  Text: hello [greeting]\n"
        );
    }

    #[test]
    fn test_shutdown_finishes_pool() {
        let (mut tree, _) = tree_with_context();
        let root = text(&mut tree, "a");
        tree.shutdown(Some(root));
        assert!(tree.pool().is_finished());
        assert_eq!(tree.pool().stats().total(), 0);
        assert_eq!(tree.widget_count(), 0);
    }
}
