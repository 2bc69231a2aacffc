//! The Rust-native engine.
//!
//! [`Runtime`] owns a widget tree and implements [`Engine`] with Rust
//! closures as component functions, effects and cleanups. Components build
//! [`Element`]s and materialize them with [`Runtime::element`]; effects mutate
//! the tree through the structural methods below and are re-run by
//! [`Runtime::settle`] when their state dependencies change.

use std::sync::Arc;

use tracing::info;
use trellis_core::{
    add_static_child, reconcile_object, reconcile_widget_holders, Child, ContextId,
    CreationCounter, Dependency, Engine, HostFunction, ListReconciliation, NodeDescriptor,
    PoolStats, Props, ReconcileError, Result, SetStateAction, SettleReport, StateRef, StateValue,
    UpdateScheduler, WidgetId, WidgetPool, WidgetTree,
};

use crate::component::{effect_function, Cleanup, CleanupFn, ComponentFn, EffectFn};
use crate::config::RuntimeConfig;
use crate::element::Element;
use crate::state::{StateHandle, StateType};

/// Snapshot of runtime bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Live widgets
    pub widgets: usize,
    /// Live component contexts
    pub contexts: usize,
    /// Released widgets waiting in the pool
    pub pooled: PoolStats,
    /// Whether contexts are still queued for settling
    pub queued: bool,
}

pub struct Runtime {
    tree: WidgetTree,
    config: RuntimeConfig,
    root: Option<WidgetId>,
    root_context: Option<ContextId>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let pool = if config.recycle_widgets {
            WidgetPool::new()
        } else {
            WidgetPool::finished()
        };
        let tree = WidgetTree::with_parts(
            Arc::new(pool),
            CreationCounter::new(),
            UpdateScheduler::with_max_passes(config.max_settle_passes),
        );
        Self {
            tree,
            config,
            root: None,
            root_context: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn root(&self) -> Option<WidgetId> {
        self.root
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    /// Render `element` as the root and settle.
    ///
    /// The first call materializes the element; later calls reconcile it
    /// against the current root.
    pub fn render(&mut self, element: Element) -> Result<WidgetId> {
        let descriptor = self.get_widget_holder(element)?;
        let context = match self.root_context {
            Some(context) if self.tree.context(context).is_some() => context,
            _ => self.tree.create_context(None),
        };
        self.root_context = Some(context);
        let previous = self.root.filter(|root| self.tree.contains(*root));

        self.plug_component(context);
        let result = match previous {
            Some(previous) => reconcile_object(self, previous, descriptor),
            None => descriptor.execute(self),
        };
        self.unplug_component()?;
        let root = result?;
        self.root = Some(root);

        info!(
            widgets = self.tree.widget_count(),
            contexts = self.tree.context_count(),
            "rendered root"
        );
        self.settle()?;
        Ok(root)
    }

    /// Drain pending state updates; see [`trellis_core::settle`].
    pub fn settle(&mut self) -> Result<SettleReport> {
        trellis_core::settle(self)
    }

    /// Materialize `element` in the current component.
    pub fn element(&mut self, element: Element) -> Result<WidgetId> {
        let descriptor = self.get_widget_holder(element)?;
        descriptor.execute(self)
    }

    /// Tear down the root, stop recycling and run outstanding cleanups.
    pub fn shutdown(&mut self) -> Result<()> {
        let root = self.root.take();
        self.tree.shutdown(root);
        if let Some(context) = self.root_context.take() {
            self.tree.release_context_if_orphaned(context);
        }
        self.settle()?;
        info!(
            widgets = self.tree.widget_count(),
            contexts = self.tree.context_count(),
            "runtime shut down"
        );
        Ok(())
    }

    // =========================================================================
    // HOOKS
    // =========================================================================

    /// Claim a typed state slot in the component currently rendering.
    ///
    /// Returns the committed value: `initial` on mount, the latest committed
    /// value when the component is re-rendered.
    pub fn use_state<T: StateType>(&mut self, initial: T) -> Result<(T, StateHandle<T>)> {
        let (value, state) = Engine::use_state(self, StateValue::new(initial))?;
        let value = value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ReconcileError::StateTypeMismatch { slot: state.slot })?;
        Ok((value, StateHandle::new(state)))
    }

    /// Register an effect in the component currently rendering.
    pub fn use_effect<F>(&mut self, effect: F, deps: Vec<Dependency>) -> Result<()>
    where
        F: Fn(&mut Runtime) -> Result<Option<Cleanup>> + 'static,
    {
        Engine::effect(self, effect_function(effect), deps)
    }

    /// Committed value behind `handle`
    pub fn get<T: StateType>(&self, handle: StateHandle<T>) -> Result<T> {
        let state = handle.state_ref();
        self.tree
            .state_value(state)?
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ReconcileError::StateTypeMismatch { slot: state.slot })
    }

    /// Stage a new value. Returns false when it equals the committed one.
    pub fn set<T: StateType>(&mut self, handle: StateHandle<T>, value: T) -> Result<bool> {
        let state = self.checked::<T>(handle)?;
        self.tree
            .set_state(state, SetStateAction::Value(StateValue::new(value)))
    }

    /// Stage a value derived from the committed one.
    pub fn update<T, F>(&mut self, handle: StateHandle<T>, derive: F) -> Result<bool>
    where
        T: StateType,
        F: FnOnce(&T) -> T + 'static,
    {
        let state = self.checked::<T>(handle)?;
        let action = SetStateAction::update(move |current: &StateValue| {
            match current.downcast_ref::<T>() {
                Some(value) => StateValue::new(derive(value)),
                None => current.clone(),
            }
        });
        self.tree.set_state(state, action)
    }

    fn checked<T: StateType>(&self, handle: StateHandle<T>) -> Result<StateRef> {
        let state = handle.state_ref();
        if self.tree.state_value(state)?.is::<T>() {
            Ok(state)
        } else {
            Err(ReconcileError::StateTypeMismatch { slot: state.slot })
        }
    }

    // =========================================================================
    // STRUCTURE
    // =========================================================================

    pub fn add_child(&mut self, parent: WidgetId, child: WidgetId) -> Result<usize> {
        self.tree.add_child(parent, child)
    }

    pub fn add_text(&mut self, id: WidgetId, text: &str) -> Result<()> {
        self.tree.add_text(id, text)
    }

    /// Set the text fragment recorded under `text_id`.
    pub fn insert_text(&mut self, id: WidgetId, text_id: &str, text: &str) -> Result<()> {
        self.tree.insert_text(id, text_id, text)
    }

    /// Add a child that is carried over by id when the container's component re-renders.
    pub fn add_static_child(&mut self, container: WidgetId, element: Element) -> Result<WidgetId> {
        let descriptor = self.get_widget_holder(element)?;
        self.with_owner(container, |rt| add_static_child(rt, container, descriptor))
    }

    /// Place `element` under `id`, reconciling whatever was placed there before.
    pub fn insert_child(&mut self, container: WidgetId, id: &str, element: Element) -> Result<WidgetId> {
        let descriptor = self.get_widget_holder(element)?;
        self.with_owner(container, |rt| {
            trellis_core::insert_child(rt, container, id, descriptor)
        })
    }

    /// Replace the single child of a holder.
    pub fn set_holder_child(&mut self, holder: WidgetId, element: Element) -> Result<WidgetId> {
        let descriptor = self.get_widget_holder(element)?;
        self.with_owner(holder, |rt| {
            let child = descriptor.execute(rt)?;
            rt.tree.set_holder_child(holder, child)?;
            Ok(child)
        })
    }

    /// Reconcile a container's children against `elements`.
    pub fn reconcile_children(
        &mut self,
        container: WidgetId,
        elements: Vec<Element>,
    ) -> Result<ListReconciliation> {
        let descriptors = elements
            .into_iter()
            .map(Element::into_descriptor)
            .collect::<Vec<NodeDescriptor>>();
        reconcile_widget_holders(self, container, descriptors)
    }

    /// Render `items` into a container's children; `None` skips an item.
    pub fn reconcile_list<T, F>(
        &mut self,
        container: WidgetId,
        items: impl IntoIterator<Item = T>,
        render: F,
    ) -> Result<ListReconciliation>
    where
        F: FnMut(&mut Runtime, T, usize) -> Result<Option<Element>>,
    {
        trellis_core::reconcile_list(self, container, items, render)
    }

    fn with_owner<R>(
        &mut self,
        container: WidgetId,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let owner = self.tree.owner(container)?;
        self.plug_component(owner);
        let result = f(self);
        self.unplug_component()?;
        result
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Indented dump of the root subtree
    pub fn describe(&self) -> String {
        self.root
            .map(|root| self.tree.describe(root))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            widgets: self.tree.widget_count(),
            contexts: self.tree.context_count(),
            pooled: self.tree.pool().stats(),
            queued: self.tree.scheduler().has_pending(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Runtime {
    type HostValue = Element;

    fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut WidgetTree {
        &mut self.tree
    }

    fn get_widget_holder(&mut self, value: Element) -> Result<NodeDescriptor> {
        Ok(value.into_descriptor())
    }

    fn call_component(
        &mut self,
        component: &HostFunction,
        props: &Props,
        children: Vec<Child>,
    ) -> Result<WidgetId> {
        let function = component
            .downcast_ref::<ComponentFn>()
            .ok_or_else(|| ReconcileError::Host("host function is not a component".into()))?;
        function(self, props, children)
    }

    fn call_effect(&mut self, callback: &HostFunction) -> Result<Option<HostFunction>> {
        let function = callback
            .downcast_ref::<EffectFn>()
            .ok_or_else(|| ReconcileError::Host("host function is not an effect".into()))?;
        Ok(function(self)?.map(Cleanup::into_host_function))
    }

    fn call_cleanup(&mut self, cleanup: HostFunction) -> Result<()> {
        let slot = cleanup
            .downcast_ref::<CleanupFn>()
            .ok_or_else(|| ReconcileError::Host("host function is not a cleanup".into()))?;
        let function = slot.borrow_mut().take();
        if let Some(function) = function {
            function(self);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{button, holder, image, text, view};
    use crate::state::value_dep;
    use crate::Component;
    use std::cell::Cell;
    use std::rc::Rc;
    use trellis_core::PropMap;

    fn texts(rt: &Runtime, container: WidgetId) -> Vec<String> {
        rt.tree()
            .children(container)
            .unwrap()
            .iter()
            .filter_map(|child| rt.tree().get(*child).ok()?.as_text().map(|t| t.content()))
            .collect()
    }

    #[test]
    fn test_render_primitive_tree() {
        let mut rt = Runtime::new();
        rt.render(
            view()
                .child(text("Hello"))
                .child(image("logo.png"))
                .child(button().child(text("Go"))),
        )
        .unwrap();
        assert_eq!(
            rt.describe(),
            "Container with 3 children\n  Text: Hello\n  Image: logo.png\n  Button with 1 children\n    Text: Go\n"
        );
        assert_eq!(rt.stats().widgets, 5);
    }

    #[test]
    fn test_state_drives_effect() {
        let mut rt = Runtime::new();
        let handle = Rc::new(Cell::new(None));
        let counter = {
            let handle = handle.clone();
            Component::new(move |rt, _, _| {
                let (_, count) = rt.use_state(0i32)?;
                handle.set(Some(count));
                let label = rt.element(text("Count: "))?;
                rt.use_effect(
                    move |rt| {
                        let value = rt.get(count)?;
                        rt.insert_text(label, "value", &value.to_string())?;
                        Ok(None)
                    },
                    vec![count.dep()],
                )?;
                let root = rt.element(view())?;
                rt.add_child(root, label)?;
                Ok(root)
            })
        };

        rt.render(Element::component(&counter)).unwrap();
        assert_eq!(rt.describe(), "Container with 1 children\n  Text: Count: 0\n");

        let count = handle.get().unwrap();
        assert!(rt.set(count, 5).unwrap());
        let report = rt.settle().unwrap();
        assert!(report.converged);
        assert_eq!(rt.describe(), "Container with 1 children\n  Text: Count: 5\n");

        rt.update(count, |n| n * 2).unwrap();
        rt.settle().unwrap();
        assert_eq!(rt.get(count).unwrap(), 10);
        assert_eq!(rt.describe(), "Container with 1 children\n  Text: Count: 10\n");
    }

    #[test]
    fn test_effects_follow_the_latest_render() {
        let mut rt = Runtime::new();
        let handle = Rc::new(Cell::new(None));
        let counter = {
            let handle = handle.clone();
            Component::new(move |rt, _, _| {
                let (_, count) = rt.use_state(0i32)?;
                handle.set(Some(count));
                let label = rt.element(text("Count: "))?;
                rt.use_effect(
                    move |rt| {
                        let value = rt.get(count)?;
                        rt.insert_text(label, "value", &value.to_string())?;
                        Ok(None)
                    },
                    vec![count.dep()],
                )?;
                let root = rt.element(view())?;
                rt.add_child(root, label)?;
                Ok(root)
            })
        };

        let root = rt.render(Element::component(&counter)).unwrap();
        assert_eq!(rt.render(Element::component(&counter)).unwrap(), root);
        assert_eq!(rt.describe(), "Container with 1 children\n  Text: Count: 0\n");

        // The label captured at mount is gone; settling must use the new one
        let count = handle.get().unwrap();
        rt.set(count, 5).unwrap();
        rt.settle().unwrap();
        assert_eq!(rt.describe(), "Container with 1 children\n  Text: Count: 5\n");
    }

    #[test]
    fn test_unkeyed_to_keyed_then_removal() {
        let mut rt = Runtime::new();
        let list = rt
            .render(view().child(text("a")).child(text("b")).child(text("c")))
            .unwrap();

        let stats = rt
            .reconcile_children(list, vec![text("a").key("x"), text("b").key("y")])
            .unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.removed, 3);
        assert_eq!(texts(&rt, list), ["a", "b"]);
        let x = rt.tree().children(list).unwrap()[0];

        let stats = rt.reconcile_children(list, vec![text("a").key("x")]).unwrap();
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(rt.tree().children(list).unwrap(), &[x]);
        assert_eq!(texts(&rt, list), ["a"]);
        assert_eq!(rt.stats().widgets, 2);
        assert_eq!(rt.stats().pooled.texts, 4);
    }

    #[test]
    fn test_inserted_component_keeps_identity() {
        let mut rt = Runtime::new();
        let child = Component::new(|rt, props, _| {
            let count = props.get_number("count").unwrap_or_default();
            let root = rt.element(view())?;
            rt.add_static_child(root, text("Child").id("title"))?;
            let label = rt.element(text(format!("count = {count}")))?;
            rt.add_child(root, label)?;
            Ok(root)
        });
        let handle = Rc::new(Cell::new(None));
        let parent = {
            let handle = handle.clone();
            Component::new(move |rt, _, _| {
                let (_, items) = rt.use_state(vec![1, 2, 3])?;
                handle.set(Some(items));
                let root = rt.element(view().child(text("Parent")))?;
                let child = child.clone();
                rt.use_effect(
                    move |rt| {
                        let count = rt.get(items)?.len() as i32;
                        let element = Element::component(&child).prop("count", count);
                        rt.insert_child(root, "child", element)?;
                        Ok(None)
                    },
                    vec![items.dep()],
                )?;
                Ok(root)
            })
        };

        let root = rt.render(Element::component(&parent)).unwrap();
        assert_eq!(
            rt.describe(),
            "Container with 2 children\n  Text: Parent\n  Container with 2 children\n    Text: Child\n    Text: count = 3\n"
        );
        let inserted = rt.tree().children(root).unwrap()[1];
        let title = rt.tree().children(inserted).unwrap()[0];
        let widgets = rt.stats().widgets;

        let items = handle.get().unwrap();
        rt.update(items, |items| {
            let mut items = items.clone();
            items.push(4);
            items
        })
        .unwrap();
        rt.settle().unwrap();

        assert_eq!(
            rt.describe(),
            "Container with 2 children\n  Text: Parent\n  Container with 2 children\n    Text: Child\n    Text: count = 4\n"
        );
        assert_eq!(rt.tree().children(root).unwrap()[1], inserted);
        assert_eq!(rt.tree().children(inserted).unwrap()[0], title);
        assert_eq!(rt.stats().widgets, widgets);
    }

    #[test]
    fn test_feedback_loop_is_bounded() {
        let mut rt = Runtime::with_config(RuntimeConfig {
            max_settle_passes: 2,
            ..RuntimeConfig::default()
        });
        let handle = Rc::new(Cell::new(None));
        let looping = {
            let handle = handle.clone();
            Component::new(move |rt, _, _| {
                let (_, ticks) = rt.use_state(0i32)?;
                handle.set(Some(ticks));
                rt.use_effect(
                    move |rt| {
                        rt.update(ticks, |n| n + 1)?;
                        Ok(None)
                    },
                    vec![ticks.dep()],
                )?;
                rt.element(text("loop"))
            })
        };

        rt.render(Element::component(&looping)).unwrap();
        let ticks = handle.get().unwrap();
        assert_eq!(rt.get(ticks).unwrap(), 2);
        assert!(rt.stats().queued);

        let report = rt.settle().unwrap();
        assert_eq!(report.passes, 2);
        assert!(!report.converged);
        assert_eq!(rt.get(ticks).unwrap(), 4);
    }

    #[test]
    fn test_shutdown_runs_cleanups() {
        let mut rt = Runtime::new();
        let cleaned = Rc::new(Cell::new(0));
        let widget = {
            let cleaned = cleaned.clone();
            Component::new(move |rt, _, _| {
                let cleaned = cleaned.clone();
                rt.use_effect(
                    move |_| {
                        let cleaned = cleaned.clone();
                        Ok(Some(Cleanup::new(move |_| cleaned.set(cleaned.get() + 1))))
                    },
                    vec![],
                )?;
                rt.element(view().child(text("bye")))
            })
        };
        rt.render(Element::component(&widget)).unwrap();
        assert_eq!(cleaned.get(), 0);

        rt.shutdown().unwrap();
        assert_eq!(cleaned.get(), 1);
        let stats = rt.stats();
        assert_eq!(stats.widgets, 0);
        assert_eq!(stats.contexts, 0);
        assert!(stats.pooled.finished);
        assert_eq!(stats.pooled.total(), 0);
        assert_eq!(rt.describe(), "");
    }

    #[test]
    fn test_without_recycling_nothing_is_pooled() {
        let mut rt = Runtime::with_config(RuntimeConfig {
            recycle_widgets: false,
            ..RuntimeConfig::default()
        });
        let list = rt.render(view().child(text("a")).child(text("b"))).unwrap();
        rt.reconcile_children(list, vec![]).unwrap();
        assert_eq!(rt.stats().widgets, 1);
        assert_eq!(rt.stats().pooled.total(), 0);
    }

    #[test]
    fn test_state_type_is_checked() {
        let mut rt = Runtime::new();
        let handle = Rc::new(Cell::new(None));
        let widget = {
            let handle = handle.clone();
            Component::new(move |rt, _, _| {
                let (_, count) = rt.use_state(1i32)?;
                handle.set(Some(count.state_ref()));
                rt.element(text("x"))
            })
        };
        rt.render(Element::component(&widget)).unwrap();

        let wrong = StateHandle::<String>::new(handle.get().unwrap());
        assert_eq!(
            rt.get(wrong),
            Err(ReconcileError::StateTypeMismatch { slot: 0 })
        );
        assert_eq!(
            rt.set(wrong, "nope".to_string()),
            Err(ReconcileError::StateTypeMismatch { slot: 0 })
        );
    }

    #[test]
    fn test_hooks_need_a_component() {
        let mut rt = Runtime::new();
        assert_eq!(
            rt.use_state(1i32).map(|(value, _)| value),
            Err(ReconcileError::NoActiveComponent)
        );
        assert_eq!(
            rt.use_effect(|_| Ok(None), vec![value_dep(1i32)]),
            Err(ReconcileError::NoActiveComponent)
        );
    }

    #[test]
    fn test_holder_replaces_its_child() {
        let mut rt = Runtime::new();
        let slot = rt.render(holder()).unwrap();
        rt.set_holder_child(slot, text("first")).unwrap();
        rt.set_holder_child(slot, text("second")).unwrap();
        assert_eq!(rt.describe(), "Holder\n  Text: second\n");
        assert_eq!(rt.stats().widgets, 2);
    }

    #[test]
    fn test_reconcile_list_renders_items() {
        let mut rt = Runtime::new();
        let list = rt.render(view()).unwrap();
        let names = ["Ali", "", "Emad"];
        let stats = rt
            .reconcile_list(list, names, |_, name, index| {
                Ok((!name.is_empty()).then(|| text(name).key(index.to_string())))
            })
            .unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(texts(&rt, list), ["Ali", "Emad"]);
    }
}
