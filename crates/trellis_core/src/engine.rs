//! The host seam.
//!
//! The core never invokes host code directly. Component functions, effect
//! callbacks and cleanups are [`HostFunction`]s that the engine which
//! created them knows how to call.

use crate::context::{ContextId, Dependency, EffectAction, StateRef};
use crate::error::Result;
use crate::holder::{Child, NodeDescriptor};
use crate::props::Props;
use crate::tree::WidgetTree;
use crate::value::{HostFunction, StateValue};
use crate::widget::{WidgetId, WidgetKind};

/// A host that owns a [`WidgetTree`] and can run host functions against it
pub trait Engine {
    /// The host's own representation of an element, decoded by
    /// [`get_widget_holder`](Engine::get_widget_holder)
    type HostValue;

    fn tree(&self) -> &WidgetTree;

    fn tree_mut(&mut self) -> &mut WidgetTree;

    /// Materialize a primitive widget owned by the current component.
    fn create_component(&mut self, type_name: &str, props: Props) -> Result<WidgetId> {
        let kind = WidgetKind::from_type_name(type_name)?;
        self.tree_mut().allocate(kind, props)
    }

    /// Decode a host value into a node descriptor.
    fn get_widget_holder(&mut self, value: Self::HostValue) -> Result<NodeDescriptor>;

    /// Run a component function. The component's context is already current.
    fn call_component(
        &mut self,
        component: &HostFunction,
        props: &Props,
        children: Vec<Child>,
    ) -> Result<WidgetId>;

    /// Run an effect callback; returns its cleanup, if any.
    fn call_effect(&mut self, callback: &HostFunction) -> Result<Option<HostFunction>>;

    fn call_cleanup(&mut self, cleanup: HostFunction) -> Result<()>;

    /// Called when a widget is reconciled in place with new props.
    fn compare_props(&mut self, _old: &Props, _new: &Props) {}

    fn plug_component(&mut self, context: ContextId) {
        self.tree_mut().plug_component(context);
    }

    fn push_existing_component(&mut self, context: ContextId) {
        self.tree_mut().push_existing_component(context);
    }

    fn unplug_component(&mut self) -> Result<ContextId> {
        self.tree_mut().unplug_component()
    }

    /// Claim a state slot in the component currently rendering.
    fn use_state(&mut self, initial: StateValue) -> Result<(StateValue, StateRef)> {
        self.tree_mut().use_state(initial)
    }

    /// Register an effect in the component currently rendering.
    ///
    /// On mount the callback runs immediately and its cleanup is recorded.
    /// During reconciliation it replaces the stored callback and runs again
    /// only when `deps` is non-empty; whatever it returns is dropped.
    fn effect(&mut self, callback: HostFunction, deps: Vec<Dependency>) -> Result<()> {
        let context = self.tree().current_context()?;
        let action = self
            .tree_mut()
            .context_mut(context)?
            .effect(callback.clone(), deps)?;
        match action {
            EffectAction::Skip => Ok(()),
            EffectAction::Rerun => self.call_effect(&callback).map(drop),
            EffectAction::Mount { slot } => {
                let cleanup = self.call_effect(&callback)?;
                if let Ok(ctx) = self.tree_mut().context_mut(context) {
                    ctx.set_cleanup(slot, cleanup);
                }
                Ok(())
            }
        }
    }
}
