//! A minimal engine for exercising the core without a host runtime.

use std::any::Any;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::{ReconcileError, Result};
use crate::holder::{Child, NodeDescriptor};
use crate::props::{empty_props, PropMap, Props};
use crate::tree::WidgetTree;
use crate::value::HostFunction;
use crate::widget::WidgetId;

pub(crate) type ComponentFn = Box<dyn Fn(&mut TestEngine, &Props, Vec<Child>) -> Result<WidgetId>>;
pub(crate) type EffectFn = Box<dyn Fn(&mut TestEngine) -> Result<Option<HostFunction>>>;
pub(crate) type CleanupFn = Box<dyn Fn(&mut TestEngine)>;

#[derive(Default)]
pub(crate) struct TestEngine {
    pub(crate) tree: WidgetTree,
}

impl Engine for TestEngine {
    type HostValue = NodeDescriptor;

    fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut WidgetTree {
        &mut self.tree
    }

    fn get_widget_holder(&mut self, value: NodeDescriptor) -> Result<NodeDescriptor> {
        Ok(value)
    }

    fn call_component(
        &mut self,
        component: &HostFunction,
        props: &Props,
        children: Vec<Child>,
    ) -> Result<WidgetId> {
        let function = component
            .downcast_ref::<ComponentFn>()
            .ok_or_else(|| ReconcileError::Host("not a component".into()))?;
        function(self, props, children)
    }

    fn call_effect(&mut self, callback: &HostFunction) -> Result<Option<HostFunction>> {
        let function = callback
            .downcast_ref::<EffectFn>()
            .ok_or_else(|| ReconcileError::Host("not an effect".into()))?;
        function(self)
    }

    fn call_cleanup(&mut self, cleanup: HostFunction) -> Result<()> {
        let function = cleanup
            .downcast_ref::<CleanupFn>()
            .ok_or_else(|| ReconcileError::Host("not a cleanup".into()))?;
        function(self);
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct LabelProps(String);

impl PropMap for LabelProps {
    fn has(&self, key: &str) -> bool {
        key == "label"
    }

    fn get_number(&self, _key: &str) -> Option<f64> {
        None
    }

    fn get_string(&self, key: &str) -> Option<String> {
        (key == "label").then(|| self.0.clone())
    }

    fn get_bool(&self, _key: &str) -> Option<bool> {
        None
    }

    fn get_object(&self, _key: &str) -> Option<Props> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn label(value: &str) -> Props {
    Arc::new(LabelProps(value.to_string()))
}

pub(crate) fn component(
    f: impl Fn(&mut TestEngine, &Props, Vec<Child>) -> Result<WidgetId> + 'static,
) -> HostFunction {
    HostFunction::new::<ComponentFn>(Box::new(f))
}

pub(crate) fn effect_fn(
    f: impl Fn(&mut TestEngine) -> Result<Option<HostFunction>> + 'static,
) -> HostFunction {
    HostFunction::new::<EffectFn>(Box::new(f))
}

pub(crate) fn cleanup_fn(f: impl Fn(&mut TestEngine) + 'static) -> HostFunction {
    HostFunction::new::<CleanupFn>(Box::new(f))
}

pub(crate) fn text(content: impl Into<String>) -> NodeDescriptor {
    NodeDescriptor::primitive("text", empty_props()).with_text(content)
}

pub(crate) fn view() -> NodeDescriptor {
    NodeDescriptor::primitive("view", empty_props())
}

/// Execute `node` under a throwaway root context.
pub(crate) fn mount(engine: &mut TestEngine, node: NodeDescriptor) -> WidgetId {
    let root = engine.tree.create_context(None);
    engine.tree.plug_component(root);
    let widget = node.execute(engine).unwrap();
    engine.tree.unplug_component().unwrap();
    widget
}

/// Text content of every child of `container`
pub(crate) fn texts(engine: &TestEngine, container: WidgetId) -> Vec<String> {
    engine
        .tree
        .children(container)
        .unwrap()
        .iter()
        .map(|child| {
            engine
                .tree
                .get(*child)
                .unwrap()
                .as_text()
                .map(|text| text.content())
                .unwrap_or_default()
        })
        .collect()
}
