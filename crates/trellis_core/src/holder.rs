//! Node descriptors: the pre-materialization description of a subtree.
//!
//! A descriptor is either a primitive widget request (type name, props and
//! children) or a component invocation (function and props). `execute`
//! turns it into a live widget.

use crate::engine::Engine;
use crate::error::{ReconcileError, Result};
use crate::key::Key;
use crate::props::Props;
use crate::reconcile::add_static_child;
use crate::value::HostFunction;
use crate::widget::{WidgetId, WidgetKind};

/// What a descriptor materializes into
#[derive(Debug, Clone)]
pub enum NodeSource {
    /// A built-in widget, by host type name
    Primitive(String),
    /// A component function
    Component(HostFunction),
}

/// A child entry of a descriptor
#[derive(Debug)]
pub enum Child {
    Node(NodeDescriptor),
    Text(String),
}

impl From<NodeDescriptor> for Child {
    fn from(node: NodeDescriptor) -> Self {
        Child::Node(node)
    }
}

/// Description of a node, consumed by [`execute`](NodeDescriptor::execute)
#[derive(Debug)]
pub struct NodeDescriptor {
    source: NodeSource,
    key: Key,
    id: Option<String>,
    props: Props,
    children: Vec<Child>,
}

impl NodeDescriptor {
    pub fn primitive(type_name: impl Into<String>, props: Props) -> Self {
        Self::new(NodeSource::Primitive(type_name.into()), props)
    }

    pub fn component(function: HostFunction, props: Props) -> Self {
        Self::new(NodeSource::Component(function), props)
    }

    fn new(source: NodeSource, props: Props) -> Self {
        Self {
            source,
            key: Key::none(),
            id: None,
            props,
            children: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = key.into();
        self
    }

    /// Stable id used to find this node again under its parent
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Child>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    pub fn source(&self) -> &NodeSource {
        &self.source
    }

    pub fn is_component(&self) -> bool {
        matches!(self.source, NodeSource::Component(_))
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Materialize this descriptor.
    ///
    /// A primitive is created in the current context and its children are
    /// attached. A component runs inside its own context (a fresh one, or the
    /// one queued for reuse by the reconciler). The key is applied to the
    /// resulting widget.
    pub fn execute<E: Engine + ?Sized>(self, engine: &mut E) -> Result<WidgetId> {
        let NodeDescriptor {
            source,
            key,
            props,
            children,
            ..
        } = self;
        let widget = match source {
            NodeSource::Primitive(type_name) => {
                let widget = engine.create_component(&type_name, props)?;
                attach_children(engine, widget, children)?;
                widget
            }
            NodeSource::Component(function) => {
                let context = engine.tree_mut().begin_component(&function);
                let rendered = engine.call_component(&function, &props, children);
                let ended = engine.tree_mut().end_component();
                let widget = rendered?;
                ended?;
                engine.tree_mut().set_context_root(context, widget);
                widget
            }
        };
        if key.is_present() {
            engine.tree_mut().set_key(widget, key)?;
        }
        Ok(widget)
    }
}

fn attach_children<E: Engine + ?Sized>(
    engine: &mut E,
    widget: WidgetId,
    children: Vec<Child>,
) -> Result<()> {
    if children.is_empty() {
        return Ok(());
    }
    let kind = engine.tree().get(widget)?.kind();
    for child in children {
        match (kind, child) {
            (WidgetKind::Text, Child::Text(text)) => engine.tree_mut().add_text(widget, &text)?,
            (WidgetKind::Container | WidgetKind::Button, Child::Node(node)) => {
                if node.id().is_some() {
                    add_static_child(engine, widget, node)?;
                } else {
                    let child = node.execute(engine)?;
                    engine.tree_mut().add_child(widget, child)?;
                }
            }
            (WidgetKind::Holder, Child::Node(node)) => {
                let child = node.execute(engine)?;
                engine.tree_mut().set_holder_child(widget, child)?;
            }
            (kind, Child::Node(_)) => {
                return Err(ReconcileError::InvalidOperation {
                    operation: "add a child",
                    kind,
                })
            }
            (kind, Child::Text(_)) => {
                return Err(ReconcileError::InvalidOperation {
                    operation: "add text",
                    kind,
                })
            }
        }
    }
    Ok(())
}
