//! Element builder.
//!
//! An [`Element`] is the runtime's host value: a plain description of a
//! widget or component invocation that the engine decodes into a
//! [`NodeDescriptor`] when it is rendered.
//!
//! ```ignore
//! let row = view()
//!     .key("row-1")
//!     .style(PropValues::new().with("display", "flex"))
//!     .child(text("Hello"))
//!     .child(button().child(text("Press")));
//! ```

use trellis_core::{Child, Key, NodeDescriptor, NodeSource};

use crate::component::Component;
use crate::props::{PropValue, PropValues};

/// A child of an [`Element`]
#[derive(Debug)]
pub enum ElementChild {
    Element(Element),
    /// An already decoded descriptor, such as children forwarded by a component
    Node(NodeDescriptor),
    Text(String),
}

impl From<Element> for ElementChild {
    fn from(element: Element) -> Self {
        ElementChild::Element(element)
    }
}

impl From<Child> for ElementChild {
    fn from(child: Child) -> Self {
        match child {
            Child::Node(node) => ElementChild::Node(node),
            Child::Text(text) => ElementChild::Text(text),
        }
    }
}

impl From<&str> for ElementChild {
    fn from(text: &str) -> Self {
        ElementChild::Text(text.to_string())
    }
}

impl From<String> for ElementChild {
    fn from(text: String) -> Self {
        ElementChild::Text(text)
    }
}

/// Description of a widget or a component invocation
#[derive(Debug)]
pub struct Element {
    source: NodeSource,
    key: Key,
    id: Option<String>,
    props: PropValues,
    children: Vec<ElementChild>,
}

impl Element {
    /// A primitive by host type name (`view`, `text`, `image`, ...)
    pub fn new(type_name: impl Into<String>) -> Self {
        Self::from_source(NodeSource::Primitive(type_name.into()))
    }

    pub fn component(component: &Component) -> Self {
        Self::from_source(NodeSource::Component(component.host_function().clone()))
    }

    fn from_source(source: NodeSource) -> Self {
        Self {
            source,
            key: Key::none(),
            id: None,
            props: PropValues::new(),
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = key.into();
        self
    }

    /// Stable id under the parent; see [`Runtime::add_static_child`](crate::Runtime::add_static_child).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    pub fn props(mut self, props: PropValues) -> Self {
        self.props = props;
        self
    }

    pub fn style(self, style: PropValues) -> Self {
        self.prop("style", style)
    }

    pub fn child(mut self, child: impl Into<ElementChild>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<C: Into<ElementChild>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn source(&self) -> &NodeSource {
        &self.source
    }

    /// Decode into a descriptor, recursively.
    pub fn into_descriptor(self) -> NodeDescriptor {
        let Element {
            source,
            key,
            id,
            props,
            children,
        } = self;
        let props = props.into_props();
        let mut descriptor = match source {
            NodeSource::Primitive(type_name) => NodeDescriptor::primitive(type_name, props),
            NodeSource::Component(function) => NodeDescriptor::component(function, props),
        };
        descriptor = descriptor.with_key(key);
        if let Some(id) = id {
            descriptor = descriptor.with_id(id);
        }
        descriptor.with_children(children.into_iter().map(|child| match child {
            ElementChild::Element(element) => Child::Node(element.into_descriptor()),
            ElementChild::Node(node) => Child::Node(node),
            ElementChild::Text(text) => Child::Text(text),
        }))
    }
}

pub fn view() -> Element {
    Element::new("view")
}

pub fn text(content: impl Into<String>) -> Element {
    Element::new("text").child(ElementChild::Text(content.into()))
}

pub fn button() -> Element {
    Element::new("button")
}

pub fn image(src: impl Into<String>) -> Element {
    let src: String = src.into();
    Element::new("image").prop("src", src)
}

pub fn holder() -> Element {
    Element::new("holder")
}
