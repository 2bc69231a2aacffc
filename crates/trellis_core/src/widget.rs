//! Widgets: the retained nodes of the tree.
//!
//! Widgets live in the [`WidgetTree`](crate::WidgetTree) arena and are
//! addressed by [`WidgetId`]. The kind set is closed; kind-specific state
//! sits in [`WidgetPayload`].

use rustc_hash::FxHashMap;
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::context::ContextId;
use crate::error::{ReconcileError, Result};
use crate::key::Key;
use crate::props::Props;

new_key_type! {
    /// Stable handle to a widget in the arena
    pub struct WidgetId;
}

/// The closed set of widget kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetKind {
    Container,
    Text,
    Image,
    Button,
    Holder,
}

impl WidgetKind {
    /// Map a host type name to a kind.
    pub fn from_type_name(name: &str) -> Result<Self> {
        match name {
            "view" | "div" | "component" => Ok(WidgetKind::Container),
            "text" | "h1" | "h2" => Ok(WidgetKind::Text),
            "image" => Ok(WidgetKind::Image),
            "button" => Ok(WidgetKind::Button),
            "holder" => Ok(WidgetKind::Holder),
            other => Err(ReconcileError::UnknownWidgetType(other.to_string())),
        }
    }

    /// Whether the kind keeps an ordered child list
    pub fn has_children(self) -> bool {
        matches!(self, WidgetKind::Container | WidgetKind::Button)
    }

    pub fn name(self) -> &'static str {
        match self {
            WidgetKind::Container => "Container",
            WidgetKind::Text => "Text",
            WidgetKind::Image => "Image",
            WidgetKind::Button => "Button",
            WidgetKind::Holder => "Holder",
        }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Child bookkeeping for containers and buttons
#[derive(Debug, Default)]
pub struct ContainerData {
    pub(crate) children: Vec<WidgetId>,
    /// id -> position of children added through `insert_child`
    pub(crate) inserted: FxHashMap<String, usize>,
    /// id -> position of children added through `add_static_child`
    pub(crate) statics: FxHashMap<String, usize>,
    /// Contexts of component children registered on this container
    pub(crate) child_contexts: SmallVec<[ContextId; 2]>,
}

impl ContainerData {
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    pub fn inserted_position(&self, id: &str) -> Option<usize> {
        self.inserted.get(id).copied()
    }

    pub fn static_position(&self, id: &str) -> Option<usize> {
        self.statics.get(id).copied()
    }

    pub fn child_contexts(&self) -> &[ContextId] {
        &self.child_contexts
    }

    fn clear(&mut self) {
        self.children.clear();
        self.inserted.clear();
        self.statics.clear();
        self.child_contexts.clear();
    }
}

/// Text content kept as ordered fragments
#[derive(Debug, Default)]
pub struct TextData {
    fragments: Vec<String>,
    /// id -> fragment position, for fragment-level updates
    inserted: FxHashMap<String, usize>,
}

impl TextData {
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// All fragments concatenated
    pub fn content(&self) -> String {
        self.fragments.concat()
    }

    pub(crate) fn push(&mut self, text: &str) {
        self.fragments.push(text.to_string());
    }

    /// Append under `id` the first time, replace the same fragment afterwards.
    pub(crate) fn insert(&mut self, id: &str, text: &str) {
        match self.inserted.get(id) {
            Some(&position) if position < self.fragments.len() => {
                self.fragments[position] = text.to_string();
            }
            _ => {
                self.inserted.insert(id.to_string(), self.fragments.len());
                self.fragments.push(text.to_string());
            }
        }
    }

    fn clear(&mut self) {
        self.fragments.clear();
        self.inserted.clear();
    }
}

#[derive(Debug, Default)]
pub struct ImageData {
    source: Option<String>,
}

impl ImageData {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct HolderData {
    pub(crate) child: Option<WidgetId>,
}

impl HolderData {
    pub fn child(&self) -> Option<WidgetId> {
        self.child
    }
}

/// Kind-specific widget state
#[derive(Debug)]
pub enum WidgetPayload {
    Container(ContainerData),
    Text(TextData),
    Image(ImageData),
    Button(ContainerData),
    Holder(HolderData),
}

impl WidgetPayload {
    fn new(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Container => WidgetPayload::Container(ContainerData::default()),
            WidgetKind::Text => WidgetPayload::Text(TextData::default()),
            WidgetKind::Image => WidgetPayload::Image(ImageData::default()),
            WidgetKind::Button => WidgetPayload::Button(ContainerData::default()),
            WidgetKind::Holder => WidgetPayload::Holder(HolderData::default()),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetPayload::Container(_) => WidgetKind::Container,
            WidgetPayload::Text(_) => WidgetKind::Text,
            WidgetPayload::Image(_) => WidgetKind::Image,
            WidgetPayload::Button(_) => WidgetKind::Button,
            WidgetPayload::Holder(_) => WidgetKind::Holder,
        }
    }

    /// Widgets this payload directly owns
    pub(crate) fn owned_children(&self) -> SmallVec<[WidgetId; 8]> {
        match self {
            WidgetPayload::Container(data) | WidgetPayload::Button(data) => {
                data.children.iter().copied().collect()
            }
            WidgetPayload::Holder(data) => data.child.into_iter().collect(),
            WidgetPayload::Text(_) | WidgetPayload::Image(_) => SmallVec::new(),
        }
    }

    fn clear(&mut self) {
        match self {
            WidgetPayload::Container(data) | WidgetPayload::Button(data) => data.clear(),
            WidgetPayload::Text(data) => data.clear(),
            WidgetPayload::Image(data) => data.source = None,
            WidgetPayload::Holder(data) => data.child = None,
        }
    }
}

// =============================================================================
// WIDGET
// =============================================================================

/// A retained widget.
///
/// While live, a widget always has an owning context and props. Once reset
/// it is marked available and only exists inside the pool's free list.
#[derive(Debug)]
pub struct Widget {
    key: Key,
    props: Option<Props>,
    style: Option<Props>,
    context: Option<ContextId>,
    parent: Option<WidgetId>,
    available: bool,
    payload: WidgetPayload,
}

impl Widget {
    pub(crate) fn new(kind: WidgetKind, props: Props, context: ContextId) -> Self {
        let mut widget = Self {
            key: Key::none(),
            props: Some(props),
            style: None,
            context: Some(context),
            parent: None,
            available: false,
            payload: WidgetPayload::new(kind),
        };
        widget.parse_props();
        widget
    }

    /// Re-arm a recycled instance with fresh props and owner.
    pub(crate) fn reuse(&mut self, props: Props, context: ContextId) {
        self.payload.clear();
        self.key = Key::none();
        self.parent = None;
        self.props = Some(props);
        self.context = Some(context);
        self.available = false;
        self.parse_props();
    }

    /// Drop everything the widget holds and mark it available.
    pub(crate) fn release(&mut self) {
        self.payload.clear();
        self.key = Key::none();
        self.props = None;
        self.style = None;
        self.context = None;
        self.parent = None;
        self.available = true;
    }

    fn parse_props(&mut self) {
        let Some(props) = &self.props else {
            return;
        };
        self.style = props.get_object("style");
        if let WidgetPayload::Image(data) = &mut self.payload {
            data.source = props.get_string("src");
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.payload.kind()
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    pub fn props(&self) -> Option<&Props> {
        self.props.as_ref()
    }

    pub fn style(&self) -> Option<&Props> {
        self.style.as_ref()
    }

    /// Owning component context
    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<WidgetId>) {
        self.parent = parent;
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn payload(&self) -> &WidgetPayload {
        &self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut WidgetPayload {
        &mut self.payload
    }

    pub fn as_container(&self) -> Option<&ContainerData> {
        match &self.payload {
            WidgetPayload::Container(data) | WidgetPayload::Button(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn as_container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.payload {
            WidgetPayload::Container(data) | WidgetPayload::Button(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match &self.payload {
            WidgetPayload::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_holder(&self) -> Option<&HolderData> {
        match &self.payload {
            WidgetPayload::Holder(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match &self.payload {
            WidgetPayload::Image(data) => Some(data),
            _ => None,
        }
    }

    /// One-line human readable summary
    pub fn describe(&self) -> String {
        let name = self.kind().name();
        match &self.payload {
            WidgetPayload::Container(data) | WidgetPayload::Button(data) => {
                format!("{name} with {} children", data.children.len())
            }
            WidgetPayload::Text(data) => format!("{name}: {}", data.content()),
            WidgetPayload::Image(data) => {
                format!("{name}: {}", data.source.as_deref().unwrap_or("<no source>"))
            }
            WidgetPayload::Holder(data) => match data.child {
                Some(_) => name.to_string(),
                None => format!("{name} (empty)"),
            },
        }
    }
}
