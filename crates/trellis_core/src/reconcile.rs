//! Tree reconciliation.
//!
//! Reconciliation re-runs a component (or re-materializes a primitive)
//! against the widget it produced last time:
//!
//! - **Context reuse**: the old widget's context is made current in
//!   reconciliation mode, so hooks read their existing slots.
//! - **Identity**: when the fresh widget has the old widget's kind, its
//!   content is adopted into the old handle. Handles held by parents and by
//!   effect closures stay valid.
//! - **Children**: statically placed and id-inserted children are found
//!   again by id; keyed lists are matched by key and reordered with the
//!   minimum number of moves.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::engine::Engine;
use crate::error::{ReconcileError, Result};
use crate::holder::{NodeDescriptor, NodeSource};
use crate::tree::WidgetTree;
use crate::widget::{WidgetId, WidgetKind};

// =============================================================================
// COMPATIBILITY
// =============================================================================

/// Whether `new` may be reconciled against the live widget `old`.
///
/// A component descriptor matches the root widget of a context created for
/// the same component function. A primitive descriptor matches a non-root
/// widget of the same kind.
pub fn is_compatible(tree: &WidgetTree, old: WidgetId, new: &NodeDescriptor) -> bool {
    let Some(widget) = tree.widget(old) else {
        return false;
    };
    let Some(context) = widget.context().and_then(|ctx| tree.context(ctx)) else {
        return false;
    };
    let is_root = context.root() == Some(old);
    match new.source() {
        NodeSource::Component(function) => {
            is_root && context.component().is_some_and(|c| c.ptr_eq(function))
        }
        NodeSource::Primitive(type_name) => {
            !is_root && WidgetKind::from_type_name(type_name).is_ok_and(|kind| kind == widget.kind())
        }
    }
}

// =============================================================================
// SINGLE NODE
// =============================================================================

/// Re-execute `new` against the live widget `old` and return the widget
/// that now stands in its place.
///
/// The result is `old` itself whenever the fresh output has the same kind;
/// otherwise `old` is torn down and the fresh widget is returned. An
/// incompatible descriptor is materialized from scratch.
pub fn reconcile_object<E: Engine + ?Sized>(
    engine: &mut E,
    old: WidgetId,
    new: NodeDescriptor,
) -> Result<WidgetId> {
    if !is_compatible(engine.tree(), old, &new) {
        debug!(?old, "descriptor does not match widget, rebuilding");
        let fresh = new.execute(engine)?;
        engine.tree_mut().reset_pointer(old);
        return Ok(fresh);
    }

    let (context, old_kind, old_props) = {
        let widget = engine.tree().get(old)?;
        let context = widget.context().ok_or(ReconcileError::StaleWidget(old))?;
        (context, widget.kind(), widget.props().cloned())
    };
    let new_props = new.props().clone();
    let is_component = new.is_component();
    let against = old_kind.has_children().then_some(old);

    let scope = engine
        .tree_mut()
        .context_mut(context)?
        .begin_reconciliation(is_component, against);
    if is_component {
        engine.push_existing_component(context);
    } else {
        engine.plug_component(context);
    }

    let executed = new.execute(engine);

    if is_component {
        engine.tree_mut().discard_pending_reuse(context);
    } else {
        engine.unplug_component()?;
    }
    if let Ok(ctx) = engine.tree_mut().context_mut(context) {
        ctx.end_reconciliation(scope);
        if is_component && against.is_some() {
            ctx.clear_pending();
            ctx.clear_dirty();
        }
    }
    let fresh = executed?;

    if let Some(old_props) = old_props {
        engine.compare_props(&old_props, &new_props);
    }
    let fresh_kind = engine.tree().get(fresh)?.kind();
    if fresh_kind == old_kind {
        engine.tree_mut().adopt(old, fresh)?;
        Ok(old)
    } else {
        engine.tree_mut().reset_pointer(old);
        Ok(fresh)
    }
}

// =============================================================================
// ID-ADDRESSED CHILDREN
// =============================================================================

#[derive(Clone, Copy)]
enum Placement {
    Static,
    Inserted,
}

/// The child recorded under `id` in the container the owner is reconciling against.
fn previous_child(
    tree: &WidgetTree,
    container: WidgetId,
    id: &str,
    placement: Placement,
) -> Option<WidgetId> {
    let owner = tree.owner(container).ok()?;
    let context = tree.context(owner)?;
    if !context.reconciliation_started() {
        return None;
    }
    let against = context.reconciling_against()?;
    if against == container {
        return None;
    }
    let previous = tree.container(against).ok()?;
    let position = match placement {
        Placement::Static => previous.static_position(id),
        Placement::Inserted => previous.inserted_position(id),
    }?;
    let child = *previous.children().get(position)?;
    tree.contains(child).then_some(child)
}

/// Add a child that keeps its identity across re-renders by `id`.
///
/// While the owning context is reconciling, the child recorded under the
/// same id in the old container is moved over as-is. Otherwise the
/// descriptor is executed and recorded.
pub fn add_static_child<E: Engine + ?Sized>(
    engine: &mut E,
    container: WidgetId,
    child: NodeDescriptor,
) -> Result<WidgetId> {
    let id = child.id().map(str::to_owned);
    if let Some(id) = id.as_deref() {
        let previous = previous_child(engine.tree(), container, id, Placement::Static)
            .filter(|previous| is_compatible(engine.tree(), *previous, &child));
        if let Some(previous) = previous {
            let tree = engine.tree_mut();
            let position = tree.add_child(container, previous)?;
            let child_context = child.is_component().then(|| tree.owner(previous)).transpose()?;
            tree.record_static(container, Some(id), position, child_context)?;
            return Ok(previous);
        }
    }

    let is_component = child.is_component();
    let widget = child.execute(engine)?;
    let tree = engine.tree_mut();
    let position = tree.add_child(container, widget)?;
    let child_context = if is_component {
        Some(tree.owner(widget)?)
    } else {
        None
    };
    tree.record_static(container, id.as_deref(), position, child_context)?;
    Ok(widget)
}

/// Place a child under `id`, reconciling whatever was placed there before.
///
/// While the owning context is reconciling, the child recorded under `id`
/// in the old container is reconciled and appended. Outside reconciliation
/// a new id is executed and appended, and a known id is reconciled in place.
pub fn insert_child<E: Engine + ?Sized>(
    engine: &mut E,
    container: WidgetId,
    id: &str,
    child: NodeDescriptor,
) -> Result<WidgetId> {
    if let Some(previous) = previous_child(engine.tree(), container, id, Placement::Inserted) {
        let widget = reconcile_object(engine, previous, child)?;
        let tree = engine.tree_mut();
        let position = tree.add_child(container, widget)?;
        tree.record_inserted(container, id, position)?;
        return Ok(widget);
    }

    let existing = {
        let data = engine.tree().container(container)?;
        data.inserted_position(id)
            .and_then(|position| Some((position, *data.children().get(position)?)))
            .filter(|(_, previous)| engine.tree().contains(*previous))
    };
    match existing {
        Some((position, previous)) => {
            let widget = reconcile_object(engine, previous, child)?;
            if widget != previous {
                engine.tree_mut().replace_child(container, position, widget)?;
            }
            Ok(widget)
        }
        None => {
            let widget = child.execute(engine)?;
            let tree = engine.tree_mut();
            let position = tree.add_child(container, widget)?;
            tree.record_inserted(container, id, position)?;
            Ok(widget)
        }
    }
}

// =============================================================================
// KEYED LISTS
// =============================================================================

/// What a list reconciliation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListReconciliation {
    /// Old children reconciled in place
    pub reused: usize,
    /// Reused children that had to change position
    pub moved: usize,
    /// Children materialized fresh
    pub inserted: usize,
    /// Old children torn down
    pub removed: usize,
}

/// Reconcile a container's children against a new list of descriptors.
///
/// Keyed descriptors reuse the old child with the same key; unkeyed ones
/// reuse the unkeyed old child at the same position. Reused children keep
/// their handles and hook state, the longest run already in order stays
/// put, everything else is moved, and old children nobody claimed are torn
/// down. The container's owning context is current throughout.
pub fn reconcile_widget_holders<E: Engine + ?Sized>(
    engine: &mut E,
    container: WidgetId,
    descriptors: Vec<NodeDescriptor>,
) -> Result<ListReconciliation> {
    let owner = engine.tree().owner(container)?;
    engine.plug_component(owner);
    let result = reconcile_children(engine, container, descriptors);
    engine.unplug_component()?;
    let stats = result?;
    debug!(
        reused = stats.reused,
        moved = stats.moved,
        inserted = stats.inserted,
        removed = stats.removed,
        "reconciled child list"
    );
    Ok(stats)
}

/// Map `items` through `render` and reconcile the container against the result.
///
/// Items rendering to `None` are skipped.
pub fn reconcile_list<E, T, F>(
    engine: &mut E,
    container: WidgetId,
    items: impl IntoIterator<Item = T>,
    mut render: F,
) -> Result<ListReconciliation>
where
    E: Engine + ?Sized,
    F: FnMut(&mut E, T, usize) -> Result<Option<E::HostValue>>,
{
    let mut descriptors = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if let Some(value) = render(engine, item, index)? {
            descriptors.push(engine.get_widget_holder(value)?);
        }
    }
    reconcile_widget_holders(engine, container, descriptors)
}

fn reconcile_children<E: Engine + ?Sized>(
    engine: &mut E,
    container: WidgetId,
    descriptors: Vec<NodeDescriptor>,
) -> Result<ListReconciliation> {
    let old_children = engine.tree().children(container)?.to_vec();
    let mut stats = ListReconciliation::default();

    if old_children.is_empty() {
        for descriptor in descriptors {
            let widget = descriptor.execute(engine)?;
            engine.tree_mut().add_child(container, widget)?;
            stats.inserted += 1;
        }
        return Ok(stats);
    }

    let mut by_key: FxHashMap<String, (WidgetId, usize)> = FxHashMap::default();
    for (position, child) in old_children.iter().enumerate() {
        if let Some(key) = engine.tree().get(*child)?.key().as_str() {
            by_key.insert(key.to_string(), (*child, position));
        }
    }

    let mut next = Vec::with_capacity(descriptors.len());
    let mut used_keys: FxHashSet<String> = FxHashSet::default();
    // (new position, old position) of every child reused in place
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for (position, descriptor) in descriptors.into_iter().enumerate() {
        let candidate = match descriptor.key().as_str() {
            Some(key) if !used_keys.contains(key) => by_key.get(key).copied().map(|found| {
                used_keys.insert(key.to_string());
                found
            }),
            Some(_) => None,
            None => old_children
                .get(position)
                .copied()
                .filter(|old| {
                    engine
                        .tree()
                        .widget(*old)
                        .is_some_and(|w| !w.key().is_present())
                })
                .map(|old| (old, position)),
        };

        let widget = match candidate {
            Some((old, old_position)) if is_compatible(engine.tree(), old, &descriptor) => {
                let widget = reconcile_object(engine, old, descriptor)?;
                if widget == old {
                    pairs.push((position, old_position));
                    stats.reused += 1;
                }
                widget
            }
            _ => descriptor.execute(engine)?,
        };
        next.push(widget);
    }

    let survivors: FxHashSet<WidgetId> = next.iter().copied().collect();
    let mut working: Vec<WidgetId> = Vec::with_capacity(old_children.len());
    for child in old_children {
        if survivors.contains(&child) {
            working.push(child);
        } else if engine.tree_mut().reset_pointer(child) {
            stats.removed += 1;
        }
    }

    let old_positions: Vec<usize> = pairs.iter().map(|(_, old)| *old).collect();
    let stable: FxHashSet<usize> = longest_increasing_subsequence(&old_positions)
        .into_iter()
        .map(|index| pairs[index].0)
        .collect();

    // Walk from the back so every anchor is already in its final place
    for position in (0..next.len()).rev() {
        let widget = next[position];
        match working.iter().position(|w| *w == widget) {
            Some(_) if stable.contains(&position) => continue,
            Some(index) => {
                working.remove(index);
                stats.moved += 1;
            }
            None => stats.inserted += 1,
        }
        let at = next
            .get(position + 1)
            .and_then(|anchor| working.iter().position(|w| w == anchor))
            .unwrap_or(working.len());
        working.insert(at, widget);
    }

    engine.tree_mut().set_children(container, working)?;
    Ok(stats)
}

/// Indices of one longest strictly increasing subsequence of `sequence`.
pub fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<usize> {
    // tails[k] is the index of the smallest tail of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; sequence.len()];
    for (index, value) in sequence.iter().enumerate() {
        let slot = tails.partition_point(|&tail| sequence[tail] < *value);
        if slot > 0 {
            predecessors[index] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(index);
        } else {
            tails[slot] = index;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        result.push(index);
        cursor = predecessors[index];
    }
    result.reverse();
    result
}
