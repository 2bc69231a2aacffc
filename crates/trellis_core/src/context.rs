//! Component contexts: per-instance hook state.
//!
//! A context is created the first time a component function runs and is
//! reused for every later reconciliation of that component. It owns:
//!
//! - **Hooks**: one ordered list of state slots and effects. Slot `i` is
//!   always the `i`-th hook call of the component body.
//! - **Pending updates**: values written by setters, committed at the next
//!   settle pass.
//! - **Flags**: `dirty` (pending work exists) and the reconciliation mode
//!   that makes hooks read existing slots instead of appending new ones.

use std::fmt;

use rustc_hash::FxHashMap;
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::error::{ReconcileError, Result};
use crate::value::{HostFunction, StateValue};
use crate::widget::WidgetId;

new_key_type! {
    /// Handle to a component context
    pub struct ContextId;
}

/// Hands out creation indices; parents always get a lower index than their children.
#[derive(Debug, Default, Clone)]
pub struct CreationCounter {
    next: u64,
}

impl CreationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_index(&mut self) -> u64 {
        let index = self.next;
        self.next += 1;
        index
    }
}

/// Identity of a state slot: which context, which hook position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateRef {
    pub context: ContextId,
    pub slot: usize,
}

/// One entry of an effect's dependency list
#[derive(Clone, Debug)]
pub enum Dependency {
    /// A state slot; the effect re-runs when this slot is committed with a new value
    State(StateRef),
    /// A plain value; it never matches a committed update, but it makes the
    /// dependency list non-empty
    Value(StateValue),
}

impl From<StateRef> for Dependency {
    fn from(state: StateRef) -> Self {
        Dependency::State(state)
    }
}

impl From<StateValue> for Dependency {
    fn from(value: StateValue) -> Self {
        Dependency::Value(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
}

/// What a setter writes
pub enum SetStateAction {
    Value(StateValue),
    /// Derive the next value from the current committed one
    Update(Box<dyn FnOnce(&StateValue) -> StateValue>),
}

impl SetStateAction {
    pub fn update(f: impl FnOnce(&StateValue) -> StateValue + 'static) -> Self {
        SetStateAction::Update(Box::new(f))
    }
}

impl From<StateValue> for SetStateAction {
    fn from(value: StateValue) -> Self {
        SetStateAction::Value(value)
    }
}

impl fmt::Debug for SetStateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetStateAction::Value(value) => f.debug_tuple("Value").field(value).finish(),
            SetStateAction::Update(_) => f.write_str("Update(..)"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct EffectEntry {
    callback: HostFunction,
    deps: SmallVec<[Dependency; 2]>,
    cleanup: Option<HostFunction>,
}

#[derive(Debug)]
enum Hook {
    State(StateValue),
    Effect(EffectEntry),
}

impl Hook {
    fn kind(&self) -> HookKind {
        match self {
            Hook::State(_) => HookKind::State,
            Hook::Effect(_) => HookKind::Effect,
        }
    }
}

/// What the caller of [`ComponentContext::effect`] has to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectAction {
    /// First render: invoke the callback and record its cleanup at `slot`
    Mount { slot: usize },
    /// Reconciliation with a non-empty dependency list: invoke the fresh callback
    Rerun,
    /// Reconciliation with no dependencies: nothing to do
    Skip,
}

/// Effect work collected by a settle pass, run without borrowing the context
#[derive(Debug)]
pub(crate) struct EffectWork {
    pub(crate) slot: usize,
    pub(crate) cleanup: Option<HostFunction>,
    pub(crate) callback: Option<HostFunction>,
}

/// Saved reconciliation flags, restored by [`ComponentContext::end_reconciliation`]
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationScope {
    reconciling: bool,
    against: Option<WidgetId>,
    cursor: usize,
}

/// Hook state and bookkeeping for one component instance
#[derive(Debug)]
pub struct ComponentContext {
    id: ContextId,
    index: u64,
    component: Option<HostFunction>,
    root: Option<WidgetId>,
    hooks: Vec<Hook>,
    pending: FxHashMap<usize, StateValue>,
    updated: FxHashMap<usize, StateValue>,
    hook_cursor: usize,
    dirty: bool,
    reconciling: bool,
    reconciling_against: Option<WidgetId>,
    widgets: SmallVec<[WidgetId; 4]>,
}

impl ComponentContext {
    pub(crate) fn new(id: ContextId, index: u64, component: Option<HostFunction>) -> Self {
        Self {
            id,
            index,
            component,
            root: None,
            hooks: Vec::new(),
            pending: FxHashMap::default(),
            updated: FxHashMap::default(),
            hook_cursor: 0,
            dirty: false,
            reconciling: false,
            reconciling_against: None,
            widgets: SmallVec::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Creation index; settle passes process contexts in this order
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The component function this context was created for
    pub fn component(&self) -> Option<&HostFunction> {
        self.component.as_ref()
    }

    /// The widget the component returned on its last render
    pub fn root(&self) -> Option<WidgetId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: WidgetId) {
        self.root = Some(root);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn reconciliation_started(&self) -> bool {
        self.reconciling
    }

    pub fn reconciling_against(&self) -> Option<WidgetId> {
        self.reconciling_against
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn hook_cursor(&self) -> usize {
        self.hook_cursor
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Committed value of a state slot
    pub fn state(&self, slot: usize) -> Option<&StateValue> {
        match self.hooks.get(slot) {
            Some(Hook::State(value)) => Some(value),
            _ => None,
        }
    }

    /// Widgets owned by this context
    pub fn widgets(&self) -> &[WidgetId] {
        &self.widgets
    }

    pub(crate) fn track_widget(&mut self, widget: WidgetId) {
        self.widgets.push(widget);
    }

    pub(crate) fn untrack_widget(&mut self, widget: WidgetId) {
        self.widgets.retain(|w| *w != widget);
        if self.root == Some(widget) {
            self.root = None;
        }
    }

    pub(crate) fn replace_widget(&mut self, from: WidgetId, to: WidgetId) {
        for widget in self.widgets.iter_mut().filter(|w| **w == from) {
            *widget = to;
        }
        if self.root == Some(from) {
            self.root = Some(to);
        }
    }

    // =========================================================================
    // HOOKS
    // =========================================================================

    /// Claim a state slot.
    ///
    /// On mount a new slot holding `initial` is appended. During
    /// reconciliation the slot at the hook cursor is returned as-is.
    pub fn use_state(&mut self, initial: StateValue) -> Result<(StateValue, StateRef)> {
        if self.reconciling {
            let slot = self.hook_cursor;
            return match self.hooks.get(slot) {
                Some(Hook::State(value)) => {
                    self.hook_cursor += 1;
                    Ok((value.clone(), self.state_ref(slot)))
                }
                other => Err(ReconcileError::HookOrderViolation {
                    index: slot,
                    expected: other.map(Hook::kind),
                    found: HookKind::State,
                }),
            };
        }
        let slot = self.hooks.len();
        self.hooks.push(Hook::State(initial.clone()));
        Ok((initial, self.state_ref(slot)))
    }

    /// Write a state slot.
    ///
    /// The next value is compared with the committed one; an equal value is
    /// a no-op. Otherwise `notify` runs, the value is staged as pending and
    /// the context is marked dirty. Returns whether an update was staged.
    pub fn set_state(
        &mut self,
        slot: usize,
        action: SetStateAction,
        notify: impl FnOnce(),
    ) -> Result<bool> {
        let current = match self.hooks.get(slot) {
            Some(Hook::State(value)) => value,
            other => {
                return Err(ReconcileError::HookOrderViolation {
                    index: slot,
                    expected: other.map(Hook::kind),
                    found: HookKind::State,
                })
            }
        };
        let next = match action {
            SetStateAction::Value(value) => value,
            SetStateAction::Update(derive) => derive(current),
        };
        if next == *current {
            return Ok(false);
        }
        notify();
        self.pending.insert(slot, next);
        self.dirty = true;
        Ok(true)
    }

    /// Register an effect at the hook cursor.
    ///
    /// On mount the effect is appended with no cleanup yet; the caller runs
    /// the callback and records its cleanup with [`set_cleanup`](Self::set_cleanup).
    /// During reconciliation the stored callback and dependencies are
    /// replaced, the cleanup is kept, and the caller runs the fresh callback
    /// only if the dependency list is non-empty.
    pub fn effect(
        &mut self,
        callback: HostFunction,
        deps: impl IntoIterator<Item = Dependency>,
    ) -> Result<EffectAction> {
        let deps: SmallVec<[Dependency; 2]> = deps.into_iter().collect();
        if self.reconciling {
            let slot = self.hook_cursor;
            return match self.hooks.get_mut(slot) {
                Some(Hook::Effect(entry)) => {
                    // Later settle passes run the latest callback; the cleanup stays
                    entry.callback = callback;
                    entry.deps = deps;
                    self.hook_cursor += 1;
                    Ok(if entry.deps.is_empty() {
                        EffectAction::Skip
                    } else {
                        EffectAction::Rerun
                    })
                }
                other => Err(ReconcileError::HookOrderViolation {
                    index: slot,
                    expected: other.map(|hook| hook.kind()),
                    found: HookKind::Effect,
                }),
            };
        }
        let slot = self.hooks.len();
        self.hooks.push(Hook::Effect(EffectEntry {
            callback,
            deps,
            cleanup: None,
        }));
        Ok(EffectAction::Mount { slot })
    }

    pub(crate) fn set_cleanup(&mut self, slot: usize, cleanup: Option<HostFunction>) {
        if let Some(Hook::Effect(entry)) = self.hooks.get_mut(slot) {
            entry.cleanup = cleanup;
        }
    }

    /// Remove every live cleanup, for teardown
    pub(crate) fn take_cleanups(&mut self) -> Vec<HostFunction> {
        self.hooks
            .iter_mut()
            .filter_map(|hook| match hook {
                Hook::Effect(entry) => entry.cleanup.take(),
                Hook::State(_) => None,
            })
            .collect()
    }

    fn state_ref(&self, slot: usize) -> StateRef {
        StateRef {
            context: self.id,
            slot,
        }
    }

    // =========================================================================
    // SETTLING
    // =========================================================================

    /// Move pending values into their slots and record them as updated.
    pub(crate) fn commit_pending(&mut self) -> usize {
        let committed = self.pending.len();
        for (slot, value) in self.pending.drain() {
            if let Some(Hook::State(current)) = self.hooks.get_mut(slot) {
                *current = value.clone();
                self.updated.insert(slot, value);
            }
        }
        committed
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// First half of a settle pass.
    ///
    /// Returns `None` when the context is clean. Otherwise commits pending
    /// updates, clears `dirty` and collects, per effect in registration
    /// order, its live cleanup and whether it must re-run: it must when one
    /// of its state dependencies was just committed.
    pub(crate) fn begin_settle(&mut self) -> Option<Vec<EffectWork>> {
        if !self.dirty {
            self.finish_settle();
            return None;
        }
        self.commit_pending();
        self.dirty = false;

        let id = self.id;
        let updated = &self.updated;
        let mut work = Vec::new();
        for (slot, hook) in self.hooks.iter_mut().enumerate() {
            let Hook::Effect(entry) = hook else {
                continue;
            };
            let cleanup = entry.cleanup.take();
            let rerun = entry.deps.iter().any(|dep| {
                matches!(dep, Dependency::State(state) if state.context == id && updated.contains_key(&state.slot))
            });
            if cleanup.is_some() || rerun {
                work.push(EffectWork {
                    slot,
                    cleanup,
                    callback: rerun.then(|| entry.callback.clone()),
                });
            }
        }
        Some(work)
    }

    /// Second half of a settle pass
    pub(crate) fn finish_settle(&mut self) {
        self.updated.clear();
        self.hook_cursor = 0;
    }

    // =========================================================================
    // RECONCILIATION MODE
    // =========================================================================

    /// Enter reconciliation mode, saving the previous flags.
    ///
    /// With `owns_render` the component itself is about to re-run: pending
    /// updates are committed and the hook cursor rewinds to the first hook.
    pub fn begin_reconciliation(
        &mut self,
        owns_render: bool,
        against: Option<WidgetId>,
    ) -> ReconciliationScope {
        let scope = ReconciliationScope {
            reconciling: self.reconciling,
            against: self.reconciling_against,
            cursor: self.hook_cursor,
        };
        self.reconciling = true;
        if owns_render {
            self.commit_pending();
            self.hook_cursor = 0;
        }
        if against.is_some() {
            self.reconciling_against = against;
        }
        scope
    }

    pub fn end_reconciliation(&mut self, scope: ReconciliationScope) {
        self.reconciling = scope.reconciling;
        self.reconciling_against = scope.against;
        self.hook_cursor = scope.cursor;
    }
}
