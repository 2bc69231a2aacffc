//! Settling: draining dirty contexts in bounded passes.
//!
//! Setters queue their context here. A settle runs passes over the queued
//! contexts in creation order (parents before children). Each pass commits
//! pending state and re-runs the effects that depend on it; contexts dirtied
//! during a pass form the next pass. After `max_passes` the loop stops even
//! if work remains, logs a warning and leaves the rest queued.

use tracing::{debug, warn};

use crate::context::ContextId;
use crate::engine::Engine;
use crate::error::Result;

pub const DEFAULT_MAX_PASSES: usize = 3;

/// Queue of contexts waiting to be settled
#[derive(Debug, Clone)]
pub struct UpdateScheduler {
    queued: Vec<ContextId>,
    max_passes: usize,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::with_max_passes(DEFAULT_MAX_PASSES)
    }

    /// A scheduler that gives up after `max_passes` (at least one).
    pub fn with_max_passes(max_passes: usize) -> Self {
        Self {
            queued: Vec::new(),
            max_passes: max_passes.max(1),
        }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    pub fn set_max_passes(&mut self, max_passes: usize) {
        self.max_passes = max_passes.max(1);
    }

    /// Queue a context; queuing twice is a no-op.
    pub fn notify(&mut self, context: ContextId) {
        if !self.queued.contains(&context) {
            self.queued.push(context);
        }
    }

    pub fn is_queued(&self, context: ContextId) -> bool {
        self.queued.contains(&context)
    }

    pub fn has_pending(&self) -> bool {
        !self.queued.is_empty()
    }

    fn take(&mut self) -> Vec<ContextId> {
        std::mem::take(&mut self.queued)
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`settle`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Passes run
    pub passes: usize,
    /// Context updates performed across all passes
    pub updates: usize,
    /// False when the pass limit was hit with contexts still dirty
    pub converged: bool,
}

/// Drain the scheduler queue.
pub fn settle<E: Engine + ?Sized>(engine: &mut E) -> Result<SettleReport> {
    let max_passes = engine.tree().scheduler().max_passes();
    let mut report = SettleReport {
        converged: true,
        ..SettleReport::default()
    };
    let mut batch = engine.tree_mut().scheduler_mut().take();

    while !batch.is_empty() {
        if report.passes == max_passes {
            warn!(
                passes = report.passes,
                remaining = batch.len(),
                "update loop did not converge, leaving remaining contexts queued"
            );
            report.converged = false;
            let scheduler = engine.tree_mut().scheduler_mut();
            for context in batch {
                scheduler.notify(context);
            }
            break;
        }

        let tree = engine.tree();
        batch.retain(|id| tree.context(*id).is_some());
        batch.sort_by_key(|id| tree.context(*id).map(|ctx| ctx.index()));

        debug!(pass = report.passes, contexts = batch.len(), "settle pass");
        for context in &batch {
            update_context(engine, *context)?;
            report.updates += 1;
        }
        report.passes += 1;
        batch = engine.tree_mut().scheduler_mut().take();
    }

    for cleanup in engine.tree_mut().take_orphaned_cleanups() {
        engine.call_cleanup(cleanup)?;
    }
    Ok(report)
}

/// Run one context's update step.
///
/// A clean context only resets its bookkeeping. A dirty one commits its
/// pending state, then for each effect in registration order runs the live
/// cleanup (if any) and re-runs the callback when one of its dependencies
/// was committed, recording the new cleanup. The context is current while
/// its effects run.
pub fn update_context<E: Engine + ?Sized>(engine: &mut E, id: ContextId) -> Result<()> {
    let Ok(context) = engine.tree_mut().context_mut(id) else {
        return Ok(());
    };
    let Some(work) = context.begin_settle() else {
        return Ok(());
    };
    if work.is_empty() {
        context.finish_settle();
        return Ok(());
    }

    engine.plug_component(id);
    let mut result = Ok(());
    for item in work {
        if let Some(cleanup) = item.cleanup {
            result = engine.call_cleanup(cleanup);
            if result.is_err() {
                break;
            }
        }
        if let Some(callback) = item.callback {
            match engine.call_effect(&callback) {
                Ok(cleanup) => {
                    if let Ok(ctx) = engine.tree_mut().context_mut(id) {
                        ctx.set_cleanup(item.slot, cleanup);
                    }
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
    }
    engine.unplug_component()?;
    if let Ok(ctx) = engine.tree_mut().context_mut(id) {
        ctx.finish_settle();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Dependency, SetStateAction, StateRef};
    use crate::holder::NodeDescriptor;
    use crate::props::empty_props;
    use crate::testing::{cleanup_fn, component, effect_fn, mount, text, view, TestEngine};
    use crate::value::StateValue;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn read(engine: &TestEngine, state: StateRef) -> i32 {
        engine
            .tree()
            .state_value(state)
            .ok()
            .and_then(|value| value.downcast_ref::<i32>().copied())
            .unwrap_or(-1)
    }

    fn set(engine: &mut TestEngine, state: StateRef, value: i32) {
        engine
            .tree_mut()
            .set_state(state, SetStateAction::Value(StateValue::new(value)))
            .unwrap();
    }

    #[test]
    fn test_max_passes_is_at_least_one() {
        assert_eq!(UpdateScheduler::with_max_passes(0).max_passes(), 1);
        assert_eq!(UpdateScheduler::new().max_passes(), DEFAULT_MAX_PASSES);
    }

    #[test]
    fn test_empty_settle_converges() {
        let mut engine = TestEngine::default();
        let report = settle(&mut engine).unwrap();
        assert_eq!(report.passes, 0);
        assert!(report.converged);
    }

    #[test]
    fn test_effect_reruns_with_cleanup() {
        let mut engine = TestEngine::default();
        let log: Log = Rc::default();
        let handle = Rc::new(Cell::new(None));
        let widget = {
            let log = log.clone();
            let handle = handle.clone();
            component(move |engine, _, _| {
                let (_, state) = engine.use_state(StateValue::new(0i32))?;
                handle.set(Some(state));
                let log = log.clone();
                engine.effect(
                    effect_fn(move |engine| {
                        let value = read(engine, state);
                        log.borrow_mut().push(format!("run {value}"));
                        let log = log.clone();
                        Ok(Some(cleanup_fn(move |_| {
                            log.borrow_mut().push(format!("cleanup {value}"))
                        })))
                    }),
                    vec![Dependency::State(state)],
                )?;
                text("x").execute(engine)
            })
        };
        mount(&mut engine, NodeDescriptor::component(widget, empty_props()));
        assert_eq!(*log.borrow(), ["run 0"]);

        let state = handle.get().unwrap();
        set(&mut engine, state, 1);
        let report = settle(&mut engine).unwrap();
        assert_eq!(report.passes, 1);
        assert_eq!(report.updates, 1);
        assert!(report.converged);
        assert_eq!(*log.borrow(), ["run 0", "cleanup 0", "run 1"]);
        assert_eq!(engine.tree().stack_depth(), 0);
    }

    #[test]
    fn test_clean_context_runs_nothing() {
        let mut engine = TestEngine::default();
        let runs = Rc::new(Cell::new(0));
        let handle = Rc::new(Cell::new(None));
        let widget = {
            let runs = runs.clone();
            let handle = handle.clone();
            component(move |engine, _, _| {
                let (_, state) = engine.use_state(StateValue::new(0i32))?;
                handle.set(Some(state));
                let runs = runs.clone();
                engine.effect(
                    effect_fn(move |_| {
                        runs.set(runs.get() + 1);
                        Ok(None)
                    }),
                    vec![Dependency::State(state)],
                )?;
                text("x").execute(engine)
            })
        };
        mount(&mut engine, NodeDescriptor::component(widget, empty_props()));
        let state = handle.get().unwrap();

        // Setting the committed value again stages nothing
        set(&mut engine, state, 0);
        settle(&mut engine).unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_settle_is_bounded() {
        let mut engine = TestEngine::default();
        let handle = Rc::new(Cell::new(None));
        let widget = {
            let handle = handle.clone();
            component(move |engine, _, _| {
                let (_, state) = engine.use_state(StateValue::new(0i32))?;
                handle.set(Some(state));
                engine.effect(
                    effect_fn(move |engine| {
                        let next = read(engine, state) + 1;
                        set(engine, state, next);
                        Ok(None)
                    }),
                    vec![Dependency::State(state)],
                )?;
                text("loop").execute(engine)
            })
        };
        mount(&mut engine, NodeDescriptor::component(widget, empty_props()));
        let state = handle.get().unwrap();

        let report = settle(&mut engine).unwrap();
        assert_eq!(report.passes, DEFAULT_MAX_PASSES);
        assert!(!report.converged);
        assert_eq!(read(&engine, state), 3);
        assert!(engine.tree().scheduler().is_queued(state.context));

        // The leftover work continues on the next settle
        let report = settle(&mut engine).unwrap();
        assert_eq!(report.passes, DEFAULT_MAX_PASSES);
        assert_eq!(read(&engine, state), 6);
    }

    #[test]
    fn test_parents_settle_before_children() {
        let mut engine = TestEngine::default();
        let log: Log = Rc::default();
        let states: Rc<RefCell<Vec<StateRef>>> = Rc::default();

        let logging = |name: &'static str| {
            let log = log.clone();
            let states = states.clone();
            move |engine: &mut TestEngine| -> crate::Result<()> {
                let (_, state) = engine.use_state(StateValue::new(0i32))?;
                states.borrow_mut().push(state);
                let log = log.clone();
                engine.effect(
                    effect_fn(move |_| {
                        log.borrow_mut().push(name.to_string());
                        Ok(None)
                    }),
                    vec![Dependency::State(state)],
                )
            }
        };
        let child = {
            let hooks = logging("child");
            component(move |engine, _, _| {
                hooks(engine)?;
                text("child").execute(engine)
            })
        };
        let parent = {
            let hooks = logging("parent");
            component(move |engine, _, _| {
                hooks(engine)?;
                view()
                    .with_child(NodeDescriptor::component(child.clone(), empty_props()))
                    .execute(engine)
            })
        };
        mount(&mut engine, NodeDescriptor::component(parent, empty_props()));
        log.borrow_mut().clear();

        let (parent_state, child_state) = {
            let states = states.borrow();
            (states[0], states[1])
        };
        set(&mut engine, child_state, 1);
        set(&mut engine, parent_state, 1);
        let report = settle(&mut engine).unwrap();
        assert_eq!(report.updates, 2);
        assert_eq!(*log.borrow(), ["parent", "child"]);
    }

    #[test]
    fn test_unmount_runs_cleanup() {
        let mut engine = TestEngine::default();
        let log: Log = Rc::default();
        let widget = {
            let log = log.clone();
            component(move |engine, _, _| {
                let log = log.clone();
                engine.effect(
                    effect_fn(move |_| {
                        let log = log.clone();
                        Ok(Some(cleanup_fn(move |_| {
                            log.borrow_mut().push("unmounted".to_string())
                        })))
                    }),
                    vec![],
                )?;
                text("x").execute(engine)
            })
        };
        let root = mount(&mut engine, NodeDescriptor::component(widget, empty_props()));
        let owner = engine.tree().owner(root).unwrap();

        engine.tree_mut().reset_pointer(root);
        assert!(engine.tree().context(owner).is_none());
        assert!(log.borrow().is_empty());

        settle(&mut engine).unwrap();
        assert_eq!(*log.borrow(), ["unmounted"]);
    }
}
