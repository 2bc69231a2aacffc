//! Bundled demo programs

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;
use trellis_runtime::prelude::*;
use trellis_runtime::{ListReconciliation, PropValue, Props, RuntimeConfig, SettleReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Counter,
    KeyedList,
    FeedbackLoop,
}

impl Scenario {
    pub fn summary(self) -> &'static str {
        match self {
            Scenario::Counter => "parent, child and grandchild components wired through effects",
            Scenario::KeyedList => "keyed reordering with move statistics",
            Scenario::FeedbackLoop => "an effect that keeps dirtying its own state",
        }
    }
}

pub fn run(scenario: Scenario, config: RuntimeConfig) -> Result<()> {
    let mut rt = Runtime::with_config(config);
    match scenario {
        Scenario::Counter => counter(&mut rt)?,
        Scenario::KeyedList => keyed_list(&mut rt)?,
        Scenario::FeedbackLoop => feedback_loop(&mut rt)?,
    }
    rt.shutdown().context("Failed to shut down runtime")?;
    let stats = rt.stats();
    info!(
        widgets = stats.widgets,
        contexts = stats.contexts,
        "scenario finished"
    );
    Ok(())
}

fn print_tree(rt: &Runtime, title: &str) {
    println!("== {title}");
    print!("{}", rt.describe());
}

fn print_settle(report: &SettleReport) {
    println!(
        "settled in {} passes ({} updates, converged: {})",
        report.passes, report.updates, report.converged
    );
}

fn print_list(step: &str, stats: &ListReconciliation) {
    println!(
        "{step}: reused {}, moved {}, inserted {}, removed {}",
        stats.reused, stats.moved, stats.inserted, stats.removed
    );
}

// =============================================================================
// COUNTER
// =============================================================================

fn numbers_of(props: &Props) -> Vec<f64> {
    PropValues::from_props(props)
        .and_then(|values| values.get("numbers"))
        .and_then(PropValue::as_list)
        .map(|items| items.iter().filter_map(PropValue::as_number).collect())
        .unwrap_or_default()
}

fn grandchild() -> Component {
    Component::new(|rt, props, _| {
        let (_, names) = rt.use_state(vec!["Ali".to_string()])?;
        let root = rt.element(view())?;
        rt.add_static_child(root, text("GrandChild Component").id("title"))?;
        let summary = rt.element(text(format!("{} numbers", numbers_of(props).len())))?;
        let list = rt.element(view())?;
        rt.use_effect(
            move |rt| {
                let current = rt.get(names)?;
                rt.reconcile_list(list, current, |_, name, index| {
                    Ok(Some(text(name).key(index.to_string())))
                })?;
                Ok(None)
            },
            vec![names.dep()],
        )?;
        rt.set(
            names,
            vec!["Ali".to_string(), "Emad".to_string(), "Hassan".to_string()],
        )?;
        rt.add_child(root, summary)?;
        rt.add_child(root, list)?;
        Ok(root)
    })
}

fn child(grandchild: Component) -> Component {
    Component::new(move |rt, props, _| {
        let numbers = numbers_of(props);
        let root = rt.element(view())?;
        rt.add_static_child(root, text("Child Component").id("title"))?;
        let grandchild = grandchild.clone();
        let forwarded = numbers.clone();
        rt.use_effect(
            move |rt| {
                let element = Element::component(&grandchild).prop("numbers", forwarded.clone());
                rt.insert_child(root, "grandchild", element)?;
                Ok(None)
            },
            vec![value_dep(numbers)],
        )?;
        Ok(root)
    })
}

fn parent(child: Component, handle: Rc<Cell<Option<StateHandle<Vec<f64>>>>>) -> Component {
    Component::new(move |rt, _, _| {
        let (_, numbers) = rt.use_state(vec![1.0, 2.0, 3.0, 4.0])?;
        handle.set(Some(numbers));

        let style = PropValues::new().with("color", "#ff0").with("display", "flex");
        let root = rt.element(view().style(style).child(text("Parent Component")))?;

        let child = child.clone();
        rt.use_effect(
            move |rt| {
                let current = rt.get(numbers)?;
                let element = Element::component(&child).prop("numbers", current);
                rt.insert_child(root, "child", element)?;
                Ok(None)
            },
            vec![numbers.dep()],
        )?;

        let label = rt.element(text("Add Number "))?;
        let add = rt.element(button())?;
        rt.add_child(add, label)?;
        rt.use_effect(
            move |rt| {
                let current = rt.get(numbers)?;
                rt.insert_text(label, "numbers", &format!("{current:?}"))?;
                Ok(None)
            },
            vec![numbers.dep()],
        )?;
        rt.add_child(root, add)?;
        Ok(root)
    })
}

fn counter(rt: &mut Runtime) -> Result<()> {
    let handle = Rc::new(Cell::new(None));
    let app = parent(child(grandchild()), handle.clone());

    rt.render(Element::component(&app))?;
    print_tree(rt, "mounted");
    let numbers = handle.get().context("Parent component did not render")?;

    for press in 1..=2 {
        // What the button's click handler would do
        rt.update(numbers, |numbers| {
            let mut numbers = numbers.clone();
            numbers.push(numbers.len() as f64 + 1.0);
            numbers
        })?;
        let report = rt.settle()?;
        print_tree(rt, &format!("after press {press}"));
        print_settle(&report);
    }
    Ok(())
}

// =============================================================================
// KEYED LIST
// =============================================================================

fn keyed_list(rt: &mut Runtime) -> Result<()> {
    let rows = |keys: &[&str]| -> Vec<Element> {
        keys.iter()
            .map(|key| text(format!("row {key}")).key(*key))
            .collect()
    };
    let list = rt.render(view())?;

    let steps: [(&str, &[&str]); 4] = [
        ("mount", &["A", "B", "C", "D", "E"]),
        ("rotate", &["E", "A", "B", "C", "D"]),
        ("replace", &["E", "A", "F", "C", "D"]),
        ("reverse", &["D", "C", "F", "A", "E"]),
    ];
    for (step, keys) in steps {
        let stats = rt.reconcile_children(list, rows(keys))?;
        print_list(step, &stats);
        print_tree(rt, step);
    }
    Ok(())
}

// =============================================================================
// FEEDBACK LOOP
// =============================================================================

fn feedback_loop(rt: &mut Runtime) -> Result<()> {
    let handle = Rc::new(Cell::new(None));
    let looping = {
        let handle = handle.clone();
        Component::new(move |rt, _, _| {
            let (_, ticks) = rt.use_state(0i32)?;
            handle.set(Some(ticks));
            let label = rt.element(text("ticks: "))?;
            rt.use_effect(
                move |rt| {
                    let value = rt.get(ticks)?;
                    rt.insert_text(label, "ticks", &value.to_string())?;
                    rt.update(ticks, |n| n + 1)?;
                    Ok(None)
                },
                vec![ticks.dep()],
            )?;
            Ok(label)
        })
    };

    rt.render(Element::component(&looping))?;
    print_tree(rt, "after render");
    let ticks = handle.get().context("Component did not render")?;

    for round in 1..=2 {
        let report = rt.settle()?;
        print_settle(&report);
        println!("round {round}: ticks = {}", rt.get(ticks)?);
    }
    print_tree(rt, "final");
    Ok(())
}
