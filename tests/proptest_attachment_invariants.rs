//! Property-based invariant tests for the attachment protocol.
//!
//! These tests drive a plotter through random sequences of attaches,
//! detaches and property writes and check:
//!
//! 1. Marker stacks are empty after every returning call
//! 2. Every hosted element is owned, has a proxy, and has exactly its
//!    visuals registered
//! 3. Detaching an element that leaves visuals behind fails with
//!    `DirtyDetach` and keeps them registered
//! 4. Every registered visual mirrors its proxy's properties
//! 5. No panics on arbitrary sequences, failures included

use std::cell::RefCell;
use std::rc::Rc;

use d3_plotter::{
    ElementRef, Plotter, PlotterElement, PlotterError, PlotterId, Result, VisualId,
};
use proptest::prelude::*;
use proptest::sample::Index;

// ── Fixture ─────────────────────────────────────────────────────────────

/// Adds `count` visuals to the main canvas on attach.
struct Series {
    owner: Option<PlotterId>,
    count: usize,
    visuals: Vec<VisualId>,
    leak: bool,
}

impl PlotterElement for Series {
    fn plotter(&self) -> Option<PlotterId> {
        self.owner
    }

    fn on_plotter_attached(&mut self, plotter: &mut Plotter) -> Result<()> {
        self.owner = Some(plotter.id());
        for _ in 0..self.count {
            let visual = plotter.create_visual();
            plotter.add_visual(plotter.main_canvas(), visual)?;
            self.visuals.push(visual);
        }
        Ok(())
    }

    fn on_plotter_detaching(&mut self, plotter: &mut Plotter) -> Result<()> {
        if !self.leak {
            for visual in self.visuals.drain(..) {
                plotter.remove_visual(plotter.main_canvas(), visual)?;
                plotter.release_visual(visual)?;
            }
        }
        self.owner = None;
        Ok(())
    }
}

type Hosted = (Rc<RefCell<Series>>, ElementRef);

fn series(count: usize, leak: bool) -> Hosted {
    let typed = Rc::new(RefCell::new(Series {
        owner: None,
        count,
        visuals: Vec::new(),
        leak,
    }));
    let element = ElementRef::from(typed.clone());
    (typed, element)
}

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Add { count: usize, leak: bool },
    Insert { at: Index, count: usize },
    RemoveAt(Index),
    SetOpacity(Index, f64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, any::<bool>()).prop_map(|(count, leak)| Op::Add { count, leak }),
        (any::<Index>(), 0usize..4).prop_map(|(at, count)| Op::Insert { at, count }),
        any::<Index>().prop_map(Op::RemoveAt),
        (any::<Index>(), 0.0f64..1.0).prop_map(|(i, v)| Op::SetOpacity(i, v)),
    ]
}

/// Operations for the chaos run: includes elements owned elsewhere and
/// bulk clears, whose failures leave stale state behind.
#[derive(Debug, Clone)]
enum ChaosOp {
    Add { count: usize, leak: bool },
    AddForeign,
    AddTwice,
    RemoveAt(Index),
    Clear,
}

fn chaos_strategy() -> impl Strategy<Value = ChaosOp> {
    prop_oneof![
        3 => (0usize..3, any::<bool>()).prop_map(|(count, leak)| ChaosOp::Add { count, leak }),
        1 => Just(ChaosOp::AddForeign),
        1 => Just(ChaosOp::AddTwice),
        3 => any::<Index>().prop_map(ChaosOp::RemoveAt),
        1 => Just(ChaosOp::Clear),
    ]
}

// ── Invariant checks ────────────────────────────────────────────────────

fn check_hosted(plotter: &Plotter, hosted: &[Hosted], leaked: &[Hosted]) -> std::result::Result<(), TestCaseError> {
    prop_assert!(plotter.attaching_elements().is_empty());
    prop_assert!(plotter.detaching_elements().is_empty());
    prop_assert_eq!(plotter.children().len(), hosted.len());
    prop_assert_eq!(plotter.visual_bindings().len(), hosted.len());

    for ((typed, element), child) in hosted.iter().zip(plotter.children()) {
        prop_assert_eq!(element, child);
        prop_assert_eq!(element.owner().unwrap(), Some(plotter.id()));

        let proxy = plotter.visual_bindings().proxy_for(element);
        prop_assert!(proxy.is_some(), "hosted element without proxy");
        let proxy = proxy.unwrap();

        let series = typed.borrow();
        match plotter.visual_registry().visuals(element) {
            Some(registered) => prop_assert_eq!(registered, series.visuals.as_slice()),
            None => prop_assert!(series.visuals.is_empty()),
        }

        let opacity = plotter.opacity(proxy).unwrap();
        for &visual in &series.visuals {
            prop_assert_eq!(plotter.opacity(visual).unwrap(), opacity);
            prop_assert_eq!(plotter.property_links().source_of(visual), Some(proxy));
        }
    }

    for (typed, element) in leaked {
        prop_assert_eq!(element.owner().unwrap(), None);
        prop_assert!(!plotter.visual_bindings().contains(element));
        prop_assert_eq!(
            plotter.visual_registry().remaining(element),
            typed.borrow().visuals.len()
        );
    }
    prop_assert_eq!(
        plotter.visual_registry().len(),
        hosted.iter().chain(leaked).filter(|(t, _)| !t.borrow().visuals.is_empty()).count()
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1-4. Model-checked sequences
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bookkeeping_matches_hosted_elements(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut plotter = Plotter::new().unwrap();
        let mut hosted: Vec<Hosted> = Vec::new();
        let mut leaked: Vec<Hosted> = Vec::new();

        for op in ops {
            match op {
                Op::Add { count, leak } => {
                    let entry = series(count, leak);
                    plotter.add_child(entry.1.clone()).unwrap();
                    hosted.push(entry);
                }
                Op::Insert { at, count } => {
                    let index = at.index(hosted.len() + 1);
                    let entry = series(count, false);
                    plotter.insert_child(index, entry.1.clone()).unwrap();
                    hosted.insert(index, entry);
                }
                Op::RemoveAt(at) => {
                    if hosted.is_empty() {
                        prop_assert!(plotter.remove_child_at(0).is_err());
                        continue;
                    }
                    let index = at.index(hosted.len());
                    let entry = hosted.remove(index);
                    let (leak, count) = {
                        let series = entry.0.borrow();
                        (series.leak, series.visuals.len())
                    };

                    let result = plotter.remove_child_at(index);
                    if leak && count > 0 {
                        let is_dirty = matches!(
                            result,
                            Err(PlotterError::DirtyDetach { remaining, .. }) if remaining == count
                        );
                        prop_assert!(is_dirty, "expected DirtyDetach");
                        leaked.push(entry);
                    } else {
                        prop_assert!(result.is_ok());
                    }
                }
                Op::SetOpacity(at, value) => {
                    if hosted.is_empty() {
                        continue;
                    }
                    let (_, element) = &hosted[at.index(hosted.len())];
                    let proxy = plotter.visual_bindings().proxy_for(element).unwrap();
                    plotter.set_opacity(proxy, value).unwrap();
                }
            }
            check_hosted(&plotter, &hosted, &leaked)?;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1, 5. Marker balance under failures
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn marker_stacks_balanced_under_failures(ops in prop::collection::vec(chaos_strategy(), 1..40)) {
        let mut plotter = Plotter::new().unwrap();
        let mut other = Plotter::new().unwrap();

        for op in ops {
            match op {
                ChaosOp::Add { count, leak } => {
                    let _ = plotter.add_child(series(count, leak).1);
                }
                ChaosOp::AddForeign => {
                    let (_, element) = series(1, false);
                    other.add_child(element.clone()).unwrap();
                    let result = plotter.add_child(element);
                    prop_assert!(matches!(result, Err(PlotterError::AlreadyOwned)));
                }
                ChaosOp::AddTwice => {
                    let (_, element) = series(1, false);
                    let _ = plotter.add_child(element.clone());
                    let result = plotter.add_child(element);
                    prop_assert!(matches!(result, Err(PlotterError::InvalidState(_))));
                }
                ChaosOp::RemoveAt(at) => {
                    let len = plotter.children().len();
                    if len > 0 {
                        let _ = plotter.remove_child_at(at.index(len));
                    }
                }
                ChaosOp::Clear => {
                    let _ = plotter.clear_children();
                }
            }
            prop_assert!(plotter.attaching_elements().is_empty());
            prop_assert!(plotter.detaching_elements().is_empty());
            prop_assert!(other.attaching_elements().is_empty());
        }
    }
}
