//! Element Registry - Marker stacks and the per-element visual registry.
//!
//! Attaching an element synchronously builds visuals, which synchronously
//! raise collection-changed events, which call back into the plotter. The
//! marker stacks record which element is being attached or detached so those
//! callbacks can attribute the visuals they observe:
//! - `MarkerStack` - call-depth tracking, one per direction
//! - `VisualRegistry` - element → visuals currently bound to its proxy
//!
//! A stack (not a single "current element") is required because an
//! element's attach callback may attach further elements.

use std::collections::HashMap;

use crate::element::ElementRef;
use crate::types::VisualId;

// =============================================================================
// Marker Stack
// =============================================================================

/// Elements with an attach (or detach) call in progress, innermost last.
#[derive(Debug, Default)]
pub struct MarkerStack {
    stack: Vec<ElementRef>,
}

impl MarkerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, element: ElementRef) {
        self.stack.push(element);
    }

    pub(crate) fn pop(&mut self) -> Option<ElementRef> {
        self.stack.pop()
    }

    /// Innermost element, the one new structural events belong to.
    pub fn peek(&self) -> Option<&ElementRef> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn contains(&self, element: &ElementRef) -> bool {
        self.stack.contains(element)
    }
}

// =============================================================================
// Visual Registry
// =============================================================================

/// Visuals registered per element, in registration order.
///
/// An entry exists only while it holds at least one visual.
#[derive(Debug, Default)]
pub struct VisualRegistry {
    entries: HashMap<ElementRef, Vec<VisualId>>,
}

impl VisualRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, element: &ElementRef, visual: VisualId) {
        self.entries.entry(element.clone()).or_default().push(visual);
    }

    /// Remove one registration of `visual`. The entry is dropped when it
    /// becomes empty. Returns false if the visual was not registered.
    pub(crate) fn unregister(&mut self, element: &ElementRef, visual: VisualId) -> bool {
        let Some(visuals) = self.entries.get_mut(element) else {
            return false;
        };
        let Some(pos) = visuals.iter().position(|v| *v == visual) else {
            return false;
        };
        visuals.remove(pos);
        if visuals.is_empty() {
            self.entries.remove(element);
        }
        true
    }

    /// Drop the whole entry of an element.
    pub(crate) fn remove_element(&mut self, element: &ElementRef) -> Option<Vec<VisualId>> {
        self.entries.remove(element)
    }

    pub fn visuals(&self, element: &ElementRef) -> Option<&[VisualId]> {
        self.entries.get(element).map(Vec::as_slice)
    }

    pub fn contains(&self, element: &ElementRef) -> bool {
        self.entries.contains_key(element)
    }

    /// Number of visuals still registered for an element.
    pub fn remaining(&self, element: &ElementRef) -> usize {
        self.entries.get(element).map_or(0, Vec::len)
    }

    pub fn is_registered(&self, element: &ElementRef, visual: VisualId) -> bool {
        self.entries.get(element).is_some_and(|v| v.contains(&visual))
    }

    /// Element a visual is registered under.
    pub fn owner_of(&self, visual: VisualId) -> Option<&ElementRef> {
        self.entries
            .iter()
            .find(|(_, visuals)| visuals.contains(&visual))
            .map(|(element, _)| element)
    }

    /// Number of elements with at least one registered visual.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PlotterElement;
    use crate::error::Result;
    use crate::plotter::Plotter;
    use crate::types::{PlotterId, VisualKind};
    use crate::engine::VisualTree;

    struct Inert;

    impl PlotterElement for Inert {
        fn plotter(&self) -> Option<PlotterId> {
            None
        }
        fn on_plotter_attached(&mut self, _plotter: &mut Plotter) -> Result<()> {
            Ok(())
        }
        fn on_plotter_detaching(&mut self, _plotter: &mut Plotter) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_marker_stack_nesting() {
        let outer = ElementRef::new(Inert);
        let inner = ElementRef::new(Inert);
        let mut stack = MarkerStack::new();

        assert!(stack.peek().is_none());

        stack.push(outer.clone());
        assert_eq!(stack.peek(), Some(&outer));

        stack.push(inner.clone());
        assert_eq!(stack.peek(), Some(&inner));
        assert_eq!(stack.depth(), 2);
        assert!(stack.contains(&outer));

        stack.pop();
        assert_eq!(stack.peek(), Some(&outer));

        stack.pop();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_entry_absent_after_last_visual() {
        let mut tree = VisualTree::new();
        let a = tree.create(VisualKind::Leaf);
        let b = tree.create(VisualKind::Leaf);
        let element = ElementRef::new(Inert);
        let mut registry = VisualRegistry::new();

        assert!(!registry.contains(&element));

        registry.register(&element, a);
        registry.register(&element, b);
        assert_eq!(registry.visuals(&element), Some(&[a, b][..]));
        assert_eq!(registry.owner_of(b), Some(&element));

        assert!(registry.unregister(&element, a));
        assert_eq!(registry.remaining(&element), 1);

        assert!(registry.unregister(&element, b));
        assert!(!registry.contains(&element));
        assert!(registry.visuals(&element).is_none());
        assert!(!registry.unregister(&element, b));
    }
}
