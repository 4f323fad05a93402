//! Core types for d3-plotter.
//!
//! These types define the foundation that everything builds on.
//! They flow through the visual tree, the binding layer and the
//! attachment protocol.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// =============================================================================
// Identity
// =============================================================================

slotmap::new_key_type! {
    /// Key of a visual in the [`VisualTree`](crate::engine::VisualTree) arena.
    pub struct VisualId;
}

/// Process-unique identity of a [`Plotter`](crate::Plotter) host.
///
/// Elements store this as their owner back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlotterId(u64);

impl PlotterId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value (for diagnostics).
    pub const fn get(self) -> u64 {
        self.0
    }
}

// =============================================================================
// Visual Kinds
// =============================================================================

/// Layout container flavour of a panel.
///
/// Only the notification layer is modelled; the layout algorithm of each
/// flavour belongs to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelKind {
    StackPanel,
    Canvas,
    Grid,
}

/// What a node in the visual tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// A renderable visual without children.
    Leaf,
    /// A notifying container.
    Panel(PanelKind),
    /// Neutral stand-in created for an element that is not a visual itself.
    Placeholder,
}

impl VisualKind {
    #[inline]
    pub const fn is_panel(self) -> bool {
        matches!(self, VisualKind::Panel(_))
    }
}

// =============================================================================
// Bindable Properties
// =============================================================================

/// Visibility of a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    /// Not drawn but still takes part in layout.
    Hidden,
    /// Not drawn and takes no space.
    Collapsed,
}

bitflags::bitflags! {
    /// The set of visual properties kept in sync between an element's proxy
    /// and its real visuals.
    ///
    /// Combine with bitwise OR: `VisualProperties::OPACITY | VisualProperties::VISIBILITY`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VisualProperties: u8 {
        const OPACITY = 1 << 0;
        const VISIBILITY = 1 << 1;
        const HIT_TEST_VISIBLE = 1 << 2;
    }
}

/// A value of one bindable property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Opacity(f64),
    Visibility(Visibility),
    HitTestVisible(bool),
}

impl PropertyValue {
    /// The single property flag this value belongs to.
    pub const fn property(&self) -> VisualProperties {
        match self {
            PropertyValue::Opacity(_) => VisualProperties::OPACITY,
            PropertyValue::Visibility(_) => VisualProperties::VISIBILITY,
            PropertyValue::HitTestVisible(_) => VisualProperties::HIT_TEST_VISIBLE,
        }
    }
}

// =============================================================================
// Collection Change Notifications
// =============================================================================

/// Kind of structural change reported by a notifying child collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionAction {
    Add,
    Remove,
    Replace,
    /// The collection was cleared. `old_items` lists everything it held.
    Reset,
}

/// One change notification of a notifying child collection.
///
/// Items appear in the order the collection mutated. Observers must process
/// `new_items` and then `old_items` without reordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange {
    pub action: CollectionAction,
    pub new_items: Vec<VisualId>,
    pub old_items: Vec<VisualId>,
    /// Position of the change inside the collection (0 for a reset).
    pub index: usize,
}

impl CollectionChange {
    pub(crate) fn added(index: usize, item: VisualId) -> Self {
        Self {
            action: CollectionAction::Add,
            new_items: vec![item],
            old_items: Vec::new(),
            index,
        }
    }

    pub(crate) fn removed(index: usize, item: VisualId) -> Self {
        Self {
            action: CollectionAction::Remove,
            new_items: Vec::new(),
            old_items: vec![item],
            index,
        }
    }

    pub(crate) fn replaced(index: usize, new_item: VisualId, old_item: VisualId) -> Self {
        Self {
            action: CollectionAction::Replace,
            new_items: vec![new_item],
            old_items: vec![old_item],
            index,
        }
    }

    pub(crate) fn reset(old_items: Vec<VisualId>) -> Self {
        Self {
            action: CollectionAction::Reset,
            new_items: Vec::new(),
            old_items,
            index: 0,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plotter_ids_are_unique() {
        let a = PlotterId::next();
        let b = PlotterId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_property_value_flags() {
        assert_eq!(PropertyValue::Opacity(0.5).property(), VisualProperties::OPACITY);
        assert_eq!(
            PropertyValue::Visibility(Visibility::Hidden).property(),
            VisualProperties::VISIBILITY
        );
        assert_eq!(
            PropertyValue::HitTestVisible(false).property(),
            VisualProperties::HIT_TEST_VISIBLE
        );
        assert_eq!(VisualProperties::all().bits(), 0b111);
    }

    #[test]
    fn test_replace_change_carries_both_sides() {
        let mut ids = slotmap::SlotMap::<VisualId, ()>::with_key();
        let a = ids.insert(());
        let b = ids.insert(());

        let change = CollectionChange::replaced(3, a, b);
        assert_eq!(change.action, CollectionAction::Replace);
        assert_eq!(change.new_items, vec![a]);
        assert_eq!(change.old_items, vec![b]);
        assert_eq!(change.index, 3);
    }
}
