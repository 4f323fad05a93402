//! Visual Tree - Arena of visuals and notifying panels.
//!
//! Every visual a plotter knows about lives here: template panels, visuals
//! created by elements, and placeholder proxies. Parent links are kept in
//! both directions (panel → children collection, child → parent).
//!
//! # Notifying panels
//!
//! A panel's child collection is materialized lazily. The first call to
//! [`VisualTree::ensure_children`] creates it and hands back the listeners of
//! the panel's one-shot `ChildrenCreated` event; it never does so again.
//! Consumers that want to observe a panel must therefore check
//! [`PanelState::notifying_children`] first and only subscribe to
//! `ChildrenCreated` when the collection does not exist yet.
//!
//! The tree itself only records subscriptions. Raising events (calling the
//! handlers) is the host's job, so handlers can take `&mut Plotter`.
//!
//! # Properties
//!
//! Opacity, visibility and hit-test visibility are stored in signals so
//! reactive readers can track them. Writes that must propagate through
//! proxy bindings go through [`Plotter::set_property`](crate::Plotter::set_property).

use slotmap::SlotMap;
use spark_signals::{signal, Signal};

use super::event::{Event, HandlerId};
use crate::error::{PlotterError, Result};
use crate::types::{
    CollectionChange, PanelKind, PropertyValue, Visibility, VisualId, VisualKind, VisualProperties,
};

// =============================================================================
// Nodes
// =============================================================================

/// One visual in the tree.
pub struct VisualNode {
    kind: VisualKind,
    parent: Option<VisualId>,
    opacity: Signal<f64>,
    visibility: Signal<Visibility>,
    hit_test_visible: Signal<bool>,
    panel: Option<PanelState>,
}

impl VisualNode {
    fn new(kind: VisualKind) -> Self {
        let panel = match kind {
            VisualKind::Panel(panel_kind) => Some(PanelState::new(panel_kind)),
            _ => None,
        };
        Self {
            kind,
            parent: None,
            opacity: signal(1.0),
            visibility: signal(Visibility::Visible),
            hit_test_visible: signal(true),
            panel,
        }
    }

    pub fn kind(&self) -> VisualKind {
        self.kind
    }

    /// Panel this visual is a child of.
    pub fn parent(&self) -> Option<VisualId> {
        self.parent
    }

    pub fn opacity(&self) -> f64 {
        self.opacity.get()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility.get()
    }

    pub fn is_hit_test_visible(&self) -> bool {
        self.hit_test_visible.get()
    }

    /// Panel state, if this visual is a panel.
    pub fn panel(&self) -> Option<&PanelState> {
        self.panel.as_ref()
    }
}

/// Notifying-container half of a panel.
#[derive(Debug)]
pub struct PanelState {
    kind: PanelKind,
    children: Option<NotifyingChildren>,
    children_created: Event,
}

impl PanelState {
    fn new(kind: PanelKind) -> Self {
        Self {
            kind,
            children: None,
            children_created: Event::new(),
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    /// The observable child collection, or `None` while not materialized.
    pub fn notifying_children(&self) -> Option<&NotifyingChildren> {
        self.children.as_ref()
    }

    pub(crate) fn notifying_children_mut(&mut self) -> Option<&mut NotifyingChildren> {
        self.children.as_mut()
    }

    /// Listeners of the one-shot creation event.
    pub fn children_created(&self) -> &Event {
        &self.children_created
    }

    pub(crate) fn children_created_mut(&mut self) -> &mut Event {
        &mut self.children_created
    }
}

/// Observable child collection of a panel.
#[derive(Debug, Default)]
pub struct NotifyingChildren {
    items: Vec<VisualId>,
    collection_changed: Event,
}

impl NotifyingChildren {
    pub fn items(&self) -> &[VisualId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, visual: VisualId) -> bool {
        self.items.contains(&visual)
    }

    pub fn index_of(&self, visual: VisualId) -> Option<usize> {
        self.items.iter().position(|v| *v == visual)
    }

    /// Listeners of structural changes.
    pub fn collection_changed(&self) -> &Event {
        &self.collection_changed
    }

    pub(crate) fn collection_changed_mut(&mut self) -> &mut Event {
        &mut self.collection_changed
    }
}

// =============================================================================
// Tree
// =============================================================================

/// Arena of all visuals owned by one plotter.
#[derive(Default)]
pub struct VisualTree {
    nodes: SlotMap<VisualId, VisualNode>,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unparented visual.
    pub fn create(&mut self, kind: VisualKind) -> VisualId {
        self.nodes.insert(VisualNode::new(kind))
    }

    pub fn contains(&self, id: VisualId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: VisualId) -> Option<&VisualNode> {
        self.nodes.get(id)
    }

    pub fn node(&self, id: VisualId) -> Result<&VisualNode> {
        self.nodes.get(id).ok_or(PlotterError::UnknownVisual(id))
    }

    fn node_mut(&mut self, id: VisualId) -> Result<&mut VisualNode> {
        self.nodes.get_mut(id).ok_or(PlotterError::UnknownVisual(id))
    }

    pub fn kind(&self, id: VisualId) -> Option<VisualKind> {
        self.nodes.get(id).map(|n| n.kind)
    }

    pub fn is_panel(&self, id: VisualId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.panel.is_some())
    }

    pub fn parent(&self, id: VisualId) -> Option<VisualId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn panel(&self, id: VisualId) -> Result<&PanelState> {
        self.node(id)?.panel.as_ref().ok_or(PlotterError::NotAPanel(id))
    }

    pub(crate) fn panel_mut(&mut self, id: VisualId) -> Result<&mut PanelState> {
        self.node_mut(id)?.panel.as_mut().ok_or(PlotterError::NotAPanel(id))
    }

    /// The panel's child collection, `None` if not yet materialized.
    pub fn notifying_children(&self, panel: VisualId) -> Result<Option<&NotifyingChildren>> {
        Ok(self.panel(panel)?.children.as_ref())
    }

    // -------------------------------------------------------------------------
    // Child collection
    // -------------------------------------------------------------------------

    /// Materialize the panel's child collection if needed.
    ///
    /// Returns the `ChildrenCreated` listeners to notify when the collection
    /// was created by this call, `None` if it already existed.
    pub(crate) fn ensure_children(&mut self, panel: VisualId) -> Result<Option<Vec<HandlerId>>> {
        let state = self.panel_mut(panel)?;
        if state.children.is_some() {
            return Ok(None);
        }
        state.children = Some(NotifyingChildren::default());
        tracing::trace!(?panel, "panel children created");
        Ok(Some(state.children_created.snapshot()))
    }

    fn children_mut(&mut self, panel: VisualId) -> Result<&mut NotifyingChildren> {
        self.panel_mut(panel)?
            .children
            .as_mut()
            .ok_or_else(|| PlotterError::InvalidState(format!("children of panel {panel:?} not created")))
    }

    fn check_insertable(&self, panel: VisualId, visual: VisualId) -> Result<()> {
        self.panel(panel)?;
        let node = self.node(visual)?;
        if node.parent.is_some() {
            return Err(PlotterError::AlreadyParented(visual));
        }
        // Walk up from the panel: the visual must not be the panel or one of its ancestors.
        let mut current = Some(panel);
        while let Some(id) = current {
            if id == visual {
                return Err(PlotterError::CyclicVisual { panel, visual });
            }
            current = self.parent(id);
        }
        Ok(())
    }

    pub(crate) fn insert_child(
        &mut self,
        panel: VisualId,
        index: usize,
        visual: VisualId,
    ) -> Result<CollectionChange> {
        self.check_insertable(panel, visual)?;
        let children = self.children_mut(panel)?;
        if index > children.items.len() {
            return Err(PlotterError::IndexOutOfRange {
                index,
                len: children.items.len(),
            });
        }
        children.items.insert(index, visual);
        self.node_mut(visual)?.parent = Some(panel);
        Ok(CollectionChange::added(index, visual))
    }

    pub(crate) fn remove_child_at(&mut self, panel: VisualId, index: usize) -> Result<CollectionChange> {
        let children = self.children_mut(panel)?;
        if index >= children.items.len() {
            return Err(PlotterError::IndexOutOfRange {
                index,
                len: children.items.len(),
            });
        }
        let visual = children.items.remove(index);
        self.node_mut(visual)?.parent = None;
        Ok(CollectionChange::removed(index, visual))
    }

    pub(crate) fn replace_child(
        &mut self,
        panel: VisualId,
        index: usize,
        visual: VisualId,
    ) -> Result<CollectionChange> {
        self.check_insertable(panel, visual)?;
        let children = self.children_mut(panel)?;
        let len = children.items.len();
        let Some(slot) = children.items.get_mut(index) else {
            return Err(PlotterError::IndexOutOfRange { index, len });
        };
        let old = std::mem::replace(slot, visual);
        self.node_mut(old)?.parent = None;
        self.node_mut(visual)?.parent = Some(panel);
        Ok(CollectionChange::replaced(index, visual, old))
    }

    pub(crate) fn clear_children(&mut self, panel: VisualId) -> Result<CollectionChange> {
        let old_items = std::mem::take(&mut self.children_mut(panel)?.items);
        for &visual in &old_items {
            self.node_mut(visual)?.parent = None;
        }
        Ok(CollectionChange::reset(old_items))
    }

    /// Remove an unparented visual and everything below it from the arena.
    ///
    /// No change notifications are produced. Returns the released ids,
    /// deepest last.
    pub(crate) fn release(&mut self, id: VisualId) -> Result<Vec<VisualId>> {
        if self.node(id)?.parent.is_some() {
            return Err(PlotterError::AlreadyParented(id));
        }
        let mut released = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            if let Some(children) = node.panel.and_then(|p| p.children) {
                pending.extend(children.items);
            }
            released.push(current);
        }
        Ok(released)
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Current value of a single bindable property.
    pub fn property(&self, id: VisualId, property: VisualProperties) -> Result<PropertyValue> {
        let node = self.node(id)?;
        if property == VisualProperties::OPACITY {
            Ok(PropertyValue::Opacity(node.opacity()))
        } else if property == VisualProperties::VISIBILITY {
            Ok(PropertyValue::Visibility(node.visibility()))
        } else if property == VisualProperties::HIT_TEST_VISIBLE {
            Ok(PropertyValue::HitTestVisible(node.is_hit_test_visible()))
        } else {
            Err(PlotterError::InvalidState(format!(
                "{property:?} is not a single visual property"
            )))
        }
    }

    /// Store a value without propagation. Returns whether it changed.
    pub(crate) fn store_property(&mut self, id: VisualId, value: PropertyValue) -> Result<bool> {
        let node = self.node_mut(id)?;
        let changed = match value {
            PropertyValue::Opacity(v) => {
                let changed = node.opacity.get() != v;
                if changed {
                    node.opacity.set(v);
                }
                changed
            }
            PropertyValue::Visibility(v) => {
                let changed = node.visibility.get() != v;
                if changed {
                    node.visibility.set(v);
                }
                changed
            }
            PropertyValue::HitTestVisible(v) => {
                let changed = node.hit_test_visible.get() != v;
                if changed {
                    node.hit_test_visible.set(v);
                }
                changed
            }
        };
        Ok(changed)
    }

    /// Reactive handle to a visual's opacity. Read-only by convention.
    pub fn opacity_signal(&self, id: VisualId) -> Option<Signal<f64>> {
        self.nodes.get(id).map(|n| n.opacity.clone())
    }

    /// Reactive handle to a visual's visibility. Read-only by convention.
    pub fn visibility_signal(&self, id: VisualId) -> Option<Signal<Visibility>> {
        self.nodes.get(id).map(|n| n.visibility.clone())
    }

    /// Reactive handle to a visual's hit-test visibility. Read-only by convention.
    pub fn hit_test_visible_signal(&self, id: VisualId) -> Option<Signal<bool>> {
        self.nodes.get(id).map(|n| n.hit_test_visible.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
