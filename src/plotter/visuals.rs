//! Visual management for element callbacks.
//!
//! Elements build their visuals through these methods from inside
//! `on_plotter_attached` / `on_plotter_detaching`. Every structural change
//! materializes the panel's collection if needed (raising `ChildrenCreated`
//! first) and then raises `CollectionChanged` synchronously.

use super::Plotter;
use crate::engine::NotifyingChildren;
use crate::error::{PlotterError, Result};
use crate::types::{CollectionChange, PanelKind, PropertyValue, Visibility, VisualId, VisualKind};

impl Plotter {
    // =========================================================================
    // Creation
    // =========================================================================

    /// Create an unparented leaf visual.
    pub fn create_visual(&mut self) -> VisualId {
        self.tree.create(VisualKind::Leaf)
    }

    /// Create an unparented panel. Its collection stays lazy.
    pub fn create_panel(&mut self, kind: PanelKind) -> VisualId {
        self.tree.create(VisualKind::Panel(kind))
    }

    /// The panel's child collection, created (and announced) on first access.
    pub fn get_or_create_children(&mut self, panel: VisualId) -> Result<&NotifyingChildren> {
        self.materialize(panel)?;
        self.tree
            .notifying_children(panel)?
            .ok_or_else(|| PlotterError::InvalidState(format!("children of panel {panel:?} not created")))
    }

    fn materialize(&mut self, panel: VisualId) -> Result<()> {
        if let Some(listeners) = self.tree.ensure_children(panel)? {
            self.raise_children_created(panel, listeners)?;
        }
        Ok(())
    }

    /// Remove an unparented visual (and anything below it) from the tree.
    pub fn release_visual(&mut self, visual: VisualId) -> Result<()> {
        for released in self.tree.release(visual)? {
            self.links.forget(released);
        }
        Ok(())
    }

    // =========================================================================
    // Structure
    // =========================================================================

    pub fn add_visual(&mut self, panel: VisualId, visual: VisualId) -> Result<()> {
        self.materialize(panel)?;
        let index = self.children_len(panel)?;
        self.insert_visual(panel, index, visual)
    }

    pub fn insert_visual(&mut self, panel: VisualId, index: usize, visual: VisualId) -> Result<()> {
        self.materialize(panel)?;
        let change = self.tree.insert_child(panel, index, visual)?;
        self.raise_collection_changed(panel, &change)
    }

    /// Remove `visual` from `panel`. The visual stays in the tree.
    pub fn remove_visual(&mut self, panel: VisualId, visual: VisualId) -> Result<()> {
        let index = self
            .tree
            .notifying_children(panel)?
            .and_then(|children| children.index_of(visual))
            .ok_or(PlotterError::NotAChild { panel, visual })?;
        self.remove_visual_at(panel, index).map(|_| ())
    }

    pub fn remove_visual_at(&mut self, panel: VisualId, index: usize) -> Result<VisualId> {
        self.materialize(panel)?;
        let change = self.tree.remove_child_at(panel, index)?;
        self.raise_collection_changed(panel, &change)?;
        Ok(change.old_items[0])
    }

    /// Put `visual` at `index`, returning the visual it replaced.
    pub fn replace_visual(&mut self, panel: VisualId, index: usize, visual: VisualId) -> Result<VisualId> {
        self.materialize(panel)?;
        let change = self.tree.replace_child(panel, index, visual)?;
        self.raise_collection_changed(panel, &change)?;
        Ok(change.old_items[0])
    }

    /// Remove every child of `panel` with a single reset notification.
    pub fn clear_panel(&mut self, panel: VisualId) -> Result<Vec<VisualId>> {
        self.materialize(panel)?;
        let change = self.tree.clear_children(panel)?;
        self.raise_collection_changed(panel, &change)?;
        let CollectionChange { old_items, .. } = change;
        Ok(old_items)
    }

    fn children_len(&self, panel: VisualId) -> Result<usize> {
        Ok(self.tree.notifying_children(panel)?.map_or(0, NotifyingChildren::len))
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Write a bindable property and propagate it through proxy bindings.
    ///
    /// Returns how many visuals changed.
    pub fn set_property(&mut self, visual: VisualId, value: PropertyValue) -> Result<usize> {
        self.links.set_property(&mut self.tree, visual, value)
    }

    pub fn set_opacity(&mut self, visual: VisualId, opacity: f64) -> Result<usize> {
        self.set_property(visual, PropertyValue::Opacity(opacity))
    }

    pub fn set_visibility(&mut self, visual: VisualId, visibility: Visibility) -> Result<usize> {
        self.set_property(visual, PropertyValue::Visibility(visibility))
    }

    pub fn set_hit_test_visible(&mut self, visual: VisualId, visible: bool) -> Result<usize> {
        self.set_property(visual, PropertyValue::HitTestVisible(visible))
    }

    pub fn opacity(&self, visual: VisualId) -> Result<f64> {
        Ok(self.tree.node(visual)?.opacity())
    }

    pub fn visibility(&self, visual: VisualId) -> Result<Visibility> {
        Ok(self.tree.node(visual)?.visibility())
    }

    pub fn is_hit_test_visible(&self, visual: VisualId) -> Result<bool> {
        Ok(self.tree.node(visual)?.is_hit_test_visible())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::error::PlotterError;
    use crate::plotter::Plotter;
    use crate::types::{CollectionAction, PanelKind, Visibility};

    #[test]
    fn test_created_fires_before_change() {
        let mut plotter = Plotter::new().unwrap();
        let canvas = plotter.main_canvas();
        let log = Rc::new(RefCell::new(Vec::new()));

        let created_log = log.clone();
        let created = plotter.add_children_created_handler(move |plotter, panel| {
            created_log.borrow_mut().push("created");
            let changed_log = created_log.clone();
            let changed = plotter.add_collection_changed_handler(move |_, _, change| {
                changed_log.borrow_mut().push(match change.action {
                    CollectionAction::Add => "add",
                    _ => "other",
                });
                Ok(())
            });
            plotter.subscribe_collection_changed(panel, changed)
        });
        plotter.subscribe_children_created(canvas, created).unwrap();

        let line = plotter.create_visual();
        plotter.add_visual(canvas, line).unwrap();
        let dot = plotter.create_visual();
        plotter.add_visual(canvas, dot).unwrap();

        assert_eq!(*log.borrow(), ["created", "add", "add"]);
    }

    #[test]
    fn test_structure_operations() {
        let mut plotter = Plotter::new().unwrap();
        let panel = plotter.left_panel();
        let a = plotter.create_visual();
        let b = plotter.create_visual();
        let c = plotter.create_visual();

        plotter.add_visual(panel, a).unwrap();
        plotter.insert_visual(panel, 0, b).unwrap();
        assert_eq!(plotter.replace_visual(panel, 1, c).unwrap(), a);
        plotter.remove_visual(panel, b).unwrap();
        assert!(matches!(
            plotter.remove_visual(panel, b),
            Err(PlotterError::NotAChild { .. })
        ));

        assert_eq!(plotter.clear_panel(panel).unwrap(), vec![c]);
        assert!(plotter.get_or_create_children(panel).unwrap().is_empty());
    }

    #[test]
    fn test_release_visual() {
        let mut plotter = Plotter::new().unwrap();
        let nested = plotter.create_panel(PanelKind::StackPanel);
        let leaf = plotter.create_visual();
        plotter.add_visual(nested, leaf).unwrap();

        plotter.release_visual(nested).unwrap();
        assert!(!plotter.visuals().contains(leaf));
        assert!(matches!(
            plotter.opacity(leaf),
            Err(PlotterError::UnknownVisual(_))
        ));
    }

    #[test]
    fn test_unbound_property_setters() {
        let mut plotter = Plotter::new().unwrap();
        let leaf = plotter.create_visual();

        assert_eq!(plotter.set_visibility(leaf, Visibility::Hidden).unwrap(), 1);
        assert_eq!(plotter.set_visibility(leaf, Visibility::Hidden).unwrap(), 0);
        plotter.set_hit_test_visible(leaf, false).unwrap();

        assert_eq!(plotter.visibility(leaf).unwrap(), Visibility::Hidden);
        assert!(!plotter.is_hit_test_visible(leaf).unwrap());
        assert_eq!(plotter.opacity(leaf).unwrap(), 1.0);
    }
}
