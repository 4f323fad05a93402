//! Panel observation router.
//!
//! Wires the plotter's handlers into every notifying panel of the visual
//! tree, including panels created later inside zones, and forwards every
//! structural change to the binding layer.

use super::Plotter;
use crate::error::{PlotterError, Result};
use crate::types::{CollectionChange, VisualId, VisualProperties};

impl Plotter {
    /// Subscribe to every zone of the applied template.
    ///
    /// Zones whose collection already exists are observed directly; the
    /// others get the one-shot created listener and are observed once it
    /// fires.
    pub(super) fn on_apply_template(&mut self) -> Result<()> {
        let (created, changed) = (self.router_created, self.router_changed);
        for panel in self.all_panels() {
            let state = self.tree.panel_mut(panel)?;
            match state.notifying_children_mut() {
                Some(children) => children.collection_changed_mut().subscribe(changed),
                None => state.children_created_mut().subscribe(created),
            }
        }
        Ok(())
    }

    pub(super) fn on_children_created(&mut self, panel: VisualId) -> Result<()> {
        self.subscribe_panel_events(panel)
    }

    /// Swap the created listener for the change listener on a panel whose
    /// collection now exists.
    fn subscribe_panel_events(&mut self, panel: VisualId) -> Result<()> {
        let (created, changed) = (self.router_created, self.router_changed);
        let state = self.tree.panel_mut(panel)?;
        state.children_created_mut().unsubscribe(created);

        let children = state.notifying_children_mut().ok_or_else(|| {
            PlotterError::InvalidState(format!("children of panel {panel:?} not created"))
        })?;
        let event = children.collection_changed_mut();
        event.unsubscribe(changed);
        event.subscribe(changed);

        tracing::trace!(?panel, "panel observed");
        Ok(())
    }

    /// Start observing a panel that just entered an observed collection.
    fn watch_panel(&mut self, panel: VisualId) -> Result<()> {
        let (created, changed) = (self.router_created, self.router_changed);
        let state = self.tree.panel_mut(panel)?;
        match state.notifying_children_mut() {
            Some(children) => {
                let event = children.collection_changed_mut();
                event.unsubscribe(changed);
                event.subscribe(changed);
            }
            None => state.children_created_mut().subscribe(created),
        }
        Ok(())
    }

    /// Stop observing a panel that left an observed collection.
    fn unwatch_panel(&mut self, panel: VisualId) -> Result<()> {
        let (created, changed) = (self.router_created, self.router_changed);
        let state = self.tree.panel_mut(panel)?;
        state.children_created_mut().unsubscribe(created);
        if let Some(children) = state.notifying_children_mut() {
            children.collection_changed_mut().unsubscribe(changed);
        }
        Ok(())
    }

    pub(super) fn on_visual_collection_changed(
        &mut self,
        sender: VisualId,
        change: &CollectionChange,
    ) -> Result<()> {
        for &item in &change.new_items {
            if self.tree.is_panel(item) {
                self.watch_panel(item)?;
            }
            self.on_visual_child_added(item, sender)?;
        }
        for &item in &change.old_items {
            if self.tree.is_panel(item) {
                self.unwatch_panel(item)?;
            }
            self.on_visual_child_removed(item, sender)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Binding layer
    // -------------------------------------------------------------------------

    /// Attribute a new visual to the element being attached and bind it to
    /// that element's proxy. Visuals added outside an attach are ignored.
    fn on_visual_child_added(&mut self, target: VisualId, collection: VisualId) -> Result<()> {
        let Some(element) = self.adding_elements.peek().cloned() else {
            return Ok(());
        };
        let proxy = self.visual_bindings.proxy_for(&element).ok_or_else(|| {
            PlotterError::InvalidState(format!("no proxy for attaching element {element:?}"))
        })?;

        self.added_visual_elements.register(&element, target);
        if proxy != target {
            self.links
                .bind(&mut self.tree, proxy, target, VisualProperties::all())?;
        }

        tracing::trace!(?element, ?target, ?collection, "visual registered");
        Ok(())
    }

    /// Unregister a visual and clear its bindings.
    ///
    /// The visual is attributed to the element being detached when it is
    /// registered there, otherwise to whichever element registered it.
    fn on_visual_child_removed(&mut self, target: VisualId, collection: VisualId) -> Result<()> {
        let element = match self.removing_elements.peek() {
            Some(element) if self.added_visual_elements.is_registered(element, target) => {
                Some(element.clone())
            }
            _ => self.added_visual_elements.owner_of(target).cloned(),
        };
        let Some(element) = element else {
            return Ok(());
        };

        self.added_visual_elements.unregister(&element, target);
        self.links.unbind(target, VisualProperties::all());

        tracing::trace!(?element, ?target, ?collection, "visual unregistered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::plotter::Plotter;
    use crate::types::PanelKind;

    #[test]
    fn test_template_zones_are_observed_once() {
        let plotter = Plotter::new().unwrap();
        let created = plotter.router_created_handler();
        let changed = plotter.router_changed_handler();

        for panel in plotter.all_panels() {
            let state = plotter.visuals().panel(panel).unwrap();
            match state.notifying_children() {
                Some(children) => {
                    assert_eq!(children.collection_changed().count(changed), 1);
                    assert!(!state.children_created().contains(created));
                }
                None => assert_eq!(state.children_created().count(created), 1),
            }
        }
    }

    #[test]
    fn test_lazy_zone_switches_to_change_listener() {
        let mut plotter = Plotter::new().unwrap();
        let canvas = plotter.main_canvas();
        let created = plotter.router_created_handler();
        let changed = plotter.router_changed_handler();

        plotter.get_or_create_children(canvas).unwrap();
        plotter.get_or_create_children(canvas).unwrap();

        let state = plotter.visuals().panel(canvas).unwrap();
        assert!(!state.children_created().contains(created));
        assert_eq!(
            state.notifying_children().unwrap().collection_changed().count(changed),
            1
        );
    }

    #[test]
    fn test_nested_panel_is_watched_and_unwatched() {
        let mut plotter = Plotter::new().unwrap();
        let canvas = plotter.main_canvas();
        let created = plotter.router_created_handler();
        let changed = plotter.router_changed_handler();

        let nested = plotter.create_panel(PanelKind::Grid);
        plotter.add_visual(canvas, nested).unwrap();
        assert_eq!(
            plotter.visuals().panel(nested).unwrap().children_created().count(created),
            1
        );

        let leaf = plotter.create_visual();
        plotter.add_visual(nested, leaf).unwrap();
        let state = plotter.visuals().panel(nested).unwrap();
        assert!(!state.children_created().contains(created));
        assert_eq!(
            state.notifying_children().unwrap().collection_changed().count(changed),
            1
        );

        plotter.remove_visual(canvas, nested).unwrap();
        let state = plotter.visuals().panel(nested).unwrap();
        assert!(!state.notifying_children().unwrap().collection_changed().contains(changed));
    }

    #[test]
    fn test_panel_with_existing_children_is_watched_directly() {
        let mut plotter = Plotter::new().unwrap();
        let canvas = plotter.main_canvas();
        let changed = plotter.router_changed_handler();

        let nested = plotter.create_panel(PanelKind::Canvas);
        plotter.get_or_create_children(nested).unwrap();
        plotter.add_visual(canvas, nested).unwrap();
        // Re-adding after removal must not stack subscriptions.
        plotter.remove_visual(canvas, nested).unwrap();
        plotter.add_visual(canvas, nested).unwrap();

        let children = plotter.visuals().panel(nested).unwrap().notifying_children().unwrap();
        assert_eq!(children.collection_changed().count(changed), 1);
    }
}
