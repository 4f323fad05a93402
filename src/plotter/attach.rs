//! Element attachment protocol.
//!
//! Attaching or detaching an element runs with the element pushed on the
//! matching marker stack, so visuals its callback adds or removes can be
//! attributed to it. The stack is popped when the `MarkerScope` guard
//! drops, whatever the outcome, unwinding included.
//!
//! Failures are not rolled back: a proxy registered before a failed attach
//! stays registered. [`Plotter::forget_element`] drops that state by hand.

use std::ops::{Deref, DerefMut};

use super::Plotter;
use crate::element::ElementRef;
use crate::error::{PlotterError, Result};
use crate::types::{VisualId, VisualKind, VisualProperties};

// =============================================================================
// Marker Scope
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Direction {
    Attaching,
    Detaching,
}

/// Keeps an element on a marker stack for as long as it lives.
struct MarkerScope<'a> {
    plotter: &'a mut Plotter,
    direction: Direction,
}

impl<'a> MarkerScope<'a> {
    fn enter(plotter: &'a mut Plotter, direction: Direction, element: &ElementRef) -> Self {
        match direction {
            Direction::Attaching => plotter.adding_elements.push(element.clone()),
            Direction::Detaching => plotter.removing_elements.push(element.clone()),
        }
        Self { plotter, direction }
    }
}

impl Deref for MarkerScope<'_> {
    type Target = Plotter;

    fn deref(&self) -> &Plotter {
        self.plotter
    }
}

impl DerefMut for MarkerScope<'_> {
    fn deref_mut(&mut self) -> &mut Plotter {
        self.plotter
    }
}

impl Drop for MarkerScope<'_> {
    fn drop(&mut self) {
        match self.direction {
            Direction::Attaching => self.plotter.adding_elements.pop(),
            Direction::Detaching => self.plotter.removing_elements.pop(),
        };
    }
}

impl Plotter {
    // =========================================================================
    // Attach
    // =========================================================================

    pub(super) fn on_child_added(&mut self, element: &ElementRef) -> Result<()> {
        let result = MarkerScope::enter(self, Direction::Attaching, element).attach_element(element);

        match &result {
            Ok(()) => tracing::debug!(plotter = ?self.id, ?element, "element attached"),
            Err(err) => tracing::warn!(plotter = ?self.id, ?element, %err, "element attach failed"),
        }
        result
    }

    fn attach_element(&mut self, element: &ElementRef) -> Result<()> {
        let proxy = self.create_visual_proxy(element)?;
        self.visual_bindings.insert(element.clone(), proxy);

        if element.owner()?.is_some() {
            return Err(PlotterError::AlreadyOwned);
        }

        element.try_borrow_mut()?.on_plotter_attached(self)?;

        if element.owner()? != Some(self.id) {
            return Err(PlotterError::AttachContractViolated);
        }
        Ok(())
    }

    /// The element's own visual, or a fresh placeholder.
    fn create_visual_proxy(&mut self, element: &ElementRef) -> Result<VisualId> {
        if self.visual_bindings.contains(element) {
            return Err(PlotterError::InvalidState(format!(
                "proxy for {element:?} already exists"
            )));
        }
        match element.visual()? {
            Some(visual) => {
                self.tree.node(visual)?;
                Ok(visual)
            }
            None => Ok(self.tree.create(VisualKind::Placeholder)),
        }
    }

    // =========================================================================
    // Detach
    // =========================================================================

    pub(super) fn on_child_removing(&mut self, element: &ElementRef) -> Result<()> {
        let result = MarkerScope::enter(self, Direction::Detaching, element).detach_element(element);

        match &result {
            Ok(()) => tracing::debug!(plotter = ?self.id, ?element, "element detached"),
            Err(err) => tracing::warn!(plotter = ?self.id, ?element, %err, "element detach failed"),
        }
        result
    }

    fn detach_element(&mut self, element: &ElementRef) -> Result<()> {
        if element.owner()? != Some(self.id) {
            return Err(PlotterError::NotOwner);
        }

        element.try_borrow_mut()?.on_plotter_detaching(self)?;

        if element.owner()?.is_some() {
            return Err(PlotterError::DetachContractViolated);
        }

        let proxy = self.visual_bindings.remove(element);

        let remaining = self.added_visual_elements.remaining(element);
        if remaining > 0 {
            return Err(PlotterError::DirtyDetach {
                element: element.name(),
                remaining,
            });
        }

        if let Some(proxy) = proxy {
            self.release_placeholder(proxy)?;
        }
        self.forget_flags(element);
        Ok(())
    }

    fn release_placeholder(&mut self, proxy: VisualId) -> Result<()> {
        if self.tree.kind(proxy) != Some(VisualKind::Placeholder) {
            return Ok(());
        }
        self.links.forget(proxy);
        if self.tree.parent(proxy).is_none() {
            self.tree.release(proxy)?;
        }
        Ok(())
    }

    // =========================================================================
    // Manual correction
    // =========================================================================

    /// Drop the proxy and registry entries held for `element`, with their
    /// property links.
    ///
    /// Meant for recovering after a failed attach or a dirty detach. The
    /// element's owner back-reference and its visuals are left untouched.
    /// Returns false if nothing was held.
    pub fn forget_element(&mut self, element: &ElementRef) -> bool {
        let proxy = self.visual_bindings.remove(element);
        let visuals = self.added_visual_elements.remove_element(element);

        if let Some(visuals) = &visuals {
            for &visual in visuals {
                self.links.unbind(visual, VisualProperties::all());
            }
        }
        if let Some(proxy) = proxy {
            if let Err(err) = self.release_placeholder(proxy) {
                tracing::warn!(?proxy, %err, "placeholder not released");
            }
        }

        let forgotten = proxy.is_some() || visuals.is_some();
        if forgotten {
            tracing::debug!(plotter = ?self.id, ?element, "element forgotten");
        }
        forgotten
    }
}

// =============================================================================
// Tests
// =============================================================================
