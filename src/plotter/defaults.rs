//! Default-element and default-axis flags.
//!
//! Elements a plotter creates for itself (its default axes, grid, legend)
//! are flagged as default so user content can be removed without touching
//! them. Both flags are kept per plotter, keyed by element identity, and
//! are dropped once the element is detached.

use std::rc::Rc;

use super::{DefaultAxisHook, Plotter};
use crate::element::ElementRef;
use crate::error::Result;

impl Plotter {
    pub fn is_default_element(&self, element: &ElementRef) -> bool {
        self.default_elements.contains(element)
    }

    pub fn set_is_default_element(&mut self, element: &ElementRef, value: bool) {
        if value {
            self.default_elements.insert(element.clone());
        } else {
            self.default_elements.remove(element);
        }
    }

    /// Flag every current child as a default element.
    pub fn set_all_children_as_default(&mut self) {
        self.default_elements.extend(self.children.iter().cloned());
    }

    /// Remove every child that is not a default element, last to first.
    ///
    /// Detach callbacks may remove siblings themselves; those are skipped.
    pub fn remove_user_elements(&mut self) -> Result<()> {
        let user_elements: Vec<ElementRef> = self
            .children
            .iter()
            .rev()
            .filter(|element| !self.default_elements.contains(*element))
            .cloned()
            .collect();
        for element in &user_elements {
            self.remove_child(element)?;
        }
        Ok(())
    }

    /// Drop both flags of an element that left the plotter.
    pub(super) fn forget_flags(&mut self, element: &ElementRef) {
        self.default_elements.remove(element);
        self.default_axes.remove(element);
    }

    pub fn is_default_axis(&self, element: &ElementRef) -> bool {
        self.default_axes.contains(element)
    }

    /// Set the default-axis flag.
    ///
    /// When the flag changes on an element attached to this plotter, the
    /// hook installed with [`on_default_axis_changed`](Self::on_default_axis_changed)
    /// is called.
    pub fn set_is_default_axis(&mut self, element: &ElementRef, value: bool) -> Result<()> {
        let changed = if value {
            self.default_axes.insert(element.clone())
        } else {
            self.default_axes.remove(element)
        };
        if !changed || element.owner()? != Some(self.id) {
            return Ok(());
        }

        tracing::debug!(plotter = ?self.id, ?element, value, "default axis changed");
        if let Some(hook) = self.default_axis_hook.clone() {
            hook(self, element, value);
        }
        Ok(())
    }

    /// Install the hook called when an attached element's default-axis flag
    /// changes. Replaces any previous hook.
    pub fn on_default_axis_changed(&mut self, hook: impl Fn(&mut Plotter, &ElementRef, bool) + 'static) {
        let hook: DefaultAxisHook = Rc::new(hook);
        self.default_axis_hook = Some(hook);
    }
}
