//! The plotter's `Children` collection.
//!
//! Every mutation is applied to the collection first and then reported to
//! the attachment protocol: added elements are attached, removed elements
//! are detached. A failing attach or detach is returned to the caller but
//! the collection keeps the mutation.

use super::Plotter;
use crate::element::ElementRef;
use crate::error::{PlotterError, Result};

impl Plotter {
    /// Hosted elements, in collection order.
    pub fn children(&self) -> &[ElementRef] {
        &self.children
    }

    pub fn contains_child(&self, element: &ElementRef) -> bool {
        self.children.contains(element)
    }

    /// Append an element and attach it.
    pub fn add_child(&mut self, element: impl Into<ElementRef>) -> Result<()> {
        let element = element.into();
        self.children.push(element.clone());
        self.on_children_collection_changed(&[element], &[])
    }

    pub fn insert_child(&mut self, index: usize, element: impl Into<ElementRef>) -> Result<()> {
        let element = element.into();
        if index > self.children.len() {
            return Err(PlotterError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        self.children.insert(index, element.clone());
        self.on_children_collection_changed(&[element], &[])
    }

    /// Remove an element and detach it. Returns false if it was not a child.
    pub fn remove_child(&mut self, element: &ElementRef) -> Result<bool> {
        let Some(index) = self.children.iter().position(|e| e == element) else {
            return Ok(false);
        };
        self.remove_child_at(index)?;
        Ok(true)
    }

    pub fn remove_child_at(&mut self, index: usize) -> Result<ElementRef> {
        if index >= self.children.len() {
            return Err(PlotterError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        let element = self.children.remove(index);
        self.on_children_collection_changed(&[], std::slice::from_ref(&element))?;
        Ok(element)
    }

    /// Put `element` at `index`. The new element is attached before the old
    /// one is detached. Returns the old element.
    pub fn replace_child(&mut self, index: usize, element: impl Into<ElementRef>) -> Result<ElementRef> {
        let element = element.into();
        let len = self.children.len();
        let Some(slot) = self.children.get_mut(index) else {
            return Err(PlotterError::IndexOutOfRange { index, len });
        };
        let old = std::mem::replace(slot, element.clone());
        self.on_children_collection_changed(&[element], std::slice::from_ref(&old))?;
        Ok(old)
    }

    /// Remove every element, detaching them from last to first.
    pub fn clear_children(&mut self) -> Result<()> {
        let mut old = std::mem::take(&mut self.children);
        old.reverse();
        self.on_children_collection_changed(&[], &old)
    }

    fn on_children_collection_changed(&mut self, new_items: &[ElementRef], old_items: &[ElementRef]) -> Result<()> {
        for element in new_items {
            self.on_child_added(element)?;
        }
        for element in old_items {
            self.on_child_removing(element)?;
        }
        Ok(())
    }
}
