//! Visual Proxy Binding - Per-element proxies and property links.
//!
//! Every attached element gets one proxy visual: the element itself when it
//! is a visual, otherwise a neutral placeholder. Real visuals the element
//! creates later are bound to that proxy, so setting opacity, visibility or
//! hit-test visibility on the proxy drives all of them (and vice versa).
//!
//! - [`VisualBindingCollection`] - element → proxy cache
//! - [`PropertyLinks`] - two-way links between proxies and real visuals

mod sync;

pub use sync::PropertyLinks;

use std::collections::HashMap;

use crate::element::ElementRef;
use crate::types::VisualId;

/// Cache of the proxy visual of each attached element.
#[derive(Debug, Default)]
pub struct VisualBindingCollection {
    cache: HashMap<ElementRef, VisualId>,
}

impl VisualBindingCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proxy visual of an element, if it has one.
    pub fn proxy_for(&self, element: &ElementRef) -> Option<VisualId> {
        self.cache.get(element).copied()
    }

    pub fn contains(&self, element: &ElementRef) -> bool {
        self.cache.contains_key(element)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementRef, VisualId)> {
        self.cache.iter().map(|(element, proxy)| (element, *proxy))
    }

    pub(crate) fn insert(&mut self, element: ElementRef, proxy: VisualId) {
        self.cache.insert(element, proxy);
    }

    pub(crate) fn remove(&mut self, element: &ElementRef) -> Option<VisualId> {
        self.cache.remove(element)
    }
}
