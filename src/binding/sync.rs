//! Two-way property links between a proxy visual and real visuals.
//!
//! Each bound target has exactly one source. A write on either side pushes
//! the value to the other side; every hop stops as soon as the value is
//! already equal, so a proxy shared by many targets settles after one pass.

use std::collections::HashMap;

use crate::engine::VisualTree;
use crate::error::{PlotterError, Result};
use crate::types::{PropertyValue, VisualId, VisualProperties};

#[derive(Debug, Clone, Copy)]
struct Link {
    source: VisualId,
    properties: VisualProperties,
}

/// Binding graph: target → source, and source → targets.
#[derive(Debug, Default)]
pub struct PropertyLinks {
    sources: HashMap<VisualId, Link>,
    targets: HashMap<VisualId, Vec<VisualId>>,
}

impl PropertyLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `properties` of `target` to `source` in two-way mode.
    ///
    /// The target takes the source's current values. Binding a target that
    /// already follows another source moves it to the new one.
    pub(crate) fn bind(
        &mut self,
        tree: &mut VisualTree,
        source: VisualId,
        target: VisualId,
        properties: VisualProperties,
    ) -> Result<()> {
        tree.node(source)?;
        tree.node(target)?;
        if source == target || properties.is_empty() {
            return Ok(());
        }

        if self.sources.get(&target).is_some_and(|link| link.source != source) {
            self.unbind(target, VisualProperties::all());
        }

        let link = self.sources.entry(target).or_insert(Link {
            source,
            properties: VisualProperties::empty(),
        });
        link.properties |= properties;

        let targets = self.targets.entry(source).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }

        for property in properties.iter() {
            let value = tree.property(source, property)?;
            tree.store_property(target, value)?;
        }
        tracing::trace!(?source, ?target, ?properties, "properties bound");
        Ok(())
    }

    /// Clear `properties` on `target`. The target keeps its current values.
    ///
    /// Returns false if the target had no binding.
    pub(crate) fn unbind(&mut self, target: VisualId, properties: VisualProperties) -> bool {
        let Some(link) = self.sources.get_mut(&target) else {
            return false;
        };
        link.properties.remove(properties);
        if link.properties.is_empty() {
            let source = link.source;
            self.sources.remove(&target);
            if let Some(targets) = self.targets.get_mut(&source) {
                targets.retain(|t| *t != target);
                if targets.is_empty() {
                    self.targets.remove(&source);
                }
            }
        }
        tracing::trace!(?target, ?properties, "properties unbound");
        true
    }

    /// Drop every link that involves `visual`, on either side.
    pub(crate) fn forget(&mut self, visual: VisualId) {
        self.unbind(visual, VisualProperties::all());
        if let Some(targets) = self.targets.remove(&visual) {
            for target in targets {
                self.sources.remove(&target);
            }
        }
    }

    /// Write a property and propagate it through the links.
    ///
    /// Returns how many visuals changed. Missing visuals on the far side of a
    /// link (a released proxy) are skipped. Opacity must be finite.
    pub(crate) fn set_property(
        &self,
        tree: &mut VisualTree,
        visual: VisualId,
        value: PropertyValue,
    ) -> Result<usize> {
        if let PropertyValue::Opacity(opacity) = value {
            if !opacity.is_finite() {
                return Err(PlotterError::NonFiniteOpacity(opacity));
            }
        }
        tree.node(visual)?;
        let property = value.property();
        let mut pending = vec![visual];
        let mut updated = 0;

        while let Some(current) = pending.pop() {
            if !tree.contains(current) || !tree.store_property(current, value)? {
                continue;
            }
            updated += 1;

            if let Some(link) = self.sources.get(&current) {
                if link.properties.contains(property) {
                    pending.push(link.source);
                }
            }
            if let Some(targets) = self.targets.get(&current) {
                pending.extend(
                    targets
                        .iter()
                        .copied()
                        .filter(|t| self.is_bound(*t, property)),
                );
            }
        }
        Ok(updated)
    }

    pub fn source_of(&self, target: VisualId) -> Option<VisualId> {
        self.sources.get(&target).map(|link| link.source)
    }

    pub fn bound_properties(&self, target: VisualId) -> VisualProperties {
        self.sources
            .get(&target)
            .map_or(VisualProperties::empty(), |link| link.properties)
    }

    pub fn is_bound(&self, target: VisualId, property: VisualProperties) -> bool {
        self.bound_properties(target).contains(property)
    }

    pub fn targets_of(&self, source: VisualId) -> &[VisualId] {
        self.targets.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }
}
