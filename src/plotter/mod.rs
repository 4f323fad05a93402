//! Plotter - Host control for chart elements.
//!
//! The plotter owns the visual tree built from its template, the `Children`
//! collection of plotter elements, and the bookkeeping that keeps the two in
//! sync:
//! - proxy cache (element → proxy visual) and property links
//! - visual registry (element → real visuals bound to its proxy)
//! - attaching / detaching marker stacks
//! - handler table for panel events
//!
//! # Flow
//!
//! ```text
//! add_child(graph)
//!   → attach: push marker, register proxy, graph.on_plotter_attached(plotter)
//!       → plotter.add_visual(main_canvas, line)
//!           → ChildrenCreated (main canvas materialized) → router subscribes
//!           → CollectionChanged → router → on_visual_child_added(line)
//!               → registry[graph] += line, bind proxy ⇄ line
//!   → pop marker
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut plotter = Plotter::new()?;
//! let graph = Rc::new(RefCell::new(LineGraph::default()));
//!
//! plotter.add_child(graph.clone())?;
//!
//! // Fade the whole graph through its proxy.
//! let proxy = plotter.visual_bindings().proxy_for(&graph.clone().into()).unwrap();
//! plotter.set_property(proxy, PropertyValue::Opacity(0.5))?;
//!
//! plotter.remove_child(&graph.into())?;
//! ```

mod attach;
mod children;
mod defaults;
mod router;
mod template;
mod visuals;

pub use template::*;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::binding::{PropertyLinks, VisualBindingCollection};
use crate::element::ElementRef;
use crate::engine::{Event, HandlerId, MarkerStack, VisualRegistry, VisualTree};
use crate::error::{PlotterError, Result};
use crate::types::{CollectionChange, PlotterId, VisualId};

// =============================================================================
// Handlers
// =============================================================================

/// Handler of a panel's one-shot `ChildrenCreated` event. Receives the panel.
pub type ChildrenCreatedHandler = Rc<dyn Fn(&mut Plotter, VisualId) -> Result<()>>;

/// Handler of a child collection's `CollectionChanged` event. Receives the
/// panel whose collection changed.
pub type CollectionChangedHandler = Rc<dyn Fn(&mut Plotter, VisualId, &CollectionChange) -> Result<()>>;

/// Hook called when the default-axis flag of an attached element changes.
pub type DefaultAxisHook = Rc<dyn Fn(&mut Plotter, &ElementRef, bool)>;

#[derive(Clone)]
enum Handler {
    ChildrenCreated(ChildrenCreatedHandler),
    CollectionChanged(CollectionChangedHandler),
}

#[derive(Default)]
struct HandlerTable {
    handlers: HashMap<HandlerId, Handler>,
    next: u64,
}

impl HandlerTable {
    fn insert(&mut self, handler: Handler) -> HandlerId {
        let id = HandlerId::new(self.next);
        self.next += 1;
        self.handlers.insert(id, handler);
        id
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    fn get(&self, id: HandlerId) -> Option<Handler> {
        self.handlers.get(&id).cloned()
    }
}

// =============================================================================
// Plotter
// =============================================================================

/// Host control for chart elements.
pub struct Plotter {
    id: PlotterId,
    tree: VisualTree,
    parts: TemplateParts,

    children: Vec<ElementRef>,

    visual_bindings: VisualBindingCollection,
    links: PropertyLinks,
    added_visual_elements: VisualRegistry,
    adding_elements: MarkerStack,
    removing_elements: MarkerStack,

    handlers: HandlerTable,
    router_created: HandlerId,
    router_changed: HandlerId,

    default_elements: HashSet<ElementRef>,
    default_axes: HashSet<ElementRef>,
    default_axis_hook: Option<DefaultAxisHook>,
}

impl Plotter {
    /// Create a plotter with the standard template applied.
    pub fn new() -> Result<Self> {
        Self::with_template(&PlotterTemplate::default())
    }

    /// Create a plotter from a custom template.
    ///
    /// Fails if a required part is missing, duplicated or of the wrong kind.
    pub fn with_template(template: &PlotterTemplate) -> Result<Self> {
        let mut tree = VisualTree::new();
        let parts = template.instantiate(&mut tree)?;

        let mut handlers = HandlerTable::default();
        let router_created = handlers.insert(Handler::ChildrenCreated(Rc::new(
            |plotter: &mut Plotter, panel: VisualId| plotter.on_children_created(panel),
        )));
        let router_changed = handlers.insert(Handler::CollectionChanged(Rc::new(
            |plotter: &mut Plotter, panel: VisualId, change: &CollectionChange| {
                plotter.on_visual_collection_changed(panel, change)
            },
        )));

        let mut plotter = Self {
            id: PlotterId::next(),
            tree,
            parts,
            children: Vec::new(),
            visual_bindings: VisualBindingCollection::new(),
            links: PropertyLinks::new(),
            added_visual_elements: VisualRegistry::new(),
            adding_elements: MarkerStack::new(),
            removing_elements: MarkerStack::new(),
            handlers,
            router_created,
            router_changed,
            default_elements: HashSet::new(),
            default_axes: HashSet::new(),
            default_axis_hook: None,
        };
        plotter.on_apply_template()?;

        tracing::debug!(plotter = ?plotter.id, visuals = plotter.tree.len(), "plotter template applied");
        Ok(plotter)
    }

    pub fn id(&self) -> PlotterId {
        self.id
    }

    // -------------------------------------------------------------------------
    // Bookkeeping accessors
    // -------------------------------------------------------------------------

    pub fn visuals(&self) -> &VisualTree {
        &self.tree
    }

    pub fn template_parts(&self) -> &TemplateParts {
        &self.parts
    }

    /// Proxy cache.
    pub fn visual_bindings(&self) -> &VisualBindingCollection {
        &self.visual_bindings
    }

    pub fn property_links(&self) -> &PropertyLinks {
        &self.links
    }

    /// Real visuals registered per element.
    pub fn visual_registry(&self) -> &VisualRegistry {
        &self.added_visual_elements
    }

    pub fn attaching_elements(&self) -> &MarkerStack {
        &self.adding_elements
    }

    pub fn detaching_elements(&self) -> &MarkerStack {
        &self.removing_elements
    }

    /// The router's handler for `ChildrenCreated`.
    pub fn router_created_handler(&self) -> HandlerId {
        self.router_created
    }

    /// The router's handler for `CollectionChanged`.
    pub fn router_changed_handler(&self) -> HandlerId {
        self.router_changed
    }

    // -------------------------------------------------------------------------
    // Layout zones
    // -------------------------------------------------------------------------

    pub fn header_panel(&self) -> VisualId {
        self.parts.header_panel
    }

    pub fn footer_panel(&self) -> VisualId {
        self.parts.footer_panel
    }

    pub fn left_panel(&self) -> VisualId {
        self.parts.left_panel
    }

    pub fn bottom_panel(&self) -> VisualId {
        self.parts.bottom_panel
    }

    pub fn right_panel(&self) -> VisualId {
        self.parts.right_panel
    }

    pub fn top_panel(&self) -> VisualId {
        self.parts.top_panel
    }

    pub fn main_canvas(&self) -> VisualId {
        self.parts.main_canvas
    }

    pub fn central_grid(&self) -> VisualId {
        self.parts.central_grid
    }

    pub fn main_grid(&self) -> VisualId {
        self.parts.main_grid
    }

    pub fn parallel_canvas(&self) -> VisualId {
        self.parts.parallel_canvas
    }

    pub fn contents_grid(&self) -> VisualId {
        self.parts.contents_grid
    }

    /// Every observed zone: header, footer, left, bottom, right, top, main
    /// canvas, central grid, main grid, parallel canvas, contents grid.
    pub fn all_panels(&self) -> [VisualId; 11] {
        self.parts.all()
    }

    // -------------------------------------------------------------------------
    // Handler table
    // -------------------------------------------------------------------------

    /// Register a `ChildrenCreated` handler. Subscribe it with
    /// [`subscribe_children_created`](Self::subscribe_children_created).
    pub fn add_children_created_handler(
        &mut self,
        handler: impl Fn(&mut Plotter, VisualId) -> Result<()> + 'static,
    ) -> HandlerId {
        self.handlers.insert(Handler::ChildrenCreated(Rc::new(handler)))
    }

    /// Register a `CollectionChanged` handler. Subscribe it with
    /// [`subscribe_collection_changed`](Self::subscribe_collection_changed).
    pub fn add_collection_changed_handler(
        &mut self,
        handler: impl Fn(&mut Plotter, VisualId, &CollectionChange) -> Result<()> + 'static,
    ) -> HandlerId {
        self.handlers.insert(Handler::CollectionChanged(Rc::new(handler)))
    }

    /// Drop a handler registered by the caller. Remaining subscriptions of it
    /// become inert. The router's own handlers cannot be removed.
    pub fn remove_handler(&mut self, handler: HandlerId) -> bool {
        if handler == self.router_created || handler == self.router_changed {
            return false;
        }
        self.handlers.remove(handler)
    }

    pub fn subscribe_children_created(&mut self, panel: VisualId, handler: HandlerId) -> Result<()> {
        self.tree.panel_mut(panel)?.children_created_mut().subscribe(handler);
        Ok(())
    }

    pub fn unsubscribe_children_created(&mut self, panel: VisualId, handler: HandlerId) -> Result<bool> {
        Ok(self.tree.panel_mut(panel)?.children_created_mut().unsubscribe(handler))
    }

    /// Subscribe to a panel's collection changes. The collection must exist;
    /// see [`get_or_create_children`](Self::get_or_create_children).
    pub fn subscribe_collection_changed(&mut self, panel: VisualId, handler: HandlerId) -> Result<()> {
        self.collection_changed_event(panel)?.subscribe(handler);
        Ok(())
    }

    pub fn unsubscribe_collection_changed(&mut self, panel: VisualId, handler: HandlerId) -> Result<bool> {
        Ok(self.collection_changed_event(panel)?.unsubscribe(handler))
    }

    fn collection_changed_event(&mut self, panel: VisualId) -> Result<&mut Event> {
        self.tree
            .panel_mut(panel)?
            .notifying_children_mut()
            .map(|children| children.collection_changed_mut())
            .ok_or_else(|| PlotterError::InvalidState(format!("children of panel {panel:?} not created")))
    }

    // -------------------------------------------------------------------------
    // Raising events
    // -------------------------------------------------------------------------

    pub(crate) fn raise_children_created(&mut self, panel: VisualId, listeners: Vec<HandlerId>) -> Result<()> {
        for id in listeners {
            if let Some(Handler::ChildrenCreated(handler)) = self.handlers.get(id) {
                handler(self, panel)?;
            }
        }
        Ok(())
    }

    pub(crate) fn raise_collection_changed(&mut self, panel: VisualId, change: &CollectionChange) -> Result<()> {
        let listeners = match self.tree.notifying_children(panel)? {
            Some(children) => children.collection_changed().snapshot(),
            None => return Ok(()),
        };
        for id in listeners {
            if let Some(Handler::CollectionChanged(handler)) = self.handlers.get(id) {
                handler(self, panel, change)?;
            }
        }
        Ok(())
    }
}
