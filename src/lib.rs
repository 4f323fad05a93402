//! # d3-plotter
//!
//! Plotter host for Dynamic Data Display charts.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactive visual properties.
//!
//! ## Architecture
//!
//! A [`Plotter`] owns a visual tree built from a template of named zones.
//! Chart elements (axes, graphs, legends) are added to its `Children`
//! collection; attaching one lets it populate the zones with its own
//! visuals. The plotter watches every zone, attributes each new visual to
//! the element being attached, and binds the visual's opacity, visibility
//! and hit-test visibility to a per-element proxy:
//!
//! ```text
//! add_child(element) → attach (marker pushed) → element adds visuals
//!   → zone CollectionChanged → router → registry + proxy binding
//! ```
//!
//! Everything is single-threaded and synchronous. Handlers and element
//! callbacks receive `&mut Plotter` and may re-enter it.
//!
//! ## Modules
//!
//! - [`types`] - Core types (VisualId, PlotterId, PropertyValue, CollectionChange)
//! - [`engine`] - Visual arena, notifying panels, events, marker stacks, registry
//! - [`binding`] - Proxy cache and two-way property links
//! - [`element`] - The element capability contract
//! - [`plotter`] - Host control, template, attachment protocol, router

pub mod binding;
pub mod element;
pub mod engine;
pub mod error;
pub mod plotter;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use binding::{PropertyLinks, VisualBindingCollection};

pub use element::{ElementRef, PlotterElement};

pub use engine::{
    Event, HandlerId, MarkerStack, NotifyingChildren, PanelState, VisualNode, VisualRegistry,
    VisualTree,
};

pub use error::{PlotterError, Result};

pub use plotter::{
    ChildrenCreatedHandler, CollectionChangedHandler, DefaultAxisHook, Plotter, PlotterTemplate,
    TemplatePart, TemplateParts,
};
