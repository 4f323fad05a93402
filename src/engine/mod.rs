//! Plotter Engine - Visual arena, event lists and element registry.
//!
//! The engine holds the data structures the plotter coordinates:
//! - VisualTree: arena of visuals, notifying panels, bindable properties
//! - Event: handler subscription lists with multicast-delegate semantics
//! - Registry: marker stacks and the per-element visual registry
//!
//! # Architecture
//!
//! Visuals are NOT objects holding references to each other. They are keys
//! into one arena owned by the plotter:
//!
//! ```text
//! PART_ContentsGrid  (Grid,  children=[Header, MainGrid, Footer, Parallel])
//! PART_MainCanvas    (Canvas, children=None  ← materialized on first use)
//! line #3            (Leaf,  parent=MainCanvas, opacity=0.5)
//! proxy #4           (Placeholder, parent=None)
//! ```
//!
//! Events only store handler ids; the plotter raises them, so handlers can
//! receive `&mut Plotter` while the tree stays a plain data structure.

mod event;
mod registry;
mod visual_tree;

pub use event::*;
pub use registry::*;
pub use visual_tree::*;
