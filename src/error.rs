//! Plotter error types.
//!
//! Every attachment-protocol failure is a contract violation by calling code.
//! They are fatal to the operation in progress and never swallowed.

use thiserror::Error;

use crate::types::{PanelKind, VisualId};

#[derive(Debug, Error)]
pub enum PlotterError {
    #[error("plotter element is already attached to another plotter")]
    AlreadyOwned,

    #[error("plotter element does not belong to this plotter")]
    NotOwner,

    #[error("plotter element did not set its parent plotter while being attached")]
    AttachContractViolated,

    #[error("plotter element did not clear its parent plotter while being detached")]
    DetachContractViolated,

    #[error("plotter element `{element}` did not clean up after itself ({remaining} visual(s) still registered)")]
    DirtyDetach { element: String, remaining: usize },

    #[error("visual bindings are in a wrong state: {0}")]
    InvalidState(String),

    #[error("plotter element is in use by one of its own callbacks")]
    ElementBusy,

    #[error("unknown visual {0:?}")]
    UnknownVisual(VisualId),

    #[error("visual {0:?} is not a panel")]
    NotAPanel(VisualId),

    #[error("visual {0:?} already has a parent panel")]
    AlreadyParented(VisualId),

    #[error("adding visual {visual:?} to panel {panel:?} would create a cycle")]
    CyclicVisual { panel: VisualId, visual: VisualId },

    #[error("visual {visual:?} is not a child of panel {panel:?}")]
    NotAChild { panel: VisualId, visual: VisualId },

    #[error("opacity must be a finite number, got {0}")]
    NonFiniteOpacity(f64),

    #[error("index {index} is out of range for a collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("template part `{0}` is missing")]
    MissingTemplatePart(&'static str),

    #[error("template part `{0}` is declared more than once")]
    DuplicateTemplatePart(String),

    #[error("template part `{name}` must be a {expected:?}, found {found:?}")]
    TemplatePartKind {
        name: &'static str,
        expected: PanelKind,
        found: PanelKind,
    },

    #[error("template parse error: {0}")]
    Template(#[from] serde_json::Error),
}

pub type Result<T, E = PlotterError> = std::result::Result<T, E>;
