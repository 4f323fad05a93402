//! Plotter template - the named layout zones a plotter is built from.
//!
//! A template is a tree of [`TemplatePart`]s. Instantiating it creates one
//! panel per part; panels that hold other parts get their child collection
//! materialized on the spot, leaf zones stay lazy until something is added
//! to them.
//!
//! # Example
//!
//! ```ignore
//! let template = PlotterTemplate::from_json(include_str!("compact_plotter.json"))?;
//! let plotter = Plotter::with_template(&template)?;
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::VisualTree;
use crate::error::{PlotterError, Result};
use crate::types::{PanelKind, VisualId, VisualKind};

// =============================================================================
// Part Names
// =============================================================================

pub const PART_HEADER_PANEL: &str = "PART_HeaderPanel";
pub const PART_FOOTER_PANEL: &str = "PART_FooterPanel";
pub const PART_LEFT_PANEL: &str = "PART_LeftPanel";
pub const PART_BOTTOM_PANEL: &str = "PART_BottomPanel";
pub const PART_RIGHT_PANEL: &str = "PART_RightPanel";
pub const PART_TOP_PANEL: &str = "PART_TopPanel";
pub const PART_MAIN_CANVAS: &str = "PART_MainCanvas";
pub const PART_CENTRAL_GRID: &str = "PART_CentralGrid";
pub const PART_MAIN_GRID: &str = "PART_MainGrid";
pub const PART_PARALLEL_CANVAS: &str = "PART_ParallelCanvas";
pub const PART_CONTENTS_GRID: &str = "PART_ContentsGrid";

// =============================================================================
// Template Description
// =============================================================================

/// One named panel of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePart {
    pub name: String,
    pub kind: PanelKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TemplatePart>,
}

impl TemplatePart {
    pub fn new(name: impl Into<String>, kind: PanelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TemplatePart>) -> Self {
        self.children = children;
        self
    }
}

/// Layout description of a plotter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotterTemplate {
    pub root: TemplatePart,
}

impl Default for PlotterTemplate {
    /// The standard chart layout: header and footer around the main grid,
    /// side panels around the central grid, the main canvas in the middle
    /// and the parallel canvas layered over everything.
    fn default() -> Self {
        use PanelKind::*;

        let central_grid = TemplatePart::new(PART_CENTRAL_GRID, Grid)
            .with_children(vec![TemplatePart::new(PART_MAIN_CANVAS, Canvas)]);

        let main_grid = TemplatePart::new(PART_MAIN_GRID, Grid).with_children(vec![
            TemplatePart::new(PART_LEFT_PANEL, StackPanel),
            TemplatePart::new(PART_TOP_PANEL, StackPanel),
            central_grid,
            TemplatePart::new(PART_BOTTOM_PANEL, StackPanel),
            TemplatePart::new(PART_RIGHT_PANEL, StackPanel),
        ]);

        let root = TemplatePart::new(PART_CONTENTS_GRID, Grid).with_children(vec![
            TemplatePart::new(PART_HEADER_PANEL, StackPanel),
            main_grid,
            TemplatePart::new(PART_FOOTER_PANEL, StackPanel),
            TemplatePart::new(PART_PARALLEL_CANVAS, Canvas),
        ]);

        Self { root }
    }
}

impl PlotterTemplate {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the template's panels into `tree` and resolve the required parts.
    pub(crate) fn instantiate(&self, tree: &mut VisualTree) -> Result<TemplateParts> {
        let mut by_name = HashMap::new();
        let root = build_part(&self.root, tree, &mut by_name)?;

        let find = |name: &'static str, expected: PanelKind| -> Result<VisualId> {
            let id = *by_name
                .get(name)
                .ok_or(PlotterError::MissingTemplatePart(name))?;
            let found = tree.panel(id)?.kind();
            if found != expected {
                return Err(PlotterError::TemplatePartKind {
                    name,
                    expected,
                    found,
                });
            }
            Ok(id)
        };

        Ok(TemplateParts {
            header_panel: find(PART_HEADER_PANEL, PanelKind::StackPanel)?,
            footer_panel: find(PART_FOOTER_PANEL, PanelKind::StackPanel)?,
            left_panel: find(PART_LEFT_PANEL, PanelKind::StackPanel)?,
            bottom_panel: find(PART_BOTTOM_PANEL, PanelKind::StackPanel)?,
            right_panel: find(PART_RIGHT_PANEL, PanelKind::StackPanel)?,
            top_panel: find(PART_TOP_PANEL, PanelKind::StackPanel)?,
            main_canvas: find(PART_MAIN_CANVAS, PanelKind::Canvas)?,
            central_grid: find(PART_CENTRAL_GRID, PanelKind::Grid)?,
            main_grid: find(PART_MAIN_GRID, PanelKind::Grid)?,
            parallel_canvas: find(PART_PARALLEL_CANVAS, PanelKind::Canvas)?,
            contents_grid: find(PART_CONTENTS_GRID, PanelKind::Grid)?,
            root,
            by_name,
        })
    }
}

fn build_part(
    part: &TemplatePart,
    tree: &mut VisualTree,
    by_name: &mut HashMap<String, VisualId>,
) -> Result<VisualId> {
    let id = tree.create(VisualKind::Panel(part.kind));
    if by_name.insert(part.name.clone(), id).is_some() {
        return Err(PlotterError::DuplicateTemplatePart(part.name.clone()));
    }
    if !part.children.is_empty() {
        tree.ensure_children(id)?;
        for (index, child) in part.children.iter().enumerate() {
            let child_id = build_part(child, tree, by_name)?;
            tree.insert_child(id, index, child_id)?;
        }
    }
    Ok(id)
}

// =============================================================================
// Applied Template
// =============================================================================

/// Panels of an instantiated template.
#[derive(Debug, Clone)]
pub struct TemplateParts {
    pub(crate) header_panel: VisualId,
    pub(crate) footer_panel: VisualId,
    pub(crate) left_panel: VisualId,
    pub(crate) bottom_panel: VisualId,
    pub(crate) right_panel: VisualId,
    pub(crate) top_panel: VisualId,
    pub(crate) main_canvas: VisualId,
    pub(crate) central_grid: VisualId,
    pub(crate) main_grid: VisualId,
    pub(crate) parallel_canvas: VisualId,
    pub(crate) contents_grid: VisualId,
    pub(crate) root: VisualId,
    by_name: HashMap<String, VisualId>,
}

impl TemplateParts {
    /// Every observed zone, in observation order.
    pub fn all(&self) -> [VisualId; 11] {
        [
            self.header_panel,
            self.footer_panel,
            self.left_panel,
            self.bottom_panel,
            self.right_panel,
            self.top_panel,
            self.main_canvas,
            self.central_grid,
            self.main_grid,
            self.parallel_canvas,
            self.contents_grid,
        ]
    }

    /// Look up any part of the template by name, required or not.
    pub fn find(&self, name: &str) -> Option<VisualId> {
        self.by_name.get(name).copied()
    }

    /// Root panel of the template.
    pub fn root(&self) -> VisualId {
        self.root
    }
}
