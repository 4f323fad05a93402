//! Plotter elements - the domain objects a plotter hosts.
//!
//! Axes, graphs, legends and annotations implement [`PlotterElement`]. An
//! element is hosted by at most one plotter at a time and records its owner
//! in a back-reference that only its own attach/detach callbacks change.
//!
//! Elements are shared as [`ElementRef`], which compares and hashes by
//! pointer identity so it can key the plotter's bookkeeping maps.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::{PlotterError, Result};
use crate::plotter::Plotter;
use crate::types::{PlotterId, VisualId};

/// Capability contract of anything attachable to a [`Plotter`].
///
/// # Contract
///
/// - `on_plotter_attached` must leave `plotter()` returning the id of the
///   plotter it was given.
/// - `on_plotter_detaching` must leave `plotter()` returning `None`, and must
///   remove every visual the element added to the plotter's panels.
///
/// The plotter verifies both postconditions and fails the operation when
/// they do not hold.
///
/// # Example
///
/// ```ignore
/// struct Legend {
///     owner: Option<PlotterId>,
///     label: Option<VisualId>,
/// }
///
/// impl PlotterElement for Legend {
///     fn plotter(&self) -> Option<PlotterId> {
///         self.owner
///     }
///
///     fn on_plotter_attached(&mut self, plotter: &mut Plotter) -> Result<()> {
///         self.owner = Some(plotter.id());
///         let label = plotter.create_visual();
///         plotter.add_visual(plotter.right_panel(), label)?;
///         self.label = Some(label);
///         Ok(())
///     }
///
///     fn on_plotter_detaching(&mut self, plotter: &mut Plotter) -> Result<()> {
///         if let Some(label) = self.label.take() {
///             plotter.remove_visual(plotter.right_panel(), label)?;
///             plotter.release_visual(label)?;
///         }
///         self.owner = None;
///         Ok(())
///     }
/// }
/// ```
pub trait PlotterElement {
    /// The plotter currently hosting this element.
    fn plotter(&self) -> Option<PlotterId>;

    fn on_plotter_attached(&mut self, plotter: &mut Plotter) -> Result<()>;

    fn on_plotter_detaching(&mut self, plotter: &mut Plotter) -> Result<()>;

    /// The visual this element *is*, when it is one.
    ///
    /// Elements that return `None` get a placeholder proxy visual.
    fn visual(&self) -> Option<VisualId> {
        None
    }

    /// Name used in diagnostics.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

// =============================================================================
// ElementRef
// =============================================================================

/// Shared handle to a plotter element, with identity semantics.
#[derive(Clone)]
pub struct ElementRef(Rc<RefCell<dyn PlotterElement>>);

impl ElementRef {
    pub fn new<E: PlotterElement + 'static>(element: E) -> Self {
        Self(Rc::new(RefCell::new(element)))
    }

    /// Owner back-reference.
    ///
    /// Fails with [`PlotterError::ElementBusy`] while one of the element's own
    /// callbacks is running.
    pub fn owner(&self) -> Result<Option<PlotterId>> {
        Ok(self.try_borrow()?.plotter())
    }

    pub fn visual(&self) -> Result<Option<VisualId>> {
        Ok(self.try_borrow()?.visual())
    }

    /// Diagnostic name; never fails.
    pub fn name(&self) -> String {
        match self.0.try_borrow() {
            Ok(element) => element.name(),
            Err(_) => "<element in use>".to_string(),
        }
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, dyn PlotterElement>> {
        self.0.try_borrow().map_err(|_| PlotterError::ElementBusy)
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, dyn PlotterElement + 'static>> {
        self.0.try_borrow_mut().map_err(|_| PlotterError::ElementBusy)
    }

    pub fn ptr_eq(&self, other: &ElementRef) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl<E: PlotterElement + 'static> From<Rc<RefCell<E>>> for ElementRef {
    fn from(element: Rc<RefCell<E>>) -> Self {
        Self(element)
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ElementRef {}

impl Hash for ElementRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementRef({} @ {:p})", self.name(), self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Marker {
        owner: Option<PlotterId>,
    }

    impl PlotterElement for Marker {
        fn plotter(&self) -> Option<PlotterId> {
            self.owner
        }

        fn on_plotter_attached(&mut self, plotter: &mut Plotter) -> Result<()> {
            self.owner = Some(plotter.id());
            Ok(())
        }

        fn on_plotter_detaching(&mut self, _plotter: &mut Plotter) -> Result<()> {
            self.owner = None;
            Ok(())
        }

        fn name(&self) -> String {
            "marker".to_string()
        }
    }

    #[test]
    fn test_identity_not_structure() {
        let a = ElementRef::new(Marker { owner: None });
        let b = ElementRef::new(Marker { owner: None });
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);

        let set: HashSet<ElementRef> = [a.clone(), a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_typed_rc_keeps_identity() {
        let typed = Rc::new(RefCell::new(Marker { owner: None }));
        let a = ElementRef::from(typed.clone());
        let b = ElementRef::from(typed.clone());
        assert_eq!(a, b);

        typed.borrow_mut().owner = Some(PlotterId::next());
        assert!(a.owner().unwrap().is_some());
    }

    #[test]
    fn test_busy_element() {
        let typed = Rc::new(RefCell::new(Marker { owner: None }));
        let element = ElementRef::from(typed.clone());

        let _guard = typed.borrow_mut();
        assert!(matches!(element.owner(), Err(PlotterError::ElementBusy)));
        assert_eq!(element.name(), "<element in use>");
    }
}
