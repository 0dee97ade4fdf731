use std::collections::HashMap;

use crate::{ElementId, EscalatorError, Surface};

/// The ledger of element placements.
///
/// Every positioned element (rows, frozen cells, spacers, decorations) is placed through
/// [`PositionTracker::set`], which records the offset and forwards it to the surface. Reads
/// come from the ledger, never from the rendering layer.
#[derive(Clone, Debug, Default)]
pub struct PositionTracker {
    entries: HashMap<ElementId, (f64, f64)>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `(x, y)` for `element` and applies it to the surface.
    pub fn set<S: Surface + ?Sized>(&mut self, surface: &mut S, element: ElementId, x: f64, y: f64) {
        self.entries.insert(element, (x, y));
        surface.set_position(element, x, y);
    }

    /// Moves `element` by `(dx, dy)` from its recorded position.
    pub fn shift<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        element: ElementId,
        dx: f64,
        dy: f64,
    ) -> Result<(), EscalatorError> {
        let (x, y) = self.get(element)?;
        self.set(surface, element, x + dx, y + dy);
        Ok(())
    }

    pub fn get(&self, element: ElementId) -> Result<(f64, f64), EscalatorError> {
        self.entries
            .get(&element)
            .copied()
            .ok_or(EscalatorError::UnknownElement(element))
    }

    pub fn top(&self, element: ElementId) -> Result<f64, EscalatorError> {
        self.get(element).map(|(_, y)| y)
    }

    pub fn left(&self, element: ElementId) -> Result<f64, EscalatorError> {
        self.get(element).map(|(x, _)| x)
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.entries.contains_key(&element)
    }

    /// Drops the bookkeeping for `element` without touching the surface.
    pub fn remove(&mut self, element: ElementId) {
        self.entries.remove(&element);
    }

    /// Clears the placement on the surface and drops the bookkeeping.
    pub fn reset<S: Surface + ?Sized>(&mut self, surface: &mut S, element: ElementId) {
        if self.entries.remove(&element).is_some() {
            surface.reset_position(element);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
