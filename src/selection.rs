use crate::surface::EditorSurface;

/// Remembers the last selection made inside the editable surface so it can
/// be put back after a toolbar click or dialog stole focus.
#[derive(Clone, Debug)]
pub struct SelectionTracker<R> {
    stored: Option<R>,
}

impl<R> Default for SelectionTracker<R> {
    fn default() -> Self {
        Self { stored: None }
    }
}

impl<R: Clone> SelectionTracker<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a copy of the live selection if it lies inside the surface.
    /// Returns whether anything was stored.
    pub fn capture<S>(&mut self, surface: &S) -> bool
    where
        S: EditorSurface<Range = R>,
    {
        let Some(range) = surface.live_range() else {
            return false;
        };
        if !surface.contains_range(&range) {
            return false;
        }
        self.stored = Some(range);
        true
    }

    /// Refocuses the surface and reapplies the stored selection, if any.
    pub fn restore<S>(&self, surface: &mut S)
    where
        S: EditorSurface<Range = R>,
    {
        surface.focus();
        if let Some(range) = &self.stored {
            surface.set_live_range(range);
        }
    }

    /// Drops the stored selection after the document was replaced wholesale.
    pub fn invalidate(&mut self) {
        self.stored = None;
    }

    pub fn stored(&self) -> Option<&R> {
        self.stored.as_ref()
    }
}
