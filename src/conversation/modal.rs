//! Citation detail overlay state
//!
//! Tracks the one citation currently being inspected. The selection is a
//! copy of the citation, so it stays valid regardless of which answer it
//! came from.

use super::citation::Citation;

/// Controller for the citation detail overlay
#[derive(Debug, Clone, Default)]
pub struct CitationModal {
    selected: Option<Citation>,
}

impl CitationModal {
    /// Creates a closed modal
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `citation`, replacing any current selection
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::conversation::{Citation, CitationModal};
    ///
    /// let mut modal = CitationModal::new();
    /// modal.open(Citation::new("excerpt", "Para 7"));
    /// assert!(modal.is_open());
    /// modal.close();
    /// assert!(modal.selected().is_none());
    /// ```
    pub fn open(&mut self, citation: Citation) {
        self.selected = Some(citation);
    }

    /// Hides the overlay; closing an already closed modal is a no-op
    pub fn close(&mut self) {
        self.selected = None;
    }

    /// The citation being shown, if the overlay is open
    pub fn selected(&self) -> Option<&Citation> {
        self.selected.as_ref()
    }

    /// Returns true while a citation is shown
    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }
}
