//! Citation records and the per-answer citation store
//!
//! A citation is addressed only by its position in the answer that owns it.
//! Inline markers are 1-based (`[1]`, `[2]`, ...) while storage is 0-based.

use serde::{Deserialize, Serialize};

/// A single supporting reference attached to an assistant answer
///
/// Both fields are optional because the answering service may omit either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Quoted excerpt supporting the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Provenance label (document, paragraph, case name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Citation {
    /// Creates a citation with both an excerpt and a source
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::conversation::Citation;
    ///
    /// let citation = Citation::new("the claim is maintainable", "Para 7");
    /// assert_eq!(citation.source.as_deref(), Some("Para 7"));
    /// ```
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            source: Some(source.into()),
        }
    }

    /// Returns true if neither an excerpt nor a source is present
    pub fn is_blank(&self) -> bool {
        self.text.is_none() && self.source.is_none()
    }
}

/// Converts a 1-based citation marker into a 0-based storage index
///
/// Returns `None` for marker 0, which never addresses a citation.
///
/// # Examples
///
/// ```
/// use lexi::conversation::citation::marker_to_index;
///
/// assert_eq!(marker_to_index(1), Some(0));
/// assert_eq!(marker_to_index(0), None);
/// ```
pub fn marker_to_index(marker: usize) -> Option<usize> {
    marker.checked_sub(1)
}

/// The ordered citations of one assistant answer
///
/// Positions are stable: the store is built once when the answer arrives and
/// never reordered. Serializes as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationStore {
    citations: Vec<Citation>,
}

impl CitationStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a citation by 0-based storage index
    pub fn get(&self, index: usize) -> Option<&Citation> {
        self.citations.get(index)
    }

    /// Looks up a citation by its 1-based inline marker
    ///
    /// # Examples
    ///
    /// ```
    /// use lexi::conversation::{Citation, CitationStore};
    ///
    /// let store = CitationStore::from(vec![
    ///     Citation::new("first", "A"),
    ///     Citation::new("second", "B"),
    /// ]);
    /// assert_eq!(store.by_marker(2).and_then(|c| c.source.as_deref()), Some("B"));
    /// assert!(store.by_marker(0).is_none());
    /// assert!(store.by_marker(3).is_none());
    /// ```
    pub fn by_marker(&self, marker: usize) -> Option<&Citation> {
        marker_to_index(marker).and_then(|index| self.get(index))
    }

    /// Iterates over `(marker, citation)` pairs in display order
    pub fn markers(&self) -> impl Iterator<Item = (usize, &Citation)> {
        self.citations
            .iter()
            .enumerate()
            .map(|(index, citation)| (index + 1, citation))
    }

    /// Iterates over the citations in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, Citation> {
        self.citations.iter()
    }

    /// Number of citations
    pub fn len(&self) -> usize {
        self.citations.len()
    }

    /// Returns true if the answer carries no citations
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    /// Returns the citations as a slice
    pub fn as_slice(&self) -> &[Citation] {
        &self.citations
    }
}

impl From<Vec<Citation>> for CitationStore {
    fn from(citations: Vec<Citation>) -> Self {
        Self { citations }
    }
}

impl<'a> IntoIterator for &'a CitationStore {
    type Item = &'a Citation;
    type IntoIter = std::slice::Iter<'a, Citation>;

    fn into_iter(self) -> Self::IntoIter {
        self.citations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CitationStore {
        CitationStore::from(vec![
            Citation::new("excerpt one", "Doc A"),
            Citation {
                text: None,
                source: Some("Doc B".to_string()),
            },
            Citation {
                text: Some("excerpt three".to_string()),
                source: None,
            },
        ])
    }

    #[test]
    fn test_marker_resolves_to_previous_index() {
        let store = store();
        for marker in 1..=store.len() {
            assert_eq!(store.by_marker(marker), store.get(marker - 1));
        }
    }

    #[test]
    fn test_out_of_range_markers() {
        let store = store();
        assert!(store.by_marker(0).is_none());
        assert!(store.by_marker(4).is_none());
        assert!(CitationStore::new().by_marker(1).is_none());
    }

    #[test]
    fn test_markers_are_one_based_and_ordered() {
        let markers: Vec<usize> = store().markers().map(|(n, _)| n).collect();
        assert_eq!(markers, vec![1, 2, 3]);
    }

    #[test]
    fn test_deserialize_with_missing_fields() {
        let json = r#"[{"text": "only text"}, {"source": "only source"}, {}]"#;
        let store: CitationStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(0).unwrap().source, None);
        assert_eq!(store.get(1).unwrap().text, None);
        assert!(store.get(2).unwrap().is_blank());
    }

    #[test]
    fn test_serializes_as_array_without_absent_fields() {
        let store = CitationStore::from(vec![Citation {
            text: None,
            source: Some("Para 7".to_string()),
        }]);
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"[{"source":"Para 7"}]"#);
    }
}
