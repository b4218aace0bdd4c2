use indexmap::IndexSet;

// -----------------------------------------------------------------------------
// ChangeSet

/// The set of field names an object reports as modified.
///
/// Names may be either the logical (Rust) field name or the wire name. The
/// encoder consults this set for changed-only contexts such as
/// [`ViewContext::Patch`](crate::info::ViewContext::Patch).
///
/// # Example
///
/// ```
/// use mk_schema::value::ChangeSet;
///
/// let mut changes = ChangeSet::new();
/// changes.mark("title");
/// changes.mark("title");
///
/// assert!(changes.contains("title"));
/// assert_eq!(changes.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    names: IndexSet<String>,
}

impl ChangeSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` as changed. Returns `false` if it was already recorded.
    pub fn mark(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Forgets `name`. Returns `true` if it was recorded.
    pub fn unmark(&mut self, name: &str) -> bool {
        self.names.shift_remove(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.names.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates names in the order they were first marked.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for ChangeSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}
