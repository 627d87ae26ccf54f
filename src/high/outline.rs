use crate::id::{OutlineId, PageId};

/// One item in the outline
#[derive(Debug, Clone)]
pub struct OutlineEntry {
    /// The title of the outline item
    pub title: String,
    /// The page to navigate to
    pub page: PageId,
    /// The parent, a top-level item if `None`
    pub parent: Option<OutlineId>,
}
