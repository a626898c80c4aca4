//! The document as seen by behaviors, addressed through [`NodeId`] handles.

use std::fmt;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Viewport-relative bounding box, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[cfg_attr(test, mockall::automock)]
pub trait Dom {
    fn query_all(&self, selector: &str) -> Vec<NodeId>;
    fn query(&self, selector: &str) -> Option<NodeId>;
    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId>;
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    fn body(&self) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()>;
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&self, node: NodeId, class: &str) -> Result<()>;
    fn remove_class(&self, node: NodeId, class: &str) -> Result<()>;
    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<()>;
    fn remove_style(&self, node: NodeId, property: &str) -> Result<()>;
    fn text(&self, node: NodeId) -> Option<String>;
    fn set_text(&self, node: NodeId, text: &str) -> Result<()>;

    fn offset_top(&self, node: NodeId) -> f64;
    fn offset_height(&self, node: NodeId) -> f64;
    fn bounding_rect(&self, node: NodeId) -> Rect;
    /// Position of `node` among its parent's element children.
    fn sibling_index(&self, node: NodeId) -> Option<usize>;
    /// True when `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn create_element(&self, tag: &str) -> Result<NodeId>;
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()>;
    /// Detaches `node`. Removing a node that is already gone does nothing.
    fn remove(&self, node: NodeId);
    /// Installs `css` as the behavior stylesheet, replacing an earlier one.
    fn inject_style(&self, css: &str) -> Result<()>;

    fn scroll_y(&self) -> f64;
    fn viewport_width(&self) -> f64;
    /// Smooth-scrolls the window to `top`.
    fn scroll_to(&self, top: f64);
    fn media_matches(&self, query: &str) -> bool;
}
