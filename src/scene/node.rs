use crate::scene::transform::Transform;
use crate::scene::{MaterialKey, NodeHandle, SkeletonKey};

/// A scene node.
///
/// Nodes form a tree through parent/child relationships and carry the data
/// the animation system targets: a [`Transform`], a visibility flag, an
/// ordered material list, morph target weights, and an optional skeleton.
///
/// Nodes are addressed by *name* when resolving track paths, so names
/// should be unique within the subtree an animation is bound to.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name (the first segment of a track path)
    pub name: String,

    // === Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Spatial data ===
    pub transform: Transform,

    // === Components ===
    /// Visibility flag for culling
    pub visible: bool,
    /// Materials used by this node's mesh, in slot order
    pub materials: Vec<MaterialKey>,
    /// Morph target influence weights
    pub morph_weights: Vec<f32>,
    /// Skeleton driving this node's mesh, if skinned
    pub skeleton: Option<SkeletonKey>,
}

impl Node {
    /// Creates a named node with a default transform.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            materials: Vec::new(),
            morph_weights: Vec::new(),
            skeleton: None,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }
}
