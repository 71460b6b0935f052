use crate::scene::NodeHandle;

/// A skeleton: an ordered bone array.
///
/// Bone nodes live in the scene's node arena like any other node; the
/// skeleton only records their order. For animation binding the bone list
/// doubles as a secondary name namespace, so bones stay addressable even
/// when they are parented outside the animated subtree.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,

    /// Bone list: ordered, `bones[i]` matches joint index `i`
    pub bones: Vec<NodeHandle>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str, bones: Vec<NodeHandle>) -> Self {
        Self {
            name: name.to_string(),
            bones,
        }
    }
}
