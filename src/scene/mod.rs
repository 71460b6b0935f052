//! Scene graph collaborator
//!
//! The minimal name-addressable object graph the animation system binds
//! against:
//! - Node: scene node (parent/child hierarchy, transform, components)
//! - Transform: position / rotation / scale with cached local matrix
//! - Material: surface parameters that happen to be animatable
//! - Skeleton: ordered bone array (a secondary name namespace for binding)
//! - Scene: the container
//!
//! World-matrix propagation and rendering live elsewhere in the runtime;
//! this module only carries the state the binding layer reads and writes.

pub mod material;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use material::Material;
pub use node::Node;
pub use scene::Scene;
pub use skeleton::Skeleton;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a [`Node`] in a [`Scene`].
    pub struct NodeHandle;
    /// Handle to a [`Material`] in a [`Scene`].
    pub struct MaterialKey;
    /// Handle to a [`Skeleton`] in a [`Scene`].
    pub struct SkeletonKey;
}
