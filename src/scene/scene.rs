use slotmap::SlotMap;

use crate::scene::material::Material;
use crate::scene::node::Node;
use crate::scene::skeleton::Skeleton;
use crate::scene::{MaterialKey, NodeHandle, SkeletonKey};

/// Scene graph container.
///
/// Pure data layer: node hierarchy plus the component pools the animation
/// system writes into. One `Scene` is one animated object graph.
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // === Component pools ===
    pub materials: SlotMap<MaterialKey, Material>,
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            materials: SlotMap::with_key(),
            skeletons: SlotMap::with_key(),
        }
    }

    /// Adds a node to the scene as a root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds a node as a child of `parent`, keeping both sides of the
    /// relationship in sync.
    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        if let Some(c) = self.nodes.get_mut(handle) {
            c.parent = Some(parent);
        }

        handle
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skeletons.insert(skeleton)
    }

    /// Depth-first search for a node by name, starting at `root`
    /// (inclusive).
    #[must_use]
    pub fn find_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let node = self.nodes.get(root)?;
        if node.name == name {
            return Some(root);
        }
        for &child in &node.children {
            if let Some(found) = self.find_by_name(child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Recomputes local matrices for every node whose TRS state changed.
    /// Returns the number of nodes that were actually recomputed.
    pub fn update_local_matrices(&mut self) -> usize {
        let mut updated = 0;
        for (_, node) in &mut self.nodes {
            if node.transform.update_local_matrix() {
                updated += 1;
            }
        }
        updated
    }
}
