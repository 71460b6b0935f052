use std::fmt;
use std::str::FromStr;

use crate::animation::values::{AnimValue, MorphWeights};
use crate::errors::{AnimationError, Result};
use crate::scene::{MaterialKey, NodeHandle, Scene};

// ============================================================================
// Track paths
// ============================================================================

/// Sub-object namespaces a path may redirect into before naming a
/// property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// `material[i]`: the node's i-th material slot.
    Material,
    /// `bones[i]`: the i-th bone of the node's skeleton.
    Bone,
}

/// One parsed `objectName[index]` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectSelector {
    pub kind: ObjectKind,
    pub index: usize,
}

/// Parsed form of a track target path:
///
/// ```text
/// nodeName(.objectName[index])?.propertyName([index])?
/// ```
///
/// Examples: `Hips.position`, `Face.weights[2]`,
/// `Hand.material[1].opacity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackPath {
    /// Name of the target node (resolved by DFS from the bound root).
    pub node: String,
    /// Optional sub-object indirection.
    pub object: Option<ObjectSelector>,
    /// Leaf property name.
    pub property: String,
    /// Optional component/element index within the property.
    pub component: Option<usize>,
}

impl TrackPath {
    /// Plain `node.property` path.
    #[must_use]
    pub fn new(node: &str, property: &str) -> Self {
        Self {
            node: node.to_string(),
            object: None,
            property: property.to_string(),
            component: None,
        }
    }

    #[must_use]
    pub fn with_object(mut self, kind: ObjectKind, index: usize) -> Self {
        self.object = Some(ObjectSelector { kind, index });
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }
}

impl fmt::Display for TrackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(sel) = &self.object {
            let name = match sel.kind {
                ObjectKind::Material => "material",
                ObjectKind::Bone => "bones",
            };
            write!(f, ".{}[{}]", name, sel.index)?;
        }
        write!(f, ".{}", self.property)?;
        if let Some(c) = self.component {
            write!(f, "[{c}]")?;
        }
        Ok(())
    }
}

impl FromStr for TrackPath {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        let err = |reason: &str| AnimationError::InvalidTrackPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() < 2 {
            return Err(err("expected at least 'node.property'"));
        }
        if segments.len() > 3 {
            return Err(err("too many segments"));
        }

        let node = segments[0];
        if node.is_empty() {
            return Err(err("empty node name"));
        }

        let (object, property_segment) = if segments.len() == 3 {
            let (name, index) = split_indexed(segments[1]).ok_or_else(|| err("bad index syntax"))?;
            let index = index.ok_or_else(|| err("object segment requires an index"))?;
            let kind = match name {
                "material" | "materials" => ObjectKind::Material,
                "bones" => ObjectKind::Bone,
                _ => return Err(err("unknown object name")),
            };
            (Some(ObjectSelector { kind, index }), segments[2])
        } else {
            (None, segments[1])
        };

        let (property, component) =
            split_indexed(property_segment).ok_or_else(|| err("bad index syntax"))?;
        if property.is_empty() {
            return Err(err("empty property name"));
        }

        Ok(Self {
            node: node.to_string(),
            object,
            property: property.to_string(),
            component,
        })
    }
}

/// Splits `name[3]` into `("name", Some(3))`; plain `name` keeps `None`.
fn split_indexed(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        None => Some((segment, None)),
        Some(open) => {
            let rest = &segment[open + 1..];
            let close = rest.find(']')?;
            if close + 1 != rest.len() {
                return None;
            }
            let index: usize = rest[..close].parse().ok()?;
            Some((&segment[..open], Some(index)))
        }
    }
}

// ============================================================================
// Property bindings
// ============================================================================

/// The typed accessor a path resolves to, chosen once at bind time.
///
/// Dispatch after resolution is a plain match on this enum; no name
/// lookups or string compares happen on the per-frame path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundProperty {
    /// `node.transform.position` (array-convertible object)
    Position(NodeHandle),
    /// `node.transform.rotation` (array-convertible object)
    Rotation(NodeHandle),
    /// `node.transform.scale` (array-convertible object)
    Scale(NodeHandle),
    /// `node.visible` (direct scalar over a flag)
    Visible(NodeHandle),
    /// Whole morph weight array (fixed-size array)
    Weights(NodeHandle),
    /// One element of the morph weight array (array element)
    WeightElement(NodeHandle, usize),
    /// `material.opacity` (direct scalar)
    MaterialOpacity(MaterialKey),
    /// `material.color`, optionally narrowed to one channel
    MaterialColor(MaterialKey, Option<usize>),
}

/// The resolved link between a track path and a live property.
///
/// Resolution happens once, at bind time. A path that does not resolve
/// produces an *unbound* binding: reads return `None`, writes are dropped,
/// and playback carries on — a missing target must never crash the frame
/// loop.
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub path: TrackPath,
    target: Option<BoundProperty>,
}

impl PropertyBinding {
    /// Resolves `path` against the graph under `root`.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, path: &TrackPath) -> Self {
        let target = Self::resolve(scene, root, path);
        if target.is_none() {
            log::warn!("animation path '{path}' did not resolve; binding will be a no-op");
        }
        Self {
            path: path.clone(),
            target,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    fn resolve(scene: &Scene, root: NodeHandle, path: &TrackPath) -> Option<BoundProperty> {
        let node = resolve_node(scene, root, &path.node)?;

        match path.object {
            Some(ObjectSelector {
                kind: ObjectKind::Material,
                index,
            }) => {
                let material = *scene.get_node(node)?.materials.get(index)?;
                match path.property.as_str() {
                    "opacity" => Some(BoundProperty::MaterialOpacity(material)),
                    "color" => Some(BoundProperty::MaterialColor(material, path.component)),
                    _ => None,
                }
            }
            Some(ObjectSelector {
                kind: ObjectKind::Bone,
                index,
            }) => {
                let skeleton = scene.get_node(node)?.skeleton?;
                let bone = *scene.skeletons.get(skeleton)?.bones.get(index)?;
                Self::resolve_node_property(bone, path)
            }
            None => Self::resolve_node_property(node, path),
        }
    }

    fn resolve_node_property(node: NodeHandle, path: &TrackPath) -> Option<BoundProperty> {
        match path.property.as_str() {
            "position" | "translation" => Some(BoundProperty::Position(node)),
            "rotation" | "quaternion" => Some(BoundProperty::Rotation(node)),
            "scale" => Some(BoundProperty::Scale(node)),
            "visible" => Some(BoundProperty::Visible(node)),
            "weights" | "morphTargetInfluences" => Some(match path.component {
                Some(element) => BoundProperty::WeightElement(node, element),
                None => BoundProperty::Weights(node),
            }),
            _ => None,
        }
    }

    /// Reads the bound property. `None` when unbound or the target has
    /// since disappeared from the graph.
    #[must_use]
    pub fn get(&self, scene: &Scene) -> Option<AnimValue> {
        match self.target? {
            BoundProperty::Position(n) => scene
                .get_node(n)
                .map(|node| AnimValue::Vector3(node.transform.position)),
            BoundProperty::Rotation(n) => scene
                .get_node(n)
                .map(|node| AnimValue::Quaternion(node.transform.rotation)),
            BoundProperty::Scale(n) => scene
                .get_node(n)
                .map(|node| AnimValue::Vector3(node.transform.scale)),
            BoundProperty::Visible(n) => {
                scene.get_node(n).map(|node| AnimValue::Bool(node.visible))
            }
            BoundProperty::Weights(n) => scene.get_node(n).map(|node| {
                AnimValue::MorphWeights(MorphWeights::from_slice(&node.morph_weights))
            }),
            BoundProperty::WeightElement(n, element) => scene
                .get_node(n)
                .and_then(|node| node.morph_weights.get(element).copied())
                .map(AnimValue::Scalar),
            BoundProperty::MaterialOpacity(m) => scene
                .materials
                .get(m)
                .map(|mat| AnimValue::Scalar(mat.opacity)),
            BoundProperty::MaterialColor(m, component) => {
                let mat = scene.materials.get(m)?;
                match component {
                    None => Some(AnimValue::Vector3(mat.color)),
                    Some(c) if c < 3 => Some(AnimValue::Scalar(mat.color[c])),
                    Some(_) => None,
                }
            }
        }
    }

    /// Writes `value` through the binding. Unbound bindings and value-kind
    /// mismatches drop the write.
    pub fn set(&self, scene: &mut Scene, value: &AnimValue) {
        let Some(target) = self.target else {
            return;
        };

        let matched = match (target, value) {
            (BoundProperty::Position(n), AnimValue::Vector3(v)) => {
                if let Some(node) = scene.get_node_mut(n) {
                    node.transform.position = *v;
                    node.transform.mark_dirty();
                }
                true
            }
            (BoundProperty::Rotation(n), AnimValue::Quaternion(q)) => {
                if let Some(node) = scene.get_node_mut(n) {
                    node.transform.rotation = *q;
                    node.transform.mark_dirty();
                }
                true
            }
            (BoundProperty::Scale(n), AnimValue::Vector3(v)) => {
                if let Some(node) = scene.get_node_mut(n) {
                    node.transform.scale = *v;
                    node.transform.mark_dirty();
                }
                true
            }
            (BoundProperty::Visible(n), AnimValue::Bool(b)) => {
                if let Some(node) = scene.get_node_mut(n) {
                    node.visible = *b;
                }
                true
            }
            (BoundProperty::Weights(n), AnimValue::MorphWeights(w)) => {
                if let Some(node) = scene.get_node_mut(n) {
                    let count = node.morph_weights.len().min(w.len());
                    node.morph_weights[..count].copy_from_slice(&w.weights[..count]);
                }
                true
            }
            (BoundProperty::WeightElement(n, element), AnimValue::Scalar(v)) => {
                if let Some(slot) = scene
                    .get_node_mut(n)
                    .and_then(|node| node.morph_weights.get_mut(element))
                {
                    *slot = *v;
                }
                true
            }
            (BoundProperty::MaterialOpacity(m), AnimValue::Scalar(v)) => {
                if let Some(mat) = scene.materials.get_mut(m) {
                    mat.opacity = *v;
                }
                true
            }
            (BoundProperty::MaterialColor(m, None), AnimValue::Vector3(v)) => {
                if let Some(mat) = scene.materials.get_mut(m) {
                    mat.color = *v;
                }
                true
            }
            (BoundProperty::MaterialColor(m, Some(c)), AnimValue::Scalar(v)) if c < 3 => {
                if let Some(mat) = scene.materials.get_mut(m) {
                    mat.color[c] = *v;
                }
                true
            }
            _ => false,
        };

        if !matched {
            log::debug!(
                "dropping write of {:?} through '{}': value kind does not fit the target",
                value.kind(),
                self.path
            );
        }
    }
}

/// Node lookup: DFS by name from `root`, then the skeleton bone arrays of
/// the subtree as a secondary namespace (bones often live outside the
/// visual hierarchy they deform).
fn resolve_node(scene: &Scene, root: NodeHandle, name: &str) -> Option<NodeHandle> {
    if let Some(found) = scene.find_by_name(root, name) {
        return Some(found);
    }

    let mut stack = vec![root];
    while let Some(handle) = stack.pop() {
        let Some(node) = scene.get_node(handle) else {
            continue;
        };
        if let Some(skeleton) = node.skeleton.and_then(|k| scene.skeletons.get(k)) {
            for &bone in &skeleton.bones {
                if scene.get_node(bone).is_some_and(|b| b.name == name) {
                    return Some(bone);
                }
            }
        }
        stack.extend_from_slice(&node.children);
    }
    None
}
