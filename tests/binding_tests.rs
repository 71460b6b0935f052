//! Path & Binding Tests
//!
//! Tests for:
//! - TrackPath grammar: parse, display round trip, rejection cases
//! - PropertyBinding resolution (nodes, materials, bones, components)
//! - Soft failure for unresolvable paths
//! - Typed get/set with kind-mismatch protection

use std::str::FromStr;

use glam::Vec3;

use saga_animation::animation::binding::{ObjectKind, PropertyBinding, TrackPath};
use saga_animation::animation::values::AnimValue;
use saga_animation::scene::{Material, Node, NodeHandle, Scene, Skeleton};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// TrackPath grammar
// ============================================================================

#[test]
fn parse_plain_node_property() {
    let path = TrackPath::from_str("Hips.position").unwrap();
    assert_eq!(path.node, "Hips");
    assert_eq!(path.property, "position");
    assert!(path.object.is_none());
    assert!(path.component.is_none());
}

#[test]
fn parse_material_indirection() {
    let path = TrackPath::from_str("Hand.material[1].opacity").unwrap();
    assert_eq!(path.node, "Hand");
    let sel = path.object.unwrap();
    assert_eq!(sel.kind, ObjectKind::Material);
    assert_eq!(sel.index, 1);
    assert_eq!(path.property, "opacity");
}

#[test]
fn parse_property_component() {
    let path = TrackPath::from_str("Face.weights[2]").unwrap();
    assert_eq!(path.property, "weights");
    assert_eq!(path.component, Some(2));
}

#[test]
fn parse_bone_indirection() {
    let path = TrackPath::from_str("Rig.bones[0].rotation").unwrap();
    let sel = path.object.unwrap();
    assert_eq!(sel.kind, ObjectKind::Bone);
    assert_eq!(sel.index, 0);
}

#[test]
fn display_round_trips() {
    for s in [
        "Hips.position",
        "Hand.material[1].opacity",
        "Face.weights[2]",
        "Rig.bones[3].scale",
    ] {
        let path = TrackPath::from_str(s).unwrap();
        let reparsed = TrackPath::from_str(&path.to_string()).unwrap();
        assert_eq!(path, reparsed, "round trip failed for '{s}'");
    }
}

#[test]
fn parse_rejects_malformed_paths() {
    for s in [
        "lonely",
        "a.b.c.d",
        "Hand.material.opacity",
        "Hand.gizmo[2].opacity",
        "Hand.position[x]",
        ".position",
        "Hand.",
    ] {
        assert!(TrackPath::from_str(s).is_err(), "'{s}' should not parse");
    }
}

// ============================================================================
// Scene fixtures
// ============================================================================

fn hand_scene() -> (Scene, NodeHandle, NodeHandle) {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Root"));

    let skin = scene.add_material(Material::new("skin"));
    let glove = scene.add_material(Material::new("glove"));

    let mut hand = Node::new("Hand");
    hand.materials = vec![skin, glove];
    hand.morph_weights = vec![0.0; 4];
    let hand = scene.add_to_parent(hand, root);

    (scene, root, hand)
}

// ============================================================================
// Resolution & typed access
// ============================================================================

#[test]
fn material_index_resolves_to_exactly_one_field() {
    let (mut scene, root, hand) = hand_scene();
    let path = TrackPath::from_str("Hand.material[1].opacity").unwrap();
    let binding = PropertyBinding::bind(&scene, root, &path);
    assert!(binding.is_bound());

    binding.set(&mut scene, &AnimValue::Scalar(0.3));

    let hand_node = scene.get_node(hand).unwrap();
    let first = scene.materials.get(hand_node.materials[0]).unwrap();
    let second = scene.materials.get(hand_node.materials[1]).unwrap();
    assert!(approx(second.opacity, 0.3), "second material should change");
    assert!(approx(first.opacity, 1.0), "first material must be untouched");
}

#[test]
fn position_get_set() {
    let (mut scene, root, hand) = hand_scene();
    let path = TrackPath::from_str("Hand.position").unwrap();
    let binding = PropertyBinding::bind(&scene, root, &path);

    binding.set(&mut scene, &AnimValue::Vector3(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(
        scene.get_node(hand).unwrap().transform.position,
        Vec3::new(1.0, 2.0, 3.0)
    );

    match binding.get(&scene) {
        Some(AnimValue::Vector3(v)) => assert_eq!(v, Vec3::new(1.0, 2.0, 3.0)),
        other => panic!("unexpected read: {other:?}"),
    }
}

#[test]
fn visibility_binds_as_bool() {
    let (mut scene, root, hand) = hand_scene();
    let path = TrackPath::from_str("Hand.visible").unwrap();
    let binding = PropertyBinding::bind(&scene, root, &path);

    binding.set(&mut scene, &AnimValue::Bool(false));
    assert!(!scene.get_node(hand).unwrap().visible);
}

#[test]
fn whole_weights_and_single_element() {
    let (mut scene, root, hand) = hand_scene();

    let whole = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Hand.weights").unwrap(),
    );
    whole.set(
        &mut scene,
        &AnimValue::MorphWeights(saga_animation::animation::values::MorphWeights::from_slice(
            &[0.1, 0.2, 0.3, 0.4],
        )),
    );
    assert!(approx(scene.get_node(hand).unwrap().morph_weights[2], 0.3));

    let element = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Hand.weights[1]").unwrap(),
    );
    element.set(&mut scene, &AnimValue::Scalar(0.9));
    let weights = &scene.get_node(hand).unwrap().morph_weights;
    assert!(approx(weights[1], 0.9));
    assert!(approx(weights[0], 0.1), "other elements untouched");
}

#[test]
fn bones_resolve_through_skeleton_namespace() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Root"));

    // Bone hierarchy lives outside the visual subtree.
    let bone = scene.add_node(Node::new("Spine"));
    let skeleton = scene.add_skeleton(Skeleton::new("rig", vec![bone]));

    let mut skinned = Node::new("Body");
    skinned.skeleton = Some(skeleton);
    scene.add_to_parent(skinned, root);

    // Indexed indirection through the bone array.
    let by_index = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Body.bones[0].position").unwrap(),
    );
    assert!(by_index.is_bound());
    by_index.set(&mut scene, &AnimValue::Vector3(Vec3::Y));
    assert_eq!(scene.get_node(bone).unwrap().transform.position, Vec3::Y);

    // Name lookup falls through to the bone namespace even though the
    // bone is not a DFS descendant of the root.
    let by_name = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Spine.rotation").unwrap(),
    );
    assert!(by_name.is_bound());
}

#[test]
fn unresolved_path_fails_soft() {
    let (mut scene, root, hand) = hand_scene();
    let binding = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Nobody.position").unwrap(),
    );

    assert!(!binding.is_bound());
    assert!(binding.get(&scene).is_none());
    // Writes are silently dropped, never a panic.
    binding.set(&mut scene, &AnimValue::Vector3(Vec3::ONE));
    assert_eq!(scene.get_node(hand).unwrap().transform.position, Vec3::ZERO);
}

#[test]
fn unknown_property_fails_soft() {
    let (scene, root, _) = hand_scene();
    let binding = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Hand.frobnication").unwrap(),
    );
    assert!(!binding.is_bound());
}

#[test]
fn kind_mismatch_write_is_dropped() {
    let (mut scene, root, hand) = hand_scene();
    let binding = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Hand.position").unwrap(),
    );

    binding.set(&mut scene, &AnimValue::Scalar(7.0));
    assert_eq!(scene.get_node(hand).unwrap().transform.position, Vec3::ZERO);
}

#[test]
fn animated_write_marks_transform_dirty() {
    let (mut scene, root, _) = hand_scene();
    scene.update_local_matrices();

    let binding = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Hand.position").unwrap(),
    );
    binding.set(&mut scene, &AnimValue::Vector3(Vec3::X));

    assert!(scene.update_local_matrices() >= 1, "write must dirty the node");
    assert_eq!(scene.update_local_matrices(), 0, "second pass is clean");
}

#[test]
fn material_color_channel() {
    let (mut scene, root, hand) = hand_scene();
    let binding = PropertyBinding::bind(
        &scene,
        root,
        &TrackPath::from_str("Hand.material[0].color[1]").unwrap(),
    );
    binding.set(&mut scene, &AnimValue::Scalar(0.25));

    let hand_node = scene.get_node(hand).unwrap();
    let mat = scene.materials.get(hand_node.materials[0]).unwrap();
    assert!(approx(mat.color.y, 0.25));
    assert!(approx(mat.color.x, 1.0));
}
