// tests/test_instancing.rs
// Instance serialization: excluded base meshes are uploaded exactly once,
// intersector ids follow partition order, and material-id regions are
// valid per shape.

use glam::{Mat4, Vec3, Vec4};
use rayforge::collector::Collector;
use rayforge::device::HostDevice;
use rayforge::intersect::NullIntersector;
use rayforge::scene::{
    Bxdf, Instance, Light, Material, MaterialHandle, Mesh, PerspectiveCamera, Scene, TextureId,
};
use rayforge::tracker::SceneTracker;

type Tracker = SceneTracker<HostDevice, NullIntersector>;

fn tracker() -> Tracker {
    SceneTracker::new(HostDevice::new(), NullIntersector::new())
}

fn quad() -> Mesh {
    Mesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![Vec3::Z; 4],
        vec![],
        vec![0, 1, 2, 0, 2, 3],
    )
}

fn add_ambient(scene: &mut Scene) {
    scene.add_light(Light::point(Vec3::new(0.0, 3.0, 0.0), Vec3::ONE));
    scene.set_camera(PerspectiveCamera::look_at(
        Vec3::new(0.0, 1.0, 4.0),
        Vec3::ZERO,
        Vec3::Y,
    ));
}

fn compile(
    tracker: &mut Tracker,
    scene: &mut Scene,
) -> (Collector<MaterialHandle>, Collector<TextureId>) {
    let mut mat_collector = Collector::new();
    let mut tex_collector = Collector::new();
    tracker
        .compile_scene(scene, &mut mat_collector, &mut tex_collector)
        .expect("compile should succeed");
    (mat_collector, tex_collector)
}

#[test]
fn instance_with_excluded_base_uploads_geometry_once() {
    let mut tracker = tracker();
    let mut scene = Scene::new();

    // The base mesh is registered but never attached.
    let base = scene.register_mesh(quad());
    let inst = scene
        .register_instance(Instance::new(
            base,
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
        ))
        .unwrap();
    scene.attach_shape(inst);
    add_ambient(&mut scene);

    let (mat_collector, _) = compile(&mut tracker, &mut scene);
    let compiled = tracker.compiled_scene(scene.id()).unwrap();

    // One handle for the excluded base, one for the instance; only the
    // instance is attached.
    assert_eq!(compiled.isect_shapes.len(), 2);
    assert_eq!(compiled.visible_shapes.len(), 1);
    assert_eq!(tracker.intersector().attached().len(), 1);

    // The base geometry lives in the pools exactly once.
    let geometry = compiled.geometry.as_ref().unwrap();
    assert_eq!(geometry.vertices.contents().len(), 4);
    assert_eq!(geometry.indices.contents().len(), 6);

    // Two shape records: excluded mesh first, then the instance reusing
    // its ranges with a fresh material region.
    let shapes = geometry.shapes.contents();
    assert_eq!(shapes.len(), 2);
    assert_eq!(shapes[0].start_vtx, 0);
    assert_eq!(shapes[0].start_idx, 0);
    assert_eq!(shapes[0].num_prims, 2);
    assert_eq!(shapes[1].start_vtx, shapes[0].start_vtx);
    assert_eq!(shapes[1].start_idx, shapes[0].start_idx);
    assert_eq!(shapes[1].num_prims, 2);
    assert_ne!(shapes[1].start_material_idx, shapes[0].start_material_idx);

    // Excluded meshes are never shaded; the instance uses the default
    // material's collector index.
    let material_ids = geometry.material_ids.contents();
    assert_eq!(&material_ids[0..2], &[-1, -1][..]);
    let default_idx = mat_collector.index_of(&MaterialHandle::Default).unwrap() as i32;
    assert_eq!(&material_ids[2..4], &[default_idx, default_idx][..]);

    // The instance record carries the instance transform, not the base's.
    let expected = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
        .transpose()
        .to_cols_array_2d();
    assert_eq!(shapes[1].transform, expected);
}

#[test]
fn intersector_ids_are_assigned_in_partition_order() {
    let mut tracker = tracker();
    let mut scene = Scene::new();

    scene.add_mesh(quad());
    let base = scene.register_mesh(quad());
    for x in 0..2 {
        let inst = scene
            .register_instance(Instance::new(
                base,
                Mat4::from_translation(Vec3::new(x as f32, 0.0, 0.0)),
            ))
            .unwrap();
        scene.attach_shape(inst);
    }
    add_ambient(&mut scene);

    compile(&mut tracker, &mut scene);
    let compiled = tracker.compiled_scene(scene.id()).unwrap();

    // meshes, then excluded meshes, then instances, ids from 1.
    assert_eq!(compiled.isect_shapes.len(), 4);
    let ids: Vec<u32> = compiled
        .isect_shapes
        .iter()
        .map(|&h| tracker.intersector().shape_id(h).unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    // Listed mesh and both instances are visible; the excluded base is not.
    assert_eq!(compiled.visible_shapes.len(), 3);
}

#[test]
fn attached_base_serves_instances_without_exclusion() {
    let mut tracker = tracker();
    let mut scene = Scene::new();

    let material = scene.add_material(
        Material::single(Bxdf::Lambert).with_input("albedo", Vec4::new(0.2, 0.4, 0.9, 1.0)),
    );
    let base = scene.add_mesh(quad());
    scene.shape_mut(base).set_material(Some(material));
    let inst = scene
        .register_instance(
            Instance::new(base, Mat4::from_translation(Vec3::Y)).with_material(material),
        )
        .unwrap();
    scene.attach_shape(inst);
    add_ambient(&mut scene);

    let (mat_collector, _) = compile(&mut tracker, &mut scene);
    let compiled = tracker.compiled_scene(scene.id()).unwrap();

    // Base is listed, so nothing is excluded and both handles are visible.
    assert_eq!(compiled.isect_shapes.len(), 2);
    assert_eq!(compiled.visible_shapes.len(), 2);

    let geometry = compiled.geometry.as_ref().unwrap();
    assert_eq!(geometry.vertices.contents().len(), 4);

    // Both material regions hold the same valid material index.
    let idx = mat_collector
        .index_of(&MaterialHandle::Item(material))
        .unwrap() as i32;
    let material_ids = geometry.material_ids.contents();
    assert_eq!(material_ids, &[idx, idx, idx, idx][..]);
}
