// tests/test_lights.rs
// Light serialization: record layout per kind, IBL environment-map
// selection (last one wins), area-light shape indexing, and lights-buffer
// growth.

use glam::{Vec2, Vec3};
use rayforge::collector::Collector;
use rayforge::device::{DeviceBuffer, HostDevice};
use rayforge::gpu::GpuLight;
use rayforge::intersect::NullIntersector;
use rayforge::scene::{
    Light, LightKind, MaterialHandle, Mesh, PerspectiveCamera, Scene, Texture, TextureFormat,
    TextureId,
};
use rayforge::tracker::SceneTracker;

type Tracker = SceneTracker<HostDevice, NullIntersector>;

fn tracker() -> Tracker {
    SceneTracker::new(HostDevice::new(), NullIntersector::new())
}

fn triangle() -> Mesh {
    Mesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![Vec3::Z; 3],
        vec![],
        vec![0, 1, 2],
    )
}

fn scene_with_geometry() -> Scene {
    let mut scene = Scene::new();
    scene.add_mesh(triangle());
    scene.set_camera(PerspectiveCamera::look_at(
        Vec3::new(0.0, 1.0, 3.0),
        Vec3::ZERO,
        Vec3::Y,
    ));
    scene
}

fn rgba8(width: u32, height: u32, byte: u8) -> Texture {
    Texture::new(
        width,
        height,
        TextureFormat::Rgba8,
        vec![byte; (width * height * 4) as usize],
    )
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
fn last_ibl_wins_as_environment_map() {
    let mut tracker = tracker();
    let mut scene = scene_with_geometry();

    let tex_a = scene.add_texture(rgba8(1, 1, 0x11));
    let tex_b = scene.add_texture(rgba8(2, 1, 0x22));

    scene.add_light(Light::point(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE));
    scene.add_light(Light::ibl(tex_a, 1.0));
    scene.add_light(Light::directional(-Vec3::Y, Vec3::splat(0.5)));
    scene.add_light(Light::ibl(tex_b, 2.0));

    let (_, tex_collector) = compile(&mut tracker, &mut scene);
    let compiled = tracker.compiled_scene(scene.id()).unwrap();

    assert_eq!(compiled.num_lights, 4);
    assert_eq!(compiled.envmap_idx, 3);

    // Both IBL textures were collected and serialized.
    let textures = compiled.textures.as_ref().unwrap();
    let headers = textures.headers.contents();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0].width, 1);
    assert_eq!(headers[0].data_offset, 0);
    assert_eq!(headers[1].width, 2);
    assert_eq!(headers[1].data_offset, 4);
    assert_eq!(textures.data.contents().len(), 4 + 8);

    // Light records dispatch on kind and reference collector indices.
    let lights = compiled.lights.as_ref().unwrap().contents();
    assert_eq!(lights[0].kind, GpuLight::KIND_POINT);
    assert_eq!(lights[1].kind, GpuLight::KIND_IBL);
    assert_eq!(lights[1].tex, tex_collector.index_of(&tex_a).unwrap() as i32);
    assert_eq!(lights[1].tex_diffuse, lights[1].tex);
    assert_eq!(lights[2].kind, GpuLight::KIND_DIRECTIONAL);
    assert_eq!(lights[3].tex, tex_collector.index_of(&tex_b).unwrap() as i32);
    assert_eq!(lights[3].multiplier, 2.0);
}

#[test]
fn spot_light_cone_and_area_light_shape_index() {
    let mut tracker = tracker();
    let mut scene = scene_with_geometry();

    let emitter = scene.add_mesh(triangle());
    scene.add_light(Light::spot(
        Vec3::new(0.0, 5.0, 0.0),
        -Vec3::Y,
        Vec3::ONE,
        Vec2::new(0.9, 0.7),
    ));
    scene.add_light(Light::area(emitter, 0));

    compile(&mut tracker, &mut scene);
    let compiled = tracker.compiled_scene(scene.id()).unwrap();
    let lights = compiled.lights.as_ref().unwrap().contents();

    assert_eq!(lights[0].kind, GpuLight::KIND_SPOT);
    assert_eq!(lights[0].inner_angle, 0.9);
    assert_eq!(lights[0].outer_angle, 0.7);
    assert_eq!(lights[0].position[1], 5.0);

    // The emitter is the second mesh in partition order.
    assert_eq!(lights[1].kind, GpuLight::KIND_AREA);
    assert_eq!(lights[1].shape_idx, 1);
    assert_eq!(lights[1].prim_idx, 0);
}

#[test]
fn lights_buffer_grows_but_never_shrinks() {
    let mut tracker = tracker();
    let mut scene = scene_with_geometry();
    scene.add_light(Light::point(Vec3::ZERO, Vec3::ONE));

    compile(&mut tracker, &mut scene);
    assert_eq!(
        tracker
            .compiled_scene(scene.id())
            .unwrap()
            .lights
            .as_ref()
            .unwrap()
            .len(),
        1
    );

    scene.add_light(Light::point(Vec3::Y, Vec3::ONE));
    scene.add_light(Light::point(Vec3::X, Vec3::ONE));
    compile(&mut tracker, &mut scene);
    {
        let compiled = tracker.compiled_scene(scene.id()).unwrap();
        assert_eq!(compiled.num_lights, 3);
        assert_eq!(compiled.lights.as_ref().unwrap().len(), 3);
    }

    // Editing an existing light reuses the grown buffer in place.
    let first = scene.lights().next().map(|(id, _)| id).unwrap();
    scene.light_mut(first).set_kind(LightKind::Point {
        position: Vec3::new(0.0, 9.0, 0.0),
        intensity: Vec3::ONE,
    });
    let before = tracker.context().stats();
    compile(&mut tracker, &mut scene);
    assert_eq!(
        tracker.context().stats().buffers_created,
        before.buffers_created
    );
    let compiled = tracker.compiled_scene(scene.id()).unwrap();
    assert_eq!(compiled.lights.as_ref().unwrap().contents()[0].position[1], 9.0);
}
