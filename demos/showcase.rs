//! Headless showcase: the canonical demo scene rendered offscreen.
//!
//! A glossy sphere and a wobbling transmissive droplet over a backdrop
//! plane, lit by a directional light at (10,10,10) and a procedural
//! gradient environment. Renders a few seconds of frames and writes the
//! final one to `showcase.png`.

use anyhow::Result;
use glam::{Mat4, Quat, Vec3};

use lustre::renderer::orchestrator::{LiquidRig, ShadingRig};
use lustre::resources::material::{MaterialFamily, MaterialFeatures};
use lustre::scene::{CubeMap, EnvironmentMap};
use lustre::{
    ControlPanel, DirectionalLight, Mesh, PassPriority, Renderer, RendererSettings, Scene,
    SceneObject,
};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const FRAMES: u32 = 120;

fn main() -> Result<()> {
    env_logger::init();

    let mut renderer = Renderer::new(&RendererSettings::default(), WIDTH, HEIGHT)?;

    // --- Scene -------------------------------------------------------------
    let solid = MaterialFamily::new("solid");
    let liquid = MaterialFamily::new("liquid");

    let mut scene = Scene::new();
    scene.light = Some(DirectionalLight::new(Vec3::new(10.0, 10.0, 10.0), Vec3::ZERO));
    scene.environment = Some(EnvironmentMap::Cube(CubeMap::gradient(
        64,
        Vec3::new(0.7, 0.8, 1.0),
        Vec3::new(0.05, 0.04, 0.06),
    )));

    let (plane_color, plane_depth) =
        solid.variants("backdrop", MaterialFeatures::ENV_MAP, Vec3::ONE);
    scene.add(
        SceneObject::new(
            "backdrop",
            Mesh::plane("backdrop", 20.0, 20.0),
            plane_color,
            plane_depth,
            PassPriority::Background,
        )
        .with_world(Mat4::from_translation(Vec3::new(0.0, 0.0, -7.0)))
        .with_shadow(false),
    );

    let (sphere_color, sphere_depth) = solid.variants(
        "sphere",
        MaterialFeatures::ENV_MAP | MaterialFeatures::NORMAL_MAP | MaterialFeatures::GLITTER,
        Vec3::new(1.0, 0.41, 0.71),
    );
    let sphere = scene.add(SceneObject::new(
        "sphere",
        Mesh::sphere("sphere", 1.0, 64),
        sphere_color,
        sphere_depth,
        PassPriority::Opaque,
    ));

    let (droplet_color, droplet_depth) = liquid.variants(
        "droplet",
        MaterialFeatures::ENV_MAP | MaterialFeatures::TRANSMISSION | MaterialFeatures::LIQUID,
        Vec3::new(0.85, 1.0, 0.9),
    );
    let droplet = scene.add(
        SceneObject::new(
            "droplet",
            Mesh::sphere("droplet", 0.8, 64),
            droplet_color,
            droplet_depth,
            PassPriority::Liquid,
        )
        .with_world(Mat4::from_translation(Vec3::new(1.8, 0.3, 1.0))),
    );

    // --- Shading rigs ------------------------------------------------------
    let mut rigs = vec![
        ShadingRig {
            family: solid,
            panel: ControlPanel::solid_preset(),
            liquid: None,
        },
        ShadingRig {
            family: liquid,
            panel: ControlPanel::liquid_preset(),
            liquid: Some(LiquidRig {
                object: droplet,
                dynamics: Default::default(),
            }),
        },
    ];

    // --- Frame loop --------------------------------------------------------
    let dt = 1.0 / 60.0;
    for frame in 0..FRAMES {
        let t = frame as f32 * dt;

        // Spin the subject, bob the droplet so the wobble has motion to eat.
        if let Some(object) = scene.objects.iter_mut().find(|o| o.id() == sphere) {
            object.world = Mat4::from_quat(Quat::from_euler(glam::EulerRot::XYZ, t, t, t));
        }
        if let Some(object) = scene.objects.iter_mut().find(|o| o.id() == droplet) {
            object.world = Mat4::from_translation(Vec3::new(
                1.8 + (t * 1.3).sin() * 0.4,
                0.3,
                1.0,
            ));
        }

        renderer.render_frame(&scene, &mut rigs, dt)?;
    }

    log::info!("pass order: {:?}", renderer.pass_journal());

    // --- Capture -----------------------------------------------------------
    let pixels = renderer.read_output_rgba();
    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, pixels)
        .expect("readback size mismatch");
    image.save("showcase.png")?;
    println!("wrote showcase.png ({WIDTH}x{HEIGHT}, {FRAMES} frames)");

    Ok(())
}
