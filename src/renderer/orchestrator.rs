//! Frame Orchestrator
//!
//! The per-frame driver. Each displayed frame it:
//!
//! 1. derives the frame's [`LightingState`] (explicitly injected — there is
//!    no ambient "current light" global),
//! 2. synchronizes every shading rig's uniform stores (control values,
//!    lighting, liquid dynamics, time) — each slot written once, by one
//!    owner,
//! 3. builds the [`FramePlan`] (fail-fast on missing light/backdrop),
//! 4. executes the pass graph in the plan's strict order:
//!    transmission capture → shadow → main color → post-processing.
//!
//! All passes of a frame run sequentially inside one call; nothing
//! interleaves. State mutations inside passes go through scope guards and
//! are restored on every exit path.

use glam::{EulerRot, Vec2, Vec3};

use crate::controls::ControlPanel;
use crate::errors::{FrameError, Result};
use crate::renderer::blit::BlitRenderer;
use crate::renderer::context::WgpuContext;
use crate::renderer::geometry::GeometryCache;
use crate::renderer::graph::{PassJournal, RenderGraph};
use crate::renderer::passes::forward::FallbackTextures;
use crate::renderer::passes::{ForwardPass, ShadowPass, TransmissionCapturePass};
use crate::renderer::plan::FramePlan;
use crate::renderer::post::PostProcessChain;
use crate::renderer::state::RenderState;
use crate::renderer::target::{RenderTarget, RenderTargetPool, TargetConfig};
use crate::resources::material::MaterialFamily;
use crate::resources::texture::{CubeMap, EnvironmentMap, TextureHandle};
use crate::scene::environment::{LightingProvider, LightingState};
use crate::scene::liquid::{LiquidDynamics, LiquidParams};
use crate::scene::scene::Scene;

/// Transmission capture target resolution (square, mipmapped).
pub const TRANSMISSION_SIZE: u32 = 1024;

/// One material family with its control surface and optional liquid body.
pub struct ShadingRig {
    pub family: MaterialFamily,
    pub panel: ControlPanel,
    pub liquid: Option<LiquidRig>,
}

/// Liquid dynamics bound to one scene object.
pub struct LiquidRig {
    /// Id of the scene object whose motion drives the wobble.
    pub object: u64,
    pub dynamics: LiquidDynamics,
}

/// The fixed per-session target set plus the output surface stand-in.
pub struct FrameTargets {
    pub shadow: RenderTarget,
    pub transmission: RenderTarget,
    pub scene_color: RenderTarget,
    pub depth_view: wgpu::TextureView,
    pub output: wgpu::Texture,
    pub output_view: wgpu::TextureView,
}

/// Borrowed view of everything a pass may touch during one frame.
pub struct FrameContext<'a> {
    pub gpu: &'a WgpuContext,
    pub scene: &'a Scene,
    pub plan: &'a FramePlan,
    pub lighting: &'a LightingState,
    pub state: &'a mut RenderState,
    pub journal: &'a mut PassJournal,
    pub targets: &'a FrameTargets,
    pub meshes: &'a GeometryCache,
    pub blit: &'a BlitRenderer,
    pub env_texture: &'a TextureHandle,
    pub fallbacks: &'a FallbackTextures,
    pub time: f32,
    pub dt: f32,
}

/// Output surface format (LDR).
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub struct FrameOrchestrator {
    state: RenderState,
    journal: PassJournal,
    targets: FrameTargets,
    blit: BlitRenderer,
    fallbacks: FallbackTextures,

    transmission_pass: TransmissionCapturePass,
    shadow_pass: ShadowPass,
    forward_pass: ForwardPass,
    post_chain: PostProcessChain,

    provider: LightingProvider,
    meshes: GeometryCache,
    env_upload: Option<(u64, TextureHandle)>,
    fallback_env: EnvironmentMap,

    time: f32,
}

impl FrameOrchestrator {
    pub fn new(
        gpu: &WgpuContext,
        pool: &mut RenderTargetPool,
        width: u32,
        height: u32,
        shadow_map_size: u32,
    ) -> Result<Self> {
        let shadow = pool.acquire(
            &gpu.device,
            gpu.caps,
            "Shadow Color Target",
            shadow_map_size,
            shadow_map_size,
            TargetConfig::SHADOW,
        )?;
        let transmission = pool.acquire(
            &gpu.device,
            gpu.caps,
            "Transmission Capture Target",
            TRANSMISSION_SIZE,
            TRANSMISSION_SIZE,
            TargetConfig::TRANSMISSION,
        )?;
        let scene_color = pool.acquire(
            &gpu.device,
            gpu.caps,
            "Scene Color",
            width,
            height,
            TargetConfig::SCENE,
        )?;

        let (output, output_view) = create_output(gpu, width, height);
        let depth_view = gpu.create_depth_view(width, height);

        let mut blit = BlitRenderer::new(&gpu.device);
        blit.ensure_pipeline(&gpu.device, transmission.spec().format);

        let scene_format = scene_color.spec().format;
        let post_chain =
            PostProcessChain::new(gpu, pool, scene_format, OUTPUT_FORMAT, width, height)?;

        Ok(Self {
            state: RenderState::default(),
            journal: PassJournal::default(),
            targets: FrameTargets {
                shadow,
                transmission,
                scene_color,
                depth_view,
                output,
                output_view,
            },
            blit,
            fallbacks: FallbackTextures::new(&gpu.device, &gpu.queue),
            transmission_pass: TransmissionCapturePass::new(),
            shadow_pass: ShadowPass::new(&gpu.device, gpu.depth_format, shadow_map_size),
            forward_pass: ForwardPass::new(&gpu.device),
            post_chain,
            provider: LightingProvider::new(),
            meshes: GeometryCache::new(),
            env_upload: None,
            fallback_env: EnvironmentMap::Cube(CubeMap::solid(4, Vec3::ZERO)),
            time: 0.0,
        })
    }

    /// Renders one frame. Passes 1–3 of the plan run exactly once; a failed
    /// precondition aborts before anything is drawn.
    pub fn render_frame(
        &mut self,
        gpu: &WgpuContext,
        scene: &Scene,
        rigs: &mut [ShadingRig],
        dt: f32,
    ) -> Result<()> {
        // Fail fast: validates light + backdrop before any GPU work.
        let plan = FramePlan::build(scene)?;

        let light = scene.require_light()?;
        let env = scene.environment.as_ref().unwrap_or(&self.fallback_env);
        let lighting = self.provider.lighting_state(light, env);

        if light.frustum.map_size != self.targets.shadow.size().0 {
            log::warn!(
                "light frustum map_size {} differs from the shadow target acquired at init ({}); the target resolution is fixed at acquisition",
                light.frustum.map_size,
                self.targets.shadow.size().0
            );
        }

        // Upload the environment texture when its identity changes.
        let env_id = env.id();
        if self.env_upload.as_ref().map(|(id, _)| *id) != Some(env_id) {
            self.env_upload = Some((env_id, env.upload(&gpu.device, &gpu.queue)));
        }
        let env_texture = self
            .env_upload
            .as_ref()
            .map_or(&self.fallbacks.black_cube, |(_, handle)| handle);

        // Mesh residency before any pass records draws.
        for object in &scene.objects {
            self.meshes.ensure(&gpu.device, &object.mesh);
        }

        self.time += dt;
        sync_uniforms(
            scene,
            rigs,
            &lighting,
            env,
            self.targets.transmission.size(),
            self.time,
            dt,
        )?;

        // Execute the pass graph.
        self.journal.clear();
        let mut ctx = FrameContext {
            gpu,
            scene,
            plan: &plan,
            lighting: &lighting,
            state: &mut self.state,
            journal: &mut self.journal,
            targets: &self.targets,
            meshes: &self.meshes,
            blit: &self.blit,
            env_texture,
            fallbacks: &self.fallbacks,
            time: self.time,
            dt,
        };

        let mut graph = RenderGraph::new();
        if plan.uses_transmission() {
            graph.add_node(&mut self.transmission_pass);
        }
        graph.add_node(&mut self.shadow_pass);
        graph.add_node(&mut self.forward_pass);
        graph.add_node(&mut self.post_chain);
        graph.execute(&mut ctx);

        Ok(())
    }

    /// Explicit output resize: new scene-color/depth/output surfaces and a
    /// post-chain resize. The shadow and transmission targets keep their
    /// fixed resolutions.
    pub fn resize(
        &mut self,
        gpu: &WgpuContext,
        pool: &mut RenderTargetPool,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.targets.scene_color = pool.acquire(
            &gpu.device,
            gpu.caps,
            "Scene Color",
            width,
            height,
            TargetConfig::SCENE,
        )?;
        let (output, output_view) = create_output(gpu, width, height);
        self.targets.output = output;
        self.targets.output_view = output_view;
        self.targets.depth_view = gpu.create_depth_view(width, height);
        self.post_chain.resize(gpu, pool, width, height)
    }

    /// Pass names executed last frame, in order.
    #[must_use]
    pub fn journal(&self) -> &[&'static str] {
        self.journal.entries()
    }

    #[must_use]
    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    #[must_use]
    pub fn lighting_provider(&self) -> &LightingProvider {
        &self.provider
    }
}

/// Writes the per-frame uniform values into every rig's stores.
///
/// Ownership rule: this function is the single writer of every per-frame
/// slot; materials only read.
fn sync_uniforms(
    scene: &Scene,
    rigs: &mut [ShadingRig],
    lighting: &LightingState,
    env: &EnvironmentMap,
    transmission_size: (u32, u32),
    time: f32,
    dt: f32,
) -> std::result::Result<(), FrameError> {
    let (env_w, env_h) = env.texel_size();

    for rig in rigs {
        let panel = &rig.panel;

        // Liquid dynamics first: its outputs land in the same store.
        let mut surface = None;
        if let Some(liquid) = &mut rig.liquid
            && let Some(object) = scene.object(liquid.object)
        {
            let params = LiquidParams {
                fill_amount: panel.value("fill_amount", -0.25),
                recovery: panel.value("recovery", 10.0),
                wobble_speed: panel.value("wobble_speed", 2.0),
                max_wobble: panel.value("max_wobble", 0.2),
            };
            let (_, rotation, translation) = object.world.to_scale_rotation_translation();
            let euler: Vec3 = rotation.to_euler(EulerRot::XYZ).into();
            surface = Some(liquid.dynamics.step(&params, translation, euler, dt));
        }

        {
            let mut store = rig.family.color_store.write();

            store.set_float("time", time)?;
            store.set_float("delta_time", dt)?;

            // Lighting (explicit injection, not a global lookup)
            store.set_vec3("light_position", lighting.position)?;
            store.set_vec3("light_direction", lighting.direction)?;
            store.set("sh_coefficients",
                crate::resources::uniform_store::UniformValue::Vec3Array(lighting.sh.to_vec()))?;

            // Environment
            store.set_vec2("env_texture_size", Vec2::new(env_w as f32, env_h as f32))?;
            store.set_vec2(
                "transmission_sampler_size",
                Vec2::new(transmission_size.0 as f32, transmission_size.1 as f32),
            )?;

            // Control surface
            store.set_float("reflectance", panel.value("reflectance", 0.5))?;
            store.set_float("direct_intensity", panel.value("direct_intensity", 2.0))?;
            store.set_float("indirect_intensity", panel.value("indirect_intensity", 0.8))?;
            store.set_bool("super_rough", panel.toggle("super_rough", false))?;
            store.set_float("roughness", panel.value("roughness", 0.5))?;
            store.set_float("metalness", panel.value("metalness", 0.0))?;

            store.set_float("clearcoat", panel.value("clearcoat", 0.0))?;
            store.set_float("clearcoat_roughness", panel.value("clearcoat_roughness", 0.0))?;

            store.set_float("sheen", panel.value("sheen", 0.0))?;
            store.set_float("sheen_roughness", panel.value("sheen_roughness", 0.0))?;
            store.set_color("sheen_color", panel.color("sheen_color", Vec3::ZERO))?;

            store.set_float("glitter", panel.value("glitter", 0.0))?;
            store.set_float("glitter_density", panel.value("glitter_density", 0.0))?;
            store.set_color("glitter_color", panel.color("glitter_color", Vec3::ZERO))?;

            store.set_float("normal_scale", panel.value("normal_scale", 0.0))?;
            store.set_vec2(
                "normal_repeat_factor",
                panel.vec2("normal_repeat_x", "normal_repeat_y", Vec2::ONE),
            )?;

            store.set_float("transmission", panel.value("transmission", 0.0))?;
            store.set_float("thickness", panel.value("thickness", 0.0))?;
            store.set_float("ior", panel.value("ior", 1.0))?;

            if let Some(surface) = surface {
                store.set_float("fill_height", surface.fill_height)?;
                store.set_float("wobble_x", surface.wobble_x)?;
                store.set_float("wobble_z", surface.wobble_z)?;
            }
        }

        // Depth store: reduced contract. Opacity follows the source's rule —
        // the less transparent the surface renders, the denser its shadow.
        let mut depth = rig.family.depth_store.write();
        depth.set_vec3("light_position", lighting.position)?;
        depth.set_float("time", time)?;
        let opacity = (1.0 - panel.value("transmission", 0.0)
            + panel.value("metalness", 0.0)
            + panel.value("glitter", 0.0)
            + panel.value("roughness", 0.5))
            .clamp(0.0, 1.0);
        depth.set_float("opacity", opacity)?;
    }

    Ok(())
}

fn create_output(gpu: &WgpuContext, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let output = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Output Surface"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    (output, view)
}
