use crate::backend::{Effect, FieldHandle, FieldKind, RenderBackend};
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::clock::Clock;
use crate::error::FieldError;
use crate::particle_field::{self, ParticleField};
use crate::scene_params::{FlameParams, SceneParams, SmokeParams};
use crate::viewport::Viewport;
use log::{info, trace};
use rand::rngs::StdRng;

struct InstalledField {
    field: ParticleField,
    effect: Effect,
    handle: FieldHandle,
}

// Holds at most one field. Installing uploads the replacement before the
// previous resources are released, so a slot is never left empty mid-swap.
#[derive(Default)]
pub struct FieldSlot {
    installed: Option<InstalledField>,
}

impl FieldSlot {
    pub fn install<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        effect: Effect,
        field: ParticleField,
    ) -> FieldHandle {
        let handle = backend.upload_field(&effect, &field);
        let previous = self.installed.replace(InstalledField {
            field,
            effect,
            handle,
        });
        if let Some(previous) = previous {
            backend.release_field(previous.handle);
        }
        handle
    }

    pub fn clear<B: RenderBackend>(&mut self, backend: &mut B) {
        if let Some(previous) = self.installed.take() {
            backend.release_field(previous.handle);
        }
    }

    pub fn handle(&self) -> Option<FieldHandle> {
        self.installed.as_ref().map(|f| f.handle)
    }

    pub fn field(&self) -> Option<&ParticleField> {
        self.installed.as_ref().map(|f| &f.field)
    }

    pub fn effect(&self) -> Option<&Effect> {
        self.installed.as_ref().map(|f| &f.effect)
    }
}

// Application context: owns the renderer, camera and the active fields for
// the lifetime of the window.
pub struct Scene<B: RenderBackend> {
    params: SceneParams,
    backend: B,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: Viewport,
    clock: Clock,
    flame: FieldSlot,
    smoke: FieldSlot,
    rng: StdRng,
}

impl<B: RenderBackend> Scene<B> {
    pub fn new(
        params: SceneParams,
        mut backend: B,
        viewport: Viewport,
        rng: StdRng,
    ) -> Result<Self, FieldError> {
        let camera = PerspectiveCamera::new(&params.camera, viewport.aspect());
        let controls = OrbitControls::new(&camera, &params.camera);
        backend.set_pixel_ratio(viewport.pixel_ratio);
        backend.set_size(viewport.width, viewport.height);
        backend.set_test_cube(params.demo.has_test_cube());
        info!("Building {:?} scene", params.demo);

        let mut scene = Scene {
            params,
            backend,
            camera,
            controls,
            viewport,
            clock: Clock::new(params.fps),
            flame: FieldSlot::default(),
            smoke: FieldSlot::default(),
            rng,
        };
        if params.demo.has_flame() {
            scene.set_flame_params(params.flame)?;
        }
        if params.demo.has_smoke() {
            scene.set_smoke_params(params.smoke)?;
        }
        Ok(scene)
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn slot(&self, kind: FieldKind) -> &FieldSlot {
        match kind {
            FieldKind::Flame => &self.flame,
            FieldKind::Smoke => &self.smoke,
        }
    }

    // The old field stays installed if the new configuration is rejected.
    pub fn set_flame_params(&mut self, params: FlameParams) -> Result<(), FieldError> {
        let field = particle_field::generate(&params.field, &mut self.rng)?;
        self.flame
            .install(&mut self.backend, Effect::Flame(params), field);
        self.params.flame = params;
        info!("Regenerated flame with {} particles", params.field.count);
        Ok(())
    }

    pub fn set_smoke_params(&mut self, params: SmokeParams) -> Result<(), FieldError> {
        let field = particle_field::generate(&params.field, &mut self.rng)?;
        self.smoke
            .install(&mut self.backend, Effect::Smoke(params), field);
        self.params.smoke = params;
        info!("Regenerated smoke with {} particles", params.field.count);
        Ok(())
    }

    // Called once per display refresh.
    pub fn frame(&mut self) {
        let elapsed = self.clock.tick();
        for slot in [&self.flame, &self.smoke].iter() {
            if let Some(handle) = slot.handle() {
                self.backend.set_field_time(handle, elapsed);
            }
        }
        self.controls.update(&mut self.camera);
        trace!("Rendering frame at t = {:.3}", elapsed);
        self.backend.render(&self.camera);
    }

    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        if width == 0 || height == 0 {
            trace!("Ignoring resize to an empty surface");
            return;
        }
        if !self.viewport.resize(width, height, device_pixel_ratio) {
            return;
        }
        info!(
            "Resizing viewport: ({}, {}) @ {}x",
            width, height, self.viewport.pixel_ratio
        );
        self.camera.aspect = self.viewport.aspect();
        self.camera.update_projection_matrix();
        self.backend.set_size(width, height);
        self.backend.set_pixel_ratio(self.viewport.pixel_ratio);
    }

    // Releases every field; the scene renders nothing but the background afterwards.
    pub fn teardown(&mut self) {
        self.flame.clear(&mut self.backend);
        self.smoke.clear(&mut self.backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use crate::scene_params::Demo;
    use rand::SeedableRng;

    fn scene(demo: Demo) -> Scene<HeadlessBackend> {
        let params = SceneParams {
            demo,
            ..SceneParams::default()
        };
        Scene::new(
            params,
            HeadlessBackend::new(),
            Viewport::new(640, 360, 1.0),
            StdRng::seed_from_u64(1),
        )
        .unwrap()
    }

    #[test]
    fn demo_contents() {
        let cube = scene(Demo::Cube);
        assert!(cube.backend().test_cube);
        assert_eq!(cube.backend().live_fields(), 0);

        let flame = scene(Demo::Flame);
        assert!(!flame.backend().test_cube);
        assert_eq!(flame.backend().live_fields_of(FieldKind::Flame), 1);
        assert_eq!(flame.backend().live_fields_of(FieldKind::Smoke), 0);

        let both = scene(Demo::FlameSmoke);
        assert_eq!(both.backend().live_fields_of(FieldKind::Flame), 1);
        assert_eq!(both.backend().live_fields_of(FieldKind::Smoke), 1);
    }

    #[test]
    fn regeneration_keeps_one_resource_per_slot() {
        let mut scene = scene(Demo::FlameSmoke);
        for i in 1..=20 {
            let mut flame = scene.params().flame;
            flame.field.count = i * 10;
            scene.set_flame_params(flame).unwrap();
            assert_eq!(scene.backend().live_fields_of(FieldKind::Flame), 1);
        }
        assert_eq!(scene.backend().live_fields(), 2);
        let handle = scene.slot(FieldKind::Flame).handle().unwrap();
        assert_eq!(scene.backend().field(handle).unwrap().particle_count, 200);
        assert_eq!(scene.slot(FieldKind::Flame).field().unwrap().count(), 200);
    }

    #[test]
    fn invalid_configuration_keeps_previous_field() {
        let mut scene = scene(Demo::Flame);
        let before = scene.slot(FieldKind::Flame).handle();
        let mut flame = scene.params().flame;
        flame.field.count = 0;
        assert_eq!(
            scene.set_flame_params(flame),
            Err(FieldError::InvalidConfiguration { count: 0 })
        );
        assert_eq!(scene.slot(FieldKind::Flame).handle(), before);
        assert_eq!(scene.params().flame.field.count, FlameParams::default().field.count);
        assert_eq!(scene.backend().live_fields(), 1);
    }

    #[test]
    fn invalid_startup_configuration_fails() {
        let mut params = SceneParams::default();
        params.smoke.field.count = 0;
        let result = Scene::new(
            params,
            HeadlessBackend::new(),
            Viewport::new(640, 360, 1.0),
            StdRng::seed_from_u64(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn frame_pushes_time_into_fields() {
        let mut scene = scene(Demo::FlameSmoke);
        std::thread::sleep(std::time::Duration::from_millis(5));
        scene.frame();
        let elapsed = scene.clock().elapsed();
        assert!(elapsed > 0.0);
        for kind in [FieldKind::Flame, FieldKind::Smoke].iter() {
            let handle = scene.slot(*kind).handle().unwrap();
            assert_eq!(scene.backend().field(handle).unwrap().time, elapsed);
        }
        assert_eq!(scene.backend().frames_rendered, 1);
    }

    #[test]
    fn frame_without_fields_still_renders() {
        let mut scene = scene(Demo::Cube);
        scene.frame();
        scene.frame();
        assert_eq!(scene.backend().frames_rendered, 2);
        assert_eq!(scene.backend().live_fields(), 0);
        assert!(scene.slot(FieldKind::Flame).field().is_none());
    }

    #[test]
    fn resize_sets_aspect_and_is_idempotent() {
        let mut scene = scene(Demo::Flame);
        let updates = scene.backend().size_updates;
        scene.resize(800, 600, 1.0);
        assert!((scene.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(scene.backend().size, (800, 600));
        assert_eq!(scene.backend().size_updates, updates + 1);

        let projection = scene.camera().projection_matrix();
        scene.resize(800, 600, 1.0);
        assert_eq!(scene.backend().size_updates, updates + 1);
        assert_eq!(scene.camera().projection_matrix(), projection);

        scene.frame();
        assert!((scene.backend().last_aspect.unwrap() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn resize_clamps_pixel_ratio() {
        let mut scene = scene(Demo::Flame);
        scene.resize(800, 600, 3.0);
        assert_eq!(scene.backend().pixel_ratio, 2.0);
        assert_eq!(scene.viewport().drawable_size(), (1600, 1200));
    }

    #[test]
    fn resize_to_empty_surface_is_ignored() {
        let mut scene = scene(Demo::Flame);
        scene.resize(0, 0, 1.0);
        assert_eq!(scene.viewport().width, 640);
        assert_eq!(scene.backend().size, (640, 360));
    }

    #[test]
    fn teardown_releases_everything() {
        let mut scene = scene(Demo::FlameSmoke);
        scene.teardown();
        assert_eq!(scene.backend().live_fields(), 0);
        scene.frame();
        assert_eq!(scene.backend().frames_rendered, 1);
    }
}
