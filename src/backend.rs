use crate::camera::PerspectiveCamera;
use crate::particle_field::ParticleField;
use crate::scene_params::{FlameParams, SmokeParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Flame,
    Smoke,
}

// Effect-specific shading parameters uploaded next to a field's buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Flame(FlameParams),
    Smoke(SmokeParams),
}

impl Effect {
    pub fn kind(&self) -> FieldKind {
        match self {
            Effect::Flame(_) => FieldKind::Flame,
            Effect::Smoke(_) => FieldKind::Smoke,
        }
    }
}

// Everything the scene needs from a renderer. Calls never overlap: they are
// all made from the event loop thread.
pub trait RenderBackend {
    // Creates the GPU-side resources for a field.
    fn upload_field(&mut self, effect: &Effect, field: &ParticleField) -> FieldHandle;

    // Releases the resources behind `handle`. Unknown handles are ignored.
    fn release_field(&mut self, handle: FieldHandle);

    fn set_field_time(&mut self, handle: FieldHandle, time: f32);

    fn set_test_cube(&mut self, visible: bool);

    // Logical size of the viewport.
    fn set_size(&mut self, width: u32, height: u32);

    // Already clamped; renderers size points with it.
    fn set_pixel_ratio(&mut self, pixel_ratio: f64);

    fn render(&mut self, camera: &PerspectiveCamera);
}
