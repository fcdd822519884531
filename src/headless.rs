use crate::backend::{Effect, FieldHandle, FieldKind, RenderBackend};
use crate::camera::PerspectiveCamera;
use crate::particle_field::ParticleField;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub kind: FieldKind,
    pub particle_count: u32,
    pub time: f32,
}

// A renderer without a GPU. It keeps the bookkeeping a real backend would
// (live resources, uniforms, surface size) so the scene can run anywhere.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u32,
    fields: HashMap<FieldHandle, FieldRecord>,
    pub test_cube: bool,
    pub size: (u32, u32),
    pub pixel_ratio: f64,
    pub frames_rendered: u64,
    pub size_updates: u64,
    pub last_aspect: Option<f32>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        HeadlessBackend {
            pixel_ratio: 1.0,
            ..HeadlessBackend::default()
        }
    }

    pub fn live_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn live_fields_of(&self, kind: FieldKind) -> usize {
        self.fields.values().filter(|f| f.kind == kind).count()
    }

    pub fn field(&self, handle: FieldHandle) -> Option<&FieldRecord> {
        self.fields.get(&handle)
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_field(&mut self, effect: &Effect, field: &ParticleField) -> FieldHandle {
        let handle = FieldHandle(self.next_handle);
        self.next_handle += 1;
        self.fields.insert(
            handle,
            FieldRecord {
                kind: effect.kind(),
                particle_count: field.count(),
                time: 0.0,
            },
        );
        handle
    }

    fn release_field(&mut self, handle: FieldHandle) {
        self.fields.remove(&handle);
    }

    fn set_field_time(&mut self, handle: FieldHandle, time: f32) {
        if let Some(record) = self.fields.get_mut(&handle) {
            record.time = time;
        }
    }

    fn set_test_cube(&mut self, visible: bool) {
        self.test_cube = visible;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.size_updates += 1;
    }

    fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
    }

    fn render(&mut self, camera: &PerspectiveCamera) {
        self.last_aspect = Some(camera.aspect);
        self.frames_rendered += 1;
    }
}
