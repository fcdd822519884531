pub mod backend;
pub mod buffer_util;
pub mod camera;
pub mod clock;
pub mod debug_panel;
pub mod error;
pub mod headless;
pub mod particle_field;
pub mod render;
pub mod scene;
pub mod scene_params;
pub mod test_cube;
pub mod viewport;
