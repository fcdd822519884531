use crate::scene_params::CameraParams;
use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use std::f32::consts::PI;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// Keeps the camera off the poles, where the up vector degenerates.
const POLAR_EPSILON: f32 = 1e-4;

// Projection matrix, view matrix, then [drawable width, drawable height, pixel ratio, 0].
pub const CAMERA_UNIFORM_LEN: usize = 16 * 2 + 4;

pub struct PerspectiveCamera {
    // Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(params: &CameraParams, aspect: f32) -> Self {
        let mut camera = PerspectiveCamera {
            fov: params.fov,
            aspect,
            near: params.near,
            far: params.far,
            position: Point3::from(params.position),
            target: Point3::from(params.target),
            projection: Matrix4::from_scale(1.0),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(cgmath::Deg(self.fov), self.aspect, self.near, self.far);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    /// Outputs the 4x4 projection matrix, the 4x4 view matrix and the drawable
    /// viewport description consumed by the point sprite shaders.
    pub fn to_uniform_data(
        &self,
        drawable_size: (u32, u32),
        pixel_ratio: f32,
    ) -> [f32; CAMERA_UNIFORM_LEN] {
        let view = self.view_matrix();
        let mut raw = [0f32; CAMERA_UNIFORM_LEN];
        raw[..16].copy_from_slice(&AsRef::<[f32; 16]>::as_ref(&self.projection)[..]);
        raw[16..32].copy_from_slice(&AsRef::<[f32; 16]>::as_ref(&view)[..]);
        raw[32] = drawable_size.0 as f32;
        raw[33] = drawable_size.1 as f32;
        raw[34] = pixel_ratio;
        raw
    }
}

// Spherical coordinates around the orbit target, y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    // Polar angle from +y.
    pub phi: f32,
    // Azimuth around +y, measured from +z.
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Spherical {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Spherical {
            radius,
            phi: (offset.y / radius).max(-1.0).min(1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

// Pointer-driven orbit around a target with optional damping.
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    spherical: Spherical,
    spherical_delta: Spherical,
    scale: f32,

    dragging: bool,
    last_pointer: Option<(f64, f64)>,
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera, params: &CameraParams) -> Self {
        OrbitControls {
            enable_damping: params.enable_damping,
            damping_factor: params.damping_factor,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            spherical: Spherical::from_offset(camera.position - camera.target),
            spherical_delta: Spherical {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            },
            scale: 1.0,
            dragging: false,
            last_pointer: None,
        }
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    // Positive steps move the camera towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95f32.powf(steps * self.zoom_speed);
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
        if !dragging {
            self.last_pointer = None;
        }
    }

    // Feed pointer positions in physical pixels; rotation is only applied while dragging.
    pub fn pointer_moved(&mut self, x: f64, y: f64, viewport_height: u32) {
        if let (true, Some((last_x, last_y))) = (self.dragging, self.last_pointer) {
            let height = viewport_height.max(1) as f32;
            let dx = (x - last_x) as f32;
            let dy = (y - last_y) as f32;
            self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
            self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
        }
        if self.dragging {
            self.last_pointer = Some((x, y));
        }
    }

    /// Applies pending input to the camera, returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = self.spherical;
        if self.enable_damping {
            self.spherical.theta += self.spherical_delta.theta * self.damping_factor;
            self.spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            self.spherical.theta += self.spherical_delta.theta;
            self.spherical.phi += self.spherical_delta.phi;
        }
        self.spherical.theta %= 2.0 * PI;
        self.spherical.phi = self
            .spherical
            .phi
            .max(POLAR_EPSILON)
            .min(PI - POLAR_EPSILON);
        self.spherical.radius = (self.spherical.radius * self.scale)
            .max(self.min_distance)
            .min(self.max_distance);

        camera.position = camera.target + self.spherical.to_offset();

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta.theta = 0.0;
            self.spherical_delta.phi = 0.0;
        }
        self.scale = 1.0;

        (self.spherical.theta - before.theta).abs() > 1e-6
            || (self.spherical.phi - before.phi).abs() > 1e-6
            || (self.spherical.radius - before.radius).abs() > 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PerspectiveCamera, OrbitControls) {
        let params = CameraParams::default();
        let camera = PerspectiveCamera::new(&params, 800.0 / 600.0);
        let controls = OrbitControls::new(&camera, &params);
        (camera, controls)
    }

    #[test]
    fn spherical_round_trip() {
        let offset = Vector3::new(2.0, 2.0, 2.0);
        let spherical = Spherical::from_offset(offset);
        assert!((spherical.radius - 12f32.sqrt()).abs() < 1e-5);
        assert!((spherical.theta - PI / 4.0).abs() < 1e-5);
        assert!((spherical.to_offset() - offset).magnitude() < 1e-5);
    }

    #[test]
    fn idle_update_keeps_position() {
        let (mut camera, mut controls) = setup();
        let start = camera.position;
        assert!(!controls.update(&mut camera));
        assert!((camera.position - start).magnitude() < 1e-5);
    }

    #[test]
    fn damping_converges() {
        let (mut camera, mut controls) = setup();
        let start_theta = controls.spherical().theta;
        controls.rotate_left(-0.5);
        let mut last_step = f32::INFINITY;
        for _ in 0..500 {
            let before = controls.spherical().theta;
            controls.update(&mut camera);
            let step = (controls.spherical().theta - before).abs();
            assert!(step <= last_step + 1e-6);
            last_step = step;
        }
        let travelled = controls.spherical().theta - start_theta;
        assert!(travelled > 0.49 && travelled <= 0.5 + 1e-4, "{}", travelled);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn undamped_applies_immediately() {
        let (mut camera, mut controls) = setup();
        controls.enable_damping = false;
        let start = controls.spherical().theta;
        controls.rotate_left(-0.25);
        assert!(controls.update(&mut camera));
        assert!((controls.spherical().theta - start - 0.25).abs() < 1e-5);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (mut camera, mut controls) = setup();
        controls.enable_damping = false;
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        assert!(controls.spherical().phi >= POLAR_EPSILON);
        controls.rotate_up(-20.0);
        controls.update(&mut camera);
        assert!(controls.spherical().phi <= PI - POLAR_EPSILON);
    }

    #[test]
    fn zoom_moves_towards_target() {
        let (mut camera, mut controls) = setup();
        let start = controls.spherical().radius;
        controls.zoom(3.0);
        controls.update(&mut camera);
        assert!(controls.spherical().radius < start);
        let distance = (camera.position - camera.target).magnitude();
        assert!((distance - controls.spherical().radius).abs() < 1e-4);
    }

    #[test]
    fn drag_rotates_only_while_pressed() {
        let (mut camera, mut controls) = setup();
        controls.enable_damping = false;
        controls.pointer_moved(10.0, 10.0, 600);
        controls.pointer_moved(100.0, 10.0, 600);
        assert!(!controls.update(&mut camera));
        controls.set_dragging(true);
        controls.pointer_moved(10.0, 10.0, 600);
        controls.pointer_moved(100.0, 10.0, 600);
        assert!(controls.update(&mut camera));
    }

    #[test]
    fn uniform_layout() {
        let (camera, _) = setup();
        let raw = camera.to_uniform_data((1600, 1200), 2.0);
        assert_eq!(raw[32], 1600.0);
        assert_eq!(raw[33], 1200.0);
        assert_eq!(raw[34], 2.0);
        assert_eq!(&raw[..16], AsRef::<[f32; 16]>::as_ref(&camera.projection_matrix()));
    }
}
