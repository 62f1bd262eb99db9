//! Camera, projection and damped orbit controls.
//!
//! The camera orbits a fixed target point. Dragging adds angular velocity
//! which decays exponentially once input stops, so the view keeps gliding
//! briefly instead of halting dead.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, perspective};
use instant::Duration;
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(position: impl Into<Point3<f32>>, target: impl Into<Point3<f32>>) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: impl Into<Rad<f32>>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Keep the aspect ratio matched to the surface on every resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit control with inertia.
///
/// `damping` is the fraction of angular velocity retained after one second;
/// the decay is applied as `damping^dt` so it is frame-rate independent.
#[derive(Debug)]
pub struct OrbitController {
    pub distance: f32,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
    sensitivity: f32,
    damping: f32,
}

impl OrbitController {
    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
    const MIN_DISTANCE: f32 = 0.2;
    const MAX_DISTANCE: f32 = 50.0;

    pub fn new(sensitivity: f32, damping: f32) -> Self {
        Self {
            distance: 5.0,
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            sensitivity,
            damping,
        }
    }

    /// Derive the orbit pose (distance, yaw, pitch) from an existing camera.
    pub fn from_camera(camera: &Camera, sensitivity: f32, damping: f32) -> Self {
        let offset = camera.position - camera.target;
        let distance = offset.magnitude().max(Self::MIN_DISTANCE);
        let yaw = Rad(offset.z.atan2(offset.x));
        let pitch = Rad((offset.y / distance).clamp(-1.0, 1.0).asin());
        Self {
            distance,
            yaw,
            pitch,
            ..Self::new(sensitivity, damping)
        }
    }

    /// Feed a mouse drag delta into the orbit velocity.
    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.yaw_velocity += mouse_dx as f32 * self.sensitivity;
        self.pitch_velocity += mouse_dy as f32 * self.sensitivity;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let scroll = match delta {
                MouseScrollDelta::LineDelta(_, lines) => *lines,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
            };
            self.zoom_velocity -= scroll * 0.5;
        }
    }

    /// Integrate velocities, apply damping and place the camera on its orbit.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        // Cap the step so a long stall doesn't catapult the camera
        let dt = dt.as_secs_f32().min(0.1);

        self.yaw += Rad(self.yaw_velocity * dt);
        self.pitch = Rad(
            (self.pitch.0 + self.pitch_velocity * dt)
                .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT),
        );
        self.distance = (self.distance * (1.0 + self.zoom_velocity * dt))
            .clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);

        let retain = self.damping.powf(dt);
        self.yaw_velocity *= retain;
        self.pitch_velocity *= retain;
        self.zoom_velocity *= retain;

        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        camera.position = camera.target
            + Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw) * self.distance;
    }

    pub fn angular_speed(&self) -> f32 {
        (self.yaw_velocity * self.yaw_velocity + self.pitch_velocity * self.pitch_velocity).sqrt()
    }
}

/// The camera data the shaders read.
///
/// The inverse view-projection is carried for the background pass, which
/// unprojects screen corners back into world-space view rays.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything camera-related the context owns, GPU side included.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_the_aspect_ratio() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(75.0), 0.1, 100.0);
        projection.resize(1920, 1080);
        assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn orbit_velocity_decays_after_input_stops() {
        let mut camera = Camera::new((-1.0, 2.0, 1.6), (0.0, 0.75, 0.0));
        let mut controller = OrbitController::from_camera(&camera, 0.01, 0.05);
        controller.handle_mouse(40.0, 10.0);
        let initial = controller.angular_speed();
        assert!(initial > 0.0);

        let mut previous = initial;
        for _ in 0..5 {
            controller.update(&mut camera, Duration::from_millis(16));
            let speed = controller.angular_speed();
            assert!(speed < previous, "velocity should decay monotonically");
            previous = speed;
        }
        for _ in 0..1000 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(controller.angular_speed() < initial * 1e-3);
    }

    #[test]
    fn orbit_keeps_the_camera_on_its_sphere() {
        let mut camera = Camera::new((-1.0, 2.0, 1.6), (0.0, 0.75, 0.0));
        let mut controller = OrbitController::from_camera(&camera, 0.01, 0.05);
        let distance = controller.distance;
        controller.handle_mouse(100.0, -30.0);
        for _ in 0..10 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        let offset = camera.position - camera.target;
        assert!((offset.magnitude() - distance).abs() < 1e-3);
    }

    #[test]
    fn from_camera_reproduces_the_initial_pose() {
        let mut camera = Camera::new((-1.0, 2.0, 1.6), (0.0, 0.75, 0.0));
        let before = camera.position;
        let mut controller = OrbitController::from_camera(&camera, 0.01, 0.05);
        controller.update(&mut camera, Duration::from_millis(16));
        let drift = camera.position - before;
        assert!(drift.magnitude() < 1e-3, "unmoved controls should not jump the camera");
    }
}
