//! vitrine
//!
//! An interactive 3D product showcase viewer for native and web targets.
//! The crate loads a textured glTF model together with an HDR environment
//! map, renders it continuously with damped orbit camera controls and plays
//! the model's open/close animation from a small debug panel.
//!
//! High-level modules
//! - `animation`: clip playback control (the open/close state machine)
//! - `camera`: orbit camera, projection and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene data models (meshes, materials, scene graph)
//! - `panel`: the developer-facing action panel
//! - `pipelines`: definitions for the render pipelines (model, environment, panel)
//! - `render`: render composition for efficient pipeline reuse
//! - `resources`: helpers to load textures/models/environments
//! - `viewer`: the application shell and per-frame loop
//!

pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod panel;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
