//! Render composition and pipeline batching.
//!
//! Flows describe what to draw by returning a [`Render`]; the viewer shell
//! sorts the pieces into per-pipeline batches so pipeline switches happen
//! once per frame instead of once per object.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] carries data for instanced 3D rendering (model + instance buffer)
//! - [`Flat<'a>`] carries data for flat overlay rendering (vertex + index buffers)

use crate::data_structures::{model::Model, scene_graph::SceneNode};

/// Data for instanced object rendering: a model and its instance buffer.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// Data for flat overlay rendering (the debug panel).
pub struct Flat<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub amount: usize,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single opaque instanced object
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque instanced objects
/// - `GUI(Flat)` renders a 2D overlay element
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    GUI(Flat<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Sort this render into the per-pipeline batches.
    pub(crate) fn batch(self, models: &mut Vec<Instanced<'a>>, overlays: &mut Vec<Flat<'a>>) {
        match self {
            Render::Default(instanced) => models.push(instanced),
            Render::Defaults(mut vec) => models.append(&mut vec),
            Render::GUI(flat) => overlays.push(flat),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.batch(models, overlays)),
            Render::None => (),
        }
    }
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(node: &'a dyn SceneNode) -> Self {
        Render::Defaults(node.get_render())
    }
}
