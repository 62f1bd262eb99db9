//! Definitions for the render pipelines (model, environment, panel).

pub mod environment;
pub mod light;
pub mod model;
pub mod panel;

/// All pipelines the viewer renders with, created once at startup.
#[derive(Debug)]
pub struct Pipelines {
    pub model: wgpu::RenderPipeline,
    pub environment: wgpu::RenderPipeline,
    pub panel: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            model: model::mk_model_pipeline(
                device,
                config,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            environment: environment::mk_environment_pipeline(
                device,
                config,
                camera_bind_group_layout,
            ),
            panel: panel::mk_panel_pipeline(device, config),
        }
    }
}
