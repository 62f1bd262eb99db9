//! High-dynamic-range environment maps.
//!
//! The environment image doubles as scene background (sampled by view
//! direction in the background pass) and as ambient light source: its average
//! radiance feeds the ambient term of the light uniform.

use image::{DynamicImage, ImageFormat};

use crate::{
    data_structures::texture::Texture,
    resources::texture::{AssetRoot, load_binary},
};

/// A decoded equirectangular environment map, ready to bind.
#[derive(Debug)]
pub struct Environment {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
    /// Average radiance of the map, tonemapped into [0, 1].
    pub ambient: [f32; 3],
}

pub fn environment_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("environment_bind_group_layout"),
    })
}

/// Fetch and decode a `.hdr` image into an environment map.
///
/// Radiance values are Reinhard-tonemapped into an 8-bit sRGB texture so the
/// map stays samplable on WebGL2-class targets.
pub async fn load_environment(
    assets: &AssetRoot,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Environment> {
    let bytes = load_binary(assets, file_name).await?;
    let rgb = image::load_from_memory_with_format(&bytes, ImageFormat::Hdr)?.to_rgb32f();
    let (width, height) = rgb.dimensions();

    let mut sum = [0.0f64; 3];
    for pixel in rgb.pixels() {
        sum[0] += pixel[0] as f64;
        sum[1] += pixel[1] as f64;
        sum[2] += pixel[2] as f64;
    }
    let count = (width as f64 * height as f64).max(1.0);
    let ambient = [
        tonemap((sum[0] / count) as f32),
        tonemap((sum[1] / count) as f32),
        tonemap((sum[2] / count) as f32),
    ];

    let mut rgba = image::RgbaImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        rgba.put_pixel(
            x,
            y,
            image::Rgba([
                encode(pixel[0]),
                encode(pixel[1]),
                encode(pixel[2]),
                255,
            ]),
        );
    }

    let texture = Texture::from_image(
        device,
        queue,
        &DynamicImage::ImageRgba8(rgba),
        Some(file_name),
        false,
    )?;

    let layout = environment_layout(device);
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(texture.sampler.as_ref().unwrap()),
            },
        ],
        label: Some("environment_bind_group"),
    });

    Ok(Environment {
        texture,
        bind_group,
        ambient,
    })
}

/// Reinhard operator: maps [0, inf) radiance into [0, 1).
fn tonemap(radiance: f32) -> f32 {
    let radiance = radiance.max(0.0);
    radiance / (1.0 + radiance)
}

/// Tonemap and gamma-encode one channel for storage in an sRGB texture.
fn encode(radiance: f32) -> u8 {
    (tonemap(radiance).powf(1.0 / 2.2) * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonemap_stays_within_unit_range() {
        assert_eq!(tonemap(0.0), 0.0);
        assert!(tonemap(1.0) > 0.0 && tonemap(1.0) < 1.0);
        assert!(tonemap(1e6) < 1.0);
        assert_eq!(tonemap(-1.0), 0.0);
    }

    #[test]
    fn encode_is_monotonic() {
        assert_eq!(encode(0.0), 0);
        assert!(encode(0.5) < encode(2.0));
        assert!(encode(1e6) <= 255);
    }
}
