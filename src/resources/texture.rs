use crate::data_structures::texture;

/// Root location all asset paths are resolved against.
///
/// Native builds read from this directory on disk; wasm builds fetch from
/// the same path below the page origin. Configuring the root up front is the
/// only knob the loaders have, everything else is derived from it.
#[derive(Clone, Debug)]
pub struct AssetRoot {
    root: String,
}

impl Default for AssetRoot {
    fn default() -> Self {
        Self::new("assets")
    }
}

impl AssetRoot {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn resolve(&self, file_name: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.root).join(file_name)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn format_url(&self, file_name: &str) -> reqwest::Url {
        let window = web_sys::window().unwrap();
        let origin = window.location().origin().unwrap();
        let base = reqwest::Url::parse(&format!("{}/{}/", origin, self.root)).unwrap();
        base.join(file_name).unwrap()
    }
}

pub async fn load_binary(assets: &AssetRoot, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = assets.format_url(file_name);
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(assets.resolve(file_name)).await?;

    Ok(data)
}

pub async fn load_texture(
    assets: &AssetRoot,
    file_name: &str,
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(assets, file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, format, is_normal_map)
}

/// The bind group layout every material bakes its diffuse/normal pair into.
pub fn diffuse_normal_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Model texture_bind_group_layout"),
    })
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_beneath_the_root() {
        let assets = AssetRoot::new("assets");
        assert_eq!(
            assets.resolve("models/cs_stkr/cs_stkr.gltf"),
            std::path::Path::new("assets/models/cs_stkr/cs_stkr.gltf")
        );
    }

    #[test]
    fn default_root_is_assets() {
        assert_eq!(AssetRoot::default().resolve("x"), std::path::Path::new("assets/x"));
    }
}
