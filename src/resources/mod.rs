use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
};

use log::warn;

use crate::{
    data_structures::{
        model,
        scene_graph::{
            AnimationClip, ContainerNode, Keyframes, SceneNode, find_node_mut, to_scene_node,
        },
        texture::Texture,
    },
    resources::texture::{AssetRoot, diffuse_normal_layout, load_binary, load_texture},
};

/**
 * This module contains all logic for loading meshes/textures/environments
 * from external files.
 */
pub mod environment;
pub mod mesh;
pub mod texture;

/// Resolve `uri` next to `file_name`, keeping forward slashes so the result
/// works both as a filesystem path and as a URL path.
fn sibling(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    }
}

/// Load a glTF scene: buffers, materials, animations and the node tree.
///
/// Buffer and image URIs are fetched relative to the glTF file itself.
/// Compressed buffer payloads are decoded by the glTF reader; there is no
/// separate decoder to configure beyond the [`AssetRoot`].
pub async fn load_model_gltf(
    assets: &AssetRoot,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_text = load_binary(assets, file_name).await?;
    let gltf_cursor = Cursor::new(gltf_text);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(assets, &sibling(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load animations, grouped by the node they target
    let mut animations: HashMap<usize, Vec<AnimationClip>> = HashMap::new();
    for animation in gltf.animations() {
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let timestamps = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) => {
                    warn!("sparse animation inputs are not supported, channel {} will not animate", channel.index());
                    Vec::new()
                }
                None => {
                    warn!("no animation inputs in channel {}", channel.index());
                    Vec::new()
                }
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    Keyframes::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
                None => {
                    warn!("no keyframes in channel {}", channel.index());
                    Keyframes::Other
                }
            };
            let name = animation.name().unwrap_or("Default").to_string();
            let clip = AnimationClip {
                name,
                keyframes,
                timestamps,
            };
            animations
                .entry(channel.target().node().index())
                .or_default()
                .push(clip);
        }
    }

    // Load materials
    let layout = diffuse_normal_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let name = material.name().unwrap_or(file_name);
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture().map(|t| t.texture().source().source()) {
            Some(gltf::image::Source::View { view, mime_type }) => Texture::from_bytes(
                device,
                queue,
                &buffer_data[view.buffer().index()],
                name,
                mime_type.split('/').next_back(),
                false,
            )?,
            Some(gltf::image::Source::Uri { uri, mime_type }) => {
                load_texture(
                    assets,
                    &sibling(file_name, uri),
                    false,
                    device,
                    queue,
                    mime_type.and_then(|mt| mt.split('/').next_back()),
                )
                .await?
            }
            None => {
                // Untextured material; the base color factor approximates it
                let [r, g, b, a] = pbr.base_color_factor();
                let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                Texture::create_solid(
                    1,
                    1,
                    [to_u8(r), to_u8(g), to_u8(b), to_u8(a)],
                    device,
                    queue,
                    name,
                )
            }
        };
        let normal_texture = match material.normal_texture().map(|t| t.texture().source().source()) {
            Some(gltf::image::Source::View { view, mime_type }) => Texture::from_bytes(
                device,
                queue,
                &buffer_data[view.buffer().index()],
                name,
                mime_type.split('/').next_back(),
                true,
            )?,
            Some(gltf::image::Source::Uri { uri, mime_type }) => {
                load_texture(
                    assets,
                    &sibling(file_name, uri),
                    true,
                    device,
                    queue,
                    mime_type.and_then(|mt| mt.split('/').next_back()),
                )
                .await?
            }
            None => Texture::create_default_normal_map(2, 2, device, queue),
        };
        materials.push(model::Material::new(
            device,
            name,
            diffuse_texture,
            normal_texture,
            &layout,
        ));
    }
    if materials.is_empty() {
        // Meshes always index a material, so provide a plain white one
        let diffuse = Texture::create_solid(1, 1, [255; 4], device, queue, "default material");
        let normal = Texture::create_default_normal_map(2, 2, device, queue);
        materials.push(model::Material::new(
            device,
            "default material",
            diffuse,
            normal,
            &layout,
        ));
    }

    let mut models = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            let model = to_scene_node(node, &buffer_data, device, &materials, &animations);
            models.push(model);
        }
    }

    let root_node = if models.len() == 1 {
        models.into_iter().next().unwrap()
    } else {
        let mut root_node = ContainerNode::new(file_name, Vec::new());
        root_node.children = models;
        Box::new(root_node)
    };

    Ok(root_node)
}

/// Bind a pre-loaded diffuse texture onto the named node's materials.
///
/// A missing node is tolerated (placeholder assets are allowed to drop
/// meshes) but surfaced as a warning. Returns whether anything was bound.
pub fn bind_diffuse_texture(
    device: &wgpu::Device,
    root: &mut (dyn SceneNode + '_),
    node_name: &str,
    texture: Texture,
) -> bool {
    let layout = diffuse_normal_layout(device);
    match find_node_mut(root, node_name) {
        Some(node) => {
            let bound = node.set_diffuse_texture(device, &layout, texture);
            if !bound {
                warn!("node {} has no material to bind a texture to", node_name);
            }
            bound
        }
        None => {
            warn!(
                "expected node {} is missing from the loaded scene, skipping its texture",
                node_name
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uris_resolve_next_to_the_gltf_file() {
        assert_eq!(
            sibling("models/cs_stkr/cs_stkr.gltf", "cs_stkr.bin"),
            "models/cs_stkr/cs_stkr.bin"
        );
        assert_eq!(sibling("scene.gltf", "scene.bin"), "scene.bin");
    }
}
