//! Developer-facing debug panel.
//!
//! A vertical stack of named, zero-argument actions drawn as flat quads in
//! the top-right corner of the surface. Hit-testing happens in surface
//! coordinates on click; rendering goes through the overlay pipeline.

use log::info;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalPosition;

use crate::{
    pipelines::panel::PanelVertex,
    render::{Flat, Render},
};

/// Handle returned by [`Panel::add_action`]; compare against hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionId(usize);

#[derive(Debug)]
struct Button {
    name: String,
    /// x, y, width, height in [0, 1] surface coordinates, origin top-left.
    rect: [f32; 4],
}

/// The control surface itself: an ordered action list plus its GPU quads.
#[derive(Debug, Default)]
pub struct Panel {
    buttons: Vec<Button>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: usize,
}

const MARGIN: f32 = 0.02;
const BUTTON_WIDTH: f32 = 0.22;
const BUTTON_HEIGHT: f32 = 0.05;
const BUTTON_GAP: f32 = 0.012;

const BUTTON_COLORS: [[f32; 4]; 2] = [
    [0.18, 0.55, 0.34, 0.85],
    [0.72, 0.29, 0.25, 0.85],
];

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named action and rebuild the quad buffers.
    pub fn add_action(&mut self, device: &wgpu::Device, name: &str) -> ActionId {
        let index = self.buttons.len();
        let x = 1.0 - MARGIN - BUTTON_WIDTH;
        let y = MARGIN + index as f32 * (BUTTON_HEIGHT + BUTTON_GAP);
        self.buttons.push(Button {
            name: name.to_string(),
            rect: [x, y, BUTTON_WIDTH, BUTTON_HEIGHT],
        });
        self.rebuild(device);
        ActionId(index)
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn action_name(&self, id: ActionId) -> Option<&str> {
        self.buttons.get(id.0).map(|button| button.name.as_str())
    }

    /// Hit-test a cursor position (in surface pixels) against the buttons.
    ///
    /// A hit is logged with the action name so panel usage shows up in the
    /// viewer logs.
    pub fn hit(&self, position: PhysicalPosition<f64>, width: u32, height: u32) -> Option<ActionId> {
        if width == 0 || height == 0 {
            return None;
        }
        let x = (position.x / width as f64) as f32;
        let y = (position.y / height as f64) as f32;
        for (index, button) in self.buttons.iter().enumerate() {
            let [bx, by, bw, bh] = button.rect;
            if x >= bx && x <= bx + bw && y >= by && y <= by + bh {
                info!("panel action invoked: {}", button.name);
                return Some(ActionId(index));
            }
        }
        None
    }

    fn rebuild(&mut self, device: &wgpu::Device) {
        let mut vertices: Vec<PanelVertex> = Vec::with_capacity(self.buttons.len() * 4);
        let mut indices: Vec<u16> = Vec::with_capacity(self.buttons.len() * 6);

        for (i, button) in self.buttons.iter().enumerate() {
            let [x, y, w, h] = button.rect;
            let color = BUTTON_COLORS[i % BUTTON_COLORS.len()];
            let corners = [
                [x, y],
                [x + w, y],
                [x + w, y + h],
                [x, y + h],
            ];
            let base = vertices.len() as u16;
            for [cx, cy] in corners {
                vertices.push(PanelVertex {
                    // top-left surface coordinates to NDC
                    position: [cx * 2.0 - 1.0, 1.0 - cy * 2.0],
                    color,
                });
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }

        self.vertex_buffer = Some(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Panel Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));
        self.index_buffer = Some(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Panel Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
        self.index_count = indices.len();
    }

    pub fn get_render(&self) -> Render<'_> {
        match (&self.vertex_buffer, &self.index_buffer) {
            (Some(vertex), Some(index)) => Render::GUI(Flat {
                vertex,
                index,
                amount: self.index_count,
            }),
            _ => Render::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with(names: &[&str]) -> Panel {
        let buttons = names
            .iter()
            .enumerate()
            .map(|(i, name)| Button {
                name: name.to_string(),
                rect: [
                    1.0 - MARGIN - BUTTON_WIDTH,
                    MARGIN + i as f32 * (BUTTON_HEIGHT + BUTTON_GAP),
                    BUTTON_WIDTH,
                    BUTTON_HEIGHT,
                ],
            })
            .collect();
        Panel {
            buttons,
            ..Panel::default()
        }
    }

    #[test]
    fn clicks_inside_a_button_resolve_to_its_action() {
        let panel = panel_with(&["Open Display", "Close Display"]);
        // centre of the first button on a 1000x800 surface
        let x = (1.0 - MARGIN - BUTTON_WIDTH / 2.0) as f64 * 1000.0;
        let y = (MARGIN + BUTTON_HEIGHT / 2.0) as f64 * 800.0;
        let id = panel.hit(PhysicalPosition::new(x, y), 1000, 800).unwrap();
        assert_eq!(panel.action_name(id), Some("Open Display"));

        let y2 = (MARGIN + BUTTON_HEIGHT + BUTTON_GAP + BUTTON_HEIGHT / 2.0) as f64 * 800.0;
        let id2 = panel.hit(PhysicalPosition::new(x, y2), 1000, 800).unwrap();
        assert_eq!(panel.action_name(id2), Some("Close Display"));
    }

    #[test]
    fn clicks_outside_the_panel_miss() {
        let panel = panel_with(&["Open Display"]);
        assert!(panel.hit(PhysicalPosition::new(10.0, 700.0), 1000, 800).is_none());
    }

    #[test]
    fn degenerate_surfaces_never_hit() {
        let panel = panel_with(&["Open Display"]);
        assert!(panel.hit(PhysicalPosition::new(0.0, 0.0), 0, 0).is_none());
    }
}
