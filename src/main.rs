//! The showcase application: one product display in a vitrine.
//!
//! Loads the display model, its two override textures and the environment
//! map, then hands the assembled scene to the viewer shell. The debug panel
//! exposes the hinge animation as "Open Display" / "Close Display".

use instant::Duration;
use log::{error, warn};
use winit::event::{MouseButton, WindowEvent};

use vitrine::{
    animation::ClipAction,
    camera::OrbitController,
    context::{Context, InitContext},
    data_structures::{instance::Instance, scene_graph::SceneNode},
    panel::{ActionId, Panel},
    render::Render,
    resources::{
        bind_diffuse_texture,
        environment::{Environment, load_environment},
        load_model_gltf,
        texture::load_texture,
    },
    viewer::{FlowConstructor, Out, ViewerFlow, run},
};

const MODEL_PATH: &str = "models/cs_stkr/cs_stkr.gltf";
const HEADER_TEXTURE_PATH: &str = "models/cs_stkr/cs_stkr_header.jpg";
const BODY_TEXTURE_PATH: &str = "models/cs_stkr/cs_stkr_body.jpg";
const ENVIRONMENT_PATH: &str = "hdri/rostock_laage_airport_1k.hdr";

// Node names are a contract with the asset; missing ones are tolerated
const HEADER_NODE: &str = "cs_stkr_header";
const BODY_NODE: &str = "cs_stkr_body";

struct Showcase {
    scene: Option<Box<dyn SceneNode>>,
    action: Option<ClipAction>,
    panel: Panel,
    environment: Option<Environment>,
    open_action: Option<ActionId>,
    close_action: Option<ActionId>,
}

impl Showcase {
    async fn new(ctx: InitContext) -> Self {
        // All loads resolve together before anything gets bound, so mesh and
        // texture arrival order cannot race.
        let (scene, header, body, environment) = futures::join!(
            load_model_gltf(&ctx.assets, MODEL_PATH, &ctx.device, &ctx.queue),
            load_texture(
                &ctx.assets,
                HEADER_TEXTURE_PATH,
                false,
                &ctx.device,
                &ctx.queue,
                Some("jpg"),
            ),
            load_texture(
                &ctx.assets,
                BODY_TEXTURE_PATH,
                false,
                &ctx.device,
                &ctx.queue,
                Some("jpg"),
            ),
            load_environment(&ctx.assets, ENVIRONMENT_PATH, &ctx.device, &ctx.queue),
        );

        let mut scene = scene
            .map_err(|e| error!("showcase model failed to load, the scene stays empty: {e:?}"))
            .ok();

        if let Some(root) = scene.as_deref_mut() {
            for (node, texture) in [(HEADER_NODE, header), (BODY_NODE, body)] {
                match texture {
                    Ok(texture) => {
                        bind_diffuse_texture(&ctx.device, root, node, texture);
                    }
                    Err(e) => warn!("texture for {} failed to load and stays unbound: {:?}", node, e),
                }
            }
            // Pose the hierarchy before the first frame
            root.update_world_transforms(&Instance::default());
            root.write_to_buffers(&ctx.queue);
        }

        let action = scene.as_deref().and_then(ClipAction::new);
        let environment = environment
            .map_err(|e| warn!("environment map failed to load, continuing without it: {:?}", e))
            .ok();

        let mut panel = Panel::new();
        let (open_action, close_action) = match action {
            // No clip, no controls
            None => (None, None),
            Some(_) => (
                Some(panel.add_action(&ctx.device, "Open Display")),
                Some(panel.add_action(&ctx.device, "Close Display")),
            ),
        };

        Self {
            scene,
            action,
            panel,
            environment,
            open_action,
            close_action,
        }
    }
}

impl ViewerFlow for Showcase {
    fn on_init(&mut self, ctx: &mut Context) -> Out {
        // Camera framing of the product, orbiting the display's centre
        ctx.camera.camera.position = (-1.0, 2.0, 1.6).into();
        ctx.camera.camera.target = (0.0, 0.75, 0.0).into();
        ctx.camera.controller = OrbitController::from_camera(&ctx.camera.camera, 0.004, 0.05);

        // A faint key light; most illumination comes from the environment
        ctx.light.uniform.position = [1.0, 1.0, 1.0];
        ctx.light.uniform.color = [0.1, 0.1, 0.1];
        ctx.light.write(&ctx.queue);

        if let Some(environment) = self.environment.take() {
            ctx.set_environment(environment);
        }
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent) -> Out {
        if let WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } = event
        {
            if state.is_pressed() {
                let hit = self
                    .panel
                    .hit(ctx.mouse.coords, ctx.config.width, ctx.config.height);
                if let (Some(hit), Some(action)) = (hit, self.action.as_mut()) {
                    if Some(hit) == self.open_action {
                        action.open();
                    } else if Some(hit) == self.close_action {
                        action.close();
                    }
                }
            }
        }
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, dt: Duration) -> Out {
        if let (Some(action), Some(scene)) = (self.action.as_mut(), self.scene.as_deref_mut()) {
            action.advance(dt);
            action.apply(scene);
            scene.write_to_buffers(&ctx.queue);
        }
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        let mut renders = Vec::new();
        if let Some(scene) = self.scene.as_deref() {
            renders.push(Render::from(scene));
        }
        renders.push(self.panel.get_render());
        Render::Composed(renders)
    }
}

fn main() {
    let showcase: FlowConstructor = Box::new(|ctx| {
        Box::pin(async move { Box::new(Showcase::new(ctx).await) as Box<dyn ViewerFlow> })
    });

    if let Err(e) = run(vec![showcase]) {
        error!("viewer exited with an error: {}", e);
    }
}
