mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use vitrine::{
        context::Context,
        render::Render,
        viewer::{ImageTestResult, Out, ViewerFlow},
    };
    use wgpu::Color;

    use crate::common::test_utils::{FrameCounter, run_flow};

    struct ClearColourProbe {
        frames: FrameCounter,
    }

    impl ViewerFlow for ClearColourProbe {
        fn on_init(&mut self, ctx: &mut Context) -> Out {
            ctx.clear_colour = Color::WHITE;
            Out::Empty
        }

        fn on_update(&mut self, _: &Context, _: instant::Duration) -> Out {
            Out::Empty
        }

        fn on_render(&self) -> Render<'_> {
            Render::None
        }

        fn render_to_texture(
            &self,
            _: &Context,
            texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error> {
            if self.frames.frame() == 0 {
                // The first capture happens before the surface settles
                self.frames.progress();
                return Ok(ImageTestResult::Waiting);
            }

            let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            let desired_pixel = image::Rgba([
                f_to_u8(Color::WHITE.r),
                f_to_u8(Color::WHITE.g),
                f_to_u8(Color::WHITE.b),
                f_to_u8(Color::WHITE.a),
            ]);
            for pixel in texture.pixels() {
                assert_eq!(*pixel, desired_pixel);
            }
            Ok(ImageTestResult::Passed)
        }
    }

    run_flow(|| {
        Box::new(ClearColourProbe {
            frames: FrameCounter::default(),
        })
    });
}
