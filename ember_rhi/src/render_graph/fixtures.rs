//! Render graph fixtures for unit tests

use crate::buffers::{BuffersFormat, EXAMPLE_CONFIG};
use crate::context::RhiContext;
use crate::resource_table::{TextureDesc, TextureId, TextureUsage};
use crate::types::TextureFormat;
use super::{RenderTarget, Renderpass, Rendersubpass};

pub(crate) fn context() -> RhiContext {
    let format = BuffersFormat::from_json(EXAMPLE_CONFIG).unwrap();
    RhiContext::from_format(&format).unwrap()
}

pub(crate) fn texture(ctx: &mut RhiContext, name: &str, format: TextureFormat) -> TextureId {
    let usage = if format.is_depth_format() {
        TextureUsage::DepthStencil
    } else {
        TextureUsage::SampledAndRenderTarget
    };
    ctx.resources_mut()
        .create_texture(TextureDesc {
            name: name.to_string(),
            width: 1024,
            height: 768,
            format,
            usage,
        })
        .unwrap()
}

/// Targets of the deferred pass: albedo 0, normal 1, depth 2, surface 3
pub(crate) fn deferred_targets(ctx: &mut RhiContext, pass: &mut Renderpass) {
    let albedo = texture(ctx, "albedo", TextureFormat::R8G8B8A8_UNORM);
    let normal = texture(ctx, "normal", TextureFormat::R16G16B16A16_SFLOAT);
    let depth = texture(ctx, "depth", TextureFormat::D32_FLOAT);
    let surface = texture(ctx, "surface", TextureFormat::B8G8R8A8_SRGB);

    pass.add_render_target(RenderTarget::color(albedo));
    pass.add_render_target(RenderTarget::color(normal));
    pass.add_render_target(RenderTarget::depth(depth));
    pass.add_render_target(RenderTarget::color(surface));
}

/// G-buffer fill then a lighting subpass reading it into the surface
pub(crate) fn deferred_pass(ctx: &mut RhiContext) -> Renderpass {
    let mut pass = Renderpass::new("deferred");
    deferred_targets(ctx, &mut pass);
    pass.add_subpass(
        Rendersubpass::new("gbuffer")
            .with_render_targets(&[0, 1, 2])
            .with_depth(true),
    );
    pass.add_subpass(
        Rendersubpass::new("lighting")
            .with_render_targets(&[3])
            .with_input_attachments(&[0, 1])
            .as_final(),
    );
    pass
}
