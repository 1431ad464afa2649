use super::*;
use ember_rhi::ember::Error;
use ember_rhi::render_graph::RenderTarget;
use ember_rhi::resource_table::{TextureDesc, TextureUsage};
use ember_rhi::types::TextureFormat;

fn texture(resources: &mut ResourceTable, name: &str, format: TextureFormat) -> TextureId {
    let usage = if format.is_depth_format() {
        TextureUsage::DepthStencil
    } else {
        TextureUsage::RenderTarget
    };
    resources
        .create_texture(TextureDesc { name: name.to_string(), width: 1024, height: 768, format, usage })
        .unwrap()
}

/// albedo 0, normal 1, depth 2, surface 3
fn deferred_pass(resources: &mut ResourceTable) -> Renderpass {
    let albedo = texture(resources, "albedo", TextureFormat::R8G8B8A8_UNORM);
    let normal = texture(resources, "normal", TextureFormat::R16G16B16A16_SFLOAT);
    let depth = texture(resources, "depth", TextureFormat::D32_FLOAT);
    let surface = texture(resources, "surface", TextureFormat::B8G8R8A8_SRGB);

    let mut pass = Renderpass::new("deferred");
    pass.add_render_target(RenderTarget::color(albedo));
    pass.add_render_target(RenderTarget::color(normal));
    pass.add_render_target(RenderTarget::depth(depth));
    pass.add_render_target(RenderTarget::color(surface));
    pass.add_subpass(Rendersubpass::new("gbuffer").with_render_targets(&[0, 1, 2]).with_depth(true));
    pass.add_subpass(
        Rendersubpass::new("lighting")
            .with_render_targets(&[3])
            .with_rendered_inputs(&[0, 1])
            .as_final(),
    );
    pass
}

fn render(layout: &WgpuPassLayout, index: usize) -> &RenderPassDesc {
    layout.passes[index].as_render().unwrap()
}

fn is_contract<T: std::fmt::Debug>(result: Result<T>) -> bool {
    matches!(result, Err(Error::ContractViolation(_)))
}

// ============================================================================
// Passes
// ============================================================================

#[test]
fn test_one_native_pass_per_subpass() {
    let mut resources = ResourceTable::new();
    let pass = deferred_pass(&mut resources);
    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();

    assert_eq!(layout.passes.len(), 2);
    assert_eq!(layout.render_pass_count(), 2);
    assert_eq!(render(&layout, 0).name, "gbuffer");
    assert_eq!(render(&layout, 1).name, "lighting");
}

#[test]
fn test_attachments_follow_target_indices() {
    let mut resources = ResourceTable::new();
    let pass = deferred_pass(&mut resources);
    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();

    let gbuffer = render(&layout, 0);
    let colors: Vec<u32> = gbuffer.colors.iter().map(|c| c.target).collect();
    assert_eq!(colors, vec![0, 1]);
    assert_eq!(gbuffer.colors[1].texture, pass.render_target(1).unwrap().texture());

    let depth = gbuffer.depth.as_ref().unwrap();
    assert_eq!(depth.target, 2);
    assert!(!depth.stencil);

    let lighting = render(&layout, 1);
    assert_eq!(lighting.colors.len(), 1);
    assert_eq!(lighting.colors[0].target, 3);
    assert!(lighting.depth.is_none());
}

#[test]
fn test_only_final_subpass_is_flagged() {
    let mut resources = ResourceTable::new();
    let pass = deferred_pass(&mut resources);
    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();

    assert!(!render(&layout, 0).is_final);
    assert!(render(&layout, 1).is_final);
}

#[test]
fn test_actions_and_background_are_carried() {
    let mut resources = ResourceTable::new();
    let color = texture(&mut resources, "color", TextureFormat::R8G8B8A8_UNORM);
    let mut pass = Renderpass::new("overlay");
    pass.set_background(Vec4::new(0.1, 0.2, 0.3, 1.0));
    pass.add_render_target(
        RenderTarget::color(color)
            .with_load_action(LoadAction::Load)
            .with_store_action(StoreAction::Discard),
    );
    pass.add_subpass(Rendersubpass::new("ui").with_render_targets(&[0]));

    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();
    let ui = render(&layout, 0);

    assert_eq!(ui.colors[0].load, LoadAction::Load);
    assert_eq!(ui.colors[0].store, StoreAction::Discard);
    assert_eq!(ui.clear, Vec4::new(0.1, 0.2, 0.3, 1.0));
}

#[test]
fn test_stencil_formats_get_stencil_ops() {
    let mut resources = ResourceTable::new();
    let color = texture(&mut resources, "color", TextureFormat::R8G8B8A8_UNORM);
    let depth = texture(&mut resources, "depth", TextureFormat::D24_UNORM_S8_UINT);
    let mut pass = Renderpass::new("stencil");
    pass.add_render_target(RenderTarget::color(color));
    pass.add_render_target(RenderTarget::depth(depth));
    pass.add_subpass(Rendersubpass::new("mask").with_render_targets(&[0, 1]).with_depth(true));

    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();
    assert!(render(&layout, 0).depth.as_ref().unwrap().stencil);
}

// ============================================================================
// Resolve
// ============================================================================

#[test]
fn test_resolve_targets_pair_with_colors() {
    let mut resources = ResourceTable::new();
    let msaa = texture(&mut resources, "msaa", TextureFormat::R8G8B8A8_UNORM);
    let resolved = texture(&mut resources, "resolved", TextureFormat::R8G8B8A8_UNORM);
    let mut pass = Renderpass::new("msaa");
    pass.add_render_target(RenderTarget::color(msaa));
    pass.add_render_target(RenderTarget::new(resolved, RenderTargetType::Resolve));
    pass.add_subpass(Rendersubpass::new("scene").with_render_targets(&[0, 1]));

    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();
    let scene = render(&layout, 0);

    assert_eq!(scene.colors.len(), 1);
    assert_eq!(scene.colors[0].resolve, Some(resolved));
}

#[test]
fn test_resolve_count_mismatch_is_a_contract_violation() {
    let mut resources = ResourceTable::new();
    let a = texture(&mut resources, "a", TextureFormat::R8G8B8A8_UNORM);
    let b = texture(&mut resources, "b", TextureFormat::R8G8B8A8_UNORM);
    let resolved = texture(&mut resources, "resolved", TextureFormat::R8G8B8A8_UNORM);
    let mut pass = Renderpass::new("msaa");
    pass.add_render_target(RenderTarget::color(a));
    pass.add_render_target(RenderTarget::color(b));
    pass.add_render_target(RenderTarget::new(resolved, RenderTargetType::Resolve));
    pass.add_subpass(Rendersubpass::new("scene").with_render_targets(&[0, 1, 2]));

    assert!(is_contract(WgpuPassLayout::compile(&pass, &resources)));
}

// ============================================================================
// Compute
// ============================================================================

#[test]
fn test_compute_subpass_gets_compute_pass() {
    let mut resources = ResourceTable::new();
    let color = texture(&mut resources, "color", TextureFormat::R8G8B8A8_UNORM);
    let mut pass = Renderpass::new("mixed");
    pass.add_render_target(RenderTarget::color(color));
    pass.add_subpass(Rendersubpass::new("cull").with_technique(RenderpassTechnique::Compute));
    pass.add_subpass(Rendersubpass::new("draw").with_render_targets(&[0]));

    let layout = WgpuPassLayout::compile(&pass, &resources).unwrap();

    assert_eq!(layout.passes[0], NativePass::Compute(ComputePassDesc { name: "cull".to_string() }));
    assert!(layout.passes[1].is_render());
    assert_eq!(layout.compute_pass_count(), 1);
    assert_eq!(layout.render_pass_count(), 1);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_target_is_a_contract_violation() {
    let mut resources = ResourceTable::new();
    let color = texture(&mut resources, "color", TextureFormat::R8G8B8A8_UNORM);
    let mut pass = Renderpass::new("broken");
    pass.add_render_target(RenderTarget::color(color));
    pass.add_subpass(Rendersubpass::new("draw").with_render_targets(&[0, 4]));

    assert!(is_contract(WgpuPassLayout::compile(&pass, &resources)));
}

#[test]
fn test_removed_texture_is_an_invalid_resource() {
    let mut resources = ResourceTable::new();
    let pass = deferred_pass(&mut resources);
    resources.remove_texture(pass.render_target(1).unwrap().texture());

    assert!(matches!(WgpuPassLayout::compile(&pass, &resources), Err(Error::InvalidResource(_))));
}
