#![forbid(unsafe_code)]

//! Front-end validation of the generated compositor WGSL, no GPU needed.
//!
//! These tests verify that:
//! - the injected source parses and passes naga validation
//! - both entry points exist with the expected stages
//! - the six group-0 resources sit at the documented slots
//! - every configuration the config types can express yields valid WGSL

use glyphgrid_core::{AlphaPolicy, AtlasLayout, CompositorConfig, GridDimensions};
use glyphgrid_wgpu::compositor_wgsl;
use glyphgrid_wgpu::shader::{FRAGMENT_ENTRY, VERTEX_ENTRY};
use proptest::prelude::*;

fn parse_and_validate(config: &CompositorConfig) -> naga::Module {
    let source = compositor_wgsl(config);
    let module = match naga::front::wgsl::parse_str(&source) {
        Ok(module) => module,
        Err(err) => panic!("WGSL parse failed:\n{}", err.emit_to_string(&source)),
    };
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(err) = validator.validate(&module) {
        panic!("WGSL validation failed: {err:?}");
    }
    module
}

#[test]
fn default_config_validates() {
    parse_and_validate(&CompositorConfig::default());
}

#[test]
fn entry_points_have_expected_stages() {
    let module = parse_and_validate(&CompositorConfig::default());
    let stage_of = |name: &str| {
        module
            .entry_points
            .iter()
            .find(|ep| ep.name == name)
            .map(|ep| ep.stage)
    };
    assert_eq!(stage_of(VERTEX_ENTRY), Some(naga::ShaderStage::Vertex));
    assert_eq!(stage_of(FRAGMENT_ENTRY), Some(naga::ShaderStage::Fragment));
}

#[test]
fn resources_sit_at_documented_slots() {
    let module = parse_and_validate(&CompositorConfig::default());
    let mut slots: Vec<(u32, String)> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let binding = var.binding.as_ref()?;
            assert_eq!(binding.group, 0);
            Some((binding.binding, var.name.clone().unwrap_or_default()))
        })
        .collect();
    slots.sort();
    let names: Vec<&str> = slots.iter().map(|(_, n)| n.as_str()).collect();
    assert_eq!(
        names,
        ["glyph_atlas", "grid_sampler", "index_map", "fg_map", "bg_map", "set_map"]
    );
    let bindings: Vec<u32> = slots.iter().map(|(b, _)| *b).collect();
    assert_eq!(bindings, [0, 1, 2, 3, 4, 5]);
}

#[test]
fn every_alpha_policy_validates() {
    for alpha in [AlphaPolicy::Sum, AlphaPolicy::Clamped, AlphaPolicy::Max] {
        parse_and_validate(&CompositorConfig::default().with_alpha(alpha));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_geometry_validates(
        cols in 1u16..=u16::MAX,
        rows in 1u16..=u16::MAX,
        atlas_cols in 1u16..=256,
        atlas_rows in 1u16..=256,
    ) {
        let config = CompositorConfig::new(GridDimensions::new(cols, rows).unwrap())
            .with_atlas(AtlasLayout::new(atlas_cols, atlas_rows).unwrap());
        parse_and_validate(&config);
    }
}
