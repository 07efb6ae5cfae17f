#![forbid(unsafe_code)]

//! End-to-end tests: producer API → attribute maps → software compositor.
//!
//! These tests validate that:
//! - UVs at the quad corners resolve to the first and last grid cells
//! - glyph indices address the expected atlas cells
//! - atlas cells tile the layer without overlap
//! - text written through the producer API renders with its colours
//! - the set map selects atlas layers

use glyphgrid_core::compositor::{CompositorTextures, trace_fragment};
use glyphgrid_core::{
    AlphaPolicy, AtlasLayout, AttributeMaps, CellCoord, CellStyle, CompositorConfig, GlyphAtlas,
    GlyphIndex, GridDimensions, LayerIndex, Rgba8, SoftwareRenderer, SoftwareTextures,
    TextBuilder, cp437, palette,
};
use tracing::{Level, info};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::INFO)
        .try_init();
}

/// 16×16 layout of 4×4-pixel cells. Glyph `g` on layer `l` is solid ink with
/// colour `(g, l * 100, 255)`, except glyph 0 which is empty.
fn coded_atlas(layers: usize) -> GlyphAtlas {
    GlyphAtlas::from_fn(4, 4, layers, AtlasLayout::CP437, |layer, glyph, _, _| {
        if glyph == 0 {
            Rgba8::TRANSPARENT
        } else {
            Rgba8::rgba(glyph as u8, layer as u8 * 100, 255, 255)
        }
    })
    .unwrap()
}

#[test]
fn corner_uvs_resolve_to_first_and_last_cell() {
    init_tracing();
    let grid = GridDimensions::TERMINAL_80X24;
    assert_eq!(grid.locate([0.0, 0.0]).cell, CellCoord::new(0, 0));
    assert_eq!(grid.locate([1.0, 1.0]).cell, CellCoord::new(79, 23));
}

#[test]
fn glyph_65_samples_its_atlas_cell() {
    init_tracing();
    let grid = GridDimensions::TERMINAL_80X24;
    let mut maps = AttributeMaps::new(grid, 1).unwrap();
    maps.set_char_at(10, 5, 'A');
    maps.set_fg_at(10, 5, palette::WHITE);
    let atlas = coded_atlas(1);
    let config = CompositorConfig::new(grid);
    let textures = SoftwareTextures::new(&maps, &atlas);

    let uv = grid.cell_center_uv(CellCoord::new(10, 5));
    let trace = trace_fragment(&config, &textures, uv);
    info!(glyph = trace.glyph.0, atlas_u = trace.atlas_uv[0], atlas_v = trace.atlas_uv[1], "traced fragment");
    assert_eq!(trace.glyph, GlyphIndex(65));
    assert_eq!(AtlasLayout::CP437.cell_origin(trace.glyph), [1.0 / 16.0, 4.0 / 16.0]);
    assert_eq!(trace.output.to_rgba8(), Rgba8::rgba(65, 0, 255, 255));
    assert_eq!(textures.sample_index(uv), 65.0 / 255.0);
}

#[test]
fn atlas_cells_tile_the_layer() {
    let layout = AtlasLayout::CP437;
    let regions: Vec<_> = (0..=255u8).map(|g| layout.glyph_region(GlyphIndex(g))).collect();
    let mut area = 0.0f64;
    for (i, (min, max)) in regions.iter().enumerate() {
        assert!(min[0] >= 0.0 && min[1] >= 0.0 && max[0] <= 1.0 && max[1] <= 1.0);
        area += f64::from(max[0] - min[0]) * f64::from(max[1] - min[1]);
        for (other_min, other_max) in &regions[i + 1..] {
            let overlap_x = min[0] < other_max[0] && other_min[0] < max[0];
            let overlap_y = min[1] < other_max[1] && other_min[1] < max[1];
            assert!(!(overlap_x && overlap_y), "glyph {i} overlaps another cell");
        }
    }
    assert!((area - 1.0).abs() < 1e-9);
}

#[test]
fn printed_text_renders_with_colours() {
    init_tracing();
    let grid = GridDimensions::new(8, 2).unwrap();
    let mut maps = AttributeMaps::new(grid, 1).unwrap();
    TextBuilder::new()
        .fg(palette::YELLOW)
        .bg(palette::BLACK)
        .text("Hi")
        .print(&mut maps, (0, 0), 7, 0)
        .unwrap();
    maps.draw_rect(0, 1, 8, 1, true, &CellStyle::new().bg(palette::CYAN))
        .unwrap();

    let atlas = coded_atlas(1);
    let fb = SoftwareRenderer::new(CompositorConfig::new(grid))
        .render(&maps, &atlas, 32, 8)
        .unwrap();

    // 'H' is 0x48: glyph texel (72, 0, 255) tinted yellow -> (72, 0, 0).
    let h = fb.pixel(1, 1).unwrap().to_rgba8();
    assert_eq!(h, Rgba8::rgba(72, 0, 0, 255));
    // Blank cell on row 0: transparent background, no ink.
    assert_eq!(fb.pixel(30, 1).unwrap().to_rgba8(), Rgba8::TRANSPARENT);
    // Row 1 is cyan background with glyph 0.
    assert_eq!(fb.pixel(20, 6).unwrap().to_rgba8(), palette::CYAN);
    info!(pixels = fb.pixels().len(), "rendered text frame");
}

#[test]
fn set_map_selects_atlas_layer() {
    init_tracing();
    let grid = GridDimensions::new(2, 1).unwrap();
    let mut maps = AttributeMaps::new(grid, 3).unwrap();
    maps.print_at(0, 0, "##", Some(palette::WHITE), None);
    maps.set_set_at(1, 0, LayerIndex(2)).unwrap();

    let atlas = coded_atlas(3);
    let fb = SoftwareRenderer::new(CompositorConfig::new(grid))
        .render(&maps, &atlas, 8, 4)
        .unwrap();
    let hash = cp437::encode('#').unwrap();
    assert_eq!(fb.pixel(1, 1).unwrap().to_rgba8(), Rgba8::rgba(hash, 0, 255, 255));
    assert_eq!(fb.pixel(6, 1).unwrap().to_rgba8(), Rgba8::rgba(hash, 200, 255, 255));
}

#[test]
fn alpha_policy_changes_only_alpha() {
    let grid = GridDimensions::new(1, 1).unwrap();
    let mut maps = AttributeMaps::new(grid, 1).unwrap();
    maps.set_glyph_at(0, 0, GlyphIndex(1));
    maps.set_fg_at(0, 0, palette::WHITE);
    maps.set_bg_at(0, 0, Rgba8::rgba(0, 0, 0, 128));
    let atlas = GlyphAtlas::from_fn(1, 1, 1, AtlasLayout::CP437, |_, _, _, _| {
        Rgba8::rgba(255, 255, 255, 64)
    })
    .unwrap();

    let render = |alpha| {
        SoftwareRenderer::new(CompositorConfig::new(grid).with_alpha(alpha))
            .render(&maps, &atlas, 1, 1)
            .unwrap()
            .pixel(0, 0)
            .unwrap()
    };
    let sum = render(AlphaPolicy::Sum);
    let max = render(AlphaPolicy::Max);
    assert_eq!([sum.r, sum.g, sum.b], [max.r, max.g, max.b]);
    assert!((sum.a - (64.0 + 128.0) / 255.0).abs() < 1e-6);
    assert!((max.a - 128.0 / 255.0).abs() < 1e-6);
}

#[cfg(feature = "serde")]
#[test]
fn config_roundtrips_through_json() {
    let config = CompositorConfig::new(GridDimensions::new(40, 12).unwrap())
        .with_atlas(AtlasLayout::new(32, 8).unwrap())
        .with_alpha(AlphaPolicy::Clamped);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"clamped\""));
    let back: CompositorConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[cfg(feature = "serde")]
#[test]
fn zero_grid_is_rejected_on_deserialize() {
    assert!(serde_json::from_str::<GridDimensions>("[0, 24]").is_err());
    assert!(serde_json::from_str::<AtlasLayout>("[16, 0]").is_err());
    let grid: GridDimensions = serde_json::from_str("[80, 24]").unwrap();
    assert_eq!(grid, GridDimensions::TERMINAL_80X24);
}
