//! Property-based invariant tests for the glyph compositor math.
//!
//! These tests verify invariants that must hold for **any** grid size, atlas
//! layout, UV and attribute contents:
//!
//! 1. In-cell fraction is always in `[0, 1)`.
//! 2. The resolved cell is always inside the grid.
//! 3. Cell centres resolve to their own cell.
//! 4. Glyph and layer bytes survive unorm encoding exactly.
//! 5. Atlas UVs stay inside the glyph's atlas region.
//! 6. Zero glyph alpha yields the background colour exactly.
//! 7. Full glyph alpha yields `glyph * fg` exactly.
//! 8. Alpha policies: Sum adds, Clamped never exceeds 1, Max dominates both.
//! 9. Out-of-grid writes never touch the planes.
//! 10. Snapshot then apply at the same origin is the identity.
//! 11. Software rendering an empty atlas shows only backgrounds.

use glyphgrid_core::compositor::{AlphaPolicy, blend};
use glyphgrid_core::{
    AtlasLayout, AttributeMaps, CellCoord, CompositorConfig, GlyphAtlas, GlyphIndex,
    GridDimensions, LayerIndex, Rgba, Rgba8, SoftwareRenderer, UnormChannel,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn grid_strategy() -> impl Strategy<Value = GridDimensions> {
    (1u16..=200, 1u16..=100).prop_map(|(c, r)| GridDimensions::new(c, r).unwrap())
}

fn layout_strategy() -> impl Strategy<Value = AtlasLayout> {
    prop_oneof![
        Just(AtlasLayout::CP437),
        (1u16..=64, 1u16..=64).prop_map(|(c, r)| AtlasLayout::new(c, r).unwrap()),
    ]
}

fn unit() -> impl Strategy<Value = f32> {
    0.0f32..=1.0
}

fn fraction() -> impl Strategy<Value = f32> {
    0.0f32..1.0
}

fn rgba() -> impl Strategy<Value = Rgba> {
    (unit(), unit(), unit(), unit()).prop_map(|(r, g, b, a)| Rgba::new(r, g, b, a))
}

fn rgba8() -> impl Strategy<Value = Rgba8> {
    any::<[u8; 4]>().prop_map(Rgba8::from_bytes)
}

fn policy_strategy() -> impl Strategy<Value = AlphaPolicy> {
    prop_oneof![
        Just(AlphaPolicy::Sum),
        Just(AlphaPolicy::Clamped),
        Just(AlphaPolicy::Max),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Grid location
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fraction_is_in_unit_interval(grid in grid_strategy(), u in unit(), v in unit()) {
        let loc = grid.locate([u, v]);
        for f in loc.fraction {
            prop_assert!((0.0..1.0).contains(&f), "fraction {} out of [0, 1) for uv ({}, {})", f, u, v);
        }
    }

    #[test]
    fn located_cell_is_inside_grid(grid in grid_strategy(), u in -2.0f32..3.0, v in -2.0f32..3.0) {
        let loc = grid.locate([u, v]);
        prop_assert!(loc.cell.col < grid.cols());
        prop_assert!(loc.cell.row < grid.rows());
    }

    #[test]
    fn cell_centres_resolve_to_their_cell(
        grid in grid_strategy(),
        col_seed in any::<u16>(),
        row_seed in any::<u16>(),
    ) {
        let cell = CellCoord::new(col_seed % grid.cols(), row_seed % grid.rows());
        let loc = grid.locate(grid.cell_center_uv(cell));
        prop_assert_eq!(loc.cell, cell);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Unorm channel encoding
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn index_bytes_survive_unorm(byte in any::<u8>()) {
        prop_assert_eq!(GlyphIndex::from_unorm(GlyphIndex(byte).to_unorm()), GlyphIndex(byte));
        prop_assert_eq!(LayerIndex::from_unorm(LayerIndex(byte).to_unorm()), LayerIndex(byte));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Atlas addressing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn atlas_uv_stays_in_glyph_region(
        layout in layout_strategy(),
        glyph in any::<u8>(),
        fx in fraction(),
        fy in fraction(),
    ) {
        let glyph = GlyphIndex(glyph);
        let uv = layout.atlas_uv(glyph, [fx, fy]);
        let (min, max) = layout.glyph_region(glyph);
        let eps = 1e-5;
        for axis in 0..2 {
            prop_assert!(
                uv[axis] >= min[axis] - eps && uv[axis] <= max[axis] + eps,
                "axis {}: {} not in [{}, {}]", axis, uv[axis], min[axis], max[axis]
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6-8. Blending
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zero_alpha_is_background(glyph in rgba(), fg in rgba(), bg in rgba(), policy in policy_strategy()) {
        let glyph = Rgba::new(glyph.r, glyph.g, glyph.b, 0.0);
        let out = blend(glyph, fg, bg, policy);
        prop_assert_eq!([out.r, out.g, out.b], [bg.r, bg.g, bg.b]);
    }

    #[test]
    fn full_alpha_is_tinted_glyph(glyph in rgba(), fg in rgba(), bg in rgba(), policy in policy_strategy()) {
        let glyph = Rgba::new(glyph.r, glyph.g, glyph.b, 1.0);
        let out = blend(glyph, fg, bg, policy);
        prop_assert_eq!(
            [out.r, out.g, out.b],
            [glyph.r * fg.r, glyph.g * fg.g, glyph.b * fg.b]
        );
    }

    #[test]
    fn alpha_policies_hold(ga in unit(), ba in unit()) {
        prop_assert_eq!(AlphaPolicy::Sum.resolve(ga, ba), ga + ba);
        prop_assert!(AlphaPolicy::Clamped.resolve(ga, ba) <= 1.0);
        let m = AlphaPolicy::Max.resolve(ga, ba);
        prop_assert!(m >= ga && m >= ba);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 9-10. Attribute maps
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn out_of_grid_writes_are_noops(
        grid in grid_strategy(),
        dx in 0i32..50,
        dy in 0i32..50,
        color in rgba8(),
        ch in any::<char>(),
    ) {
        let mut maps = AttributeMaps::new(grid, 1).unwrap();
        let before = maps.clone();
        let x = i32::from(grid.cols()) + dx;
        let y = -1 - dy;
        maps.set_char_at(x, 0, ch);
        maps.set_fg_at(0, y, color);
        maps.set_bg_at(x, y, color);
        maps.set_set_at(x, 0, LayerIndex(0)).unwrap();
        prop_assert_eq!(maps.glyph_plane(), before.glyph_plane());
        prop_assert_eq!(maps.fg_plane(), before.fg_plane());
        prop_assert_eq!(maps.bg_plane(), before.bg_plane());
        prop_assert_eq!(maps.set_plane(), before.set_plane());
    }

    #[test]
    fn snapshot_apply_is_identity(
        cells in proptest::collection::vec((any::<u8>(), rgba8(), rgba8(), 0u8..4), 48),
        x in 0i32..8,
        y in 0i32..6,
        w in 0u16..8,
        h in 0u16..6,
    ) {
        let grid = GridDimensions::new(8, 6).unwrap();
        let mut maps = AttributeMaps::new(grid, 4).unwrap();
        for (i, (glyph, fg, bg, set)) in cells.into_iter().enumerate() {
            let (cx, cy) = ((i % 8) as i32, (i / 8) as i32);
            maps.set_glyph_at(cx, cy, GlyphIndex(glyph));
            maps.set_fg_at(cx, cy, fg);
            maps.set_bg_at(cx, cy, bg);
            maps.set_set_at(cx, cy, LayerIndex(set)).unwrap();
        }
        let w = w.min((8 - x) as u16);
        let h = h.min((6 - y) as u16);
        let before = maps.clone();
        let snap = maps.snapshot(x, y, w, h).unwrap();
        maps.apply_snapshot(&snap, x, y).unwrap();
        prop_assert_eq!(maps, before);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 11. Software renderer
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn empty_atlas_shows_backgrounds(
        bgs in proptest::collection::vec(rgba8(), 12),
        glyphs in proptest::collection::vec(any::<u8>(), 12),
        scale in 1u32..4,
    ) {
        let grid = GridDimensions::new(4, 3).unwrap();
        let mut maps = AttributeMaps::new(grid, 1).unwrap();
        for i in 0..12 {
            let (x, y) = ((i % 4) as i32, (i / 4) as i32);
            maps.set_bg_at(x, y, bgs[i]);
            maps.set_glyph_at(x, y, GlyphIndex(glyphs[i]));
            maps.set_fg_at(x, y, Rgba8::rgb(255, 255, 255));
        }
        let atlas = GlyphAtlas::from_fn(1, 1, 1, AtlasLayout::CP437, |_, _, _, _| Rgba8::TRANSPARENT)
            .unwrap();
        let renderer = SoftwareRenderer::new(CompositorConfig::new(grid));
        let fb = renderer.render(&maps, &atlas, 4 * scale, 3 * scale).unwrap();
        let bytes = fb.to_rgba8();
        for py in 0..3 * scale {
            for px in 0..4 * scale {
                let cell = (py / scale * 4 + px / scale) as usize;
                let at = ((py * 4 * scale + px) * 4) as usize;
                prop_assert_eq!(&bytes[at..at + 4], &bgs[cell].to_bytes()[..]);
            }
        }
    }
}
