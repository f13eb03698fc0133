//! Integration tests for the rasterizer, sprite and text paths.

use emu_pico8::draw_state::{default_draw_palette, default_screen_palette, TRANSPARENT_BIT};
use emu_pico8::{ClipRect, ColorArg, ColorBits, FontSource, Vm};

/// Every pixel set, so each glyph is a solid block.
struct SolidFont;

impl FontSource for SolidFont {
    fn glyph_pixel_set(&self, _x: i32, _y: i32) -> bool {
        true
    }
}

fn lit_pixels(vm: &Vm) -> Vec<(usize, usize)> {
    let screen = vm.screen();
    let mut lit = Vec::new();
    for y in 0..128 {
        for x in 0..128 {
            if screen.get(x, y) != 0 {
                lit.push((x, y));
            }
        }
    }
    lit
}

#[test]
fn test_set_pixel_outside_clip_is_noop() {
    let mut vm = Vm::new();
    vm.cls(3);
    vm.clip(32, 40, 16, Some(8));
    let before = vm.screen_bytes().to_vec();

    let bits = ColorBits::solid(9);
    for (x, y) in [(31, 40), (48, 40), (32, 39), (32, 48), (-1, -1), (200, 5)] {
        vm.set_pixel(x, y, bits);
    }
    assert_eq!(vm.screen_bytes(), &before[..]);

    vm.set_pixel(32, 40, bits);
    assert_ne!(vm.screen_bytes(), &before[..]);
}

#[test]
fn test_hline_fast_path_matches_per_pixel() {
    let spans = [
        (0, 127, 0),
        (1, 1, 5),
        (3, 10, 7),
        (10, 3, 8),
        (-20, 6, 9),
        (120, 400, 10),
        (0, 0, 127),
        (5, 6, 64),
    ];

    for clip in [None, Some((7, 0, 50, 128))] {
        for &(x1, x2, y) in &spans {
            let mut fast = Vm::new();
            let mut slow = Vm::new();
            fast.cls(1);
            slow.cls(1);
            if let Some((x, cy, w, h)) = clip {
                fast.clip(x, cy, w, Some(h));
                slow.clip(x, cy, w, Some(h));
            }

            let bits = ColorBits::solid(12);
            fast.hline(x1, x2, y, bits);
            for x in x1.min(x2)..=x1.max(x2) {
                slow.set_pixel(x, y, bits);
            }
            assert_eq!(
                fast.screen_bytes(),
                slow.screen_bytes(),
                "span {}..={} at y={} clip {:?}",
                x1,
                x2,
                y,
                clip
            );
        }
    }
}

#[test]
fn test_vline_fast_path_matches_per_pixel() {
    let mut fast = Vm::new();
    let mut slow = Vm::new();
    let bits = ColorBits::solid(4);
    fast.vline(9, 130, -3, bits);
    for y in -3..=130 {
        slow.set_pixel(9, y, bits);
    }
    assert_eq!(fast.screen_bytes(), slow.screen_bytes());
}

#[test]
fn test_cls_resets_clip_and_cursor() {
    let mut vm = Vm::new();
    vm.clip(10, 10, 5, Some(5));
    vm.cursor(40, 50, None);
    vm.cls(13);

    assert!(vm.screen_bytes().iter().all(|&b| b == 0xDD));
    assert_eq!(vm.draw_state().clip, ClipRect::FULL);
    assert_eq!((vm.draw_state().cursor_x, vm.draw_state().cursor_y), (0, 0));
    assert_eq!(vm.pget(127, 127), 13);
}

#[test]
fn test_camera_offsets_drawing() {
    let mut vm = Vm::new();
    assert_eq!(vm.camera(10, -4), (0, 0));
    assert_eq!(vm.camera(10, -4), (10, -4));

    vm.pset(30, 20, Some(ColorArg::pen(8)));
    assert_eq!(lit_pixels(&vm), vec![(20, 24)]);
    assert_eq!(vm.pget(30, 20), 8);

    vm.camera(0, 0);
    assert_eq!(vm.pget(20, 24), 8);
}

#[test]
fn test_pal_reset_restores_identity() {
    let mut vm = Vm::new();
    vm.pal(Some(1), Some(9), 0);
    vm.pal(Some(2), Some(0x83), 1);
    vm.palt(Some(0), Some(false));
    vm.palt(Some(5), Some(true));
    vm.fillp(0x5A5A, true);

    assert_eq!(vm.pal(None, None, 0), None);
    let ds = vm.draw_state();
    assert_eq!(ds.draw_palette, default_draw_palette());
    assert_eq!(ds.screen_palette, default_screen_palette());
    assert_eq!(ds.draw_palette[0], TRANSPARENT_BIT);
    assert!((1..16).all(|c| !ds.is_transparent(c)));
    assert_eq!(ds.fill_pattern, 0);
}

#[test]
fn test_circfill_radius_zero_is_one_pixel() {
    let mut vm = Vm::new();
    vm.circfill(64, 64, 0, Some(ColorArg::pen(7)));
    assert_eq!(lit_pixels(&vm), vec![(64, 64)]);
    assert_eq!(vm.pget(64, 64), 7);
}

#[test]
fn test_circ_is_symmetric() {
    let mut vm = Vm::new();
    vm.circ(64, 64, 9, Some(ColorArg::pen(2)));
    let lit = lit_pixels(&vm);
    assert!(!lit.is_empty());
    for &(x, y) in &lit {
        let (dx, dy) = (x as i32 - 64, y as i32 - 64);
        for (mx, my) in [(-dx, dy), (dx, -dy), (dy, dx)] {
            assert_eq!(vm.pget(64 + mx, 64 + my), 2, "missing mirror of ({}, {})", x, y);
        }
    }
    assert_eq!(vm.pget(73, 64), 2);
    assert_eq!(vm.pget(64, 64), 0);
}

#[test]
fn test_print_explicit_position() {
    let mut vm = Vm::with_font(Box::new(SolidFont));
    vm.print(Some("AB\nC"), Some(0), Some(100), Some(ColorArg::pen(7)));

    // 'A' at x 0..4, 'B' at x 4..8, both from y=100.
    for x in 0..8 {
        assert_eq!(vm.pget(x, 100), 7);
        assert_eq!(vm.pget(x, 104), 7);
    }
    assert_eq!(vm.pget(8, 100), 0);
    assert_eq!(vm.pget(0, 99), 0);
    assert_eq!(vm.pget(0, 105), 0);

    // 'C' on the next line.
    assert_eq!(vm.pget(0, 106), 7);
    assert_eq!(vm.pget(3, 110), 7);
    assert_eq!(vm.pget(4, 106), 0);

    assert_eq!(vm.cursor(0, 0, None), (0, 106));
}

#[test]
fn test_clip_scenario() {
    let mut vm = Vm::new();
    vm.clip(10, 10, 20, Some(30));
    assert_eq!(
        vm.draw_state().clip,
        ClipRect {
            x1: 10,
            y1: 10,
            x2: 30,
            y2: 40
        }
    );

    vm.pset(5, 5, Some(ColorArg::pen(8)));
    assert!(lit_pixels(&vm).is_empty());

    vm.pset(15, 15, Some(ColorArg::pen(8)));
    assert_eq!(lit_pixels(&vm), vec![(15, 15)]);
}

#[test]
fn test_stippled_rectfill_leaves_holes() {
    let mut vm = Vm::new();
    vm.cls(1);
    // Checkerboard, set bits transparent.
    vm.fillp(0xA5A5, true);
    vm.rectfill(0, 0, 7, 7, Some(ColorArg::pen(8)));

    let eights = (0..8)
        .flat_map(|y| (0..8).map(move |x| (x, y)))
        .filter(|&(x, y)| vm.pget(x, y) == 8)
        .count();
    assert_eq!(eights, 32);
    assert_eq!(vm.pget(8, 0), 1);
}

#[test]
fn test_sprite_and_map_blit() {
    let mut vm = Vm::new();
    // Sprite 1: a single colour 10 pixel at its top-left.
    vm.sset(8, 0, Some(10));
    vm.mset(2, 1, 1);

    vm.map(0, 0, 0, 0, Some(4), Some(4), 0);
    assert_eq!(lit_pixels(&vm), vec![(16, 8)]);
    assert_eq!(vm.pget(16, 8), 10);

    vm.cls(0);
    vm.spr(1, 40, 40, None, None, true, false);
    assert_eq!(lit_pixels(&vm), vec![(47, 40)]);
}

#[test]
fn test_extreme_arguments_do_not_panic() {
    let mut vm = Vm::with_font(Box::new(SolidFont));
    let pen = Some(ColorArg::pen(7));
    let extremes = [i32::MIN, i32::MIN + 1, -1, i32::MAX - 1, i32::MAX];

    vm.camera(1, 0);
    vm.pset(i32::MIN, 0, pen);
    assert_eq!(vm.pget(i32::MIN, 0), 0);
    vm.camera(-1, -1);
    vm.pset(i32::MAX, i32::MAX, pen);
    vm.camera(0, 0);
    assert!(lit_pixels(&vm).is_empty());

    for &a in &extremes {
        for &b in &extremes {
            vm.line(a, 0, b, 0, pen);
            vm.line(0, a, 0, b, pen);
            vm.line_to(a, b, pen);
            vm.rect(a, a, b, b, pen);
            vm.rectfill(a, a, b, b, pen);
            vm.circ(a, b, a, pen);
            vm.circfill(b, a, b, pen);
            vm.spr(a, b, a, Some(b as f64), Some(a as f64), true, true);
            vm.sspr(a, b, a, b, a, b, Some(b), Some(a), true, false);
            vm.map(a, b, a, b, Some(b), Some(b), 0);
            vm.print(Some("A\nB"), Some(a), Some(b), pen);
            vm.clip(a, b, a, Some(b));
            vm.clip(0, 0, 0, None);
        }
    }

    vm.cls(0);
    vm.circ(64, 64, i32::MAX, pen);
    vm.sspr(0, 0, i32::MAX, 1, 0, 0, Some(3), Some(1), false, false);
    vm.spr(0, 0, 0, Some(f64::MAX), Some(f64::INFINITY), false, false);
    vm.map(0, 0, 0, 0, Some(i32::MAX), Some(i32::MAX), 0);
    assert!(lit_pixels(&vm).is_empty());

    vm.line(i32::MIN, 5, i32::MAX, 5, pen);
    assert_eq!(lit_pixels(&vm).len(), 128);
    vm.rectfill(i32::MIN, i32::MIN, i32::MAX, i32::MAX, pen);
    assert!(vm.screen_bytes().iter().all(|&b| b == 0x77));
}
