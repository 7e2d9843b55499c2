#![no_main]

use libfuzzer_sys::fuzz_target;
use tapboard_layout::{HitResolver, Keyboard, KeyboardMode, LayoutParams, LayoutSource};

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the surface size (40..=1060 x 40..=1060).
    if data.len() < 2 {
        return;
    }
    let width = i32::from(data[0]) * 4 + 40;
    let height = i32::from(data[1]) * 4 + 40;
    let Ok(text) = std::str::from_utf8(&data[2..]) else {
        return;
    };
    let Ok(source) = LayoutSource::from_toml_str(text) else {
        return;
    };

    for mode in [KeyboardMode::LETTERS, KeyboardMode::SYMBOLS] {
        let params = LayoutParams::new(width, height).mode(mode);
        let mut keyboard = Keyboard::from_source(&source, &params);
        check(&keyboard);
        keyboard.resize(width / 2 + 1, height);
        check(&keyboard);
    }
});

fn check(keyboard: &Keyboard) {
    for key in keyboard.keys() {
        assert!(key.x >= 0 && key.y >= 0, "key placed at negative offset");
        assert!(key.right() <= keyboard.min_width(), "key past min_width");
    }
    let resolver = HitResolver::default();
    let bounds = keyboard.bounds();
    let step = (bounds.width.max(bounds.height) / 16).max(1);
    let mut y = bounds.y - step;
    while y <= bounds.bottom() + step {
        let mut x = bounds.x - step;
        while x <= bounds.right() + step {
            let hit = resolver.resolve(keyboard, x, y, true);
            if let Some(index) = hit.primary {
                assert!(keyboard.key(index).is_some(), "primary out of range");
            }
            for &index in keyboard.nearest_keys(x, y) {
                assert!(index < keyboard.keys().len(), "grid index out of range");
            }
            x += step;
        }
        y += step;
    }
}
