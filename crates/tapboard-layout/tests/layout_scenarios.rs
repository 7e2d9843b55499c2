//! End-to-end layout scenarios: load, build per mode, resize, resolve.

use std::io::Write as _;

use tapboard_core::codes::{self, KeyCode};
use tapboard_core::geometry::EdgeFlags;
use tapboard_layout::{
    HitResolver, Keyboard, KeyboardMode, LayoutLibrary, LayoutParams, LayoutParseError,
    LayoutSource,
};

const QWERTY: &str = r#"
[keyboard]
key_width = "10%p"
key_height = 54
horizontal_gap = 0
vertical_gap = 6

[[row]]
[[row.key]]
label = "q"
[[row.key]]
label = "w"
[[row.key]]
label = "e"
popup_characters = "èéêë"
[[row.key]]
label = "r"
[[row.key]]
label = "t"
[[row.key]]
label = "y"
[[row.key]]
label = "u"
[[row.key]]
label = "i"
[[row.key]]
label = "o"
[[row.key]]
label = "p"

[[row]]
mode = 1
[[row.key]]
codes = -1
label = "⇧"
key_width = "15%p"
sticky = true
[[row.key]]
label = "z"
[[row.key]]
label = "x"
[[row.key]]
label = "c"
[[row.key]]
codes = -5
icon = "delete"
key_width = "15%p"
repeatable = true

[[row]]
mode = 2
[[row.key]]
label = "1"
[[row.key]]
label = "2"
[[row.key]]
label = "3"

[[row]]
edge = "bottom"
[[row.key]]
codes = -2
label = "?123"
key_width = "20%p"
[[row.key]]
codes = 32
label = " "
key_width = "60%p"
[[row.key]]
codes = 10
label = "↵"
key_width = "20%p"
"#;

fn params(mode: KeyboardMode) -> LayoutParams {
    LayoutParams::new(360, 240).mode(mode)
}

#[test]
fn letters_and_symbols_share_one_document() {
    let source = LayoutSource::from_toml_str(QWERTY).unwrap();
    assert_eq!(source.row_count(), 4);

    let letters = Keyboard::from_source(&source, &params(KeyboardMode::LETTERS));
    let symbols = Keyboard::from_source(&source, &params(KeyboardMode::SYMBOLS));

    let has = |kb: &Keyboard, code: KeyCode| kb.keys().iter().any(|k| k.code() == code);
    assert!(has(&letters, 'z' as KeyCode));
    assert!(!has(&letters, '1' as KeyCode));
    assert!(has(&symbols, '1' as KeyCode));
    assert!(!has(&symbols, 'z' as KeyCode));
    assert!(!has(&symbols, codes::SHIFT));

    assert_eq!(letters.rows().len(), 3);
    // 3 rows of 54 with two gaps of 6 in between.
    assert_eq!(letters.height(), 54 * 3 + 6 * 2);
    assert_eq!(letters.min_width(), 360);
}

#[test]
fn bottom_row_keys_extend_downwards() {
    let kb = Keyboard::parse(QWERTY, &params(KeyboardMode::LETTERS)).unwrap();
    let space = kb
        .keys()
        .iter()
        .position(|k| k.code() == codes::SPACE)
        .unwrap();
    assert!(kb.keys()[space].edge_flags.contains(EdgeFlags::BOTTOM));

    let resolver = HitResolver::default();
    let key = &kb.keys()[space];
    let center_x = key.bounds().center().x;
    assert_eq!(resolver.key_at(&kb, center_x, kb.height() - 1), Some(space));
    // Past the bottom margin the key still contains the touch.
    assert!(key.is_inside(center_x, kb.height() + 400));
}

#[test]
fn near_miss_falls_back_to_closest_key() {
    let kb = Keyboard::parse(QWERTY, &params(KeyboardMode::LETTERS)).unwrap();
    // The vertical gap between the first two rows belongs to no key.
    let y = 54 + 2;
    let x = 36 * 4 + 18;
    let r = HitResolver::default().resolve(&kb, x, y, true);
    let primary = r.primary.unwrap();
    assert_eq!(kb.keys()[primary].code(), 't' as KeyCode);
    assert!(r.alternatives.len() > 1);
    assert!(HitResolver::new(false).key_at(&kb, x, y).is_none());
}

#[test]
fn fraction_of_101_rounds_up() {
    let kb = Keyboard::parse(
        "[[row]]\n[[row.key]]\nlabel = \"a\"\nkey_width = \"50%\"\nkey_height = 20\n",
        &LayoutParams::new(101, 50),
    )
    .unwrap();
    assert_eq!(kb.keys()[0].width, 51);
}

#[test]
fn resize_three_keys_into_sixty_pixels() {
    let mut kb = Keyboard::parse(
        r#"
        [keyboard]
        key_width = 30
        key_height = 30
        horizontal_gap = 2
        [[row]]
        [[row.key]]
        label = "a"
        [[row.key]]
        label = "b"
        [[row.key]]
        label = "c"
        "#,
        &LayoutParams::new(100, 30),
    )
    .unwrap();
    kb.resize(60, 30);
    let xs: Vec<i32> = kb.keys().iter().map(|k| k.x).collect();
    let widths: Vec<i32> = kb.keys().iter().map(|k| k.width).collect();
    assert_eq!(widths, vec![18, 18, 18]);
    assert_eq!(xs, vec![0, 20, 40]);

    // The index follows the new geometry.
    let resolver = HitResolver::default();
    assert_eq!(resolver.key_at(&kb, 45, 10), Some(2));
    assert!(resolver.key_at(&kb, 60, 10).is_none());
}

#[test]
fn structural_errors_install_nothing() {
    let mut library = LayoutLibrary::new();
    let err = library
        .insert_toml("broken", "[[row]]\n[[row.key]]\nlabel = \"a\"\n[[row.key.extra]]\nx = 1\n")
        .unwrap_err();
    assert!(matches!(err, LayoutParseError::UnknownElement { .. }));
    assert!(!library.contains("broken"));
    assert!(library.is_empty());
}

#[test]
fn layouts_load_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(QWERTY.as_bytes()).unwrap();

    let mut library = LayoutLibrary::new();
    library.load_file("qwerty", file.path()).unwrap();
    let kb = library.build("qwerty", &params(KeyboardMode::LETTERS)).unwrap();
    assert_eq!(kb.shift_key().map(|i| kb.keys()[i].code()), Some(codes::SHIFT));

    let missing = library.load_file("gone", file.path().with_extension("missing"));
    assert!(matches!(missing, Err(LayoutParseError::Io(_))));
}
