#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tapboard_core::config::KeyboardConfig;
use tapboard_input::{GesturePhase, KeyboardEngine, TouchInput, TouchPhase};
use tapboard_layout::{Keyboard, LayoutLibrary, LayoutParams};

const LAYOUT: &str = r#"
[keyboard]
key_width = 40
key_height = 40

[[row]]
[[row.key]]
label = "q"
[[row.key]]
label = "e"
popup_characters = "éèê"
[[row.key]]
codes = -5
label = "del"
repeatable = true

[[row]]
[[row.key]]
codes = "97,225,224"
label = "a"
[[row.key]]
codes = -1
label = "shift"
sticky = true
[[row.key]]
codes = 32
label = " "
"#;

#[derive(Debug, Arbitrary)]
struct Step {
    phase: u8,
    x: i16,
    y: i16,
    pointers: u8,
    dt_ms: u16,
    poll: bool,
}

fuzz_target!(|steps: Vec<Step>| {
    let Ok(keyboard) = Keyboard::parse(LAYOUT, &LayoutParams::new(120, 80)) else {
        return;
    };
    let library = LayoutLibrary::new();
    let mut engine = KeyboardEngine::new(keyboard, &KeyboardConfig::default());
    let mut now = Instant::now();

    for step in steps.iter().take(512) {
        now += Duration::from_millis(u64::from(step.dt_ms % 1_000));
        let phase = match step.phase % 4 {
            0 => TouchPhase::Down,
            1 => TouchPhase::Move,
            2 => TouchPhase::Up,
            _ => TouchPhase::Cancel,
        };
        let input = TouchInput::new(phase, i32::from(step.x), i32::from(step.y), now)
            .with_pointers(step.pointers % 3 + 1);
        let mut actions = engine.handle_touch(&input);
        if step.poll {
            actions.extend(engine.poll_timers(now, &library));
        }
        for action in &actions {
            if let Some(code) = action.key_code() {
                assert_ne!(code, 0, "delivered a spacer");
            }
        }
    }

    // A cancel always returns the engine to rest.
    engine.handle_touch(&TouchInput::cancel(0, 0, now));
    engine.handle_touch(&TouchInput::cancel(0, 0, now));
    assert_eq!(engine.phase(), GesturePhase::Idle);
    assert!(engine.popup().is_none());
});
