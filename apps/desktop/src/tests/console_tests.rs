use super::*;

#[test]
fn blank_lines_and_comments_are_skipped() {
    for line in ["", "   ", "# stand up first"] {
        assert_eq!(parse_line(line).expect("parse"), None, "{line:?}");
    }
}

#[test]
fn keys_and_tokens_become_commands() {
    let cases = [
        ("w", Command::Walk0),
        ("Space", Command::Standby),
        ("left", Command::TurnLeft),
        ("walkl135:", Command::WalkL135),
        ("climbforward", Command::ClimbForward),
    ];
    for (line, expected) in cases {
        assert_eq!(
            parse_line(line).expect("parse"),
            Some(ConsoleInput::Command(expected)),
            "{line}"
        );
    }
}

#[test]
fn touch_lines_carry_zone_phase_and_position() {
    assert_eq!(
        parse_line("touch dial down 300 120.5").expect("parse"),
        Some(ConsoleInput::Touch {
            zone: Zone::Primary,
            phase: TouchPhase::Down,
            x: 300.0,
            y: 120.5,
        })
    );
    assert_eq!(
        parse_line("touch secondary up 0 0").expect("parse"),
        Some(ConsoleInput::Touch {
            zone: Zone::Secondary,
            phase: TouchPhase::Up,
            x: 0.0,
            y: 0.0,
        })
    );
}

#[test]
fn control_words() {
    assert_eq!(parse_line("release").expect("parse"), Some(ConsoleInput::Release));
    assert_eq!(parse_line("QUIT").expect("parse"), Some(ConsoleInput::Quit));
    assert_eq!(parse_line("exit").expect("parse"), Some(ConsoleInput::Quit));
}

#[test]
fn malformed_lines_are_errors() {
    for line in [
        "jump",
        "w e",
        "touch primary down 10",
        "touch sideways down 10 10",
        "touch primary hover 10 10",
        "touch primary down ten 10",
    ] {
        assert!(parse_line(line).is_err(), "{line}");
    }
}
