use super::*;

#[test]
fn console_is_the_default_mode() {
    let cli = Cli::try_parse_from(["hexapod-remote"]).expect("parse");
    assert_eq!(cli.mode, None);
    assert_eq!(cli.config, PathBuf::from("hexapod.toml"));
}

#[test]
fn send_accepts_tokens_with_or_without_colon() {
    let cli = Cli::try_parse_from(["hexapod-remote", "send", "walk0:", "turnleft"]).expect("parse");
    assert_eq!(
        cli.mode,
        Some(Mode::Send {
            commands: vec![Command::Walk0, Command::TurnLeft]
        })
    );
    assert!(Cli::try_parse_from(["hexapod-remote", "send"]).is_err());
    assert!(Cli::try_parse_from(["hexapod-remote", "send", "jump"]).is_err());
}

#[test]
fn classify_accepts_zone_aliases_and_negative_coordinates() {
    let cli = Cli::try_parse_from(["hexapod-remote", "classify", "pad", "-4", "10.5"]).expect("parse");
    assert_eq!(
        cli.mode,
        Some(Mode::Classify {
            zone: Zone::Secondary,
            x: -4.0,
            y: 10.5
        })
    );
}

#[test]
fn connection_flags_override_settings() {
    let cli = Cli::try_parse_from([
        "hexapod-remote",
        "--interface",
        "bluetooth",
        "--mac",
        "98-D3-31-F5-1A-2B",
        "--device",
        "/dev/rfcomm1",
        "--timeout-ms",
        "500",
        "--baud-rate",
        "115200",
        "console",
    ])
    .expect("parse");

    let mut settings = Settings::default();
    cli.connection.apply(&mut settings);
    assert_eq!(settings.timeout_ms, 500);
    assert_eq!(settings.baud_rate, 115200);
    assert_eq!(settings.ip, Settings::default().ip);
    assert_eq!(
        settings.connection_target().expect("target").to_string(),
        "rfcomm://98:D3:31:F5:1A:2B via /dev/rfcomm1"
    );
}

#[test]
fn touch_input_uses_configured_surface() {
    let settings = Settings::default();
    let (width, height) = (settings.dial.width, settings.dial.height);
    let point = TouchPoint::new(width / 2.0, height / 4.0, settings.surface(Zone::Primary));
    assert_eq!(
        GestureClassifier::new().classify(Zone::Primary, &point),
        Some(Command::Walk0)
    );
}
