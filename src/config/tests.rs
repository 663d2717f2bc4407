use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.capabilities.dpi = Some(90.0);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        common: CommonOverrides {
            log_level: Some("debug".to_string()),
            dpi: Some(144.0),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.capabilities.dpi, 144.0);
}

#[test]
fn defaults_are_usable_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(
        settings.capabilities,
        Capabilities {
            speech: false,
            speech_on: false,
            ..Capabilities::default()
        }
    );
    assert_eq!(settings.engines.typesetter, EngineBackend::Katex);
    assert_eq!(settings.engines.checker, EngineBackend::Katex);
    assert!(settings.engines.speech.is_none());
    assert!(settings.engines.svgo.is_none());
}

#[test]
fn speech_follows_the_configured_engine() {
    let mut raw = RawSettings::default();
    raw.engines.speech_command.program = Some(PathBuf::from("/usr/local/bin/sre-engine"));

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.capabilities.speech);
    assert!(settings.capabilities.speech_on);
    assert!(settings.engines.speech.is_some());
}

#[test]
fn speech_without_an_engine_is_rejected() {
    let mut raw = RawSettings::default();
    raw.capabilities.speech_on = Some(true);

    let err = Settings::from_raw(raw).expect_err("speech_on needs an engine");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "capabilities.speech_on",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.capabilities.speech = Some(true);
    let err = Settings::from_raw(raw).expect_err("speech needs an engine");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "capabilities.speech",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.capabilities.speech_on = Some(false);
    raw.engines.speech_command.program = Some(PathBuf::from("/usr/local/bin/sre-engine"));
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.capabilities.speech_on);
    assert!(settings.capabilities.speech);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = CommonOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_common_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn non_positive_dpi_is_rejected() {
    let mut raw = RawSettings::default();
    raw.capabilities.dpi = Some(0.0);

    let err = Settings::from_raw(raw).expect_err("dpi must be positive");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "capabilities.dpi",
            ..
        }
    ));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn command_backend_requires_a_program() {
    let mut raw = RawSettings::default();
    raw.engines.typesetter = Some("command".to_string());

    let err = Settings::from_raw(raw).expect_err("missing program");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "engines.typesetter_command.program",
            ..
        }
    ));
}

#[test]
fn command_backend_keeps_program_and_args() {
    let mut raw = RawSettings::default();
    raw.engines.checker = Some("Command".to_string());
    raw.engines.checker_command = RawCommandSettings {
        program: Some(PathBuf::from("/usr/bin/node")),
        args: Some(vec!["texcheck.js".to_string()]),
    };

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.engines.checker,
        EngineBackend::Command(CommandSettings {
            program: PathBuf::from("/usr/bin/node"),
            args: vec!["texcheck.js".to_string()],
        })
    );
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.engines.checker = Some("mathjax".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "engines.checker",
            ..
        })
    ));
}

#[test]
fn speech_section_feeds_capabilities() {
    let mut raw = RawSettings::default();
    raw.speech.domain = Some("clearspeak".to_string());
    raw.speech.semantic = Some(true);

    let settings = Settings::from_raw(raw).expect("valid settings");
    let speech = &settings.capabilities.speech_config;
    assert_eq!(speech.domain, "clearspeak");
    assert_eq!(speech.locale, DEFAULT_SPEECH_LOCALE);
    assert!(speech.semantic);
}

#[test]
fn blank_speech_locale_is_rejected() {
    let mut raw = RawSettings::default();
    raw.speech.locale = Some("  ".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["mathcast"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "mathcast",
        "serve",
        "--server-port",
        "8080",
        "--no-check",
        "yes",
        "--speech-command",
        "/opt/sre/bin/sre",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(serve.overrides.common.no_check, Some(true));
            assert_eq!(
                serve.overrides.common.speech_command,
                Some(PathBuf::from("/opt/sre/bin/sre"))
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_batch_arguments() {
    let args = CliArgs::parse_from([
        "mathcast",
        "batch",
        "in.json",
        "out.json",
        "--concurrency",
        "8",
        "--svgo",
        "false",
    ]);

    match args.command.expect("batch command") {
        Command::Batch(batch) => {
            assert_eq!(batch.input, Some(PathBuf::from("in.json")));
            assert_eq!(batch.output, Some(PathBuf::from("out.json")));
            assert_eq!(batch.concurrency, 8);
            assert_eq!(batch.overrides.svgo, Some(false));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn batch_concurrency_has_a_default() {
    let args = CliArgs::parse_from(["mathcast", "batch"]);
    match args.command.expect("batch command") {
        Command::Batch(batch) => {
            assert_eq!(batch.concurrency, crate::application::batch::DEFAULT_CONCURRENCY);
            assert!(batch.input.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
