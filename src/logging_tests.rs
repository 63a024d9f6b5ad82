use super::*;

#[test]
fn test_log_config_default() {
    let config = LogConfig::default();
    assert_eq!(config.log_level, Level::INFO);
    assert_eq!(config.stderr_level, Level::WARN);
    assert!(!config.json_format);
    assert!(config.log_dir.ends_with(".aimgr/logs"));
}

#[test]
fn test_parse_rotation_hourly() {
    let rotation = parse_rotation("HOURLY");
    // Rotation doesn't impl PartialEq, so compare debug output
    assert_eq!(format!("{rotation:?}"), format!("{:?}", Rotation::HOURLY));
}

#[test]
fn test_parse_rotation_never() {
    let rotation = parse_rotation("never");
    assert_eq!(format!("{rotation:?}"), format!("{:?}", Rotation::NEVER));
}

#[test]
fn test_parse_rotation_unknown_defaults_to_daily() {
    let rotation = parse_rotation("weekly");
    assert_eq!(format!("{rotation:?}"), format!("{:?}", Rotation::DAILY));
}

#[test]
fn test_parse_level() {
    assert_eq!(parse_level("debug"), Level::DEBUG);
    assert_eq!(parse_level("WARN"), Level::WARN);
    assert_eq!(parse_level("chatty"), Level::INFO);
}

#[test]
fn test_log_filename_constant() {
    assert_eq!(LOG_FILENAME, "aimgr.log");
}
