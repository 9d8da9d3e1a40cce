use super::*;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_file(tag: &str, contents: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let path = std::env::temp_dir().join(format!("eventreg-{tag}-{nanos}.toml"));
    fs::write(&path, contents).expect("write config");
    path
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let settings = load_settings_from(Path::new("/definitely/not/here/eventreg.toml"));
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
    assert_eq!(settings.notice_duration(), Duration::from_secs(3));
}

#[test]
fn file_values_override_defaults() {
    let path = temp_file(
        "file",
        "server_url = \"http://events.local:8080\"\nnotice_seconds = 5\n",
    );

    let settings = load_settings_from(&path);

    assert_eq!(settings.server_url, "http://events.local:8080");
    assert_eq!(settings.notice_seconds, 5);
    assert_eq!(settings.data_dir, None);
    let _ = fs::remove_file(path);
}

#[test]
fn unparseable_file_is_ignored() {
    let path = temp_file("broken", "server_url = [unterminated");
    assert_eq!(load_settings_from(&path), ClientSettings::default());
    let _ = fs::remove_file(path);
}

#[test]
fn env_overrides_file_values() {
    let mut settings = ClientSettings {
        server_url: "http://from-file".into(),
        data_dir: None,
        notice_seconds: 5,
    };

    apply_env_overrides(
        &mut settings,
        env(&[
            ("EVENTREG_SERVER_URL", "http://from-env"),
            ("EVENTREG_DATA_DIR", "/tmp/eventreg-data"),
            ("APP__NOTICE_SECONDS", "10"),
        ]),
    );

    assert_eq!(settings.server_url, "http://from-env");
    assert_eq!(settings.data_dir, Some(PathBuf::from("/tmp/eventreg-data")));
    assert_eq!(settings.notice_seconds, 10);
}

#[test]
fn app_prefixed_server_url_wins_and_blanks_are_skipped() {
    let mut settings = ClientSettings::default();

    apply_env_overrides(
        &mut settings,
        env(&[
            ("EVENTREG_SERVER_URL", "http://a"),
            ("APP__SERVER_URL", "http://b"),
            ("EVENTREG_DATA_DIR", "  "),
            ("APP__NOTICE_SECONDS", "soon"),
        ]),
    );

    assert_eq!(settings.server_url, "http://b");
    assert_eq!(settings.data_dir, None);
    assert_eq!(settings.notice_seconds, DEFAULT_NOTICE_SECONDS);
}

#[test]
fn explicit_data_dir_is_used_verbatim() {
    let settings = ClientSettings {
        data_dir: Some(PathBuf::from("/srv/eventreg")),
        ..ClientSettings::default()
    };
    assert_eq!(settings.resolved_data_dir(), PathBuf::from("/srv/eventreg"));
    assert!(ClientSettings::default()
        .resolved_data_dir()
        .ends_with("eventreg"));
}
