use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use marquee_config::{ConfigLoader, ConfigSource};

fn loader(vars: &[(&str, &str)], root: &std::path::Path) -> ConfigLoader {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new()
        .with_env(move |name| vars.get(name).cloned())
        .with_search_root(root)
}

#[test]
fn falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let load = loader(&[], dir.path()).load().expect("loads");

    assert_eq!(load.source, ConfigSource::Default);
    assert!(load.overrides.is_empty());
    assert_eq!(load.config.discovery.prefetch_threshold, 5);
}

#[test]
fn default_file_is_discovered() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("config")).expect("mkdir");
    fs::write(
        dir.path().join("config/marquee.toml"),
        "[session]\nprobe_throttle = \"10s\"\n",
    )
    .expect("write");

    let load = loader(&[], dir.path()).load().expect("loads");

    assert_eq!(
        load.source,
        ConfigSource::File(dir.path().join("config/marquee.toml"))
    );
    assert_eq!(load.config.session.probe_throttle, Duration::from_secs(10));
}

#[test]
fn env_path_beats_inline_json_and_default_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("marquee.toml"), "").expect("write");
    let custom = dir.path().join("custom.json");
    fs::write(&custom, r#"{"discovery": {"prefetch_threshold": 9}}"#)
        .expect("write");

    let load = loader(
        &[
            ("MARQUEE_CONFIG_PATH", custom.to_str().expect("utf-8")),
            ("MARQUEE_CONFIG_JSON", r#"{"discovery": {"prefetch_threshold": 2}}"#),
        ],
        dir.path(),
    )
    .load()
    .expect("loads");

    assert_eq!(load.source, ConfigSource::EnvPath(custom));
    assert_eq!(load.config.discovery.prefetch_threshold, 9);
}

#[test]
fn inline_json_is_used_without_a_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let load = loader(
        &[(
            "MARQUEE_CONFIG_JSON",
            r#"{"discovery": {"search_debounce": "120ms"}}"#,
        )],
        dir.path(),
    )
    .load()
    .expect("loads");

    assert_eq!(load.source, ConfigSource::EnvInline);
    assert_eq!(
        load.config.discovery.search_debounce,
        Duration::from_millis(120)
    );
}

#[test]
fn env_overrides_apply_last() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("marquee.toml"),
        "[catalog]\nbase_url = \"https://a.example.com/\"\n",
    )
    .expect("write");

    let load = loader(
        &[
            ("MARQUEE_BASE_URL", "https://b.example.com/api/"),
            ("MARQUEE_SESSION_COOKIE", "sid"),
            ("MARQUEE_STATE_DIR", "/var/lib/marquee"),
        ],
        dir.path(),
    )
    .load()
    .expect("loads");

    assert_eq!(load.config.catalog.base_url, "https://b.example.com/api/");
    assert_eq!(load.config.session.cookie_name, "sid");
    assert_eq!(
        load.config.storage.state_dir,
        PathBuf::from("/var/lib/marquee")
    );
    assert_eq!(load.overrides.len(), 3);
    assert_eq!(load.config.service_identity().unwrap(), "b.example.com");
}

#[test]
fn explicit_path_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let explicit = dir.path().join("cli.toml");
    fs::write(&explicit, "[discovery]\nprefetch_threshold = 3\n").expect("write");

    let load = loader(&[("MARQUEE_CONFIG_JSON", "{}")], dir.path())
        .with_path(Some(explicit.clone()))
        .load()
        .expect("loads");

    assert_eq!(load.source, ConfigSource::Explicit(explicit));
    assert_eq!(load.config.discovery.prefetch_threshold, 3);
}

#[test]
fn invalid_values_fail_with_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = loader(&[("MARQUEE_BASE_URL", "nope")], dir.path())
        .load()
        .expect_err("invalid base url");

    let message = format!("{err:#}");
    assert!(message.contains("invalid configuration"));
    assert!(message.contains("base_url"));
}

#[test]
fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("marquee.json"), "{ nope").expect("write");

    let err = loader(&[], dir.path()).load().expect_err("malformed");
    assert!(format!("{err:#}").contains("marquee.json"));
}
