use delivery_tracker::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        for key in [
            "TRACKER_PROFILE",
            "TRACKER_API_BIND_ADDR",
            "TRACKER_LOG_LEVEL",
            "TRACKER_LOG_FORMAT",
            "TRACKER_SEED_DEMO_DATA",
            "TRACKER_UPLOAD_DIR",
            "TRACKER_MAX_UPLOAD_BYTES",
            "TRACKER_PROCESSING_DOCUMENT_DELAY_MS",
            "TRACKER_PROCESSING_MESSAGE_DELAY_MS",
            "TRACKER_PROCESSING_QUEUE_CAPACITY",
        ] {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert!(cfg.seed_demo_data);
    assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
    assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(cfg.processing.document_delay_ms, 2000);
    assert_eq!(cfg.processing.message_delay_ms, 1000);
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "TRACKER_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "TRACKER_API_BIND_ADDR=192.168.0.10:5000\nTRACKER_UPLOAD_DIR=/tmp/test-uploads\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "TRACKER_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "TRACKER_PROFILE=test\nTRACKER_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("layered config loads");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.upload_dir, PathBuf::from("/tmp/test-uploads"));
}

#[test]
fn process_env_overrides_files() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "TRACKER_LOG_LEVEL=debug\nTRACKER_PROCESSING_MESSAGE_DELAY_MS=250\n",
    );
    unsafe {
        env::set_var("TRACKER_LOG_LEVEL", "warn");
        env::set_var("TRACKER_SEED_DEMO_DATA", "false");
    }

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");

    assert_eq!(cfg.log_level, "warn");
    assert!(!cfg.seed_demo_data);
    assert_eq!(cfg.processing.message_delay_ms, 250);
    clear_env();
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("TRACKER_API_BIND_ADDR", "not-an-address");
    }

    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect_err("invalid bind addr should fail");

    assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    clear_env();
}

#[test]
fn non_numeric_upload_limit_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "TRACKER_MAX_UPLOAD_BYTES=ten-megabytes\n");

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect_err("non-numeric size should fail");

    match err {
        ConfigError::InvalidValue { key, value } => {
            assert_eq!(key, "TRACKER_MAX_UPLOAD_BYTES");
            assert_eq!(value, "ten-megabytes");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_queue_capacity_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "TRACKER_PROCESSING_QUEUE_CAPACITY=0\n");

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect_err("zero capacity should fail");

    assert!(matches!(err, ConfigError::InvalidQueueCapacity { value: 0 }));
}
