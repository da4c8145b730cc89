use super::*;
use serial_test::serial;

fn with_rust_log<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
    let previous = std::env::var_os("RUST_LOG");
    match value {
        Some(v) => std::env::set_var("RUST_LOG", v),
        None => std::env::remove_var("RUST_LOG"),
    }
    let result = f();
    match previous {
        Some(v) => std::env::set_var("RUST_LOG", v),
        None => std::env::remove_var("RUST_LOG"),
    }
    result
}

#[test]
#[serial]
fn test_env_filter_defaults_to_info() {
    let filter = with_rust_log(None, env_filter).to_string().to_lowercase();
    assert_eq!(filter, DEFAULT_FILTER);
}

#[test]
#[serial]
fn test_rust_log_overrides_default_level() {
    let filter = with_rust_log(Some("threadlog=debug"), env_filter).to_string().to_lowercase();
    assert!(filter.contains("threadlog=debug"), "got {}", filter);
    assert!(!filter.contains("threadlog=info"), "got {}", filter);
}

#[test]
fn test_cli_defaults() {
    let cli = Cli::parse_from(["threadlog"]);
    assert_eq!(cli.threads, 2);
    assert_eq!(cli.messages, 3);
    assert!(!cli.keep_open && !cli.quiet);
}
