use std::env;
use std::fs;
use std::path::Path;

/// Variables baked into the bundle through `option_env!` (see `src/config.rs`).
const BUILD_VARS: &[&str] = &["API_BASE_URL", "ENVIRONMENT", "ENABLE_LOGGING"];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env");
    for var in BUILD_VARS {
        println!("cargo:rerun-if-env-changed={}", var);
    }

    let env_file = Path::new(".env");
    let Ok(contents) = fs::read_to_string(env_file) else {
        println!("cargo:warning=No .env file found, API_BASE_URL falls back to its default.");
        return;
    };

    for (key, value) in contents.lines().filter_map(parse_line) {
        // the real environment wins over .env
        if env::var(key).is_err() {
            println!("cargo:rustc-env={}={}", key, value);
        }
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let value = value.trim().trim_matches('"');
    Some((key.trim(), value))
}
