//! Embeds the SnackTrack build counter and compile time.
//!
//! The counter lives in `build_number.txt` next to Cargo.toml and is bumped
//! whenever anything under `src/` changes.

use std::fs;

const COUNTER_FILE: &str = "build_number.txt";

fn main() {
    println!("cargo:rerun-if-changed=src");

    let previous: u64 = fs::read_to_string(COUNTER_FILE)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);
    let build = previous + 1;

    // Read-only checkouts keep the previous number
    if let Err(e) = fs::write(COUNTER_FILE, build.to_string()) {
        println!("cargo:warning=could not update {}: {}", COUNTER_FILE, e);
    }

    let compiled_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    println!("cargo:rustc-env=SNACKTRACK_BUILD_NUMBER={}", build);
    println!("cargo:rustc-env=SNACKTRACK_BUILD_TIMESTAMP={}", compiled_at);
}
