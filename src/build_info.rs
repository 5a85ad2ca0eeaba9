//! Version and build counter baked in by `build.rs`

use serde::Serialize;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const RAW_BUILD_NUMBER: Option<&str> = option_env!("SNACKTRACK_BUILD_NUMBER");
const RAW_BUILD_TIMESTAMP: Option<&str> = option_env!("SNACKTRACK_BUILD_TIMESTAMP");

/// What `snacktrack_status` reports about the running binary
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// 0 when built without the build script
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_number: RAW_BUILD_NUMBER.and_then(|s| s.parse().ok()).unwrap_or(0),
            build_timestamp: RAW_BUILD_TIMESTAMP.unwrap_or("unknown"),
        }
    }

    /// One-line summary such as `v1.0.0 build 12 (2025-03-01T08:00:00Z)`
    pub fn summary(&self) -> String {
        format!("v{} build {} ({})", self.version, self.build_number, self.build_timestamp)
    }
}

/// Startup banner on stderr; stdout belongs to the MCP transport
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("SnackTrack dog nutrition tracker {}", info.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_uses_package_version() {
        let info = BuildInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.build_timestamp.is_empty());
    }

    #[test]
    fn test_summary_format() {
        let info = BuildInfo {
            version: "1.0.0",
            build_number: 12,
            build_timestamp: "2025-03-01T08:00:00Z",
        };
        assert_eq!(info.summary(), "v1.0.0 build 12 (2025-03-01T08:00:00Z)");
    }
}
