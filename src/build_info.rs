/// Build-time metadata of the binary itself.
///
/// These describe how *this executable* was compiled. The metadata served over
/// HTTP comes from the deployment environment instead, see [`crate::model::VersionInfo`].
pub const BUILD_COMMIT: &str = env!("APP_BUILD_COMMIT");
pub const BUILD_TIMESTAMP: &str = env!("APP_BUILD_TIMESTAMP");

/// Human-readable summary combining Cargo version and build metadata.
pub fn summary() -> String {
    format!(
        "{} {} (commit {}, built at {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        BUILD_COMMIT,
        BUILD_TIMESTAMP
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_package_and_commit() {
        let s = summary();
        assert!(s.starts_with(env!("CARGO_PKG_NAME")));
        assert!(s.contains(env!("CARGO_PKG_VERSION")));
        assert!(s.contains(BUILD_COMMIT));
    }
}
