pub mod version;

pub use version::{short_sha, EnvView, VersionInfo, SHORT_SHA_LEN};
