//! Shared constants

/// Suffix of the sidecar file holding the uploader's identity.
pub const OWNER_RECORD_SUFFIX: &str = ".owner.txt";

/// Subdirectory of the process root holding payloads handed to a processor.
pub const PROCESS_SRC_DIR: &str = "src";

/// Subdirectory of the process root holding processor output.
pub const PROCESS_DST_DIR: &str = "dst";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_USERINFO_PATH: &str = "/o/oauth2/userinfo";
pub const DEFAULT_TRANSCODER: &str = "avconv";
pub const DEFAULT_PROBE: &str = "exiftool";
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 2048;
