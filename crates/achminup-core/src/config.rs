//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a `.env`
//! file) once at startup and validated before anything touches the filesystem.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT, DEFAULT_PROBE,
    DEFAULT_TRANSCODER, DEFAULT_USERINFO_PATH, PROCESS_DST_DIR, PROCESS_SRC_DIR,
};

/// What a delete does when the stored owner differs from the caller.
///
/// `Cleanup` reports the mismatch but still removes the asset and its owner
/// record, which is how the service has always behaved. `Preserve` reports the
/// mismatch and leaves both in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMismatchPolicy {
    #[default]
    Cleanup,
    Preserve,
}

impl FromStr for DeleteMismatchPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cleanup" => Ok(DeleteMismatchPolicy::Cleanup),
            "preserve" => Ok(DeleteMismatchPolicy::Preserve),
            other => Err(anyhow::anyhow!(
                "ACHMINUP_DELETE_MISMATCH_POLICY must be 'cleanup' or 'preserve', got '{}'",
                other
            )),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unsupported LOG_FORMAT '{}'", other)),
        }
    }
}

/// The four stage roots. Each contains a `videos/` and `thumbnails/` subdirectory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRoots {
    pub download: PathBuf,
    pub src: PathBuf,
    pub dst: PathBuf,
    pub serve: PathBuf,
}

impl StageRoots {
    /// Derive the roots the way the deployment lays them out: `src` and `dst`
    /// live under a shared process directory.
    pub fn new(download: impl Into<PathBuf>, process: &Path, serve: impl Into<PathBuf>) -> Self {
        Self {
            download: download.into(),
            src: process.join(PROCESS_SRC_DIR),
            dst: process.join(PROCESS_DST_DIR),
            serve: serve.into(),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.download, &self.src, &self.dst, &self.serve]
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub log_format: LogFormat,
    /// Identity provider base URI, without trailing slash
    pub layers_api_uri: String,
    pub userinfo_path: String,
    pub auth_timeout_secs: u64,
    /// Base of the URLs handed back to uploaders, without trailing slash
    pub public_base_url: String,
    /// Path prefix under `public_base_url` where the serve stage is exposed
    pub public_path: String,
    pub stages: StageRoots,
    pub transcoder_path: String,
    pub probe_path: String,
    pub max_upload_bytes: usize,
    pub delete_mismatch_policy: DeleteMismatchPolicy,
}

fn required(name: &str) -> Result<String, anyhow::Error> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let server_port = env::var("ACHMINUP_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let log_format = env::var("LOG_FORMAT")
            .unwrap_or_default()
            .parse::<LogFormat>()?;

        let layers_api_uri = required("LAYERS_API_URI")?
            .trim_end_matches('/')
            .to_string();

        let public_base_url = env::var("ACHMINUP_PUBLIC_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| layers_api_uri.clone());

        let process_root = PathBuf::from(required("ACHMINUP_PROCESS_PATH")?);
        let stages = StageRoots::new(
            required("ACHMINUP_DOWNLOAD_PATH")?,
            &process_root,
            required("ACHMINUP_SERVE_PATH")?,
        );

        let max_upload_mb = env::var("ACHMINUP_MAX_UPLOAD_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        let delete_mismatch_policy = match env::var("ACHMINUP_DELETE_MISMATCH_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => DeleteMismatchPolicy::default(),
        };

        Ok(Config {
            server_port,
            environment,
            log_format,
            layers_api_uri,
            userinfo_path: env::var("ACHMINUP_USERINFO_PATH")
                .unwrap_or_else(|_| DEFAULT_USERINFO_PATH.to_string()),
            auth_timeout_secs: env::var("ACHMINUP_AUTH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS),
            public_base_url,
            public_path: normalize_public_path(&env::var("ACHMINUP_PATH").unwrap_or_default()),
            stages,
            transcoder_path: env::var("ACHMINUP_TRANSCODER")
                .unwrap_or_else(|_| DEFAULT_TRANSCODER.to_string()),
            probe_path: env::var("ACHMINUP_PROBE").unwrap_or_else(|_| DEFAULT_PROBE.to_string()),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            delete_mismatch_policy,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.layers_api_uri.starts_with("http://")
            || self.layers_api_uri.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "LAYERS_API_URI must be an http(s) URI"
            ));
        }

        let roots = self.stages.all();
        for (i, root) in roots.iter().enumerate() {
            if root.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("Stage directories must not be empty"));
            }
            if roots[i + 1..].contains(root) {
                return Err(anyhow::anyhow!(
                    "Stage directory {} is used for more than one stage",
                    root.display()
                ));
            }
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("ACHMINUP_MAX_UPLOAD_MB must be positive"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Full URL of the identity provider's userinfo endpoint
    pub fn userinfo_url(&self) -> String {
        format!("{}{}", self.layers_api_uri, self.userinfo_path)
    }
}

/// `""` stays empty, anything else gets exactly one leading slash and no trailing slash.
fn normalize_public_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 8080,
            environment: "test".to_string(),
            log_format: LogFormat::Text,
            layers_api_uri: "https://layers.example".to_string(),
            userinfo_path: DEFAULT_USERINFO_PATH.to_string(),
            auth_timeout_secs: 10,
            public_base_url: "https://layers.example".to_string(),
            public_path: "/achminup".to_string(),
            stages: StageRoots::new("/data/download", Path::new("/data/process"), "/data/serve"),
            transcoder_path: "avconv".to_string(),
            probe_path: "exiftool".to_string(),
            max_upload_bytes: 1024,
            delete_mismatch_policy: DeleteMismatchPolicy::Cleanup,
        }
    }

    #[test]
    fn test_stage_roots_split_process_dir() {
        let roots = StageRoots::new("/d", Path::new("/p"), "/s");
        assert_eq!(roots.src, PathBuf::from("/p/src"));
        assert_eq!(roots.dst, PathBuf::from("/p/dst"));
    }

    #[test]
    fn test_validate_accepts_distinct_roots() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_shared_stage_root() {
        let mut config = test_config();
        config.stages.serve = config.stages.download.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_provider() {
        let mut config = test_config();
        config.layers_api_uri = "layers.example".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalize_public_path() {
        assert_eq!(normalize_public_path(""), "");
        assert_eq!(normalize_public_path("/"), "");
        assert_eq!(normalize_public_path("achminup/"), "/achminup");
        assert_eq!(normalize_public_path("/media/achminup"), "/media/achminup");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "Preserve".parse::<DeleteMismatchPolicy>().unwrap(),
            DeleteMismatchPolicy::Preserve
        );
        assert!("delete".parse::<DeleteMismatchPolicy>().is_err());
    }

    #[test]
    fn test_userinfo_url() {
        assert_eq!(
            test_config().userinfo_url(),
            "https://layers.example/o/oauth2/userinfo"
        );
    }
}
