//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p achminup-api`.

use achminup_api::auth::{AuthError, IdentityProvider};
use achminup_api::setup::{build_state, routes};
use achminup_core::{AssetKey, Config, DeleteMismatchPolicy, Identity, LogFormat, StageRoots};
use achminup_processing::{ProcessingError, ToolOutput, ToolRunner};
use achminup_storage::{Stage, StagedPaths, Stager};
use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ALICE: &str = "Bearer alice-token";
pub const BOB: &str = "Bearer bob-token";

/// Accepts two fixed tokens.
pub struct StaticIdentity;

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        match authorization {
            Some(ALICE) => Ok(Identity::new("alice")),
            Some(BOB) => Ok(Identity::new("bob")),
            _ => Err(AuthError::Rejected(401)),
        }
    }
}

/// Probe reports no rotation; the transcoder copies its input to its output.
pub struct CopyingTools;

#[async_trait]
impl ToolRunner for CopyingTools {
    async fn run(&self, _program: &str, args: &[String]) -> Result<ToolOutput, ProcessingError> {
        if args.first().map(String::as_str) == Some("-Rotation") {
            return Ok(ToolOutput {
                success: true,
                status_code: Some(0),
                ..ToolOutput::default()
            });
        }

        let src = args.get(1).map(PathBuf::from);
        let dst = args.last().map(PathBuf::from);
        if let (Some(src), Some(dst)) = (src, dst) {
            tokio::fs::copy(&src, &dst)
                .await
                .map_err(|source| ProcessingError::ToolSpawn {
                    program: "copy".to_string(),
                    source,
                })?;
        }
        Ok(ToolOutput {
            success: true,
            status_code: Some(0),
            ..ToolOutput::default()
        })
    }
}

pub struct TestApp {
    pub server: TestServer,
    /// Same router as `server`, for requests `TestServer` cannot build.
    pub router: Router,
    pub stager: Stager,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn paths(&self, format: &str, id: &str) -> StagedPaths {
        self.stager.paths(AssetKey::parse(format, id).unwrap())
    }
}

pub fn test_config(root: &Path, policy: DeleteMismatchPolicy) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        log_format: LogFormat::Text,
        layers_api_uri: "https://layers.example".to_string(),
        userinfo_path: "/o/oauth2/userinfo".to_string(),
        auth_timeout_secs: 5,
        public_base_url: "https://layers.example".to_string(),
        public_path: "/achminup".to_string(),
        stages: StageRoots::new(
            root.join("download"),
            &root.join("process"),
            root.join("serve"),
        ),
        transcoder_path: "avconv".to_string(),
        probe_path: "exiftool".to_string(),
        max_upload_bytes: 1024 * 1024,
        delete_mismatch_policy: policy,
    }
}

pub async fn setup_test_app(policy: DeleteMismatchPolicy) -> TestApp {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(temp_dir.path(), policy);

    let state = build_state(&config, Arc::new(StaticIdentity), Arc::new(CopyingTools))
        .await
        .unwrap();
    let router = routes::setup_routes(&config, state);

    TestApp {
        server: TestServer::new(router.clone()).unwrap(),
        router,
        stager: Stager::new(config.stages.clone()),
        _temp_dir: temp_dir,
    }
}

/// Wait until background processing has published the payload and released `src`.
pub async fn wait_for_processing(paths: &StagedPaths) {
    for _ in 0..200 {
        if paths.payload(Stage::Serve).exists() && !paths.payload(Stage::Src).exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("processing of {} did not finish", paths.key);
}
