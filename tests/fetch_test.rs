//! Driver tests against a mock package index and nightly listing.

mod common;

use std::sync::Arc;

use tempfile::TempDir;
use wheelfork::ArtifactKind;
use wheelfork::Channel;
use wheelfork::Driver;
use wheelfork::ForkConfig;
use wheelfork::NativeArchiver;
use wheelfork::PatchError;
use wheelfork::fetch::SIMPLE_JSON;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

use common::*;

const FORK_WHEEL: &str = "pythonmonkey_fork-1.0.1.dev3-cp312-cp312-manylinux_2_31_x86_64.whl";
const FORK_SDIST: &str = "pythonmonkey_fork-1.0.1.dev3.tar.gz";

fn driver_config(dir: &TempDir, server: &MockServer) -> ForkConfig {
    let source_root = write_sources(dir.path());
    ForkConfig {
        index_url: format!("{}/simple", server.uri()),
        nightly_url: server.uri(),
        ..config(&source_root, &dir.path().join("dist"))
    }
}

async fn mount_file(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_nightly_run_patches_every_listed_artifact() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    let listing = format!(
        "<html><body>\n<a href=\"../\">../</a>\n<a href=\"{}\">{}</a>\n<a href=\"{}\">{}</a>\n</body></html>",
        WHEEL_NAME, WHEEL_NAME, SDIST_NAME, SDIST_NAME
    );
    Mock::given(method("GET"))
        .and(path("/pythonmonkey/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .expect(1)
        .mount(&server)
        .await;
    mount_file(
        &server,
        &format!("/pythonmonkey/{}", WHEEL_NAME),
        pythonmonkey_wheel(),
    )
    .await;
    mount_file(
        &server,
        &format!("/pythonmonkey/{}", SDIST_NAME),
        pythonmonkey_sdist(),
    )
    .await;

    let driver = Driver::new(Arc::new(config), Arc::new(NativeArchiver)).unwrap();
    let patched = driver.run(&Channel::Nightly).await.unwrap();

    assert_eq!(patched.len(), 2);
    assert_eq!(patched[0].kind, ArtifactKind::Wheel);
    assert_eq!(patched[0].original, WHEEL_NAME);
    assert_eq!(patched[1].kind, ArtifactKind::Sdist);

    let dist = dir.path().join("dist");
    assert_eq!(patched[0].path, dist.join(FORK_WHEEL));
    assert_eq!(patched[1].path, dist.join(FORK_SDIST));
    assert!(!dist.join(WHEEL_NAME).exists());
    assert!(!dist.join(SDIST_NAME).exists());

    let wheel = read_zip(&patched[0].path);
    assert_eq!(wheel["pythonmonkey/require.py"], NEW_REQUIRE.as_bytes());
    assert!(wheel.contains_key("pythonmonkey_fork-1.0.1.dev3.dist-info/RECORD"));

    let sdist = read_tarball(&patched[1].path);
    assert!(sdist.contains_key("pythonmonkey_fork-1.0.1.dev3/pyproject.toml"));
}

#[tokio::test]
async fn test_release_run_uses_json_index() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    let index = serde_json::json!({
        "meta": {"api-version": "1.1"},
        "name": "pythonmonkey",
        "files": [
            {
                "filename": SDIST_NAME,
                "url": format!("{}/files/{}", server.uri(), SDIST_NAME),
                "hashes": {}
            },
            {
                "filename": "pythonmonkey-0.9.0.tar.gz",
                "url": format!("{}/files/pythonmonkey-0.9.0.tar.gz", server.uri()),
                "hashes": {}
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/simple/pythonmonkey/"))
        .and(header("accept", SIMPLE_JSON))
        .respond_with(ResponseTemplate::new(200).set_body_json(index))
        .expect(1)
        .mount(&server)
        .await;
    mount_file(&server, &format!("/files/{}", SDIST_NAME), pythonmonkey_sdist()).await;
    Mock::given(method("GET"))
        .and(path("/files/pythonmonkey-0.9.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let driver = Driver::new(Arc::new(config), Arc::new(NativeArchiver)).unwrap();
    let patched = driver
        .run(&Channel::Release(VERSION.to_string()))
        .await
        .unwrap();

    assert_eq!(patched.len(), 1);
    assert_eq!(patched[0].path, dir.path().join("dist").join(FORK_SDIST));
}

#[tokio::test]
async fn test_empty_release_is_not_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    Mock::given(method("GET"))
        .and(path("/simple/pythonmonkey/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})))
        .mount(&server)
        .await;

    let driver = Driver::new(Arc::new(config), Arc::new(NativeArchiver)).unwrap();
    let patched = driver
        .run(&Channel::Release("9.9.9".to_string()))
        .await
        .unwrap();

    assert!(patched.is_empty());
    assert!(dir.path().join("dist").is_dir());
}

#[tokio::test]
async fn test_nightly_run_with_repeated_links() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    // Fancy indexes link each file from its icon and from its name
    let listing = format!(
        "<a href=\"{0}\"><img src=\"/icons/compressed.gif\"></a> <a href=\"{0}\">{0}</a>",
        WHEEL_NAME
    );
    Mock::given(method("GET"))
        .and(path("/pythonmonkey/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;
    mount_file(
        &server,
        &format!("/pythonmonkey/{}", WHEEL_NAME),
        pythonmonkey_wheel(),
    )
    .await;

    let driver = Driver::new(Arc::new(config), Arc::new(NativeArchiver)).unwrap();
    let patched = driver.run(&Channel::Nightly).await.unwrap();

    assert_eq!(patched.len(), 1);
    assert_eq!(patched[0].path, dir.path().join("dist").join(FORK_WHEEL));
    let wheel = read_zip(&patched[0].path);
    assert_eq!(wheel["pythonmonkey/require.py"], NEW_REQUIRE.as_bytes());
}

#[tokio::test]
async fn test_release_filename_outside_dist_is_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    let filename = format!("pythonmonkey-{}/../../escaped.tar.gz", VERSION);
    let index = serde_json::json!({
        "files": [{
            "filename": filename,
            "url": format!("{}/files/escaped.tar.gz", server.uri()),
        }]
    });
    Mock::given(method("GET"))
        .and(path("/simple/pythonmonkey/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/escaped.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pythonmonkey_sdist()))
        .expect(0)
        .mount(&server)
        .await;

    let driver = Driver::new(Arc::new(config), Arc::new(NativeArchiver)).unwrap();
    let err = driver
        .run(&Channel::Release(VERSION.to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, PatchError::MalformedArchive { .. }), "{err}");
    assert!(!dir.path().join("escaped.tar.gz").exists());
}

#[tokio::test]
async fn test_failed_download_aborts_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    Mock::given(method("GET"))
        .and(path("/pythonmonkey/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("<a href=\"{}\">x</a>", SDIST_NAME)),
        )
        .mount(&server)
        .await;

    let driver = Driver::new(Arc::new(config), Arc::new(NativeArchiver)).unwrap();
    let err = driver.run(&Channel::Nightly).await.unwrap_err();

    match err {
        PatchError::Http(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(404)),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_tool_aborts_run() {
    use std::os::unix::fs::PermissionsExt;

    use wheelfork::CommandArchiver;

    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = driver_config(&dir, &server);

    let tool = dir.path().join("broken-tar");
    std::fs::write(&tool, "#!/bin/sh\nexit 2\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
    let archiver = CommandArchiver {
        tar: tool.display().to_string(),
        ..CommandArchiver::default()
    };

    Mock::given(method("GET"))
        .and(path("/pythonmonkey/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("<a href=\"{}\">x</a>", SDIST_NAME)),
        )
        .mount(&server)
        .await;
    mount_file(
        &server,
        &format!("/pythonmonkey/{}", SDIST_NAME),
        pythonmonkey_sdist(),
    )
    .await;

    let driver = Driver::new(Arc::new(config), Arc::new(archiver)).unwrap();
    let err = driver.run(&Channel::Nightly).await.unwrap_err();

    match err {
        PatchError::Command { command, code } => {
            assert_eq!(code, 2);
            assert!(command.contains("broken-tar -xzf"), "{command}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("dist").join(FORK_SDIST).exists());
}
