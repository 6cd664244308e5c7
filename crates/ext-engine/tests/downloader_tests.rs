//! Downloader staging tests: concurrency bound, retry exhaustion, filtering.

mod common;

use std::fs;
use std::sync::Arc;

use common::{FakeRemoteSource, FakeRepo};
use ext_engine::{Downloader, RemoteSource, StageError, default_file_filter};
use pretty_assertions::assert_eq;

const URL: &str = "https://github.com/owner/ext";

fn downloader_for(source: &Arc<FakeRemoteSource>) -> Downloader {
    Downloader::new(Arc::clone(source) as Arc<dyn RemoteSource>)
}

#[tokio::test(start_paused = true)]
async fn stages_listed_files_with_contents() {
    let source = Arc::new(FakeRemoteSource::new().with_repo(
        URL,
        FakeRepo::default()
            .file("_manifest.json", b"{}")
            .file("plugin.py", b"print('v2')"),
    ));

    let staged = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap();

    assert_eq!(staged.files(), ["_manifest.json", "plugin.py"]);
    assert_eq!(
        fs::read(staged.path().join("plugin.py")).unwrap(),
        b"print('v2')"
    );
}

#[tokio::test(start_paused = true)]
async fn one_failing_optional_file_does_not_abort_staging() {
    let source = Arc::new(FakeRemoteSource::new().with_repo(
        URL,
        FakeRepo::default()
            .file("_manifest.json", b"{}")
            .file("plugin.py", b"ok")
            .failing_file("extras.json"),
    ));

    let staged = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap();

    assert_eq!(staged.files(), ["_manifest.json", "plugin.py"]);
    assert!(!staged.path().join("extras.json").exists());
}

#[tokio::test(start_paused = true)]
async fn all_essential_files_failing_fails_the_stage() {
    let source = Arc::new(FakeRemoteSource::new().with_repo(
        URL,
        FakeRepo::default()
            .failing_file("_manifest.json")
            .failing_file("plugin.py")
            .file("readme.md", b"docs"),
    ));

    let err = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::NoEssentialFiles));
}

#[tokio::test(start_paused = true)]
async fn listing_failure_is_reported() {
    let mut repo = FakeRepo::default().file("plugin.py", b"ok");
    repo.fail_listing = true;
    let source = Arc::new(FakeRemoteSource::new().with_repo(URL, repo));

    let err = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::ListFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn default_filter_skips_unexpected_extensions() {
    let source = Arc::new(FakeRemoteSource::new().with_repo(
        URL,
        FakeRepo::default()
            .file("_manifest.json", b"{}")
            .file("plugin.py", b"ok")
            .file("helper.so", b"\x7fELF")
            .file("notes.md", b"notes"),
    ));

    let staged = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap();

    assert_eq!(staged.files(), ["_manifest.json", "notes.md", "plugin.py"]);
}

#[tokio::test(start_paused = true)]
async fn entry_names_with_path_separators_are_refused() {
    let source = Arc::new(FakeRemoteSource::new().with_repo(
        URL,
        FakeRepo::default()
            .file("_manifest.json", b"{}")
            .file("../escape.py", b"evil"),
    ));

    let staged = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap();

    assert_eq!(staged.files(), ["_manifest.json"]);
}

#[tokio::test(start_paused = true)]
async fn concurrent_fetches_respect_the_pool_limit() {
    let mut repo = FakeRepo::default();
    for i in 0..10 {
        repo = repo.file(&format!("mod{i}.py"), b"pass");
    }
    repo = repo.file("plugin.py", b"pass");
    let source = Arc::new(FakeRemoteSource::new().with_repo(URL, repo));

    downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap();

    assert!(source.max_in_flight() <= 3);
}

#[tokio::test(start_paused = true)]
async fn retry_backoff_does_not_block_queued_files() {
    // Three permanently failing files saturate the default pool of 3; the
    // good file queued behind them must get a slot as soon as the first
    // attempts fail, not after their full retry schedules.
    let repo = FakeRepo::default()
        .failing_file("a.py")
        .failing_file("b.py")
        .failing_file("c.py")
        .file("plugin.py", b"ok");
    let source = Arc::new(FakeRemoteSource::new().with_repo(URL, repo));
    let start = tokio::time::Instant::now();

    let staged = downloader_for(&source)
        .stage(URL, default_file_filter)
        .await
        .unwrap();

    assert_eq!(staged.files(), ["plugin.py"]);
    let first_attempt = source.first_fetch_start("plugin.py").unwrap();
    assert!(
        first_attempt - start < std::time::Duration::from_secs(1),
        "queued file waited out another file's retry back-off"
    );
}

#[tokio::test(start_paused = true)]
async fn single_slot_pool_serializes_fetches() {
    let repo = FakeRepo::default()
        .file("plugin.py", b"a")
        .file("_manifest.json", b"{}")
        .file("util.py", b"b");
    let source = Arc::new(FakeRemoteSource::new().with_repo(URL, repo));
    let downloader = Downloader::with_limits(
        Arc::clone(&source) as Arc<dyn RemoteSource>,
        1,
        3,
        std::time::Duration::from_secs(1),
    );

    downloader.stage(URL, default_file_filter).await.unwrap();

    assert_eq!(source.max_in_flight(), 1);
}
