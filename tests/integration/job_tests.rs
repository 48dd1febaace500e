//! Job lifecycle: start, cancel, status, stream and cleanup

use crate::support::{names, read_archive, run_job, service, test_config, FakeLauncher, FakeSite};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use sumi_press::archive::ArchiveError;
use sumi_press::jobs::{JobId, JobService, StartJobParams};
use sumi_press::{JobState, PressError, ScopeMode};
use tempfile::TempDir;
use tokio::io::AsyncWrite;

/// An output that rejects every write
struct ClosedOutput;

impl AsyncWrite for ClosedOutput {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "client went away",
        )))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[test]
fn test_start_job_is_pending() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let service = service(test_config(&scratch), &site);

    let id = service
        .start_job(StartJobParams::new("https://example.com/docs"))
        .unwrap();

    let status = service.status(&id).unwrap();
    assert_eq!(status.state, JobState::Pending);
    assert_eq!(status.pages_attempted, 0);
    assert!(!status.cancelled);
    assert!(status
        .log
        .iter()
        .any(|entry| entry.message == "Base origin: https://example.com"));
}

#[test]
fn test_start_job_ids_are_unique() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let service = service(test_config(&scratch), &site);

    let first = service.start_job(StartJobParams::new("http://x.test/")).unwrap();
    let second = service.start_job(StartJobParams::new("http://x.test/")).unwrap();

    assert_ne!(first, second);
    assert_eq!(service.registry().len(), 2);
}

#[test]
fn test_start_job_rejects_bad_input() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let service = service(test_config(&scratch), &site);

    let cases = vec![
        StartJobParams::new(""),
        StartJobParams::new("not a url"),
        StartJobParams::new("ftp://x.test/"),
        StartJobParams::new("http://x.test/").depth(0),
        StartJobParams::new("http://x.test/").depth(4),
        StartJobParams::new("http://x.test/").max_pages(0),
        StartJobParams::new("http://x.test/").max_pages(500_001),
        StartJobParams::new("http://x.test/").resolution(0),
    ];

    for params in cases {
        let result = service.start_job(params.clone());
        assert!(
            matches!(result, Err(PressError::InvalidInput(_))),
            "expected InvalidInput for {:?}",
            params
        );
    }
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let service = service(test_config(&scratch), &site);
    let missing = JobId::from("000000000000");

    assert!(matches!(
        service.cancel_job(&missing),
        Err(PressError::NotFound(_))
    ));
    assert!(matches!(service.status(&missing), Err(PressError::NotFound(_))));
    assert!(matches!(
        service.stream_result(&missing),
        Err(PressError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_result_can_be_claimed_once() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let service = service(test_config(&scratch), &site);
    let id = service.start_job(StartJobParams::new("http://x.test/")).unwrap();

    let stream = service.stream_result(&id).unwrap();
    assert_eq!(stream.content_type(), "application/zip");
    assert_eq!(stream.attachment_filename(), "site-export.zip");

    assert!(matches!(
        service.stream_result(&id),
        Err(PressError::AlreadyStreaming(_))
    ));
}

#[tokio::test]
async fn test_delivered_job_is_removed_with_its_scratch_dir() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", "");
    let service = service(test_config(&scratch), &site);

    let id = service.start_job(StartJobParams::new("http://x.test/")).unwrap();
    let mut out = Vec::new();
    service
        .stream_result(&id)
        .unwrap()
        .write_to(&mut out)
        .await
        .unwrap();

    let expected_profile = scratch.path().join(format!("job-{}", id));
    assert_eq!(site.profiles(), vec![expected_profile.clone()]);
    assert!(!expected_profile.exists());
    assert_eq!(site.shutdowns(), 1);

    assert!(matches!(service.status(&id), Err(PressError::NotFound(_))));
    assert!(!service.registry().contains(&id));
}

#[tokio::test]
async fn test_cancel_mid_traversal_keeps_completed_pages() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page(
        "/",
        r#"<a href="/a">A</a> <a href="/b">B</a> <a href="/c">C</a>"#,
    );
    site.tall("/a", "", 1280, 2500);
    site.tall("/b", "", 1280, 2500);

    let service = service(test_config(&scratch), &site);
    let id = service
        .start_job(StartJobParams::new("http://x.test/").depth(1).mode(sumi_press::ExportMode::Tiles))
        .unwrap();

    {
        let service = service.clone();
        let id = id.clone();
        site.on_visit("/b", move || {
            service.cancel_job(&id).unwrap();
            service.cancel_job(&id).unwrap();
        });
    }

    let mut out = Vec::new();
    let outcome = service
        .stream_result(&id)
        .unwrap()
        .write_to(&mut out)
        .await
        .unwrap();
    let entries = read_archive(out);

    assert_eq!(outcome.state, JobState::Cancelled);
    assert_eq!(
        names(&entries),
        vec![
            "index_part0.png",
            "a_part0.png",
            "a_part1.png",
            "a_part2.png"
        ]
    );
    assert!(!site.visits().contains(&"/c".to_string()));
    assert!(outcome
        .log
        .iter()
        .any(|entry| entry.message == "Cancellation requested"));
}

#[test]
fn test_cancel_before_streaming_removes_job() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", "");
    let service = service(test_config(&scratch), &site);

    let id = service.start_job(StartJobParams::new("http://x.test/")).unwrap();
    service.cancel_job(&id).unwrap();

    assert!(!service.registry().contains(&id));
    assert!(matches!(service.status(&id), Err(PressError::NotFound(_))));
    assert!(matches!(
        service.stream_result(&id),
        Err(PressError::NotFound(_))
    ));
    assert!(matches!(
        service.cancel_job(&id),
        Err(PressError::NotFound(_))
    ));
    assert!(site.visits().is_empty());
}

#[test]
fn test_dropped_stream_releases_job() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let service = service(test_config(&scratch), &site);

    let kept = service.start_job(StartJobParams::new("http://x.test/")).unwrap();
    let id = service.start_job(StartJobParams::new("http://x.test/")).unwrap();
    drop(service.stream_result(&id).unwrap());

    assert!(!service.registry().contains(&id));
    assert!(matches!(
        service.stream_result(&id),
        Err(PressError::NotFound(_))
    ));
    assert!(service.registry().contains(&kept));
    assert_eq!(service.registry().len(), 1);
}

#[tokio::test]
async fn test_abandoned_write_releases_job_and_scratch() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.hanging("/");
    let mut config = test_config(&scratch);
    config.renderer.navigation_timeout_ms = 30_000;
    let service = service(config, &site);

    let id = service
        .start_job(StartJobParams::new("http://x.test/").scope(ScopeMode::Only))
        .unwrap();
    let stream = service.stream_result(&id).unwrap();

    let mut out = Vec::new();
    let write = tokio::time::timeout(Duration::from_millis(300), stream.write_to(&mut out)).await;
    assert!(write.is_err());

    assert!(!service.registry().contains(&id));
    let profile = scratch.path().join(format!("job-{}", id));
    assert_eq!(site.profiles(), vec![profile.clone()]);

    for _ in 0..100 {
        if !profile.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!profile.exists());
}

#[tokio::test]
async fn test_launch_failure_delivers_empty_archive() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    let launcher = Arc::new(FakeLauncher {
        site: site.clone(),
        fail: true,
    });
    let service = JobService::new(test_config(&scratch), launcher);

    let id = service.start_job(StartJobParams::new("http://x.test/")).unwrap();
    let mut out = Vec::new();
    let outcome = service
        .stream_result(&id)
        .unwrap()
        .write_to(&mut out)
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Failed);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("no browser installed"));
    assert_eq!(outcome.artifacts, 0);
    assert!(read_archive(out).is_empty());
    assert!(!service.registry().contains(&id));
}

#[tokio::test]
async fn test_output_failure_aborts_job() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", "");
    let service = service(test_config(&scratch), &site);

    let id = service
        .start_job(StartJobParams::new("http://x.test/").scope(ScopeMode::Only))
        .unwrap();
    let result = service
        .stream_result(&id)
        .unwrap()
        .write_to(&mut ClosedOutput)
        .await;

    assert!(matches!(
        result,
        Err(PressError::Archive(ArchiveError::Write(_)))
    ));
    assert!(!service.registry().contains(&id));
    assert!(!scratch.path().join(format!("job-{}", id)).exists());
}

#[tokio::test]
async fn test_concurrent_jobs_are_isolated() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/one", r#"<a href="/one/child">child</a>"#);
    site.page("/two", "");
    let service = service(test_config(&scratch), &site);

    let first = service
        .start_job(StartJobParams::new("http://x.test/one").depth(1))
        .unwrap();
    let second = service
        .start_job(StartJobParams::new("http://x.test/two").depth(1))
        .unwrap();

    let mut out_first = Vec::new();
    let mut out_second = Vec::new();
    let stream_first = service.stream_result(&first).unwrap();
    let stream_second = service.stream_result(&second).unwrap();

    let (a, b) = tokio::join!(
        stream_first.write_to(&mut out_first),
        stream_second.write_to(&mut out_second)
    );

    assert_eq!(a.unwrap().state, JobState::Completed);
    assert_eq!(b.unwrap().state, JobState::Completed);
    assert_eq!(
        names(&read_archive(out_first)),
        vec!["one.pdf", "one_child.pdf"]
    );
    assert_eq!(names(&read_archive(out_second)), vec!["two.pdf"]);
    assert_eq!(site.profiles().len(), 2);
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_run_job_helper_round_trip() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", "");
    let service = service(test_config(&scratch), &site);

    let (outcome, entries) = run_job(&service, StartJobParams::new("http://x.test/")).await;
    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(names(&entries), vec!["index.pdf"]);
}
