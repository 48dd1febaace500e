//! Traversal and export behavior observed through the delivered archive

use crate::support::{names, read_archive, run_job, service, test_config, FakeSite};
use sumi_press::jobs::{JobId, JobService, StartJobParams};
use sumi_press::{ExportMode, JobState, ScopeMode};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers a HEAD request as HTML after cancelling `id`
struct CancelWhileProbing {
    service: JobService,
    id: JobId,
}

impl Respond for CancelWhileProbing {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let _ = self.service.cancel_job(&self.id);
        ResponseTemplate::new(200).insert_header("content-type", "text/html")
    }
}

#[tokio::test]
async fn test_children_depth_one_exports_same_origin_links() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page(
        "/",
        r#"<a href="/a">A</a> <a href="/b">B</a> <a href="https://other.test/c">C</a>"#,
    );
    site.page("/a", r#"<a href="/deeper">too deep</a>"#);
    site.page("/b", "<p>b</p>");

    let service = service(test_config(&scratch), &site);
    let (outcome, entries) = run_job(
        &service,
        StartJobParams::new("http://x.test/")
            .depth(1)
            .scope(ScopeMode::Children),
    )
    .await;

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(names(&entries), vec!["index.pdf", "a.pdf", "b.pdf"]);
    assert_eq!(entries[1].1, b"%PDF /a".to_vec());
    assert_eq!(outcome.pages_attempted, 3);
    assert_eq!(outcome.pages_exported, 3);
    assert_eq!(outcome.pages_failed, 0);
    assert_eq!(outcome.artifacts, 3);
    assert!(outcome.archive_bytes > 0);
    assert_eq!(site.visits(), vec!["/", "/a", "/b"]);
}

#[tokio::test]
async fn test_depth_two_follows_second_hop() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/a">A</a>"#);
    site.page("/a", r#"<a href="/a/deep">deep</a> <a href="/">home</a>"#);
    site.page("/a/deep", r#"<a href="/a/deeper">deeper</a>"#);

    let service = service(test_config(&scratch), &site);
    let (_, entries) = run_job(&service, StartJobParams::new("http://x.test/").depth(2)).await;

    assert_eq!(names(&entries), vec!["index.pdf", "a.pdf", "a_deep.pdf"]);
}

#[tokio::test]
async fn test_timed_out_page_is_skipped() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/slow">slow</a> <a href="/fast">fast</a>"#);
    site.hanging("/slow");
    site.page("/fast", "<p>fast</p>");

    let service = service(test_config(&scratch), &site);
    let (outcome, entries) = run_job(&service, StartJobParams::new("http://x.test/").depth(1)).await;

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(names(&entries), vec!["index.pdf", "fast.pdf"]);
    assert_eq!(outcome.pages_failed, 1);
    assert!(outcome
        .log
        .iter()
        .any(|entry| entry.message.starts_with("Skipped: http://x.test/slow")));
}

#[tokio::test]
async fn test_navigation_failure_is_skipped() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/down">down</a> <a href="/up">up</a>"#);
    site.failing("/down");
    site.page("/up", "");

    let service = service(test_config(&scratch), &site);
    let (outcome, entries) = run_job(&service, StartJobParams::new("http://x.test/").depth(1)).await;

    assert_eq!(names(&entries), vec!["index.pdf", "up.pdf"]);
    assert_eq!(outcome.pages_exported, 2);
    assert_eq!(outcome.pages_failed, 1);
}

#[tokio::test]
async fn test_only_scope_exports_seed_alone() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/docs/intro", r#"<a href="/docs/next">next</a>"#);

    let service = service(test_config(&scratch), &site);
    let (outcome, entries) = run_job(
        &service,
        StartJobParams::new("http://x.test/docs/intro")
            .depth(3)
            .scope(ScopeMode::Only),
    )
    .await;

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(names(&entries), vec!["docs_intro.pdf"]);
    assert_eq!(site.visits(), vec!["/docs/intro"]);
}

#[tokio::test]
async fn test_parents_scope_exports_ancestor_chain() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/elsewhere">elsewhere</a>"#);
    site.page("/a/b/c", r#"<a href="/a/b/c/d">child</a>"#);

    let service = service(test_config(&scratch), &site);
    let (_, entries) = run_job(
        &service,
        StartJobParams::new("http://x.test/a/b/c")
            .depth(1)
            .scope(ScopeMode::Parents),
    )
    .await;

    assert_eq!(
        names(&entries),
        vec!["index.pdf", "a.pdf", "a_b.pdf", "a_b_c.pdf"]
    );
}

#[tokio::test]
async fn test_both_scope_follows_seed_links_only() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/from-root">from root</a>"#);
    site.page("/guide", r#"<a href="/guide/step">step</a>"#);

    let service = service(test_config(&scratch), &site);
    let (_, entries) = run_job(
        &service,
        StartJobParams::new("http://x.test/guide")
            .depth(1)
            .scope(ScopeMode::Both),
    )
    .await;

    assert_eq!(
        names(&entries),
        vec!["index.pdf", "guide.pdf", "guide_step.pdf"]
    );
}

#[tokio::test]
async fn test_tiles_mode_names_and_order() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.tall("/", "", 1280, 2500);

    let service = service(test_config(&scratch), &site);
    let (outcome, entries) = run_job(
        &service,
        StartJobParams::new("http://x.test/")
            .scope(ScopeMode::Only)
            .mode(ExportMode::Tiles),
    )
    .await;

    assert_eq!(
        names(&entries),
        vec!["index_part0.png", "index_part1.png", "index_part2.png"]
    );
    assert_eq!(entries[0].1, b"/:0+1123".to_vec());
    assert_eq!(entries[1].1, b"/:1123+1123".to_vec());
    assert_eq!(entries[2].1, b"/:2246+254".to_vec());
    assert_eq!(outcome.pages_exported, 1);
    assert_eq!(outcome.artifacts, 3);
}

#[tokio::test]
async fn test_colliding_names_are_suffixed() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/a_b">one</a> <a href="/a/b">two</a>"#);

    let service = service(test_config(&scratch), &site);
    let (_, entries) = run_job(&service, StartJobParams::new("http://x.test/").depth(1)).await;

    assert_eq!(names(&entries), vec!["index.pdf", "a_b.pdf", "a_b-2.pdf"]);
}

#[tokio::test]
async fn test_page_limit_stops_traversal() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page(
        "/",
        r#"<a href="/1">1</a> <a href="/2">2</a> <a href="/3">3</a>"#,
    );

    let service = service(test_config(&scratch), &site);
    let (outcome, entries) = run_job(
        &service,
        StartJobParams::new("http://x.test/").depth(1).max_pages(2),
    )
    .await;

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(names(&entries), vec!["index.pdf", "1.pdf"]);
    assert_eq!(outcome.pages_attempted, 2);
}

#[tokio::test]
async fn test_preflight_skips_non_html() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/report.pdf">report</a> <a href="/page">page</a>"#);
    site.page("/page", "");

    let mut config = test_config(&scratch);
    config.limits.preflight = true;
    let service = service(config, &site);

    let (outcome, entries) = run_job(
        &service,
        StartJobParams::new(format!("{}/", server.uri())).depth(1),
    )
    .await;

    assert_eq!(names(&entries), vec!["index.pdf", "page.pdf"]);
    assert_eq!(outcome.pages_failed, 1);
    assert!(!site.visits().contains(&"/report.pdf".to_string()));
}

#[tokio::test]
async fn test_uncompressed_archive_at_level_zero() {
    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/a">A</a>"#);
    site.page("/a", "");

    let mut config = test_config(&scratch);
    config.export.compression_level = 0;
    let service = service(config, &site);

    let (outcome, entries) = run_job(&service, StartJobParams::new("http://x.test/").depth(1)).await;

    assert_eq!(outcome.state, JobState::Completed);
    assert_eq!(outcome.error, None);
    assert_eq!(names(&entries), vec!["index.pdf", "a.pdf"]);
    assert_eq!(entries[1].1, b"%PDF /a".to_vec());
}

#[tokio::test]
async fn test_cancel_during_preflight_skips_render() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;

    let scratch = TempDir::new().unwrap();
    let site = FakeSite::new();
    site.page("/", r#"<a href="/next">next</a>"#);
    site.page("/next", "");

    let mut config = test_config(&scratch);
    config.limits.preflight = true;
    let service = service(config, &site);

    let id = service
        .start_job(StartJobParams::new(format!("{}/", server.uri())).depth(1))
        .unwrap();
    Mock::given(method("HEAD"))
        .and(path("/next"))
        .respond_with(CancelWhileProbing {
            service: service.clone(),
            id: id.clone(),
        })
        .mount(&server)
        .await;

    let mut out = Vec::new();
    let outcome = service
        .stream_result(&id)
        .unwrap()
        .write_to(&mut out)
        .await
        .unwrap();

    assert_eq!(outcome.state, JobState::Cancelled);
    assert_eq!(names(&read_archive(out)), vec!["index.pdf"]);
    assert_eq!(site.visits(), vec!["/"]);
}
