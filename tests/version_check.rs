//! Version checks end to end against local HTTP servers

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use scoop_query::config::DEFAULT_USER_AGENT;
use scoop_query::manifest::Checkver;
use scoop_query::version::{CheckError, FetchError, HttpFetcher, VersionChecker};

fn checker(server: &ServerGuard) -> VersionChecker {
    let fetcher = HttpFetcher::with_client(reqwest::Client::new());
    VersionChecker::with_endpoints(Arc::new(fetcher), &server.url(), &server.url())
}

fn descriptor(value: Value) -> Checkver {
    serde_json::from_value(value).unwrap()
}

async fn resolve(
    server: &ServerGuard,
    checkver: &Checkver,
    homepage: Option<&str>,
) -> Result<Option<String>, CheckError> {
    checker(server)
        .resolve(checkver, homepage, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn github_prefers_older_stable_release_over_newer_prerelease() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/owner/tool/releases")
        .match_header("user-agent", DEFAULT_USER_AGENT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "tag_name": "v1", "prerelease": true, "published_at": "2024-02-01T00:00:00Z" },
                { "tag_name": "v2", "prerelease": false, "published_at": "2024-01-01T00:00:00Z" }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let result = resolve(
        &server,
        &descriptor(json!({ "github": "https://github.com/owner/tool" })),
        None,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("v2"));
}

#[tokio::test]
async fn github_literal_falls_back_to_most_recent_prerelease() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/owner/nightly/releases")
        .with_status(200)
        .with_body(
            json!([
                { "tag_name": "nightly-1", "prerelease": true, "published_at": "2024-03-01T00:00:00Z" },
                { "tag_name": "nightly-2", "prerelease": true, "published_at": "2024-03-02T00:00:00+02:00" },
                { "tag_name": "nightly-0", "prerelease": true }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let result = resolve(
        &server,
        &Checkver::Literal("github".to_string()),
        Some("https://github.com/owner/nightly"),
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("nightly-2"));
}

#[tokio::test]
async fn sourceforge_extracts_version_from_first_item_link() {
    let mut server = Server::new_async().await;
    let feed = r#"<?xml version="1.0" encoding="utf-8"?>
<rss xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:media="http://video.search.yahoo.com/mrss/" version="2.0">
  <channel>
    <title>FileZilla</title>
    <item>
      <title><![CDATA[/FileZilla_Client/3.67.1/FileZilla_3.67.1_win64-setup.exe]]></title>
      <link>https://sourceforge.net/projects/filezilla/files/FileZilla_Client/3.67.1/FileZilla_3.67.1_win64-setup.exe/download</link>
      <media:content type="application/x-msdos-program" url="https://x" filesize="12"/>
    </item>
    <item>
      <link>https://sourceforge.net/projects/filezilla/files/FileZilla_Client/3.67.0/FileZilla_3.67.0_win64-setup.exe/download</link>
    </item>
  </channel>
</rss>"#;
    let mock = server
        .mock("GET", "/projects/filezilla/rss")
        .match_query(Matcher::UrlEncoded(
            "path".to_string(),
            "/FileZilla_Client".to_string(),
        ))
        .with_status(200)
        .with_body(feed)
        .create_async()
        .await;

    let result = resolve(
        &server,
        &descriptor(json!({
            "sourceforge": "filezilla",
            "sourceforgepath": "//FileZilla_Client",
            "regex": "FileZilla_Client/([\\d.]+)/"
        })),
        None,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("3.67.1"));
}

#[tokio::test]
async fn url_with_jsonpath_and_regex_post_filter() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/latest")
        .match_header("user-agent", "curl/8.7.1")
        .with_status(200)
        .with_body(r#"[{"name": "Release build-2024.06.1", "assets": []}]"#)
        .create_async()
        .await;
    let url = format!("{}/api/latest", server.url());

    let result = resolve(
        &server,
        &descriptor(json!({
            "url": url,
            "jsonpath": "$[0].name",
            "regex": "build-([\\d.]+)",
            "userAgent": "curl/8.7.1"
        })),
        None,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("2024.06.1"));
}

#[tokio::test]
async fn url_with_xpath_reaches_default_namespace() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/feed.atom")
        .with_status(200)
        .with_body(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>Release 5.2.0</title></entry>
  <entry><title>Release 5.1.9</title></entry>
</feed>"#,
        )
        .create_async()
        .await;
    let url = format!("{}/feed.atom", server.url());

    let result = resolve(
        &server,
        &descriptor(json!({
            "url": url,
            "xpath": "/ns:feed/ns:entry[1]/ns:title",
            "re": "([\\d.]+)"
        })),
        None,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("5.2.0"));
}

#[tokio::test]
async fn literal_regex_runs_against_homepage() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/download")
        .with_status(200)
        .with_body("<a href='/files/tool-1.0.zip'>1.0</a><a href='/files/tool-3.0.zip'>3.0</a>")
        .create_async()
        .await;
    let homepage = format!("{}/download", server.url());

    let result = resolve(
        &server,
        &Checkver::Literal(r"tool-([\d.]+)\.zip".to_string()),
        Some(&homepage),
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("1.0"));
}

#[tokio::test]
async fn url_regex_with_reverse_and_replace() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/files")
        .with_status(200)
        .with_body("tool_1_0.zip tool_2_0.zip tool_3_0.zip")
        .create_async()
        .await;
    let url = format!("{}/files", server.url());

    let result = resolve(
        &server,
        &descriptor(json!({
            "url": url,
            "regex": "tool_(\\d+)_(\\d+)\\.zip",
            "replace": "${1}.${2}",
            "reverse": true
        })),
        None,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("3.0"));
}

#[tokio::test]
async fn mistyped_option_is_ignored_and_check_still_runs() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/files")
        .with_status(200)
        .with_body("tool_1_0.zip tool_2_0.zip")
        .create_async()
        .await;
    let url = format!("{}/files", server.url());

    let result = resolve(
        &server,
        &descriptor(json!({
            "url": url,
            "regex": "tool_(\\d+)_\\d+\\.zip",
            "reverse": "true"
        })),
        None,
    )
    .await
    .unwrap();

    mock.assert_async().await;
    assert_eq!(result.as_deref(), Some("1"));
}

#[tokio::test]
async fn not_found_surfaces_as_fetch_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/owner/gone/releases")
        .with_status(404)
        .create_async()
        .await;

    let result = resolve(&server, &descriptor(json!({ "github": "owner/gone" })), None).await;

    mock.assert_async().await;
    assert!(matches!(
        result,
        Err(CheckError::Fetch(FetchError::NotFound(_)))
    ));
}

#[tokio::test]
async fn rate_limit_surfaces_retry_after() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/owner/busy/releases")
        .with_status(429)
        .with_header("retry-after", "120")
        .create_async()
        .await;

    let result = resolve(&server, &descriptor(json!({ "github": "owner/busy" })), None).await;

    mock.assert_async().await;
    assert!(matches!(
        result,
        Err(CheckError::Fetch(FetchError::RateLimited {
            retry_after_secs: Some(120)
        }))
    ));
}

#[tokio::test]
async fn cancelled_check_skips_the_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = checker(&server)
        .resolve_with_timeout(
            &descriptor(json!({ "github": "owner/tool" })),
            None,
            Duration::from_secs(5),
            &cancel,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result, None);
}
