//! Video page extraction against a scripted site, including retry behaviour.

mod common;

use acfun_dl::extractor::{Quality, Vid, VideoExtractor};
use acfun_dl::http::TransportError;
use acfun_dl::AcfunError;
use common::{client, streams_json, FakeSite, SITE};
use tokio_test::{assert_err, assert_ok};

fn vid(id: u64) -> Vid {
    id.to_string().parse().unwrap()
}

#[tokio::test]
async fn single_part_video_has_one_part_with_index_one() {
    let site = FakeSite::new();
    site.video_page(
        100,
        &format!(
            r#"{{"title":"Solo","user":{{"id":"55","name":"someone"}},"createTimeMillis":1704153600000,
                "currentVideoInfo":{{"title":"","streams":{}}}}}"#,
            streams_json("solo", &[Quality::Q1080, Quality::Q720])
        ),
    );

    let extractor = VideoExtractor::with_base_url(client(site.clone(), 1), SITE);
    let info = assert_ok!(extractor.fetch_video_info(&vid(100)).await);

    assert_eq!(info.id.to_string(), "ac100");
    assert_eq!(info.title, "Solo");
    assert_eq!(info.uploader.name, "someone");
    assert_eq!(info.parts.len(), 1);
    assert_eq!(info.parts[0].index, 1);
    assert_eq!(info.parts[0].qualities(), vec![Quality::Q1080, Quality::Q720]);
    assert!(!info.is_multi_part());
}

#[tokio::test]
async fn multi_part_video_parts_are_contiguous_from_one() {
    let site = FakeSite::new();
    site.video_page(
        200,
        &format!(
            r#"{{"title":"Series","videoList":[
                {{"title":"One","priority":0,"streams":{}}},
                {{"title":"Two","priority":1,"streams":{}}},
                {{"title":"Three","priority":2,"streams":[]}}]}}"#,
            streams_json("s1", &[Quality::Q720]),
            streams_json("s2", &[Quality::Q480]),
        ),
    );

    let extractor = VideoExtractor::with_base_url(client(site, 1), SITE);
    let info = extractor.fetch_video_info(&vid(200)).await.unwrap();

    assert_eq!(info.parts.len(), 3);
    let indices: Vec<u32> = info.parts.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(info.parts[1].title, "Two");
    assert!(info.parts[2].streams.is_empty());
}

#[tokio::test]
async fn page_without_payload_is_parse_error_naming_the_video() {
    let site = FakeSite::new();
    site.text(
        format!("{SITE}/v/ac300"),
        vec![Ok("<html><body>removed</body></html>".to_string())],
    );

    let extractor = VideoExtractor::with_base_url(client(site.clone(), 3), SITE);
    let err = assert_err!(extractor.fetch_video_info(&vid(300)).await);

    assert!(matches!(err, AcfunError::Parse { ref id, .. } if id == "ac300"));
    // Structural failures are not retried
    assert_eq!(site.calls(&format!("{SITE}/v/ac300")), 1);
}

#[tokio::test]
async fn transient_failures_are_retried_within_budget() {
    let site = FakeSite::new();
    let page = common::video_page_html(&format!(
        r#"{{"title":"Flaky","currentVideoInfo":{{"streams":{}}}}}"#,
        streams_json("f", &[Quality::Q720])
    ));
    site.text(
        format!("{SITE}/v/ac400"),
        vec![
            Err(TransportError::Status(503)),
            Err(TransportError::Timeout),
            Ok(page),
        ],
    );

    let extractor = VideoExtractor::with_base_url(client(site.clone(), 3), SITE);
    let info = assert_ok!(extractor.fetch_video_info(&vid(400)).await);

    assert_eq!(info.title, "Flaky");
    assert_eq!(site.calls(&format!("{SITE}/v/ac400")), 3);
}

#[tokio::test]
async fn exhausted_budget_reports_attempts_and_cause() {
    let site = FakeSite::new();
    site.text(format!("{SITE}/v/ac500"), vec![Err(TransportError::Status(502))]);

    let extractor = VideoExtractor::with_base_url(client(site.clone(), 3), SITE);
    let err = extractor.fetch_video_info(&vid(500)).await.unwrap_err();

    match err {
        AcfunError::Fetch { attempts, cause, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(cause, TransportError::Status(502));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert_eq!(site.calls(&format!("{SITE}/v/ac500")), 3);
}

#[tokio::test]
async fn non_retryable_status_fails_after_one_attempt() {
    let site = FakeSite::new();

    let extractor = VideoExtractor::with_base_url(client(site.clone(), 5), SITE);
    let err = extractor.fetch_video_info(&vid(600)).await.unwrap_err();

    assert_eq!(err.kind(), "fetch");
    assert_eq!(site.calls(&format!("{SITE}/v/ac600")), 1);
}

#[test]
fn identifiers_accept_urls_and_prefixes() {
    let from_url: Vid = "https://www.acfun.cn/v/ac41502955".parse().unwrap();
    let prefixed: Vid = "ac41502955".parse().unwrap();
    assert_eq!(from_url, prefixed);
    assert!("not-a-video".parse::<Vid>().is_err());
}
