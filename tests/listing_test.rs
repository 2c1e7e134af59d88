//! UP listing pagination against a scripted listing endpoint.

mod common;

use acfun_dl::extractor::{Uid, UpLister};
use acfun_dl::http::TransportError;
use common::{client, serve_listing, FakeSite, SITE};
use futures::StreamExt;
use std::time::Duration;

fn lister(site: std::sync::Arc<FakeSite>, page_size: usize) -> UpLister {
    UpLister::with_base_url(client(site, 2), SITE)
        .page_size(page_size)
        .page_delay(Duration::ZERO)
}

fn uid(id: u64) -> Uid {
    id.to_string().parse().unwrap()
}

#[tokio::test]
async fn max_stops_listing_without_fetching_further_pages() {
    let site = FakeSite::new();
    let ids: Vec<u64> = (1..=23).map(|n| 1000 + n).collect();
    serve_listing(&site, 7, &ids, 10);

    let lister = lister(site.clone(), 10);
    let uid = uid(7);
    let listed: Vec<String> = lister
        .list_videos(&uid, Some(15))
        .map(|item| item.unwrap().as_str().to_string())
        .collect()
        .await;

    let expected: Vec<String> = ids[..15].iter().map(|id| id.to_string()).collect();
    assert_eq!(listed, expected);
    assert_eq!(site.calls_with_prefix(&format!("{SITE}/u/7")), 2);
}

#[tokio::test]
async fn short_page_ends_listing() {
    let site = FakeSite::new();
    let ids: Vec<u64> = (1..=23).collect();
    serve_listing(&site, 8, &ids, 10);

    let videos = lister(site.clone(), 10).collect_videos(&uid(8), None).await.unwrap();

    assert_eq!(videos.len(), 23);
    assert_eq!(videos[0].title, "video 1");
    assert!(videos[0].upload_date.is_some());
    // 10 + 10 + 3: the short third page is the last request
    assert_eq!(site.calls_with_prefix(&format!("{SITE}/u/8")), 3);
}

#[tokio::test]
async fn exact_multiple_needs_one_empty_page() {
    let site = FakeSite::new();
    let ids: Vec<u64> = (1..=20).collect();
    serve_listing(&site, 9, &ids, 10);

    let videos = lister(site.clone(), 10).collect_videos(&uid(9), None).await.unwrap();

    assert_eq!(videos.len(), 20);
    assert_eq!(site.calls_with_prefix(&format!("{SITE}/u/9")), 3);
}

#[tokio::test]
async fn failing_page_ends_stream_after_earlier_items() {
    let site = FakeSite::new();
    let ids: Vec<u64> = (1..=10).collect();
    site.text(
        format!("{SITE}/u/5?page=1"),
        vec![Ok(common::listing_body(&ids))],
    );
    site.text(
        format!("{SITE}/u/5?page=2"),
        vec![Err(TransportError::Status(500))],
    );

    let lister = lister(site.clone(), 10);
    let uid = uid(5);
    let items: Vec<_> = lister.list_summaries(&uid, None).collect().await;

    assert_eq!(items.len(), 11);
    assert!(items[..10].iter().all(|item| item.is_ok()));
    let err = items[10].as_ref().unwrap_err();
    assert_eq!(err.kind(), "fetch");
    // page 2 was retried within the budget of 2
    assert_eq!(site.calls(&format!("{SITE}/u/5?page=2")), 2);
}

#[tokio::test]
async fn malformed_listing_is_parse_error() {
    let site = FakeSite::new();
    site.text(
        format!("{SITE}/u/6?page=1"),
        vec![Ok("<html>not the endpoint</html>".to_string())],
    );

    let err = lister(site, 10).collect_videos(&uid(6), None).await.unwrap_err();
    assert_eq!(err.kind(), "parse");
}
