//! HTTP behaviour of the region client.

mod helpers;

use helpers::{client_for, mount_regions, regions_request};
use std::time::Duration;
use wilayah::{CachedSource, FetchError, Level, RegionQuery, RegionSource};
use wiremock::{MockServer, ResponseTemplate};

#[tokio::test]
async fn decodes_regions_for_the_requested_level() {
    let server = MockServer::start().await;
    mount_regions(
        &server,
        Level::District,
        Some("32"),
        &[("3201", "Kabupaten Bogor"), ("3202", "Kabupaten Sukabumi")],
    )
    .await;

    let regions = client_for(&server)
        .fetch(&RegionQuery::children(Level::District, "32"))
        .await
        .unwrap();

    assert_eq!(regions.len(), 2);
    assert_eq!(regions[1].name, "Kabupaten Sukabumi");
    assert!(regions.iter().all(|r| r.level == Level::District));
}

#[tokio::test]
async fn http_error_status_is_reported() {
    let server = MockServer::start().await;
    regions_request(Level::Province, None)
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch(&RegionQuery::provinces())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Http { status: 503, .. }));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    regions_request(Level::Province, None)
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch(&RegionQuery::provinces())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    regions_request(Level::Province, None)
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client =
        wilayah::RegionClient::new(&server.uri(), 100, Duration::from_millis(50)).unwrap();
    let err = client.fetch(&RegionQuery::provinces()).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn cached_source_hits_the_endpoint_once() {
    let server = MockServer::start().await;
    regions_request(Level::Province, None)
        .respond_with(ResponseTemplate::new(200).set_body_json(helpers::regions_body(
            Level::Province,
            &[("32", "Jawa Barat")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let source = CachedSource::new(client_for(&server), Duration::from_secs(60));
    for _ in 0..3 {
        let regions = source.fetch(&RegionQuery::provinces()).await.unwrap();
        assert_eq!(regions[0].code, "32");
    }
}
