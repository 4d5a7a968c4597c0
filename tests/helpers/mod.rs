//! Shared wiremock fixtures for the integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::time::Duration;
use wilayah::{Cascade, Level, RegionClient};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// `{"data": [...]}` body for a list of `(code, name)` pairs.
pub fn regions_body(level: Level, entries: &[(&str, &str)]) -> Value {
    let data: Vec<Value> = entries
        .iter()
        .map(|(code, name)| {
            json!({
                "code": code,
                "name": name,
                "level": level.as_str(),
                "children": [],
            })
        })
        .collect();
    json!({ "data": data })
}

/// Matcher for `GET /regions` at `level`, filtered by `parent` when given.
pub fn regions_request(level: Level, parent: Option<&str>) -> MockBuilder {
    let builder = Mock::given(method("GET"))
        .and(path("/regions"))
        .and(query_param("filter[level]", level.as_str()))
        .and(query_param("include", "children"))
        .and(query_param("per_page", "100"));
    match parent {
        Some(code) => builder.and(query_param("filter[code]", code)),
        None => builder.and(query_param_is_missing("filter[code]")),
    }
}

pub async fn mount_regions(
    server: &MockServer,
    level: Level,
    parent: Option<&str>,
    entries: &[(&str, &str)],
) {
    regions_request(level, parent)
        .respond_with(ResponseTemplate::new(200).set_body_json(regions_body(level, entries)))
        .mount(server)
        .await;
}

pub async fn mount_regions_delayed(
    server: &MockServer,
    level: Level,
    parent: Option<&str>,
    entries: &[(&str, &str)],
    delay: Duration,
) {
    regions_request(level, parent)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(regions_body(level, entries))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub fn client_for(server: &MockServer) -> RegionClient {
    RegionClient::new(&server.uri(), 100, Duration::from_secs(5)).expect("valid base URL")
}

/// Every selection below province is present in its level's loaded list.
pub fn assert_consistent<S: wilayah::RegionSource>(cascade: &Cascade<S>) {
    let state = cascade.state();
    for level in [Level::District, Level::City, Level::Village] {
        if let Some(code) = state.selected(level) {
            assert!(
                state.options(level).iter().any(|r| r.code == code),
                "{} selection {} is not in the loaded list",
                level,
                code
            );
            let parent = level.parent().unwrap();
            assert!(
                state.selected(parent).is_some(),
                "{} is selected without a {}",
                level,
                parent
            );
        }
    }
}

/// Number of requests the server has seen for `level`.
pub async fn requests_for(server: &MockServer, level: Level) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| {
            request
                .url
                .query_pairs()
                .any(|(k, v)| k == "filter[level]" && v == level.as_str())
        })
        .count()
}
