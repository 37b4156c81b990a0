// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog proxy tests.
//!
//! Route handling is checked against the fake catalog; the TMDB client is
//! checked against a small local HTTP server standing in for TMDB.

use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reelhouse::error::AppError;
use reelhouse::services::catalog::{
    CatalogProvider, CatalogRequest, DiscoverQuery, MovieList, SortKey, TmdbClient, TrendingWindow,
};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

mod common;

use common::{create_test_app, create_test_app_with_catalog, send, FakeCatalog};

// ─── Route translation ───────────────────────────────────────────

#[tokio::test]
async fn test_list_routes() {
    let test = create_test_app();

    #[rustfmt::skip]
    let cases = [
        ("/api/movies/popular", CatalogRequest::List { list: MovieList::Popular, page: 1 }),
        (
            "/api/movies/top-rated?page=4",
            CatalogRequest::List { list: MovieList::TopRated, page: 4 },
        ),
        ("/api/movies/upcoming", CatalogRequest::List { list: MovieList::Upcoming, page: 1 }),
        (
            "/api/movies/now-playing?page=2",
            CatalogRequest::List { list: MovieList::NowPlaying, page: 2 },
        ),
        ("/api/movies/trending", CatalogRequest::Trending(TrendingWindow::Week)),
        ("/api/movies/trending?timeWindow=day", CatalogRequest::Trending(TrendingWindow::Day)),
        ("/api/movies/genres", CatalogRequest::Genres),
        ("/api/movies/genre/28?page=3", CatalogRequest::ByGenre { genre_id: 28, page: 3 }),
        ("/api/movies/27205", CatalogRequest::Movie(27205)),
        ("/api/movies/27205/credits", CatalogRequest::Credits(27205)),
        ("/api/movies/27205/videos", CatalogRequest::Videos(27205)),
        ("/api/movies/27205/similar", CatalogRequest::Similar { movie_id: 27205, page: 1 }),
        ("/api/movies/27205/images", CatalogRequest::Images(27205)),
        ("/api/person/6193", CatalogRequest::Person(6193)),
        ("/api/person/6193/movie_credits", CatalogRequest::PersonMovies(6193)),
    ];

    for (uri, expected) in cases {
        let (status, _) = send(&test.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(test.catalog.last_request(), Some(expected), "{}", uri);
    }
}

#[tokio::test]
async fn test_body_is_passed_through() {
    let test = create_test_app();
    let (status, body) = send(&test.router, Method::GET, "/api/movies/603", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 603, "title": "Movie 603" }));
}

#[tokio::test]
async fn test_search() {
    let test = create_test_app();

    let (status, body) = send(
        &test.router,
        Method::GET,
        "/api/movies/search?query=the%20matrix&page=2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "/search/movie");
    assert_eq!(body["query"]["query"], "the matrix");
    assert_eq!(body["query"]["page"], "2");

    for uri in ["/api/movies/search", "/api/movies/search?query=%20%20"] {
        let (status, body) = send(&test.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["message"], "Query is required");
    }
}

#[tokio::test]
async fn test_discover_filters_forwarded() {
    let test = create_test_app();

    let (status, body) = send(
        &test.router,
        Method::GET,
        concat!(
            "/api/movies/discover?genre=28,878&year_from=1999&year_to=2010",
            "&sort_by=vote_average.desc&rating_min=7"
        ),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "/discover/movie");
    assert_eq!(body["query"]["with_genres"], "28,878");
    assert_eq!(body["query"]["primary_release_date.gte"], "1999-01-01");
    assert_eq!(body["query"]["primary_release_date.lte"], "2010-12-31");
    assert_eq!(body["query"]["vote_average.gte"], "7");

    match test.catalog.last_request() {
        Some(CatalogRequest::Discover(DiscoverQuery { sort_by, page, .. })) => {
            assert_eq!(sort_by, SortKey::VoteAverageDesc);
            assert_eq!(page, 1);
        }
        other => panic!("unexpected request {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_parameters_never_reach_catalog() {
    let test = create_test_app();

    for uri in [
        "/api/movies/popular?page=0",
        "/api/movies/popular?page=501",
        "/api/movies/popular?page=abc",
        "/api/movies/trending?timeWindow=month",
        "/api/movies/discover?sort_by=budget.desc",
        "/api/movies/discover?year_from=2010&year_to=1999",
        "/api/movies/discover?language=english",
        "/api/movies/abc",
        "/api/movies/0/credits",
        "/api/person/-1",
    ] {
        let (status, _) = send(&test.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }

    assert!(test.catalog.requests().is_empty());
}

#[tokio::test]
async fn test_catalog_not_found() {
    let test = create_test_app_with_catalog(FakeCatalog::with_missing(&[999999]));
    let (status, body) = send(&test.router, Method::GET, "/api/movies/999999", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found");
}

// ─── TMDB client ─────────────────────────────────────────────────

async fn movie(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if params.get("api_key").map(String::as_str) != Some("fake_key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "status_code": 7 }))).into_response();
    }
    match id.as_str() {
        "404" => (StatusCode::NOT_FOUND, Json(json!({ "status_code": 34 }))).into_response(),
        "429" => {
            (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "status_code": 25 }))).into_response()
        }
        "500" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "408" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({})).into_response()
        }
        _ => {
            let id = id.parse::<i64>().unwrap_or(0);
            Json(json!({ "id": id, "title": "Inception" })).into_response()
        }
    }
}

async fn discover(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    Json(json!({ "echo": params }))
}

/// Serve a fake TMDB on an ephemeral port; returns its base URL.
async fn spawn_fake_tmdb() -> String {
    let app = Router::new()
        .route("/3/movie/{id}", get(movie))
        .route("/3/discover/movie", get(discover));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/3", addr)
}

fn client(base_url: &str, api_key: &str, timeout: Duration) -> TmdbClient {
    TmdbClient::new(base_url, api_key.to_string(), timeout).unwrap()
}

#[tokio::test]
async fn test_tmdb_client_success() {
    let base = spawn_fake_tmdb().await;
    let tmdb = client(&base, "fake_key", Duration::from_secs(2));

    let body = tmdb.fetch(&CatalogRequest::Movie(27205)).await.unwrap();
    assert_eq!(body, json!({ "id": 27205, "title": "Inception" }));
}

#[tokio::test]
async fn test_tmdb_client_sends_query_and_key() {
    let base = spawn_fake_tmdb().await;
    let tmdb = client(&base, "fake_key", Duration::from_secs(2));

    let body = tmdb
        .fetch(&CatalogRequest::ByGenre {
            genre_id: 35,
            page: 2,
        })
        .await
        .unwrap();
    assert_eq!(body["echo"]["with_genres"], "35");
    assert_eq!(body["echo"]["page"], "2");
    assert_eq!(body["echo"]["api_key"], "fake_key");
}

#[tokio::test]
async fn test_tmdb_client_error_mapping() {
    let base = spawn_fake_tmdb().await;
    let tmdb = client(&base, "fake_key", Duration::from_secs(2));

    let err = tmdb.fetch(&CatalogRequest::Movie(404)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{:?}", err);

    let err = tmdb.fetch(&CatalogRequest::Movie(429)).await.unwrap_err();
    assert!(matches!(&err, AppError::Upstream(msg) if msg == "rate limited"), "{:?}", err);

    let err = tmdb.fetch(&CatalogRequest::Movie(500)).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)), "{:?}", err);
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

    let wrong_key = client(&base, "other_key", Duration::from_secs(2));
    let err = wrong_key.fetch(&CatalogRequest::Movie(1)).await.unwrap_err();
    assert!(matches!(&err, AppError::Upstream(msg) if msg == "API key rejected"), "{:?}", err);
}

#[tokio::test]
async fn test_tmdb_client_timeout() {
    let base = spawn_fake_tmdb().await;
    let tmdb = client(&base, "fake_key", Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = tmdb.fetch(&CatalogRequest::Movie(408)).await.unwrap_err();
    assert!(matches!(&err, AppError::Upstream(msg) if msg == "timed out"), "{:?}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_tmdb_client_unreachable() {
    let tmdb = client("http://127.0.0.1:9/3", "fake_key", Duration::from_millis(500));
    let err = tmdb.fetch(&CatalogRequest::Movie(1)).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)), "{:?}", err);
}

#[test]
fn test_tmdb_client_rejects_empty_key() {
    let blank_key = TmdbClient::new("http://127.0.0.1/3", "  ".to_string(), Duration::from_secs(1));
    assert!(blank_key.is_err());
}
