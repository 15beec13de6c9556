//! End-to-end pipeline tests: listing, title pages, store and CSV output

use cinecrawl::config::{load_config, Config};
use cinecrawl::crawler::{build_fetch_client, crawl_movies, harvest_links};
use cinecrawl::output::{read_links, MOVIES_HEADER};
use cinecrawl::storage::{MovieStore, SqliteStore};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PAGE: &str = r#"<html><head><script type="application/ld+json">
{"itemListElement":[
  {"item":{"url":"https://www.imdb.com/title/tt0111161/","name":"The Shawshank Redemption"}},
  {"item":{"url":"https://www.imdb.com/title/tt0068646/","name":"The Godfather"}},
  {"item":{"url":"https://www.imdb.com/title/tt0468569/","name":"The Dark Knight"}},
  {"item":{"url":"https://www.imdb.com/title/tt0111161/","name":"The Shawshank Redemption"}}
]}</script></head><body></body></html>"#;

fn title_page(title: &str, year: i32, rating: &str, stars: &[&str]) -> String {
    let names: String = stars
        .iter()
        .enumerate()
        .map(|(i, name)| format!(r#"<a href="/name/nm000000{}/">{}</a>"#, i, name))
        .collect();
    format!(
        r#"<html><body><section>
        <h1>{title}</h1>
        <ul><li><a href="/title/tt/releaseinfo">{year}</a></li></ul>
        <div data-testid="hero-rating-bar__aggregate-rating__score"><span>{rating}</span><span>/10</span></div>
        <ul><li data-testid="title-pc-principal-credit"><span>Stars</span>{names}</li></ul>
        <ul><li data-testid="title-techspec_runtime">Runtime 2h 32m</li></ul>
        </section></body></html>"#
    )
}

/// Config writing every output under `dir`, with instant retries
fn config_for(dir: &TempDir, server: &MockServer) -> Config {
    let root = dir.path().display();
    let toml = format!(
        r#"
[fetch]
max-retries = 2
base-delay-ms = 0
max-jitter-ms = 0
timeout-secs = 5

[pool]
worker-count = 3

[harvest]
listing-url = "{uri}/chart/top/"

[output]
database-path = "{root}/cinecrawl.db"
relays-path = "{root}/relays.txt"
links-path = "{root}/links.csv"
movies-path = "{root}/movies.csv"
listing-snapshot-path = "{root}/listing.html"
"#,
        uri = server.uri(),
        root = root,
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    load_config(file.path()).unwrap()
}

async fn mount_title(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/title/{}/", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_listing_to_store_and_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chart/top/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&server)
        .await;
    mount_title(
        &server,
        "tt0111161",
        title_page(
            "The Shawshank Redemption",
            1994,
            "9.3",
            &["Tim Robbins", "Morgan Freeman", "Bob Gunton", "William Sadler"],
        ),
    )
    .await;
    mount_title(
        &server,
        "tt0068646",
        title_page("The Godfather", 1972, "9.2", &["Marlon Brando", "Al Pacino"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/title/tt0468569/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &server);
    let client = build_fetch_client(&config).unwrap();

    let links = harvest_links(&config, &client).await.unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(
        read_links(Path::new(&config.output.links_path)).unwrap(),
        links
    );

    // Point the harvested links at the mock server
    let worklist: Vec<String> = links
        .iter()
        .map(|url| url.replace("https://www.imdb.com", &server.uri()))
        .collect();

    let store = Arc::new(SqliteStore::open(Path::new(&config.output.database_path)).unwrap());
    let report = crawl_movies(
        &config,
        worklist.clone(),
        client,
        store.clone(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.queued, 3);
    assert_eq!(report.dequeued, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.cancelled);

    assert_eq!(store.count_movies().unwrap(), 2);
    assert_eq!(store.count_cast_members().unwrap(), 5);
    let shawshank = store.get_movie_by_url(&worklist[0]).unwrap().unwrap();
    assert_eq!(shawshank.year, Some(1994));
    assert_eq!(shawshank.runtime_minutes, Some(152));
    assert_eq!(
        store.get_cast(shawshank.id).unwrap(),
        vec!["Tim Robbins", "Morgan Freeman", "Bob Gunton"]
    );

    let mut reader = csv::Reader::from_path(&config.output.movies_path).unwrap();
    assert_eq!(reader.headers().unwrap(), MOVIES_HEADER.to_vec());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "The Shawshank Redemption");
    assert_eq!(&rows[0][5], "Tim Robbins, Morgan Freeman, Bob Gunton");
    assert_eq!(&rows[1][0], "The Godfather");
}

#[tokio::test]
async fn test_second_run_leaves_stored_movies_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/title/tt0068646/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(title_page(
            "The Godfather",
            1972,
            "9.2",
            &["Marlon Brando"],
        )))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &server);
    let store = Arc::new(SqliteStore::open(Path::new(&config.output.database_path)).unwrap());
    let worklist = vec![format!("{}/title/tt0068646/", server.uri())];

    for _ in 0..2 {
        let client = build_fetch_client(&config).unwrap();
        crawl_movies(
            &config,
            worklist.clone(),
            client,
            store.clone(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    assert_eq!(store.count_movies().unwrap(), 1);
    assert_eq!(store.count_cast_members().unwrap(), 1);
}

#[tokio::test]
async fn test_cancelled_crawl_still_writes_csv() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &server);
    let client = build_fetch_client(&config).unwrap();
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let worklist = vec![format!("{}/title/tt0111161/", server.uri())];
    let report = crawl_movies(&config, worklist, client, store, cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.records.is_empty());

    let mut reader = csv::Reader::from_path(&config.output.movies_path).unwrap();
    assert_eq!(reader.headers().unwrap(), MOVIES_HEADER.to_vec());
    assert_eq!(reader.records().count(), 0);
}
