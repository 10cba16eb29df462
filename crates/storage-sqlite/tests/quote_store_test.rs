//! Integration tests for the SQLite quote store, run against a real
//! database file in a temp directory.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use quotecache_core::quotes::{Day, ProviderId, Quote, QuoteStore, Symbol};
use quotecache_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, QuoteRepository};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn fetched(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, hour, 0, 0).unwrap()
}

fn quote(symbol: &str, day: &str, provider: &str, close: f64, fetched_at: DateTime<Utc>) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        day: date(day),
        open: Some(close - 1.0),
        high: Some(close + 1.0),
        low: Some(close - 2.0),
        close: Some(close),
        volume: Some(1_000.0),
        adjusted: true,
        provider: provider.to_string(),
        fetched_at,
    }
}

fn test_repository(dir: &TempDir) -> QuoteRepository {
    let db_path = dir.path().join("quotes.db");
    let db_path = db_path.to_str().unwrap();

    init(db_path).unwrap();
    let pool = create_pool(db_path).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer((*pool).clone());
    QuoteRepository::new(pool, writer)
}

#[tokio::test]
async fn upsert_same_key_twice_keeps_one_row_with_latest_values() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    let first = quote("AAPL", "2026-02-13", "yahoo", 232.47, fetched(9));
    let second = quote("AAPL", "2026-02-13", "yahoo", 233.10, fetched(17));

    repo.upsert_quote(&first).await.unwrap();
    repo.upsert_quote(&second).await.unwrap();

    assert_eq!(repo.total_quotes().unwrap(), 1);

    let stored = repo
        .get(
            &Symbol::new("AAPL"),
            Day::new(date("2026-02-13")),
            &ProviderId::new("yahoo"),
        )
        .unwrap()
        .unwrap();
    assert_eq!(stored.close, Some(233.10));
    assert_eq!(stored.fetched_at, fetched(17));
}

#[tokio::test]
async fn point_lookup_is_keyed_by_symbol_day_and_provider() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    repo.upsert_quotes(&[
        quote("AAPL", "2026-02-13", "yahoo", 232.47, fetched(9)),
        quote("AAPL", "2026-02-13", "polygon", 232.50, fetched(9)),
        quote("AAPL", "2026-02-12", "yahoo", 231.00, fetched(9)),
    ])
    .await
    .unwrap();

    let symbol = Symbol::new("AAPL");
    let hit = repo
        .get(&symbol, Day::new(date("2026-02-13")), &ProviderId::new("polygon"))
        .unwrap();
    assert_eq!(hit.unwrap().close, Some(232.50));

    let miss = repo
        .get(&symbol, Day::new(date("2026-02-11")), &ProviderId::new("yahoo"))
        .unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn range_is_ascending_and_provider_scoped() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    repo.upsert_quotes(&[
        quote("AAPL", "2026-02-12", "yahoo", 231.0, fetched(9)),
        quote("AAPL", "2026-02-10", "yahoo", 229.0, fetched(9)),
        quote("AAPL", "2026-02-11", "yahoo", 230.0, fetched(9)),
        quote("AAPL", "2026-02-11", "polygon", 230.5, fetched(9)),
        quote("AAPL", "2026-02-20", "yahoo", 240.0, fetched(9)),
    ])
    .await
    .unwrap();

    let history = repo
        .range(
            &Symbol::new("AAPL"),
            &ProviderId::new("yahoo"),
            Day::new(date("2026-02-09")),
            Day::new(date("2026-02-13")),
        )
        .unwrap();

    let days: Vec<NaiveDate> = history.iter().map(|q| q.day).collect();
    assert_eq!(
        days,
        vec![date("2026-02-10"), date("2026-02-11"), date("2026-02-12")]
    );
    assert!(history.iter().all(|q| q.provider == "yahoo"));
}

#[tokio::test]
async fn for_day_returns_every_provider_row() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    repo.upsert_quotes(&[
        quote("AAPL", "2026-02-13", "yahoo", 232.47, fetched(9)),
        quote("AAPL", "2026-02-13", "alpha_vantage", 232.40, fetched(10)),
        quote("AAPL", "2026-02-12", "yahoo", 231.00, fetched(9)),
    ])
    .await
    .unwrap();

    let rows = repo
        .for_day(&Symbol::new("AAPL"), Day::new(date("2026-02-13")))
        .unwrap();
    let providers: Vec<&str> = rows.iter().map(|q| q.provider.as_str()).collect();
    assert_eq!(providers, vec!["alpha_vantage", "yahoo"]);
}

#[tokio::test]
async fn dump_is_ordered_by_symbol_then_day() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    repo.upsert_quotes(&[
        quote("MSFT", "2026-02-12", "yahoo", 420.0, fetched(9)),
        quote("AAPL", "2026-02-13", "yahoo", 232.0, fetched(9)),
        quote("AAPL", "2026-02-12", "yahoo", 231.0, fetched(9)),
    ])
    .await
    .unwrap();

    let all = repo.dump_all().unwrap();
    let keys: Vec<(String, NaiveDate)> = all.iter().map(|q| (q.symbol.clone(), q.day)).collect();
    assert_eq!(
        keys,
        vec![
            ("AAPL".to_string(), date("2026-02-12")),
            ("AAPL".to_string(), date("2026-02-13")),
            ("MSFT".to_string(), date("2026-02-12")),
        ]
    );
}

#[tokio::test]
async fn aggregates_report_counts_bounds_and_providers() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    repo.upsert_quotes(&[
        quote("AAPL", "2026-02-10", "yahoo", 229.0, fetched(9)),
        quote("AAPL", "2026-02-13", "yahoo", 232.0, fetched(17)),
        quote("AAPL", "2026-02-12", "polygon", 231.0, fetched(11)),
        quote("MSFT", "2026-02-13", "yahoo", 420.0, fetched(9)),
    ])
    .await
    .unwrap();

    let coverage = repo.provider_coverage(&Symbol::new("AAPL")).unwrap();
    assert_eq!(coverage.len(), 2);
    let yahoo = coverage.iter().find(|c| c.provider == "yahoo").unwrap();
    assert_eq!(yahoo.quote_count, 2);
    assert_eq!(yahoo.first_day, date("2026-02-10"));
    assert_eq!(yahoo.last_day, date("2026-02-13"));
    assert_eq!(yahoo.last_fetched_at, fetched(17));

    let inventory = repo.symbol_inventory().unwrap();
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[0].symbol, "AAPL");
    assert_eq!(inventory[0].quote_count, 3);
    assert_eq!(
        inventory[0].providers,
        vec!["polygon".to_string(), "yahoo".to_string()]
    );
    assert_eq!(inventory[1].symbol, "MSFT");

    assert_eq!(repo.total_quotes().unwrap(), 4);
    assert_eq!(
        repo.count_for_pair(&Symbol::new("AAPL"), &ProviderId::new("yahoo"))
            .unwrap(),
        2
    );
    assert!(repo.storage_size_bytes().unwrap() > 0);

    assert!(repo
        .provider_coverage(&Symbol::new("NVDA"))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn concurrent_same_key_upserts_leave_exactly_one_row() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir);

    let a = quote("AAPL", "2026-02-13", "yahoo", 232.0, fetched(9));
    let b = quote("AAPL", "2026-02-13", "yahoo", 233.0, fetched(10));

    let (ra, rb) = tokio::join!(repo.upsert_quote(&a), repo.upsert_quote(&b));
    ra.unwrap();
    rb.unwrap();

    assert_eq!(repo.total_quotes().unwrap(), 1);
    let stored = repo
        .get(
            &Symbol::new("AAPL"),
            Day::new(date("2026-02-13")),
            &ProviderId::new("yahoo"),
        )
        .unwrap()
        .unwrap();
    // last-committed-wins: the row matches one of the writes, never a mix
    match stored.close {
        Some(c) if c == 232.0 => assert_eq!(stored.fetched_at, fetched(9)),
        Some(c) if c == 233.0 => assert_eq!(stored.fetched_at, fetched(10)),
        other => panic!("unexpected close {:?}", other),
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("quotes.db");
    let db_path = db_path.to_str().unwrap();

    init(db_path).unwrap();
    let pool = create_pool(db_path).unwrap();
    run_migrations(&pool).unwrap();
    run_migrations(&pool).unwrap();

    let writer = spawn_writer((*pool).clone());
    let repo = QuoteRepository::new(pool, writer);
    repo.upsert_quote(&quote("AAPL", "2026-02-13", "yahoo", 232.0, fetched(9)))
        .await
        .unwrap();
    assert_eq!(repo.total_quotes().unwrap(), 1);
}
