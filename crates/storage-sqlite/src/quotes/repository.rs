//! Diesel-backed implementation of the `QuoteStore` trait.
//!
//! Reads go through pooled connections; every mutation goes through the
//! single-writer actor. Upserts use SQLite's native
//! `INSERT ... ON CONFLICT ... DO UPDATE` on the `(symbol, day, provider)`
//! key, so concurrent writers on one key resolve to last-committed-wins.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;
use diesel::upsert::excluded;

use super::model::{parse_datetime, parse_day, QuoteDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::quotes::dsl as quotes_dsl;
use quotecache_core::quotes::{
    Day, ProviderCoverage, ProviderId, Quote, QuoteStore, Symbol, SymbolCoverage,
};
use quotecache_core::Result;

pub struct QuoteRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl QuoteRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn upsert_row(conn: &mut SqliteConnection, row: &QuoteDB) -> Result<()> {
    diesel::insert_into(quotes_dsl::quotes)
        .values(row)
        .on_conflict((quotes_dsl::symbol, quotes_dsl::day, quotes_dsl::provider))
        .do_update()
        .set((
            quotes_dsl::open.eq(excluded(quotes_dsl::open)),
            quotes_dsl::high.eq(excluded(quotes_dsl::high)),
            quotes_dsl::low.eq(excluded(quotes_dsl::low)),
            quotes_dsl::close.eq(excluded(quotes_dsl::close)),
            quotes_dsl::volume.eq(excluded(quotes_dsl::volume)),
            quotes_dsl::adjusted.eq(excluded(quotes_dsl::adjusted)),
            quotes_dsl::fetched_at.eq(excluded(quotes_dsl::fetched_at)),
        ))
        .execute(conn)
        .map_err(StorageError::QueryFailed)?;
    Ok(())
}

#[derive(QueryableByName, Debug)]
struct CoverageRow {
    #[diesel(sql_type = Text)]
    provider: String,
    #[diesel(sql_type = BigInt)]
    quote_count: i64,
    #[diesel(sql_type = Text)]
    first_day: String,
    #[diesel(sql_type = Text)]
    last_day: String,
    #[diesel(sql_type = Text)]
    last_fetched_at: String,
}

#[derive(QueryableByName, Debug)]
struct InventoryRow {
    #[diesel(sql_type = Text)]
    symbol: String,
    #[diesel(sql_type = BigInt)]
    quote_count: i64,
    #[diesel(sql_type = Text)]
    providers: String,
    #[diesel(sql_type = Text)]
    first_day: String,
    #[diesel(sql_type = Text)]
    last_day: String,
    #[diesel(sql_type = Text)]
    last_fetched_at: String,
}

#[derive(QueryableByName, Debug)]
struct SizeRow {
    #[diesel(sql_type = BigInt)]
    size_bytes: i64,
}

#[async_trait]
impl QuoteStore for QuoteRepository {
    // =========================================================================
    // Mutations
    // =========================================================================

    async fn upsert_quote(&self, quote: &Quote) -> Result<Quote> {
        let row = QuoteDB::from(quote);
        let stored = quote.clone();

        self.writer
            .exec(move |conn: &mut SqliteConnection| upsert_row(conn, &row))
            .await?;

        Ok(stored)
    }

    async fn upsert_quotes(&self, quotes: &[Quote]) -> Result<usize> {
        if quotes.is_empty() {
            return Ok(0);
        }
        let rows: Vec<QuoteDB> = quotes.iter().map(QuoteDB::from).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| {
                let mut written = 0usize;
                for row in &rows {
                    upsert_row(conn, row)?;
                    written += 1;
                }
                Ok(written)
            })
            .await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn get(&self, symbol: &Symbol, day: Day, provider: &ProviderId) -> Result<Option<Quote>> {
        let mut conn = get_connection(&self.pool)?;

        let result = quotes_dsl::quotes
            .filter(quotes_dsl::symbol.eq(symbol.as_str()))
            .filter(quotes_dsl::day.eq(day.to_string()))
            .filter(quotes_dsl::provider.eq(provider.as_str()))
            .first::<QuoteDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(Quote::from))
    }

    fn range(
        &self,
        symbol: &Symbol,
        provider: &ProviderId,
        start: Day,
        end: Day,
    ) -> Result<Vec<Quote>> {
        let mut conn = get_connection(&self.pool)?;

        let results = quotes_dsl::quotes
            .filter(quotes_dsl::symbol.eq(symbol.as_str()))
            .filter(quotes_dsl::provider.eq(provider.as_str()))
            .filter(quotes_dsl::day.ge(start.to_string()))
            .filter(quotes_dsl::day.le(end.to_string()))
            .order(quotes_dsl::day.asc())
            .load::<QuoteDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Quote::from).collect())
    }

    fn for_day(&self, symbol: &Symbol, day: Day) -> Result<Vec<Quote>> {
        let mut conn = get_connection(&self.pool)?;

        let results = quotes_dsl::quotes
            .filter(quotes_dsl::symbol.eq(symbol.as_str()))
            .filter(quotes_dsl::day.eq(day.to_string()))
            .order(quotes_dsl::provider.asc())
            .load::<QuoteDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Quote::from).collect())
    }

    fn count_for_pair(&self, symbol: &Symbol, provider: &ProviderId) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;

        quotes_dsl::quotes
            .filter(quotes_dsl::symbol.eq(symbol.as_str()))
            .filter(quotes_dsl::provider.eq(provider.as_str()))
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    fn dump_all(&self) -> Result<Vec<Quote>> {
        let mut conn = get_connection(&self.pool)?;

        let results = quotes_dsl::quotes
            .order((quotes_dsl::symbol.asc(), quotes_dsl::day.asc()))
            .load::<QuoteDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(Quote::from).collect())
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    fn provider_coverage(&self, symbol: &Symbol) -> Result<Vec<ProviderCoverage>> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<CoverageRow> = sql_query(
            "SELECT provider, COUNT(*) AS quote_count, \
                    MIN(day) AS first_day, MAX(day) AS last_day, \
                    MAX(fetched_at) AS last_fetched_at \
             FROM quotes WHERE symbol = ? \
             GROUP BY provider ORDER BY provider",
        )
        .bind::<Text, _>(symbol.as_str())
        .load::<CoverageRow>(&mut conn)
        .into_core()?;

        Ok(rows
            .into_iter()
            .map(|row| ProviderCoverage {
                provider: row.provider,
                quote_count: row.quote_count,
                first_day: parse_day(&row.first_day),
                last_day: parse_day(&row.last_day),
                last_fetched_at: parse_datetime(&row.last_fetched_at),
            })
            .collect())
    }

    fn symbol_inventory(&self) -> Result<Vec<SymbolCoverage>> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<InventoryRow> = sql_query(
            "SELECT symbol, COUNT(*) AS quote_count, \
                    GROUP_CONCAT(DISTINCT provider) AS providers, \
                    MIN(day) AS first_day, MAX(day) AS last_day, \
                    MAX(fetched_at) AS last_fetched_at \
             FROM quotes \
             GROUP BY symbol ORDER BY symbol",
        )
        .load::<InventoryRow>(&mut conn)
        .into_core()?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut providers: Vec<String> =
                    row.providers.split(',').map(str::to_string).collect();
                providers.sort();
                SymbolCoverage {
                    symbol: row.symbol,
                    quote_count: row.quote_count,
                    providers,
                    first_day: parse_day(&row.first_day),
                    last_day: parse_day(&row.last_day),
                    last_fetched_at: parse_datetime(&row.last_fetched_at),
                }
            })
            .collect())
    }

    fn total_quotes(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        quotes_dsl::quotes
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    fn storage_size_bytes(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let row: SizeRow = sql_query(
            "SELECT page_count * page_size AS size_bytes \
             FROM pragma_page_count(), pragma_page_size()",
        )
        .get_result::<SizeRow>(&mut conn)
        .into_core()?;
        Ok(row.size_bytes)
    }
}
