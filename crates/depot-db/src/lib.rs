//! # Database Persistence Layer
//!
//! Optional Postgres persistence for the depot movement stack via SQLx.
//!
//! ## Architecture
//!
//! The database layer is optional. When `DATABASE_URL` is set, a service
//! embedding the engine persists booking headers, asset rows, and ledger
//! entries after each operation and hydrates the in-memory store once on
//! startup. When absent, the stack runs in-memory only (suitable for
//! development and testing).
//!
//! The in-memory store remains the source of truth at runtime: operations
//! never read through to Postgres, and hydration loads rows exactly as
//! written. A row hydrated mid-booking keeps its attachment columns and
//! whatever prior-state snapshot it carried; reversal has a ledger fallback
//! for rows that carried none.

pub mod assets;
pub mod bookings;
pub mod ledger;

use sqlx::postgres::{PgPool, PgPoolOptions};

use depot_store::MovementStore;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. \
                 Bookings will not survive a restart."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    // Run embedded migrations.
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Hydrate the in-memory movement store from the database.
///
/// Called once on startup when a pool is available, before the store is
/// handed to the engine.
pub async fn hydrate_store(pool: &PgPool, store: &MovementStore) -> Result<(), sqlx::Error> {
    let headers = bookings::load_all(pool).await?;
    let booking_count = headers.len();
    for header in headers {
        store.insert_header(header);
    }

    let assets = assets::load_all(pool).await?;
    let asset_count = assets.len();
    for asset in assets {
        store.insert_asset(asset);
    }

    let entries = ledger::load_all(pool).await?;
    let entry_count = entries.len();
    for entry in entries {
        store.append_entry(entry);
    }

    tracing::info!(
        bookings = booking_count,
        assets = asset_count,
        ledger_entries = entry_count,
        "Hydrated movement store from database"
    );

    Ok(())
}
