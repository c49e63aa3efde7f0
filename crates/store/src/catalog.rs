use std::collections::HashMap;

use alloy_primitives::Address;
use arb_types::{CatalogError, Cycle, Pool, RouteStep, Token, parse_address};
use sqlx::{Row, sqlite::SqlitePoolOptions};

#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub tokens: HashMap<Address, Token>,
    pub pools:  HashMap<Address, Pool>,
    pub cycles: HashMap<i64, Cycle>
}

/// Opens `db_name`, reads the three catalog relations, and closes the
/// connection before returning — per §4.1, the catalog connection must not
/// outlive `load()`.
pub async fn load_catalog(db_name: &str) -> Result<LoadedCatalog, CatalogError> {
    let url = format!("sqlite://{db_name}");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .map_err(|e| CatalogError::Connection(e.to_string()))?;

    let tokens = load_tokens(&pool).await?;
    let pools = load_pools(&pool).await?;
    let cycles = load_cycles(&pool, &pools).await?;

    pool.close().await;

    Ok(LoadedCatalog { tokens, pools, cycles })
}

async fn load_tokens(pool: &sqlx::SqlitePool) -> Result<HashMap<Address, Token>, CatalogError> {
    let rows = sqlx::query("SELECT address, symbol, name, decimals FROM TokenInfo")
        .fetch_all(pool)
        .await
        .map_err(|e| CatalogError::MalformedRow { table: "TokenInfo", reason: e.to_string() })?;

    let mut tokens = HashMap::with_capacity(rows.len());
    for row in rows {
        let address_raw: String = row.try_get("address").map_err(|e| CatalogError::MalformedRow {
            table:  "TokenInfo",
            reason: e.to_string()
        })?;
        let symbol: String = row
            .try_get("symbol")
            .map_err(|e| CatalogError::MalformedRow { table: "TokenInfo", reason: e.to_string() })?;
        let name: String = row
            .try_get("name")
            .map_err(|e| CatalogError::MalformedRow { table: "TokenInfo", reason: e.to_string() })?;
        let decimals: i64 = row.try_get("decimals").map_err(|e| CatalogError::MalformedRow {
            table:  "TokenInfo",
            reason: e.to_string()
        })?;

        let address = parse_address(&address_raw)?;
        if !(0..=30).contains(&decimals) {
            return Err(CatalogError::DecimalsOutOfRange { token: address, decimals: decimals as u32 });
        }

        tokens.insert(address, Token { address, symbol, name, decimals: decimals as u8 });
    }
    Ok(tokens)
}

async fn load_pools(pool: &sqlx::SqlitePool) -> Result<HashMap<Address, Pool>, CatalogError> {
    let rows = sqlx::query("SELECT address, token1_address, token2_address FROM LPInfo")
        .fetch_all(pool)
        .await
        .map_err(|e| CatalogError::MalformedRow { table: "LPInfo", reason: e.to_string() })?;

    let mut pools = HashMap::with_capacity(rows.len());
    for row in rows {
        let address_raw: String = row.try_get("address").map_err(|e| CatalogError::MalformedRow {
            table:  "LPInfo",
            reason: e.to_string()
        })?;
        let token1_raw: String = row.try_get("token1_address").map_err(|e| {
            CatalogError::MalformedRow { table: "LPInfo", reason: e.to_string() }
        })?;
        let token2_raw: String = row.try_get("token2_address").map_err(|e| {
            CatalogError::MalformedRow { table: "LPInfo", reason: e.to_string() }
        })?;

        let address = parse_address(&address_raw)?;
        let token1 = parse_address(&token1_raw)?;
        let token2 = parse_address(&token2_raw)?;

        pools.insert(address, Pool::new(address, token1, token2));
    }
    Ok(pools)
}

async fn load_cycles(
    pool: &sqlx::SqlitePool,
    pools: &HashMap<Address, Pool>
) -> Result<HashMap<i64, Cycle>, CatalogError> {
    let rows = sqlx::query("SELECT id, path FROM Route")
        .fetch_all(pool)
        .await
        .map_err(|e| CatalogError::MalformedRow { table: "Route", reason: e.to_string() })?;

    let mut cycles = HashMap::with_capacity(rows.len());
    for row in rows {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| CatalogError::MalformedRow { table: "Route", reason: e.to_string() })?;
        let path: String = row
            .try_get("path")
            .map_err(|e| CatalogError::MalformedRow { table: "Route", reason: e.to_string() })?;

        let steps = parse_route_path(id, &path, pools)?;
        cycles.insert(id, Cycle { id, steps });
    }
    Ok(cycles)
}

/// `Route.path` is JSON of shape `[[<target_addr>, [<lp_addr>]], ...]`. The
/// route generator's `lp` list is always a singleton in practice; the first
/// (and only expected) entry is authoritative.
fn parse_route_path(
    route_id: i64,
    path: &str,
    pools: &HashMap<Address, Pool>
) -> Result<Vec<RouteStep>, CatalogError> {
    let raw: Vec<(String, Vec<String>)> = serde_json::from_str(path)
        .map_err(|e| CatalogError::MalformedPath { route_id, reason: e.to_string() })?;

    raw.into_iter()
        .map(|(target_raw, lp_raw)| {
            let target = parse_address(&target_raw)?;
            let lp_addr_raw = lp_raw.first().ok_or_else(|| CatalogError::MalformedPath {
                route_id,
                reason: "step has no lp address".to_string()
            })?;
            let lp = parse_address(lp_addr_raw)?;

            if !pools.contains_key(&lp) {
                return Err(CatalogError::UnknownPool { route_id, pool: lp });
            }

            Ok(RouteStep { target, lp })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use sqlx::Executor;

    use super::*;

    async fn seeded_pool() -> sqlx::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        pool.execute(
            "CREATE TABLE TokenInfo (address TEXT PRIMARY KEY, symbol TEXT, name TEXT, decimals INTEGER)"
        )
        .await
        .unwrap();
        pool.execute(
            "CREATE TABLE LPInfo (address TEXT PRIMARY KEY, token1_address TEXT, token2_address TEXT)"
        )
        .await
        .unwrap();
        pool.execute("CREATE TABLE Route (id INTEGER PRIMARY KEY, path TEXT, created_at DATETIME)")
            .await
            .unwrap();

        let weth = "0x0000000000000000000000000000000000000a";
        let dai = "0x0000000000000000000000000000000000000b";
        let lp = "0x0000000000000000000000000000000000000c";

        sqlx::query("INSERT INTO TokenInfo VALUES (?, 'WETH', 'Wrapped Ether', 18)")
            .bind(weth)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO TokenInfo VALUES (?, 'DAI', 'Dai Stablecoin', 18)")
            .bind(dai)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO LPInfo VALUES (?, ?, ?)")
            .bind(lp)
            .bind(weth)
            .bind(dai)
            .execute(&pool)
            .await
            .unwrap();

        let path = format!(r#"[["{dai}", ["{lp}"]], ["{weth}", ["{lp}"]]]"#);
        sqlx::query("INSERT INTO Route (id, path, created_at) VALUES (1, ?, '2024-01-01')")
            .bind(path)
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    #[tokio::test]
    async fn loads_tokens_pools_and_cycles() {
        let pool = seeded_pool().await;
        let tokens = load_tokens(&pool).await.unwrap();
        let pools = load_pools(&pool).await.unwrap();
        let cycles = load_cycles(&pool, &pools).await.unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(pools.len(), 1);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[&1].steps.len(), 2);
    }

    #[tokio::test]
    async fn rejects_route_referencing_unknown_pool() {
        let pools = HashMap::new();
        let unknown_lp = "0x00000000000000000000000000000000000fff";
        let target = "0x0000000000000000000000000000000000000a";
        let path = format!(r#"[["{target}", ["{unknown_lp}"]]]"#);

        let err = parse_route_path(1, &path, &pools).unwrap_err();
        assert_matches::assert_matches!(err, CatalogError::UnknownPool { .. });
    }

    #[tokio::test]
    async fn rejects_malformed_json_path() {
        let pools = HashMap::new();
        let err = parse_route_path(1, "not json", &pools).unwrap_err();
        assert_matches::assert_matches!(err, CatalogError::MalformedPath { .. });
    }

    #[tokio::test]
    async fn rejects_decimals_out_of_range() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        pool.execute(
            "CREATE TABLE TokenInfo (address TEXT PRIMARY KEY, symbol TEXT, name TEXT, decimals INTEGER)"
        )
        .await
        .unwrap();
        sqlx::query("INSERT INTO TokenInfo VALUES ('0x0000000000000000000000000000000000000a', 'X', 'X', 31)")
            .execute(&pool)
            .await
            .unwrap();

        let err = load_tokens(&pool).await.unwrap_err();
        assert_matches::assert_matches!(err, CatalogError::DecimalsOutOfRange { .. });
    }
}
