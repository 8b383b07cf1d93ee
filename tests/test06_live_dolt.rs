//! Runs against a real Dolt sql-server when `DOLT_TEST_HOST` is set, e.g.
//! `DOLT_TEST_HOST=127.0.0.1 cargo test --test test06_live_dolt`. The other
//! `DOLT_*` variables (user, port, password) are honored when present.

use dolt_middleware::prelude::*;
use serde_json::json;

fn live_config() -> Option<DoltConfig> {
    let host = std::env::var("DOLT_TEST_HOST").ok()?;
    let mut config = DoltConfig::from_env().ok()?;
    config.host = host;
    if config.user.is_empty() {
        config.user = "root".into();
    }
    if config.port == 0 {
        config.port = 3306;
    }
    config.database_name = None;
    config.branch = None;
    config.validate().ok()?;
    Some(config)
}

#[tokio::test]
async fn branch_scoped_round_trip() -> Result<(), DoltMiddlewareError> {
    let Some(config) = live_config() else {
        eprintln!("DOLT_TEST_HOST not set, skipping");
        return Ok(());
    };
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let ctx = RequestContext::new();
    let actions = DoltActions::connect(&ctx, &config).await?;
    let db_name = format!("mw_test_{}", std::process::id());
    let base = || ArgMap::default().with("database", db_name.clone());

    actions.create_database(&ctx, &base()).await?;

    let tx = ScopedTransaction::begin_scoped(&ctx, &config, Scope::on_database(&db_name)).await?;
    let inner = ctx.clone();
    with_transaction(&ctx, tx, move |tx| {
        Box::pin(async move {
            tx.exec(&inner, "CREATE TABLE t (id INT PRIMARY KEY, note TEXT)").await?;
            tx.exec(&inner, "INSERT INTO t VALUES (1, 'a,b')").await?;
            tx.exec(&inner, "CALL DOLT_COMMIT('-Am', 'seed')").await
        })
    })
    .await?;

    actions
        .create_dolt_branch(&ctx, &base().with("new_branch", "dev"))
        .await?;
    actions
        .exec(
            &ctx,
            &base()
                .with("branch", "dev")
                .with("query", "INSERT INTO t VALUES (2, NULL)"),
        )
        .await?;

    // a duplicate key on dev must leave dev's table unchanged
    let dup = actions
        .exec(
            &ctx,
            &base()
                .with("branch", "dev")
                .with("query", "INSERT INTO t VALUES (2, 'dup')"),
        )
        .await;
    assert!(dup.is_err());

    let dev_rows = actions
        .query(
            &ctx,
            &ArgMap::from_value(json!({
                "database": db_name.clone(),
                "branch": "dev",
                "query": "SELECT id, note FROM t ORDER BY id",
                "result_format": "csv",
            }))?,
        )
        .await?;
    assert_eq!(dev_rows, "id,note\n1,\"a,b\"\n2,\n");

    let main_rows = actions
        .query(
            &ctx,
            &base()
                .with("branch", "main")
                .with("query", "SELECT id FROM t")
                .with("result_format", "csv"),
        )
        .await?;
    assert_eq!(main_rows, "id\n1\n");

    actions.drop_database(&ctx, &base()).await?;
    Ok(())
}
