#![cfg(feature = "test-utils")]

use std::time::Duration;

use dolt_middleware::prelude::*;
use dolt_middleware::test_utils::ScriptedConnector;

fn scripted() -> ScriptedConnector {
    let connector = ScriptedConnector::new();
    connector
        .with_databases(&["foo", "shop"])
        .with_branches(&["main", "dev"]);
    connector
}

#[tokio::test]
async fn database_failure_prevents_branch_checkout() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let err = ScopedTransaction::begin_with(
        &ctx,
        &connector,
        Scope::on_database_branch("missing", "dev"),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("database not found: missing"));
    assert!(
        !connector
            .statements()
            .iter()
            .any(|s| s.starts_with("CALL DOLT_CHECKOUT"))
    );
    assert_eq!(connector.count("ROLLBACK"), 1);
    assert_eq!(connector.sessions_opened(), connector.sessions_closed());
}

#[tokio::test]
async fn branch_failure_rolls_back() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let err = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database_branch("foo", "nope"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("branch not found: nope"));
    assert_eq!(
        connector.statements(),
        vec![
            "START TRANSACTION".to_string(),
            "USE `foo`;".to_string(),
            "CALL DOLT_CHECKOUT('nope');".to_string(),
            "ROLLBACK".to_string(),
        ]
    );
}

#[tokio::test]
async fn statements_run_on_the_bootstrapped_session() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let mut tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database("foo"))
        .await
        .unwrap();
    tx.query_result_set(&ctx, "SELECT 1;").await.unwrap();
    tx.rollback(&ctx).await.unwrap();

    let select = connector
        .executed()
        .into_iter()
        .find(|e| e.sql == "SELECT 1;")
        .unwrap();
    assert_eq!(select.database.as_deref(), Some("foo"));
    assert_eq!(select.branch, None);
    assert_eq!(connector.sessions_opened(), 1);
}

#[tokio::test]
async fn failing_write_leaves_nothing_committed() {
    let connector = scripted();
    connector.fail_on("INSERT INTO t VALUES (1)", "duplicate primary key given: [1]");
    let ctx = RequestContext::new();

    let tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database_branch("shop", "dev"))
        .await
        .unwrap();
    let inner = ctx.clone();
    let result = with_transaction(&ctx, tx, move |tx| {
        Box::pin(async move {
            tx.exec(&inner, "UPDATE t SET v = 2").await?;
            tx.exec(&inner, "INSERT INTO t VALUES (1)").await
        })
    })
    .await;

    assert!(result.unwrap_err().to_string().contains("duplicate primary key"));
    assert!(connector.committed().is_empty());
    assert_eq!(connector.count("COMMIT"), 0);
    assert_eq!(connector.count("ROLLBACK"), 1);
}

#[tokio::test]
async fn failing_write_in_plain_scope_leaves_nothing_committed() {
    let connector = scripted();
    connector.fail_on("INSERT INTO t VALUES (1)", "duplicate primary key given: [1]");
    let ctx = RequestContext::new();

    let tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::plain())
        .await
        .unwrap();
    let inner = ctx.clone();
    let result = with_transaction(&ctx, tx, move |tx| {
        Box::pin(async move {
            tx.exec(&inner, "INSERT INTO t VALUES (2)").await?;
            tx.exec(&inner, "INSERT INTO t VALUES (1)").await
        })
    })
    .await;

    assert!(result.is_err());
    assert!(connector.committed().is_empty());
    assert_eq!(connector.count("ROLLBACK"), 1);
    assert_eq!(
        connector.statements(),
        vec![
            "START TRANSACTION".to_string(),
            "INSERT INTO t VALUES (2)".to_string(),
            "INSERT INTO t VALUES (1)".to_string(),
            "ROLLBACK".to_string(),
        ]
    );
    assert_eq!(connector.sessions_closed(), 1);
}

#[tokio::test]
async fn successful_body_commits_once() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database_branch("shop", "dev"))
        .await
        .unwrap();
    let inner = ctx.clone();
    with_transaction(&ctx, tx, move |tx| {
        Box::pin(async move { tx.exec(&inner, "INSERT INTO t VALUES (1)").await })
    })
    .await
    .unwrap();

    assert_eq!(connector.committed(), vec!["INSERT INTO t VALUES (1)".to_string()]);
    assert_eq!(connector.count("COMMIT"), 1);
    assert_eq!(connector.count("ROLLBACK"), 0);
    let insert = connector
        .executed()
        .into_iter()
        .find(|e| e.sql.starts_with("INSERT"))
        .unwrap();
    assert_eq!(insert.database.as_deref(), Some("shop"));
    assert_eq!(insert.branch.as_deref(), Some("dev"));
}

#[tokio::test]
async fn finished_transaction_rejects_more_work() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let mut tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::plain())
        .await
        .unwrap();
    tx.commit(&ctx).await.unwrap();
    assert_eq!(tx.state(), TxState::Committed);

    // rollback after commit is a no-op
    tx.rollback(&ctx).await.unwrap();
    assert_eq!(tx.state(), TxState::Committed);
    assert_eq!(connector.count("ROLLBACK"), 0);

    assert!(matches!(
        tx.exec(&ctx, "SELECT 1").await,
        Err(DoltMiddlewareError::TransactionFinished(TxState::Committed))
    ));
    assert!(tx.commit(&ctx).await.is_err());
    assert_eq!(connector.count("COMMIT"), 1);
}

#[tokio::test]
async fn rollback_is_idempotent() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let mut tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::plain())
        .await
        .unwrap();
    tx.rollback(&ctx).await.unwrap();
    tx.rollback(&ctx).await.unwrap();
    assert_eq!(tx.state(), TxState::RolledBack);
    assert_eq!(connector.count("ROLLBACK"), 1);
    assert_eq!(connector.sessions_closed(), 1);
}

#[tokio::test]
async fn failed_commit_ends_rolled_back() {
    let connector = scripted();
    connector.fail_on("COMMIT", "merge conflict detected");
    let ctx = RequestContext::new();

    let mut tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database("foo"))
        .await
        .unwrap();
    let err = tx.commit(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("merge conflict"));
    assert_eq!(tx.state(), TxState::RolledBack);
    assert_eq!(connector.count("ROLLBACK"), 1);
}

#[tokio::test]
async fn read_only_helper_always_rolls_back() {
    let connector = scripted();
    let rows = ResultSet::from_rows(
        vec!["name".into()],
        vec![vec![RowValues::Text("main".into())]],
    )
    .unwrap();
    connector.respond("dolt_branches", rows);
    let ctx = RequestContext::new();

    let tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database("foo"))
        .await
        .unwrap();
    let inner = ctx.clone();
    let csv = with_read_only_transaction(&ctx, tx, move |tx| {
        Box::pin(async move {
            tx.query(&inner, "SELECT name FROM dolt_branches", ResultFormat::Csv)
                .await
        })
    })
    .await
    .unwrap();

    assert_eq!(csv, "name\nmain\n");
    assert_eq!(connector.count("ROLLBACK"), 1);
    assert_eq!(connector.count("COMMIT"), 0);
}

#[tokio::test]
async fn invalid_names_fail_before_connecting() {
    let connector = scripted();
    let ctx = RequestContext::new();

    let err = ScopedTransaction::begin_with(
        &ctx,
        &connector,
        Scope::on_database_branch("foo", "x'); DROP TABLE t; --"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DoltMiddlewareError::InvalidIdentifier { kind: "branch", .. }));

    let err = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database(""))
        .await
        .unwrap_err();
    assert!(matches!(err, DoltMiddlewareError::NoDatabaseNameDefined));
    assert_eq!(connector.sessions_opened(), 0);
}

#[tokio::test]
async fn cancellation_aborts_statement_but_not_rollback() {
    let connector = scripted();
    connector.delay("SLEEP", Duration::from_secs(30));
    let ctx = RequestContext::new();

    let mut tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database("foo"))
        .await
        .unwrap();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });
    let err = tx.exec(&ctx, "SELECT SLEEP(30)").await.unwrap_err();
    assert!(matches!(err, DoltMiddlewareError::Cancelled(_)));

    tx.rollback(&ctx).await.unwrap();
    assert_eq!(tx.state(), TxState::RolledBack);
    assert_eq!(connector.count("ROLLBACK"), 1);
    assert_eq!(connector.sessions_closed(), 1);
}

#[tokio::test]
async fn dropped_transaction_is_rolled_back() {
    let connector = scripted();
    let ctx = RequestContext::new();

    {
        let mut tx = ScopedTransaction::begin_with(&ctx, &connector, Scope::on_database("foo"))
            .await
            .unwrap();
        tx.exec(&ctx, "INSERT INTO t VALUES (9)").await.unwrap();
    }

    for _ in 0..50 {
        if connector.sessions_closed() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(connector.count("ROLLBACK"), 1);
    assert_eq!(connector.sessions_closed(), 1);
    assert!(connector.committed().is_empty());
}
