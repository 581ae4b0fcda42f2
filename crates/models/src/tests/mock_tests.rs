use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};

use crate::icon;

fn sample(id: i32, html_code: &str, name: &str) -> icon::Model {
    icon::Model {
        id,
        html_code: html_code.to_string(),
        name: name.to_string(),
        created_at: Utc::now().into(),
        updated_at: None,
        deleted_at: None,
    }
}

fn view_row(id: i32, html_code: &str, name: &str) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("id", Value::from(id)),
        ("html_code", Value::from(html_code)),
        ("name", Value::from(name)),
    ])
}

fn last_sql(db: DatabaseConnection) -> String {
    let log = db.into_transaction_log();
    // Debug escapes the quoted identifiers
    format!("{:?}", log.last().expect("one statement")).replace('\\', "")
}

#[tokio::test]
async fn create_returns_inserted_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample(1, "1F600", "grin")]])
        .into_connection();

    let created = icon::create(&db, "1F600", "grin").await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.html_code, "1F600");
    assert!(created.deleted_at.is_none());

    let sql = last_sql(db);
    assert!(sql.contains(r#"INSERT INTO "icon""#), "{sql}");
    assert!(sql.contains(r#""htmlCode""#), "{sql}");
}

#[tokio::test]
async fn create_rejects_blank_name_without_touching_db() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let err = icon::create(&db, "1F600", " ").await.unwrap_err();
    assert!(matches!(err, crate::errors::ModelError::Validation(_)));
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn list_views_projects_three_columns_in_id_order() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[view_row(1, "1F600", "grin"), view_row(2, "1F602", "joy")]])
        .into_connection();

    let rows = icon::list_views(&db).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].name, "joy");

    let sql = last_sql(db);
    assert!(sql.contains(r#""htmlCode" AS "html_code""#), "{sql}");
    assert!(sql.contains(r#"ORDER BY "icon"."id" ASC"#), "{sql}");
    assert!(!sql.contains("created_at"), "timestamps must not be selected: {sql}");
    // soft-deleted rows are not filtered out on reads
    assert!(!sql.contains("deleted_at"), "{sql}");
}

#[tokio::test]
async fn find_view_missing_row_is_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
        .into_connection();
    assert!(icon::find_view(&db, 42).await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_name_filters_on_name() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample(3, "1F923", "rofl")]])
        .into_connection();
    let found = icon::find_by_name(&db, "rofl").await.unwrap();
    assert_eq!(found.map(|m| m.id), Some(3));
    let sql = last_sql(db);
    assert!(sql.contains(r#"WHERE "icon"."name" = "#), "{sql}");
}

#[tokio::test]
async fn save_writes_deleted_at() {
    let mut row = sample(5, "1F600", "grin");
    row.deleted_at = Some(Utc::now().into());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[row.clone()]])
        .into_connection();

    let saved = icon::save(&db, row).await.unwrap();
    assert!(saved.deleted_at.is_some());
    let sql = last_sql(db);
    assert!(sql.contains(r#"UPDATE "icon""#), "{sql}");
    assert!(sql.contains(r#""deleted_at""#), "{sql}");
}

#[tokio::test]
async fn query_errors_surface_as_db_errors() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([sea_orm::DbErr::Custom("connection refused".into())])
        .into_connection();
    let err = icon::list_views(&db).await.unwrap_err();
    assert!(matches!(err, crate::errors::ModelError::Db(ref m) if m.contains("connection refused")));
}
