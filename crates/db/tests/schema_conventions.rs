//! Schema-wide conventions every migration must follow.

use sqlx::PgPool;

/// Connect, migrate, and confirm the lookup tables carry their seed rows.
#[sqlx::test(migrations = "../../db/migrations")]
async fn lookup_tables_are_seeded(pool: PgPool) {
    karyakita_db::health_check(&pool).await.unwrap();

    let roles: Vec<(String,)> = sqlx::query_as("SELECT name FROM roles ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    let roles: Vec<String> = roles.into_iter().map(|(name,)| name).collect();
    assert_eq!(roles, vec!["admin", "lecturer", "student"]);

    let statuses: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM review_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    for (id, name) in statuses {
        let status = karyakita_core::review::ReviewStatus::from_id(id)
            .unwrap_or_else(|| panic!("review_statuses id {id} has no enum variant"));
        assert_eq!(status.as_str(), name);
    }
}

/// All `id` columns must be bigint (entity tables) or smallint (lookup tables).
#[sqlx::test(migrations = "../../db/migrations")]
async fn all_pks_are_correct_type(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (table, data_type) in &rows {
        assert!(
            data_type == "bigint" || data_type == "smallint",
            "Table {table}.id should be bigint or smallint, got {data_type}"
        );
    }
}

/// Every table carries `created_at` and `updated_at` as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn all_tables_have_timestamps(pool: PgPool) {
    let missing: Vec<(String, String)> = sqlx::query_as(
        "SELECT t.table_name, c.col
         FROM information_schema.tables t
         CROSS JOIN (VALUES ('created_at'), ('updated_at')) AS c(col)
         WHERE t.table_schema = 'public'
           AND t.table_type = 'BASE TABLE'
           AND t.table_name != '_sqlx_migrations'
           AND NOT EXISTS (
               SELECT 1 FROM information_schema.columns ic
               WHERE ic.table_schema = 'public'
                 AND ic.table_name = t.table_name
                 AND ic.column_name = c.col
                 AND ic.data_type = 'timestamp with time zone'
           )
         ORDER BY t.table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(missing.is_empty(), "Missing timestamptz columns: {missing:?}");
}

/// TEXT is preferred over VARCHAR everywhere.
#[sqlx::test(migrations = "../../db/migrations")]
async fn no_varchar_columns(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, column_name
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND data_type = 'character varying'
           AND table_name != '_sqlx_migrations'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(rows.is_empty(), "Found VARCHAR columns (use TEXT): {rows:?}");
}
