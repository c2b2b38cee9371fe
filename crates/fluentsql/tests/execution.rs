use fluentsql::prelude::*;
use fluentsql::qb::Quote;
use std::sync::Mutex;

/// In-memory connection that records every statement it receives.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    rows: Vec<Vec<Value>>,
    affected: u64,
    count: i64,
    last_id: Option<i64>,
}

impl Recorder {
    fn record(&self, sql: &str, params: &[Value]) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((sql.to_string(), params.to_vec()));
        }
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Backslash-escaping quoter, to tell connection quoting from the default.
impl Quote for Recorder {
    fn quote(&self, value: &Value) -> String {
        match value {
            Value::Text(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_sql_literal(),
        }
    }
}

impl Connection for Recorder {
    type Row = Vec<Value>;

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> QbResult<Vec<Self::Row>> {
        self.record(sql, params);
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> QbResult<u64> {
        self.record(sql, params);
        Ok(self.affected)
    }

    async fn fetch_count(&self, sql: &str, params: &[Value]) -> QbResult<i64> {
        self.record(sql, params);
        Ok(self.count)
    }

    async fn last_insert_id(&self) -> QbResult<Option<i64>> {
        Ok(self.last_id)
    }
}

#[tokio::test]
async fn test_select_fetches_rows() {
    let conn = Recorder {
        rows: vec![row![1, "Dune"], row![2, "Foundation"]],
        ..Default::default()
    };
    let qb = qb::select()
        .select("id")
        .select("title")
        .from("book")
        .gt("score", 3);

    let out = qb.query(Some(&conn), FetchMode::Default).await.unwrap();
    assert_eq!(out.into_rows().map(|r| r.len()), Some(2));
    assert_eq!(
        conn.calls(),
        vec![(
            "SELECT id, title FROM book WHERE score > ? ".to_string(),
            row![3]
        )]
    );
}

#[tokio::test]
async fn test_without_connection_returns_debug_sql() {
    let qb = qb::delete_from("book").eq("title", "l'île au trésor");
    let out = qb
        .query(None::<&Recorder>, FetchMode::Default)
        .await
        .unwrap();
    assert_eq!(
        out.sql(),
        Some("DELETE FROM book \nWHERE title = 'l''île au trésor' \n")
    );
}

#[tokio::test]
async fn test_empty_statement_is_not_sent() {
    let conn = Recorder::default();
    let out = qb::update("")
        .set_value("a", 1)
        .query(Some(&conn), FetchMode::Default)
        .await
        .unwrap();
    assert!(out.is_empty());
    assert!(conn.calls().is_empty());
}

#[tokio::test]
async fn test_insert_row_count_and_last_id() {
    let conn = Recorder {
        affected: 1,
        last_id: Some(42),
        ..Default::default()
    };
    let insert = qb::insert_into("book", ["title"]).values(["Dune"]);

    let out = insert.query(Some(&conn), FetchMode::Default).await.unwrap();
    assert_eq!(out.row_count(), Some(1));

    let out = insert.query(Some(&conn), FetchMode::LastInsertId).await.unwrap();
    assert_eq!(out, QueryOutput::LastInsertId(42));
    assert_eq!(conn.calls().len(), 2);
}

#[tokio::test]
async fn test_insert_last_id_requires_affected_rows() {
    let conn = Recorder {
        affected: 0,
        last_id: Some(42),
        ..Default::default()
    };
    let out = qb::insert_into("book", ["title"])
        .values(["Dune"])
        .query(Some(&conn), FetchMode::LastInsertId)
        .await
        .unwrap();
    assert_eq!(out.row_count(), Some(0));
}

#[tokio::test]
async fn test_update_and_delete_return_row_count() {
    let conn = Recorder {
        affected: 3,
        ..Default::default()
    };
    let out = qb::update("book")
        .set_value("score", 0)
        .is_null("author_id")
        .query(Some(&conn), FetchMode::Default)
        .await
        .unwrap();
    assert_eq!(out.row_count(), Some(3));

    let out = qb::delete_from("book")
        .lt("score", 1)
        .query(Some(&conn), FetchMode::Default)
        .await
        .unwrap();
    assert_eq!(out.row_count(), Some(3));

    let calls = conn.calls();
    assert_eq!(calls[0].0, "UPDATE book SET score = ? WHERE author_id IS NULL ");
    assert_eq!(calls[1], ("DELETE FROM book WHERE score < ? ".to_string(), row![1]));
}

#[tokio::test]
async fn test_unbalanced_brackets_are_rejected_before_execution() {
    let conn = Recorder::default();
    let err = qb::select()
        .from("book")
        .or_open()
        .eq("a", 1)
        .query(Some(&conn), FetchMode::Default)
        .await
        .unwrap_err();
    assert!(matches!(err, QbError::UnbalancedBrackets { section: "where", .. }));
    assert!(conn.calls().is_empty());
}

#[tokio::test]
async fn test_count_leaves_builder_untouched() {
    let conn = Recorder {
        count: 17,
        ..Default::default()
    };
    let qb = qb::select()
        .select("id")
        .select_as("title", "t")
        .from("book")
        .eq("lang", "fr")
        .order_by("title", "ASC")
        .paginate(3, 10);
    let before = qb.clone();

    assert_eq!(qb.count(&conn).await.unwrap(), 17);
    assert_eq!(qb, before);
    assert_eq!(
        conn.calls(),
        vec![(
            "SELECT COUNT(*) FROM book WHERE lang = ? ".to_string(),
            row!["fr"]
        )]
    );
}

#[tokio::test]
async fn test_debug_with_connection_quoting() {
    let conn = Recorder::default();
    let qb = qb::select().from("book").eq("title", "it's");
    assert_eq!(
        qb.debug_with(&conn, true, false),
        "SELECT * FROM book WHERE title = 'it\\'s' "
    );
    assert_eq!(qb.bound_parameters_quoted(&conn), vec!["'it\\'s'".to_string()]);
}

#[tokio::test]
async fn test_grouped_count_keeps_group_by() {
    let conn = Recorder {
        count: 2,
        ..Default::default()
    };
    let qb = qb::select()
        .select("lang")
        .from("book")
        .group_by("lang")
        .order_by("lang", "ASC");

    assert_eq!(qb.count(&conn).await.unwrap(), 2);
    assert_eq!(conn.calls()[0].0, "SELECT COUNT(*) FROM book GROUP BY lang ");
}

#[cfg(feature = "postgres")]
#[tokio::test]
async fn test_pg_grouped_count_reads_first_row() {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return;
    };
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .unwrap();
    tokio::spawn(async move {
        let _ = connection.await;
    });

    client
        .batch_execute(
            "CREATE TEMP TABLE grouped_book (lang TEXT NOT NULL);
             INSERT INTO grouped_book VALUES ('en'), ('en'), ('fr'), ('fr');",
        )
        .await
        .unwrap();

    let qb = qb::select()
        .from("grouped_book")
        .group_by("lang")
        .where_raw("lang <> ? /* never '?' */", ["de"]);
    assert_eq!(qb.count(&client).await.unwrap(), 2);
}
