//! Integration tests for the qb module.

use crate::config::FormatConfig;
use crate::qb::criteria::{Connector, CriteriaList, Criterion, Operator};
use crate::qb::traits::{Section, SqlQb, WhereQb};
use crate::qb::{Branch, Branching, delete_from, insert_into, select, update};
use crate::value::Value;

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

fn dune_or_score_range<Q: WhereQb>(qb: Q) -> Q {
    qb.ne("title", "Dune")
        .or_open()
        .gte("score", 5)
        .lte("score", 10)
        .close_where()
}

#[test]
fn test_select_scenario() {
    let qb = select()
        .select("id")
        .select("title")
        .from("book")
        .where_("author_id", 2, Operator::Equals)
        .unwrap();

    assert_eq!(qb.to_sql(), "SELECT id, title FROM book WHERE author_id = ? ");
    assert_eq!(qb.bound_parameters(), vec![Value::Int(2)]);
}

#[test]
fn test_delete_scenario() {
    let qb = delete_from("book")
        .where_("title", "l'île au trésor", "=")
        .unwrap();

    assert_eq!(qb.to_sql(), "DELETE FROM book WHERE title = ? ");
    assert_eq!(qb.bound_parameters(), crate::row!["l'île au trésor"]);
    assert_eq!(
        qb.debug(true, true),
        "DELETE FROM book \nWHERE title = 'l''île au trésor' \n"
    );
    assert_eq!(
        qb.debug(false, false),
        "DELETE FROM book WHERE title = 'l'île au trésor' "
    );
}

#[test]
fn test_insert_scenario() {
    let qb = insert_into("book", ["id", "title"])
        .values(crate::row![1, "Dune"])
        .values(crate::row![2, "Foundation"]);

    assert_eq!(qb.to_sql(), "INSERT INTO book (id, title) VALUES (?, ?), (?, ?) ");
    assert_eq!(qb.bound_parameters(), crate::row![1, "Dune", 2, "Foundation"]);
}

#[test]
fn test_merge_where_preserves_brackets() {
    let source = dune_or_score_range(select().from("book"));
    let target = select().select("id").from("archive").merge_where(&source);

    assert_eq!(target.where_list(), source.where_list());
    assert_eq!(
        target.to_sql(),
        "SELECT id FROM archive WHERE title != ? OR ( score >= ? AND score <= ? ) "
    );
    assert_eq!(target.where_params(), crate::row!["Dune", 5, 10]);

    // Any WHERE builder can receive the list
    let delete = delete_from("book").merge_where(&source);
    assert_eq!(
        delete.where_string(false),
        "WHERE title != ? OR ( score >= ? AND score <= ? ) "
    );
}

#[test]
fn test_formatted_where_block() {
    let qb = dune_or_score_range(select().select("id").from("book"));
    assert_eq!(
        qb.query_string(true),
        "SELECT id \nFROM book \nWHERE title != ? \nOR \n( \n    score >= ? \n    AND score <= ? \n) \n"
    );

    let tabbed = dune_or_score_range(
        select()
            .with_config(FormatConfig::new().with_indent_char('\t').with_indent_width(1))
            .from("book"),
    );
    assert!(tabbed.query_string(true).contains("\n\tscore >= ? \n\tAND score <= ? \n"));
}

#[test]
fn test_formatted_and_flat_bind_the_same_values() {
    let sub = select().select("author_id").from("prize").gt("year", 1960);
    let qb = select()
        .from("book")
        .between("score", 10, 2)
        .in_list("lang", ["fr", "en"])
        .where_raw("price * ? < ?", [2, 40])
        .where_in_subquery("author_id", sub)
        .or_open()
        .is_null("deleted_at")
        .close_where();

    let flat = qb.render(false);
    let formatted = qb.render(true);
    assert_eq!(flat.params, formatted.params);
    assert_eq!(placeholders(&flat.sql), flat.params.len());
    assert_eq!(
        flat.sql.split_whitespace().collect::<Vec<_>>(),
        formatted.sql.split_whitespace().collect::<Vec<_>>()
    );
    assert_eq!(
        qb.bound_parameters(),
        crate::row![2, 10, "fr", "en", 2, 40, 1960]
    );
}

#[test]
fn test_in_scalar_matches_single_element_list() {
    let scalar = select()
        .from("book")
        .where_("id", 3, Operator::In)
        .unwrap();
    let list = select().from("book").in_list("id", [3]);
    assert_eq!(scalar.to_sql(), list.to_sql());
    assert_eq!(scalar.bound_parameters(), list.bound_parameters());
    assert_eq!(scalar.to_sql(), "SELECT * FROM book WHERE id IN (?) ");
}

#[test]
fn test_between_order_is_normalized() {
    let a = select()
        .from("book")
        .where_("score", vec![15, 8], "BETWEEN")
        .unwrap();
    let b = select().from("book").between("score", 8, 15);
    assert_eq!(a, b);
    assert_eq!(a.bound_parameters(), crate::row![8, 15]);

    let err = select()
        .from("book")
        .where_("score", 15, "BETWEEN")
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_lenient_tokens() {
    let qb = select()
        .from("book")
        .where_with("title", "Dune", "~~", "XOR")
        .unwrap()
        .where_with("score", 3, "greater_than", " or ")
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM book WHERE title = ? OR score > ? ");
}

#[test]
fn test_if_true_keeps_builder_active() {
    let qb = select().from("book").if_(true);
    assert_eq!(qb.branch(), Branch::Active);
    let qb = qb.eq("id", 1).end_if().unwrap();
    assert_eq!(qb.branch(), Branch::Active);
    assert_eq!(qb.to_sql(), "SELECT * FROM book WHERE id = ? ");
}

#[test]
fn test_if_false_swallows_until_end_if() {
    let qb = select().from("book").if_(false);
    assert_eq!(qb.branch(), Branch::Inactive { depth: 1 });

    let qb = qb
        .select("title")
        .eq("id", 1)
        .order_by("id", "DESC")
        .limit(5)
        .join(crate::qb::Join::new("author").on("author_id"))
        .end_if()
        .unwrap();
    assert_eq!(qb.branch(), Branch::Active);
    assert_eq!(qb.to_sql(), "SELECT * FROM book ");
}

#[test]
fn test_else_if_chain() {
    let filter = |kind: &str| {
        select()
            .from("book")
            .if_(kind == "new")
            .gt("published_at", "2020-01-01")
            .else_if(kind == "classic")
            .unwrap()
            .lt("published_at", "1970-01-01")
            .else_if(kind == "classic")
            .unwrap()
            .eq("never", 1)
            .else_()
            .unwrap()
            .is_not_null("published_at")
            .end_if()
            .unwrap()
            .to_sql()
    };

    assert_eq!(filter("new"), "SELECT * FROM book WHERE published_at > ? ");
    assert_eq!(filter("classic"), "SELECT * FROM book WHERE published_at < ? ");
    assert_eq!(
        filter("other"),
        "SELECT * FROM book WHERE published_at IS NOT NULL "
    );
}

#[test]
fn test_nested_if_inside_inactive_branch() {
    let qb = select()
        .from("book")
        .if_(false)
        .eq("a", 1)
        .if_(true)
        .eq("b", 2)
        .else_()
        .unwrap()
        .eq("c", 3)
        .end_if()
        .unwrap()
        .else_()
        .unwrap()
        .eq("d", 4)
        .end_if()
        .unwrap();
    assert_eq!(qb.to_sql(), "SELECT * FROM book WHERE d = ? ");
}

#[test]
fn test_branching_misuse() {
    let err = select().from("book").else_().unwrap_err();
    assert!(err.is_fluent_state());
    let err = update("book").else_if(true).unwrap_err();
    assert!(err.is_fluent_state());
    let err = delete_from("book").end_if().unwrap_err();
    assert!(err.is_fluent_state());
}

#[test]
fn test_update_and_delete_share_where_surface() {
    let upd = dune_or_score_range(update("book").set_value("archived", true));
    assert_eq!(
        upd.to_sql(),
        "UPDATE book SET archived = ? WHERE title != ? OR ( score >= ? AND score <= ? ) "
    );
    assert_eq!(upd.section_params(Section::Set), vec![Value::Bool(true)]);
    assert_eq!(upd.section_params(Section::Where), crate::row!["Dune", 5, 10]);

    let del = dune_or_score_range(delete_from("book"));
    assert_eq!(del.bound_parameters(), crate::row!["Dune", 5, 10]);
}

#[test]
fn test_exists_subquery() {
    let review = select()
        .select("1")
        .from("review")
        .where_raw("review.book_id = book.id", Vec::<Value>::new())
        .gte("stars", 4);
    let qb = select()
        .select("title")
        .from("book")
        .where_exists(review.clone())
        .where_not_exists("SELECT 1 FROM ban WHERE ban.book_id = book.id");

    assert_eq!(
        qb.to_sql(),
        "SELECT title FROM book WHERE EXISTS ( SELECT 1 FROM review WHERE review.book_id = book.id AND stars >= ? ) \
         AND NOT EXISTS ( SELECT 1 FROM ban WHERE ban.book_id = book.id ) "
    );
    assert_eq!(qb.bound_parameters(), vec![Value::Int(4)]);
}

#[test]
fn test_criteria_list_parenthesis_counts() {
    let mut list = CriteriaList::new();
    list.open(Connector::And);
    list.push(Criterion::eq("a", 1));
    list.open(Connector::Or);
    list.push(Criterion::eq("b", 2));
    list.close();
    list.close();

    let (open, close) = list.bracket_counts();
    let (sql, params) = list.render(false);
    assert_eq!(sql.matches('(').count(), open);
    assert_eq!(sql.matches(')').count(), close);
    assert_eq!(placeholders(&sql), params.len());
}

#[test]
fn test_debug_with_subquery_and_sections() {
    let recent = select()
        .select("id")
        .from("book")
        .gte("published_at", "2020-01-01");
    let qb = select()
        .select("r.id")
        .from_as(recent, "r")
        .eq("r.id", 7)
        .group_by("r.id")
        .having("COUNT(*)", 1, ">")
        .unwrap();

    assert_eq!(
        qb.debug(true, false),
        "SELECT r.id FROM (SELECT id FROM book WHERE published_at >= '2020-01-01' ) AS r \
         WHERE r.id = 7 GROUP BY r.id HAVING COUNT(*) > 1 "
    );
    let sections = qb.render(false).params;
    let names = sections.iter().map(|(s, _)| s.name()).collect::<Vec<_>>();
    assert_eq!(names, ["from", "where", "having"]);
}

#[test]
fn test_build_flattens_params() {
    let built = update("book")
        .set_expr("hits", "hits + ?", [1])
        .eq("id", 3)
        .build();
    assert_eq!(built.sql, "UPDATE book SET hits = hits + ? WHERE id = ? ");
    assert_eq!(built.params, crate::row![1, 3]);
}

#[test]
fn test_degenerate_builders_render_nothing() {
    assert_eq!(select().to_sql(), "");
    assert_eq!(insert_into("", ["a"]).values([1]).to_sql(), "");
    assert_eq!(update("").set_value("a", 1).to_sql(), "");
    assert_eq!(delete_from(" ").to_sql(), "");
    assert!(select().build().params.is_empty());
}

#[test]
fn test_display_renders_single_line_sql() {
    let sel = select().select("id").from("book").eq("lang", "fr");
    assert_eq!(sel.to_string(), "SELECT id FROM book WHERE lang = ? ");
    assert_eq!(format!("{sel}"), sel.to_sql());

    let ins = insert_into("book", ["title"]).values(["Dune"]);
    assert_eq!(ins.to_string(), ins.to_sql());

    let upd = update("book").set_value("score", 5).eq("id", 1);
    assert_eq!(upd.to_string(), "UPDATE book SET score = ? WHERE id = ? ");

    let del = delete_from("book").is_null("title");
    assert_eq!(format!("{del}"), "DELETE FROM book WHERE title IS NULL ");
}
