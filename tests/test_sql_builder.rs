//! Unit tests for the SqlBuilder query construction.

use tcgsync::SqlBuilder;

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("cards").build();
    assert_eq!(sql, "SELECT *\nFROM cards");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("cards").select(&["fields"]).build();
    assert!(sql.starts_with("SELECT fields\n"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new("cards").where_eq("game", "mtg").build();
    assert!(sql.contains("WHERE game = ?"));
    assert_eq!(params, vec!["mtg"]);
}

#[test]
fn where_contains_is_case_insensitive_substring() {
    let (sql, params) = SqlBuilder::new("cards")
        .where_contains("name", "Bolt")
        .build();
    assert!(sql.contains("contains(LOWER(name), LOWER(?))"));
    assert_eq!(params, vec!["Bolt"]);
}

#[test]
fn where_contains_does_not_escape_wildcards() {
    // contains() has no wildcard syntax, so the value goes through untouched
    let (_, params) = SqlBuilder::new("cards")
        .where_contains("name", "100%_off")
        .build();
    assert_eq!(params, vec!["100%_off"]);
}

#[test]
fn multiple_where_clauses_joined_with_and() {
    let (sql, _) = SqlBuilder::new("cards")
        .where_eq("game", "pokemon")
        .where_eq("set_key", "base1")
        .build();
    assert!(sql.contains("WHERE game = ? AND set_key = ?"));
}

// ---------------------------------------------------------------------------
// ORDER BY / LIMIT / OFFSET
// ---------------------------------------------------------------------------

#[test]
fn order_by_adds_clause() {
    let (sql, _) = SqlBuilder::new("cards")
        .order_by(&["game ASC", "name ASC"])
        .build();
    assert!(sql.contains("ORDER BY game ASC, name ASC"));
}

#[test]
fn order_by_accumulates_across_calls() {
    let (sql, _) = SqlBuilder::new("cards")
        .order_by(&["name ASC"])
        .order_by(&["id ASC"])
        .build();
    assert!(sql.contains("ORDER BY name ASC, id ASC"));
}

#[test]
fn limit_and_offset_together() {
    let (sql, _) = SqlBuilder::new("cards").limit(10).offset(20).build();
    assert!(sql.contains("LIMIT 10"));
    assert!(sql.contains("OFFSET 20"));
    assert!(sql.find("LIMIT").unwrap() < sql.find("OFFSET").unwrap());
}

// ---------------------------------------------------------------------------
// Combined
// ---------------------------------------------------------------------------

#[test]
fn combined_builder_chains_correctly() {
    let (sql, params) = SqlBuilder::new("cards")
        .select(&["fields"])
        .where_contains("name", "pika")
        .where_eq("game", "pokemon")
        .order_by(&["game ASC", "name ASC"])
        .limit(50)
        .build();

    assert_eq!(
        sql,
        "SELECT fields\nFROM cards\nWHERE contains(LOWER(name), LOWER(?)) AND game = ?\nORDER BY game ASC, name ASC\nLIMIT 50"
    );
    assert_eq!(params, vec!["pika", "pokemon"]);
}
