//! End-to-end safety policy scenarios.

use parlance::{
    Dialect, DocumentOperation, SafetyPolicy, Severity, SignatureCatalog, Strictness,
};
use serde_json::json;

fn strict() -> SafetyPolicy {
    SafetyPolicy::new(SignatureCatalog::builtin(), Strictness::Strict)
}

fn permissive() -> SafetyPolicy {
    SafetyPolicy::new(SignatureCatalog::builtin(), Strictness::Permissive)
}

#[test]
fn safe_select_with_where_passes() {
    let verdict = strict().evaluate("SELECT * FROM customers WHERE id = 1;", Dialect::MySql);
    assert!(verdict.valid_syntax);
    assert!(!verdict.blocked);
    // Warning-only reasons are acceptable (missing LIMIT).
    for reason in &verdict.reasons {
        assert!(reason.contains("LIMIT"), "unexpected reason: {reason}");
    }
}

#[test]
fn tautology_is_blocked_in_strict_mode() {
    let verdict = strict().evaluate("SELECT * FROM users WHERE id=1 OR 1=1", Dialect::MySql);
    assert!(verdict.blocked);
    assert!(verdict
        .reasons
        .iter()
        .any(|reason| reason.contains("tautology")));
}

#[test]
fn empty_filter_delete_is_blocked() {
    let verdict = strict().evaluate_document(&json!({}), DocumentOperation::Delete);
    assert!(verdict.blocked);
    assert!(verdict
        .reasons
        .iter()
        .any(|reason| reason.contains("unconditional delete")));
}

#[test]
fn ddl_statements_are_always_blocked() {
    for query in [
        "DROP TABLE users",
        "TRUNCATE TABLE sessions",
        "ALTER TABLE users ADD COLUMN x INT",
    ] {
        for policy in [strict(), permissive()] {
            let verdict = policy.evaluate(query, Dialect::MySql);
            assert!(verdict.blocked, "{query}");
            assert!(verdict.reasons.contains(&"DDL is blocked".to_string()));
        }
    }
}

#[test]
fn mutation_without_where_is_always_blocked() {
    for (query, reason) in [
        ("DELETE FROM logs", "DELETE without WHERE is blocked"),
        ("UPDATE users SET active = 0", "UPDATE without WHERE is blocked"),
    ] {
        for policy in [strict(), permissive()] {
            let verdict = policy.evaluate(query, Dialect::MySql);
            assert!(verdict.blocked, "{query}");
            assert!(verdict.reasons.contains(&reason.to_string()));
        }
    }
}

#[test]
fn select_without_limit_warns_only() {
    let verdict = strict().evaluate("SELECT name FROM customers WHERE id = 2", Dialect::MySql);
    assert!(!verdict.blocked);
    assert!(verdict
        .reasons
        .contains(&"SELECT missing LIMIT; will cap at runtime".to_string()));
}

#[test]
fn or_one_equals_one_is_detected_regardless_of_case_and_spacing() {
    for query in [
        "SELECT * FROM t WHERE a = 2 OR 1=1",
        "select * from t where a = 2 or 1 = 1",
        "SELECT * FROM t WHERE a = 2 oR   1=1",
    ] {
        let verdict = strict().evaluate(query, Dialect::MySql);
        assert!(verdict.blocked, "missed: {query}");
    }
}

// The detection matrix the original service shipped with, minus cases
// covered above.
#[test]
fn injection_matrix_is_detected() {
    let attacks = [
        "SELECT * FROM users WHERE id = 1 UNION SELECT * FROM passwords",
        "SELECT * FROM users WHERE id = 1 UNION ALL SELECT username, password FROM admin",
        "SELECT * FROM users WHERE username = 'admin' AND '1'='1'",
        "SELECT * FROM users WHERE id = 1 OR 'a'='a'",
        "SELECT * FROM users WHERE id = 1 AND SLEEP(5)",
        "SELECT * FROM users WHERE id = 1 AND BENCHMARK(1000000, MD5('test'))",
        "SELECT * FROM users; WAITFOR DELAY '00:00:05'",
        "SELECT * FROM users; DROP TABLE users",
        "SELECT * FROM users; DELETE FROM logs",
        "SELECT * FROM users WHERE username = 'admin' -- AND password = 'pass'",
        "SELECT * FROM users WHERE id = 1 # comment",
        "SELECT * FROM users WHERE id = 1 /* comment */",
        "SELECT * FROM users WHERE username = 0x61646d696e",
        "SELECT * FROM users WHERE username = CHAR(97,100,109,105,110)",
        "SELECT table_name FROM INFORMATION_SCHEMA.TABLES",
        "SELECT * FROM SYS.TABLES",
        "SELECT LOAD_FILE('/etc/passwd')",
        "SELECT * FROM users INTO OUTFILE '/tmp/users.txt'",
        "EXEC xp_cmdshell 'dir'",
        "SELECT 'a' || (SELECT password FROM users WHERE id=1)",
        "SELECT CONCAT('user', (SELECT password FROM users))",
    ];

    let policy = strict();
    for query in attacks {
        let verdict = policy.evaluate(query, Dialect::MySql);
        assert!(verdict.blocked, "missed attack: {query}");
        assert!(verdict.severity > Severity::None, "{query}");
        assert!(!verdict.reasons.is_empty(), "{query}");
    }
}

#[test]
fn safe_queries_are_not_blocked() {
    let safe = [
        "SELECT * FROM customers WHERE id = 1;",
        "INSERT INTO orders (customer_id, amount) VALUES (1, 100)",
        "UPDATE customers SET name = 'John' WHERE id = 1",
    ];

    let policy = strict();
    for query in safe {
        let verdict = policy.evaluate(query, Dialect::MySql);
        assert!(!verdict.blocked, "false positive: {query}");
        assert_eq!(verdict.severity, Severity::None, "{query}");
    }
}

#[test]
fn permissive_mode_downgrades_low_severity_matches() {
    let policy = permissive();

    // Comment marker alone: advisory only.
    let verdict = policy.evaluate(
        "SELECT * FROM users WHERE id = 1 /* note */ LIMIT 5",
        Dialect::MySql,
    );
    assert!(!verdict.blocked);
    assert!(!verdict.reasons.is_empty());

    // File primitives stay blocked (critical).
    let verdict = policy.evaluate("SELECT LOAD_FILE('/etc/passwd')", Dialect::MySql);
    assert!(verdict.blocked);
}

#[test]
fn mongodb_injection_matrix() {
    let policy = strict();

    let attacks = [
        (json!({"username": {"$ne": 1}}), DocumentOperation::Find),
        (json!({"username": {"$ne": null}}), DocumentOperation::Find),
        (json!({"$or": [{}]}), DocumentOperation::Find),
        (
            json!({"$where": "function() { return true; }"}),
            DocumentOperation::Find,
        ),
        (json!({"username": {"$regex": ".*"}}), DocumentOperation::Find),
        (json!({}), DocumentOperation::Delete),
        (json!({}), DocumentOperation::Update),
        (json!({"eval": "db.dropDatabase()"}), DocumentOperation::Find),
    ];
    for (filter, operation) in attacks {
        let verdict = policy.evaluate_document(&filter, operation);
        assert!(verdict.blocked, "missed: {filter} ({operation})");
    }

    let safe = [
        (
            json!({"username": "john", "age": {"$gt": 18}}),
            DocumentOperation::Find,
        ),
        (json!({"status": "active"}), DocumentOperation::Find),
        (json!({}), DocumentOperation::Find),
    ];
    for (filter, operation) in safe {
        let verdict = policy.evaluate_document(&filter, operation);
        assert!(!verdict.blocked, "false positive: {filter} ({operation})");
    }
}

#[test]
fn batch_results_match_input_order_and_are_independent() {
    let policy = strict();
    let candidates: Vec<String> = vec![
        "SELECT * FROM a LIMIT 1".into(),
        "DROP TABLE a".into(),
        "SELECT * FROM b WHERE id = 1 OR 1=1".into(),
        "SELECT * FROM c LIMIT 1".into(),
    ];

    let verdicts = policy.evaluate_batch(&candidates, Dialect::MySql);
    assert_eq!(verdicts.len(), candidates.len());
    assert!(!verdicts[0].blocked);
    assert!(verdicts[1].blocked);
    assert!(verdicts[2].blocked);
    assert!(!verdicts[3].blocked);

    // Single evaluation of a candidate agrees with its batch verdict.
    for (candidate, batch_verdict) in candidates.iter().zip(&verdicts) {
        assert_eq!(&policy.evaluate(candidate, Dialect::MySql), batch_verdict);
    }
}

#[test]
fn evaluation_is_idempotent() {
    let policy = strict();
    for query in [
        "SELECT * FROM customers WHERE id = 1;",
        "DROP TABLE users",
        "SELECT * FROM users WHERE id=1 OR 1=1",
        "not even sql",
    ] {
        assert_eq!(
            policy.evaluate(query, Dialect::MySql),
            policy.evaluate(query, Dialect::MySql),
            "{query}"
        );
    }
}

#[test]
fn parse_failure_still_runs_signature_scan() {
    // Not parseable as SQL, but the time-delay primitive must be caught.
    let verdict = strict().evaluate("@@@ AND SLEEP(5)", Dialect::MySql);
    assert!(verdict.blocked);
    assert!(!verdict.valid_syntax);
    assert!(verdict.severity >= Severity::High);
    assert!(verdict.reasons.iter().any(|r| r.starts_with("parse_error:")));
}

#[test]
fn postgres_dialect_is_supported() {
    let verdict = strict().evaluate(
        "SELECT \"name\" FROM \"customers\" WHERE id = 1 LIMIT 10",
        Dialect::Postgres,
    );
    assert!(verdict.valid_syntax);
    assert!(!verdict.blocked);
}
