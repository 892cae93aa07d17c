// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use semlint::unit::MAX_NESTING_DEPTH;
use semlint::*;
use serde_json::{json, Value};

const DAO: &str = r#"
{
  "model": {
    "types": [
      { "name": "java.sql.Connection", "kind": "interface" },
      { "name": "p.Foo" },
      {
        "name": "p.Dao",
        "members": [
          { "name": "conn", "type": "java.sql.Connection" },
          {
            "name": "find",
            "kind": "method",
            "type": "void",
            "params": [
              { "name": "userInput", "type": "java.lang.String" },
              { "name": "a", "type": "p.Foo" },
              { "name": "b", "type": "p.Foo" }
            ]
          },
          { "name": "finalize", "kind": "method", "type": "void" }
        ]
      }
    ]
  },
  "tree": {
    "file": "Dao.java",
    "types": [
      {
        "name": "Dao",
        "symbol": "p.Dao",
        "span": { "line": 1, "col": 1 },
        "members": [
          {
            "member": "method",
            "name": "finalize",
            "symbol": "p.Dao#finalize",
            "body": {
              "stmts": [
                {
                  "stmt": "expr",
                  "expr": {
                    "expr": "assign",
                    "span": { "line": 12, "col": 5 },
                    "target": { "expr": "ident", "name": "conn", "symbol": "p.Dao#conn" },
                    "value": { "expr": "literal", "literal": "null" }
                  }
                }
              ]
            }
          },
          {
            "member": "method",
            "name": "find",
            "symbol": "p.Dao#find",
            "body": {
              "stmts": [
                {
                  "stmt": "if",
                  "cond": {
                    "expr": "binary",
                    "op": "equal_to",
                    "span": { "line": 4, "col": 9 },
                    "lhs": { "expr": "ident", "name": "a", "symbol": "p.Dao#find.a", "type": "p.Foo" },
                    "rhs": { "expr": "ident", "name": "b", "symbol": "p.Dao#find.b", "type": "p.Foo" }
                  },
                  "then": { "stmt": "return" }
                },
                {
                  "stmt": "expr",
                  "expr": {
                    "expr": "call",
                    "span": { "line": 5, "col": 5 },
                    "callee": {
                      "expr": "select",
                      "name": "prepareStatement",
                      "target": { "expr": "ident", "name": "conn", "symbol": "p.Dao#conn", "type": "java.sql.Connection" }
                    },
                    "args": [
                      {
                        "expr": "binary",
                        "op": "plus",
                        "type": "java.lang.String",
                        "lhs": { "expr": "literal", "literal": "string", "value": "SELECT * FROM t WHERE id=" },
                        "rhs": { "expr": "ident", "name": "userInput", "symbol": "p.Dao#find.userInput", "type": "java.lang.String" }
                      }
                    ]
                  }
                }
              ]
            }
          }
        ]
      }
    ]
  }
}
"#;

#[test]
fn analyzes_json_units_in_source_order() -> Result<()> {
    let engine = Engine::new()?;
    let result = engine.analyze_json(DAO)?;

    assert_eq!(result.file, "Dao.java");
    assert!(result.failures.is_empty());
    let found: Vec<_> = result
        .diagnostics
        .iter()
        .map(|d| (d.rule, d.span.line))
        .collect();
    assert_eq!(found, vec![("S1698", 4), ("S2077", 5), ("S2165", 12)]);

    let injection = &result.diagnostics[1];
    assert_eq!(injection.severity, Severity::Critical);
    assert_eq!(
        injection.to_string(),
        "Dao.java:5:5: [S2077] \"userInput\" is provided externally to the method and not sanitized before use."
    );
    Ok(())
}

#[test]
fn analysis_is_repeatable() -> Result<()> {
    let engine = Engine::new()?;
    let unit = ResolvedUnit::from_json(DAO)?;
    let first = engine.analyze(&unit);
    let second = engine.analyze(&unit);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn rule_selection() -> Result<()> {
    let engine = Engine::new()?;
    assert_eq!(engine.rules(), vec!["S1698", "S2077", "S2165", "S2388"]);

    let options = AnalysisOptions::from_json(r#"{ "rules": ["S2165"] }"#)?;
    assert!(options.is_rule_filtered());
    assert_eq!(options.max_trace_depth, AnalysisOptions::default().max_trace_depth);

    let engine = Engine::with_options(options)?;
    assert_eq!(engine.rules(), vec!["S2165"]);
    let result = engine.analyze_json(DAO)?;
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message,
        "Remove this nullification of \"conn\"."
    );

    let unknown = Engine::with_options(AnalysisOptions {
        rules: Some(vec!["S9999".to_string()]),
        ..AnalysisOptions::default()
    });
    match unknown {
        Ok(_) => panic!("unknown rule accepted"),
        Err(err) => assert_eq!(err.to_string(), "unknown rule `S9999`"),
    }
    Ok(())
}

#[test]
fn catalog_extension() -> Result<()> {
    let mut engine = Engine::new()?;
    let builtin = engine.catalog().sink_count();

    assert!(engine.extend_catalog_json("{ \"sinks\": 3 }").is_err());
    assert_eq!(engine.catalog().sink_count(), builtin);

    engine.extend_catalog_json(
        r#"{ "sinks": [ { "type": "com.acme.Gateway", "methods": ["run", "query"] } ] }"#,
    )?;
    assert_eq!(engine.catalog().sink_count(), builtin + 2);

    // Registering the same sink again is rejected as a whole.
    assert!(engine
        .extend_catalog_json(
            r#"{ "sinks": [ { "type": "com.acme.Gateway", "methods": ["stream", "run"] } ] }"#,
        )
        .is_err());
    assert_eq!(engine.catalog().sink_count(), builtin + 2);
    Ok(())
}

#[test]
fn malformed_units_are_rejected() {
    let engine = Engine::new().expect("engine builds");
    assert!(engine.analyze_json("{").is_err());
    assert!(engine.analyze_json(r#"{ "model": {} }"#).is_err());

    let duplicate = r#"{
      "model": { "types": [ { "name": "p.A" }, { "name": "p.A" } ] },
      "tree": { "file": "A.java" }
    }"#;
    let err = engine.analyze_json(duplicate).err().map(|e| format!("{e:#}"));
    assert!(err.is_some_and(|e| e.contains("A.java")));
}

#[test]
fn unresolved_trees_produce_no_findings() -> Result<()> {
    let engine = Engine::new()?;
    let result = engine.analyze_json(
        r#"{
          "tree": {
            "file": "Raw.java",
            "types": [ {
              "name": "Raw",
              "members": [ {
                "member": "method",
                "name": "finalize",
                "body": { "stmts": [ {
                  "stmt": "expr",
                  "expr": {
                    "expr": "binary",
                    "op": "equal_to",
                    "lhs": { "expr": "ident", "name": "x" },
                    "rhs": { "expr": "ident", "name": "y" }
                  }
                } ] }
              } ]
            } ]
          }
        }"#,
    )?;
    assert!(result.diagnostics.is_empty());
    assert!(result.failures.is_empty());
    Ok(())
}

/// `"SELECT" + " x" + ... + userInput`, nested to the left like the tree a
/// compiler produces for a long concatenation.
fn concatenation(terms: usize) -> Value {
    let mut value = json!({
        "expr": "literal", "literal": "string", "value": "SELECT", "type": "java.lang.String"
    });
    for n in 1..terms {
        let rhs = if n + 1 == terms {
            json!({
                "expr": "ident", "name": "userInput",
                "symbol": "p.Deep#find.userInput", "type": "java.lang.String"
            })
        } else {
            json!({ "expr": "literal", "literal": "string", "value": " x", "type": "java.lang.String" })
        };
        let mut binary = json!({ "expr": "binary", "op": "plus", "type": "java.lang.String", "rhs": rhs });
        binary["lhs"] = value;
        value = binary;
    }
    value
}

fn deep_unit(terms: usize) -> String {
    let mut call = json!({
        "expr": "call",
        "span": { "line": 3, "col": 5 },
        "callee": {
            "expr": "select",
            "name": "executeQuery",
            "target": { "expr": "ident", "name": "stmt", "symbol": "p.Deep#find.stmt", "type": "java.sql.Statement" }
        }
    });
    call["args"] = json!([concatenation(terms)]);
    json!({
        "model": {
            "types": [
                { "name": "java.sql.Statement", "kind": "interface" },
                {
                    "name": "p.Deep",
                    "members": [ {
                        "name": "find",
                        "kind": "method",
                        "type": "void",
                        "params": [
                            { "name": "stmt", "type": "java.sql.Statement" },
                            { "name": "userInput", "type": "java.lang.String" }
                        ]
                    } ]
                }
            ]
        },
        "tree": {
            "file": "Deep.java",
            "types": [ {
                "name": "Deep",
                "symbol": "p.Deep",
                "members": [ {
                    "member": "method",
                    "name": "find",
                    "symbol": "p.Deep#find",
                    "body": { "stmts": [ { "stmt": "expr", "expr": call } ] }
                } ]
            } ]
        }
    })
    .to_string()
}

#[test]
fn deeply_nested_concatenations() -> Result<()> {
    let engine = Engine::new()?;
    let result = engine.analyze_json(&deep_unit(200))?;
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message,
        "\"userInput\" is provided externally to the method and not sanitized before use."
    );

    let err = ResolvedUnit::from_json(&deep_unit(MAX_NESTING_DEPTH + 10))
        .err()
        .map(|e| format!("{e:#}"));
    assert!(err.is_some_and(|e| e.contains("Deep.java") && e.contains("nested deeper")));
    Ok(())
}
