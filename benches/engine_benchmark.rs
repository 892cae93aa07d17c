// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hint::black_box;

use semlint::{Engine, ResolvedUnit};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

fn ident(name: &str, key: &str, ty: &str) -> Value {
    json!({ "expr": "ident", "name": name, "symbol": key, "type": ty })
}

fn literal(text: &str) -> Value {
    json!({ "expr": "literal", "literal": "string", "value": text, "type": "java.lang.String" })
}

/// A data access method that builds its query in a local variable over a
/// few statements and then runs it.
fn query_method(n: usize) -> (Value, Value) {
    let name = format!("find{n}");
    let method_key = format!("p.Dao#{name}");
    let param_key = format!("{method_key}.filter");
    let local_key = format!("{method_key}.sql");
    let line = (n * 10) as u32;

    let mut stmts = vec![json!({
        "stmt": "local",
        "name": "sql",
        "symbol": local_key,
        "type": "java.lang.String",
        "span": { "line": line + 1, "col": 5 },
        "init": literal("SELECT * FROM t WHERE 1 = 1"),
    })];
    for clause in 0..5 {
        stmts.push(json!({
            "stmt": "expr",
            "expr": {
                "expr": "assign",
                "op": "plus_assign",
                "span": { "line": line + 2 + clause, "col": 5 },
                "target": ident("sql", &local_key, "java.lang.String"),
                "value": literal(" AND c = 0"),
            }
        }));
    }
    let tail = if n % 2 == 0 {
        ident("filter", &param_key, "java.lang.String")
    } else {
        literal(" LIMIT 10")
    };
    stmts.push(json!({
        "stmt": "expr",
        "expr": {
            "expr": "call",
            "span": { "line": line + 8, "col": 5 },
            "callee": {
                "expr": "select",
                "name": "executeQuery",
                "target": ident("stmt", "p.Dao#stmt", "java.sql.Statement"),
            },
            "args": [{
                "expr": "binary",
                "op": "plus",
                "type": "java.lang.String",
                "lhs": ident("sql", &local_key, "java.lang.String"),
                "rhs": tail,
            }],
        }
    }));

    let member = json!({
        "name": name,
        "kind": "method",
        "type": "void",
        "params": [{ "name": "filter", "type": "java.lang.String" }],
        "locals": [{ "name": "sql", "type": "java.lang.String" }],
    });
    let tree = json!({
        "member": "method",
        "name": name,
        "symbol": method_key,
        "span": { "line": line, "col": 3 },
        "body": { "stmts": stmts },
    });
    (member, tree)
}

fn dao_unit(methods: usize) -> ResolvedUnit {
    let mut members = vec![json!({ "name": "stmt", "type": "java.sql.Statement" })];
    let mut decls = vec![];
    for n in 0..methods {
        let (member, decl) = query_method(n);
        members.push(member);
        decls.push(decl);
    }
    let document = json!({
        "model": {
            "types": [
                { "name": "java.sql.Statement", "kind": "interface" },
                { "name": "p.Dao", "members": members },
            ]
        },
        "tree": {
            "file": "Dao.java",
            "types": [{ "name": "Dao", "symbol": "p.Dao", "members": decls }],
        }
    });
    ResolvedUnit::from_json(&document.to_string()).unwrap()
}

fn analyze_units(c: &mut Criterion) {
    let engine = Engine::new().unwrap();

    let mut group = c.benchmark_group("analyze dao");
    for methods in [10, 100, 1000] {
        let unit = dao_unit(methods);
        assert_eq!(engine.analyze(&unit).diagnostics.len(), methods.div_ceil(2));
        group.bench_with_input(BenchmarkId::from_parameter(methods), &unit, |b, unit| {
            b.iter(|| engine.analyze(black_box(unit)))
        });
    }
    group.finish();
}

criterion_group!(benches, analyze_units);
criterion_main!(benches);
