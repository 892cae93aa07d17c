// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use lazy_static::lazy_static;
use std::thread;

use semlint::*;

// Ensure that an engine can be shared across threads.
lazy_static! {
    static ref ENGINE: Engine = Engine::new().expect("failed to build engine");
}

const UNIT: &str = r#"
{
  "model": { "types": [ { "name": "p.Foo" } ] },
  "tree": {
    "file": "Foo.java",
    "types": [ {
      "name": "Foo",
      "symbol": "p.Foo",
      "members": [ {
        "member": "method",
        "name": "same",
        "body": { "stmts": [ {
          "stmt": "return",
          "value": {
            "expr": "binary",
            "op": "equal_to",
            "span": { "line": 3, "col": 12 },
            "lhs": { "expr": "ident", "name": "a", "type": "p.Foo" },
            "rhs": { "expr": "ident", "name": "b", "type": "p.Foo" }
          }
        } ] }
      } ]
    } ]
  }
}
"#;

#[test]
fn shared_engine() -> anyhow::Result<()> {
    let unit = ResolvedUnit::from_json(UNIT)?;
    let expected = ENGINE.analyze(&unit);
    assert_eq!(expected.diagnostics.len(), 1);

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(|| ResolvedUnit::from_json(UNIT).map(|unit| ENGINE.analyze(&unit))))
        .collect();
    for handle in handles {
        let result = handle.join().expect("analysis thread panicked")?;
        assert_eq!(result, expected);
    }
    Ok(())
}
