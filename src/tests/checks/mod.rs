// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::panic, clippy::unwrap_used)] // yaml harness reports failures by panicking

use crate::ast::CompilationUnit;
use crate::semantic::ModelDocument;
use crate::unit::{ResolvedUnit, UnitDocument};
use crate::*;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use test_generator::test_resources;

#[derive(Debug, Deserialize)]
struct YamlTest {
    cases: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    note: String,
    /// Restrict the engine to these rules.
    #[serde(default)]
    rules: Option<Vec<String>>,
    /// Catalog document added on top of the built-in one.
    #[serde(default)]
    catalog: Option<serde_json::Value>,
    #[serde(default)]
    model: ModelDocument,
    tree: CompilationUnit,
    #[serde(default)]
    diagnostics: Vec<DiagnosticExpectation>,
    #[serde(default)]
    skip: bool,
}

#[derive(Debug, Deserialize)]
struct DiagnosticExpectation {
    rule: String,
    line: u32,
    #[serde(default)]
    col: Option<u32>,
    message: String,
}

impl DiagnosticExpectation {
    fn render(&self) -> String {
        format!("{} line {}: {}", self.rule, self.line, self.message)
    }
}

fn render(diagnostic: &Diagnostic) -> String {
    format!(
        "{} line {}: {}",
        diagnostic.rule, diagnostic.span.line, diagnostic.message
    )
}

fn run_case(case: TestCase) -> Result<()> {
    let options = AnalysisOptions {
        rules: case.rules,
        ..AnalysisOptions::default()
    };
    let mut engine = Engine::with_options(options)?;
    if let Some(catalog) = &case.catalog {
        engine.extend_catalog_json(&serde_json::to_string(catalog)?)?;
    }

    let unit = ResolvedUnit::from_document(UnitDocument {
        model: case.model,
        tree: case.tree,
    })?;
    let result = engine.analyze(&unit);

    if let Some(failure) = result.failures.first() {
        bail!("check failed: {failure}");
    }

    let expected = case
        .diagnostics
        .iter()
        .map(DiagnosticExpectation::render)
        .collect::<Vec<_>>()
        .join("\n");
    let actual = result
        .diagnostics
        .iter()
        .map(render)
        .collect::<Vec<_>>()
        .join("\n");
    if expected != actual {
        std::println!(
            "diagnostics mismatch:\n{}",
            prettydiff::diff_chars(&expected, &actual)
        );
        bail!("expected:\n{expected}\nactual:\n{actual}");
    }

    for (want, got) in case.diagnostics.iter().zip(&result.diagnostics) {
        if let Some(col) = want.col {
            if got.span.col != col {
                bail!(
                    "{} reported at column {}, expected {col}",
                    got.rule,
                    got.span.col
                );
            }
        }
    }
    Ok(())
}

fn yaml_test_impl(path: &str) -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read yaml test file {path}"))?;
    let test: YamlTest = serde_yaml::from_str(&yaml)
        .with_context(|| format!("failed to parse yaml test file {path}"))?;

    let count = test.cases.len();
    for case in test.cases {
        if case.skip {
            std::println!("case {} skipped", case.note);
            continue;
        }
        let note = case.note.clone();
        run_case(case).with_context(|| format!("case `{note}`"))?;
    }

    std::println!("{count} cases passed.");
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{e:#}");
        }
    }
}

#[test_resources("tests/checks/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
