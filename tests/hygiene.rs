//! Hygiene: source-level budgets for patterns the crate does not allow.
//!
//! Production files under `src/` (everything except `*_test.rs`) are scanned
//! line by line. Budgets only ever go down.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

/// Pattern, budget, and what the pattern costs us.
const BUDGETS: &[(&str, usize, &str)] = &[
    (".unwrap()", 0, "panics on None/Err"),
    (".expect(", 0, "panics on None/Err"),
    ("panic!(", 0, "crashes the wasm instance"),
    ("unreachable!(", 0, "crashes the wasm instance"),
    ("todo!(", 0, "unfinished code path"),
    ("unimplemented!(", 0, "unfinished code path"),
    ("let _ =", 0, "discards a value without looking at it"),
    (".ok()", 0, "drops an error silently"),
    ("#[allow(dead_code)]", 0, "hides unused code"),
];

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

fn check(pattern: &str) {
    let Some(&(_, max, why)) = BUDGETS.iter().find(|(p, _, _)| *p == pattern) else {
        panic!("no budget for {pattern}");
    };
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the crate root");
    let found = hits(&files, pattern);
    let count: usize = found.iter().map(|(_, c)| c).sum();
    let listing = found.iter().map(|(path, c)| format!("  {path}: {c}")).collect::<Vec<_>>().join("\n");
    assert!(count <= max, "{pattern} ({why}) budget exceeded: found {count}, max {max}.\n{listing}");
}

#[test]
fn unwrap_budget() {
    check(".unwrap()");
}

#[test]
fn expect_budget() {
    check(".expect(");
}

#[test]
fn panic_budget() {
    check("panic!(");
}

#[test]
fn unreachable_budget() {
    check("unreachable!(");
}

#[test]
fn todo_budget() {
    check("todo!(");
}

#[test]
fn unimplemented_budget() {
    check("unimplemented!(");
}

#[test]
fn silent_discard_budget() {
    check("let _ =");
}

#[test]
fn dot_ok_budget() {
    check(".ok()");
}

#[test]
fn allow_dead_code_budget() {
    check("#[allow(dead_code)]");
}

#[test]
fn every_test_module_has_its_file() {
    for file in source_files() {
        for line in file.content.lines() {
            let Some(rest) = line.trim().strip_prefix("#[path = \"") else {
                continue;
            };
            let Some(name) = rest.strip_suffix("\")]") else {
                continue;
            };
            let sibling = Path::new(&file.path).with_file_name(name);
            assert!(sibling.exists(), "{} declares missing test module {name}", file.path);
        }
    }
}

fn dependency_names(manifest: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_deps = false;
    for line in manifest.lines().map(str::trim) {
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_deps = section == "dependencies";
            if let Some(name) = section.strip_prefix("dependencies.") {
                names.push(name.replace('-', "_"));
            }
            continue;
        }
        if in_deps {
            if let Some((name, _)) = line.split_once('=') {
                names.push(name.trim().replace('-', "_"));
            }
        }
    }
    names
}

fn mentions_path(content: &str, krate: &str) -> bool {
    let needle = format!("{krate}::");
    content.match_indices(&needle).any(|(at, _)| {
        content[..at].chars().next_back().is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

#[test]
fn every_dependency_is_used() {
    let manifest = fs::read_to_string("Cargo.toml").unwrap_or_default();
    let names = dependency_names(&manifest);
    assert!(names.contains(&"serde".to_owned()), "no dependencies parsed from Cargo.toml");
    let files = source_files();
    for name in names {
        assert!(
            files.iter().any(|file| mentions_path(&file.content, &name)),
            "dependency {name} is never referenced from src/"
        );
    }
}
