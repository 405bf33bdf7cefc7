//! Integration Test: Headless Story Engine
//!
//! **Policy**: `scrollstory/core` MUST NOT depend on a terminal or drawing
//! crate. Surfaces plug in through the collaborator traits; the terminal
//! surface lives in `tui/`.

use std::fs;

use architectural_enforcement::{scan, workspace_root};

const SURFACE_CRATES: &[&str] = &["ratatui", "crossterm", "unicode-width", "textwrap"];

#[test]
fn test_core_manifest_has_no_surface_crates() {
    let manifest = fs::read_to_string(workspace_root().join("scrollstory/core/Cargo.toml"))
        .expect("core manifest should be readable");

    let found: Vec<&str> = SURFACE_CRATES
        .iter()
        .copied()
        .filter(|name| {
            manifest
                .lines()
                .any(|line| line.trim_start().starts_with(&format!("{name} ")))
        })
        .collect();

    assert!(
        found.is_empty(),
        "scrollstory-core must stay headless, found: {found:?}"
    );
}

#[test]
fn test_core_source_does_not_use_surface_crates() {
    let violations = scan("scrollstory/core/src", |code| {
        code.contains("ratatui::") || code.contains("crossterm::")
    });

    for violation in &violations {
        eprintln!("  ❌ {violation}");
    }
    assert!(
        violations.is_empty(),
        "Found {} terminal crate use(s) in scrollstory-core",
        violations.len()
    );
}
