//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting happens on
//! channels, notifications and `tokio::time::interval` ticks.
//! **Exceptions**: test code

use architectural_enforcement::scan;

fn is_sleep(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = scan("scrollstory/core/src", is_sleep);
    violations.extend(scan("tui/src", is_sleep));

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ ACCEPTABLE waits:");
        eprintln!("  - Animation frames using tokio::time::interval()");
        eprintln!("  - Test code (#[cfg(test)] modules and tests/)");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep("    tokio::time::sleep(Duration::from_millis(10)).await;"));
    assert!(is_sleep("std::thread::sleep(d);"));
    assert!(!is_sleep("ticker.tick().await;"));
}
