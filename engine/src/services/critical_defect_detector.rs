//! Auto-fail critical-defect sweep — ambient supplement (SPEC_FULL §C),
//! feeding the TDG aggregator's auto-fail rule (spec.md §4.N names
//! `.unwrap()` in Rust / a naked panic in non-test Go as examples).
//! Grounded in `rust_borrow_checker.rs`'s style of cheap syntactic
//! heuristics rather than full semantic analysis.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Language;

static RUST_UNWRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.unwrap\(\)|\.expect\(").unwrap());
static GO_PANIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpanic\(").unwrap());

/// True if `path`/`source` contains a pattern spec.md §4.N treats as an
/// automatic disqualifier for a perfect score.
pub fn has_critical_defect(path: &str, source: &str, language: Language) -> bool {
    let is_test_file = path.contains("_test.")
        || path.contains(".test.")
        || path.contains(".spec.")
        || path.contains("/test/")
        || path.contains("/tests/")
        || path.contains("/__tests__/");

    match language {
        Language::Rust => !is_test_file && RUST_UNWRAP.is_match(source),
        Language::Go => !is_test_file && GO_PANIC.is_match(source),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_unwrap_outside_tests_is_critical() {
        assert!(has_critical_defect("src/lib.rs", "let x = maybe.unwrap();", Language::Rust));
    }

    #[test]
    fn rust_unwrap_inside_tests_is_not_critical() {
        assert!(!has_critical_defect("src/lib_test.rs", "let x = maybe.unwrap();", Language::Rust));
    }

    #[test]
    fn go_naked_panic_outside_tests_is_critical() {
        assert!(has_critical_defect("main.go", "panic(\"boom\")", Language::Go));
    }
}
