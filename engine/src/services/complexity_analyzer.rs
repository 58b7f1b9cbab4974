//! Complexity analyzer (component G), spec.md §4.G.
//!
//! Cyclomatic complexity is `1 + decision points`; cognitive complexity
//! follows Campbell's nesting-multiplier rule set. Operates on the raw
//! source text sliced by the parser facade's function line ranges, since
//! spec.md §1 keeps full AST traversal out of scope for this core.
//! No direct teacher file; decision-point keyword sets are standard
//! across the corpus's complexity services and are written directly from
//! spec.md §4.G's enumerated set.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineResult;
use crate::models::complexity::{FileComplexity, FunctionComplexity};
use crate::models::Language;
use crate::services::parser::{ParserFacade, FunctionView};

static DECISION_POINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|for|while|case|catch)\b|&&|\|\||\?").expect("decision-point regex is valid")
});

static NESTING_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(if|for|while|case|catch)\b").expect("nesting-open regex is valid")
});

pub struct ComplexityAnalyzer<'a> {
    parser: &'a dyn ParserFacade,
}

impl<'a> ComplexityAnalyzer<'a> {
    pub fn new(parser: &'a dyn ParserFacade) -> Self {
        ComplexityAnalyzer { parser }
    }

    /// `pub(crate)` so `cohesion_analyzer::build_classes` can reuse it for
    /// `MethodDeclaration.cyclomatic` instead of duplicating the keyword
    /// scan.
    pub(crate) fn function_complexity(source_lines: &[&str], func: &FunctionView) -> FunctionComplexity {
        let start = func.start_line.saturating_sub(1).min(source_lines.len());
        let end = func.end_line.min(source_lines.len());
        let body = &source_lines[start..end];

        let cyclomatic = 1 + body.iter().map(|line| DECISION_POINTS.find_iter(line).count() as u32).sum::<u32>();

        // Cognitive complexity: +1 per decision point, plus current
        // nesting depth as a multiplier, tracked via brace balance.
        let mut cognitive = 0u32;
        let mut depth: i32 = 0;
        for line in body {
            let hits = NESTING_OPEN.find_iter(line).count() as u32;
            if hits > 0 {
                cognitive += hits * (depth as u32 + 1);
            }
            cognitive += line.matches("&&").count() as u32 + line.matches("||").count() as u32;
            depth += line.matches('{').count() as i32 - line.matches('}').count() as i32;
            depth = depth.max(0);
        }

        FunctionComplexity {
            name: func.name.clone(),
            start_line: func.start_line,
            end_line: func.end_line,
            cyclomatic,
            cognitive,
        }
    }

    /// Skips files whose language is `Unknown`, per spec.md §4.G.
    pub fn analyze_file(&self, bytes: &[u8], language: Language, path: &str) -> EngineResult<Option<FileComplexity>> {
        if language == Language::Unknown {
            return Ok(None);
        }
        let parsed = self.parser.parse(bytes, language, path)?;
        let text = String::from_utf8_lossy(&parsed.source);
        let lines: Vec<&str> = text.lines().collect();

        let functions: Vec<FunctionComplexity> = parsed
            .functions
            .iter()
            .map(|f| Self::function_complexity(&lines, f))
            .collect();

        let sum_cyclomatic: u32 = functions.iter().map(|f| f.cyclomatic).sum();
        let max_cyclomatic = functions.iter().map(|f| f.cyclomatic).max().unwrap_or(0);
        let avg_cyclomatic = if functions.is_empty() { 0.0 } else { sum_cyclomatic as f64 / functions.len() as f64 };

        Ok(Some(FileComplexity {
            path: path.to_string(),
            functions,
            sum_cyclomatic,
            avg_cyclomatic,
            max_cyclomatic,
        }))
    }
}

/// Orders a batch of per-file reports by descending max cyclomatic, per
/// spec.md §4.G.
pub fn order_by_max_cyclomatic_desc(mut files: Vec<FileComplexity>) -> Vec<FileComplexity> {
    files.sort_by(|a, b| b.max_cyclomatic.cmp(&a.max_cyclomatic));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::NullParser;

    #[test]
    fn unknown_language_is_skipped() {
        let parser = NullParser;
        let analyzer = ComplexityAnalyzer::new(&parser);
        let result = analyzer.analyze_file(b"whatever", Language::Unknown, "x.xyz").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn ordering_is_descending_by_max_cyclomatic() {
        let a = FileComplexity { path: "a".into(), max_cyclomatic: 3, ..Default::default() };
        let b = FileComplexity { path: "b".into(), max_cyclomatic: 9, ..Default::default() };
        let ordered = order_by_max_cyclomatic_desc(vec![a, b]);
        assert_eq!(ordered[0].path, "b");
    }
}
