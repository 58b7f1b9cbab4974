//! Binary entry point: wires the `clap`-derived CLI surface (spec.md §6)
//! to the library. Grounded on `server/src/cli/mod.rs`'s `RUST_LOG`/
//! tracing-subscriber initialization style.

use std::collections::HashMap;
use std::process::ExitCode as ProcessExitCode;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use qualitygate::cli::{Cli, Commands, ExitCode};
use qualitygate::config::DuplicateConfig;
use qualitygate::models::defect::FileMetrics;
use qualitygate::models::Language;
use qualitygate::services::cancellation::CancellationToken;
use qualitygate::services::change_risk_analyzer::ChangeRiskAnalyzer;
use qualitygate::services::churn_analyzer::ChurnAnalyzer;
use qualitygate::services::cohesion_analyzer::{build_classes, CohesionAnalyzer};
use qualitygate::services::complexity_analyzer::{order_by_max_cyclomatic_desc, ComplexityAnalyzer};
use qualitygate::services::content_source::{CachedContentSource, FilesystemSource};
use qualitygate::services::critical_defect_detector;
use qualitygate::services::dead_code_analyzer::{build_reference_graph, DeadCodeAnalyzer};
use qualitygate::services::defect_analyzer::DefectAnalyzer;
use qualitygate::services::duplicate_detector::{extract_fragments, DuplicateDetector, IdentifierCanonicalizer};
use qualitygate::services::graph_analyzer::{build_graph, GraphAnalyzer};
use qualitygate::services::parser::{NullParser, ParserFacade};
use qualitygate::services::progress::ProgressTracker;
use qualitygate::services::satd_detector;
use qualitygate::services::smells_analyzer::SmellsAnalyzer;
use qualitygate::services::tdg_calculator::{penalties_for_file, TdgCalculator};
use qualitygate::services::vcs::Git2VcsReader;

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    let filter = tracing_subscriber::EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let code = match run(cli) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::GenericFailure
        }
    };
    ProcessExitCode::from(code as u8)
}

/// Default exclude globs for the `walkdir`-based commands; `Duplicates`
/// already honors `.gitignore` via `ignore::Walk`, but the rest of the
/// CLI's analyzers want a fixed exclude list instead.
fn default_excludes() -> Vec<glob::Pattern> {
    ["**/target/**", "**/node_modules/**", "**/vendor/**", "**/.git/**", "**/dist/**"]
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect()
}

fn is_excluded(path: &std::path::Path, excludes: &[glob::Pattern]) -> bool {
    excludes.iter().any(|pat| pat.matches_path(path))
}

fn is_test_path(path: &str) -> bool {
    path.contains("_test.")
        || path.contains(".test.")
        || path.contains(".spec.")
        || path.contains("/test/")
        || path.contains("/tests/")
        || path.contains("/__tests__/")
}

/// Walks `root` for source files the parser facade recognizes, returning
/// `(path, bytes, language)` triples.
fn walk_source_files(root: &std::path::Path) -> Vec<(String, Vec<u8>, Language)> {
    let excludes = default_excludes();
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_excluded(path, &excludes) {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else { continue };
        let language = Language::from_extension(ext);
        if language == Language::Unknown {
            continue;
        }
        let Ok(bytes) = std::fs::read(path) else { continue };
        out.push((path.to_string_lossy().into_owned(), bytes, language));
    }
    out
}

/// Parses every file with `NullParser`, documenting honestly that a real
/// parser facade (component B) is consumed externally per spec.md §1 —
/// this CLI driver has none wired in, so functions/classes stay empty
/// until a caller supplies a real `ParserFacade` through the library.
fn parse_all(files: &[(String, Vec<u8>, Language)]) -> anyhow::Result<Vec<(String, qualitygate::services::parser::ParseResult)>> {
    let parser = NullParser;
    files
        .iter()
        .map(|(path, bytes, language)| Ok((path.clone(), parser.parse(bytes, *language, path)?)))
        .collect()
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Churn { path, days } => {
            // spec.md §5: each VCS-bound operation runs under the default
            // 5-minute deadline; expiry trips the token for any
            // cooperative check still in flight.
            let token = CancellationToken::new();
            let token_inner = token.clone();
            let since = Utc::now() - chrono::Duration::days(days);
            let now = Utc::now();
            let report = qualitygate::services::cancellation::with_deadline(
                &token,
                std::time::Duration::from_secs(300),
                move || {
                    let vcs = Git2VcsReader::open(&path)?;
                    let content = FilesystemSource;
                    let cached = CachedContentSource::new(&content);
                    ChurnAnalyzer::new(&vcs, &cached)
                        .with_cancellation(token_inner)
                        .analyze(since, now)
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::ChangeRisk { path, days, weights, target } => {
            let w: qualitygate::config::ChangeRiskWeights = match weights {
                Some(json) => serde_json::from_str(&json)?,
                None => Default::default(),
            };
            let token = CancellationToken::new();
            let token_inner = token.clone();
            let since = Utc::now() - chrono::Duration::days(days);
            if target.is_empty() {
                let report = qualitygate::services::cancellation::with_deadline(
                    &token,
                    std::time::Duration::from_secs(300),
                    move || {
                        let vcs = Git2VcsReader::open(&path)?;
                        ChangeRiskAnalyzer::new(&vcs, w).with_cancellation(token_inner).analyze(since)
                    },
                )?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                // spec.md §4.F branch-diff mode: score one aggregate commit
                // spanning the merge-base of `target` and HEAD, instead of
                // the commit-history window.
                let risk = qualitygate::services::cancellation::with_deadline(
                    &token,
                    std::time::Duration::from_secs(300),
                    move || {
                        let vcs = Git2VcsReader::open(&path)?;
                        ChangeRiskAnalyzer::new(&vcs, w)
                            .with_cancellation(token_inner)
                            .analyze_branch_diff(&target)
                    },
                )?;
                println!("{}", serde_json::to_string_pretty(&risk)?);
            }
        }
        Commands::Duplicates { path, threshold, min_tokens, shingle_size, hashes, bands, rows_per_band, max_file_size } => {
            let config = DuplicateConfig {
                min_tokens,
                similarity_threshold: threshold,
                shingle_size,
                num_hash_functions: hashes,
                num_bands: bands,
                rows_per_band,
                max_file_size,
                ..Default::default()
            };
            let detector = DuplicateDetector::new(config)?;
            let canon = IdentifierCanonicalizer::default();
            let id_counter = AtomicU32::new(0);

            let mut fragments = Vec::new();
            for entry in ignore::Walk::new(&path).filter_map(Result::ok) {
                if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    continue;
                }
                let p = entry.path();
                let Some(ext) = p.extension().and_then(|e| e.to_str()) else { continue };
                let language = Language::from_extension(ext);
                if language == Language::Unknown {
                    continue;
                }
                let Ok(bytes) = std::fs::read(p) else { continue };
                if max_file_size > 0 && bytes.len() as u64 > max_file_size {
                    continue;
                }
                let Ok(text) = String::from_utf8(bytes) else { continue };
                let path_str = p.to_string_lossy().into_owned();
                fragments.extend(extract_fragments(&path_str, &text, language, min_tokens, &canon, &id_counter));
            }
            let report = detector.detect(fragments);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::DeadCode { path, confidence } => {
            let files = walk_source_files(&path);
            let parsed = parse_all(&files)?;
            let (nodes, edges, bodies) = build_reference_graph(&parsed);
            let analyzer = DeadCodeAnalyzer::new(confidence);
            let report = analyzer.analyze(nodes, edges, &bodies);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Tdg { path } => {
            let files = walk_source_files(&path);

            let bar = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            let bar_for_callback = bar.clone();
            let tracker = ProgressTracker::with_callback(Arc::new(move |current, total, path| {
                bar_for_callback.set_length(total);
                bar_for_callback.set_position(current);
                bar_for_callback.set_message(path.to_string());
            }));
            tracker.set_total(files.len() as u64);

            let since = Utc::now() - chrono::Duration::days(90);
            let now = Utc::now();
            let churn_by_file: HashMap<String, qualitygate::models::churn::FileChurn> = Git2VcsReader::open(&path)
                .ok()
                .and_then(|vcs| {
                    let content = FilesystemSource;
                    let cached = CachedContentSource::new(&content);
                    ChurnAnalyzer::new(&vcs, &cached).analyze(since, now).ok()
                })
                .map(|report| report.files.into_iter().map(|f| (f.path.clone(), f)).collect())
                .unwrap_or_default();

            let parser = NullParser;
            let complexity_analyzer = ComplexityAnalyzer::new(&parser);
            let canon = IdentifierCanonicalizer::default();
            let id_counter = AtomicU32::new(0);
            let detector = DuplicateDetector::new(DuplicateConfig::default())?;

            let mut fragments = Vec::new();
            let mut per_file_text = Vec::with_capacity(files.len());
            for (path_str, bytes, language) in &files {
                tracker.tick(path_str);
                let Ok(text) = String::from_utf8(bytes.clone()) else { continue };
                fragments.extend(extract_fragments(path_str, &text, *language, 50, &canon, &id_counter));
                per_file_text.push((path_str.clone(), text, *language));
            }
            bar.finish_and_clear();

            let dup_report = detector.detect(fragments);
            let mut duplicate_lines_by_file: HashMap<String, usize> = HashMap::new();
            for group in &dup_report.groups {
                for instance in &group.instances {
                    *duplicate_lines_by_file.entry(instance.file.clone()).or_insert(0) += instance.lines;
                }
            }

            let calculator = TdgCalculator::default();
            let mut scores = HashMap::new();
            for (path_str, text, language) in &per_file_text {
                let complexity = complexity_analyzer.analyze_file(text.as_bytes(), *language, path_str)?;
                let satd = satd_detector::scan(path_str, text);
                let total_lines = text.lines().count().max(1);
                let duplicate_ratio =
                    (duplicate_lines_by_file.get(path_str).copied().unwrap_or(0) as f64 / total_lines as f64).min(1.0);
                let churn = churn_by_file.get(path_str);
                let penalties = penalties_for_file(path_str, churn, complexity.as_ref(), duplicate_ratio, &satd);
                let has_critical = critical_defect_detector::has_critical_defect(path_str, text, *language);
                // No churn history (e.g. an untracked working tree) costs
                // confidence rather than aborting the score, per spec.md
                // §4.N's "missing signals reduce confidence" rule.
                let confidence = if churn.is_some() { 1.0 } else { 0.9 };
                scores.insert(path_str.clone(), calculator.calculate(&penalties, has_critical, confidence));
            }

            let report = calculator.aggregate(scores);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Cohesion { path, include_test_files } => {
            let files = walk_source_files(&path);
            let parser = NullParser;
            let mut classes = Vec::new();
            for (path_str, bytes, language) in &files {
                if !include_test_files && is_test_path(path_str) {
                    continue;
                }
                if !language.is_object_oriented() {
                    continue;
                }
                let parsed = parser.parse(bytes, *language, path_str)?;
                classes.extend(build_classes(path_str, &parsed));
            }
            let metrics = CohesionAnalyzer::analyze(classes);
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Graph { path } => {
            let files = walk_source_files(&path);
            let parsed = parse_all(&files)?;
            let dep_graph = build_graph(&parsed);
            let metrics = GraphAnalyzer::new(&dep_graph).metrics();
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        Commands::Smells { path } => {
            let files = walk_source_files(&path);
            let parsed = parse_all(&files)?;
            let dep_graph = build_graph(&parsed);
            let smells = SmellsAnalyzer::new(Default::default()).analyze(&dep_graph);
            println!("{}", serde_json::to_string_pretty(&smells)?);
        }
        Commands::Complexity { path } => {
            let parser = NullParser;
            let analyzer = ComplexityAnalyzer::new(&parser);
            let files = walk_source_files(&path);
            let mut reports = Vec::new();
            for (path_str, bytes, language) in &files {
                if let Some(report) = analyzer.analyze_file(bytes, *language, path_str)? {
                    reports.push(report);
                }
            }
            let ordered = order_by_max_cyclomatic_desc(reports);
            println!("{}", serde_json::to_string_pretty(&ordered)?);
        }
        Commands::Defect { path, days, weights } => {
            let w: qualitygate::config::DefectWeights = match weights {
                Some(json) => serde_json::from_str(&json)?,
                None => Default::default(),
            };
            let since = Utc::now() - chrono::Duration::days(days);
            let now = Utc::now();
            let vcs = Git2VcsReader::open(&path)?;
            let content = FilesystemSource;
            let cached = CachedContentSource::new(&content);
            let churn_report = ChurnAnalyzer::new(&vcs, &cached).analyze(since, now)?;
            let churn_by_file: HashMap<String, f64> =
                churn_report.files.iter().map(|f| (f.path.clone(), f.churn_score)).collect();

            let parser = NullParser;
            let complexity_analyzer = ComplexityAnalyzer::new(&parser);
            let analyzer = DefectAnalyzer::new(w);
            let files = walk_source_files(&path);

            let mut scores = HashMap::new();
            for (path_str, bytes, language) in &files {
                let complexity = complexity_analyzer.analyze_file(bytes, *language, path_str)?;
                let loc = String::from_utf8_lossy(bytes).lines().count();
                // Coupling/duplication/ownership aren't composed here —
                // they come from separate subcommands — so they stay at
                // their "missing" defaults and the confidence discount in
                // `DefectAnalyzer::score` accounts for that honestly.
                let metrics = FileMetrics {
                    churn_score: churn_by_file.get(path_str).copied(),
                    max_cyclomatic: complexity.map(|c| c.max_cyclomatic as f64).unwrap_or(0.0),
                    duplicate_ratio: 0.0,
                    afferent_coupling: None,
                    ownership_diffusion: 0.0,
                    loc,
                };
                scores.insert(path_str.clone(), analyzer.score(&metrics));
            }
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
    }
    Ok(())
}
