use crate::config::EngineConfig;
use crate::detector::{Detector, PatternDetector};
use crate::document::builder::DocumentBuilder;
use crate::engine::AdoptionEngine;
use crate::extraction::ExtractionService;
use crate::report::{fingerprint, ReviewReport};
use crate::types::{ExtractedDocument, SuggestionId, ToggleResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Stages of a review, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStep {
    Extraction,
    DocumentTree,
    Detection,
    Catalog,
    Adoption,
}

impl ReviewStep {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStep::Extraction => "Extraction",
            ReviewStep::DocumentTree => "Document tree",
            ReviewStep::Detection => "Detection",
            ReviewStep::Catalog => "Catalog",
            ReviewStep::Adoption => "Adoption",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTiming {
    pub step: ReviewStep,
    /// How many times the step ran, e.g. one per adopted suggestion
    pub runs: usize,
    pub elapsed_ms: f64,
}

/// Accumulates wall time per review step when enabled (`--profile`).
pub struct StepProfiler {
    enabled: bool,
    steps: BTreeMap<ReviewStep, (usize, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            steps: BTreeMap::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step: ReviewStep, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        debug!("{} took {:.2}ms", step.label(), elapsed.as_secs_f64() * 1000.0);
        let entry = self.steps.entry(step).or_insert((0, Duration::ZERO));
        entry.0 += 1;
        entry.1 += elapsed;
        result
    }

    /// Per-step totals in pipeline order; empty when profiling is off
    pub fn timings(&self) -> Vec<StepTiming> {
        self.steps
            .iter()
            .map(|(step, (runs, elapsed))| StepTiming {
                step: *step,
                runs: *runs,
                elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            })
            .collect()
    }

    pub fn print_summary(&self) {
        let timings = self.timings();
        if timings.is_empty() {
            return;
        }

        println!("\n📊 Review Timing:");
        let total: f64 = timings.iter().map(|t| t.elapsed_ms).sum();
        for timing in &timings {
            let share = if total > 0.0 { timing.elapsed_ms / total * 100.0 } else { 0.0 };
            println!(
                "   {:.<30} {:>8.2}ms x{} ({:.1}%)",
                timing.step.label(),
                timing.elapsed_ms,
                timing.runs,
                share
            );
        }
        println!("   {:.<30} {:>8.2}ms", "Total", total);
    }
}

/// One uploaded document under review: extraction, detection and the
/// adoption engine wired together.
pub struct ReviewSession {
    file_name: String,
    source_sha256: String,
    extracted: ExtractedDocument,
    engine: AdoptionEngine,
}

impl ReviewSession {
    /// extract -> build tree -> detect -> load catalog
    pub fn open(
        bytes: &[u8],
        extension: &str,
        file_name: &str,
        config: EngineConfig,
        profiler: &mut StepProfiler,
    ) -> Result<Self> {
        config.validate()?;
        let service = ExtractionService::new();
        let extracted =
            profiler.time_step(ReviewStep::Extraction, || service.extract(bytes, extension))?;
        Self::review(extracted, fingerprint(bytes), file_name, config, profiler)
    }

    pub fn open_file(path: &Path, config: EngineConfig, profiler: &mut StepProfiler) -> Result<Self> {
        config.validate()?;
        let service = ExtractionService::new();
        let (bytes, extracted) =
            profiler.time_step(ReviewStep::Extraction, || service.extract_file(path))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::review(extracted, fingerprint(&bytes), &file_name, config, profiler)
    }

    fn review(
        extracted: ExtractedDocument,
        source_sha256: String,
        file_name: &str,
        config: EngineConfig,
        profiler: &mut StepProfiler,
    ) -> Result<Self> {
        let detector = PatternDetector::new(config.detector.rules.clone())?;
        let tree = profiler.time_step(ReviewStep::DocumentTree, || {
            DocumentBuilder::new().build(&extracted)
        })?;
        let issues = profiler.time_step(ReviewStep::Detection, || {
            detector.detect(&extracted.text_content)
        });
        info!(
            "{} flagged {} issues in {}",
            detector.name(),
            issues.len(),
            file_name
        );

        let mut engine = AdoptionEngine::new(tree, config)?;
        profiler.time_step(ReviewStep::Catalog, || engine.load_catalog(issues))?;

        Ok(Self {
            file_name: file_name.to_string(),
            source_sha256,
            extracted,
            engine,
        })
    }

    pub fn engine(&self) -> &AdoptionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AdoptionEngine {
        &mut self.engine
    }

    pub fn extracted(&self) -> &ExtractedDocument {
        &self.extracted
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn adopt(&mut self, id: SuggestionId) -> Result<ToggleResult> {
        Ok(self.engine.toggle(id)?)
    }

    /// Toggle every suggestion that is not adopted yet, in id order
    pub fn adopt_all(&mut self) -> Result<Vec<ToggleResult>> {
        let pending: Vec<SuggestionId> = self
            .engine
            .suggestions()
            .iter()
            .filter(|s| !s.adopted())
            .map(|s| s.id)
            .collect();

        let mut results = Vec::with_capacity(pending.len());
        for id in pending {
            results.push(self.engine.toggle(id)?);
        }
        Ok(results)
    }

    pub fn report(&self) -> ReviewReport {
        let document = self.engine.document();
        ReviewReport::new(
            &self.file_name,
            &self.source_sha256,
            self.extracted.format,
            self.engine.suggestions(),
            document.to_html(),
            document.to_plain_text(),
        )
    }
}
