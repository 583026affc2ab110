use crate::registry::{CompilationReport, CompiledMapping};
use crate::log_success;
use std::path::PathBuf;
use std::time::Duration;

/// Mapping script file as read from disk
#[derive(Debug, Clone)]
pub struct ScriptFile {
    pub path: PathBuf,
    pub size: u64,
    pub source: String,
}

/// Outcome of compiling one script file
#[derive(Debug)]
pub struct PipelineResult {
    pub path: PathBuf,
    pub file_size: u64,
    pub mapping: CompiledMapping,
    pub reports: Vec<CompilationReport>,
    pub processing_duration: Duration,
}

impl PipelineResult {
    pub fn new(
        file: ScriptFile,
        mapping: CompiledMapping,
        reports: Vec<CompilationReport>,
        processing_duration: Duration,
    ) -> Self {
        Self {
            path: file.path,
            file_size: file.size,
            mapping,
            reports,
            processing_duration,
        }
    }

    pub fn node_count(&self) -> usize {
        self.mapping.source_tree.len() + self.mapping.target_tree.len()
    }

    pub fn log_success(&self) {
        crate::log_success!(
            crate::logging::codes::success::FILE_PROCESSING_SUCCESS,
            "Mapping script compiled",
            "file" => self.path.display(),
            "mapping" => self.mapping.id,
            "commands" => self.mapping.commands.len(),
            "nodes" => self.node_count(),
            "duration_ms" => format!("{:.2}", self.processing_duration.as_secs_f64() * 1000.0)
        );
    }
}
