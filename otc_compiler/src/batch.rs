//! Batch compilation of mapping script directories
//!
//! Discovers `.otc.toml` scripts with `walkdir` and compiles them either
//! sequentially or on a bounded pool of worker threads. Every file is
//! compiled inside its own logging file context so the global error
//! collector can print a cargo-style summary afterwards.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::grammar::IdentifierRegistry;
use crate::introspection::TypeIntrospector;
use crate::logging::codes;
use crate::pipeline::{self, PipelineError, PipelineResult};
use crate::registry::{MappingCompiler, RegistryBuilder, RegistryError};
use crate::{log_debug, log_info, log_success, log_warning};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub report_progress: bool,
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(MAX_WORKER_THREADS))
                .unwrap_or(4),
            recursive: true,
            max_files: None,
            report_progress: false,
            fail_fast: false,
        }
    }
}

impl BatchConfig {
    pub fn sequential() -> Self {
        Self {
            max_threads: 1,
            ..Self::default()
        }
    }

    fn file_limit(&self) -> usize {
        self.max_files
            .map(|limit| limit.min(MAX_FILES_PER_BATCH))
            .unwrap_or(MAX_FILES_PER_BATCH)
    }

    fn thread_count(&self) -> usize {
        self.max_threads.clamp(1, MAX_WORKER_THREADS)
    }
}

/// Outcome of compiling every discovered script
#[derive(Debug, Default)]
pub struct BatchResults {
    pub compiled: Vec<(PathBuf, PipelineResult)>,
    pub failed: Vec<(PathBuf, PipelineError)>,
    pub scripts_found: usize,
    pub elapsed: Duration,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Scripts actually compiled; fewer than found when fail-fast stopped early
    pub fn attempted(&self) -> usize {
        self.compiled.len() + self.failed.len()
    }

    pub fn add(&mut self, file_path: PathBuf, outcome: Result<PipelineResult, PipelineError>) {
        match outcome {
            Ok(result) => self.compiled.push((file_path, result)),
            Err(error) => self.failed.push((file_path, error)),
        }
    }

    fn absorb(&mut self, other: BatchResults) {
        self.compiled.extend(other.compiled);
        self.failed.extend(other.failed);
    }

    /// Redraw generated type names from one registry in file order. Workers
    /// own separate registries, so their names can collide.
    fn assign_generated_types(&mut self) {
        let mut identifiers = IdentifierRegistry::new();
        for (_, result) in &mut self.compiled {
            result.mapping.assign_generated_types(&mut identifiers);
        }
    }

    /// Register every compiled mapping. Duplicate ids across files are
    /// returned instead of aborting the whole registration.
    pub fn register_into(&self, builder: &mut RegistryBuilder<'_>) -> Vec<RegistryError> {
        self.compiled
            .iter()
            .filter_map(|(_, result)| builder.add_compiled(result.mapping.clone()).err())
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} script(s) compiled, {} failed in {:.2}s",
            self.compiled_count(),
            self.scripts_found,
            self.failed_count(),
            self.elapsed.as_secs_f64()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No mapping scripts found in directory: {path}")]
    NoFilesFound { path: String },

    #[error("IO error during directory traversal: {error}")]
    IoError { error: String },

    #[error("Thread pool error: {message}")]
    ThreadError { message: String },
}

impl BatchError {
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::DirectoryNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            Self::NoFilesFound { .. } => codes::file_processing::INVALID_EXTENSION,
            Self::IoError { .. } => codes::file_processing::IO_ERROR,
            Self::ThreadError { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}

/// Mapping scripts under `dir_path`, sorted
pub fn discover_script_files(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<Vec<PathBuf>, BatchError> {
    log_info!("Starting file discovery",
        "directory" => dir_path.display(),
        "recursive" => config.recursive
    );

    if !dir_path.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: dir_path.display().to_string(),
        });
    }

    let limit = config.file_limit();
    let walker = WalkDir::new(dir_path)
        .max_depth(if config.recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| BatchError::IoError {
            error: e.to_string(),
        })?;
        let path = entry.into_path();
        if !pipeline::is_script_file(&path) {
            continue;
        }
        files.push(path);
        if files.len() >= limit {
            log_warning!("Reached maximum file limit",
                "files_found" => files.len(),
                "limit" => limit
            );
            break;
        }
    }

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir_path.display().to_string(),
        });
    }

    files.sort();

    log_success!(codes::success::OPERATION_COMPLETED_SUCCESSFULLY, "File discovery completed",
        "files_found" => files.len(),
        "directory" => dir_path.display()
    );

    Ok(files)
}

pub fn process_directory_sequential(
    dir_path: &Path,
    introspector: &dyn TypeIntrospector,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();

    log_info!("Starting sequential batch compilation",
        "directory" => dir_path.display()
    );

    let files = discover_script_files(dir_path, config)?;
    let mut results = BatchResults::new();
    results.scripts_found = files.len();

    let mut compiler = MappingCompiler::new(introspector);
    for (file_id, file_path) in files.iter().enumerate() {
        if config.report_progress {
            println!(
                "Compiling file {} of {}: {}",
                file_id + 1,
                files.len(),
                file_path.display()
            );
        }

        let outcome = pipeline::process_file_with_compiler(file_path, &mut compiler, file_id);
        let failed = outcome.is_err();
        results.add(file_path.clone(), outcome);

        if failed && config.fail_fast {
            log_warning!("Fail-fast mode enabled, stopping batch compilation");
            break;
        }
    }

    results.elapsed = start_time.elapsed();
    log_completion("Sequential batch compilation completed", &results, 1);
    Ok(results)
}

pub fn process_directory_parallel(
    dir_path: &Path,
    introspector: &dyn TypeIntrospector,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let threads = config.thread_count();

    log_info!("Starting parallel batch compilation",
        "directory" => dir_path.display(),
        "max_threads" => threads
    );

    let files = discover_script_files(dir_path, config)?;
    let mut results = BatchResults::new();
    results.scripts_found = files.len();

    let chunk_size = calculate_chunk_size(files.len(), threads);
    log_debug!("Parallel compilation configuration",
        "total_files" => files.len(),
        "chunk_size" => chunk_size,
        "threads" => threads
    );

    for (chunk_index, chunk) in files.chunks(chunk_size).enumerate() {
        let chunk_results =
            process_chunk_parallel(chunk, chunk_index * chunk_size, introspector, threads)?;
        results.absorb(chunk_results);

        if config.fail_fast && results.failed_count() > 0 {
            log_warning!("Fail-fast mode enabled, stopping batch compilation");
            break;
        }
    }

    results.assign_generated_types();
    results.elapsed = start_time.elapsed();
    log_completion("Parallel batch compilation completed", &results, threads);
    Ok(results)
}

/// Split `files` into contiguous slices, one worker per slice. Each worker
/// owns its compiler; the introspector is shared read-only.
fn process_chunk_parallel(
    files: &[PathBuf],
    first_file_id: usize,
    introspector: &dyn TypeIntrospector,
    threads: usize,
) -> Result<BatchResults, BatchError> {
    let per_thread = files.len().div_ceil(threads).max(1);

    thread::scope(|scope| {
        let handles = files
            .chunks(per_thread)
            .enumerate()
            .map(|(worker, slice)| {
                scope.spawn(move || {
                    let mut compiler = MappingCompiler::new(introspector);
                    let mut local = BatchResults::new();
                    for (offset, file_path) in slice.iter().enumerate() {
                        let file_id = first_file_id + worker * per_thread + offset;
                        let outcome =
                            pipeline::process_file_with_compiler(file_path, &mut compiler, file_id);
                        local.add(file_path.clone(), outcome);
                    }
                    local
                })
            })
            .collect::<Vec<_>>();

        let mut results = BatchResults::new();
        for handle in handles {
            let local = handle.join().map_err(|_| BatchError::ThreadError {
                message: "Worker panicked during compilation".to_string(),
            })?;
            results.absorb(local);
        }
        Ok(results)
    })
}

fn calculate_chunk_size(file_count: usize, threads: usize) -> usize {
    const MAX_CHUNK_SIZE: usize = 50;
    file_count.div_ceil(threads.max(1)).clamp(1, MAX_CHUNK_SIZE)
}

fn log_completion(message: &str, results: &BatchResults, threads: usize) {
    log_success!(codes::success::OPERATION_COMPLETED_SUCCESSFULLY, message,
        "attempted" => results.attempted(),
        "compiled" => results.compiled_count(),
        "failed" => results.failed_count(),
        "threads_used" => threads,
        "elapsed_ms" => results.elapsed.as_millis()
    );
}

pub fn process_directory(
    dir_path: &Path,
    introspector: &dyn TypeIntrospector,
) -> Result<BatchResults, BatchError> {
    process_directory_with_config(dir_path, introspector, &BatchConfig::default())
}

pub fn process_directory_with_config(
    dir_path: &Path,
    introspector: &dyn TypeIntrospector,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    if config.thread_count() == 1 {
        process_directory_sequential(dir_path, introspector, config)
    } else {
        process_directory_parallel(dir_path, introspector, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::SchemaRegistry;
    use std::fs;
    use tempfile::tempdir;

    const SCHEMA: &str = r#"
        [types.A.fields]
        name = "String"
        items = "List<String>"

        [types.B.fields]
        title = "String"
        codes = "List<String>"
    "#;

    fn write_script(dir: &Path, file: &str, id: &str, from: &str) {
        fs::write(
            dir.join(file),
            format!(
                "id = \"{}\"\nsource_type = \"A\"\ntarget_type = \"B\"\n\
                 [[commands]]\nid = \"c\"\nfrom = \"{}\"\nto = \"title\"\n",
                id, from
            ),
        )
        .unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.otc.toml", "a", "name");
        write_script(dir.path(), "b.otc.toml", "b", "ghost");
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_script(&dir.path().join("nested"), "c.otc.toml", "c", "name");
        fs::write(dir.path().join("notes.toml"), "x = 1").unwrap();
        dir
    }

    #[test]
    fn test_discovery_filters_and_limits() {
        let dir = fixture();

        let files = discover_script_files(dir.path(), &BatchConfig::default()).unwrap();
        assert_eq!(files.len(), 3);

        let shallow = BatchConfig {
            recursive: false,
            ..BatchConfig::default()
        };
        assert_eq!(discover_script_files(dir.path(), &shallow).unwrap().len(), 2);

        let limited = BatchConfig {
            max_files: Some(1),
            ..BatchConfig::default()
        };
        assert_eq!(discover_script_files(dir.path(), &limited).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            discover_script_files(dir.path(), &BatchConfig::default()),
            Err(BatchError::NoFilesFound { .. })
        ));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let dir = fixture();
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();

        let sequential =
            process_directory_with_config(dir.path(), &schema, &BatchConfig::sequential()).unwrap();
        let parallel = process_directory_with_config(
            dir.path(),
            &schema,
            &BatchConfig {
                max_threads: 2,
                ..BatchConfig::default()
            },
        )
        .unwrap();

        for results in [&sequential, &parallel] {
            assert_eq!(results.attempted(), 3);
            assert_eq!(results.compiled_count(), 2);
            assert_eq!(results.failed_count(), 1);
            assert_eq!(results.failed[0].1.reports()[0].code.as_deref(), Some("E302"));
        }
    }

    #[test]
    fn test_parallel_names_match_sequential() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.otc.toml", "customer_to_account", "name");
        write_script(dir.path(), "b.otc.toml", "customerToAccount", "name");
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();

        let names = |config: &BatchConfig| -> Vec<String> {
            process_directory_with_config(dir.path(), &schema, config)
                .unwrap()
                .compiled
                .iter()
                .map(|(_, result)| result.mapping.commands[0].generated_type.clone())
                .collect()
        };

        let sequential = names(&BatchConfig::sequential());
        let parallel = names(&BatchConfig {
            max_threads: 2,
            ..BatchConfig::default()
        });

        assert_eq!(sequential.len(), 2);
        assert_ne!(sequential[0], sequential[1]);
        assert!(sequential[1].ends_with("_2"));
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_fail_fast_stops_sequential_batch() {
        let dir = fixture();
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let config = BatchConfig {
            fail_fast: true,
            ..BatchConfig::sequential()
        };

        let results = process_directory_with_config(dir.path(), &schema, &config).unwrap();
        assert_eq!(results.attempted(), 2);
        assert_eq!(results.scripts_found, 3);
        assert_eq!(results.failed_count(), 1);
    }

    #[test]
    fn test_results_register_into_builder() {
        let dir = fixture();
        let schema = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let results = process_directory_with_config(dir.path(), &schema, &BatchConfig::sequential())
            .unwrap();

        let mut builder = RegistryBuilder::new(&schema);
        assert!(results.register_into(&mut builder).is_empty());
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_chunk_size_calculation() {
        assert_eq!(calculate_chunk_size(100, 4), 25);
        assert_eq!(calculate_chunk_size(10, 4), 3);
        assert_eq!(calculate_chunk_size(1, 4), 1);
        assert_eq!(calculate_chunk_size(200, 4), 50);
    }
}
