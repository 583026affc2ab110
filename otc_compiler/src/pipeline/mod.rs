//! Single-file compilation pipeline: file checks -> script parse -> compile

mod error;
mod result;

pub use error::PipelineError;
pub use result::{PipelineResult, ScriptFile};

use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
use crate::introspection::TypeIntrospector;
use crate::logging;
use crate::registry::{MappingCompiler, MappingScript};
use crate::{log_debug, log_error, log_info};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Extension every mapping script carries
pub const SCRIPT_EXTENSION: &str = ".otc.toml";

pub fn is_script_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_ascii_lowercase().ends_with(SCRIPT_EXTENSION))
            .unwrap_or(false)
}

/// Existence, extension, size and encoding checks followed by the read
pub fn read_script_file(path: &Path) -> Result<ScriptFile, PipelineError> {
    let display = path.display().to_string();

    if !path.is_file() {
        let error = PipelineError::FileNotFound { path: display };
        log_error!(error.error_code(), "Mapping script not found", "path" => path.display());
        return Err(error);
    }
    if !is_script_file(path) {
        let error = PipelineError::InvalidExtension { path: display };
        log_error!(error.error_code(), "Not a mapping script", "path" => path.display());
        return Err(error);
    }

    let size = fs::metadata(path)
        .map_err(|e| PipelineError::io(&display, &e))?
        .len();
    if size > MAX_FILE_SIZE {
        let error = PipelineError::FileTooLarge {
            size,
            max_size: MAX_FILE_SIZE,
        };
        log_error!(error.error_code(), "Mapping script too large",
            "size" => size,
            "max_size" => MAX_FILE_SIZE
        );
        return Err(error);
    }

    let bytes = fs::read(path).map_err(|e| PipelineError::io(&display, &e))?;
    let source = String::from_utf8(bytes).map_err(|_| PipelineError::InvalidEncoding {
        path: display.clone(),
    })?;
    if source.trim().is_empty() {
        return Err(PipelineError::EmptyFile { path: display });
    }

    log_debug!("Mapping script read", "file" => display, "size_bytes" => size);

    Ok(ScriptFile {
        path: path.to_path_buf(),
        size,
        source,
    })
}

/// Compile one script file against `introspector`
pub fn process_file(
    path: &Path,
    introspector: &dyn TypeIntrospector,
) -> Result<PipelineResult, PipelineError> {
    let mut compiler = MappingCompiler::new(introspector);
    process_file_with_compiler(path, &mut compiler, 0)
}

/// Compile one script file with a shared compiler, so generated type names
/// stay unique across every file it sees
pub fn process_file_with_compiler(
    path: &Path,
    compiler: &mut MappingCompiler<'_>,
    file_id: usize,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();

    logging::with_file_context(path.to_path_buf(), file_id, || {
        log_info!("Compiling mapping script", "file" => path.display());

        let file = read_script_file(path)?;
        let script = MappingScript::from_toml_str(&file.source).map_err(|e| {
            log_error!(e.error_code(), "Mapping script could not be parsed",
                "error" => e
            );
            PipelineError::Script(e)
        })?;

        let file_name = file.path.display().to_string();
        let outcome = compiler.compile(&script);
        let reports = outcome
            .reports
            .into_iter()
            .map(|report| report.with_file(&file_name))
            .collect::<Vec<_>>();

        match outcome.mapping {
            Some(mapping) => {
                let result =
                    PipelineResult::new(file, mapping, reports, start_time.elapsed());
                result.log_success();
                Ok(result)
            }
            None => Err(PipelineError::Compilation {
                id: script.id,
                reports,
            }),
        }
    })
}
