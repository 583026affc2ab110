//! Error and success codes with their classification metadata
//!
//! Every code emitted by the compiler or the runtime indexer is declared here
//! together with its category, severity and recommended action.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Code wrapper shared by error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_SCRIPT: Code = Code::new("E012");
}

/// Chain grammar (tokenization) codes
pub mod grammar {
    use super::Code;

    pub const UNBALANCED_BRACKET: Code = Code::new("E101");
    pub const EMPTY_SEGMENT: Code = Code::new("E102");
    pub const MISPLACED_MARKER: Code = Code::new("E103");
    pub const INVALID_IDENTIFIER: Code = Code::new("E104");
    pub const CHAIN_TOO_LONG: Code = Code::new("E105");
    pub const TOO_MANY_TOKENS: Code = Code::new("E106");
}

/// Chain-versus-type structural codes
pub mod semantics {
    use super::Code;

    pub const MISSING_KEY_VALUE_MARKER: Code = Code::new("E201");
    pub const MARKER_ON_NON_MAP: Code = Code::new("E202");
    pub const ANCHOR_ON_NON_COLLECTION: Code = Code::new("E203");
    pub const MISSING_COLLECTION_NOTATION: Code = Code::new("E204");
    pub const NOTATION_ON_PLAIN_FIELD: Code = Code::new("E205");
    pub const MULTIPLE_ANCHORS: Code = Code::new("E206");
    pub const NESTED_CONTAINER: Code = Code::new("E207");
    pub const CONFLICTING_TYPE_HINT: Code = Code::new("E208");
}

pub mod type_resolution {
    use super::Code;

    pub const UNKNOWN_TYPE: Code = Code::new("E301");
    pub const UNKNOWN_FIELD: Code = Code::new("E302");
    pub const RAW_COLLECTION: Code = Code::new("E303");
    pub const UNRESOLVED_ABSTRACT_TYPE: Code = Code::new("E304");
    pub const TREE_TOO_LARGE: Code = Code::new("E305");
    pub const INVALID_TYPE_EXPRESSION: Code = Code::new("E306");
}

/// Mapping script and registry codes
pub mod registry {
    use super::Code;

    pub const DUPLICATE_MAPPING: Code = Code::new("E401");
    pub const DUPLICATE_COMMAND: Code = Code::new("E402");
    pub const INVALID_SCRIPT: Code = Code::new("E403");
    pub const LIMIT_EXCEEDED: Code = Code::new("E404");
    pub const REHYDRATION_MISMATCH: Code = Code::new("E405");
    pub const LOCK_POISONED: Code = Code::new("E406");
}

/// Runtime indexing codes
pub mod indexing {
    use super::Code;

    pub const CYCLIC_GRAPH: Code = Code::new("E501");
    pub const FIELD_ACCESS: Code = Code::new("E502");
    pub const DEPTH_LIMIT: Code = Code::new("E503");
    pub const UNKNOWN_MAPPING: Code = Code::new("E504");
    pub const TREE_MISMATCH: Code = Code::new("E505");
    pub const NODE_LIMIT: Code = Code::new("E506");
    pub const VALUE_CONVERSION: Code = Code::new("E507");
}

pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const CHAIN_TOKENIZED: Code = Code::new("I010");
    pub const CHAIN_RESOLVED: Code = Code::new("I020");
    pub const MAPPING_COMPILED: Code = Code::new("I030");
    pub const REGISTRY_LOADED: Code = Code::new("I040");
    pub const REGISTRY_RELOADED: Code = Code::new("I041");
    pub const OBJECT_INDEXED: Code = Code::new("I050");
}

type MetadataRow = (
    &'static str,
    &'static str,
    Severity,
    bool,
    bool,
    &'static str,
    &'static str,
);

const METADATA_TABLE: &[MetadataRow] = &[
    // System
    ("ERR001", "System", Severity::Critical, false, true,
        "Critical internal error", "File a bug report with the failing input"),
    ("ERR002", "System", Severity::Critical, false, true,
        "Logging or registry initialization failed", "Check process environment and configuration"),
    // File processing
    ("E005", "FileProcessing", Severity::High, false, false,
        "Mapping script file not found", "Verify the path exists"),
    ("E006", "FileProcessing", Severity::Low, true, false,
        "File does not carry the .otc.toml extension", "Rename the script or pass it explicitly"),
    ("E007", "FileProcessing", Severity::High, false, false,
        "Mapping script exceeds the configured size limit", "Split the script into several mappings"),
    ("E008", "FileProcessing", Severity::Medium, true, false,
        "Mapping script is empty", "Add at least one command"),
    ("E010", "FileProcessing", Severity::High, false, false,
        "Mapping script is not valid UTF-8", "Re-encode the file as UTF-8"),
    ("E011", "FileProcessing", Severity::High, false, false,
        "I/O error while reading input", "Check permissions and disk state"),
    ("E012", "FileProcessing", Severity::High, false, false,
        "Mapping script is not valid TOML", "Fix the TOML syntax reported by the parser"),
    // Grammar
    ("E101", "Grammar", Severity::High, true, false,
        "Unbalanced bracket in chain", "Close every '[', '<' and '(' in the segment"),
    ("E102", "Grammar", Severity::High, true, false,
        "Empty chain segment", "Remove doubled or trailing '.' separators"),
    ("E103", "Grammar", Severity::High, true, false,
        "Misplaced notation marker", "Place '^', '<K>' and '<V>' directly on a field segment"),
    ("E104", "Grammar", Severity::High, true, false,
        "Segment is not a valid identifier", "Use letters, digits and '_' for field names"),
    ("E105", "Grammar", Severity::High, true, false,
        "Chain exceeds the configured length limit", "Shorten the chain"),
    ("E106", "Grammar", Severity::High, true, false,
        "Chain has too many segments", "Reduce nesting depth"),
    // Semantics
    ("E201", "Semantics", Severity::High, true, false,
        "Map segment does not say whether it addresses keys or values", "Add '<K>' or '<V>' to the map segment"),
    ("E202", "Semantics", Severity::High, true, false,
        "Key/value marker on a segment that is not a map", "Remove the marker or fix the field name"),
    ("E203", "Semantics", Severity::High, true, false,
        "Anchor on a segment that is not a collection", "Anchor only collection or map segments"),
    ("E204", "Semantics", Severity::High, true, false,
        "Collection field addressed without collection notation", "Add '[*]' to the segment"),
    ("E205", "Semantics", Severity::High, true, false,
        "Collection notation on a plain field", "Remove the bracket from the segment"),
    ("E206", "Semantics", Severity::High, true, false,
        "More than one anchor in a chain", "Keep a single anchor per chain"),
    ("E207", "Semantics", Severity::High, true, false,
        "Directly nested container element", "Wrap the inner container in a named object field"),
    ("E208", "Semantics", Severity::High, true, false,
        "Type hint disagrees with the type an earlier chain resolved for the same segment", "Use one concrete type per segment within a mapping side"),
    // Type resolution
    ("E301", "TypeResolution", Severity::High, true, false,
        "Type is not known to the introspector", "Declare the type in the schema"),
    ("E302", "TypeResolution", Severity::High, true, false,
        "Field is not declared on the owning type", "Check the field name against the schema"),
    ("E303", "TypeResolution", Severity::High, true, false,
        "Raw collection has no recoverable element type", "Declare the generic argument or configure an override"),
    ("E304", "TypeResolution", Severity::High, true, false,
        "Abstract type has no configured concrete type", "Add a concrete-type override for the segment"),
    ("E305", "TypeResolution", Severity::High, false, false,
        "Command tree exceeds the configured node limit", "Split the mapping"),
    ("E306", "TypeResolution", Severity::High, false, false,
        "Type expression in schema could not be parsed", "Fix the declared type expression"),
    // Registry
    ("E401", "Registry", Severity::High, false, false,
        "Mapping id registered twice", "Give each mapping a unique id"),
    ("E402", "Registry", Severity::Medium, true, false,
        "Command id used twice in one mapping", "Give each command a unique id"),
    ("E403", "Registry", Severity::High, false, false,
        "Mapping script is structurally invalid", "Check required script keys"),
    ("E404", "Registry", Severity::High, false, false,
        "Registry limit exceeded", "Reduce the number of mappings or commands"),
    ("E405", "Registry", Severity::High, false, false,
        "Persisted chain descriptor no longer matches the type schema", "Recompile the mapping"),
    ("E406", "Registry", Severity::Critical, false, true,
        "Registry lock poisoned", "Restart the process"),
    // Indexing
    ("E501", "Indexing", Severity::High, false, false,
        "Live object graph contains a reference cycle", "Break the cycle or map the object without the cyclic chain"),
    ("E502", "Indexing", Severity::High, false, false,
        "Field could not be read from the live object", "Recompile the mapping against the current schema"),
    ("E503", "Indexing", Severity::High, false, false,
        "Indexing exceeded the configured depth limit", "Reduce object nesting"),
    ("E504", "Indexing", Severity::Medium, false, false,
        "Mapping id is not registered", "Check the mapping id"),
    ("E505", "Indexing", Severity::High, false, false,
        "Command tree does not match the indexed chain", "Recompile the mapping"),
    ("E506", "Indexing", Severity::High, false, false,
        "Indexing exceeded the configured node limit", "Reduce collection sizes"),
    ("E507", "Indexing", Severity::Medium, false, false,
        "Document does not match the declared type", "Fix the document or the schema"),
    // Success
    ("I001", "Success", Severity::Low, true, false,
        "Operation completed", "None"),
    ("I004", "Success", Severity::Low, true, false,
        "System initialization completed", "None"),
    ("I006", "Success", Severity::Low, true, false,
        "Mapping script processed", "None"),
    ("I010", "Success", Severity::Low, true, false,
        "Chain tokenized", "None"),
    ("I020", "Success", Severity::Low, true, false,
        "Chain resolved into command tree", "None"),
    ("I030", "Success", Severity::Low, true, false,
        "Mapping compiled", "None"),
    ("I040", "Success", Severity::Low, true, false,
        "Registry loaded", "None"),
    ("I041", "Success", Severity::Low, true, false,
        "Registry reloaded", "None"),
    ("I050", "Success", Severity::Low, true, false,
        "Object indexed", "None"),
];

static METADATA_BY_CODE: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn metadata_by_code() -> &'static HashMap<&'static str, ErrorMetadata> {
    METADATA_BY_CODE.get_or_init(|| {
        METADATA_TABLE
            .iter()
            .map(|&(code, category, severity, recoverable, requires_halt, description, action)| {
                let metadata = ErrorMetadata {
                    code,
                    category,
                    severity,
                    recoverable,
                    requires_halt,
                    description,
                    recommended_action: action,
                };
                (code, metadata)
            })
            .collect()
    })
}

/// Metadata for a raw code string, e.g. one read back from a report
pub fn lookup(code: &str) -> Option<&'static ErrorMetadata> {
    metadata_by_code().get(code)
}

impl Code {
    pub fn metadata(&self) -> Option<&'static ErrorMetadata> {
        lookup(self.0)
    }

    /// Unregistered codes read as `Unknown`
    pub fn category(&self) -> &'static str {
        self.metadata().map_or("Unknown", |m| m.category)
    }

    pub fn severity(&self) -> Severity {
        self.metadata().map_or(Severity::Medium, |m| m.severity)
    }

    pub fn is_recoverable(&self) -> bool {
        self.metadata().map_or(true, |m| m.recoverable)
    }

    pub fn requires_halt(&self) -> bool {
        self.metadata().is_some_and(|m| m.requires_halt)
    }

    pub fn description(&self) -> Option<&'static str> {
        self.metadata().map(|m| m.description)
    }

    pub fn help(&self) -> &'static str {
        self.metadata()
            .map_or("no recommendation for this code", |m| m.recommended_action)
    }
}
