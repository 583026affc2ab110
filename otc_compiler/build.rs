// build.rs: turns config/<profile>.toml into `config::compile_time` constants
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Every limit the crate reads, with its Rust type and an absolute ceiling
/// no profile may exceed.
const LIMITS: &[(&str, &str, &str, u64)] = &[
    ("file_processing", "max_file_size", "u64", 1_000_000_000),
    ("grammar", "max_chain_length", "usize", 65_536),
    ("grammar", "max_tokens_per_chain", "usize", 1024),
    ("grammar", "max_identifier_length", "usize", 4096),
    ("command_tree", "max_tree_nodes", "usize", 10_000_000),
    ("command_tree", "max_children_per_node", "usize", 65_536),
    ("indexer", "max_index_depth", "usize", 4096),
    ("indexer", "max_indexed_nodes", "usize", 100_000_000),
    ("registry", "max_mappings", "usize", 1_000_000),
    ("registry", "max_commands_per_mapping", "usize", 100_000),
    ("batch_processing", "max_worker_threads", "usize", 256),
    ("batch_processing", "max_files_per_batch", "usize", 1_000_000),
    ("logging", "max_error_collection", "usize", 1_000_000),
    ("logging", "max_log_message_length", "usize", 65_536),
    ("logging", "max_log_events_per_file", "usize", 100_000),
    ("logging", "security_min_log_level", "u8", 2),
];

/// Limits that must be stricter in production builds
const PRODUCTION_CEILINGS: &[(&str, &str, u64)] = &[
    ("file_processing", "max_file_size", 50_000_000),
    ("indexer", "max_index_depth", 256),
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OTC_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=OTC_CONFIG_DIR");

    let profile = env::var("OTC_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("OTC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("otc_compiler lives inside the workspace");
    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));
    println!("cargo:rerun-if-changed={}", config_path.display());

    let text = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        panic!(
            "cannot read limits for profile '{}' from {}: {}",
            profile,
            config_path.display(),
            e
        )
    });
    let table: toml::Table = text
        .parse()
        .unwrap_or_else(|e| panic!("{} is not valid TOML: {}", config_path.display(), e));

    let values: Vec<u64> = LIMITS
        .iter()
        .map(|&(section, key, _, ceiling)| {
            let value = read_limit(&table, section, key);
            if value > ceiling {
                panic!("{}.{} = {} exceeds the ceiling of {}", section, key, value, ceiling);
            }
            value
        })
        .collect();

    if profile == "production" {
        for &(section, key, ceiling) in PRODUCTION_CEILINGS {
            if read_limit(&table, section, key) > ceiling {
                panic!("{}.{} is too high for production (max {})", section, key, ceiling);
            }
        }
    }

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR");
    fs::write(
        Path::new(&out_dir).join("constants.rs"),
        render(&profile, &values),
    )
    .expect("OUT_DIR is writable");
}

fn read_limit(table: &toml::Table, section: &str, key: &str) -> u64 {
    let value = table
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(toml::Value::as_integer)
        .unwrap_or_else(|| panic!("missing integer limit {}.{}", section, key));
    u64::try_from(value).unwrap_or_else(|_| panic!("{}.{} must not be negative", section, key))
}

fn render(profile: &str, values: &[u64]) -> String {
    let mut code = format!(
        "// Generated by build.rs from the '{}' profile. Do not edit.\n\npub mod compile_time {{\n",
        profile
    );

    let mut open_section: Option<&str> = None;
    for (&(section, key, ty, _), value) in LIMITS.iter().zip(values) {
        if open_section != Some(section) {
            if open_section.is_some() {
                code.push_str("    }\n\n");
            }
            let _ = writeln!(code, "    pub mod {} {{", section);
            open_section = Some(section);
        }
        let _ = writeln!(
            code,
            "        pub const {}: {} = {};",
            key.to_uppercase(),
            ty,
            value
        );
    }
    if open_section.is_some() {
        code.push_str("    }\n");
    }
    code.push_str("}\n");
    code
}
