//! Build script for tsunb-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml at compile time
//! - Emits node_config.rs with the node's constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tsunb_core::identity::parse_hex;
use tsunb_core::rate::SymbolRate;

fn main() {
    setup_linker();
    let config = validate_config();
    generate_config(&config);
}

/// Validated node configuration
struct NodeConfig {
    symbol_rate_mult: u16,
    tx_power_dbm: i8,
    network_key: Vec<u8>,
    eui64: Vec<u8>,
    short_address: Vec<u8>,
    ext_pkg_cnt: u32,
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml configuration at compile time
fn validate_config() -> NodeConfig {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a node.toml configuration file with the   ║\n\
            ║  symbol rate and the node identity.                              ║\n\
            ║  Please create one in the tsunb-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let node = parse_node(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid node configuration                               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=node.toml validated successfully");
    node
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check every field, collecting all problems before failing
fn parse_node(config: &toml::Value, errors: &mut Vec<String>) -> NodeConfig {
    let radio = section(config, "radio", errors);
    let node = section(config, "node", errors);

    let symbol_rate_mult = match integer(radio, "radio", "symbol_rate_mult", errors) {
        Some(mult) => match u16::try_from(mult).map_err(|_| ()).and_then(|m| {
            SymbolRate::from_multiplier(m).map_err(|_| ())
        }) {
            Ok(rate) => rate.multiplier(),
            Err(()) => {
                errors.push(format!(
                    "[radio] symbol_rate_mult {} unsupported (use 8 or 48)",
                    mult
                ));
                0
            }
        },
        None => 0,
    };

    let tx_power_dbm = match integer(radio, "radio", "tx_power_dbm", errors) {
        Some(dbm) if (-20..=20).contains(&dbm) => dbm as i8,
        Some(_) => {
            errors.push("[radio] tx_power_dbm must be -20 to 20".to_string());
            0
        }
        None => 0,
    };

    let network_key = hex_field(node, "network_key", 16, errors);
    let eui64 = hex_field(node, "eui64", 8, errors);
    let short_address = hex_field(node, "short_address", 2, errors);

    let ext_pkg_cnt = match node.and_then(|n| n.get("ext_pkg_cnt")) {
        None => 0,
        Some(toml::Value::Integer(cnt)) => match u32::try_from(*cnt) {
            Ok(cnt) => cnt,
            Err(_) => {
                errors.push("[node] ext_pkg_cnt must fit in 32 bits".to_string());
                0
            }
        },
        Some(_) => {
            errors.push("[node] ext_pkg_cnt must be an integer".to_string());
            0
        }
    };

    NodeConfig {
        symbol_rate_mult,
        tx_power_dbm,
        network_key,
        eui64,
        short_address,
        ext_pkg_cnt,
    }
}

fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::value::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => {
            errors.push(format!("Missing [{}] section", name));
            None
        }
    }
}

fn integer(
    table: Option<&toml::value::Table>,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<i64> {
    let table = table?;
    match table.get(key) {
        Some(toml::Value::Integer(v)) => Some(*v),
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Read a hex string of exactly `len` bytes
fn hex_field(
    table: Option<&toml::value::Table>,
    key: &str,
    len: usize,
    errors: &mut Vec<String>,
) -> Vec<u8> {
    let Some(table) = table else {
        return vec![0; len];
    };
    let text = match table.get(key) {
        Some(toml::Value::String(s)) => s,
        Some(_) => {
            errors.push(format!("[node] {} must be a hex string", key));
            return vec![0; len];
        }
        None => {
            errors.push(format!("[node] missing '{}'", key));
            return vec![0; len];
        }
    };

    let mut bytes = vec![0; len];
    if let Err(e) = parse_hex(text, &mut bytes) {
        errors.push(format!("[node] {} {}", key, e));
        return vec![0; len];
    }
    bytes
}

fn byte_array(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| format!("0x{:02x}", b)).collect();
    format!("[{}]", items.join(", "))
}

/// Write node_config.rs for `include!` in main.rs
fn generate_config(node: &NodeConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("node_config.rs")).unwrap();

    writeln!(f, "// Generated from node.toml by build.rs").unwrap();
    writeln!(f, "pub const SYMBOL_RATE_MULT: u16 = {};", node.symbol_rate_mult).unwrap();
    writeln!(f, "pub const TX_POWER_DBM: i8 = {};", node.tx_power_dbm).unwrap();
    writeln!(
        f,
        "pub const NETWORK_KEY: [u8; 16] = {};",
        byte_array(&node.network_key)
    )
    .unwrap();
    writeln!(f, "pub const EUI64: [u8; 8] = {};", byte_array(&node.eui64)).unwrap();
    writeln!(
        f,
        "pub const SHORT_ADDRESS: [u8; 2] = {};",
        byte_array(&node.short_address)
    )
    .unwrap();
    writeln!(f, "pub const EXT_PKG_CNT: u32 = {};", node.ext_pkg_cnt).unwrap();
}
