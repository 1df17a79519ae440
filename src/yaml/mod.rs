//! YAML parsing with diagnostic error reporting

mod diagnostics;

pub use diagnostics::{parse_yaml_file, parse_yaml_str, YamlSyntaxError};
