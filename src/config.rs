use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::profile::Profile;
use crate::report::Layout;

pub const DEFAULT_DATA_DIR: &str = "data";
/// Appended to the settlement file stem to name the report.
pub const OUTPUT_SUFFIX: &str = "_매핑";

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct InputConfig {
    pub channel_list: PathBuf,
    /// Settlement files, concatenated in order.
    pub settlements: Vec<PathBuf>,
    pub profile: Profile,
    pub data_dir: PathBuf,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MappingConfig {
    /// Custom normalization rules; the built-in set when absent.
    pub rules_path: Option<PathBuf>,
    pub layout: Layout,
    pub parallel: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            layout: Layout::Legacy,
            parallel: true,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Both,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Both => "both",
        }
    }

    pub fn writes_xlsx(&self) -> bool {
        matches!(self, Self::Xlsx | Self::Both)
    }

    pub fn writes_csv(&self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct ExportConfig {
    /// Output path; the extension is replaced per format.
    pub out_path: Option<PathBuf>,
    pub format: ExportFormat,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.channel_list.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.channel_list",
            });
        }
        if self.input.settlements.is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.settlements",
            });
        }
        if let Some(p) = self
            .input
            .settlements
            .iter()
            .find(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "input.settlements",
                reason: format!("empty path in {:?}", p),
            });
        }
        if self.input.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "input.data_dir",
            });
        }
        if let Some(ref out) = self.export.out_path {
            if out.file_stem().is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "export.out_path",
                    reason: format!("{} has no file name", out.display()),
                });
            }
        }
        if let Some(ref rules) = self.mapping.rules_path {
            if rules.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "mapping.rules_path",
                    reason: "empty path".into(),
                });
            }
        }
        Ok(())
    }

    /// Output path without extension: `--out` if given, else the first
    /// settlement file's stem plus `_매핑`, next to that file.
    pub fn output_base(&self) -> PathBuf {
        if let Some(ref out) = self.export.out_path {
            return out.with_extension("");
        }
        let first = self
            .input
            .settlements
            .first()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new("settlement"));
        let stem = first
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "settlement".to_string());
        first.with_file_name(format!("{stem}{OUTPUT_SUFFIX}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            input: InputConfig {
                channel_list: PathBuf::from("in/channel.csv"),
                settlements: vec![PathBuf::from("in/2024-06 정산.csv")],
                profile: Profile::KidariNovel,
                data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            },
            mapping: MappingConfig::default(),
            export: ExportConfig::default(),
        }
    }

    #[test]
    fn test_default_output_is_next_to_first_settlement() {
        let cfg = sample();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.output_base(), PathBuf::from("in/2024-06 정산_매핑"));
    }

    #[test]
    fn test_explicit_output_drops_extension() {
        let mut cfg = sample();
        cfg.export.out_path = Some(PathBuf::from("out/report.xlsx"));
        assert_eq!(cfg.output_base(), PathBuf::from("out/report"));
    }

    #[test]
    fn test_settlements_are_required() {
        let mut cfg = sample();
        cfg.input.settlements.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField {
                field: "input.settlements"
            })
        ));
    }

    #[test]
    fn test_format_flags() {
        assert!(ExportFormat::Both.writes_csv() && ExportFormat::Both.writes_xlsx());
        assert!(!ExportFormat::Xlsx.writes_csv());
        assert_eq!(ExportFormat::default(), ExportFormat::Xlsx);
    }
}
