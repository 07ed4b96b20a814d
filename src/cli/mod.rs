//! Command line: clap parsing and conversion into [`AppConfig`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{
    AppConfig, DEFAULT_DATA_DIR, ExportConfig, ExportFormat, InputConfig, MappingConfig,
};
use crate::error::ConfigError;
use crate::profile::Profile;
use crate::report::Layout;

#[derive(Parser, Debug)]
#[command(
    name = "content_mapper",
    version,
    about = "Map settlement line items to content-master IDs",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
    /// Sales-channel content list (env: CONTENT_MAPPER_CHANNEL_LIST)
    #[arg(long = "channel-list", value_name = "FILE", env = "CONTENT_MAPPER_CHANNEL_LIST")]
    pub channel_list: Option<PathBuf>,
    /// Settlement report (.csv, or .xlsx with every sheet read); repeat to
    /// concatenate several files in order
    #[arg(long = "settlement", value_name = "FILE")]
    pub settlements: Vec<PathBuf>,
    /// Reference profile (env: CONTENT_MAPPER_PROFILE)
    #[arg(long, value_enum, env = "CONTENT_MAPPER_PROFILE")]
    pub profile: Option<Profile>,
    /// Directory holding the reference tables (env: CONTENT_MAPPER_DATA_DIR)
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        env = "CONTENT_MAPPER_DATA_DIR",
        default_value = DEFAULT_DATA_DIR
    )]
    pub data_dir: PathBuf,
    /// Output path (env: CONTENT_MAPPER_OUT); defaults to <settlement>_매핑
    #[arg(long = "out", value_name = "PATH", env = "CONTENT_MAPPER_OUT")]
    pub out: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
    pub format: ExportFormat,
    /// Row layout of the report
    #[arg(long, value_enum, default_value_t = Layout::Legacy)]
    pub layout: Layout,
    /// Custom normalization rules CSV (env: CONTENT_MAPPER_RULES)
    #[arg(long = "rules", value_name = "CSV", env = "CONTENT_MAPPER_RULES")]
    pub rules: Option<PathBuf>,
    /// Run normalization and resolution on a single thread
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a .env template
    EnvTemplate {
        #[arg(value_name = "PATH", default_value = ".env.template")]
        path: PathBuf,
    },
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let channel_list = self
            .channel_list
            .clone()
            .ok_or(ConfigError::MissingField {
                field: "channel_list",
            })?;
        let profile = self.profile.ok_or(ConfigError::MissingField { field: "profile" })?;

        let cfg = AppConfig {
            input: InputConfig {
                channel_list,
                settlements: self.settlements.clone(),
                profile,
                data_dir: self.data_dir.clone(),
            },
            mapping: MappingConfig {
                rules_path: self.rules.clone(),
                layout: self.layout,
                parallel: !self.no_parallel,
            },
            export: ExportConfig {
                out_path: self.out.clone(),
                format: self.format,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
