use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use log::warn;

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped; values
/// may be wrapped in single or double quotes.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, val)) = s.split_once('=') else {
            warn!("ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let val = val.trim();
        let val = if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            &val[1..val.len() - 1]
        } else {
            val
        };
        map.insert(key.trim().to_string(), val.to_string());
    }
    map
}

/// Parse `.env` in the current working directory, if present.
/// Does not modify the process environment.
pub fn parse_env_file() -> Result<HashMap<String, String>> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(HashMap::new());
    }
    Ok(parse_env_str(&fs::read_to_string(path)?))
}

/// Load `.env` into the process environment without overriding variables
/// that are already set.
pub fn load_dotenv_if_present() -> Result<()> {
    for (k, v) in parse_env_file()? {
        if std::env::var_os(&k).is_none() {
            unsafe {
                std::env::set_var(&k, &v);
            }
        }
    }
    Ok(())
}

/// Write a `.env` template listing every variable the tool reads.
pub fn write_env_template(path: &Path) -> Result<()> {
    let template = r#"# content_mapper environment configuration template
# Copy this file to .env and fill in the values. Command line flags win over
# these settings, and variables already set in the environment are kept.

# Sales-channel content list (CSV)
#CONTENT_MAPPER_CHANNEL_LIST=input/channel_list.csv

# Reference profile: kidari-novel | lezhin-kr | kidari-webtoon
#CONTENT_MAPPER_PROFILE=kidari-novel

# Directory holding kidari_contents.csv, lezhin_contents.csv, kidari_webtoon.csv
CONTENT_MAPPER_DATA_DIR=data

# Custom normalization rules (kind,pattern,replacement)
#CONTENT_MAPPER_RULES=rules.csv

# Output path; defaults to <first settlement file>_매핑
#CONTENT_MAPPER_OUT=output/report.xlsx

# Logging
#CONTENT_MAPPER_TRACING=1
#RUST_LOG=info
"#;
    fs::write(path, template)?;
    Ok(())
}
