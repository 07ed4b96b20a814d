//! Normalization rules as ordered, versioned data.
//!
//! A rule set is a list of [`RuleRecord`]s compiled into [`Rule`]s. The built-in
//! set is declared as a table below; a replacement set can be loaded from a CSV
//! file with the header `kind,pattern,replacement`.

use std::path::Path;
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::ConfigError;
use crate::table::CellValue;

pub const BUILTIN_VERSION: &str = "builtin-1";

/// Upper bound on repeated passes for rule sets that never settle.
const MAX_PASSES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Exception,
    CalendarDate,
    Canonical,
    RegexStrip,
    LiteralReplace,
    Stopword,
    Lowercase,
    Nfkc,
    TrimEnd,
    RemoveWhitespace,
}

/// One line of a rule file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleRecord {
    pub kind: RuleKind,
    pub pattern: Option<String>,
    pub replacement: Option<String>,
}

impl RuleRecord {
    fn new(kind: RuleKind, pattern: &str, replacement: &str) -> Self {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            kind,
            pattern: opt(pattern),
            replacement: opt(replacement),
        }
    }
}

use RuleKind::*;

const PUNCTUATION: &str = r#"[.~\-–—!@#$%^&*_=+\\|/:;"'’`<>?，｡､{}()]"#;

/// The built-in pipeline. Order is significant.
static BUILTIN_RECORDS: &[(RuleKind, &str, &str)] = &[
    (Exception, "24/7", ""),
    (Exception, "실명마제", ""),
    (Exception, "라마대제", ""),
    (CalendarDate, "", ""),
    (Canonical, r"\d{1,2}월\d{1,2}일", ""),
    // trailing volume fraction such as "2/3"
    (RegexStrip, r"\s*\d+/\d+$", ""),
    (Lowercase, "", ""),
    (RegexStrip, r"\s*제\s*\d+[권화]", ""),
    (LiteralReplace, "un-holynight", "unholynight"),
    (LiteralReplace, "?", ""),
    (LiteralReplace, "~", ""),
    (LiteralReplace, ",", ""),
    (LiteralReplace, "-", ""),
    (LiteralReplace, "_", ""),
    (RegexStrip, r"\([^)]*\)|\[[^\]]*\]", ""),
    (RegexStrip, r"【[^】]*】", ""),
    // lead-in edition labels
    (Stopword, "세트구매", ""),
    (Stopword, "난세의 서 편", ""),
    (Stopword, "초혼의 사자 편", ""),
    (Stopword, "전설의 부활 편", ""),
    (Nfkc, "", ""),
    (RegexStrip, r"\d+[권화부회]", ""),
    (Stopword, "개정판 l", ""),
    (Stopword, "개정판", ""),
    (Stopword, "외전", ""),
    (Stopword, "무삭제본", ""),
    (Stopword, "무삭제판", ""),
    (Stopword, "합본", ""),
    (Stopword, "단행본", ""),
    (Stopword, "시즌", ""),
    (Stopword, "세트", ""),
    (Stopword, "연재", ""),
    (Stopword, "특별", ""),
    (Stopword, "최종화", ""),
    (Stopword, "완결", ""),
    (Stopword, "2부", ""),
    (Stopword, "무삭제", ""),
    (Stopword, "완전판", ""),
    (Stopword, "세개정판", ""),
    (Stopword, "19세개정판", ""),
    (RegexStrip, r"\d+", ""),
    (TrimEnd, ".", ""),
    (RegexStrip, PUNCTUATION, ""),
    (LiteralReplace, "[", ""),
    (LiteralReplace, "]", ""),
    (RegexStrip, "특별$", ""),
    (RemoveWhitespace, "", ""),
    (Lowercase, "", ""),
];

static BUILTIN: LazyLock<RuleSet> = LazyLock::new(|| {
    let records = BUILTIN_RECORDS
        .iter()
        .map(|(k, p, r)| RuleRecord::new(*k, p, r));
    RuleSet::compile(BUILTIN_VERSION, records).expect("built-in normalization rules compile")
});

#[derive(Debug, Clone)]
pub enum Rule {
    /// Text containing the literal normalizes to the lowercased literal.
    Exception(String),
    /// Date cells render as `{month}월{day}일`.
    CalendarDate,
    /// Text fully matching the pattern is already canonical; lowercase and stop.
    Canonical(Regex),
    RegexStrip(Regex),
    LiteralReplace { from: String, to: String },
    Stopword(String),
    Lowercase,
    Nfkc,
    TrimEnd(String),
    RemoveWhitespace,
}

enum Step {
    Next(String),
    Done(String),
}

impl Rule {
    fn from_record(line: usize, rec: RuleRecord) -> Result<Self, ConfigError> {
        let pattern = || {
            rec.pattern
                .clone()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ConfigError::InvalidRule {
                    line,
                    reason: format!("{:?} requires a pattern", rec.kind),
                })
        };
        let regex = |src: &str| {
            Regex::new(src).map_err(|e| ConfigError::InvalidRule {
                line,
                reason: e.to_string(),
            })
        };
        Ok(match rec.kind {
            RuleKind::Exception => Rule::Exception(pattern()?),
            RuleKind::CalendarDate => Rule::CalendarDate,
            RuleKind::Canonical => Rule::Canonical(regex(&format!("^(?:{})$", pattern()?))?),
            RuleKind::RegexStrip => Rule::RegexStrip(regex(&pattern()?)?),
            RuleKind::LiteralReplace => Rule::LiteralReplace {
                from: pattern()?,
                to: rec.replacement.clone().unwrap_or_default(),
            },
            RuleKind::Stopword => Rule::Stopword(pattern()?),
            RuleKind::Lowercase => Rule::Lowercase,
            RuleKind::Nfkc => Rule::Nfkc,
            RuleKind::TrimEnd => Rule::TrimEnd(pattern()?),
            RuleKind::RemoveWhitespace => Rule::RemoveWhitespace,
        })
    }

    fn apply(&self, raw: &CellValue, text: String) -> Step {
        match self {
            Rule::Exception(lit) => {
                if text.contains(lit.as_str()) {
                    Step::Done(lit.to_lowercase())
                } else {
                    Step::Next(text)
                }
            }
            Rule::CalendarDate => match raw {
                CellValue::Date { date, .. } => {
                    Step::Done(format!("{}월{}일", date.month(), date.day()))
                }
                _ => Step::Next(text),
            },
            Rule::Canonical(re) => {
                if re.is_match(&text) {
                    Step::Done(text.to_lowercase())
                } else {
                    Step::Next(text)
                }
            }
            Rule::RegexStrip(re) => Step::Next(re.replace_all(&text, "").into_owned()),
            Rule::LiteralReplace { from, to } => Step::Next(text.replace(from.as_str(), to)),
            Rule::Stopword(word) => Step::Next(text.replace(word.as_str(), "")),
            Rule::Lowercase => Step::Next(text.to_lowercase()),
            Rule::Nfkc => Step::Next(text.nfkc().collect()),
            Rule::TrimEnd(chars) => {
                let trimmed = text.trim_end_matches(|c: char| chars.contains(c));
                Step::Next(trimmed.to_string())
            }
            Rule::RemoveWhitespace => {
                Step::Next(text.chars().filter(|c| !c.is_whitespace()).collect())
            }
        }
    }
}

/// An ordered normalization pipeline.
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// The rule set shipped with the tool.
    pub fn builtin() -> &'static RuleSet {
        &BUILTIN
    }

    pub fn compile<I>(version: &str, records: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = RuleRecord>,
    {
        let rules = records
            .into_iter()
            .enumerate()
            .map(|(i, rec)| Rule::from_record(i + 1, rec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: version.to_string(),
            rules,
        })
    }

    /// Load a rule file. The version is the file stem.
    pub fn load_csv(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |line: usize, reason: String| ConfigError::InvalidRule { line, reason };
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(|e| invalid(0, format!("{}: {}", path.display(), e)))?;
        // header is line 1
        let mut records = Vec::new();
        for (i, rec) in rdr.deserialize::<RuleRecord>().enumerate() {
            records.push(rec.map_err(|e| invalid(i + 2, e.to_string()))?);
        }
        if records.is_empty() {
            return Err(invalid(0, format!("{} has no rules", path.display())));
        }
        let version = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".into());
        let rules = records
            .into_iter()
            .enumerate()
            .map(|(i, rec)| Rule::from_record(i + 2, rec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { version, rules })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// One pass over the rules. The flag is set when a rule short-circuited.
    fn run_once(&self, raw: &CellValue) -> (String, bool) {
        let mut text = raw.to_string().trim().to_string();
        for rule in &self.rules {
            match rule.apply(raw, text) {
                Step::Next(t) => text = t,
                Step::Done(key) => return (key, true),
            }
        }
        (text, false)
    }

    /// Run the pipeline. Total: every input yields a key, possibly empty.
    ///
    /// A pass that runs off the end is repeated on its own output until the
    /// key stops changing: whitespace removal can join letters into a
    /// stopword (`세 트` to `세트`) that an earlier rule already passed.
    /// A short-circuited key is final.
    pub fn normalize(&self, raw: &CellValue) -> String {
        let (mut key, mut done) = self.run_once(raw);
        let mut passes = 1;
        while !done && passes < MAX_PASSES {
            let (next, short_circuited) = self.run_once(&CellValue::Text(key.clone()));
            if next == key {
                break;
            }
            key = next;
            done = short_circuited;
            passes += 1;
        }
        key
    }

    pub fn normalize_str(&self, s: &str) -> String {
        self.normalize(&CellValue::text(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_rules(name: &str, content: &str) -> std::path::PathBuf {
        let dir =
            std::env::temp_dir().join(format!("content_mapper_rules_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let p = dir.join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn test_builtin_compiles_in_declared_order() {
        let rs = RuleSet::builtin();
        assert_eq!(rs.version(), BUILTIN_VERSION);
        assert_eq!(rs.len(), BUILTIN_RECORDS.len());
        assert!(matches!(rs.rules()[0], Rule::Exception(_)));
        assert!(matches!(rs.rules().last(), Some(Rule::Lowercase)));
    }

    #[test]
    fn test_load_custom_rule_file() {
        let p = tmp_rules(
            "house-v2.csv",
            "kind,pattern,replacement\nexception,특별판,\nliteral_replace,&,and\nremove_whitespace,,\nlowercase,,\n",
        );
        let rs = RuleSet::load_csv(&p).unwrap();
        assert_eq!(rs.version(), "house-v2");
        assert_eq!(rs.len(), 4);
        assert_eq!(rs.normalize_str("Tom & Jerry"), "tomandjerry");
        assert_eq!(rs.normalize_str("어떤 특별판 세트"), "특별판");
    }

    #[test]
    fn test_invalid_regex_names_the_line() {
        let p = tmp_rules("bad.csv", "kind,pattern,replacement\nlowercase,,\nregex_strip,([,\n");
        match RuleSet::load_csv(&p) {
            Err(ConfigError::InvalidRule { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_is_required_for_strip_rules() {
        let rec = RuleRecord::new(RuleKind::Stopword, "", "");
        assert!(RuleSet::compile("t", vec![rec]).is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let p = tmp_rules("unknown.csv", "kind,pattern,replacement\nfuzzy,abc,\n");
        assert!(matches!(
            RuleSet::load_csv(&p),
            Err(ConfigError::InvalidRule { line: 2, .. })
        ));
    }

    #[test]
    fn test_repeated_pass_stops_for_rules_that_never_settle() {
        let rec = RuleRecord::new(RuleKind::LiteralReplace, "a", "aa");
        let rs = RuleSet::compile("grow", vec![rec]).unwrap();
        assert_eq!(rs.normalize_str("a").len(), 1 << MAX_PASSES);
    }
}
