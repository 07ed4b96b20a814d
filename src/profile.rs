//! Organizational profiles. Each one selects the content-master registry the
//! master index is built from.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::MappingError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    KidariNovel,
    LezhinKr,
    KidariWebtoon,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Self::KidariNovel, Self::LezhinKr, Self::KidariWebtoon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KidariNovel => "kidari-novel",
            Self::LezhinKr => "lezhin-kr",
            Self::KidariWebtoon => "kidari-webtoon",
        }
    }

    /// Display label shown to operators.
    pub fn label(&self) -> &'static str {
        match self {
            Self::KidariNovel => "키다리스튜디오 소설",
            Self::LezhinKr => "레진KR",
            Self::KidariWebtoon => "키다리스튜디오 웹툰",
        }
    }

    pub fn reference_file(&self) -> &'static str {
        match self {
            Self::KidariNovel => "kidari_contents.csv",
            Self::LezhinKr => "lezhin_contents.csv",
            Self::KidariWebtoon => "kidari_webtoon.csv",
        }
    }

    pub fn notice(&self) -> String {
        format!("{} 파일을 사용합니다", self.label())
    }

    pub fn reference_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.reference_file())
    }

    /// Path of the reference table, which must exist.
    pub fn resolve_reference(&self, data_dir: &Path) -> Result<PathBuf, MappingError> {
        let path = self.reference_path(data_dir);
        if path.is_file() {
            Ok(path)
        } else {
            Err(MappingError::MissingReferenceFile {
                profile: self.label().to_string(),
                path,
            })
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
