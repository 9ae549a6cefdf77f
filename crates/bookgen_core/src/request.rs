//! Submission payload: the immutable `GenerationRequest` and the builder that
//! validates form input into one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// The uploaded document. Bytes are read by the channel at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub file_name: String,
}

impl SourceDocument {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, file_name }
    }

    /// File name with its last extension stripped (`tales.v2.pdf` -> `tales.v2`).
    pub fn base_name(&self) -> String {
        match Path::new(&self.file_name).file_stem() {
            Some(stem) if !stem.is_empty() => stem.to_string_lossy().into_owned(),
            _ => self.file_name.clone(),
        }
    }
}

/// Raw segmentation inputs as the form collects them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segmentation {
    pub section_description: String,
    pub additional_context: String,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
}

/// Raw style inputs as the form collects them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookSpecs {
    pub theme: String,
    pub humor: HumorLevel,
    pub age_group: AgeGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumorLevel(u8);

impl HumorLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Input-surface clamp: any integer lands in `[1, 10]`.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for HumorLevel {
    fn default() -> Self {
        Self(5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeGroup {
    ThreeToFive,
    #[default]
    SixToEight,
    NineToTwelve,
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::ThreeToFive => "3-5",
            AgeGroup::SixToEight => "6-8",
            AgeGroup::NineToTwelve => "9-12",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown age group {0:?} (expected 3-5, 6-8 or 9-12)")]
pub struct UnknownAgeGroup(pub String);

impl FromStr for AgeGroup {
    type Err = UnknownAgeGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3-5" => Ok(AgeGroup::ThreeToFive),
            "6-8" => Ok(AgeGroup::SixToEight),
            "9-12" => Ok(AgeGroup::NineToTwelve),
            other => Err(UnknownAgeGroup(other.to_string())),
        }
    }
}

/// Validated section locator. Either page bound may be absent; the server
/// infers the whole document when both are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub description: String,
    pub additional_context: Option<String>,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDescriptor {
    pub theme: String,
    pub humor: HumorLevel,
    pub age_group: AgeGroup,
}

/// One submission. Built once by [`build_request`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub document: SourceDocument,
    pub section: SectionDescriptor,
    pub style: StyleDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no source document selected")]
    MissingFile,
    #[error("page numbers start at 1")]
    ZeroPage,
    #[error("page range is inverted: start {start} is after end {end}")]
    InvertedPageRange { start: u32, end: u32 },
}

/// Assembles a request from form inputs. Pure; no IO happens here.
pub fn build_request(
    file: Option<SourceDocument>,
    segmentation: Segmentation,
    specs: BookSpecs,
) -> Result<GenerationRequest, ValidationError> {
    let document = file.ok_or(ValidationError::MissingFile)?;

    if segmentation.page_start == Some(0) || segmentation.page_end == Some(0) {
        return Err(ValidationError::ZeroPage);
    }
    if let (Some(start), Some(end)) = (segmentation.page_start, segmentation.page_end) {
        if start > end {
            return Err(ValidationError::InvertedPageRange { start, end });
        }
    }

    let additional_context = Some(segmentation.additional_context.trim().to_string())
        .filter(|context| !context.is_empty());

    Ok(GenerationRequest {
        document,
        section: SectionDescriptor {
            description: segmentation.section_description.trim().to_string(),
            additional_context,
            page_start: segmentation.page_start,
            page_end: segmentation.page_end,
        },
        style: StyleDescriptor {
            theme: specs.theme.trim().to_string(),
            humor: specs.humor,
            age_group: specs.age_group,
        },
    })
}
