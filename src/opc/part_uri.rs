//! Absolute part names inside a package (`/word/footnotes.xml`)

use crate::error::{Error, Result};
use std::fmt;

/// An absolute, normalized part name: leading `/`, no trailing `/`,
/// no empty segments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartUri {
    path: String,
}

impl PartUri {
    pub fn new(path: &str) -> Result<Self> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidPartUri(format!("empty part name '{}'", path)));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(Error::InvalidPartUri(format!(
                "part name '{}' has an empty segment",
                path
            )));
        }
        Ok(Self {
            path: format!("/{}", trimmed),
        })
    }

    fn from_segments(segments: &[&str]) -> Result<Self> {
        Self::new(&segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Path inside the zip archive (no leading `/`)
    pub fn zip_path(&self) -> &str {
        &self.path[1..]
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn extension(&self) -> Option<&str> {
        let (_, extension) = self.file_name().rsplit_once('.')?;
        Some(extension).filter(|e| !e.is_empty())
    }

    /// Segments of the folder holding this part
    fn folder(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.path[1..].split('/').collect();
        segments.pop();
        segments
    }

    /// `/word/document.xml` -> `/word/_rels/document.xml.rels`
    pub fn relationships_uri(&self) -> PartUri {
        let rels_name = format!("{}.rels", self.file_name());
        let mut segments = self.folder();
        segments.push("_rels");
        segments.push(&rels_name);
        PartUri {
            path: format!("/{}", segments.join("/")),
        }
    }

    pub fn is_relationships(&self) -> bool {
        self.path.contains("/_rels/") && self.path.ends_with(".rels")
    }

    /// Resolve a relationship target written relative to this part's folder
    pub fn resolve(&self, target: &str) -> Result<PartUri> {
        if target.starts_with('/') {
            return PartUri::new(target);
        }

        let mut segments = self.folder();
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(Error::InvalidPartUri(format!(
                            "target '{}' escapes the package from {}",
                            target, self
                        )));
                    }
                }
                s => segments.push(s),
            }
        }
        Self::from_segments(&segments)
    }

    /// The target string a relationship from `source` uses to reach this part
    pub fn relative_to(&self, source: &PartUri) -> String {
        let from = source.folder();
        let to: Vec<&str> = self.path[1..].split('/').collect();

        let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
        let mut relative = vec![".."; from.len() - common];
        relative.extend_from_slice(&to[common..]);
        relative.join("/")
    }
}

impl fmt::Display for PartUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl std::str::FromStr for PartUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PartUri::new(s)
    }
}

/// Default locations of the parts this crate creates
pub mod well_known {
    use super::PartUri;

    fn fixed(path: &str) -> PartUri {
        PartUri {
            path: path.to_string(),
        }
    }

    pub fn document() -> PartUri {
        fixed("/word/document.xml")
    }

    pub fn footnotes() -> PartUri {
        fixed("/word/footnotes.xml")
    }

    pub fn settings() -> PartUri {
        fixed("/word/settings.xml")
    }
}
