//! Footnote formatting value types

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Where footnotes are placed on the page (w:pos)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FootnotePosition {
    /// At the bottom of the page
    #[default]
    PageBottom,
    /// Directly below the last line of text
    BeneathText,
}

/// Footnote numbering format (w:numFmt)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumberFormat {
    /// 1, 2, 3
    #[default]
    Decimal,
    /// a, b, c
    LowerLetter,
    /// A, B, C
    UpperLetter,
    /// i, ii, iii
    LowerRoman,
    /// I, II, III
    UpperRoman,
    /// 1, 2, ..., A, B
    Hex,
}

/// When footnote numbering starts over (w:numRestart)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartLocation {
    /// Numbering never restarts
    #[default]
    Continuous,
    /// Numbering restarts at each section
    EachSection,
    /// Numbering restarts on each page
    EachPage,
}

/// The four section-level footnote properties
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FootnoteProperty {
    Position,
    NumberFormat,
    StartValue,
    RestartLocation,
}

/// Footnote properties after inheritance has been resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectiveFootnoteProperties {
    pub position: FootnotePosition,
    pub number_format: NumberFormat,
    pub start_value: u32,
    pub restart: RestartLocation,
}

impl Default for EffectiveFootnoteProperties {
    fn default() -> Self {
        Self {
            position: FootnotePosition::PageBottom,
            number_format: NumberFormat::Decimal,
            start_value: 1,
            restart: RestartLocation::Continuous,
        }
    }
}

impl FootnotePosition {
    /// Token used in the XML
    pub fn as_str(&self) -> &'static str {
        match self {
            FootnotePosition::PageBottom => "pageBottom",
            FootnotePosition::BeneathText => "beneathText",
        }
    }
}

impl FromStr for FootnotePosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pageBottom" => Ok(FootnotePosition::PageBottom),
            "beneathText" => Ok(FootnotePosition::BeneathText),
            other => Err(Error::invalid_value(FootnoteProperty::Position.as_str(), other)),
        }
    }
}

impl NumberFormat {
    /// Token used in the XML
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberFormat::Decimal => "decimal",
            NumberFormat::LowerLetter => "lowerLetter",
            NumberFormat::UpperLetter => "upperLetter",
            NumberFormat::LowerRoman => "lowerRoman",
            NumberFormat::UpperRoman => "upperRoman",
            NumberFormat::Hex => "hex",
        }
    }
}

impl FromStr for NumberFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "decimal" => NumberFormat::Decimal,
            "lowerLetter" => NumberFormat::LowerLetter,
            "upperLetter" => NumberFormat::UpperLetter,
            "lowerRoman" => NumberFormat::LowerRoman,
            "upperRoman" => NumberFormat::UpperRoman,
            "hex" => NumberFormat::Hex,
            other => {
                return Err(Error::invalid_value(
                    FootnoteProperty::NumberFormat.as_str(),
                    other,
                ))
            }
        })
    }
}

impl RestartLocation {
    /// Token used in the XML
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartLocation::Continuous => "continuous",
            RestartLocation::EachSection => "eachSect",
            RestartLocation::EachPage => "eachPage",
        }
    }
}

impl FromStr for RestartLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "continuous" => Ok(RestartLocation::Continuous),
            "eachSect" | "eachSection" => Ok(RestartLocation::EachSection),
            "eachPage" => Ok(RestartLocation::EachPage),
            other => Err(Error::invalid_value(
                FootnoteProperty::RestartLocation.as_str(),
                other,
            )),
        }
    }
}

/// Parse a footnote start value; only positive integers are legal
pub fn parse_start_value(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(Error::invalid_value(FootnoteProperty::StartValue.as_str(), s)),
    }
}

impl FootnoteProperty {
    /// All properties, in the order the format stores them
    pub const ALL: [FootnoteProperty; 4] = [
        FootnoteProperty::Position,
        FootnoteProperty::NumberFormat,
        FootnoteProperty::StartValue,
        FootnoteProperty::RestartLocation,
    ];

    /// Name used in error messages and by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            FootnoteProperty::Position => "position",
            FootnoteProperty::NumberFormat => "numberFormat",
            FootnoteProperty::StartValue => "startValue",
            FootnoteProperty::RestartLocation => "restartLocation",
        }
    }

    /// Local name of the child element inside w:footnotePr
    pub(crate) fn element(&self) -> &'static str {
        match self {
            FootnoteProperty::Position => "pos",
            FootnoteProperty::NumberFormat => "numFmt",
            FootnoteProperty::StartValue => "numStart",
            FootnoteProperty::RestartLocation => "numRestart",
        }
    }

    pub(crate) fn from_element(local: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.element().as_bytes() == local)
    }
}

impl FromStr for FootnoteProperty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::invalid_value("footnote property", s))
    }
}

impl fmt::Display for FootnoteProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
