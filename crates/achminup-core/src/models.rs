//! Asset model
//!
//! An asset has no identity beyond its `(format, id)` pair. Every path the
//! service touches is derived from an [`AssetKey`].

use crate::constants::OWNER_RECORD_SUFFIX;
use crate::error::AppError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Supported asset formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFormat {
    Video,
    Thumbnail,
}

impl AssetFormat {
    pub const ALL: [AssetFormat; 2] = [AssetFormat::Video, AssetFormat::Thumbnail];

    /// Directory and URL segment for this format (`videos`, `thumbnails`).
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetFormat::Video => "videos",
            AssetFormat::Thumbnail => "thumbnails",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            AssetFormat::Video => ".mp4",
            AssetFormat::Thumbnail => ".jpg",
        }
    }
}

impl FromStr for AssetFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "videos" => Ok(AssetFormat::Video),
            "thumbnails" => Ok(AssetFormat::Thumbnail),
            other => Err(AppError::InvalidInput(format!(
                "Unsupported format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Client supplied asset identifier. Only the hyphenated UUID form is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for AssetId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Uuid::try_parse also accepts simple, braced and urn forms
        if s.len() != 36 {
            return Err(AppError::InvalidInput(format!("Not an UUID: {}", s)));
        }
        Uuid::try_parse(s)
            .map(AssetId)
            .map_err(|_| AppError::InvalidInput(format!("Not an UUID: {}", s)))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The `(format, id)` pair that names an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub format: AssetFormat,
    pub id: AssetId,
}

impl AssetKey {
    pub fn new(format: AssetFormat, id: AssetId) -> Self {
        Self { format, id }
    }

    /// Parse the two URL path segments, format first.
    pub fn parse(format: &str, id: &str) -> Result<Self, AppError> {
        let id = id.parse::<AssetId>()?;
        let format = format.parse::<AssetFormat>()?;
        Ok(Self { format, id })
    }

    /// `{id}{ext}`
    pub fn payload_file_name(&self) -> String {
        format!("{}{}", self.id, self.format.extension())
    }

    /// `{id}.owner.txt`
    pub fn owner_file_name(&self) -> String {
        format!("{}{}", self.id, OWNER_RECORD_SUFFIX)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.format, self.payload_file_name())
    }
}

/// Identity string returned by the identity provider (the OIDC `sub`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(sub: impl Into<String>) -> Self {
        Self(sub.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
