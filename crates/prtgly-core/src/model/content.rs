use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Level of an object in the PRTG hierarchy.
///
/// Parses case-insensitively from the singular or plural form, so both
/// `Device` (a CSV `type` column) and `devices` (a table name) work.
/// PRTG probes are groups as far as the hierarchy is concerned.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ContentType {
    #[strum(to_string = "group", serialize = "groups", serialize = "probe", serialize = "probes")]
    Group,
    #[strum(to_string = "device", serialize = "devices")]
    Device,
    #[strum(to_string = "sensor", serialize = "sensors")]
    Sensor,
}

impl ContentType {
    /// Every content type, root first.
    pub const HIERARCHY: [ContentType; 3] = [Self::Group, Self::Device, Self::Sensor];

    /// Name of the PRTG table holding this content.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Group => "groups",
            Self::Device => "devices",
            Self::Sensor => "sensors",
        }
    }

    /// This content type preceded by every level above it.
    pub fn with_ancestors(self) -> &'static [ContentType] {
        match self {
            Self::Group => &Self::HIERARCHY[..1],
            Self::Device => &Self::HIERARCHY[..2],
            Self::Sensor => &Self::HIERARCHY[..],
        }
    }

    /// Columns requested from the table endpoint.
    pub fn table_columns(self) -> &'static [&'static str] {
        match self {
            Self::Group => &["objid", "name", "parentid", "tags", "active", "probe"],
            Self::Device => &[
                "objid", "name", "parentid", "tags", "active", "host", "group", "probe",
            ],
            Self::Sensor => &[
                "objid", "name", "parentid", "tags", "active", "device", "status",
            ],
        }
    }
}

/// Which content a command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSelector {
    One(ContentType),
    All,
}

impl ContentSelector {
    /// Content types selected, root first.
    pub fn content_types(self) -> &'static [ContentType] {
        match self {
            Self::One(ct) => match ct {
                ContentType::Group => &ContentType::HIERARCHY[..1],
                ContentType::Device => &ContentType::HIERARCHY[1..2],
                ContentType::Sensor => &ContentType::HIERARCHY[2..],
            },
            Self::All => &ContentType::HIERARCHY,
        }
    }

    /// Content types that must be cached before rules can run: the
    /// selection plus every ancestor level, so parents resolve.
    pub fn required_content(self) -> &'static [ContentType] {
        match self {
            Self::One(ct) => ct.with_ancestors(),
            Self::All => &ContentType::HIERARCHY,
        }
    }
}

impl From<ContentType> for ContentSelector {
    fn from(ct: ContentType) -> Self {
        Self::One(ct)
    }
}

impl std::str::FromStr for ContentSelector {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::One)
        }
    }
}

impl std::fmt::Display for ContentSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(ct) => f.write_str(ct.table_name()),
            Self::All => f.write_str("all"),
        }
    }
}
