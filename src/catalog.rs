//! Media catalog parsing and validation.
//!
//! A catalog is a declarative JSON list of installation media to fetch:
//! drivers, updates, and applications. Parsing is fail-fast and produces
//! either a complete, validated `MediaCatalog` or a `CatalogError` naming
//! the offending section and index - never a partial catalog.
//!
//! Two payload shapes are accepted:
//! - canonical: up to three arrays `drivers`/`updates`/`applications`,
//!   each entry `{id, source, target, install_type?, checksum?}`
//! - legacy: a flat `items` array of `{id, url}`, normalized into
//!   application entries (target = id, source = url)
//!
//! When both shapes appear in one payload the canonical keys win and the
//! legacy `items` are ignored with a warning.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::CatalogError;

/// Installation category of a media entry.
///
/// Closed set: every parse/order/report site matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallType {
    Driver,
    Update,
    Application,
}

impl InstallType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "driver" => Some(InstallType::Driver),
            "update" => Some(InstallType::Update),
            "application" => Some(InstallType::Application),
            _ => None,
        }
    }

    /// Section name used in catalog payloads and error messages.
    pub fn section(self) -> &'static str {
        match self {
            InstallType::Driver => "drivers",
            InstallType::Update => "updates",
            InstallType::Application => "applications",
        }
    }
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallType::Driver => "driver",
            InstallType::Update => "update",
            InstallType::Application => "application",
        };
        f.write_str(name)
    }
}

/// One artifact to fetch: where it lives, where it lands, what it is.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    /// Unique identifier within its category.
    pub id: String,
    /// Source locator: http(s) URL or filesystem path.
    pub source: String,
    /// Destination path relative to the fetch root.
    pub target: String,
    pub install_type: InstallType,
    /// Optional expected SHA-256 digest (hex, compared case-insensitively).
    pub checksum: Option<String>,
}

/// Validated, immutable media catalog.
///
/// Categories keep their declaration order internally, and
/// [`all_entries`](MediaCatalog::all_entries) always yields drivers, then
/// updates, then applications, regardless of how the payload ordered its
/// keys.
#[derive(Debug, Default)]
pub struct MediaCatalog {
    drivers: Vec<MediaEntry>,
    updates: Vec<MediaEntry>,
    applications: Vec<MediaEntry>,
}

/// Raw payload shape before validation. All fields optional so that
/// missing-field errors can carry the section and index.
#[derive(Deserialize)]
struct RawCatalog {
    drivers: Option<Vec<RawEntry>>,
    updates: Option<Vec<RawEntry>>,
    applications: Option<Vec<RawEntry>>,
    items: Option<Vec<RawLegacyItem>>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: Option<String>,
    source: Option<String>,
    target: Option<String>,
    install_type: Option<String>,
    checksum: Option<String>,
}

#[derive(Deserialize)]
struct RawLegacyItem {
    id: Option<String>,
    url: Option<String>,
}

impl MediaCatalog {
    /// Parse and validate a catalog payload.
    pub fn parse(payload: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(payload)?;

        let has_canonical =
            raw.drivers.is_some() || raw.updates.is_some() || raw.applications.is_some();

        if has_canonical {
            if raw.items.is_some() {
                // Observed behavior from the legacy tooling: canonical keys
                // silently shadow `items`. Keep the precedence but say so.
                eprintln!(
                    "[WARN] catalog contains both canonical sections and legacy 'items'; \
                     ignoring 'items'"
                );
            }
            Ok(MediaCatalog {
                drivers: validate_section(raw.drivers, InstallType::Driver)?,
                updates: validate_section(raw.updates, InstallType::Update)?,
                applications: validate_section(raw.applications, InstallType::Application)?,
            })
        } else {
            Ok(MediaCatalog {
                applications: normalize_legacy(raw.items.unwrap_or_default())?,
                ..Default::default()
            })
        }
    }

    /// All entries in fixed category order: drivers, updates, applications.
    pub fn all_entries(&self) -> impl Iterator<Item = &MediaEntry> {
        self.drivers
            .iter()
            .chain(self.updates.iter())
            .chain(self.applications.iter())
    }

    pub fn drivers(&self) -> &[MediaEntry] {
        &self.drivers
    }

    pub fn updates(&self) -> &[MediaEntry] {
        &self.updates
    }

    pub fn applications(&self) -> &[MediaEntry] {
        &self.applications
    }

    pub fn len(&self) -> usize {
        self.drivers.len() + self.updates.len() + self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate one canonical section, failing on the first bad entry.
fn validate_section(
    entries: Option<Vec<RawEntry>>,
    install_type: InstallType,
) -> Result<Vec<MediaEntry>, CatalogError> {
    let section = install_type.section();
    let entries = entries.unwrap_or_default();
    let mut validated = Vec::with_capacity(entries.len());
    let mut seen_ids = HashSet::new();

    for (index, raw) in entries.into_iter().enumerate() {
        let id = require(raw.id, section, index, "id")?;
        let source = require(raw.source, section, index, "source")?;
        let target = require(raw.target, section, index, "target")?;

        // Identifiers are unique within their category; a repeat would
        // make the batch failure report ambiguous.
        if !seen_ids.insert(id.clone()) {
            return Err(CatalogError::DuplicateId { section, index, id });
        }

        // An explicit install_type must exist in the closed set and agree
        // with the section it was declared under.
        if let Some(declared) = raw.install_type {
            match InstallType::parse(&declared) {
                None => {
                    return Err(CatalogError::UnknownInstallType {
                        section,
                        index,
                        value: declared,
                    })
                }
                Some(parsed) if parsed != install_type => {
                    return Err(CatalogError::MismatchedInstallType {
                        section,
                        index,
                        value: declared,
                    })
                }
                Some(_) => {}
            }
        }

        if let Some(ref checksum) = raw.checksum {
            if !is_hex_sha256(checksum) {
                return Err(CatalogError::InvalidChecksum {
                    section,
                    index,
                    value: checksum.clone(),
                });
            }
        }

        validated.push(MediaEntry {
            id,
            source,
            target,
            install_type,
            checksum: raw.checksum,
        });
    }

    Ok(validated)
}

/// A declared checksum must already look like a SHA-256 digest; anything
/// else would only surface later as a guaranteed fetch failure.
fn is_hex_sha256(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalize a legacy `items` array into application entries.
fn normalize_legacy(items: Vec<RawLegacyItem>) -> Result<Vec<MediaEntry>, CatalogError> {
    let section = "items";
    let mut entries = Vec::with_capacity(items.len());
    let mut seen_ids = HashSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let id = require(item.id, section, index, "id")?;
        let url = require(item.url, section, index, "url")?;
        if seen_ids.contains(&id) {
            return Err(CatalogError::DuplicateId { section, index, id });
        }
        seen_ids.insert(id.clone());
        entries.push(MediaEntry {
            target: id.clone(),
            id,
            source: url,
            install_type: InstallType::Application,
            checksum: None,
        });
    }

    Ok(entries)
}

fn require(
    value: Option<String>,
    section: &'static str,
    index: usize,
    field: &'static str,
) -> Result<String, CatalogError> {
    match value {
        None => Err(CatalogError::MissingField {
            section,
            index,
            field,
        }),
        Some(v) if v.trim().is_empty() => Err(CatalogError::EmptyField {
            section,
            index,
            field,
        }),
        Some(v) => Ok(v),
    }
}
