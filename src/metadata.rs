//! Package metadata and control-file rendering.
//!
//! The control metadata file is a line-oriented `key = value` text file
//! with a fixed field order, written alongside any lifecycle scripts into
//! the control staging directory. Package names and architectures are
//! normalised on construction; corrections are warnings, never fatal.

use crate::error::Result;
use camino::Utf8Path;
use log::warn;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;

/// Name of the control metadata file. Hidden, and always the first entry
/// of the control archive.
pub const CONTROL_FILE: &str = ".PKGINFO";

/// Fixed placeholder written for the `size` field.
const SIZE_PLACEHOLDER: &str = "0";

/// Architecture value that maps to `noarch`.
const NATIVE_ARCH: &str = "native";

/// Install-time events a package may hook with a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptEvent {
    /// Runs before the package's files are installed.
    PreInstall,
    /// Runs after the package's files are installed.
    PostInstall,
    /// Runs before an upgrade replaces the package's files.
    PreUpgrade,
    /// Runs after an upgrade replaces the package's files.
    PostUpgrade,
    /// Runs before the package's files are removed.
    PreDeinstall,
    /// Runs after the package's files are removed.
    PostDeinstall,
}

impl ScriptEvent {
    /// Every event, in control-directory emission order.
    pub const ALL: [Self; 6] = [
        Self::PreInstall,
        Self::PostInstall,
        Self::PreUpgrade,
        Self::PostUpgrade,
        Self::PreDeinstall,
        Self::PostDeinstall,
    ];

    /// The hidden file name carrying this event's script.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::PreInstall => ".pre-install",
            Self::PostInstall => ".post-install",
            Self::PreUpgrade => ".pre-upgrade",
            Self::PostUpgrade => ".post-upgrade",
            Self::PreDeinstall => ".pre-deinstall",
            Self::PostDeinstall => ".post-deinstall",
        }
    }
}

/// Optional script bodies keyed by install-time event.
///
/// Absent events are simply omitted from the control directory.
#[derive(Debug, Clone, Default)]
pub struct LifecycleScripts {
    bodies: BTreeMap<ScriptEvent, String>,
}

impl LifecycleScripts {
    /// An empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a script body for `event`.
    pub fn set(&mut self, event: ScriptEvent, body: impl Into<String>) {
        self.bodies.insert(event, body.into());
    }

    /// The script body for `event`, if one was provided.
    #[must_use]
    pub fn get(&self, event: ScriptEvent) -> Option<&str> {
        self.bodies.get(&event).map(String::as_str)
    }
}

/// Immutable package metadata, normalised on construction.
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    name: String,
    version: String,
    arch: String,
    description: String,
    url: String,
    depends: Vec<String>,
}

impl PackageMetadata {
    /// Build the metadata record, normalising name and architecture.
    ///
    /// Name corrections (case, underscores, spaces) and the
    /// `native`-to-`noarch` mapping are applied here, once, so every later
    /// consumer sees the corrected values.
    #[must_use]
    pub fn new(
        name: &str,
        version: &str,
        arch: &str,
        description: &str,
        url: &str,
        depends: Vec<String>,
    ) -> Self {
        Self {
            name: normalize_name(name),
            version: version.to_owned(),
            arch: normalize_arch(arch),
            description: description.to_owned(),
            url: url.to_owned(),
            depends,
        }
    }

    /// The normalised package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The normalised architecture.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Declared dependencies.
    #[must_use]
    pub fn depends(&self) -> &[String] {
        &self.depends
    }
}

/// Normalise a package name, warning for each corrected category.
fn normalize_name(raw: &str) -> String {
    let corrected: String = raw
        .chars()
        .map(|c| match c {
            'A'..='Z' => c.to_ascii_lowercase(),
            '_' | ' ' => '-',
            other => other,
        })
        .collect();

    if raw.chars().any(|c| c.is_ascii_uppercase()) {
        warn!("package name {raw:?}: uppercase letters lowered");
    }
    if raw.contains('_') {
        warn!("package name {raw:?}: underscores replaced with hyphens");
    }
    if raw.contains(' ') {
        warn!("package name {raw:?}: spaces replaced with hyphens");
    }
    corrected
}

/// Map the `native` architecture to `noarch`; pass everything else through.
fn normalize_arch(raw: &str) -> String {
    if raw == NATIVE_ARCH {
        warn!("architecture {NATIVE_ARCH:?} mapped to \"noarch\"");
        "noarch".to_owned()
    } else {
        raw.to_owned()
    }
}

/// Render the control metadata file text.
///
/// Field order is fixed: pkgname, pkgver, arch, pkgdesc, url, size, one
/// depend line per dependency, then the data archive's content hash.
#[must_use]
pub fn render_control_file(metadata: &PackageMetadata, datahash: &str) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "pkgname = {}", metadata.name);
    let _ = writeln!(text, "pkgver = {}", metadata.version);
    let _ = writeln!(text, "arch = {}", metadata.arch);
    let _ = writeln!(text, "pkgdesc = {}", metadata.description);
    let _ = writeln!(text, "url = {}", metadata.url);
    let _ = writeln!(text, "size = {SIZE_PLACEHOLDER}");
    for depend in &metadata.depends {
        let _ = writeln!(text, "depend = {depend}");
    }
    let _ = writeln!(text, "datahash = {datahash}");
    text
}

/// Write the control metadata file and lifecycle scripts into `dir`.
///
/// # Errors
///
/// Returns [`crate::ForgeError::Io`] if any file cannot be written.
pub fn write_control_dir(
    dir: &Utf8Path,
    metadata: &PackageMetadata,
    scripts: &LifecycleScripts,
    datahash: &str,
) -> Result<()> {
    fs::write(
        dir.join(CONTROL_FILE).as_std_path(),
        render_control_file(metadata, datahash),
    )?;
    for event in ScriptEvent::ALL {
        if let Some(body) = scripts.get(event) {
            fs::write(dir.join(event.file_name()).as_std_path(), body)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
