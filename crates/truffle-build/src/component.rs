//! Language component archive (`graalComponent`)
//!
//! The archive is a jar holding a bundle manifest, the language libraries
//! under `languages/<name>/lib/` and any extra component resources under
//! `languages/<name>/`.

use crate::error::{BuildError, BuildResult};
use crate::identity::GraalSettings;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Manifest entry name
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Maximum manifest line length in bytes
const MANIFEST_LINE_LIMIT: usize = 72;

/// Inputs of a component archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub language_id: String,
    pub language_name: String,
    pub graal_version: String,
    /// Jars placed in `languages/<name>/lib/`
    pub libraries: Vec<PathBuf>,
    /// Directory copied to `languages/<name>/`, if it exists
    pub resources_dir: Option<PathBuf>,
    /// Directory receiving the archive
    pub output_dir: PathBuf,
}

impl ComponentSpec {
    /// Build from the project settings; fails if no language id is set
    pub fn from_settings(
        task: &str,
        settings: &GraalSettings,
        libraries: Vec<PathBuf>,
        resources_dir: Option<PathBuf>,
    ) -> BuildResult<Self> {
        let language_id = settings.require_language_id(task)?.to_string();
        let graal_version = settings
            .version()
            .ok_or_else(|| BuildError::PrematureResolution {
                name: "graal".to_string(),
            })?
            .to_string();
        Ok(Self {
            language_id,
            language_name: settings.language_name().to_string(),
            graal_version,
            libraries,
            resources_dir,
            output_dir: settings.output_dir().to_path_buf(),
        })
    }

    /// Location of the archive
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}-component.jar", self.language_id))
    }

    /// Root of the language inside the archive
    pub fn language_root(&self) -> String {
        format!("languages/{}", self.language_name)
    }

    /// Manifest content for the given architecture
    pub fn manifest(&self, os_arch: &str) -> String {
        let capability = format!(
            "org.graalvm; filter:=\"(&(graalvm_version={})(os_arch={}))\"",
            self.graal_version, os_arch
        );
        let entries = [
            ("Manifest-Version", "1.0".to_string()),
            ("Bundle-Name", self.language_name.clone()),
            ("Bundle-Symbolic-Name", format!("org.graalvm.{}", self.language_id)),
            ("Bundle-Version", self.graal_version.clone()),
            ("Bundle-RequireCapability", capability),
            ("x-GraalVM-Polyglot-Part", "True".to_string()),
        ];

        let mut manifest = String::new();
        for (key, value) in entries {
            manifest.push_str(&wrap_manifest_line(&format!("{}: {}", key, value)));
        }
        manifest.push('\n');
        manifest
    }
}

/// Architecture name used in component capabilities
pub fn os_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        other => other,
    }
}

/// Split a manifest line into 72-byte chunks with continuation lines
fn wrap_manifest_line(line: &str) -> String {
    let mut out = String::new();
    let mut current = String::new();
    let mut limit = MANIFEST_LINE_LIMIT;
    for c in line.chars() {
        if current.len() + c.len_utf8() > limit {
            out.push_str(&current);
            out.push_str("\n ");
            current.clear();
            // Continuation lines start with a space
            limit = MANIFEST_LINE_LIMIT - 1;
        }
        current.push(c);
    }
    out.push_str(&current);
    out.push('\n');
    out
}

/// Write the component archive; returns its path
///
/// The archive is written under a temporary name and renamed when complete.
pub fn build_component(spec: &ComponentSpec) -> BuildResult<PathBuf> {
    let path = spec.archive_path();
    let partial = path.with_extension("jar.partial");
    fs::create_dir_all(&spec.output_dir).map_err(|e| BuildError::io(&spec.output_dir, e))?;

    let result = write_archive(spec, &partial);
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, &path).map_err(|e| BuildError::io(&path, e))?;
    tracing::debug!("Built component {}", path.display());
    Ok(path)
}

fn write_archive(spec: &ComponentSpec, path: &Path) -> BuildResult<()> {
    let file = File::create(path).map_err(|e| BuildError::io(path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let root = spec.language_root();

    zip.add_directory("META-INF/", options)
        .map_err(|e| BuildError::archive(path, e))?;
    zip.start_file(MANIFEST_PATH, options)
        .map_err(|e| BuildError::archive(path, e))?;
    zip.write_all(spec.manifest(os_arch()).as_bytes())
        .map_err(|e| BuildError::io(path, e))?;

    zip.add_directory(format!("{}/lib/", root), options)
        .map_err(|e| BuildError::archive(path, e))?;
    for library in &spec.libraries {
        let name = library
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BuildError::archive(library, "not a file"))?;
        let content = fs::read(library).map_err(|e| BuildError::io(library, e))?;
        zip.start_file(format!("{}/lib/{}", root, name), options)
            .map_err(|e| BuildError::archive(path, e))?;
        zip.write_all(&content).map_err(|e| BuildError::io(path, e))?;
    }

    if let Some(resources) = spec.resources_dir.as_deref().filter(|d| d.is_dir()) {
        for entry in WalkDir::new(resources).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| BuildError::archive(resources, e))?;
            let relative = entry
                .path()
                .strip_prefix(resources)
                .map_err(|e| BuildError::archive(entry.path(), e))?;
            let name = format!(
                "{}/{}",
                root,
                relative.to_string_lossy().replace('\\', "/")
            );
            if entry.file_type().is_dir() {
                zip.add_directory(format!("{}/", name), options)
                    .map_err(|e| BuildError::archive(path, e))?;
            } else {
                let content = fs::read(entry.path()).map_err(|e| BuildError::io(entry.path(), e))?;
                zip.start_file(name, options)
                    .map_err(|e| BuildError::archive(path, e))?;
                zip.write_all(&content).map_err(|e| BuildError::io(path, e))?;
            }
        }
    }

    zip.finish().map_err(|e| BuildError::archive(path, e))?;
    Ok(())
}
