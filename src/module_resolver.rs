//! Module Resolution Implementation
//!
//! Resolves relative module specifiers the way the TypeScript compiler does,
//! so that rewritten imports point at exactly the file the type checker saw:
//! - Classic (extension probing only)
//! - Node10 / Bundler (extension probing, `package.json` typings, index files)
//! - Node16 / NodeNext (as Node10, but ESM importers need explicit extensions)
//!
//! The resolver handles:
//! - Relative imports (./foo, ../bar)
//! - Extension replacement (`./foo.js` finds `foo.ts`)
//! - Directory imports via `package.json` `types`/`typings`/`main` and `index`
//! - TypeScript-specific extensions (.ts, .tsx, .d.ts, .mts, .cts)
//!
//! Bare specifiers are out of scope: the runtime resolves those itself.
//! All file-system knowledge comes from a [`ModuleResolutionHost`].

use crate::config::{CompilerOptions, ModuleResolutionKind};
use crate::host::ModuleResolutionHost;
use crate::specifier::{is_relative_specifier, normalize_path};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Result of module resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Resolved file path, lexically normalized
    pub resolved_path: PathBuf,
    /// Original specifier used in import
    pub original_specifier: String,
    /// Extension of the resolved file
    pub extension: ModuleExtension,
}

/// Module file extensions TypeScript can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleExtension {
    Ts,
    Tsx,
    Dts,
    DmTs,
    DCts,
    Js,
    Jsx,
    Mjs,
    Cjs,
    Mts,
    Cts,
    Json,
    Unknown,
}

impl ModuleExtension {
    /// Parse extension from file path
    pub fn from_path(path: &Path) -> Self {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return ModuleExtension::Unknown;
        };

        // Compound extensions first
        if name.ends_with(".d.ts") {
            return ModuleExtension::Dts;
        }
        if name.ends_with(".d.mts") {
            return ModuleExtension::DmTs;
        }
        if name.ends_with(".d.cts") {
            return ModuleExtension::DCts;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") => ModuleExtension::Ts,
            Some("tsx") => ModuleExtension::Tsx,
            Some("js") => ModuleExtension::Js,
            Some("jsx") => ModuleExtension::Jsx,
            Some("mjs") => ModuleExtension::Mjs,
            Some("cjs") => ModuleExtension::Cjs,
            Some("mts") => ModuleExtension::Mts,
            Some("cts") => ModuleExtension::Cts,
            Some("json") => ModuleExtension::Json,
            _ => ModuleExtension::Unknown,
        }
    }

    /// Get the extension string
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleExtension::Ts => ".ts",
            ModuleExtension::Tsx => ".tsx",
            ModuleExtension::Dts => ".d.ts",
            ModuleExtension::DmTs => ".d.mts",
            ModuleExtension::DCts => ".d.cts",
            ModuleExtension::Js => ".js",
            ModuleExtension::Jsx => ".jsx",
            ModuleExtension::Mjs => ".mjs",
            ModuleExtension::Cjs => ".cjs",
            ModuleExtension::Mts => ".mts",
            ModuleExtension::Cts => ".cts",
            ModuleExtension::Json => ".json",
            ModuleExtension::Unknown => "",
        }
    }

    pub fn is_typescript(&self) -> bool {
        matches!(
            self,
            ModuleExtension::Ts
                | ModuleExtension::Tsx
                | ModuleExtension::Dts
                | ModuleExtension::DmTs
                | ModuleExtension::DCts
                | ModuleExtension::Mts
                | ModuleExtension::Cts
        )
    }

    pub fn is_javascript(&self) -> bool {
        matches!(
            self,
            ModuleExtension::Js | ModuleExtension::Jsx | ModuleExtension::Mjs | ModuleExtension::Cjs
        )
    }

    /// .mts, .mjs, .d.mts files are always ESM
    pub fn forces_esm(&self) -> bool {
        matches!(
            self,
            ModuleExtension::Mts | ModuleExtension::Mjs | ModuleExtension::DmTs
        )
    }

    /// .cts, .cjs, .d.cts files are always CommonJS
    pub fn forces_cjs(&self) -> bool {
        matches!(
            self,
            ModuleExtension::Cts | ModuleExtension::Cjs | ModuleExtension::DCts
        )
    }
}

/// Package type from package.json "type" field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageType {
    /// ESM package ("type": "module")
    Module,
    /// CommonJS package ("type": "commonjs")
    CommonJs,
}

/// Module kind of the importing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportingModuleKind {
    Esm,
    #[default]
    CommonJs,
}

/// Extensions appended to an extensionless candidate. `.mts`/`.cts` are only
/// ever reached through an explicit `.mjs`/`.cjs` specifier.
const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "d.ts"];
const JS_EXTENSIONS: &[&str] = &["js", "jsx"];

/// Simplified package.json structure for resolution
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PackageJson {
    pub main: Option<String>,
    pub types: Option<String>,
    pub typings: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<String>,
}

/// Module resolver that implements TypeScript's relative resolution rules
/// on top of a [`ModuleResolutionHost`].
///
/// Nothing is cached: every call re-probes the host.
#[derive(Debug)]
pub struct ModuleResolver<'a, H: ModuleResolutionHost + ?Sized> {
    options: &'a CompilerOptions,
    host: &'a H,
    resolution_kind: ModuleResolutionKind,
}

impl<'a, H: ModuleResolutionHost + ?Sized> ModuleResolver<'a, H> {
    pub fn new(options: &'a CompilerOptions, host: &'a H) -> Self {
        ModuleResolver {
            options,
            host,
            resolution_kind: options.effective_module_resolution(),
        }
    }

    /// Resolve a relative module specifier from a containing file.
    ///
    /// Returns `None` for bare specifiers and for relative specifiers that do
    /// not match any file under the active resolution rules.
    pub fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<ResolvedModule> {
        if !is_relative_specifier(specifier) {
            trace!(specifier, "skipping non-relative specifier");
            return None;
        }

        let containing_dir = containing_file.parent().unwrap_or(Path::new(""));
        let candidate = normalize_path(&containing_dir.join(specifier));
        // `./dir/`, `./` and `../` name a directory, never a file.
        let directory_only = specifier.ends_with('/');

        let resolved = match self.resolution_kind {
            ModuleResolutionKind::Classic if directory_only => None,
            ModuleResolutionKind::Classic => {
                self.try_file(&candidate, &self.extension_candidates(), true)
            }
            ModuleResolutionKind::Node10 | ModuleResolutionKind::Bundler => self.resolve_node_like(
                &candidate,
                ImportingModuleKind::CommonJs,
                directory_only,
            ),
            ModuleResolutionKind::Node16 | ModuleResolutionKind::NodeNext => {
                let package_type = self.package_type_for_dir(containing_dir);
                let importing = self.importing_module_kind(containing_file, package_type);
                self.resolve_node_like(&candidate, importing, directory_only)
            }
        };

        match resolved {
            Some(path) => {
                debug!(
                    specifier,
                    containing_file = %containing_file.display(),
                    resolved = %path.display(),
                    "module resolved"
                );
                Some(ResolvedModule {
                    extension: ModuleExtension::from_path(&path),
                    resolved_path: path,
                    original_specifier: specifier.to_string(),
                })
            }
            None => {
                debug!(
                    specifier,
                    containing_file = %containing_file.display(),
                    kind = ?self.resolution_kind,
                    "module not resolved"
                );
                None
            }
        }
    }

    fn resolve_node_like(
        &self,
        candidate: &Path,
        importing: ImportingModuleKind,
        directory_only: bool,
    ) -> Option<PathBuf> {
        let extensions = self.extension_candidates();

        // ESM importers get no implicit extensions and no directory lookup.
        let esm_mode = self.resolution_kind.is_node16_family()
            && importing == ImportingModuleKind::Esm;

        if !directory_only {
            if let Some(resolved) = self.try_file(candidate, &extensions, !esm_mode) {
                return Some(resolved);
            }
        }
        if esm_mode {
            return None;
        }
        self.try_directory(candidate, &extensions)
    }

    /// Determine the module kind of the importing file based on extension
    /// and package.json type
    fn importing_module_kind(
        &self,
        file_path: &Path,
        package_type: Option<PackageType>,
    ) -> ImportingModuleKind {
        let extension = ModuleExtension::from_path(file_path);
        if extension.forces_esm() {
            return ImportingModuleKind::Esm;
        }
        if extension.forces_cjs() {
            return ImportingModuleKind::CommonJs;
        }
        match package_type {
            Some(PackageType::Module) => ImportingModuleKind::Esm,
            Some(PackageType::CommonJs) | None => ImportingModuleKind::CommonJs,
        }
    }

    /// Package type of the nearest package.json at or above `dir`
    fn package_type_for_dir(&self, dir: &Path) -> Option<PackageType> {
        for ancestor in dir.ancestors() {
            let package_json_path = ancestor.join("package.json");
            if let Some(pj) = self.read_package_json(&package_json_path) {
                return pj.package_type.as_deref().and_then(|t| match t {
                    "module" => Some(PackageType::Module),
                    "commonjs" => Some(PackageType::CommonJs),
                    _ => None,
                });
            }
        }
        None
    }

    fn extension_candidates(&self) -> Vec<&'static str> {
        let mut extensions = TS_EXTENSIONS.to_vec();
        if self.options.allow_js {
            extensions.extend_from_slice(JS_EXTENSIONS);
        }
        extensions
    }

    /// Try `path` as a file: first honoring an explicit extension, then (when
    /// `add_extensions`) by appending each candidate extension.
    fn try_file(
        &self,
        path: &Path,
        extensions: &[&'static str],
        add_extensions: bool,
    ) -> Option<PathBuf> {
        if let Some(resolved) = self.try_explicit_extension(path) {
            return Some(resolved);
        }
        if !add_extensions {
            return None;
        }
        extensions
            .iter()
            .map(|ext| with_appended_extension(path, ext))
            .find(|candidate| self.probe(candidate))
    }

    fn try_explicit_extension(&self, path: &Path) -> Option<PathBuf> {
        let extension = ModuleExtension::from_path(path);

        if extension.is_javascript() {
            let stem = strip_extension(path, extension);
            let replacements: &[&str] = match extension {
                ModuleExtension::Js => &["ts", "tsx", "d.ts"],
                ModuleExtension::Jsx => &["tsx", "d.ts"],
                // `.ts` keeps specifiers this pass already rewrote resolvable.
                ModuleExtension::Mjs => &["mts", "d.mts", "ts"],
                ModuleExtension::Cjs => &["cts", "d.cts"],
                _ => &[],
            };
            if let Some(found) = replacements
                .iter()
                .map(|ext| with_appended_extension(&stem, ext))
                .find(|candidate| self.probe(candidate))
            {
                return Some(found);
            }
            if self.options.allow_js && self.probe(path) {
                return Some(path.to_path_buf());
            }
            return None;
        }

        let accepted = extension.is_typescript()
            || (extension == ModuleExtension::Json && self.options.resolve_json_module);
        if accepted && self.probe(path) {
            return Some(path.to_path_buf());
        }

        None
    }

    /// Resolve a directory through its package.json, then its index file.
    fn try_directory(&self, dir: &Path, extensions: &[&'static str]) -> Option<PathBuf> {
        let package_json_path = dir.join("package.json");
        if let Some(pj) = self.read_package_json(&package_json_path) {
            let fields = [
                ("typings", pj.typings.as_deref()),
                ("types", pj.types.as_deref()),
                ("main", pj.main.as_deref()),
            ];
            for (field, value) in fields {
                let Some(value) = value else { continue };
                let target = normalize_path(&dir.join(value));
                trace!(field, target = %target.display(), "following package.json field");
                if let Some(resolved) = self.try_file(&target, extensions, true) {
                    return Some(resolved);
                }
                if let Some(resolved) = self.try_index(&target, extensions) {
                    return Some(resolved);
                }
            }
        }

        self.try_index(dir, extensions)
    }

    fn try_index(&self, dir: &Path, extensions: &[&'static str]) -> Option<PathBuf> {
        let index = dir.join("index");
        extensions
            .iter()
            .map(|ext| with_appended_extension(&index, ext))
            .find(|candidate| self.probe(candidate))
    }

    /// Read and parse package.json, or `None` if missing or malformed.
    fn read_package_json(&self, path: &Path) -> Option<PackageJson> {
        if !self.host.file_exists(path) {
            return None;
        }
        let content = self.host.read_file(path)?;
        match serde_json::from_str(&content) {
            Ok(pj) => Some(pj),
            Err(err) => {
                debug!(path = %path.display(), %err, "ignoring malformed package.json");
                None
            }
        }
    }

    fn probe(&self, path: &Path) -> bool {
        let exists = self.host.file_exists(path);
        trace!(candidate = %path.display(), exists, "probing file");
        exists
    }
}

/// `foo.service` + `ts` = `foo.service.ts` (unlike `Path::with_extension`).
fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}

fn strip_extension(path: &Path, extension: ModuleExtension) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(extension.as_str()) {
        Some(stem) => PathBuf::from(stem),
        None => path.to_path_buf(),
    }
}
