//! Module-specifier path math.
//!
//! Turning a resolved file back into a specifier is purely lexical: no
//! symlinks are followed and nothing is read from disk.

use std::path::{Component, Path, PathBuf};

/// Suffix of the source files this pass compiles.
pub const SOURCE_SUFFIX: &str = ".ts";

/// Suffix the downstream module loader expects.
pub const RUNTIME_SUFFIX: &str = ".mjs";

/// `./x` and `../x` are relative; everything else is left to the runtime.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Collapse `.` and `..` components without touching the file system.
///
/// Leading `..` components of a relative path are kept; `..` directly under
/// the root is dropped.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Relative path from directory `from` to `to`, `/`-separated.
///
/// Both paths are normalized first. The result is empty when they are equal.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize_path(from);
    let to = normalize_path(to);
    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    let mut common = 0;
    while common < from_components.len()
        && common < to_components.len()
        && from_components[common] == to_components[common]
    {
        common += 1;
    }

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_components.len() {
        segments.push("..".to_string());
    }
    for component in &to_components[common..] {
        segments.push(component.as_os_str().to_string_lossy().into_owned());
    }
    segments.join("/")
}

/// Swap a trailing [`SOURCE_SUFFIX`] for [`RUNTIME_SUFFIX`]. Any other
/// extension is kept as-is.
pub fn to_runtime_extension(specifier: &str) -> String {
    match specifier.strip_suffix(SOURCE_SUFFIX) {
        Some(stem) => format!("{stem}{RUNTIME_SUFFIX}"),
        None => specifier.to_string(),
    }
}

/// The specifier `containing_file` should use to import `resolved_file`.
pub fn transformed_specifier(containing_file: &Path, resolved_file: &Path) -> String {
    let containing_dir = containing_file.parent().unwrap_or(Path::new(""));
    let relative = relative_path(containing_dir, resolved_file);
    let relative = if is_relative_specifier(&relative) {
        relative
    } else {
        format!("./{relative}")
    };
    to_runtime_extension(&relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_relative_specifier() {
        assert!(is_relative_specifier("./lib"));
        assert!(is_relative_specifier("../shared/util"));
        assert!(!is_relative_specifier("lodash"));
        assert!(!is_relative_specifier("@scope/pkg/sub"));
        assert!(!is_relative_specifier("/abs/path"));
        assert!(!is_relative_specifier("."));
        assert!(!is_relative_specifier(".."));
        assert!(!is_relative_specifier(".hidden"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/proj/src/./../shared/util")),
            PathBuf::from("/proj/shared/util")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/proj/src"), Path::new("/proj/src/lib.ts")),
            "lib.ts"
        );
        assert_eq!(
            relative_path(Path::new("/proj/src"), Path::new("/proj/shared/util.ts")),
            "../shared/util.ts"
        );
        assert_eq!(
            relative_path(Path::new("/proj/src/a/b"), Path::new("/proj/x.ts")),
            "../../../x.ts"
        );
        assert_eq!(
            relative_path(Path::new("/proj/src"), Path::new("/proj/src/deep/mod/index.ts")),
            "deep/mod/index.ts"
        );
        assert_eq!(relative_path(Path::new("/proj"), Path::new("/proj")), "");
    }

    #[test]
    fn test_to_runtime_extension_is_a_narrow_suffix_swap() {
        assert_eq!(to_runtime_extension("./lib.ts"), "./lib.mjs");
        assert_eq!(to_runtime_extension("./types.d.ts"), "./types.d.mjs");
        assert_eq!(to_runtime_extension("./view.tsx"), "./view.tsx");
        assert_eq!(to_runtime_extension("./mod.mts"), "./mod.mts");
        assert_eq!(to_runtime_extension("./data.json"), "./data.json");
        assert_eq!(to_runtime_extension("./lib.ts.bak"), "./lib.ts.bak");
    }

    #[test]
    fn test_transformed_specifier() {
        let app = Path::new("/proj/src/app.ts");
        assert_eq!(
            transformed_specifier(app, Path::new("/proj/src/lib.ts")),
            "./lib.mjs"
        );
        assert_eq!(
            transformed_specifier(app, Path::new("/proj/shared/util.ts")),
            "../shared/util.mjs"
        );
        assert_eq!(
            transformed_specifier(app, Path::new("/proj/src/components/index.ts")),
            "./components/index.mjs"
        );
        assert_eq!(
            transformed_specifier(app, Path::new("/proj/src/widget.tsx")),
            "./widget.tsx"
        );
    }

    #[test]
    fn test_transformed_specifier_round_trips_to_resolved_file() {
        let app = Path::new("/proj/src/feature/app.ts");
        let resolved = Path::new("/proj/shared/deep/util.ts");
        let specifier = transformed_specifier(app, resolved);
        let stem = specifier.strip_suffix(RUNTIME_SUFFIX).unwrap();
        let joined = normalize_path(&app.parent().unwrap().join(format!("{stem}{SOURCE_SUFFIX}")));
        assert_eq!(joined, resolved);
    }
}
