//! Compiler options relevant to module resolution, and the `tsconfig.json`
//! layer that produces them.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Accepts `true`, `false`, or their string spellings (`"true"`, `"off"`, ...).
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{}'. Expected true, false, 'true', or 'false'",
                s
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub compiler_options: Option<RawCompilerOptions>,
}

/// `compilerOptions` as written in `tsconfig.json`, before validation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawCompilerOptions {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub module_resolution: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub allow_js: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub resolve_json_module: Option<bool>,
}

/// Module resolution strategy (`compilerOptions.moduleResolution`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleResolutionKind {
    Classic,
    Node10,
    Node16,
    NodeNext,
    Bundler,
}

impl ModuleResolutionKind {
    /// Node16 and NodeNext distinguish ESM from CommonJS importers.
    pub fn is_node16_family(self) -> bool {
        matches!(self, Self::Node16 | Self::NodeNext)
    }
}

/// Module code generation (`compilerOptions.module`). Only consulted to pick
/// the default resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    None,
    CommonJs,
    Amd,
    Umd,
    System,
    EsModule,
    Node16,
    NodeNext,
    Preserve,
}

/// Validated options handed to the transformer through the transform context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub module: Option<ModuleKind>,
    pub module_resolution: Option<ModuleResolutionKind>,
    pub allow_js: bool,
    pub resolve_json_module: bool,
}

impl CompilerOptions {
    pub fn with_module_resolution(mut self, kind: ModuleResolutionKind) -> Self {
        self.module_resolution = Some(kind);
        self
    }

    /// The strategy in effect, following TypeScript's defaults when
    /// `moduleResolution` is not set explicitly.
    pub fn effective_module_resolution(&self) -> ModuleResolutionKind {
        if let Some(resolution) = self.module_resolution {
            return resolution;
        }

        match self.module {
            None | Some(ModuleKind::CommonJs) => ModuleResolutionKind::Node10,
            Some(ModuleKind::Node16) => ModuleResolutionKind::Node16,
            Some(ModuleKind::NodeNext) => ModuleResolutionKind::NodeNext,
            Some(ModuleKind::Preserve) => ModuleResolutionKind::Bundler,
            Some(_) => ModuleResolutionKind::Classic,
        }
    }
}

pub fn resolve_compiler_options(options: Option<&RawCompilerOptions>) -> Result<CompilerOptions> {
    let mut resolved = CompilerOptions::default();
    let Some(options) = options else {
        return Ok(resolved);
    };

    if let Some(module) = options.module.as_deref() {
        let value = module.trim();
        if !value.is_empty() {
            resolved.module = Some(parse_module_kind(value)?);
        }
    }

    if let Some(module_resolution) = options.module_resolution.as_deref() {
        let value = module_resolution.trim();
        if !value.is_empty() {
            resolved.module_resolution = Some(parse_module_resolution(value)?);
        }
    }

    resolved.allow_js = options.allow_js.unwrap_or(false);
    resolved.resolve_json_module = options.resolve_json_module.unwrap_or(false);

    Ok(resolved)
}

/// Parse `tsconfig.json` text. Comments and trailing commas are accepted.
pub fn parse_tsconfig(source: &str) -> Result<TsConfig> {
    let normalized = strip_jsonc(source);
    let config = serde_json::from_str(&normalized).context("failed to parse tsconfig JSON")?;
    Ok(config)
}

/// Load a `tsconfig.json`, following its `extends` chain.
pub fn load_tsconfig(path: &Path) -> Result<TsConfig> {
    let mut visited = HashSet::new();
    load_tsconfig_inner(path, &mut visited)
}

/// Load a `tsconfig.json` and validate its compiler options in one step.
pub fn load_compiler_options(path: &Path) -> Result<CompilerOptions> {
    let config = load_tsconfig(path)?;
    resolve_compiler_options(config.compiler_options.as_ref())
        .with_context(|| format!("invalid compilerOptions in {}", path.display()))
}

fn load_tsconfig_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<TsConfig> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("tsconfig extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tsconfig: {}", path.display()))?;
    let mut config = parse_tsconfig(&source)
        .with_context(|| format!("failed to parse tsconfig: {}", path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_path = resolve_extends_path(path, &extends)?;
        let base = load_tsconfig_inner(&base_path, visited)?;
        config = merge_configs(base, config);
    }

    visited.remove(&canonical);
    Ok(config)
}

fn resolve_extends_path(current_path: &Path, extends: &str) -> Result<PathBuf> {
    let base_dir = current_path
        .parent()
        .ok_or_else(|| anyhow!("tsconfig has no parent directory"))?;
    let mut candidate = PathBuf::from(extends);
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }

    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Ok(base_dir.join(candidate))
    }
}

fn merge_configs(base: TsConfig, child: TsConfig) -> TsConfig {
    let compiler_options = match (base.compiler_options, child.compiler_options) {
        (Some(base), Some(child)) => Some(RawCompilerOptions {
            module: child.module.or(base.module),
            module_resolution: child.module_resolution.or(base.module_resolution),
            allow_js: child.allow_js.or(base.allow_js),
            resolve_json_module: child.resolve_json_module.or(base.resolve_json_module),
        }),
        (base, child) => child.or(base),
    };

    TsConfig {
        extends: None,
        compiler_options,
    }
}

fn parse_module_kind(value: &str) -> Result<ModuleKind> {
    let kind = match normalize_option(value).as_str() {
        "none" => ModuleKind::None,
        "commonjs" => ModuleKind::CommonJs,
        "amd" => ModuleKind::Amd,
        "umd" => ModuleKind::Umd,
        "system" => ModuleKind::System,
        "es6" | "es2015" | "es2020" | "es2022" | "esnext" => ModuleKind::EsModule,
        "node16" => ModuleKind::Node16,
        "nodenext" => ModuleKind::NodeNext,
        "preserve" => ModuleKind::Preserve,
        _ => bail!("unsupported compilerOptions.module '{}'", value),
    };
    Ok(kind)
}

fn parse_module_resolution(value: &str) -> Result<ModuleResolutionKind> {
    let resolution = match normalize_option(value).as_str() {
        "classic" => ModuleResolutionKind::Classic,
        "node" | "node10" => ModuleResolutionKind::Node10,
        "node16" => ModuleResolutionKind::Node16,
        "nodenext" => ModuleResolutionKind::NodeNext,
        "bundler" => ModuleResolutionKind::Bundler,
        _ => bail!("unsupported compilerOptions.moduleResolution '{}'", value),
    };
    Ok(resolution)
}

fn normalize_option(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !(*ch == '-' || *ch == '_' || ch.is_whitespace()))
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Drop `//` and `/* */` comments and trailing commas, leaving string
/// literals intact.
fn strip_jsonc(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' => {
                out.push(ch);
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    out.push(c);
                    i += 1;
                    if c == '\\' {
                        if let Some(&escaped) = chars.get(i) {
                            out.push(escaped);
                            i += 1;
                        }
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i += 2;
            }
            ',' => {
                let mut j = i + 1;
                // Comments between the comma and the closer still count as trailing.
                loop {
                    match chars.get(j) {
                        Some(c) if c.is_whitespace() => j += 1,
                        Some('/') if chars.get(j + 1) == Some(&'/') => {
                            while j < chars.len() && chars[j] != '\n' {
                                j += 1;
                            }
                        }
                        Some('/') if chars.get(j + 1) == Some(&'*') => {
                            j += 2;
                            while j < chars.len()
                                && !(chars[j] == '*' && chars.get(j + 1) == Some(&'/'))
                            {
                                j += 1;
                            }
                            j += 2;
                        }
                        _ => break,
                    }
                }
                if !matches!(chars.get(j), Some('}') | Some(']')) {
                    out.push(ch);
                }
                i += 1;
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolution_is_node10() {
        let options = CompilerOptions::default();
        assert_eq!(
            options.effective_module_resolution(),
            ModuleResolutionKind::Node10
        );
    }

    #[test]
    fn test_resolution_defaults_follow_module_kind() {
        let cases = [
            ("commonjs", ModuleResolutionKind::Node10),
            ("node16", ModuleResolutionKind::Node16),
            ("NodeNext", ModuleResolutionKind::NodeNext),
            ("preserve", ModuleResolutionKind::Bundler),
            ("esnext", ModuleResolutionKind::Classic),
            ("amd", ModuleResolutionKind::Classic),
        ];
        for (module, expected) in cases {
            let raw = RawCompilerOptions {
                module: Some(module.to_string()),
                ..Default::default()
            };
            let options = resolve_compiler_options(Some(&raw)).unwrap();
            assert_eq!(
                options.effective_module_resolution(),
                expected,
                "module {module}"
            );
        }
    }

    #[test]
    fn test_explicit_module_resolution_wins() {
        let raw = RawCompilerOptions {
            module: Some("esnext".to_string()),
            module_resolution: Some("Node".to_string()),
            ..Default::default()
        };
        let options = resolve_compiler_options(Some(&raw)).unwrap();
        assert_eq!(
            options.effective_module_resolution(),
            ModuleResolutionKind::Node10
        );
    }

    #[test]
    fn test_unknown_module_resolution_is_rejected() {
        let raw = RawCompilerOptions {
            module_resolution: Some("webpack".to_string()),
            ..Default::default()
        };
        let err = resolve_compiler_options(Some(&raw)).unwrap_err();
        assert!(err.to_string().contains("webpack"));
    }

    #[test]
    fn test_parse_tsconfig_with_comments_and_trailing_commas() {
        let source = r#"{
            // line comment
            "compilerOptions": {
                /* block */ "moduleResolution": "bundler",
                "allowJs": "true",
                "resolveJsonModule": true, // trailing
            },
        }"#;
        let config = parse_tsconfig(source).unwrap();
        let options = resolve_compiler_options(config.compiler_options.as_ref()).unwrap();
        assert_eq!(
            options.module_resolution,
            Some(ModuleResolutionKind::Bundler)
        );
        assert!(options.allow_js);
        assert!(options.resolve_json_module);
    }

    #[test]
    fn test_strip_jsonc_keeps_comment_markers_inside_strings() {
        let stripped = strip_jsonc(r#"{"a": "http://x/*y*/", "b": "c\"//",}"#);
        assert_eq!(stripped, r#"{"a": "http://x/*y*/", "b": "c\"//"}"#);
    }

    #[test]
    fn test_invalid_bool_string_is_rejected() {
        let result = parse_tsconfig(r#"{"compilerOptions": {"allowJs": "maybe"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_tsconfig_follows_extends() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.json"),
            r#"{"compilerOptions": {"moduleResolution": "node16", "allowJs": true}}"#,
        )
        .unwrap();
        let child = dir.path().join("tsconfig.json");
        std::fs::write(
            &child,
            r#"{"extends": "./base", "compilerOptions": {"moduleResolution": "classic"}}"#,
        )
        .unwrap();

        let options = load_compiler_options(&child).unwrap();
        assert_eq!(
            options.module_resolution,
            Some(ModuleResolutionKind::Classic)
        );
        assert!(options.allow_js);
    }

    #[test]
    fn test_load_tsconfig_detects_extends_cycle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"extends": "./b.json"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"extends": "./a.json"}"#).unwrap();

        let err = load_tsconfig(&dir.path().join("a.json")).unwrap_err();
        assert!(format!("{err:#}").contains("cycle"));
    }

    #[test]
    fn test_missing_tsconfig_reports_path() {
        let err = load_tsconfig(Path::new("/definitely/not/here/tsconfig.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read tsconfig"));
    }
}
