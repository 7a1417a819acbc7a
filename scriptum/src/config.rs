//! Run configuration (SPEC_FULL §10.3): CLI flags, then an optional
//! `scriptum.toml` project file discovered next to the input, then
//! built-in defaults — read with `toml` + `serde`, the way `perl-lsp`'s
//! `xtask` and `oxidized` read their own TOML config.

use crate::units;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "scriptum.toml";

/// The assembled run configuration a compile invocation ends up with.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory the standard library's `.pdfo` files are resolved against
    /// for `import`'s "far" search (§4.5, §6 "Search paths").
    pub stdlib_dir: PathBuf,
    /// Ceiling on macro-expansion recursion depth (§4.4).
    pub macro_recursion_limit: usize,
    /// Ceiling on placement retries before a `PlacementError` (§4.6
    /// "Failure semantics").
    pub placement_retry_budget: usize,
    /// Page size used when a document's page template sets none.
    pub default_page_size: (f32, f32),
    /// `(left, right, top, bottom)` margins used when a document's page
    /// template sets none.
    pub default_margins: (f32, f32, f32, f32),
    pub no_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            stdlib_dir: PathBuf::from("stdlib"),
            macro_recursion_limit: 256,
            placement_retry_budget: 64,
            default_page_size: units::LETTER,
            default_margins: (units::INCH, units::INCH, units::INCH, units::INCH),
            no_progress: false,
        }
    }
}

/// The on-disk shape of `scriptum.toml`: every field optional, so a partial
/// or absent file stays valid (§10.3: "`serde(default)` on every field").
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    stdlib_dir: Option<PathBuf>,
    macro_recursion_limit: Option<usize>,
    placement_retry_budget: Option<usize>,
    default_page_size: Option<(f32, f32)>,
    default_margins: Option<(f32, f32, f32, f32)>,
}

impl RunConfig {
    /// Resolves a `RunConfig` for compiling `input_path`: `scriptum.toml`
    /// next to the input file (if present) overrides built-in defaults,
    /// then the `-np` CLI flag overrides the progress setting (§10.3's
    /// priority order — CLI flags outrank the project file; this repo's
    /// concrete CLI, §6, exposes no flags for the other fields, so they
    /// only ever come from the file or the defaults).
    pub fn resolve(input_path: &Path, no_progress_flag: bool) -> std::io::Result<RunConfig> {
        let mut config = RunConfig::default();

        if let Some(dir) = input_path.parent() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                let text = std::fs::read_to_string(&candidate)?;
                let file: ConfigFile = toml::from_str(&text).unwrap_or_else(|e| {
                    tracing::warn!(path = %candidate.display(), error = %e, "ignoring malformed scriptum.toml");
                    ConfigFile::default()
                });
                config.apply(file);
            }
        }

        config.no_progress = config.no_progress || no_progress_flag;
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.stdlib_dir {
            self.stdlib_dir = v;
        }
        if let Some(v) = file.macro_recursion_limit {
            self.macro_recursion_limit = v;
        }
        if let Some(v) = file.placement_retry_budget {
            self.placement_retry_budget = v;
        }
        if let Some(v) = file.default_page_size {
            self.default_page_size = v;
        }
        if let Some(v) = file.default_margins {
            self.default_margins = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_config_file_yields_built_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.scrm");
        let config = RunConfig::resolve(&input, false).unwrap();
        assert_eq!(config.macro_recursion_limit, 256);
        assert_eq!(config.placement_retry_budget, 64);
        assert_eq!(config.default_page_size, units::LETTER);
    }

    #[test]
    fn config_file_overrides_defaults_and_partial_fields_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "placement_retry_budget = 10\n").unwrap();
        let input = dir.path().join("doc.scrm");
        let config = RunConfig::resolve(&input, false).unwrap();
        assert_eq!(config.placement_retry_budget, 10);
        assert_eq!(config.macro_recursion_limit, 256);
    }

    #[test]
    fn no_progress_flag_always_wins() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.scrm");
        let config = RunConfig::resolve(&input, true).unwrap();
        assert!(config.no_progress);
    }
}
