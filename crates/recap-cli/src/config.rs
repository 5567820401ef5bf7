//! Options loading.
//!
//! Options come from, in increasing precedence: built-in defaults, the YAML
//! options document, `RECAP_*` environment variables and command-line
//! flags. Nested keys use a double underscore (`RECAP_ENCODING__CRF=20`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::{debug, info};

use recap_models::{ClipSelectionMethod, RecapOptions};

use crate::error::{RecapError, RecapResult};

/// Options document read when `--options` is not given.
pub const DEFAULT_OPTIONS_FILE: &str = "options.yaml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "RECAP";

/// Load options from `path` (if it exists) and the process environment.
pub fn load_options(path: &Path) -> RecapResult<RecapOptions> {
    load_options_with_env(path, None)
}

/// Load options with an explicit environment map instead of the process
/// environment.
pub fn load_options_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
) -> RecapResult<RecapOptions> {
    if path.is_file() {
        info!(path = %path.display(), "Loading options");
    } else {
        info!(path = %path.display(), "Options file not found, using defaults");
    }

    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(env);

    let options: RecapOptions = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml).required(false))
        .add_source(environment)
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| RecapError::config(format!("{}: {}", path.display(), e)))?;

    debug!(?options, "Options loaded");
    Ok(options)
}

/// Command-line overrides applied on top of the loaded options.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub video_data_file: Option<PathBuf>,
    pub video_directory: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub clip_selection_method: Option<ClipSelectionMethod>,
    pub clip_length: Option<u32>,
}

impl CliOverrides {
    pub fn apply(self, options: &mut RecapOptions) {
        if let Some(path) = self.video_data_file {
            options.video_data_file = path;
        }
        if let Some(dir) = self.video_directory {
            options.video_directory = dir;
        }
        if let Some(path) = self.output_file {
            options.output_file = path;
        }
        if let Some(method) = self.clip_selection_method {
            options.clip_selection_method = method;
        }
        if let Some(length) = self.clip_length {
            options.clip_length = length;
        }
    }
}

/// Pretty-printed JSON schema of the options document.
pub fn options_schema() -> RecapResult<String> {
    let schema = schemars::schema_for!(RecapOptions);
    serde_json::to_string_pretty(&schema)
        .map_err(|e| RecapError::config(format!("Failed to serialize options schema: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_models::SubtitleAlignment;
    use tempfile::TempDir;

    fn no_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let options = load_options_with_env(&dir.path().join("options.yaml"), no_env()).unwrap();
        assert_eq!(options, RecapOptions::default());
    }

    #[test]
    fn test_yaml_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.yaml");
        std::fs::write(
            &path,
            "clip_selection_method: manual\n\
             clip_length: 20\n\
             sub_alignment: center\n\
             output_file: out/summer.mp4\n\
             encoding:\n  crf: 23\n",
        )
        .unwrap();

        let options = load_options_with_env(&path, no_env()).unwrap();
        assert_eq!(options.clip_selection_method, ClipSelectionMethod::Manual);
        assert_eq!(options.clip_length, 20);
        assert_eq!(options.sub_alignment, SubtitleAlignment::Center);
        assert_eq!(options.output_file, PathBuf::from("out/summer.mp4"));
        assert_eq!(options.encoding.crf, 23);
        // Unset keys keep their defaults
        assert_eq!(options.encoding.codec, "libx264");
        assert_eq!(options.sub_font_size, 50);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.yaml");
        std::fs::write(&path, "clip_length: 20\n").unwrap();

        let env = config::Map::from([
            ("RECAP_CLIP_LENGTH".to_string(), "12".to_string()),
            ("RECAP_INCLUDE_INTRO".to_string(), "true".to_string()),
            ("RECAP_ENCODING__PRESET".to_string(), "slow".to_string()),
        ]);
        let options = load_options_with_env(&path, Some(env)).unwrap();

        assert_eq!(options.clip_length, 12);
        assert!(options.include_intro);
        assert_eq!(options.encoding.preset, "slow");
    }

    #[test]
    fn test_invalid_alignment_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.yaml");
        std::fs::write(&path, "sub_alignment: middle\n").unwrap();

        assert!(matches!(
            load_options_with_env(&path, no_env()),
            Err(RecapError::Config(_))
        ));
    }

    #[test]
    fn test_cli_overrides() {
        let mut options = RecapOptions::default();
        CliOverrides {
            output_file: Some(PathBuf::from("final.mp4")),
            clip_selection_method: Some(ClipSelectionMethod::Manual),
            ..Default::default()
        }
        .apply(&mut options);

        assert_eq!(options.output_file, PathBuf::from("final.mp4"));
        assert_eq!(options.clip_selection_method, ClipSelectionMethod::Manual);
        assert_eq!(options.clip_length, 15);
    }

    #[test]
    fn test_schema_lists_keys() {
        let schema = options_schema().unwrap();
        assert!(schema.contains("clip_selection_method"));
        assert!(schema.contains("intro_image_duration"));
    }
}
