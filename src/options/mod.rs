//! Runtime options with TOML preset support.
//!
//! Pipeline layout, post-processing, camera and world settings live here.
//! Every section uses `#[serde(default)]` so a preset only needs the keys it
//! changes.

mod camera;
mod pipeline;
mod post_processing;
mod world;

use std::path::Path;

pub use camera::CameraOptions;
pub use pipeline::PipelineOptions;
pub use post_processing::{AoKernel, PostProcessingOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use world::WorldOptions;

use crate::error::IllustrateError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// G-buffer layout and mesh detail.
    pub pipeline: PipelineOptions,
    /// Ambient occlusion and outline parameters.
    pub post_processing: PostProcessingOptions,
    /// Initial view and input sensitivity.
    pub camera: CameraOptions,
    /// Background and fog.
    pub world: WorldOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::OptionsParse`] for malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, IllustrateError> {
        toml::from_str(content)
            .map_err(|e| IllustrateError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::Io`] if the file cannot be read, or
    /// [`IllustrateError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, IllustrateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), IllustrateError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| IllustrateError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(IllustrateError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::schedule::GBufferLayout;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[pipeline]
gbuffer_layout = "layered"

[post_processing]
ao_kernel = "dense"
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.pipeline.gbuffer_layout, GBufferLayout::Layered);
        assert_eq!(opts.post_processing.ao_kernel, AoKernel::Dense);
        // Everything else should be default
        assert_eq!(opts.pipeline.sphere_subdivisions, 2);
        assert_eq!(opts.post_processing.min_shadow, 0.3);
        assert_eq!(opts.camera.initial_zoom, -3.7);
    }

    #[test]
    fn malformed_toml_is_an_options_error() {
        let err = Options::from_toml("[pipeline\n").unwrap_err();
        assert!(matches!(err, IllustrateError::OptionsParse(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir()
            .join(format!("illustrate-options-{}", std::process::id()));
        let path = dir.join("preset.toml");
        let mut opts = Options::default();
        opts.world.fog_back = 0.4;
        opts.post_processing.residue_outline = true;
        opts.save(&path).unwrap();

        assert_eq!(Options::load(&path).unwrap(), opts);
        assert_eq!(Options::list_presets(&dir), vec!["preset".to_owned()]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        for section in ["pipeline", "post_processing", "camera", "world"] {
            assert!(props.contains_key(section), "missing {section}");
        }

        let effects = &props["post_processing"]["properties"];
        assert!(effects.get("ao_strength").is_some());
        assert!(effects.get("group_outline").is_some());
        assert!(effects.get("ao_bias").is_none());
        assert!(effects.get("depth_scale").is_none());
    }
}
