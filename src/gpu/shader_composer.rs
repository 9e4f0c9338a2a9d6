use std::borrow::Cow;
use std::collections::HashMap;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderDefValue,
    ShaderLanguage, ShaderType,
};

use crate::error::IllustrateError;

/// Shader def enabling the codec-packed G-buffer decode path.
pub const PACKED_GBUFFER_DEF: &str = "PACKED_GBUFFER";

/// Every composable shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shader {
    /// Instanced sphere G-buffer passes.
    Spheres,
    /// Screen-space composite.
    Composite,
}

impl Shader {
    /// Every program, for composition tests.
    pub const ALL: [Self; 2] = [Self::Spheres, Self::Composite];

    /// WGSL source.
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::Spheres => {
                include_str!("../../assets/shaders/raster/spheres.wgsl")
            }
            Self::Composite => {
                include_str!("../../assets/shaders/screen/composite.wgsl")
            }
        }
    }

    /// Path used in composer diagnostics.
    #[must_use]
    pub const fn file_path(self) -> &'static str {
        match self {
            Self::Spheres => "raster/spheres.wgsl",
            Self::Composite => "screen/composite.wgsl",
        }
    }

    /// Debug label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spheres => "Spheres Shader",
            Self::Composite => "Composite Shader",
        }
    }
}

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Shared WGSL modules are registered at construction. Programs use
/// `#import illustrate::module::{...}` to pull them in; the composer produces
/// `naga::Module` IR directly.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module: source and the path reported in diagnostics.
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

const MODULES: &[ModuleDef] = &[ModuleDef {
    source: include_str!("../../assets/shaders/modules/codec.wgsl"),
    file_path: "modules/codec.wgsl",
}];

impl ShaderComposer {
    /// Register every shared module.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::ProgramBuild`] if a module fails to
    /// parse.
    pub fn new() -> Result<Self, IllustrateError> {
        let mut composer = Self {
            composer: Composer::default(),
        };
        for m in MODULES {
            composer.register(m)?;
        }
        Ok(composer)
    }

    fn register(&mut self, m: &ModuleDef) -> Result<(), IllustrateError> {
        self.composer
            .add_composable_module(ComposableModuleDescriptor {
                source: m.source,
                file_path: m.file_path,
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .map(|_| ())
            .map_err(|e| IllustrateError::ProgramBuild {
                label: m.file_path.to_owned(),
                diagnostic: e.emit_to_string(&self.composer),
            })
    }

    /// Compose `shader` with the given boolean shader defs into naga IR.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::ProgramBuild`] carrying the composer's
    /// diagnostic.
    pub fn compose_naga(
        &mut self,
        shader: Shader,
        defs: &[&str],
    ) -> Result<naga::Module, IllustrateError> {
        self.compose_source(shader.source(), shader.file_path(), shader.label(), defs)
    }

    fn compose_source(
        &mut self,
        source: &str,
        file_path: &str,
        label: &str,
        defs: &[&str],
    ) -> Result<naga::Module, IllustrateError> {
        let shader_defs: HashMap<String, ShaderDefValue> = defs
            .iter()
            .map(|d| ((*d).to_owned(), ShaderDefValue::Bool(true)))
            .collect();
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                shader_defs,
                ..Default::default()
            })
            .map_err(|e| IllustrateError::ProgramBuild {
                label: label.to_owned(),
                diagnostic: e.emit_to_string(&self.composer),
            })
    }

    /// Compose `shader` into a `wgpu::ShaderModule`.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::ProgramBuild`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        shader: Shader,
        defs: &[&str],
    ) -> Result<wgpu::ShaderModule, IllustrateError> {
        let module = self.compose_naga(shader, defs)?;
        log::debug!("composed {} with defs {defs:?}", shader.label());
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(shader.label()),
            source: wgpu::ShaderSource::Naga(Cow::Owned(module)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::schedule::PassKind;

    fn has_entry(module: &naga::Module, name: &str) -> bool {
        module.entry_points.iter().any(|e| e.name == name)
    }

    #[test]
    fn all_shaders_compose_with_and_without_packing() {
        let mut composer = ShaderComposer::new().unwrap();
        for shader in Shader::ALL {
            for defs in [&[][..], &[PACKED_GBUFFER_DEF][..]] {
                if let Err(e) = composer.compose_naga(shader, defs) {
                    panic!("{} failed to compose: {e}", shader.label());
                }
            }
        }
    }

    #[test]
    fn sphere_shader_exposes_every_pass_entry() {
        let mut composer = ShaderComposer::new().unwrap();
        let module = composer.compose_naga(Shader::Spheres, &[]).unwrap();
        assert!(has_entry(&module, "vs_main"));
        for pass in PassKind::ALL {
            assert!(has_entry(&module, pass.fragment_entry()), "{pass}");
        }
    }

    #[test]
    fn composed_modules_validate() {
        let mut composer = ShaderComposer::new().unwrap();
        for shader in Shader::ALL {
            let module = composer
                .compose_naga(shader, &[PACKED_GBUFFER_DEF])
                .unwrap();
            let mut validator = naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::default(),
            );
            if let Err(e) = validator.validate(&module) {
                panic!("{} failed validation: {e:?}", shader.label());
            }
        }
    }

    #[test]
    fn broken_program_reports_diagnostic_naming_its_file() {
        let mut composer = ShaderComposer::new().unwrap();
        let err = composer
            .compose_source("fn broken( {", "raster/broken.wgsl", "Broken Shader", &[])
            .unwrap_err();
        let (label, diagnostic) = match err {
            IllustrateError::ProgramBuild { label, diagnostic } => (label, diagnostic),
            other => panic!("expected ProgramBuild, got {other}"),
        };
        assert_eq!(label, "Broken Shader");
        assert!(!diagnostic.trim().is_empty());
        assert!(diagnostic.contains("raster/broken.wgsl"), "{diagnostic}");

        // The composer stays usable after a failed program.
        assert!(composer.compose_naga(Shader::Composite, &[]).is_ok());
    }
}
