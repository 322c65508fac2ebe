//! Shaders shipped with the backend.

use std::path::Path;

use naga::ShaderStage;

use super::compile::{CompiledShader, ShaderProfile, compile, compile_custom, compile_file};
use crate::error::ShaderError;

pub const QUAD_WGSL: &str = include_str!("wgsl/quad.wgsl");
pub const CUSTOM_VS_WGSL: &str = include_str!("wgsl/custom_vs.wgsl");
pub const RETRO_WGSL: &str = include_str!("wgsl/retro.wgsl");

/// Entry points every custom pixel shader and the built-ins share.
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// The built-in shaders the device builds its fixed pipelines from.
#[derive(Debug, Clone)]
pub struct BuiltinShaders {
    /// Vertex and pixel stage of the quad pipeline (one module).
    pub quad: CompiledShader,
    /// Full-screen vertex stage for custom pixel shaders.
    pub custom_vs: CompiledShader,
}

/// One reloadable slot: which file it comes from and where the result goes.
pub struct ShaderSlot {
    pub file: &'static str,
    pub entry_point: &'static str,
    pub stage: ShaderStage,
    pub assign: fn(&mut BuiltinShaders, CompiledShader),
}

fn assign_quad(shaders: &mut BuiltinShaders, shader: CompiledShader) {
    shaders.quad = shader;
}

fn assign_custom_vs(shaders: &mut BuiltinShaders, shader: CompiledShader) {
    shaders.custom_vs = shader;
}

/// Built-in slots in reload order.
pub const SLOTS: &[ShaderSlot] = &[
    ShaderSlot {
        file: "quad.wgsl",
        entry_point: VERTEX_ENTRY,
        stage: ShaderStage::Vertex,
        assign: assign_quad,
    },
    ShaderSlot {
        file: "custom_vs.wgsl",
        entry_point: VERTEX_ENTRY,
        stage: ShaderStage::Vertex,
        assign: assign_custom_vs,
    },
];

impl BuiltinShaders {
    /// Compile the sources embedded in the binary.
    pub fn embedded(profile: ShaderProfile) -> Result<Self, ShaderError> {
        Ok(Self {
            quad: compile(
                "quad.wgsl",
                QUAD_WGSL.to_owned(),
                VERTEX_ENTRY,
                ShaderStage::Vertex,
                profile,
            )?,
            custom_vs: compile(
                "custom_vs.wgsl",
                CUSTOM_VS_WGSL.to_owned(),
                VERTEX_ENTRY,
                ShaderStage::Vertex,
                profile,
            )?,
        })
    }

    /// Recompile every slot from `dir`.
    ///
    /// All slots must compile; on the first failure the error is returned
    /// and nothing is replaced.
    pub fn load_dir(&self, dir: &Path, profile: ShaderProfile) -> Result<Self, ShaderError> {
        let mut next = self.clone();
        for slot in SLOTS {
            let shader = compile_file(&dir.join(slot.file), slot.entry_point, slot.stage, profile)?;
            (slot.assign)(&mut next, shader);
        }
        Ok(next)
    }
}

/// The retro terminal effect. Known not to animate.
pub fn retro(profile: ShaderProfile) -> Result<CompiledShader, ShaderError> {
    Ok(compile_custom("retro.wgsl", RETRO_WGSL.to_owned(), profile)?.with_continuous_redraw(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_shaders_compile() {
        let shaders = BuiltinShaders::embedded(ShaderProfile::Full).expect("built-ins compile");
        assert_eq!(shaders.quad.entry_point(), VERTEX_ENTRY);
        assert_eq!(shaders.custom_vs.label(), "custom_vs.wgsl");
    }

    #[test]
    fn retro_is_not_continuous() {
        let shader = retro(ShaderProfile::Full).expect("retro compiles");
        assert!(!shader.requires_continuous_redraw());
        assert_eq!(shader.entry_point(), FRAGMENT_ENTRY);
    }

    #[test]
    fn slots_cover_every_builtin_file() {
        let files: Vec<_> = SLOTS.iter().map(|s| s.file).collect();
        assert_eq!(files, ["quad.wgsl", "custom_vs.wgsl"]);
    }

    #[test]
    fn reload_from_source_dir() {
        let embedded = BuiltinShaders::embedded(ShaderProfile::Full).expect("compile");
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/shader/wgsl");
        let reloaded = embedded.load_dir(&dir, ShaderProfile::Full).expect("reload");
        assert_eq!(reloaded.quad.source(), QUAD_WGSL);
    }

    #[test]
    fn reload_is_all_or_nothing() {
        let embedded = BuiltinShaders::embedded(ShaderProfile::Full).expect("compile");
        let err = embedded
            .load_dir(Path::new("/nonexistent"), ShaderProfile::Full)
            .unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
    }
}
