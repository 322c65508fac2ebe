//! WGSL compilation and reflection through naga.

use std::path::Path;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{
    AddressSpace, Binding, Expression, Function, Handle, ImageClass, ImageDimension, Module,
    Scalar, ScalarKind, ShaderStage, Type, TypeInner, VectorSize,
};

use super::builtin::FRAGMENT_ENTRY;
use crate::device::CustomConstBuffer;
use crate::error::ShaderError;

/// Shader feature level the adapter supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderProfile {
    /// Downlevel hardware: validate against the baseline capability set.
    Downlevel,
    Full,
}

impl ShaderProfile {
    /// What the device validates against. It is created without optional
    /// features, so only capabilities backed by downlevel flags remain.
    fn capabilities(self) -> Capabilities {
        match self {
            Self::Downlevel => Capabilities::empty(),
            Self::Full => {
                Capabilities::MULTISAMPLED_SHADING
                    | Capabilities::CUBE_ARRAY_TEXTURES
                    | Capabilities::SHADER_FLOAT16_IN_FLOAT32
            }
        }
    }
}

/// A validated WGSL module plus what reflection learned about it.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    label: String,
    source: String,
    entry_point: &'static str,
    /// `None` when the time uniform could not be located.
    reads_time: Option<bool>,
    continuous_override: Option<bool>,
}

impl CompiledShader {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &'static str {
        self.entry_point
    }

    /// Whether the shader's output can change between frames with
    /// identical content. Defaults to `true` unless reflection proves the
    /// time uniform is never read.
    pub fn requires_continuous_redraw(&self) -> bool {
        self.continuous_override
            .unwrap_or_else(|| self.reads_time.unwrap_or(true))
    }

    /// Pin the continuous redraw answer, for shaders known not to animate.
    pub fn with_continuous_redraw(mut self, continuous: bool) -> Self {
        self.continuous_override = Some(continuous);
        self
    }
}

/// Parse and validate WGSL, requiring an entry point `entry_point` of
/// `stage`.
pub fn compile(
    label: &str,
    source: String,
    entry_point: &'static str,
    stage: ShaderStage,
    profile: ShaderProfile,
) -> Result<CompiledShader, ShaderError> {
    let module = parse(&source, profile)?;
    finish(label, source, &module, entry_point, stage)
}

/// Read a WGSL file and [`compile`] it.
pub fn compile_file(
    path: &Path,
    entry_point: &'static str,
    stage: ShaderStage,
    profile: ShaderProfile,
) -> Result<CompiledShader, ShaderError> {
    let source = read_source(path)?;
    compile(&path.display().to_string(), source, entry_point, stage, profile)
}

/// Compile a custom pixel shader.
///
/// On top of [`compile`], the module must fit the fixed custom shader
/// pipeline: bindings 0 (uniform), 1 (2D float texture) and 2 (filtering
/// sampler) of group 0 only, `@location(0) vec2<f32>` as the only varying
/// input, and a single `@location(0) vec4<f32>` output.
pub fn compile_custom(
    label: &str,
    source: String,
    profile: ShaderProfile,
) -> Result<CompiledShader, ShaderError> {
    let module = parse(&source, profile)?;
    let shader = finish(label, source, &module, FRAGMENT_ENTRY, ShaderStage::Fragment)?;
    check_custom_interface(&module)?;
    Ok(shader)
}

/// Read a WGSL file and [`compile_custom`] it.
pub fn compile_custom_file(path: &Path, profile: ShaderProfile) -> Result<CompiledShader, ShaderError> {
    let source = read_source(path)?;
    compile_custom(&path.display().to_string(), source, profile)
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(source: &str, profile: ShaderProfile) -> Result<Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderError::Parse(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), profile.capabilities())
        .validate(&module)
        .map_err(|e| ShaderError::Validation(e.emit_to_string(source)))?;
    Ok(module)
}

fn finish(
    label: &str,
    source: String,
    module: &Module,
    entry_point: &'static str,
    stage: ShaderStage,
) -> Result<CompiledShader, ShaderError> {
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == stage)
    {
        return Err(ShaderError::MissingEntryPoint(entry_point));
    }

    Ok(CompiledShader {
        label: label.to_owned(),
        source,
        entry_point,
        reads_time: reads_time_uniform(module),
        continuous_override: None,
    })
}

fn check_custom_interface(module: &Module) -> Result<(), ShaderError> {
    let max_uniform = size_of::<CustomConstBuffer>() as u32;

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        let inner = &module.types[var.ty].inner;
        let fits = binding.group == 0
            && match binding.binding {
                0 => {
                    var.space == AddressSpace::Uniform
                        && inner
                            .try_size(module.to_ctx())
                            .is_some_and(|size| size <= max_uniform)
                }
                1 => matches!(
                    inner,
                    TypeInner::Image {
                        dim: ImageDimension::D2,
                        arrayed: false,
                        class: ImageClass::Sampled {
                            kind: ScalarKind::Float,
                            multi: false,
                        },
                    }
                ),
                2 => matches!(inner, TypeInner::Sampler { comparison: false }),
                _ => false,
            };
        if !fits {
            return Err(ShaderError::Interface(format!(
                "`{}` at @group({}) @binding({}) has no matching slot",
                var.name.as_deref().unwrap_or("_"),
                binding.group,
                binding.binding,
            )));
        }
    }

    let Some(entry) = module
        .entry_points
        .iter()
        .find(|ep| ep.name == FRAGMENT_ENTRY && ep.stage == ShaderStage::Fragment)
    else {
        return Err(ShaderError::MissingEntryPoint(FRAGMENT_ENTRY));
    };

    for arg in &entry.function.arguments {
        for (location, ty) in locations(module, arg.ty, arg.binding.as_ref()) {
            if location != 0 || !is_f32_vector(module, ty, VectorSize::Bi) {
                return Err(ShaderError::Interface(format!(
                    "input @location({location}) is not the `vec2<f32>` uv at @location(0)"
                )));
            }
        }
    }

    let outputs = entry
        .function
        .result
        .as_ref()
        .map(|r| locations(module, r.ty, r.binding.as_ref()))
        .unwrap_or_default();
    match outputs.as_slice() {
        [(0, ty)] if is_f32_vector(module, *ty, VectorSize::Quad) => Ok(()),
        _ => Err(ShaderError::Interface(
            "output must be a single `vec4<f32>` at @location(0)".to_owned(),
        )),
    }
}

/// `@location` bindings of an entry point argument or result, looking
/// through one level of struct.
fn locations(module: &Module, ty: Handle<Type>, binding: Option<&Binding>) -> Vec<(u32, Handle<Type>)> {
    match binding {
        Some(&Binding::Location { location, .. }) => vec![(location, ty)],
        Some(Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| match m.binding {
                    Some(Binding::Location { location, .. }) => Some((location, m.ty)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn is_f32_vector(module: &Module, ty: Handle<Type>, size: VectorSize) -> bool {
    matches!(
        module.types[ty].inner,
        TypeInner::Vector { size: s, scalar } if s == size && scalar == Scalar::F32
    )
}

/// Whether any function reads the first member (`time`) of the uniform
/// struct at `@group(0) @binding(0)`.
///
/// Loading the whole struct counts as a read. Returns `None` if no such
/// uniform exists.
fn reads_time_uniform(module: &Module) -> Option<bool> {
    let (uniform, _) = module.global_variables.iter().find(|(_, var)| {
        var.space == AddressSpace::Uniform
            && var
                .binding
                .as_ref()
                .is_some_and(|b| b.group == 0 && b.binding == 0)
            && matches!(
                &module.types[var.ty].inner,
                TypeInner::Struct { members, .. } if !members.is_empty()
            )
    })?;

    let reads = |function: &Function| {
        function.expressions.iter().any(|(_, expr)| match *expr {
            Expression::AccessIndex { base, index: 0 } | Expression::Load { pointer: base } => {
                matches!(function.expressions[base], Expression::GlobalVariable(h) if h == uniform)
            }
            _ => false,
        })
    };

    let used = module.functions.iter().any(|(_, f)| reads(f))
        || module.entry_points.iter().any(|ep| reads(&ep.function));
    Some(used)
}

#[cfg(test)]
mod tests;
