use naga::ShaderStage;

use super::{ShaderProfile, compile, compile_custom};
use crate::error::ShaderError;

const HEADER: &str = "
struct CustomConstants {
    time: f32,
    scale: f32,
    resolution: vec2<f32>,
    background: vec4<f32>,
}

@group(0) @binding(0) var<uniform> constants: CustomConstants;
@group(0) @binding(1) var shader_texture: texture_2d<f32>;
@group(0) @binding(2) var shader_sampler: sampler;
";

fn fragment(body: &str) -> String {
    format!(
        "{HEADER}
@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {{
{body}
}}
"
    )
}

fn compile_fragment(source: String) -> Result<super::CompiledShader, ShaderError> {
    compile("test", source, "fs_main", ShaderStage::Fragment, ShaderProfile::Full)
}

#[test]
fn time_free_shader_does_not_need_continuous_redraw() {
    let shader = compile_fragment(fragment(
        "    let c = textureSample(shader_texture, shader_sampler, uv);
    return vec4<f32>(c.rgb * constants.scale, c.a);",
    ))
    .expect("compile");
    assert!(!shader.requires_continuous_redraw());
}

#[test]
fn shader_reading_time_needs_continuous_redraw() {
    let shader = compile_fragment(fragment(
        "    let c = textureSample(shader_texture, shader_sampler, uv);
    return vec4<f32>(c.rgb * sin(constants.time), c.a);",
    ))
    .expect("compile");
    assert!(shader.requires_continuous_redraw());
}

#[test]
fn time_read_in_helper_function_counts() {
    let source = format!(
        "{HEADER}
fn pulse() -> f32 {{
    return 0.5 + 0.5 * sin(constants.time);
}}

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {{
    return textureSample(shader_texture, shader_sampler, uv) * pulse();
}}
"
    );
    assert!(compile_fragment(source).expect("compile").requires_continuous_redraw());
}

#[test]
fn whole_struct_load_counts_as_time_read() {
    let shader = compile_fragment(fragment(
        "    let c = constants;
    return vec4<f32>(c.resolution, 0.0, 1.0);",
    ))
    .expect("compile");
    assert!(shader.requires_continuous_redraw());
}

#[test]
fn missing_time_uniform_is_conservative() {
    let source = "
@group(0) @binding(1) var shader_texture: texture_2d<f32>;
@group(0) @binding(2) var shader_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(shader_texture, shader_sampler, uv);
}
";
    let shader = compile_fragment(source.to_owned()).expect("compile");
    assert!(shader.requires_continuous_redraw());
}

#[test]
fn pinned_answer_wins_over_reflection() {
    let shader = compile_fragment(fragment(
        "    return vec4<f32>(constants.time);",
    ))
    .expect("compile")
    .with_continuous_redraw(false);
    assert!(!shader.requires_continuous_redraw());
}

#[test]
fn syntax_error_is_a_parse_error() {
    let err = compile_fragment(fragment("    return vec4<f32>(1.0")).unwrap_err();
    assert!(matches!(err, ShaderError::Parse(_)), "{err:?}");
}

#[test]
fn type_error_is_a_validation_or_parse_error() {
    let err = compile_fragment(fragment("    return 1.0;")).unwrap_err();
    assert!(
        matches!(err, ShaderError::Parse(_) | ShaderError::Validation(_)),
        "{err:?}"
    );
}

#[test]
fn wrong_entry_point_is_reported() {
    let source = fragment("    return vec4<f32>(0.0);").replace("fs_main", "main");
    let err = compile_fragment(source).unwrap_err();
    assert!(matches!(err, ShaderError::MissingEntryPoint("fs_main")));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = super::compile_file(
        std::path::Path::new("/nonexistent/shader.wgsl"),
        "fs_main",
        ShaderStage::Fragment,
        ShaderProfile::Full,
    )
    .unwrap_err();
    assert!(matches!(err, ShaderError::Io { .. }));
}

fn compile_custom_fragment(source: String) -> Result<super::CompiledShader, ShaderError> {
    compile_custom("test", source, ShaderProfile::Full)
}

#[test]
fn custom_shader_fitting_the_pipeline_is_accepted() {
    let shader = compile_custom_fragment(fragment(
        "    return textureSample(shader_texture, shader_sampler, uv);",
    ))
    .expect("compile");
    assert!(!shader.requires_continuous_redraw());
}

#[test]
fn custom_shader_may_take_position_in_an_input_struct() {
    let source = format!(
        "{HEADER}
struct Input {{
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}}

@fragment
fn fs_main(input: Input) -> @location(0) vec4<f32> {{
    return textureSample(shader_texture, shader_sampler, input.uv);
}}
"
    );
    compile_custom_fragment(source).expect("compile");
}

#[test]
fn custom_shader_with_unknown_binding_is_rejected() {
    let source = format!(
        "{HEADER}
@group(0) @binding(7) var<storage> extra: array<f32>;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {{
    return textureSample(shader_texture, shader_sampler, uv) * extra[0];
}}
"
    );
    let err = compile_custom_fragment(source).unwrap_err();
    assert!(matches!(err, ShaderError::Interface(_)), "{err:?}");
}

#[test]
fn custom_shader_reading_missing_varying_is_rejected() {
    let source = format!(
        "{HEADER}
@fragment
fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {{
    return textureSample(shader_texture, shader_sampler, uv);
}}
"
    );
    let err = compile_custom_fragment(source).unwrap_err();
    assert!(matches!(err, ShaderError::Interface(_)), "{err:?}");
}

#[test]
fn custom_shader_with_oversized_uniform_is_rejected() {
    let source = "
struct Constants {
    time: f32,
    extra: array<vec4<f32>, 4>,
}

@group(0) @binding(0) var<uniform> constants: Constants;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return constants.extra[0];
}
";
    let err = compile_custom_fragment(source.to_owned()).unwrap_err();
    assert!(matches!(err, ShaderError::Interface(_)), "{err:?}");
}

#[test]
fn custom_shader_must_write_rgba() {
    let source = format!(
        "{HEADER}
@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec3<f32> {{
    return textureSample(shader_texture, shader_sampler, uv).rgb;
}}
"
    );
    let err = compile_custom_fragment(source).unwrap_err();
    assert!(matches!(err, ShaderError::Interface(_)), "{err:?}");
}

#[test]
fn features_the_device_never_enables_are_rejected() {
    let source = "
enable f16;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    let h: f16 = 1.0h;
    return vec4<f32>(f32(h));
}
";
    let err = compile_custom_fragment(source.to_owned()).unwrap_err();
    assert!(
        matches!(err, ShaderError::Parse(_) | ShaderError::Validation(_)),
        "{err:?}"
    );
}
