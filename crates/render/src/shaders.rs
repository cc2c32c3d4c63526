/// WGSL shader for lit scene entities. Object constants sit at group 0,
/// light constants at group 1, matching the bind groups registered by
/// `build_scene_renderable`.
pub const SCENE_SHADER: &str = r#"
struct ObjectConstants {
    world_view: mat4x4<f32>,
    proj: mat4x4<f32>,
    model: mat4x4<f32>,
};

struct LightConstants {
    position: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> object: ObjectConstants;

@group(1) @binding(0)
var<uniform> light: LightConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let view_pos = object.world_view * vec4<f32>(vertex.position, 1.0);
    let world_normal = (object.model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = object.proj * view_pos;
    out.world_normal = normalize(world_normal);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(light.position.xyz);
    let ambient = 0.25;
    let diffuse = max(dot(in.world_normal, light_dir), 0.0);
    let lighting = ambient + diffuse * 0.75;
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;

/// WGSL shader for the gradient skybox. The vertex position doubles as
/// the view direction; `clip.xyww` pins the sky to the far plane.
pub const SKY_SHADER: &str = r#"
struct SkyConstants {
    proj_view: mat4x4<f32>,
};

struct SkyPalette {
    horizon: vec4<f32>,
    zenith: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> sky: SkyConstants;

@group(1) @binding(0)
var<uniform> palette: SkyPalette;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>,
          @location(1) normal: vec3<f32>,
          @location(2) color: vec4<f32>) -> SkyOutput {
    let clip = sky.proj_view * vec4<f32>(position, 1.0);

    var out: SkyOutput;
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let dir = normalize(in.direction);
    let t = clamp(dir.y * 0.5 + 0.5, 0.0, 1.0);
    return mix(palette.horizon, palette.zenith, t);
}
"#;
