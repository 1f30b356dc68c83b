//! `wgpu` execution of the filter chain: one fullscreen pass per filter, ping-ponging between two
//! textures, then a padded-row readback.

use std::collections::HashMap;

use crate::effects::filter::FilterKind;
use crate::foundation::error::{RenderError, RenderResult};

const PARAMS_SIZE: u64 = 32;

const SHADER: &str = r#"
struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) uv: vec2<f32>,
};

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
  var p = array<vec2<f32>, 3>(
    vec2<f32>(-1.0, -1.0),
    vec2<f32>( 3.0, -1.0),
    vec2<f32>(-1.0,  3.0),
  );
  let pos = p[vi];
  var o: VsOut;
  o.pos = vec4<f32>(pos, 0.0, 1.0);
  o.uv = vec2<f32>((pos.x + 1.0) * 0.5, (1.0 - pos.y) * 0.5);
  return o;
}

struct Params {
  p: vec4<f32>,
  texel: vec4<f32>,
};

@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@fragment
fn fs_chromakey(in: VsOut) -> @location(0) vec4<f32> {
  let c = textureSample(t_src, s_src, in.uv);
  if (distance(c.rgb, params.p.xyz) < params.p.w) {
    return vec4<f32>(0.0, 0.0, 0.0, 0.0);
  }
  return c;
}

@fragment
fn fs_blur(in: VsOut) -> @location(0) vec4<f32> {
  var sum = vec4<f32>(0.0);
  for (var i = -1; i <= 1; i++) {
    for (var j = -1; j <= 1; j++) {
      let offset = vec2<f32>(f32(i), f32(j)) * params.texel.xy * params.p.x;
      sum += textureSample(t_src, s_src, in.uv + offset);
    }
  }
  return sum / 9.0;
}

fn rotate2d(angle: f32) -> mat2x2<f32> {
  let s = sin(angle);
  let c = cos(angle);
  return mat2x2<f32>(c, -s, s, c);
}

@fragment
fn fs_radialblur(in: VsOut) -> @location(0) vec4<f32> {
  let power = params.p.x;
  let center = params.p.yz;
  var uv = in.uv;
  var dir = sin(length(uv - center) / (0.005 + power * 5.0));
  dir = smoothstep(-0.3, 0.3, dir) - 0.5;
  let shift = center - uv;
  var color = vec4<f32>(0.0);
  for (var i = 0; i < 66; i++) {
    let fi = f32(i);
    uv += fi / 66.0 * shift * 0.01;
    uv -= center;
    uv = uv * rotate2d(dir * power * fi);
    uv += center;
    color += textureSample(t_src, s_src, uv) / (66.0 + fi);
  }
  return clamp(color * 1.5, vec4<f32>(0.0), vec4<f32>(1.0));
}
"#;

/// Device, shared layout objects and one pipeline per filter kind.
pub(crate) struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<&'static str, wgpu::RenderPipeline>,
}

/// Textures, parameter buffers and bind groups of one filtered element.
pub(crate) struct GpuFilterResources {
    width: u32,
    height: u32,
    textures: [wgpu::Texture; 2],
    params: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
    readback: wgpu::Buffer,
    bytes_per_row: u32,
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

impl GpuContext {
    pub(crate) fn new() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                RenderError::filter("no gpu adapter available")
            }
            other => RenderError::filter(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("offscreen_filters"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| RenderError::filter(format!("wgpu request_device failed: {e:?}")))?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("offscreen_filter_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("offscreen_filter_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(PARAMS_SIZE),
                    },
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("offscreen_filter_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("offscreen_filter_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        for (name, entry) in [
            ("chromakey", "fs_chromakey"),
            ("blur", "fs_blur"),
            ("radialblur", "fs_radialblur"),
        ] {
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(name),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            pipelines.insert(name, pipeline);
        }

        tracing::info!(adapter = ?adapter.get_info().name, "gpu filter backend ready");
        Ok(Self {
            device,
            queue,
            sampler,
            bind_group_layout,
            pipelines,
        })
    }

    /// Allocate the resources for a `width` x `height` source and a chain of `passes` filters.
    pub(crate) fn create_resources(
        &self,
        width: u32,
        height: u32,
        passes: usize,
    ) -> RenderResult<GpuFilterResources> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > limit || height > limit {
            return Err(RenderError::filter(format!(
                "filter surface {width}x{height} unsupported (limit {limit})"
            )));
        }
        let make_texture = |label: &'static str| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        };
        let textures = [
            make_texture("offscreen_filter_ping"),
            make_texture("offscreen_filter_pong"),
        ];

        let mut params = Vec::with_capacity(passes);
        let mut bind_groups = Vec::with_capacity(passes);
        for pass in 0..passes {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("offscreen_filter_params"),
                size: PARAMS_SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let view = textures[pass % 2].create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("offscreen_filter_bg"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            });
            params.push(buffer);
            bind_groups.push(bind_group);
        }

        let bytes_per_row = align_to(width * 4, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen_filter_readback"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(GpuFilterResources {
            width,
            height,
            textures,
            params,
            bind_groups,
            readback,
            bytes_per_row,
        })
    }

    /// Upload straight-alpha `rgba`, run `chain`, and read the result back.
    pub(crate) fn run(
        &self,
        res: &GpuFilterResources,
        chain: &[FilterKind],
        rgba: &[u8],
    ) -> RenderResult<Vec<u8>> {
        if chain.len() != res.bind_groups.len() {
            return Err(RenderError::filter("filter chain length changed"));
        }
        let extent = wgpu::Extent3d {
            width: res.width,
            height: res.height,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &res.textures[0],
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(res.width * 4),
                rows_per_image: Some(res.height),
            },
            extent,
        );

        let texel = [1.0 / res.width as f32, 1.0 / res.height as f32, 0.0, 0.0];
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offscreen_filter_encoder"),
            });
        for (pass, kind) in chain.iter().enumerate() {
            let pipeline = self
                .pipelines
                .get(kind.name())
                .ok_or_else(|| RenderError::filter(format!("no pipeline for {}", kind.name())))?;
            let p = kind.params();
            let words = [p[0], p[1], p[2], p[3], texel[0], texel[1], texel[2], texel[3]];
            let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
            self.queue.write_buffer(&res.params[pass], 0, &bytes);

            let target = res.textures[(pass + 1) % 2]
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("offscreen_filter_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rp.set_pipeline(pipeline);
            rp.set_bind_group(0, &res.bind_groups[pass], &[]);
            rp.draw(0..3, 0..1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &res.textures[chain.len() % 2],
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &res.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(res.bytes_per_row),
                    rows_per_image: Some(res.height),
                },
            },
            extent,
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = res.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::filter(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| RenderError::filter("readback channel closed"))?
            .map_err(|e| RenderError::filter(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let row_bytes = res.width as usize * 4;
        let mut out = Vec::with_capacity(row_bytes * res.height as usize);
        for row in 0..res.height as usize {
            let start = row * res.bytes_per_row as usize;
            out.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        res.readback.unmap();
        Ok(out)
    }
}
