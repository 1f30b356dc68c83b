use crate::animation::keyframe::{ResolvedTransform, resolve_overrides};
use crate::assets::color::parse_color;
use crate::assets::decode::gif_frame_index;
use crate::assets::store::AssetCache;
use crate::config::FilterBackend;
use crate::effects::filter::parse_chain;
use crate::effects::pipeline::FilterPipeline;
use crate::eval::visibility::{Layer, active_layers};
use crate::foundation::core::{Affine, BezPath, Canvas, FrameIndex, Point, Rgba8, Vec2};
use crate::foundation::error::{RenderError, RenderResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::render::cpu::{affine_to_cpu, bezpath_to_cpu, fill_pixmap, image_paint_from_premul};
use crate::render::frame::FrameRGBA;
use crate::scene::model::{
    ElementKind, ShapeProps, TextProps, Timeline, TimelineElement, VideoProps,
};
use crate::text::draw::{TextBox, TextStyle, draw_text};
use crate::text::engine::TextEngine;

/// Where a layer lands on the canvas this frame.
#[derive(Clone, Copy, Debug)]
struct Placement {
    /// Box center, rotation applied around it.
    center: Affine,
    /// Scaled box size.
    size: Vec2,
}

impl Placement {
    fn new(el_width: f64, el_height: f64, o: &ResolvedTransform, scale: f64) -> Self {
        let center = Vec2::new(o.x + el_width / 2.0, o.y + el_height / 2.0);
        Self {
            center: Affine::translate(center) * Affine::rotate(o.rotation_rad),
            size: Vec2::new(el_width * scale, el_height * scale),
        }
    }

    /// Maps `(0, 0)..(src_w, src_h)` onto the scaled box centered on the element.
    fn fit(&self, src_w: f64, src_h: f64) -> Affine {
        self.center
            * Affine::translate(-self.size / 2.0)
            * Affine::scale_non_uniform(self.size.x / src_w, self.size.y / src_h)
    }

    fn is_empty(&self) -> bool {
        !(self.size.x > 0.0 && self.size.y > 0.0)
    }
}

/// Draws the active layers of one frame onto a reusable raster surface.
pub(crate) struct FrameCompositor {
    canvas: Canvas,
    width: u16,
    height: u16,
    background: Rgba8,
    pixmap: vello_cpu::Pixmap,
    text: TextEngine,
    filters: FilterPipeline,
}

impl FrameCompositor {
    pub(crate) fn new(
        canvas: Canvas,
        background_color: &str,
        assets: &AssetCache,
        backend: FilterBackend,
    ) -> RenderResult<Self> {
        let width: u16 = canvas.width.try_into().map_err(|_| {
            RenderError::validation(format!("canvas width {} exceeds u16", canvas.width))
        })?;
        let height: u16 = canvas.height.try_into().map_err(|_| {
            RenderError::validation(format!("canvas height {} exceeds u16", canvas.height))
        })?;
        let background = parse_color(background_color)
            .map_err(|e| RenderError::validation(format!("backgroundColor: {e}")))?;

        let mut text = TextEngine::new();
        for (path, bytes) in &assets.fonts {
            text.register(path, bytes)?;
        }
        let filters = FilterPipeline::new(backend);
        tracing::debug!(backend = filters.backend_name(), "filter pipeline ready");

        Ok(Self {
            canvas,
            width,
            height,
            background,
            pixmap: vello_cpu::Pixmap::new(width, height),
            text,
            filters,
        })
    }

    pub(crate) fn filters(&self) -> &FilterPipeline {
        &self.filters
    }

    /// Drop every per-element filter resource.
    pub(crate) fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub(crate) fn render_frame(
        &mut self,
        timeline: &Timeline,
        assets: &mut AssetCache,
        frame: FrameIndex,
    ) -> RenderResult<FrameRGBA> {
        let t_ms = frame.time_ms();
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint(self.background.to_cpu_color());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        for layer in active_layers(timeline, t_ms) {
            self.draw_layer(&mut ctx, layer, t_ms, assets)?;
        }

        ctx.flush();
        fill_pixmap(&mut self.pixmap, self.background.to_premul_array());
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
        })
    }

    fn draw_layer(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: Layer<'_>,
        t_ms: f64,
        assets: &mut AssetCache,
    ) -> RenderResult<()> {
        let el = layer.element;
        let o = resolve_overrides(el, t_ms);
        if o.opacity <= 0.0 {
            tracing::trace!(element = layer.id, "fully transparent, skipped");
            return Ok(());
        }
        tracing::debug!(element = layer.id, kind = el.kind.name(), t_ms, "draw layer");

        // Text scales its font size, never its box.
        let box_scale = if matches!(el.kind, ElementKind::Text(_)) {
            1.0
        } else {
            o.scale
        };
        let placement = Placement::new(el.width, el.height, &o, box_scale);

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let layered = o.opacity < 1.0;
        if layered {
            ctx.push_opacity_layer(o.opacity as f32);
        }
        let drawn = self.draw_kind(ctx, layer, &o, &placement, t_ms, assets);
        if layered {
            ctx.pop_layer();
        }
        drawn
    }

    fn draw_kind(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: Layer<'_>,
        o: &ResolvedTransform,
        placement: &Placement,
        t_ms: f64,
        assets: &mut AssetCache,
    ) -> RenderResult<()> {
        match &layer.element.kind {
            ElementKind::Image => {
                let img = assets.images.get(layer.id).ok_or_else(|| missing(layer.id))?;
                blit(ctx, &img.paint, img.width, img.height, placement);
            }
            ElementKind::Gif => {
                let gif = assets.gifs.get(layer.id).ok_or_else(|| missing(layer.id))?;
                let idx = gif_frame_index(t_ms, gif.delay_ms, gif.frames.len());
                if let Some(paint) = gif.frames.get(idx) {
                    blit(ctx, paint, gif.width, gif.height, placement);
                }
            }
            ElementKind::Text(props) => self.draw_text_layer(ctx, layer, props, o, assets)?,
            ElementKind::Shape(props) => draw_shape(ctx, layer.element, props, o, placement)?,
            ElementKind::Video(props) => {
                self.draw_video_layer(ctx, layer, props, t_ms, placement, assets)?;
            }
            ElementKind::Audio(_) => {}
        }
        Ok(())
    }

    fn draw_text_layer(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: Layer<'_>,
        props: &TextProps,
        o: &ResolvedTransform,
        assets: &AssetCache,
    ) -> RenderResult<()> {
        let font = assets
            .text_fonts
            .get(layer.id)
            .ok_or_else(|| missing(layer.id))?;
        let style = TextStyle::resolve(props, font, o.scale)?;
        let el = layer.element;
        let pivot = Vec2::new(o.x + el.width / 2.0, o.y + el.height / 2.0);
        let transform =
            Affine::translate(pivot) * Affine::rotate(o.rotation_rad) * Affine::translate(-pivot);
        ctx.set_transform(affine_to_cpu(transform));
        draw_text(
            ctx,
            &mut self.text,
            &props.text,
            &style,
            TextBox {
                left: o.x,
                top: o.y,
                width: el.width,
                height: el.height,
            },
        )
    }

    fn draw_video_layer(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: Layer<'_>,
        props: &VideoProps,
        t_ms: f64,
        placement: &Placement,
        assets: &mut AssetCache,
    ) -> RenderResult<()> {
        let source = assets
            .videos
            .get_mut(layer.id)
            .ok_or_else(|| missing(layer.id))?;
        let seconds = (t_ms - layer.start) * layer.element.speed / 1000.0;
        let frame = source.seek_exact(seconds).map_err(|e| {
            tracing::error!(element = layer.id, seconds, error = %e, "video seek failed");
            e
        })?;

        let chain = parse_chain(&props.filter);
        let mut rgba = self.filters.apply(layer.id, &chain, &frame);
        premultiply_rgba8_in_place(&mut rgba);
        let paint = image_paint_from_premul(&rgba, frame.width, frame.height)?;
        blit(
            ctx,
            &paint,
            f64::from(frame.width),
            f64::from(frame.height),
            placement,
        );
        Ok(())
    }
}

fn missing(id: &str) -> RenderError {
    RenderError::asset(format!("no loaded asset for element '{id}'"))
}

fn blit(
    ctx: &mut vello_cpu::RenderContext,
    paint: &vello_cpu::Image,
    src_w: f64,
    src_h: f64,
    placement: &Placement,
) {
    if placement.is_empty() || !(src_w > 0.0 && src_h > 0.0) {
        return;
    }
    ctx.set_transform(affine_to_cpu(placement.fit(src_w, src_h)));
    ctx.set_paint(paint.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, src_w, src_h));
}

/// Polygon in box-centered coordinates: `p / (oWidth / width)` shifted so the box center is the
/// origin.
fn shape_path(props: &ShapeProps, width: f64, height: f64) -> Option<BezPath> {
    if props.shape.len() < 3 || !(props.o_width > 0.0) {
        return None;
    }
    let ratio = props.o_width / width;
    let offset = Vec2::new(width / 2.0, height / 2.0);
    let mut path = BezPath::new();
    for (i, &[x, y]) in props.shape.iter().enumerate() {
        let p = Point::new(x / ratio, y / ratio) - offset;
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    Some(path)
}

fn draw_shape(
    ctx: &mut vello_cpu::RenderContext,
    el: &TimelineElement,
    props: &ShapeProps,
    o: &ResolvedTransform,
    placement: &Placement,
) -> RenderResult<()> {
    let Some(path) = shape_path(props, el.width, el.height) else {
        return Ok(());
    };
    let fill = parse_color(&props.option.fill_color)
        .map_err(|e| RenderError::validation(format!("option.fillColor: {e}")))?;
    ctx.set_transform(affine_to_cpu(placement.center * Affine::scale(o.scale)));
    ctx.set_paint(fill.to_cpu_color());
    ctx.fill_path(&bezpath_to_cpu(&path));
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
