//! tiny-skia renderer implementation.

use crate::renderer::{ExportedImage, Frame, RenderContext, RenderResult, Renderer, RendererError};
use doodlepost_core::background::BackgroundImage;
use doodlepost_core::color::Rgba;
use doodlepost_core::drawing::DrawingState;
use doodlepost_core::export::{self, ExportPlan};
use doodlepost_core::stroke::Stroke;
use doodlepost_core::transform::ImageTransform;
use kurbo::{BezPath, PathEl, Size};
use std::collections::HashMap;
use tiny_skia::{
    BlendMode, Color, FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke as SkiaStroke, Transform,
};
use uuid::Uuid;

/// CPU renderer for the doodle canvas.
pub struct SkiaRenderer {
    /// Decoded photo pixmaps keyed by image id, premultiplied for blitting.
    image_cache: HashMap<Uuid, Pixmap>,
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// What one composite pass paints, in logical coordinates.
struct Layers<'a, I> {
    canvas_size: Size,
    pixel_ratio: f64,
    background_color: Rgba,
    image: Option<&'a BackgroundImage>,
    image_transform: ImageTransform,
    strokes: I,
}

impl SkiaRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self {
            image_cache: HashMap::new(),
        }
    }

    /// Pixmap for a photo, decoding into the cache on first use.
    ///
    /// Only the most recent photo is kept.
    fn image_pixmap(&mut self, image: &BackgroundImage) -> RenderResult<&Pixmap> {
        if !self.image_cache.contains_key(&image.id()) {
            let pixmap = premultiplied_pixmap(image)?;
            self.image_cache.clear();
            self.image_cache.insert(image.id(), pixmap);
        }
        self.image_cache
            .get(&image.id())
            .ok_or_else(|| RendererError::RenderFailed("image cache miss".to_string()))
    }

    /// Background color, then the photo, then the stroke layer.
    fn compose<'s, I>(&mut self, layers: Layers<'_, I>) -> RenderResult<Pixmap>
    where
        I: Iterator<Item = &'s Stroke>,
    {
        let (width, height) = pixel_size(layers.canvas_size, layers.pixel_ratio)?;
        let Some(mut pixmap) = Pixmap::new(width, height) else {
            return Err(RendererError::RenderFailed(format!(
                "could not allocate {}x{} pixmap",
                width, height
            )));
        };
        pixmap.fill(skia_color(layers.background_color));

        let ratio = layers.pixel_ratio as f32;

        if let Some(image) = layers.image {
            let rect = layers
                .image_transform
                .image_rect(image.size(), layers.canvas_size);
            if rect.width() > 0.0 && rect.height() > 0.0 {
                let source = self.image_pixmap(image)?;
                let transform = Transform::from_row(
                    (rect.width() / image.width() as f64) as f32 * ratio,
                    0.0,
                    0.0,
                    (rect.height() / image.height() as f64) as f32 * ratio,
                    rect.x0 as f32 * ratio,
                    rect.y0 as f32 * ratio,
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
            }
        }

        let Some(mut stroke_layer) = Pixmap::new(width, height) else {
            return Err(RendererError::RenderFailed("could not allocate stroke layer".to_string()));
        };
        let transform = Transform::from_scale(ratio, ratio);
        for stroke in layers.strokes {
            paint_stroke(&mut stroke_layer, stroke, transform);
        }
        pixmap.draw_pixmap(
            0,
            0,
            stroke_layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        Ok(pixmap)
    }
}

impl Renderer for SkiaRenderer {
    fn render_interactive(&mut self, ctx: &RenderContext) -> RenderResult<Frame> {
        let drawing = ctx.drawing;
        let canvas_size = ctx.canvas_size().ok_or(RendererError::InvalidSize {
            width: 0.0,
            height: 0.0,
        })?;
        let pixmap = self.compose(Layers {
            canvas_size,
            pixel_ratio: ctx.pixel_ratio,
            background_color: drawing.background_color(),
            image: drawing.background_image(),
            image_transform: drawing.image_transform(),
            strokes: drawing.paths().iter().chain(drawing.current_path()),
        })?;

        let hint = (ctx.show_hint && drawing.show_transform_hint())
            .then(|| drawing.config().transform_hint.clone());

        Ok(Frame { pixmap, hint })
    }

    fn render_export(&mut self, drawing: &DrawingState, target: Size) -> RenderResult<ExportedImage> {
        let plan = ExportPlan::new(drawing, target);
        let pixmap = self.compose(Layers {
            canvas_size: plan.target_size,
            pixel_ratio: drawing.config().export_pixel_ratio,
            background_color: plan.background_color,
            image: plan.background_image.as_ref(),
            image_transform: plan.image_transform,
            strokes: plan.strokes.iter(),
        })?;

        let png = encode_png(&pixmap)?;
        log::info!(
            "Exported doodle at {}x{} ({} strokes, {} bytes)",
            pixmap.width(),
            pixmap.height(),
            plan.strokes.len(),
            png.len()
        );

        Ok(ExportedImage {
            png,
            width: pixmap.width(),
            height: pixmap.height(),
        })
    }
}

/// Encode a pixmap as a straight-alpha RGBA8 PNG.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut data, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| RendererError::Encode(e.to_string()))?;
    }
    Ok(data)
}

fn pixel_size(canvas_size: Size, pixel_ratio: f64) -> RenderResult<(u32, u32)> {
    export::pixel_size(canvas_size, pixel_ratio).ok_or(RendererError::InvalidSize {
        width: canvas_size.width * pixel_ratio,
        height: canvas_size.height * pixel_ratio,
    })
}

fn skia_color(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Stroke one path onto the stroke layer. Eraser strokes clear the layer.
fn paint_stroke(layer: &mut Pixmap, stroke: &Stroke, transform: Transform) {
    let Some(path) = to_skia_path(&stroke.smoothed_path()) else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    if stroke.is_eraser {
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.blend_mode = BlendMode::DestinationOut;
    } else {
        paint.set_color(skia_color(stroke.color));
    }

    let style = SkiaStroke {
        width: stroke.line_width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..SkiaStroke::default()
    };
    layer.stroke_path(&path, &paint, &style, transform, None);
}

/// Convert a kurbo path. Returns `None` for empty paths.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

/// Convert straight-alpha photo pixels into a premultiplied pixmap.
fn premultiplied_pixmap(image: &BackgroundImage) -> RenderResult<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height()).ok_or(RendererError::InvalidSize {
        width: image.width() as f64,
        height: image.height() as f64,
    })?;

    let mut data = Vec::with_capacity(image.rgba().len());
    for px in image.rgba().chunks_exact(4) {
        let a = px[3];
        data.extend_from_slice(&[
            premultiply(px[0], a),
            premultiply(px[1], a),
            premultiply(px[2], a),
            a,
        ]);
    }

    Pixmap::from_vec(data, size)
        .ok_or_else(|| RendererError::RenderFailed("photo pixel buffer size mismatch".to_string()))
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodlepost_core::background::ImageFormat;
    use doodlepost_core::drawing::Tool;
    use doodlepost_core::gesture::{GestureEvent, GesturePhase, GestureRouter};
    use kurbo::{Point, Vec2};

    fn rgba_at(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn assert_close(actual: [u8; 4], expected: [u8; 4]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!(
                (*a as i16 - *e as i16).abs() <= 2,
                "expected {:?}, got {:?}",
                expected,
                actual
            );
        }
    }

    fn horizontal_stroke(drawing: &mut DrawingState) {
        drawing.start_path(Point::new(10.0, 50.0)).unwrap();
        drawing.add_point(Point::new(50.0, 50.0));
        drawing.add_point(Point::new(90.0, 50.0));
        drawing.end_path();
    }

    fn drawing(canvas: Size) -> DrawingState {
        let mut drawing = DrawingState::default();
        drawing.set_canvas_size(canvas);
        drawing.set_line_width(10.0);
        drawing
    }

    fn solid_image(rgba: [u8; 4]) -> BackgroundImage {
        BackgroundImage::from_rgba(2, 2, rgba.repeat(4), ImageFormat::Png).unwrap()
    }

    fn decode(png_bytes: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(png_bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    #[test]
    fn test_empty_canvas_is_background() {
        let mut renderer = SkiaRenderer::new();
        let drawing = drawing(Size::new(40.0, 30.0));
        let frame = renderer
            .render_interactive(&RenderContext::new(&drawing))
            .unwrap();

        assert_eq!((frame.width(), frame.height()), (40, 30));
        assert_eq!(rgba_at(&frame.pixmap, 0, 0), [255, 255, 255, 255]);
        assert_eq!(rgba_at(&frame.pixmap, 39, 29), [255, 255, 255, 255]);
        assert!(frame.hint.is_none());
    }

    #[test]
    fn test_pen_stroke_painted() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        horizontal_stroke(&mut drawing);

        let frame = renderer
            .render_interactive(&RenderContext::new(&drawing))
            .unwrap();
        assert_close(rgba_at(&frame.pixmap, 50, 50), [0, 0, 0, 255]);
        assert_close(rgba_at(&frame.pixmap, 50, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn test_pixel_ratio_scales_frame() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        horizontal_stroke(&mut drawing);

        let ctx = RenderContext::new(&drawing).with_pixel_ratio(3.0);
        let frame = renderer.render_interactive(&ctx).unwrap();
        assert_eq!((frame.width(), frame.height()), (300, 300));
        assert_close(rgba_at(&frame.pixmap, 150, 150), [0, 0, 0, 255]);
    }

    #[test]
    fn test_in_progress_stroke_rendered() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        drawing.start_path(Point::new(10.0, 50.0)).unwrap();
        drawing.add_point(Point::new(90.0, 50.0));

        let frame = renderer
            .render_interactive(&RenderContext::new(&drawing))
            .unwrap();
        assert_close(rgba_at(&frame.pixmap, 50, 50), [0, 0, 0, 255]);
    }

    #[test]
    fn test_eraser_reveals_background_color() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        drawing.set_background_color(Rgba::rgb(255, 0, 0));
        horizontal_stroke(&mut drawing);
        drawing.set_tool(Tool::Eraser);
        horizontal_stroke(&mut drawing);

        let frame = renderer
            .render_interactive(&RenderContext::new(&drawing))
            .unwrap();
        assert_close(rgba_at(&frame.pixmap, 50, 50), [255, 0, 0, 255]);
    }

    #[test]
    fn test_eraser_reveals_photo() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        drawing.set_background_image(solid_image([0, 0, 255, 255]));
        horizontal_stroke(&mut drawing);

        let frame = renderer
            .render_interactive(&RenderContext::new(&drawing))
            .unwrap();
        assert_close(rgba_at(&frame.pixmap, 50, 50), [0, 0, 0, 255]);
        assert_close(rgba_at(&frame.pixmap, 50, 10), [0, 0, 255, 255]);

        drawing.set_tool(Tool::Eraser);
        horizontal_stroke(&mut drawing);
        let frame = renderer
            .render_interactive(&RenderContext::new(&drawing))
            .unwrap();
        assert_close(rgba_at(&frame.pixmap, 50, 50), [0, 0, 255, 255]);
    }

    #[test]
    fn test_hint_label() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        drawing.set_background_image(solid_image([0, 255, 0, 255]));

        let ctx = RenderContext::new(&drawing);
        let frame = renderer.render_interactive(&ctx).unwrap();
        assert_eq!(frame.hint.as_deref(), Some("pinch to zoom, two fingers to move"));

        let ctx = RenderContext::new(&drawing).with_hint(false);
        assert!(renderer.render_interactive(&ctx).unwrap().hint.is_none());

        horizontal_stroke(&mut drawing);
        let ctx = RenderContext::new(&drawing);
        assert!(renderer.render_interactive(&ctx).unwrap().hint.is_none());
    }

    #[test]
    fn test_image_cache_keeps_latest_photo() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(50.0, 50.0));

        drawing.set_background_image(solid_image([0, 255, 0, 255]));
        let ctx = RenderContext::new(&drawing);
        renderer.render_interactive(&ctx).unwrap();
        renderer.render_interactive(&ctx).unwrap();
        assert_eq!(renderer.image_cache.len(), 1);

        let replacement = solid_image([255, 0, 255, 255]);
        let id = replacement.id();
        drawing.set_background_image(replacement);
        let ctx = RenderContext::new(&drawing);
        let frame = renderer.render_interactive(&ctx).unwrap();
        assert_eq!(renderer.image_cache.len(), 1);
        assert!(renderer.image_cache.contains_key(&id));
        assert_close(rgba_at(&frame.pixmap, 25, 25), [255, 0, 255, 255]);
    }

    #[test]
    fn test_export_is_twice_target_size() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        horizontal_stroke(&mut drawing);

        let exported = renderer.render_export(&drawing, Size::new(150.0, 100.0)).unwrap();
        assert_eq!((exported.width, exported.height), (300, 200));

        let (width, height, _) = decode(&exported.png);
        assert_eq!((width, height), (300, 200));
    }

    #[test]
    fn test_export_rescales_strokes() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        horizontal_stroke(&mut drawing);

        let exported = renderer.render_export(&drawing, Size::new(200.0, 200.0)).unwrap();
        let (width, _, pixels) = decode(&exported.png);
        let at = |x: u32, y: u32| {
            let i = ((y * width + x) * 4) as usize;
            [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
        };
        // Canvas (50, 50) lands at logical (100, 100), pixel (200, 200).
        assert_close(at(200, 200), [0, 0, 0, 255]);
        assert_close(at(200, 40), [255, 255, 255, 255]);
    }

    #[test]
    fn test_render_frame_records_canvas_size() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = DrawingState::default();
        drawing.set_background_image(
            BackgroundImage::from_rgba(4, 2, [0, 0, 255, 255].repeat(8), ImageFormat::Png).unwrap(),
        );

        let frame = renderer
            .render_frame(&mut drawing, Size::new(100.0, 100.0), 1.0)
            .unwrap();
        assert_eq!((frame.width(), frame.height()), (100, 100));
        assert_eq!(drawing.canvas_size(), Some(Size::new(100.0, 100.0)));

        // The photo fills at 200x100, leaving 50pt of horizontal slack.
        let mut router = GestureRouter::new();
        for phase in [GesturePhase::Began, GesturePhase::Changed, GesturePhase::Ended] {
            let translation = if phase == GesturePhase::Began {
                Vec2::ZERO
            } else {
                Vec2::new(30.0, 0.0)
            };
            router.push(GestureEvent::Pan { phase, translation });
        }
        router.drain(&mut drawing);
        assert_eq!(drawing.image_offset(), Vec2::new(30.0, 0.0));

        drawing.start_path(Point::new(10.0, 10.0)).unwrap();
        drawing.add_point(Point::new(90.0, 10.0));
        drawing.end_path();
        renderer
            .render_frame(&mut drawing, Size::new(100.0, 100.0), 2.0)
            .unwrap();

        let plan = ExportPlan::new(&drawing, Size::new(200.0, 200.0));
        assert!((plan.scale_x - 2.0).abs() < f64::EPSILON);
        assert!((plan.scale_y - 2.0).abs() < f64::EPSILON);
        assert_eq!(plan.strokes[0].points[0], Point::new(20.0, 20.0));
        assert_eq!(plan.image_transform.offset, Vec2::new(60.0, 0.0));

        let exported = renderer.render_export(&drawing, Size::new(200.0, 200.0)).unwrap();
        assert_eq!((exported.width, exported.height), (400, 400));
    }

    #[test]
    fn test_interactive_render_needs_canvas_size() {
        let mut renderer = SkiaRenderer::new();
        let drawing = DrawingState::default();
        assert!(matches!(
            renderer.render_interactive(&RenderContext::new(&drawing)),
            Err(RendererError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_export_eraser_reveals_photo() {
        let mut renderer = SkiaRenderer::new();
        let mut drawing = drawing(Size::new(100.0, 100.0));
        drawing.set_background_image(solid_image([0, 0, 255, 255]));
        horizontal_stroke(&mut drawing);
        drawing.set_tool(Tool::Eraser);
        drawing.start_path(Point::new(40.0, 50.0)).unwrap();
        drawing.add_point(Point::new(60.0, 50.0));
        drawing.end_path();

        let exported = renderer.render_export(&drawing, Size::new(100.0, 100.0)).unwrap();
        let (width, _, pixels) = decode(&exported.png);
        let at = |x: u32, y: u32| {
            let i = ((y * width + x) * 4) as usize;
            [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
        };
        // Erased middle shows the photo; the untouched ends keep the ink.
        assert_close(at(100, 100), [0, 0, 255, 255]);
        assert_close(at(30, 100), [0, 0, 0, 255]);
        assert_close(at(100, 20), [0, 0, 255, 255]);
    }

    #[test]
    fn test_export_zero_size_fails() {
        let mut renderer = SkiaRenderer::new();
        let drawing = drawing(Size::new(100.0, 100.0));
        assert!(matches!(
            renderer.render_export(&drawing, Size::new(0.0, 100.0)),
            Err(RendererError::InvalidSize { .. })
        ));
        assert!(matches!(
            renderer.render_export(&drawing, Size::new(f64::NAN, 100.0)),
            Err(RendererError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_encode_png_demultiplies() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(Color::from_rgba8(200, 100, 50, 128));
        let (_, _, pixels) = decode(&encode_png(&pixmap).unwrap());
        assert_close([pixels[0], pixels[1], pixels[2], pixels[3]], [200, 100, 50, 128]);
    }

    #[test]
    fn test_path_conversion() {
        let stroke = Stroke::from_points(
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 0.0)],
            Rgba::black(),
            1.0,
        );
        assert!(to_skia_path(&stroke.smoothed_path()).is_some());
        assert!(to_skia_path(&BezPath::new()).is_none());
    }
}
