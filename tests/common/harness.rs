// Test harness driving the ruler the way an editor shell would

use annotation_ruler::model::{
    Annotation, AnnotationModel, DocumentLines, LineIndex, ListenerId, Position,
    SimpleAnnotationModel,
};
use annotation_ruler::services::{render_channel, ModelEventReceiver, RenderQueue};
use annotation_ruler::view::{
    Decoration, DirtyRange, GeometrySnapshot, InlineInstruction, InlineViewport, OverviewMark,
    RulerPainter, ScrollMetrics,
};
use annotation_ruler::RulerConfig;
use std::sync::Arc;

/// Bytes per line: "line NNNNN" plus the newline
pub const LINE_BYTES: usize = 11;

/// A document of numbered lines, an in-memory annotation model and a painter
/// fed through the render queue.
///
/// The harness is the render thread: create it on the test thread.
pub struct RulerTestHarness {
    text: String,
    lines: LineIndex,
    model: Arc<SimpleAnnotationModel>,
    painter: RulerPainter,
    receiver: Arc<ModelEventReceiver>,
    queue: RenderQueue,
    line_height: i32,
    strip_height: i32,
}

impl RulerTestHarness {
    /// `line_count` lines of `line NNNNN`, 10px lines, a 100px strip
    pub fn new(line_count: usize) -> Self {
        Self::with_config(line_count, &RulerConfig::default())
    }

    pub fn with_config(line_count: usize, config: &RulerConfig) -> Self {
        let text = (0..line_count)
            .map(|i| format!("line {i:05}"))
            .collect::<Vec<_>>()
            .join("\n");
        let lines = LineIndex::from_str(&text);
        let model = Arc::new(SimpleAnnotationModel::new(text.len()));

        let mut painter = RulerPainter::from_config(config);
        painter
            .cache_mut()
            .set_model(Some(model.clone() as Arc<dyn AnnotationModel>));

        let (receiver, queue) = render_channel(None);
        receiver
            .attach(model.as_ref(), ListenerId(1))
            .expect("fresh model has no listeners");

        let mut harness = Self {
            text,
            lines,
            model,
            painter,
            receiver,
            queue,
            line_height: 10,
            strip_height: 100,
        };
        harness.pump();
        harness
    }

    /// Resize the text area and overview strip
    pub fn with_size(mut self, line_height: i32, strip_height: i32) -> Self {
        self.line_height = line_height;
        self.strip_height = strip_height;
        self
    }

    pub fn model(&self) -> &Arc<SimpleAnnotationModel> {
        &self.model
    }

    pub fn painter(&self) -> &RulerPainter {
        &self.painter
    }

    pub fn painter_mut(&mut self) -> &mut RulerPainter {
        &mut self.painter
    }

    pub fn receiver(&self) -> &Arc<ModelEventReceiver> {
        &self.receiver
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn offset(line: usize, column: usize) -> usize {
        line * LINE_BYTES + column
    }

    /// Add an annotation of `kind` at `line:column`; does not pump
    pub fn annotate(&self, kind: &str, line: usize, column: usize, length: usize) -> Arc<Annotation> {
        self.model
            .annotate(kind, Position::new(Self::offset(line, column), length))
            .unwrap()
    }

    /// Annotate the text of `first..=last`, without the final newline
    pub fn annotate_lines(&self, kind: &str, first: usize, last: usize) -> Arc<Annotation> {
        let start = self.lines.line_start(first).unwrap();
        let end = self.lines.line_start(last).unwrap() + LINE_BYTES - 1;
        self.model
            .annotate(kind, Position::new(start, end - start))
            .unwrap()
    }

    /// Apply everything the model reported since the last pump
    pub fn pump(&mut self) -> DirtyRange {
        self.queue.pump(&mut self.painter)
    }

    pub fn insert(&mut self, offset: usize, inserted: &str) {
        self.edit(offset, 0, inserted);
    }

    pub fn delete(&mut self, offset: usize, length: usize) {
        self.edit(offset, length, "");
    }

    fn edit(&mut self, offset: usize, deleted: usize, inserted: &str) {
        self.text.replace_range(offset..offset + deleted, inserted);
        self.lines.apply_edit(offset, deleted, inserted);
        self.model
            .apply_edit(offset, deleted, inserted.len())
            .unwrap();
    }

    /// Every decoration in the document, in paint order
    pub fn decorations(&self) -> Vec<Decoration> {
        self.painter
            .cache()
            .decorations_overlapping(0..self.text.len())
    }

    pub fn viewport(&self, top_line: usize, pixel_offset: i32) -> InlineViewport {
        InlineViewport {
            top_line,
            line_height: self.line_height,
            pixel_offset,
        }
    }

    pub fn paint_inline(&mut self, clip: std::ops::Range<i32>) -> Vec<InlineInstruction> {
        let viewport = self.viewport(0, 0);
        self.paint_inline_at(clip, &viewport)
    }

    pub fn paint_inline_at(
        &mut self,
        clip: std::ops::Range<i32>,
        viewport: &InlineViewport,
    ) -> Vec<InlineInstruction> {
        self.painter.paint_inline(clip, viewport, &self.lines)
    }

    /// Overview geometry with the text area as tall as the strip
    pub fn geometry(&self) -> GeometrySnapshot {
        let metrics = ScrollMetrics {
            total_lines: self.lines.line_count(),
            line_height: self.line_height,
            client_height: self.strip_height,
            top_margin: 0,
            bottom_margin: 0,
            strip_height: self.strip_height,
            strip_top_offset: 0,
            thumb_height: None,
        };
        GeometrySnapshot::from_scroll(&metrics, self.painter.config())
    }

    pub fn paint_overview(&self) -> Vec<OverviewMark> {
        let geometry = self.geometry();
        self.painter
            .paint_overview(0..geometry.strip_height, &geometry, &self.lines)
    }

    /// Header color and one line per overview mark
    pub fn overview_dump(&self) -> String {
        let header = self
            .painter
            .overview_header()
            .map(|color| format!("header {color}"))
            .unwrap_or_else(|| "header none".to_string());
        std::iter::once(header)
            .chain(self.paint_overview().iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
