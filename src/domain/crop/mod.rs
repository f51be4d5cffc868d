// Crop box editing - normalized crop rectangle with handles and aspect presets

use std::fmt;

use crate::domain::model::{AspectRatio, CropRegion};

const MIN: f64 = CropRegion::MIN_SIZE;

/// Grab distance around a handle, in display pixels
pub const HANDLE_TOLERANCE: f64 = 15.0;

/// Part of the crop box grabbed by a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Move,
}

impl DragHandle {
    const CORNERS: [DragHandle; 4] = [
        DragHandle::TopLeft,
        DragHandle::TopRight,
        DragHandle::BottomLeft,
        DragHandle::BottomRight,
    ];
    const EDGES: [DragHandle; 4] = [
        DragHandle::Top,
        DragHandle::Bottom,
        DragHandle::Left,
        DragHandle::Right,
    ];

    /// The opposite handle, which stays fixed while this one is dragged
    pub fn anchor(&self) -> Option<DragHandle> {
        match self {
            DragHandle::TopLeft => Some(DragHandle::BottomRight),
            DragHandle::TopRight => Some(DragHandle::BottomLeft),
            DragHandle::BottomLeft => Some(DragHandle::TopRight),
            DragHandle::BottomRight => Some(DragHandle::TopLeft),
            DragHandle::Top => Some(DragHandle::Bottom),
            DragHandle::Bottom => Some(DragHandle::Top),
            DragHandle::Left => Some(DragHandle::Right),
            DragHandle::Right => Some(DragHandle::Left),
            DragHandle::Move => None,
        }
    }

    fn touches_top(&self) -> bool {
        matches!(self, DragHandle::TopLeft | DragHandle::Top | DragHandle::TopRight)
    }

    fn touches_bottom(&self) -> bool {
        matches!(
            self,
            DragHandle::BottomLeft | DragHandle::Bottom | DragHandle::BottomRight
        )
    }

    fn touches_left(&self) -> bool {
        matches!(self, DragHandle::TopLeft | DragHandle::Left | DragHandle::BottomLeft)
    }

    fn touches_right(&self) -> bool {
        matches!(
            self,
            DragHandle::TopRight | DragHandle::Right | DragHandle::BottomRight
        )
    }
}

impl fmt::Display for DragHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DragHandle::TopLeft => "tl",
            DragHandle::TopRight => "tr",
            DragHandle::BottomLeft => "bl",
            DragHandle::BottomRight => "br",
            DragHandle::Top => "t",
            DragHandle::Bottom => "b",
            DragHandle::Left => "l",
            DragHandle::Right => "r",
            DragHandle::Move => "move",
        };
        write!(f, "{}", name)
    }
}

/// Where the frame image sits on the display canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    /// Scale the image to fit the canvas and center it
    pub fn fit(canvas_width: f64, canvas_height: f64, image_width: f64, image_height: f64) -> Self {
        if image_width <= 0.0 || image_height <= 0.0 {
            return Self {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }
        let scale = (canvas_width / image_width).min(canvas_height / image_height);
        let width = (image_width * scale).floor();
        let height = (image_height * scale).floor();
        Self {
            x: ((canvas_width - width) / 2.0).floor(),
            y: ((canvas_height - height) / 2.0).floor(),
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Canvas point to normalized image coordinates, clamped to [0, 1]
    pub fn to_normalized(&self, px: f64, py: f64) -> (f64, f64) {
        if self.is_empty() {
            return (0.0, 0.0);
        }
        (
            ((px - self.x) / self.width).clamp(0.0, 1.0),
            ((py - self.y) / self.height).clamp(0.0, 1.0),
        )
    }

    /// Crop region in canvas coordinates
    pub fn project(&self, crop: &CropRegion) -> DisplayRect {
        DisplayRect {
            x: self.x + crop.x * self.width,
            y: self.y + crop.y * self.height,
            width: crop.w * self.width,
            height: crop.h * self.height,
        }
    }

    fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    fn handle_point(&self, handle: DragHandle) -> (f64, f64) {
        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        let (cx, cy) = (self.x + self.width / 2.0, self.y + self.height / 2.0);
        match handle {
            DragHandle::TopLeft => (left, top),
            DragHandle::TopRight => (right, top),
            DragHandle::BottomLeft => (left, bottom),
            DragHandle::BottomRight => (right, bottom),
            DragHandle::Top => (cx, top),
            DragHandle::Bottom => (cx, bottom),
            DragHandle::Left => (left, cy),
            DragHandle::Right => (right, cy),
            DragHandle::Move => (cx, cy),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    handle: DragHandle,
    start: (f64, f64),
    origin: CropRegion,
}

/// Interactive crop box over a video frame
#[derive(Debug, Clone)]
pub struct CropEditor {
    crop: CropRegion,
    aspect: AspectRatio,
    video_aspect: f64,
    display: DisplayRect,
    drag: Option<DragState>,
}

impl Default for CropEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CropEditor {
    pub fn new() -> Self {
        Self {
            crop: CropRegion::full(),
            aspect: AspectRatio::Free,
            video_aspect: 1.0,
            display: DisplayRect {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            },
            drag: None,
        }
    }

    pub fn crop(&self) -> CropRegion {
        self.crop
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    pub fn display(&self) -> DisplayRect {
        self.display
    }

    /// Frame size; the frame's own aspect turns preset ratios into normalized ratios
    pub fn set_video_size(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.video_aspect = width as f64 / height as f64;
        }
    }

    pub fn set_display(&mut self, display: DisplayRect) {
        self.display = display;
    }

    /// Width over height in normalized units for the active preset
    fn target_ratio(&self) -> Option<f64> {
        self.aspect.ratio().map(|r| r / self.video_aspect)
    }

    pub fn set_aspect(&mut self, aspect: AspectRatio) {
        self.aspect = aspect;
        self.apply_aspect_ratio();
    }

    /// Shrink the crop around its center to the preset ratio, then keep it inside the frame
    pub fn apply_aspect_ratio(&mut self) {
        let Some(target) = self.target_ratio() else {
            return;
        };
        let c = &mut self.crop;
        let current = if c.h > 0.0 { c.w / c.h } else { 1.0 };

        if current > target {
            let new_w = c.h * target;
            c.x += (c.w - new_w) / 2.0;
            c.w = new_w;
        } else {
            let new_h = c.w / target;
            c.y += (c.h - new_h) / 2.0;
            c.h = new_h;
        }

        c.x = c.x.min(1.0 - c.w).max(0.0);
        c.y = c.y.min(1.0 - c.h).max(0.0);
    }

    /// Back to the full frame, keeping the active preset
    pub fn reset(&mut self) {
        self.crop = CropRegion::full();
        self.drag = None;
        self.apply_aspect_ratio();
    }

    /// Set the crop, clamped to the frame. `anchor` names the fixed handle when resizing;
    /// `None` moves the box without changing its size. Returns false when the change is rejected.
    pub fn set_crop(&mut self, x: f64, y: f64, w: f64, h: f64, anchor: Option<DragHandle>) -> bool {
        match (self.target_ratio(), anchor) {
            (None, None) => {
                let w = w.clamp(MIN, 1.0);
                let h = h.clamp(MIN, 1.0);
                self.crop = CropRegion {
                    x: x.min(1.0 - w).max(0.0),
                    y: y.min(1.0 - h).max(0.0),
                    w,
                    h,
                };
                true
            }
            (None, Some(_)) => {
                let x = x.clamp(0.0, 1.0 - MIN);
                let y = y.clamp(0.0, 1.0 - MIN);
                self.crop = CropRegion {
                    x,
                    y,
                    w: w.min(1.0 - x).max(MIN),
                    h: h.min(1.0 - y).max(MIN),
                };
                true
            }
            (Some(_), None) => {
                self.crop.x = x.min(1.0 - self.crop.w).max(0.0);
                self.crop.y = y.min(1.0 - self.crop.h).max(0.0);
                true
            }
            (Some(target), Some(anchor)) => self.resize_with_ratio(x, y, w, h, anchor, target),
        }
    }

    fn resize_with_ratio(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        anchor: DragHandle,
        target: f64,
    ) -> bool {
        let mut w = w.max(MIN);
        let mut h = h.max(MIN);
        if w / h > target {
            w = h * target;
        } else {
            h = w / target;
        }

        if anchor.touches_top() && y + h > 1.0 {
            h = 1.0 - y;
            w = h * target;
        }
        if anchor.touches_bottom() && y < 0.0 {
            return false;
        }
        if anchor.touches_left() && x + w > 1.0 {
            w = 1.0 - x;
            h = w / target;
        }
        if anchor.touches_right() && x < 0.0 {
            return false;
        }

        if w < MIN || h < MIN {
            return false;
        }
        if x < 0.0 || y < 0.0 || x + w > 1.0 + 1e-9 || y + h > 1.0 + 1e-9 {
            return false;
        }

        self.crop = CropRegion { x, y, w, h };
        true
    }

    /// Handle under a canvas point: corners first, then edge midpoints, then the inside
    pub fn hit_test(&self, px: f64, py: f64) -> Option<DragHandle> {
        if self.display.is_empty() {
            return None;
        }
        let rect = self.display.project(&self.crop);
        let near = |handle: DragHandle| {
            let (hx, hy) = rect.handle_point(handle);
            (px - hx).abs() < HANDLE_TOLERANCE && (py - hy).abs() < HANDLE_TOLERANCE
        };

        DragHandle::CORNERS
            .into_iter()
            .find(|h| near(*h))
            .or_else(|| DragHandle::EDGES.into_iter().find(|h| near(*h)))
            .or_else(|| rect.contains(px, py).then_some(DragHandle::Move))
    }

    /// Start dragging whatever lies under the point
    pub fn begin_drag(&mut self, px: f64, py: f64) -> Option<DragHandle> {
        let handle = self.hit_test(px, py)?;
        self.drag = Some(DragState {
            handle,
            start: (px, py),
            origin: self.crop,
        });
        Some(handle)
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Continue the active drag to a canvas point
    pub fn drag_to(&mut self, px: f64, py: f64) {
        let Some(state) = self.drag else {
            return;
        };
        if self.display.is_empty() {
            return;
        }
        let dx = (px - state.start.0) / self.display.width;
        let dy = (py - state.start.1) / self.display.height;
        let o = state.origin;

        if state.handle == DragHandle::Move {
            self.set_crop(o.x + dx, o.y + dy, o.w, o.h, None);
            return;
        }

        match self.target_ratio() {
            None => self.drag_free(state.handle, o, dx, dy),
            Some(target) => self.drag_with_ratio(state.handle, o, dx, dy, target),
        }
    }

    /// Free resize: dragged edges move, edges on the anchor side stay put
    fn drag_free(&mut self, handle: DragHandle, o: CropRegion, dx: f64, dy: f64) {
        let (mut left, mut top) = (o.x, o.y);
        let (mut right, mut bottom) = (o.x + o.w, o.y + o.h);

        if handle.touches_left() {
            left = (left + dx).clamp(0.0, right - MIN);
        }
        if handle.touches_right() {
            right = (right + dx).clamp(left + MIN, 1.0);
        }
        if handle.touches_top() {
            top = (top + dy).clamp(0.0, bottom - MIN);
        }
        if handle.touches_bottom() {
            bottom = (bottom + dy).clamp(top + MIN, 1.0);
        }

        self.set_crop(left, top, right - left, bottom - top, handle.anchor());
    }

    fn drag_with_ratio(&mut self, handle: DragHandle, o: CropRegion, dx: f64, dy: f64, target: f64) {
        let anchor = handle.anchor();
        let (x, y, w, h) = match handle {
            DragHandle::TopLeft | DragHandle::TopRight | DragHandle::BottomLeft | DragHandle::BottomRight => {
                // The axis that moved further decides the size
                let (w, h) = if dx.abs() > dy.abs() {
                    let w = if handle.touches_left() { o.w - dx } else { o.w + dx };
                    (w, w / target)
                } else {
                    let h = if handle.touches_top() { o.h - dy } else { o.h + dy };
                    (h * target, h)
                };
                let x = if handle.touches_left() { o.x + o.w - w } else { o.x };
                let y = if handle.touches_top() { o.y + o.h - h } else { o.y };
                (x, y, w, h)
            }
            DragHandle::Top | DragHandle::Bottom => {
                let (h, y) = if handle == DragHandle::Top {
                    let h = o.h - dy;
                    (h, o.y + o.h - h)
                } else {
                    (o.h + dy, o.y)
                };
                let w = h * target;
                (o.x + (o.w - w) / 2.0, y, w, h)
            }
            DragHandle::Left | DragHandle::Right => {
                let (w, x) = if handle == DragHandle::Left {
                    let w = o.w - dx;
                    (w, o.x + o.w - w)
                } else {
                    (o.w + dx, o.x)
                };
                let h = w / target;
                (x, o.y + (o.h - h) / 2.0, w, h)
            }
            DragHandle::Move => return,
        };
        self.set_crop(x, y, w, h, anchor);
    }

    /// Status line, e.g. `Crop: X=10% Y=0% W=50% H=100%`
    pub fn label(&self) -> String {
        format!(
            "Crop: X={:.0}% Y={:.0}% W={:.0}% H={:.0}%",
            self.crop.x * 100.0,
            self.crop.y * 100.0,
            self.crop.w * 100.0,
            self.crop.h * 100.0
        )
    }
}
