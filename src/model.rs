use serde::{Deserialize, Serialize};

// ── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub name: String,
    pub url: String,
}

/// Body of `GET /list`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub images: Vec<ImageDescriptor>,
}

/// Last `/`-separated segment of `path`; the backend keys annotations by bare
/// file name.
pub fn image_file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ── Display Geometry ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CropUnit {
    #[default]
    Pixels,
    /// 0–100 of the displayed image extent.
    Percent,
}

impl CropUnit {
    pub fn label(&self) -> &'static str {
        match self {
            CropUnit::Pixels => "px",
            CropUnit::Percent => "%",
        }
    }

    pub fn all() -> &'static [CropUnit] {
        &[CropUnit::Pixels, CropUnit::Percent]
    }
}

/// Rectangle in the display space of the rendered image, origin at the image's
/// top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub unit: CropUnit,
}

impl CropRect {
    pub fn pixels(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Pixels,
        }
    }

    pub fn percent(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Percent,
        }
    }

    /// Pixel rectangle spanned by two drag points, in either order.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self::pixels(
            a.0.min(b.0),
            a.1.min(b.1),
            (b.0 - a.0).abs(),
            (b.1 - a.1).abs(),
        )
    }

    /// Rectangle for a drag from `origin` to `pointer`, confined to the
    /// displayed image. With `aspect` set, width drives the height and both
    /// shrink together when an edge is reached.
    pub fn from_drag(
        origin: (f32, f32),
        pointer: (f32, f32),
        aspect: Option<f32>,
        bounds: &ImageRef,
    ) -> Self {
        let (w_max, h_max) = (bounds.width.max(0.0), bounds.height.max(0.0));
        let ox = origin.0.clamp(0.0, w_max);
        let oy = origin.1.clamp(0.0, h_max);
        let px = pointer.0.clamp(0.0, w_max);
        let py = pointer.1.clamp(0.0, h_max);

        let Some(ratio) = aspect.filter(|r| r.is_finite() && *r > 0.0) else {
            return Self::from_corners((ox, oy), (px, py));
        };

        let (dx, dy) = (px - ox, py - oy);
        let room_x = if dx >= 0.0 { w_max - ox } else { ox };
        let room_y = if dy >= 0.0 { h_max - oy } else { oy };

        let mut width = dx.abs().min(room_x);
        let mut height = width / ratio;
        if height > room_y {
            height = room_y;
            width = height * ratio;
        }

        let x = if dx >= 0.0 { ox } else { ox - width };
        let y = if dy >= 0.0 { oy } else { oy - height };
        Self::pixels(x, y, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn to_pixels(&self, image: &ImageRef) -> CropRect {
        match self.unit {
            CropUnit::Pixels => *self,
            CropUnit::Percent => Self::pixels(
                self.x * image.width / 100.0,
                self.y * image.height / 100.0,
                self.width * image.width / 100.0,
                self.height * image.height / 100.0,
            ),
        }
    }

    /// Same region expressed in `unit`. Stays in pixels while the image has
    /// no drawn size.
    pub fn in_unit(&self, unit: CropUnit, image: &ImageRef) -> CropRect {
        let px = self.to_pixels(image);
        match unit {
            CropUnit::Pixels => px,
            CropUnit::Percent if image.width > 0.0 && image.height > 0.0 => Self::percent(
                px.x * 100.0 / image.width,
                px.y * 100.0 / image.height,
                px.width * 100.0 / image.width,
                px.height * 100.0 / image.height,
            ),
            CropUnit::Percent => px,
        }
    }

    /// Trims the part outside the displayed image; keeps the unit.
    pub fn clamp_to(&self, image: &ImageRef) -> CropRect {
        let px = self.to_pixels(image);
        let (w, h) = (image.width.max(0.0), image.height.max(0.0));
        let x0 = px.x.clamp(0.0, w);
        let y0 = px.y.clamp(0.0, h);
        let x1 = (px.x + px.width).clamp(0.0, w);
        let y1 = (px.y + px.height).clamp(0.0, h);
        Self::from_corners((x0, y0), (x1, y1)).in_unit(self.unit, image)
    }

    /// Keeps a pixel crop over the same image region after the displayed size
    /// changes from `from` to `to`. Percent crops are size-independent.
    pub fn rescaled(&self, from: (f32, f32), to: (f32, f32)) -> CropRect {
        if self.unit == CropUnit::Percent || from.0 <= 0.0 || from.1 <= 0.0 {
            return *self;
        }
        let sx = to.0 / from.0;
        let sy = to.1 / from.1;
        Self::pixels(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }
}

/// Loaded image surface: intrinsic resolution plus the size it is currently
/// drawn at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageRef {
    pub natural_width: u32,
    pub natural_height: u32,
    pub width: f32,
    pub height: f32,
}

impl ImageRef {
    pub fn new(natural_width: u32, natural_height: u32, width: f32, height: f32) -> Self {
        Self {
            natural_width,
            natural_height,
            width,
            height,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.natural_width > 0 && self.natural_height > 0 && self.width > 0.0 && self.height > 0.0
    }

    pub fn scale_x(&self) -> f64 {
        self.natural_width as f64 / self.width as f64
    }

    pub fn scale_y(&self) -> f64 {
        self.natural_height as f64 / self.height as f64
    }
}

// ── Natural Geometry ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NaturalBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Maps a display-space crop onto the image's natural pixel grid. Products are
/// taken before the division and rounded half away from zero, so the same
/// inputs always give the same box. `None` while the image has no drawn size.
pub fn normalize(crop: &CropRect, image: &ImageRef) -> Option<NaturalBox> {
    if !image.is_ready() {
        return None;
    }
    let px = crop.to_pixels(image);
    let nat_w = image.natural_width as f64;
    let nat_h = image.natural_height as f64;
    let disp_w = image.width as f64;
    let disp_h = image.height as f64;

    let map = |v: f32, natural: f64, display: f64| (v as f64 * natural / display).round() as i32;

    Some(NaturalBox {
        x: map(px.x, nat_w, disp_w),
        y: map(px.y, nat_h, disp_h),
        width: map(px.width, nat_w, disp_w),
        height: map(px.height, nat_h, disp_h),
    })
}

// ── Wire Payload ────────────────────────────────────────────────────────────

/// Body of `POST /save_annotations`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSubmission {
    pub image_name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl AnnotationSubmission {
    pub fn new(image_name: impl Into<String>, b: NaturalBox) -> Self {
        Self {
            image_name: image_name.into(),
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }
    }
}
