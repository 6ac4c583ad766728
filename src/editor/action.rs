//! 编辑动作：16 种动作的带标签联合体及其参数
//!
//! EditAction 是闭集，参数随变体携带；发送时转为 `{action, params}`。
//! 裁剪坐标换算、滤镜滑块映射、保持宽高比等前端辅助逻辑也在此处，便于脱离 UI 测试。

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::EditorError;

/// brightness / contrast 允许的系数范围
pub const FACTOR_RANGE: (f64, f64) = (0.0, 2.0);
/// blur 半径上限
pub const MAX_BLUR_RADIUS: u32 = 10;

/// 动作种类（不带参数），对应服务端 `action` 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Grayscale,
    Sepia,
    Invert,
    Brightness,
    Contrast,
    Blur,
    Rotate90Left,
    Rotate90Right,
    Rotate180,
    FlipHorizontal,
    FlipVertical,
    RemoveWhiteBackground,
    RemoveBlackBackground,
    Crop,
    Resize,
    Reset,
}

impl ActionKind {
    pub const ALL: [ActionKind; 16] = [
        Self::Grayscale,
        Self::Sepia,
        Self::Invert,
        Self::Brightness,
        Self::Contrast,
        Self::Blur,
        Self::Rotate90Left,
        Self::Rotate90Right,
        Self::Rotate180,
        Self::FlipHorizontal,
        Self::FlipVertical,
        Self::RemoveWhiteBackground,
        Self::RemoveBlackBackground,
        Self::Crop,
        Self::Resize,
        Self::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Invert => "invert",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Blur => "blur",
            Self::Rotate90Left => "rotate_90_left",
            Self::Rotate90Right => "rotate_90_right",
            Self::Rotate180 => "rotate_180",
            Self::FlipHorizontal => "flip_horizontal",
            Self::FlipVertical => "flip_vertical",
            Self::RemoveWhiteBackground => "remove_white_background",
            Self::RemoveBlackBackground => "remove_black_background",
            Self::Crop => "crop",
            Self::Resize => "resize",
            Self::Reset => "reset",
        }
    }

    /// 是否需要参数（无参数的动作可直接由 `EditAction::simple` 构造）
    pub fn requires_params(&self) -> bool {
        matches!(
            self,
            Self::Brightness | Self::Contrast | Self::Blur | Self::Crop | Self::Resize
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EditorError::invalid(format!("unknown action: {s}")))
    }
}

/// 源图像素坐标下的裁剪矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl CropRect {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Result<Self, EditorError> {
        if left >= right || top >= bottom {
            return Err(EditorError::invalid(format!(
                "crop requires left < right and top < bottom (got {left},{top},{right},{bottom})"
            )));
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    /// 将显示坐标下的裁剪框换算为源图像素坐标：每轴独立缩放 natural / displayed，再四舍五入
    pub fn from_display(rect: DisplayRect, geometry: &ImageGeometry) -> Result<Self, EditorError> {
        let (scale_x, scale_y) = geometry.scale()?;
        Self::new(
            (rect.x * scale_x).round() as i64,
            (rect.y * scale_y).round() as i64,
            ((rect.x + rect.width) * scale_x).round() as i64,
            ((rect.y + rect.height) * scale_y).round() as i64,
        )
    }
}

/// 显示（缩放后）像素下的裁剪框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 图片原始尺寸与当前显示尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub natural_width: u32,
    pub natural_height: u32,
    pub display_width: f64,
    pub display_height: f64,
}

impl ImageGeometry {
    /// (scale_x, scale_y)；显示尺寸为 0 时无法换算
    pub fn scale(&self) -> Result<(f64, f64), EditorError> {
        if self.display_width <= 0.0 || self.display_height <= 0.0 {
            return Err(EditorError::invalid("image is not displayed (zero display size)"));
        }
        Ok((
            f64::from(self.natural_width) / self.display_width,
            f64::from(self.natural_height) / self.display_height,
        ))
    }
}

/// 保持宽高比：按原图比例由宽推高或由高推宽
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    ratio: f64,
}

impl AspectRatio {
    pub fn from_natural(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            ratio: f64::from(width) / f64::from(height),
        })
    }

    pub fn height_for_width(&self, width: u32) -> u32 {
        (f64::from(width) / self.ratio).round() as u32
    }

    pub fn width_for_height(&self, height: u32) -> u32 {
        (f64::from(height) * self.ratio).round() as u32
    }
}

/// 滤镜滑块的取值范围与默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderSpec {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl SliderSpec {
    /// brightness/contrast 为 0..=200（100 即 1.0），blur 为 0..=10
    pub fn for_action(kind: ActionKind) -> Option<Self> {
        match kind {
            ActionKind::Brightness | ActionKind::Contrast => Some(Self {
                min: 0,
                max: 200,
                default: 100,
            }),
            ActionKind::Blur => Some(Self {
                min: 0,
                max: MAX_BLUR_RADIUS,
                default: 0,
            }),
            _ => None,
        }
    }
}

/// 一次编辑动作（种类 + 参数），创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    Grayscale,
    Sepia,
    Invert,
    Brightness { factor: f64 },
    Contrast { factor: f64 },
    Blur { radius: u32 },
    Rotate90Left,
    Rotate90Right,
    Rotate180,
    FlipHorizontal,
    FlipVertical,
    RemoveWhiteBackground,
    RemoveBlackBackground,
    Crop(CropRect),
    Resize { width: u32, height: u32 },
    /// 丢弃全部编辑并恢复原图；成功后由 HistoryManager 清空历史
    Reset,
}

fn check_factor(factor: f64) -> Result<f64, EditorError> {
    let (min, max) = FACTOR_RANGE;
    if !(min..=max).contains(&factor) {
        return Err(EditorError::invalid(format!(
            "factor must be within [{min}, {max}] (got {factor})"
        )));
    }
    Ok(factor)
}

impl EditAction {
    /// 构造无参数动作；需要参数的种类返回 InvalidParams
    pub fn simple(kind: ActionKind) -> Result<Self, EditorError> {
        Ok(match kind {
            ActionKind::Grayscale => Self::Grayscale,
            ActionKind::Sepia => Self::Sepia,
            ActionKind::Invert => Self::Invert,
            ActionKind::Rotate90Left => Self::Rotate90Left,
            ActionKind::Rotate90Right => Self::Rotate90Right,
            ActionKind::Rotate180 => Self::Rotate180,
            ActionKind::FlipHorizontal => Self::FlipHorizontal,
            ActionKind::FlipVertical => Self::FlipVertical,
            ActionKind::RemoveWhiteBackground => Self::RemoveWhiteBackground,
            ActionKind::RemoveBlackBackground => Self::RemoveBlackBackground,
            ActionKind::Reset => Self::Reset,
            other => {
                return Err(EditorError::invalid(format!("{other} requires parameters")));
            }
        })
    }

    pub fn brightness(factor: f64) -> Result<Self, EditorError> {
        Ok(Self::Brightness {
            factor: check_factor(factor)?,
        })
    }

    pub fn contrast(factor: f64) -> Result<Self, EditorError> {
        Ok(Self::Contrast {
            factor: check_factor(factor)?,
        })
    }

    pub fn blur(radius: u32) -> Result<Self, EditorError> {
        if radius > MAX_BLUR_RADIUS {
            return Err(EditorError::invalid(format!(
                "blur radius must be within [0, {MAX_BLUR_RADIUS}] (got {radius})"
            )));
        }
        Ok(Self::Blur { radius })
    }

    pub fn crop(rect: CropRect) -> Self {
        Self::Crop(rect)
    }

    pub fn resize(width: u32, height: u32) -> Result<Self, EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::invalid("Please enter valid width and height."));
        }
        Ok(Self::Resize { width, height })
    }

    /// 滤镜滑块值映射：brightness/contrast 的 0..=200 除以 100，blur 直接作为半径
    pub fn from_slider(kind: ActionKind, value: u32) -> Result<Self, EditorError> {
        match kind {
            ActionKind::Brightness => Self::brightness(f64::from(value) / 100.0),
            ActionKind::Contrast => Self::contrast(f64::from(value) / 100.0),
            ActionKind::Blur => Self::blur(value),
            other => Err(EditorError::invalid(format!("{other} has no slider"))),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Grayscale => ActionKind::Grayscale,
            Self::Sepia => ActionKind::Sepia,
            Self::Invert => ActionKind::Invert,
            Self::Brightness { .. } => ActionKind::Brightness,
            Self::Contrast { .. } => ActionKind::Contrast,
            Self::Blur { .. } => ActionKind::Blur,
            Self::Rotate90Left => ActionKind::Rotate90Left,
            Self::Rotate90Right => ActionKind::Rotate90Right,
            Self::Rotate180 => ActionKind::Rotate180,
            Self::FlipHorizontal => ActionKind::FlipHorizontal,
            Self::FlipVertical => ActionKind::FlipVertical,
            Self::RemoveWhiteBackground => ActionKind::RemoveWhiteBackground,
            Self::RemoveBlackBackground => ActionKind::RemoveBlackBackground,
            Self::Crop(_) => ActionKind::Crop,
            Self::Resize { .. } => ActionKind::Resize,
            Self::Reset => ActionKind::Reset,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset)
    }

    /// 发送给服务端的 `params` 对象；无参数动作为空对象
    pub fn params(&self) -> Value {
        match self {
            Self::Brightness { factor } | Self::Contrast { factor } => json!({ "factor": factor }),
            Self::Blur { radius } => json!({ "radius": radius }),
            Self::Crop(rect) => json!(rect),
            Self::Resize { width, height } => json!({ "width": width, "height": height }),
            _ => json!({}),
        }
    }
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightness { factor } | Self::Contrast { factor } => {
                write!(f, "{}({factor})", self.kind())
            }
            Self::Blur { radius } => write!(f, "blur({radius})"),
            Self::Crop(r) => write!(f, "crop({},{},{},{})", r.left, r.top, r.right, r.bottom),
            Self::Resize { width, height } => write!(f, "resize({width}x{height})"),
            _ => write!(f, "{}", self.kind()),
        }
    }
}
