//! # Options 模块
//!
//! 各效果的可调参数。
//!
//! 所有字段在调用方都是可选的；生效值遵循三级覆盖链：
//!
//! ```text
//! 调用方选项 ?? 注册默认值 ?? 硬编码兜底值（registry::defaults）
//! ```
//!
//! JSON 键使用 camelCase（`maxSize`、`clientX`、`colorStops` ...），
//! 未识别的键被忽略。

use serde::{Deserialize, Serialize};

use super::registry::EffectKind;
use crate::error::{EffectError, EffectResult};

/// 字段级合并：`over` 中有值的字段覆盖 `base`
macro_rules! overlay_fields {
    ($base:expr, $over:expr; $($field:ident),+ $(,)?) => {
        Self {
            $($field: $over.$field.clone().or_else(|| $base.$field.clone())),+
        }
    };
}

/// Ripple 选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RippleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// 时长（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// 直径相对较长边的比例
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centered: Option<bool>,
    /// 相对位置（0 - 1）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// 相对位置（0 - 1）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// 绝对位置（client 坐标）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_x: Option<f64>,
    /// 绝对位置（client 坐标）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl RippleOptions {
    /// 内置注册默认值
    pub fn builtin() -> Self {
        Self {
            color: Some("rgba(0, 0, 0, 0.1)".to_string()),
            duration: Some(600.0),
            max_size: Some(1.0),
            centered: Some(false),
            active: Some(true),
            ..Default::default()
        }
    }

    /// 字段级合并
    pub fn overlay(&self, over: &Self) -> Self {
        overlay_fields!(self, over; color, duration, max_size, centered, x, y, client_x, client_y, active)
    }
}

/// Firework 选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireworkOptions {
    /// 时长（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// 粒子数倍率（基数 20）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_stops: Option<Vec<String>>,
    /// 粒子直径（px）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particle_size: Option<f64>,
    /// 飞行距离系数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// 指定后使用定向变体：`false` 向外，`true` 向中心收拢
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverted: Option<bool>,
}

impl FireworkOptions {
    /// 内置注册默认值
    pub fn builtin() -> Self {
        Self {
            duration: Some(1000.0),
            intensity: Some(1.0),
            particle_size: Some(8.0),
            spread: Some(1.2),
            color_stops: Some(warm_palette(&[0.8, 0.6, 0.4, 0.2])),
            active: Some(true),
            inverted: None,
        }
    }

    /// 字段级合并
    pub fn overlay(&self, over: &Self) -> Self {
        overlay_fields!(self, over; duration, intensity, color_stops, particle_size, spread, active, inverted)
    }
}

/// Burning 选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurningOptions {
    /// 时长（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// 粒子数倍率（基数 15）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_stops: Option<Vec<String>>,
    /// 火焰高度系数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flame_height: Option<f64>,
    /// 闪烁幅度系数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flicker_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl BurningOptions {
    /// 内置注册默认值
    pub fn builtin() -> Self {
        Self {
            duration: Some(1200.0),
            intensity: Some(1.0),
            flame_height: Some(1.2),
            flicker_speed: Some(1.0),
            color_stops: Some(warm_palette(&[0.9, 0.7, 0.5, 0.3])),
            active: Some(true),
        }
    }

    /// 字段级合并
    pub fn overlay(&self, over: &Self) -> Self {
        overlay_fields!(self, over; duration, intensity, color_stops, flame_height, flicker_speed, active)
    }
}

/// Scale 选项（仅声明）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Fade 选项（仅声明）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FadeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// 橙红 → 黄的暖色调色板
fn warm_palette(alphas: &[f64; 4]) -> Vec<String> {
    const RGB: [&str; 4] = ["255, 80, 0", "255, 120, 0", "255, 200, 0", "255, 255, 0"];
    RGB.iter()
        .zip(alphas)
        .map(|(rgb, alpha)| format!("rgba({}, {})", rgb, alpha))
        .collect()
}

/// 任意效果的选项
///
/// JSON 形式以 `effect` 字段区分类型：`{"effect": "ripple", "centered": true}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "lowercase")]
pub enum EffectOptions {
    Ripple(RippleOptions),
    Scale(ScaleOptions),
    Fade(FadeOptions),
    Firework(FireworkOptions),
    Burning(BurningOptions),
}

impl EffectOptions {
    /// 某类型的空选项（所有字段未指定）
    pub fn empty(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Ripple => Self::Ripple(RippleOptions::default()),
            EffectKind::Scale => Self::Scale(ScaleOptions::default()),
            EffectKind::Fade => Self::Fade(FadeOptions::default()),
            EffectKind::Firework => Self::Firework(FireworkOptions::default()),
            EffectKind::Burning => Self::Burning(BurningOptions::default()),
        }
    }

    /// 效果类型
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Ripple(_) => EffectKind::Ripple,
            Self::Scale(_) => EffectKind::Scale,
            Self::Fade(_) => EffectKind::Fade,
            Self::Firework(_) => EffectKind::Firework,
            Self::Burning(_) => EffectKind::Burning,
        }
    }

    /// 从某类型的 JSON 选项对象解析（不需要 `effect` 字段）
    pub fn from_json(kind: EffectKind, value: serde_json::Value) -> EffectResult<Self> {
        let invalid = |e: serde_json::Error| EffectError::InvalidOptions {
            kind,
            message: e.to_string(),
        };
        Ok(match kind {
            EffectKind::Ripple => Self::Ripple(serde_json::from_value(value).map_err(invalid)?),
            EffectKind::Scale => Self::Scale(serde_json::from_value(value).map_err(invalid)?),
            EffectKind::Fade => Self::Fade(serde_json::from_value(value).map_err(invalid)?),
            EffectKind::Firework => {
                Self::Firework(serde_json::from_value(value).map_err(invalid)?)
            }
            EffectKind::Burning => Self::Burning(serde_json::from_value(value).map_err(invalid)?),
        })
    }

    /// 校验类型
    pub fn ensure_kind(&self, expected: EffectKind) -> EffectResult<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(EffectError::KindMismatch {
                expected,
                actual: self.kind(),
            })
        }
    }

    /// 字段级合并；类型不同时 `over` 的键全部无法识别，结果等于 `self`
    pub fn overlay(&self, over: &EffectOptions) -> EffectOptions {
        match (self, over) {
            (Self::Ripple(a), Self::Ripple(b)) => Self::Ripple(a.overlay(b)),
            (Self::Firework(a), Self::Firework(b)) => Self::Firework(a.overlay(b)),
            (Self::Burning(a), Self::Burning(b)) => Self::Burning(a.overlay(b)),
            (Self::Scale(a), Self::Scale(b)) => Self::Scale(ScaleOptions {
                factor: b.factor.or(a.factor),
                duration: b.duration.or(a.duration),
            }),
            (Self::Fade(a), Self::Fade(b)) => Self::Fade(FadeOptions {
                duration: b.duration.or(a.duration),
                opacity: b.opacity.or(a.opacity),
            }),
            _ => self.clone(),
        }
    }

    /// `active` 字段（Scale / Fade 没有该字段）
    pub fn active(&self) -> Option<bool> {
        match self {
            Self::Ripple(o) => o.active,
            Self::Firework(o) => o.active,
            Self::Burning(o) => o.active,
            Self::Scale(_) | Self::Fade(_) => None,
        }
    }

    /// 设置 `active`
    pub fn with_active(mut self, active: bool) -> Self {
        match &mut self {
            Self::Ripple(o) => o.active = Some(active),
            Self::Firework(o) => o.active = Some(active),
            Self::Burning(o) => o.active = Some(active),
            Self::Scale(_) | Self::Fade(_) => {}
        }
        self
    }

    pub fn as_ripple(&self) -> Option<&RippleOptions> {
        match self {
            Self::Ripple(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_firework(&self) -> Option<&FireworkOptions> {
        match self {
            Self::Firework(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_burning(&self) -> Option<&BurningOptions> {
        match self {
            Self::Burning(o) => Some(o),
            _ => None,
        }
    }
}

impl From<RippleOptions> for EffectOptions {
    fn from(value: RippleOptions) -> Self {
        Self::Ripple(value)
    }
}

impl From<FireworkOptions> for EffectOptions {
    fn from(value: FireworkOptions) -> Self {
        Self::Firework(value)
    }
}

impl From<BurningOptions> for EffectOptions {
    fn from(value: BurningOptions) -> Self {
        Self::Burning(value)
    }
}

impl From<ScaleOptions> for EffectOptions {
    fn from(value: ScaleOptions) -> Self {
        Self::Scale(value)
    }
}

impl From<FadeOptions> for EffectOptions {
    fn from(value: FadeOptions) -> Self {
        Self::Fade(value)
    }
}
