//! # Ripple 动画器
//!
//! 单个圆形粒子，直径 = `max(width, height) * maxSize`，
//! 以 STANDARD 缓动从 `scale(0) opacity 0.3` 扩散到 `scale(2.5) opacity 0`。
//!
//! 定位优先级：
//!
//! ```text
//! centered → clientX/clientY → x/y（相对 0 - 1）→ 中心
//! ```

use super::handler::RippleHandler;
use super::options::{EffectOptions, RippleOptions};
use super::particle::{ParticleShape, ParticleSpec, Teardown, spawn_particle};
use super::registry::{EffectKind, EffectRegistry, defaults};
use crate::animation::{Easing, Keyframe};
use crate::geometry::{Rect, Vec2};
use crate::stage::{Overflow, Position, Surface};

/// 起始透明度
const START_OPACITY: f64 = 0.3;
/// 结束缩放
const END_SCALE: f64 = 2.5;

/// 已解析的 ripple 参数
#[derive(Debug, Clone, PartialEq)]
pub struct RippleParams {
    pub color: String,
    pub duration_ms: f64,
    pub max_size: f64,
    pub centered: bool,
    /// 相对位置（x、y 都给出时才有值）
    pub relative: Option<Vec2>,
    /// client 坐标（clientX、clientY 都给出时才有值）
    pub client: Option<Vec2>,
    pub active: bool,
}

impl RippleParams {
    /// 三级覆盖链：调用方 → 注册默认值 → 兜底常量
    pub fn resolve(call: &RippleOptions, registered: &RippleOptions) -> Self {
        let merged = registered.overlay(call);
        Self {
            color: merged
                .color
                .unwrap_or_else(|| defaults::RIPPLE_COLOR.to_string()),
            duration_ms: merged.duration.unwrap_or(defaults::RIPPLE_DURATION),
            max_size: merged.max_size.unwrap_or(defaults::RIPPLE_MAX_SIZE),
            centered: merged.centered.unwrap_or(false),
            relative: merged.x.zip(merged.y).map(Vec2::from),
            client: merged.client_x.zip(merged.client_y).map(Vec2::from),
            active: merged.active.unwrap_or(defaults::ACTIVE),
        }
    }
}

/// 计算水波纹直径与局部左上角
pub fn ripple_geometry(rect: &Rect, params: &RippleParams) -> (f64, Vec2) {
    let size = rect.max_side() * params.max_size;
    let half = Vec2::new(size / 2.0, size / 2.0);

    let anchor = if params.centered {
        rect.local_center()
    } else if let Some(client) = params.client {
        rect.to_local(client)
    } else if let Some(relative) = params.relative {
        Vec2::new(relative.x * rect.width, relative.y * rect.height)
    } else {
        rect.local_center()
    };
    (size, anchor - half)
}

/// 生成一个水波纹
///
/// 未激活或表面不可用时返回 `None`。
pub fn animate_ripple(surface: &Surface, params: &RippleParams) -> Option<Teardown> {
    if !params.active {
        return None;
    }
    let rect = surface.rect()?;
    let (size, start) = ripple_geometry(&rect, params);

    let spec = ParticleSpec {
        shape: ParticleShape::Circle,
        width: size,
        height: size,
        start,
        color: params.color.clone(),
        glow: 0.0,
        duration_ms: params.duration_ms,
        easing: Easing::STANDARD,
        keyframes: vec![
            Keyframe::new(Vec2::zero(), 0.0, START_OPACITY),
            Keyframe::new(Vec2::zero(), END_SCALE, 0.0),
        ],
    };

    surface.set_style(Position::Relative, Overflow::Hidden);
    let id = spawn_particle(surface, spec)?;
    tracing::trace!(surface = %surface.id(), node = %id, size, "ripple 已生成");

    let surface = surface.clone();
    Some(Teardown::new(move || {
        surface.remove_particle(id);
    }))
}

/// 注册 ripple 效果
pub fn register(registry: &EffectRegistry) {
    registry.register(
        EffectKind::Ripple,
        RippleHandler,
        EffectOptions::Ripple(RippleOptions::builtin()),
    );
}
