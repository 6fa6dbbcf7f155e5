//! # Burning 动画器
//!
//! 细长的火苗粒子沿底边生成，向上升起、左右闪烁，同时淡出并模糊。
//!
//! 上升高度 = `height * 0.15 * flameHeight * [0.5, 2.0)`，
//! 水平闪烁 = `[-7.5, 7.5) * flickerSpeed`。

use super::handler::{ContinuousAnimator, ContinuousHandler};
use super::options::{BurningOptions, EffectOptions};
use super::particle::{
    ParticleShape, ParticleSpec, Teardown, batch_teardown, pick_color, spawn_particle,
};
use super::registry::{EffectKind, EffectRegistry, defaults};
use crate::animation::{Easing, Keyframe};
use crate::geometry::{Rect, Vec2};
use crate::stage::{Overflow, Position, Surface};

/// 每批基础粒子数
pub const BASE_COUNT: f64 = 15.0;

/// 已解析的 burning 参数
#[derive(Debug, Clone, PartialEq)]
pub struct BurningParams {
    pub duration_ms: f64,
    pub intensity: f64,
    pub color_stops: Vec<String>,
    pub flame_height: f64,
    pub flicker_speed: f64,
    pub active: bool,
}

impl BurningParams {
    /// 三级覆盖链：调用方 → 注册默认值 → 兜底常量
    pub fn resolve(call: &BurningOptions, registered: &BurningOptions) -> Self {
        let merged = registered.overlay(call);
        Self {
            duration_ms: merged.duration.unwrap_or(defaults::BURNING_DURATION),
            intensity: merged.intensity.unwrap_or(defaults::BURNING_INTENSITY),
            color_stops: merged.color_stops.unwrap_or_default(),
            flame_height: merged.flame_height.unwrap_or(defaults::BURNING_FLAME_HEIGHT),
            flicker_speed: merged
                .flicker_speed
                .unwrap_or(defaults::BURNING_FLICKER_SPEED),
            active: merged.active.unwrap_or(defaults::ACTIVE),
        }
    }

    /// 每批粒子数
    pub fn particle_count(&self) -> usize {
        (BASE_COUNT * self.intensity).floor().max(0.0) as usize
    }
}

fn particle_spec(surface: &Surface, rect: &Rect, params: &BurningParams) -> ParticleSpec {
    let width = 4.0 + surface.random() * 8.0;
    let height = 10.0 + surface.random() * 20.0;
    let color = pick_color(surface, &params.color_stops);

    let start = Vec2::new(surface.random() * rect.width, rect.height - height / 2.0);
    let flicker_x = (surface.random() - 0.5) * 15.0 * params.flicker_speed;
    let start_scale = 0.5 + surface.random() * 0.5;
    let end_scale = 0.1 + surface.random() * 0.3;
    let rise = rect.height * 0.15 * params.flame_height * (0.5 + surface.random() * 1.5);

    ParticleSpec {
        shape: ParticleShape::Flame,
        width,
        height,
        start,
        color,
        glow: 0.0,
        duration_ms: params.duration_ms * (0.7 + surface.random() * 0.6),
        easing: Easing::STANDARD,
        keyframes: vec![
            Keyframe::new(Vec2::zero(), start_scale, 0.8).with_blur(2.0),
            Keyframe::new(Vec2::new(flicker_x, -rise), end_scale, 0.0).with_blur(4.0),
        ],
    }
}

/// 生成一批火苗
///
/// 未激活或表面不可用时返回 `None`。
pub fn animate_burning(surface: &Surface, params: &BurningParams) -> Option<Teardown> {
    if !params.active {
        return None;
    }
    let rect = surface.rect()?;
    let count = params.particle_count();
    if count > 0 {
        surface.set_style(Position::Relative, Overflow::Visible);
    }

    let ids: Vec<_> = (0..count)
        .filter_map(|_| spawn_particle(surface, particle_spec(surface, &rect, params)))
        .collect();
    tracing::trace!(surface = %surface.id(), count = ids.len(), "burning 批次已生成");
    Some(batch_teardown(surface, ids))
}

/// 持续 burning：周期 = duration / 3
#[derive(Debug, Clone, Copy, Default)]
pub struct Burning;

impl ContinuousAnimator for Burning {
    type Params = BurningParams;

    const KIND: EffectKind = EffectKind::Burning;
    const RESPAWN_DIVISOR: f64 = 3.0;

    fn resolve(options: &EffectOptions, defaults: &EffectOptions) -> BurningParams {
        BurningParams::resolve(
            &options.as_burning().cloned().unwrap_or_default(),
            &defaults.as_burning().cloned().unwrap_or_default(),
        )
    }

    fn is_active(params: &BurningParams) -> bool {
        params.active
    }

    fn duration_ms(params: &BurningParams) -> f64 {
        params.duration_ms
    }

    fn spawn(surface: &Surface, params: &BurningParams) -> Option<Teardown> {
        animate_burning(surface, params)
    }
}

/// 注册 burning 效果
pub fn register(registry: &EffectRegistry) {
    registry.register(
        EffectKind::Burning,
        ContinuousHandler::<Burning>::new(),
        EffectOptions::Burning(BurningOptions::builtin()),
    );
}
