//! # Firework 动画器
//!
//! 粒子在表面边框上生成，沿中心连线向外迸发（或向中心收拢）。
//!
//! 两种变体：
//!
//! - **简单变体**（未指定 `inverted`）：按周长均匀采样边框点，两帧：
//!   `scale(1) opacity 1 → translate scale(0.2..0.5) opacity 0`
//! - **定向变体**（指定了 `inverted`）：先均匀选一条边，再在边上均匀取点
//!   - `inverted: false` 向外：迸发（0.6）→ 漂移（0.8）→ 漂移并淡出（1.0）
//!   - `inverted: true` 向内：收拢到中心（0.7）→ 淡出（1.0）

use super::handler::{ContinuousAnimator, ContinuousHandler};
use super::options::{EffectOptions, FireworkOptions};
use super::particle::{
    ParticleShape, ParticleSpec, Teardown, batch_teardown, pick_color, spawn_particle,
};
use super::registry::{EffectKind, EffectRegistry, defaults};
use crate::animation::{Easing, Keyframe};
use crate::geometry::{Rect, Vec2};
use crate::stage::{Overflow, Position, Surface};

/// 每批基础粒子数
pub const BASE_COUNT: f64 = 20.0;

/// 已解析的 firework 参数
#[derive(Debug, Clone, PartialEq)]
pub struct FireworkParams {
    pub duration_ms: f64,
    pub intensity: f64,
    pub color_stops: Vec<String>,
    pub particle_size: f64,
    pub spread: f64,
    pub active: bool,
    pub inverted: Option<bool>,
}

impl FireworkParams {
    /// 三级覆盖链：调用方 → 注册默认值 → 兜底常量
    pub fn resolve(call: &FireworkOptions, registered: &FireworkOptions) -> Self {
        let merged = registered.overlay(call);
        Self {
            duration_ms: merged.duration.unwrap_or(defaults::FIREWORK_DURATION),
            intensity: merged.intensity.unwrap_or(defaults::FIREWORK_INTENSITY),
            color_stops: merged.color_stops.unwrap_or_default(),
            particle_size: merged
                .particle_size
                .unwrap_or(defaults::FIREWORK_PARTICLE_SIZE),
            spread: merged.spread.unwrap_or(defaults::FIREWORK_SPREAD),
            active: merged.active.unwrap_or(defaults::ACTIVE),
            inverted: merged.inverted,
        }
    }

    /// 每批粒子数
    pub fn particle_count(&self) -> usize {
        (BASE_COUNT * self.intensity).floor().max(0.0) as usize
    }
}

/// 按周长均匀采样边框点（顺时针：上 → 右 → 下 → 左）
fn point_on_perimeter(rect: &Rect, r: f64) -> Vec2 {
    let (w, h) = (rect.width, rect.height);
    let perimeter = rect.perimeter();
    let pos = r * perimeter;

    if pos < w {
        Vec2::new(pos, 0.0)
    } else if pos < w + h {
        Vec2::new(w, pos - w)
    } else if pos < 2.0 * w + h {
        Vec2::new(2.0 * w + h - pos, h)
    } else {
        Vec2::new(0.0, perimeter - pos)
    }
}

/// 在指定边上取点（0 上，1 右，2 下，3 左）
fn point_on_edge(rect: &Rect, edge: usize, t: f64) -> Vec2 {
    match edge {
        0 => Vec2::new(t * rect.width, 0.0),
        1 => Vec2::new(rect.width, t * rect.height),
        2 => Vec2::new(t * rect.width, rect.height),
        _ => Vec2::new(0.0, t * rect.height),
    }
}

/// 生成单个粒子的规格
fn particle_spec(surface: &Surface, rect: &Rect, params: &FireworkParams) -> ParticleSpec {
    let color = pick_color(surface, &params.color_stops);
    let center = rect.local_center();

    let start = match params.inverted {
        None => point_on_perimeter(rect, surface.random()),
        Some(_) => {
            let edge = surface.random_index(4).unwrap_or(0);
            point_on_edge(rect, edge, surface.random())
        }
    };

    let offset = start - center;
    let angle = offset.y.atan2(offset.x);
    let distance = rect.min_side() * 0.5 * params.spread;
    let flight = Vec2::new(
        angle.cos() * distance * (0.5 + surface.random() * 0.5),
        angle.sin() * distance * (0.5 + surface.random() * 0.5),
    );

    let glow = 5.0 + surface.random() * 10.0;
    let end_scale = 0.2 + surface.random() * 0.3;
    let duration_ms = params.duration_ms * (0.8 + surface.random() * 0.4);

    let origin = Keyframe::new(Vec2::zero(), 1.0, 1.0);
    let keyframes = match params.inverted {
        None => vec![origin, Keyframe::new(flight, end_scale, 0.0)],
        Some(false) => {
            // 迸发后继续漂移，并带一点下坠
            let fall = Vec2::new(0.0, distance * 0.1);
            vec![
                origin,
                Keyframe::new(flight, 0.8, 0.9).at(0.6),
                Keyframe::new(flight.scale(1.15) + fall, 0.5, 0.5).at(0.8),
                Keyframe::new(flight.scale(1.3) + fall.scale(2.0), end_scale, 0.0),
            ]
        }
        Some(true) => {
            let to_center = center - start;
            vec![
                origin,
                Keyframe::new(to_center, 0.6, 0.9).at(0.7),
                Keyframe::new(to_center, 0.0, 0.0),
            ]
        }
    };

    ParticleSpec {
        shape: ParticleShape::Circle,
        width: params.particle_size,
        height: params.particle_size,
        start,
        color,
        glow,
        duration_ms,
        easing: Easing::STANDARD,
        keyframes,
    }
}

/// 生成一批 firework 粒子
///
/// 未激活或表面不可用时返回 `None`。
pub fn animate_firework(surface: &Surface, params: &FireworkParams) -> Option<Teardown> {
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
    tracing::trace!(surface = %surface.id(), count = ids.len(), "firework 批次已生成");
    Some(batch_teardown(surface, ids))
}

/// 持续 firework：周期 = duration / 2
#[derive(Debug, Clone, Copy, Default)]
pub struct Firework;

impl ContinuousAnimator for Firework {
    type Params = FireworkParams;

    const KIND: EffectKind = EffectKind::Firework;
    const RESPAWN_DIVISOR: f64 = 2.0;

    fn resolve(options: &EffectOptions, defaults: &EffectOptions) -> FireworkParams {
        FireworkParams::resolve(
            &options.as_firework().cloned().unwrap_or_default(),
            &defaults.as_firework().cloned().unwrap_or_default(),
        )
    }

    fn is_active(params: &FireworkParams) -> bool {
        params.active
    }

    fn duration_ms(params: &FireworkParams) -> f64 {
        params.duration_ms
    }

    fn spawn(surface: &Surface, params: &FireworkParams) -> Option<Teardown> {
        animate_firework(surface, params)
    }
}

/// 注册 firework 效果
pub fn register(registry: &EffectRegistry) {
    registry.register(
        EffectKind::Firework,
        ContinuousHandler::<Firework>::new(),
        EffectOptions::Firework(FireworkOptions::builtin()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn params(options: FireworkOptions) -> FireworkParams {
        FireworkParams::resolve(&options, &FireworkOptions::builtin())
    }

    #[test]
    fn test_perimeter_sampling() {
        let rect = Rect::sized(200.0, 100.0);
        assert_eq!(point_on_perimeter(&rect, 0.0), Vec2::new(0.0, 0.0));
        assert_eq!(point_on_perimeter(&rect, 0.25), Vec2::new(150.0, 0.0));
        assert_eq!(point_on_perimeter(&rect, 0.5), Vec2::new(200.0, 100.0));
        assert_eq!(point_on_perimeter(&rect, 0.75), Vec2::new(50.0, 100.0));
    }

    #[test]
    fn test_particle_count_scales_with_intensity() {
        assert_eq!(params(FireworkOptions::default()).particle_count(), 20);
        let doubled = params(FireworkOptions {
            intensity: Some(2.0),
            ..Default::default()
        });
        assert_eq!(doubled.particle_count(), 40);
        let negative = params(FireworkOptions {
            intensity: Some(-1.0),
            ..Default::default()
        });
        assert_eq!(negative.particle_count(), 0);
    }

    #[test]
    fn test_simple_variant_starts_on_border() {
        let stage = Stage::with_seed(11);
        let rect = Rect::new(30.0, 30.0, 200.0, 100.0);
        let surface = stage.add_surface(rect);
        animate_firework(&surface, &params(FireworkOptions::default()));

        let particles = surface.particles();
        assert_eq!(particles.len(), 20);
        for view in &particles {
            assert!(rect.is_on_border(view.spec.start, 1e-9));
            assert_eq!(view.spec.keyframes.len(), 2);
            assert_eq!(view.spec.final_opacity(), Some(0.0));
            assert!((800.0..1200.0).contains(&view.spec.duration_ms));
            assert!((5.0..15.0).contains(&view.spec.glow));
        }
    }

    #[test]
    fn test_outward_moves_away_from_center() {
        let stage = Stage::with_seed(5);
        let rect = Rect::sized(200.0, 100.0);
        let surface = stage.add_surface(rect);
        animate_firework(
            &surface,
            &params(FireworkOptions {
                inverted: Some(false),
                ..Default::default()
            }),
        );

        let center = rect.local_center();
        for view in surface.particles() {
            assert_eq!(view.spec.keyframes.len(), 4);
            let before = view.spec.start - center;
            let after = view.spec.end() - center;
            assert!(after.x.hypot(after.y) > before.x.hypot(before.y));
        }
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let stage = Stage::with_seed(5);
        let surface = stage.add_surface(Rect::sized(50.0, 50.0));
        animate_firework(
            &surface,
            &FireworkParams::resolve(&FireworkOptions::default(), &FireworkOptions::default()),
        );
        assert!(surface.particles().iter().all(|v| v.spec.color == "orange"));
    }

    #[test]
    fn test_style_and_inactive() {
        let stage = Stage::with_seed(5);
        let surface = stage.add_surface(Rect::sized(50.0, 50.0));
        let inactive = params(FireworkOptions {
            active: Some(false),
            ..Default::default()
        });
        assert!(animate_firework(&surface, &inactive).is_none());
        assert_eq!(surface.style().unwrap().position, Position::Static);

        let mut teardown = animate_firework(&surface, &params(FireworkOptions::default()))
            .unwrap();
        assert_eq!(surface.style().unwrap().overflow, Overflow::Visible);
        teardown.run();
        assert_eq!(surface.particle_count(), 0);
    }
}
