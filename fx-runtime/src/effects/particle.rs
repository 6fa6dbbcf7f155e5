//! # Particle 模块
//!
//! 粒子规格与批次清理句柄。

use std::cell::Cell;
use std::rc::Rc;

use crate::animation::{Clip, Easing, Keyframe};
use crate::geometry::Vec2;
use crate::stage::{NodeId, Surface};

/// 粒子外形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleShape {
    /// 圆形（ripple / firework）
    Circle,
    /// 上圆下窄的火苗（burning，`border-radius: 50% 50% 20% 20%`）
    Flame,
}

/// 单个粒子的规格
///
/// 由动画器在生成时根据表面当前几何与随机数计算，之后不再改变。
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSpec {
    pub shape: ParticleShape,
    /// 宽度（px）
    pub width: f64,
    /// 高度（px）
    pub height: f64,
    /// 表面局部坐标下的 `left/top`
    pub start: Vec2,
    /// 颜色（CSS 颜色字符串）
    pub color: String,
    /// 发光半径（px），0 表示无
    pub glow: f64,
    /// 片段时长（毫秒）
    pub duration_ms: f64,
    pub easing: Easing,
    pub keyframes: Vec<Keyframe>,
}

impl ParticleSpec {
    /// 片段结束时的 `left/top`（起点 + 末帧平移）
    pub fn end(&self) -> Vec2 {
        let translate = self
            .keyframes
            .last()
            .map(|k| k.translate)
            .unwrap_or_default();
        self.start + translate
    }

    /// 末帧透明度
    pub fn final_opacity(&self) -> Option<f64> {
        self.keyframes.last().map(|k| k.opacity)
    }

    /// 构造该粒子的动画片段
    pub fn clip(&self) -> Clip {
        Clip::new(self.keyframes.clone(), self.duration_ms, self.easing)
    }
}

/// 清理句柄
///
/// 最多执行一次；再次调用 [`run`](Teardown::run) 是空操作。
/// 丢弃句柄**不会**触发清理。
#[derive(Default)]
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    /// 包装一个清理闭包
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// 空清理
    pub fn noop() -> Self {
        Self(None)
    }

    /// 执行清理（幂等）
    pub fn run(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }

    /// 是否还有待执行的清理
    pub fn is_pending(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Teardown")
            .field(&if self.is_pending() { "pending" } else { "done" })
            .finish()
    }
}

impl From<Option<Teardown>> for Teardown {
    fn from(value: Option<Teardown>) -> Self {
        value.unwrap_or_default()
    }
}

/// 追加一个在片段完成时自行移除的粒子
///
/// 这是粒子移除的唯一保证；批次清理只是提前移除的附加途径。
pub(crate) fn spawn_particle(surface: &Surface, spec: ParticleSpec) -> Option<NodeId> {
    let slot: Rc<Cell<Option<NodeId>>> = Rc::new(Cell::new(None));
    let pending = slot.clone();
    let owner = surface.clone();
    let id = surface.append_particle(spec, move || {
        if let Some(id) = pending.get() {
            owner.remove_particle(id);
        }
    })?;
    slot.set(Some(id));
    Some(id)
}

/// 移除整批粒子的清理句柄（已移除的粒子跳过）
pub(crate) fn batch_teardown(surface: &Surface, ids: Vec<NodeId>) -> Teardown {
    let surface = surface.clone();
    Teardown::new(move || {
        for id in ids {
            surface.remove_particle(id);
        }
    })
}

/// 从调色板中均匀选取颜色；调色板为空时使用兜底色
pub(crate) fn pick_color(surface: &Surface, color_stops: &[String]) -> String {
    surface
        .random_index(color_stops.len())
        .map(|i| color_stops[i].clone())
        .unwrap_or_else(|| super::registry::defaults::PARTICLE_COLOR.to_string())
}
