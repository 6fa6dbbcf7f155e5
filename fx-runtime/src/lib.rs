//! # FX Runtime
//!
//! 装饰性粒子效果引擎：效果注册表、粒子动画器与触发入口。
//!
//! ## 架构概述
//!
//! `fx-runtime` 不依赖任何渲染后端。它只读取表面几何，向表面追加短暂的
//! 粒子节点，并驱动每个粒子的动画片段直至其自行移除：
//!
//! ```text
//! 组件 ──bind / trigger──► Facade ──resolve──► EffectRegistry
//!                            │
//!                            ▼
//!                      EffectHandler ──merge──► 动画器 ──spawn──► Surface
//!                                                                  │
//!                                         Stage::advance ◄── 片段完成自移除
//! ```
//!
//! ## 核心类型
//!
//! - [`Stage`] / [`Surface`]：无头宿主（虚拟时钟、定时器、指针事件）
//! - [`EffectRegistry`]：效果名称 → 处理器与注册默认值
//! - [`EffectHandler`]：事件驱动（ripple）或持续（firework / burning）
//! - [`EffectBinding`]：声明式绑定 + 命令式 [`EffectsRef::trigger_effect`]
//! - [`EffectOptions`]：各效果的可选参数（三级覆盖链）
//!
//! ## 使用示例
//!
//! ```ignore
//! use std::rc::Rc;
//! use fx_runtime::*;
//!
//! let stage = Stage::with_seed(42);
//! let surface = stage.add_surface(Rect::sized(100.0, 50.0));
//! let registry = Rc::new(EffectRegistry::with_builtin_effects());
//!
//! let binding = EffectBinding::bind(registry, Some(&surface), RippleOptions::default().into());
//! surface.dispatch_pointer_down(60.0, 30.0);
//! stage.advance(600.0);
//! ```
//!
//! ## 模块结构
//!
//! - [`geometry`]：向量与包围矩形
//! - [`animation`]：缓动、关键帧与动画片段
//! - [`stage`]：无头宿主
//! - [`effects`]：注册表、选项、处理器与三个动画器
//! - [`facade`]：绑定与直接触发函数
//! - [`error`]：错误类型定义

pub mod animation;
pub mod effects;
pub mod error;
pub mod facade;
pub mod geometry;
pub mod stage;

// 重导出核心类型
pub use animation::{Clip, ClipState, Easing, Frame, Keyframe};
pub use effects::{
    BurningOptions, EffectHandler, EffectKind, EffectOptions, EffectRegistry, FadeOptions,
    FireworkOptions, ParticleShape, ParticleSpec, RippleOptions, ScaleOptions, Teardown,
    register_builtin_effects,
};
pub use error::{EffectError, EffectResult};
pub use facade::{EffectBinding, EffectsRef, trigger_burning, trigger_firework, trigger_ripple};
pub use geometry::{Rect, Vec2};
pub use stage::{
    MIN_INTERVAL_MS, Overflow, ParticleView, PointerEvent, Position, Stage, StageStats, Surface,
    SurfaceId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let stage = Stage::with_seed(1);
        let surface = stage.add_surface(Rect::sized(10.0, 10.0));
        let registry = std::rc::Rc::new(EffectRegistry::with_builtin_effects());

        let _binding = EffectBinding::bind(registry, Some(&surface), RippleOptions::default().into());
        let _kind: EffectKind = "firework".parse().unwrap();
        let _easing = Easing::STANDARD;
    }
}
