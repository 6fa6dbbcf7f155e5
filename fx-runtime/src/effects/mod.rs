//! # Effects 模块
//!
//! 效果注册表、三个粒子动画器（ripple / firework / burning）及其处理器。
//!
//! ```text
//! EffectRegistry ──resolve──▶ EffectHandler ──merge──▶ 动画器 ──spawn──▶ Surface
//! ```

pub mod burning;
pub mod firework;
mod handler;
mod options;
mod particle;
mod registry;
pub mod ripple;

pub use burning::{BurningParams, animate_burning};
pub use firework::{FireworkParams, animate_firework};
pub use handler::{ContinuousAnimator, ContinuousHandler, EffectHandler, RippleHandler};
pub use options::{
    BurningOptions, EffectOptions, FadeOptions, FireworkOptions, RippleOptions, ScaleOptions,
};
pub use particle::{ParticleShape, ParticleSpec, Teardown};
pub use registry::{EffectDescriptor, EffectKind, EffectRegistry, defaults};
pub use ripple::{RippleParams, animate_ripple, ripple_geometry};

/// 注册全部内置效果
pub fn register_builtin_effects(registry: &EffectRegistry) {
    ripple::register(registry);
    firework::register(registry);
    burning::register(registry);
}
