//! # Effect Registry
//!
//! 效果类型定义、兜底参数与名称 → 处理器的映射。
//!
//! 注册表只做簿记，不含任何动画逻辑。同一效果重复注册时后写者胜，
//! 因此注册顺序无关紧要。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::handler::EffectHandler;
use super::options::EffectOptions;
use crate::error::EffectError;

/// 效果类型
///
/// `Scale` / `Fade` 只声明了选项结构，没有内置处理器；
/// 可以通过 [`EffectRegistry::register`] 自行注册。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// 指针触发的水波纹
    Ripple,
    /// 缩放（未内置）
    Scale,
    /// 淡化（未内置）
    Fade,
    /// 边框迸发的火花（持续）
    Firework,
    /// 底边升起的火焰（持续）
    Burning,
}

impl EffectKind {
    /// 全部效果类型
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Ripple,
        EffectKind::Scale,
        EffectKind::Fade,
        EffectKind::Firework,
        EffectKind::Burning,
    ];

    /// 效果名称
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Ripple => "ripple",
            EffectKind::Scale => "scale",
            EffectKind::Fade => "fade",
            EffectKind::Firework => "firework",
            EffectKind::Burning => "burning",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = EffectError;

    /// 大小写不敏感
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| EffectError::UnknownEffect {
                name: s.to_string(),
            })
    }
}

/// 各效果的硬编码兜底值
///
/// 三级覆盖链的最后一级：调用方选项 → 注册默认值 → 这里的常量。
/// 注册默认值本身可能缺字段，所以这一级必须存在。
pub mod defaults {
    /// Ripple 颜色
    pub const RIPPLE_COLOR: &str = "rgba(0, 0, 0, 0.1)";
    /// Ripple 时长（毫秒）
    pub const RIPPLE_DURATION: f64 = 600.0;
    /// Ripple 相对最大尺寸
    pub const RIPPLE_MAX_SIZE: f64 = 1.0;

    /// Firework 时长（毫秒）
    pub const FIREWORK_DURATION: f64 = 1000.0;
    /// Firework 强度
    pub const FIREWORK_INTENSITY: f64 = 1.0;
    /// Firework 粒子尺寸（px）
    pub const FIREWORK_PARTICLE_SIZE: f64 = 8.0;
    /// Firework 扩散系数
    pub const FIREWORK_SPREAD: f64 = 1.2;

    /// Burning 时长（毫秒）
    pub const BURNING_DURATION: f64 = 1200.0;
    /// Burning 强度
    pub const BURNING_INTENSITY: f64 = 1.0;
    /// Burning 火焰高度系数
    pub const BURNING_FLAME_HEIGHT: f64 = 1.2;
    /// Burning 闪烁速度
    pub const BURNING_FLICKER_SPEED: f64 = 1.0;

    /// 未指定时效果处于激活状态
    pub const ACTIVE: bool = true;
    /// 调色板为空时的粒子颜色
    pub const PARTICLE_COLOR: &str = "orange";
}

/// 效果描述
#[derive(Clone)]
pub struct EffectDescriptor {
    pub kind: EffectKind,
    pub handler: Rc<dyn EffectHandler>,
    /// 注册默认值
    pub defaults: EffectOptions,
}

impl std::fmt::Debug for EffectDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectDescriptor")
            .field("kind", &self.kind)
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// 效果注册表
///
/// 启动时显式构造，之后以共享引用（`Rc<EffectRegistry>`）传递。
/// 读多写少；注册只替换映射项，不影响已挂载的实例。
#[derive(Debug, Default)]
pub struct EffectRegistry {
    effects: RefCell<HashMap<EffectKind, EffectDescriptor>>,
}

impl EffectRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建已注册内置效果（ripple / firework / burning）的注册表
    pub fn with_builtin_effects() -> Self {
        let registry = Self::new();
        super::register_builtin_effects(&registry);
        registry
    }

    /// 注册（或覆盖）效果
    ///
    /// `defaults` 的类型与 `kind` 不一致时按空默认值处理。
    pub fn register(
        &self,
        kind: EffectKind,
        handler: impl EffectHandler + 'static,
        defaults: EffectOptions,
    ) {
        let defaults = match defaults.ensure_kind(kind) {
            Ok(()) => defaults,
            Err(e) => {
                tracing::warn!(effect = %kind, error = %e, "注册默认值无效，使用空默认值");
                EffectOptions::empty(kind)
            }
        };
        let replaced = self
            .effects
            .borrow_mut()
            .insert(
                kind,
                EffectDescriptor {
                    kind,
                    handler: Rc::new(handler),
                    defaults,
                },
            )
            .is_some();
        tracing::debug!(effect = %kind, replaced, "效果已注册");
    }

    /// 仅替换注册默认值，保留处理器；效果未注册时返回 `false`
    pub fn set_defaults(&self, defaults: EffectOptions) -> bool {
        let kind = defaults.kind();
        match self.effects.borrow_mut().get_mut(&kind) {
            Some(descriptor) => {
                descriptor.defaults = defaults;
                true
            }
            None => false,
        }
    }

    /// 查找处理器
    pub fn resolve_handler(&self, kind: EffectKind) -> Option<Rc<dyn EffectHandler>> {
        self.effects
            .borrow()
            .get(&kind)
            .map(|descriptor| descriptor.handler.clone())
    }

    /// 查找注册默认值；未注册时返回该类型的空选项
    pub fn resolve_defaults(&self, kind: EffectKind) -> EffectOptions {
        self.effects
            .borrow()
            .get(&kind)
            .map(|descriptor| descriptor.defaults.clone())
            .unwrap_or_else(|| EffectOptions::empty(kind))
    }

    /// 获取效果描述
    pub fn descriptor(&self, kind: EffectKind) -> Option<EffectDescriptor> {
        self.effects.borrow().get(&kind).cloned()
    }

    /// 已注册的效果（按类型排序）
    pub fn kinds(&self) -> Vec<EffectKind> {
        let mut kinds: Vec<EffectKind> = self.effects.borrow().keys().copied().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{FadeOptions, RippleOptions, Teardown};
    use crate::stage::Surface;

    fn noop_handler(_: &Surface, _: &EffectOptions, _: &EffectOptions) -> Teardown {
        Teardown::noop()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("ripple".parse::<EffectKind>(), Ok(EffectKind::Ripple));
        assert_eq!("Firework".parse::<EffectKind>(), Ok(EffectKind::Firework));
        assert_eq!(" BURNING ".parse::<EffectKind>(), Ok(EffectKind::Burning));
        assert!(matches!(
            "sparkle".parse::<EffectKind>(),
            Err(EffectError::UnknownEffect { name }) if name == "sparkle"
        ));
    }

    #[test]
    fn test_builtin_registration() {
        let registry = EffectRegistry::with_builtin_effects();
        assert_eq!(
            registry.kinds(),
            vec![EffectKind::Ripple, EffectKind::Firework, EffectKind::Burning]
        );
        assert!(registry.resolve_handler(EffectKind::Scale).is_none());
        assert!(registry.resolve_handler(EffectKind::Fade).is_none());
    }

    #[test]
    fn test_resolve_defaults_missing_is_empty() {
        let registry = EffectRegistry::new();
        assert_eq!(
            registry.resolve_defaults(EffectKind::Ripple),
            EffectOptions::Ripple(RippleOptions::default())
        );
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = EffectRegistry::new();
        registry.register(
            EffectKind::Ripple,
            noop_handler,
            RippleOptions {
                duration: Some(100.0),
                ..Default::default()
            }
            .into(),
        );
        registry.register(
            EffectKind::Ripple,
            noop_handler,
            RippleOptions {
                duration: Some(900.0),
                ..Default::default()
            }
            .into(),
        );

        let defaults = registry.resolve_defaults(EffectKind::Ripple);
        assert_eq!(defaults.as_ripple().and_then(|o| o.duration), Some(900.0));
        assert_eq!(registry.kinds().len(), 1);
    }

    #[test]
    fn test_mismatched_defaults_become_empty() {
        let registry = EffectRegistry::new();
        registry.register(
            EffectKind::Ripple,
            noop_handler,
            FadeOptions::default().into(),
        );
        assert_eq!(
            registry.resolve_defaults(EffectKind::Ripple).kind(),
            EffectKind::Ripple
        );
    }

    #[test]
    fn test_set_defaults() {
        let registry = EffectRegistry::with_builtin_effects();
        assert!(registry.set_defaults(
            RippleOptions {
                color: Some("red".to_string()),
                ..Default::default()
            }
            .into()
        ));
        assert!(!registry.set_defaults(FadeOptions::default().into()));
        let defaults = registry.resolve_defaults(EffectKind::Ripple);
        assert_eq!(
            defaults.as_ripple().and_then(|o| o.color.clone()),
            Some("red".to_string())
        );
    }
}
