//! # Facade 模块
//!
//! 表现层组件使用的入口：
//!
//! - [`EffectBinding`]：把效果绑定到表面（声明式），并提供命令式的
//!   [`trigger_effect`](EffectsRef::trigger_effect)
//! - [`trigger_ripple`] / [`trigger_firework`] / [`trigger_burning`]：
//!   绕过处理器直接调用动画器，用于"远程"效果（在另一个元素上播放）
//!
//! 命令式调用总是强制 `active: true`。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::effects::{
    BurningOptions, BurningParams, EffectKind, EffectOptions, EffectRegistry, FireworkOptions,
    FireworkParams, RippleOptions, RippleParams, Teardown, animate_burning, animate_firework,
    animate_ripple,
};
use crate::error::EffectResult;
use crate::stage::Surface;

/// 可向上层转发的命令式句柄
pub trait EffectsRef {
    /// 立即触发一次效果
    ///
    /// 表面缺失或效果未注册时为空操作（后者记录警告）。
    /// 持续效果每触发一次就多启动一个实例，实例叠加运行，直到解除绑定。
    fn trigger_effect(&self, kind: EffectKind, options: EffectOptions);
}

/// 绑定到表面的效果
///
/// 丢弃时自动执行 [`unbind`](EffectBinding::unbind)。
pub struct EffectBinding {
    registry: Rc<EffectRegistry>,
    surface: Option<Surface>,
    options: EffectOptions,
    /// 声明式挂载的清理句柄
    wired: RefCell<Teardown>,
    /// 命令式启动、仍需停止的实例（持续效果）
    imperative: RefCell<Vec<Teardown>>,
}

impl std::fmt::Debug for EffectBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectBinding")
            .field("surface", &self.surface)
            .field("options", &self.options)
            .field("wired", &self.is_wired())
            .field("imperative", &self.imperative.borrow().len())
            .finish()
    }
}

impl EffectBinding {
    /// 绑定效果
    ///
    /// `options` 的类型决定挂载哪个处理器；`active: false`、表面缺失
    /// 或效果未注册时不挂载任何东西，但仍可以命令式触发。
    pub fn bind(registry: Rc<EffectRegistry>, surface: Option<&Surface>, options: EffectOptions) -> Self {
        let binding = Self {
            registry,
            surface: surface.cloned(),
            options,
            wired: RefCell::new(Teardown::noop()),
            imperative: RefCell::new(Vec::new()),
        };
        binding.wire();
        binding
    }

    fn wire(&self) {
        let Some(surface) = self.live_surface() else {
            debug!(effect = %self.options.kind(), "表面不可用，跳过挂载");
            return;
        };
        if self.options.active() == Some(false) {
            return;
        }

        let kind = self.options.kind();
        let Some(handler) = self.registry.resolve_handler(kind) else {
            warn!(effect = %kind, "效果未注册，跳过挂载");
            return;
        };
        let defaults = self.registry.resolve_defaults(kind);
        let teardown = handler.attach(&surface, &self.options, &defaults);
        debug!(effect = %kind, surface = %surface.id(), wired = teardown.is_pending(), "效果已绑定");
        *self.wired.borrow_mut() = teardown;
    }

    fn live_surface(&self) -> Option<Surface> {
        self.surface.clone().filter(Surface::is_alive)
    }

    /// 绑定时的选项
    pub fn options(&self) -> &EffectOptions {
        &self.options
    }

    /// 绑定的表面
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// 声明式处理器是否仍在运行
    pub fn is_wired(&self) -> bool {
        self.wired.borrow().is_pending()
    }

    /// 停止声明式处理器及所有命令式启动的实例（幂等）
    pub fn unbind(&self) {
        let mut wired = std::mem::take(&mut *self.wired.borrow_mut());
        let imperative = std::mem::take(&mut *self.imperative.borrow_mut());
        let pending = usize::from(wired.is_pending()) + imperative.len();

        wired.run();
        for mut teardown in imperative {
            teardown.run();
        }
        if pending > 0 {
            debug!(effect = %self.options.kind(), pending, "绑定已解除");
        }
    }

    /// 按名称触发；选项为 JSON 对象（可省略）
    ///
    /// 名称未知或选项无法解析时记录警告并返回错误。
    pub fn trigger_named(&self, name: &str, options: Option<serde_json::Value>) -> EffectResult<()> {
        let parsed = name.parse::<EffectKind>().and_then(|kind| match options {
            Some(value) => EffectOptions::from_json(kind, value),
            None => Ok(EffectOptions::empty(kind)),
        });
        match parsed {
            Ok(options) => {
                self.trigger_effect(options.kind(), options);
                Ok(())
            }
            Err(e) => {
                warn!(name, error = %e, "命令式触发失败");
                Err(e)
            }
        }
    }

    /// 合并绑定选项与调用选项，并把 ripple 的 x/y 偏移换算为 client 坐标
    fn merge_call(&self, surface: &Surface, kind: EffectKind, call: EffectOptions) -> EffectOptions {
        let call = match call.ensure_kind(kind) {
            Ok(()) => call,
            Err(e) => {
                warn!(effect = %kind, error = %e, "调用选项已忽略");
                EffectOptions::empty(kind)
            }
        };
        let mut merged = if self.options.kind() == kind {
            self.options.overlay(&call)
        } else {
            call
        };

        if let EffectOptions::Ripple(ripple) = &mut merged
            && let (Some(x), Some(y)) = (ripple.x, ripple.y)
            && let Some(rect) = surface.rect()
        {
            ripple.client_x = Some(rect.left + x);
            ripple.client_y = Some(rect.top + y);
            ripple.x = None;
            ripple.y = None;
        }
        merged.with_active(true)
    }
}

impl EffectsRef for EffectBinding {
    fn trigger_effect(&self, kind: EffectKind, options: EffectOptions) {
        let Some(surface) = self.live_surface() else {
            debug!(effect = %kind, "表面不可用，忽略触发");
            return;
        };
        let Some(handler) = self.registry.resolve_handler(kind) else {
            warn!(effect = %kind, "效果未注册，忽略触发");
            return;
        };

        let merged = self.merge_call(&surface, kind, options);
        let defaults = self.registry.resolve_defaults(kind);
        let teardown = handler.fire(&surface, &merged, &defaults);
        debug!(effect = %kind, surface = %surface.id(), "效果已触发");
        if teardown.is_pending() {
            self.imperative.borrow_mut().push(teardown);
        }
    }
}

impl<T: EffectsRef + ?Sized> EffectsRef for Rc<T> {
    fn trigger_effect(&self, kind: EffectKind, options: EffectOptions) {
        (**self).trigger_effect(kind, options);
    }
}

impl Drop for EffectBinding {
    fn drop(&mut self) {
        self.unbind();
    }
}

// ========== 直接触发 ==========

/// 在表面上播放一次水波纹（不挂监听器）
pub fn trigger_ripple(surface: &Surface, options: &RippleOptions) -> Option<Teardown> {
    animate_ripple(
        surface,
        &RippleParams::resolve(options, &RippleOptions::builtin()),
    )
}

/// 在表面上生成一批 firework 粒子（不启动定时器）
pub fn trigger_firework(surface: &Surface, options: &FireworkOptions) -> Option<Teardown> {
    animate_firework(
        surface,
        &FireworkParams::resolve(options, &FireworkOptions::builtin()),
    )
}

/// 在表面上生成一批火苗（不启动定时器）
pub fn trigger_burning(surface: &Surface, options: &BurningOptions) -> Option<Teardown> {
    animate_burning(
        surface,
        &BurningParams::resolve(options, &BurningOptions::builtin()),
    )
}
