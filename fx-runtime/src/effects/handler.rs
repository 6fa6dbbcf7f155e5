//! # Effect Handler
//!
//! 每个效果名称注册的处理器。处理器决定效果由什么驱动：
//!
//! - **事件驱动**（ripple）：`Idle → Listening`，每次指针按下调用一次动画器，
//!   清理时移除监听器（`Listening → Idle`）
//! - **持续**（firework / burning）：`Idle → Spawning → Stopped`，挂载时立即生成一批，
//!   随后以 `duration / k` 为周期重复生成；清理时停止定时器并清理最近一批
//!
//! 处理器负责把调用方选项合并到注册默认值之上。

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use super::options::{EffectOptions, RippleOptions};
use super::particle::Teardown;
use super::registry::EffectKind;
use super::ripple::{RippleParams, animate_ripple};
use crate::stage::{Surface, TimerId};

/// 效果处理器
pub trait EffectHandler {
    /// 声明式挂载，返回停止该实例的清理句柄
    ///
    /// `options` 为调用方选项，`defaults` 为注册默认值。
    fn attach(&self, surface: &Surface, options: &EffectOptions, defaults: &EffectOptions)
    -> Teardown;

    /// 命令式触发一次（绕过监听器）
    ///
    /// 返回的句柄只在需要显式停止时才是 pending 的。
    fn fire(&self, surface: &Surface, options: &EffectOptions, defaults: &EffectOptions) -> Teardown {
        self.attach(surface, options, defaults)
    }
}

impl<F> EffectHandler for F
where
    F: Fn(&Surface, &EffectOptions, &EffectOptions) -> Teardown,
{
    fn attach(
        &self,
        surface: &Surface,
        options: &EffectOptions,
        defaults: &EffectOptions,
    ) -> Teardown {
        self(surface, options, defaults)
    }
}

// ========== 事件驱动 ==========

/// Ripple 处理器：指针按下时在按下位置生成水波纹
#[derive(Debug, Clone, Copy, Default)]
pub struct RippleHandler;

impl RippleHandler {
    fn split(options: &EffectOptions, defaults: &EffectOptions) -> (RippleOptions, RippleOptions) {
        (
            options.as_ripple().cloned().unwrap_or_default(),
            defaults.as_ripple().cloned().unwrap_or_default(),
        )
    }
}

impl EffectHandler for RippleHandler {
    fn attach(
        &self,
        surface: &Surface,
        options: &EffectOptions,
        defaults: &EffectOptions,
    ) -> Teardown {
        let (call, defaults) = Self::split(options, defaults);
        if !RippleParams::resolve(&call, &defaults).active {
            return Teardown::noop();
        }

        let target = surface.clone();
        let listener = surface.add_pointer_listener(move |event| {
            let at_pointer = call.overlay(&RippleOptions {
                client_x: Some(event.client_x),
                client_y: Some(event.client_y),
                ..Default::default()
            });
            animate_ripple(&target, &RippleParams::resolve(&at_pointer, &defaults));
        });
        let Some(listener) = listener else {
            return Teardown::noop();
        };
        tracing::debug!(surface = %surface.id(), %listener, "ripple 监听已挂载");

        let surface = surface.clone();
        Teardown::new(move || {
            surface.remove_listener(listener);
            tracing::debug!(surface = %surface.id(), %listener, "ripple 监听已移除");
        })
    }

    /// 单个水波纹自行移除，没有需要停止的东西
    fn fire(&self, surface: &Surface, options: &EffectOptions, defaults: &EffectOptions) -> Teardown {
        let (call, defaults) = Self::split(options, defaults);
        animate_ripple(surface, &RippleParams::resolve(&call, &defaults));
        Teardown::noop()
    }
}

// ========== 持续 ==========

/// 持续效果的动画器接口
pub trait ContinuousAnimator: 'static {
    /// 已解析的参数
    type Params: Clone + 'static;

    /// 效果类型
    const KIND: EffectKind;

    /// 重复周期 = duration / RESPAWN_DIVISOR
    const RESPAWN_DIVISOR: f64;

    /// 三级覆盖链解析；选项类型不匹配时按空选项处理
    fn resolve(options: &EffectOptions, defaults: &EffectOptions) -> Self::Params;

    fn is_active(params: &Self::Params) -> bool;

    fn duration_ms(params: &Self::Params) -> f64;

    /// 生成一批粒子，返回该批次的清理句柄
    fn spawn(surface: &Surface, params: &Self::Params) -> Option<Teardown>;
}

/// 持续效果实例的可变状态
///
/// 不变式：`interval` 非空当且仅当实例处于 Spawning。
/// `last_cleanup` 只指向最近一批；更早的批次依靠各自片段完成时自行移除。
#[derive(Debug, Default)]
struct InstanceState {
    interval: Option<TimerId>,
    last_cleanup: Option<Teardown>,
}

/// 持续效果处理器（firework / burning）
pub struct ContinuousHandler<A>(PhantomData<A>);

impl<A> ContinuousHandler<A> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A> Default for ContinuousHandler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for ContinuousHandler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContinuousHandler")
    }
}

impl<A: ContinuousAnimator> EffectHandler for ContinuousHandler<A> {
    fn attach(
        &self,
        surface: &Surface,
        options: &EffectOptions,
        defaults: &EffectOptions,
    ) -> Teardown {
        let params = A::resolve(options, defaults);
        if !A::is_active(&params) || !surface.is_alive() {
            return Teardown::noop();
        }

        let state = Rc::new(RefCell::new(InstanceState::default()));
        let first = A::spawn(surface, &params);
        state.borrow_mut().last_cleanup = first;

        let period = A::duration_ms(&params) / A::RESPAWN_DIVISOR;
        let tick = {
            let surface = surface.clone();
            let state = state.clone();
            move || {
                let batch = A::spawn(&surface, &params);
                state.borrow_mut().last_cleanup = batch;
            }
        };
        state.borrow_mut().interval = surface.set_interval(period, tick);
        tracing::debug!(effect = %A::KIND, surface = %surface.id(), period, "持续效果已启动");

        let surface = surface.clone();
        Teardown::new(move || {
            let (interval, last) = {
                let mut state = state.borrow_mut();
                (state.interval.take(), state.last_cleanup.take())
            };
            if let Some(id) = interval {
                surface.clear_interval(id);
            }
            if let Some(mut cleanup) = last {
                cleanup.run();
            }
            tracing::debug!(effect = %A::KIND, surface = %surface.id(), "持续效果已停止");
        })
    }
}
