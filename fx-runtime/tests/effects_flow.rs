//! # 效果链路集成测试
//!
//! 测试 Facade → Registry → Handler → 动画器 → Stage 的完整链路。
//! 所有测试使用固定种子的舞台，不依赖真实时间。

use std::cell::Cell;
use std::rc::Rc;

use fx_runtime::{
    BurningOptions, EffectBinding, EffectHandler, EffectKind, EffectOptions, EffectRegistry,
    EffectsRef, FireworkOptions, Rect, RippleOptions, Stage, Surface, Teardown, Vec2,
};

fn setup(rect: Rect) -> (Stage, Surface, Rc<EffectRegistry>) {
    let stage = Stage::with_seed(2024);
    let surface = stage.add_surface(rect);
    (stage, surface, Rc::new(EffectRegistry::with_builtin_effects()))
}

fn inactive(kind: EffectKind) -> EffectOptions {
    EffectOptions::empty(kind).with_active(false)
}

/// active: false 不产生粒子、监听器或定时器
#[test]
fn test_inactive_effects_are_noop() {
    for kind in [EffectKind::Ripple, EffectKind::Firework, EffectKind::Burning] {
        let (stage, surface, registry) = setup(Rect::sized(200.0, 100.0));

        let handler = registry.resolve_handler(kind).unwrap();
        let defaults = registry.resolve_defaults(kind);
        let mut teardown = handler.attach(&surface, &inactive(kind), &defaults);
        assert!(!teardown.is_pending(), "{kind}");

        let binding = EffectBinding::bind(registry.clone(), Some(&surface), inactive(kind));
        assert!(!binding.is_wired(), "{kind}");

        surface.dispatch_pointer_down(10.0, 10.0);
        stage.advance(5000.0);
        assert_eq!(surface.particle_count(), 0, "{kind}");
        assert_eq!(surface.listener_count(), 0, "{kind}");
        assert_eq!(stage.timer_count(), 0, "{kind}");
        assert_eq!(stage.stats().spawned, 0, "{kind}");
        teardown.run();
    }
}

/// 注册默认值中的 active: false 同样生效
#[test]
fn test_registered_inactive_default() {
    let (stage, surface, registry) = setup(Rect::sized(200.0, 100.0));
    registry.set_defaults(
        BurningOptions {
            active: Some(false),
            ..BurningOptions::builtin()
        }
        .into(),
    );
    let _binding = EffectBinding::bind(registry, Some(&surface), BurningOptions::default().into());
    stage.advance(2000.0);
    assert_eq!(stage.stats().spawned, 0);
    assert_eq!(stage.timer_count(), 0);
}

/// 注册默认值为 active: false 时，命令式触发仍然强制激活
#[test]
fn test_imperative_overrides_registered_inactive() {
    let (stage, surface, registry) = setup(Rect::sized(200.0, 100.0));
    registry.set_defaults(
        BurningOptions {
            active: Some(false),
            ..BurningOptions::builtin()
        }
        .into(),
    );
    let binding = EffectBinding::bind(registry, Some(&surface), BurningOptions::default().into());
    assert!(!binding.is_wired());
    assert_eq!(stage.stats().spawned, 0);

    binding.trigger_effect(EffectKind::Burning, BurningOptions::default().into());
    assert_eq!(surface.particle_count(), 15);
    assert_eq!(stage.timer_count(), 1);

    binding.unbind();
    assert_eq!(stage.timer_count(), 0);
}

/// n 次生成对应 n 批；清理后不再有 tick
#[test]
fn test_continuous_batches_and_teardown() {
    let (stage, surface, registry) = setup(Rect::sized(200.0, 100.0));
    let batches = Rc::new(Cell::new(0));

    // 包装 burning 处理器以统计批次
    let inner = registry.resolve_handler(EffectKind::Burning).unwrap();
    let counter = batches.clone();
    registry.register(
        EffectKind::Burning,
        move |surface: &Surface, options: &EffectOptions, defaults: &EffectOptions| -> Teardown {
            counter.set(counter.get() + 1);
            inner.attach(surface, options, defaults)
        },
        BurningOptions::builtin().into(),
    );

    let binding = EffectBinding::bind(
        registry,
        Some(&surface),
        BurningOptions {
            duration: Some(900.0),
            ..Default::default()
        }
        .into(),
    );
    assert_eq!(batches.get(), 1);

    // 周期 300ms：900ms 内 1 + 3 批，每批 15 个
    stage.advance(900.0);
    assert_eq!(stage.stats().spawned, 4 * 15);

    binding.unbind();
    assert_eq!(stage.timer_count(), 0);
    let spawned = stage.stats().spawned;
    stage.advance(10_000.0);
    assert_eq!(stage.stats().spawned, spawned);
    assert_eq!(surface.particle_count(), 0);
    assert_eq!(stage.stats().alive(), 0);
}

/// 合并优先级：调用方 > 注册默认值 > 兜底值
#[test]
fn test_merge_precedence() {
    // 调用方与注册默认值都缺省：兜底 600
    let (stage, surface, registry) = setup(Rect::sized(100.0, 50.0));
    registry.set_defaults(RippleOptions::default().into());
    let _binding = EffectBinding::bind(registry.clone(), Some(&surface), RippleOptions::default().into());
    surface.dispatch_pointer_down(50.0, 25.0);
    assert_eq!(surface.particles()[0].spec.duration_ms, 600.0);
    stage.advance(600.0);

    // 仅调用方缺省：注册默认值
    registry.set_defaults(
        RippleOptions {
            duration: Some(450.0),
            ..Default::default()
        }
        .into(),
    );
    let second = stage.add_surface(Rect::sized(100.0, 50.0));
    let _binding = EffectBinding::bind(registry.clone(), Some(&second), RippleOptions::default().into());
    second.dispatch_pointer_down(50.0, 25.0);
    assert_eq!(second.particles()[0].spec.duration_ms, 450.0);

    // 调用方指定
    let third = stage.add_surface(Rect::sized(100.0, 50.0));
    let _binding = EffectBinding::bind(
        registry,
        Some(&third),
        RippleOptions {
            duration: Some(120.0),
            ..Default::default()
        }
        .into(),
    );
    third.dispatch_pointer_down(50.0, 25.0);
    assert_eq!(third.particles()[0].spec.duration_ms, 120.0);
}

/// 粒子数随强度缩放
#[test]
fn test_particle_count_scaling() {
    let (_stage, surface, registry) = setup(Rect::sized(200.0, 100.0));
    let binding = EffectBinding::bind(registry, Some(&surface), RippleOptions::default().into());

    binding.trigger_effect(
        EffectKind::Firework,
        FireworkOptions {
            intensity: Some(2.0),
            ..Default::default()
        }
        .into(),
    );
    assert_eq!(surface.particle_count(), 40);
    binding.unbind();

    binding.trigger_effect(
        EffectKind::Burning,
        BurningOptions {
            intensity: Some(0.5),
            ..Default::default()
        }
        .into(),
    );
    assert_eq!(surface.particle_count(), 7);
}

/// 100×50 表面，在 (60, 30) 按下：一个粒子，600ms 后移除
#[test]
fn test_ripple_end_to_end() {
    let (stage, surface, registry) = setup(Rect::sized(100.0, 50.0));
    let _binding = EffectBinding::bind(registry, Some(&surface), RippleOptions::default().into());

    surface.dispatch_pointer_down(60.0, 30.0);
    let particles = surface.particles();
    assert_eq!(particles.len(), 1);

    let spec = &particles[0].spec;
    assert_eq!(spec.width, 100.0);
    assert_eq!(spec.start, Vec2::new(60.0 - 50.0, 30.0 - 50.0));
    assert_eq!(spec.color, "rgba(0, 0, 0, 0.1)");

    stage.advance(599.0);
    assert_eq!(surface.particle_count(), 1);
    stage.advance(1.0);
    assert_eq!(surface.particle_count(), 0);
    assert_eq!(stage.stats().removed, 1);
}

/// 向内的 firework：20 个粒子从边框出发，收拢到中心并淡出
#[test]
fn test_inverted_firework_end_to_end() {
    let (stage, surface, registry) = setup(Rect::sized(200.0, 100.0));
    let binding = EffectBinding::bind(registry, Some(&surface), RippleOptions::default().into());
    binding.trigger_effect(
        EffectKind::Firework,
        FireworkOptions {
            inverted: Some(true),
            intensity: Some(1.0),
            ..Default::default()
        }
        .into(),
    );

    let rect = surface.rect().unwrap();
    let particles = surface.particles();
    assert_eq!(particles.len(), 20);
    for view in &particles {
        assert!(rect.is_on_border(view.spec.start, 1e-9));
        let end = view.spec.end();
        let center = rect.local_center();
        assert!((end.x - center.x).abs() < 1e-9 && (end.y - center.y).abs() < 1e-9);
        assert_eq!(view.spec.final_opacity(), Some(0.0));
    }

    binding.unbind();
    stage.advance(2000.0);
    assert_eq!(stage.stats().alive(), 0);
}

/// 片段中途的采样帧位于首末帧之间
#[test]
fn test_clip_midway_frame() {
    let (stage, surface, _registry) = setup(Rect::sized(100.0, 100.0));
    fx_runtime::trigger_ripple(
        &surface,
        &RippleOptions {
            duration: Some(1000.0),
            ..Default::default()
        },
    );

    stage.advance(500.0);
    let frame = surface.particles()[0].frame.unwrap();
    assert!(frame.scale > 0.0 && frame.scale < 2.5);
    assert!(frame.opacity > 0.0 && frame.opacity < 0.3);
}

/// 移除表面后，持续效果的 tick 与清理都是空操作
#[test]
fn test_surface_removed_while_spawning() {
    let (stage, surface, registry) = setup(Rect::sized(200.0, 100.0));
    let binding = EffectBinding::bind(registry, Some(&surface), FireworkOptions::default().into());
    assert_eq!(surface.particle_count(), 20);

    stage.remove_surface(surface.id());
    stage.advance(2000.0);
    assert_eq!(stage.particle_count(), 0);

    binding.unbind();
    assert_eq!(stage.timer_count(), 0);
}
