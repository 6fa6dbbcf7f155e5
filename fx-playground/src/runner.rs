//! # Runner 模块
//!
//! 在无头舞台上逐帧执行场景，并汇总运行报告。
//!
//! ```text
//! Scenario ──► 表面 + 绑定 ──► 步骤（指针 / 触发 / 远程 / 推进 / 解绑）
//!                                  │
//!                          advance 按 frame_ms 切片，每帧采样存活粒子数
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use fx_runtime::{
    EffectBinding, EffectOptions, EffectRegistry, EffectsRef, Stage, Surface, trigger_burning,
    trigger_firework, trigger_ripple,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PlaygroundConfig;
use crate::scenario::{EffectCall, Scenario, ScenarioError, Step};

/// 单帧采样
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSample {
    /// 虚拟时间（毫秒）
    pub t_ms: f64,
    /// 各表面的存活粒子数
    pub alive: BTreeMap<String, usize>,
}

/// 运行报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// 场景结束时的虚拟时间
    pub duration_ms: f64,
    /// 累计生成
    pub spawned: usize,
    /// 累计移除
    pub removed: usize,
    /// 场景结束时仍存活
    pub alive: usize,
    /// 单帧最大存活数
    pub peak_alive: usize,
    pub timeline: Vec<TimelineSample>,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "场景: {}",
            self.scenario.as_deref().unwrap_or("<未命名>")
        )?;
        if let Some(seed) = self.seed {
            writeln!(f, "种子: {}", seed)?;
        }
        writeln!(f, "时长: {} ms（{} 帧）", self.duration_ms, self.timeline.len())?;
        write!(
            f,
            "粒子: 生成 {}，移除 {}，存活 {}，峰值 {}",
            self.spawned, self.removed, self.alive, self.peak_alive
        )
    }
}

/// 场景执行器
pub struct ScenarioRunner {
    registry: Rc<EffectRegistry>,
    seed: Option<u64>,
    frame_ms: f64,
}

impl ScenarioRunner {
    /// 按配置创建执行器（内置效果 + 配置默认值）
    pub fn new(config: &PlaygroundConfig) -> Self {
        let registry = EffectRegistry::with_builtin_effects();
        config.apply_defaults(&registry);
        Self {
            registry: Rc::new(registry),
            seed: config.seed,
            frame_ms: config.frame_ms,
        }
    }

    /// 使用的注册表
    pub fn registry(&self) -> &Rc<EffectRegistry> {
        &self.registry
    }

    /// 执行场景
    ///
    /// 帧长不是正数时拒绝执行。
    pub fn run(&self, scenario: &Scenario) -> Result<RunReport, ScenarioError> {
        if !self.frame_ms.is_finite() || self.frame_ms <= 0.0 {
            return Err(ScenarioError::InvalidFrame(self.frame_ms));
        }
        scenario.validate()?;
        let stage = match self.seed {
            Some(seed) => Stage::with_seed(seed),
            None => Stage::new(),
        };
        info!(
            scenario = scenario.name.as_deref().unwrap_or("<未命名>"),
            surfaces = scenario.surfaces.len(),
            steps = scenario.steps.len(),
            "开始执行场景"
        );

        let mut run = Run {
            stage,
            registry: self.registry.clone(),
            frame_ms: self.frame_ms,
            surfaces: BTreeMap::new(),
            bindings: BTreeMap::new(),
            timeline: Vec::new(),
        };

        for decl in &scenario.surfaces {
            let surface = run.stage.add_surface(decl.rect);
            run.surfaces.insert(decl.name.clone(), surface);
        }
        for decl in &scenario.bindings {
            let options = decl.call.parse()?;
            run.bind(&decl.surface, options)?;
        }
        for (index, step) in scenario.steps.iter().enumerate() {
            debug!(index, ?step, "执行步骤");
            run.step(step)?;
        }

        let stats = run.stage.stats();
        let report = RunReport {
            scenario: scenario.name.clone(),
            seed: self.seed,
            duration_ms: run.stage.now_ms(),
            spawned: stats.spawned,
            removed: stats.removed,
            alive: stats.alive(),
            peak_alive: run
                .timeline
                .iter()
                .map(|sample| sample.alive.values().sum())
                .max()
                .unwrap_or(0),
            timeline: std::mem::take(&mut run.timeline),
        };
        info!(spawned = report.spawned, alive = report.alive, "场景执行完成");
        Ok(report)
    }
}

/// 单次执行的状态
///
/// 丢弃时绑定先于舞台解除。
struct Run {
    bindings: BTreeMap<String, Vec<EffectBinding>>,
    surfaces: BTreeMap<String, Surface>,
    stage: Stage,
    registry: Rc<EffectRegistry>,
    frame_ms: f64,
    timeline: Vec<TimelineSample>,
}

impl Run {
    fn surface(&self, name: &str) -> Result<&Surface, ScenarioError> {
        self.surfaces
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownSurface(name.to_string()))
    }

    fn bind(&mut self, name: &str, options: EffectOptions) -> Result<(), ScenarioError> {
        let surface = self.surface(name)?.clone();
        let binding = EffectBinding::bind(self.registry.clone(), Some(&surface), options);
        self.bindings.entry(name.to_string()).or_default().push(binding);
        Ok(())
    }

    fn step(&mut self, step: &Step) -> Result<(), ScenarioError> {
        match step {
            Step::PointerDown { surface, x, y } => {
                let surface = self.surface(surface)?;
                if let Some(rect) = surface.rect() {
                    surface.dispatch_pointer_down(rect.left + x, rect.top + y);
                }
            }
            Step::Trigger { surface, call } => self.trigger(surface, call)?,
            Step::Remote { surface, call } => self.remote(surface, call)?,
            Step::Advance { ms } => self.advance(*ms),
            Step::Unbind { surface } => {
                for binding in self.bindings.remove(surface).unwrap_or_default() {
                    binding.unbind();
                }
            }
        }
        Ok(())
    }

    /// 通过绑定触发；表面没有绑定时创建一个只用于命令式触发的绑定
    fn trigger(&mut self, name: &str, call: &EffectCall) -> Result<(), ScenarioError> {
        let options = call.parse()?;
        if !self.bindings.contains_key(name) {
            let passive = EffectOptions::empty(options.kind()).with_active(false);
            self.bind(name, passive)?;
        }
        if let Some(binding) = self.bindings.get(name).and_then(|b| b.first()) {
            binding.trigger_effect(options.kind(), options);
        }
        Ok(())
    }

    fn remote(&self, name: &str, call: &EffectCall) -> Result<(), ScenarioError> {
        let surface = self.surface(name)?;
        // 直接触发的粒子自行移除，批次清理句柄不需要保留
        let _batch = match call.parse()? {
            EffectOptions::Ripple(options) => trigger_ripple(surface, &options),
            EffectOptions::Firework(options) => trigger_firework(surface, &options),
            EffectOptions::Burning(options) => trigger_burning(surface, &options),
            other => return Err(ScenarioError::UnsupportedRemote(other.kind())),
        };
        Ok(())
    }

    fn advance(&mut self, ms: f64) {
        let mut remaining = ms;
        while remaining > 0.0 {
            let dt = remaining.min(self.frame_ms);
            self.stage.advance(dt);
            remaining -= dt;
            self.sample();
        }
    }

    fn sample(&mut self) {
        let alive = self
            .surfaces
            .iter()
            .map(|(name, surface)| (name.clone(), surface.particle_count()))
            .collect();
        self.timeline.push(TimelineSample {
            t_ms: self.stage.now_ms(),
            alive,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(seed: u64) -> ScenarioRunner {
        ScenarioRunner::new(&PlaygroundConfig {
            seed: Some(seed),
            frame_ms: 100.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_ripple_click_lifecycle() {
        let scenario = Scenario::from_json(
            r#"{
                "surfaces": [{ "name": "button", "rect": { "left": 20, "top": 20, "width": 100, "height": 50 } }],
                "bindings": [{ "surface": "button", "effect": "ripple" }],
                "steps": [
                    { "step": "pointer_down", "surface": "button", "x": 60, "y": 30 },
                    { "step": "advance", "ms": 700 }
                ]
            }"#,
        )
        .unwrap();
        let report = runner(1).run(&scenario).unwrap();

        assert_eq!(report.spawned, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.alive, 0);
        assert_eq!(report.peak_alive, 1);
        assert_eq!(report.timeline.len(), 7);
        assert_eq!(report.timeline[4].alive["button"], 1);
        assert_eq!(report.timeline[5].alive["button"], 0);
    }

    #[test]
    fn test_trigger_without_binding() {
        let scenario = Scenario::from_json(
            r#"{
                "surfaces": [{ "name": "card", "rect": { "width": 200, "height": 100 } }],
                "steps": [
                    { "step": "trigger", "surface": "card", "effect": "firework", "options": { "duration": 1000 } },
                    { "step": "advance", "ms": 1000 },
                    { "step": "unbind", "surface": "card" },
                    { "step": "advance", "ms": 2000 }
                ]
            }"#,
        )
        .unwrap();
        let report = runner(2).run(&scenario).unwrap();

        // 立即一批，500ms 与 1000ms 各一批
        assert_eq!(report.spawned, 60);
        assert_eq!(report.alive, 0);
        assert_eq!(report.duration_ms, 3000.0);
    }

    #[test]
    fn test_remote_does_not_bind() {
        let scenario = Scenario::from_json(
            r#"{
                "surfaces": [{ "name": "card", "rect": { "width": 200, "height": 100 } }],
                "steps": [
                    { "step": "remote", "surface": "card", "effect": "burning", "options": { "intensity": 2 } },
                    { "step": "advance", "ms": 3000 }
                ]
            }"#,
        )
        .unwrap();
        let report = runner(3).run(&scenario).unwrap();
        assert_eq!(report.spawned, 30);
        assert_eq!(report.alive, 0);
    }

    #[test]
    fn test_config_defaults_apply() {
        let config: PlaygroundConfig = serde_json::from_str(
            r#"{ "seed": 4, "frame_ms": 50, "defaults": { "burning": { "intensity": 0.5 } } }"#,
        )
        .unwrap();
        let scenario = Scenario::from_json(
            r#"{
                "surfaces": [{ "name": "card", "rect": { "width": 200, "height": 100 } }],
                "bindings": [{ "surface": "card", "effect": "burning" }]
            }"#,
        )
        .unwrap();
        let report = ScenarioRunner::new(&config).run(&scenario).unwrap();
        assert_eq!(report.spawned, 7);
        assert!(report.timeline.is_empty());
    }

    #[test]
    fn test_non_positive_frame_is_rejected() {
        let scenario = Scenario::from_json(
            r#"{
                "surfaces": [{ "name": "card", "rect": { "width": 200, "height": 100 } }],
                "steps": [{ "step": "advance", "ms": 100 }]
            }"#,
        )
        .unwrap();
        for frame_ms in [0.0, -16.0, f64::NAN] {
            let runner = ScenarioRunner::new(&PlaygroundConfig {
                frame_ms,
                ..Default::default()
            });
            assert!(matches!(
                runner.run(&scenario),
                Err(ScenarioError::InvalidFrame(_))
            ));
        }
    }

    #[test]
    fn test_report_display() {
        let report = RunReport {
            scenario: Some("demo".to_string()),
            seed: Some(9),
            duration_ms: 1000.0,
            spawned: 20,
            removed: 15,
            alive: 5,
            peak_alive: 20,
            timeline: Vec::new(),
        };
        insta::assert_snapshot!(report.to_string(), @r"
        场景: demo
        种子: 9
        时长: 1000 ms（0 帧）
        粒子: 生成 20，移除 15，存活 5，峰值 20
        ");
    }
}
