//! # Scenario 模块
//!
//! 场景文件：声明表面、效果绑定与按顺序执行的步骤。
//!
//! ```json
//! {
//!   "name": "ripple-remote",
//!   "surfaces": [{ "name": "target", "rect": { "width": 320, "height": 48 } }],
//!   "bindings": [{ "surface": "target", "effect": "ripple" }],
//!   "steps": [
//!     { "step": "pointer_down", "surface": "target", "x": 40, "y": 20 },
//!     { "step": "advance", "ms": 600 }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use fx_runtime::{EffectError, EffectKind, EffectOptions, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub surfaces: Vec<SurfaceDecl>,
    #[serde(default)]
    pub bindings: Vec<BindingDecl>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// 表面声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDecl {
    pub name: String,
    pub rect: Rect,
}

/// 效果调用：名称 + 可选的 JSON 选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectCall {
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl EffectCall {
    /// 解析为具体选项
    pub fn parse(&self) -> Result<EffectOptions, EffectError> {
        let kind: EffectKind = self.effect.parse()?;
        match &self.options {
            Some(value) => EffectOptions::from_json(kind, value.clone()),
            None => Ok(EffectOptions::empty(kind)),
        }
    }
}

/// 声明式绑定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDecl {
    pub surface: String,
    #[serde(flatten)]
    pub call: EffectCall,
}

/// 场景步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// 在表面局部坐标处按下指针
    PointerDown { surface: String, x: f64, y: f64 },
    /// 通过表面上的绑定命令式触发
    Trigger {
        surface: String,
        #[serde(flatten)]
        call: EffectCall,
    },
    /// 直接触发函数（不经过绑定）
    Remote {
        surface: String,
        #[serde(flatten)]
        call: EffectCall,
    },
    /// 推进虚拟时间
    Advance { ms: f64 },
    /// 解除表面上的全部绑定
    Unbind { surface: String },
}

impl Step {
    /// 步骤引用的表面
    pub fn surface(&self) -> Option<&str> {
        match self {
            Step::PointerDown { surface, .. }
            | Step::Trigger { surface, .. }
            | Step::Remote { surface, .. }
            | Step::Unbind { surface } => Some(surface),
            Step::Advance { .. } => None,
        }
    }
}

impl Scenario {
    /// 从 JSON 文本解析
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// 校验表面引用、效果名称与选项
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut names = BTreeSet::new();
        for surface in &self.surfaces {
            if !names.insert(surface.name.as_str()) {
                return Err(ScenarioError::DuplicateSurface(surface.name.clone()));
            }
        }
        let known = |name: &str| -> Result<(), ScenarioError> {
            if names.contains(name) {
                Ok(())
            } else {
                Err(ScenarioError::UnknownSurface(name.to_string()))
            }
        };

        for binding in &self.bindings {
            known(&binding.surface)?;
            binding.call.parse()?;
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(surface) = step.surface() {
                known(surface)?;
            }
            match step {
                Step::Trigger { call, .. } => {
                    call.parse()?;
                }
                Step::Remote { call, .. } => {
                    let kind = call.parse()?.kind();
                    if !matches!(
                        kind,
                        EffectKind::Ripple | EffectKind::Firework | EffectKind::Burning
                    ) {
                        return Err(ScenarioError::UnsupportedRemote(kind));
                    }
                }
                Step::Advance { ms } if !ms.is_finite() || *ms < 0.0 => {
                    return Err(ScenarioError::InvalidStep {
                        index,
                        message: format!("advance 的时长必须为非负数，当前为 {}", ms),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// 全部 advance 步骤的总时长
    pub fn total_ms(&self) -> f64 {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Advance { ms } => *ms,
                _ => 0.0,
            })
            .sum()
    }
}

/// 场景错误
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("场景 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("场景解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("重复的表面名称 '{0}'")]
    DuplicateSurface(String),

    #[error("未声明的表面 '{0}'")]
    UnknownSurface(String),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("效果 '{0}' 没有直接触发函数")]
    UnsupportedRemote(EffectKind),

    #[error("第 {index} 步无效 - {message}")]
    InvalidStep { index: usize, message: String },

    #[error("帧长必须为正数，当前为 {0}")]
    InvalidFrame(f64),

    #[error("未知演示 '{name}'，可用演示：{available}")]
    UnknownDemo { name: String, available: String },
}
