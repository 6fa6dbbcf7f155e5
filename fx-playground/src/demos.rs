//! # Demos 模块
//!
//! 内置演示场景，随二进制一起编译。

use crate::scenario::{Scenario, ScenarioError};

/// 内置演示：名称 + 场景 JSON
const BUILTIN: [(&str, &str); 3] = [
    ("ripple-remote", include_str!("../scenarios/ripple-remote.json")),
    ("firework", include_str!("../scenarios/firework.json")),
    ("burning", include_str!("../scenarios/burning.json")),
];

/// 全部演示名称
pub fn demo_names() -> Vec<&'static str> {
    BUILTIN.iter().map(|(name, _)| *name).collect()
}

/// 按名称加载演示场景
pub fn load_demo(name: &str) -> Result<Scenario, ScenarioError> {
    let (_, text) = BUILTIN
        .iter()
        .find(|(demo, _)| *demo == name)
        .ok_or_else(|| ScenarioError::UnknownDemo {
            name: name.to_string(),
            available: demo_names().join(", "),
        })?;
    Scenario::from_json(text)
}
