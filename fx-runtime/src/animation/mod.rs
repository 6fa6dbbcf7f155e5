//! # Animation 模块
//!
//! 粒子动画的时间轴原语（相当于宿主的动画片段能力）。
//!
//! ## 核心概念
//!
//! - `Keyframe`: 关键帧（平移、缩放、透明度、模糊）
//! - `Clip`: 单个粒子的动画片段，管理关键帧在 duration 内的推进
//! - `Easing`: 缓动函数
//!
//! 片段由 [`Stage`](crate::stage::Stage) 驱动；片段本身不持有任何节点。

mod clip;
mod easing;
mod keyframe;

pub use clip::{Clip, ClipState};
pub use easing::Easing;
pub use keyframe::{Frame, Keyframe, resolve_offsets, sample};
