//! # Geometry 模块
//!
//! 表面几何：二维向量与包围矩形。
//!
//! 坐标约定：
//! - **client 坐标**：相对于视口左上角（指针事件、`Rect.left/top` 使用）
//! - **local 坐标**：相对于表面左上角（粒子的 `left/top` 使用）

use serde::{Deserialize, Serialize};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// 创建新的向量
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 零向量
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// 线性插值
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// 按分量缩放
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 包围矩形（`getBoundingClientRect` 的等价物）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// 视口内的左边界
    #[serde(default)]
    pub left: f64,
    /// 视口内的上边界
    #[serde(default)]
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// 创建矩形
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// 以原点为左上角的矩形
    pub const fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// 表面局部坐标系下的几何中心
    pub fn local_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// 较长边
    pub fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }

    /// 较短边
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// 周长
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    /// client 坐标转换为表面局部坐标
    pub fn to_local(&self, client: Vec2) -> Vec2 {
        Vec2::new(client.x - self.left, client.y - self.top)
    }

    /// 局部点是否位于边框上（容差 `eps`）
    pub fn is_on_border(&self, local: Vec2, eps: f64) -> bool {
        let within_x = local.x >= -eps && local.x <= self.width + eps;
        let within_y = local.y >= -eps && local.y <= self.height + eps;
        let on_vertical = local.x.abs() <= eps || (local.x - self.width).abs() <= eps;
        let on_horizontal = local.y.abs() <= eps || (local.y - self.height).abs() <= eps;
        within_x && within_y && (on_vertical || on_horizontal)
    }
}
