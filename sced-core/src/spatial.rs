//! 顶点最近点查询。
//!
//! 均匀网格哈希：建立一次，拖动结束后用 [`PointIndex::relocate`] 原位更新单个顶点。

use std::collections::HashMap;

use glam::DVec3;

use crate::geometry::{Bounds3D, Point3};

type Cell = (i64, i64, i64);

/// 超过该环数仍未确定最近点时退回线性扫描。
const MAX_SHELLS: i64 = 16;

#[derive(Debug, Clone)]
pub struct PointIndex {
    points: Vec<Point3>,
    cells: HashMap<Cell, Vec<usize>>,
    origin: DVec3,
    cell_size: f64,
}

impl PointIndex {
    pub fn build(points: &[Point3]) -> Self {
        let bounds = Bounds3D::from_points(points.iter());
        let (origin, cell_size) = match bounds {
            Some(bounds) => {
                let extent = bounds.size().as_vec3().max_element();
                let per_axis = (points.len() as f64).cbrt().max(1.0);
                let size = extent / per_axis;
                let size = if size.is_finite() && size > f64::EPSILON { size } else { 1.0 };
                (bounds.min().as_vec3(), size)
            }
            None => (DVec3::ZERO, 1.0),
        };

        let mut index = Self {
            points: points.to_vec(),
            cells: HashMap::new(),
            origin,
            cell_size,
        };
        for (i, point) in points.iter().enumerate() {
            let cell = index.cell_of(*point);
            index.cells.entry(cell).or_default().push(i);
        }
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    fn cell_of(&self, point: Point3) -> Cell {
        let local = (point.as_vec3() - self.origin) / self.cell_size;
        (
            local.x.floor() as i64,
            local.y.floor() as i64,
            local.z.floor() as i64,
        )
    }

    /// 返回距 `query` 最近的顶点下标；距离相同时取较小下标。
    pub fn nearest(&self, query: Point3) -> Option<usize> {
        if self.points.is_empty() || !query.is_finite() {
            return None;
        }
        let center = self.cell_of(query);
        let mut best: Option<(f64, usize)> = None;

        for radius in 0..=MAX_SHELLS {
            for (dx, dy, dz) in shell(radius) {
                let cell = (center.0 + dx, center.1 + dy, center.2 + dz);
                let Some(members) = self.cells.get(&cell) else {
                    continue;
                };
                for &i in members {
                    let distance = self.points[i].distance(query);
                    best = match best {
                        Some((d, j)) if d < distance || (d == distance && j < i) => Some((d, j)),
                        _ => Some((distance, i)),
                    };
                }
            }
            // 第 r 环之外的点距离至少为 r 个格宽。
            if let Some((distance, index)) = best {
                if distance < radius as f64 * self.cell_size {
                    return Some(index);
                }
            }
        }
        self.linear_nearest(query)
    }

    fn linear_nearest(&self, query: Point3) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (i, point) in self.points.iter().enumerate() {
            let distance = point.distance(query);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, i));
            }
        }
        best.map(|(_, i)| i)
    }

    /// 移动一个顶点并更新其所在格子。
    pub fn relocate(&mut self, index: usize, position: Point3) -> bool {
        let Some(old) = self.points.get(index).copied() else {
            return false;
        };
        let from = self.cell_of(old);
        let to = self.cell_of(position);
        self.points[index] = position;
        if from != to {
            if let Some(members) = self.cells.get_mut(&from) {
                members.retain(|&i| i != index);
                if members.is_empty() {
                    self.cells.remove(&from);
                }
            }
            self.cells.entry(to).or_default().push(index);
        }
        true
    }
}

/// 切比雪夫距离恰为 `radius` 的格偏移。
fn shell(radius: i64) -> impl Iterator<Item = (i64, i64, i64)> {
    (-radius..=radius).flat_map(move |dx| {
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).filter_map(move |dz| {
                let on_shell = dx.abs() == radius || dy.abs() == radius || dz.abs() == radius;
                on_shell.then_some((dx, dy, dz))
            })
        })
    })
}
