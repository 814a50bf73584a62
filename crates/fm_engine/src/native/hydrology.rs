// crates/fm_engine/src/native/hydrology.rs

//! 水文条件化算法
//!
//! 填洼 (优先洪泛)、D8 流向、汇流累积。

use crate::error::{EngineError, EngineResult};
use fm_raster::RasterGrid;
use ndarray::Array2;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;

/// 填平区上的微小梯度, 保证填后流向可解
const FILL_EPSILON: f64 = 1e-6;

/// D8 方向编码 (ESRI 约定): E SE S SW W NW N NE
pub const D8_CODES: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
/// D8 邻元偏移 (行, 列), 与 [`D8_CODES`] 同序
pub const D8_OFFSETS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// 按方向编码取偏移
#[inline]
pub fn d8_offset(code: u8) -> Option<(isize, isize)> {
    D8_CODES
        .iter()
        .position(|&c| c == code)
        .map(|i| D8_OFFSETS[i])
}

#[derive(PartialEq)]
struct HeapCell {
    elev: f64,
    row: usize,
    col: usize,
}

impl Eq for HeapCell {}

impl PartialOrd for HeapCell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapCell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.elev
            .total_cmp(&other.elev)
            .then(self.row.cmp(&other.row))
            .then(self.col.cmp(&other.col))
    }
}

/// 优先洪泛填洼
///
/// 从域边缘向内处理，把每个洼地抬升到其溢出口高程并附加微小
/// 梯度。`z_limit` 为最大允许填深，抬升超限的像元保持原高程。
pub fn fill_sinks(dem: &RasterGrid, z_limit: Option<f64>) -> EngineResult<RasterGrid> {
    let rows = dem.rows();
    let cols = dem.cols();
    if rows == 0 || cols == 0 {
        return Err(EngineError::empty("Fill"));
    }

    let mut filled = dem.clone();
    let mut visited = Array2::from_elem((rows, cols), false);
    let mut heap: BinaryHeap<Reverse<HeapCell>> = BinaryHeap::new();

    let seed = |row: usize, col: usize, visited: &mut Array2<bool>, heap: &mut BinaryHeap<Reverse<HeapCell>>, filled: &RasterGrid| {
        if visited[[row, col]] {
            return;
        }
        visited[[row, col]] = true;
        if let Some(elev) = filled.get(row, col) {
            heap.push(Reverse(HeapCell { elev, row, col }));
        }
    };

    // 边缘像元作为种子; NoData 像元视为内部排水口
    for col in 0..cols {
        seed(0, col, &mut visited, &mut heap, &filled);
        seed(rows - 1, col, &mut visited, &mut heap, &filled);
    }
    for row in 0..rows {
        seed(row, 0, &mut visited, &mut heap, &filled);
        seed(row, cols - 1, &mut visited, &mut heap, &filled);
    }
    for row in 1..rows.saturating_sub(1) {
        for col in 1..cols.saturating_sub(1) {
            if filled.get(row, col).is_none() {
                visited[[row, col]] = true;
            }
        }
    }
    // NoData 内部空洞的邻元也要入堆, 否则洪泛无法到达
    for row in 1..rows - 1 {
        for col in 1..cols - 1 {
            if filled.get(row, col).is_none() {
                for (dr, dc) in D8_OFFSETS {
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                        continue;
                    }
                    seed(nr as usize, nc as usize, &mut visited, &mut heap, &filled);
                }
            }
        }
    }

    while let Some(Reverse(cell)) = heap.pop() {
        for (dr, dc) in D8_OFFSETS {
            let nr = cell.row as isize + dr;
            let nc = cell.col as isize + dc;
            if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if visited[[nr, nc]] {
                continue;
            }
            visited[[nr, nc]] = true;

            let Some(original) = filled.get(nr, nc) else {
                continue;
            };

            let mut elev = original;
            if original <= cell.elev {
                let target = cell.elev + FILL_EPSILON;
                let raise = target - original;
                let allowed = z_limit.map_or(true, |limit| raise <= limit);
                if allowed {
                    elev = target;
                    filled.set(nr, nc, target);
                }
            }
            heap.push(Reverse(HeapCell {
                elev,
                row: nr,
                col: nc,
            }));
        }
    }

    Ok(filled)
}

/// D8 流向, 域边缘强制外流
///
/// 内部像元取最陡下降方向 (落差 / 距离), 无下降方向时置 0。
/// 边缘像元不论邻元高程一律指向域外。
pub fn flow_direction(filled: &RasterGrid) -> EngineResult<RasterGrid> {
    let rows = filled.rows();
    let cols = filled.cols();
    if rows == 0 || cols == 0 {
        return Err(EngineError::empty("FlowDirection"));
    }

    let mut direction = RasterGrid::new(rows, cols, filled.transform, filled.nodata);

    for row in 0..rows {
        for col in 0..cols {
            let Some(elev) = filled.get(row, col) else {
                continue;
            };

            if let Some(code) = edge_outflow(row, col, rows, cols) {
                direction.set(row, col, code as f64);
                continue;
            }

            let mut best_code = 0u8;
            let mut best_gradient = 0.0;
            for (i, (dr, dc)) in D8_OFFSETS.iter().enumerate() {
                let nr = (row as isize + dr) as usize;
                let nc = (col as isize + dc) as usize;
                let Some(neighbor) = filled.get(nr, nc) else {
                    continue;
                };
                let distance = if dr.abs() + dc.abs() == 2 {
                    std::f64::consts::SQRT_2
                } else {
                    1.0
                };
                let gradient = (elev - neighbor) / distance;
                if gradient > best_gradient {
                    best_gradient = gradient;
                    best_code = D8_CODES[i];
                }
            }
            direction.set(row, col, best_code as f64);
        }
    }

    Ok(direction)
}

/// 边缘像元的强制外流方向
fn edge_outflow(row: usize, col: usize, rows: usize, cols: usize) -> Option<u8> {
    let top = row == 0;
    let bottom = row == rows - 1;
    let left = col == 0;
    let right = col == cols - 1;

    match (top, bottom, left, right) {
        (true, _, true, _) => Some(32),   // NW
        (true, _, _, true) => Some(128),  // NE
        (_, true, true, _) => Some(8),    // SW
        (_, true, _, true) => Some(2),    // SE
        (true, _, _, _) => Some(64),      // N
        (_, true, _, _) => Some(4),       // S
        (_, _, true, _) => Some(16),      // W
        (_, _, _, true) => Some(1),       // E
        _ => None,
    }
}

/// 汇流累积
///
/// 拓扑序遍历流向图, 每个像元的值是流经它的上游像元数
/// (不含自身)。流向 0 或 NoData 的像元没有受体。
pub fn flow_accumulation(direction: &RasterGrid) -> EngineResult<RasterGrid> {
    let rows = direction.rows();
    let cols = direction.cols();
    if rows == 0 || cols == 0 {
        return Err(EngineError::empty("FlowAccumulation"));
    }

    let receiver = |row: usize, col: usize| -> Option<(usize, usize)> {
        let code = direction.get(row, col)? as u8;
        let (dr, dc) = d8_offset(code)?;
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
            return None;
        }
        Some((nr as usize, nc as usize))
    };

    let mut indegree = Array2::from_elem((rows, cols), 0u32);
    for row in 0..rows {
        for col in 0..cols {
            if let Some((nr, nc)) = receiver(row, col) {
                indegree[[nr, nc]] += 1;
            }
        }
    }

    let mut acc = Array2::from_elem((rows, cols), 0.0f64);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    for row in 0..rows {
        for col in 0..cols {
            if indegree[[row, col]] == 0 && direction.get(row, col).is_some() {
                queue.push_back((row, col));
            }
        }
    }

    let mut processed = 0usize;
    while let Some((row, col)) = queue.pop_front() {
        processed += 1;
        if let Some((nr, nc)) = receiver(row, col) {
            acc[[nr, nc]] += acc[[row, col]] + 1.0;
            indegree[[nr, nc]] -= 1;
            if indegree[[nr, nc]] == 0 {
                queue.push_back((nr, nc));
            }
        }
    }

    let valid = direction.valid_count();
    if processed < valid {
        return Err(EngineError::failed(
            "FlowAccumulation",
            format!("流向图存在环: 处理 {processed}/{valid} 像元"),
        ));
    }

    let mut result = RasterGrid::from_data(acc, direction.transform, direction.nodata);
    // NoData 掩膜跟随流向
    for row in 0..rows {
        for col in 0..cols {
            if direction.get(row, col).is_none() {
                result.set(row, col, direction.nodata);
            }
        }
    }

    Ok(result)
}
