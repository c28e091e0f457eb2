use serde::Serialize;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Shrink by `amount` on every side, never below zero size
    pub fn inset(&self, amount: f64) -> Rect {
        let dx = amount.min(self.w / 2.0);
        let dy = amount.min(self.h / 2.0);
        Rect::new(self.x + dx, self.y + dy, self.w - 2.0 * dx, self.h - 2.0 * dy)
    }
}

/// Lay out `values` as tiles filling `bounds` (squarified treemap)
///
/// Returns one rectangle per value, in input order, with area proportional to
/// the value. Non-positive or non-finite values get a zero-size rectangle at
/// the bounds origin.
pub fn squarify(values: &[f64], bounds: Rect) -> Vec<Rect> {
    let mut out = vec![Rect::new(bounds.x, bounds.y, 0.0, 0.0); values.len()];

    let mut order: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite() && values[i] > 0.0)
        .collect();
    let total: f64 = order.iter().map(|&i| values[i]).sum();
    if order.is_empty() || total <= 0.0 || bounds.area() <= 0.0 {
        return out;
    }

    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

    let scale = bounds.area() / total;
    let areas: Vec<(usize, f64)> = order.iter().map(|&i| (i, values[i] * scale)).collect();

    let mut remaining = bounds;
    let mut row: Vec<(usize, f64)> = Vec::new();

    for &item in &areas {
        let side = remaining.w.min(remaining.h);
        if row.is_empty() || worst_with(&row, item.1, side) <= worst(&row, side) {
            row.push(item);
        } else {
            layout_row(&row, &mut remaining, &mut out);
            row.clear();
            row.push(item);
        }
    }
    if !row.is_empty() {
        layout_row(&row, &mut remaining, &mut out);
    }

    out
}

/// Worst aspect ratio of a row laid along a side of length `side`
fn worst(row: &[(usize, f64)], side: f64) -> f64 {
    let sum: f64 = row.iter().map(|r| r.1).sum();
    let max = row.iter().map(|r| r.1).fold(f64::MIN, f64::max);
    let min = row.iter().map(|r| r.1).fold(f64::MAX, f64::min);
    aspect(sum, max, min, side)
}

fn worst_with(row: &[(usize, f64)], extra: f64, side: f64) -> f64 {
    let sum: f64 = row.iter().map(|r| r.1).sum::<f64>() + extra;
    let max = row.iter().map(|r| r.1).fold(extra, f64::max);
    let min = row.iter().map(|r| r.1).fold(extra, f64::min);
    aspect(sum, max, min, side)
}

fn aspect(sum: f64, max: f64, min: f64, side: f64) -> f64 {
    let side_sq = side * side;
    let sum_sq = sum * sum;
    (side_sq * max / sum_sq).max(sum_sq / (side_sq * min))
}

/// Place a finished row along the shorter side and shrink `remaining`
fn layout_row(row: &[(usize, f64)], remaining: &mut Rect, out: &mut [Rect]) {
    let sum: f64 = row.iter().map(|r| r.1).sum();

    if remaining.w >= remaining.h {
        // Column on the left edge
        let col_w = sum / remaining.h;
        let mut y = remaining.y;
        for &(i, area) in row {
            let h = area / col_w;
            out[i] = Rect::new(remaining.x, y, col_w, h);
            y += h;
        }
        remaining.x += col_w;
        remaining.w = (remaining.w - col_w).max(0.0);
    } else {
        // Row along the top edge
        let row_h = sum / remaining.w;
        let mut x = remaining.x;
        for &(i, area) in row {
            let w = area / row_h;
            out[i] = Rect::new(x, remaining.y, w, row_h);
            x += w;
        }
        remaining.y += row_h;
        remaining.h = (remaining.h - row_h).max(0.0);
    }
}
