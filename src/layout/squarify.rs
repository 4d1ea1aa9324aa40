use super::Rect;

/// A weight remembered together with its position in the caller's slice.
#[derive(Debug, Clone, Copy)]
struct Indexed {
    index: usize,
    area: f64,
}

/// Squarified layout.
///
/// Returns one rectangle per weight, `out[i]` belonging to `weights[i]`, that
/// together tile `bounds`. Weights are scaled to the bounds' area; zero,
/// negative and non-finite weights map to [`Rect::ZERO`].
pub fn squarify(bounds: Rect, weights: &[f64]) -> Vec<Rect> {
    let mut result = vec![Rect::ZERO; weights.len()];

    let target = bounds.area();
    let total: f64 = weights.iter().copied().filter(|w| is_positive(*w)).sum();
    if !(target > 0.0) || !(total > 0.0) {
        if !weights.is_empty() && total > 0.0 {
            tracing::warn!(
                "Squarify: degenerate bounds {:.1}x{:.1}, {} weights get empty rects",
                bounds.w,
                bounds.h,
                weights.len()
            );
        }
        return result;
    }

    // Scale to the target area, then sort descending (stable) for layout.
    let mut sorted: Vec<Indexed> = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| is_positive(**w))
        .map(|(index, &w)| Indexed {
            index,
            area: target * w / total,
        })
        .collect();
    sorted.sort_by(|a, b| b.area.total_cmp(&a.area));

    let areas: Vec<f64> = sorted.iter().map(|s| s.area).collect();
    let mut placed = StackLayout::new(bounds).place_all(&areas);
    cutoff_overflows(bounds, &mut placed);

    for (slot, rect) in sorted.iter().zip(placed) {
        result[slot.index] = rect;
    }
    result
}

fn is_positive(w: f64) -> bool {
    w.is_finite() && w > 0.0
}

/// Greedy row/column packer over the shrinking free rectangle.
struct StackLayout {
    placed: Vec<Rect>,
    free: Rect,
}

impl StackLayout {
    fn new(bounds: Rect) -> Self {
        Self {
            placed: Vec::new(),
            free: bounds,
        }
    }

    /// Place areas (already sorted descending, summing to the bounds' area)
    /// in order. Grows the current stack while that improves its worst aspect
    /// ratio, otherwise flushes it and starts a new one.
    fn place_all(mut self, areas: &[f64]) -> Vec<Rect> {
        let mut stack_start = 0;
        let mut side = self.free.short_side();

        let mut i = 1;
        while i < areas.len() {
            let stack = &areas[stack_start..i];
            let grown = &areas[stack_start..=i];
            if worst_aspect_ratio(stack, side) > worst_aspect_ratio(grown, side) {
                i += 1;
                continue;
            }
            self.stack_boxes(stack);
            stack_start = i;
            side = self.free.short_side();
            i += 1;
        }
        if stack_start < areas.len() {
            self.stack_boxes(&areas[stack_start..]);
        }

        self.placed
    }

    /// Lay a stack out along the shorter side of the free rectangle and cut
    /// the consumed band off.
    fn stack_boxes(&mut self, stack: &[f64]) {
        let stack_area: f64 = stack.iter().sum();
        let free_area = self.free.area();
        if stack.is_empty() || stack_area <= 0.0 || free_area <= 0.0 {
            return;
        }
        let share = stack_area / free_area;

        let free = self.free;
        if free.w < free.h {
            // Row along the top edge.
            let h = free.h * share;
            let mut offset = free.x;
            for &area in stack {
                let w = free.w * area / stack_area;
                self.placed.push(Rect::new(offset, free.y, w, h));
                offset += w;
            }
            self.free = Rect::new(free.x, free.y + h, free.w, free.h * (1.0 - share));
        } else {
            // Column along the left edge.
            let w = free.w * share;
            let mut offset = free.y;
            for &area in stack {
                let h = free.h * area / stack_area;
                self.placed.push(Rect::new(free.x, offset, w, h));
                offset += h;
            }
            self.free = Rect::new(free.x + w, free.y, free.w * (1.0 - share), free.h);
        }
    }
}

/// Worst aspect ratio of a stack laid along a side of length `side`:
/// `max(side²·max/sum², sum²/(side²·min))`. Lower is squarer.
pub fn worst_aspect_ratio(row: &[f64], side: f64) -> f64 {
    let sum: f64 = row.iter().sum();
    if row.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max_r = row.iter().copied().fold(0.0, f64::max);
    let min_r = row.iter().copied().fold(f64::INFINITY, f64::min);
    let a = (side_sq * max_r) / sum_sq;
    let b = sum_sq / (side_sq * min_r);
    a.max(b)
}

/// Trim rectangles whose far edge drifted past the bounds. Origins stay put.
fn cutoff_overflows(bounds: Rect, rects: &mut [Rect]) {
    let max_x = bounds.right();
    let max_y = bounds.bottom();
    for r in rects.iter_mut() {
        let dx = r.right() - max_x;
        if dx > 0.0 {
            r.w = (r.w - dx).max(0.0);
        }
        let dy = r.bottom() - max_y;
        if dy > 0.0 {
            r.h = (r.h - dy).max(0.0);
        }
    }
}
