//! Angular slot allocation for self-loops.
//!
//! A node's self-loops are spread over the angular gaps left by its other edges. Each loop needs
//! `aperture` radians; a gap offers `floor(gap / (1.2 × aperture))` slots. Output order is by gap
//! (ascending from the smallest existing angle), then by increasing angle inside a gap.

use std::f64::consts::PI;

const APERTURE_MARGIN: f64 = 1.2;

/// Picks `count` loop angles around a node whose other edges leave at `existing` angles.
pub fn allocate_loop_angles(existing: &[f64], count: usize, aperture: f64) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let step = 2.0 * PI / count as f64;
    if existing.is_empty() {
        return (0..count).map(|i| i as f64 * step).collect();
    }

    let mut sorted: Vec<f64> = existing.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.push(sorted[0] + 2.0 * PI);

    let gaps: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    let capacities: Vec<usize> = gaps
        .iter()
        .map(|gap| {
            (gap / (aperture * APERTURE_MARGIN))
                .floor()
                .clamp(0.0, count as f64) as usize
        })
        .collect();
    let total_capacity = capacities.iter().fold(0usize, |acc, c| acc.saturating_add(*c));
    let available: f64 = gaps
        .iter()
        .zip(&capacities)
        .filter(|(_, c)| **c > 0)
        .map(|(g, _)| *g)
        .sum();

    if count <= total_capacity && available > 0.0 {
        let per_gap = distribute_slots(count, &gaps, &capacities, available);
        let mut out = Vec::with_capacity(count);
        for (i, &slots) in per_gap.iter().enumerate() {
            if slots == 0 {
                continue;
            }
            let margin = (gaps[i] - aperture * slots as f64) / (slots + 1) as f64;
            let first = sorted[i] + margin + aperture / 2.0;
            out.extend((0..slots).map(|k| first + k as f64 * (margin + aperture)));
        }
        return out;
    }

    let widest = gaps
        .iter()
        .enumerate()
        .fold(0usize, |best, (i, g)| if *g > gaps[best] { i } else { best });
    let start = (sorted[widest] + sorted[widest + 1]) / 2.0;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Shares `count` slots among gaps proportionally to their size, rounding up, then trims the
/// overshoot from the gaps whose slots are the most crowded.
fn distribute_slots(count: usize, gaps: &[f64], capacities: &[usize], available: f64) -> Vec<usize> {
    let mut slots: Vec<usize> = gaps
        .iter()
        .zip(capacities)
        .map(|(gap, &cap)| {
            if cap > 0 {
                (count as f64 * gap / available).ceil() as usize
            } else {
                0
            }
        })
        .collect();

    let assigned: usize = slots.iter().sum();
    let excess = assigned.saturating_sub(count);
    if excess > 0 {
        let share = |i: usize, slots: &[usize]| {
            if slots[i] == 0 {
                f64::INFINITY
            } else {
                gaps[i] / slots[i] as f64
            }
        };
        for _ in 0..excess {
            // Re-evaluated after each removal; ties go to the lowest gap index.
            let Some(i) = (0..gaps.len())
                .filter(|&i| slots[i] > 0)
                .min_by(|&a, &b| share(a, &slots).total_cmp(&share(b, &slots)))
            else {
                break;
            };
            slots[i] -= 1;
        }
    }
    slots
}
