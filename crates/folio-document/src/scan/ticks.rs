// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Completion ticks reported while one page is recognised. Layout analysis
// owns the first 40%, line recognition the rest, and the last tick is always
// exactly 1.0.

/// Input prepared for the engine.
pub const TICK_PREPARED: f32 = 0.1;
/// Words detected.
pub const TICK_WORDS: f32 = 0.3;
/// Words grouped into lines.
pub const TICK_LINES: f32 = 0.4;

/// Text lines recognised per progress tick.
pub const LINES_PER_TICK: usize = 8;

/// Completion once `done` of `total` text lines are recognised. A page with
/// no lines is complete.
pub fn batch_tick(done: usize, total: usize) -> f32 {
    if total == 0 || done >= total {
        return 1.0;
    }
    TICK_LINES + (1.0 - TICK_LINES) * done as f32 / total as f32
}

/// Ticks emitted after layout analysis for a page with `total` lines: one per
/// batch of [`LINES_PER_TICK`], or a single 1.0 when there is nothing to read.
pub fn line_ticks(total: usize) -> Vec<f32> {
    if total == 0 {
        return vec![1.0];
    }
    (1..=total.div_ceil(LINES_PER_TICK))
        .map(|batch| batch_tick((batch * LINES_PER_TICK).min(total), total))
        .collect()
}
