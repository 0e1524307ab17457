//! 跨段“流正确”检索助手。
//!
//! # 模块定位（Why）
//! - 分段缓冲的 `find`/`rfind` 必须在概念拼接上成立：跨越段边界的匹配
//!   同样要被发现，否则定界分帧会在“定界符恰好被切开”时漏帧。
//! - 把检索集中到存储层附近（而非让上层编解码器逐字节扫描），每个连续
//!   段内部可以直接复用切片窗口扫描。
//!
//! # 算法概要（How）
//! - 段内匹配：逐段做普通切片检索，命中位置换算回全局偏移。
//! - 跨段匹配：长度为 `m` 的匹配若跨越某条段缝，起点必然落在缝前
//!   `m - 1` 字节内；对每条段缝拷出 `2(m - 1)` 字节的边界窗口检索，
//!   并只接受真正跨缝的命中，避免与段内结果重复计数。
//! - 正反向共用同一枚举次序，分别取最小 / 最大候选。
//!
//! # 契约说明（What）
//! - `start`/`end` 为相对可读区的偏移，越界自动收拢；空 `needle` 的语义
//!   与 `bytes.find` 一致（正向命中 `start`，反向命中 `end`）。
//! - 输入切片序列须按序覆盖可读字节且不含空项（缓冲实现的既有不变量）。

use alloc::vec::Vec;
use core::cmp::min;

use rill_core::buf::{clamp_range, find_in_slice, rfind_in_slice};

/// 拷出全局区间 `[a, b)` 的字节（仅用于边界窗口，至多 `2(m-1)` 字节）。
fn copy_global_range(slices: &[&[u8]], a: usize, b: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(b - a);
    let mut g = 0usize;
    for sl in slices {
        let seg_start = g;
        let seg_end = g + sl.len();
        if seg_end > a && seg_start < b {
            let from = a.saturating_sub(seg_start);
            let to = min(sl.len(), b - seg_start);
            out.extend_from_slice(&sl[from..to]);
        }
        g = seg_end;
        if g >= b {
            break;
        }
    }
    out
}

/// 在段序列的概念拼接中正向检索 `needle`，返回全局偏移。
pub(crate) fn find_across(
    slices: &[&[u8]],
    needle: &[u8],
    start: usize,
    end: Option<usize>,
) -> Option<usize> {
    let total: usize = slices.iter().map(|s| s.len()).sum();
    let (s, e) = clamp_range(total, start, end);
    let m = needle.len();
    if m == 0 {
        return Some(s);
    }
    if e - s < m {
        return None;
    }
    if slices.len() == 1 {
        return find_in_slice(slices[0], needle, s, e);
    }

    let limit = e - m;
    let mut best: Option<usize> = None;
    let mut g = 0usize;

    for (i, sl) in slices.iter().enumerate() {
        let l = sl.len();

        if limit >= g && s < g + l {
            let ls = s.saturating_sub(g);
            let le = min(l, limit - g + m);
            if let Some(idx) = find_in_slice(sl, needle, ls, le) {
                let cand = g + idx;
                best = Some(best.map_or(cand, |b| b.min(cand)));
            }
        }

        if i + 1 < slices.len() && m > 1 {
            let seam = g + l;
            let win_start = seam.saturating_sub(m - 1);
            let win_end = min(total, seam + m - 1);
            if win_end - win_start >= m {
                let window = copy_global_range(slices, win_start, win_end);
                let mut from = 0usize;
                while let Some(j) = find_in_slice(&window, needle, from, window.len()) {
                    let cand = win_start + j;
                    // 只接受真正跨缝且落在检索范围内的命中。
                    if cand < seam && cand + m > seam && cand >= s && cand <= limit {
                        best = Some(best.map_or(cand, |b| b.min(cand)));
                        break;
                    }
                    from = j + 1;
                }
            }
        }

        g += l;
    }

    best
}

/// 与 [`find_across`] 对偶的反向检索。
pub(crate) fn rfind_across(
    slices: &[&[u8]],
    needle: &[u8],
    start: usize,
    end: Option<usize>,
) -> Option<usize> {
    let total: usize = slices.iter().map(|s| s.len()).sum();
    let (s, e) = clamp_range(total, start, end);
    let m = needle.len();
    if m == 0 {
        return Some(e);
    }
    if e - s < m {
        return None;
    }
    if slices.len() == 1 {
        return rfind_in_slice(slices[0], needle, s, e);
    }

    let limit = e - m;
    let mut best: Option<usize> = None;
    let mut g = 0usize;

    for (i, sl) in slices.iter().enumerate() {
        let l = sl.len();

        if limit >= g && s < g + l {
            let ls = s.saturating_sub(g);
            let le = min(l, limit - g + m);
            if let Some(idx) = rfind_in_slice(sl, needle, ls, le) {
                let cand = g + idx;
                best = Some(best.map_or(cand, |b| b.max(cand)));
            }
        }

        if i + 1 < slices.len() && m > 1 {
            let seam = g + l;
            let win_start = seam.saturating_sub(m - 1);
            let win_end = min(total, seam + m - 1);
            if win_end - win_start >= m {
                let window = copy_global_range(slices, win_start, win_end);
                let mut from = 0usize;
                while let Some(j) = find_in_slice(&window, needle, from, window.len()) {
                    let cand = win_start + j;
                    if cand < seam && cand + m > seam && cand >= s && cand <= limit {
                        best = Some(best.map_or(cand, |b| b.max(cand)));
                    }
                    from = j + 1;
                }
            }
        }

        g += l;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_match_spanning_two_segments() {
        // Why: 跨缝匹配是分段检索存在的全部理由，最小场景必须命中。
        let slices: [&[u8]; 2] = [b"ab\r", b"\nxy"];
        assert_eq!(find_across(&slices, b"\r\n", 0, None), Some(2));
    }

    #[test]
    fn finds_match_spanning_three_segments() {
        // Why: 段可以比模式短，匹配可能横跨多条缝。
        let slices: [&[u8]; 3] = [b"a", b"b", b"cd"];
        assert_eq!(find_across(&slices, b"abc", 0, None), Some(0));
    }

    #[test]
    fn earliest_match_wins_over_later_in_segment_match() {
        // Why: 正向检索必须返回全局最早命中，与段的物理划分无关。
        let slices: [&[u8]; 2] = [b"xx\r", b"\nyy\r\n"];
        assert_eq!(find_across(&slices, b"\r\n", 0, None), Some(2));
        assert_eq!(rfind_across(&slices, b"\r\n", 0, None), Some(6));
    }

    #[test]
    fn range_bounds_are_respected() {
        let slices: [&[u8]; 2] = [b"abca", b"bcabc"];
        assert_eq!(find_across(&slices, b"abc", 1, None), Some(3));
        assert_eq!(find_across(&slices, b"abc", 1, Some(5)), None);
        assert_eq!(rfind_across(&slices, b"abc", 0, Some(8)), Some(3));
        assert_eq!(rfind_across(&slices, b"abc", 0, None), Some(6));
    }

    #[test]
    fn empty_needle_matches_bytes_semantics() {
        let slices: [&[u8]; 2] = [b"ab", b"cd"];
        assert_eq!(find_across(&slices, b"", 1, None), Some(1));
        assert_eq!(rfind_across(&slices, b"", 0, Some(3)), Some(3));
    }
}
