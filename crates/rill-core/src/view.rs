use alloc::vec::Vec;

use bytes::{Bytes, BytesMut};

/// `ByteView` 是缓冲区的只读、零拷贝逻辑视图。
///
/// # 设计背景（Why）
/// - 分帧器与读取器需要把“缓冲中的一段字节”交给上层，而不强迫立即拷贝；
///   视图以有序的 [`Bytes`] 段列表表达这段逻辑字节序列，段与段之间物理上
///   可以不连续（散布/聚集布局）。
/// - `Bytes` 是不可变的引用计数切片：视图创建后，无论源缓冲如何追加或
///   推进，视图观察到的字节都不会改变。这使“视图绝不观察到创建之后的
///   字节”从纪律约束变成结构性质。
///
/// # 契约说明（What）
/// - 段列表中不存在空段；空视图以空列表表达。
/// - 语义上等价于把所有段按序拼接后的字节序列；`len()` 缓存总长度。
/// - [`to_bytes`](Self::to_bytes) 是显式的拷贝边界：单段视图零拷贝返回，
///   多段视图做一次合并拷贝。需要零拷贝访问时优先
///   [`chunk`](Self::chunk) / [`segments`](Self::segments)。
///
/// # 设计取舍（Trade-offs）
/// - 视图持有段的引用计数而非借用生命周期，换来可以存放、跨调用传递的
///   灵活性；代价是每段一次原子计数操作。
#[derive(Debug, Clone, Default)]
pub struct ByteView {
    segs: Vec<Bytes>,
    len: usize,
}

impl ByteView {
    /// 构造空视图。
    pub const fn empty() -> Self {
        Self {
            segs: Vec::new(),
            len: 0,
        }
    }

    /// 用单个 `Bytes` 段构造视图；空段退化为空视图。
    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let len = bytes.len();
        let mut segs = Vec::with_capacity(1);
        segs.push(bytes);
        Self { segs, len }
    }

    /// 用有序段序列构造视图，空段被滤除，总长度即时累计。
    pub fn from_segments(segments: impl IntoIterator<Item = Bytes>) -> Self {
        let mut segs = Vec::new();
        let mut len = 0usize;
        for seg in segments {
            if seg.is_empty() {
                continue;
            }
            len += seg.len();
            segs.push(seg);
        }
        Self { segs, len }
    }

    /// 返回视图的逻辑字节总数。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 判断视图是否为空。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 返回首个连续段的借用，空视图返回空切片。
    ///
    /// 这是“头部连续区”的快速路径：段式视图的返回值可能短于
    /// [`len`](Self::len)，但保证零拷贝。
    pub fn chunk(&self) -> &[u8] {
        self.segs.first().map(Bytes::as_ref).unwrap_or(&[])
    }

    /// 以段粒度暴露散布/聚集布局，供 `writev` 式写出或逐段遍历。
    pub fn segments(&self) -> &[Bytes] {
        &self.segs
    }

    /// 消耗视图并取回段列表的所有权。
    pub fn into_segments(self) -> Vec<Bytes> {
        self.segs
    }

    /// 物化为一段连续的 `Bytes`（显式拷贝边界）。
    ///
    /// 单段视图直接克隆引用计数（零拷贝）；多段视图按序合并拷贝一次。
    pub fn to_bytes(&self) -> Bytes {
        match self.segs.len() {
            0 => Bytes::new(),
            1 => self.segs[0].clone(),
            _ => {
                let mut out = BytesMut::with_capacity(self.len);
                for seg in &self.segs {
                    out.extend_from_slice(seg);
                }
                out.freeze()
            }
        }
    }

    /// 物化为 `Vec<u8>`，便于与传统切片 API 互操作。
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for seg in &self.segs {
            out.extend_from_slice(seg);
        }
        out
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl PartialEq<[u8]> for ByteView {
    /// 按逻辑拼接语义与切片比较，跨段边界逐段推进，不做物化。
    fn eq(&self, other: &[u8]) -> bool {
        if self.len != other.len() {
            return false;
        }
        let mut rest = other;
        for seg in &self.segs {
            let (head, tail) = rest.split_at(seg.len());
            if seg.as_ref() != head {
                return false;
            }
            rest = tail;
        }
        true
    }
}

impl PartialEq<&[u8]> for ByteView {
    fn eq(&self, other: &&[u8]) -> bool {
        *self == **other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_segments_drops_empty_segments() {
        // Why: “无空段”是视图的结构不变量，find/写出逻辑都依赖它。
        let view = ByteView::from_segments([
            Bytes::from_static(b"ab"),
            Bytes::new(),
            Bytes::from_static(b"cd"),
        ]);
        assert_eq!(view.len(), 4);
        assert_eq!(view.segments().len(), 2);
        assert_eq!(view.chunk(), b"ab");
    }

    #[test]
    fn to_bytes_is_zero_copy_for_single_segment() {
        // Why: 单段物化不应引入拷贝，验证返回值与源段共享存储指针。
        let seg = Bytes::from_static(b"hello");
        let view = ByteView::from_bytes(seg.clone());
        let out = view.to_bytes();
        assert_eq!(out.as_ptr(), seg.as_ptr());
    }

    #[test]
    fn logical_equality_spans_segment_boundaries() {
        let view = ByteView::from_segments([Bytes::from_static(b"ab"), Bytes::from_static(b"c")]);
        assert!(view == b"abc"[..]);
        assert!(view != b"abd"[..]);
        assert!(view != b"ab"[..]);
    }

    #[test]
    fn empty_view_has_empty_chunk_and_bytes() {
        let view = ByteView::empty();
        assert!(view.is_empty());
        assert_eq!(view.chunk(), b"");
        assert!(view.to_bytes().is_empty());
    }
}
