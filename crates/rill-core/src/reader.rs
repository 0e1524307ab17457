use bytes::Bytes;

use crate::buf::{ByteStreamBuf, ensure_readable};
use crate::error::Result;
use crate::view::ByteView;

/// `StreamReader` 是缓冲区之上的结构化二进制读取游标。
///
/// # 设计背景（Why）
/// - 协议头解析需要按定宽整数（1/2/4 字节、大小端）窥视或消费缓冲前缀；
///   把这些样板收敛到一个游标门面，避免每个编解码器重复处理跨段合并与
///   欠载检查。
/// - 读取器不持有状态：它只是借用缓冲的轻量包装，随用随建。
///
/// # 逻辑解析（How）
/// - 每个 `peek_*` 先以 `len()` 做欠载检查（`buffer.need_more_data`），再经
///   [`coalesce`](ByteStreamBuf::coalesce) 取得连续前缀拷出定宽数组；
///   `read_*` 即 `peek_*` 后 [`advance`](ByteStreamBuf::advance)。
/// - 多字节宽度跨段时由 `coalesce` 透明合并，读取器不感知底层分段。
///
/// # 契约说明（What）
/// - 所有整数均为无符号、无符号扩展、无浮点；`be`/`le` 分别表示大端与
///   小端字节序。
/// - 非消费方法不改变缓冲长度；消费方法恰好推进对应宽度。
pub struct StreamReader<'a, B: ?Sized> {
    buf: &'a mut B,
}

impl<'a, B: ByteStreamBuf + ?Sized> StreamReader<'a, B> {
    /// 借用缓冲构造读取游标。
    pub fn new(buf: &'a mut B) -> Self {
        Self { buf }
    }

    /// 窥视定宽前缀并拷出为数组，欠载时返回 `buffer.need_more_data`。
    fn peek_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        ensure_readable(self.buf.len(), N)?;
        let prefix = self.buf.coalesce(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&prefix[..N]);
        Ok(out)
    }

    /// 窥视无符号 8 位整数，非消费。
    pub fn peek_u8(&mut self) -> Result<u8> {
        Ok(self.peek_array::<1>()?[0])
    }

    /// 读取并消费无符号 8 位整数。
    pub fn read_u8(&mut self) -> Result<u8> {
        let v = self.peek_u8()?;
        self.buf.advance(1)?;
        Ok(v)
    }

    /// 窥视无符号 16 位大端整数，非消费。
    pub fn peek_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.peek_array::<2>()?))
    }

    /// 读取并消费无符号 16 位大端整数。
    pub fn read_u16_be(&mut self) -> Result<u16> {
        let v = self.peek_u16_be()?;
        self.buf.advance(2)?;
        Ok(v)
    }

    /// 窥视无符号 16 位小端整数，非消费。
    pub fn peek_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.peek_array::<2>()?))
    }

    /// 读取并消费无符号 16 位小端整数。
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let v = self.peek_u16_le()?;
        self.buf.advance(2)?;
        Ok(v)
    }

    /// 窥视无符号 32 位大端整数，非消费。
    pub fn peek_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.peek_array::<4>()?))
    }

    /// 读取并消费无符号 32 位大端整数。
    pub fn read_u32_be(&mut self) -> Result<u32> {
        let v = self.peek_u32_be()?;
        self.buf.advance(4)?;
        Ok(v)
    }

    /// 窥视无符号 32 位小端整数，非消费。
    pub fn peek_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.peek_array::<4>()?))
    }

    /// 读取并消费无符号 32 位小端整数。
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let v = self.peek_u32_le()?;
        self.buf.advance(4)?;
        Ok(v)
    }

    /// 返回前 `n` 字节的视图，非消费；契约同缓冲级同名操作。
    pub fn peek_exact(&mut self, n: usize) -> Result<ByteView> {
        self.buf.peek_exact(n)
    }

    /// 消费并返回前 `n` 字节的视图。
    pub fn take(&mut self, n: usize) -> Result<ByteView> {
        self.buf.take(n)
    }

    /// 消费前 `n` 字节并物化为连续的 `Bytes`（显式拷贝边界）。
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        Ok(self.take(n)?.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::buf::{clamp_range, find_in_slice, rfind_in_slice};
    use crate::error::{BufferError, codes};

    /// 最小连续缓冲桩，仅满足契约以驱动读取器测试。
    struct VecBuf {
        data: Vec<u8>,
        rpos: usize,
    }

    impl VecBuf {
        fn from(data: &[u8]) -> Self {
            Self {
                data: data.to_vec(),
                rpos: 0,
            }
        }

        fn readable(&self) -> &[u8] {
            &self.data[self.rpos..]
        }
    }

    impl ByteStreamBuf for VecBuf {
        fn len(&self) -> usize {
            self.data.len() - self.rpos
        }

        fn chunk(&self) -> &[u8] {
            self.readable()
        }

        fn segments(&self) -> Vec<&[u8]> {
            if self.is_empty() {
                Vec::new()
            } else {
                alloc::vec![self.readable()]
            }
        }

        fn peek(&self) -> ByteView {
            ByteView::from_bytes(Bytes::copy_from_slice(self.readable()))
        }

        fn peek_exact(&self, n: usize) -> Result<ByteView> {
            ensure_readable(self.len(), n)?;
            Ok(ByteView::from_bytes(Bytes::copy_from_slice(
                &self.readable()[..n],
            )))
        }

        fn advance(&mut self, n: usize) -> Result<()> {
            if n > self.len() {
                return Err(BufferError::out_of_range("advance", n, self.len()));
            }
            self.rpos += n;
            Ok(())
        }

        fn coalesce(&mut self, n: usize) -> Result<&[u8]> {
            ensure_readable(self.len(), n)?;
            Ok(&self.readable()[..n])
        }

        fn find(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize> {
            let (s, e) = clamp_range(self.len(), start, end);
            find_in_slice(self.readable(), needle, s, e)
        }

        fn rfind(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize> {
            let (s, e) = clamp_range(self.len(), start, end);
            rfind_in_slice(self.readable(), needle, s, e)
        }
    }

    #[test]
    fn peek_is_non_consuming_and_endianness_selects_order() {
        // Why: 0x01 0x02 在两种字节序下的解读是读取器契约的基准场景。
        let mut buf = VecBuf::from(&[0x01, 0x02]);
        let mut reader = StreamReader::new(&mut buf);
        assert_eq!(reader.peek_u16_be().expect("peek be"), 0x0102);
        assert_eq!(reader.peek_u16_le().expect("peek le"), 0x0201);
        assert_eq!(reader.read_u16_be().expect("read be"), 0x0102);
        assert!(buf.is_empty(), "read_u16 之后缓冲应读空");
    }

    #[test]
    fn underflow_is_reported_as_need_more_data() {
        // Why: 欠载是预期控制流，必须以稳定错误码而非 panic 暴露。
        let mut buf = VecBuf::from(&[0xAA]);
        let mut reader = StreamReader::new(&mut buf);
        let err = reader.peek_u32_be().expect_err("1 字节不足以窥视 u32");
        assert_eq!(err.code(), codes::BUFFER_NEED_MORE_DATA);
        assert_eq!(buf.len(), 1, "欠载失败不得消费任何字节");
    }

    #[test]
    fn read_u32_both_orders() {
        let mut buf = VecBuf::from(&[0xDE, 0xAD, 0xBE, 0xEF, 0xEF, 0xBE, 0xAD, 0xDE]);
        let mut reader = StreamReader::new(&mut buf);
        assert_eq!(reader.read_u32_be().expect("be"), 0xDEAD_BEEF);
        assert_eq!(reader.read_u32_le().expect("le"), 0xDEAD_BEEF);
    }

    #[test]
    fn read_bytes_consumes_exactly_n() {
        let mut buf = VecBuf::from(b"abcdef");
        let head = StreamReader::new(&mut buf).read_bytes(4).expect("read 4");
        assert_eq!(head.as_ref(), b"abcd");
        assert_eq!(buf.len(), 2);
        let err = StreamReader::new(&mut buf)
            .read_bytes(3)
            .expect_err("剩余 2 字节不足");
        assert!(err.kind().is_transient());
    }
}
