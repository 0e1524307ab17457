use std::io;

use bytes::Bytes;
use rill_core::buf::MutByteStreamBuf;
use rill_core::error::{BufferError, BufferErrorKind, Result};
use rill_core::view::ByteView;

/// 欠载策略：`read(n)` 在缓冲字节不足 `n` 时的行为。
///
/// - [`Raise`](Self::Raise)：返回 `buffer.need_more_data`，由调用方补数据
///   后重试；
/// - [`ReturnPartial`](Self::ReturnPartial)：返回现有的全部字节（可能为
///   空），绝不阻塞、绝不因欠载报错；
/// - [`Block`](Self::Block)：反复调用 fill 回调（真正的阻塞 I/O 发生在
///   回调内部）直到满足需求或回调报告 EOF，届时返回已积累的字节
///   （可能不足额）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnderflowPolicy {
    Raise,
    ReturnPartial,
    Block,
}

/// fill 回调：向缓冲补充字节，返回 `true` 表示取得进展、`false` 表示
/// EOF；I/O 失败经 `io::Error` 上抛。
pub type FillFn<B> = Box<dyn FnMut(&mut B) -> io::Result<bool> + Send>;

/// `StreamBufReader` 把字节流缓冲适配成文件式读取端。
///
/// # 设计背景（Why）
/// - 核心缓冲刻意保持非阻塞：它只是内存结构，不知道字节从哪来。与
///   期待 `read`/`read_to_end` 风格接口的旧式调用方对接时，需要一层
///   策略驱动的胶水来决定“字节不够时怎么办”。
/// - 阻塞被整体外包给调用方提供的 fill 回调（回调内部可以是带超时的
///   socket 读）：适配器自身不含任何定时或取消机制。
///
/// # 契约说明（What）
/// - 适配器独占缓冲所有权并在调用 fill 时把缓冲借给回调——这是
///   `&mut` 别名规则下“回调向同一缓冲写入”的唯一表达；
/// - [`UnderflowPolicy::Block`] 必须配合 fill 构造（[`blocking`]），其余
///   策略经 [`new`] 构造；
/// - fill 的 `io::Error` 统一包装为 `adapter.io` 并保留原错误为 cause。
///
/// [`new`]: Self::new
/// [`blocking`]: Self::blocking
pub struct StreamBufReader<B> {
    buf: B,
    policy: UnderflowPolicy,
    fill: Option<FillFn<B>>,
}

impl<B: std::fmt::Debug> std::fmt::Debug for StreamBufReader<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBufReader")
            .field("buf", &self.buf)
            .field("policy", &self.policy)
            .field("fill", &self.fill.as_ref().map(|_| "<fill>"))
            .finish()
    }
}

impl<B: MutByteStreamBuf> StreamBufReader<B> {
    /// 用 `Raise` 或 `ReturnPartial` 策略构造；`Block` 请走
    /// [`blocking`](Self::blocking)（需要 fill 回调）。
    pub fn new(buf: B, policy: UnderflowPolicy) -> Result<Self> {
        if policy == UnderflowPolicy::Block {
            return Err(BufferError::new(
                BufferErrorKind::Config,
                "block policy requires a fill callback",
            ));
        }
        Ok(Self {
            buf,
            policy,
            fill: None,
        })
    }

    /// 用 `Block` 策略与 fill 回调构造。
    pub fn blocking(buf: B, fill: impl FnMut(&mut B) -> io::Result<bool> + Send + 'static) -> Self {
        Self {
            buf,
            policy: UnderflowPolicy::Block,
            fill: Some(Box::new(fill)),
        }
    }

    /// 访问底层缓冲。
    pub fn buffer(&self) -> &B {
        &self.buf
    }

    /// 可变访问底层缓冲（例如由外部直接 `write` 注入字节）。
    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buf
    }

    /// 拆解适配器，取回缓冲。
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// 驱动一次 fill；返回 `true` 表示有进展，`false` 表示 EOF。
    fn fill_once(&mut self) -> Result<bool> {
        let fill = self
            .fill
            .as_mut()
            .expect("block 策略在构造时已绑定 fill 回调");
        match fill(&mut self.buf) {
            Ok(progress) => Ok(progress),
            Err(err) => Err(BufferError::new(
                BufferErrorKind::Io,
                "fill callback failed",
            )
            .with_cause(err)),
        }
    }

    /// 按策略读取 `n` 字节并以零拷贝视图交付。
    ///
    /// `Block` 策略下不足额的返回值意味着 EOF；`ReturnPartial` 下仅意味着
    /// 当前没有更多字节。
    pub fn read_view(&mut self, n: usize) -> Result<ByteView> {
        if n == 0 {
            return Ok(ByteView::empty());
        }
        loop {
            let buffered = self.buf.len();
            if buffered >= n {
                return self.buf.take(n);
            }
            match self.policy {
                UnderflowPolicy::Raise => {
                    return Err(BufferError::need_more_data(n, buffered));
                }
                UnderflowPolicy::ReturnPartial => {
                    return if buffered == 0 {
                        Ok(ByteView::empty())
                    } else {
                        self.buf.take(buffered)
                    };
                }
                UnderflowPolicy::Block => {
                    if !self.fill_once()? {
                        tracing::trace!(requested = n, buffered, "fill reported eof, short read");
                        return if buffered == 0 {
                            Ok(ByteView::empty())
                        } else {
                            self.buf.take(buffered)
                        };
                    }
                }
            }
        }
    }

    /// 同 [`read_view`](Self::read_view)，物化为连续 `Bytes`。
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        Ok(self.read_view(n)?.to_bytes())
    }

    /// 读尽：`Block` 策略驱动 fill 直到 EOF，其余策略返回当前缓冲的全部。
    pub fn read_all(&mut self) -> Result<Bytes> {
        let mut out = Vec::new();
        loop {
            let buffered = self.buf.len();
            if buffered > 0 {
                let view = self.buf.take(buffered)?;
                out.extend_from_slice(&view.to_bytes());
                continue;
            }
            match self.policy {
                UnderflowPolicy::Block => {
                    if !self.fill_once()? {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(Bytes::from(out))
    }

    /// 把缓冲前缀拷入 `out`，返回拷贝量；供 `io::Read` 实现复用。
    fn drain_into(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let k = out.len().min(self.buf.len());
        let mut copied = 0;
        while copied < k {
            let chunk = self.buf.chunk();
            let m = chunk.len().min(k - copied);
            out[copied..copied + m].copy_from_slice(&chunk[..m]);
            self.buf.advance(m).map_err(io::Error::other)?;
            copied += m;
        }
        Ok(copied)
    }
}

impl<B: MutByteStreamBuf> io::Read for StreamBufReader<B> {
    /// 策略到 `io::Read` 语义的映射：
    /// `Raise` ⇒ 不足额时 `ErrorKind::WouldBlock`；`ReturnPartial` ⇒ 短读
    /// （空缓冲返回 `Ok(0)`，即 EOF 约定）；`Block` ⇒ 循环 fill 直到满足
    /// 或 EOF。
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            let buffered = self.buf.len();
            if buffered >= out.len() {
                return self.drain_into(out);
            }
            match self.policy {
                UnderflowPolicy::Raise => {
                    return Err(io::Error::new(
                        io::ErrorKind::WouldBlock,
                        BufferError::need_more_data(out.len(), buffered),
                    ));
                }
                UnderflowPolicy::ReturnPartial => {
                    return self.drain_into(out);
                }
                UnderflowPolicy::Block => {
                    let progress = self
                        .fill_once()
                        .map_err(|err| io::Error::other(err))?;
                    if !progress {
                        return self.drain_into(out);
                    }
                }
            }
        }
    }
}
