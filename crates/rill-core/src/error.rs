use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use core::error::Error;
use core::fmt;

/// 框架内置的稳定错误码常量集合，确保日志与断言具有稳定识别符。
///
/// # 设计背景（Why）
/// - 缓冲层、分帧层与适配层在不同位置产生的故障需要合流为统一的错误码，
///   以便调用方按码值实施兜底策略（重试、中止流、修复调用序列）。
/// - 错误码遵循 `<领域>.<语义>` 命名约定，方便在跨组件日志中检索与聚合。
///
/// # 契约说明（What）
/// - **使用前提**：错误码只应通过 [`BufferErrorKind::code`] 获得，调用方不应
///   手工拼接字符串；新增语义时必须同步扩展 [`BufferErrorKind`]。
/// - **返回承诺**：码值一经发布即保持稳定，可安全用于测试断言与告警规则。
pub mod codes {
    /// 当前缓冲字节数不足以完成本次操作，补齐数据后重试即可。
    pub const BUFFER_NEED_MORE_DATA: &str = "buffer.need_more_data";
    /// 缓冲总量在未找到可推进边界的情况下超出配置上限。
    pub const BUFFER_TOO_LARGE: &str = "buffer.too_large";
    /// 单个帧（定界符之前的负载）超出配置上限。
    pub const FRAME_TOO_LARGE: &str = "frame.too_large";
    /// 已存在未完结的 reserve，本操作被拒绝。
    pub const BUFFER_OUTSTANDING_RESERVE: &str = "buffer.outstanding_reserve";
    /// commit 在没有未完结 reserve 的情况下被调用。
    pub const BUFFER_NO_OUTSTANDING_RESERVE: &str = "buffer.no_outstanding_reserve";
    /// 操作参数越过当前可读范围（例如 `advance(n)` 且 `n > len`）。
    pub const BUFFER_OUT_OF_RANGE: &str = "buffer.out_of_range";
    /// 存储被存活视图钉住，增长/搬迁类写入被拒绝。
    pub const BUFFER_PINNED: &str = "buffer.pinned";
    /// 组件配置非法（空/重复定界符集、非法长度字段宽度、缺失回调等）。
    pub const CONFIG_INVALID: &str = "config.invalid";
    /// 线上数据格式损坏（例如长度字段推导出负的帧长）。
    pub const FRAMER_DECODE: &str = "framer.decode";
    /// 适配层底层 I/O 失败，原始错误以 cause 链附带。
    pub const ADAPTER_IO: &str = "adapter.io";
}

/// `BufferErrorKind` 表征缓冲错误域中的精细分类。
///
/// # 设计背景（Why）
/// - 错误域需要同时满足两种消费方式：按“类簇”分流（瞬态欠载 / 限额 / 状态
///   误用）与按具体语义断言；枚举携带稳定码值可以一次覆盖两者。
/// - 分类树固定为：瞬态 = `NeedMoreData`；限额 = `BufferTooLarge` 与
///   `FrameTooLarge`；状态 = 两个 reserve 误用变体加 `Pinned`。其余变体
///   （参数越界、配置错误、数据损坏、I/O）各自独立成类。
///
/// # 契约说明（What）
/// - **瞬态**（[`is_transient`](Self::is_transient)）：调用方补充数据后重试
///   同一调用即可，绝不代表数据损坏。
/// - **限额**（[`is_limit`](Self::is_limit)）：背压 / DoS 防护信号，调用方应
///   中止字节流而非重试。
/// - **状态**（[`is_state`](Self::is_state)）：调用序列违反协议，属编程错误，
///   不应重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferErrorKind {
    /// 缓冲字节数不足，补齐后重试。
    NeedMoreData,
    /// 未找到边界且缓冲总量超限。
    BufferTooLarge,
    /// 单帧负载超限。
    FrameTooLarge,
    /// reserve 尚未完结时再次进入互斥操作。
    OutstandingReserve,
    /// commit 缺少对应的 reserve。
    NoOutstandingReserve,
    /// 操作参数越过可读范围。
    OutOfRange,
    /// 存储被存活视图钉住。
    Pinned,
    /// 组件配置非法。
    Config,
    /// 线上数据格式损坏。
    Decode,
    /// 底层 I/O 失败。
    Io,
}

impl BufferErrorKind {
    /// 返回该分类对应的稳定错误码。
    pub const fn code(self) -> &'static str {
        match self {
            BufferErrorKind::NeedMoreData => codes::BUFFER_NEED_MORE_DATA,
            BufferErrorKind::BufferTooLarge => codes::BUFFER_TOO_LARGE,
            BufferErrorKind::FrameTooLarge => codes::FRAME_TOO_LARGE,
            BufferErrorKind::OutstandingReserve => codes::BUFFER_OUTSTANDING_RESERVE,
            BufferErrorKind::NoOutstandingReserve => codes::BUFFER_NO_OUTSTANDING_RESERVE,
            BufferErrorKind::OutOfRange => codes::BUFFER_OUT_OF_RANGE,
            BufferErrorKind::Pinned => codes::BUFFER_PINNED,
            BufferErrorKind::Config => codes::CONFIG_INVALID,
            BufferErrorKind::Decode => codes::FRAMER_DECODE,
            BufferErrorKind::Io => codes::ADAPTER_IO,
        }
    }

    /// 是否为瞬态欠载：补齐数据后重试同一调用即可。
    pub const fn is_transient(self) -> bool {
        matches!(self, BufferErrorKind::NeedMoreData)
    }

    /// 是否为限额类错误：调用方应中止字节流。
    pub const fn is_limit(self) -> bool {
        matches!(
            self,
            BufferErrorKind::BufferTooLarge | BufferErrorKind::FrameTooLarge
        )
    }

    /// 是否为状态误用类错误：调用序列违反协议。
    pub const fn is_state(self) -> bool {
        matches!(
            self,
            BufferErrorKind::OutstandingReserve
                | BufferErrorKind::NoOutstandingReserve
                | BufferErrorKind::Pinned
        )
    }
}

/// `ErrorCause` 封装底层原因，保持 `Send + Sync` 以方便跨线程传递。
pub type ErrorCause = Box<dyn Error + Send + Sync + 'static>;

/// `BufferError` 是本工作区所有可观察错误的最终形态。
///
/// # 设计背景（Why）
/// - 缓冲操作要么返回值、要么同步失败；失败信息需要同时携带稳定分类
///   （供程序分流）与人类可读描述（供排障），并允许挂接底层原因形成错误链。
/// - 欠载（[`BufferErrorKind::NeedMoreData`]）是预期中的控制流而非异常事件，
///   因此以普通错误值传播，由适配层按策略翻译，绝不依赖 panic。
///
/// # 契约说明（What）
/// - `kind`：精细分类，稳定码值经 [`code`](Self::code) 暴露。
/// - `message`：面向排障人员的描述，避免包含敏感信息。
/// - `cause`：可选底层原因；`source()` 沿链返回。
/// - 实例满足 `Send + Sync + 'static`，可安全跨线程移动。
///
/// # 设计取舍（Trade-offs）
/// - 采用 `Cow<'static, str>` 保存消息：静态文案零分配，动态文案（携带长度
///   等上下文）付出一次堆分配换取可读性。
#[derive(Debug)]
pub struct BufferError {
    kind: BufferErrorKind,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

impl BufferError {
    /// 构造缓冲错误。
    pub fn new(kind: BufferErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新的错误，形成 `source()` 可遍历的错误链。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 构造欠载错误，并在消息中记录需求与实际可读字节数。
    pub fn need_more_data(need: usize, have: usize) -> Self {
        Self::new(
            BufferErrorKind::NeedMoreData,
            format!("need {need} bytes, {have} buffered"),
        )
    }

    /// 构造参数越界错误，`op` 标注出错的操作名。
    pub fn out_of_range(op: &str, n: usize, len: usize) -> Self {
        Self::new(
            BufferErrorKind::OutOfRange,
            format!("{op}: {n} exceeds readable length {len}"),
        )
    }

    /// 构造“已存在未完结 reserve”错误，`op` 标注被拒绝的操作名。
    pub fn outstanding_reserve(op: &str) -> Self {
        Self::new(
            BufferErrorKind::OutstandingReserve,
            format!("{op}: reservation outstanding"),
        )
    }

    /// 构造“缺少对应 reserve”错误。
    pub fn no_outstanding_reserve() -> Self {
        Self::new(
            BufferErrorKind::NoOutstandingReserve,
            "commit without outstanding reservation",
        )
    }

    /// 获取精细分类。
    pub fn kind(&self) -> BufferErrorKind {
        self.kind
    }

    /// 获取稳定错误码，供日志聚合或测试断言使用。
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// 获取人类可读的错误描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl Error for BufferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn Error + 'static))
    }
}

/// 工作区统一的结果别名，默认错误类型为 [`BufferError`]。
pub type Result<T, E = BufferError> = core::result::Result<T, E>;
