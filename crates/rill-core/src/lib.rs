#![cfg_attr(not(feature = "std"), no_std)]
#![doc = r#"
# rill-core

## 设计动机（Why）
- **定位**：本 crate 定义字节流缓冲与分帧库的核心契约：错误域、对象安全的
  缓冲 trait、零拷贝视图类型与结构化二进制读取器。具体缓冲实现
  （`rill-buffer`）、分帧器（`rill-codec-frame`）与阻塞 I/O 适配
  （`rill-io`）都建立在这层契约之上。
- **架构角色**：缓冲是“驱动写入、编解码消费”的交汇点——原始字节经
  `write` 或 `reserve`/`commit` 进入缓冲，读取器与分帧器以零拷贝视图
  提取结构化值或定界帧，消费后推进缓冲。契约层保证这一数据流对任意
  存储策略成立。
- **设计理念**：欠载（数据不足）是预期中的控制流，以
  `buffer.need_more_data` 错误值表达并由适配层按策略翻译；限额与状态
  误用则是中止信号，绝不内部重试。

## 核心契约（What）
- **输入条件**：缓冲由单一逻辑所有者驱动，契约不提供线程同步；
- **输出保障**：非消费操作不改变可读长度，消费严格 FIFO，检索与分帧
  语义以可读字节的概念拼接定义（“流正确”）；
- **错误分流**：所有失败同步返回 [`BufferError`]，携带稳定错误码与
  可分类的 [`BufferErrorKind`]。

## 实现策略（How）
- 视图以 `bytes::Bytes` 的引用计数段表达，创建后不可能观察到后续写入；
- 缓冲 trait 保持对象安全，`&mut dyn` 即可驱动任意实现；
- 读取器经 `coalesce` 透明跨段，定宽整数统一走 `from_be/le_bytes`。

## 风险与考量（Trade-offs）
- 契约未内置缓冲池与异步集成：本库纯同步、不含事件循环，唯一可能阻塞
  的位置是适配层调用方提供的 fill 回调；
- `no_std + alloc` 环境可用（关闭默认 `std` feature），错误域基于
  `core::error::Error`。
"#]

extern crate alloc;

pub mod buf;
pub mod error;
pub mod reader;
pub mod view;

pub use buf::{ByteStreamBuf, ErasedStreamBuf, ErasedStreamBufMut, MutByteStreamBuf};
pub use error::{BufferError, BufferErrorKind, Result, codes};
pub use reader::StreamReader;
pub use view::ByteView;
