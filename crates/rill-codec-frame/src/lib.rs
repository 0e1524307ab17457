#![cfg_attr(not(feature = "std"), no_std)]
#![doc = r#"
# rill-codec-frame

## 设计动机（Why）
- **定位**：在 `rill-core` 缓冲契约之上实现两类通用分帧器：
  - [`DelimiterFramer`]：多定界符、最长匹配、跨流式边界消解前缀歧义
    （`\r` vs `\r\n` 一类），适合文本型记录流；
  - [`LengthFieldFramer`]：长度前缀分帧，字段位置/宽度/字节序/调整量
    全部参数化，适合二进制协议。
- **架构角色**：分帧器对缓冲实现零假设——只依赖 `find`/`coalesce`/
  `take`/`advance` 的契约语义，线性、分段、钉定与只读包装缓冲均可驱动。

## 核心契约（What）
- 每次 `decode` 提取所有当前可确认的帧并以零拷贝视图交付，未定界/未
  收齐的字节留存缓冲等待下一次调用；
- 帧严格按边界在字节流中出现的顺序产出；
- 限额（`buffer.too_large` / `frame.too_large`）是中止信号，配置
  `max_size` 即获得无定界输入下的有界内存保证。
"#]

extern crate alloc;

mod delimiter;
mod length_field;

pub use delimiter::DelimiterFramer;
pub use length_field::{ByteOrder, LengthFieldFramer};
