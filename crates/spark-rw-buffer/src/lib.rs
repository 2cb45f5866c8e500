//! `spark-rw-buffer` 提供边写边读的内存字节管道。
//!
//! # 模块定位（Why）
//! - 生产者逐段写入、消费者同时读取的场景（例如把正在生成的响应体转交给另一个线程解析）
//!   需要一个无需等待整段数据完成的阻塞字节流；
//! - 标准库的 `Vec<u8>` 与 `Cursor` 只能“先写完再读”，管道类原语又往往没有
//!   “全部写端关闭”与“完整内容回调”的概念，本 crate 补足这两点。
//!
//! # 设计概要（How）
//! - [`ReadWriteBuffer`] 是共享句柄，内部以单把互斥锁保护存储、已提交长度与写端计数，
//!   并以条件变量广播“新数据 / 写端关闭”事件；
//! - [`BufferWriter`] 追加字节并唤醒读端，最后一个写端关闭时触发完成回调；
//! - [`BufferReader`] 持有私有游标顺序读取，无数据时阻塞，写端全部关闭后返回流结束，
//!   长时间无进展时以 [`BufferError::BlockingReadTimeout`] 失败；
//! - 读写端分别实现 `std::io::Read` / `std::io::Write`，可直接接入标准 IO 适配器。
//!
//! # 命名约定（Consistency）
//! - 写入沿用 `put_slice`/`put_u8` 等缓冲术语；读取侧的 `skip`、`available`
//!   与常见流接口保持一致。
//!
//! ```
//! use std::io::{BufRead, BufReader, Write};
//! use spark_rw_buffer::ReadWriteBuffer;
//!
//! let buffer = ReadWriteBuffer::new();
//! let mut writer = buffer.open_writer();
//! writer.write_all(b"Test String\n").unwrap();
//! writer.close();
//!
//! let mut line = String::new();
//! BufReader::new(buffer.open_reader()).read_line(&mut line).unwrap();
//! assert_eq!(line, "Test String\n");
//! ```

mod buffer;
mod config;
mod error;
mod reader;
mod shared;
mod storage;
mod writer;

pub use buffer::{ReadWriteBuffer, ReadWriteBufferBuilder};
pub use config::{
    BufferConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_READ_TIMEOUT, MAX_REPRESENTABLE_CAPACITY,
};
pub use error::{BufferError, Result};
pub use reader::BufferReader;
pub use shared::CompletionListener;
pub use writer::BufferWriter;
