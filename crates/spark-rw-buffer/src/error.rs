//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为读写缓冲对外暴露的失败语义提供集中定义：阻塞读超时、容量耗尽、参数非法与写端已关闭；
//! - 同时承担与 `std::io` 的桥接，使 `Read`/`Write` 实现可以直接以 `?` 传播。
//!
//! ## 设计要求（What）
//! - 所有错误均派生 `thiserror::Error`，并提供稳定错误码 [`BufferError::code`]；
//! - 任何错误返回前都不得修改缓冲状态，调用方可安全重试或放弃。

use std::io;
use std::time::Duration;

use thiserror::Error;

/// 本 crate 的统一结果别名。
pub type Result<T, E = BufferError> = core::result::Result<T, E>;

const READ_TIMEOUT_CODE: &str = "spark.rw_buffer.read_timeout";
const EXHAUSTED_CODE: &str = "spark.rw_buffer.resource_exhausted";
const INVALID_ARGUMENT_CODE: &str = "spark.rw_buffer.invalid_argument";
const WRITER_CLOSED_CODE: &str = "spark.rw_buffer.writer_closed";

/// 读写缓冲的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：阻塞读、扩容与参数校验分属不同的失败类别，调用方需要据此决定重试、
///   放弃或修正调用；细粒度枚举让这些决策无需解析字符串。
/// - **契约 (What)**：
///   - 所有变体均为 `Send + Sync + 'static`，可跨线程传播；
///   - 错误只描述“本次调用失败”，缓冲本身始终保持最后一次有效状态；
///   - 通过 [`From<BufferError>`](From) 转换为 [`io::Error`]，保留原始错误作为 `source`。
/// - **设计权衡 (Trade-offs)**：超时与容量错误携带数值上下文而非格式化字符串，
///   避免在热路径上分配。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BufferError {
    /// 读端在超时上限内既没有等到新数据，也没有等到所有写端关闭。
    ///
    /// - **意图 (Why)**：防止同线程读写或被遗弃的写端造成永久阻塞，属于活性保护而非流控；
    /// - **契约 (What)**：`waited` 为本轮等待实际经过的时长；调用方可重试或放弃，
    ///   读端游标保持不变。
    #[error("no bytes available for reading for {waited:?}, giving up")]
    BlockingReadTimeout { waited: Duration },

    /// 追加所需容量超出可表示范围、配置上限或分配器能力。
    ///
    /// - **契约 (What)**：`committed + additional` 为所需的最小容量，`limit` 为当前允许的上限；
    ///   失败时存储与已提交长度均未改变。
    #[error(
        "cannot grow buffer to hold {committed} + {additional} bytes (limit {limit} bytes)"
    )]
    ResourceExhausted {
        committed: usize,
        additional: usize,
        limit: usize,
    },

    /// `read_into` 的目标区间越出目标切片。
    #[error("range {offset}..{offset}+{len} exceeds destination of {capacity} bytes")]
    InvalidArgument {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// 写端关闭后仍尝试写入。
    #[error("writer has already been closed")]
    WriterClosed,
}

impl BufferError {
    /// 返回稳定错误码，遵循 `<域>.<语义>` 命名，便于日志与告警聚合。
    pub fn code(&self) -> &'static str {
        match self {
            BufferError::BlockingReadTimeout { .. } => READ_TIMEOUT_CODE,
            BufferError::ResourceExhausted { .. } => EXHAUSTED_CODE,
            BufferError::InvalidArgument { .. } => INVALID_ARGUMENT_CODE,
            BufferError::WriterClosed => WRITER_CLOSED_CODE,
        }
    }

    /// 判断是否为阻塞读超时。
    pub fn is_timeout(&self) -> bool {
        matches!(self, BufferError::BlockingReadTimeout { .. })
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            BufferError::BlockingReadTimeout { .. } => io::ErrorKind::TimedOut,
            BufferError::ResourceExhausted { .. } => io::ErrorKind::OutOfMemory,
            BufferError::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            BufferError::WriterClosed => io::ErrorKind::BrokenPipe,
        }
    }
}

impl From<BufferError> for io::Error {
    /// 将缓冲错误映射为 [`io::Error`]。
    ///
    /// - **执行 (How)**：按类别挑选 [`io::ErrorKind`]，并把原错误作为内部负载保存，
    ///   调用方可通过 `get_ref().downcast_ref::<BufferError>()` 取回类型化错误。
    fn from(value: BufferError) -> Self {
        io::Error::new(value.io_kind(), value)
    }
}
