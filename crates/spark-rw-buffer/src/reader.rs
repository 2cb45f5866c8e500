use std::{fmt, io, sync::Arc};

use crate::{
    error::{BufferError, Result},
    shared::{ReadCursor, Shared},
};

/// 顺序读取的读端视图。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 让消费者以普通阻塞字节流的方式读取正在被写入的数据，
///   写端每次追加都会唤醒等待中的读端，无需重新发起调用。
///
/// ## 逻辑 (How)
/// - 私有游标只被本读端持有，不需要额外同步；
/// - 无数据时：没有打开的写端则立即返回流结束，否则阻塞等待，
///   累计等待超过配置的上限后返回 [`BufferError::BlockingReadTimeout`]；
/// - 缓冲被截断后，游标在下一次操作时回到新内容的起点。
///
/// ## 契约 (What)
/// - [`read_into`](Self::read_into) / [`io::Read::read`]：返回读取的字节数，`0` 表示流结束
///   （请求长度为 0 时同样立即返回 `0`，不会阻塞）；
/// - [`read_byte`](Self::read_byte)：`None` 表示流结束；
/// - [`skip`](Self::skip) 与 [`available`](Self::available)：只看当前已提交的数据，从不阻塞；
/// - 超时错误不会推进游标，调用方可直接重试。
///
/// ## 注意事项 (Trade-offs)
/// - 读端与写端位于同一线程时，读端只能靠超时脱离等待；这是刻意保留的活性保护。
pub struct BufferReader {
    shared: Arc<Shared>,
    cursor: ReadCursor,
}

impl BufferReader {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let cursor = shared.new_cursor();
        Self { shared, cursor }
    }

    /// 读取单个字节，`Ok(None)` 表示流结束。
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        let n = self.shared.read(&mut self.cursor, &mut byte)?;
        Ok((n == 1).then_some(byte[0]))
    }

    /// 读取至多 `len` 字节到 `dst[offset..offset + len]`。
    ///
    /// 区间越出 `dst` 时返回 [`BufferError::InvalidArgument`]，且不触碰任何状态。
    pub fn read_into(&mut self, dst: &mut [u8], offset: usize, len: usize) -> Result<usize> {
        let capacity = dst.len();
        let invalid = || BufferError::InvalidArgument {
            offset,
            len,
            capacity,
        };
        let end = offset.checked_add(len).ok_or_else(invalid)?;
        if end > capacity {
            return Err(invalid());
        }
        self.shared.read(&mut self.cursor, &mut dst[offset..end])
    }

    /// 跳过至多 `n` 个当前已提交的字节，返回实际跳过的数量。
    pub fn skip(&mut self, n: usize) -> usize {
        self.shared.skip(&mut self.cursor, n)
    }

    /// 当前无需等待即可读取的字节数。
    pub fn available(&mut self) -> usize {
        self.shared.available(&mut self.cursor)
    }

    /// 关闭读端。读取从不占用独占资源，这里只释放对缓冲的引用。
    pub fn close(self) {}
}

impl io::Read for BufferReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.shared.read(&mut self.cursor, buf)?)
    }
}

impl fmt::Debug for BufferReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferReader")
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use crate::{BufferError, ReadWriteBuffer};

    #[test]
    fn read_into_rejects_out_of_range_before_reading() {
        let buffer = ReadWriteBuffer::from_bytes(b"abc".to_vec());
        let mut reader = buffer.open_reader();
        let mut dst = [0u8; 4];
        assert_eq!(
            reader.read_into(&mut dst, 3, 2),
            Err(BufferError::InvalidArgument {
                offset: 3,
                len: 2,
                capacity: 4,
            })
        );
        assert!(reader.read_into(&mut dst, usize::MAX, 2).is_err());
        assert_eq!(reader.available(), 3, "参数非法时游标不应移动");
    }

    #[test]
    fn read_into_writes_at_offset() {
        let buffer = ReadWriteBuffer::from_bytes(b"abc".to_vec());
        let mut reader = buffer.open_reader();
        let mut dst = [b'-'; 5];
        assert_eq!(reader.read_into(&mut dst, 1, 3), Ok(3));
        assert_eq!(&dst, b"-abc-");
        assert_eq!(reader.read_into(&mut dst, 0, 0), Ok(0));
        assert_eq!(reader.read_into(&mut dst, 0, 5), Ok(0), "无写端时应返回流结束");
    }

    #[test]
    fn skip_never_waits_for_more_data() {
        let buffer = ReadWriteBuffer::new();
        let mut writer = buffer.open_writer();
        writer.put_slice(b"0123").expect("写入");
        let mut reader = buffer.open_reader();
        assert_eq!(reader.skip(10), 4);
        assert_eq!(reader.skip(1), 0);
        assert_eq!(reader.available(), 0);
        writer.close();
    }

    #[test]
    fn read_byte_then_end_of_stream() {
        let buffer = ReadWriteBuffer::from_bytes(vec![0xFF]);
        let mut reader = buffer.open_reader();
        assert_eq!(reader.read_byte(), Ok(Some(0xFF)));
        assert_eq!(reader.read_byte(), Ok(None));
    }

    #[test]
    fn readers_have_independent_cursors() {
        let buffer = ReadWriteBuffer::from_bytes(b"hello".to_vec());
        let mut first = buffer.open_reader();
        let mut second = buffer.open_reader();
        let mut out = String::new();
        first.read_to_string(&mut out).expect("读到流结束");
        assert_eq!(out, "hello");
        assert_eq!(second.available(), 5);
        second.close();
    }
}
