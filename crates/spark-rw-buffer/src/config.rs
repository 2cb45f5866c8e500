use std::time::Duration;

use serde::Deserialize;

/// 新建缓冲默认预分配的字节数。
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// 阻塞读在没有新数据、写端仍打开时允许等待的上限。
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// `Vec<u8>` 能够容纳的最大字节数。
pub const MAX_REPRESENTABLE_CAPACITY: usize = isize::MAX as usize;

/// 读写缓冲的可调参数。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 默认值覆盖绝大多数场景：1 KiB 初始容量、5 秒阻塞读上限；
/// - 测试或嵌入式宿主需要收紧超时或容量上限时，无需修改代码即可调整，
///   也可以直接从 TOML 等配置文件反序列化。
///
/// ## 契约 (What)
/// - `initial_capacity`：首次分配的存储大小，仅在未提供初始字节时生效；
///   分配器拒绝时从空存储开始，由首次写入按需扩容；
/// - `max_capacity`：存储允许增长到的上限，超过时写入返回
///   [`BufferError::ResourceExhausted`](crate::BufferError::ResourceExhausted)；
///   取值大于 [`MAX_REPRESENTABLE_CAPACITY`] 时按后者处理；
/// - `read_timeout_ms`：阻塞读的超时上限，0 会被提升为 1 毫秒，避免读端永不等待。
///
/// ## 注意事项 (Trade-offs)
/// - 超时是活性保护而非流控：设置得过小会让正常的慢写端被误判为失联。
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct BufferConfig {
    initial_capacity: usize,
    max_capacity: usize,
    read_timeout_ms: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferConfig {
    /// 创建默认配置。
    pub const fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: MAX_REPRESENTABLE_CAPACITY,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }

    /// 设置初始容量。
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// 设置容量上限。
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// 设置阻塞读超时，按毫秒精度保存。
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity.min(self.max_capacity())
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity.min(MAX_REPRESENTABLE_CAPACITY)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BufferConfig::default();
        assert_eq!(config.initial_capacity(), 1024);
        assert_eq!(config.read_timeout(), Duration::from_millis(5000));
        assert_eq!(config.max_capacity(), MAX_REPRESENTABLE_CAPACITY);
    }

    #[test]
    fn zero_timeout_is_raised_to_one_millisecond() {
        let config = BufferConfig::new().with_read_timeout(Duration::ZERO);
        assert_eq!(config.read_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn initial_capacity_never_exceeds_limit() {
        let config = BufferConfig::new()
            .with_initial_capacity(4096)
            .with_max_capacity(16);
        assert_eq!(config.initial_capacity(), 16);
    }

    #[test]
    fn deserializes_partial_toml_with_defaults() {
        let config: BufferConfig = toml::from_str("read_timeout_ms = 250\n").expect("解析 TOML 配置");
        assert_eq!(config.read_timeout(), Duration::from_millis(250));
        assert_eq!(config.initial_capacity(), DEFAULT_INITIAL_CAPACITY);
    }
}
