/// 消息结构
///
/// 由订阅层生成，处理函数只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// 主题
    pub topic: String,
    /// 分区
    pub partition: i32,
    /// 偏移量
    pub offset: i64,
    /// 消息键，可为空
    pub key: Vec<u8>,
    /// 消息体
    pub value: Vec<u8>,
    /// 时间戳（毫秒）
    pub timestamp: Option<i64>,
}
