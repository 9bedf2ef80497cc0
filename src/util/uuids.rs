//! UUID 校验与派生

use uuid::Uuid;

/// 名称派生时允许的最大字节数
pub const MAX_DERIVE_LEN: usize = 30;

/// 解析 UUID 字符串并返回小写带连字符的规范形式
///
/// 接受带/不带连字符、花括号和 `urn:uuid:` 前缀的写法。
pub fn canonical_uuid(text: &str) -> Result<String, uuid::Error> {
    Uuid::parse_str(text).map(|id| id.hyphenated().to_string())
}

/// 把 1~30 字节的任意文本映射为 UUID（空命名空间下的 UUIDv5）
pub fn derive_uuid(name: &str) -> Result<String, String> {
    if name.is_empty() || name.len() > MAX_DERIVE_LEN {
        return Err(format!(
            "invalid UUID name {:?}: expected 1-{} bytes",
            name, MAX_DERIVE_LEN
        ));
    }
    Ok(Uuid::new_v5(&Uuid::nil(), name.as_bytes())
        .hyphenated()
        .to_string())
}
