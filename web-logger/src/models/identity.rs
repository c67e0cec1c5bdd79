//! 会话存储中的身份数据
//!
//! 存储里的JSON由登录流程写入,本管道只读。解析是可失败的,
//! 由增强数据源把失败映射为哨兵值。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::IdentityError;
use crate::utils::is_truthy;

/// 用户角色
///
/// 线上格式为大写字符串,无法判断时为 `UNKNOWN`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Both,
    Presenter,
    Participant,
    #[default]
    Unknown,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Both => "BOTH",
            UserRole::Presenter => "PRESENTER",
            UserRole::Participant => "PARTICIPANT",
            UserRole::Unknown => "UNKNOWN",
        }
    }
}

/// 存储的用户数据
///
/// 同时覆盖 `semscan_user_data` 与 `user_data` 两个键的结构。
/// 字段按宽松规则提取: 类型不符的字段视为缺失,不影响其他字段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredUserData {
    /// `presenter.name`,仅当 `presenter` 是对象时存在
    pub presenter_name: Option<String>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_presenter: bool,
    pub is_participant: bool,
}

impl StoredUserData {
    /// 解析存储键的原始JSON
    ///
    /// 只有JSON本身无法解析时才返回错误。
    pub fn parse(key: &str, raw: &str) -> Result<Self, IdentityError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| IdentityError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_value(&value))
    }

    /// 从任意JSON值提取字段,非对象值得到全空结果
    pub fn from_value(value: &Value) -> Self {
        Self {
            presenter_name: value
                .get("presenter")
                .filter(|p| p.is_object())
                .and_then(|p| text(p.get("name"))),
            name: text(value.get("name")),
            full_name: text(value.get("fullName")),
            first_name: text(value.get("firstName")),
            last_name: text(value.get("lastName")),
            is_presenter: truthy(value.get("isPresenter")),
            is_participant: truthy(value.get("isParticipant")),
        }
    }

    /// `semscan_user_data` 的显示名: 演讲者姓名优先,其次 `name`
    pub fn presenter_display_name(&self) -> Option<String> {
        self.presenter_name.clone().or_else(|| self.name.clone())
    }

    /// `user_data` 的显示名: `name` → `fullName` → `firstName lastName`
    pub fn display_name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.full_name.clone())
            .or_else(|| match (&self.first_name, &self.last_name) {
                (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                _ => None,
            })
    }

    pub fn role(&self) -> UserRole {
        match (self.is_presenter, self.is_participant) {
            (true, true) => UserRole::Both,
            (true, false) => UserRole::Presenter,
            (false, true) => UserRole::Participant,
            (false, false) => UserRole::Unknown,
        }
    }
}

fn truthy(value: Option<&Value>) -> bool {
    value.map_or(false, is_truthy)
}

/// 姓名字段: 非空字符串原样返回,非零数字转成文本,其余视为缺失
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if truthy(value) => Some(n.to_string()),
        _ => None,
    }
}
