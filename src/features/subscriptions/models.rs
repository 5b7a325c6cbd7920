use crate::shared::errors::AppError;
use crate::shared::utils::parse_calendar_date;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::USD, Currency::EUR, Currency::GBP];

    /// 通貨コード
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Currency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::validation(format!("通貨はUSD、EUR、GBPのいずれかを指定してください（受信: '{s}'）"))
            })
    }
}

/// 支払いサイクル
///
/// APIから未知の値が返ってきた場合も一覧の取得を失敗させないよう、
/// `Unknown` に元の文字列を保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Unknown(String),
}

impl Frequency {
    /// フォームで選択できる支払いサイクル
    pub const SELECTABLE: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Frequency::Unknown(_))
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        match value.as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            "yearly" => Frequency::Yearly,
            _ => Frequency::Unknown(value),
        }
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 入力値の解析（未知の値は受け付けない）
impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Frequency::from(s.trim().to_lowercase()) {
            Frequency::Unknown(_) => Err(AppError::validation(format!(
                "支払いサイクルはdaily、weekly、monthly、yearlyのいずれかを指定してください（受信: '{s}'）"
            ))),
            known => Ok(known),
        }
    }
}

/// カテゴリ（固定の9種類）
///
/// 並び順は宣言順で、集計結果の出力順にも使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Sports,
    News,
    Entertainment,
    Lifestyle,
    Technology,
    Finance,
    Politics,
    Business,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Sports,
        Category::News,
        Category::Entertainment,
        Category::Lifestyle,
        Category::Technology,
        Category::Finance,
        Category::Politics,
        Category::Business,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Sports => "Sports",
            Category::News => "News",
            Category::Entertainment => "Entertainment",
            Category::Lifestyle => "Lifestyle",
            Category::Technology => "Technology",
            Category::Finance => "Finance",
            Category::Politics => "Politics",
            Category::Business => "Business",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
                AppError::validation(format!(
                    "カテゴリは{}のいずれかを指定してください（受信: '{s}'）",
                    names.join("、")
                ))
            })
    }
}

/// サブスクリプションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
    Paused,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Canceled,
        SubscriptionStatus::Expired,
        SubscriptionStatus::Paused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Canceled => "Canceled",
            SubscriptionStatus::Expired => "Expired",
            SubscriptionStatus::Paused => "Paused",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "ステータスはActive、Canceled、Expired、Pausedのいずれかを指定してください（受信: '{s}'）"
                ))
            })
    }
}

/// サブスクリプションデータモデル（APIサーバーのレスポンス形式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub frequency: Frequency,
    pub category: Category,
    #[serde(default)]
    pub payment_method: String,
    /// 未設定の場合はアクティブとして扱わない
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    /// YYYY-MM-DD または RFC3339
    #[serde(default)]
    pub start_date: Option<String>,
    /// YYYY-MM-DD または RFC3339
    #[serde(default)]
    pub renewal_date: Option<String>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == Some(SubscriptionStatus::Active)
    }

    /// `timezone` での更新日（解析できない場合はNone）
    pub fn renewal_date_in(&self, timezone: &Tz) -> Option<NaiveDate> {
        self.renewal_date
            .as_deref()
            .and_then(|value| parse_calendar_date(value, timezone))
    }

    /// `timezone` での開始日（解析できない場合はNone）
    pub fn start_date_in(&self, timezone: &Tz) -> Option<NaiveDate> {
        self.start_date
            .as_deref()
            .and_then(|value| parse_calendar_date(value, timezone))
    }

    /// 一覧表示用の金額（例: "USD 9.99"）
    pub fn display_price(&self) -> String {
        format!("{} {:.2}", self.currency.code(), self.price)
    }
}

/// サブスクリプション作成リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub frequency: Frequency,
    pub category: Category,
    pub payment_method: String,
    pub status: SubscriptionStatus,
    /// RFC3339（UTC深夜0時）
    pub start_date: String,
    /// RFC3339（UTC深夜0時）
    pub renewal_date: String,
    pub user_id: String,
}

/// ステータス更新リクエスト
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: SubscriptionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_api_subscription() {
        let value = json!({
            "_id": "65f1c0ffee",
            "name": "Netflix",
            "price": 15.49,
            "currency": "USD",
            "frequency": "monthly",
            "category": "Entertainment",
            "paymentMethod": "Credit Card",
            "status": "Active",
            "startDate": "2024-01-15T00:00:00.000Z",
            "renewalDate": "2024-02-15T00:00:00.000Z",
            "user": "65f1aa",
            "createdAt": "2024-01-15T10:00:00.000Z"
        });

        let sub: Subscription = serde_json::from_value(value).unwrap();
        assert_eq!(sub.id, "65f1c0ffee");
        assert_eq!(sub.frequency, Frequency::Monthly);
        assert_eq!(sub.category, Category::Entertainment);
        assert!(sub.is_active());
        assert_eq!(sub.renewal_date_in(&chrono_tz::UTC), NaiveDate::from_ymd_opt(2024, 2, 15));
        assert_eq!(sub.start_date_in(&chrono_tz::UTC), NaiveDate::from_ymd_opt(2024, 1, 15));
        // UTC深夜0時はニューヨークでは前日
        assert_eq!(
            sub.renewal_date_in(&chrono_tz::America::New_York),
            NaiveDate::from_ymd_opt(2024, 2, 14)
        );
        assert_eq!(sub.display_price(), "USD 15.49");
    }

    #[test]
    fn test_missing_optional_fields() {
        let value = json!({
            "_id": "1",
            "name": "Gym",
            "price": 30,
            "currency": "EUR",
            "frequency": "monthly",
            "category": "Sports"
        });

        let sub: Subscription = serde_json::from_value(value).unwrap();
        assert_eq!(sub.status, None);
        assert!(!sub.is_active());
        assert_eq!(sub.renewal_date_in(&chrono_tz::UTC), None);
        assert_eq!(sub.payment_method, "");
    }

    #[test]
    fn test_unknown_frequency_is_preserved() {
        let value = json!({
            "_id": "1",
            "name": "Legacy",
            "price": 5,
            "currency": "GBP",
            "frequency": "quarterly",
            "category": "Other",
            "status": "Active"
        });

        let sub: Subscription = serde_json::from_value(value).unwrap();
        assert_eq!(sub.frequency, Frequency::Unknown("quarterly".to_string()));
        assert!(!sub.frequency.is_known());

        // 再シリアライズしても元の値が残る
        let back = serde_json::to_value(&sub).unwrap();
        assert_eq!(back["frequency"], "quarterly");
        assert_eq!(back["_id"], "1");
    }

    #[test]
    fn test_frequency_wire_values_are_case_sensitive() {
        assert_eq!(Frequency::from("monthly".to_string()), Frequency::Monthly);
        assert_eq!(
            Frequency::from("Monthly".to_string()),
            Frequency::Unknown("Monthly".to_string())
        );
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!("Yearly".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert!("fortnightly".parse::<Frequency>().is_err());

        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert!("JPY".parse::<Currency>().is_err());

        assert_eq!("technology".parse::<Category>().unwrap(), Category::Technology);
        assert!("Music".parse::<Category>().is_err());

        assert_eq!(
            "paused".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Paused
        );
        assert!("Deleted".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn test_serialize_create_request() {
        let request = CreateSubscriptionRequest {
            name: "Spotify".to_string(),
            price: 9.99,
            currency: Currency::USD,
            frequency: Frequency::Monthly,
            category: Category::Entertainment,
            payment_method: "PayPal".to_string(),
            status: SubscriptionStatus::Active,
            start_date: "2024-01-01T00:00:00.000Z".to_string(),
            renewal_date: "2024-02-01T00:00:00.000Z".to_string(),
            user_id: "u1".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["paymentMethod"], "PayPal");
        assert_eq!(value["frequency"], "monthly");
        assert_eq!(value["status"], "Active");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["startDate"], "2024-01-01T00:00:00.000Z");
    }
}
