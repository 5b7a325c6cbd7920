//! サブスクリプション作成フォーム
//!
//! 入力値の既定値、開始日変更時の更新日の自動設定、送信前のバリデーションを扱う。

use super::analytics::compute_default_renewal_date;
use super::models::{
    Category, CreateSubscriptionRequest, Currency, Frequency, SubscriptionStatus,
};
use crate::shared::errors::AppError;
use crate::shared::utils::{to_api_timestamp, validate_text_length};
use chrono::{Months, NaiveDate};
use std::fmt;

/// サービス名の最大文字数
const MAX_NAME_LENGTH: usize = 100;

/// フォームの入力値
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionInput {
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub frequency: Frequency,
    pub category: Category,
    pub payment_method: String,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub renewal_date: NaiveDate,
}

impl SubscriptionInput {
    /// 既定値で初期化する
    ///
    /// 開始日は1か月前、更新日は今日になる。
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            price: 0.0,
            currency: Currency::USD,
            frequency: Frequency::Monthly,
            category: Category::Entertainment,
            payment_method: String::new(),
            status: SubscriptionStatus::Active,
            start_date: today.checked_sub_months(Months::new(1)).unwrap_or(today),
            renewal_date: today,
        }
    }

    /// 開始日を変更し、支払いサイクルから更新日を再計算する
    ///
    /// 既定の更新日が求められない場合（未知のサイクル）は更新日を変更しない。
    pub fn set_start_date(&mut self, start_date: NaiveDate) {
        self.start_date = start_date;
        if let Some(renewal) = compute_default_renewal_date(start_date, &self.frequency) {
            self.renewal_date = renewal;
        }
    }

    /// 入力値を検証する
    ///
    /// # 引数
    /// * `today` - 開始日の上限判定に使う基準日
    ///
    /// # 戻り値
    /// すべての項目が有効な場合はOk、それ以外は項目ごとのエラー
    pub fn validate(&self, today: NaiveDate) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        if self.name.trim().is_empty() {
            errors.push(FormField::Name, "サービス名は必須項目です");
        } else if let Err(e) = validate_text_length(self.name.trim(), MAX_NAME_LENGTH, "サービス名")
        {
            errors.push(FormField::Name, e.user_message());
        }

        if !self.price.is_finite() || self.price <= 0.0 {
            errors.push(FormField::Price, "金額は0より大きい値を入力してください");
        }

        if self.payment_method.trim().is_empty() {
            errors.push(FormField::PaymentMethod, "支払い方法は必須項目です");
        }

        if self.start_date > today {
            errors.push(FormField::StartDate, "開始日に未来の日付は指定できません");
        }

        if self.renewal_date < self.start_date {
            errors.push(FormField::RenewalDate, "更新日は開始日以降の日付を指定してください");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// API送信用のリクエストに変換する
    ///
    /// # 引数
    /// * `user_id` - 所有ユーザーのID
    pub fn into_create_request(self, user_id: &str) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            name: self.name.trim().to_string(),
            price: self.price,
            currency: self.currency,
            frequency: self.frequency,
            category: self.category,
            payment_method: self.payment_method.trim().to_string(),
            status: self.status,
            start_date: to_api_timestamp(self.start_date),
            renewal_date: to_api_timestamp(self.renewal_date),
            user_id: user_id.to_string(),
        }
    }
}

/// フォームの項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Price,
    PaymentMethod,
    StartDate,
    RenewalDate,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "サービス名",
            FormField::Price => "金額",
            FormField::PaymentMethod => "支払い方法",
            FormField::StartDate => "開始日",
            FormField::RenewalDate => "更新日",
        }
    }
}

/// 項目ごとのバリデーションエラー
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    errors: Vec<(FormField, String)>,
}

impl FormErrors {
    fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// 指定項目のエラーメッセージ
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FormField, String)> {
        self.errors.iter()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|(_, m)| m.as_str()).collect();
        f.write_str(&messages.join("\n"))
    }
}

impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        AppError::validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filled(today: NaiveDate) -> SubscriptionInput {
        let mut input = SubscriptionInput::default_for(today);
        input.name = "Netflix".to_string();
        input.price = 15.49;
        input.payment_method = "Credit Card".to_string();
        input
    }

    #[test]
    fn test_defaults() {
        let today = date(2024, 3, 31);
        let input = SubscriptionInput::default_for(today);

        assert_eq!(input.name, "");
        assert_eq!(input.price, 0.0);
        assert_eq!(input.currency, Currency::USD);
        assert_eq!(input.frequency, Frequency::Monthly);
        assert_eq!(input.category, Category::Entertainment);
        assert_eq!(input.status, SubscriptionStatus::Active);
        assert_eq!(input.start_date, date(2024, 2, 29));
        assert_eq!(input.renewal_date, today);
    }

    #[test]
    fn test_set_start_date_recomputes_renewal() {
        let mut input = SubscriptionInput::default_for(date(2024, 6, 1));
        input.frequency = Frequency::Weekly;
        input.set_start_date(date(2024, 5, 20));

        assert_eq!(input.start_date, date(2024, 5, 20));
        assert_eq!(input.renewal_date, date(2024, 5, 27));
    }

    #[test]
    fn test_set_start_date_keeps_renewal_for_unknown_frequency() {
        let mut input = SubscriptionInput::default_for(date(2024, 6, 1));
        input.frequency = Frequency::Unknown("quarterly".to_string());
        input.set_start_date(date(2024, 5, 1));

        assert_eq!(input.renewal_date, date(2024, 6, 1));
    }

    #[test]
    fn test_valid_input() {
        let today = date(2024, 6, 1);
        assert!(filled(today).validate(today).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let today = date(2024, 6, 1);
        let mut input = SubscriptionInput::default_for(today);
        input.start_date = date(2024, 6, 10);
        input.renewal_date = date(2024, 6, 5);

        let errors = input.validate(today).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.get(FormField::Name).is_some());
        assert!(errors.get(FormField::Price).is_some());
        assert!(errors.get(FormField::PaymentMethod).is_some());
        assert!(errors.get(FormField::StartDate).is_some());
        assert!(errors.get(FormField::RenewalDate).is_some());
    }

    #[test]
    fn test_start_date_today_is_allowed() {
        let today = date(2024, 6, 1);
        let mut input = filled(today);
        input.start_date = today;
        input.renewal_date = today;
        assert!(input.validate(today).is_ok());
    }

    #[test]
    fn test_rejects_nan_price() {
        let today = date(2024, 6, 1);
        let mut input = filled(today);
        input.price = f64::NAN;
        let errors = input.validate(today).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get(FormField::Price).is_some());
    }

    #[test]
    fn test_form_errors_into_app_error() {
        let today = date(2024, 6, 1);
        let mut input = filled(today);
        input.payment_method = "  ".to_string();

        let err: AppError = input.validate(today).unwrap_err().into();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.user_message(), "支払い方法は必須項目です");
    }

    #[test]
    fn test_into_create_request() {
        let today = date(2024, 6, 1);
        let mut input = filled(today);
        input.name = "  Netflix ".to_string();
        input.set_start_date(date(2024, 1, 31));

        let request = input.into_create_request("user-1");
        assert_eq!(request.name, "Netflix");
        assert_eq!(request.user_id, "user-1");
        assert_eq!(request.start_date, "2024-01-31T00:00:00.000Z");
        assert_eq!(request.renewal_date, "2024-02-29T00:00:00.000Z");
    }
}
