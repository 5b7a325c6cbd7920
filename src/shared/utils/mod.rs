/// 共有ユーティリティ関数
///
/// 日付の解析・変換、入力値のバリデーション、金額の丸めを提供します。
pub mod clock;

use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

pub use clock::{Clock, FixedClock, SystemClock};

/// メールアドレスの簡易形式チェック用パターン
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("メールアドレスの正規表現が不正です")
});

/// APIから受け取った日付文字列を暦日に変換する
///
/// # 引数
/// * `value` - 日付文字列（YYYY-MM-DD、RFC3339、またはタイムゾーンなしの日時）
/// * `timezone` - 日付を判定するタイムゾーン
///
/// # 戻り値
/// 解析できた場合は暦日、できない場合はNone
///
/// RFC3339の場合は `timezone` に変換した時点の日付を採用する。
/// オフセットを持たない値はそのままの日付とする。
pub fn parse_calendar_date(value: &str, timezone: &Tz) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.with_timezone(timezone).date_naive());
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|datetime| datetime.date())
        .ok()
}

/// 暦日をAPI送信用のタイムスタンプ（UTC深夜0時、ミリ秒付きRFC3339）に変換する
///
/// 例: 2024-01-31 -> "2024-01-31T00:00:00.000Z"
pub fn to_api_timestamp(date: NaiveDate) -> String {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 小数点以下2桁に丸める（表示用）
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 日付文字列のバリデーション（YYYY-MM-DD形式）
///
/// # 戻り値
/// 有効な日付の場合はその日付、無効な場合はエラー
pub fn validate_date(date_str: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("日付はYYYY-MM-DD形式で入力してください（受信: '{date_str}'）")))
}

/// 文字列の長さバリデーション
///
/// # 引数
/// * `text` - 検証対象の文字列
/// * `max_length` - 最大文字数
/// * `field_name` - フィールド名（エラーメッセージ用）
pub fn validate_text_length(text: &str, max_length: usize, field_name: &str) -> AppResult<()> {
    let char_count = text.chars().count();
    if char_count > max_length {
        return Err(AppError::validation(format!(
            "{field_name}は{max_length}文字以内で入力してください（現在: {char_count}文字）"
        )));
    }
    Ok(())
}

/// 必須フィールドのバリデーション
pub fn validate_required_field(text: &str, field_name: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation(format!("{field_name}は必須項目です")));
    }
    Ok(())
}

/// メールアドレスのバリデーション
pub fn validate_email(email: &str) -> AppResult<()> {
    validate_required_field(email, "メールアドレス")?;
    if !EMAIL_PATTERN.is_match(email.trim()) {
        return Err(AppError::validation("メールアドレスの形式が正しくありません"));
    }
    Ok(())
}

/// 文字列の正規化（前後の空白を削除）
pub fn normalize_string(text: &str) -> String {
    text.trim().to_string()
}
