//! サブスクリプションの集計処理
//!
//! ダッシュボードに表示する統計値を、取得済みのサブスクリプション一覧から算出する。
//! すべて副作用のない関数で、現在時刻は呼び出し側から受け取る。

use super::models::{Category, Frequency, Subscription};
use crate::shared::utils::round_to_cents;
use chrono::{DateTime, Days, Months, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

/// 更新予定として数える期間（日数）
pub const RENEWAL_WINDOW_DAYS: u64 = 30;

/// 支払いサイクルごとの金額を月額に換算する
///
/// 週・日の換算は暦に依存しない固定係数（週×4、日×30）を使う。
/// 未知のサイクルは0として扱う。
pub fn monthly_cost(price: f64, frequency: &Frequency) -> f64 {
    match frequency {
        Frequency::Monthly => price,
        Frequency::Yearly => price / 12.0,
        Frequency::Weekly => price * 4.0,
        Frequency::Daily => price * 30.0,
        Frequency::Unknown(raw) => {
            log::warn!("未知の支払いサイクルのため月額を0として扱います: {raw}");
            0.0
        }
    }
}

/// サブスクリプションの月額換算コスト
pub fn normalize_to_monthly_cost(subscription: &Subscription) -> f64 {
    monthly_cost(subscription.price, &subscription.frequency)
}

fn active(subscriptions: &[Subscription]) -> impl Iterator<Item = &Subscription> {
    subscriptions.iter().filter(|s| s.is_active())
}

/// アクティブなサブスクリプションの月額合計
///
/// # 戻り値
/// 月額換算の合計（空、またはアクティブなものがない場合は0）
pub fn aggregate_monthly_spend(subscriptions: &[Subscription]) -> f64 {
    // f64のsum()は空のとき-0.0になる
    active(subscriptions)
        .map(normalize_to_monthly_cost)
        .fold(0.0, |total, cost| total + cost)
}

/// アクティブなサブスクリプションの件数
pub fn count_active(subscriptions: &[Subscription]) -> usize {
    active(subscriptions).count()
}

/// 30日以内に更新予定のアクティブなサブスクリプションの件数
///
/// # 引数
/// * `subscriptions` - サブスクリプション一覧
/// * `now` - 現在時刻（設定タイムゾーン）
///
/// # 戻り値
/// `now` のタイムゾーンで見た更新日が、今日より後かつ今日 + 30日より前の件数。
/// 更新日がない、または解析できないものは数えない。
pub fn count_upcoming_renewals(subscriptions: &[Subscription], now: DateTime<Tz>) -> usize {
    let timezone = now.timezone();
    let today = now.date_naive();
    let window_end = today
        .checked_add_days(Days::new(RENEWAL_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);

    active(subscriptions)
        .filter_map(|subscription| subscription.renewal_date_in(&timezone))
        .filter(|renewal| *renewal > today && *renewal < window_end)
        .count()
}

/// カテゴリ別の月額合計
///
/// # 戻り値
/// カテゴリごとの合計（小数点以下2桁に丸め済み）。
/// アクティブなサブスクリプションがないカテゴリは含まれない。
pub fn category_spend_breakdown(subscriptions: &[Subscription]) -> BTreeMap<Category, f64> {
    let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
    for subscription in active(subscriptions) {
        *totals.entry(subscription.category).or_insert(0.0) +=
            normalize_to_monthly_cost(subscription);
    }

    totals
        .into_iter()
        .map(|(category, total)| (category, round_to_cents(total)))
        .collect()
}

/// 開始日と支払いサイクルから既定の更新日を求める
///
/// 月・年の加算で存在しない日になる場合は月末に丸める
/// （2024-01-31 + 1か月 = 2024-02-29、2024-02-29 + 1年 = 2025-02-28）。
///
/// # 戻り値
/// 既定の更新日。未知のサイクルの場合はNone
pub fn compute_default_renewal_date(start: NaiveDate, frequency: &Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => start.checked_add_days(Days::new(1)),
        Frequency::Weekly => start.checked_add_days(Days::new(7)),
        Frequency::Monthly => start.checked_add_months(Months::new(1)),
        Frequency::Yearly => start.checked_add_months(Months::new(12)),
        Frequency::Unknown(_) => None,
    }
}

/// 円グラフ用のカテゴリ別データ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub id: String,
    pub label: String,
    pub value: f64,
}

/// ダッシュボードの統計値
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_monthly_spend: f64,
    pub active_count: usize,
    pub upcoming_renewals: usize,
    pub category_breakdown: BTreeMap<Category, f64>,
    /// 一覧で最初に現れた順
    pub chart_data: Vec<CategorySpend>,
}

impl DashboardStats {
    /// 一覧から統計値を算出する
    pub fn compute(subscriptions: &[Subscription], now: DateTime<Tz>) -> Self {
        let category_breakdown = category_spend_breakdown(subscriptions);

        let mut seen: Vec<Category> = Vec::new();
        for subscription in active(subscriptions) {
            if !seen.contains(&subscription.category) {
                seen.push(subscription.category);
            }
        }
        let chart_data = seen
            .into_iter()
            .filter_map(|category| {
                category_breakdown.get(&category).map(|value| CategorySpend {
                    id: category.label().to_string(),
                    label: category.label().to_string(),
                    value: *value,
                })
            })
            .collect();

        Self {
            total_monthly_spend: aggregate_monthly_spend(subscriptions),
            active_count: count_active(subscriptions),
            upcoming_renewals: count_upcoming_renewals(subscriptions, now),
            category_breakdown,
            chart_data,
        }
    }
}
