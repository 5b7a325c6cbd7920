use super::analytics::{compute_default_renewal_date, DashboardStats};
use super::board::{available_action, AvailableAction, SubscriptionBoard};
use super::form::SubscriptionInput;
use super::models::{Frequency, Subscription, SubscriptionStatus};
use super::repository::SubscriptionRepository;
use crate::features::auth::session::Session;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::validate_date;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

/// サブスクリプション一覧を表示する
///
/// # 戻り値
/// 表形式の一覧（更新日は `now` のタイムゾーンで表示）
pub async fn list_subscriptions(
    repository: &SubscriptionRepository,
    session: &Session,
    now: DateTime<Tz>,
) -> AppResult<String> {
    let board = SubscriptionBoard::new(repository.fetch_for_user(session).await?);
    Ok(render_table(&board, &now.timezone()))
}

/// サブスクリプションを追加する
///
/// # 引数
/// * `repository` - サブスクリプションリポジトリ
/// * `session` - ログイン中のセッション
/// * `input` - フォームの入力値
/// * `now` - 現在時刻（開始日の検証と集計用）
///
/// # 戻り値
/// 追加結果と更新後の集計、またはバリデーションエラー
pub async fn add_subscription(
    repository: &SubscriptionRepository,
    session: &Session,
    input: SubscriptionInput,
    now: DateTime<Tz>,
) -> AppResult<String> {
    input.validate(now.date_naive())?;

    let mut board = SubscriptionBoard::new(repository.fetch_for_user(session).await?);
    let request = input.into_create_request(session.user_id());
    let created = repository.create(session, &request).await?;

    let message = format!(
        "「{}」を追加しました（ID: {}、{}、更新日: {}）",
        created.name,
        created.id,
        created.display_price(),
        format_date(created.renewal_date_in(&now.timezone()))
    );
    board.apply_created(created);

    Ok(format!("{message}\n{}", render_summary(&board.stats(now))))
}

/// ステータスを変更する
pub async fn change_status(
    repository: &SubscriptionRepository,
    session: &Session,
    id: &str,
    status: SubscriptionStatus,
    now: DateTime<Tz>,
) -> AppResult<String> {
    let mut board = SubscriptionBoard::new(repository.fetch_for_user(session).await?);
    find_on_board(&board, id)?;

    repository.update_status(session, id, status).await?;
    board.apply_status(id, status);

    Ok(format!(
        "ステータスを{status}に変更しました\n{}",
        render_summary(&board.stats(now))
    ))
}

/// サブスクリプションを解約する（アクティブなもののみ）
pub async fn cancel_subscription(
    repository: &SubscriptionRepository,
    session: &Session,
    id: &str,
    now: DateTime<Tz>,
) -> AppResult<String> {
    let mut board = SubscriptionBoard::new(repository.fetch_for_user(session).await?);
    let subscription = find_on_board(&board, id)?;
    if available_action(subscription) != AvailableAction::Cancel {
        return Err(AppError::validation(
            "アクティブなサブスクリプションのみ解約できます",
        ));
    }
    let name = subscription.name.clone();

    repository.cancel(session, id).await?;
    board.apply_status(id, SubscriptionStatus::Canceled);

    Ok(format!(
        "「{name}」を解約しました\n{}",
        render_summary(&board.stats(now))
    ))
}

/// サブスクリプションを削除する（アクティブでないもののみ）
pub async fn delete_subscription(
    repository: &SubscriptionRepository,
    session: &Session,
    id: &str,
    now: DateTime<Tz>,
) -> AppResult<String> {
    let mut board = SubscriptionBoard::new(repository.fetch_for_user(session).await?);
    let subscription = find_on_board(&board, id)?;
    if available_action(subscription) != AvailableAction::Delete {
        return Err(AppError::validation(
            "アクティブなサブスクリプションは削除できません。先に解約してください",
        ));
    }
    let name = subscription.name.clone();

    repository.delete(session, id).await?;
    board.remove(id);

    Ok(format!(
        "「{name}」を削除しました\n{}",
        render_summary(&board.stats(now))
    ))
}

/// JSON出力用のダッシュボード
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardView<'a> {
    display_name: &'a str,
    stats: DashboardStats,
    subscriptions: &'a [Subscription],
}

/// ダッシュボードを表示する
///
/// # 引数
/// * `as_json` - trueの場合はJSONで出力する
pub async fn show_dashboard(
    repository: &SubscriptionRepository,
    session: &Session,
    now: DateTime<Tz>,
    as_json: bool,
) -> AppResult<String> {
    let board = SubscriptionBoard::new(repository.fetch_for_user(session).await?);
    let stats = board.stats(now);
    let display_name = session.user().display_name();

    if as_json {
        let view = DashboardView {
            display_name,
            stats,
            subscriptions: board.subscriptions(),
        };
        return Ok(serde_json::to_string_pretty(&view)?);
    }

    let mut output = format!("おかえりなさい、{display_name}さん！\n\n");
    output.push_str(&render_summary(&stats));
    output.push('\n');
    output.push_str(&render_breakdown(&stats));
    output.push('\n');
    output.push_str(&render_table(&board, &now.timezone()));
    Ok(output)
}

/// 開始日と支払いサイクルから既定の更新日を求める
///
/// # 引数
/// * `start_date` - 開始日（YYYY-MM-DD）
/// * `frequency` - 支払いサイクル
pub fn suggest_renewal_date(start_date: &str, frequency: &str) -> AppResult<String> {
    let start = validate_date(start_date)?;
    let frequency: Frequency = frequency.parse()?;

    compute_default_renewal_date(start, &frequency)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| AppError::validation("更新日を計算できない日付です"))
}

fn find_on_board<'a>(board: &'a SubscriptionBoard, id: &str) -> AppResult<&'a Subscription> {
    board
        .find(id)
        .ok_or_else(|| AppError::not_found(format!("ID {id} のサブスクリプション")))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn render_summary(stats: &DashboardStats) -> String {
    format!(
        "月額合計: {:.2}\nアクティブ: {}件\n30日以内の更新: {}件\n",
        stats.total_monthly_spend, stats.active_count, stats.upcoming_renewals
    )
}

fn render_breakdown(stats: &DashboardStats) -> String {
    if stats.chart_data.is_empty() {
        return "カテゴリ別: なし\n".to_string();
    }

    let mut output = String::from("カテゴリ別（月額）:\n");
    for entry in &stats.chart_data {
        output.push_str(&format!("  {:<14} {:>10.2}\n", entry.label, entry.value));
    }
    output
}

fn render_table(board: &SubscriptionBoard, timezone: &Tz) -> String {
    if board.is_empty() {
        return "サブスクリプションはまだありません\n".to_string();
    }

    let mut output = format!(
        "{:<26} {:<20} {:>12} {:<8} {:<14} {:<16} {:<9} {:<10} {}\n",
        "ID", "名前", "金額", "サイクル", "カテゴリ", "支払い方法", "状態", "更新日", "操作"
    );
    for subscription in board.subscriptions() {
        let status = subscription
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<26} {:<20} {:>12} {:<8} {:<14} {:<16} {:<9} {:<10} {}\n",
            subscription.id,
            subscription.name,
            subscription.display_price(),
            subscription.frequency,
            subscription.category,
            subscription.payment_method,
            status,
            format_date(subscription.renewal_date_in(timezone)),
            available_action(subscription)
        ));
    }
    output
}
