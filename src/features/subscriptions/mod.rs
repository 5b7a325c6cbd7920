/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連するすべての機能を提供します：
/// - APIサーバー上のサブスクリプションの取得、作成、ステータス変更、解約、削除
/// - 作成フォームの既定値とバリデーション
/// - ダッシュボードの統計値（月額合計、件数、更新予定、カテゴリ別内訳）
pub mod analytics;
pub mod board;
pub mod commands;
pub mod form;
pub mod models;
pub mod repository;

pub use analytics::{
    aggregate_monthly_spend, category_spend_breakdown, compute_default_renewal_date,
    count_active, count_upcoming_renewals, normalize_to_monthly_cost, CategorySpend,
    DashboardStats,
};
pub use board::{available_action, AvailableAction, SubscriptionBoard};
pub use form::{FormErrors, FormField, SubscriptionInput};
pub use models::{Category, Currency, Frequency, Subscription, SubscriptionStatus};
pub use repository::SubscriptionRepository;
