//! ダッシュボードの表示状態
//!
//! APIサーバーから取得した一覧の手元コピーを持ち、
//! 操作が成功するたびにサーバーの応答どおりに更新する。

use super::analytics::DashboardStats;
use super::models::{Subscription, SubscriptionStatus};
use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt;

/// 一覧の各行で実行できる操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailableAction {
    /// 解約（アクティブなもののみ）
    Cancel,
    /// 削除
    Delete,
}

impl fmt::Display for AvailableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailableAction::Cancel => f.write_str("cancel"),
            AvailableAction::Delete => f.write_str("delete"),
        }
    }
}

/// サブスクリプション一覧の手元コピー
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionBoard {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionBoard {
    /// 取得済みの一覧から作成する
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self { subscriptions }
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == id)
    }

    /// 作成されたサブスクリプションを末尾に追加する
    pub fn apply_created(&mut self, subscription: Subscription) {
        log::debug!("一覧に追加しました: id={}", subscription.id);
        self.subscriptions.push(subscription);
    }

    /// ステータスを変更する
    ///
    /// # 戻り値
    /// 該当するIDがあった場合はtrue
    pub fn apply_status(&mut self, id: &str, status: SubscriptionStatus) -> bool {
        match self.subscriptions.iter_mut().find(|s| s.id == id) {
            Some(subscription) => {
                subscription.status = Some(status);
                true
            }
            None => {
                log::debug!("ステータス変更対象が一覧にありません: id={id}");
                false
            }
        }
    }

    /// サブスクリプションを一覧から取り除く
    ///
    /// # 戻り値
    /// 該当するIDがあった場合はtrue
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    /// 現在の一覧から統計値を算出する
    pub fn stats(&self, now: DateTime<Tz>) -> DashboardStats {
        DashboardStats::compute(&self.subscriptions, now)
    }
}

/// 行に表示する操作（アクティブなら解約、それ以外は削除）
pub fn available_action(subscription: &Subscription) -> AvailableAction {
    if subscription.is_active() {
        AvailableAction::Cancel
    } else {
        AvailableAction::Delete
    }
}
