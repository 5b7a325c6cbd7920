/// 機能別モジュール
///
/// 各機能モジュールは、その機能に関連するすべてのコード（モデル、コマンド、APIサーバーとの通信、サービス）
/// を含む自己完結型のユニットです。
pub mod auth;
pub mod subscriptions;
