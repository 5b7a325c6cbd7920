/// 設定管理モジュール
///
/// 環境判定、.envファイルの読み込み、ログシステムの初期化、
/// APIサーバーとクライアントの設定を提供します。
pub mod environment;

pub use environment::{
    get_environment, initialize_logging_system, load_environment_variables, ApiConfig, AppConfig,
    Environment, EnvironmentConfig,
};
