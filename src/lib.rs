pub mod cli;
pub mod features;
pub mod shared;

use cli::{AppContext, Cli, Command};
use features::subscriptions::commands::suggest_renewal_date;
use log::{debug, info};
use shared::config::{initialize_logging_system, load_environment_variables};
use shared::errors::AppResult;

/// コマンドを実行し、標準出力に表示する文字列を返す
///
/// # 処理内容
/// 1. 環境変数ファイルを読み込む
/// 2. ログシステムを初期化する
/// 3. 設定から依存関係を組み立ててコマンドを実行する
pub async fn run(cli: Cli) -> AppResult<String> {
    let loaded_env_file = load_environment_variables();
    initialize_logging_system();

    match loaded_env_file {
        Some(file) => info!("{file}ファイルを読み込みました"),
        None => debug!(".envファイルが見つかりません。環境変数が直接設定されていることを確認してください"),
    }

    // APIサーバーの設定がなくても実行できる
    if let Command::RenewalDate {
        start_date,
        frequency,
    } = &cli.command
    {
        return suggest_renewal_date(start_date, frequency);
    }

    let context = AppContext::from_env()?;
    cli::execute(cli.command, &context).await
}
