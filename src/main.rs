use clap::Parser;
use subscription_tracker_lib::cli::Cli;
use subscription_tracker_lib::shared::errors::ErrorSeverity;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match subscription_tracker_lib::run(cli).await {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            match e.severity() {
                ErrorSeverity::High | ErrorSeverity::Critical => {
                    log::error!("コマンドの実行に失敗しました: {}", e.details())
                }
                ErrorSeverity::Low | ErrorSeverity::Medium => {
                    log::warn!("コマンドの実行に失敗しました: {}", e.details())
                }
            }
            eprintln!("エラー: {}", e.user_message());
            std::process::exit(1);
        }
    }
}
