//! コマンドライン引数の定義とディスパッチ

use crate::features::auth::{commands as auth_commands, AuthService, FileTokenStore};
use crate::features::subscriptions::{
    commands as subscription_commands, SubscriptionInput, SubscriptionRepository,
};
use crate::shared::api_client::ApiClient;
use crate::shared::config::AppConfig;
use crate::shared::errors::AppResult;
use crate::shared::utils::{validate_date, Clock, SystemClock};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "subscription-tracker",
    version,
    about = "サブスクリプションの登録と月額コストの確認"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// アカウントを作成してログインする
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// ログインする
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// ログアウトする
    Logout,
    /// ログイン中のユーザーを表示する
    Whoami,
    /// サブスクリプション一覧を表示する
    List,
    /// サブスクリプションを追加する
    Add(AddArgs),
    /// ステータスを変更する（Active / Expired / Paused）
    Status { id: String, status: String },
    /// サブスクリプションを解約する
    Cancel { id: String },
    /// サブスクリプションを削除する
    Delete { id: String },
    /// ダッシュボードを表示する
    Dashboard {
        /// JSONで出力する
        #[arg(long)]
        json: bool,
    },
    /// 開始日と支払いサイクルから既定の更新日を表示する
    RenewalDate {
        #[arg(long)]
        start_date: String,
        #[arg(long, default_value = "monthly")]
        frequency: String,
    },
}

/// addコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// サービス名
    #[arg(long)]
    pub name: String,
    /// 金額
    #[arg(long)]
    pub price: f64,
    /// 通貨（USD / EUR / GBP）
    #[arg(long, default_value = "USD")]
    pub currency: String,
    /// 支払いサイクル（daily / weekly / monthly / yearly）
    #[arg(long, default_value = "monthly")]
    pub frequency: String,
    /// カテゴリ
    #[arg(long, default_value = "Entertainment")]
    pub category: String,
    /// 支払い方法
    #[arg(long)]
    pub payment_method: String,
    /// ステータス
    #[arg(long, default_value = "Active")]
    pub status: String,
    /// 開始日（YYYY-MM-DD、省略時は1か月前）
    #[arg(long)]
    pub start_date: Option<String>,
    /// 更新日（YYYY-MM-DD、省略時は開始日と支払いサイクルから算出）
    #[arg(long)]
    pub renewal_date: Option<String>,
}

impl AddArgs {
    /// フォームの入力値に変換する
    ///
    /// 開始日を指定した場合は支払いサイクルから更新日を再計算し、
    /// 更新日も指定した場合はそちらを優先する。
    pub fn into_input(self, today: NaiveDate) -> AppResult<SubscriptionInput> {
        let mut input = SubscriptionInput::default_for(today);
        input.name = self.name;
        input.price = self.price;
        input.currency = self.currency.parse()?;
        input.frequency = self.frequency.parse()?;
        input.category = self.category.parse()?;
        input.payment_method = self.payment_method;
        input.status = self.status.parse()?;

        if let Some(start_date) = self.start_date {
            input.set_start_date(validate_date(&start_date)?);
        }
        if let Some(renewal_date) = self.renewal_date {
            input.renewal_date = validate_date(&renewal_date)?;
        }
        Ok(input)
    }
}

/// コマンド実行に必要な依存関係
pub struct AppContext {
    pub auth: AuthService,
    pub repository: SubscriptionRepository,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    /// 環境変数の設定から依存関係を組み立てる
    pub fn from_env() -> AppResult<Self> {
        let app_config = AppConfig::from_env()?;
        let api_client = ApiClient::from_env()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(app_config.timezone));
        let token_store = Arc::new(FileTokenStore::new(
            app_config.session_store_path,
            &app_config.session_encryption_key,
        ));

        Ok(Self {
            auth: AuthService::new(api_client.clone(), token_store, Arc::clone(&clock)),
            repository: SubscriptionRepository::new(api_client),
            clock,
        })
    }
}

/// コマンドを実行し、表示する文字列を返す
pub async fn execute(command: Command, context: &AppContext) -> AppResult<String> {
    let now = context.clock.local_now();

    match command {
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
        } => auth_commands::sign_up(&context.auth, &first_name, &last_name, &email, &password).await,
        Command::Signin { email, password } => {
            auth_commands::sign_in(&context.auth, &email, &password).await
        }
        Command::Logout => auth_commands::logout(&context.auth),
        Command::Whoami => auth_commands::who_am_i(&context.auth),
        Command::List => {
            let session = context.auth.require_session()?;
            subscription_commands::list_subscriptions(&context.repository, &session, now).await
        }
        Command::Add(args) => {
            let session = context.auth.require_session()?;
            let input = args.into_input(now.date_naive())?;
            subscription_commands::add_subscription(&context.repository, &session, input, now)
                .await
        }
        Command::Status { id, status } => {
            let status = status.parse()?;
            let session = context.auth.require_session()?;
            subscription_commands::change_status(&context.repository, &session, &id, status, now)
                .await
        }
        Command::Cancel { id } => {
            let session = context.auth.require_session()?;
            subscription_commands::cancel_subscription(&context.repository, &session, &id, now)
                .await
        }
        Command::Delete { id } => {
            let session = context.auth.require_session()?;
            subscription_commands::delete_subscription(&context.repository, &session, &id, now)
                .await
        }
        Command::Dashboard { json } => {
            let session = context.auth.require_session()?;
            subscription_commands::show_dashboard(&context.repository, &session, now, json).await
        }
        Command::RenewalDate {
            start_date,
            frequency,
        } => subscription_commands::suggest_renewal_date(&start_date, &frequency),
    }
}
