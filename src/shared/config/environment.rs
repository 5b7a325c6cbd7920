use crate::shared::errors::{AppError, AppResult};
use chrono_tz::Tz;
use std::path::PathBuf;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境変数取得エラー
#[derive(Debug, Clone)]
pub struct EnvVarError {
    /// 変数名
    pub var_name: String,
    /// エラーメッセージ
    pub message: String,
}

impl std::fmt::Display for EnvVarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "環境変数 {} が見つかりません: {}",
            self.var_name, self.message
        )
    }
}

impl std::error::Error for EnvVarError {}

/// 環境変数を取得する（優先順位: 起動時 > コンパイル時埋め込み > エラー）
///
/// コンパイル時の値は build.rs が `EMBEDDED_` 接頭辞付きで埋め込んだもの。
#[macro_export]
macro_rules! get_env_var {
    ($var_name:literal) => {{
        // 1. 起動時の環境変数を確認
        if let Ok(value) = std::env::var($var_name) {
            log::debug!("環境変数 {} を起動時の環境変数から取得しました", $var_name);
            Ok(value)
        }
        // 2. コンパイル時の埋め込み値を確認
        else if let Some(value) = option_env!(concat!("EMBEDDED_", $var_name)) {
            log::debug!("環境変数 {} をコンパイル時の埋め込み値から取得しました", $var_name);
            Ok(value.to_string())
        }
        // 3. どちらも見つからない場合はエラー
        else {
            Err($crate::shared::config::environment::EnvVarError {
                var_name: $var_name.to_string(),
                message: format!(
                    "起動時の環境変数 {} もコンパイル時の埋め込み値も見つかりませんでした",
                    $var_name
                ),
            })
        }
    }};
}

/// 環境変数を取得する（デフォルト値付き）
#[macro_export]
macro_rules! get_env_var_or_default {
    ($var_name:literal, $default_value:expr) => {{
        $crate::get_env_var!($var_name).unwrap_or_else(|_| {
            log::debug!(
                "環境変数 {} が見つからないため、デフォルト値を使用します: {}",
                $var_name,
                $default_value
            );
            $default_value.to_string()
        })
    }};
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
        }
    }

    /// プロダクション環境かどうかを判定
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 開発環境かどうかを判定
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. 実行時環境変数 ENVIRONMENT を確認
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じた.envファイルを読み込む
///
/// ログシステム初期化前に呼ばれるため、結果はeprintlnではなく戻り値で返す。
///
/// # 戻り値
/// 読み込んだファイル名（見つからなかった場合はNone）
pub fn load_environment_variables() -> Option<String> {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    match dotenv::from_filename(env_file) {
        Ok(_) => Some(env_file.to_string()),
        Err(_) if env_file != ".env" => {
            // 環境固有のファイルがない場合は、デフォルトの.envを試行
            dotenv::dotenv().ok().map(|_| ".env".to_string())
        }
        Err(_) => None,
    }
}

/// ログレベル文字列をフィルタに変換する（不明な値はinfo）
pub fn parse_log_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();
    let log_level = parse_log_level(&env_config.log_level);

    // 既に初期化済みの場合は何もしない
    let initialized = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init()
        .is_ok();

    if initialized {
        log::info!(
            "ログシステムを初期化しました: level={}, environment={}",
            env_config.log_level,
            env_config.environment
        );
    }
}

/// API設定を管理する構造体
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// APIサーバーのベースURL
    pub base_url: String,
    /// APIリクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
    /// APIリクエストの最大リトライ回数
    pub max_retries: u32,
}

impl ApiConfig {
    /// 環境変数からAPI設定を読み込む
    ///
    /// # エラー
    /// API_SERVER_URLが見つからない、または不正な場合は設定エラー
    pub fn from_env() -> AppResult<Self> {
        log::debug!("ApiConfig::from_env() - 環境変数の読み込みを開始");

        let base_url = crate::get_env_var!("API_SERVER_URL").map_err(|e| {
            log::error!("API_SERVER_URLの取得に失敗しました: {e}");
            AppError::configuration(
                "API_SERVER_URLが設定されていません。.envファイルまたは環境変数を確認してください",
            )
        })?;

        let timeout_seconds = crate::get_env_var_or_default!("API_TIMEOUT_SECONDS", "30")
            .parse()
            .unwrap_or_else(|_| {
                log::warn!(
                    "API_TIMEOUT_SECONDSのパースに失敗しました。デフォルト値30秒を使用します"
                );
                30
            });

        let max_retries = crate::get_env_var_or_default!("API_MAX_RETRIES", "3")
            .parse()
            .unwrap_or_else(|_| {
                log::warn!("API_MAX_RETRIESのパースに失敗しました。デフォルト値3回を使用します");
                3
            });

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
            max_retries,
        };
        config.validate()?;

        log::info!(
            "API設定: base_url={}, timeout={}s, max_retries={}",
            config.base_url,
            config.timeout_seconds,
            config.max_retries
        );

        Ok(config)
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.is_empty() {
            return Err(AppError::configuration(
                "APIサーバーのベースURLが設定されていません",
            ));
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            AppError::configuration(format!("APIサーバーのURLが不正です: {e}"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::configuration(format!(
                "APIサーバーのURLはhttpまたはhttpsである必要があります: {}",
                self.base_url
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "APIタイムアウトは0より大きい値である必要があります",
            ));
        }

        Ok(())
    }

    /// APIサーバーがlocalhostかどうかを判定
    pub fn is_localhost(&self) -> bool {
        self.base_url.contains("localhost") || self.base_url.contains("127.0.0.1")
    }
}

/// 開発環境でSESSION_ENCRYPTION_KEYが未設定の場合に使用するキー
const DEVELOPMENT_ENCRYPTION_KEY: &str = "development_session_encryption_key";

/// クライアント側の設定（タイムゾーン、セッション保存先）
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 「今日」を判定するタイムゾーン
    pub timezone: Tz,
    /// セッショントークン暗号化キー
    pub session_encryption_key: String,
    /// セッション保存ファイルのパス
    pub session_store_path: PathBuf,
}

impl AppConfig {
    /// 環境変数からクライアント設定を読み込む
    pub fn from_env() -> AppResult<Self> {
        let env_config = EnvironmentConfig::from_env();

        let timezone = parse_timezone(&crate::get_env_var_or_default!("APP_TIMEZONE", "UTC"))?;

        let session_encryption_key = match crate::get_env_var!("SESSION_ENCRYPTION_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ if env_config.is_production() => {
                return Err(AppError::configuration(
                    "本番環境ではSESSION_ENCRYPTION_KEYの設定が必須です",
                ));
            }
            _ => {
                log::warn!(
                    "SESSION_ENCRYPTION_KEYが設定されていません - 開発用のキーを使用します"
                );
                DEVELOPMENT_ENCRYPTION_KEY.to_string()
            }
        };

        let session_store_path = match std::env::var("SESSION_STORE_PATH") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_session_store_path()?,
        };

        log::debug!(
            "クライアント設定: timezone={timezone}, session_store_path={}",
            session_store_path.display()
        );

        Ok(Self {
            timezone,
            session_encryption_key,
            session_store_path,
        })
    }
}

/// タイムゾーン名を解析する
///
/// # 引数
/// * `name` - IANAタイムゾーン名（例: "Asia/Tokyo"）
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| AppError::configuration(format!("APP_TIMEZONEが不正です: {name} ({e})")))
}

/// セッション保存ファイルのデフォルトパスを取得する
///
/// 環境ごとにファイルを分ける（開発: dev_session.json、本番: session.json）
pub fn default_session_store_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        AppError::configuration("設定ディレクトリを取得できませんでした")
    })?;

    let filename = match get_environment() {
        Environment::Development => "dev_session.json",
        Environment::Production => "session.json",
    };

    Ok(config_dir.join("subscription-tracker").join(filename))
}
