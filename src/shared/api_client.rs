/// 汎用APIクライアント
///
/// APIサーバーとの通信を行う汎用的なクライアント。
/// 認証とサブスクリプションのエンドポイントで共有する。
use crate::shared::config::environment::ApiConfig;
use crate::shared::errors::{AppError, AppResult};
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// APIサーバーからのエラーレスポンス
///
/// サーバーは `{ "success": false, "message": "..." }` を返す。
/// 旧形式の `error` フィールドも受け付ける。
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// 表示すべきメッセージ（message > error の順）
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

/// APIサーバーの成功レスポンス形式 `{ "success": true, "data": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// `data` を取り出す
    ///
    /// # 引数
    /// * `context` - エラーメッセージに含める操作名
    ///
    /// # 戻り値
    /// `success: false` または `data` がない場合はエラー
    pub fn into_data(self, context: &str) -> AppResult<T> {
        if !self.success {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("{context}に失敗しました"));
            return Err(AppError::ExternalService(message));
        }

        self.data.ok_or_else(|| {
            AppError::external_service(
                "APIサーバー".to_string(),
                format!("{context}のレスポンスにデータが含まれていません"),
            )
        })
    }
}

/// 汎用APIクライアント
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// 環境変数の設定でAPIクライアントを作成
    pub fn from_env() -> AppResult<Self> {
        let config = ApiConfig::from_env()?;
        Self::new_with_config(config)
    }

    /// 設定を指定してAPIクライアントを作成
    pub fn new_with_config(config: ApiConfig) -> AppResult<Self> {
        config.validate()?;
        if config.is_localhost() {
            debug!("ローカルのAPIサーバーに接続します: {}", config.base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self { client, config })
    }

    /// GETリクエストを送信
    pub async fn get<T>(&self, endpoint: &str, auth_token: Option<&str>) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        info!("GETリクエスト送信: endpoint={endpoint}");

        let request = self.client.get(self.url(endpoint));
        let request = with_bearer(request, auth_token);

        self.send_request_with_retry(request, "GET", endpoint).await
    }

    /// POSTリクエストを送信
    pub async fn post<B, T>(&self, endpoint: &str, body: &B, auth_token: Option<&str>) -> AppResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        info!("POSTリクエスト送信: endpoint={endpoint}");

        let request = self.client.post(self.url(endpoint)).json(body);
        let request = with_bearer(request, auth_token);

        self.send_request_with_retry(request, "POST", endpoint).await
    }

    /// PUTリクエストを送信
    pub async fn put<B, T>(&self, endpoint: &str, body: &B, auth_token: Option<&str>) -> AppResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        info!("PUTリクエスト送信: endpoint={endpoint}");

        let request = self.client.put(self.url(endpoint)).json(body);
        let request = with_bearer(request, auth_token);

        self.send_request_with_retry(request, "PUT", endpoint).await
    }

    /// DELETEリクエストを送信
    ///
    /// レスポンスボディは使用せず、成功ステータスのみ確認する。
    pub async fn delete(&self, endpoint: &str, auth_token: Option<&str>) -> AppResult<()> {
        info!("DELETEリクエスト送信: endpoint={endpoint}");

        let request = self.client.delete(self.url(endpoint));
        let request = with_bearer(request, auth_token);

        let response = self.send_with_retry(request, endpoint).await?;
        if response.status().is_success() {
            info!("DELETEリクエスト成功: endpoint={endpoint}");
            return Ok(());
        }

        Err(self.handle_error_response(response).await)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url)
    }

    /// リトライ機能付きでリクエストを送信し、成功時はJSONを解析する
    async fn send_request_with_retry<T>(
        &self,
        request: RequestBuilder,
        method: &str,
        endpoint: &str,
    ) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send_with_retry(request, endpoint).await?;

        if !response.status().is_success() {
            return Err(self.handle_error_response(response).await);
        }

        let result: T = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("レスポンス解析エラー: {e}")))?;

        info!("{method}リクエスト成功: endpoint={endpoint}");
        Ok(result)
    }

    /// 接続エラー時のみ指数バックオフでリトライする
    async fn send_with_retry(&self, request: RequestBuilder, endpoint: &str) -> AppResult<Response> {
        let mut attempts = 0;
        loop {
            let cloned_request = request.try_clone().ok_or_else(|| {
                AppError::ExternalService("リクエストのクローンに失敗しました".to_string())
            })?;

            match cloned_request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = Duration::from_secs(2_u64.pow(attempts));
                    warn!(
                        "APIリクエスト失敗、リトライします: endpoint={endpoint}, attempt={attempts}/{}, delay={delay:?}, error={e}",
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(AppError::ExternalService(format!(
                        "APIサーバーへの接続に失敗しました: {e}"
                    )));
                }
            }
        }
    }

    /// エラーレスポンスをAppErrorに変換する
    async fn handle_error_response(&self, response: Response) -> AppError {
        let status = response.status();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        let server_message = serde_json::from_str::<ErrorResponse>(&response_text)
            .ok()
            .and_then(|body| body.message().map(str::to_string));

        match &server_message {
            Some(message) => debug!(
                "APIサーバーからエラーレスポンスを受信: status={status}, message={message}, request_id={request_id}"
            ),
            None => warn!(
                "APIサーバーから非構造化エラーレスポンス: status={status}, body={response_text}, request_id={request_id}"
            ),
        }

        error_from_status(status, server_message)
    }
}

/// 認証トークンがある場合はBearerヘッダーを付与する
fn with_bearer(request: RequestBuilder, auth_token: Option<&str>) -> RequestBuilder {
    match auth_token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// HTTPステータスとサーバーメッセージからAppErrorを作る
///
/// サーバーのメッセージがあればそれを優先し、なければステータスごとの既定文言を使う。
pub(crate) fn error_from_status(status: StatusCode, server_message: Option<String>) -> AppError {
    let fallback = match status.as_u16() {
        400 => "リクエストの形式が正しくありません",
        401 => "認証に失敗しました。再度ログインしてください",
        403 => "この操作を実行する権限がありません",
        404 => "指定されたリソースが見つかりません",
        409 => "データが競合しています",
        429 => "リクエストが多すぎます。しばらく待ってから再試行してください",
        500 => "サーバー内部エラーが発生しました",
        502 => "APIサーバーとの通信でエラーが発生しました",
        503 => "APIサーバーが一時的に利用できません",
        504 => "APIサーバーからの応答がタイムアウトしました",
        _ => "不明なエラーが発生しました",
    };
    let message = server_message.unwrap_or_else(|| fallback.to_string());

    match status {
        StatusCode::UNAUTHORIZED => AppError::Authentication(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        _ => AppError::ExternalService(message),
    }
}
