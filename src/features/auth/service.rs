use crate::features::auth::models::{
    AuthError, AuthPayload, SignInRequest, SignUpRequest,
};
use crate::features::auth::session::Session;
use crate::features::auth::token_store::TokenStore;
use crate::shared::api_client::{ApiClient, ApiEnvelope};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{normalize_string, validate_email, Clock};
use std::sync::Arc;

const SIGN_IN_ENDPOINT: &str = "/api/v1/auth/sign-in";
const SIGN_UP_ENDPOINT: &str = "/api/v1/auth/sign-up";

/// 認証サービス
///
/// サインイン・サインアップ・ログアウトと、保存済みセッションの復元を行う。
#[derive(Clone)]
pub struct AuthService {
    /// APIクライアント
    api_client: ApiClient,
    /// セッションの保存先
    token_store: Arc<dyn TokenStore>,
    /// ログイン日時の取得元
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// 新しいAuthServiceを作成する
    ///
    /// # 引数
    /// * `api_client` - APIクライアント
    /// * `token_store` - セッションの保存先
    /// * `clock` - 時刻の取得元
    pub fn new(
        api_client: ApiClient,
        token_store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api_client,
            token_store,
            clock,
        }
    }

    /// メールアドレスとパスワードでサインインする
    ///
    /// # 戻り値
    /// 作成されたセッション（保存済み）
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let request = SignInRequest {
            email: normalize_string(email),
            password: password.to_string(),
        };
        validate_email(&request.email).map_err(|_| AuthError::InvalidEmail)?;
        require_field(&request.password, "パスワード")?;

        log::info!("サインインを開始します: email={}", request.email);

        let envelope: ApiEnvelope<AuthPayload> = self
            .api_client
            .post(SIGN_IN_ENDPOINT, &request, None)
            .await?;
        let payload = envelope.into_data("サインイン")?;

        let session = Session::new(payload.user, payload.token, self.clock.now());
        self.token_store.save(&session)?;

        log::info!("サインインしました: user_id={}", session.user_id());
        Ok(session)
    }

    /// アカウントを作成し、続けて自動でサインインする
    ///
    /// # 戻り値
    /// 自動サインインで作成されたセッション
    ///
    /// アカウント作成後のサインインに失敗した場合は、作成済みである旨のエラーを返す。
    pub async fn sign_up(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<Session> {
        let request = SignUpRequest {
            first_name: normalize_string(first_name),
            last_name: normalize_string(last_name),
            email: normalize_string(email),
            password: password.to_string(),
        };
        require_field(&request.first_name, "名")?;
        require_field(&request.last_name, "姓")?;
        validate_email(&request.email).map_err(|_| AuthError::InvalidEmail)?;
        require_field(&request.password, "パスワード")?;

        log::info!("サインアップを開始します: email={}", request.email);

        let envelope: ApiEnvelope<serde_json::Value> = self
            .api_client
            .post(SIGN_UP_ENDPOINT, &request, None)
            .await?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "アカウントの作成に失敗しました".to_string());
            return Err(AppError::ExternalService(message));
        }

        log::info!("アカウントを作成しました: email={}", request.email);

        match self.sign_in(&request.email, &request.password).await {
            Ok(session) => Ok(session),
            Err(e) => {
                log::warn!("サインアップ後の自動ログインに失敗しました: {}", e.details());
                Err(AuthError::AutoSignInFailed(e.user_message().to_string()).into())
            }
        }
    }

    /// ログアウトする
    ///
    /// セッションを消費し、保存済みのセッションを削除する。
    /// APIサーバー側の処理はない。
    pub fn logout(&self, session: Session) -> AppResult<()> {
        self.token_store.clear()?;
        log::info!("ログアウトしました: user_id={}", session.user_id());
        Ok(())
    }

    /// 保存済みのセッションを復元する
    ///
    /// # 戻り値
    /// 保存されていない、または読み込めない場合はNone
    ///
    /// 読み込めないセッションは削除する。
    pub fn restore_session(&self) -> AppResult<Option<Session>> {
        match self.token_store.load() {
            Ok(session) => Ok(session),
            Err(e) => {
                log::warn!("保存済みセッションを読み込めないため削除します: {e}");
                if let Err(clear_err) = self.token_store.clear() {
                    log::warn!("保存済みセッションの削除に失敗しました: {clear_err}");
                }
                Ok(None)
            }
        }
    }

    /// ログイン中のセッションを取得する
    ///
    /// # 戻り値
    /// ログインしていない場合は認証エラー
    pub fn require_session(&self) -> AppResult<Session> {
        self.restore_session()?
            .ok_or_else(|| AuthError::AuthenticationRequired.into())
    }
}

fn require_field(value: &str, field_name: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(field_name.to_string()));
    }
    Ok(())
}
