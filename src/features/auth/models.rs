use crate::shared::errors::AppError;
use serde::{Deserialize, Serialize};

/// ユーザー情報（APIサーバーのレスポンス形式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ユーザーID
    #[serde(rename = "_id")]
    pub id: String,
    /// 表示名（旧形式）
    #[serde(default)]
    pub name: Option<String>,
    /// 名
    #[serde(default)]
    pub first_name: Option<String>,
    /// 姓
    #[serde(default)]
    pub last_name: Option<String>,
    /// メールアドレス
    pub email: String,
    /// 作成日時
    #[serde(default)]
    pub created_at: Option<String>,
    /// 更新日時
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// 画面に表示する名前
    ///
    /// 名 > 表示名 > メールアドレスの順で、空でない最初のものを使う。
    pub fn display_name(&self) -> &str {
        [self.first_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or(self.email.as_str())
    }
}

/// サインインリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// サインアップリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// サインイン成功時のデータ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// 認証エラーの種類
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 必須項目の未入力
    #[error("{0}を入力してください")]
    MissingField(String),

    /// メールアドレスの形式エラー
    #[error("有効なメールアドレスを入力してください")]
    InvalidEmail,

    /// 認証が必要
    #[error("ログインが必要です。先に signin コマンドでログインしてください")]
    AuthenticationRequired,

    /// サインアップ後の自動ログイン失敗
    #[error("アカウントは作成されましたが、自動ログインに失敗しました。手動でログインしてください（{0}）")]
    AutoSignInFailed(String),

    /// セッションの保存・読み込みエラー
    #[error("セッションエラー: {0}")]
    SessionError(String),

    /// 暗号化エラー
    #[error("暗号化エラー: {0}")]
    EncryptionError(String),
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::MissingField(_) | AuthError::InvalidEmail => AppError::Validation(message),
            AuthError::AuthenticationRequired | AuthError::AutoSignInFailed(_) => {
                AppError::Authentication(message)
            }
            AuthError::SessionError(_) | AuthError::EncryptionError(_) => {
                AppError::Security(message)
            }
        }
    }
}
