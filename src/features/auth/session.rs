use crate::features::auth::models::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ログイン中のユーザーのセッション
///
/// サインインで作成し、ログアウトで消費する。
/// 認証が必要な処理には参照で渡す。
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    user: User,
    token: String,
    signed_in_at: DateTime<Utc>,
}

impl Session {
    /// 新しいセッションを作成する
    ///
    /// # 引数
    /// * `user` - ログインしたユーザー
    /// * `token` - APIサーバーが発行したBearerトークン
    /// * `signed_in_at` - ログイン日時
    pub fn new(user: User, token: String, signed_in_at: DateTime<Utc>) -> Self {
        Self {
            user,
            token,
            signed_in_at,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }
}

// トークンはログに出さない
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user.id)
            .field("email", &self.user.email)
            .field("token", &"***")
            .field("signed_in_at", &self.signed_in_at)
            .finish()
    }
}
