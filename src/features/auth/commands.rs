use crate::features::auth::service::AuthService;
use crate::shared::errors::AppResult;

/// アカウントを作成してログインする
///
/// # 戻り値
/// 完了メッセージ
pub async fn sign_up(
    service: &AuthService,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> AppResult<String> {
    let session = service
        .sign_up(first_name, last_name, email, password)
        .await?;
    Ok(format!(
        "アカウントを作成しました。ようこそ、{}さん！",
        session.user().display_name()
    ))
}

/// ログインする
pub async fn sign_in(service: &AuthService, email: &str, password: &str) -> AppResult<String> {
    let session = service.sign_in(email, password).await?;
    Ok(format!(
        "ログインしました。おかえりなさい、{}さん！",
        session.user().display_name()
    ))
}

/// ログアウトする
pub fn logout(service: &AuthService) -> AppResult<String> {
    match service.restore_session()? {
        Some(session) => {
            service.logout(session)?;
            Ok("ログアウトしました".to_string())
        }
        None => Ok("ログインしていません".to_string()),
    }
}

/// ログイン中のユーザーを表示する
pub fn who_am_i(service: &AuthService) -> AppResult<String> {
    let session = service.require_session()?;
    let user = session.user();
    Ok(format!(
        "{} <{}>\nユーザーID: {}\nログイン日時: {}",
        user.display_name(),
        user.email,
        user.id,
        session.signed_in_at().format("%Y-%m-%d %H:%M:%S UTC")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::models::User;
    use crate::features::auth::session::Session;
    use crate::features::auth::token_store::{MemoryTokenStore, TokenStore};
    use crate::shared::api_client::ApiClient;
    use crate::shared::config::ApiConfig;
    use crate::shared::errors::AppError;
    use crate::shared::utils::SystemClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn service_with(store: Arc<MemoryTokenStore>) -> AuthService {
        let api_client = ApiClient::new_with_config(ApiConfig {
            base_url: "http://localhost:9".to_string(),
            timeout_seconds: 1,
            max_retries: 0,
        })
        .unwrap();
        AuthService::new(api_client, store, Arc::new(SystemClock::default()))
    }

    fn stored_session() -> Session {
        let user = User {
            id: "u1".to_string(),
            name: Some("taro".to_string()),
            first_name: None,
            last_name: None,
            email: "taro@example.com".to_string(),
            created_at: None,
            updated_at: None,
        };
        let signed_in_at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        Session::new(user, "jwt".to_string(), signed_in_at)
    }

    #[test]
    fn test_who_am_i() {
        let store = Arc::new(MemoryTokenStore::new());
        store.save(&stored_session()).unwrap();

        let output = who_am_i(&service_with(store)).unwrap();
        assert!(output.starts_with("taro <taro@example.com>"));
        assert!(output.contains("2024-06-01 09:30:00 UTC"));
    }

    #[test]
    fn test_who_am_i_requires_login() {
        let store = Arc::new(MemoryTokenStore::new());
        let err = who_am_i(&service_with(store)).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn test_logout() {
        let store = Arc::new(MemoryTokenStore::new());
        store.save(&stored_session()).unwrap();
        let service = service_with(store.clone());

        assert_eq!(logout(&service).unwrap(), "ログアウトしました");
        assert!(store.load().unwrap().is_none());
        assert_eq!(logout(&service).unwrap(), "ログインしていません");
    }
}
