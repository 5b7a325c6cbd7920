use super::models::{CreateSubscriptionRequest, StatusUpdateRequest, Subscription, SubscriptionStatus};
use crate::features::auth::session::Session;
use crate::shared::api_client::{ApiClient, ApiEnvelope};
use crate::shared::errors::{AppError, AppResult};
use serde::Deserialize;

const SUBSCRIPTIONS_ENDPOINT: &str = "/api/v1/subscriptions";

/// 作成APIのレスポンスデータ
#[derive(Debug, Deserialize)]
struct CreatedSubscription {
    subscription: Subscription,
}

/// APIサーバー上のサブスクリプションを操作するリポジトリ
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    api_client: ApiClient,
}

impl SubscriptionRepository {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// ログイン中ユーザーのサブスクリプション一覧を取得する
    ///
    /// # 引数
    /// * `session` - ログイン中のセッション
    ///
    /// # 戻り値
    /// サブスクリプションのリスト、または失敗時はエラー
    pub async fn fetch_for_user(&self, session: &Session) -> AppResult<Vec<Subscription>> {
        let endpoint = format!(
            "{SUBSCRIPTIONS_ENDPOINT}/user/{}",
            path_segment(session.user_id(), "ユーザーID")?
        );

        let envelope: ApiEnvelope<Vec<Subscription>> =
            self.api_client.get(&endpoint, Some(session.token())).await?;
        let subscriptions = envelope.into_data("サブスクリプション一覧の取得")?;

        log::info!(
            "サブスクリプション一覧を取得しました: user_id={}, 件数={}",
            session.user_id(),
            subscriptions.len()
        );
        Ok(subscriptions)
    }

    /// サブスクリプションを作成する
    ///
    /// # 引数
    /// * `session` - ログイン中のセッション
    /// * `request` - 作成内容
    ///
    /// # 戻り値
    /// APIサーバーが返した作成済みのサブスクリプション
    pub async fn create(
        &self,
        session: &Session,
        request: &CreateSubscriptionRequest,
    ) -> AppResult<Subscription> {
        let endpoint = format!("{SUBSCRIPTIONS_ENDPOINT}/");

        let envelope: ApiEnvelope<CreatedSubscription> = self
            .api_client
            .post(&endpoint, request, Some(session.token()))
            .await?;
        let created = envelope.into_data("サブスクリプションの作成")?.subscription;

        log::info!(
            "サブスクリプションを作成しました: id={}, name={}",
            created.id,
            created.name
        );
        Ok(created)
    }

    /// ステータスを更新する
    ///
    /// 解約は専用のエンドポイントがあるため `cancel` を使う。
    pub async fn update_status(
        &self,
        session: &Session,
        id: &str,
        status: SubscriptionStatus,
    ) -> AppResult<()> {
        if status == SubscriptionStatus::Canceled {
            return Err(AppError::validation(
                "解約はcancelコマンドで行ってください",
            ));
        }

        let endpoint = format!(
            "{SUBSCRIPTIONS_ENDPOINT}/{}/update",
            path_segment(id, "サブスクリプションID")?
        );
        self.put_status(session, &endpoint, status, "ステータスの更新")
            .await?;

        log::info!("ステータスを更新しました: id={id}, status={status}");
        Ok(())
    }

    /// サブスクリプションを解約する
    pub async fn cancel(&self, session: &Session, id: &str) -> AppResult<()> {
        let endpoint = format!(
            "{SUBSCRIPTIONS_ENDPOINT}/{}/cancel",
            path_segment(id, "サブスクリプションID")?
        );
        self.put_status(session, &endpoint, SubscriptionStatus::Canceled, "解約")
            .await?;

        log::info!("サブスクリプションを解約しました: id={id}");
        Ok(())
    }

    /// サブスクリプションを削除する
    pub async fn delete(&self, session: &Session, id: &str) -> AppResult<()> {
        let endpoint = format!(
            "{SUBSCRIPTIONS_ENDPOINT}/{}/delete",
            path_segment(id, "サブスクリプションID")?
        );
        self.api_client
            .delete(&endpoint, Some(session.token()))
            .await?;

        log::info!("サブスクリプションを削除しました: id={id}");
        Ok(())
    }

    async fn put_status(
        &self,
        session: &Session,
        endpoint: &str,
        status: SubscriptionStatus,
        context: &str,
    ) -> AppResult<()> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .api_client
            .put(endpoint, &StatusUpdateRequest { status }, Some(session.token()))
            .await?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("{context}に失敗しました"));
            return Err(AppError::ExternalService(message));
        }
        Ok(())
    }
}

/// パスに埋め込むIDをエンコードする
fn path_segment(value: &str, field_name: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field_name}は必須項目です")));
    }
    Ok(urlencoding::encode(value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::models::User;
    use crate::features::subscriptions::models::{Category, Currency, Frequency};
    use crate::shared::config::ApiConfig;
    use crate::shared::test_support::{FakeApiServer, FakeResponse};
    use chrono::Utc;
    use serde_json::json;

    fn repository_for(server: &FakeApiServer) -> SubscriptionRepository {
        SubscriptionRepository::new(
            ApiClient::new_with_config(ApiConfig {
                base_url: server.base_url(),
                timeout_seconds: 5,
                max_retries: 0,
            })
            .unwrap(),
        )
    }

    fn session() -> Session {
        let user = User {
            id: "user-1".to_string(),
            name: None,
            first_name: Some("Taro".to_string()),
            last_name: None,
            email: "taro@example.com".to_string(),
            created_at: None,
            updated_at: None,
        };
        Session::new(user, "jwt-token".to_string(), Utc::now())
    }

    fn subscription_json(id: &str, status: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "name": "Netflix",
            "price": 15.49,
            "currency": "USD",
            "frequency": "monthly",
            "category": "Entertainment",
            "paymentMethod": "Credit Card",
            "status": status,
            "startDate": "2024-01-15T00:00:00.000Z",
            "renewalDate": "2024-02-15T00:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn test_fetch_for_user() {
        let server = FakeApiServer::start(vec![FakeResponse::json(
            200,
            json!({
                "success": true,
                "data": [subscription_json("a", "Active"), subscription_json("b", "Paused")]
            }),
        )])
        .await;
        let repository = repository_for(&server);

        let subscriptions = repository.fetch_for_user(&session()).await.unwrap();
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions[1].status, Some(SubscriptionStatus::Paused));

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/v1/subscriptions/user/user-1");
        assert_eq!(
            requests[0].authorization.as_deref(),
            Some("Bearer jwt-token")
        );
    }

    #[tokio::test]
    async fn test_fetch_unsuccessful_envelope() {
        let server = FakeApiServer::start(vec![FakeResponse::json(
            200,
            json!({"success": false, "message": "Not your subscriptions"}),
        )])
        .await;
        let repository = repository_for(&server);

        let err = repository.fetch_for_user(&session()).await.unwrap_err();
        assert_eq!(err.user_message(), "Not your subscriptions");
    }

    #[tokio::test]
    async fn test_create() {
        let server = FakeApiServer::start(vec![FakeResponse::json(
            201,
            json!({
                "success": true,
                "data": {"subscription": subscription_json("new-id", "Active")}
            }),
        )])
        .await;
        let repository = repository_for(&server);

        let request = CreateSubscriptionRequest {
            name: "Netflix".to_string(),
            price: 15.49,
            currency: Currency::USD,
            frequency: Frequency::Monthly,
            category: Category::Entertainment,
            payment_method: "Credit Card".to_string(),
            status: SubscriptionStatus::Active,
            start_date: "2024-01-15T00:00:00.000Z".to_string(),
            renewal_date: "2024-02-15T00:00:00.000Z".to_string(),
            user_id: "user-1".to_string(),
        };
        let created = repository.create(&session(), &request).await.unwrap();
        assert_eq!(created.id, "new-id");

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/v1/subscriptions/");
        assert_eq!(requests[0].body["userId"], "user-1");
        assert_eq!(requests[0].body["paymentMethod"], "Credit Card");
    }

    #[tokio::test]
    async fn test_update_status() {
        let server =
            FakeApiServer::start(vec![FakeResponse::json(200, json!({"success": true}))]).await;
        let repository = repository_for(&server);

        repository
            .update_status(&session(), "sub 1", SubscriptionStatus::Paused)
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/v1/subscriptions/sub%201/update");
        assert_eq!(requests[0].body, json!({"status": "Paused"}));
    }

    #[tokio::test]
    async fn test_update_status_refuses_cancel() {
        let server = FakeApiServer::start(vec![]).await;
        let repository = repository_for(&server);

        let err = repository
            .update_status(&session(), "a", SubscriptionStatus::Canceled)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_unsuccessful() {
        let server =
            FakeApiServer::start(vec![FakeResponse::json(200, json!({"success": false}))]).await;
        let repository = repository_for(&server);

        let err = repository
            .update_status(&session(), "a", SubscriptionStatus::Expired)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "ステータスの更新に失敗しました");
    }

    #[tokio::test]
    async fn test_cancel() {
        let server =
            FakeApiServer::start(vec![FakeResponse::json(200, json!({"success": true}))]).await;
        let repository = repository_for(&server);

        repository.cancel(&session(), "a").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/v1/subscriptions/a/cancel");
        assert_eq!(requests[0].body, json!({"status": "Canceled"}));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let server = FakeApiServer::start(vec![FakeResponse::json(
            404,
            json!({"success": false, "message": "Subscription not found"}),
        )])
        .await;
        let repository = repository_for(&server);

        let err = repository.delete(&session(), "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(server.requests()[0].path, "/api/v1/subscriptions/missing/delete");
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected() {
        let server = FakeApiServer::start(vec![]).await;
        let repository = repository_for(&server);

        let err = repository.delete(&session(), "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(server.requests().is_empty());
    }
}
