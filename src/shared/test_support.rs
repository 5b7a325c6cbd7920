//! テスト用のフェイクAPIサーバー
//!
//! 登録した順にレスポンスを返し、受信したリクエストを記録する。
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// 記録されたリクエスト
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    /// JSONとして解析できなかった場合はNull
    pub body: serde_json::Value,
}

/// 返却するレスポンス
#[derive(Debug, Clone)]
pub struct FakeResponse {
    status: u16,
    body: String,
}

impl FakeResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

type Shared<T> = Arc<Mutex<T>>;

/// フェイクAPIサーバー
pub struct FakeApiServer {
    addr: SocketAddr,
    requests: Shared<Vec<RecordedRequest>>,
}

impl FakeApiServer {
    /// サーバーをバックグラウンドで起動する
    pub async fn start(responses: Vec<FakeResponse>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("フェイクAPIサーバーのバインドに失敗しました");
        let addr = listener.local_addr().expect("ローカルアドレスの取得に失敗しました");

        let responses: Shared<VecDeque<FakeResponse>> =
            Arc::new(Mutex::new(responses.into_iter().collect()));
        let requests: Shared<Vec<RecordedRequest>> = Arc::new(Mutex::new(Vec::new()));

        let server_requests = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let responses = Arc::clone(&responses);
                let requests = Arc::clone(&server_requests);
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        handle_request(req, Arc::clone(&responses), Arc::clone(&requests))
                    });
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        log::debug!("フェイクAPIサーバー接続エラー: {err}");
                    }
                });
            }
        });

        Self { addr, requests }
    }

    /// ベースURL（末尾スラッシュなし）
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// 受信したリクエストの一覧
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("ロックの取得に失敗しました").clone()
    }
}

async fn handle_request(
    req: Request<Incoming>,
    responses: Shared<VecDeque<FakeResponse>>,
    requests: Shared<Vec<RecordedRequest>>,
) -> Result<Response<String>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body_bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(_) => Vec::new(),
    };
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    requests
        .lock()
        .expect("ロックの取得に失敗しました")
        .push(RecordedRequest {
            method,
            path,
            authorization,
            body,
        });

    let next = responses.lock().expect("ロックの取得に失敗しました").pop_front();
    let response = match next {
        Some(fake) => Response::builder()
            .status(StatusCode::from_u16(fake.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
            .header("Content-Type", "application/json")
            .body(fake.body),
        None => Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body("レスポンスが登録されていません".to_string()),
    };

    Ok(response.expect("レスポンスの構築に失敗しました"))
}
