/// セッションの保存先
///
/// CLIの呼び出しをまたいでログイン状態を保持する。
/// ファイル保存時はトークンをAES-256-GCMで暗号化する。
use crate::features::auth::models::{AuthError, User};
use crate::features::auth::session::Session;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

const ALGORITHM: &str = "AES-256-GCM";

/// セッションの保存・読み込み・削除
pub trait TokenStore: Send + Sync {
    /// 保存済みのセッションを読み込む
    ///
    /// # 戻り値
    /// 保存されていない場合はNone
    fn load(&self) -> Result<Option<Session>, AuthError>;

    /// セッションを保存する（既存のものは上書き）
    fn save(&self, session: &Session) -> Result<(), AuthError>;

    /// 保存済みのセッションを削除する
    fn clear(&self) -> Result<(), AuthError>;
}

/// 暗号化されたデータ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// 暗号化されたデータ（Base64エンコード）
    pub ciphertext: String,
    /// ナンス（Base64エンコード）
    pub nonce: String,
    /// 暗号化アルゴリズム
    pub algorithm: String,
}

/// ファイルに保存するセッション情報
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    user: User,
    token: EncryptedData,
    signed_in_at: DateTime<Utc>,
}

/// トークン暗号化
#[derive(Clone)]
struct TokenCipher {
    key: [u8; 32],
}

impl TokenCipher {
    /// 任意長の鍵文字列からSHA-256で32バイトの鍵を導出する
    fn new(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    fn encrypt(&self, plaintext: &str) -> Result<EncryptedData, AuthError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| AuthError::EncryptionError(e.to_string()))?;

        // ランダムなナンス（12バイト）を生成
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AuthError::EncryptionError(e.to_string()))?;

        Ok(EncryptedData {
            ciphertext: general_purpose::STANDARD.encode(&ciphertext),
            nonce: general_purpose::STANDARD.encode(nonce_bytes),
            algorithm: ALGORITHM.to_string(),
        })
    }

    fn decrypt(&self, data: &EncryptedData) -> Result<String, AuthError> {
        if data.algorithm != ALGORITHM {
            return Err(AuthError::EncryptionError(format!(
                "サポートされていないアルゴリズム: {}",
                data.algorithm
            )));
        }

        let ciphertext = general_purpose::STANDARD
            .decode(&data.ciphertext)
            .map_err(|e| AuthError::EncryptionError(format!("暗号文デコードエラー: {e}")))?;
        let nonce_bytes = general_purpose::STANDARD
            .decode(&data.nonce)
            .map_err(|e| AuthError::EncryptionError(format!("ナンスデコードエラー: {e}")))?;
        if nonce_bytes.len() != 12 {
            return Err(AuthError::EncryptionError(format!(
                "ナンスの長さが不正です: {}バイト",
                nonce_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| AuthError::EncryptionError(e.to_string()))?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| {
                AuthError::EncryptionError(
                    "復号化に失敗しました（暗号化キーが変更された可能性があります）".to_string(),
                )
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| AuthError::EncryptionError(format!("UTF-8変換エラー: {e}")))
    }
}

/// ファイルにセッションを保存するストア
pub struct FileTokenStore {
    path: PathBuf,
    cipher: TokenCipher,
}

impl FileTokenStore {
    /// 新しいFileTokenStoreを作成する
    ///
    /// # 引数
    /// * `path` - 保存先ファイル
    /// * `encryption_key` - トークン暗号化用の鍵文字列
    pub fn new(path: impl Into<PathBuf>, encryption_key: &str) -> Self {
        Self {
            path: path.into(),
            cipher: TokenCipher::new(encryption_key),
        }
    }

    fn write_file(&self, contents: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::SessionError(format!("保存先ディレクトリの作成に失敗しました: {e}"))
            })?;
        }

        // 作成時点から所有者のみ読み書きできる権限にする
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| {
            AuthError::SessionError(format!("セッションファイルを開けませんでした: {e}"))
        })?;

        // 既存ファイルはmodeが適用されないため、書き込み前に権限を揃える
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    AuthError::SessionError(format!("ファイル権限の設定に失敗しました: {e}"))
                })?;
        }

        file.write_all(contents.as_bytes())
            .map_err(|e| AuthError::SessionError(format!("セッションの書き込みに失敗しました: {e}")))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("保存済みセッションはありません: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(AuthError::SessionError(format!(
                    "セッションの読み込みに失敗しました: {e}"
                )))
            }
        };

        let stored: StoredSession = serde_json::from_str(&contents)
            .map_err(|e| AuthError::SessionError(format!("セッションの形式が不正です: {e}")))?;
        let token = self.cipher.decrypt(&stored.token)?;

        log::debug!("保存済みセッションを読み込みました: user_id={}", stored.user.id);
        Ok(Some(Session::new(stored.user, token, stored.signed_in_at)))
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let stored = StoredSession {
            user: session.user().clone(),
            token: self.cipher.encrypt(session.token())?,
            signed_in_at: session.signed_in_at(),
        };
        let contents = serde_json::to_string_pretty(&stored)
            .map_err(|e| AuthError::SessionError(format!("セッションのシリアライズに失敗しました: {e}")))?;

        self.write_file(&contents)?;
        log::info!(
            "セッションを保存しました: user_id={}, path={}",
            session.user_id(),
            self.path.display()
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("保存済みセッションを削除しました");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::SessionError(format!(
                "セッションの削除に失敗しました: {e}"
            ))),
        }
    }
}

/// メモリ上にセッションを保持するストア（テスト用）
#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        let guard = self
            .session
            .lock()
            .map_err(|_| AuthError::SessionError("ロックの取得に失敗しました".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| AuthError::SessionError("ロックの取得に失敗しました".to_string()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| AuthError::SessionError("ロックの取得に失敗しました".to_string()))?;
        *guard = None;
        Ok(())
    }
}
