use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// 現在時刻の取得元
///
/// 集計処理は現在時刻を引数で受け取るため、呼び出し側はこのトレイト経由で
/// 時刻を取得し、テストでは固定値に差し替える。
pub trait Clock: Send + Sync {
    /// 現在時刻（UTC）
    fn now(&self) -> DateTime<Utc>;

    /// 設定タイムゾーンでの現在時刻
    fn local_now(&self) -> DateTime<Tz>;

    /// 設定タイムゾーンでの今日の暦日
    fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }
}

/// システム時刻を設定タイムゾーンで解釈する時計
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    /// 新しいSystemClockを作成する
    ///
    /// # 引数
    /// * `timezone` - 「今日」を判定するタイムゾーン
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

/// 常に同じ時刻を返す時計（テスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Tz>,
}

impl FixedClock {
    /// UTCの指定日の深夜0時に固定する
    pub fn new(today: NaiveDate) -> Self {
        Self::at(chrono_tz::UTC.from_utc_datetime(&today.and_time(chrono::NaiveTime::MIN)))
    }

    /// 指定した時刻に固定する
    pub fn at(now: DateTime<Tz>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }

    fn local_now(&self) -> DateTime<Tz> {
        self.now
    }
}
