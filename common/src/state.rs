//! オーケストレーション層の状態
//!
//! - SearchState: 入力テキストと候補一覧（世代番号で古い応答を破棄）
//! - ShellState: 選択中の住所、撮影セッション、エラー、単価
//!
//! どちらも描画（render）から参照される純粋なデータで、I/Oは持たない。

use crate::capture::CaptureSession;
use crate::cost::{CostEstimate, PricePerSquare};
use crate::error::{Error, Result};
use crate::types::{AddressCandidate, ResolvedPlace};

/// 候補検索を行う最小文字数
pub const MIN_QUERY_CHARS: usize = 3;

/// 候補取得失敗時のメッセージ
pub const FETCH_SUGGESTIONS_FAILED: &str = "Failed to fetch address suggestions";

/// 1回の候補検索を識別するチケット
///
/// 入力が変わるたびに世代が進み、古いチケットの応答は反映されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
}

/// 候補一覧の状態
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PredictionsState {
    #[default]
    Idle,
    Loading {
        query: String,
    },
    Loaded {
        query: String,
        candidates: Vec<AddressCandidate>,
    },
    Error {
        query: String,
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    input: String,
    generation: u64,
    predictions: PredictionsState,
}

impl SearchState {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn predictions(&self) -> &PredictionsState {
        &self.predictions
    }

    /// 入力変更。3文字以上なら検索チケットを返す
    ///
    /// 表示中の候補は直ちに消す（古い入力の候補を出さない）。
    pub fn on_input(&mut self, text: &str) -> Option<SearchTicket> {
        self.input = text.to_string();
        self.generation += 1;
        self.predictions = PredictionsState::Idle;

        if text.chars().count() < MIN_QUERY_CHARS {
            return None;
        }

        Some(SearchTicket {
            generation: self.generation,
            query: text.to_string(),
        })
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// デバウンス後のリクエスト開始。古いチケットなら false
    pub fn begin(&mut self, ticket: &SearchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.predictions = PredictionsState::Loading {
            query: ticket.query.clone(),
        };
        true
    }

    /// 検索結果を反映。古いチケットの結果は破棄して false を返す
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        result: std::result::Result<Vec<AddressCandidate>, String>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.predictions = match result {
            Ok(candidates) => PredictionsState::Loaded {
                query: ticket.query.clone(),
                candidates,
            },
            Err(message) => PredictionsState::Error {
                query: ticket.query.clone(),
                message,
            },
        };
        true
    }

    /// 現在表示すべき候補
    pub fn candidates(&self) -> &[AddressCandidate] {
        match &self.predictions {
            PredictionsState::Loaded { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn candidate(&self, id: &str) -> Option<&AddressCandidate> {
        self.candidates().iter().find(|c| c.id == id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.predictions, PredictionsState::Loading { .. })
    }

    /// 住所確定後に入力欄を書き換える。進行中の検索は無効になる
    pub fn set_resolved_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.generation += 1;
        self.predictions = PredictionsState::Idle;
    }
}

/// オーケストレーション層が保持する一時状態
#[derive(Debug, Clone, Default)]
pub struct ShellState {
    search: SearchState,
    selected: Option<ResolvedPlace>,
    session: Option<CaptureSession>,
    error: Option<String>,
    price: PricePerSquare,
}

impl ShellState {
    pub fn new(price: PricePerSquare) -> Self {
        Self {
            price,
            ..Default::default()
        }
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchState {
        &mut self.search
    }

    /// 入力変更。エラー表示を消して検索チケットを発行する
    ///
    /// 撮影セッションには触れない（撮影の取り消しは close_capture のみ）。
    pub fn input_changed(&mut self, text: &str) -> Option<SearchTicket> {
        self.error = None;
        self.search.on_input(text)
    }

    pub fn selected(&self) -> Option<&ResolvedPlace> {
        self.selected.as_ref()
    }

    /// 住所を確定。以前の撮影セッションは破棄する
    pub fn select_place(&mut self, place: ResolvedPlace) {
        self.search.set_resolved_input(&place.formatted_address);
        self.session = None;
        self.error = None;
        self.selected = Some(place);
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut CaptureSession> {
        self.session.as_mut()
    }

    /// 撮影画面を開く（既に開いていればそのセッションを返す）
    pub fn open_capture(&mut self) -> Result<&mut CaptureSession> {
        let place = self
            .selected
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no address selected".into()))?;

        if self.session.is_none() {
            self.session = Some(CaptureSession::new(
                place.formatted_address.clone(),
                place.coordinates,
            ));
        }

        self.session
            .as_mut()
            .ok_or_else(|| Error::InvalidState("capture session unavailable".into()))
    }

    /// ユーザー操作による撮影画面のクローズ
    pub fn close_capture(&mut self) {
        self.session = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn price(&self) -> PricePerSquare {
        self.price
    }

    pub fn set_price(&mut self, price: PricePerSquare) {
        self.price = price;
    }

    /// 解析済みの場合のみ費用概算を返す
    pub fn cost_estimate(&self) -> Option<CostEstimate> {
        self.session
            .as_ref()
            .and_then(|s| s.measurements())
            .map(|m| CostEstimate::new(m.area_sq_ft, self.price))
    }
}
