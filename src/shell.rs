//! オーケストレーション層
//!
//! 住所検索 → 住所確定 → 撮影 → 解析 → 費用表示 を順に進める。
//! 状態は ShellState に集約し、表示は render() で行う。
//! クライアントは外から渡すので、テストでは偽物に差し替えられる。

use crate::capture::{analyze_first_frame, capture_angles, failure_message};
use crate::error::{Result, RoofError};
use crate::places::{resolve_complete_place, AddressResolver};
use crate::vision::RoofAnalyzer;
use crate::viewport::MapViewport;
use indicatif::ProgressBar;
use roof_estimate_common::state::FETCH_SUGGESTIONS_FAILED;
use roof_estimate_common::{
    render, AddressCandidate, CaptureStatus, CostEstimate, PricePerSquare, RoofMeasurements, SearchTicket,
    ShellState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Shell {
    resolver: Arc<dyn AddressResolver>,
    analyzer: Arc<dyn RoofAnalyzer>,
    state: ShellState,
    settle_delay: Duration,
}

impl Shell {
    pub fn new(
        resolver: Arc<dyn AddressResolver>,
        analyzer: Arc<dyn RoofAnalyzer>,
        price: PricePerSquare,
        settle_delay: Duration,
    ) -> Self {
        Self {
            resolver,
            analyzer,
            state: ShellState::new(price),
            settle_delay,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn render(&self) -> String {
        render(&self.state)
    }

    /// 並行して候補を取得するためのリゾルバ
    pub fn resolver(&self) -> Arc<dyn AddressResolver> {
        Arc::clone(&self.resolver)
    }

    /// 入力変更。検索すべきならチケットを返す（デバウンスは呼び出し側）
    pub fn input_changed(&mut self, text: &str) -> Option<SearchTicket> {
        self.state.input_changed(text)
    }

    /// デバウンス後の検索開始。古いチケットなら false
    pub fn begin_search(&mut self, ticket: &SearchTicket) -> bool {
        self.state.search_mut().begin(ticket)
    }

    /// 検索結果を反映。入力が変わっていれば破棄して false
    pub fn apply_search(
        &mut self,
        ticket: &SearchTicket,
        result: Result<Vec<AddressCandidate>>,
    ) -> bool {
        let result = result.map_err(|e| {
            warn!(query = %ticket.query, error = %e, "address suggestion fetch failed");
            FETCH_SUGGESTIONS_FAILED.to_string()
        });

        let applied = self.state.search_mut().complete(ticket, result);
        if !applied {
            debug!(query = %ticket.query, "discarding stale address suggestions");
        }
        applied
    }

    /// 検索を実行して反映する
    pub async fn run_search(&mut self, ticket: &SearchTicket) -> bool {
        if !self.begin_search(ticket) {
            debug!(query = %ticket.query, "skipping superseded search");
            return false;
        }
        let result = self.resolver.search(&ticket.query).await;
        self.apply_search(ticket, result)
    }

    /// 候補を選択して住所を確定する
    ///
    /// 不完全な住所は専用のメッセージで拒否し、撮影へは進まない。
    pub async fn select_candidate(&mut self, candidate_id: &str) -> Result<()> {
        match resolve_complete_place(self.resolver.as_ref(), candidate_id).await {
            Ok(place) => {
                info!(
                    place_id = %place.id,
                    address = %place.formatted_address,
                    lat = place.coordinates.lat,
                    lng = place.coordinates.lng,
                    "address selected"
                );
                self.state.select_place(place);
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    RoofError::IncompleteAddress(msg) => msg.clone(),
                    other => format!("Error fetching address details: {}", other),
                };
                self.state.set_error(message);
                Err(e)
            }
        }
    }

    /// 撮影画面を開く
    pub fn open_capture(&mut self) -> Result<()> {
        self.state.open_capture()?;
        Ok(())
    }

    /// 撮影画面を閉じる（ユーザー操作のみ）
    pub fn close_capture(&mut self) {
        self.state.close_capture();
    }

    /// 全方位を撮影し、1枚目を解析する
    ///
    /// この呼び出しで撮影が始まり、セッションが失敗を記録した場合は
    /// メッセージはセッション側に残る。開始前の失敗はエラー行に出す。
    pub async fn capture<V: MapViewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        progress: &ProgressBar,
    ) -> Result<RoofMeasurements> {
        let analyzer = Arc::clone(&self.analyzer);
        let settle_delay = self.settle_delay;

        if self.state.session().is_none() {
            let e = RoofError::ResourceNotReady("Capture view is not open".into());
            self.state.set_error(e.to_string());
            return Err(e);
        }
        self.state.clear_error();
        let Some(session) = self.state.session_mut() else {
            return Err(RoofError::ResourceNotReady("Capture view is not open".into()));
        };
        let attempts_before = session.attempts();

        let outcome = match capture_angles(session, viewport, settle_delay, progress).await {
            Ok(()) => analyze_first_frame(session, analyzer.as_ref()).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(measurements) => Ok(measurements),
            Err(e) => {
                let recorded = self.state.session().is_some_and(|s| {
                    s.attempts() != attempts_before
                        && matches!(s.status(), CaptureStatus::Failed { .. })
                });
                if !recorded {
                    self.state.set_error(match &e {
                        RoofError::ResourceNotReady(msg) => msg.clone(),
                        other => failure_message(other),
                    });
                }
                Err(e)
            }
        }
    }

    /// 単価を変更して概算を返す（解析前は None）
    pub fn set_price(&mut self, price: PricePerSquare) -> Option<CostEstimate> {
        self.state.set_price(price);
        self.state.cost_estimate()
    }

    pub fn cost_estimate(&self) -> Option<CostEstimate> {
        self.state.cost_estimate()
    }
}
