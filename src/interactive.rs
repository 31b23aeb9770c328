//! 対話式の見積もりフロー
//!
//! 住所入力 → 候補選択 → 衛星画像の表示 → 撮影・解析 → 単価調整
//!
//! 住所入力は1行を「入力欄の現在値」として扱い、行ごとにデバウンス付きで
//! 候補を検索する。空行で入力を確定する。

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{ErrorKind, Result, RoofError};
use crate::places::AddressResolver;
use crate::shell::Shell;
use crate::viewport::StaticMapViewport;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use roof_estimate_common::{
    render_cost_estimate, AddressCandidate, PricePerSquare, SearchTicket, CAPTURE_ANGLES,
};
use crate::capture::save_captured_images;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// estimate コマンドのオプション
#[derive(Debug, Clone, Default)]
pub struct EstimateOptions {
    pub address: Option<String>,
    /// 1始まりの候補番号
    pub pick: Option<usize>,
    pub price: Option<u32>,
    pub yes: bool,
    /// 撮影画像の保存先
    pub images_dir: Option<PathBuf>,
}

/// 単価入力の解釈結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceCommand {
    Set(PricePerSquare),
    Done,
    Invalid,
}

/// 単価入力を解釈する
///
/// `+` / `-` は1ステップ、数値はその値（範囲外は丸める）、空行で終了。
pub fn parse_price_command(input: &str, current: PricePerSquare) -> PriceCommand {
    let trimmed = input.trim().trim_start_matches('$');
    match trimmed {
        "" => PriceCommand::Done,
        "+" => PriceCommand::Set(current.step_up()),
        "-" => PriceCommand::Set(current.step_down()),
        other => match other.replace(',', "").parse::<u32>() {
            Ok(value) => PriceCommand::Set(PricePerSquare::new(value)),
            Err(_) => PriceCommand::Invalid,
        },
    }
}

/// 候補を選ぶ。指定番号が範囲外ならエラー
pub fn pick_candidate(candidates: &[AddressCandidate], pick: usize) -> Result<&AddressCandidate> {
    pick.checked_sub(1)
        .and_then(|index| candidates.get(index))
        .ok_or_else(|| {
            RoofError::InvalidSelection(format!(
                "Candidate #{} does not exist ({} suggestions)",
                pick,
                candidates.len()
            ))
        })
}

fn prompt_error(e: dialoguer::Error) -> RoofError {
    RoofError::Prompt(e.to_string())
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(prompt_error)
}

/// 撮影用の進捗バー
pub fn capture_progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} angles captured")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// search コマンド: 候補を一覧表示する
pub async fn run_search(resolver: Arc<dyn AddressResolver>, query: &str) -> Result<()> {
    let candidates = resolver.search(query).await?;

    if candidates.is_empty() {
        println!("住所候補が見つかりません: {}", query);
        return Ok(());
    }

    for (i, candidate) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, candidate.description);
    }
    Ok(())
}

/// 標準入力を1行ずつ読み、空行かEOFで止まる
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() || tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// 住所を対話入力する
///
/// 入力確定後も、最新の入力に対する検索が終わるまで待つ。
async fn type_address(shell: &mut Shell, debounce: Duration) {
    println!("住所を入力してください（1行ごとに候補を更新、空行で確定）");

    let mut lines = spawn_line_reader();
    let (mut debouncer, mut due) = Debouncer::<SearchTicket>::new(debounce);
    let (result_tx, mut results) =
        mpsc::unbounded_channel::<(SearchTicket, Result<Vec<AddressCandidate>>)>();

    let mut typing = true;
    // 結果待ちの世代
    let mut awaiting: Option<u64> = None;

    loop {
        if !typing && awaiting.is_none() {
            break;
        }

        tokio::select! {
            line = lines.recv(), if typing => match line {
                Some(text) => {
                    match shell.input_changed(&text) {
                        Some(ticket) => {
                            awaiting = Some(ticket.generation);
                            debouncer.call(ticket);
                        }
                        None => {
                            awaiting = None;
                            debouncer.cancel();
                        }
                    }
                    println!("{}", shell.render());
                }
                None => typing = false,
            },
            Some(ticket) = due.recv() => {
                if shell.begin_search(&ticket) {
                    let resolver = shell.resolver();
                    let tx = result_tx.clone();
                    tokio::spawn(async move {
                        let result = resolver.search(&ticket.query).await;
                        let _ = tx.send((ticket, result));
                    });
                    println!("{}", shell.render());
                }
            }
            Some((ticket, result)) = results.recv() => {
                let generation = ticket.generation;
                if shell.apply_search(&ticket, result) {
                    if awaiting == Some(generation) {
                        awaiting = None;
                    }
                    println!("{}", shell.render());
                }
            }
        }
    }
}

/// 候補を決める。見つからなければ None
fn choose_candidate(candidates: &[AddressCandidate], pick: Option<usize>) -> Result<Option<String>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    if let Some(pick) = pick {
        return pick_candidate(candidates, pick).map(|c| Some(c.id.clone()));
    }

    let items: Vec<&str> = candidates.iter().map(|c| c.description.as_str()).collect();
    let selection = Select::new()
        .with_prompt("住所を選択")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(prompt_error)?;

    Ok(selection.map(|i| candidates[i].id.clone()))
}

/// 住所を確定するまで入力と選択を繰り返す
async fn select_address(config: &Config, shell: &mut Shell, options: &EstimateOptions) -> Result<()> {
    loop {
        match &options.address {
            Some(address) => {
                if let Some(ticket) = shell.input_changed(address) {
                    shell.run_search(&ticket).await;
                }
                println!("{}", shell.render());
            }
            None => type_address(shell, config.debounce()).await,
        }

        let candidates = shell.state().search().candidates().to_vec();
        let Some(id) = choose_candidate(&candidates, options.pick)? else {
            if options.address.is_some() || !confirm("住所候補がありません。入力し直しますか？")? {
                return Err(RoofError::NotFound("No address suggestions".into()));
            }
            continue;
        };

        match shell.select_candidate(&id).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                println!("{}", shell.render());
                let retry = e.kind() == ErrorKind::BusinessRuleRejection && options.address.is_none();
                if !retry {
                    return Err(e);
                }
            }
        }
    }
}

/// 単価を対話で調整する
fn adjust_price(shell: &mut Shell) -> Result<()> {
    loop {
        let input: String = Input::new()
            .with_prompt("Price per square (+/-: $5, number: set, Enter: done)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;

        match parse_price_command(&input, shell.state().price()) {
            PriceCommand::Set(price) => {
                if let Some(estimate) = shell.set_price(price) {
                    println!("{}", render_cost_estimate(&estimate));
                }
            }
            PriceCommand::Done => return Ok(()),
            PriceCommand::Invalid => println!("+, -, または数値を入力してください"),
        }
    }
}

/// セッションの撮影画像を書き出す（画像が無ければ何もしない）
fn export_images(shell: &Shell, dir: &Path) -> Result<()> {
    let Some(session) = shell.state().session() else {
        return Ok(());
    };
    if session.images().is_empty() {
        return Ok(());
    }

    let paths = save_captured_images(session.images(), dir)?;
    println!("✔ {}枚の画像を保存: {}", paths.len(), dir.display());
    Ok(())
}

/// estimate コマンド本体
pub async fn run_estimate(config: &Config, shell: &mut Shell, options: EstimateOptions) -> Result<()> {
    select_address(config, shell, &options).await?;
    println!("{}", shell.render());

    if !options.yes && !confirm("Find Satellite Images?")? {
        return Ok(());
    }

    shell.open_capture()?;
    let center = shell
        .state()
        .selected()
        .map(|place| place.coordinates)
        .ok_or_else(|| RoofError::ResourceNotReady("No address selected".into()))?;

    let mut viewport = StaticMapViewport::from_config(config, center)?;
    if let Err(e) = viewport.mount().await {
        // 未準備のまま進め、撮影時のエラーに原因を含める
        warn!(error = %e, "failed to load satellite imagery");
        println!("⚠ {}", e);
    }
    println!("{}", shell.render());

    if !options.yes && !confirm("Capture Roof Images?")? {
        shell.close_capture();
        return Ok(());
    }

    let progress = capture_progress_bar(CAPTURE_ANGLES.len());
    let outcome = shell.capture(&mut viewport, &progress).await;
    println!("{}", shell.render());

    // 解析に失敗しても撮影済みの画像は保存する
    let saved = match &options.images_dir {
        Some(dir) => export_images(shell, dir),
        None => Ok(()),
    };
    let measurements = outcome?;
    saved?;
    debug!(?measurements, "roof analysis complete");

    if let Some(price) = options.price {
        if let Some(estimate) = shell.set_price(PricePerSquare::new(price)) {
            println!("{}", render_cost_estimate(&estimate));
        }
        return Ok(());
    }

    if !options.yes {
        adjust_price(shell)?;
    }

    Ok(())
}
