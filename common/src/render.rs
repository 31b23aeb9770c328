//! 状態の描画
//!
//! ShellState を端末表示用のテキストに変換する純粋関数。
//! 状態が同じなら出力も同じになる。

use crate::capture::{heading_label, CaptureStatus};
use crate::cost::{CostEstimate, MAX_PRICE_PER_SQUARE, MIN_PRICE_PER_SQUARE};
use crate::state::{PredictionsState, ShellState};
use crate::types::RoofMeasurements;

/// 3桁区切りの数値表記（小数は最大3桁、末尾の0は省略）
pub fn format_number(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// "$4,250" 形式
pub fn format_currency(value: f64) -> String {
    format!("${}", format_number(value))
}

/// 信頼度を百分率（小数1桁）で表記
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

fn render_measurements(out: &mut Vec<String>, m: &RoofMeasurements) {
    out.push(format!("Roof Area:   {} sq ft", format_number(m.area_sq_ft)));
    out.push(format!("Perimeter:   {} ft", format_number(m.perimeter_ft)));
    out.push(format!("Roof Pitch:  {}°", format_number(m.pitch_degrees)));
    out.push(format!("Confidence:  {}", format_confidence(m.confidence)));
}

fn render_cost(out: &mut Vec<String>, estimate: &CostEstimate) {
    out.push("Cost Estimation".to_string());
    out.push(format!(
        "  Price per Square: ${}  (${} - ${})",
        estimate.price_per_square.get(),
        MIN_PRICE_PER_SQUARE,
        MAX_PRICE_PER_SQUARE
    ));
    out.push(format!(
        "  Roof Size:        {:.1} Squares ({} sq ft)",
        estimate.total_squares,
        format_number(estimate.area_sq_ft)
    ));
    out.push(format!(
        "  Estimated Cost:   {}",
        format_currency(estimate.total_cost)
    ));
}

/// 費用ブロックだけを描画（単価変更時の再表示用）
pub fn render_cost_estimate(estimate: &CostEstimate) -> String {
    let mut out = Vec::new();
    render_cost(&mut out, estimate);
    out.join("\n")
}

/// 状態をテキストに描画
pub fn render(state: &ShellState) -> String {
    let mut out = Vec::new();
    let search = state.search();

    if search.is_loading() {
        out.push(format!("Address: {} (searching...)", search.input()));
    } else {
        out.push(format!("Address: {}", search.input()));
    }

    if let Some(error) = state.error() {
        out.push(format!("Error: {}", error));
    }

    match search.predictions() {
        PredictionsState::Loaded { candidates, .. } if !candidates.is_empty() => {
            for (i, candidate) in candidates.iter().enumerate() {
                out.push(format!("  {}. {}", i + 1, candidate.description));
            }
        }
        PredictionsState::Error { message, .. } => {
            out.push(format!("  {}", message));
        }
        _ => {}
    }

    let Some(place) = state.selected() else {
        return out.join("\n");
    };

    let Some(session) = state.session() else {
        out.push(format!(
            "Selected: {} ({})",
            place.formatted_address, place.coordinates
        ));
        out.push("[Find Satellite Images]".to_string());
        return out.join("\n");
    };

    out.push(format!("Roof Capture for {}", session.address()));
    let total = session.angles().len();

    match session.status() {
        CaptureStatus::Pending => {
            out.push("[Capture Roof Images]".to_string());
            out.push(format!("0 of {} angles captured", total));
        }
        CaptureStatus::Capturing => {
            out.push(format!(
                "{} of {} angles captured",
                session.images().len(),
                total
            ));
        }
        CaptureStatus::Analyzing => {
            out.push("Analyzing Roof...".to_string());
            out.push(format!(
                "{} of {} angles captured",
                session.images().len(),
                total
            ));
        }
        CaptureStatus::Done | CaptureStatus::Failed { .. } => {
            out.push(format!(
                "{} of {} angles captured",
                session.images().len(),
                total
            ));
            for (i, image) in session.images().iter().enumerate() {
                out.push(format!(
                    "  Roof view {} [{}]",
                    i + 1,
                    heading_label(image.heading)
                ));
            }
        }
    }

    if let CaptureStatus::Failed { message } = session.status() {
        out.push(format!("Error: {}", message));
    }

    if let Some(measurements) = session.measurements() {
        render_measurements(&mut out, measurements);
        if let Some(estimate) = state.cost_estimate() {
            render_cost(&mut out, &estimate);
        }
    }

    out.join("\n")
}
