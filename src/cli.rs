use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roof-estimate")]
#[command(about = "住所から屋根面積を解析し、概算費用を算出するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 住所候補を検索して表示
    Search {
        /// 検索テキスト（3文字以上）
        #[arg(required = true)]
        query: String,
    },

    /// 住所を選び、衛星画像を撮影・解析して概算費用を表示
    Estimate {
        /// 住所テキスト（省略時は対話入力）
        #[arg(short, long)]
        address: Option<String>,

        /// 候補番号を指定（1始まり）
        #[arg(short, long)]
        pick: Option<usize>,

        /// 1スクエアあたりの単価（$350 - $5000）
        #[arg(long)]
        price: Option<u32>,

        /// 確認をすべて省略
        #[arg(short, long)]
        yes: bool,

        /// 撮影画像（roof_{方位}.jpg）の保存先
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },

    /// 設定を表示・変更
    Config {
        /// Google Maps APIキーを設定
        #[arg(long)]
        set_google_key: Option<String>,

        /// OpenAI APIキーを設定
        #[arg(long)]
        set_openai_key: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}
