use crate::export::report::ReportKind;
use clap::{Parser, Subcommand};
use medoctor_common::{AgeGroup, ExamType, RecordField, Sex};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medoctor")]
#[command(about = "Медосмотры: заключения, приказ 29н, отчеты Excel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 結論書を作成してレコードを保存
    Conclusion {
        /// 健診の種類 (preliminary/periodic)
        #[arg(short = 't', long = "type", default_value = "preliminary")]
        exam_type: ExamType,

        /// 組織
        #[arg(long)]
        org: Option<String>,

        /// ФИО
        #[arg(long)]
        name: Option<String>,

        /// 生年月日（ДД.ММ.ГГГГ または ДДММГГГГ）
        #[arg(long)]
        birthday: Option<String>,

        /// 性別 (М/Ж)。省略時は父称から推定
        #[arg(long)]
        sex: Option<Sex>,

        /// 部署
        #[arg(long)]
        division: Option<String>,

        /// 職種
        #[arg(long)]
        profession: Option<String>,

        /// 有害因子コード
        #[arg(long)]
        factors: Option<String>,

        /// 作業種別コード
        #[arg(long)]
        typework: Option<String>,

        /// 健診日
        #[arg(long)]
        ids_date: Option<String>,

        /// 診断
        #[arg(long)]
        diagnosis: Option<String>,

        /// 日付ごとのまとめファイルに追記
        #[arg(long)]
        combined: bool,

        /// 未入力の項目を対話式で入力
        #[arg(short, long)]
        interactive: bool,
    },

    /// コードから必要な医師・検査を照会（results.xlsx）
    Lookup {
        /// 因子・作業種別コード（, ; 区切り可）
        codes: Vec<String>,

        /// 性別（年齢区分と合わせて基本コードを追加）
        #[arg(long, requires = "age_group")]
        sex: Option<Sex>,

        /// 年齢区分 (under40/over40)
        #[arg(long, requires = "sex")]
        age_group: Option<AgeGroup>,

        /// まとめシートを付けない
        #[arg(long)]
        no_summary: bool,
    },

    /// Excelレポートを作成
    Report {
        /// 種類 (organization/period/doctors)
        #[arg(required = true)]
        kind: ReportKind,

        /// 開始日
        #[arg(long, required = true)]
        from: String,

        /// 終了日（省略時は開始月の末日）
        #[arg(long)]
        to: Option<String>,

        /// 組織で絞り込み（organization では必須）
        #[arg(long)]
        org: Option<String>,
    },

    /// 保存済みレコードの照会
    Records {
        /// 組織ごとの件数
        #[arg(long)]
        orgs: bool,

        /// フィールドの既存値一覧
        #[arg(long)]
        field: Option<RecordField>,

        /// --field の絞り込み組織
        #[arg(long)]
        org: Option<String>,

        /// 氏名の前方一致候補
        #[arg(long)]
        suggest: Option<String>,
    },

    /// приказ 29н の管理
    Rules {
        /// 編集用コピーを作成してパスを表示
        #[arg(long)]
        edit: bool,

        /// 読み込まれる表の概要を表示
        #[arg(long)]
        show: bool,
    },

    /// 設定を表示/編集
    Settings {
        /// 出力先フォルダを設定
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
