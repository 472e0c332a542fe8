use crate::error::{MedoctorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// アプリケーションディレクトリを上書きする環境変数
pub const HOME_ENV: &str = "MEDOCTOR_HOME";

const SETTINGS_FILE: &str = "settings.json";
const DATA_FILE: &str = "data.xml";
const RULE_TABLE_FILE: &str = "prikaz29n.xlsx";
const LOG_FILE: &str = "log.txt";

/// 同梱リソースの既定パス（作業ディレクトリ基準）
const DEFAULT_RULE_TABLE: &str = "res/prikaz29n.xlsx";
const DEFAULT_TEMPLATE: &str = "res/template.docx";
const DEFAULT_SUMMARY: &str = "res/summer.xlsx";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 出力先ディレクトリ
    pub save_dir: PathBuf,
    /// data.xml（省略時はアプリディレクトリ）
    pub data_file: Option<PathBuf>,
    /// 同梱の приказ 29н
    pub rule_table: Option<PathBuf>,
    /// 結論書テンプレート
    pub template: Option<PathBuf>,
    /// results.xlsx に付けるまとめシートの元ファイル
    pub summary_sheet: Option<PathBuf>,

    #[serde(skip)]
    app_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            data_file: None,
            rule_table: None,
            template: None,
            summary_sheet: None,
            app_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_in(&Self::app_dir()?)
    }

    /// 指定ディレクトリの settings.json を読む。無ければ既定値
    pub fn load_in(app_dir: &Path) -> Result<Self> {
        let settings_path = app_dir.join(SETTINGS_FILE);

        let mut config = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.app_dir = app_dir.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.app_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(self.settings_path(), content)?;
        Ok(())
    }

    pub fn app_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(HOME_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| MedoctorError::Config("Не найдена папка настроек пользователя".into()))?;
        Ok(base.join("medoctor"))
    }

    /// 設定読み込み前にも使うため関連関数
    pub fn log_path_in(app_dir: &Path) -> PathBuf {
        app_dir.join(LOG_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        Self::log_path_in(&self.app_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.app_dir.join(SETTINGS_FILE)
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| self.app_dir.join(DATA_FILE))
    }

    /// 同梱版の приказ
    pub fn default_rule_table_path(&self) -> PathBuf {
        self.rule_table
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RULE_TABLE))
    }

    /// ユーザー編集用コピー
    pub fn user_rule_table_path(&self) -> PathBuf {
        self.app_dir.join(RULE_TABLE_FILE)
    }

    pub fn template_path(&self) -> PathBuf {
        self.template
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE))
    }

    pub fn summary_sheet_path(&self) -> PathBuf {
        self.summary_sheet
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SUMMARY))
    }

    /// 出力先を変更（無ければ作成）して保存
    pub fn set_save_dir(&mut self, dir: PathBuf) -> Result<()> {
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                MedoctorError::Config(format!("Не удалось создать папку {}: {}", dir.display(), e))
            })?;
        }
        self.save_dir = dir;
        self.save()
    }
}
