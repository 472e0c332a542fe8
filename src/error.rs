use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedoctorError {
    #[error("Ошибка настроек: {0}")]
    Config(String),

    #[error("Ошибка ввода: {0}")]
    Validation(String),

    #[error("Невозможно записать файл, проверьте, не открыт ли он в другой программе: {0}")]
    FileLocked(String),

    #[error("Файл не найден: {0}")]
    FileNotFound(String),

    #[error("Ошибка файла записей: {0}")]
    RecordStore(String),

    #[error("Ошибка файла приказа: {0}")]
    RuleTable(String),

    #[error("Ошибка документа Word: {0}")]
    Document(String),

    #[error("Ошибка создания Excel: {0}")]
    ExcelGeneration(String),

    #[error("Нет записей за выбранный период.")]
    EmptyReport,

    #[error("Ошибка ввода в консоли: {0}")]
    CliExecution(String),

    #[error("Ошибка JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Ошибка ввода-вывода (IO): {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] medoctor_common::Error),
}

pub type Result<T> = std::result::Result<T, MedoctorError>;
