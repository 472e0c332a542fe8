use chrono::Local;
use clap::Parser;
use medoctor::{cli, config, error, export, form, rule_source, store};
use cli::{Cli, Commands};
use config::Config;
use error::{MedoctorError, Result};
use export::lookup;
use export::report;
use form::{ConclusionForm, OutputMode};
use medoctor_common::records::{group_by_organization, name_suggestions, unique_values};
use medoctor_common::{BaseCode, DateRange, RuleTable};
use store::RecordStore;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 端末（stderr）とアプリディレクトリの log.txt に出力
///
/// log.txt は INFO 以上を追記する。開けなければ端末のみ。
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)));

    let log_file = Config::app_dir()
        .and_then(|dir| medoctor::io::open_append(&Config::log_path_in(&dir)))
        .map_err(|e| eprintln!("⚠ log.txt: {}", e))
        .ok();
    let file = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry().with(console).with(file).init();
}

fn load_rules(config: &Config) -> RuleTable {
    let path = rule_source::resolve_rule_table_path(
        &config.default_rule_table_path(),
        Some(&config.user_rule_table_path()),
    );
    rule_source::load_rule_table_or_empty(&path)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::info!("medoctor {} started", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => {}
        Err(MedoctorError::EmptyReport) => {
            println!("{}", MedoctorError::EmptyReport);
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    let store = RecordStore::new(config.data_path());

    match cli.command {
        Commands::Conclusion {
            exam_type,
            org,
            name,
            birthday,
            sex,
            division,
            profession,
            factors,
            typework,
            ids_date,
            diagnosis,
            combined,
            interactive,
        } => {
            println!("📝 medoctor - заключение\n");

            let records = store.load()?;
            let mut form = ConclusionForm {
                exam_type,
                organization: org.unwrap_or_default(),
                name: name.unwrap_or_default(),
                birthday: birthday.unwrap_or_default(),
                sex,
                division: division.unwrap_or_default(),
                profession: profession.unwrap_or_default(),
                factors: factors.unwrap_or_default(),
                typework: typework.unwrap_or_default(),
                ids_date: ids_date.unwrap_or_default(),
                diagnosis: diagnosis.unwrap_or_default(),
            };
            form.normalize();
            if interactive {
                form::prompt_missing(&mut form, &records)?;
                form.normalize();
            } else if form.autofill(&records) {
                println!("✔ Данные дополнены из сохраненной записи");
            }

            let mode = if combined { OutputMode::Combined } else { OutputMode::Standalone };
            let outcome = form::submit(
                &form,
                mode,
                &config.template_path(),
                &store,
                &config.save_dir,
                Local::now(),
            )?;

            match outcome.combined {
                Some(export::compose::AppendOutcome::Appended) => {
                    println!("✔ Добавлено в файл: {}", outcome.document.display())
                }
                _ => println!("✔ Документ сохранен: {}", outcome.document.display()),
            }
            println!("✔ Запись добавлена: {}", store.path().display());
        }

        Commands::Lookup { codes, sex, age_group, no_summary } => {
            let base = match (sex, age_group) {
                (Some(sex), Some(group)) => Some(BaseCode::new(sex, group)),
                _ => None,
            };
            let code_set = lookup::lookup_codes(&codes, base);
            if code_set.is_empty() {
                return Err(MedoctorError::Validation("Укажите хотя бы один код".into()));
            }

            let rules = load_rules(&config);
            let matched = rules.match_codes(&code_set);

            println!("Коды: {}", code_set.iter().collect::<Vec<_>>().join(", "));
            for (label, list) in [
                ("Врачи", &matched.doctors),
                ("Обследования", &matched.inspections),
                ("Анализы", &matched.analyses),
            ] {
                println!("{}:", label);
                for item in list.iter() {
                    println!("  - {}", item);
                }
            }

            let summary = if no_summary { None } else { Some(config.summary_sheet_path()) };
            let outcome = lookup::write_lookup(&matched, summary.as_deref(), &config.save_dir)?;
            if let Some(totals) = &outcome.summary {
                println!("Соответствие:");
                for item in &totals.matched {
                    println!("  + {}", item);
                }
                println!("ИТОГО: {}", totals.total);
            }
            println!("\n✔ Сохранено: {}", outcome.path.display());
        }

        Commands::Report { kind, from, to, org } => {
            let range = DateRange::parse(&from, to.as_deref())?;
            let records = store.load()?;
            let rules = match kind {
                report::ReportKind::Doctors => load_rules(&config),
                _ => RuleTable::empty(),
            };

            let path = report::generate_report(
                kind,
                &records,
                &rules,
                &range,
                org.as_deref(),
                &config.save_dir,
            )?;
            println!("✔ Отчет сохранен: {}", path.display());
        }

        Commands::Records { orgs, field, org, suggest } => {
            let records = store.load()?;

            if let Some(prefix) = suggest {
                for name in name_suggestions(&records, &prefix) {
                    println!("{}", name);
                }
            } else if let Some(field) = field {
                for value in unique_values(&records, field, org.as_deref()) {
                    println!("{}", value);
                }
            } else if orgs {
                for (organization, members) in group_by_organization(&records) {
                    println!("{}: {}", organization, members.len());
                }
            } else {
                println!("Записей: {} ({})", records.len(), store.path().display());
            }
        }

        Commands::Rules { edit, show } => {
            let default = config.default_rule_table_path();
            let user = config.user_rule_table_path();

            if edit {
                let path = rule_source::ensure_user_copy(&default, &user)?;
                println!("✔ Файл для редактирования: {}", path.display());
            }

            if show || !edit {
                let path = rule_source::resolve_rule_table_path(&default, Some(&user));
                let rules = rule_source::load_rule_table(&path)?;
                println!("Приказ 29н: {}", path.display());
                println!("  Строк: {}", rules.len());
            }
        }

        Commands::Settings { save_dir, show } => {
            if let Some(dir) = save_dir {
                config.set_save_dir(dir)?;
                println!("✔ Папка сохранения: {}", config.save_dir.display());
            }

            if show {
                println!("Настройки ({}):", config.settings_path().display());
                println!("  Папка сохранения: {}", config.save_dir.display());
                println!("  Записи: {}", config.data_path().display());
                println!("  Приказ 29н: {}", config.default_rule_table_path().display());
                println!("  Копия для редактирования: {}", config.user_rule_table_path().display());
                println!("  Шаблон: {}", config.template_path().display());
                println!("  Сводная таблица: {}", config.summary_sheet_path().display());
            }
        }
    }

    Ok(())
}
