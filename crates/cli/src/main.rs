use clap::{Parser, Subcommand};
use intake_core::{
    config::resolve_definitions_dir,
    constants::DEFAULT_SUBMISSION_DATA_DIR,
    phrasing::phrasing_from_env_values,
    repositories::symptoms::load_definition_file,
    FormSession, IntakeForm, SubmissionService, Symptom, SymptomCatalog, SymptomId, Trigger,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Symptom intake summary engine CLI")]
struct Cli {
    /// Directory of symptom definitions (defaults to INTAKE_DEFINITIONS_DIR or `definitions/`)
    #[arg(long, global = true)]
    definitions_dir: Option<PathBuf>,
    /// Summary wording preset, `en` or `th` (defaults to INTAKE_LOCALE)
    #[arg(long, global = true)]
    locale: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List active symptoms
    List,
    /// Show the questions and templates of a symptom
    Show {
        /// Symptom id
        id: SymptomId,
    },
    /// Check definitions for authoring mistakes
    Validate {
        /// A single definition file (defaults to every file in the definitions directory)
        file: Option<PathBuf>,
    },
    /// Print the summary for a saved session
    Summarise {
        /// Symptom id
        id: SymptomId,
        /// JSON file holding the form session
        session: PathBuf,
        /// Print the full evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a saved session and store it as a submission
    Submit {
        /// Symptom id
        id: SymptomId,
        /// JSON file holding the form session
        session: PathBuf,
    },
    /// Print a stored submission
    Submission {
        /// Submission UUID
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'intake --help' for commands");
        return Ok(());
    };

    let phrasing = phrasing_from_env_values(
        cli.locale.or_else(|| std::env::var("INTAKE_LOCALE").ok()),
        std::env::var("INTAKE_PHRASING_FILE")
            .ok()
            .map(PathBuf::from)
            .as_deref(),
    )?;
    let definitions_override = cli
        .definitions_dir
        .or_else(|| std::env::var("INTAKE_DEFINITIONS_DIR").ok().map(PathBuf::from));
    let definitions_dir = || resolve_definitions_dir(definitions_override.clone());

    match command {
        Commands::List => {
            let catalog = SymptomCatalog::load_dir(&definitions_dir()?)?;
            let symptoms = catalog.list_active();
            if symptoms.is_empty() {
                println!("No symptoms found.");
            }
            for symptom in symptoms {
                println!(
                    "ID: {}, Name: {}, Questions: {}",
                    symptom.id, symptom.name, symptom.question_count
                );
            }
        }
        Commands::Show { id } => {
            let catalog = SymptomCatalog::load_dir(&definitions_dir()?)?;
            let form = catalog.form(id, &phrasing)?;
            print_form(&form);
        }
        Commands::Validate { file } => {
            let symptoms: Vec<Symptom> = match file {
                Some(path) => vec![load_definition_file(&path)?],
                None => {
                    let catalog = SymptomCatalog::load_dir(&definitions_dir()?)?;
                    catalog
                        .list_active()
                        .iter()
                        .filter_map(|s| catalog.get(s.id).cloned())
                        .collect()
                }
            };

            let mut total = 0;
            for symptom in &symptoms {
                let issues = IntakeForm::new(symptom, phrasing.clone()).issues();
                total += issues.len();
                for issue in issues {
                    println!("{} ({}): {}", symptom.id, symptom.name, issue);
                }
            }

            if total > 0 {
                return Err(format!("{total} issue(s) found").into());
            }
            println!("{} definition(s) OK", symptoms.len());
        }
        Commands::Summarise { id, session, json } => {
            let catalog = SymptomCatalog::load_dir(&definitions_dir()?)?;
            let form = catalog.form(id, &phrasing)?;
            let evaluation = form.evaluate(&read_session(&session)?);

            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else if evaluation.summary_text.is_empty() {
                println!("(no summary yet)");
            } else {
                println!("{}", evaluation.summary_text);
            }
        }
        Commands::Submit { id, session } => {
            let catalog = SymptomCatalog::load_dir(&definitions_dir()?)?;
            let form = catalog.form(id, &phrasing)?;
            let payload = form.prepare_submission(&read_session(&session)?)?;

            let stored = submission_service().store(&payload)?;
            println!("Stored submission with UUID: {}", stored.id);
        }
        Commands::Submission { id } => {
            let stored = submission_service().read(&id)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
    }

    Ok(())
}

fn read_session(path: &Path) -> Result<FormSession, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn submission_service() -> SubmissionService {
    let submission_dir = std::env::var("INTAKE_SUBMISSION_DIR")
        .unwrap_or_else(|_| DEFAULT_SUBMISSION_DATA_DIR.into());
    SubmissionService::from_data_dir(submission_dir)
}

fn print_form(form: &IntakeForm) {
    println!("{} ({})", form.name(), form.symptom_id());

    for question in form.graph().questions() {
        let mut flags = Vec::new();
        if question.is_required {
            flags.push("required");
        }
        if question.is_general {
            flags.push("general");
        }
        if question.is_cc {
            flags.push("chief complaint");
        }
        if question.accepts_time_unit() {
            flags.push("time unit");
        }

        let condition = match question.parent_question_id {
            Some(parent) if !question.is_general => format!(
                " when {} is one of [{}]",
                parent,
                question.conditional_values.values().join(", ")
            ),
            _ => String::new(),
        };
        println!(
            "  Q{} [{}] {}{}{}",
            question.id,
            question.kind,
            question.title,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            },
            condition
        );
        for option in &question.options {
            println!(
                "      O{} {} = {}{}",
                option.id,
                option.label,
                option.value,
                if option.has_input { " (+input)" } else { "" }
            );
        }
    }

    println!("  Templates:");
    for template in form.templates() {
        let trigger = match template.trigger() {
            Trigger::Exact(q, v) => format!("Q{q} = {v}"),
            Trigger::AnyValue(q) => format!("Q{q} answered"),
            Trigger::Unconditional => "always".to_string(),
            Trigger::Orphaned => "never".to_string(),
        };
        println!("    T{} [{}] {}", template.id, trigger, template.template);
    }
}
