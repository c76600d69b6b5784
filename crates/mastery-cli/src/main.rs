use mastery_client::{Tutor, TutorClient};
use mastery_core::{
    DetectorRegistry, Direction, ExportFormat, Lesson, MasteryConfig, SanitizeOptions,
    sanitize_diagram,
};
use std::io::{BufRead, Read, Write};

const USAGE: &str = "\
Usage: mastery [COMMAND] [OPTIONS]

Commands:
  chat                Interactive tutoring session (default)
  ask <question...>   One-shot question, lesson printed to stdout
  sanitize [FILE]     Repair diagram markup from FILE (or stdin)

Options:
  --config <FILE>      YAML config merged over engine defaults
  --model <NAME>       Override the model id
  --direction <TOKEN>  Default flowchart direction (TD, TB, LR, RL, BT)
  --max-retries <N>    Retry attempt budget for API calls
  --glossary <FILE>    Load/save the glossary as JSON (chat)
  --out <FILE>         Write output to FILE instead of stdout
  -h, --help           Show this help

Environment:
  MASTERY_API_KEY      API key for the chat endpoint (ask, chat)
  RUST_LOG             Log filter, e.g. mastery_client=debug
";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(mastery_core::Error),
    Client(mastery_client::Error),
    Json(serde_json::Error),
    MissingApiKey,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Client(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::MissingApiKey => {
                write!(f, "MASTERY_API_KEY is not set; export it to use ask/chat")
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mastery_core::Error> for CliError {
    fn from(value: mastery_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<mastery_client::Error> for CliError {
    fn from(value: mastery_client::Error) -> Self {
        Self::Client(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Chat,
    Ask,
    Sanitize,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    positional: Vec<String>,
    config_path: Option<String>,
    glossary_path: Option<String>,
    model: Option<String>,
    direction: Option<Direction>,
    max_retries: Option<u32>,
    out: Option<String>,
    help: bool,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut command_set = false;
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--config" => {
                args.config_path = Some(next_value(&mut argv, "--config expects a file path")?);
            }
            "--glossary" => {
                args.glossary_path = Some(next_value(&mut argv, "--glossary expects a file path")?);
            }
            "--model" => args.model = Some(next_value(&mut argv, "--model expects a name")?),
            "--out" => args.out = Some(next_value(&mut argv, "--out expects a file path")?),
            "--direction" => {
                let value = next_value(&mut argv, "--direction expects a token")?;
                args.direction = Some(Direction::parse(&value).ok_or(CliError::Usage(
                    "--direction must be one of TD, TB, LR, RL, BT",
                ))?);
            }
            "--max-retries" => {
                let value = next_value(&mut argv, "--max-retries expects a number")?;
                args.max_retries = Some(
                    value
                        .parse()
                        .map_err(|_| CliError::Usage("--max-retries expects a number"))?,
                );
            }
            "-h" | "--help" => args.help = true,
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(CliError::Usage("unknown option"));
            }
            _ if !command_set => {
                args.command = match arg.as_str() {
                    "chat" => Command::Chat,
                    "ask" => Command::Ask,
                    "sanitize" => Command::Sanitize,
                    _ => return Err(CliError::Usage("unknown command")),
                };
                command_set = true;
            }
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

fn next_value(
    argv: &mut impl Iterator<Item = String>,
    missing: &'static str,
) -> Result<String, CliError> {
    argv.next().ok_or(CliError::Usage(missing))
}

fn effective_config(args: &Args) -> Result<MasteryConfig, CliError> {
    let mut config = MasteryConfig::default_engine();
    if let Some(path) = &args.config_path {
        let text = std::fs::read_to_string(path)?;
        let overrides = MasteryConfig::from_yaml_str(&text)?;
        config.deep_merge(overrides.as_value());
    }
    if let Some(model) = &args.model {
        config.set_value("model", serde_json::json!(model));
    }
    if let Some(direction) = args.direction {
        config.set_value(
            "diagram.default_direction",
            serde_json::json!(direction.as_token()),
        );
    }
    if let Some(attempts) = args.max_retries {
        config.set_value("retry.max_attempts", serde_json::json!(attempts));
    }
    Ok(config)
}

fn cmd_sanitize(args: &Args, config: &MasteryConfig) -> Result<(), CliError> {
    let input = match args.positional.first().map(String::as_str) {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };
    let output = sanitize_diagram(&input, &SanitizeOptions::from_config(config));
    write_output(args.out.as_deref(), &output)
}

async fn cmd_ask(args: &Args, config: &MasteryConfig) -> Result<(), CliError> {
    let question = args.positional.join(" ");
    if question.trim().is_empty() {
        return Err(CliError::Usage("ask requires a question"));
    }
    let mut tutor = build_tutor(config)?;
    let lesson = tutor.ask(&question).await?;
    match args.out.as_deref() {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&lesson)?)?;
            Ok(())
        }
        None => {
            print_lesson(&lesson);
            Ok(())
        }
    }
}

async fn cmd_chat(args: &Args, config: &MasteryConfig) -> Result<(), CliError> {
    let mut tutor = build_tutor(config)?;
    if let Some(path) = &args.glossary_path {
        if std::path::Path::new(path).exists() {
            let text = std::fs::read_to_string(path)?;
            tutor.set_glossary(serde_json::from_str(&text)?);
        }
    }

    println!("Mastery chat. Commands: :define <term>, :glossary, :export <path>, :quit");
    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(':') {
            let mut parts = rest.splitn(2, ' ');
            let command = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or("").trim();
            match command {
                "quit" | "q" | "exit" => break,
                "define" => match tutor.define(value).await {
                    Ok(item) => println!("{}: {}", item.term, item.definition),
                    Err(err) => eprintln!("{err}"),
                },
                "glossary" => {
                    if tutor.glossary().is_empty() {
                        println!("(glossary is empty)");
                    }
                    for item in tutor.glossary().iter() {
                        println!("- {}: {}", item.term, item.definition);
                    }
                }
                "export" => {
                    if value.is_empty() {
                        eprintln!(":export needs a file path");
                        continue;
                    }
                    let format = if value.ends_with(".json") {
                        ExportFormat::Json
                    } else {
                        ExportFormat::Markdown
                    };
                    match tutor.export(format) {
                        Ok(text) => {
                            std::fs::write(value, text)?;
                            println!("wrote {value}");
                        }
                        Err(err) => eprintln!("{err}"),
                    }
                }
                _ => eprintln!("unknown command :{command}"),
            }
            continue;
        }

        match tutor.ask(line).await {
            Ok(lesson) => print_lesson(&lesson),
            Err(err) => eprintln!("{err}"),
        }
    }

    if let Some(path) = &args.glossary_path {
        std::fs::write(path, serde_json::to_string_pretty(tutor.glossary())?)?;
    }
    Ok(())
}

fn build_tutor(config: &MasteryConfig) -> Result<Tutor, CliError> {
    let api_key = std::env::var("MASTERY_API_KEY").map_err(|_| CliError::MissingApiKey)?;
    let client = TutorClient::new(api_key, config);
    Ok(Tutor::new(client, config))
}

/// Renders the lesson sections. A diagram that still fails detection after
/// sanitation is shown unfenced with a warning; a reply with no recognized
/// structure falls back to the raw text.
fn print_lesson(lesson: &Lesson) {
    let sections = [
        ("Principle", &lesson.principle),
        ("Analogy", &lesson.analogy),
        ("Application", &lesson.application),
    ];
    for (title, section) in sections {
        if let Some(text) = section {
            println!("## {title}\n\n{text}\n");
        }
    }

    let registry = DetectorRegistry::default_set();
    match &lesson.diagram {
        Some(diagram) if registry.detect_type(diagram).is_ok() => {
            print!("```mermaid\n{diagram}```\n");
        }
        Some(diagram) => {
            eprintln!("warning: diagram failed validation, showing it as plain text");
            print!("{diagram}");
        }
        None => {}
    }

    if sections.iter().all(|(_, s)| s.is_none()) && lesson.diagram.is_none() {
        println!("{}", lesson.raw.trim_end());
    }
}

fn write_output(out: Option<&str>, text: &str) -> Result<(), CliError> {
    match out {
        Some(path) => std::fs::write(path, text)?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        print!("{USAGE}");
        return Ok(());
    }
    let config = effective_config(&args)?;
    match args.command {
        Command::Sanitize => cmd_sanitize(&args, &config),
        Command::Ask => cmd_ask(&args, &config).await,
        Command::Chat => cmd_chat(&args, &config).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    match run().await {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}\n\n{USAGE}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
