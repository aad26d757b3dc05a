mod project;
mod remote;

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use lantern_core::differ::create_plan;
use lantern_core::effect::Effect;
use lantern_core::plan::Plan;
use lantern_core::provider::{Provider, ProviderError, ProviderResult, ResourceType};
use lantern_core::resource::{Resource, ResourceId, State, Value};
use lantern_core::schema::ResourceSchema;
use lantern_provider::container::ParameterContainer;
use lantern_provider::wire::value_to_json;
use lantern_provider::{SOURCE_RESOURCE_TYPE, SourceProvider, SourceType, registry};
use lantern_state::{ResourceState, StateBackend, StateFile, create_backend};

use project::{DEFAULT_PROJECT_FILE, ProjectConfig};
use remote::FileSourceApi;

#[derive(Parser)]
#[command(name = "lantern")]
#[command(about = "Declarative management of metadata sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the source types this build supports
    Variants,
    /// Validate the project file
    Validate {
        /// Path to the project file
        #[arg(default_value = DEFAULT_PROJECT_FILE)]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        #[arg(default_value = DEFAULT_PROJECT_FILE)]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        #[arg(default_value = DEFAULT_PROJECT_FILE)]
        file: PathBuf,
    },
    /// Destroy every source recorded in the state
    Destroy {
        #[arg(default_value = DEFAULT_PROJECT_FILE)]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Variants => run_variants(),
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file).await,
        Commands::Apply { file } => run_apply(&file).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, auto_approve).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    HashMap::from([(SOURCE_RESOURCE_TYPE.to_string(), SourceType.schema())])
}

/// Schema check plus the exactly-one-variant check for every source
fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let schemas = get_schemas();
    let mut all_errors = Vec::new();

    for resource in resources {
        if let Some(schema) = schemas.get(&resource.id.resource_type)
            && let Err(errors) = schema.validate(&resource.attributes)
        {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }

        let parameters = resource.attributes.get("parameters").unwrap_or(&Value::Null);
        let resolved = ParameterContainer::from_config(registry(), parameters)
            .and_then(|mut container| container.resolve_active().map(|_| ()));
        if let Err(e) = resolved {
            all_errors.push(format!("{}: {}", resource.id, e));
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_variants() -> Result<(), String> {
    println!("{}", "Source types:".cyan().bold());
    println!();
    for descriptor in registry().descriptors() {
        let secret = if descriptor.requires_secret_reference {
            " (credentials)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} [{}]{}",
            descriptor.name.bold(),
            descriptor.wire_tag,
            secret
        );
        let required = descriptor.field_schema.required_attributes();
        if !required.is_empty() {
            println!("    required: {}", required.join(", ").dimmed());
        }
    }
    Ok(())
}

fn run_validate(file: &Path) -> Result<(), String> {
    let project = ProjectConfig::load(file)?;
    let resources = project.resources();
    validate_resources(&resources)?;

    println!(
        "{}",
        format!("✓ {} source(s) valid.", resources.len()).green()
    );
    Ok(())
}

/// Everything a command needs to talk to the remote and the state
struct Session {
    provider: SourceProvider<FileSourceApi>,
    backend: Box<dyn StateBackend>,
    state: StateFile,
}

impl Session {
    async fn open(project: &ProjectConfig) -> Result<Self, String> {
        let backend = create_backend(&project.backend_config())
            .await
            .map_err(|e| e.to_string())?;
        backend.init().await.map_err(|e| e.to_string())?;
        let state = backend
            .read_state()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_default();
        let provider = SourceProvider::new(FileSourceApi::new(project.remote_path()));

        Ok(Self {
            provider,
            backend,
            state,
        })
    }

    /// Read the current remote state of every source recorded in the state file
    async fn refresh(&self) -> Result<HashMap<ResourceId, State>, String> {
        let mut current_states = HashMap::new();
        for recorded in &self.state.resources {
            let id = recorded.id();
            let state = self
                .provider
                .read(&id, recorded.identifier.as_deref())
                .await
                .map_err(|e| format!("Failed to read state: {}", e))?;
            current_states.insert(id, state);
        }
        Ok(current_states)
    }

    fn record(&mut self, state: &State) {
        if !self
            .state
            .record(to_resource_state(state, self.provider.name()))
        {
            log::debug!("state of {} unchanged", state.id);
        }
    }

    fn forget(&mut self, id: &ResourceId) {
        self.state.forget(id);
    }

    async fn save(&mut self) -> Result<(), String> {
        self.state.next_serial();
        self.backend
            .write_state(&self.state)
            .await
            .map_err(|e| format!("Failed to write state: {}", e))
    }
}

fn to_resource_state(state: &State, provider: &str) -> ResourceState {
    let mut resource = ResourceState::new(&state.id, provider);
    if let Some(identifier) = &state.identifier {
        resource = resource.with_identifier(identifier);
    }
    for (key, value) in &state.attributes {
        if let Some(json) = value_to_json(value) {
            resource = resource.with_attribute(key, json);
        }
    }
    resource
}

async fn plan_project(file: &Path) -> Result<(Session, Plan), String> {
    let project = ProjectConfig::load(file)?;
    let mut resources = project.resources();
    validate_resources(&resources)?;

    let session = Session::open(&project).await?;
    let current_states = session.refresh().await?;

    for resource in &mut resources {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));
        session
            .provider
            .modify_plan(resource, &current)
            .map_err(|e| e.to_string())?;
    }

    let plan = create_plan(&resources, &current_states, &get_schemas());
    Ok((session, plan))
}

async fn run_plan(file: &Path) -> Result<(), String> {
    let (_, plan) = plan_project(file).await?;
    print_plan(&plan);
    Ok(())
}

async fn apply_effect(session: &mut Session, effect: &Effect) -> ProviderResult<()> {
    match effect {
        Effect::Create(resource) => {
            let state = session.provider.create(resource).await?;
            session.record(&state);
        }
        Effect::Update { id, from, to } => {
            let identifier = from.identifier.as_deref().ok_or_else(|| {
                ProviderError::new("No identifier recorded in state").for_resource(id.clone())
            })?;
            let state = session.provider.update(id, identifier, from, to).await?;
            session.record(&state);
        }
        Effect::Replace { id, from, to, .. } => {
            if let Some(identifier) = &from.identifier {
                session.provider.delete(id, identifier).await?;
                session.forget(id);
            }
            let state = session.provider.create(to).await?;
            session.record(&state);
        }
        Effect::Delete { id, identifier } => {
            session.provider.delete(id, identifier).await?;
            session.forget(id);
        }
        Effect::Read(_) => {}
    }
    Ok(())
}

async fn run_apply(file: &Path) -> Result<(), String> {
    let (mut session, plan) = plan_project(file).await?;

    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan);
    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        match apply_effect(&mut session, effect).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), format_effect(effect));
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                failure_count += 1;
            }
        }
    }

    session.save().await?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

fn confirm(prompt: &str) -> Result<bool, String> {
    print!("{} ", prompt);
    io::stdout().flush().map_err(|e| e.to_string())?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| format!("Failed to read input: {}", e))?;
    Ok(input.trim() == "yes")
}

async fn run_destroy(file: &Path, auto_approve: bool) -> Result<(), String> {
    let project = ProjectConfig::load(file)?;
    let mut session = Session::open(&project).await?;

    if session.state.resources.is_empty() {
        println!("{}", "No sources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for recorded in &session.state.resources {
        println!(
            "  {} {}.{}",
            "-".red().bold(),
            recorded.resource_type.cyan().bold(),
            recorded.name
        );
    }
    println!();

    if !auto_approve
        && !confirm("Do you really want to destroy all sources? Only 'yes' will be accepted:")?
    {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    let mut failure_count = 0;
    let recorded: Vec<ResourceState> = session.state.resources.clone();
    for resource in recorded {
        let id = resource.id();
        let result = match &resource.identifier {
            Some(identifier) => session.provider.delete(&id, identifier).await,
            None => Ok(()),
        };
        match result {
            Ok(()) => {
                println!("  {} delete {}", "✓".green(), id);
                session.forget(&id);
            }
            Err(e) => {
                println!("  {} delete {} - {}", "✗".red(), id, e);
                failure_count += 1;
            }
        }
    }

    session.save().await?;

    if failure_count == 0 {
        println!();
        println!("{}", "Destroy complete!".green().bold());
        Ok(())
    } else {
        Err(format!("{} source(s) could not be destroyed", failure_count))
    }
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "No changes. Sources are up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        match effect {
            Effect::Create(r) => {
                println!("  {} {}", "+".green().bold(), r.id.to_string().cyan().bold());
                for key in sorted_keys(&r.attributes) {
                    println!(
                        "      {}: {}",
                        key,
                        format_value(&r.attributes[key]).green()
                    );
                }
            }
            Effect::Update { id, from, to } => {
                println!("  {} {}", "~".yellow().bold(), id.to_string().cyan().bold());
                print_changes(from, to, &[]);
            }
            Effect::Replace {
                id,
                from,
                to,
                reasons,
            } => {
                println!(
                    "  {} {}",
                    "-/+".magenta().bold(),
                    id.to_string().cyan().bold()
                );
                print_changes(from, to, reasons);
            }
            Effect::Delete { id, .. } => {
                println!("  {} {}", "-".red().bold(), id.to_string().cyan().bold());
            }
            Effect::Read(_) => {}
        }
    }

    println!();
    let summary = plan.summary();
    println!("{}", summary.to_string().bold());

    let destroyed = summary.destroyed();
    if destroyed > 0 {
        println!(
            "{}",
            format!("{} existing source(s) will be destroyed.", destroyed).red()
        );
    }
}

fn print_changes(from: &State, to: &Resource, reasons: &[String]) {
    for key in sorted_keys(&to.attributes) {
        let new = &to.attributes[key];
        let old = from.attributes.get(key).unwrap_or(&Value::Null);
        if old == new {
            continue;
        }
        let note = if reasons.iter().any(|r| r == key) {
            " (forces replacement)".red().to_string()
        } else {
            String::new()
        };
        println!(
            "      {}: {} → {}{}",
            key,
            format_value(old).red(),
            format_value(new).green(),
            note
        );
    }
}

/// Attribute keys with `name` first, internal keys hidden
fn sorted_keys(attributes: &HashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<&String> = attributes.keys().filter(|k| !k.starts_with('_')).collect();
    keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
        ("name", _) => std::cmp::Ordering::Less,
        (_, "name") => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    });
    keys
}

fn format_effect(effect: &Effect) -> String {
    let action = match effect {
        Effect::Create(_) => "create",
        Effect::Update { .. } => "update",
        Effect::Replace { .. } => "replace",
        Effect::Delete { .. } => "delete",
        Effect::Read(_) => "read",
    };
    format!("{} {}", action, effect.resource_id())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut entries: Vec<String> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            entries.sort();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Null => "null".to_string(),
        Value::Unknown => "(known after apply)".to_string(),
    }
}
