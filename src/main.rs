use careseek::cli::{Cli, Commands, ConfigAction, PageTarget, Requirement};
use careseek::config::Config;
use careseek::error::{CareseekError, Result};
use careseek::filtering::{BooleanFacet, MultiFacet, SortKey};
use careseek::orchestrator::{Orchestrator, RequestMode, RunReport};
use careseek::provider::SearchCriteria;
use careseek::services::ServiceSet;
use careseek::session::{mount, MountOutcome, PersistenceBridge};
use careseek::store::ResultStore;
use careseek::view::ResultPage;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Config { action } => cmd_config(cli.config, cli.profile, action),
        command => {
            let config = load_config(cli.config, cli.profile)?;
            let mut store = open_result_store(&config)?;
            run_command(&config, &mut store, command).await
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "careseek=debug" } else { "careseek=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_command(config: &Config, store: &mut ResultStore, command: Commands) -> Result<()> {
    match command {
        Commands::Search {
            state,
            city,
            description,
            specialty,
            radius,
            assessment_only,
            json,
        } => {
            let mut criteria = SearchCriteria::new(state.to_uppercase(), city, description);
            if let Some(specialty) = specialty {
                criteria = criteria.with_taxonomy(specialty);
            }
            if let Some(radius) = radius {
                criteria = criteria.with_radius(radius);
            }
            let mode = if assessment_only {
                RequestMode::AssessmentOnly
            } else {
                RequestMode::Full
            };

            let mut orchestrator = new_orchestrator(config)?;
            let report = search(&mut orchestrator, criteria, mode, store).await?;
            print_report(&report);
            print_current(store, json)
        }
        Commands::Show { json } => {
            mount_view(config, store).await?;
            print_current(store, json)
        }
        Commands::Filter {
            term,
            board_certified,
            accepting,
            language,
            insurance,
            specialty,
            sort,
            page_size,
            clear,
        } => {
            mount_view(config, store).await?;
            cmd_filter(
                store,
                FilterArgs {
                    term,
                    board_certified,
                    accepting,
                    language,
                    insurance,
                    specialty,
                    sort,
                    page_size,
                    clear,
                },
            );
            print_page(store, false);
            Ok(())
        }
        Commands::Page { target } => {
            mount_view(config, store).await?;
            match target {
                PageTarget::Next => store.next_page(),
                PageTarget::Previous => store.previous_page(),
                PageTarget::Number(page) => store.go_to_page(page),
            }
            print_page(store, false);
            Ok(())
        }
        Commands::Assessment => {
            mount_view(config, store).await?;
            print_assessment(store);
            Ok(())
        }
        Commands::Links { name } => {
            mount_view(config, store).await?;
            match store.links().get(&name) {
                Some(links) => {
                    println!("Links for {}:", name);
                    for link in links {
                        match &link.kind {
                            Some(kind) => println!("  [{}] {} <{}>", kind, link.title, link.url),
                            None => println!("  {} <{}>", link.title, link.url),
                        }
                    }
                }
                None => println!("No supplemental links for '{}'", name),
            }
            Ok(())
        }
        Commands::Specialists => {
            mount_view(config, store).await?;
            let mut orchestrator = new_orchestrator(config)?;
            orchestrator.resume_from(store);

            let report = orchestrator.show_specialists(store).await?;
            print_report(&report);
            print_page(store, false);
            Ok(())
        }
        Commands::Reset => {
            store.bridge().clear()?;
            println!("✓ Saved results cleared ({})", store.bridge().describe());
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn new_orchestrator(config: &Config) -> Result<Orchestrator> {
    let services = ServiceSet::from_config(&config.services)?;
    Ok(Orchestrator::new(services, config.orchestrator_settings()?))
}

async fn search(
    orchestrator: &mut Orchestrator,
    criteria: SearchCriteria,
    mode: RequestMode,
    store: &mut ResultStore,
) -> Result<RunReport> {
    match orchestrator.run(criteria, mode, store).await {
        Ok(report) => Ok(report),
        Err(e) => {
            if let Some(criteria) = e.criteria() {
                eprintln!("✗ {}", e);
                eprintln!(
                    "  Retry with: careseek search --state {} --city {:?} --description {:?}",
                    criteria.state, criteria.city, criteria.description
                );
            }
            Err(e.into())
        }
    }
}

/// Restore the saved view, or search with the default criteria
async fn mount_view(config: &Config, store: &mut ResultStore) -> Result<()> {
    match mount(store, None, &config.default_criteria()) {
        MountOutcome::Fresh | MountOutcome::Restored => Ok(()),
        MountOutcome::NeedsFetch(criteria) => {
            let mut orchestrator = new_orchestrator(config)?;
            let report = search(&mut orchestrator, criteria, RequestMode::Full, store).await?;
            print_report(&report);
            Ok(())
        }
    }
}

struct FilterArgs {
    term: Option<String>,
    board_certified: Option<Requirement>,
    accepting: Option<Requirement>,
    language: Vec<String>,
    insurance: Vec<String>,
    specialty: Vec<String>,
    sort: Option<SortKey>,
    page_size: Option<usize>,
    clear: bool,
}

fn cmd_filter(store: &mut ResultStore, args: FilterArgs) {
    if args.clear {
        store.reset_filters();
    }
    if let Some(term) = args.term {
        store.set_term(&term);
    }
    if let Some(requirement) = args.board_certified {
        store.set_boolean_facet(BooleanFacet::BoardCertified, requirement.as_filter());
    }
    if let Some(requirement) = args.accepting {
        store.set_boolean_facet(BooleanFacet::AcceptingPatients, requirement.as_filter());
    }
    for (facet, values) in [
        (MultiFacet::Language, args.language),
        (MultiFacet::Insurance, args.insurance),
        (MultiFacet::Specialty, args.specialty),
    ] {
        for value in values {
            let selected = store.toggle_facet_value(facet, &value);
            tracing::debug!("{:?} '{}' selected: {}", facet, value, selected);
        }
    }
    if let Some(sort) = args.sort {
        store.set_sort(sort);
    }
    if let Some(page_size) = args.page_size {
        store.set_page_size(page_size);
    }
}

fn print_report(report: &RunReport) {
    for failure in &report.failures {
        println!("⚠ {}: {}", failure.kind, failure.message);
    }
    if report.mode == RequestMode::Full {
        println!(
            "✓ {} providers ({} reported by the directory)",
            report.providers, report.directory_total
        );
    }
}

fn print_current(store: &ResultStore, json: bool) -> Result<()> {
    if store.mode() == RequestMode::AssessmentOnly {
        print_assessment(store);
        println!("\nRun 'careseek specialists' to find providers.");
        return Ok(());
    }

    if json {
        let page = store.page();
        let out = serde_json::to_string_pretty(&page).map_err(|e| CareseekError::Json {
            source: e,
            context: "Failed to serialize result page".to_string(),
        })?;
        println!("{}", out);
    } else {
        print_page(store, true);
    }
    Ok(())
}

fn print_page(store: &ResultStore, with_header: bool) {
    if with_header {
        if let Some(criteria) = store.criteria() {
            println!("{}", criteria.label());
        }
    }

    let page = store.page();
    print_entries(&page);

    if !store.filter().is_unfiltered() {
        println!("  (filtered: {} of {} providers)", page.total_matches, page.total_results);
    }
}

fn print_entries(page: &ResultPage<'_>) {
    if !page.ranking.is_ranked() {
        println!("Results are unranked (ranking service unavailable)");
    }

    if page.is_empty() {
        println!("No providers match.");
    }

    for entry in &page.entries {
        let p = entry.provider;
        println!(
            "{:>3}. [{:<2}] {} | {} | {}",
            entry.rank,
            entry.grade,
            p.name,
            p.specialty,
            p.address.one_line()
        );

        let mut details = Vec::new();
        if let Some(rating) = p.rating {
            details.push(format!("rating {:.1}", rating));
        }
        if let Some(years) = p.years_experience {
            details.push(format!("{} yrs", years));
        }
        if p.board_certified {
            details.push("board certified".to_string());
        }
        if p.accepting_patients {
            details.push("accepting patients".to_string());
        }
        if let Some(phone) = &p.contact.phone {
            details.push(phone.clone());
        }
        if !details.is_empty() {
            println!("       {}", details.join(" · "));
        }
    }

    println!(
        "Page {} of {} ({} per page)",
        page.page,
        page.total_pages.max(1),
        page.page_size
    );
}

fn print_assessment(store: &ResultStore) {
    let profile = store.profile();
    println!("Assessment");
    println!("==========");
    println!("{}", profile.summary());

    if let Some(specialty) = &profile.specialty {
        println!("\nSuggested specialty: {}", specialty);
    }

    if !profile.supporting_evidence.is_empty() {
        println!("\nSupporting evidence:");
        for evidence in &profile.supporting_evidence {
            match &evidence.url {
                Some(url) => println!("  - {} <{}>", evidence.title, url),
                None => println!("  - {}", evidence.title),
            }
        }
    }
}

fn open_result_store(config: &Config) -> Result<ResultStore> {
    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir).map_err(|e| CareseekError::Io {
        source: e,
        context: format!("Failed to create data directory: {:?}", data_dir),
    })?;

    let backend = careseek::storage::open_store(&config.storage, &data_dir)?;
    Ok(ResultStore::new(
        PersistenceBridge::new(backend),
        config.search.page_size,
    ))
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, profile)?;
            let value = toml::Value::try_from(&config)?;

            let shown = match section {
                Some(section) => value.get(&section).cloned().ok_or_else(|| {
                    CareseekError::Config(format!("Unknown config section '{}'", section))
                })?,
                None => value,
            };

            println!("{}", toml::to_string_pretty(&shown)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::debug!(
            "Config file not found, using defaults. Run 'careseek config init' to create one."
        );
    }

    let mut config = Config::load_or_default(&path)?;
    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }
    Ok(config)
}
