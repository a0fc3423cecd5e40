use clap::{Args, Parser, Subcommand};
use hf_analysis::{Better, ComparisonResult, FlowPathResult, OperatingPoint, PathComparison, RestrictionReport};
use hf_app::{AnalysisEngine, AppError, AppResult, project_service};
use hf_project::Project;
use hf_results::{FileStore, ResultStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "HydraFlow CLI - Hydraulic schematic flow analysis", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Directory to persist results in between runs
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file, configuration and every schematic
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// List schematics in a project
    Schematics {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Component and connection overview of one schematic
    Summary {
        project_path: PathBuf,
        schematic_id: String,
    },
    /// Trace and analyse the flow path between two components
    Path {
        project_path: PathBuf,
        schematic_id: String,
        start: String,
        end: String,
        #[command(flatten)]
        point: PointArgs,
    },
    /// Detect restrictions across a whole schematic
    Restrictions {
        project_path: PathBuf,
        schematic_id: String,
        #[command(flatten)]
        point: PointArgs,
    },
    /// Show everything upstream and downstream of a component
    Impact {
        project_path: PathBuf,
        schematic_id: String,
        component_id: String,
    },
    /// Compare two machines at the same flow rate
    Compare {
        project_path: PathBuf,
        first_id: String,
        second_id: String,
        #[command(flatten)]
        point: PointArgs,
    },
    /// Compare the same start/end path on two machines
    ComparePaths {
        project_path: PathBuf,
        first_id: String,
        second_id: String,
        start: String,
        end: String,
        #[command(flatten)]
        point: PointArgs,
    },
}

/// Operating point: a named one from the project, or explicit values.
#[derive(Args)]
struct PointArgs {
    /// Named operating point from the project
    #[arg(long, conflicts_with_all = ["flow", "pressure"])]
    point: Option<String>,
    /// Flow rate in LPM
    #[arg(long)]
    flow: Option<f64>,
    /// System pressure in bar
    #[arg(long)]
    pressure: Option<f64>,
}

struct Session {
    engine: AnalysisEngine,
    project: Project,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = cli.store.as_deref();
    let json = cli.json;

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Schematics { project_path } => cmd_schematics(&project_path, json),
        Commands::Summary {
            project_path,
            schematic_id,
        } => {
            let s = open(&project_path, store)?;
            let summary = s.engine.analyze_schematic(&schematic_id)?;
            emit(json, &summary, |summary| {
                println!(
                    "{} - {} (v{}, {} components, {} relationships)",
                    summary.info.schematic_id,
                    summary.info.machine_name,
                    summary.info.version,
                    summary.info.component_count,
                    summary.relationship_count
                );
                for (kind, n) in &summary.components_by_type {
                    println!("  {:<12} {n}", kind.as_str());
                }
                println!("  sources:  {}", summary.sources.join(", "));
                println!("  sinks:    {}", summary.sinks.join(", "));
                if !summary.isolated.is_empty() {
                    println!("  isolated: {}", summary.isolated.join(", "));
                }
                for d in &summary.diagnostics {
                    println!("  ! {d}");
                }
            })
        }
        Commands::Path {
            project_path,
            schematic_id,
            start,
            end,
            point,
        } => {
            let s = open(&project_path, store)?;
            let op = s.resolve_point(&point)?;
            let result = s.engine.find_flow_path_at(&schematic_id, &start, &end, &op)?;
            emit(json, &result, print_path)
        }
        Commands::Restrictions {
            project_path,
            schematic_id,
            point,
        } => {
            let s = open(&project_path, store)?;
            let flow = s.resolve_flow(&point)?;
            let report = s.engine.analyze_restrictions(&schematic_id, flow)?;
            emit(json, &report, print_report)
        }
        Commands::Impact {
            project_path,
            schematic_id,
            component_id,
        } => {
            let s = open(&project_path, store)?;
            let impact = s.engine.get_component_impact(&schematic_id, &component_id)?;
            emit(json, &impact, |impact| {
                println!("Impact of {}:", impact.component_id);
                println!("  upstream ({}):   {}", impact.upstream.len(), join(&impact.upstream));
                println!("  downstream ({}): {}", impact.downstream.len(), join(&impact.downstream));
                for n in &impact.immediate_upstream {
                    println!("  <- {} ({})", n.component_id, n.connection_type.as_str());
                }
                for n in &impact.immediate_downstream {
                    println!("  -> {} ({})", n.component_id, n.connection_type.as_str());
                }
                if impact.truncated {
                    println!("  (depth limit reached, sets may be incomplete)");
                }
            })
        }
        Commands::Compare {
            project_path,
            first_id,
            second_id,
            point,
        } => {
            let s = open(&project_path, store)?;
            let flow = s.resolve_flow(&point)?;
            let cmp = s.engine.compare_machines(&first_id, &second_id, flow)?;
            emit(json, &cmp, print_comparison)
        }
        Commands::ComparePaths {
            project_path,
            first_id,
            second_id,
            start,
            end,
            point,
        } => {
            let s = open(&project_path, store)?;
            let op = s.resolve_point(&point)?;
            let first = s.engine.find_flow_path_at(&first_id, &start, &end, &op)?;
            let second = s.engine.find_flow_path_at(&second_id, &start, &end, &op)?;
            let cmp = s.engine.compare_flow_paths(&first, &second);
            emit(json, &cmp, |cmp| print_path_comparison(&first_id, &second_id, cmp))
        }
    }
}

fn open(project_path: &Path, store_dir: Option<&Path>) -> AppResult<Session> {
    let project = project_service::load_project(project_path)?;
    let store: Option<Arc<dyn ResultStore>> = match store_dir {
        Some(dir) => Some(Arc::new(FileStore::new(dir.to_path_buf())?)),
        None => None,
    };
    let engine = project_service::engine_for_project(&project, store)?;
    Ok(Session { engine, project })
}

impl Session {
    fn resolve_point(&self, args: &PointArgs) -> AppResult<OperatingPoint> {
        if let Some(id) = &args.point {
            return project_service::operating_point(&self.project, id);
        }
        match (args.flow, args.pressure) {
            (Some(flow), Some(pressure)) => Ok(OperatingPoint::new(flow, pressure)?),
            _ => Err(AppError::Configuration(
                "give --point, or both --flow (LPM) and --pressure (bar)".to_string(),
            )),
        }
    }

    fn resolve_flow(&self, args: &PointArgs) -> AppResult<f64> {
        if let Some(id) = &args.point {
            return Ok(project_service::operating_point(&self.project, id)?.flow_lpm());
        }
        args.flow.ok_or_else(|| {
            AppError::Configuration("give --point or --flow (LPM)".to_string())
        })
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> AppResult<()> {
    if json {
        let text =
            serde_json::to_string_pretty(value).map_err(|e| AppError::Results(e.to_string()))?;
        println!("{text}");
    } else {
        human(value);
    }
    Ok(())
}

fn join<'a>(ids: impl IntoIterator<Item = &'a String>) -> String {
    ids.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_schematics(project_path: &Path, json: bool) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let schematics = project_service::list_schematics(&project);
    emit(json, &schematics, |schematics| {
        if schematics.is_empty() {
            println!("No schematics found in project");
            return;
        }
        println!("Schematics in project:");
        for s in schematics {
            println!(
                "  {} - {} ({} components, {} relationships)",
                s.id, s.machine_name, s.component_count, s.relationship_count
            );
        }
    })
}

fn print_path(r: &FlowPathResult) {
    println!(
        "{} v{}: {} at {:.1} LPM / {:.1} bar",
        r.schematic_id,
        r.version,
        r.path.join(" -> "),
        r.flow_rate_lpm,
        r.system_pressure_bar
    );
    println!(
        "  {:<8} {:<11} {:>5} {:>8} {:>8} {:>9} {:<12} {:>9} {:>6}",
        "id", "type", "K", "d [mm]", "v [m/s]", "Re", "regime", "dP [bar]", "%"
    );
    for d in &r.component_drops {
        println!(
            "  {:<8} {:<11} {:>5.2} {:>8.2} {:>8.2} {:>9.0} {:<12} {:>9.3} {:>6.1}",
            d.component_id,
            d.component_type.as_str(),
            d.k_factor,
            d.diameter_m * 1000.0,
            d.velocity_mps,
            d.reynolds,
            d.regime.to_string(),
            d.pressure_drop_bar,
            d.percent_of_total
        );
    }
    println!(
        "  cumulative drop: {:.3} bar ({:.1} psi), efficiency {:.1}%",
        r.cumulative_drop_bar,
        r.cumulative_drop_psi,
        r.efficiency_percent()
    );
    if let Some(b) = &r.bottleneck {
        println!("  bottleneck: {b}");
    }
    for x in &r.restrictions {
        println!("  [{}] {} {}: {}", x.severity, x.kind, x.target, x.detail);
    }
    for w in &r.warnings {
        println!("  ! {w}");
    }
}

fn print_report(r: &RestrictionReport) {
    println!(
        "{} v{} at {:.1} LPM: {} components, {} HIGH / {} MEDIUM / {} LOW",
        r.schematic_id,
        r.version,
        r.flow_rate_lpm,
        r.evaluated_components,
        r.counts.high,
        r.counts.medium,
        r.counts.low
    );
    for x in &r.restrictions {
        println!("  [{}] {} {}: {}", x.severity, x.kind, x.target, x.detail);
    }
    for w in &r.warnings {
        println!("  ! {w}");
    }
}

fn print_comparison(c: &ComparisonResult) {
    println!(
        "{} vs {} at {:.1} LPM",
        c.a.schematic_id, c.b.schematic_id, c.flow_rate_lpm
    );
    println!("  only in {}: {}", c.a.schematic_id, join(&c.only_in_a));
    println!("  only in {}: {}", c.b.schematic_id, join(&c.only_in_b));
    println!("  common: {}", c.common.len());
    for m in &c.type_mismatches {
        println!("  ! {} is {} vs {}", m.component_id, m.type_a, m.type_b);
    }
    println!(
        "  components: {} vs {} ({:+})",
        c.a.component_count, c.b.component_count, c.component_count_delta
    );
    println!(
        "  restrictions: {} vs {} ({:+}); HIGH {} vs {}",
        c.a.restriction_count,
        c.b.restriction_count,
        c.restriction_count_delta,
        c.a.by_severity.high,
        c.b.by_severity.high
    );
}

fn print_path_comparison(first: &str, second: &str, c: &PathComparison) {
    let name = |b: Better| match b {
        Better::First => first,
        Better::Second => second,
    };
    println!("{first}: {}", c.first_path.join(" -> "));
    println!("{second}: {}", c.second_path.join(" -> "));
    println!(
        "  cumulative drop: {:.3} vs {:.3} bar, better: {}",
        c.cumulative_drop_bar.first,
        c.cumulative_drop_bar.second,
        name(c.cumulative_drop_bar.better)
    );
    println!(
        "  efficiency: {:.1}% vs {:.1}%, better: {}",
        c.efficiency.first * 100.0,
        c.efficiency.second * 100.0,
        name(c.efficiency.better)
    );
    println!(
        "  restrictions: {} vs {}, better: {}",
        c.restriction_count.first,
        c.restriction_count.second,
        name(c.restriction_count.better)
    );
    println!("  overall better: {}", name(c.better));
}
