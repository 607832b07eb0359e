use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use sweepplot_core::{
    Condition, Conditions, Labels, Metric, Record, SeriesBuilder, evaluate, load_cache,
    parameter_values, worst,
};

use crate::recipes::{RecipeData, RecipeFile};
use crate::render::{JsonSink, OutputFormat, RenderError, SvgSink, TextSink};
use crate::report::{format_evaluation, format_inventory, format_table_row};

#[derive(Parser, Debug)]
#[command(name = "sweepplot")]
#[command(about = "Summaries and comparison charts for parameter-sweep simulation results")]
pub struct Cli {
    /// Results cache to read
    #[arg(short, long, default_value = "results.cache")]
    pub cache: PathBuf,

    /// Recipe file (default: built-in recipes)
    #[arg(short, long)]
    pub recipes: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available recipes
    List,

    /// Run one or more named recipes
    Run {
        #[arg(required = true)]
        recipes: Vec<String>,

        /// Directory for SVG output
        #[arg(short, long, default_value = "plots")]
        out_dir: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
        format: OutputFormat,
    },

    /// Show the values each parameter takes among matching records
    Values {
        /// Filter as key=value (max.key / min.key for bounds)
        #[arg(short = 'w', long = "where")]
        conditions: Vec<Condition>,
    },

    /// Show the matching record with the largest value of a metric
    Worst {
        metric: Metric,

        #[arg(short = 'w', long = "where")]
        conditions: Vec<Condition>,
    },

    /// Mean and standard error of metrics over matching records
    Evaluate {
        #[arg(required = true)]
        metrics: Vec<Metric>,

        #[arg(short = 'w', long = "where")]
        conditions: Vec<Condition>,
    },
}

/// Run the parsed command, printing to stdout
pub fn run(cli: Cli) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Run the parsed command, printing to `out`
pub fn execute<W: Write>(cli: &Cli, out: &mut W) -> color_eyre::Result<()> {
    match &cli.command {
        Command::List => {
            let recipes = load_recipes(cli.recipes.as_deref())?;
            for recipe in &recipes.recipes {
                match &recipe.description {
                    Some(description) => writeln!(out, "{:<24} {description}", recipe.name)?,
                    None => writeln!(out, "{}", recipe.name)?,
                }
            }
        }
        Command::Run {
            recipes: names,
            out_dir,
            format,
        } => {
            let recipes = load_recipes(cli.recipes.as_deref())?;
            // Resolve every name before the (slow) cache load
            let selected = names
                .iter()
                .map(|name| recipes.get(name))
                .collect::<Result<Vec<_>, _>>()?;
            let labels = recipes.to_labels();
            let records = load_records(&cli.cache)?;
            for recipe in selected {
                run_recipe(recipe, &records, &labels, out_dir, *format, out)
                    .wrap_err_with(|| format!("recipe '{}' failed", recipe.name))?;
            }
        }
        Command::Values { conditions } => {
            let records = load_records(&cli.cache)?;
            let conditions = Conditions::from(conditions.clone());
            write!(out, "{}", format_inventory(&parameter_values(&records, &conditions)))?;
        }
        Command::Worst { metric, conditions } => {
            let records = load_records(&cli.cache)?;
            let conditions = Conditions::from(conditions.clone());
            match worst(&records, *metric, &conditions) {
                Some(record) => writeln!(out, "{record}")?,
                None => writeln!(out, "no records match {conditions}")?,
            }
        }
        Command::Evaluate {
            metrics,
            conditions,
        } => {
            let records = load_records(&cli.cache)?;
            let conditions = Conditions::from(conditions.clone());
            let evaluation = evaluate(&records, metrics, &conditions);
            write!(out, "{}", format_evaluation(&conditions.to_string(), &evaluation))?;
        }
    }
    Ok(())
}

fn load_recipes(path: Option<&Path>) -> color_eyre::Result<RecipeFile> {
    let recipes = match path {
        Some(path) => RecipeFile::load(path)
            .wrap_err_with(|| format!("failed to load recipes from {}", path.display()))?,
        None => RecipeFile::builtin()?,
    };
    tracing::debug!(count = recipes.recipes.len(), "Loaded recipes");
    Ok(recipes)
}

fn load_records(path: &Path) -> color_eyre::Result<Vec<Record>> {
    let report = load_cache(path)?;
    if report.records.is_empty() {
        tracing::warn!(path = %path.display(), "Results cache holds no usable records");
    }
    Ok(report.records)
}

fn run_recipe<W: Write>(
    recipe: &RecipeData,
    records: &[Record],
    labels: &Labels,
    out_dir: &Path,
    format: OutputFormat,
    out: &mut W,
) -> color_eyre::Result<()> {
    tracing::info!(recipe = %recipe.name, "Running recipe");

    for chart in &recipe.charts {
        for &metric in &chart.metrics {
            let builder = chart.builder(records, labels, metric)?;
            let path = out_dir.join(format!("{}.svg", chart.file_stem(&recipe.name, metric)));
            emit(builder, format, path, out)?;
        }
    }

    for table in &recipe.tables {
        if let Some(title) = &table.title {
            writeln!(out, "{title}")?;
        }
        for row in &table.rows {
            let conditions = table.conditions.and(&row.conditions);
            let evaluation = evaluate(records, &table.metrics, &conditions);
            if evaluation.matched == 0 {
                tracing::warn!(row = %row.label, conditions = %conditions, "Table row matches no records");
            }
            writeln!(out, "{}", format_table_row(&row.label, &evaluation, table))?;
        }
    }

    for item in &recipe.evaluations {
        let evaluation = evaluate(records, &item.metrics, &item.conditions);
        let header = item
            .header
            .clone()
            .unwrap_or_else(|| item.conditions.to_string());
        writeln!(out, "{}", format_evaluation(&header, &evaluation))?;
    }
    Ok(())
}

fn emit<W: Write>(
    builder: SeriesBuilder<'_>,
    format: OutputFormat,
    svg_path: PathBuf,
    out: &mut W,
) -> Result<(), RenderError> {
    match format {
        OutputFormat::Svg => builder.render(&mut SvgSink::new(svg_path)),
        OutputFormat::Text => builder.render(&mut TextSink::new(&mut *out)),
        OutputFormat::Json => builder.render(&mut JsonSink::new(&mut *out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CACHE: &str = "\
,method=fixed,use_cfb=false,rng_seed=0, 100 0 0 0 5 0 0 0 0.01 0.02 0.03 0.04 0.001
,method=fixed,use_cfb=false,rng_seed=1, 300 0 0 0 5 0.01 0 0 0.01 0.02 0.03 0.04 0.001
,method=mpdm,use_cfb=false,mpdm.samples_n=2,rng_seed=0, 50 5 0 0 6 0 0 0 0.1 0.2 0.3 0.4 0.01
,method=mpdm,use_cfb=true,mpdm.samples_n=4,rng_seed=0, 40 1 0 0 6 0 0 0 0.1 0.2 0.3 0.4 0.01
method=mpdm 1 2 3
";

    const RECIPES: &str = r##"
labels:
  mpdm: MPDM
  "true": CFB
  "false": Normal
recipes:
  - name: mpdm
    description: MPDM by sample count
    charts:
      - metrics: [cost]
        plots:
          - domain: { name: samples_n, values: [2, 4] }
            split: { name: use_cfb, values: ["false", "true"] }
            conditions: [[method, mpdm]]
            label: MPDM
  - name: table
    tables:
      - metrics: [cost, safety]
        decimals: [0, 3]
        rows:
          - label: Fixed
            conditions: [[method, fixed]]
    evaluations:
      - header: fixed runs
        metrics: [cost]
        conditions: [[method, fixed]]
"##;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("results.cache"), CACHE).unwrap();
            std::fs::write(dir.path().join("recipes.yaml"), RECIPES).unwrap();
            Self { dir }
        }

        fn run(&self, args: &[&str]) -> String {
            let cache = self.dir.path().join("results.cache");
            let recipes = self.dir.path().join("recipes.yaml");
            let mut argv = vec![
                "sweepplot".to_string(),
                "--cache".to_string(),
                cache.display().to_string(),
                "--recipes".to_string(),
                recipes.display().to_string(),
            ];
            argv.extend(args.iter().map(|a| a.to_string()));
            let cli = Cli::try_parse_from(argv).unwrap();

            let mut out = Vec::new();
            execute(&cli, &mut out).unwrap();
            String::from_utf8(out).unwrap()
        }
    }

    #[test]
    fn test_list() {
        let fixture = Fixture::new();
        let text = fixture.run(&["list"]);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("mpdm "));
        assert!(lines[0].ends_with("MPDM by sample count"));
        assert_eq!(lines[1], "table");
    }

    #[test]
    fn test_run_table_and_evaluation() {
        let fixture = Fixture::new();
        let text = fixture.run(&["run", "table"]);
        assert!(text.contains("Fixed & 200 & 0.005\n"));
        assert!(text.contains("fixed runs:\n  cost has mean:    200 and mean std dev:    100\n"));
    }

    #[test]
    fn test_run_chart_as_text() {
        let fixture = Fixture::new();
        let text = fixture.run(&["run", "mpdm", "--format", "text"]);
        assert!(text.contains("MPDM, Normal\n"));
        assert!(text.contains("MPDM, CFB\n"));
        assert!(text.contains("(1 without data)"));
    }

    #[test]
    fn test_run_chart_as_svg() {
        let fixture = Fixture::new();
        let out_dir = fixture.dir.path().join("plots");
        fixture.run(&["run", "mpdm", "--out-dir", &out_dir.display().to_string()]);
        assert!(out_dir.join("mpdm-cost.svg").exists());
    }

    #[test]
    fn test_values_and_worst() {
        let fixture = Fixture::new();

        let text = fixture.run(&["values", "--where", "method=mpdm"]);
        assert!(text.starts_with("2 matching records\n"));
        assert!(text.contains("use_cfb: false, true\n"));

        let text = fixture.run(&["worst", "cost", "--where", "method=fixed"]);
        assert!(text.starts_with("method=fixed,rng_seed=1,use_cfb=false "));
    }

    #[test]
    fn test_evaluate() {
        let fixture = Fixture::new();
        let text = fixture.run(&["evaluate", "cost", "95_ts", "-w", "method=mpdm", "-w", "max.samples_n=2"]);
        assert!(text.starts_with("method=mpdm,max.samples_n=2:\n"));
        assert!(text.contains("  cost has mean:     55 and mean std dev:      0\n"));
        assert!(text.contains("  95_ts has mean:    0.2 and mean std dev:      0\n"));
    }

    #[test]
    fn test_unknown_recipe_fails() {
        let fixture = Fixture::new();
        let cli = Cli::try_parse_from([
            "sweepplot",
            "--recipes",
            &fixture.dir.path().join("recipes.yaml").display().to_string(),
            "run",
            "missing",
        ])
        .unwrap();
        let mut out = Vec::new();
        assert!(execute(&cli, &mut out).is_err());
    }
}
