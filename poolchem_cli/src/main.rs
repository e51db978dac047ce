use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use poolchem_core::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poolchem")]
#[command(about = "Pool water chemistry analysis and dosing planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $POOLCHEM_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate readings and print adjustments, dosing plan and water balance
    Analyze {
        /// Pool type (chlorine, saltwater, bromine)
        #[arg(long)]
        pool_type: Option<String>,

        /// Pool volume in gallons
        #[arg(long)]
        volume: Option<f64>,

        /// JSON or TOML file of parameter readings
        #[arg(long)]
        readings: Option<PathBuf>,

        /// Single reading, e.g. --reading ph=7.2 (repeatable, overrides the file)
        #[arg(long = "reading", value_parser = parse_reading)]
        reading: Vec<(String, f64)>,

        /// Plan start time (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_start)]
        start: Option<DateTime<Utc>>,
    },

    /// Compute the Langelier Saturation Index
    Balance {
        #[arg(long)]
        ph: f64,

        /// Total alkalinity in ppm
        #[arg(long)]
        alkalinity: f64,

        /// Calcium hardness in ppm
        #[arg(long)]
        hardness: f64,

        /// Water temperature in °F
        #[arg(long)]
        temperature: Option<f64>,

        /// Total dissolved solids in ppm
        #[arg(long)]
        tds: Option<f64>,
    },

    /// Report which of the given products must not be mixed
    Compat {
        #[arg(required = true)]
        products: Vec<String>,
    },

    /// List the catalog, or validate it
    Catalog {
        #[arg(long)]
        validate: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    poolchem_core::logging::init_for_verbosity(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Analyze {
            pool_type,
            volume,
            readings,
            reading,
            start,
        } => cmd_analyze(&config, pool_type, volume, readings, reading, start),
        Commands::Balance {
            ph,
            alkalinity,
            hardness,
            temperature,
            tds,
        } => cmd_balance(&config, ph, alkalinity, hardness, temperature, tds),
        Commands::Compat { products } => cmd_compat(&config, &products),
        Commands::Catalog { validate } => cmd_catalog(&config, validate),
    }
}

fn parse_reading(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PARAMETER=VALUE, got '{}'", s))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for '{}': {}", key, e))?;
    Ok((key.trim().to_string(), value))
}

fn parse_start(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", s, e))
}

/// A plan step placed on the wall clock
#[derive(Serialize)]
struct ScheduledStep<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    step: &'a SequenceStep,
}

#[derive(Serialize)]
struct AnalyzeReport<'a> {
    start: DateTime<Utc>,
    pool_type: &'a str,
    pool_volume: f64,
    adjustments: &'a Adjustments,
    schedule: Vec<ScheduledStep<'a>>,
    total_hours: u32,
    water_balance: &'a Option<WaterBalanceResult>,
}

fn cmd_analyze(
    config: &Config,
    pool_type: Option<String>,
    volume: Option<f64>,
    readings_path: Option<PathBuf>,
    reading: Vec<(String, f64)>,
    start: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut readings = match &readings_path {
        Some(path) => load_readings(path)?,
        None => Readings::new(),
    };
    readings.extend(reading);

    if readings.is_empty() {
        return Err(Error::Validation(
            "No readings given; use --readings FILE or --reading PARAMETER=VALUE".into(),
        ));
    }

    let pool_type = pool_type.unwrap_or_else(|| config.pool.pool_type.clone());
    let volume = volume.unwrap_or(config.pool.volume_gallons);

    let analyzer = PoolAnalyzer::from_config(config)?;
    let analysis = analyzer.analyze(&pool_type, volume, &readings)?;

    let start = start.unwrap_or_else(Utc::now);
    let schedule = analysis
        .plan
        .iter()
        .map(|step| ScheduledStep {
            at: start + Duration::hours(i64::from(step.offset_hours)),
            step,
        })
        .collect();

    let report = AnalyzeReport {
        start,
        pool_type: &analysis.pool_type,
        pool_volume: analysis.pool_volume,
        adjustments: &analysis.adjustments,
        schedule,
        total_hours: analysis.plan.total_hours(),
        water_balance: &analysis.water_balance,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_balance(
    config: &Config,
    ph: f64,
    alkalinity: f64,
    hardness: f64,
    temperature: Option<f64>,
    tds: Option<f64>,
) -> Result<()> {
    let evaluator = WaterBalanceEvaluator::new(config.balance.invalid_input);
    let sample = WaterSample {
        ph,
        alkalinity,
        calcium_hardness: hardness,
        temperature_f: temperature.unwrap_or(config.balance.default_temperature_f),
        tds,
    };

    let result = evaluator.evaluate_sample(&sample)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_compat(config: &Config, products: &[String]) -> Result<()> {
    let analyzer = PoolAnalyzer::from_config(config)?;

    for id in products {
        if analyzer.catalog().products().get(id).is_none() {
            tracing::warn!("Unknown product '{}'", id);
        }
    }

    let report = analyzer.check_compatibility(products);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_catalog(config: &Config, validate: bool) -> Result<()> {
    if validate {
        let errors = Catalog::check_files(
            config.catalog.parameters_path.as_deref(),
            config.catalog.products_path.as_deref(),
        )?;
        if !errors.is_empty() {
            eprintln!("Catalog validation errors:");
            for error in &errors {
                eprintln!("  - {}", error);
            }
            return Err(Error::Configuration(format!(
                "Invalid catalog ({} problems)",
                errors.len()
            )));
        }
    }

    let analyzer = PoolAnalyzer::from_config(config)?;
    let catalog = analyzer.catalog();

    if validate {
        println!(
            "✓ Catalog is valid ({} parameters, {} products)",
            catalog.parameters().len(),
            catalog.products().len()
        );
        return Ok(());
    }

    println!("Pool types: {}", catalog.parameters().pool_types().join(", "));
    println!();
    println!("Parameters:");
    for parameter in catalog.parameters().iter() {
        let ranges: Vec<String> = catalog
            .parameters()
            .pool_types()
            .iter()
            .map(|pool_type| {
                let range = parameter.range_for(pool_type);
                format!("{} {}-{}", pool_type, range.min, range.max)
            })
            .collect();
        println!(
            "  {:<18} {} [{}] ({})",
            parameter.id,
            parameter.name,
            parameter.unit,
            ranges.join(", ")
        );
    }
    println!();
    println!("Products:");
    for product in catalog.products().iter() {
        println!("  {:<22} {} [{}]", product.id, product.name, product.unit);
        let partners = catalog.products().incompatibilities().partners_of(&product.id);
        if !partners.is_empty() {
            println!("  {:<22} ⚠ do not mix with: {}", "", partners.join(", "));
        }
    }
    Ok(())
}
