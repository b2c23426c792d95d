// ==============================================================================
// main.rs - AGV Proxy Catalog Entry Point
// ==============================================================================
// Description: Command-line front end: one variant query per invocation
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agv_catalog::config::{AppConfig, LocationMap};
use agv_catalog::fetcher::{Dataset, HttpTransport, LocalTableSource, RemoteTableFetcher, TableSource, Transport};
use agv_catalog::models::TIME_BINS;
use agv_catalog::output::{join_metrics, OutputFormat, ReportExporter};
use agv_catalog::resolver::{ChromosomeLookup, RemoteChromosomeLookup, VariantQuery};
use agv_catalog::{AgvError, QueryProcessor, QueryReport, ReferenceData};

#[derive(Parser, Debug)]
#[command(author, version, about = "Look up ancient genotyped variants and their LD proxies", long_about = None)]
struct Args {
    /// Chromosome (1-22 or X, optional "chr" prefix); requires --pos
    #[arg(long = "chr")]
    chromosome: Option<String>,

    /// 1-based position (hg38); requires --chr
    #[arg(long = "pos")]
    position: Option<String>,

    /// rsID (instead of --chr/--pos)
    #[arg(long)]
    rsid: Option<String>,

    /// JSON configuration file
    #[arg(short, long, env = "AGV_CONFIG")]
    config: Option<PathBuf>,

    /// Read LD tables and genotype matrices from this directory instead of downloading
    #[arg(long, env = "AGV_LOCAL_DATA")]
    local_data: Option<PathBuf>,

    /// Override the remote base URL
    #[arg(long, env = "AGV_BASE_URL")]
    base_url: Option<String>,

    /// Gzipped rsID -> chromosome table used for non-AGV rsIDs
    #[arg(long, env = "AGV_RSID_CHROMOSOME_URL")]
    rsid_chromosome_url: Option<String>,

    /// Directory for exported artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Export formats (csv, json); requires --output-dir
    #[arg(short, long, value_delimiter = ',', value_parser = parse_format, default_value = "csv")]
    format: Vec<OutputFormat>,
}

fn parse_format(value: &str) -> std::result::Result<OutputFormat, String> {
    match value.to_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        other => Err(format!("unknown format '{}' (expected csv or json)", other)),
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agv_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AgvError>() {
                Some(agv_error) if agv_error.is_input_error() => eprintln!("{}", agv_error),
                _ => eprintln!("An error occurred: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => AppConfig::default(),
    };

    if let Some(dir) = &args.local_data {
        config.local_data_dir = Some(dir.clone());
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(url) = &args.rsid_chromosome_url {
        config.rsid_chromosome_url = Some(url.clone());
    }

    Ok(config)
}

fn table_source(
    config: &AppConfig,
    dataset: Dataset,
    locations: LocationMap,
    transport: &Arc<dyn Transport>,
) -> Box<dyn TableSource> {
    match &config.local_data_dir {
        Some(dir) => Box::new(LocalTableSource::new(dataset, dir, locations)),
        None => Box::new(RemoteTableFetcher::new(
            dataset,
            config.base_url.clone(),
            locations,
            Arc::clone(transport),
        )),
    }
}

fn run(args: Args) -> Result<()> {
    // Validate before loading anything
    let query = VariantQuery::from_inputs(
        args.chromosome.as_deref(),
        args.position.as_deref(),
        args.rsid.as_deref(),
    )?;
    let config = load_config(&args)?;

    info!("AGV catalog starting for {}", query);

    let reference = ReferenceData::load(&config).context("Failed to load reference data")?;
    let ld_locations = LocationMap::from_file(&config.ld_locations)
        .with_context(|| format!("Failed to load LD locations from {:?}", config.ld_locations))?;
    let genotype_locations = LocationMap::from_file(&config.genotype_locations).with_context(|| {
        format!("Failed to load genotype locations from {:?}", config.genotype_locations)
    })?;

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
    let ld_source = table_source(&config, Dataset::LdTable, ld_locations, &transport);
    let genotype_source = table_source(&config, Dataset::GenotypeMatrix, genotype_locations, &transport);

    let lookup: Option<RemoteChromosomeLookup> = config
        .rsid_chromosome_url
        .as_ref()
        .map(|url| RemoteChromosomeLookup::new(url.clone(), Arc::clone(&transport)));

    let processor = QueryProcessor::new(
        &reference,
        &*ld_source,
        &*genotype_source,
        lookup.as_ref().map(|l| l as &dyn ChromosomeLookup),
    );
    let report = processor.process(&query)?;

    print_report(&report);

    if let Some(dir) = &args.output_dir {
        let written = ReportExporter::new(dir).generate(&report, &args.format)?;
        for (format, paths) in written {
            for path in paths {
                info!("Exported {:?}: {:?}", format, path);
            }
        }
    }

    Ok(())
}

/// Tab-separated rendering of the report on stdout
fn print_report(report: &QueryReport) {
    println!("{}", report.message);

    if let Some(summary) = &report.summary {
        let record = &summary.record;
        println!();
        println!("AGV_chr\tAGV_pos\tAGV_rsID\tAGV_ref\tAGV_alt");
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.chromosome, record.position, record.rsid, record.ref_allele, record.alt_allele
        );

        if !summary.archaic.is_empty() {
            println!();
            let names: Vec<&str> = summary.archaic.keys().map(|h| h.name()).collect();
            let genotypes: Vec<&str> = summary.archaic.values().map(String::as_str).collect();
            println!("{}", names.join("\t"));
            println!("{}", genotypes.join("\t"));
        }

        println!();
        println!("Alt allele frequency (samples) across {} time bins", TIME_BINS.len());
        print!("{}", summary.frequencies);
    }

    if let Some(proxies) = report.proxies.as_deref().filter(|p| !p.is_empty()) {
        println!();
        println!("chr\tLDV_pos\tLDV_rsID\tLDV_ref\tLDV_alt\tAGV_pos\tAGV_rsID\tAGV_ref\tAGV_alt\tpopulations\tr2\tD'\tcorr");
        for p in proxies {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                p.chromosome,
                p.ldv_pos,
                p.ldv_rsid,
                p.ldv_ref,
                p.ldv_alt,
                p.agv_pos,
                p.agv_rsid,
                p.agv_ref,
                p.agv_alt,
                p.populations.join(","),
                join_metrics(&p.r2),
                join_metrics(&p.d_prime),
                join_metrics(&p.corr)
            );
        }
    }
}
