use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use sqldrift::config::load_from_file;
use sqldrift::{
    compare_sources, critical_issues, read_source_file, CompareConfig, ComparisonResult,
    ComparisonSummary, SchemaObject,
};

fn build_cli() -> Command {
    Command::new("sqldrift")
        .about("sqldrift: structural drift detection between SQL sources")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("extract")
                .about("List the schema objects defined in a SQL file")
                .arg(Arg::new("file").required(true).help("SQL file to parse"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the extracted objects as JSON"),
                ),
        )
        .subcommand(
            Command::new("compare")
                .about("Compare reference SQL files against candidate SQL files")
                .arg(
                    Arg::new("source")
                        .short('s')
                        .long("source")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .help("Reference SQL files"),
                )
                .arg(
                    Arg::new("candidate")
                        .short('c')
                        .long("candidate")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .help("Candidate SQL files"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("JSON file with comparison settings"),
                )
                .arg(
                    Arg::new("ignore-whitespace")
                        .long("ignore-whitespace")
                        .action(ArgAction::SetTrue)
                        .help("Do not report layout-only differences in clauses and conditions"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print results and summary as JSON"),
                ),
        )
}

#[derive(Serialize)]
struct CompareReport<'a> {
    summary: ComparisonSummary,
    results: &'a [ComparisonResult],
}

/// sqldrift: structural drift detection between SQL sources
///
/// Extracts views, materialized views, functions, tables, indexes, triggers, grants and
/// comments from SQL files and compares a reference set (the checked-in source) against a
/// candidate set (what is actually deployed), reporting per-object findings with completeness
/// and accuracy scores.
///
/// ```sh
/// sqldrift extract schema/views.sql
/// sqldrift compare -s schema/tables.sql schema/views.sql -c dump/schema.sql
/// ```
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let matches = build_cli().get_matches();

    let outcome = match matches.subcommand() {
        Some(("extract", sub_matches)) => run_extract(sub_matches),
        Some(("compare", sub_matches)) => run_compare(sub_matches),
        _ => unreachable!(),
    };
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_extract(sub_matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let file = sub_matches
        .get_one::<String>("file")
        .ok_or("No SQL file given")?;
    let objects = read_source_file(file)?;

    if sub_matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    println!("Found {} SQL objects:", objects.len());
    for object in &objects {
        print_object(object);
    }
    Ok(())
}

fn print_object(object: &SchemaObject) {
    println!("- {} ({})", object.name, object.kind);
    if !object.columns.is_empty() {
        let shown: Vec<&str> = object.columns.iter().take(5).map(String::as_str).collect();
        let more = if object.columns.len() > 5 { "..." } else { "" };
        println!("  Columns: {}{}", shown.join(", "), more);
    }
    if !object.ctes.is_empty() {
        println!("  CTEs: {}", object.ctes.len());
    }
    if !object.joins.is_empty() {
        println!("  JOINs: {}", object.joins.len());
    }
    if let Some(return_type) = &object.return_type {
        println!("  Returns: {}", return_type);
    }
}

fn run_compare(sub_matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let sources: Vec<&String> = sub_matches
        .get_many::<String>("source")
        .map(|values| values.collect())
        .unwrap_or_default();
    let candidates: Vec<&String> = sub_matches
        .get_many::<String>("candidate")
        .map(|values| values.collect())
        .unwrap_or_default();
    let mut config = match sub_matches.get_one::<String>("config") {
        Some(path) => load_from_file(path)?,
        None => CompareConfig::default(),
    };
    if sub_matches.get_flag("ignore-whitespace") {
        config.ignore_whitespace = true;
    }

    let results = compare_sources(&sources, &candidates, &config);
    let summary = ComparisonSummary::from_results(&results);

    if sub_matches.get_flag("json") {
        let report = CompareReport {
            summary,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Comparison Results:");
    for result in &results {
        println!("- {} ({}): {}", result.name, result.kind, result.status);
        println!("  Completeness: {:.1}%", result.completeness_pct);
        println!("  Accuracy: {:.1}%", result.accuracy_pct);
        println!("  Differences: {}", result.differences.len());
        for difference in &result.differences {
            println!("    {}", difference);
        }
    }

    let overall = &summary.overall;
    println!();
    println!(
        "Summary: {} objects, {} matching, {} different, {} missing, {} extra",
        overall.total, overall.matching, overall.different, overall.missing, overall.extra
    );
    println!(
        "  Found: {:.1}%  Completeness: {:.1}%  Accuracy: {:.1}%",
        overall.coverage_pct(),
        overall.average_completeness,
        overall.average_accuracy
    );
    for (kind, tally) in &summary.by_kind {
        println!(
            "  {}: {} total, {} matching, {} different, {} missing, {} extra",
            kind, tally.total, tally.matching, tally.different, tally.missing, tally.extra
        );
    }

    if summary.is_clean() {
        println!("All objects match.");
    }

    let critical = critical_issues(&results, config.critical_completeness_threshold);
    if !critical.is_empty() {
        println!();
        println!("Critical issues:");
        for result in critical {
            println!(
                "- {} ({}): {}, {:.1}% complete",
                result.name, result.kind, result.status, result.completeness_pct
            );
        }
    }
    Ok(())
}
