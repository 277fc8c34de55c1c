mod bootstrap;

use anyhow::{Context, Result};
use report_core::settings::Settings;
use report_data::months::month_options;
use report_data::reader::open_source;
use report_runtime::pipeline::{MonthOutcome, ReportPipeline};
use report_runtime::sink::sink_for_format;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Class Report v{} starting", env!("CARGO_PKG_VERSION"));

    let source_path = settings
        .source
        .clone()
        .or_else(bootstrap::discover_data_path)
        .context("no attendance source found; pass --source <file or directory>")?;

    // A source that cannot be read ends the request before anything is built.
    let source = open_source(&source_path, settings.column_binding())?;
    let records = source
        .fetch()
        .with_context(|| format!("could not load attendance from {}", source.name()))?;
    tracing::info!("Loaded {} rows from {}", records.len(), source.name());

    let options = month_options(&records);

    let requested: Vec<String> = if settings.all_months {
        options.iter().map(|m| m.to_string()).collect()
    } else {
        settings.months.clone()
    };

    if settings.list_months || requested.is_empty() {
        if options.is_empty() {
            println!("No months with valid dates in {}", source.name());
        }
        for month in &options {
            println!("{}", month);
        }
        if !settings.list_months {
            eprintln!("Select month(s) with --month \"<Month> <Year>\" or use --all-months");
        }
        return Ok(());
    }

    let sink = sink_for_format(&settings.format)?;
    let today = chrono::Local::now().date_naive();
    let pipeline = ReportPipeline::new(sink.as_ref(), today);

    let run = pipeline.run_records(&records, &requested)?;

    for outcome in &run.outcomes {
        if let MonthOutcome::NoData { month } = outcome {
            tracing::warn!("No data found for {}", month);
            println!("No data found for {}", month);
        }
    }

    let written = run.write_to(&settings.output_dir).with_context(|| {
        format!(
            "could not write reports to {}",
            settings.output_dir.display()
        )
    })?;
    for path in &written {
        println!("{} created", path.display());
    }

    Ok(())
}
