use anyhow::Result;
use comfy_table::Table;
use tracing::info_span;

use health_cli::pipeline::{ConvertOptions, consolidate};
use health_cli::types::ConvertResult;
use health_model::{DEFAULT_OUTPUT_FILE, SourceKind, TARGET_TYPES};

use crate::cli::ConvertArgs;
use crate::summary::{apply_table_style, header_cell};

pub fn run_types() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Type"), header_cell("Category")]);
    apply_table_style(&mut table);
    let mut targets: Vec<_> = TARGET_TYPES.iter().collect();
    targets.sort_by_key(|target| target.identifier);
    for target in targets {
        table.add_row(vec![target.identifier, target.category.label()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertResult> {
    let export_folder = &args.export_folder;
    let convert_span = info_span!("export", folder = %export_folder.display());
    let _convert_guard = convert_span.enter();
    consolidate(&convert_options(args))
}

/// Apply command-line overrides on top of the conventional layout.
fn convert_options(args: &ConvertArgs) -> ConvertOptions {
    let mut options = ConvertOptions::under(&args.export_folder);
    options.output = args
        .output
        .clone()
        .unwrap_or_else(|| args.export_folder.join(DEFAULT_OUTPUT_FILE));

    let overrides = [
        (SourceKind::ExportXml, &args.export_xml, args.skip_export_xml),
        (SourceKind::ClinicalDocument, &args.cda_xml, args.skip_cda),
        (SourceKind::Electrocardiograms, &args.ecg_dir, args.skip_ecg),
    ];
    for (kind, path, skip) in overrides {
        if let Some(path) = path {
            options.locations = options.locations.with_path(kind, path.clone());
        }
        if skip {
            options.skip.push(kind);
        }
    }
    options.dry_run = args.dry_run;
    options
}
