use std::io::Write;

use agentos_lib::resource::ResourceSpec;
use agentos_lib::{FetchOutcome, Pagination, Record, Registry, Row, WidgetReport};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

/// Column key and header for one rendered column.
type ColumnDef = (String, String);

/// Declared columns of the resource, or the first row's keys when none are declared.
fn columns_for(spec: &ResourceSpec, rows: &[Row]) -> Vec<ColumnDef> {
    if !spec.columns.is_empty() {
        return spec
            .columns
            .iter()
            .map(|c| (c.key.to_string(), c.title.to_string()))
            .collect();
    }
    rows.first()
        .map(|row| {
            row.fields()
                .keys()
                .map(|k| (k.clone(), k.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn cell(row: &Row, key: &str) -> String {
    if key == "id" {
        return row.id().to_string();
    }
    row.field(key).unwrap_or_default()
}

// -- Row builders --

fn build_records(columns: &[ColumnDef], rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| columns.iter().map(|(key, _)| cell(row, key)).collect())
        .collect()
}

fn build_table(headers: Vec<String>, records: Vec<Vec<String>>, markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers);
    for record in records {
        builder.push_record(record);
    }
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    }
    table.to_string()
}

fn write_csv<W: Write>(writer: W, headers: &[String], records: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers)?;
    for record in records {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_grid(headers: Vec<String>, records: Vec<Vec<String>>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", build_table(headers, records, false)),
        OutputFormat::Markdown => println!("{}", build_table(headers, records, true)),
        OutputFormat::Csv => write_csv(std::io::stdout(), &headers, &records)?,
        OutputFormat::Json => {
            let objects: Vec<serde_json::Map<String, Value>> = records
                .into_iter()
                .map(|record| {
                    headers
                        .iter()
                        .cloned()
                        .zip(record.into_iter().map(Value::String))
                        .collect()
                })
                .collect();
            print_json(&objects);
        }
    }
    Ok(())
}

// -- List output --

#[derive(Serialize)]
struct ListEnvelope<'a> {
    resource: &'a str,
    page: u64,
    page_count: u64,
    total: u64,
    rows: &'a [Row],
}

pub fn print_rows(
    spec: &ResourceSpec,
    rows: &[Row],
    pagination: &Pagination,
    format: &OutputFormat,
) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(&ListEnvelope {
            resource: spec.name,
            page: pagination.page() + 1,
            page_count: pagination.page_count(),
            total: pagination.total(),
            rows,
        });
        return Ok(());
    }

    let columns = columns_for(spec, rows);
    let headers = columns.iter().map(|(_, title)| title.clone()).collect();
    print_grid(headers, build_records(&columns, rows), format)?;
    if *format != OutputFormat::Csv {
        eprintln!("{}", page_footer(pagination));
    }
    Ok(())
}

fn page_footer(pagination: &Pagination) -> String {
    let strip = pagination
        .window(1, 2)
        .into_iter()
        .map(|slot| match slot {
            Some(p) if p == pagination.page() + 1 => format!("[{}]", p),
            Some(p) => p.to_string(),
            None => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Page {} of {} ({} total)  {}",
        pagination.page() + 1,
        pagination.page_count(),
        pagination.total(),
        strip
    )
}

// -- Detail output --

fn build_detail_records(row: &Row) -> Vec<Vec<String>> {
    let mut records = vec![vec!["id".to_string(), row.id().to_string()]];
    for key in row.fields().keys() {
        if key == "id" {
            continue;
        }
        records.push(vec![key.clone(), row.field(key).unwrap_or_default()]);
    }
    records
}

pub fn print_detail(row: &Row, format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(row);
        return Ok(());
    }
    print_grid(
        vec!["Field".to_string(), "Value".to_string()],
        build_detail_records(row),
        format,
    )
}

// -- Registry output --

fn build_resource_records(registry: &Registry) -> Vec<Vec<String>> {
    registry
        .iter()
        .map(|spec| {
            let actions = spec
                .actions
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let filters = spec
                .filters
                .iter()
                .map(|f| f.key)
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                spec.name.to_string(),
                spec.label.to_string(),
                spec.path.to_string(),
                filters,
                actions,
                if spec.live { "yes" } else { "" }.to_string(),
            ]
        })
        .collect()
}

#[derive(Serialize)]
struct ResourceSummary<'a> {
    name: &'a str,
    label: &'a str,
    path: &'a str,
    filters: Vec<&'a str>,
    actions: Vec<&'a str>,
    live: bool,
}

pub fn print_resources(registry: &Registry, format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        let summaries: Vec<_> = registry
            .iter()
            .map(|spec| ResourceSummary {
                name: spec.name,
                label: spec.label,
                path: spec.path,
                filters: spec.filters.iter().map(|f| f.key).collect(),
                actions: spec.actions.iter().map(|a| a.as_str()).collect(),
                live: spec.live,
            })
            .collect();
        print_json(&summaries);
        return Ok(());
    }
    let headers = ["Name", "Label", "Path", "Filters", "Actions", "Live"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    print_grid(headers, build_resource_records(registry), format)
}

// -- Dashboard output --

fn build_report_records(reports: &[WidgetReport]) -> Vec<Vec<String>> {
    reports
        .iter()
        .map(|r| {
            let (status, detail) = match &r.outcome {
                FetchOutcome::Applied { total, .. } => ("ok".to_string(), total.to_string()),
                FetchOutcome::Failed(message) => ("error".to_string(), message.clone()),
                FetchOutcome::Superseded => ("superseded".to_string(), String::new()),
            };
            vec![r.name.clone(), status, detail]
        })
        .collect()
}

pub fn print_reports(reports: &[WidgetReport], format: &OutputFormat) -> Result<()> {
    let headers = ["Widget", "Status", "Detail"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    print_grid(headers, build_report_records(reports), format)
}

// -- JSON output --

pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
