// Entry point and high-level CLI flow.
//
// - Without `--interactive`, the binary loads the JSON file once, applies the
//   selection given on the command line, prints the timeline, statistics and
//   details, then exports if asked to.
// - With `--interactive`, a menu lets the user reload the file, edit filters,
//   show results and export as often as they like.
use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tender_timeline::config::Cli;
use tender_timeline::error::DatasetError;
use tender_timeline::filter::{filter, FilterOptions, Horizon, Selection};
use tender_timeline::loader::{self, Dataset};
use tender_timeline::output::View;
use tender_timeline::types::{Category, Status};
use tender_timeline::{output, reports, util};

// Session state for the interactive menu. The table is an immutable snapshot
// that a reload replaces as a whole.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        selection: Selection::default(),
    })
});

struct AppState {
    data: Option<Arc<Dataset>>,
    selection: Selection,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot() -> (Option<Arc<Dataset>>, Selection) {
    let st = state();
    (st.data.clone(), st.selection.clone())
}

/// Read a single line of input after printing `label`.
fn prompt(label: &str) -> String {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Print the filtered timeline, statistics and details of `data`.
fn show_results(data: &Dataset, selection: &Selection, max_rows: usize, details: bool) {
    let subset = match output::view(data, selection) {
        View::Records(subset) => subset,
        other => {
            println!("{}\n", other.message().unwrap_or_default());
            return;
        }
    };
    println!("Tender timeline (today = {})\n", data.today.format("%Y-%m-%d"));
    output::preview_table_rows(&output::timeline_rows(data.today, &subset), max_rows);
    output::print_statistics(&reports::summarize(&subset));
    if details {
        output::print_details(&subset, max_rows);
    }
}

fn export(data: &Dataset, selection: &Selection, csv: Option<&Path>, json: Option<&Path>) -> Result<()> {
    let subset = filter(&data.records, selection);
    if let Some(path) = csv {
        output::write_csv(path, &output::export_rows(&subset))?;
        info!("Exported {} tenders to {}", subset.len(), path.display());
        println!("Filtered tenders exported to {}", path.display());
    }
    if let Some(path) = json {
        let report = reports::generate_report(data.today, subset, &data.warnings);
        output::write_json(path, &report)?;
        info!("Exported summary to {}", path.display());
        println!("Summary exported to {}", path.display());
    }
    Ok(())
}

/// Load and build the table. Warnings are printed; an empty table is
/// reported and yields `None`.
fn load(cli: &Cli) -> Result<Option<Dataset>> {
    let data = loader::load_dataset(&cli.data, cli.today())
        .with_context(|| format!("loading {}", cli.data.display()))?;
    let report = data.report();
    println!(
        "Processing dataset... ({} entries read, {} usable)",
        util::format_int(report.total_entries),
        util::format_int(report.valid_records)
    );
    output::print_warnings(&data.warnings);
    match data.ensure_usable() {
        Ok(data) => Ok(Some(data)),
        Err(DatasetError::NoValidData) => {
            println!("{}\n", output::NO_VALID_DATA);
            Ok(None)
        }
    }
}

fn run_once(cli: &Cli) -> Result<()> {
    let Some(data) = load(cli)? else {
        return Ok(());
    };
    let selection = cli.selection();
    show_results(&data, &selection, cli.max_rows, !cli.no_details);
    export(&data, &selection, cli.export_csv.as_deref(), cli.export_json.as_deref())
}

/// Handle option [1]: (re)load the file with a fresh reference date.
fn handle_load(cli: &Cli) {
    match load(cli) {
        Ok(Some(data)) => {
            let mut st = state();
            st.data = Some(Arc::new(data));
            st.selection = cli.selection();
        }
        Ok(None) => {
            state().data = None;
        }
        Err(e) => {
            error!("{e:#}");
            eprintln!("Failed to load file: {:#}\n", e);
        }
    }
}

fn print_options<T: Display>(title: &str, options: impl IntoIterator<Item = T>) {
    let values: Vec<String> = options.into_iter().map(|v| v.to_string()).collect();
    println!("{title}: {}", values.join(" | "));
}

fn parse_all<T: FromStr<Err = String> + Ord>(answer: &str) -> Option<BTreeSet<T>> {
    match util::split_list(answer).iter().map(|v| v.parse()).collect::<Result<BTreeSet<T>, _>>() {
        Ok(set) => Some(set),
        Err(e) => {
            println!("{e}\n");
            None
        }
    }
}

/// Handle option [2]: change one filter dimension. An empty answer clears it.
fn handle_edit_filters() {
    let (Some(data), mut selection) = snapshot() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    let opts = FilterOptions::from_table(&data.records);
    println!("[1] Buyers  [2] Awardees  [3] Departments  [4] End date  [5] Status  [6] Categories  [7] Reset");
    match read_choice().as_str() {
        "1" => {
            print_options("Buyers", &opts.buyers);
            selection.buyers = util::split_list(&prompt("Buyers (comma separated): ")).into_iter().collect();
        }
        "2" => {
            print_options("Awardees", &opts.awardees);
            selection.awardees = util::split_list(&prompt("Awardees (comma separated): ")).into_iter().collect();
        }
        "3" => {
            print_options("Departments", &opts.departments);
            selection.departments =
                util::split_list(&prompt("Departments (comma separated): ")).into_iter().collect();
        }
        "4" => {
            for h in Horizon::ALL {
                println!("  {:<5} {}", h.to_string(), h.label());
            }
            let answer = prompt("End date filter: ");
            let answer = if answer.is_empty() { "all" } else { answer.as_str() };
            match answer.parse() {
                Ok(h) => selection.horizon = h,
                Err(e) => println!("{e}\n"),
            }
        }
        "5" => {
            print_options("Statuses", [Status::Active, Status::Finished]);
            if let Some(set) = parse_all::<Status>(&prompt("Statuses (comma separated, empty for all): ")) {
                selection.statuses = set;
            }
        }
        "6" => {
            print_options("Categories", opts.categories.iter().map(|c| c.label()));
            if let Some(set) = parse_all::<Category>(&prompt("Categories (comma separated): ")) {
                selection.categories = set;
            }
        }
        "7" => selection = Selection::default(),
        _ => {
            println!("Invalid choice.\n");
            return;
        }
    }
    let matching = filter(&data.records, &selection).len();
    println!("{} tenders match the current filters.\n", util::format_int(matching));
    state().selection = selection;
}

/// Handle option [4]: export the filtered tenders and summary.
fn handle_export() {
    let (Some(data), selection) = snapshot() else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    let csv = prompt("CSV file (Enter for tenders_filtered.csv): ");
    let csv = PathBuf::from(if csv.is_empty() { "tenders_filtered.csv" } else { csv.as_str() });
    let json = prompt("JSON summary file (Enter for summary.json): ");
    let json = PathBuf::from(if json.is_empty() { "summary.json" } else { json.as_str() });
    if let Err(e) = export(&data, &selection, Some(&csv), Some(&json)) {
        error!("{e:#}");
        eprintln!("Write error: {:#}", e);
    }
    println!();
}

fn run_interactive(cli: &Cli) {
    handle_load(cli);
    loop {
        println!("Tender timeline");
        println!("[1] Load the file");
        println!("[2] Edit filters");
        println!("[3] Show timeline");
        println!("[4] Export");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(cli),
            "2" => handle_edit_filters(),
            "3" => {
                let (data, selection) = snapshot();
                match data {
                    Some(data) => show_results(&data, &selection, cli.max_rows, !cli.no_details),
                    None => println!("Error: No data loaded. Please load the file first (option 1).\n"),
                }
            }
            "4" => handle_export(),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0 to 4.\n"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if cli.interactive {
        run_interactive(&cli);
        Ok(())
    } else {
        run_once(&cli)
    }
}
