//! Command line front end for spreadsheet forms.
//!
//! # Usage
//!
//! Print a form and its rows:
//! ```sh
//! seafform show party.ods
//! ```
//!
//! Submit a row, or replace spreadsheet row 5:
//! ```sh
//! seafform fill party.ods --set Name=Alice --set Coming=yes
//! seafform fill party.ods --set Name=Bob --row 5
//! ```
//!
//! Create a new form:
//! ```sh
//! seafform init party.ods --title "Summer party" \
//!     --field "Name:text*" --field "Dish:list:salad,cake" --field "Coming:checked"
//! ```
//!
//! With the `seafile` feature, `home:REPO_ID/forms/party.ods` addresses a
//! file on the `home` host of the configuration file.

use clap::{Parser, Subcommand, ValueEnum};
use seafform::config::Config;
use seafform::form::{FieldKind, FormDocument, FormTemplate, ViewMode, Vocabulary, validate};
use seafform::storage::{LocalStorage, Storage};
use seafform::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fill and inspect forms stored as OpenDocument spreadsheets
#[derive(Parser, Debug)]
#[command(name = "seafform", version)]
struct Args {
    /// Configuration file (default: $SEAFFORM_CONFIG or ~/.config/seafform.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the form schema and every submitted row
    Show {
        /// Local path, or HOST:REPO_ID/path on a Seafile host
        form: String,
    },
    /// Submit a row
    Fill {
        form: String,
        /// Field value, repeatable
        #[arg(long = "set", value_name = "LABEL=VALUE")]
        set: Vec<String>,
        /// Replace this spreadsheet row (1-based, as displayed by spreadsheet
        /// applications) instead of appending
        #[arg(long, value_name = "N")]
        row: Option<usize>,
    },
    /// Print one submitted row
    Row {
        form: String,
        /// Spreadsheet row (1-based)
        row: usize,
    },
    /// Create a new, empty form spreadsheet
    Init {
        output: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_enum, default_value = "table")]
        view: ViewArg,
        /// Let visitors replace submitted rows
        #[arg(long)]
        allow_edit: bool,
        /// Field declaration, repeatable
        #[arg(long = "field", value_name = "LABEL:KIND[*][:PARAMS]")]
        fields: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewArg {
    /// Visitors see every row
    Table,
    /// Visitors only see the entry form
    Form,
}

impl From<ViewArg> for ViewMode {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Table => ViewMode::Table,
            ViewArg::Form => ViewMode::FormSingleEntry,
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let vocabulary = config.vocabulary()?;

    let (form, action) = match args.command {
        Command::Init {
            output,
            title,
            description,
            view,
            allow_edit,
            fields,
        } => {
            let mut template = FormTemplate::new(title)
                .description(description)
                .view_mode(view.into())
                .allow_edit(allow_edit);
            for declaration in &fields {
                let (label, kind, required, params) = parse_field(&vocabulary, declaration)?;
                template = template.field(label, kind, required, params, None);
            }
            template.save(&output)?;
            println!("Created {}", output.display());
            return Ok(());
        },
        Command::Show { form } => (form, Action::Show),
        Command::Fill { form, set, row } => (form, Action::Fill { set, row }),
        Command::Row { form, row } => (form, Action::Row(row)),
    };

    #[cfg(feature = "seafile")]
    if let Some((host, path)) = seafile_target(&config, &form) {
        let storage = seafile_storage(host)?;
        let locator: seafform::storage::SeafilePath = path.parse()?;
        return act(FormDocument::new(storage, locator).with_vocabulary(vocabulary), action);
    }

    act(
        FormDocument::new(LocalStorage, PathBuf::from(form)).with_vocabulary(vocabulary),
        action,
    )
}

enum Action {
    Show,
    Fill { set: Vec<String>, row: Option<usize> },
    Row(usize),
}

fn act<S: Storage>(
    mut form: FormDocument<S>,
    action: Action,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    form.load()?;
    match action {
        Action::Show => show(&form)?,
        Action::Fill { set, row } => {
            let mut raw = BTreeMap::new();
            for assignment in &set {
                let (label, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| format!("expected LABEL=VALUE, got {:?}", assignment))?;
                raw.insert(label.trim().to_string(), value.to_string());
            }
            for label in raw.keys() {
                if form.schema()?.field(label).is_none() {
                    log::warn!("Ignoring {:?}: the form has no such field", label);
                }
            }

            let values = validate(form.fields()?, &raw)?;
            let replace = row.map(sheet_row).transpose()?;
            let written = form.post(&values, replace)?;
            println!("Saved row {}", written + 1);
        },
        Action::Row(row) => {
            let values = form.get_row_as_mapping(sheet_row(row)?)?;
            for field in form.fields()? {
                let value = values.get(&field.label).map(ToString::to_string);
                println!("{}: {}", field.label, value.unwrap_or_default());
            }
        },
    }
    Ok(())
}

fn show<S: Storage>(form: &FormDocument<S>) -> Result<()> {
    println!("{}", form.title()?);
    if !form.description()?.is_empty() {
        println!("{}", form.description()?);
    }
    println!(
        "view: {}, editing {}",
        form.view_mode()?.token(),
        if form.allow_edit()? { "allowed" } else { "not allowed" }
    );
    println!();

    for field in form.fields()? {
        let mut line = format!("  {} [{}", field.label, field.kind.token());
        if field.required {
            line.push('*');
        }
        line.push(']');
        if !field.choices.is_empty() {
            line.push_str(&format!(" {}", field.choices.join(" | ")));
        } else if let Some(params) = &field.params {
            line.push_str(&format!(" {}", params));
        }
        if let Some(description) = &field.description {
            line.push_str(&format!(" - {}", description));
        }
        println!("{}", line);
    }
    println!();

    let first = seafform::form::HEADER_ROWS;
    let labels: Vec<_> = form.fields()?.iter().map(|f| f.label.as_str()).collect();
    println!("row\t{}", labels.join("\t"));
    for (i, row) in form.rows()?.iter().enumerate() {
        let cells: Vec<_> = row.iter().map(ToString::to_string).collect();
        println!("{}\t{}", first + i + 1, cells.join("\t"));
    }
    Ok(())
}

/// 1-based spreadsheet row to 0-based grid row.
fn sheet_row(row: usize) -> std::result::Result<usize, String> {
    row.checked_sub(1)
        .ok_or_else(|| "spreadsheet rows are numbered from 1".to_string())
}

/// Parse `LABEL:KIND[*][:PARAMS]`.
fn parse_field<'a>(
    vocabulary: &Vocabulary,
    declaration: &'a str,
) -> Result<(&'a str, FieldKind, bool, Option<&'a str>)> {
    let mut parts = declaration.splitn(3, ':');
    let label = parts.next().unwrap_or_default().trim();
    let kind_token = parts.next().unwrap_or_default().trim();
    let params = parts.next().map(str::trim).filter(|p| !p.is_empty());

    let required = kind_token.ends_with('*');
    let kind = vocabulary
        .kind(kind_token.trim_end_matches('*'))
        .ok_or_else(|| Error::InvalidSchema(format!("unknown field kind in {:?}", declaration)))?;
    Ok((label, kind, required, params))
}

/// Split `HOST:REPO_ID/path` when `HOST` is a configured host.
#[cfg(feature = "seafile")]
fn seafile_target<'a>(
    config: &'a Config,
    form: &'a str,
) -> Option<(&'a seafform::config::HostConfig, &'a str)> {
    let (host, path) = form.split_once(':')?;
    config.hosts.get(host).map(|host| (host, path))
}

#[cfg(feature = "seafile")]
fn seafile_storage(host: &seafform::config::HostConfig) -> Result<seafform::storage::SeafileStorage> {
    let mut storage = seafform::storage::SeafileStorage::new(&host.url)?;
    match (&host.token, &host.password) {
        (Some(token), _) => storage.authenticate_token(&host.email, token)?,
        (None, Some(password)) => storage.authenticate_password(&host.email, password)?,
        (None, None) => return Err(Error::NotAuthenticated),
    }
    Ok(storage)
}
