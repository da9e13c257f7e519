//! A minimal command-line front-end over the `kdb1` library: the "external
//! collaborator" spec.md section 1 carves out of the core. Argument
//! parsing, passphrase prompting, and key-file decoding all live here, not
//! in the library.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kdb1::{AddMode, Credentials, Database, GroupQuery};

#[derive(Parser)]
#[command(name = "kdb-cli", version, about = "Read and edit KeePass v1 (.kdb) databases")]
struct Cli {
    /// Passphrase to open the database with. Pass "ask" to be prompted.
    #[arg(short = 'p', long)]
    passphrase: Option<String>,

    /// Key file containing 64 hex characters (32 raw bytes).
    #[arg(short = 'k', long)]
    keyfile: Option<PathBuf>,

    /// The .kdb file to operate on.
    kdb_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List entries, grouped by their owning group.
    List,
    /// Print a single field of one entry.
    Get { title: String, field: String },
    /// Update fields of an existing entry.
    Set {
        title: String,
        #[arg(value_parser = parse_key_value)]
        pairs: Vec<(String, String)>,
    },
    /// Add a new entry.
    Add {
        title: String,
        #[arg(value_parser = parse_key_value)]
        pairs: Vec<(String, String)>,
        /// `/`-separated group path; created if missing.
        #[arg(short, long, default_value = "General")]
        group: String,
    },
    /// Delete an entry by title.
    Del { title: String },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut credentials = Credentials::new();
    if let Some(path) = &cli.keyfile {
        credentials = credentials.with_file_key(read_keyfile(path)?);
    }
    let passphrase = match cli.passphrase.as_deref() {
        Some("ask") => Some(rpassword::prompt_password("Passphrase: ")?),
        Some(other) => Some(other.to_string()),
        None if cli.keyfile.is_none() => Some(rpassword::prompt_password("Passphrase: ")?),
        None => None,
    };
    if let Some(passphrase) = passphrase {
        credentials = credentials.with_password(&passphrase);
    }

    let mut db = Database::open(&cli.kdb_file, credentials)
        .with_context(|| format!("opening {}", cli.kdb_file.display()))?;

    match cli.command {
        Command::List => list(&db),
        Command::Get { title, field } => get(&db, &title, &field)?,
        Command::Set { title, pairs } => {
            set(&mut db, &title, &pairs)?;
            db.write(None).context("writing database")?;
        }
        Command::Add { title, pairs, group } => {
            add(&mut db, &title, &group, &pairs)?;
            db.write(None).context("writing database")?;
        }
        Command::Del { title } => {
            del(&mut db, &title)?;
            db.write(None).context("writing database")?;
        }
    }

    Ok(())
}

fn read_keyfile(path: &std::path::Path) -> Result<[u8; 32]> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let decoded = hex::decode(raw.trim()).context("key file is not valid hex")?;
    decoded
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("key file decodes to {} bytes, expected 32", bytes.len()))
}

fn list(db: &Database) {
    println!("{:<20} {:<15} {:<20} {:<20}", "Group", "Title", "Username", "URL");
    for entry in db.entries() {
        if entry.is_metainfo() {
            continue;
        }
        match db.find_group(&GroupQuery::Id(entry.group_id)) {
            Some(group) => println!(
                "{:<20} {:<15} {:<20} {:<20}",
                group.name, entry.title, entry.username, entry.url
            ),
            None => eprintln!(
                "warning: entry '{}' references unknown group {}",
                entry.title, entry.group_id
            ),
        }
    }
}

fn get(db: &Database, title: &str, field: &str) -> Result<()> {
    let entry = db.get(title).with_context(|| format!("no entry titled '{title}'"))?;
    let value = match field {
        "title" => entry.title.clone(),
        "username" => entry.username.clone(),
        "password" => entry.password().to_string(),
        "url" => entry.url.clone(),
        "notes" => entry.notes.clone(),
        "uuid" => entry.uuid_hex(),
        other => bail!("unknown field '{other}'"),
    };
    println!("{value}");
    Ok(())
}

fn set(db: &mut Database, title: &str, pairs: &[(String, String)]) -> Result<()> {
    let entry = db
        .entries_mut()
        .iter_mut()
        .find(|entry| entry.title == title)
        .with_context(|| format!("no entry titled '{title}'"))?;
    apply_pairs(entry, pairs)?;
    Ok(())
}

fn apply_pairs(entry: &mut kdb1::Entry, pairs: &[(String, String)]) -> Result<()> {
    for (key, value) in pairs {
        match key.as_str() {
            "title" => entry.title = value.clone(),
            "username" => entry.username = value.clone(),
            "password" => entry.set_password(value.clone()),
            "url" => entry.url = value.clone(),
            "notes" => entry.notes = value.clone(),
            other => bail!("unknown field '{other}'"),
        }
    }
    Ok(())
}

fn add(db: &mut Database, title: &str, group: &str, pairs: &[(String, String)]) -> Result<()> {
    db.add_entry(group, title, "", "", None, None, None, AddMode::Append)?;
    let entry = db
        .entries_mut()
        .last_mut()
        .context("just-added entry disappeared")?;
    apply_pairs(entry, pairs)?;
    Ok(())
}

fn del(db: &mut Database, title: &str) -> Result<()> {
    let index = db
        .entries()
        .iter()
        .position(|entry| entry.title == title)
        .with_context(|| format!("no entry titled '{title}'"))?;
    db.entries_mut().remove(index);
    Ok(())
}
