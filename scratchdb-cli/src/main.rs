use clap::{Parser, Subcommand};
use scratchdb::Engine;
use std::io::Read;
use std::process;

/// scratchdb CLI — interact with a scratchdb JSON database from the command line
#[derive(Parser)]
#[command(name = "scratchdb", version, about)]
struct Cli {
    /// Path to the backing JSON file (created on first use)
    #[arg(long, default_value = "db.json")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every collection with its item count
    Collections,

    /// List all items in a collection (creates it if absent)
    List {
        /// Collection name
        collection: String,
    },

    /// Get a single item by id
    Get {
        /// Collection name
        collection: String,
        /// Item id
        id: String,
    },

    /// Create a new item from a JSON body
    Create {
        /// Collection name
        collection: String,
        /// Item body as a JSON object (omit to read from stdin)
        body: Option<String>,
    },

    /// Update an existing item, merging the given fields
    Update {
        /// Collection name
        collection: String,
        /// Item id
        id: String,
        /// Fields to merge as a JSON object (omit to read from stdin)
        body: Option<String>,
    },

    /// Delete an item by id
    Delete {
        /// Collection name
        collection: String,
        /// Item id
        id: String,
    },

    /// Merge new collections into the database structure.
    /// Existing collections always win; their sample data is dropped.
    Merge {
        /// New structure as a JSON object (omit to read from stdin)
        body: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Machine-readable error on stderr, non-zero exit
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::open(&cli.db);

    match cli.command {
        Command::Collections => {
            let summaries = engine.list_collections()?;
            print_output(&serde_json::to_value(summaries)?);
        }

        Command::List { collection } => {
            let contents = engine.get_all(&collection)?;
            print_output(&serde_json::to_value(contents)?);
        }

        Command::Get { collection, id } => {
            let item = engine.get_one(&collection, &id)?;
            print_output(&item);
        }

        Command::Create { collection, body } => {
            let payload = read_body(body)?;
            let item = engine.create(&collection, payload)?;
            print_output(&item);
        }

        Command::Update {
            collection,
            id,
            body,
        } => {
            let payload = read_body(body)?;
            let item = engine.update(&collection, &id, payload)?;
            print_output(&item);
        }

        Command::Delete { collection, id } => {
            let receipt = engine.delete(&collection, &id)?;
            print_output(&serde_json::to_value(receipt)?);
        }

        Command::Merge { body } => {
            let structure = read_body(body)?;
            let report = engine.merge_structure(structure)?;
            print_output(&serde_json::to_value(report)?);
        }
    }

    Ok(())
}

/// JSON body from the argument, or stdin when the argument is omitted.
fn read_body(arg: Option<String>) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let raw = match arg {
        Some(s) => s,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_output(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{pretty}"),
        Err(_) => println!("{value}"),
    }
}
