//! Collection management commands

use crate::app::{CollectionAction, CollectionArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use ragserve_core::{Database, RagError};

pub fn run(args: CollectionArgs, db: &Database, format: OutputFormat) -> Result<()> {
    match args.action {
        CollectionAction::List => {
            let collections = db.list_collections()?;
            print!("{}", output::format_collections(&collections, format));
        }
        CollectionAction::Remove { name } => {
            if !db.remove_collection(&name)? {
                return Err(RagError::UnknownCollection(name).into());
            }
            println!("Removed collection '{}'", name);
        }
    }
    Ok(())
}
