use deltapatch::DiffPatcher;
use tracing::info;

use crate::cli::{DiffArgs, read::load_json_file};

pub fn handle_diff_command(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file1 = load_json_file(&args.file1)?;
    let file2 = load_json_file(&args.file2)?;
    let patcher = DiffPatcher::new(args.options.to_options()?);

    match patcher.diff(&file1, &file2)? {
        Some(delta) => args.output.print(&delta.to_value())?,
        None => info!("documents are identical"),
    }
    Ok(())
}
