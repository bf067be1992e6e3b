use deltapatch::DiffPatcher;

use crate::cli::{
    PatchArgs,
    read::{load_delta, load_json_file},
};

pub fn handle_patch_command(args: PatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (document, patcher) = prepare(&args)?;
    let delta = load_delta(args.delta.as_deref())?;
    let patched = patcher.patch(document, &delta)?;
    args.output.print(&patched)?;
    Ok(())
}

pub fn handle_unpatch_command(args: PatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (document, patcher) = prepare(&args)?;
    let delta = load_delta(args.delta.as_deref())?;
    let unpatched = patcher.unpatch(document, &delta)?;
    args.output.print(&unpatched)?;
    Ok(())
}

fn prepare(args: &PatchArgs) -> Result<(serde_json::Value, DiffPatcher), Box<dyn std::error::Error>> {
    let document = load_json_file(&args.file)?;
    Ok((document, DiffPatcher::new(args.options.to_options()?)))
}
