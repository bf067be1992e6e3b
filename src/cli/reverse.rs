use crate::cli::{ReverseArgs, read::load_delta};

pub fn handle_reverse_command(args: ReverseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let delta = load_delta(args.delta.as_deref())?;
    let reversed = deltapatch::reverse(&delta)?;
    args.output.print(&reversed.to_value())?;
    Ok(())
}
