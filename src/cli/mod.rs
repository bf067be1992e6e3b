pub mod diff;
pub mod patch;
pub mod read;
pub mod reverse;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use deltapatch::{Options, OptionsError, OptionsFile};

#[derive(Debug, Parser)]
#[command(name = "deltapatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// Log filter directives, e.g. `deltapatch=debug`. Defaults to warnings only.
    #[arg(long, global = true, env = "DELTAPATCH_LOG")]
    pub log: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the delta between two JSON documents
    Diff(DiffArgs),

    /// Apply a delta to a JSON document
    Patch(PatchArgs),

    /// Apply a delta backwards, from its right-hand document to the left
    Unpatch(PatchArgs),

    /// Print the delta that undoes a delta
    Reverse(ReverseArgs),
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Path to the left (original) JSON file
    pub file1: PathBuf,

    /// Path to the right (changed) JSON file
    pub file2: PathBuf,

    #[command(flatten)]
    pub options: OptionArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct PatchArgs {
    /// Path to the JSON document to patch
    pub file: PathBuf,

    /// Path to the delta. Read from stdin when omitted.
    pub delta: Option<PathBuf>,

    #[command(flatten)]
    pub options: OptionArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct ReverseArgs {
    /// Path to the delta. Read from stdin when omitted.
    pub delta: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct OptionArgs {
    /// JSON options file (`objectHash`, `matchByPosition`, `arrays`, `textDiff`)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Identify array elements by this member, or by a JSON pointer when it
    /// starts with `/`
    #[arg(long, value_name = "KEY")]
    pub object_hash: Option<String>,

    /// Report moved array elements as a removal plus an addition
    #[arg(long)]
    pub no_detect_move: bool,

    /// Embed the moved element in array move entries
    #[arg(long)]
    pub include_value_on_move: bool,

    /// Strings shorter than this many characters are replaced instead of
    /// diffed character by character
    #[arg(long, value_name = "CHARS")]
    pub text_min_length: Option<usize>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Pretty-print the output
    #[arg(short, long)]
    pub pretty: bool,
}

impl OptionArgs {
    /// The options file, if any, with the command line flags on top.
    pub fn to_options(&self) -> Result<Options, OptionsError> {
        let mut file = match &self.config {
            Some(path) => OptionsFile::load(path)?,
            None => OptionsFile::default(),
        };
        if let Some(key) = &self.object_hash {
            file.object_hash = Some(key.clone());
        }
        if self.no_detect_move {
            file.arrays.detect_move = Some(false);
        }
        if self.include_value_on_move {
            file.arrays.include_value_on_move = Some(true);
        }
        if let Some(min_length) = self.text_min_length {
            file.text_diff.min_length = Some(min_length);
        }
        Ok(file.into())
    }
}

impl OutputArgs {
    pub fn print(&self, value: &serde_json::Value) -> Result<(), serde_json::Error> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_defaults() {
        let_assert!(
            Ok(cli) = Cli::try_parse_from([
                "deltapatch",
                "diff",
                "a.json",
                "b.json",
                "--object-hash",
                "id",
                "--no-detect-move",
                "--text-min-length",
                "5",
            ])
        );
        let_assert!(Command::Diff(args) = cli.cmd);
        let_assert!(Ok(options) = args.options.to_options());
        check!(options.object_hash.is_some());
        check!(!options.arrays.detect_move);
        check!(!options.arrays.include_value_on_move);
        check!(options.text_diff.min_length == 5);
    }

    #[test]
    fn delta_path_is_optional() {
        let_assert!(Ok(cli) = Cli::try_parse_from(["deltapatch", "unpatch", "right.json"]));
        let_assert!(Command::Unpatch(args) = cli.cmd);
        check!(args.delta.is_none());
        let_assert!(Ok(cli) = Cli::try_parse_from(["deltapatch", "reverse", "-p", "delta.json"]));
        let_assert!(Command::Reverse(args) = cli.cmd);
        check!(args.output.pretty);
    }
}
