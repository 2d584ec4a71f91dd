//! Completions command implementation

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::{Cli, CompletionsArgs};
use crate::error::{Result, SetupError};

pub fn run(args: CompletionsArgs) -> Result<()> {
    let shell = match args.shell.as_str() {
        "bash" => Shell::Bash,
        "elvish" => Shell::Elvish,
        "fish" => Shell::Fish,
        "powershell" => Shell::PowerShell,
        "zsh" => Shell::Zsh,
        other => {
            return Err(SetupError::CommandFailed {
                command: format!("completions --shell {other}"),
                reason: "supported shells: bash, elvish, fish, powershell, zsh".to_string(),
            });
        }
    };
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "voxd-setup", &mut std::io::stdout());
    Ok(())
}
