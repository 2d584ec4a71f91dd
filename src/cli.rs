//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

/// voxd-setup - bootstrap tool for the VOXD voice-dictation app
///
/// Provisions the speech engine, optional LLM server and input-simulation
/// daemon, and wires them into the user environment idempotently.
#[derive(Parser, Debug)]
#[command(
    name = "voxd-setup",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Idempotent setup for the VOXD voice-dictation app",
    long_about = "voxd-setup detects the system package manager, installs build and \
                  runtime dependencies, provisions the whisper-cli, llama-server and \
                  ydotool binaries (reusing, downloading prebuilts, or building from \
                  source), configures the per-user typing daemon, and reports the \
                  resulting state. Safe to re-run at any time.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  voxd-setup\n    \
                  voxd-setup install --offline\n    \
                  voxd-setup status\n    \
                  voxd-setup hotkeys diagnose\n    \
                  voxd-setup uninstall --purge"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Defaults to a full install run when no subcommand is given
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full bootstrap (default)
    Install(InstallArgs),

    /// Remove everything voxd-setup created
    Uninstall(UninstallArgs),

    /// Re-probe managed resources and print the state report
    Status,

    /// Hotkey helper for desktop shortcut setup
    Hotkeys(HotkeysArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Default GitHub repository serving prebuilt binary releases
pub const DEFAULT_BIN_REPO: &str = "jakovius/voxd-prebuilts";

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Full install:\n    voxd-setup install\n\n\
                  Skip every network step:\n    voxd-setup install --offline\n\n\
                  Skip model downloads only:\n    voxd-setup install --skip-models\n\n\
                  Pin prebuilts to a release tag:\n    voxd-setup install --bin-tag v1.1.0\n\n\
                  Use a fork for prebuilt binaries:\n    VOXD_BIN_REPO=me/voxd-prebuilts voxd-setup install")]
pub struct InstallArgs {
    /// Skip all network steps (prebuilts, source clones, models)
    #[arg(long)]
    pub offline: bool,

    /// Do not download model files
    #[arg(long)]
    pub skip_models: bool,

    /// Assume yes for confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Release repository for prebuilt binaries
    #[arg(long, env = "VOXD_BIN_REPO", default_value = DEFAULT_BIN_REPO)]
    pub bin_repo: String,

    /// Pin prebuilt downloads to a release tag (latest when unset)
    #[arg(long, env = "VOXD_BIN_TAG")]
    pub bin_tag: Option<String>,
}

/// Matches what clap would produce for a bare `voxd-setup install`,
/// including the env-var overrides
impl Default for InstallArgs {
    fn default() -> Self {
        Self {
            offline: false,
            skip_models: false,
            yes: false,
            bin_repo: std::env::var("VOXD_BIN_REPO")
                .unwrap_or_else(|_| DEFAULT_BIN_REPO.to_string()),
            bin_tag: std::env::var("VOXD_BIN_TAG").ok(),
        }
    }
}

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Uninstall with confirmation:\n    voxd-setup uninstall\n\n\
                  Uninstall without prompting:\n    voxd-setup uninstall -y\n\n\
                  Also remove downloaded models:\n    voxd-setup uninstall --purge")]
pub struct UninstallArgs {
    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Also remove downloaded model files
    #[arg(long)]
    pub purge: bool,
}

/// Arguments for the hotkeys helper
#[derive(Parser, Debug)]
pub struct HotkeysArgs {
    #[command(subcommand)]
    pub action: HotkeysAction,
}

#[derive(Subcommand, Debug)]
pub enum HotkeysAction {
    /// Print per-desktop shortcut setup instructions
    Guide,
    /// Check the simulated-typing chain (daemon, socket, group, service)
    Diagnose,
    /// Remove stale voxd keybindings left behind by an uninstall
    Cleanup,
    /// Remove all voxd keybindings (GNOME)
    Remove,
    /// List voxd keybindings (GNOME)
    List,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    voxd-setup completions --shell bash > ~/.bash_completion.d/voxd-setup\n\n\
                  Generate zsh completions:\n    voxd-setup completions --shell zsh > ~/.zfunc/_voxd-setup\n\n\
                  Generate fish completions:\n    voxd-setup completions --shell fish > ~/.config/fish/completions/voxd-setup.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_bare_defaults_to_install() {
        let cli = Cli::try_parse_from(["voxd-setup"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_cli_parsing_install_flags() {
        unsafe {
            std::env::remove_var("VOXD_BIN_REPO");
            std::env::remove_var("VOXD_BIN_TAG");
        }
        let cli =
            Cli::try_parse_from(["voxd-setup", "install", "--offline", "--skip-models", "-y"])
                .unwrap();
        match cli.command {
            Some(Commands::Install(args)) => {
                assert!(args.offline);
                assert!(args.skip_models);
                assert!(args.yes);
                assert_eq!(args.bin_repo, DEFAULT_BIN_REPO);
                assert_eq!(args.bin_tag, None);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_install_args_default_has_release_repo() {
        unsafe {
            std::env::remove_var("VOXD_BIN_REPO");
            std::env::remove_var("VOXD_BIN_TAG");
        }
        let args = InstallArgs::default();
        assert!(!args.offline);
        assert!(!args.skip_models);
        assert_eq!(args.bin_repo, DEFAULT_BIN_REPO);
        assert_eq!(args.bin_tag, None);
    }

    #[test]
    #[serial_test::serial]
    fn test_install_args_default_honors_env_repo() {
        unsafe { std::env::set_var("VOXD_BIN_REPO", "someone/voxd-fork") };
        assert_eq!(InstallArgs::default().bin_repo, "someone/voxd-fork");
        unsafe { std::env::remove_var("VOXD_BIN_REPO") };
    }

    #[test]
    #[serial_test::serial]
    fn test_cli_parsing_install_tag_pin() {
        unsafe { std::env::remove_var("VOXD_BIN_TAG") };
        let cli =
            Cli::try_parse_from(["voxd-setup", "install", "--bin-tag", "v1.1.0"]).unwrap();
        match cli.command {
            Some(Commands::Install(args)) => {
                assert_eq!(args.bin_tag.as_deref(), Some("v1.1.0"));
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_uninstall() {
        let cli = Cli::try_parse_from(["voxd-setup", "uninstall", "--purge", "-y"]).unwrap();
        match cli.command {
            Some(Commands::Uninstall(args)) => {
                assert!(args.purge);
                assert!(args.yes);
            }
            _ => panic!("Expected Uninstall command"),
        }
    }

    #[test]
    fn test_cli_parsing_status() {
        let cli = Cli::try_parse_from(["voxd-setup", "status"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn test_cli_parsing_hotkeys_actions() {
        for (arg, expect_diag) in [("diagnose", true), ("guide", false)] {
            let cli = Cli::try_parse_from(["voxd-setup", "hotkeys", arg]).unwrap();
            match cli.command {
                Some(Commands::Hotkeys(args)) => {
                    assert_eq!(matches!(args.action, HotkeysAction::Diagnose), expect_diag);
                }
                _ => panic!("Expected Hotkeys command"),
            }
        }
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["voxd-setup", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Version)));
    }

    #[test]
    fn test_cli_global_verbose() {
        let cli = Cli::try_parse_from(["voxd-setup", "-v", "status"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["voxd-setup", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Some(Commands::Completions(args)) => assert_eq!(args.shell, "zsh"),
            _ => panic!("Expected Completions command"),
        }
    }
}
