//! Hotkeys command dispatch

use crate::cli::{HotkeysAction, HotkeysArgs};
use crate::error::Result;
use crate::hotkeys;

pub fn run(args: HotkeysArgs) -> Result<()> {
    match args.action {
        HotkeysAction::Guide => {
            hotkeys::guide();
            Ok(())
        }
        HotkeysAction::Diagnose => hotkeys::diagnose(),
        HotkeysAction::Cleanup => hotkeys::cleanup(),
        HotkeysAction::Remove => hotkeys::remove(),
        HotkeysAction::List => hotkeys::list(),
    }
}
