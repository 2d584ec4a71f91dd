//! Version command implementation

use crate::error::Result;

pub fn run() -> Result<()> {
    println!("voxd-setup {}", env!("CARGO_PKG_VERSION"));
    println!("Build info:");
    println!("  target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
    println!("  repository: {}", env!("CARGO_PKG_REPOSITORY"));
    Ok(())
}
