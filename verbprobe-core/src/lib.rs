pub mod batch;
pub mod data;
pub mod report;

pub use batch::{
    BatchEntry, BatchOptions, BatchProgressCallback, BatchResult, Disposition, ScanResultCallback,
    execute_batch, run_batch, run_batch_with_callback,
};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
                 _                     _
 __   _____ _ __| |__  _ __  _ __ ___ | |__   ___
 \ \ / / _ \ '__| '_ \| '_ \| '__/ _ \| '_ \ / _ \
  \ V /  __/ |  | |_) | |_) | | | (_) | |_) |  __/
   \_/ \___|_|  |_.__/| .__/|_|  \___/|_.__/ \___|
                      |_|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {} {}\n",
        "which HTTP methods does it take?".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
