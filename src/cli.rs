use clap::Parser;

/// Terminal browser for files stored on the Crust Network.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to browse at start-up; defaults to the last one used.
    pub address: Option<String>,
}
