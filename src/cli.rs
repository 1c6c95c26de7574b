use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[clap(
        about = "Replicate logical files from one site to another",
        name = "dl",
        display_order = 1
    )]
    Download {
        #[clap(short = 's', long, help = "Site name of the data source")]
        source: String,
        #[clap(short = 't', long, help = "Site name of the data destination")]
        dest: String,
        #[clap(short = 'l', long, help = "List file with one LFN (and optional size) per line")]
        listfile: Option<PathBuf>,
        #[clap(short = 'd', long, help = "Remote directory of transfer files (instead of a list)")]
        dirname: Option<String>,
        #[clap(
            short = 'p',
            long = "parallel",
            help = "Number of copy jobs to be run simultaneously (default 4)"
        )]
        parallel: Option<usize>,
        #[clap(short = 'f', long, help = "Force copy even when the destination already matches")]
        force: bool,
        #[clap(short, long, help = "Verbose mode (also writes a run log file)")]
        verbose: bool,
        #[clap(long = "dry-run", help = "Print planned actions without invoking external tools")]
        dry_run: bool,
    },
    #[clap(
        about = "Migrate local files to a remote site with checksum verification",
        name = "mg",
        display_order = 2
    )]
    Migrate {
        #[clap(help = "Local source directory to migrate recursively")]
        source_dir: Option<PathBuf>,
        #[clap(short = 'l', long, help = "List file with one local path per line")]
        listfile: Option<PathBuf>,
        #[clap(short = 't', long = "dest", help = "Destination site name")]
        dest_site: Option<String>,
        #[clap(long = "dest-url", help = "Explicit destination root URL (overrides --dest)")]
        dest_url: Option<String>,
        #[clap(short = 'c', long = "cernid", help = "Remote username owning the destination area")]
        remote_user: Option<String>,
        #[clap(long, help = "Subpath inserted under the destination root")]
        prepend: Option<String>,
        #[clap(
            short = 'p',
            long = "parallel",
            help = "Number of copy jobs to be run simultaneously (default 4)"
        )]
        parallel: Option<usize>,
        #[clap(short = 'D', long, help = "Delete source files after a verified copy")]
        delete: bool,
        #[clap(short, long, help = "Verbose mode (also writes a run log file)")]
        verbose: bool,
        #[clap(long = "dry-run", help = "Print planned actions without invoking external tools")]
        dry_run: bool,
    },
    #[clap(about = "Configure xrdsync", display_order = 3)]
    Set {
        #[clap(short = 'x', help = "Set the xrdcp path", display_order = 1)]
        xrdcp_path: Option<PathBuf>,
        #[clap(short = 'r', help = "Set the xrdfs path", display_order = 2)]
        xrdfs_path: Option<PathBuf>,
        #[clap(short = 'a', help = "Set the adler32 checksum tool path", display_order = 3)]
        adler32_path: Option<PathBuf>,
        #[clap(short = 's', help = "Set the SITECONF root directory", display_order = 4)]
        siteconf_dir: Option<PathBuf>,
        #[clap(short = 'p', help = "Set the default parallelism", display_order = 5)]
        parallel: Option<usize>,
    },
}
