use clap::Parser;

use xrdsync::config::Config;
use xrdsync::replicate::{self, DownloadArgs, MigrateArgs};
use xrdsync::{cli, util};

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::init();

    match cli.command {
        cli::Commands::Download {
            source,
            dest,
            listfile,
            dirname,
            parallel,
            force,
            verbose,
            dry_run,
        } => {
            let _guard = verbose.then(|| util::init_verbose_logging(&Config::logs_dir()));
            replicate::handle_download(
                &config,
                DownloadArgs { source, dest, listfile, dirname, parallel, force, verbose, dry_run },
            )
        }
        cli::Commands::Migrate {
            source_dir,
            listfile,
            dest_site,
            dest_url,
            remote_user,
            prepend,
            parallel,
            delete,
            verbose,
            dry_run,
        } => {
            let _guard = verbose.then(|| util::init_verbose_logging(&Config::logs_dir()));
            replicate::handle_migrate(
                &config,
                MigrateArgs {
                    source_dir,
                    listfile,
                    dest_site,
                    dest_url,
                    remote_user,
                    prepend,
                    parallel,
                    delete,
                    verbose,
                    dry_run,
                },
            )
        }
        cli::Commands::Set { xrdcp_path, xrdfs_path, adler32_path, siteconf_dir, parallel } => {
            let mut cfg = config.clone();
            if let Some(p) = xrdcp_path {
                cfg.xrdcp_app_path = p;
            }
            if let Some(p) = xrdfs_path {
                cfg.xrdfs_app_path = p;
            }
            if let Some(p) = adler32_path {
                cfg.adler32_app_path = p;
            }
            if let Some(d) = siteconf_dir {
                cfg.siteconf_dir = d;
            }
            if let Some(n) = parallel {
                cfg.default_parallel = n;
            }
            cfg.save_to_storage();
            println!("Configuration updated");
            Ok(())
        }
    }
}
