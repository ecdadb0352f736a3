//! Application orchestrator: resolve, confirm, pick a source, transfer,
//! report.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ezupload_file_ops::{HostFs, LocalFs, expand_home};
use ezupload_protocol::format_file_size;
use ezupload_transfer::{
    ActiveDocument, DestinationResolver, Environment, HostContext, NativeSource, Notice,
    NoticeLevel, Prompter, SourceEntry, SourceProvider, TransferError, confirm_request, summarize,
};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::Config;
use crate::dialog::NativeDialog;
use crate::picker::{PickerSession, PickerSettings};
use crate::progress::run_with_progress;
use crate::prompt::TerminalPrompter;

/// Runs one upload from invocation to final notice.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    watch_interrupts(cancel.clone());

    let host = host_context(&cli, &config)?;
    let request = match DestinationResolver::new(&host).resolve(cli.destination.as_deref()) {
        Ok(request) => request,
        Err(e @ TransferError::NoDestination) => {
            print_notice(&Notice::error(e.to_string()));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(
        destination = %request.destination.display(),
        explicit = request.explicit,
        "destination resolved"
    );

    let fs = LocalFs;
    let prompter = TerminalPrompter::stdio();

    let Some(destination) =
        confirm_request(&request, config.confirm_context_menu_upload, &prompter, &fs).await
    else {
        tracing::debug!("upload cancelled at the destination prompt");
        return Ok(());
    };

    let mode = cli.mode().unwrap_or(config.mode);
    if Environment::detect().use_picker(mode) {
        run_picker(&config, &fs, &prompter, &destination, &cancel).await
    } else {
        run_native(&fs, &prompter, &destination, &cancel).await
    }
}

async fn run_native(
    fs: &dyn HostFs,
    prompter: &dyn Prompter,
    destination: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let dialog = NativeDialog;
    let entries = NativeSource::new(&dialog).produce().await?;
    if entries.is_empty() {
        return Ok(());
    }

    list_selection(fs, &entries).await;
    let outcome = run_with_progress(fs, prompter, &entries, destination, cancel).await;
    print_notice(&summarize(&outcome));
    Ok(())
}

async fn run_picker(
    config: &Config,
    fs: &dyn HostFs,
    prompter: &dyn Prompter,
    destination: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let bind: IpAddr = config
        .picker_bind
        .parse()
        .with_context(|| format!("invalid picker_bind address: {}", config.picker_bind))?;
    let settings = PickerSettings {
        bind,
        page_port: config.picker_port,
        channel_port: config.picker_ws_port,
    };

    let session = PickerSession::start(&settings).await?;
    eprintln!(
        "Open {} in a browser on the machine that has the files.",
        session.page_url()
    );
    if bind.is_loopback() {
        eprintln!(
            "From another machine, forward ports {} and {} first.",
            session.page_port(),
            session.channel_port()
        );
    }
    eprintln!("Uploading to {}", destination.display());

    session
        .serve(fs, prompter, destination, cancel, |notice| print_notice(&notice))
        .await
}

/// Builds the host context from the command line and configuration.
fn host_context(cli: &Cli, config: &Config) -> anyhow::Result<HostContext> {
    let mut workspace_roots: Vec<PathBuf> = cli.workspaces.clone();
    workspace_roots.extend(config.workspace_roots.iter().map(|r| expand_home(r)));
    if workspace_roots.is_empty() {
        workspace_roots.push(std::env::current_dir().context("failed to read current directory")?);
    }

    Ok(HostContext {
        active_document: cli.active_file.as_deref().map(ActiveDocument::parse),
        workspace_roots,
    })
}

async fn list_selection(fs: &dyn HostFs, entries: &[SourceEntry]) {
    eprintln!("Selected {} file(s):", entries.len());
    for entry in entries {
        let size = match entry.source_path() {
            Some(path) => fs.stat(path).await.ok().map(|s| format_file_size(s.size)),
            None => None,
        };
        match size {
            Some(size) => eprintln!("  {} ({size})", entry.name()),
            None => eprintln!("  {}", entry.name()),
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", notice.message),
        NoticeLevel::Warning => eprintln!("warning: {}", notice.message),
        NoticeLevel::Error => eprintln!("error: {}", notice.message),
    }
}

/// First Ctrl-C cancels between files; a second one exits immediately.
fn watch_interrupts(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::info!("interrupt received, stopping after the current file");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("second interrupt, exiting");
            std::process::exit(130);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn workspace_roots_merge_cli_then_config() {
        let cli = Cli::try_parse_from(["ezupload", "--workspace", "/ws/cli"]).unwrap();
        let config = Config {
            workspace_roots: vec!["/ws/config".into()],
            ..Config::default()
        };

        let host = host_context(&cli, &config).unwrap();
        assert_eq!(
            host.workspace_roots,
            vec![PathBuf::from("/ws/cli"), PathBuf::from("/ws/config")]
        );
        assert!(host.active_document.is_none());
    }

    #[test]
    fn current_dir_is_the_fallback_root() {
        let cli = Cli::try_parse_from(["ezupload"]).unwrap();
        let host = host_context(&cli, &Config::default()).unwrap();
        assert_eq!(host.workspace_roots, vec![std::env::current_dir().unwrap()]);
    }

    #[test]
    fn active_file_is_parsed() {
        let cli =
            Cli::try_parse_from(["ezupload", "--active-file", "file:///ws/sub/a.rs"]).unwrap();
        let host = host_context(&cli, &Config::default()).unwrap();
        assert_eq!(
            host.active_document,
            Some(ActiveDocument::File("/ws/sub/a.rs".into()))
        );

        let req = DestinationResolver::new(&host).resolve(None).unwrap();
        assert_eq!(req.destination, PathBuf::from("/ws/sub"));
        assert!(!req.explicit);
    }

    #[test]
    fn explicit_destination_from_cli() {
        let cli = Cli::try_parse_from(["ezupload", "/srv/drop"]).unwrap();
        let host = host_context(&cli, &Config::default()).unwrap();

        let req = DestinationResolver::new(&host)
            .resolve(cli.destination.as_deref())
            .unwrap();
        assert_eq!(req.destination, PathBuf::from("/srv/drop"));
        assert!(req.explicit);
    }
}
