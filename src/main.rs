use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use job_mail_labeler::cli::{self, Cli, Commands};
use job_mail_labeler::config::Config;
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A writer that prints through MultiProgress so log lines don't tear the spinner
#[derive(Clone)]
struct MultiProgressWriter {
    multi: Arc<MultiProgress>,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: Arc<MultiProgress>) -> Self {
        Self {
            multi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn buffer(&self) -> std::io::Result<std::sync::MutexGuard<'_, Vec<u8>>> {
        self.buffer
            .lock()
            .map_err(|_| std::io::Error::other("log buffer poisoned"))
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer()?.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut buffer = self.buffer()?;
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() {
                // Events raised inside this writer are dropped by tracing, so
                // fall back to plain stderr
                if let Err(e) = self.multi.println(msg) {
                    eprintln!("{} (progress output failed: {})", msg, e);
                }
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// MakeWriter implementation for tracing
#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: Arc<MultiProgress>,
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(Arc::clone(&self.multi))
    }
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("\nFor help, run: job-mail-labeler --help");
            process::exit(1);
        }
    }
}

/// Returns whether the command succeeded
async fn run() -> Result<bool> {
    // Both reqwest and yup-oauth2 sit on rustls; pick one process-wide provider
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("job_mail_labeler=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("job_mail_labeler=info,warn"))
    };

    let multi_progress = Arc::new(MultiProgress::new());
    let make_writer = MultiProgressMakeWriter {
        multi: Arc::clone(&multi_progress),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    match cli.command {
        Commands::Run {
            non_interactive,
            access_token,
            report,
        } => {
            let config = Config::load(&cli.config).await?;
            let result = cli::run_labeling(
                &config,
                non_interactive,
                access_token,
                report.as_deref(),
                (*multi_progress).clone(),
            )
            .await?;

            if let Some(failure) = &result.failure {
                tracing::debug!(stage = %failure.stage, "Run did not complete");
            }
            Ok(result.is_success())
        }

        Commands::Auth { force } => {
            let config = Config::load(&cli.config).await?;
            cli::authenticate(&config, force).await?;
            Ok(true)
        }

        Commands::Classify { text } => {
            println!("{}", cli::describe_classification(&text));
            Ok(true)
        }

        Commands::InitConfig { output, force } => {
            cli::init_config(&output, force).await?;
            Ok(true)
        }
    }
}
