use std::rc::Rc;

use clap::{CommandFactory, Parser, Subcommand};

mod config;
mod notification;
mod singleton;

use notification::{Delivery, EmailSubscriber, NotificationHub, Outbox};

#[derive(Parser)]
#[command(
    name = "patterns",
    about = "Singleton and observer patterns, driven from the command line",
    version
)]
struct Cli {
    #[arg(long, global = true, env = "PATTERNS_DEBUG")]
    debug: bool,

    #[arg(long, global = true, env = "PATTERNS_HOME")]
    home: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Subscribe two addresses, announce, drop one, announce again
    Demo {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Broadcast one message to a set of email subscribers
    Notify {
        /// Subscriber address (repeat to subscribe more, or the same one twice)
        #[arg(long = "to", required = true)]
        to: Vec<String>,

        /// Message to send
        message: String,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Request the process-wide singleton once per payload
    Singleton {
        /// Payloads to construct with; only the first accepted one is kept
        #[arg(required = true)]
        payloads: Vec<String>,

        /// Race one thread per payload instead of calling in order
        #[arg(long)]
        concurrent: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Plain,
    Json,
}

#[derive(serde::Serialize)]
struct SingletonReport<'a> {
    data: &'a str,
    calls: usize,
    identical: bool,
    rejected: Vec<String>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("\x1b[1;31merror:\x1b[0m {e}");

        // Print the chain of causes, if any.
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  \x1b[1;31mcaused by:\x1b[0m {cause}");
            source = std::error::Error::source(cause);
        }

        std::process::exit(1);
    }
}

fn print_deliveries(deliveries: &[Delivery], format: &OutputFormat) -> anyhow::Result<()> {
    for d in deliveries {
        match format {
            OutputFormat::Human => println!("Email sent to {} : {}", d.to, d.message),
            OutputFormat::Plain => println!("{}\t{}", d.to, d.message),
            OutputFormat::Json => println!("{}", serde_json::to_string(d)?),
        }
    }
    Ok(())
}

fn print_singleton(report: &SingletonReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => {
            println!("\x1b[1minstance:\x1b[0m  {}", report.data);
            println!(
                "\x1b[1mcalls:\x1b[0m     {} ({})",
                report.calls,
                if report.identical {
                    "all returned the same instance"
                } else {
                    "instances differ"
                }
            );
            for payload in &report.rejected {
                println!("\x1b[1mrejected:\x1b[0m  {payload:?}");
            }
        }
        OutputFormat::Plain => {
            println!("{}\t{}\t{}", report.data, report.calls, report.identical);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(report)?);
        }
    }
    Ok(())
}

fn demo(config: &config::DemoConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let outbox = Outbox::new();
    let hub = NotificationHub::new();
    let subscribers: Vec<_> = config
        .subscribers
        .iter()
        .map(|email| Rc::new(EmailSubscriber::new(email.as_str(), outbox.clone())))
        .collect();

    for s in &subscribers {
        hub.subscribe(s);
    }
    if hub.is_empty() {
        tracing::warn!("no demo subscribers configured");
    }

    hub.notify(&config.first_message);
    print_deliveries(&outbox.drain(), format)?;

    if let Some(first) = subscribers.first() {
        tracing::info!(email = first.email(), "unsubscribing");
        hub.unsubscribe(first);
        tracing::debug!(remaining = hub.len(), "unsubscribed");
    }

    hub.notify(&config.second_message);
    print_deliveries(&outbox.drain(), format)?;

    Ok(())
}

fn notify(to: &[String], message: &str, format: &OutputFormat) -> anyhow::Result<()> {
    let outbox = Outbox::new();
    let hub = NotificationHub::new();
    // The hub holds weak handles, so the subscribers must outlive the broadcast.
    let subscribers: Vec<_> = to
        .iter()
        .map(|email| Rc::new(EmailSubscriber::new(email.as_str(), outbox.clone())))
        .collect();

    for s in &subscribers {
        hub.subscribe(s);
    }
    hub.notify(message);

    print_deliveries(&outbox.drain(), format)
}

fn request_singleton(
    payloads: Vec<String>,
    concurrent: bool,
) -> Vec<(String, anyhow::Result<&'static singleton::Singleton>)> {
    if !concurrent {
        return payloads
            .into_iter()
            .map(|p| {
                let result = singleton::get_instance(&p);
                (p, result)
            })
            .collect();
    }

    let handles: Vec<_> = payloads
        .into_iter()
        .map(|p| {
            std::thread::spawn(move || {
                let result = singleton::get_instance(&p);
                (p, result)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| match h.join() {
            Ok(outcome) => outcome,
            Err(_) => (
                String::new(),
                Err(anyhow::anyhow!("singleton request thread panicked")),
            ),
        })
        .collect()
}

fn run_singleton(
    payloads: Vec<String>,
    concurrent: bool,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let calls = payloads.len();
    let mut instances = Vec::new();
    let mut rejected = Vec::new();

    for (payload, result) in request_singleton(payloads, concurrent) {
        match result {
            Ok(instance) => instances.push(instance),
            Err(_) => rejected.push(payload),
        }
    }

    let Some(instance) = singleton::current() else {
        anyhow::bail!("no payload was accepted; the singleton is still unset");
    };

    let report = SingletonReport {
        data: instance.data(),
        calls,
        identical: instances.iter().all(|i| std::ptr::eq(*i, instance)),
        rejected,
    };

    print_singleton(&report, format)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load(cli.home.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.debug || config.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.command {
        Some(Command::Demo { format }) => demo(&config.demo, &format)?,
        Some(Command::Notify {
            to,
            message,
            format,
        }) => notify(&to, &message, &format)?,
        Some(Command::Singleton {
            payloads,
            concurrent,
            format,
        }) => run_singleton(payloads, concurrent, &format)?,
        Some(Command::Version) => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Some(Command::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                env!("CARGO_PKG_NAME"),
                &mut std::io::stdout(),
            );
        }
        None => {}
    }

    Ok(())
}
