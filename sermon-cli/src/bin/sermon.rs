use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::{select, Receiver};
use log::{info, warn};
use sermon_cli::output::{baud_lines, detail_lines, flatten_lines, port_lines, resolve_port};
use sermon_cli::DemoDevice;
use sermon_core::{
    BaudRate, ConsoleBuffer, DebugInspector, MockConnection, Monitor, MonitorConfig, MonitorEvent, SerialConnection,
    Submission,
};
use std::io::{BufRead, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports
    Ports,
    /// List supported baud rates
    Bauds,
    /// Flatten a JSON document
    Flatten {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
        /// Print the flattened map as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open a port and monitor it
    Monitor {
        /// Substring of the port name, or the full port name
        #[arg(short, long)]
        port: Option<String>,
        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,
        /// Run against a simulated device (no hardware required)
        #[arg(long)]
        mock: bool,
        /// Print flattened detail rows of JSON frames
        #[arg(long)]
        inspect: bool,
        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ports => {
            for line in port_lines(&available_ports()?) {
                println!("{line}");
            }
        }
        Commands::Bauds => {
            for line in baud_lines() {
                println!("{line}");
            }
        }
        Commands::Flatten { file, json } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let value = sermon_core::parse_line(&text)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sermon_core::flatten(&value))?);
            } else {
                for line in flatten_lines(&value) {
                    println!("{line}");
                }
            }
        }
        Commands::Monitor { port, baud, mock, inspect, config } => {
            let mut config = match config {
                Some(path) => MonitorConfig::load(&path)?,
                None => MonitorConfig::default(),
            };
            if let Some(port) = port {
                config.port_pattern = port;
            }
            if let Some(baud) = baud {
                config.baud_rate = BaudRate::try_from(baud)?;
            }
            run_monitor(&config, mock, inspect)?;
        }
    }

    Ok(())
}

#[cfg(feature = "hardware")]
fn available_ports() -> anyhow::Result<Vec<sermon_core::PortInfo>> {
    Ok(sermon_core::list_ports()?)
}

#[cfg(not(feature = "hardware"))]
fn available_ports() -> anyhow::Result<Vec<sermon_core::PortInfo>> {
    anyhow::bail!("built without hardware support")
}

#[cfg(feature = "hardware")]
fn open_hardware(config: &MonitorConfig) -> anyhow::Result<Box<dyn SerialConnection>> {
    let names: Vec<String> = available_ports()?.into_iter().map(|p| p.name).collect();
    let port_name = resolve_port(&names, &config.port_pattern);
    info!("Using serial port {port_name}");
    Ok(Box::new(sermon_core::SerialPortConnection::new(config.port_settings(port_name))))
}

#[cfg(not(feature = "hardware"))]
fn open_hardware(_config: &MonitorConfig) -> anyhow::Result<Box<dyn SerialConnection>> {
    anyhow::bail!("built without hardware support, use --mock")
}

/// Forward stdin lines to a channel; the channel disconnects on EOF.
fn spawn_stdin_reader() -> anyhow::Result<Receiver<String>> {
    let (line_tx, line_rx) = crossbeam_channel::unbounded();
    thread::Builder::new().name("sermon-stdin".to_string()).spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    })?;
    Ok(line_rx)
}

fn run_monitor(config: &MonitorConfig, mock: bool, inspect: bool) -> anyhow::Result<()> {
    let mut demo = None;
    let connection: Box<dyn SerialConnection> = if mock {
        info!("Starting in MOCK mode. No hardware will be accessed.");
        let (conn, handle) = MockConnection::new("mock");
        demo = Some(DemoDevice::spawn(handle, Duration::from_secs(1))?);
        Box::new(conn.with_baud_rate(config.baud_rate.value()))
    } else {
        open_hardware(config)?
    };

    let mut monitor = Monitor::new(connection, config.receiver_options());
    let events = monitor.events();
    let mut screen = Screen {
        console: ConsoleBuffer::new(config.console_max_chars),
        inspector: inspect.then(DebugInspector::new),
    };

    let connected = monitor.connect();
    for event in events.try_iter() {
        screen.show(event);
    }
    connected?;
    let stdin = spawn_stdin_reader()?;

    loop {
        select! {
            recv(events) -> event => {
                let Ok(event) = event else { break };
                screen.show(event);
            }
            recv(stdin) -> line => {
                let Ok(line) = line else {
                    info!("stdin closed");
                    monitor.disconnect();
                    break;
                };
                let text = line.strip_suffix('\r').unwrap_or(&line);
                match monitor.submit(text) {
                    Ok(Submission::Sent { echo }) => screen.print(&echo),
                    Ok(Submission::Exit) => break,
                    Err(e) => {
                        warn!("{e}");
                        screen.print(&format!("** {e}"));
                    }
                }
            }
        }
    }

    if let Some(mut demo) = demo {
        demo.stop();
    }
    log::debug!("Console held {} characters at exit", screen.console.len_chars());
    Ok(())
}

/// Terminal side of the monitor: the console text plus the optional
/// inspector.
struct Screen {
    console: ConsoleBuffer,
    inspector: Option<DebugInspector>,
}

impl Screen {
    fn print(&mut self, line: &str) {
        println!("{line}");
        self.console.push_text(&format!("{line}\n"));
    }

    fn show(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Frame(frame) => {
                let line = ConsoleBuffer::format_frame(&frame);
                print!("{line}");
                self.console.push_text(&line);
                let Some(inspector) = self.inspector.as_mut() else { return };
                if inspector.ingest(&frame.text()).is_err() {
                    return;
                }
                if let Some(key) = inspector.selected_key() {
                    for row in detail_lines(key, &inspector.selected_detail()) {
                        println!("{row}");
                    }
                }
            }
            MonitorEvent::Notice(notice) => self.print(&notice),
        }
    }
}
