use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use skstack_rs::logging::{init_logger_with_default, log_warn};
use skstack_rs::util::hex::{decode_hex, format_hex_compact};
use skstack_rs::{
    log_info, ClientOptions, CommandLineWriter, Event, ReceiveMode, SerialConfig, SkStackClient,
};
use std::net::Ipv6Addr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skstack-cli")]
#[command(about = "CLI tool for SKSTACK IP modules")]
struct Cli {
    /// Serial port the module is attached to
    #[arg(short, long)]
    port: String,
    #[arg(short, long, default_value = "115200")]
    baudrate: u32,
    /// JSON file with client options
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the local interface parameters (SKINFO)
    Info,
    /// Show firmware and application versions
    Version,
    /// Dump the address, neighbor and port tables
    Table,
    /// Print events as they arrive
    Listen {
        /// Stop after this many events
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Send a UDP datagram (SKSENDTO)
    Send {
        /// Destination IPv6 address
        dest: Ipv6Addr,
        /// Destination port
        #[arg(long, default_value = "3610")]
        dest_port: u16,
        /// UDP handle
        #[arg(long, default_value = "1")]
        handle: u8,
        /// Send without MAC-layer security
        #[arg(long)]
        insecure: bool,
        /// Payload as hex, e.g. "10 81 00 01"
        payload: String,
    },
    /// Send one command line and print the response
    Raw {
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger_with_default("info");

    let cli = Cli::parse();
    let options = match &cli.config {
        Some(path) => ClientOptions::load(path)?,
        None => ClientOptions::default(),
    };
    let config = SerialConfig {
        baudrate: cli.baudrate,
        ..SerialConfig::default()
    };
    let mut client = SkStackClient::connect_with_config(&cli.port, config, options)
        .await
        .with_context(|| format!("cannot open {}", cli.port))?;

    match cli.command {
        Commands::Info => {
            let info = client.sk_info().await?;
            println!("link-local address: {}", info.link_local_address);
            println!("hardware address:   {}", info.addr64);
            println!("channel:            {}", info.channel);
            println!("PAN ID:             {:04X}", info.pan_id);
            println!("short address:      {:04X}", info.addr16);
        }
        Commands::Version => {
            println!("firmware:    {}", client.sk_ver().await?);
            match client.sk_app_ver().await {
                Ok(version) => println!("application: {version}"),
                Err(e) => log_warn(&format!("SKAPPVER failed: {e}")),
            }
        }
        Commands::Table => {
            for addr in client.sk_table_addresses().await? {
                println!("address  {addr}");
            }
            for entry in client.sk_table_neighbors().await? {
                println!("neighbor {} {} {:04X}", entry.ip_address, entry.addr64, entry.addr16);
            }
            let ports = client.sk_table_ports().await?;
            println!("udp ports {:?}", ports.udp);
            println!("tcp ports {:?}", ports.tcp);
        }
        Commands::Listen { count } => {
            let mut events = client.subscribe();
            let mut seen = 0usize;
            log_info("listening for events");
            loop {
                client.try_receive(ReceiveMode::Drain).await?;
                while let Ok(event) = events.try_recv() {
                    print_event(&event);
                    seen += 1;
                }
                if count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
        }
        Commands::Send {
            dest,
            dest_port,
            handle,
            insecure,
            payload,
        } => {
            let data = decode_hex(&payload)?;
            client
                .sk_send_to(handle, &dest, dest_port, !insecure, &data)
                .await?;
            log_info(&format!("sent {} bytes to [{dest}]:{dest_port}", data.len()));
        }
        Commands::Raw { tokens } => {
            let Some((name, args)) = tokens.split_first() else {
                bail!("no command given");
            };
            let mut writer = CommandLineWriter::new(name)?;
            for arg in args {
                writer.token(arg.as_bytes())?;
            }
            let response = client.send_command(&writer.finish()).await?;
            for line in response.lines() {
                println!("{}", String::from_utf8_lossy(line));
            }
            for event in response.events() {
                print_event(event);
            }
            println!("{} {}", response.status(), String::from_utf8_lossy(response.status_text()));
        }
    }

    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::UdpReceived(datagram) => println!(
            "ERXUDP [{}]:{} -> port {} ({} bytes): {}",
            datagram.sender,
            datagram.rport,
            datagram.lport,
            datagram.data.len(),
            format_hex_compact(&datagram.data)
        ),
        other => println!("{} {other:?}", String::from_utf8_lossy(other.code().as_bytes())),
    }
}
