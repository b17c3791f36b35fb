//! Clap derive structures for the `rosfleet` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Also compiled by `build.rs` for man page generation, so it must not
//! reference the rest of the crate.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rosfleet -- manage RouterOS devices from the command line
#[derive(Debug, Parser)]
#[command(
    name = "rosfleet",
    version,
    about = "Manage RouterOS devices from the command line",
    long_about = "Operate a fleet of MikroTik RouterOS devices over the REST API.\n\n\
        Every change made by rosfleet is tagged with the API_MANAGED comment, so\n\
        clearing or re-applying managed state never touches objects created by hand.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device id from the config file
    #[arg(long, short = 'd', env = "ROSFLEET_DEVICE", global = true)]
    pub device: Option<String>,

    /// Device address for a one-off connection (bypasses the inventory)
    #[arg(long, env = "ROSFLEET_HOST", global = true)]
    pub host: Option<String>,

    /// API user for --host
    #[arg(long, short = 'u', env = "ROSFLEET_USER", global = true)]
    pub user: Option<String>,

    /// Password (overrides env, keyring and config)
    #[arg(long, env = "ROSFLEET_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// REST service port for --host
    #[arg(long, env = "ROSFLEET_PORT", global = true)]
    pub port: Option<u16>,

    /// Use plain HTTP for --host (lab use only)
    #[arg(long, global = true)]
    pub plain_http: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ROSFLEET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ROSFLEET_INSECURE", global = true)]
    pub insecure: bool,

    /// Session acquisition timeout in seconds (default from config)
    #[arg(long, env = "ROSFLEET_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage interfaces and bridges
    #[command(alias = "if")]
    Interfaces(InterfacesArgs),

    /// Manage IP addresses, DHCP servers and DNS
    Ip(IpArgs),

    /// Manage static routes and recursive failover
    #[command(alias = "route")]
    Routes(RoutesArgs),

    /// Manage NAT, filter rules and address lists
    #[command(alias = "fw")]
    Firewall(FirewallArgs),

    /// System identity, NTP, provisioning and power control
    #[command(alias = "sys")]
    System(SystemArgs),

    /// Poll CPU, memory and interface throughput
    Stats(StatsArgs),

    /// Inspect the configuration and store passwords
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INTERFACES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List interfaces
    #[command(alias = "ls")]
    List,

    /// Show one interface
    Get {
        /// Interface name
        name: String,
    },

    /// Enable an interface
    Enable {
        /// Interface name
        name: String,
    },

    /// Disable an interface
    Disable {
        /// Interface name
        name: String,
    },

    /// Rename an interface
    Rename {
        /// Current name
        name: String,
        /// New name
        new_name: String,
    },

    /// Create a managed bridge
    AddBridge {
        /// Bridge name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct IpArgs {
    #[command(subcommand)]
    pub command: IpCommand,
}

#[derive(Debug, Subcommand)]
pub enum IpCommand {
    /// List IP addresses
    #[command(alias = "ls")]
    List,

    /// Assign a managed address
    Add {
        /// Address in CIDR form, e.g. 192.168.88.1/24
        address: String,

        /// Interface to assign it to
        #[arg(long, short = 'i')]
        interface: String,
    },

    /// List DHCP servers
    DhcpServers,

    /// Set the upstream DNS servers
    Dns {
        /// Server addresses (comma-separated or repeated)
        #[arg(required = true, value_delimiter = ',')]
        servers: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROUTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List routes
    #[command(alias = "ls")]
    List,

    /// Add a managed static route
    Add {
        /// Destination in CIDR form
        dst_address: String,

        /// Gateway address or interface
        gateway: String,

        /// Administrative distance
        #[arg(long)]
        distance: Option<u8>,
    },

    /// Remove every managed route
    Clear,

    /// Replace managed routes with recursive failover between two uplinks
    Failover {
        /// Primary uplink gateway
        primary: String,

        /// Backup uplink gateway
        backup: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FIREWALL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FirewallArgs {
    #[command(subcommand)]
    pub command: FirewallCommand,
}

#[derive(Debug, Subcommand)]
pub enum FirewallCommand {
    /// List NAT rules
    Nat,

    /// List filter rules
    Filter,

    /// Masquerade traffic leaving an interface
    Masquerade {
        /// Outgoing interface
        out_interface: String,
    },

    /// Drop forwarded traffic from an address
    Block {
        /// Source address or subnet
        src_address: String,
    },

    /// Manage address lists
    AddressList(AddressListArgs),

    /// Make the managed rules of one table match a YAML or JSON file
    Sync {
        /// Table to converge
        #[arg(value_enum)]
        table: FirewallTable,

        /// File holding a list of attribute maps
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Remove every managed NAT, filter, mangle and address-list entry
    Clear,
}

#[derive(Debug, Args)]
pub struct AddressListArgs {
    #[command(subcommand)]
    pub command: AddressListCommand,
}

#[derive(Debug, Subcommand)]
pub enum AddressListCommand {
    /// List address-list entries
    #[command(alias = "ls")]
    List,

    /// Add a managed entry
    Add {
        /// List name
        list: String,
        /// Address or subnet
        address: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FirewallTable {
    Nat,
    Filter,
    Mangle,
    AddressList,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYSTEM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Identity, model, version and load
    Info,

    /// Raw resource counters
    Resource,

    /// Show or set the system identity
    Identity {
        /// New identity; omit to print the current one
        name: Option<String>,
    },

    /// Enable the NTP client
    Ntp {
        /// NTP servers (comma-separated); built-in defaults when omitted
        #[arg(value_delimiter = ',')]
        servers: Vec<String>,
    },

    /// Install the rogue DHCP server alert on an interface
    DhcpAlert {
        /// Interface to watch
        interface: String,
    },

    /// One-shot provisioning: identity, NTP and DHCP alert
    Init {
        /// Identity to set
        #[arg(long)]
        identity: String,

        /// LAN interface watched for rogue DHCP servers
        #[arg(long, short = 'i', default_value = "bridge")]
        interface: String,
    },

    /// Reboot the device
    Reboot,

    /// Power off the device
    Shutdown,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Poll every device in the config file
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Keep polling until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Delay between polls (e.g. "5s", "1m")
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Store a device password in the system keyring
    SetPassword {
        /// Device id (defaults to the active device)
        device: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
