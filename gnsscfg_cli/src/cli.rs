use anyhow::{bail, Result};
use clap::{builder::BoolishValueParser, value_parser, Arg, ArgAction, ArgMatches};
use gnsscfg::{
    constants::{DEFAULT_NMEA_REPEAT, DEFAULT_UBX_REPEAT, RX_BUFFER_MAX},
    CompiledCommand, TransmitOptions,
};
use log::LevelFilter;
use std::time::Duration;

use crate::plan::{RateChange, Selection};

/// Baud rate the receiver starts at
pub const DEFAULT_BAUD: u32 = 115200;

pub struct CommandBuilder {
    command: clap::Command,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        let command = clap::Command::new("gnsscfg")
            .about("Configure a u-blox GNSS receiver with NMEA PUBX and UBX messages")
            .arg(
                Arg::new("port")
                    .value_name("port")
                    .short('p')
                    .long("port")
                    .env("GNSSCFG_PORT")
                    .help("Serial port connected to the receiver"),
            )
            .arg(
                Arg::new("baud")
                    .value_name("baud")
                    .short('s')
                    .long("baud")
                    .env("GNSSCFG_BAUD")
                    .default_value("115200")
                    .value_parser(value_parser!(u32).range(1..))
                    .help("Baud rate the receiver currently talks at"),
            )
            .arg(
                Arg::new("dry-run")
                    .long("dry-run")
                    .env("GNSSCFG_DRY_RUN")
                    .action(ArgAction::SetTrue)
                    .value_parser(BoolishValueParser::new())
                    .help("Print what would be sent without opening the port"),
            )
            .arg(
                Arg::new("nmea-repeat")
                    .long("nmea-repeat")
                    .default_value("5")
                    .value_parser(value_parser!(u32).range(1..))
                    .help("Number of copies sent of every PUBX sentence"),
            )
            .arg(
                Arg::new("ubx-repeat")
                    .long("ubx-repeat")
                    .default_value("3")
                    .value_parser(value_parser!(u32).range(1..))
                    .help("Number of copies sent of every UBX frame"),
            )
            .arg(
                Arg::new("timeout-ms")
                    .value_name("ms")
                    .long("timeout-ms")
                    .value_parser(value_parser!(u64).range(1..))
                    .help("Give up on a write that does not drain within this time"),
            )
            .arg(
                Arg::new("rx-buffer")
                    .value_name("bytes")
                    .long("rx-buffer")
                    .env("GNSSCFG_RX_BUFFER")
                    .default_value("1024")
                    .value_parser(value_parser!(u32))
                    .help("Size of one read from the receiver, 255 to 1024 bytes"),
            )
            .arg(
                Arg::new("enable")
                    .value_name("IDS")
                    .long("enable")
                    .value_delimiter(',')
                    .action(ArgAction::Append)
                    .help("Sentences to output on USART1, e.g. GGA,ZDA"),
            )
            .arg(
                Arg::new("disable")
                    .value_name("IDS")
                    .long("disable")
                    .value_delimiter(',')
                    .action(ArgAction::Append)
                    .help("Sentences to turn off on all ports, e.g. GSV,GLL"),
            )
            .arg(
                Arg::new("set-baud")
                    .value_name("baud")
                    .long("set-baud")
                    .value_parser(value_parser!(u32).range(1..))
                    .help("Switch the receiver's USART1 with PUBX,41 and follow it locally"),
            )
            .arg(
                Arg::new("ubx-baud")
                    .value_name("baud")
                    .long("ubx-baud")
                    .value_parser(value_parser!(u32).range(1..))
                    .help("Switch the receiver's USART1 with UBX-CFG-PRT"),
            )
            .arg(
                Arg::new("persist")
                    .long("persist")
                    .action(ArgAction::SetTrue)
                    .help("Save the configuration to battery backed RAM and flash"),
            )
            .arg(
                Arg::new("standard")
                    .long("standard")
                    .action(ArgAction::SetTrue)
                    .help("Send the standard command set"),
            )
            .arg(
                Arg::new("list")
                    .long("list")
                    .action(ArgAction::SetTrue)
                    .help("Print the selected commands as JSON and exit"),
            )
            .arg(
                Arg::new("monitor")
                    .long("monitor")
                    .action(ArgAction::SetTrue)
                    .help("Keep printing the receiver output after sending"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .help("Increase log verbosity"),
            );
        Self { command }
    }

    pub fn build(&self) -> clap::Command {
        self.command.clone()
    }
}

/// Everything the run needs from the command line and environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: Option<String>,
    pub baud: u32,
    pub dry_run: bool,
    pub nmea_repeat: usize,
    pub ubx_repeat: usize,
    pub timeout: Option<Duration>,
    pub rx_buffer: usize,
    pub list: bool,
    pub monitor: bool,
    pub verbose: u8,
    pub selection: Selection,
}

impl Settings {
    pub fn from_matches(cli: &ArgMatches) -> Result<Self> {
        // --enable and --disable interleaved in the order they were given
        let mut rates: Vec<(usize, RateChange)> = Vec::new();
        for (name, enable) in [("enable", true), ("disable", false)] {
            if let (Some(values), Some(indices)) =
                (cli.get_many::<String>(name), cli.indices_of(name))
            {
                rates.extend(
                    indices
                        .zip(values)
                        .filter(|(_, id)| !id.is_empty())
                        .map(|(index, id)| (index, RateChange { id: id.clone(), enable })),
                );
            }
        }
        rates.sort_by_key(|(index, _)| *index);

        let settings = Self {
            port: cli.get_one::<String>("port").cloned(),
            baud: cli.get_one::<u32>("baud").copied().unwrap_or(DEFAULT_BAUD),
            dry_run: cli.get_flag("dry-run"),
            nmea_repeat: cli
                .get_one::<u32>("nmea-repeat")
                .map_or(DEFAULT_NMEA_REPEAT, |n| *n as usize),
            ubx_repeat: cli
                .get_one::<u32>("ubx-repeat")
                .map_or(DEFAULT_UBX_REPEAT, |n| *n as usize),
            timeout: cli
                .get_one::<u64>("timeout-ms")
                .map(|ms| Duration::from_millis(*ms)),
            rx_buffer: cli
                .get_one::<u32>("rx-buffer")
                .map_or(RX_BUFFER_MAX, |n| *n as usize),
            list: cli.get_flag("list"),
            monitor: cli.get_flag("monitor"),
            verbose: cli.get_count("verbose"),
            selection: Selection {
                rates: rates.into_iter().map(|(_, change)| change).collect(),
                set_baud: cli.get_one::<u32>("set-baud").copied(),
                ubx_baud: cli.get_one::<u32>("ubx-baud").copied(),
                persist: cli.get_flag("persist"),
                standard: cli.get_flag("standard"),
            },
        };

        if settings.port.is_none() && !settings.dry_run && !settings.list {
            bail!("A serial port is required, pass --port or set GNSSCFG_PORT (or use --dry-run)");
        }
        Ok(settings)
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Per command transmit options; the repeat count depends on the protocol
    pub fn transmit_options(&self, command: &CompiledCommand) -> TransmitOptions {
        let repeat = if command.kind.is_nmea() {
            self.nmea_repeat
        } else {
            self.ubx_repeat
        };
        TransmitOptions::new(repeat)
            .with_dry_run(self.dry_run)
            .with_timeout(self.timeout)
    }
}
