//! Command line parsing and the `list` / `status` commands.

use std::time::Duration;

use anyhow::Context;
use vivosun_thermo::format::StatusReport;
use vivosun_thermo::scanner;
use vivosun_thermo::transport::BleTransport;
use vivosun_thermo::{ClientConfig, TemperatureUnit, ThermoClient};

pub const USAGE: &str = "\
Vivosun Thermo command line interface

Usage: vivosun-thermo [--adapter NAME] [-f|--format text|json] <COMMAND>

Commands:
  list     scan for devices available nearby
             --scan-timeout SECS     scan timeout (default: 30)
  status   read status (temperature, humidity, vpd)
             -u, --unit c|f          temperature unit (default: c)
             --connect-timeout SECS  connect timeout (default: 15)
             --read-timeout SECS     read timeout (default: 0.5)
             ADDRESS                 device address

Options:
  --adapter NAME         bluetooth adapter name (hci0 on Linux)
  -f, --format FORMAT    output format: text or json (default: text)
  -h, --help             print this help
";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    List {
        scan_timeout: Duration,
    },
    Status {
        unit: TemperatureUnit,
        connect_timeout: Duration,
        read_timeout: Duration,
        address: String,
    },
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub adapter: Option<String>,
    pub format: OutputFormat,
    pub command: Command,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("help requested")]
    Help,
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
    #[error("option '{0}' needs a value")]
    MissingValue(String),
    #[error("invalid value '{value}' for '{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },
    #[error("missing device address")]
    MissingAddress,
}

impl Args {
    /// Parse the arguments following the program name. Global options are
    /// accepted before and after the command.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ParseError> {
        let mut adapter = None;
        let mut format = OutputFormat::default();
        let mut command_name = None;
        let mut scan_timeout = Duration::from_secs(30);
        let mut unit = TemperatureUnit::default();
        let mut connect_timeout = Duration::from_secs(15);
        let mut read_timeout = Duration::from_millis(500);
        let mut address = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (option, inline) = match arg.split_once('=') {
                Some((option, value)) if option.starts_with("--") => (option.to_owned(), Some(value.to_owned())),
                _ => (arg.clone(), None),
            };
            let mut value = |option: &str| inline.clone().or_else(|| args.next()).ok_or_else(|| ParseError::MissingValue(option.to_owned()));

            match option.as_str() {
                "-h" | "--help" => return Err(ParseError::Help),
                "--adapter" => adapter = Some(value(&option)?),
                "-f" | "--format" => format = parse_format(&option, value(&option)?)?,
                "--scan-timeout" => scan_timeout = parse_secs(&option, value(&option)?)?,
                "-u" | "--unit" => {
                    let v = value(&option)?;
                    unit = v.parse().map_err(|reason| invalid(&option, &v, reason))?;
                }
                "--connect-timeout" => connect_timeout = parse_secs(&option, value(&option)?)?,
                "--read-timeout" => read_timeout = parse_secs(&option, value(&option)?)?,
                other if other.starts_with('-') && other.len() > 1 => return Err(ParseError::Unexpected(arg)),
                _ if command_name.is_none() => match arg.as_str() {
                    "list" | "status" => command_name = Some(arg),
                    _ => return Err(ParseError::UnknownCommand(arg)),
                },
                _ if command_name.as_deref() == Some("status") && address.is_none() => address = Some(arg),
                _ => return Err(ParseError::Unexpected(arg)),
            }
        }

        let command = match command_name.as_deref() {
            Some("list") => Command::List { scan_timeout },
            Some("status") => Command::Status {
                unit,
                connect_timeout,
                read_timeout,
                address: address.ok_or(ParseError::MissingAddress)?,
            },
            _ => return Err(ParseError::MissingCommand),
        };

        Ok(Self { adapter, format, command })
    }
}

fn invalid(option: &str, value: &str, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidValue { option: option.to_owned(), value: value.to_owned(), reason: reason.into() }
}

fn parse_format(option: &str, value: String) -> Result<OutputFormat, ParseError> {
    match value.as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => Err(invalid(option, &value, "expected 'text' or 'json'")),
    }
}

fn parse_secs(option: &str, value: String) -> Result<Duration, ParseError> {
    value
        .parse::<f64>()
        .map_err(|e| e.to_string())
        .and_then(|secs| Duration::try_from_secs_f64(secs).map_err(|e| e.to_string()))
        .map_err(|reason| invalid(option, &value, reason))
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    if let Some(name) = &args.adapter {
        tracing::warn!(adapter = %name, "adapter selection is not supported, using the system default adapter");
    }

    match args.command {
        Command::List { scan_timeout } => list(args.format, scan_timeout).await,
        Command::Status { unit, connect_timeout, read_timeout, address } => {
            let config = ClientConfig::default()
                .with_connect_timeout(connect_timeout)
                .with_read_timeout(read_timeout);
            status(args.format, unit, config, &address).await
        }
    }
}

async fn list(format: OutputFormat, scan_timeout: Duration) -> anyhow::Result<()> {
    let adapter = BleTransport::default_adapter().await?;
    let devices = scanner::discover(&adapter, scan_timeout).await.context("scan failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&devices)?),
        OutputFormat::Text => {
            for device in devices {
                println!("{} {}", device.address, device.name);
            }
        }
    }
    Ok(())
}

async fn status(format: OutputFormat, unit: TemperatureUnit, config: ClientConfig, address: &str) -> anyhow::Result<()> {
    let client = ThermoClient::find(address, config)
        .await
        .with_context(|| format!("could not find device {address}"))?;
    let report: StatusReport = client
        .session(|client| async move { client.report(unit).await })
        .await
        .context("could not read status")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.to_text(unit)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ParseError> {
        Args::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn status_defaults() {
        let args = parse(&["status", "AA:BB:CC:DD:EE:FF"]).unwrap();
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.adapter, None);
        assert_eq!(
            args.command,
            Command::Status {
                unit: TemperatureUnit::Celsius,
                connect_timeout: Duration::from_secs(15),
                read_timeout: Duration::from_millis(500),
                address: "AA:BB:CC:DD:EE:FF".into(),
            }
        );
    }

    #[test]
    fn status_with_options() {
        let args = parse(&[
            "--adapter", "hci1", "status", "-u", "f", "--format=json", "--read-timeout", "2.5", "addr",
        ])
        .unwrap();
        assert_eq!(args.adapter.as_deref(), Some("hci1"));
        assert_eq!(args.format, OutputFormat::Json);
        let Command::Status { unit, read_timeout, address, .. } = args.command else {
            panic!("expected status");
        };
        assert_eq!(unit, TemperatureUnit::Fahrenheit);
        assert_eq!(read_timeout, Duration::from_millis(2500));
        assert_eq!(address, "addr");
    }

    #[test]
    fn list_with_scan_timeout() {
        let args = parse(&["-f", "json", "list", "--scan-timeout", "5"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.command, Command::List { scan_timeout: Duration::from_secs(5) });
    }

    #[test]
    fn usage_errors() {
        assert_eq!(parse(&[]), Err(ParseError::MissingCommand));
        assert_eq!(parse(&["--help"]), Err(ParseError::Help));
        assert_eq!(parse(&["status"]), Err(ParseError::MissingAddress));
        assert_eq!(parse(&["frobnicate"]), Err(ParseError::UnknownCommand("frobnicate".into())));
        assert_eq!(parse(&["list", "extra"]), Err(ParseError::Unexpected("extra".into())));
        assert_eq!(parse(&["status", "-u"]), Err(ParseError::MissingValue("-u".into())));
        assert!(matches!(parse(&["status", "-u", "k", "a"]), Err(ParseError::InvalidValue { .. })));
        assert!(matches!(parse(&["list", "--scan-timeout", "-1"]), Err(ParseError::InvalidValue { .. })));
        assert!(matches!(parse(&["-f", "xml", "list"]), Err(ParseError::InvalidValue { .. })));
    }
}
