use std::{convert::Infallible, fmt, time::Duration};

use anyhow::{bail, Result};
use gnsscfg::{Catalog, LinkError, PortSettings, SerialLink, TransmitResult, TransportDriver};
use log::{error, info};

use crate::cli::Settings;

/// Send every command of `plan`, logging failures and carrying on with the
/// next one. Returns the number of failed commands.
pub fn send_all<L>(driver: &mut TransportDriver<L>, plan: &Catalog, settings: &Settings) -> usize
where
    L: SerialLink,
    L::Error: fmt::Display,
{
    let mut failed = 0;
    for command in plan.iter() {
        let compiled = command.compile();
        let options = settings.transmit_options(&compiled);
        match driver.transmit(&compiled, &options) {
            Ok(TransmitResult::Sent {
                writes,
                bytes,
                baud_change,
            }) => {
                info!("'{}' sent {} times ({} bytes)", compiled.name, writes, bytes);
                if let Some(baud) = baud_change {
                    info!("Local port now at {} baud", baud);
                }
            },
            Ok(TransmitResult::DryRun { .. }) => {},
            Err(e) => {
                error!("'{}' failed: {}", compiled.name, e);
                failed += 1;
            },
        }
    }
    failed
}

/// Exit status of a run: an error when any command failed
pub fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{} of {} commands failed", failed, total);
    }
    Ok(())
}

/// Link used by dry runs, where no port is opened
pub struct OfflineLink;

impl SerialLink for OfflineLink {
    type Error = Infallible;

    fn configure(&mut self, _settings: &PortSettings) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write_all(
        &mut self,
        _bytes: &[u8],
        _timeout: Option<Duration>,
    ) -> Result<(), LinkError<Self::Error>> {
        Ok(())
    }

    fn set_baud_rate(&mut self, _baud_rate: u32) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cli::CommandBuilder, plan::build_plan, plan::RateChange, plan::Selection};
    use gnsscfg::Command;

    /// Records every write and refuses the frame of one command
    #[derive(Default)]
    struct FailingLink {
        writes: Vec<Vec<u8>>,
        refuse: Vec<u8>,
    }

    impl SerialLink for FailingLink {
        type Error = &'static str;

        fn configure(&mut self, _settings: &PortSettings) -> Result<(), Self::Error> {
            Ok(())
        }

        fn write_all(
            &mut self,
            bytes: &[u8],
            _timeout: Option<Duration>,
        ) -> Result<(), LinkError<Self::Error>> {
            if bytes == self.refuse.as_slice() {
                return Err(LinkError::Io("device unplugged"));
            }
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        fn set_baud_rate(&mut self, _baud_rate: u32) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn settings(args: &[&str]) -> Settings {
        let cli = CommandBuilder::default()
            .build()
            .try_get_matches_from(args)
            .unwrap();
        Settings::from_matches(&cli).unwrap()
    }

    fn plan() -> Catalog {
        build_plan(&Selection {
            rates: vec![
                RateChange::enable("GGA"),
                RateChange::disable("GSV"),
                RateChange::disable("GLL"),
            ],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_failed_command_does_not_stop_the_rest() {
        let settings = settings(&["gnsscfg", "--port", "/dev/null", "--nmea-repeat", "2"]);
        let plan = plan();
        let gsv = Command::disable("GSV").unwrap().compile();
        let gll = Command::disable("GLL").unwrap().compile();
        let gga = Command::enable("GGA").unwrap().compile();
        let link = FailingLink {
            refuse: gsv.as_bytes().to_vec(),
            ..Default::default()
        };
        let mut driver = TransportDriver::open(link, PortSettings::new(9600)).unwrap();

        let failed = send_all(&mut driver, &plan, &settings);

        assert_eq!(failed, 1);
        let writes = &driver.link().writes;
        assert_eq!(
            writes,
            &[
                gga.as_bytes().to_vec(),
                gga.as_bytes().to_vec(),
                gll.as_bytes().to_vec(),
                gll.as_bytes().to_vec(),
            ]
        );
        let err = finish(failed, plan.len()).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 commands failed");
    }

    #[test]
    fn test_clean_run_finishes_ok() {
        let settings = settings(&["gnsscfg", "--port", "/dev/null"]);
        let plan = plan();
        let mut driver = TransportDriver::open(FailingLink::default(), PortSettings::new(9600)).unwrap();

        let failed = send_all(&mut driver, &plan, &settings);

        assert_eq!(failed, 0);
        assert_eq!(driver.link().writes.len(), 3 * settings.nmea_repeat);
        assert!(finish(failed, plan.len()).is_ok());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let settings = settings(&["gnsscfg", "--dry-run"]);
        let plan = plan();
        let mut driver = TransportDriver::open(FailingLink::default(), PortSettings::new(9600)).unwrap();

        assert_eq!(send_all(&mut driver, &plan, &settings), 0);
        assert!(driver.link().writes.is_empty());
    }
}
